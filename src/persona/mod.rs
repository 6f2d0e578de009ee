pub mod catalog;
pub mod prompts;
pub mod resolver;

pub use catalog::{PersonaCatalog, PersonaProfile};
pub use resolver::{Detection, capture_name, detect, is_switch_request, normalize, resolve};
