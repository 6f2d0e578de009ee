pub mod http;
pub mod scrub;
pub mod text;

pub use scrub::{sanitize_api_error, scrub_secret_patterns};
pub use text::{
    sanitize_content, sanitize_input, strip_markup, truncate_chars, truncate_with_ellipsis,
};
