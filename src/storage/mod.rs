pub mod factory;
pub mod failover;
pub mod memory;
pub mod remote;
pub mod traits;

pub use factory::create_backend;
pub use failover::{FailoverKv, RetryPolicy, StorageEvent};
pub use memory::InProcessKv;
pub use remote::RestKv;
pub use traits::{KvBackend, StorageFuture, WriteReceipt};
