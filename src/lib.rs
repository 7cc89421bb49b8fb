/// Use mimalloc as the global allocator for all binaries.
/// Every captured partial product is a fresh big-integer allocation, and
/// span workers allocate concurrently; mimalloc's thread-local caches keep
/// that from contending on a global heap lock.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod factorial;
pub mod request;

pub use factorial::{CancelToken, EngineConfig, EngineError, FactorialEngine, compute_factorials};
pub use request::RequestError;
