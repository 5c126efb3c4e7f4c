//! Built-in storage backends.

mod local;
mod memory;

pub use local::{FILE_SCHEME, LocalBackend};
pub use memory::{MEMORY_SCHEME, MemoryBackend};
