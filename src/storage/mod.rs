//! Storage contracts: queues, directories and files.
//!
//! The traits describe what the platform's storage adapters offer. The
//! `Memory*` types implement them in-process for local development and
//! tests; production adapters live with the hosting service.

pub mod file;
pub mod queue;

pub use file::{Directory, File, MemoryDirectory, MemoryFile, StorageEntity};
pub use queue::{MemoryQueue, Queue, TypedQueue, MAX_MESSAGE_BYTES};
