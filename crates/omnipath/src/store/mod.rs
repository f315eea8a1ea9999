//! Remote collaborators.
//!
//! The backends talk to storage only through these traits. In-memory
//! implementations ship alongside for tests and scratch use.

mod memory_object;
mod memory_platform;
mod object;
mod platform;

pub use memory_object::MemoryObjectStore;
pub use memory_platform::{MemoryConnector, MemoryDataPlatform};
pub use object::{ObjectEntry, ObjectStore};
pub use platform::{ContentSource, DataPlatform, DataPlatformConnector, NodeId, NodeKind, RemoteNode};
