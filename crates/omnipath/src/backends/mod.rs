//! Storage backends.

mod local;
mod object;
mod platform;

pub use local::{LocalFactory, LocalPath};
pub use object::{ObjectFactory, ObjectPath};
pub use platform::{DEFAULT_PROFILE, PlatformFactory, PlatformLocation, PlatformPath};
