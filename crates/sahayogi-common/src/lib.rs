//! Shared types for the Sahayogi client.
//!
//! Holds the chat message model and the error taxonomy used by the
//! auth, tutor, and config crates. Keep this crate at the bottom of
//! the dependency graph: no I/O, no runtime.

pub mod errors;
pub mod types;

pub use errors::{AuthError, ConfigError, SahayogiError, TutorError};
pub use types::{Message, Role};

pub type Result<T> = std::result::Result<T, SahayogiError>;
