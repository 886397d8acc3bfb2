//! # strato-cloud
//!
//! Client boundaries to the cloud: the stack control plane, object
//! storage, and topic-attribute lookup. Each is an async trait with an
//! in-memory simulated implementation for tests, in the same shape the
//! rest of the workspace abstracts its integrations.
//!
//! The error layer is the one place raw provider error text is inspected:
//! [`classify_provider_error`] maps it to typed [`CloudError`] variants so
//! callers branch on types, never on strings.

pub mod control_plane;
pub mod error;
pub mod object_store;
pub mod topics;

pub use control_plane::{
    Capability, ControlPlane, InMemoryControlPlane, StackDescription, StackStatus,
};
pub use error::{classify_provider_error, CloudError, CloudResult};
pub use object_store::{InMemoryObjectStore, ObjectMeta, ObjectStore};
pub use topics::{InMemoryTopicLookup, TopicLookup};
