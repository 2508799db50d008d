pub mod error;
pub mod state;
pub mod types;


pub use error::DomainError;
pub use state::{ResourceState, StateSnapshot};
pub use types::{Application, LifecyclePhase, ObjectId, APPLICATION_RESOURCE_TYPE};
