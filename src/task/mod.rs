//! Task layer: background execution, state, and recovery.
//!
//! Wraps the extraction pipeline in a submit/poll/fetch lifecycle with
//! per-identity deduplication and checkpoint-based crash recovery.

pub mod orchestrator;
pub mod provider;
pub mod recovery;
pub mod store;
pub mod types;

pub use orchestrator::{ProgressCallback, SubmitError, TaskOrchestrator};
pub use provider::{CellProvider, InMemoryCellProvider, ProvideError};
pub use recovery::{
    InMemoryRecoveryStore, JsonFileRecoveryStore, RecoveryError, RecoverySnapshot, RecoveryStore,
};
pub use store::{InMemoryTaskStore, TaskStore};
pub use types::{
    PollResponse, ProgressEvent, TaskIdentity, TaskInput, TaskState, TaskStatus,
};
