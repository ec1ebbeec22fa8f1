//! claimsift — structured extraction of patent claims from spreadsheet text.
//!
//! Raw cells go in; individually numbered claim records with language,
//! dependency and confidence metadata come out. The [`pipeline`] module
//! holds the stateless extraction stages; the [`task`] module runs them as
//! background tasks with progress polling and crash recovery.
//!
//! ```no_run
//! use std::sync::Arc;
//! use claimsift::config::OrchestratorConfig;
//! use claimsift::pipeline::PipelineCellRunner;
//! use claimsift::task::{
//!     InMemoryCellProvider, InMemoryTaskStore, JsonFileRecoveryStore, TaskIdentity,
//!     TaskInput, TaskOrchestrator,
//! };
//!
//! let provider = Arc::new(InMemoryCellProvider::new());
//! let identity = TaskIdentity {
//!     file_id: "upload-42".into(),
//!     column_name: "claims".into(),
//!     sheet_name: "Sheet1".into(),
//!     patent_column_name: None,
//! };
//! provider.register(&identity, TaskInput {
//!     cells: vec!["1. A widget comprising a base.".into()],
//!     patent_numbers: None,
//! });
//!
//! let orchestrator = TaskOrchestrator::new(
//!     Arc::new(InMemoryTaskStore::new()),
//!     Arc::new(JsonFileRecoveryStore::new("/tmp/claimsift-recovery")),
//!     provider,
//!     Arc::new(PipelineCellRunner::default()),
//!     OrchestratorConfig::default(),
//! );
//! let _task_id = orchestrator.submit(identity)?;
//! # Ok::<(), claimsift::task::SubmitError>(())
//! ```

pub mod config;
pub mod pipeline;
pub mod task;
