//! Core types for task orchestration.
//!
//! A task is one run of the extraction pipeline over a column of cells:
//! Submit → Processing (cell loop, checkpoints) → Completed / Failed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::types::{RunResult, RunSummary};

// ═══════════════════════════════════════════
// Task Identity
// ═══════════════════════════════════════════

/// What makes two submissions "the same task".
///
/// All four fields participate in identity: a different sheet or a
/// different patent-number column is a different task, and its recovery
/// snapshots never cross over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskIdentity {
    pub file_id: String,
    pub column_name: String,
    pub sheet_name: String,
    pub patent_column_name: Option<String>,
}

impl TaskIdentity {
    /// Stable string key for lookups and snapshot file naming.
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.file_id,
            self.sheet_name,
            self.column_name,
            self.patent_column_name.as_deref().unwrap_or("")
        )
    }
}

// ═══════════════════════════════════════════
// Task Status
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Task State (stored per task)
// ═══════════════════════════════════════════

/// Full state of one task, as held by the task store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskState {
    pub task_id: String,
    pub identity: TaskIdentity,
    pub status: TaskStatus,
    /// Whole percent, 0..=100. Never decreases for a given task.
    pub progress: u8,
    /// Index of the next cell to process (also the resume point).
    pub current_cell_index: usize,
    pub total_cells: usize,
    /// Present once the task completes.
    pub result: Option<RunResult>,
    /// Present once the task fails.
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskState {
    pub fn new(identity: TaskIdentity, total_cells: usize) -> Self {
        let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        Self {
            task_id: Uuid::new_v4().to_string(),
            identity,
            status: TaskStatus::Processing,
            progress: 0,
            current_cell_index: 0,
            total_cells,
            result: None,
            error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    }
}

// ═══════════════════════════════════════════
// Task Input
// ═══════════════════════════════════════════

/// The column of cells a task processes, as fetched from a provider.
///
/// When `patent_numbers` is present it is row-aligned with `cells`.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub cells: Vec<String>,
    pub patent_numbers: Option<Vec<String>>,
}

impl TaskInput {
    pub fn patent_for(&self, index: usize) -> Option<&str> {
        self.patent_numbers
            .as_ref()
            .and_then(|nums| nums.get(index))
            .map(String::as_str)
    }
}

// ═══════════════════════════════════════════
// Poll Response
// ═══════════════════════════════════════════

/// Lightweight status view returned by `poll`; the full claim list is
/// fetched separately once the task completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    pub status: TaskStatus,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

// ═══════════════════════════════════════════
// Progress Events
// ═══════════════════════════════════════════

/// Event emitted by the worker as a task advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    Started { total_cells: u32 },
    Progress { completed: u32, total: u32, percent: u8 },
    Completed { claims_extracted: u32 },
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> TaskIdentity {
        TaskIdentity {
            file_id: "file-1".into(),
            column_name: "claims".into(),
            sheet_name: "Sheet1".into(),
            patent_column_name: Some("patent_no".into()),
        }
    }

    #[test]
    fn identity_key_covers_all_fields() {
        let base = identity();
        let mut other_sheet = identity();
        other_sheet.sheet_name = "Sheet2".into();
        let mut no_patent = identity();
        no_patent.patent_column_name = None;

        assert_ne!(base.key(), other_sheet.key());
        assert_ne!(base.key(), no_patent.key());
        assert_eq!(base.key(), identity().key());
    }

    #[test]
    fn task_status_roundtrip() {
        for status in [TaskStatus::Processing, TaskStatus::Completed, TaskStatus::Failed] {
            assert_eq!(TaskStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_str("queued"), None);
    }

    #[test]
    fn terminal_states() {
        assert!(!TaskStatus::Processing.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn new_task_starts_processing_at_zero() {
        let state = TaskState::new(identity(), 12);
        assert_eq!(state.status, TaskStatus::Processing);
        assert_eq!(state.progress, 0);
        assert_eq!(state.current_cell_index, 0);
        assert_eq!(state.total_cells, 12);
        assert!(state.result.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn new_tasks_get_unique_ids() {
        let a = TaskState::new(identity(), 1);
        let b = TaskState::new(identity(), 1);
        assert_ne!(a.task_id, b.task_id);
    }

    #[test]
    fn input_patent_alignment() {
        let input = TaskInput {
            cells: vec!["a".into(), "b".into()],
            patent_numbers: Some(vec!["US1".into(), "US2".into()]),
        };
        assert_eq!(input.patent_for(0), Some("US1"));
        assert_eq!(input.patent_for(1), Some("US2"));
        assert_eq!(input.patent_for(2), None);

        let bare = TaskInput {
            cells: vec!["a".into()],
            patent_numbers: None,
        };
        assert_eq!(bare.patent_for(0), None);
    }

    #[test]
    fn progress_event_serde() {
        let event = ProgressEvent::Progress {
            completed: 3,
            total: 7,
            percent: 42,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Progress\""));
        assert!(json.contains("\"percent\":42"));
    }
}
