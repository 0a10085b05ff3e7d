//! Progress event types.

use crate::core::id::GenerationId;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressKind {
    FileAdded,
    FileUpdated,
    Error,
    /// Always the last event of a generation, successful or not.
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub generation_id: GenerationId,
    pub kind: ProgressKind,
    pub payload: Value,
}

impl ProgressEvent {
    pub fn file_added(generation_id: GenerationId, path: &str) -> Self {
        Self {
            generation_id,
            kind: ProgressKind::FileAdded,
            payload: json!({ "path": path }),
        }
    }

    pub fn file_updated(generation_id: GenerationId, path: &str) -> Self {
        Self {
            generation_id,
            kind: ProgressKind::FileUpdated,
            payload: json!({ "path": path }),
        }
    }

    pub fn error(generation_id: GenerationId, file: Option<&str>, message: &str) -> Self {
        Self {
            generation_id,
            kind: ProgressKind::Error,
            payload: json!({ "file": file, "message": message }),
        }
    }

    pub fn succeeded(generation_id: GenerationId, file_count: usize) -> Self {
        Self {
            generation_id,
            kind: ProgressKind::Complete,
            payload: json!({ "success": true, "file_count": file_count }),
        }
    }

    pub fn failed(generation_id: GenerationId, error_count: usize) -> Self {
        Self {
            generation_id,
            kind: ProgressKind::Complete,
            payload: json!({ "success": false, "error_count": error_count }),
        }
    }

    pub fn is_final(&self) -> bool {
        self.kind == ProgressKind::Complete
    }
}
