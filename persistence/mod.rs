/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Workspace persistence: one JSON snapshot document holding the full
//! annotation state plus the canvas adapter's opaque scene data.
//!
//! The snapshot is also the interchange format the canvas exports for
//! the user, so foreign fields (`elements`, `viewport`) pass through as
//! raw JSON values and the card/document collections keep their
//! association-list shape (`[[id, record], ...]`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{Card, CardId, Connection, DocumentId, DocumentRecord, Highlight};

pub const SNAPSHOT_TYPE: &str = "marginalia-export";
pub const SNAPSHOT_VERSION: &str = "1";

/// Content identity of the book the persisted annotations belong to,
/// used to seed the pending-restore handshake after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBook {
    pub content_hash: String,
    pub document_id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The persisted workspace document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    #[serde(rename = "type")]
    pub marker: String,
    pub version: String,

    /// Canvas scene elements, owned by the canvas adapter.
    #[serde(default)]
    pub elements: serde_json::Value,
    /// Canvas viewport, owned by the canvas adapter.
    #[serde(default)]
    pub viewport: serde_json::Value,

    #[serde(default)]
    pub cards: Vec<(CardId, Card)>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub documents: Vec<(DocumentId, DocumentRecord)>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<SourceBook>,
}

impl WorkspaceSnapshot {
    /// Loose validity check on the export marker. Foreign documents are
    /// still importable; callers log and carry on.
    pub fn is_valid(&self) -> bool {
        self.marker == SNAPSHOT_TYPE
    }
}

/// Errors from snapshot save/load.
#[derive(Debug)]
pub enum SnapshotError {
    Io(String),
    Format(String),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "IO error: {e}"),
            SnapshotError::Format(e) => write!(f, "Format error: {e}"),
        }
    }
}

/// Write a snapshot as pretty-printed JSON.
pub fn save_to_path(path: &Path, snapshot: &WorkspaceSnapshot) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| SnapshotError::Format(format!("Failed to serialize snapshot: {e}")))?;
    fs::write(path, json)
        .map_err(|e| SnapshotError::Io(format!("Failed to write {}: {e}", path.display())))
}

/// Read a snapshot back. Rejects documents without the export marker.
pub fn load_from_path(path: &Path) -> Result<WorkspaceSnapshot, SnapshotError> {
    let json = fs::read_to_string(path)
        .map_err(|e| SnapshotError::Io(format!("Failed to read {}: {e}", path.display())))?;
    let snapshot: WorkspaceSnapshot = serde_json::from_str(&json)
        .map_err(|e| SnapshotError::Format(format!("Failed to parse snapshot: {e}")))?;
    if !snapshot.is_valid() {
        return Err(SnapshotError::Format(format!(
            "Not a workspace export (type {:?})",
            snapshot.marker
        )));
    }
    Ok(snapshot)
}
