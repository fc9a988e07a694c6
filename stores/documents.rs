/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Document registry: the documents the workspace knows about, plus the
//! two identities each file carries.
//!
//! The session id is a cheap digest of file metadata (name, size,
//! mtime) and changes whenever the file is copied or resaved. Content
//! identity is a digest of the full bytes. When a snapshot is imported,
//! a [`PendingRestore`] marker records the content hash the annotations
//! belong to; the next file open whose bytes match triggers a source-id
//! remap from the stale session id to the fresh one.

use std::collections::HashMap;

use log::warn;
use sha2::{Digest, Sha256};

use crate::model::{DocumentId, DocumentRecord, timestamp_now};

/// Display name used when a source document is unknown to the registry.
pub const UNKNOWN_DOCUMENT: &str = "Unknown Document";

/// Annotations are waiting for a file whose bytes hash to
/// `content_hash`; they currently point at `document_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRestore {
    pub content_hash: String,
    pub document_id: DocumentId,
}

/// Derive the session file id from file metadata. 32 hex chars.
pub fn derive_file_id(name: &str, size: u64, modified_ms: u64) -> DocumentId {
    let signature = format!("{name}-{size}-{modified_ms}");
    let digest = Sha256::digest(signature.as_bytes());
    let mut hex = encode_hex(&digest);
    hex.truncate(32);
    hex
}

/// Content identity: hex digest of the full file bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    encode_hex(&Sha256::digest(bytes))
}

fn encode_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

/// Detect MIME type from file name + optional content bytes.
///
/// Detection order:
/// 1) Content-byte sniffing via `infer` (when `content_bytes` are provided)
/// 2) Extension fallback via `mime_guess`
///
/// Returns `None` when neither source yields a known MIME type.
pub(crate) fn detect_mime(name: &str, content_bytes: Option<&[u8]>) -> Option<String> {
    if let Some(bytes) = content_bytes {
        if let Some(kind) = infer::get(bytes) {
            return Some(kind.mime_type().to_string());
        }
    }
    mime_guess::from_path(name).first().map(|m| m.to_string())
}

#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: HashMap<DocumentId, DocumentRecord>,
    pending_restore: Option<PendingRestore>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or re-register a document. Re-registering refreshes the
    /// name, MIME type and loaded flag but keeps the original
    /// registration timestamp.
    pub(crate) fn register(
        &mut self,
        id: DocumentId,
        name: &str,
        mime_type: &str,
        loaded: bool,
    ) -> DocumentRecord {
        let record = self
            .documents
            .entry(id.clone())
            .and_modify(|r| {
                r.name = name.to_string();
                r.mime_type = mime_type.to_string();
                r.loaded = loaded;
            })
            .or_insert_with(|| DocumentRecord {
                id,
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                loaded,
                registered_at: timestamp_now(),
            });
        record.clone()
    }

    pub(crate) fn unregister(&mut self, id: &str) -> bool {
        if self.documents.remove(id).is_none() {
            warn!("unregister: document {id} not found");
            return false;
        }
        true
    }

    pub fn get(&self, id: &str) -> Option<&DocumentRecord> {
        self.documents.get(id)
    }

    /// Display name for a document, with a stable fallback for ids the
    /// registry has never seen.
    pub fn name(&self, id: &str) -> &str {
        self.documents
            .get(id)
            .map(|r| r.name.as_str())
            .unwrap_or(UNKNOWN_DOCUMENT)
    }

    pub(crate) fn mark_loaded(&mut self, id: &str, loaded: bool) -> bool {
        match self.documents.get_mut(id) {
            Some(record) => {
                record.loaded = loaded;
                true
            },
            None => {
                warn!("mark_loaded: document {id} not found");
                false
            },
        }
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.documents.get(id).is_some_and(|r| r.loaded)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.documents.values()
    }

    pub(crate) fn set_pending_restore(&mut self, pending: PendingRestore) {
        self.pending_restore = Some(pending);
    }

    pub fn pending_restore(&self) -> Option<&PendingRestore> {
        self.pending_restore.as_ref()
    }

    /// Consume the pending-restore marker when the opened file's content
    /// hash matches it. Non-matching opens leave the marker in place for
    /// a later open of the right file.
    pub(crate) fn take_pending_if_matches(&mut self, content_hash: &str) -> Option<PendingRestore> {
        if self
            .pending_restore
            .as_ref()
            .is_some_and(|p| p.content_hash == content_hash)
        {
            return self.pending_restore.take();
        }
        None
    }

    pub fn export_state(&self) -> Vec<(DocumentId, DocumentRecord)> {
        let mut entries: Vec<_> = self
            .documents
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Replace the registry from a snapshot. Restored documents are
    /// never loaded; the user has to re-supply bytes.
    pub(crate) fn import_state(&mut self, documents: Vec<(DocumentId, DocumentRecord)>) {
        self.documents = documents
            .into_iter()
            .map(|(id, mut record)| {
                record.loaded = false;
                (id, record)
            })
            .collect();
    }

    pub(crate) fn clear(&mut self) {
        self.documents.clear();
        self.pending_restore = None;
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
