/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Document identity remapping: annotations saved against a stale
//! session id find their document again through the content hash.

use marginalia::persistence::{SNAPSHOT_TYPE, SNAPSHOT_VERSION, SourceBook, WorkspaceSnapshot};
use marginalia::stores::documents::{content_hash, derive_file_id};
use serde_json::json;

use crate::support::Harness;

#[test]
fn scenario_reopened_file_rehomes_annotations() {
    // Session one: open the book, annotate, export.
    let bytes = b"the collected works, volume one";
    let mut first = Harness::new();
    let old_id = first
        .workspace
        .open_document("works.txt", bytes.len() as u64, 1_000, None, bytes);
    first.select_text(&old_id, "a passage", 3, 0.5);
    let snapshot = first.workspace.export_snapshot(json!([]), json!({}));
    assert_eq!(
        snapshot.book.as_ref().map(|b| b.document_id.as_str()),
        Some(old_id.as_str())
    );

    // Session two: import first, then reopen the same bytes under
    // different metadata (the file was copied, so the session id moved).
    let mut second = Harness::new();
    second.workspace.import_snapshot(snapshot, None);
    assert!(second.workspace.documents.pending_restore().is_some());
    assert!(!second.workspace.documents.is_loaded(&old_id));

    let new_id = second
        .workspace
        .open_document("works (copy).txt", bytes.len() as u64, 2_000, None, bytes);
    assert_ne!(new_id, old_id);

    // Every annotation now points at the fresh id; the marker is gone.
    assert_eq!(second.workspace.highlights.by_source(&new_id).count(), 1);
    assert_eq!(second.workspace.highlights.by_source(&old_id).count(), 0);
    assert!(second
        .workspace
        .cards
        .iter()
        .all(|c| c.source_id.as_deref() == Some(new_id.as_str())));
    assert!(second.workspace.documents.pending_restore().is_none());
}

#[test]
fn scenario_unrelated_file_leaves_marker_in_place() {
    let bytes = b"the right book";
    let snapshot = WorkspaceSnapshot {
        marker: SNAPSHOT_TYPE.to_string(),
        version: SNAPSHOT_VERSION.to_string(),
        elements: json!([]),
        viewport: json!({}),
        cards: Vec::new(),
        connections: Vec::new(),
        documents: Vec::new(),
        highlights: Vec::new(),
        book: Some(SourceBook {
            content_hash: content_hash(bytes),
            document_id: derive_file_id("right.txt", bytes.len() as u64, 1),
            name: Some("right.txt".to_string()),
        }),
    };

    let mut harness = Harness::new();
    harness.workspace.import_snapshot(snapshot, None);
    harness
        .workspace
        .open_document("wrong.txt", 10, 99, None, b"wrong book");

    // The wrong file does not consume the marker; the right one does.
    assert!(harness.workspace.documents.pending_restore().is_some());
    harness
        .workspace
        .open_document("right-again.txt", bytes.len() as u64, 77, None, bytes);
    assert!(harness.workspace.documents.pending_restore().is_none());
}

#[test]
fn scenario_import_into_open_file_rehomes_immediately() {
    let bytes = b"already open";
    let mut source = Harness::new();
    let old_id = source
        .workspace
        .open_document("orig.txt", bytes.len() as u64, 1, None, bytes);
    let (_, card_id) = source.select_text(&old_id, "carried over", 1, 0.1);
    // A decoupled duplicate rides along in the snapshot.
    source.workspace.apply_event(marginalia::router::ViewEvent::NodeInserted {
        card_id,
        occurrences: 2,
        position: euclid::default::Point2D::new(40.0, 40.0),
    });
    source.workspace.drain_deferred();
    let snapshot = source.workspace.export_snapshot(json!([]), json!({}));
    assert_eq!(snapshot.cards.len(), 2);

    let mut target = Harness::new();
    let open_id = target
        .workspace
        .open_document("copy.txt", bytes.len() as u64, 9, None, bytes);
    target.workspace.import_snapshot(snapshot, Some(&open_id));

    assert_eq!(target.workspace.highlights.by_source(&open_id).count(), 1);
    // Re-homing covers every restored card, decoupled ones included.
    assert!(target
        .workspace
        .cards
        .iter()
        .all(|c| c.source_id.as_deref() == Some(open_id.as_str())));
    // Direct re-homing happened, so no pending marker was seeded.
    assert!(target.workspace.documents.pending_restore().is_none());
}
