/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Workspace: the top-level context owning the four stores and the
//! synchronization router.
//!
//! Everything is dependency-injected from here; there are no ambient
//! singletons. View adapters subscribe through [`Workspace::subscribe`]
//! and feed events through [`Workspace::apply_event`]. The host drives
//! one cooperative tick at a time: apply events, then
//! [`Workspace::drain_deferred`], then check
//! [`Workspace::take_save_request`].

use log::{info, warn};

use crate::model::{Card, CardId, DocumentId, Highlight};
use crate::persistence::{SNAPSHOT_TYPE, SNAPSHOT_VERSION, SourceBook, WorkspaceSnapshot};
use crate::router::{Envelope, RouterContext, SyncRouter, ViewCommand, ViewEvent, ViewOrigin};
use crate::stores::{
    CardStore, CleanupReport, ConnectionStore, DocumentRegistry, HighlightStore, PendingRestore,
    documents,
};

/// One row of the annotation list: a live card joined to its backing
/// highlight, pre-sorted by page position.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationEntry<'a> {
    pub card: &'a Card,
    pub highlight: Option<&'a Highlight>,
}

#[derive(Default)]
pub struct Workspace {
    pub highlights: HighlightStore,
    pub cards: CardStore,
    pub connections: ConnectionStore,
    pub documents: DocumentRegistry,
    router: SyncRouter,
    /// Content identity of the most recently opened document, persisted
    /// so a snapshot can find its book again after a restart.
    current_book: Option<SourceBook>,
    needs_save: bool,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view adapter and get its notification channel.
    pub fn subscribe(&mut self, origin: ViewOrigin) -> crossbeam_channel::Receiver<Envelope> {
        self.router.subscribe(origin)
    }

    /// Apply one inbound view event.
    pub fn apply_event(&mut self, event: ViewEvent) {
        let ctx = RouterContext {
            highlights: &mut self.highlights,
            cards: &mut self.cards,
            connections: &mut self.connections,
            documents: &mut self.documents,
        };
        if self.router.route(ctx, event) {
            self.needs_save = true;
        }
    }

    pub fn apply_events(&mut self, events: impl IntoIterator<Item = ViewEvent>) {
        for event in events {
            self.apply_event(event);
        }
    }

    /// Deliver deferred notifications (node re-binds). Call once per
    /// host tick, after the current event batch.
    pub fn drain_deferred(&mut self) -> usize {
        self.router.drain_deferred()
    }

    /// True once any store mutated since the last take. The host uses
    /// this to schedule a snapshot write.
    pub fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_save)
    }

    /// Open a document: register it, heal stale annotation names, and
    /// run the content-hash handshake that re-homes annotations saved
    /// against an earlier incarnation of the same bytes.
    pub fn open_document(
        &mut self,
        name: &str,
        size: u64,
        modified_ms: u64,
        declared_mime: Option<&str>,
        bytes: &[u8],
    ) -> DocumentId {
        let id = documents::derive_file_id(name, size, modified_ms);
        let mime = declared_mime
            .map(str::to_string)
            .or_else(|| documents::detect_mime(name, Some(bytes)))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        // The registry is persisted state; a first registration must be
        // snapshotted even when no annotations exist yet.
        if self.documents.get(&id).is_none() {
            self.needs_save = true;
        }
        let record = self.documents.register(id.clone(), name, &mime, true);
        self.router
            .broadcast(None, ViewCommand::DocumentRegistered(record));

        let healed = self.cards.heal_source_names(&id, name)
            + self.highlights.heal_source_names(&id, name);
        if healed > 0 {
            info!("healed {healed} annotation names for {name}");
            self.needs_save = true;
        }

        let hash = documents::content_hash(bytes);
        if let Some(pending) = self.documents.take_pending_if_matches(&hash) {
            info!(
                "document {name} matches pending restore, remapping from {}",
                pending.document_id
            );
            self.remap_sources(&id, &pending.document_id);
        }
        self.current_book = Some(SourceBook {
            content_hash: hash,
            document_id: id.clone(),
            name: Some(name.to_string()),
        });
        id
    }

    /// Mark a document's bytes as gone (file closed). Annotations stay.
    pub fn close_document(&mut self, id: &str) {
        if self.documents.mark_loaded(id, false) {
            self.router.broadcast(
                None,
                ViewCommand::DocumentLoadedChanged {
                    document_id: id.to_string(),
                    loaded: false,
                },
            );
        }
    }

    /// Forget a document entirely. Its annotations keep their source id
    /// and fall back to the unknown-document display name.
    pub fn unregister_document(&mut self, id: &str) {
        if self.documents.unregister(id) {
            self.router
                .broadcast(None, ViewCommand::DocumentUnregistered(id.to_string()));
            self.needs_save = true;
        }
    }

    /// Re-home every annotation from `old_id` to `new_id`, notifying all
    /// views with the rewritten records.
    fn remap_sources(&mut self, new_id: &str, old_id: &str) {
        let highlights = self.highlights.remap_source(new_id, Some(old_id));
        let cards = self.cards.remap_source_ids(new_id, Some(old_id));
        if highlights == 0 && cards == 0 {
            return;
        }
        self.needs_save = true;
        self.router.broadcast(
            None,
            ViewCommand::HighlightsRestored {
                highlights: self
                    .highlights
                    .by_source(new_id)
                    .cloned()
                    .collect(),
            },
        );
        self.router.broadcast(
            None,
            ViewCommand::CardsRestored {
                cards: self
                    .cards
                    .live()
                    .filter(|c| c.source_id.as_deref() == Some(new_id))
                    .cloned()
                    .collect(),
                connections: self.connections.export_state(),
            },
        );
    }

    /// Resolve a jump-to-source request from a card click. The
    /// highlight's source id wins over the card's (it may have been
    /// remapped); missing pieces degrade to a logged no-op.
    pub fn request_jump(&mut self, card_id: CardId) {
        let Some(card) = self.cards.get(card_id) else {
            warn!("jump requested for unknown card {card_id}");
            return;
        };
        let Some(highlight_id) = card.highlight_id else {
            warn!("card {card_id} is decoupled, nothing to jump to");
            return;
        };
        let source_id = self
            .highlights
            .get(highlight_id)
            .map(|h| h.source_id.clone())
            .or_else(|| card.source_id.clone());
        let Some(source_id) = source_id else {
            warn!("card {card_id} has no source document");
            return;
        };
        self.router.broadcast(
            Some(ViewOrigin::MindMap),
            ViewCommand::JumpToSource {
                source_id,
                highlight_id,
            },
        );
    }

    /// The annotation list for one document: live cards joined to their
    /// highlights, sorted by page then by vertical position, unknown
    /// pages last.
    pub fn annotation_list(&self, source_id: &str) -> Vec<AnnotationEntry<'_>> {
        let mut entries: Vec<AnnotationEntry<'_>> = self
            .cards
            .live()
            .filter(|c| c.source_id.as_deref() == Some(source_id))
            .map(|card| AnnotationEntry {
                card,
                highlight: card.highlight_id.and_then(|id| self.highlights.get(id)),
            })
            .collect();
        entries.sort_by(|a, b| {
            let key = |e: &AnnotationEntry<'_>| {
                let anchor = e.highlight.map(|h| &h.anchor);
                (
                    anchor.and_then(|a| a.page()).unwrap_or(u32::MAX),
                    anchor.map(|a| a.top()).unwrap_or(f32::MAX),
                )
            };
            let (page_a, top_a) = key(a);
            let (page_b, top_b) = key(b);
            page_a
                .cmp(&page_b)
                .then(top_a.total_cmp(&top_b))
        });
        entries
    }

    /// Purge tombstoned cards and everything dangling off them, and
    /// tell the views which highlights went away for good.
    pub fn cleanup(&mut self) -> CleanupReport {
        let report = self.cards.cleanup(&mut self.highlights, &mut self.connections);
        if !report.is_empty() {
            info!(
                "cleanup: purged {} cards, {} highlights, {} connections",
                report.purged_cards.len(),
                report.removed_highlights.len(),
                report.dropped_connections
            );
            for highlight_id in &report.removed_highlights {
                self.router
                    .broadcast(None, ViewCommand::HighlightRemoved(*highlight_id));
            }
            self.needs_save = true;
        }
        report
    }

    /// Build the persistence snapshot. Runs cleanup first so tombstones
    /// never reach disk. `elements` and `viewport` are the canvas
    /// adapter's own serialized state, passed through opaquely.
    pub fn export_snapshot(
        &mut self,
        elements: serde_json::Value,
        viewport: serde_json::Value,
    ) -> WorkspaceSnapshot {
        self.cleanup();
        WorkspaceSnapshot {
            marker: SNAPSHOT_TYPE.to_string(),
            version: SNAPSHOT_VERSION.to_string(),
            elements,
            viewport,
            cards: self.cards.export_state(),
            connections: self.connections.export_state(),
            documents: self.documents.export_state(),
            highlights: self.highlights.export_state(),
            book: self.current_book.clone(),
        }
    }

    /// Replace workspace state from a snapshot. Restored documents are
    /// unloaded; when the snapshot names its source book and that book
    /// is not currently open, a pending-restore marker is seeded so the
    /// next matching file open re-homes the annotations.
    ///
    /// `new_source_id` re-homes every restored annotation immediately,
    /// for importing a single-book snapshot into an already open file.
    pub fn import_snapshot(&mut self, snapshot: WorkspaceSnapshot, new_source_id: Option<&str>) {
        if !snapshot.is_valid() {
            warn!("snapshot has unexpected marker {:?}, importing anyway", snapshot.marker);
        }
        self.highlights
            .import_state(snapshot.highlights, new_source_id);
        self.cards.import_state(snapshot.cards, new_source_id);
        self.connections.import_state(snapshot.connections);
        self.documents.import_state(snapshot.documents);

        if new_source_id.is_none()
            && let Some(book) = &snapshot.book
            && !self.documents.is_loaded(&book.document_id)
        {
            self.documents.set_pending_restore(PendingRestore {
                content_hash: book.content_hash.clone(),
                document_id: book.document_id.clone(),
            });
        }
        self.current_book = snapshot.book;

        self.router.broadcast(
            None,
            ViewCommand::HighlightsRestored {
                highlights: self.highlights.export_state(),
            },
        );
        self.router.broadcast(
            None,
            ViewCommand::CardsRestored {
                cards: self.cards.live().cloned().collect(),
                connections: self.connections.export_state(),
            },
        );
        self.needs_save = true;
    }

    /// Clear every store. The clean-board action.
    pub fn clear_all(&mut self) {
        self.highlights.clear();
        self.cards.clear();
        self.connections.clear();
        self.documents.clear();
        self.current_book = None;
        self.router.broadcast(None, ViewCommand::WorkspaceCleared);
        self.needs_save = true;
    }
}
