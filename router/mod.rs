/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Synchronization router: the single mediator between the three views.
//!
//! View adapters feed [`ViewEvent`]s in; the router applies the mutation
//! to the stores and fans [`ViewCommand`]s out to every subscribed view
//! except the one the event came from. Origin tags on every envelope are
//! what keep the document view, the mind-map canvas and the annotation
//! list from echoing each other's mutations back around the loop.
//!
//! Invariants:
//! - mutate fully, then emit: commands only go out after the store
//!   change has landed
//! - a failed id resolution drops that propagation leg with a warning,
//!   never a panic
//! - re-parenting of duplicated canvas nodes is deferred until the
//!   current event chain has finished (the canvas is still replaying its
//!   own insert when the duplicate is minted)

use std::collections::VecDeque;

use crossbeam_channel::{Receiver, Sender, unbounded};
use euclid::default::Point2D;
use log::warn;

use crate::model::{
    Card, CardId, Connection, DocumentId, DocumentRecord, Highlight, HighlightAnchor, HighlightId,
    HighlightKind, IMAGE_SELECTION_TEXT, Position,
};
use crate::stores::{CardStore, ConnectionStore, DocumentRegistry, HighlightStore};

/// Which view produced a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewOrigin {
    /// The document reader (PDF/EPUB/text).
    Document,
    /// The mind-map canvas.
    MindMap,
    /// The annotation list sidebar.
    AnnotationList,
}

/// Inbound notifications from the view adapters.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// A highlight overlay was clicked in the reader.
    HighlightClicked { highlight_id: HighlightId },
    /// A canvas node was selected.
    NodeSelected { card_id: CardId },
    /// A list row was clicked.
    AnnotationSelected { card_id: CardId },
    /// A text selection was finished in the reader.
    RegionSelected {
        source_id: DocumentId,
        text: String,
        anchor: HighlightAnchor,
        kind: HighlightKind,
        color: String,
    },
    /// An area capture was finished in the reader (image card path).
    CaptureSelected {
        source_id: DocumentId,
        image_data: String,
        anchor: HighlightAnchor,
        kind: HighlightKind,
        color: String,
    },
    /// The canvas reported a node insert. `occurrences` is how many
    /// canvas nodes currently reference this card id; more than one
    /// means the user duplicated the node (copy/paste, alt-drag).
    NodeInserted {
        card_id: CardId,
        occurrences: usize,
        position: Point2D<f32>,
    },
    /// A canvas node was deleted.
    NodeRemoved { card_id: CardId },
    /// A canvas node settled at a new position.
    NodeMoved {
        card_id: CardId,
        position: Point2D<f32>,
    },
    /// A canvas node was recolored.
    NodeRecolored { card_id: CardId, color: String },
    /// The list-side delete button was pressed.
    AnnotationDeleted { card_id: CardId },
    /// The list-side note editor was committed.
    NoteEdited { card_id: CardId, note: String },
    /// An edge was drawn between two canvas nodes.
    ConnectionDrawn { source_id: CardId, target_id: CardId },
    /// Layout engine results, applied best-effort by card id.
    LayoutApplied { positions: Vec<(CardId, Point2D<f32>)> },
}

/// Outbound notifications to the view adapters. Every subscriber
/// receives every command (minus origin suppression); adapters ignore
/// commands that do not concern them.
#[derive(Debug, Clone)]
pub enum ViewCommand {
    CardAdded(Card),
    CardSoftDeleted {
        card_id: CardId,
        highlight_id: Option<HighlightId>,
    },
    CardRestored {
        card_id: CardId,
        highlight_id: Option<HighlightId>,
    },
    /// Bulk restore after a snapshot import or a source remap.
    CardsRestored {
        cards: Vec<Card>,
        connections: Vec<Connection>,
    },
    HighlightCreated(Highlight),
    HighlightRemoved(HighlightId),
    HighlightRecolored {
        highlight_id: HighlightId,
        color: String,
    },
    /// Bulk restore after a snapshot import or a source remap.
    HighlightsRestored { highlights: Vec<Highlight> },
    DocumentRegistered(DocumentRecord),
    DocumentUnregistered(DocumentId),
    DocumentLoadedChanged {
        document_id: DocumentId,
        loaded: bool,
    },
    /// Open the source document and scroll to the highlight.
    JumpToSource {
        source_id: DocumentId,
        highlight_id: HighlightId,
    },
    /// Selection sync: focus this card.
    SelectCard { card_id: CardId },
    /// Selection sync: scroll the reader to this highlight.
    SelectHighlight { highlight_id: HighlightId },
    /// A duplicated canvas node must be re-bound from the card it was
    /// cloned from to its freshly minted decoupled card.
    RebindNode {
        old_card_id: CardId,
        new_card_id: CardId,
    },
    WorkspaceCleared,
}

/// A broadcast notification with the origin tag used for echo
/// suppression. `origin: None` marks a core-initiated change delivered
/// to every view.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub origin: Option<ViewOrigin>,
    pub command: ViewCommand,
}

/// Mutable store access for one routing pass, injected by the
/// workspace.
pub struct RouterContext<'a> {
    pub highlights: &'a mut HighlightStore,
    pub cards: &'a mut CardStore,
    pub connections: &'a mut ConnectionStore,
    pub documents: &'a mut DocumentRegistry,
}

#[derive(Debug, Default)]
pub struct SyncRouter {
    subscribers: Vec<(ViewOrigin, Sender<Envelope>)>,
    deferred: VecDeque<Envelope>,
}

impl SyncRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view adapter. The returned channel carries every
    /// envelope whose origin is not this adapter's.
    pub fn subscribe(&mut self, origin: ViewOrigin) -> Receiver<Envelope> {
        let (tx, rx) = unbounded();
        self.subscribers.push((origin, tx));
        rx
    }

    /// Fan an envelope out to every subscriber except the originating
    /// view. Dead channels are pruned.
    pub fn broadcast(&mut self, origin: Option<ViewOrigin>, command: ViewCommand) {
        let envelope = Envelope { origin, command };
        self.subscribers.retain(|(sub_origin, tx)| {
            if envelope.origin == Some(*sub_origin) {
                return true;
            }
            tx.send(envelope.clone()).is_ok()
        });
    }

    /// Queue an envelope for delivery after the current event chain.
    pub fn defer(&mut self, origin: Option<ViewOrigin>, command: ViewCommand) {
        self.deferred.push_back(Envelope { origin, command });
    }

    /// Deliver deferred envelopes. Called by the workspace once the
    /// current mutation/notification chain has completed. Returns the
    /// number of envelopes delivered.
    pub fn drain_deferred(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(envelope) = self.deferred.pop_front() {
            self.broadcast(envelope.origin, envelope.command);
            delivered += 1;
        }
        delivered
    }

    /// Apply one inbound view event to the stores and notify the other
    /// views. Returns true when store state changed (the workspace uses
    /// this as its save signal).
    pub fn route(&mut self, ctx: RouterContext<'_>, event: ViewEvent) -> bool {
        match event {
            ViewEvent::HighlightClicked { highlight_id } => {
                let Some(card) = ctx.cards.get_by_highlight(highlight_id) else {
                    warn!("highlight {highlight_id} has no card, dropping selection sync");
                    return false;
                };
                let card_id = card.id;
                self.broadcast(Some(ViewOrigin::Document), ViewCommand::SelectCard { card_id });
                false
            },

            ViewEvent::NodeSelected { card_id } => {
                self.sync_selection_from_card(ctx, ViewOrigin::MindMap, card_id);
                false
            },

            ViewEvent::AnnotationSelected { card_id } => {
                self.sync_selection_from_card(ctx, ViewOrigin::AnnotationList, card_id);
                false
            },

            ViewEvent::RegionSelected {
                source_id,
                text,
                anchor,
                kind,
                color,
            } => {
                if text.trim().is_empty() {
                    warn!("empty selection for {source_id}, no highlight created");
                    return false;
                }
                let source_name = ctx.documents.get(&source_id).map(|r| r.name.clone());
                let highlight =
                    ctx.highlights
                        .create(&text, anchor, source_id, source_name, kind, color);
                self.broadcast(
                    Some(ViewOrigin::Document),
                    ViewCommand::HighlightCreated(highlight.clone()),
                );
                // Image-selection sentinel: the capture path mints the
                // card, not this one.
                if highlight.text != IMAGE_SELECTION_TEXT {
                    let card = ctx.cards.add_from_highlight(&highlight, Position::default());
                    self.broadcast(Some(ViewOrigin::Document), ViewCommand::CardAdded(card));
                }
                true
            },

            ViewEvent::CaptureSelected {
                source_id,
                image_data,
                anchor,
                kind,
                color,
            } => {
                let source_name = ctx.documents.get(&source_id).map(|r| r.name.clone());
                let highlight = ctx.highlights.create(
                    IMAGE_SELECTION_TEXT,
                    anchor,
                    source_id,
                    source_name,
                    kind,
                    color,
                );
                let card = ctx
                    .cards
                    .add_image_card(&highlight, image_data, Position::default());
                self.broadcast(
                    Some(ViewOrigin::Document),
                    ViewCommand::HighlightCreated(highlight),
                );
                self.broadcast(Some(ViewOrigin::Document), ViewCommand::CardAdded(card));
                true
            },

            ViewEvent::NodeInserted {
                card_id,
                occurrences,
                position,
            } => {
                let Some(card) = ctx.cards.get(card_id) else {
                    warn!("inserted node references unknown card {card_id}");
                    return false;
                };
                let was_deleted = card.deleted;

                if occurrences > 1 {
                    // The canvas now shows two nodes for one card; mint
                    // a decoupled sibling and re-bind the new node to it
                    // once the canvas has finished its own insert.
                    let Some(duplicate) =
                        ctx.cards.duplicate_decoupled(card_id, position.into())
                    else {
                        return false;
                    };
                    let new_card_id = duplicate.id;
                    self.broadcast(Some(ViewOrigin::MindMap), ViewCommand::CardAdded(duplicate));
                    self.defer(
                        None,
                        ViewCommand::RebindNode {
                            old_card_id: card_id,
                            new_card_id,
                        },
                    );
                    return true;
                }

                if was_deleted {
                    // Single reference to a tombstoned card: a canvas
                    // undo brought the node back.
                    if let Some(change) = ctx.cards.set_deleted(card_id, false) {
                        self.broadcast(
                            Some(ViewOrigin::MindMap),
                            ViewCommand::CardRestored {
                                card_id: change.card_id,
                                highlight_id: change.highlight_id,
                            },
                        );
                        return true;
                    }
                }

                // Structural move of a live node; nothing to do.
                false
            },

            ViewEvent::NodeRemoved { card_id } => {
                self.soft_delete(ctx, ViewOrigin::MindMap, card_id)
            },

            ViewEvent::AnnotationDeleted { card_id } => {
                self.soft_delete(ctx, ViewOrigin::AnnotationList, card_id)
            },

            ViewEvent::NodeMoved { card_id, position } => {
                ctx.cards.update_position(card_id, position.into())
            },

            ViewEvent::NodeRecolored { card_id, color } => {
                if !ctx.cards.set_color(card_id, &color) {
                    return false;
                }
                if let Some(highlight_id) =
                    ctx.cards.get(card_id).and_then(|c| c.highlight_id)
                    && ctx.highlights.set_color(highlight_id, &color)
                {
                    self.broadcast(
                        Some(ViewOrigin::MindMap),
                        ViewCommand::HighlightRecolored {
                            highlight_id,
                            color,
                        },
                    );
                }
                true
            },

            ViewEvent::NoteEdited { card_id, note } => ctx.cards.update_note(card_id, &note),

            ViewEvent::ConnectionDrawn {
                source_id,
                target_id,
            } => {
                if ctx.cards.get(source_id).is_none() || ctx.cards.get(target_id).is_none() {
                    warn!("connection endpoints missing ({source_id} -> {target_id}), skipping");
                    return false;
                }
                ctx.connections.add(source_id, target_id);
                true
            },

            ViewEvent::LayoutApplied { positions } => {
                let mut applied = 0;
                let mut skipped = 0;
                for (card_id, position) in positions {
                    if ctx.cards.update_position(card_id, position.into()) {
                        applied += 1;
                    } else {
                        skipped += 1;
                    }
                }
                if skipped > 0 {
                    warn!("layout referenced {skipped} unknown cards, applied {applied}");
                }
                applied > 0
            },
        }
    }

    /// Selection made on a card (canvas node or list row): scroll the
    /// reader to the backing highlight and focus the card everywhere
    /// else. Either leg drops silently when resolution fails.
    fn sync_selection_from_card(
        &mut self,
        ctx: RouterContext<'_>,
        origin: ViewOrigin,
        card_id: CardId,
    ) {
        let Some(card) = ctx.cards.get(card_id) else {
            warn!("selected card {card_id} not found, dropping selection sync");
            return;
        };
        if let Some(highlight_id) = card.highlight_id {
            if ctx.highlights.get(highlight_id).is_some() {
                self.broadcast(Some(origin), ViewCommand::SelectHighlight { highlight_id });
            } else {
                warn!("card {card_id} references missing highlight {highlight_id}");
            }
        }
        self.broadcast(Some(origin), ViewCommand::SelectCard { card_id });
    }

    fn soft_delete(
        &mut self,
        ctx: RouterContext<'_>,
        origin: ViewOrigin,
        card_id: CardId,
    ) -> bool {
        match ctx.cards.set_deleted(card_id, true) {
            Some(change) => {
                self.broadcast(
                    Some(origin),
                    ViewCommand::CardSoftDeleted {
                        card_id: change.card_id,
                        highlight_id: change.highlight_id,
                    },
                );
                true
            },
            None => false,
        }
    }
}
