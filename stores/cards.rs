/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Card store: mind-map projections of highlights plus freestanding
//! notes, with the tombstone lifecycle.
//!
//! Deleting a card from any view sets its `deleted` flag instead of
//! removing the record, so the canvas can undo the deletion and find the
//! card still there. Tombstones are purged (and their highlights
//! cascaded) by [`CardStore::cleanup`], which runs before every
//! persistence export.

use log::warn;
use uuid::Uuid;

use crate::model::{Card, CardId, CardKind, Highlight, HighlightId, Position, timestamp_now};
use crate::stores::connections::ConnectionStore;
use crate::stores::highlights::HighlightStore;

/// Outcome of a tombstone flip, carried to the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftDeleteChange {
    pub card_id: CardId,
    pub highlight_id: Option<HighlightId>,
    pub deleted: bool,
}

/// What a cleanup pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub purged_cards: Vec<CardId>,
    pub removed_highlights: Vec<HighlightId>,
    pub dropped_connections: usize,
}

impl CleanupReport {
    pub fn is_empty(&self) -> bool {
        self.purged_cards.is_empty()
            && self.removed_highlights.is_empty()
            && self.dropped_connections == 0
    }
}

#[derive(Debug, Default)]
pub struct CardStore {
    cards: Vec<Card>,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror a freshly created highlight as a text card.
    pub(crate) fn add_from_highlight(&mut self, highlight: &Highlight, position: Position) -> Card {
        let card = Card::from_highlight(highlight, position);
        self.cards.push(card.clone());
        card
    }

    /// Mint the card side of an image capture. The backing image-kind
    /// highlight must already exist.
    pub(crate) fn add_image_card(
        &mut self,
        highlight: &Highlight,
        image_data: String,
        position: Position,
    ) -> Card {
        let card = Card {
            id: Uuid::new_v4(),
            kind: CardKind::Image,
            highlight_id: Some(highlight.id),
            content: String::new(),
            image_data: Some(image_data),
            note: String::new(),
            source_id: Some(highlight.source_id.clone()),
            source_name: highlight.source_name.clone(),
            position,
            color: highlight.color.clone(),
            deleted: false,
            created_at: timestamp_now(),
        };
        self.cards.push(card.clone());
        card
    }

    /// Clone a card as a decoupled sibling: fresh id, no backing
    /// highlight, no source. Used when the canvas duplicates a node.
    pub(crate) fn duplicate_decoupled(
        &mut self,
        card_id: CardId,
        position: Position,
    ) -> Option<Card> {
        let original = self.get(card_id)?;
        let card = Card {
            id: Uuid::new_v4(),
            kind: original.kind,
            highlight_id: None,
            content: original.content.clone(),
            image_data: original.image_data.clone(),
            note: original.note.clone(),
            source_id: None,
            source_name: None,
            position,
            color: original.color.clone(),
            deleted: false,
            created_at: timestamp_now(),
        };
        self.cards.push(card.clone());
        Some(card)
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Card mirroring a given highlight, preferring a live one over a
    /// tombstone.
    pub fn get_by_highlight(&self, highlight_id: HighlightId) -> Option<&Card> {
        self.cards
            .iter()
            .find(|c| c.highlight_id == Some(highlight_id) && !c.deleted)
            .or_else(|| self.cards.iter().find(|c| c.highlight_id == Some(highlight_id)))
    }

    /// Record the canvas fallback position. Silent success; unknown ids
    /// are skipped (layout results may outlive their cards).
    pub(crate) fn update_position(&mut self, id: CardId, position: Position) -> bool {
        match self.cards.iter_mut().find(|c| c.id == id) {
            Some(card) => {
                card.position = position;
                true
            },
            None => false,
        }
    }

    pub(crate) fn update_note(&mut self, id: CardId, note: &str) -> bool {
        match self.cards.iter_mut().find(|c| c.id == id) {
            Some(card) => {
                card.note = note.to_string();
                true
            },
            None => {
                warn!("update_note: card {id} not found");
                false
            },
        }
    }

    pub(crate) fn set_color(&mut self, id: CardId, color: &str) -> bool {
        match self.cards.iter_mut().find(|c| c.id == id) {
            Some(card) => {
                card.color = color.to_string();
                true
            },
            None => {
                warn!("set_color: card {id} not found");
                false
            },
        }
    }

    /// Flip the tombstone flag. Setting the flag to its current value is
    /// a no-op that still reports the change, matching the views'
    /// idempotent delete/restore handling.
    pub(crate) fn set_deleted(&mut self, id: CardId, deleted: bool) -> Option<SoftDeleteChange> {
        match self.cards.iter_mut().find(|c| c.id == id) {
            Some(card) => {
                card.deleted = deleted;
                Some(SoftDeleteChange {
                    card_id: card.id,
                    highlight_id: card.highlight_id,
                    deleted,
                })
            },
            None => {
                warn!("set_deleted: card {id} not found");
                None
            },
        }
    }

    /// Purge tombstoned cards, cascade-remove their highlights, and drop
    /// connections left with a dangling endpoint. Runs before every
    /// export so tombstones never reach disk.
    pub(crate) fn cleanup(
        &mut self,
        highlights: &mut HighlightStore,
        connections: &mut ConnectionStore,
    ) -> CleanupReport {
        let mut report = CleanupReport::default();

        for card in self.cards.iter().filter(|c| c.deleted) {
            report.purged_cards.push(card.id);
            if let Some(highlight_id) = card.highlight_id
                && highlights.remove(highlight_id)
            {
                report.removed_highlights.push(highlight_id);
            }
        }
        self.cards.retain(|c| !c.deleted);

        let live: Vec<CardId> = self.cards.iter().map(|c| c.id).collect();
        report.dropped_connections = connections.retain_endpoints(|id| live.contains(id));

        report
    }

    /// Rewrite `source_id` on every card that still points at
    /// `old_source_id`. Refuses with zero writes when the old id is
    /// missing or empty.
    pub(crate) fn remap_source_ids(
        &mut self,
        new_source_id: &str,
        old_source_id: Option<&str>,
    ) -> usize {
        let Some(old) = old_source_id.filter(|s| !s.is_empty()) else {
            warn!("remap_source_ids: no previous source id, skipping remap");
            return 0;
        };
        let mut remapped = 0;
        for card in &mut self.cards {
            if card.source_id.as_deref() == Some(old) {
                card.source_id = Some(new_source_id.to_string());
                remapped += 1;
            }
        }
        remapped
    }

    /// Fill in missing source names for a document; never overwrites.
    pub(crate) fn heal_source_names(&mut self, source_id: &str, source_name: &str) -> usize {
        let mut healed = 0;
        for card in &mut self.cards {
            if card.source_id.as_deref() == Some(source_id)
                && card.source_name.as_deref().is_none_or(str::is_empty)
            {
                card.source_name = Some(source_name.to_string());
                healed += 1;
            }
        }
        healed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Cards that are not tombstoned.
    pub fn live(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|c| !c.deleted)
    }

    pub fn export_state(&self) -> Vec<(CardId, Card)> {
        self.cards.iter().map(|c| (c.id, c.clone())).collect()
    }

    /// Replace the store contents from a snapshot. When
    /// `new_source_id` is given, every restored card is re-homed to it,
    /// decoupled ones included (single-book import into a freshly
    /// opened file).
    pub(crate) fn import_state(
        &mut self,
        cards: Vec<(CardId, Card)>,
        new_source_id: Option<&str>,
    ) {
        self.cards = cards.into_iter().map(|(_, c)| c).collect();
        if let Some(source_id) = new_source_id {
            for card in &mut self.cards {
                card.source_id = Some(source_id.to_string());
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
