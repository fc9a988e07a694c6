/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Highlight store: the canonical list of in-document annotations.
//!
//! Insertion-ordered; the annotation list re-sorts by page position at
//! query time, so the store itself keeps things simple.

use log::warn;
use uuid::Uuid;

use crate::model::{
    DocumentId, Highlight, HighlightAnchor, HighlightId, HighlightKind, timestamp_now,
};

#[derive(Debug, Default)]
pub struct HighlightStore {
    highlights: Vec<Highlight>,
}

impl HighlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a highlight from a finished reader selection. The text is
    /// trimmed; the caller decides whether a card mirrors it.
    pub(crate) fn create(
        &mut self,
        text: &str,
        anchor: HighlightAnchor,
        source_id: DocumentId,
        source_name: Option<String>,
        kind: HighlightKind,
        color: String,
    ) -> Highlight {
        let highlight = Highlight {
            id: Uuid::new_v4(),
            text: text.trim().to_string(),
            anchor,
            source_id,
            source_name,
            kind,
            color,
            created_at: timestamp_now(),
        };
        self.highlights.push(highlight.clone());
        highlight
    }

    pub fn get(&self, id: HighlightId) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id == id)
    }

    /// Remove a highlight record outright. Used by cleanup cascades, not
    /// by view-facing deletion (which tombstones the card instead).
    pub(crate) fn remove(&mut self, id: HighlightId) -> bool {
        let before = self.highlights.len();
        self.highlights.retain(|h| h.id != id);
        before != self.highlights.len()
    }

    pub fn by_source<'a>(
        &'a self,
        source_id: &'a str,
    ) -> impl Iterator<Item = &'a Highlight> + 'a {
        self.highlights.iter().filter(move |h| h.source_id == source_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.highlights.iter()
    }

    /// Update the stored color, keeping it in step with the mirrored
    /// card. Returns false (with a warning) when the id is unknown.
    pub(crate) fn set_color(&mut self, id: HighlightId, color: &str) -> bool {
        match self.highlights.iter_mut().find(|h| h.id == id) {
            Some(highlight) => {
                highlight.color = color.to_string();
                true
            },
            None => {
                warn!("set_color: highlight {id} not found");
                false
            },
        }
    }

    /// Rewrite `source_id` on every highlight that still points at
    /// `old_source_id`. Refuses with zero writes when the old id is
    /// missing or empty. Returns the number of rewritten records.
    pub(crate) fn remap_source(
        &mut self,
        new_source_id: &str,
        old_source_id: Option<&str>,
    ) -> usize {
        let Some(old) = old_source_id.filter(|s| !s.is_empty()) else {
            warn!("remap_source: no previous source id, skipping remap");
            return 0;
        };
        let mut remapped = 0;
        for highlight in &mut self.highlights {
            if highlight.source_id == old {
                highlight.source_id = new_source_id.to_string();
                remapped += 1;
            }
        }
        remapped
    }

    /// Fill in missing source names for a document. Never overwrites a
    /// name that is already present. Returns how many records changed.
    pub(crate) fn heal_source_names(&mut self, source_id: &str, source_name: &str) -> usize {
        let mut healed = 0;
        for highlight in &mut self.highlights {
            if highlight.source_id == source_id
                && highlight.source_name.as_deref().is_none_or(str::is_empty)
            {
                highlight.source_name = Some(source_name.to_string());
                healed += 1;
            }
        }
        healed
    }

    pub fn export_state(&self) -> Vec<Highlight> {
        self.highlights.clone()
    }

    /// Replace the store contents from a snapshot. When
    /// `new_source_id` is given, every imported highlight is re-homed to
    /// it (single-book import into a freshly opened file).
    pub(crate) fn import_state(&mut self, highlights: Vec<Highlight>, new_source_id: Option<&str>) {
        self.highlights = highlights;
        if let Some(source_id) = new_source_id {
            for highlight in &mut self.highlights {
                highlight.source_id = source_id.to_string();
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.highlights.clear();
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }
}
