/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shared scenario harness: a workspace with all three view adapters
//! subscribed, plus helpers for the common event sequences.

use crossbeam_channel::Receiver;
use marginalia::Workspace;
use marginalia::model::{CardId, HighlightAnchor, HighlightId, HighlightKind, PageRect, RectF};
use marginalia::router::{Envelope, ViewCommand, ViewEvent, ViewOrigin};

pub struct Harness {
    pub workspace: Workspace,
    pub document: Receiver<Envelope>,
    pub mind_map: Receiver<Envelope>,
    pub list: Receiver<Envelope>,
}

impl Harness {
    pub fn new() -> Self {
        let mut workspace = Workspace::new();
        let document = workspace.subscribe(ViewOrigin::Document);
        let mind_map = workspace.subscribe(ViewOrigin::MindMap);
        let list = workspace.subscribe(ViewOrigin::AnnotationList);
        Self {
            workspace,
            document,
            mind_map,
            list,
        }
    }

    /// Discard every pending envelope on every channel.
    pub fn drain(&self) {
        for rx in [&self.document, &self.mind_map, &self.list] {
            while rx.try_recv().is_ok() {}
        }
    }

    /// Collect the pending commands on one channel.
    pub fn commands(rx: &Receiver<Envelope>) -> Vec<ViewCommand> {
        let mut out = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            out.push(envelope.command);
        }
        out
    }

    /// Drive a reader text selection and return the resulting ids.
    pub fn select_text(
        &mut self,
        source_id: &str,
        text: &str,
        page: u32,
        top: f32,
    ) -> (HighlightId, CardId) {
        self.workspace.apply_event(ViewEvent::RegionSelected {
            source_id: source_id.to_string(),
            text: text.to_string(),
            anchor: page_anchor(page, top),
            kind: HighlightKind::Text,
            color: "#ffeb3b".to_string(),
        });
        let card = self
            .workspace
            .cards
            .iter()
            .find(|c| c.content == text)
            .expect("selection should have minted a card");
        (card.highlight_id.expect("card should be coupled"), card.id)
    }
}

pub fn page_anchor(page: u32, top: f32) -> HighlightAnchor {
    HighlightAnchor::PageRects {
        page,
        rects: vec![PageRect {
            page,
            rect: RectF {
                x: 0.1,
                y: top,
                width: 0.5,
                height: 0.02,
            },
        }],
    }
}
