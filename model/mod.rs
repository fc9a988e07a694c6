/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Data model shared across the stores and the synchronization router.
//!
//! Core records:
//! - `Highlight`: one annotation anchored inside a document
//! - `Card`: the mind-map projection of a highlight, or a freestanding note
//! - `Connection`: a user-drawn directed edge between two cards
//! - `DocumentRecord`: a known source document, loaded or not
//!
//! Boundary: records are plain data. All lifecycle rules (tombstones,
//! cascades, remapping) live in `stores/`; views never mutate records
//! directly.

use euclid::default::Point2D;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// Stable highlight identity.
pub type HighlightId = Uuid;

/// Stable card identity.
pub type CardId = Uuid;

/// Stable connection identity.
pub type ConnectionId = Uuid;

/// Document identity derived from file metadata at open time (hex digest,
/// 32 chars). Deliberately cheap and therefore unstable across file
/// copies; `stores::documents` carries the content-hash reconciliation
/// that compensates after a reopen.
pub type DocumentId = String;

/// Text recorded on highlights that back image captures. Such highlights
/// never spawn a text card; the image path mints the card itself.
pub const IMAGE_SELECTION_TEXT: &str = "[Image Selection]";

/// Current wall-clock time as an RFC 3339 string, the form persisted in
/// `created_at` / `registered_at` fields.
pub(crate) fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Axis-aligned rectangle in normalized page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One selection rectangle pinned to a page. A text selection that
/// crosses a page break carries rects on more than one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub page: u32,
    pub rect: RectF,
}

/// 2-D placement on the mind-map canvas. Stored as a fallback for when
/// the canvas has not yet run layout over a restored card.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn point(&self) -> Point2D<f32> {
        Point2D::new(self.x, self.y)
    }
}

impl From<Point2D<f32>> for Position {
    fn from(p: Point2D<f32>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Where a highlight is anchored inside its document.
///
/// Paginated text spans one or more page rectangles; reflowable text uses
/// an opaque content-position marker owned by the reader; plain text uses
/// a character range; drawn areas and marker strokes carry page geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "anchor", rename_all = "kebab-case")]
pub enum HighlightAnchor {
    PageRects {
        page: u32,
        rects: Vec<PageRect>,
    },
    ContentPosition {
        marker: String,
    },
    CharRange {
        offset: usize,
        length: usize,
    },
    Area {
        page: u32,
        bounds: RectF,
    },
    MarkerStroke {
        page: u32,
        points: Vec<[f32; 2]>,
        height: f32,
        bounds: RectF,
    },
}

impl HighlightAnchor {
    /// Page the anchor starts on, when the document is paginated.
    pub fn page(&self) -> Option<u32> {
        match self {
            HighlightAnchor::PageRects { page, .. }
            | HighlightAnchor::Area { page, .. }
            | HighlightAnchor::MarkerStroke { page, .. } => Some(*page),
            HighlightAnchor::ContentPosition { .. } | HighlightAnchor::CharRange { .. } => None,
        }
    }

    /// Vertical position of the anchor's first geometry, used for
    /// annotation-list ordering within a page.
    pub fn top(&self) -> f32 {
        match self {
            HighlightAnchor::PageRects { rects, .. } => {
                rects.first().map(|r| r.rect.y).unwrap_or(0.0)
            },
            HighlightAnchor::Area { bounds, .. } | HighlightAnchor::MarkerStroke { bounds, .. } => {
                bounds.y
            },
            HighlightAnchor::ContentPosition { .. } => 0.0,
            HighlightAnchor::CharRange { offset, .. } => *offset as f32,
        }
    }
}

/// Selection shape the highlight was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Text,
    Image,
    Highlighter,
    Rectangle,
    Ellipse,
}

/// What a card renders as on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Text,
    Image,
}

/// One annotation anchored inside a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Stable highlight identity.
    pub id: HighlightId,

    /// Trimmed representative text; [`IMAGE_SELECTION_TEXT`] for image
    /// captures.
    pub text: String,

    pub anchor: HighlightAnchor,

    /// Owning document. Mutable only through source remapping.
    pub source_id: DocumentId,

    /// Display name of the owning document. May start out empty and is
    /// healed when the document is next opened.
    pub source_name: Option<String>,

    pub kind: HighlightKind,

    /// CSS-style color string, shared with the mirrored card.
    pub color: String,

    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// The mind-map projection of a highlight, or a freestanding note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Stable card identity.
    pub id: CardId,

    pub kind: CardKind,

    /// Backing highlight. `None` once the card is decoupled (duplicated
    /// on the canvas, or created as a freestanding note).
    pub highlight_id: Option<HighlightId>,

    /// Rendered text, or a caption for image cards.
    pub content: String,

    /// Base64 data URL for image cards.
    pub image_data: Option<String>,

    /// Free-text user note, independent of the highlighted text.
    pub note: String,

    /// Owning document; `None` for decoupled cards.
    pub source_id: Option<DocumentId>,

    /// Display name of the owning document; healed lazily.
    pub source_name: Option<String>,

    /// Fallback canvas placement.
    pub position: Position,

    pub color: String,

    /// Tombstone flag. Tombstoned cards survive in the store (and in
    /// exports until cleanup) so a canvas undo can restore them.
    pub deleted: bool,

    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl Card {
    /// Derive the card that mirrors a freshly created highlight.
    pub(crate) fn from_highlight(highlight: &Highlight, position: Position) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: CardKind::Text,
            highlight_id: Some(highlight.id),
            content: highlight.text.clone(),
            image_data: None,
            note: String::new(),
            source_id: Some(highlight.source_id.clone()),
            source_name: highlight.source_name.clone(),
            position,
            color: highlight.color.clone(),
            deleted: false,
            created_at: timestamp_now(),
        }
    }
}

/// A user-drawn directed edge between two cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source_id: CardId,
    pub target_id: CardId,
}

/// A document the workspace knows about, whether or not its bytes are
/// currently available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub name: String,
    pub mime_type: String,

    /// False when restored from a snapshot until the user re-supplies the
    /// file bytes.
    pub loaded: bool,

    /// RFC 3339 registration timestamp.
    pub registered_at: String,
}
