/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Node sizing helpers for the canvas adapter.
//!
//! Image card payloads are base64 data URLs; probing their pixel size is
//! best-effort. A payload that fails to decode gets the fallback size
//! and a warning, never an error.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use euclid::default::Size2D;
use log::warn;

/// Bounding box for image nodes on the canvas.
pub const MAX_IMAGE_NODE_SIZE: Size2D<f32> = Size2D::new(400.0, 300.0);

/// Fallback node size when sizing fails.
pub const DEFAULT_NODE_SIZE: Size2D<f32> = Size2D::new(200.0, 120.0);

const MIN_TEXT_WIDTH: f32 = 120.0;
const MAX_TEXT_WIDTH: f32 = 320.0;
const TEXT_PADDING: f32 = 32.0;
const LINE_HEIGHT: f32 = 24.0;
const MIN_TEXT_HEIGHT: f32 = 60.0;
const CHAR_WIDTH_WIDE: f32 = 16.0;
const CHAR_WIDTH_NARROW: f32 = 9.0;

/// Decode a base64 data URL (or a bare base64 payload) into bytes.
fn decode_data_url(data: &str) -> Option<Vec<u8>> {
    let payload = match data.split_once(";base64,") {
        Some((_, payload)) => payload,
        None => data,
    };
    STANDARD.decode(payload.trim()).ok()
}

/// Probe the pixel dimensions of an image card payload.
pub fn probe_image_size(data_url: &str) -> Option<Size2D<f32>> {
    let bytes = decode_data_url(data_url)?;
    match image::load_from_memory(&bytes) {
        Ok(img) => Some(Size2D::new(img.width() as f32, img.height() as f32)),
        Err(e) => {
            warn!("failed to decode image payload: {e}");
            None
        },
    }
}

/// Aspect-preserving clamp of an image to the canvas node bounds.
pub fn fit_image_node(size: Size2D<f32>) -> Size2D<f32> {
    if size.width <= 0.0 || size.height <= 0.0 {
        return DEFAULT_NODE_SIZE;
    }
    let scale = (MAX_IMAGE_NODE_SIZE.width / size.width)
        .min(MAX_IMAGE_NODE_SIZE.height / size.height)
        .min(1.0);
    Size2D::new(size.width * scale, size.height * scale)
}

/// Node size for an image card, with the fallback on decode failure.
pub fn image_node_size(data_url: &str) -> Size2D<f32> {
    probe_image_size(data_url)
        .map(fit_image_node)
        .unwrap_or(DEFAULT_NODE_SIZE)
}

/// Estimated node size for a text card. Visual width counts CJK and
/// other wide characters double-ish; height comes from a wrap estimate
/// against the clamped width.
pub fn text_node_size(text: &str) -> Size2D<f32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return DEFAULT_NODE_SIZE;
    }

    let visual_width: f32 = trimmed
        .chars()
        .map(|ch| {
            if (ch as u32) > 0xff {
                CHAR_WIDTH_WIDE
            } else {
                CHAR_WIDTH_NARROW
            }
        })
        .sum();

    let width = (visual_width + TEXT_PADDING).clamp(MIN_TEXT_WIDTH, MAX_TEXT_WIDTH);
    let usable = width - TEXT_PADDING;
    let lines = (visual_width / usable).ceil().max(1.0);
    let height = (lines * LINE_HEIGHT + TEXT_PADDING).max(MIN_TEXT_HEIGHT);
    Size2D::new(width, height)
}
