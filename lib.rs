/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Annotation synchronization core for a desktop reading app.
//!
//! Highlights made in a document reader are mirrored as cards on a
//! mind-map canvas and as rows in an annotation list. This crate owns the
//! canonical annotation state (highlights, cards, connections, known
//! documents) and the router that keeps the three views consistent
//! without echo loops. The views themselves are external adapters; they
//! feed [`router::ViewEvent`]s in and receive [`router::ViewCommand`]s
//! back over per-subscriber channels.

pub mod app;
pub mod assets;
pub mod model;
pub mod persistence;
pub mod router;
pub mod stores;

pub use app::Workspace;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
