/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Canonical annotation state.
//!
//! Four stores, each a plain struct owned by [`crate::app::Workspace`]
//! and injected where needed. Stores mutate state and report what
//! changed; broadcasting the change to view adapters is the workspace's
//! job, always after the mutation has fully landed.

pub mod cards;
pub mod connections;
pub mod documents;
pub mod highlights;

pub use cards::{CardStore, CleanupReport, SoftDeleteChange};
pub use connections::ConnectionStore;
pub use documents::{DocumentRegistry, PendingRestore};
pub use highlights::HighlightStore;
