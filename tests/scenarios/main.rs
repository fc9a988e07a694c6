/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! End-to-end scenarios driving the workspace the way the view
//! adapters do: events in, envelopes out, snapshots to disk.

use marginalia::VERSION;

mod duplication;
mod remap;
mod selection;
mod support;

#[test]
fn scenarios_smoke() {
    assert!(!VERSION.is_empty());
}
