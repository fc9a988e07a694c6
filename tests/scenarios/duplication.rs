/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Canvas node duplication: a doubled reference mints a decoupled card
//! and the re-bind reaches the canvas only after the event chain ends.

use euclid::default::Point2D;
use marginalia::router::{ViewCommand, ViewEvent};

use crate::support::Harness;

#[test]
fn scenario_duplicate_mints_decoupled_card() {
    let mut harness = Harness::new();
    let (highlight_id, card_id) = harness.select_text("doc-a", "duplicated", 2, 0.4);
    harness.drain();

    harness.workspace.apply_event(ViewEvent::NodeInserted {
        card_id,
        occurrences: 2,
        position: Point2D::new(300.0, 200.0),
    });

    // Exactly one new card, cloned content, no highlight, no source.
    assert_eq!(harness.workspace.cards.len(), 2);
    let duplicate = harness
        .workspace
        .cards
        .iter()
        .find(|c| c.id != card_id)
        .unwrap();
    assert_eq!(duplicate.content, "duplicated");
    assert!(duplicate.highlight_id.is_none());
    assert!(duplicate.source_id.is_none());
    assert!(duplicate.source_name.is_none());
    let duplicate_id = duplicate.id;

    // The original card still owns the highlight.
    let original = harness.workspace.cards.get(card_id).unwrap();
    assert_eq!(original.highlight_id, Some(highlight_id));
    assert_eq!(
        harness.workspace.cards.get_by_highlight(highlight_id).unwrap().id,
        card_id
    );

    // Other views hear about the new card immediately; the re-bind is
    // deferred past the canvas's in-flight insert.
    let list_commands = Harness::commands(&harness.list);
    assert!(matches!(&list_commands[..], [ViewCommand::CardAdded(_)]));
    assert!(Harness::commands(&harness.mind_map).is_empty());

    let delivered = harness.workspace.drain_deferred();
    assert_eq!(delivered, 1);
    let map_commands = Harness::commands(&harness.mind_map);
    match &map_commands[..] {
        [ViewCommand::RebindNode {
            old_card_id,
            new_card_id,
        }] => {
            assert_eq!(*old_card_id, card_id);
            assert_eq!(*new_card_id, duplicate_id);
        },
        other => panic!("unexpected commands: {other:?}"),
    }
}

#[test]
fn scenario_duplicate_of_tombstoned_card_does_not_restore_it() {
    let mut harness = Harness::new();
    let (_, card_id) = harness.select_text("doc-a", "ghost", 1, 0.1);
    harness
        .workspace
        .apply_event(ViewEvent::NodeRemoved { card_id });
    harness.drain();

    // Occurrence count wins over the tombstone check: the paste made a
    // second reference, so a decoupled copy is minted and the original
    // stays tombstoned.
    harness.workspace.apply_event(ViewEvent::NodeInserted {
        card_id,
        occurrences: 2,
        position: Point2D::new(0.0, 0.0),
    });
    assert!(harness.workspace.cards.get(card_id).unwrap().deleted);
    assert_eq!(harness.workspace.cards.live().count(), 1);
}

#[test]
fn scenario_insert_of_unknown_card_is_dropped() {
    let mut harness = Harness::new();
    harness.workspace.apply_event(ViewEvent::NodeInserted {
        card_id: uuid::Uuid::new_v4(),
        occurrences: 1,
        position: Point2D::new(0.0, 0.0),
    });
    assert!(harness.workspace.cards.is_empty());
    assert_eq!(harness.workspace.drain_deferred(), 0);
    harness.drain();
}

#[test]
fn scenario_structural_move_is_a_noop() {
    let mut harness = Harness::new();
    let (_, card_id) = harness.select_text("doc-a", "moved", 1, 0.1);
    harness.workspace.take_save_request();
    harness.drain();

    harness.workspace.apply_event(ViewEvent::NodeInserted {
        card_id,
        occurrences: 1,
        position: Point2D::new(500.0, 500.0),
    });

    assert_eq!(harness.workspace.cards.len(), 1);
    assert!(!harness.workspace.take_save_request());
    assert!(Harness::commands(&harness.document).is_empty());
    assert!(Harness::commands(&harness.list).is_empty());
}
