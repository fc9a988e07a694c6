/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Selection synchronization: clicks propagate to the other two views
//! and never echo back to the originating one.

use marginalia::router::{ViewCommand, ViewEvent, ViewOrigin};
use rstest::rstest;

use crate::support::Harness;

fn select_commands(commands: &[ViewCommand]) -> (usize, usize) {
    let cards = commands
        .iter()
        .filter(|c| matches!(c, ViewCommand::SelectCard { .. }))
        .count();
    let highlights = commands
        .iter()
        .filter(|c| matches!(c, ViewCommand::SelectHighlight { .. }))
        .count();
    (cards, highlights)
}

#[rstest]
#[case::from_canvas(ViewOrigin::MindMap)]
#[case::from_list(ViewOrigin::AnnotationList)]
fn scenario_card_selection_reaches_other_views(#[case] origin: ViewOrigin) {
    let mut harness = Harness::new();
    let (_, card_id) = harness.select_text("doc-a", "find me", 2, 0.3);
    harness.workspace.take_save_request();
    harness.drain();

    let event = match origin {
        ViewOrigin::MindMap => ViewEvent::NodeSelected { card_id },
        ViewOrigin::AnnotationList => ViewEvent::AnnotationSelected { card_id },
        ViewOrigin::Document => unreachable!(),
    };
    harness.workspace.apply_event(event);

    // The reader scrolls to the highlight; the other non-origin view
    // focuses the card. The origin hears nothing.
    let doc = select_commands(&Harness::commands(&harness.document));
    assert_eq!(doc.1, 1, "reader should be told to scroll");

    let (origin_rx, other_rx) = match origin {
        ViewOrigin::MindMap => (&harness.mind_map, &harness.list),
        ViewOrigin::AnnotationList => (&harness.list, &harness.mind_map),
        ViewOrigin::Document => unreachable!(),
    };
    assert!(Harness::commands(origin_rx).is_empty());
    let other = select_commands(&Harness::commands(other_rx));
    assert_eq!(other.0, 1, "other view should focus the card");

    // Selection is not a store mutation.
    assert!(!harness.workspace.take_save_request());
}

#[test]
fn scenario_highlight_click_selects_card_elsewhere() {
    let mut harness = Harness::new();
    let (highlight_id, card_id) = harness.select_text("doc-a", "clicked", 1, 0.1);
    harness.drain();

    harness
        .workspace
        .apply_event(ViewEvent::HighlightClicked { highlight_id });

    for rx in [&harness.mind_map, &harness.list] {
        let commands = Harness::commands(rx);
        match &commands[..] {
            [ViewCommand::SelectCard { card_id: selected }] => assert_eq!(*selected, card_id),
            other => panic!("unexpected commands: {other:?}"),
        }
    }
    assert!(Harness::commands(&harness.document).is_empty());
}

#[test]
fn scenario_selection_of_missing_ids_degrades_silently() {
    let mut harness = Harness::new();
    harness.drain();

    harness.workspace.apply_event(ViewEvent::HighlightClicked {
        highlight_id: uuid::Uuid::new_v4(),
    });
    harness.workspace.apply_event(ViewEvent::NodeSelected {
        card_id: uuid::Uuid::new_v4(),
    });
    harness.workspace.apply_event(ViewEvent::AnnotationSelected {
        card_id: uuid::Uuid::new_v4(),
    });

    for rx in [&harness.document, &harness.mind_map, &harness.list] {
        assert!(Harness::commands(rx).is_empty());
    }
}

#[test]
fn scenario_decoupled_card_selection_skips_reader_leg() {
    let mut harness = Harness::new();
    let (_, card_id) = harness.select_text("doc-a", "template", 1, 0.1);
    harness.workspace.apply_event(ViewEvent::NodeInserted {
        card_id,
        occurrences: 2,
        position: euclid::default::Point2D::new(0.0, 0.0),
    });
    harness.workspace.drain_deferred();
    let duplicate_id = harness
        .workspace
        .cards
        .iter()
        .find(|c| c.highlight_id.is_none())
        .unwrap()
        .id;
    harness.drain();

    harness
        .workspace
        .apply_event(ViewEvent::NodeSelected { card_id: duplicate_id });

    // No backing highlight: the scroll-to-highlight leg drops, the
    // card focus still goes out.
    let doc = select_commands(&Harness::commands(&harness.document));
    assert_eq!(doc.1, 0, "no highlight to scroll to");
    let list = select_commands(&Harness::commands(&harness.list));
    assert_eq!(list.0, 1);
}
