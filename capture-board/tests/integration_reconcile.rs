//! End-to-end drag, persist and settle cycles against an in-memory server

use capture_board::api::memory::{ApiCall, InMemoryBoardApi};
use capture_board::drag::{DragHandle, HoverTarget, Placement};
use capture_board::types::{Point, Rect};
use capture_board::{
    BoardEngine, BoardError, BoardEvents, BoardSnapshot, Card, CardId, Column, ColumnId,
    ProjectionState, RemoteProjection,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingEvents {
    moves: Mutex<Vec<(String, String, String)>>,
    deletes: Mutex<Vec<(String, String)>>,
}

impl BoardEvents for RecordingEvents {
    fn on_card_move(&self, card: &CardId, from: &ColumnId, to: &ColumnId) {
        self.moves
            .lock()
            .unwrap()
            .push((card.to_string(), from.to_string(), to.to_string()));
    }

    fn on_card_delete(&self, card: &CardId, column: &ColumnId) {
        self.deletes
            .lock()
            .unwrap()
            .push((card.to_string(), column.to_string()));
    }
}

fn server_board() -> BoardSnapshot {
    BoardSnapshot::new(vec![
        Column::new("colX", "Prospecting", 1).with_cards([
            Card::property("card1", "Apartment, 2 bedrooms").with_address("Rua das Flores, 12"),
            Card::contact("card2", "Joana Lima").with_status("hot"),
        ]),
        Column::new("colY", "Visit", 2),
        Column::new("colZ", "Proposal", 3).with_cards([Card::property("card3", "Beach house")]),
        Column::new("colW", "Closed", 4),
    ])
}

async fn setup() -> (
    Arc<InMemoryBoardApi>,
    Arc<RecordingEvents>,
    BoardEngine<InMemoryBoardApi>,
) {
    let api = Arc::new(InMemoryBoardApi::new(server_board()).with_identity("broker-1"));
    let events = Arc::new(RecordingEvents::default());
    let projection = Arc::new(RemoteProjection::new(api.clone()));
    let mut engine = BoardEngine::with_parts(api.clone(), projection, events.clone());
    assert!(engine.mount().await.unwrap());
    api.clear_calls();
    (api, events, engine)
}

fn column_bounds(index: usize) -> Rect {
    Rect::new(index as f64 * 300.0, 0.0, 280.0, 800.0)
}

fn column_ids(snapshot: &BoardSnapshot) -> Vec<String> {
    snapshot.columns.iter().map(|c| c.id.to_string()).collect()
}

fn orders(snapshot: &BoardSnapshot) -> Vec<u32> {
    snapshot.columns.iter().map(|c| c.order).collect()
}

#[tokio::test]
async fn test_column_reorder_persists_dense_orders() {
    let (api, _events, mut engine) = setup().await;

    // Drag colW over the right half of colX: lands second.
    engine
        .begin_drag(DragHandle::Column("colW".into()))
        .unwrap();
    let changed = engine
        .drag_over(
            &HoverTarget::Column {
                id: "colX".into(),
                bounds: column_bounds(0),
            },
            Point::new(200.0, 50.0),
        )
        .unwrap();
    assert!(changed);
    assert_eq!(
        column_ids(engine.snapshot()),
        ["colX", "colW", "colY", "colZ"]
    );

    let outcome = engine.drop_and_reconcile().await.unwrap().unwrap();
    assert!(outcome.is_persisted());

    // colX keeps order 1; every shifted sibling is written, nothing else.
    assert_eq!(
        api.write_calls(),
        vec![
            ApiCall::UpdateColumnOrder {
                id: "colW".into(),
                order: 2
            },
            ApiCall::UpdateColumnOrder {
                id: "colY".into(),
                order: 3
            },
            ApiCall::UpdateColumnOrder {
                id: "colZ".into(),
                order: 4
            },
        ]
    );
    assert_eq!(orders(engine.snapshot()), [1, 2, 3, 4]);
    assert_eq!(engine.in_flight(), 0);

    // The projection was invalidated and now agrees with the working board.
    assert!(matches!(
        engine.projection().state().await,
        ProjectionState::Ready { stale: true, .. }
    ));
    engine.hydrate().await.unwrap();
    assert_eq!(
        column_ids(engine.snapshot()),
        ["colX", "colW", "colY", "colZ"]
    );
    assert_eq!(orders(engine.snapshot()), [1, 2, 3, 4]);
}

#[tokio::test]
async fn test_failed_reorder_rolls_back_to_pre_drag_snapshot() {
    let (api, _events, mut engine) = setup().await;
    let before = engine.snapshot().clone();

    engine
        .begin_drag(DragHandle::Column("colX".into()))
        .unwrap();
    // Sweep across every column, both halves, several times.
    for pass in 0..3 {
        for index in 0..4 {
            for x in [60.0, 220.0] {
                engine
                    .drag_over(
                        &HoverTarget::Column {
                            id: ["colX", "colY", "colZ", "colW"][index].into(),
                            bounds: column_bounds(index),
                        },
                        Point::new(index as f64 * 300.0 + x, 10.0 + pass as f64),
                    )
                    .unwrap();
            }
        }
    }
    assert_eq!(
        column_ids(engine.snapshot()),
        ["colY", "colZ", "colW", "colX"]
    );

    api.fail_writes(true);
    let outcome = engine.drop_and_reconcile().await.unwrap().unwrap();
    assert!(!outcome.is_persisted());

    assert_eq!(engine.snapshot(), &before);
    assert_eq!(engine.notices().len(), 1);
    assert!(engine
        .notices()
        .iter()
        .any(|n| n.message.contains("try again")));
}

#[tokio::test]
async fn test_conflict_on_one_sibling_rolls_back_whole_move() {
    let (api, _events, mut engine) = setup().await;
    let before = engine.snapshot().clone();
    api.reject_column("colY");

    let outcome = engine
        .move_column(&"colZ".into(), 0)
        .await
        .unwrap()
        .unwrap();
    assert!(!outcome.is_persisted());
    assert_eq!(engine.snapshot(), &before);
}

#[tokio::test]
async fn test_cross_column_card_move_fires_callback_once() {
    let (api, events, mut engine) = setup().await;

    engine
        .begin_drag(DragHandle::Card("card1".into()))
        .unwrap();
    engine
        .drag_over(
            &HoverTarget::ColumnSpace {
                column_id: "colY".into(),
            },
            Point::new(400.0, 300.0),
        )
        .unwrap();
    // Hovering the same empty column again changes nothing.
    assert!(!engine
        .drag_over(
            &HoverTarget::ColumnSpace {
                column_id: "colY".into(),
            },
            Point::new(410.0, 320.0),
        )
        .unwrap());

    let outcome = engine.drop_and_reconcile().await.unwrap().unwrap();
    assert!(outcome.is_persisted());

    let board = engine.snapshot();
    let x: Vec<_> = board.columns[0].cards.iter().map(|c| c.id.as_str()).collect();
    let y: Vec<_> = board.columns[1].cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(x, ["card2"]);
    assert_eq!(y, ["card1"]);

    assert_eq!(
        *events.moves.lock().unwrap(),
        vec![("card1".into(), "colX".into(), "colY".into())]
    );
    // Card order is never written by the engine itself.
    assert!(api.write_calls().is_empty());
}

#[tokio::test]
async fn test_within_column_card_move_has_no_callback() {
    let (_api, events, mut engine) = setup().await;

    engine
        .begin_drag(DragHandle::Card("card1".into()))
        .unwrap();
    engine
        .drag_over(
            &HoverTarget::Card {
                id: "card2".into(),
                column_id: "colX".into(),
                bounds: Rect::new(0.0, 100.0, 280.0, 100.0),
            },
            Point::new(10.0, 180.0),
        )
        .unwrap();
    engine.drop_and_reconcile().await.unwrap().unwrap();

    let ids: Vec<_> = engine.snapshot().columns[0]
        .cards
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, ["card2", "card1"]);
    assert!(events.moves.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_drop_at_origin_and_drop_outside_leave_board_untouched() {
    let (api, _events, mut engine) = setup().await;
    let before = engine.snapshot().clone();

    engine
        .begin_drag(DragHandle::Card("card2".into()))
        .unwrap();
    engine
        .place(Placement::Card {
            column_id: "colZ".into(),
            index: 0,
        })
        .unwrap();
    engine
        .place(Placement::Card {
            column_id: "colX".into(),
            index: 1,
        })
        .unwrap();
    assert!(engine.drop_drag().unwrap().is_none());
    assert_eq!(engine.snapshot(), &before);
    assert_eq!(engine.revision(), 0);

    engine
        .begin_drag(DragHandle::Card("card2".into()))
        .unwrap();
    engine
        .place(Placement::Card {
            column_id: "colW".into(),
            index: 0,
        })
        .unwrap();
    assert_ne!(engine.snapshot(), &before);
    assert!(engine.drag_leave().unwrap());
    assert_eq!(engine.snapshot(), &before);
    assert!(engine.drop_drag().unwrap().is_none());
    assert_eq!(engine.snapshot(), &before);

    assert!(api.write_calls().is_empty());
}

#[tokio::test]
async fn test_delete_non_empty_column_is_rejected_locally() {
    let (api, _events, mut engine) = setup().await;
    let before = engine.snapshot().clone();

    let result = engine.delete_column(&"colX".into()).await;
    assert!(matches!(
        result,
        Err(BoardError::ColumnNotEmpty { count: 2, .. })
    ));
    assert!(api.calls().is_empty());
    assert_eq!(engine.snapshot(), &before);
    assert_eq!(engine.notices().len(), 1);
}

#[tokio::test]
async fn test_delete_empty_column_and_card() {
    let (api, events, mut engine) = setup().await;

    engine.delete_column(&"colY".into()).await.unwrap();
    assert!(engine.snapshot().column(&"colY".into()).is_none());

    engine.delete_card(&"card3".into()).await.unwrap();
    assert!(engine.snapshot().card(&"card3".into()).is_none());
    assert_eq!(
        *events.deletes.lock().unwrap(),
        vec![("card3".into(), "colZ".into())]
    );
    assert_eq!(
        api.write_calls(),
        vec![
            ApiCall::DeleteColumn { id: "colY".into() },
            ApiCall::DeleteCard { id: "card3".into() },
        ]
    );
}

#[tokio::test]
async fn test_create_column_appends_with_next_order() {
    let (api, _events, mut engine) = setup().await;

    let column = engine.create_column("Signed").await.unwrap();
    assert_eq!(column.order, 5);
    assert_eq!(engine.snapshot().columns.last().unwrap().id, column.id);
    assert_eq!(
        api.write_calls(),
        vec![ApiCall::CreateColumn {
            title: "Signed".into(),
            order: 5
        }]
    );
}

#[tokio::test]
async fn test_crud_is_rejected_during_drag() {
    let (api, _events, mut engine) = setup().await;
    engine
        .begin_drag(DragHandle::Column("colY".into()))
        .unwrap();
    assert!(matches!(
        engine.delete_column(&"colY".into()).await,
        Err(BoardError::DragInProgress)
    ));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_keeps_working_snapshot() {
    let (api, _events, mut engine) = setup().await;
    let before = engine.snapshot().clone();

    api.fail_fetch(true);
    assert!(engine.mount().await.is_err());
    assert_eq!(engine.snapshot(), &before);
    assert!(engine.projection().state().await.error().is_some());
}

#[tokio::test]
async fn test_stale_failure_does_not_discard_newer_move() {
    let (api, _events, mut engine) = setup().await;
    let dispatcher = engine.dispatcher();

    // First gesture: commit locally, persistence still pending.
    engine
        .begin_drag(DragHandle::Column("colW".into()))
        .unwrap();
    engine.place(Placement::Column { index: 0 }).unwrap();
    let first = engine.drop_drag().unwrap().unwrap();

    // Second gesture on top of the optimistic board.
    engine
        .begin_drag(DragHandle::Card("card3".into()))
        .unwrap();
    engine
        .place(Placement::Card {
            column_id: "colY".into(),
            index: 0,
        })
        .unwrap();
    let second = engine.drop_drag().unwrap().unwrap();
    assert_eq!(engine.in_flight(), 2);
    let after_second = engine.snapshot().clone();

    // The first confirmation fails after the second was committed.
    api.fail_writes(true);
    let first_outcome = dispatcher.persist(first).await;
    engine.settle(first_outcome);
    assert_eq!(engine.snapshot(), &after_second);
    assert!(engine.needs_resync());

    // Server state is not adopted while the second is still unsettled.
    assert!(!engine.hydrate().await.unwrap());

    api.fail_writes(false);
    let second_outcome = dispatcher.persist(second).await;
    engine.settle(second_outcome);
    assert!(engine.hydrate().await.unwrap());
    assert!(!engine.needs_resync());
    assert_eq!(engine.snapshot(), &api.board());
}

#[tokio::test]
async fn test_chained_column_moves_keep_server_orders_unique() {
    let (api, _events, mut engine) = setup().await;
    let dispatcher = engine.dispatcher();

    engine
        .begin_drag(DragHandle::Column("colW".into()))
        .unwrap();
    engine.place(Placement::Column { index: 0 }).unwrap();
    let first = engine.drop_drag().unwrap().unwrap();

    // Started before the first move is confirmed.
    engine
        .begin_drag(DragHandle::Column("colX".into()))
        .unwrap();
    engine.place(Placement::Column { index: 3 }).unwrap();
    let second = engine.drop_drag().unwrap().unwrap();

    let first_outcome = dispatcher.persist(first).await;
    engine.settle(first_outcome);
    let second_outcome = dispatcher.persist(second).await;
    engine.settle(second_outcome);

    assert!(!engine.needs_resync());
    let server = BoardSnapshot::sorted_by_order(api.board().columns);
    assert_eq!(column_ids(&server), ["colW", "colY", "colZ", "colX"]);
    assert_eq!(orders(&server), [1, 2, 3, 4]);
    assert_eq!(column_ids(engine.snapshot()), column_ids(&server));
    assert_eq!(orders(engine.snapshot()), [1, 2, 3, 4]);
}

#[tokio::test]
async fn test_out_of_order_confirmation_triggers_resync() {
    let (api, _events, mut engine) = setup().await;
    let dispatcher = engine.dispatcher();

    engine
        .begin_drag(DragHandle::Column("colW".into()))
        .unwrap();
    engine.place(Placement::Column { index: 0 }).unwrap();
    let first = engine.drop_drag().unwrap().unwrap();

    engine
        .begin_drag(DragHandle::Column("colX".into()))
        .unwrap();
    engine.place(Placement::Column { index: 3 }).unwrap();
    let second = engine.drop_drag().unwrap().unwrap();

    // The server applies the second move, then the late first one.
    let second_outcome = dispatcher.persist(second).await;
    let first_outcome = dispatcher.persist(first).await;
    engine.settle(second_outcome);
    engine.settle(first_outcome);

    assert_eq!(engine.in_flight(), 0);
    assert!(engine.needs_resync());

    assert!(engine.hydrate().await.unwrap());
    assert!(!engine.needs_resync());
    assert_eq!(
        column_ids(engine.snapshot()),
        column_ids(&BoardSnapshot::sorted_by_order(api.board().columns))
    );
    assert_eq!(orders(engine.snapshot()), [1, 2, 3, 4]);
}

#[tokio::test]
async fn test_partial_reorder_failure_is_reverted_on_server() {
    let (api, _events, mut engine) = setup().await;
    let before = engine.snapshot().clone();
    api.reject_column("colW");

    engine
        .begin_drag(DragHandle::Column("colW".into()))
        .unwrap();
    engine.place(Placement::Column { index: 0 }).unwrap();
    let failed = engine.drop_drag().unwrap().unwrap();
    let outcome = engine.dispatcher().persist(failed).await;
    assert!(!outcome.is_persisted());
    engine.settle(outcome);

    assert_eq!(engine.snapshot(), &before);
    assert!(engine.needs_resync());
    // Siblings written before the conflict got their old order back.
    assert!(api.write_calls().contains(&ApiCall::UpdateColumnOrder {
        id: "colX".into(),
        order: 1,
    }));
    let server = BoardSnapshot::sorted_by_order(api.board().columns);
    assert_eq!(column_ids(&server), ["colX", "colY", "colZ", "colW"]);
    assert_eq!(orders(&server), [1, 2, 3, 4]);

    assert!(engine.hydrate().await.unwrap());
    assert!(!engine.needs_resync());

    let outcome = engine
        .move_column(&"colY".into(), 0)
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.is_persisted());

    let server = BoardSnapshot::sorted_by_order(api.board().columns);
    assert_eq!(column_ids(&server), ["colY", "colX", "colZ", "colW"]);
    assert_eq!(orders(&server), [1, 2, 3, 4]);
    assert_eq!(engine.snapshot(), &server);
}

#[tokio::test]
async fn test_failed_reorder_resyncs_from_server() {
    let (api, _events, mut engine) = setup().await;
    api.reject_column("colY");

    // Another session renames a stage while the move is in flight.
    let mut remote = api.board();
    remote.columns[3].title = "Won".into();
    api.set_board(remote);

    let outcome = engine
        .move_column(&"colZ".into(), 0)
        .await
        .unwrap()
        .unwrap();
    assert!(!outcome.is_persisted());
    assert!(!engine.needs_resync());
    assert_eq!(engine.snapshot().columns[3].title, "Won");
    assert_eq!(orders(engine.snapshot()), [1, 2, 3, 4]);
}
