// tests/notification_tests.rs
mod common;

use chrono::Duration;
use common::*;
use foodloop::{notifications::short_order_ref, EngineError, OrderStatus};
use serial_test::serial;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_new_order_appears_as_unviewed_notification() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let soup = item(provider, 9, 1000);
  let bread = item(provider, 9, 300);
  let h = Harness::with_items(vec![soup.clone(), bread.clone()]);

  let placed = h.place(Uuid::new_v4(), vec![line(&soup, 2), line(&bread, 3)]).await;

  let notes = h.engine.notifications().list_notifications(provider).await.unwrap();
  assert_eq!(notes.len(), 1);
  let note = &notes[0];
  let reference = short_order_ref(placed.order.id);
  assert_eq!(reference.len(), 8);
  assert_eq!(note.title, format!("New order #{}", reference));
  assert_eq!(note.message, format!("Order #{} with 5 items is PENDING", reference));
  assert_eq!(note.item_count, 5);
  assert_eq!(note.status, OrderStatus::Pending);
  assert!(!note.viewed);
  assert_eq!(h.engine.notifications().unviewed_count(provider).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_notifications_are_newest_first_and_scoped_to_provider() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let other = Uuid::new_v4();
  let soup = item(provider, 9, 1000);
  let pie = item(other, 9, 700);
  let h = Harness::with_items(vec![soup.clone(), pie.clone()]);

  let first = h.place(Uuid::new_v4(), vec![line(&soup, 1)]).await;
  h.clock.advance(Duration::minutes(1));
  let second = h.place(Uuid::new_v4(), vec![line(&soup, 1)]).await;
  h.place(Uuid::new_v4(), vec![line(&pie, 1)]).await;

  let notes = h.engine.notifications().list_notifications(provider).await.unwrap();
  let ids: Vec<Uuid> = notes.iter().map(|n| n.order_id).collect();
  assert_eq!(ids, vec![second.order.id, first.order.id]);
  assert_eq!(notes[0].message, format!("Order #{} with 1 item is PENDING", short_order_ref(second.order.id)));
}

#[tokio::test]
#[serial]
async fn test_mark_viewed_and_mark_all_viewed() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let soup = item(provider, 9, 1000);
  let h = Harness::with_items(vec![soup.clone()]);

  let a = h.place(Uuid::new_v4(), vec![line(&soup, 1)]).await;
  h.place(Uuid::new_v4(), vec![line(&soup, 1)]).await;
  h.place(Uuid::new_v4(), vec![line(&soup, 1)]).await;

  let relay = h.engine.notifications();
  assert!(relay.mark_viewed(a.order.id, provider).await.unwrap());
  assert!(!relay.mark_viewed(a.order.id, provider).await.unwrap());
  assert_eq!(relay.unviewed_count(provider).await.unwrap(), 2);

  assert_eq!(relay.mark_all_viewed(provider).await.unwrap(), 2);
  assert_eq!(relay.mark_all_viewed(provider).await.unwrap(), 0);
  assert_eq!(relay.unviewed_count(provider).await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_mark_viewed_on_unknown_order_is_not_found() {
  setup_tracing();
  let h = Harness::with_items(vec![]);
  let err = h
    .engine
    .notifications()
    .mark_viewed(Uuid::new_v4(), Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
#[serial]
async fn test_other_provider_cannot_mark_notification_viewed() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let rival = Uuid::new_v4();
  let soup = item(provider, 9, 1000);
  let h = Harness::with_items(vec![soup.clone()]);
  let placed = h.place(Uuid::new_v4(), vec![line(&soup, 1)]).await;

  let relay = h.engine.notifications();
  let err = relay.mark_viewed(placed.order.id, rival).await.unwrap_err();
  assert!(matches!(err, EngineError::NotOwner { actor_id, .. } if actor_id == rival));
  assert_eq!(relay.unviewed_count(provider).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_status_changes_show_up_in_the_message() {
  setup_tracing();
  let provider = Uuid::new_v4();
  let soup = item(provider, 9, 1000);
  let h = Harness::with_items(vec![soup.clone()]);
  let placed = h.place(Uuid::new_v4(), vec![line(&soup, 1)]).await;

  h.engine
    .orders()
    .apply_transition(placed.order.id, provider, OrderStatus::Accepted, None, None)
    .await
    .unwrap();

  let notes = h.engine.notifications().list_notifications(provider).await.unwrap();
  assert!(notes[0].message.ends_with("is ACCEPTED"));
}
