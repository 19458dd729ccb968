//! Integration tests for the auction core
//!
//! These tests verify:
//! - The full bid/close lifecycle across components
//! - Close idempotency (no duplicate broadcasts)
//! - Budget enforcement and leader-disconnect resets
//! - Broadcast delivery and ordering

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;

use gavel_server::{
	AuctionLifecycle, BidEngine, BidOutcome, Bidder, ClientId, CloseOutcome, Dispatcher, ItemStatus,
	NotificationHub, Registry,
};

struct Harness {
	registry: Registry,
	hub: Arc<NotificationHub>,
	dispatcher: Dispatcher,
	lifecycle: AuctionLifecycle,
}

fn harness(auction_duration: Duration) -> Harness {
	let registry = Registry::new();
	let hub = Arc::new(NotificationHub::new(32));
	let engine = BidEngine::new(registry.clone(), hub.clone());
	let lifecycle = AuctionLifecycle::new(registry.clone(), hub.clone(), auction_duration);
	let dispatcher = Dispatcher::new(registry.clone(), engine, lifecycle.clone());
	Harness {
		registry,
		hub,
		dispatcher,
		lifecycle,
	}
}

fn join(h: &Harness, name: &str, budget: u64) -> (ClientId, mpsc::Receiver<String>) {
	let client = ClientId::new();
	let rx = h.hub.register(client);
	h.registry.add_bidder(Bidder::new(client, name, budget));
	(client, rx)
}

fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
	let mut messages = Vec::new();
	while let Ok(message) = rx.try_recv() {
		messages.push(message);
	}
	messages
}

#[tokio::test]
async fn test_watch_auction_scenario() {
	let h = harness(Duration::from_millis(100));
	h.registry.add_item("Watch", 100);

	let (alice, mut rx_alice) = join(&h, "alice", 500);
	let (bob, mut rx_bob) = join(&h, "bob", 100);

	let reply = h.dispatcher.handle(alice, "start 1");
	assert_eq!(reply.text, "Started auction for Watch");
	assert_eq!(h.registry.list_items()[0].status, ItemStatus::Active);

	let reply = h.dispatcher.handle(alice, "bid 1 150");
	assert_eq!(reply.text, "Bid accepted!");
	assert_eq!(h.registry.list_items()[0].current_bid, 150);

	// Bob's budget is 100; bidding 200 forfeits participation.
	let reply = h.dispatcher.handle(bob, "bid 1 200");
	assert_eq!(reply.text, "Bid exceeds your budget, disconnecting");
	assert!(reply.terminate);

	// The close timer fires on its own.
	time::sleep(Duration::from_millis(400)).await;

	let item = &h.registry.list_items()[0];
	assert_eq!(item.status, ItemStatus::Sold);
	assert_eq!(item.current_bid, 150);
	assert_eq!(item.leader.as_ref().unwrap().bidder, "alice");
	assert_eq!(h.registry.get_bidder(alice).unwrap().total_committed, 150);

	// Both clients observed the same broadcast stream, in the same order.
	let expected = vec![
		"[AUCTION: Watch started, Price: 100]".to_string(),
		"[BID: Watch $150 by alice]".to_string(),
		"[ENDED: Watch sold to alice for 150]".to_string(),
	];
	assert_eq!(drain(&mut rx_alice), expected);
	assert_eq!(drain(&mut rx_bob), expected);
}

#[tokio::test]
async fn test_auction_with_no_bids_expires() {
	let h = harness(Duration::from_millis(50));
	h.registry.add_item("Book", 75);

	let (alice, mut rx_alice) = join(&h, "alice", 500);
	h.dispatcher.handle(alice, "start 1");

	time::sleep(Duration::from_millis(300)).await;

	let item = &h.registry.list_items()[0];
	assert_eq!(item.status, ItemStatus::Expired);
	assert_eq!(item.current_bid, 75);
	assert!(item.leader.is_none());

	let messages = drain(&mut rx_alice);
	assert!(messages.contains(&"[ENDED: Book expired]".to_string()));
}

#[tokio::test]
async fn test_close_fires_twice_without_duplicate_effects() {
	let h = harness(Duration::from_secs(60));
	let id = h.registry.add_item("Watch", 100);

	let (alice, mut rx_alice) = join(&h, "alice", 500);
	h.dispatcher.handle(alice, "start 1");
	h.dispatcher.handle(alice, "bid 1 150");

	assert!(matches!(h.lifecycle.close(id), CloseOutcome::Sold { .. }));
	assert_eq!(h.lifecycle.close(id), CloseOutcome::AlreadyClosed);

	// Settled once, broadcast once.
	assert_eq!(h.registry.get_bidder(alice).unwrap().total_committed, 150);
	let messages = drain(&mut rx_alice);
	let sold_count = messages
		.iter()
		.filter(|m| m.contains("sold to alice"))
		.count();
	assert_eq!(sold_count, 1);
}

#[tokio::test]
async fn test_resolved_items_ignore_further_bids() {
	let h = harness(Duration::from_secs(60));
	let id = h.registry.add_item("Watch", 100);

	let (alice, _rx_alice) = join(&h, "alice", 500);
	h.dispatcher.handle(alice, "start 1");
	h.dispatcher.handle(alice, "bid 1 150");
	h.lifecycle.close(id);

	let reply = h.dispatcher.handle(alice, "bid 1 300");
	assert_eq!(reply.text, "Invalid bid");
	assert_eq!(h.registry.list_items()[0].current_bid, 150);
}

#[tokio::test]
async fn test_leader_disconnect_resets_active_item() {
	let h = harness(Duration::from_secs(60));
	h.registry.add_item("Watch", 100);

	let (alice, _rx_alice) = join(&h, "alice", 500);
	let (bob, mut rx_bob) = join(&h, "bob", 500);

	h.dispatcher.handle(alice, "start 1");
	h.dispatcher.handle(alice, "bid 1 150");

	// Alice drops; her standing is released and the others are told.
	let resets = h.registry.remove_bidder(alice);
	assert_eq!(resets.len(), 1);
	for reset in &resets {
		h.hub.broadcast(&gavel_server::AuctionEvent::BidReset {
			item: reset.item_name.clone(),
			base_price: reset.base_price,
		});
	}
	h.hub.unregister(alice);

	let item = &h.registry.list_items()[0];
	assert_eq!(item.current_bid, 100);
	assert!(item.leader.is_none());
	assert_eq!(item.status, ItemStatus::Active);

	let messages = drain(&mut rx_bob);
	assert!(messages.contains(&"[RESET: Watch bid reset to 100]".to_string()));

	// Bob can take the lead from the base price again.
	assert_eq!(h.dispatcher.handle(bob, "bid 1 120").text, "Bid accepted!");
}

#[tokio::test]
async fn test_add_while_running_is_listed_pending() {
	let h = harness(Duration::from_millis(50));
	h.registry.add_item("Watch", 100);

	let (alice, _rx_alice) = join(&h, "alice", 500);
	h.dispatcher.handle(alice, "start 1");

	h.dispatcher.handle(alice, "add Vase 50");

	let listing = h.dispatcher.handle(alice, "list").text;
	assert!(listing.contains("ID:2 Vase $50 Pending"));

	// The new item is untouched by the other auction's close.
	time::sleep(Duration::from_millis(300)).await;
	let items = h.registry.list_items();
	assert_eq!(items[1].status, ItemStatus::Pending);
	assert_eq!(items[1].current_bid, 50);
	assert!(items[1].leader.is_none());
}

#[tokio::test]
async fn test_bid_and_close_race_resolves_in_lock_order() {
	// A bid arriving after the close must land on a resolved item and be
	// rejected, regardless of how close the timing gets.
	let h = harness(Duration::from_millis(30));
	let id = h.registry.add_item("Watch", 100);
	let (alice, _rx) = join(&h, "alice", 1_000);

	h.dispatcher.handle(alice, "start 1");

	let engine = BidEngine::new(h.registry.clone(), h.hub.clone());
	let mut accepted = Vec::new();
	for round in 0..60u64 {
		match engine.place_bid(alice, id, 101 + round) {
			BidOutcome::Accepted { amount, .. } => accepted.push(amount),
			BidOutcome::InvalidBid => break,
			other => panic!("unexpected outcome: {:?}", other),
		}
		time::sleep(Duration::from_millis(1)).await;
	}

	time::sleep(Duration::from_millis(100)).await;
	let item = &h.registry.list_items()[0];
	assert!(item.status.is_terminal());

	// Whatever was accepted last is exactly what the close settled on.
	if let Some(last) = accepted.last() {
		assert_eq!(item.status, ItemStatus::Sold);
		assert_eq!(item.current_bid, *last);
		assert_eq!(
			h.registry.get_bidder(alice).unwrap().total_committed,
			*last
		);
	}
}
