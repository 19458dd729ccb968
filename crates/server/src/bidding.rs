// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bid validation and acceptance.
//!
//! All checks and the resulting mutation run in one section under the
//! registry boundary, so a bid can never interleave with an auction close
//! on the same item. The acceptance broadcast happens after the boundary is
//! released.

use std::sync::Arc;

use tracing::{debug, info};

use crate::hub::{AuctionEvent, NotificationHub};
use crate::registry::Registry;
use crate::types::{Amount, ClientId, ItemId, ItemStatus, Leader};

/// Outcome of a bid attempt
///
/// `BudgetExceeded` is connection-terminating by policy: a bidder who tries
/// to overbid its budget forfeits participation. `InvalidBid` is soft; the
/// session continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidOutcome {
	/// Bid recorded; the bidder now leads the auction
	Accepted {
		item_name: String,
		amount: Amount,
		bidder: String,
	},
	/// No bidder is registered for this connection
	BidderNotFound,
	/// The amount exceeds the bidder's remaining capacity
	BudgetExceeded,
	/// Item missing, not active, or amount not above the current bid
	InvalidBid,
}

/// Bid engine: applies bid commands against the registry
pub struct BidEngine {
	registry: Registry,
	hub: Arc<NotificationHub>,
}

impl BidEngine {
	pub fn new(registry: Registry, hub: Arc<NotificationHub>) -> Self {
		Self { registry, hub }
	}

	/// Validate and apply one bid
	///
	/// Preconditions run in order under the registry boundary: the bidder
	/// must exist, the amount must fit within `budget - total_committed`,
	/// and the item must be `Active` with `amount` strictly above the
	/// current bid. The budget check runs before the item lookup, so an
	/// over-budget amount is terminating even when the item is bogus.
	///
	/// Capacity is settled at auction close, not here; a bidder can lead
	/// several auctions at once without the bids reserving against each
	/// other.
	pub fn place_bid(&self, client: ClientId, item_id: ItemId, amount: Amount) -> BidOutcome {
		let outcome = self.registry.with_state(|state| {
			let Some(bidder) = state.bidders.get(&client) else {
				return BidOutcome::BidderNotFound;
			};
			if amount > bidder.remaining() {
				return BidOutcome::BudgetExceeded;
			}
			let bidder_name = bidder.name.clone();

			let Some(item) = state.items.get_mut(&item_id) else {
				return BidOutcome::InvalidBid;
			};
			if item.status != ItemStatus::Active || amount <= item.current_bid {
				return BidOutcome::InvalidBid;
			}

			item.current_bid = amount;
			item.leader = Some(Leader {
				client,
				bidder: bidder_name.clone(),
			});
			BidOutcome::Accepted {
				item_name: item.name.clone(),
				amount,
				bidder: bidder_name,
			}
		});

		match &outcome {
			BidOutcome::Accepted {
				item_name,
				amount,
				bidder,
			} => {
				info!(item = %item_name, amount, bidder = %bidder, "Bid accepted");
				self.hub.broadcast(&AuctionEvent::BidAccepted {
					item: item_name.clone(),
					amount: *amount,
					bidder: bidder.clone(),
				});
			}
			rejected => {
				debug!(%client, item_id, amount, outcome = ?rejected, "Bid rejected");
			}
		}
		outcome
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::Bidder;

	fn setup() -> (Registry, BidEngine) {
		let registry = Registry::new();
		let hub = Arc::new(NotificationHub::new(8));
		let engine = BidEngine::new(registry.clone(), hub);
		(registry, engine)
	}

	fn activate(registry: &Registry, item_id: ItemId) {
		registry.with_state(|state| {
			state.items.get_mut(&item_id).unwrap().status = ItemStatus::Active;
		});
	}

	#[test]
	fn test_bid_from_unknown_client_is_rejected() {
		let (registry, engine) = setup();
		let id = registry.add_item("Watch", 100);
		activate(&registry, id);

		let outcome = engine.place_bid(ClientId::new(), id, 150);
		assert_eq!(outcome, BidOutcome::BidderNotFound);
	}

	#[test]
	fn test_budget_check_runs_before_item_lookup() {
		let (registry, engine) = setup();
		let client = ClientId::new();
		registry.add_bidder(Bidder::new(client, "bob", 100));

		// Over-budget amount on a nonexistent item still terminates.
		let outcome = engine.place_bid(client, 99, 200);
		assert_eq!(outcome, BidOutcome::BudgetExceeded);
	}

	#[test]
	fn test_over_capacity_bid_never_takes_the_lead() {
		let (registry, engine) = setup();
		let id = registry.add_item("Watch", 100);
		activate(&registry, id);

		let client = ClientId::new();
		registry.add_bidder(Bidder::new(client, "bob", 100));

		let outcome = engine.place_bid(client, id, 200);
		assert_eq!(outcome, BidOutcome::BudgetExceeded);

		let item = &registry.list_items()[0];
		assert!(item.leader.is_none());
		assert_eq!(item.current_bid, 100);
	}

	#[test]
	fn test_remaining_capacity_accounts_for_committed_spend() {
		let (registry, engine) = setup();
		let id = registry.add_item("Watch", 100);
		activate(&registry, id);

		let client = ClientId::new();
		let mut bidder = Bidder::new(client, "alice", 500);
		bidder.total_committed = 400;
		registry.add_bidder(bidder);

		assert_eq!(engine.place_bid(client, id, 150), BidOutcome::BudgetExceeded);
	}

	#[test]
	fn test_bid_on_pending_item_is_invalid() {
		let (registry, engine) = setup();
		let id = registry.add_item("Watch", 100);

		let client = ClientId::new();
		registry.add_bidder(Bidder::new(client, "alice", 500));

		assert_eq!(engine.place_bid(client, id, 150), BidOutcome::InvalidBid);
	}

	#[test]
	fn test_bid_must_strictly_exceed_current_bid() {
		let (registry, engine) = setup();
		let id = registry.add_item("Watch", 100);
		activate(&registry, id);

		let client = ClientId::new();
		registry.add_bidder(Bidder::new(client, "alice", 500));

		// Equal to the standing price is a rejection, for all item states.
		assert_eq!(engine.place_bid(client, id, 100), BidOutcome::InvalidBid);

		assert!(matches!(
			engine.place_bid(client, id, 150),
			BidOutcome::Accepted { .. }
		));
		assert_eq!(engine.place_bid(client, id, 150), BidOutcome::InvalidBid);
	}

	#[test]
	fn test_accepted_bid_updates_leader_and_price() {
		let (registry, engine) = setup();
		let id = registry.add_item("Watch", 100);
		activate(&registry, id);

		let alice = ClientId::new();
		let bob = ClientId::new();
		registry.add_bidder(Bidder::new(alice, "alice", 500));
		registry.add_bidder(Bidder::new(bob, "bob", 500));

		assert_eq!(
			engine.place_bid(alice, id, 150),
			BidOutcome::Accepted {
				item_name: "Watch".to_string(),
				amount: 150,
				bidder: "alice".to_string(),
			}
		);

		// Outbidding replaces the leader; the outbid client stays connected.
		assert!(matches!(
			engine.place_bid(bob, id, 175),
			BidOutcome::Accepted { .. }
		));

		let item = &registry.list_items()[0];
		assert_eq!(item.current_bid, 175);
		assert_eq!(item.leader.as_ref().unwrap().bidder, "bob");
		assert!(registry.get_bidder(alice).is_some());
	}

	#[test]
	fn test_current_bid_is_monotonic_while_active() {
		let (registry, engine) = setup();
		let id = registry.add_item("Watch", 100);
		activate(&registry, id);

		let client = ClientId::new();
		registry.add_bidder(Bidder::new(client, "alice", 1000));

		let mut last = 100;
		for amount in [150, 120, 200, 180, 900] {
			engine.place_bid(client, id, amount);
			let current = registry.list_items()[0].current_bid;
			assert!(current >= last);
			last = current;
		}
		assert_eq!(last, 900);
	}
}
