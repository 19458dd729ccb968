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

//! Auction state machine and the timed close.
//!
//! Starting an auction schedules a detached close task. The timer is not
//! cancelable; it always fires and re-checks the item's status under the
//! registry boundary before acting, so a close racing against a bid (or a
//! second close firing) resolves in lock-acquisition order with no
//! duplicate effects.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, info};

use crate::hub::{AuctionEvent, NotificationHub};
use crate::registry::Registry;
use crate::types::{Amount, ItemId, ItemStatus};

/// Outcome of a start attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
	/// The auction is open; a close task has been scheduled
	Started {
		item_name: String,
		base_price: Amount,
	},
	/// Item missing, already active, or already resolved
	CannotStart,
}

/// Outcome of a close firing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
	/// Closed with a winner; the winning amount is now committed
	Sold {
		item_name: String,
		amount: Amount,
		winner: String,
	},
	/// Closed without any bid
	Expired { item_name: String },
	/// The item was already resolved (or never existed); nothing happened
	AlreadyClosed,
}

/// Auction lifecycle manager
///
/// Drives `Pending -> Active -> Sold | Expired` per item. Cloning shares
/// the underlying registry and hub handles; the close task owns a clone.
#[derive(Clone)]
pub struct AuctionLifecycle {
	registry: Registry,
	hub: Arc<NotificationHub>,
	duration: Duration,
}

impl AuctionLifecycle {
	/// `duration` is how long an auction stays open once started
	pub fn new(registry: Registry, hub: Arc<NotificationHub>, duration: Duration) -> Self {
		Self {
			registry,
			hub,
			duration,
		}
	}

	/// Open the auction for `item_id` and schedule its close
	///
	/// Valid only from `Pending`; anything else is `CannotStart` and a
	/// terminal item never becomes active again.
	pub fn start(&self, item_id: ItemId) -> StartOutcome {
		let outcome = self.registry.with_state(|state| {
			let Some(item) = state.items.get_mut(&item_id) else {
				return StartOutcome::CannotStart;
			};
			if item.status != ItemStatus::Pending {
				return StartOutcome::CannotStart;
			}
			item.status = ItemStatus::Active;
			StartOutcome::Started {
				item_name: item.name.clone(),
				base_price: item.base_price,
			}
		});

		if let StartOutcome::Started {
			item_name,
			base_price,
		} = &outcome
		{
			info!(item = %item_name, base_price, duration_secs = self.duration.as_secs(), "Auction started");
			self.hub.broadcast(&AuctionEvent::AuctionStarted {
				item: item_name.clone(),
				base_price: *base_price,
			});

			let manager = self.clone();
			tokio::spawn(async move {
				time::sleep(manager.duration).await;
				manager.close(item_id);
			});
		}
		outcome
	}

	/// Resolve an active auction
	///
	/// Idempotent: the status re-check under the boundary turns a second
	/// firing on an already-resolved item into a no-op with no broadcast.
	/// On a sale, the winner's `total_committed` takes on the winning bid.
	pub fn close(&self, item_id: ItemId) -> CloseOutcome {
		let outcome = self.registry.with_state(|state| {
			let Some(item) = state.items.get_mut(&item_id) else {
				return CloseOutcome::AlreadyClosed;
			};
			if item.status != ItemStatus::Active {
				return CloseOutcome::AlreadyClosed;
			}

			match &item.leader {
				None => {
					item.status = ItemStatus::Expired;
					CloseOutcome::Expired {
						item_name: item.name.clone(),
					}
				}
				Some(leader) => {
					item.status = ItemStatus::Sold;
					let winner_client = leader.client;
					let winner = leader.bidder.clone();
					let amount = item.current_bid;
					let item_name = item.name.clone();

					// A leading client still holds a registry entry while the
					// item is active; disconnects reset leadership first.
					if let Some(bidder) = state.bidders.get_mut(&winner_client) {
						bidder.total_committed += amount;
					}
					CloseOutcome::Sold {
						item_name,
						amount,
						winner,
					}
				}
			}
		});

		match &outcome {
			CloseOutcome::Sold {
				item_name,
				amount,
				winner,
			} => {
				info!(item = %item_name, amount, winner = %winner, "Auction sold");
				self.hub.broadcast(&AuctionEvent::AuctionSold {
					item: item_name.clone(),
					amount: *amount,
					winner: winner.clone(),
				});
			}
			CloseOutcome::Expired { item_name } => {
				info!(item = %item_name, "Auction expired");
				self.hub.broadcast(&AuctionEvent::AuctionExpired {
					item: item_name.clone(),
				});
			}
			CloseOutcome::AlreadyClosed => {
				debug!(item_id, "Close fired on an already-resolved item");
			}
		}
		outcome
	}
}
