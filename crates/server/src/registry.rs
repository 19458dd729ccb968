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

//! Authoritative owner of all auction state.
//!
//! Exactly one registry instance holds every item and bidder; no component
//! keeps a private copy. All access goes through a single mutex, held for
//! the minimum section and never across an await point, so no reader ever
//! observes a partially updated item/bidder pair. The registry itself never
//! broadcasts: mutating operations return what changed and the caller pushes
//! the events through the notification hub after the lock is released.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::types::{Amount, Bidder, ClientId, Item, ItemId, ItemStatus};

/// A leadership release produced by `remove_bidder`
///
/// When a client disconnects while leading an active auction, that item
/// falls back to its base price. The caller broadcasts one `BidReset` per
/// entry returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderReset {
	pub item_id: ItemId,
	pub item_name: String,
	pub base_price: Amount,
}

/// Registry state: items, bidders, and the id counter
///
/// Plain single-threaded data with no locks of its own; concurrency control
/// lives entirely in the [`Registry`] handle. Keeping the state lock-free
/// makes the invariant logic directly unit-testable.
pub struct RegistryState {
	/// All items keyed by id; `BTreeMap` keeps listings in id order
	pub items: BTreeMap<ItemId, Item>,
	/// Connected bidders keyed by connection identity
	pub bidders: HashMap<ClientId, Bidder>,
	next_item_id: ItemId,
}

impl RegistryState {
	pub fn new() -> Self {
		Self {
			items: BTreeMap::new(),
			bidders: HashMap::new(),
			next_item_id: 1,
		}
	}

	/// Insert a new item in `Pending` state and return its id
	///
	/// Ids come from a monotonic counter and are never reused.
	pub fn add_item(&mut self, name: impl Into<String>, base_price: Amount) -> ItemId {
		let id = self.next_item_id;
		self.next_item_id += 1;
		self.items.insert(id, Item::new(id, name.into(), base_price));
		id
	}

	pub fn add_bidder(&mut self, bidder: Bidder) {
		self.bidders.insert(bidder.client, bidder);
	}

	/// Remove a bidder and release its standing on every auction it leads
	///
	/// Only `Active` items are reset; a resolved item keeps its winning bid
	/// and winner on record.
	pub fn remove_bidder(&mut self, client: ClientId) -> Vec<LeaderReset> {
		self.bidders.remove(&client);

		let mut resets = Vec::new();
		for item in self.items.values_mut() {
			if item.status == ItemStatus::Active
				&& item.leader.as_ref().is_some_and(|l| l.client == client)
			{
				item.current_bid = item.base_price;
				item.leader = None;
				resets.push(LeaderReset {
					item_id: item.id,
					item_name: item.name.clone(),
					base_price: item.base_price,
				});
			}
		}
		resets
	}
}

impl Default for RegistryState {
	fn default() -> Self {
		Self::new()
	}
}

/// Shared handle to the registry
///
/// Cloning is cheap; every clone refers to the same state behind the same
/// mutex. The lock is the system's single consistency boundary: operations
/// that acquire it are totally ordered, which is what gives the bid-vs-close
/// race a well-defined resolution.
#[derive(Clone)]
pub struct Registry {
	state: Arc<Mutex<RegistryState>>,
}

impl Registry {
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(RegistryState::new())),
		}
	}

	/// Run `f` under the consistency boundary
	///
	/// `f` must not block: no I/O, no await. Compound read-modify-write
	/// operations (bid acceptance, auction close) go through here so their
	/// checks and mutations are atomic with respect to each other.
	pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut RegistryState) -> T) -> T {
		let mut state = self.state.lock().unwrap();
		f(&mut state)
	}

	/// Snapshot of every item, in id order
	pub fn list_items(&self) -> Vec<Item> {
		self.with_state(|state| state.items.values().cloned().collect())
	}

	pub fn get_bidder(&self, client: ClientId) -> Option<Bidder> {
		self.with_state(|state| state.bidders.get(&client).cloned())
	}

	pub fn add_item(&self, name: impl Into<String>, base_price: Amount) -> ItemId {
		let name = name.into();
		let id = self.with_state(|state| state.add_item(name.clone(), base_price));
		debug!(item = %name, id, base_price, "Item added");
		id
	}

	pub fn add_bidder(&self, bidder: Bidder) {
		debug!(client = %bidder.client, name = %bidder.name, "Bidder registered");
		self.with_state(|state| state.add_bidder(bidder));
	}

	/// Remove a bidder; see [`RegistryState::remove_bidder`]
	///
	/// The caller is responsible for broadcasting one `BidReset` per
	/// returned entry.
	pub fn remove_bidder(&self, client: ClientId) -> Vec<LeaderReset> {
		let resets = self.with_state(|state| state.remove_bidder(client));
		debug!(%client, resets = resets.len(), "Bidder removed");
		resets
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}
