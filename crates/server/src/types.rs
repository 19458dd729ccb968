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

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique item identifier, assigned by the registry's monotonic counter.
/// Ids are never reused, including for items that have been resolved.
pub type ItemId = u64;

/// Monetary amount in whole currency units
///
/// Prices and budgets are integers end to end; there is no float anywhere
/// in a money path.
pub type Amount = u64;

/// Opaque identity of one client connection
///
/// Components store and compare `ClientId`s; the outbound channel behind an
/// id is resolved through the notification hub, never carried around as a
/// raw handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(Uuid);

impl ClientId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for ClientId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ClientId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Lifecycle state of an item
///
/// Transitions are `Pending -> Active -> Sold | Expired`; `Sold` and
/// `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
	/// Created, auction not yet opened
	Pending,
	/// Auction open, accepting bids until the close timer fires
	Active,
	/// Closed with a winning bid
	Sold,
	/// Closed without any bid
	Expired,
}

impl ItemStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(self, ItemStatus::Sold | ItemStatus::Expired)
	}
}

impl fmt::Display for ItemStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let text = match self {
			ItemStatus::Pending => "Pending",
			ItemStatus::Active => "Active",
			ItemStatus::Sold => "Sold",
			ItemStatus::Expired => "Expired",
		};
		f.write_str(text)
	}
}

/// The currently leading bid on an item
///
/// Holds the bidder's display name alongside the connection identity so a
/// disconnect can be matched against led items without a name lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
	pub client: ClientId,
	pub bidder: String,
}

/// An auction item owned by the registry
///
/// `current_bid` starts at `base_price`, only increases while the item is
/// `Active`, and falls back to `base_price` if the leading client
/// disconnects before the auction resolves. Items are never deleted;
/// resolved items stay visible in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
	pub id: ItemId,
	pub name: String,
	pub base_price: Amount,
	pub current_bid: Amount,
	pub leader: Option<Leader>,
	pub status: ItemStatus,
}

impl Item {
	pub fn new(id: ItemId, name: String, base_price: Amount) -> Self {
		Self {
			id,
			name,
			base_price,
			current_bid: base_price,
			leader: None,
			status: ItemStatus::Pending,
		}
	}
}

/// A connected bidder
///
/// Created once the identity/budget handshake completes and removed on
/// disconnect. `total_committed` is settled at auction close, not at bid
/// time, so leading several auctions at once does not reserve capacity
/// across them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bidder {
	pub client: ClientId,
	pub name: String,
	pub budget: Amount,
	pub total_committed: Amount,
}

impl Bidder {
	pub fn new(client: ClientId, name: impl Into<String>, budget: Amount) -> Self {
		Self {
			client,
			name: name.into(),
			budget,
			total_committed: 0,
		}
	}

	/// Capacity still available for new bids
	pub fn remaining(&self) -> Amount {
		self.budget.saturating_sub(self.total_committed)
	}
}
