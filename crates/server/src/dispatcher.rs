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

//! Thin command ingress: parse one line, call the core, render the reply.
//!
//! The dispatcher never touches auction state directly and never performs
//! I/O; it maps commands onto registry, bid engine and lifecycle operations
//! and turns their outcomes into reply text.

use crate::bidding::{BidEngine, BidOutcome};
use crate::lifecycle::{AuctionLifecycle, StartOutcome};
use crate::registry::Registry;
use crate::types::{Amount, ClientId, ItemId};

/// Fixed reply for anything that does not parse as a command
pub const HELP: &str = "Commands: list, start <id>, bid <id> <amount>, add <name> <price>";

/// A parsed client command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	List,
	Start(ItemId),
	Bid(ItemId, Amount),
	Add { name: String, price: Amount },
	Help,
}

impl Command {
	/// Parse one input line; any unrecognized token sequence maps to `Help`
	pub fn parse(line: &str) -> Command {
		let mut parts = line.split_whitespace();
		match parts.next() {
			Some("list") => Command::List,
			Some("start") => match parts.next().and_then(|t| t.parse().ok()) {
				Some(id) => Command::Start(id),
				None => Command::Help,
			},
			Some("bid") => {
				let id = parts.next().and_then(|t| t.parse().ok());
				let amount = parts.next().and_then(|t| t.parse().ok());
				match (id, amount) {
					(Some(id), Some(amount)) => Command::Bid(id, amount),
					_ => Command::Help,
				}
			}
			Some("add") => {
				let name = parts.next();
				let price = parts.next().and_then(|t| t.parse().ok());
				match (name, price) {
					(Some(name), Some(price)) => Command::Add {
						name: name.to_string(),
						price,
					},
					_ => Command::Help,
				}
			}
			_ => Command::Help,
		}
	}
}

/// Reply to the issuing client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
	pub text: String,
	/// Connection-terminating outcome; the caller sends `text` and closes
	pub terminate: bool,
}

impl Reply {
	fn text(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			terminate: false,
		}
	}

	fn terminal(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			terminate: true,
		}
	}
}

/// Command dispatcher
pub struct Dispatcher {
	registry: Registry,
	engine: BidEngine,
	lifecycle: AuctionLifecycle,
}

impl Dispatcher {
	pub fn new(registry: Registry, engine: BidEngine, lifecycle: AuctionLifecycle) -> Self {
		Self {
			registry,
			engine,
			lifecycle,
		}
	}

	/// Handle one line from `client` and render the reply
	pub fn handle(&self, client: ClientId, line: &str) -> Reply {
		match Command::parse(line) {
			Command::List => Reply::text(self.render_listing(client)),
			Command::Start(id) => match self.lifecycle.start(id) {
				StartOutcome::Started { item_name, .. } => {
					Reply::text(format!("Started auction for {}", item_name))
				}
				StartOutcome::CannotStart => Reply::text("Cannot start auction"),
			},
			Command::Bid(id, amount) => match self.engine.place_bid(client, id, amount) {
				BidOutcome::Accepted { .. } => Reply::text("Bid accepted!"),
				BidOutcome::InvalidBid => Reply::text("Invalid bid"),
				BidOutcome::BudgetExceeded => {
					Reply::terminal("Bid exceeds your budget, disconnecting")
				}
				BidOutcome::BidderNotFound => Reply::text("Unknown bidder"),
			},
			Command::Add { name, price } => {
				self.registry.add_item(name, price);
				Reply::text("Item added!")
			}
			Command::Help => Reply::text(HELP),
		}
	}

	/// Item listing plus the caller's budget summary
	fn render_listing(&self, client: ClientId) -> String {
		let mut lines = vec!["=== ITEMS ===".to_string()];
		for item in self.registry.list_items() {
			let mut line = format!("ID:{} {} ${}", item.id, item.name, item.current_bid);
			if let Some(leader) = &item.leader {
				line.push_str(&format!(" ({})", leader.bidder));
			}
			line.push_str(&format!(" {}", item.status));
			lines.push(line);
		}
		if let Some(bidder) = self.registry.get_bidder(client) {
			lines.push(format!(
				"Budget: {}, committed: {}, available: {}",
				bidder.budget,
				bidder.total_committed,
				bidder.remaining()
			));
		}
		lines.join("\n")
	}
}
