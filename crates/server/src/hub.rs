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

//! Fan-out of auction events to connected clients.
//!
//! The hub owns the outbound channel of every connection. Delivery is
//! best-effort and non-blocking: a recipient whose bounded channel is full
//! or closed misses that message, and the broadcaster never sees the
//! failure. Broadcasts are serialized by the subscriber lock, so any two
//! broadcasts are observed by every client in the same order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{Amount, ClientId};

/// State-change events pushed to every connected client
///
/// Each event renders as one bracketed line on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionEvent {
	/// An auction was opened for bidding
	AuctionStarted { item: String, base_price: Amount },
	/// A bid was accepted; the named bidder now leads
	BidAccepted {
		item: String,
		amount: Amount,
		bidder: String,
	},
	/// The close timer fired with a leading bid on record
	AuctionSold {
		item: String,
		amount: Amount,
		winner: String,
	},
	/// The close timer fired with no bid on record
	AuctionExpired { item: String },
	/// The leading client disconnected; the item is back at its base price
	BidReset { item: String, base_price: Amount },
	/// A bidder was disconnected for attempting to overbid its budget
	BidderRemoved { bidder: String },
}

impl fmt::Display for AuctionEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AuctionEvent::AuctionStarted { item, base_price } => {
				write!(f, "[AUCTION: {} started, Price: {}]", item, base_price)
			}
			AuctionEvent::BidAccepted {
				item,
				amount,
				bidder,
			} => write!(f, "[BID: {} ${} by {}]", item, amount, bidder),
			AuctionEvent::AuctionSold {
				item,
				amount,
				winner,
			} => write!(f, "[ENDED: {} sold to {} for {}]", item, winner, amount),
			AuctionEvent::AuctionExpired { item } => write!(f, "[ENDED: {} expired]", item),
			AuctionEvent::BidReset { item, base_price } => {
				write!(f, "[RESET: {} bid reset to {}]", item, base_price)
			}
			AuctionEvent::BidderRemoved { bidder } => {
				write!(f, "[REMOVED: {} exceeded budget]", bidder)
			}
		}
	}
}

/// Notification hub: per-client outbound channels and the broadcast path
///
/// Channels are bounded; `try_send` keeps both the directed and the
/// broadcast path non-blocking, so one slow client can only lose its own
/// copies, never stall the rest of the system.
pub struct NotificationHub {
	subscribers: Mutex<HashMap<ClientId, mpsc::Sender<String>>>,
	queue_depth: usize,
}

impl NotificationHub {
	/// Create a hub whose per-client channels hold `queue_depth` messages
	pub fn new(queue_depth: usize) -> Self {
		Self {
			subscribers: Mutex::new(HashMap::new()),
			queue_depth,
		}
	}

	/// Register a client and hand back the receiving end of its channel
	///
	/// The caller drains the receiver into the client's socket; dropping
	/// the receiver (or calling [`unregister`](Self::unregister)) ends
	/// delivery for that client.
	pub fn register(&self, client: ClientId) -> mpsc::Receiver<String> {
		let (tx, rx) = mpsc::channel(self.queue_depth);
		self.subscribers.lock().unwrap().insert(client, tx);
		rx
	}

	pub fn unregister(&self, client: ClientId) {
		self.subscribers.lock().unwrap().remove(&client);
	}

	pub fn subscriber_count(&self) -> usize {
		self.subscribers.lock().unwrap().len()
	}

	/// Queue a directed message for one client, fire-and-forget
	///
	/// Used for command replies and final notices. A full or closed channel
	/// drops the message.
	pub fn send_to(&self, client: ClientId, text: impl Into<String>) {
		let subscribers = self.subscribers.lock().unwrap();
		if let Some(tx) = subscribers.get(&client)
			&& tx.try_send(text.into()).is_err()
		{
			debug!(%client, "Dropped directed message, channel full or closed");
		}
	}

	/// Deliver `event` to every registered client
	///
	/// Per-recipient failures are swallowed: a dropped copy is logged and
	/// the fan-out continues. The subscriber lock is held for the whole
	/// (non-blocking) fan-out, which keeps the broadcast stream identically
	/// ordered for all recipients.
	pub fn broadcast(&self, event: &AuctionEvent) {
		let line = event.to_string();
		let subscribers = self.subscribers.lock().unwrap();
		for (client, tx) in subscribers.iter() {
			if tx.try_send(line.clone()).is_err() {
				debug!(%client, "Dropped broadcast, channel full or closed");
			}
		}
	}
}
