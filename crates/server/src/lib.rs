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

//! Gavel Auction Server
//!
//! Multi-client live auction service over a line-oriented TCP protocol.
//! Clients register an identity and a spending limit, then list items,
//! open auctions, and place bids; every state change is pushed to all
//! connected clients.
//!
//! Architecture:
//! - Registry: sole owner of items and bidders behind one mutex, the
//!   system's only consistency boundary
//! - Bid Engine: budget and monotonic-bid checks inside that boundary
//! - Lifecycle Manager: timed close tasks that re-check status before
//!   acting, so a close firing twice is a no-op
//! - Notification Hub: non-blocking best-effort fan-out to every client
//! - Dispatcher: thin command parsing and reply rendering over the core

pub mod bidding;
pub mod config;
pub mod dispatcher;
pub mod hub;
pub mod lifecycle;
pub mod logging;
pub mod registry;
pub mod server;
pub mod types;

pub use bidding::{BidEngine, BidOutcome};
pub use config::AuctionConfig;
pub use dispatcher::{Command, Dispatcher, HELP, Reply};
pub use hub::{AuctionEvent, NotificationHub};
pub use lifecycle::{AuctionLifecycle, CloseOutcome, StartOutcome};
pub use registry::{LeaderReset, Registry, RegistryState};
pub use server::{HandshakeError, ServerContext};
pub use types::*;
