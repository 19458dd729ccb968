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

//! Auction service entry point
//!
//! This binary wires up all components of the auction server:
//! - Registry (single owner of items and bidders)
//! - Notification Hub (per-client outbound channels)
//! - Bid Engine and Lifecycle Manager (rule enforcement, timed closes)
//! - Command Dispatcher (line protocol ingress)
//! - TCP accept loop

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use gavel_server::{
	AuctionConfig, AuctionLifecycle, BidEngine, Dispatcher, NotificationHub, Registry,
	server::{self, ServerContext},
};

/// Demo catalog seeded at startup, all items `Pending`
const SEED_ITEMS: [(&str, u64); 3] = [("Watch", 100), ("Painting", 250), ("Book", 75)];

#[tokio::main]
async fn main() -> Result<()> {
	// Initialize logging first
	gavel_server::logging::init_logging()?;

	// Load configuration
	let config = AuctionConfig::from_env().unwrap_or_else(|_| {
		info!(target: "server", "Using default configuration");
		AuctionConfig::default()
	});

	info!(target: "server", "Starting Gavel Auction Server");
	info!(target: "server", "Listening on: {}", config.bind_addr);
	info!(target: "server", "Auction duration: {}s", config.auction_duration_secs);
	info!(target: "server", "Outbound queue depth: {}", config.outbound_queue_depth);

	// Phase 1: Registry, the single consistency boundary
	let registry = Registry::new();

	// Phase 2: Notification Hub
	let hub = Arc::new(NotificationHub::new(config.outbound_queue_depth));

	// Phase 3: Bid Engine and Lifecycle Manager
	let engine = BidEngine::new(registry.clone(), hub.clone());
	let lifecycle =
		AuctionLifecycle::new(registry.clone(), hub.clone(), config.auction_duration());

	// Phase 4: Seed the demo catalog
	for (name, base_price) in SEED_ITEMS {
		let id = registry.add_item(name, base_price);
		info!(target: "server", "Seeded item {} ({}, base price {})", id, name, base_price);
	}

	// Phase 5: Dispatcher and TCP server
	let dispatcher = Arc::new(Dispatcher::new(registry.clone(), engine, lifecycle));
	let ctx = ServerContext {
		registry,
		hub,
		dispatcher,
		verbose_logging: config.verbose_logging,
	};

	let listener = TcpListener::bind(config.bind_addr)
		.await
		.with_context(|| format!("Failed to bind {}", config.bind_addr))?;

	// Wait for shutdown signal
	tokio::select! {
		result = server::run(listener, ctx) => {
			result.context("server error")?;
		}
		_ = signal::ctrl_c() => {
			info!(target: "server", "Shutting down...");
		}
	}

	info!(target: "server", "Shutdown complete");
	Ok(())
}
