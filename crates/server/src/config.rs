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

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// Logging configuration constants
/// Default log level (can be overridden by RUST_LOG environment variable)
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log directory component name
pub const LOG_COMPONENT_NAME: &str = "auction";

/// Default console output enabled (can be overridden by LOG_TO_CONSOLE environment variable)
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// Auction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionConfig {
	/// TCP bind address for the line-oriented client protocol
	pub bind_addr: SocketAddr,
	/// How long an auction stays open once started, in seconds
	pub auction_duration_secs: u64,
	/// Depth of each client's outbound message queue; a client that falls
	/// further behind than this starts losing broadcast copies
	pub outbound_queue_depth: usize,
	/// Log every dispatched command at debug level
	pub verbose_logging: bool,
}

impl Default for AuctionConfig {
	fn default() -> Self {
		Self {
			bind_addr: "127.0.0.1:7878".parse().unwrap(),
			// Demo duration, kept under a minute
			auction_duration_secs: 30,
			outbound_queue_depth: 64,
			verbose_logging: false,
		}
	}
}

impl AuctionConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::Environment::with_prefix("AUCTION"))
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(config::Environment::with_prefix("AUCTION"))
			.build()?;

		cfg.try_deserialize()
	}

	pub fn auction_duration(&self) -> Duration {
		Duration::from_secs(self.auction_duration_secs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config_is_sane() {
		let config = AuctionConfig::default();
		assert!(config.auction_duration() < Duration::from_secs(60));
		assert!(config.outbound_queue_depth > 0);
	}
}
