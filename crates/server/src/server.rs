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

//! TCP ingress: accept loop, handshake, per-connection tasks.
//!
//! This layer never mutates auction state on its own. Each connection gets
//! a read task (lines in, dispatcher replies out) and a writer task that
//! drains the client's outbound channel into the socket, so every socket
//! write happens outside the registry boundary. A failing connection only
//! ever takes down its own pair of tasks.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::hub::{AuctionEvent, NotificationHub};
use crate::registry::Registry;
use crate::types::{Amount, Bidder, ClientId};

/// Fatal handshake failures
///
/// The rendered message is sent to the client as a final line before the
/// connection closes.
#[derive(Debug, Error)]
pub enum HandshakeError {
	#[error("connection closed during handshake")]
	ConnectionClosed,
	#[error("Username must not be empty")]
	EmptyUsername,
	#[error("Budget must be a positive integer")]
	InvalidBudget,
	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),
}

/// Shared handles handed to every connection task
#[derive(Clone)]
pub struct ServerContext {
	pub registry: Registry,
	pub hub: Arc<NotificationHub>,
	pub dispatcher: Arc<Dispatcher>,
	pub verbose_logging: bool,
}

/// Accept connections until the listener fails
///
/// Binding is the caller's job, which also lets tests run on port 0.
pub async fn run(listener: TcpListener, ctx: ServerContext) -> Result<()> {
	info!(target: "server", "Accepting connections on {}", listener.local_addr()?);
	loop {
		let (stream, peer) = listener.accept().await?;
		debug!(%peer, "Client connected");
		let ctx = ctx.clone();
		tokio::spawn(async move {
			if let Err(e) = handle_connection(stream, ctx).await {
				debug!(%peer, error = %e, "Connection ended with error");
			}
		});
	}
}

/// One session: handshake, read loop, cleanup
async fn handle_connection(stream: TcpStream, ctx: ServerContext) -> Result<()> {
	let (read_half, mut write_half) = stream.into_split();
	let mut lines = BufReader::new(read_half).lines();

	let (name, budget) = match handshake(&mut lines, &mut write_half).await {
		Ok(identity) => identity,
		Err(HandshakeError::ConnectionClosed) => return Ok(()),
		Err(e) => {
			// Final explanatory line, best-effort
			let _ = write_half.write_all(format!("{}\n", e).as_bytes()).await;
			return Ok(());
		}
	};

	let client = ClientId::new();
	let outbound = ctx.hub.register(client);
	ctx.registry.add_bidder(Bidder::new(client, name.clone(), budget));
	info!(%client, name = %name, budget, "Bidder joined");

	let writer = tokio::spawn(write_outbound(outbound, write_half));
	ctx.hub
		.send_to(client, format!("Welcome {}! Your budget is {}.", name, budget));

	// Read loop: one command per line until disconnect or a terminating
	// reply. Replies go through the outbound channel like everything else.
	let mut evicted = false;
	loop {
		let line = match lines.next_line().await {
			Ok(Some(line)) => line,
			Ok(None) | Err(_) => break,
		};
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		if ctx.verbose_logging {
			debug!(%client, command = %line, "Dispatching command");
		}

		let reply = ctx.dispatcher.handle(client, line);
		ctx.hub.send_to(client, reply.text.clone());
		if reply.terminate {
			evicted = true;
			break;
		}
	}

	// Cleanup: release any standing first, then tell the remaining clients
	// what happened.
	let resets = ctx.registry.remove_bidder(client);
	for reset in &resets {
		ctx.hub.broadcast(&AuctionEvent::BidReset {
			item: reset.item_name.clone(),
			base_price: reset.base_price,
		});
	}
	if evicted {
		ctx.hub.broadcast(&AuctionEvent::BidderRemoved {
			bidder: name.clone(),
		});
	}

	// Dropping the subscription closes the channel; the writer drains what
	// is already queued (including a final notice) and exits.
	ctx.hub.unregister(client);
	let _ = writer.await;
	info!(%client, name = %name, "Bidder left");
	Ok(())
}

/// Identity/budget handshake
///
/// Prompts are not newline-terminated; clients render them as they arrive.
async fn handshake(
	lines: &mut Lines<BufReader<OwnedReadHalf>>,
	write_half: &mut OwnedWriteHalf,
) -> Result<(String, Amount), HandshakeError> {
	write_half.write_all(b"Username: ").await?;
	let Some(raw) = lines.next_line().await? else {
		return Err(HandshakeError::ConnectionClosed);
	};
	let name = raw.trim().to_string();
	if name.is_empty() {
		return Err(HandshakeError::EmptyUsername);
	}

	write_half.write_all(b"Budget: ").await?;
	let Some(raw) = lines.next_line().await? else {
		return Err(HandshakeError::ConnectionClosed);
	};
	let budget: Amount = raw
		.trim()
		.parse()
		.map_err(|_| HandshakeError::InvalidBudget)?;
	if budget == 0 {
		return Err(HandshakeError::InvalidBudget);
	}

	Ok((name, budget))
}

/// Drain one client's outbound channel into its socket
///
/// Ends when the channel closes (unregistration) or the peer goes away.
/// Each queued message becomes one newline-terminated write.
async fn write_outbound(mut outbound: mpsc::Receiver<String>, mut write_half: OwnedWriteHalf) {
	while let Some(message) = outbound.recv().await {
		let framed = format!("{}\n", message);
		if write_half.write_all(framed.as_bytes()).await.is_err() {
			break;
		}
	}
}
