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

//! Interactive auction client
//!
//! Connects to a gavel server, prints everything the server sends, and
//! forwards each line typed on stdin. Type `quit` to leave.

use std::env;
use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<()> {
	let addr = env::args()
		.nth(1)
		.unwrap_or_else(|| "127.0.0.1:7878".to_string());

	println!("=== AUCTION CLIENT ===");
	println!("Commands: list, start <id>, bid <id> <amount>, add <name> <price>, quit");
	println!();

	let stream = TcpStream::connect(&addr)
		.await
		.with_context(|| format!("Failed to connect to {}", addr))?;
	println!("Connected to {}", addr);

	let (mut read_half, mut write_half) = stream.into_split();

	// Server prompts are not newline-terminated, so print raw chunks as
	// they arrive instead of reading lines.
	let mut receiver = tokio::spawn(async move {
		let mut buf = [0u8; 1024];
		loop {
			match read_half.read(&mut buf).await {
				Ok(0) | Err(_) => break,
				Ok(n) => {
					print!("{}", String::from_utf8_lossy(&buf[..n]));
					let _ = std::io::stdout().flush();
				}
			}
		}
	});

	let mut stdin = BufReader::new(tokio::io::stdin()).lines();
	loop {
		tokio::select! {
			// Server closed the connection
			_ = &mut receiver => break,
			line = stdin.next_line() => {
				let Some(line) = line? else { break };
				if line.trim() == "quit" {
					break;
				}
				write_half
					.write_all(format!("{}\n", line).as_bytes())
					.await
					.context("Connection lost")?;
			}
		}
	}

	receiver.abort();
	println!("Disconnected");
	Ok(())
}
