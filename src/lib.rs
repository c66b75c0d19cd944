//! # Voltbot - Economy State Engine for Chat-Platform Bots
//!
//! Voltbot is the backend state layer for a chat-platform economy/roleplay
//! bot. It tracks per-user wallets, bank balances, inventories, jobs,
//! player-formed guilds, and achievements, scoped per server, and persists
//! everything to flat JSON documents.
//!
//! ## Features
//!
//! - **Lock-per-domain managers**: each domain (economy, jobs, guilds,
//!   achievements) owns its mapping behind one exclusive lock, so every
//!   operation is an atomic read-modify-write.
//! - **Flat-file persistence**: one pretty-printed JSON document per
//!   manager, written atomically (temp file + rename under an fs2 lock),
//!   with a documented reset-to-empty recovery policy on load.
//! - **Static catalogs**: items, jobs, and achievements are immutable
//!   registries compiled into the binary.
//! - **Injectable randomness and clock**: sale pricing and guild tag
//!   generation take caller-supplied RNGs; cooldown checks take an explicit
//!   `now`, keeping every manager deterministic under test.
//! - **Snapshot backups**: optional tar.gz snapshots of the data directory
//!   with sha256 verification and retention pruning.
//! - **Async Design**: built on Tokio; safe to drive from many concurrent
//!   command handlers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use voltbot::state::BotContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = BotContext::new(Path::new("./data"));
//!     ctx.load_all().await;
//!
//!     ctx.economy.add_wallet(100, 1, 500).await;
//!     ctx.save_all().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`state`] - The four concurrent state managers, persistence codec, and
//!   backup support
//! - [`catalog`] - Immutable item/job/achievement registries
//! - [`config`] - Configuration management and validation
//! - [`logutil`] - Log sanitization for user-supplied strings
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Command handlers    │ ← external collaborators (gateway, cogs)
//! └──────────────────────┘
//!            │ method calls, one manager at a time
//! ┌──────────────────────┐
//! │  BotContext          │ ← one instance of each manager
//! │  economy/jobs/       │
//! │  guilds/achievements │
//! └──────────────────────┘
//!            │ explicit save / periodic autosave
//! ┌──────────────────────┐
//! │  JSON documents      │ ← data/economy.json, jobs.json, …
//! └──────────────────────┘
//! ```
//!
//! There is no cross-manager transaction: related mutations in two domains
//! are independent critical sections, and durability is best-effort by
//! design.

pub mod catalog;
pub mod config;
pub mod logutil;
pub mod state;
