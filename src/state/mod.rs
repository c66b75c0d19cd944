//! # State Layer - Concurrent Manager Modules
//!
//! The heart of voltbot: four managers, each owning one shared in-memory
//! mapping behind its own exclusive lock, persisted as one JSON document
//! apiece under the data directory.
//!
//! - [`economy::EconomyManager`] — wallets, banks, inventories (`economy.json`)
//! - [`jobs::JobsManager`] — job assignments and decline cooldowns (`jobs.json`)
//! - [`guilds::GuildsManager`] — player guild registry and membership index (`guilds.json`)
//! - [`achievements::AchievementsManager`] — monotonic unlock sets (`achievements.json`)
//!
//! ## Concurrency model
//!
//! Each manager serializes all of its own operations behind one
//! `tokio::sync::Mutex` scoped to the manager instance. The in-memory
//! critical sections are synchronous and short; file writes happen outside
//! them, on a snapshot. Cross-manager reads (guild leaderboards resolving
//! balances) release the first manager's lock before touching the second,
//! so locks are never held in both directions between two managers.
//!
//! ## Durability model
//!
//! Mutation and save are separate steps. A mutation returns before anything
//! touches disk; [`BotContext::save_all`] (and the periodic autosave spawned
//! by [`BotContext::run_autosave`]) flush full snapshots. A crash between
//! mutation and flush loses the update — best-effort durability, as the bot
//! has always had. On load, a missing or corrupt document resets that one
//! manager to empty state via `load_or_reset` rather than failing startup.

pub mod achievements;
pub mod backup;
pub mod economy;
pub mod errors;
pub mod guilds;
pub mod jobs;
pub mod store;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use achievements::AchievementsManager;
use economy::EconomyManager;
use errors::StateError;
use guilds::GuildsManager;
use jobs::JobsManager;

/// Chat-platform server id. All bot state is scoped per server.
pub type ServerId = u64;
/// Chat-platform user id.
pub type UserId = u64;

/// One row of a balance leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user: UserId,
    pub wallet: i64,
    pub bank: i64,
    pub total: i64,
}

/// The application context: one long-lived instance of each manager,
/// constructed at startup and passed by reference to every request handler.
/// Never recreated per request, never reached through globals.
pub struct BotContext {
    pub economy: EconomyManager,
    pub jobs: JobsManager,
    pub guilds: GuildsManager,
    pub achievements: AchievementsManager,
}

impl BotContext {
    /// Build the managers over `data_dir`. Does not touch disk; call
    /// [`load_all`](Self::load_all) (or the managers' `load`) next.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            economy: EconomyManager::new(data_dir.join("economy.json")),
            jobs: JobsManager::new(data_dir.join("jobs.json")),
            guilds: GuildsManager::new(data_dir.join("guilds.json")),
            achievements: AchievementsManager::new(data_dir.join("achievements.json")),
        }
    }

    /// Load every manager with the empty-state recovery policy.
    pub async fn load_all(&self) {
        self.economy.load_or_reset().await;
        self.jobs.load_or_reset().await;
        self.guilds.load_or_reset().await;
        self.achievements.load_or_reset().await;
    }

    /// Flush every manager. Individual failures are logged and the rest of
    /// the flush continues; the first error is returned.
    pub async fn save_all(&self) -> Result<(), StateError> {
        let mut first_err = None;
        for (name, result) in [
            ("economy", self.economy.save().await),
            ("jobs", self.jobs.save().await),
            ("guilds", self.guilds.save().await),
            ("achievements", self.achievements.save().await),
        ] {
            if let Err(e) = result {
                log::error!("save failed for {name}: {e}");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Spawn the periodic full-state flush. Runs until the handle is aborted;
/// save failures are logged inside `save_all` and never stop the loop.
pub fn run_autosave(ctx: Arc<BotContext>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // First tick fires immediately; skip it so startup isn't a save
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if ctx.save_all().await.is_ok() {
                log::debug!("autosave flush complete");
            }
        }
    })
}
