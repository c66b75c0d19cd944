//! Player-formed guild registry and membership index.
//!
//! "Guild" here is the players' own group, not the chat platform's server
//! concept — servers are the outer scope. Two mappings live behind the lock:
//! the per-server guild registry (tag -> record) and the membership index
//! (user -> tag). Every mutation keeps them consistent: the owner is always
//! a member, `members` has no duplicates, and a user belongs to at most one
//! guild at a time.

use chrono::{DateTime, Utc};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::logutil::escape_log;

use super::economy::EconomyManager;
use super::errors::StateError;
use super::store;
use super::{LeaderboardEntry, ServerId, UserId};

/// Guild tag length and alphabet. Uppercase alphanumeric keeps tags easy to
/// type in chat while leaving a 36^6 keyspace, so retry-until-unique never
/// loops in practice.
pub const GUILD_TAG_LEN: usize = 6;
const GUILD_TAG_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Who may join without a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuildPrivacy {
    Public,
    PasswordLocked,
}

/// One player guild. `password` is set iff `privacy` is
/// [`GuildPrivacy::PasswordLocked`]; the owner can read it back, so it is
/// stored as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildRecord {
    pub owner_id: UserId,
    pub display_name: String,
    pub image_url: String,
    pub privacy: GuildPrivacy,
    #[serde(default)]
    pub password: Option<String>,
    pub members: Vec<UserId>,
    #[serde(default)]
    pub member_cap: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Per-guild wealth total for the all-guilds standings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildStanding {
    pub tag: String,
    pub total_wealth: i64,
}

#[derive(Debug, Default)]
struct GuildsState {
    guilds: HashMap<ServerId, HashMap<String, GuildRecord>>,
    memberships: HashMap<ServerId, HashMap<UserId, String>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GuildsDocument {
    #[serde(default)]
    servers: HashMap<String, GuildsServerDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GuildsServerDocument {
    #[serde(default)]
    guilds: HashMap<String, GuildRecord>,
    #[serde(default)]
    user_guilds: HashMap<String, String>,
}

/// Draw one guild tag from a cryptographically strong source.
pub fn generate_guild_tag<R: Rng + CryptoRng>(rng: &mut R) -> String {
    (0..GUILD_TAG_LEN)
        .map(|_| GUILD_TAG_CHARSET[rng.gen_range(0..GUILD_TAG_CHARSET.len())] as char)
        .collect()
}

/// Owns the guild registry and membership index behind one lock.
pub struct GuildsManager {
    file_path: PathBuf,
    state: Mutex<GuildsState>,
}

impl GuildsManager {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            state: Mutex::new(GuildsState::default()),
        }
    }

    pub async fn load(&self) -> Result<(), StateError> {
        let doc: GuildsDocument = store::read_document(&self.file_path).await?;
        let mut state = self.state.lock().await;
        *state = Self::from_document(doc);
        Ok(())
    }

    pub async fn load_or_reset(&self) {
        match self.load().await {
            Ok(()) => {}
            Err(e) if e.is_missing() => {
                log::debug!("guilds: no state file yet, starting empty");
                *self.state.lock().await = GuildsState::default();
            }
            Err(e) => {
                log::warn!("guilds: resetting to empty state: {e}");
                *self.state.lock().await = GuildsState::default();
            }
        }
    }

    pub async fn save(&self) -> Result<(), StateError> {
        let doc = {
            let state = self.state.lock().await;
            Self::to_document(&state)
        };
        store::write_document(&self.file_path, &doc).await
    }

    fn from_document(doc: GuildsDocument) -> GuildsState {
        let mut state = GuildsState::default();
        for (server_key, server_doc) in doc.servers {
            let Ok(server) = server_key.parse::<ServerId>() else {
                log::warn!("guilds: skipping unparseable server key {server_key:?}");
                continue;
            };
            state.guilds.insert(server, server_doc.guilds);
            let memberships = state.memberships.entry(server).or_default();
            for (user_key, tag) in server_doc.user_guilds {
                if let Ok(user) = user_key.parse::<UserId>() {
                    memberships.insert(user, tag);
                }
            }
        }
        state
    }

    fn to_document(state: &GuildsState) -> GuildsDocument {
        let mut doc = GuildsDocument::default();
        for (server, guilds) in &state.guilds {
            let server_doc = doc.servers.entry(server.to_string()).or_default();
            server_doc.guilds = guilds.clone();
        }
        for (server, memberships) in &state.memberships {
            let server_doc = doc.servers.entry(server.to_string()).or_default();
            for (user, tag) in memberships {
                server_doc.user_guilds.insert(user.to_string(), tag.clone());
            }
        }
        doc
    }

    /// Found a new guild owned by `owner` and return its tag.
    ///
    /// Returns `None` when the owner already belongs to a guild — the
    /// membership invariant is enforced here rather than trusted to the
    /// calling layer. The creation cost is still the caller's to deduct.
    pub async fn create_guild<R: Rng + CryptoRng>(
        &self,
        server: ServerId,
        owner: UserId,
        display_name: &str,
        image_url: &str,
        privacy: GuildPrivacy,
        password: Option<&str>,
        rng: &mut R,
    ) -> Option<String> {
        let mut state = self.state.lock().await;
        let memberships = state.memberships.entry(server).or_default();
        if memberships.contains_key(&owner) {
            return None;
        }

        let guilds = state.guilds.entry(server).or_default();
        let mut tag = generate_guild_tag(rng);
        while guilds.contains_key(&tag) {
            tag = generate_guild_tag(rng);
        }

        guilds.insert(
            tag.clone(),
            GuildRecord {
                owner_id: owner,
                display_name: display_name.to_string(),
                image_url: image_url.to_string(),
                privacy,
                password: password.map(str::to_string),
                members: vec![owner],
                member_cap: None,
                created_at: Utc::now(),
            },
        );
        state
            .memberships
            .entry(server)
            .or_default()
            .insert(owner, tag.clone());
        log::info!(
            "guild {} created by {} ({})",
            tag,
            owner,
            escape_log(display_name)
        );
        Some(tag)
    }

    /// Defensive copy of one guild record.
    pub async fn get_guild(&self, server: ServerId, tag: &str) -> Option<GuildRecord> {
        let state = self.state.lock().await;
        state.guilds.get(&server)?.get(tag).cloned()
    }

    /// Tag of the guild this user belongs to, if any.
    pub async fn get_user_guild(&self, server: ServerId, user: UserId) -> Option<String> {
        let state = self.state.lock().await;
        state.memberships.get(&server)?.get(&user).cloned()
    }

    /// All guilds on a server, sorted by tag for stable listings.
    pub async fn list_guilds(&self, server: ServerId) -> Vec<(String, GuildRecord)> {
        let state = self.state.lock().await;
        let Some(guilds) = state.guilds.get(&server) else {
            return Vec::new();
        };
        let mut listing: Vec<(String, GuildRecord)> = guilds
            .iter()
            .map(|(tag, record)| (tag.clone(), record.clone()))
            .collect();
        listing.sort_by(|a, b| a.0.cmp(&b.0));
        listing
    }

    /// Compare a join attempt's password against the guild's. Public guilds
    /// accept anything; a locked guild with no stored password accepts
    /// nothing.
    pub async fn check_password(&self, server: ServerId, tag: &str, candidate: &str) -> bool {
        let state = self.state.lock().await;
        let Some(record) = state.guilds.get(&server).and_then(|g| g.get(tag)) else {
            return false;
        };
        match record.privacy {
            GuildPrivacy::Public => true,
            GuildPrivacy::PasswordLocked => {
                record.password.as_deref() == Some(candidate)
            }
        }
    }

    /// Add a user to a guild. Fails when they already have one, the tag is
    /// unknown, they are somehow already a member, or the cap is reached.
    pub async fn join_guild(
        &self,
        server: ServerId,
        user: UserId,
        tag: &str,
    ) -> (bool, Option<String>) {
        let mut state = self.state.lock().await;
        if state
            .memberships
            .get(&server)
            .is_some_and(|m| m.contains_key(&user))
        {
            return (false, Some("You are already in a guild.".to_string()));
        }
        let Some(record) = state.guilds.entry(server).or_default().get_mut(tag) else {
            return (false, Some("Guild not found.".to_string()));
        };
        if record.members.contains(&user) {
            return (
                false,
                Some("You are already a member of this guild.".to_string()),
            );
        }
        if let Some(cap) = record.member_cap {
            if record.members.len() >= cap as usize {
                return (false, Some("This guild is full.".to_string()));
            }
        }
        record.members.push(user);
        state
            .memberships
            .entry(server)
            .or_default()
            .insert(user, tag.to_string());
        (true, None)
    }

    /// Leave the current guild. Returns false when not in one.
    ///
    /// Owners do not leave quietly: an owner leave disbands the guild and
    /// clears every member's index entry, the same cascade as
    /// [`disband_guild`](Self::disband_guild).
    pub async fn leave_guild(&self, server: ServerId, user: UserId) -> bool {
        let mut state = self.state.lock().await;
        let Some(tag) = state
            .memberships
            .get(&server)
            .and_then(|m| m.get(&user))
            .cloned()
        else {
            return false;
        };

        let record = state.guilds.get_mut(&server).and_then(|g| g.remove(&tag));
        match record {
            Some(mut record) => {
                record.members.retain(|m| *m != user);
                if record.owner_id == user {
                    // Owner left: disband and clear every member's index entry
                    if let Some(memberships) = state.memberships.get_mut(&server) {
                        memberships.remove(&user);
                        for member in &record.members {
                            memberships.remove(member);
                        }
                    }
                    log::info!("guild {tag} disbanded: owner {user} left");
                } else {
                    if let Some(memberships) = state.memberships.get_mut(&server) {
                        memberships.remove(&user);
                    }
                    // Put the record back, minus the leaver
                    state
                        .guilds
                        .entry(server)
                        .or_default()
                        .insert(tag, record);
                }
            }
            None => {
                // Dangling index entry; drop it
                if let Some(memberships) = state.memberships.get_mut(&server) {
                    memberships.remove(&user);
                }
            }
        }
        true
    }

    /// Owner removes a member. The owner cannot kick themselves.
    pub async fn kick_member(
        &self,
        server: ServerId,
        owner: UserId,
        target: UserId,
    ) -> (bool, Option<String>) {
        let mut state = self.state.lock().await;
        let Some(tag) = state
            .memberships
            .get(&server)
            .and_then(|m| m.get(&owner))
            .cloned()
        else {
            return (false, Some("You are not in a guild.".to_string()));
        };
        let record = state.guilds.get_mut(&server).and_then(|g| g.get_mut(&tag));
        let Some(record) = record.filter(|r| r.owner_id == owner) else {
            return (
                false,
                Some("You are not the owner of this guild.".to_string()),
            );
        };
        if !record.members.contains(&target) {
            return (
                false,
                Some("User is not a member of this guild.".to_string()),
            );
        }
        if target == owner {
            return (false, Some("You cannot kick yourself.".to_string()));
        }
        record.members.retain(|m| *m != target);
        if let Some(memberships) = state.memberships.get_mut(&server) {
            memberships.remove(&target);
        }
        (true, None)
    }

    /// Hand the guild to another current member.
    pub async fn transfer_ownership(
        &self,
        server: ServerId,
        owner: UserId,
        new_owner: UserId,
    ) -> (bool, Option<String>) {
        let mut state = self.state.lock().await;
        let Some(tag) = state
            .memberships
            .get(&server)
            .and_then(|m| m.get(&owner))
            .cloned()
        else {
            return (false, Some("You are not in a guild.".to_string()));
        };
        let record = state.guilds.get_mut(&server).and_then(|g| g.get_mut(&tag));
        let Some(record) = record.filter(|r| r.owner_id == owner) else {
            return (
                false,
                Some("You are not the owner of this guild.".to_string()),
            );
        };
        if !record.members.contains(&new_owner) {
            return (
                false,
                Some("User is not a member of this guild.".to_string()),
            );
        }
        if new_owner == owner {
            return (false, Some("You are already the owner.".to_string()));
        }
        record.owner_id = new_owner;
        (true, None)
    }

    /// Owner-only explicit teardown; same cascade as an owner leave.
    pub async fn disband_guild(&self, server: ServerId, owner: UserId) -> bool {
        let mut state = self.state.lock().await;
        let Some(tag) = state
            .memberships
            .get(&server)
            .and_then(|m| m.get(&owner))
            .cloned()
        else {
            return false;
        };
        let Some(record) = state.guilds.get_mut(&server).and_then(|g| g.remove(&tag)) else {
            return false;
        };
        if record.owner_id != owner {
            // Not the owner: put the record back untouched
            state.guilds.entry(server).or_default().insert(tag, record);
            return false;
        }
        if let Some(memberships) = state.memberships.get_mut(&server) {
            for member in &record.members {
                memberships.remove(member);
            }
        }
        log::info!("guild {tag} disbanded by owner {owner}");
        true
    }

    /// Owner-only rename.
    pub async fn rename_guild(
        &self,
        server: ServerId,
        owner: UserId,
        new_display_name: &str,
    ) -> bool {
        let mut state = self.state.lock().await;
        let Some(record) = Self::owned_guild_mut(&mut state, server, owner) else {
            return false;
        };
        record.display_name = new_display_name.to_string();
        log::info!(
            "guild owned by {} renamed to {}",
            owner,
            escape_log(new_display_name)
        );
        true
    }

    /// Owner-only member cap setter; `None` clears the cap. The cap is
    /// checked on join only, so shrinking below the current member count is
    /// allowed and simply blocks further joins.
    pub async fn set_member_cap(
        &self,
        server: ServerId,
        owner: UserId,
        cap: Option<u32>,
    ) -> bool {
        let mut state = self.state.lock().await;
        let Some(record) = Self::owned_guild_mut(&mut state, server, owner) else {
            return false;
        };
        record.member_cap = cap;
        true
    }

    fn owned_guild_mut(
        state: &mut GuildsState,
        server: ServerId,
        owner: UserId,
    ) -> Option<&mut GuildRecord> {
        let tag = state.memberships.get(&server)?.get(&owner)?.clone();
        state
            .guilds
            .get_mut(&server)?
            .get_mut(&tag)
            .filter(|r| r.owner_id == owner)
    }

    /// Member standings for one guild, resolved through the economy
    /// manager's read path. The guilds lock is released before any balance
    /// query, so the two managers never hold each other's locks.
    pub async fn get_guild_leaderboard(
        &self,
        server: ServerId,
        tag: &str,
        economy: &EconomyManager,
    ) -> Vec<LeaderboardEntry> {
        let members = {
            let state = self.state.lock().await;
            match state.guilds.get(&server).and_then(|g| g.get(tag)) {
                Some(record) => record.members.clone(),
                None => return Vec::new(),
            }
        };

        let mut standings = Vec::with_capacity(members.len());
        for user in members {
            let (wallet, bank) = economy.get_balances(server, user).await;
            standings.push(LeaderboardEntry {
                user,
                wallet,
                bank,
                total: wallet.saturating_add(bank),
            });
        }
        standings.sort_by(|a, b| b.total.cmp(&a.total).then(a.user.cmp(&b.user)));
        standings
    }

    /// Total wealth per guild across the whole server, descending.
    pub async fn get_guild_leaderboard_all(
        &self,
        server: ServerId,
        economy: &EconomyManager,
    ) -> Vec<GuildStanding> {
        let rosters: Vec<(String, Vec<UserId>)> = {
            let state = self.state.lock().await;
            match state.guilds.get(&server) {
                Some(guilds) => guilds
                    .iter()
                    .map(|(tag, record)| (tag.clone(), record.members.clone()))
                    .collect(),
                None => return Vec::new(),
            }
        };

        let mut standings = Vec::with_capacity(rosters.len());
        for (tag, members) in rosters {
            let mut total_wealth: i64 = 0;
            for user in members {
                let (wallet, bank) = economy.get_balances(server, user).await;
                total_wealth = total_wealth
                    .saturating_add(wallet)
                    .saturating_add(bank);
            }
            standings.push(GuildStanding { tag, total_wealth });
        }
        standings.sort_by(|a, b| b.total_wealth.cmp(&a.total_wealth).then(a.tag.cmp(&b.tag)));
        standings
    }
}
