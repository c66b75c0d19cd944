//! Per-user wallet, bank, and inventory state.
//!
//! One `EconomyManager` instance serves every server; all state lives in a
//! single map guarded by one exclusive lock, so each operation below is
//! atomic with respect to every other. Persistence is a separate explicit
//! step (`save`), never implied by a mutation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::catalog;

use super::errors::StateError;
use super::store;
use super::{LeaderboardEntry, ServerId, UserId};

/// A user's economy account. Created lazily on first access, never removed.
///
/// Invariants: `wallet` and `bank` never go negative; `inventory` never holds
/// a zero-or-negative count (empty stacks are pruned on write).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    pub wallet: i64,
    pub bank: i64,
    #[serde(default)]
    pub inventory: HashMap<String, i64>,
}

/// One sold stack as reported by [`EconomyManager::sell_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoldStack {
    pub key: String,
    pub quantity: i64,
    pub value: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EconomyDocument {
    #[serde(default)]
    servers: HashMap<String, EconomyServerDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EconomyServerDocument {
    #[serde(default)]
    users: HashMap<String, Account>,
}

type EconomyMap = HashMap<ServerId, HashMap<UserId, Account>>;

/// Owns all wallet/bank/inventory state, serialized behind one lock.
pub struct EconomyManager {
    file_path: PathBuf,
    accounts: Mutex<EconomyMap>,
}

impl EconomyManager {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    fn ensure_user<'a>(
        accounts: &'a mut EconomyMap,
        server: ServerId,
        user: UserId,
    ) -> &'a mut Account {
        accounts
            .entry(server)
            .or_default()
            .entry(user)
            .or_default()
    }

    /// Strict load: installs the on-disk document, surfacing the distinct
    /// failure kinds. Unknown inventory keys and negative values are
    /// sanitized the same way the bot always has.
    pub async fn load(&self) -> Result<(), StateError> {
        let doc: EconomyDocument = store::read_document(&self.file_path).await?;
        let mut accounts = self.accounts.lock().await;
        *accounts = Self::from_document(doc);
        Ok(())
    }

    /// Load with the documented recovery policy: a missing or unreadable
    /// document resets this manager to empty state instead of failing
    /// startup. The failure kind is logged so operators can tell a first run
    /// from a corrupt file.
    pub async fn load_or_reset(&self) {
        match self.load().await {
            Ok(()) => {}
            Err(e) if e.is_missing() => {
                log::debug!("economy: no state file yet, starting empty");
                self.accounts.lock().await.clear();
            }
            Err(e) => {
                log::warn!("economy: resetting to empty state: {e}");
                self.accounts.lock().await.clear();
            }
        }
    }

    /// Flush the full mapping to disk.
    pub async fn save(&self) -> Result<(), StateError> {
        let doc = {
            let accounts = self.accounts.lock().await;
            Self::to_document(&accounts)
        };
        store::write_document(&self.file_path, &doc).await
    }

    fn from_document(doc: EconomyDocument) -> EconomyMap {
        let mut accounts = EconomyMap::new();
        for (server_key, server_doc) in doc.servers {
            let Ok(server) = server_key.parse::<ServerId>() else {
                log::warn!("economy: skipping unparseable server key {server_key:?}");
                continue;
            };
            let users = accounts.entry(server).or_default();
            for (user_key, raw) in server_doc.users {
                let Ok(user) = user_key.parse::<UserId>() else {
                    log::warn!("economy: skipping unparseable user key {user_key:?}");
                    continue;
                };
                let inventory = raw
                    .inventory
                    .into_iter()
                    .filter(|(key, count)| catalog::item(key).is_some() && *count > 0)
                    .collect();
                users.insert(
                    user,
                    Account {
                        wallet: raw.wallet.max(0),
                        bank: raw.bank.max(0),
                        inventory,
                    },
                );
            }
        }
        accounts
    }

    fn to_document(accounts: &EconomyMap) -> EconomyDocument {
        let mut doc = EconomyDocument::default();
        for (server, users) in accounts {
            let server_doc = doc.servers.entry(server.to_string()).or_default();
            for (user, account) in users {
                server_doc.users.insert(user.to_string(), account.clone());
            }
        }
        doc
    }

    /// Make sure an account exists for this user.
    pub async fn ensure_account(&self, server: ServerId, user: UserId) {
        let mut accounts = self.accounts.lock().await;
        Self::ensure_user(&mut accounts, server, user);
    }

    /// Current `(wallet, bank)` split.
    pub async fn get_balances(&self, server: ServerId, user: UserId) -> (i64, i64) {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        (account.wallet, account.bank)
    }

    pub async fn total_balance(&self, server: ServerId, user: UserId) -> i64 {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        account.wallet.saturating_add(account.bank)
    }

    /// Move up to `amount` (everything when `None`) from wallet to bank.
    /// Returns the amount actually moved, 0 when nothing could move.
    pub async fn deposit(&self, server: ServerId, user: UserId, amount: Option<i64>) -> i64 {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        if account.wallet <= 0 {
            return 0;
        }
        let moved = match amount {
            Some(a) if a <= account.wallet => a,
            _ => account.wallet,
        };
        if moved <= 0 {
            return 0;
        }
        account.wallet -= moved;
        account.bank = account.bank.saturating_add(moved);
        moved
    }

    /// Symmetric to [`deposit`](Self::deposit): bank to wallet.
    pub async fn withdraw(&self, server: ServerId, user: UserId, amount: Option<i64>) -> i64 {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        if account.bank <= 0 {
            return 0;
        }
        let moved = match amount {
            Some(a) if a <= account.bank => a,
            _ => account.bank,
        };
        if moved <= 0 {
            return 0;
        }
        account.bank -= moved;
        account.wallet = account.wallet.saturating_add(moved);
        moved
    }

    /// Credit the wallet with `max(0, amount)`; returns the new wallet.
    pub async fn add_wallet(&self, server: ServerId, user: UserId, amount: i64) -> i64 {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        account.wallet = account.wallet.saturating_add(amount.max(0));
        account.wallet
    }

    /// Credit the bank with `max(0, amount)`; returns the new bank balance.
    pub async fn add_bank(&self, server: ServerId, user: UserId, amount: i64) -> i64 {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        account.bank = account.bank.saturating_add(amount.max(0));
        account.bank
    }

    /// Debit the wallet. Fails without mutation when `amount <= 0` or the
    /// wallet cannot cover it.
    pub async fn deduct_wallet(&self, server: ServerId, user: UserId, amount: i64) -> bool {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        if amount <= 0 || account.wallet < amount {
            return false;
        }
        account.wallet -= amount;
        true
    }

    pub async fn has_wallet(&self, server: ServerId, user: UserId, amount: i64) -> bool {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        account.wallet >= amount
    }

    /// Defensive copy of the user's inventory.
    pub async fn get_inventory(&self, server: ServerId, user: UserId) -> HashMap<String, i64> {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        account.inventory.clone()
    }

    /// Add `max(0, amount)` units of a catalog item. Unknown keys are a
    /// silent no-op.
    pub async fn add_item(&self, server: ServerId, user: UserId, item_key: &str, amount: i64) {
        if catalog::item(item_key).is_none() {
            return;
        }
        let contribution = amount.max(0);
        if contribution == 0 {
            return;
        }
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        let count = account.inventory.entry(item_key.to_string()).or_insert(0);
        *count = count.saturating_add(contribution);
    }

    pub async fn has_item(&self, server: ServerId, user: UserId, item_key: &str) -> bool {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        account.inventory.get(item_key).copied().unwrap_or(0) > 0
    }

    /// True when every key is present with a positive count. Presence only:
    /// a caller needing three lockpicks still passes with one. Kept lax on
    /// purpose, matching what the command layer has always relied on.
    pub async fn has_items(&self, server: ServerId, user: UserId, item_keys: &[&str]) -> bool {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        item_keys
            .iter()
            .all(|key| account.inventory.get(*key).copied().unwrap_or(0) > 0)
    }

    /// Sell inventory for volts.
    ///
    /// With `item_key` unset, every sellable stack goes (keys visited in
    /// sorted order so a seeded RNG reproduces the same draws). With a key,
    /// up to `quantity` units of that stack only. Each unit is priced by an
    /// independent uniform draw from the item's value range; non-sellable
    /// items are skipped entirely. Proceeds credit the wallet in the same
    /// critical section as the stock depletion.
    pub async fn sell_items<R: Rng>(
        &self,
        server: ServerId,
        user: UserId,
        item_key: Option<&str>,
        quantity: Option<i64>,
        rng: &mut R,
    ) -> (Vec<SoldStack>, i64) {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        if account.inventory.is_empty() {
            return (Vec::new(), 0);
        }

        let mut details = Vec::new();
        let mut total_value: i64 = 0;

        let mut sell_stack = |inventory: &mut HashMap<String, i64>, key: &str, qty: i64| {
            let Some(def) = catalog::item(key) else { return };
            if qty <= 0 || !def.sellable {
                return;
            }
            let mut sold_value: i64 = 0;
            for _ in 0..qty {
                sold_value =
                    sold_value.saturating_add(rng.gen_range(def.min_value..=def.max_value));
            }
            if let Some(count) = inventory.get_mut(key) {
                *count -= qty;
                if *count <= 0 {
                    inventory.remove(key);
                }
            }
            details.push(SoldStack {
                key: key.to_string(),
                quantity: qty,
                value: sold_value,
            });
            total_value = total_value.saturating_add(sold_value);
        };

        match item_key {
            None => {
                let mut keys: Vec<(String, i64)> = account
                    .inventory
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect();
                keys.sort_by(|a, b| a.0.cmp(&b.0));
                for (key, count) in keys {
                    sell_stack(&mut account.inventory, &key, count);
                }
            }
            Some(key) => {
                let held = account.inventory.get(key).copied().unwrap_or(0);
                if held <= 0 {
                    return (Vec::new(), 0);
                }
                let qty = quantity.map_or(held, |q| q.min(held));
                if qty <= 0 {
                    return (Vec::new(), 0);
                }
                sell_stack(&mut account.inventory, key, qty);
            }
        }

        if total_value > 0 {
            account.wallet = account.wallet.saturating_add(total_value);
        }
        (details, total_value)
    }

    /// Atomically empty and return the user's whole inventory. Used by the
    /// robbery penalty path.
    pub async fn seize_all_items(&self, server: ServerId, user: UserId) -> HashMap<String, i64> {
        let mut accounts = self.accounts.lock().await;
        let account = Self::ensure_user(&mut accounts, server, user);
        std::mem::take(&mut account.inventory)
    }

    /// Top accounts by total balance, descending; ties broken by ascending
    /// user id so standings are stable across runs.
    pub async fn leaderboard(&self, server: ServerId, limit: usize) -> Vec<LeaderboardEntry> {
        let accounts = self.accounts.lock().await;
        let Some(users) = accounts.get(&server) else {
            return Vec::new();
        };
        let mut standings: Vec<LeaderboardEntry> = users
            .iter()
            .map(|(user, account)| LeaderboardEntry {
                user: *user,
                wallet: account.wallet,
                bank: account.bank,
                total: account.wallet.saturating_add(account.bank),
            })
            .collect();
        standings.sort_by(|a, b| b.total.cmp(&a.total).then(a.user.cmp(&b.user)));
        standings.truncate(limit);
        standings
    }
}
