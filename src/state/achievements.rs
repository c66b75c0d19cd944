//! Per-user achievement unlock sets.
//!
//! Unlocks are monotonic: once a key is in a user's set it never leaves.
//! [`AchievementsManager::unlock_achievement`] returns true only on the
//! locked-to-unlocked transition; callers treat that as the exactly-once
//! signal for crediting the catalog reward and must do nothing further on
//! false.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::errors::StateError;
use super::store;
use super::{ServerId, UserId};

type UnlockMap = HashMap<ServerId, HashMap<UserId, HashSet<String>>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct AchievementsDocument {
    #[serde(default)]
    servers: HashMap<String, AchievementsServerDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AchievementsServerDocument {
    #[serde(default)]
    user_achievements: HashMap<String, Vec<String>>,
}

/// Owns every user's unlocked-achievement set behind one lock.
pub struct AchievementsManager {
    file_path: PathBuf,
    unlocks: Mutex<UnlockMap>,
}

impl AchievementsManager {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            unlocks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn load(&self) -> Result<(), StateError> {
        let doc: AchievementsDocument = store::read_document(&self.file_path).await?;
        let mut unlocks = self.unlocks.lock().await;
        *unlocks = Self::from_document(doc);
        Ok(())
    }

    pub async fn load_or_reset(&self) {
        match self.load().await {
            Ok(()) => {}
            Err(e) if e.is_missing() => {
                log::debug!("achievements: no state file yet, starting empty");
                self.unlocks.lock().await.clear();
            }
            Err(e) => {
                log::warn!("achievements: resetting to empty state: {e}");
                self.unlocks.lock().await.clear();
            }
        }
    }

    pub async fn save(&self) -> Result<(), StateError> {
        let doc = {
            let unlocks = self.unlocks.lock().await;
            Self::to_document(&unlocks)
        };
        store::write_document(&self.file_path, &doc).await
    }

    fn from_document(doc: AchievementsDocument) -> UnlockMap {
        let mut unlocks = UnlockMap::new();
        for (server_key, server_doc) in doc.servers {
            let Ok(server) = server_key.parse::<ServerId>() else {
                log::warn!("achievements: skipping unparseable server key {server_key:?}");
                continue;
            };
            let users = unlocks.entry(server).or_default();
            for (user_key, keys) in server_doc.user_achievements {
                if let Ok(user) = user_key.parse::<UserId>() {
                    users.insert(user, keys.into_iter().collect());
                }
            }
        }
        unlocks
    }

    fn to_document(unlocks: &UnlockMap) -> AchievementsDocument {
        let mut doc = AchievementsDocument::default();
        for (server, users) in unlocks {
            let server_doc = doc.servers.entry(server.to_string()).or_default();
            for (user, keys) in users {
                // Sorted so the document is stable across saves
                let mut keys: Vec<String> = keys.iter().cloned().collect();
                keys.sort();
                server_doc.user_achievements.insert(user.to_string(), keys);
            }
        }
        doc
    }

    pub async fn has_achievement(&self, server: ServerId, user: UserId, key: &str) -> bool {
        let unlocks = self.unlocks.lock().await;
        unlocks
            .get(&server)
            .and_then(|users| users.get(&user))
            .is_some_and(|set| set.contains(key))
    }

    /// Idempotent unlock. True only on the first-time transition; false
    /// means the reward was already granted and nothing further should
    /// happen.
    pub async fn unlock_achievement(&self, server: ServerId, user: UserId, key: &str) -> bool {
        let mut unlocks = self.unlocks.lock().await;
        unlocks
            .entry(server)
            .or_default()
            .entry(user)
            .or_default()
            .insert(key.to_string())
    }

    /// Defensive copy of the user's unlock set.
    pub async fn get_user_achievements(
        &self,
        server: ServerId,
        user: UserId,
    ) -> HashSet<String> {
        let unlocks = self.unlocks.lock().await;
        unlocks
            .get(&server)
            .and_then(|users| users.get(&user))
            .cloned()
            .unwrap_or_default()
    }
}
