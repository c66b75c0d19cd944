//! Per-user job assignment and application cooldowns.
//!
//! A user holds at most one job. `set_job` is an unconditional setter; the
//! calling layer runs `can_apply` and the accept/decline roll first. The
//! decline cooldown is advisory: it gates new applications, nothing aborts
//! it early except `clear_cooldown`.
//!
//! The recurring payout loop is an external collaborator. It polls
//! [`JobsManager::get_job`] on its interval and credits the job's
//! payout-per-minute for as long as the stored key still matches the one it
//! started with; a changed or cleared job ends the loop.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::errors::StateError;
use super::store;
use super::{ServerId, UserId};

/// How long a declined applicant waits before applying again.
pub const DECLINE_COOLDOWN_MINUTES: i64 = 10;

#[derive(Debug, Default)]
struct JobsState {
    jobs: HashMap<ServerId, HashMap<UserId, String>>,
    cooldowns: HashMap<ServerId, HashMap<UserId, DateTime<Utc>>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JobsDocument {
    #[serde(default)]
    servers: HashMap<String, JobsServerDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JobsServerDocument {
    #[serde(default)]
    user_jobs: HashMap<String, String>,
    #[serde(default)]
    decline_cooldowns: HashMap<String, Option<DateTime<Utc>>>,
}

/// Owns job assignments and decline cooldowns behind one lock.
pub struct JobsManager {
    file_path: PathBuf,
    state: Mutex<JobsState>,
}

impl JobsManager {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            state: Mutex::new(JobsState::default()),
        }
    }

    pub async fn load(&self) -> Result<(), StateError> {
        let doc: JobsDocument = store::read_document(&self.file_path).await?;
        let mut state = self.state.lock().await;
        *state = Self::from_document(doc);
        Ok(())
    }

    pub async fn load_or_reset(&self) {
        match self.load().await {
            Ok(()) => {}
            Err(e) if e.is_missing() => {
                log::debug!("jobs: no state file yet, starting empty");
                *self.state.lock().await = JobsState::default();
            }
            Err(e) => {
                log::warn!("jobs: resetting to empty state: {e}");
                *self.state.lock().await = JobsState::default();
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

    fn from_document(doc: JobsDocument) -> JobsState {
        let mut state = JobsState::default();
        for (server_key, server_doc) in doc.servers {
            let Ok(server) = server_key.parse::<ServerId>() else {
                log::warn!("jobs: skipping unparseable server key {server_key:?}");
                continue;
            };
            let jobs = state.jobs.entry(server).or_default();
            for (user_key, job) in server_doc.user_jobs {
                if let Ok(user) = user_key.parse::<UserId>() {
                    jobs.insert(user, job);
                }
            }
            let cooldowns = state.cooldowns.entry(server).or_default();
            for (user_key, until) in server_doc.decline_cooldowns {
                if let (Ok(user), Some(until)) = (user_key.parse::<UserId>(), until) {
                    cooldowns.insert(user, until);
                }
            }
        }
        state
    }

    fn to_document(state: &JobsState) -> JobsDocument {
        let mut doc = JobsDocument::default();
        for (server, jobs) in &state.jobs {
            let server_doc = doc.servers.entry(server.to_string()).or_default();
            for (user, job) in jobs {
                server_doc.user_jobs.insert(user.to_string(), job.clone());
            }
        }
        for (server, cooldowns) in &state.cooldowns {
            let server_doc = doc.servers.entry(server.to_string()).or_default();
            for (user, until) in cooldowns {
                server_doc
                    .decline_cooldowns
                    .insert(user.to_string(), Some(*until));
            }
        }
        doc
    }

    /// The user's current job key, if employed.
    pub async fn get_job(&self, server: ServerId, user: UserId) -> Option<String> {
        let state = self.state.lock().await;
        state.jobs.get(&server)?.get(&user).cloned()
    }

    /// Unconditionally set (`Some`) or clear (`None`) the user's job.
    pub async fn set_job(&self, server: ServerId, user: UserId, job_key: Option<&str>) {
        let mut state = self.state.lock().await;
        let jobs = state.jobs.entry(server).or_default();
        match job_key {
            Some(key) => {
                jobs.insert(user, key.to_string());
            }
            None => {
                jobs.remove(&user);
            }
        }
    }

    /// Whether the user may apply for a job right now (wall clock).
    pub async fn can_apply(&self, server: ServerId, user: UserId) -> (bool, Option<String>) {
        self.can_apply_at(server, user, Utc::now()).await
    }

    /// Clock-injected variant of [`can_apply`](Self::can_apply). Rejects
    /// users who already hold a job, then users inside an unexpired decline
    /// cooldown, with the remaining wait in the reason.
    pub async fn can_apply_at(
        &self,
        server: ServerId,
        user: UserId,
        now: DateTime<Utc>,
    ) -> (bool, Option<String>) {
        let state = self.state.lock().await;
        if state
            .jobs
            .get(&server)
            .is_some_and(|jobs| jobs.contains_key(&user))
        {
            return (
                false,
                Some("You already have a job. Use /quitjob first.".to_string()),
            );
        }
        if let Some(until) = state.cooldowns.get(&server).and_then(|c| c.get(&user)) {
            if *until > now {
                let remaining = (*until - now).num_seconds();
                let minutes = remaining / 60;
                let seconds = remaining % 60;
                return (
                    false,
                    Some(format!(
                        "You must wait {minutes}m {seconds}s before applying again."
                    )),
                );
            }
        }
        (true, None)
    }

    /// Start the fixed decline cooldown from the wall clock.
    pub async fn set_decline_cooldown(&self, server: ServerId, user: UserId) {
        self.set_decline_cooldown_at(server, user, Utc::now()).await;
    }

    /// Clock-injected variant: cooldown ends `now` + 10 minutes.
    pub async fn set_decline_cooldown_at(
        &self,
        server: ServerId,
        user: UserId,
        now: DateTime<Utc>,
    ) {
        let mut state = self.state.lock().await;
        state
            .cooldowns
            .entry(server)
            .or_default()
            .insert(user, now + Duration::minutes(DECLINE_COOLDOWN_MINUTES));
    }

    pub async fn clear_cooldown(&self, server: ServerId, user: UserId) {
        let mut state = self.state.lock().await;
        if let Some(cooldowns) = state.cooldowns.get_mut(&server) {
            cooldowns.remove(&user);
        }
    }
}
