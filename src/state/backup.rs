//! Snapshot backups of the data directory.
//!
//! The state documents are small flat files, so a backup is one tar.gz of
//! the whole data dir plus a sha256 checksum recorded in `backups.json`
//! alongside the archives. Verification re-hashes the archive; pruning
//! keeps the newest N snapshots.

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tar::Builder;

/// Metadata for one snapshot, persisted in `backups.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub id: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub checksum: String,
    pub path: PathBuf,
}

/// Creates, verifies, and prunes data-dir snapshots.
pub struct BackupManager {
    data_dir: PathBuf,
    backup_dir: PathBuf,
    backups: HashMap<String, BackupMetadata>,
}

impl BackupManager {
    pub fn new(data_dir: PathBuf, backup_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&backup_dir)?;
        let mut manager = Self {
            data_dir,
            backup_dir,
            backups: HashMap::new(),
        };
        manager.load_metadata()?;
        Ok(manager)
    }

    fn metadata_path(&self) -> PathBuf {
        self.backup_dir.join("backups.json")
    }

    fn load_metadata(&mut self) -> io::Result<()> {
        let path = self.metadata_path();
        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            self.backups = serde_json::from_str(&contents)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }
        Ok(())
    }

    fn save_metadata(&self) -> io::Result<()> {
        let contents = serde_json::to_string_pretty(&self.backups)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.metadata_path(), contents)
    }

    /// Archive the data directory into a new snapshot.
    pub fn create_backup(&mut self, name: Option<String>) -> io::Result<BackupMetadata> {
        let timestamp = Utc::now();
        let id = format!("backup_{}", timestamp.format("%Y%m%d_%H%M%S_%3f"));
        let filename = format!("{id}.tar.gz");
        let backup_file = self.backup_dir.join(&filename);

        log::info!("creating backup {id}");

        let tar_gz = File::create(&backup_file)?;
        let enc = GzEncoder::new(tar_gz, Compression::default());
        let mut tar = Builder::new(enc);
        tar.append_dir_all("data", &self.data_dir)?;
        // Finish and flush the archive before hashing it
        let enc = tar.into_inner()?;
        enc.finish()?;

        let checksum = checksum_file(&backup_file)?;
        let size_bytes = fs::metadata(&backup_file)?.len();

        let metadata = BackupMetadata {
            id: id.clone(),
            name,
            created_at: timestamp,
            size_bytes,
            checksum,
            path: PathBuf::from(&filename),
        };
        self.backups.insert(id.clone(), metadata.clone());
        self.save_metadata()?;

        log::info!("backup {id} written ({size_bytes} bytes)");
        Ok(metadata)
    }

    /// Re-hash a snapshot and compare against its recorded checksum.
    pub fn verify_backup(&self, backup_id: &str) -> io::Result<bool> {
        let metadata = self
            .backups
            .get(backup_id)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "backup not found"))?;
        let backup_file = self.backup_dir.join(&metadata.path);
        if !backup_file.exists() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "backup file missing"));
        }
        let current = checksum_file(&backup_file)?;
        let valid = current == metadata.checksum;
        if !valid {
            log::error!("backup verification failed for {backup_id}: checksum mismatch");
        }
        Ok(valid)
    }

    /// Snapshots newest-first.
    pub fn list_backups(&self) -> Vec<&BackupMetadata> {
        let mut list: Vec<&BackupMetadata> = self.backups.values().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Delete everything but the newest `keep` snapshots. Returns how many
    /// were removed.
    pub fn prune(&mut self, keep: usize) -> io::Result<usize> {
        let doomed: Vec<String> = {
            let list = self.list_backups();
            list.iter().skip(keep).map(|m| m.id.clone()).collect()
        };
        let mut removed = 0;
        for id in doomed {
            if let Some(metadata) = self.backups.remove(&id) {
                let file = self.backup_dir.join(&metadata.path);
                match fs::remove_file(&file) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => removed += 1,
                    Err(e) => {
                        log::warn!("could not remove backup {id}: {e}");
                        self.backups.insert(id, metadata);
                    }
                }
            }
        }
        if removed > 0 {
            self.save_metadata()?;
            log::info!("pruned {removed} old backup(s)");
        }
        Ok(removed)
    }
}

fn checksum_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
