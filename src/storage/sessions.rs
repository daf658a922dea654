//! Session repository for JSON storage
//!
//! Keeps issued bearer tokens in sessions.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::models::UserId;

use super::file_io::{read_json, write_json_atomic};

/// An issued login token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionData {
    sessions: Vec<Session>,
}

/// Repository for session persistence
pub struct SessionRepository {
    path: PathBuf,
    data: RwLock<HashMap<String, Session>>,
}

impl SessionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load sessions from disk
    pub fn load(&self) -> Result<(), InventoryError> {
        let file_data: SessionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for session in file_data.sessions {
            data.insert(session.token.clone(), session);
        }

        Ok(())
    }

    /// Save sessions to disk
    pub fn save(&self) -> Result<(), InventoryError> {
        let data = self.data.read().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut sessions: Vec<_> = data.values().cloned().collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &SessionData { sessions })
    }

    pub fn get(&self, token: &str) -> Result<Option<Session>, InventoryError> {
        let data = self.data.read().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(token).cloned())
    }

    pub fn insert(&self, session: Session) -> Result<(), InventoryError> {
        let mut data = self.data.write().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(session.token.clone(), session);
        Ok(())
    }

    /// Remove a session, returning whether it existed
    pub fn remove(&self, token: &str) -> Result<bool, InventoryError> {
        let mut data = self.data.write().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(token).is_some())
    }

    /// Drop every session that expired before `now`, returning how many went
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, InventoryError> {
        let mut data = self.data.write().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire write lock: {}", e))
        })?;

        let before = data.len();
        data.retain(|_, s| !s.is_expired(now));
        Ok(before - data.len())
    }
}
