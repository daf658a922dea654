//! User repository for JSON storage
//!
//! Manages loading and saving staff accounts to users.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::InventoryError;
use crate::models::{User, UserId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable user data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct UserData {
    users: Vec<User>,
}

/// Repository for user persistence
pub struct UserRepository {
    path: PathBuf,
    data: RwLock<HashMap<UserId, User>>,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load users from disk
    pub fn load(&self) -> Result<(), InventoryError> {
        let file_data: UserData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for user in file_data.users {
            data.insert(user.id, user);
        }

        Ok(())
    }

    /// Save users to disk
    pub fn save(&self) -> Result<(), InventoryError> {
        let data = self.data.read().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut users: Vec<_> = data.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &UserData { users })
    }

    /// Get a user by ID
    pub fn get(&self, id: UserId) -> Result<Option<User>, InventoryError> {
        let data = self.data.read().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get a user by username (case-insensitive)
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>, InventoryError> {
        let data = self.data.read().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        let username_lower = username.trim().to_lowercase();
        Ok(data
            .values()
            .find(|u| u.username.to_lowercase() == username_lower)
            .cloned())
    }

    /// Check whether any admin account exists
    pub fn has_admin(&self) -> Result<bool, InventoryError> {
        let data = self.data.read().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.values().any(|u| u.role.is_admin()))
    }

    /// Insert a user, rejecting a taken username
    pub fn insert(&self, user: User) -> Result<(), InventoryError> {
        let mut data = self.data.write().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire write lock: {}", e))
        })?;

        let username_lower = user.username.to_lowercase();
        if data
            .values()
            .any(|u| u.username.to_lowercase() == username_lower)
        {
            return Err(InventoryError::Duplicate {
                entity_type: "User",
                identifier: user.username,
            });
        }

        data.insert(user.id, user);
        Ok(())
    }

    /// Count users
    pub fn count(&self) -> Result<usize, InventoryError> {
        let data = self.data.read().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}
