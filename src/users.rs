// 👤 User store - Credential table behind the dashboard login
// SQLite-backed CRUD with salted SHA-256 password hashes

use anyhow::{Context, Result};
use log::info;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

// ============================================================================
// USER ACCOUNT
// ============================================================================

/// One row from the users table, without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub active: bool,
    pub created_at: String,
}

// ============================================================================
// PASSWORD HASHING
// ============================================================================

/// Salted hash stored as "salt$digest". Salt is a fresh UUID per password.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest_with_salt(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };

    digest_with_salt(salt, password) == digest
}

fn digest_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// USER STORE
// ============================================================================

pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    /// Open (or create) the users database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open users database {}", path.display()))?;

        let store = UserStore { conn };
        store.init_schema()?;

        Ok(store)
    }

    /// In-memory store, used in tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        let store = UserStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    full_name TEXT NOT NULL,
                    role TEXT DEFAULT 'user',
                    active INTEGER DEFAULT 1,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                [],
            )
            .context("failed to create users table")?;

        Ok(())
    }

    /// Create a user from a plain-text password.
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
        role: &str,
    ) -> Result<()> {
        self.create_user_from_hash(username, &hash_password(password), full_name, role)
    }

    /// Create a user from an already-computed hash (admin bootstrap path).
    pub fn create_user_from_hash(
        &self,
        username: &str,
        password_hash: &str,
        full_name: &str,
        role: &str,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO users (username, password_hash, full_name, role)
                 VALUES (?1, ?2, ?3, ?4)",
                params![username, password_hash, full_name, role],
            )
            .with_context(|| format!("failed to create user '{}'", username))?;

        info!("created user '{}' with role '{}'", username, role);

        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserAccount>> {
        self.conn
            .query_row(
                "SELECT id, username, full_name, role, active, created_at
                 FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(UserAccount {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        full_name: row.get(2)?,
                        role: row.get(3)?,
                        active: row.get::<_, i64>(4)? != 0,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to load user '{}'", username))
    }

    pub fn list_users(&self) -> Result<Vec<UserAccount>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, username, full_name, role, active, created_at
                 FROM users ORDER BY created_at DESC, id DESC",
            )
            .context("failed to prepare user listing")?;

        let users = stmt
            .query_map([], |row| {
                Ok(UserAccount {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    full_name: row.get(2)?,
                    role: row.get(3)?,
                    active: row.get::<_, i64>(4)? != 0,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to list users")?;

        Ok(users)
    }

    /// Update selected fields. Returns false when nothing was requested
    /// or the user does not exist.
    pub fn update_user(
        &self,
        username: &str,
        full_name: Option<&str>,
        role: Option<&str>,
        active: Option<bool>,
    ) -> Result<bool> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<rusqlite::types::Value> = Vec::new();

        if let Some(full_name) = full_name {
            assignments.push("full_name = ?");
            values.push(full_name.to_string().into());
        }
        if let Some(role) = role {
            assignments.push("role = ?");
            values.push(role.to_string().into());
        }
        if let Some(active) = active {
            assignments.push("active = ?");
            values.push(i64::from(active).into());
        }

        if assignments.is_empty() {
            return Ok(false);
        }

        values.push(username.to_string().into());
        let sql = format!(
            "UPDATE users SET {} WHERE username = ?",
            assignments.join(", ")
        );

        let changed = self
            .conn
            .execute(&sql, params_from_iter(values))
            .with_context(|| format!("failed to update user '{}'", username))?;

        Ok(changed > 0)
    }

    pub fn change_password(&self, username: &str, new_password: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE users SET password_hash = ?1 WHERE username = ?2",
                params![hash_password(new_password), username],
            )
            .with_context(|| format!("failed to change password for '{}'", username))?;

        Ok(changed > 0)
    }

    /// Soft delete: the row stays, the account is marked inactive.
    pub fn deactivate_user(&self, username: &str) -> Result<bool> {
        self.update_user(username, None, None, Some(false))
    }

    fn password_hash(&self, username: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT password_hash FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to load credentials for '{}'", username))
    }
}

// ============================================================================
// AUTHENTICATOR
// ============================================================================

/// Username/password check over the user store. Explicitly constructed
/// and passed in, never a process-wide singleton.
pub struct Authenticator {
    store: UserStore,
}

impl Authenticator {
    pub fn new(store: UserStore) -> Self {
        Authenticator { store }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    /// Returns the account on valid credentials for an active user.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserAccount>> {
        let Some(user) = self.store.get_user(username)? else {
            return Ok(None);
        };

        if !user.active {
            return Ok(None);
        }

        let Some(stored) = self.store.password_hash(username)? else {
            return Ok(None);
        };

        if verify_password(password, &stored) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_admin() -> UserStore {
        let store = UserStore::open_in_memory().unwrap();
        store
            .create_user("admin", "secret", "Administrador", "admin")
            .unwrap();
        store
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("secret");

        assert!(verify_password("secret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("secret", "malformed-hash"));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("secret"), hash_password("secret"));
    }

    #[test]
    fn test_create_and_get_user() {
        let store = store_with_admin();

        let user = store.get_user("admin").unwrap().unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.full_name, "Administrador");
        assert_eq!(user.role, "admin");
        assert!(user.active);

        assert!(store.get_user("nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_fails() {
        let store = store_with_admin();

        let result = store.create_user("admin", "other", "Someone Else", "user");
        assert!(result.is_err());
    }

    #[test]
    fn test_list_users() {
        let store = store_with_admin();
        store.create_user("ana", "pw", "Ana Souza", "user").unwrap();

        let users = store.list_users().unwrap();
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn test_update_user_fields() {
        let store = store_with_admin();

        assert!(store
            .update_user("admin", Some("Novo Nome"), Some("user"), None)
            .unwrap());

        let user = store.get_user("admin").unwrap().unwrap();
        assert_eq!(user.full_name, "Novo Nome");
        assert_eq!(user.role, "user");

        // Nothing requested, nothing changed
        assert!(!store.update_user("admin", None, None, None).unwrap());
        // Unknown user
        assert!(!store
            .update_user("nobody", Some("X"), None, None)
            .unwrap());
    }

    #[test]
    fn test_authenticate() {
        let auth = Authenticator::new(store_with_admin());

        let user = auth.authenticate("admin", "secret").unwrap();
        assert_eq!(user.unwrap().username, "admin");

        assert!(auth.authenticate("admin", "wrong").unwrap().is_none());
        assert!(auth.authenticate("nobody", "secret").unwrap().is_none());
    }

    #[test]
    fn test_deactivated_user_cannot_authenticate() {
        let store = store_with_admin();
        assert!(store.deactivate_user("admin").unwrap());

        let user = store.get_user("admin").unwrap().unwrap();
        assert!(!user.active);

        let auth = Authenticator::new(store);
        assert!(auth.authenticate("admin", "secret").unwrap().is_none());
    }

    #[test]
    fn test_change_password() {
        let store = store_with_admin();
        assert!(store.change_password("admin", "rotated").unwrap());

        let auth = Authenticator::new(store);
        assert!(auth.authenticate("admin", "secret").unwrap().is_none());
        assert!(auth.authenticate("admin", "rotated").unwrap().is_some());
    }
}
