//! The credential table and its persistence.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use crate::config::Seed;
use crate::crypto::Hasher;
use crate::error::{Result, ServerError};
use crate::user::{Role, User};

/// Username-keyed credential store. Lookups are exact and case-sensitive.
pub struct UserDirectory {
    users: HashMap<String, User>,
    /// The protected admin account name.
    seeded_admin: String,
    hasher: Hasher,
    path: Option<PathBuf>,
}

impl UserDirectory {
    /// Load the user table and guarantee the seeded accounts exist.
    pub fn open(path: Option<PathBuf>, hasher: Hasher, seed: &Seed) -> Result<Self> {
        let users = match &path {
            Some(path) if path.is_file() => {
                let raw = fs::read(path)?;
                let list: Vec<User> = serde_json::from_slice(&raw)?;
                list.into_iter()
                    .map(|user| (user.username.clone(), user))
                    .collect()
            },
            _ => HashMap::new(),
        };

        let mut directory = Self {
            users,
            seeded_admin: seed.admin.username.clone(),
            hasher,
            path,
        };

        directory.seed_account(&seed.admin.username, &seed.admin.password, Role::Admin)?;
        if let Some(staff) = &seed.staff {
            directory.seed_account(&staff.username, &staff.password, Role::Staff)?;
        }

        Ok(directory)
    }

    fn seed_account(&mut self, username: &str, password: &str, role: Role) -> Result<()> {
        if self.users.contains_key(username) {
            return Ok(());
        }

        tracing::info!(%username, ?role, "seeding account");
        self.users.insert(
            username.to_owned(),
            User {
                username: username.to_owned(),
                password_hash: self.hasher.digest(password),
                role,
                created_at: Utc::now(),
            },
        );
        self.save()
    }

    /// Check a username/password pair.
    ///
    /// Unknown username and wrong password fail identically so responses
    /// cannot be used to enumerate accounts.
    pub fn verify(&self, username: &str, password: &str) -> Result<(String, Role)> {
        let Some(user) = self.users.get(username) else {
            return Err(ServerError::InvalidLogin);
        };
        if self.hasher.digest(password) != user.password_hash {
            return Err(ServerError::InvalidLogin);
        }

        Ok((user.username.clone(), user.role))
    }

    /// Create an account. Username uniqueness is enforced here; field policy
    /// (length, role values) is the callers' job.
    pub fn add(&mut self, username: &str, password: &str, role: Role) -> Result<()> {
        if self.users.contains_key(username) {
            return Err(ServerError::UserExists);
        }

        self.users.insert(
            username.to_owned(),
            User {
                username: username.to_owned(),
                password_hash: self.hasher.digest(password),
                role,
                created_at: Utc::now(),
            },
        );
        self.save()
    }

    /// Delete an account. The seeded admin is refused unconditionally.
    pub fn delete(&mut self, username: &str) -> Result<()> {
        if username == self.seeded_admin {
            return Err(ServerError::CannotDeleteAdmin);
        }
        if self.users.remove(username).is_none() {
            return Err(ServerError::NotFound);
        }

        self.save()
    }

    /// Overwrite an account's password digest.
    pub fn reset_password(&mut self, username: &str, new_password: &str) -> Result<()> {
        let digest = self.hasher.digest(new_password);
        let Some(user) = self.users.get_mut(username) else {
            return Err(ServerError::NotFound);
        };
        user.password_hash = digest;

        self.save()
    }

    /// All users, most recently created first.
    pub fn list(&self) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users
    }

    fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            let mut list: Vec<&User> = self.users.values().collect();
            list.sort_by(|a, b| a.username.cmp(&b.username));

            let raw = serde_json::to_vec(&list)?;
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, raw)?;
            fs::rename(&tmp, path)?;
        }
        Ok(())
    }
}
