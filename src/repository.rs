//! User repository capability used by the progress ledger: lookup by id,
//! lookup by name, id allocation and upsert.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::ledger::UserRecord;

/// Errors surfaced by repository backends.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository lock poisoned")]
    Poisoned,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Storage backend for user records.
pub trait UserRepository: Send + Sync {
    /// Look a user up by id. `Ok(None)` when absent.
    fn get(&self, id: u64) -> Result<Option<UserRecord>, RepositoryError>;

    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError>;

    /// Allocate the id for the next registration.
    fn next_id(&self) -> Result<u64, RepositoryError>;

    /// Insert a new record or replace the one with the same id.
    fn upsert(&self, user: &UserRecord) -> Result<(), RepositoryError>;

    fn exists(&self, id: u64) -> Result<bool, RepositoryError> {
        Ok(self.get(id)?.is_some())
    }
}

impl<T: UserRepository + ?Sized> UserRepository for Arc<T> {
    fn get(&self, id: u64) -> Result<Option<UserRecord>, RepositoryError> {
        (**self).get(id)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError> {
        (**self).find_by_username(username)
    }

    fn next_id(&self) -> Result<u64, RepositoryError> {
        (**self).next_id()
    }

    fn upsert(&self, user: &UserRecord) -> Result<(), RepositoryError> {
        (**self).upsert(user)
    }
}

/// Process-lifetime store. Everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<BTreeMap<u64, UserRecord>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserRepository for MemoryUserRepository {
    fn get(&self, id: u64) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(users.get(&id).cloned())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    fn next_id(&self) -> Result<u64, RepositoryError> {
        let users = self.users.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(users.keys().next_back().map_or(1, |last| last + 1))
    }

    fn upsert(&self, user: &UserRecord) -> Result<(), RepositoryError> {
        let mut users = self.users.write().map_err(|_| RepositoryError::Poisoned)?;
        users.insert(user.id, user.clone());
        Ok(())
    }
}
