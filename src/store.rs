//! Session State Store: the client-side, locally persisted mirror of the
//! signed-in user's progress plus the local learning session.
//!
//! Each key is serialized and restored on its own. A missing or unreadable
//! key falls back to its default and never blocks the others.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ledger::UserProfile;
use crate::reputation::Reputation;

pub const KEY_USER: &str = "user";
pub const KEY_REPUTATION: &str = "reputation";
pub const KEY_GAME_MONEY: &str = "gameMoney";
pub const KEY_INVENTORY: &str = "inventory";
pub const KEY_CALENDAR_EVENTS: &str = "calendarEvents";
pub const KEY_SOLVED_PROBLEMS: &str = "solvedProblems";
pub const KEY_LEARNING_PROGRESS: &str = "learningProgress";
pub const KEY_USER_AGE: &str = "userAge";
pub const KEY_WORM_MONEY: &str = "wormGameMoney";
pub const KEY_PLATFORMER_MONEY: &str = "platformerGameMoney";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// String-keyed storage holding one serialized value per key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

/// Bearer token and the last user record the server returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub date: NaiveDate,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedProblem {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningProgress {
    pub total_problems_solved: u64,
    pub correct_answers: u64,
}

impl LearningProgress {
    /// Correct answers over attempts, as a percentage.
    pub fn accuracy(&self) -> f64 {
        if self.total_problems_solved == 0 {
            return 0.0;
        }
        self.correct_answers as f64 / self.total_problems_solved as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<AuthSession>,
    pub reputation: Reputation,
    pub game_money: u64,
    pub inventory: Vec<String>,
    pub calendar_events: Vec<CalendarEvent>,
    pub solved_problems: Vec<SolvedProblem>,
    pub learning_progress: LearningProgress,
    pub user_age: Option<u32>,
    pub worm_game_money: u64,
    pub platformer_game_money: u64,
}

impl SessionState {
    pub fn user_id(&self) -> Option<u64> {
        self.user.as_ref().map(|s| s.user.id)
    }

    pub fn owns(&self, item: &str) -> bool {
        self.inventory.iter().any(|i| i == item)
    }
}

/// Persisted session state. Every mutation writes the keys it touched.
pub struct SessionStore {
    backend: Box<dyn KeyValueStore>,
    state: SessionState,
}

impl SessionStore {
    /// Restore every key from `backend`.
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        let state = SessionState {
            user: restore(backend.as_ref(), KEY_USER),
            reputation: restore(backend.as_ref(), KEY_REPUTATION),
            game_money: restore(backend.as_ref(), KEY_GAME_MONEY),
            inventory: restore(backend.as_ref(), KEY_INVENTORY),
            calendar_events: restore(backend.as_ref(), KEY_CALENDAR_EVENTS),
            solved_problems: restore(backend.as_ref(), KEY_SOLVED_PROBLEMS),
            learning_progress: restore(backend.as_ref(), KEY_LEARNING_PROGRESS),
            user_age: restore(backend.as_ref(), KEY_USER_AGE),
            worm_game_money: restore(backend.as_ref(), KEY_WORM_MONEY),
            platformer_game_money: restore(backend.as_ref(), KEY_PLATFORMER_MONEY),
        };
        Self { backend, state }
    }

    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStore::new()))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_string(value)?;
        self.backend.put(key, &data)?;
        debug!(key, "session key persisted");
        Ok(())
    }

    pub fn sign_in(&mut self, token: &str, user: UserProfile) -> Result<(), StoreError> {
        self.state.user = Some(AuthSession {
            token: token.to_string(),
            user: user.clone(),
        });
        self.persist(KEY_USER, &self.state.user)?;
        self.apply_server_user(user)
    }

    /// Drop the credentials. Local learning data stays on the device.
    pub fn sign_out(&mut self) -> Result<(), StoreError> {
        self.state.user = None;
        self.backend.remove(KEY_USER)
    }

    /// Overwrite the progress mirror with the server's record.
    pub fn apply_server_user(&mut self, user: UserProfile) -> Result<(), StoreError> {
        self.state.reputation = user.reputation;
        self.state.game_money = user.money;
        self.state.inventory = user.inventory.clone();
        if let Some(session) = self.state.user.as_mut() {
            session.user = user;
        }

        self.persist(KEY_REPUTATION, &self.state.reputation)?;
        self.persist(KEY_GAME_MONEY, &self.state.game_money)?;
        self.persist(KEY_INVENTORY, &self.state.inventory)?;
        if self.state.user.is_some() {
            self.persist(KEY_USER, &self.state.user)?;
        }
        Ok(())
    }

    pub fn add_calendar_event(
        &mut self,
        date: NaiveDate,
        title: &str,
    ) -> Result<CalendarEvent, StoreError> {
        let event = CalendarEvent {
            id: Uuid::new_v4(),
            date,
            title: title.to_string(),
        };
        self.state.calendar_events.push(event.clone());
        self.persist(KEY_CALENDAR_EVENTS, &self.state.calendar_events)?;
        Ok(event)
    }

    pub fn add_solved_problem(&mut self, problem: SolvedProblem) -> Result<(), StoreError> {
        self.state.solved_problems.push(problem);
        self.persist(KEY_SOLVED_PROBLEMS, &self.state.solved_problems)
    }

    pub fn record_attempt(&mut self) -> Result<(), StoreError> {
        let progress = &mut self.state.learning_progress;
        progress.total_problems_solved = progress.total_problems_solved.saturating_add(1);
        self.persist(KEY_LEARNING_PROGRESS, &self.state.learning_progress)
    }

    pub fn record_correct(&mut self) -> Result<(), StoreError> {
        let progress = &mut self.state.learning_progress;
        progress.correct_answers = progress.correct_answers.saturating_add(1);
        self.persist(KEY_LEARNING_PROGRESS, &self.state.learning_progress)
    }

    pub fn set_user_age(&mut self, age: Option<u32>) -> Result<(), StoreError> {
        self.state.user_age = age;
        match age {
            Some(age) => self.persist(KEY_USER_AGE, &age),
            None => self.backend.remove(KEY_USER_AGE),
        }
    }

    pub fn set_worm_money(&mut self, money: u64) -> Result<(), StoreError> {
        self.state.worm_game_money = money;
        self.persist(KEY_WORM_MONEY, &money)
    }

    pub fn set_platformer_money(&mut self, money: u64) -> Result<(), StoreError> {
        self.state.platformer_game_money = money;
        self.persist(KEY_PLATFORMER_MONEY, &money)
    }
}

fn restore<T: DeserializeOwned + Default>(backend: &dyn KeyValueStore, key: &str) -> T {
    match backend.get(key) {
        Ok(Some(data)) => serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!(key, error = %e, "discarding malformed session value");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "could not read session value");
            T::default()
        }
    }
}
