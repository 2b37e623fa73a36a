//! Server-side progress ledger.
//!
//! Holds the authoritative XP / money / inventory of every registered user
//! for the lifetime of the process. All mutations go through [`Ledger`],
//! which serializes read-modify-write cycles so concurrent requests on the
//! same record cannot lose updates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::auth;
use crate::config::ShopConfig;
use crate::repository::{RepositoryError, UserRepository};
use crate::reputation::{reassess, Reputation};

pub const PROGRESS_BASE_XP: u64 = 10;
pub const PROGRESS_MONEY: u64 = 100;
pub const EASTER_EGG_BASE_XP: u64 = 500;
pub const EASTER_EGG_MONEY: u64 = 100_000;
/// XP multiplier while a booster is active. Money is never boosted.
pub const BOOSTER_MULTIPLIER: u64 = 2;

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("User not found")]
    NotFound(u64),
    #[error("User already exists")]
    UsernameTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("머니가 부족합니다.")]
    InsufficientFunds { balance: u64, cost: u64 },
    #[error("이미 부스터가 활성화되어 있습니다.")]
    BoosterActive { expires: DateTime<Utc> },
    #[error("이미 보유한 아이템입니다.")]
    AlreadyOwned(String),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Full stored record, including the password hash.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub xp: u64,
    pub money: u64,
    pub reputation: Reputation,
    pub inventory: Vec<String>,
    pub xp_booster_expires: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn new(id: u64, username: &str, password_hash: String) -> Self {
        Self {
            id,
            username: username.to_string(),
            password_hash,
            xp: 0,
            money: 0,
            reputation: Reputation::Starter,
            inventory: Vec::new(),
            xp_booster_expires: None,
        }
    }

    pub fn booster_active(&self, now: DateTime<Utc>) -> bool {
        self.xp_booster_expires.is_some_and(|expires| expires > now)
    }

    pub fn owns(&self, item: &str) -> bool {
        self.inventory.iter().any(|i| i == item)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            xp: self.xp,
            money: self.money,
            reputation: self.reputation,
            inventory: self.inventory.clone(),
            xp_booster_expires: self.xp_booster_expires,
        }
    }
}

/// Public view of a user, as returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub xp: u64,
    pub money: u64,
    pub reputation: Reputation,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub xp_booster_expires: Option<DateTime<Utc>>,
}

/// Reward-bearing grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// Correct answer or answered question.
    Progress,
    /// Hidden chat command bonus.
    EasterEgg,
}

impl Grant {
    pub fn base_xp(&self) -> u64 {
        match self {
            Self::Progress => PROGRESS_BASE_XP,
            Self::EasterEgg => EASTER_EGG_BASE_XP,
        }
    }

    pub fn money(&self) -> u64 {
        match self {
            Self::Progress => PROGRESS_MONEY,
            Self::EasterEgg => EASTER_EGG_MONEY,
        }
    }

    pub fn xp_delta(&self, boosted: bool) -> u64 {
        if boosted {
            self.base_xp() * BOOSTER_MULTIPLIER
        } else {
            self.base_xp()
        }
    }
}

/// Result of a grant: the updated record plus whether the tier moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantOutcome {
    pub user: UserProfile,
    pub reputation_changed: bool,
    #[serde(default)]
    pub xp_gained: u64,
    #[serde(default)]
    pub money_gained: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Time-limited XP multiplier. One active at a time.
    Booster,
    /// Owned forever. One copy per user.
    Durable,
}

/// Shop rules: which item name is the booster and how long it lasts.
#[derive(Debug, Clone)]
pub struct ShopPolicy {
    pub booster_item: String,
    pub booster_duration: Duration,
}

impl ShopPolicy {
    pub fn classify(&self, item_name: &str) -> ItemKind {
        if item_name == self.booster_item {
            ItemKind::Booster
        } else {
            ItemKind::Durable
        }
    }
}

impl From<&ShopConfig> for ShopPolicy {
    fn from(config: &ShopConfig) -> Self {
        Self {
            booster_item: config.booster_item.clone(),
            booster_duration: Duration::hours(config.booster_hours),
        }
    }
}

impl Default for ShopPolicy {
    fn default() -> Self {
        Self::from(&ShopConfig::default())
    }
}

pub struct Ledger {
    repo: Arc<dyn UserRepository>,
    shop: ShopPolicy,
    write_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(repo: Arc<dyn UserRepository>, shop: ShopPolicy) -> Self {
        Self {
            repo,
            shop,
            write_lock: Mutex::new(()),
        }
    }

    pub fn shop(&self) -> &ShopPolicy {
        &self.shop
    }

    fn load(&self, user_id: u64) -> Result<UserRecord, LedgerError> {
        self.repo
            .get(user_id)
            .map_err(LedgerError::from)?
            .ok_or(LedgerError::NotFound(user_id))
    }

    pub fn profile(&self, user_id: u64) -> Result<UserProfile, LedgerError> {
        Ok(self.load(user_id)?.profile())
    }

    /// Create a new record with zeroed progress.
    pub fn register(&self, username: &str, password: &str) -> Result<UserProfile, LedgerError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(LedgerError::Validation("Please enter all fields".into()));
        }

        let _guard = self.write_lock.lock().map_err(|_| RepositoryError::Poisoned)?;
        if self.repo.find_by_username(username)?.is_some() {
            return Err(LedgerError::UsernameTaken);
        }

        let id = self.repo.next_id()?;
        let user = UserRecord::new(id, username, auth::hash_password(password));
        self.repo.upsert(&user)?;

        info!(user_id = id, username = %username, "user registered");
        Ok(user.profile())
    }

    /// Check credentials and return the matching profile.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<UserProfile, LedgerError> {
        let user = self
            .repo
            .find_by_username(username)?
            .ok_or(LedgerError::InvalidCredentials)?;

        if !auth::verify_password(password, &user.password_hash) {
            warn!(username = %username, "login rejected");
            return Err(LedgerError::InvalidCredentials);
        }

        Ok(user.profile())
    }

    /// Apply a progress or easter-egg grant.
    pub fn grant(
        &self,
        user_id: u64,
        grant: Grant,
        now: DateTime<Utc>,
    ) -> Result<GrantOutcome, LedgerError> {
        let _guard = self.write_lock.lock().map_err(|_| RepositoryError::Poisoned)?;
        let mut user = self.load(user_id)?;

        let boosted = user.booster_active(now);
        let xp_gained = grant.xp_delta(boosted);
        let money_gained = grant.money();

        user.xp = user.xp.saturating_add(xp_gained);
        user.money = user.money.saturating_add(money_gained);

        let change = reassess(user.reputation, user.xp);
        user.reputation = change.after;

        self.repo.upsert(&user)?;

        info!(
            user_id,
            grant = ?grant,
            boosted,
            xp = user.xp,
            money = user.money,
            reputation = %user.reputation,
            "grant applied"
        );

        Ok(GrantOutcome {
            user: user.profile(),
            reputation_changed: change.changed(),
            xp_gained,
            money_gained,
        })
    }

    /// Buy an item. Nothing changes unless every check passes.
    pub fn purchase(
        &self,
        user_id: u64,
        item_name: &str,
        cost: u64,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, LedgerError> {
        if item_name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "User ID, item name, and item cost are required".into(),
            ));
        }

        let _guard = self.write_lock.lock().map_err(|_| RepositoryError::Poisoned)?;
        let mut user = self.load(user_id)?;

        let remaining = user
            .money
            .checked_sub(cost)
            .ok_or(LedgerError::InsufficientFunds {
                balance: user.money,
                cost,
            })?;

        match self.shop.classify(item_name) {
            ItemKind::Booster => {
                if let Some(expires) = user.xp_booster_expires.filter(|e| *e > now) {
                    return Err(LedgerError::BoosterActive { expires });
                }
                user.xp_booster_expires = Some(now + self.shop.booster_duration);
            }
            ItemKind::Durable => {
                if user.owns(item_name) {
                    return Err(LedgerError::AlreadyOwned(item_name.to_string()));
                }
                user.inventory.push(item_name.to_string());
            }
        }

        user.money = remaining;
        self.repo.upsert(&user)?;

        info!(user_id, item = %item_name, cost, money = user.money, "purchase completed");
        Ok(user.profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryUserRepository;

    fn ledger() -> (Ledger, Arc<MemoryUserRepository>) {
        let repo = Arc::new(MemoryUserRepository::new());
        (Ledger::new(repo.clone(), ShopPolicy::default()), repo)
    }

    fn set_fields(repo: &MemoryUserRepository, id: u64, f: impl FnOnce(&mut UserRecord)) {
        let mut user = repo.get(id).unwrap().unwrap();
        f(&mut user);
        repo.upsert(&user).unwrap();
    }

    #[test]
    fn test_register_defaults() {
        let (ledger, _) = ledger();
        let user = ledger.register("minji", "pw").unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.xp, 0);
        assert_eq!(user.money, 0);
        assert_eq!(user.reputation, Reputation::Starter);
        assert!(user.inventory.is_empty());
        assert!(user.xp_booster_expires.is_none());
    }

    #[test]
    fn test_register_rejects_duplicates_and_blanks() {
        let (ledger, _) = ledger();
        ledger.register("minji", "pw").unwrap();
        assert!(matches!(
            ledger.register("minji", "other"),
            Err(LedgerError::UsernameTaken)
        ));
        assert!(matches!(
            ledger.register("", "pw"),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            ledger.register("jihoon", ""),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_authenticate() {
        let (ledger, _) = ledger();
        ledger.register("minji", "pw").unwrap();
        assert_eq!(ledger.authenticate("minji", "pw").unwrap().username, "minji");
        assert!(matches!(
            ledger.authenticate("minji", "wrong"),
            Err(LedgerError::InvalidCredentials)
        ));
        assert!(matches!(
            ledger.authenticate("nobody", "pw"),
            Err(LedgerError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_progress_crosses_into_rookie() {
        let (ledger, repo) = ledger();
        let id = ledger.register("minji", "pw").unwrap().id;
        set_fields(&repo, id, |u| u.xp = 40);

        let outcome = ledger.grant(id, Grant::Progress, Utc::now()).unwrap();
        assert_eq!(outcome.user.xp, 50);
        assert_eq!(outcome.user.money, 100);
        assert_eq!(outcome.user.reputation, Reputation::Rookie);
        assert!(outcome.reputation_changed);
    }

    #[test]
    fn test_progress_without_tier_change() {
        let (ledger, _) = ledger();
        let id = ledger.register("minji", "pw").unwrap().id;
        let outcome = ledger.grant(id, Grant::Progress, Utc::now()).unwrap();
        assert_eq!(outcome.user.xp, 10);
        assert!(!outcome.reputation_changed);
    }

    #[test]
    fn test_grant_unknown_user() {
        let (ledger, _) = ledger();
        assert!(matches!(
            ledger.grant(99, Grant::Progress, Utc::now()),
            Err(LedgerError::NotFound(99))
        ));
    }

    #[test]
    fn test_booster_doubles_progress() {
        let (ledger, repo) = ledger();
        let now = Utc::now();
        let plain = ledger.register("plain", "pw").unwrap().id;
        let boosted = ledger.register("boosted", "pw").unwrap().id;
        set_fields(&repo, boosted, |u| u.xp_booster_expires = Some(now + Duration::hours(1)));

        let a = ledger.grant(plain, Grant::Progress, now).unwrap();
        let b = ledger.grant(boosted, Grant::Progress, now).unwrap();
        assert_eq!(b.xp_gained, 2 * a.xp_gained);
        assert_eq!(a.money_gained, b.money_gained);
    }

    #[test]
    fn test_boosted_easter_egg_is_hundredfold() {
        let (ledger, repo) = ledger();
        let now = Utc::now();
        let id = ledger.register("minji", "pw").unwrap().id;
        set_fields(&repo, id, |u| u.xp_booster_expires = Some(now + Duration::hours(1)));

        let outcome = ledger.grant(id, Grant::EasterEgg, now).unwrap();
        assert_eq!(outcome.xp_gained, 100 * PROGRESS_BASE_XP);
        assert_eq!(outcome.user.money, EASTER_EGG_MONEY);
        assert_eq!(outcome.user.reputation, Reputation::Pro);
        assert!(outcome.reputation_changed);
    }

    #[test]
    fn test_expired_booster_is_ignored() {
        let (ledger, repo) = ledger();
        let now = Utc::now();
        let id = ledger.register("minji", "pw").unwrap().id;
        set_fields(&repo, id, |u| u.xp_booster_expires = Some(now - Duration::seconds(1)));

        let outcome = ledger.grant(id, Grant::Progress, now).unwrap();
        assert_eq!(outcome.xp_gained, PROGRESS_BASE_XP);
    }

    #[test]
    fn test_purchase_insufficient_funds() {
        let (ledger, repo) = ledger();
        let id = ledger.register("minji", "pw").unwrap().id;
        set_fields(&repo, id, |u| u.money = 400);

        let err = ledger.purchase(id, "캐릭터 스킨 1", 500, Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { balance: 400, cost: 500 }));

        let user = ledger.profile(id).unwrap();
        assert_eq!(user.money, 400);
        assert!(user.inventory.is_empty());
    }

    #[test]
    fn test_purchase_durable_twice() {
        let (ledger, repo) = ledger();
        let id = ledger.register("minji", "pw").unwrap().id;
        set_fields(&repo, id, |u| u.money = 3000);

        let user = ledger.purchase(id, "캐릭터 스킨 1", 1000, Utc::now()).unwrap();
        assert_eq!(user.money, 2000);
        assert_eq!(user.inventory, vec!["캐릭터 스킨 1".to_string()]);

        let err = ledger.purchase(id, "캐릭터 스킨 1", 1000, Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyOwned(_)));
        let user = ledger.profile(id).unwrap();
        assert_eq!(user.money, 2000);
        assert_eq!(user.inventory.len(), 1);
    }

    #[test]
    fn test_booster_purchase_and_repeat() {
        let (ledger, repo) = ledger();
        let now = Utc::now();
        let id = ledger.register("minji", "pw").unwrap().id;
        set_fields(&repo, id, |u| u.money = 12000);
        let booster = ledger.shop().booster_item.clone();

        let user = ledger.purchase(id, &booster, 5000, now).unwrap();
        assert_eq!(user.money, 7000);
        assert_eq!(user.xp_booster_expires, Some(now + Duration::hours(24)));
        assert!(user.inventory.is_empty());

        let err = ledger.purchase(id, &booster, 5000, now + Duration::hours(1)).unwrap_err();
        assert!(matches!(err, LedgerError::BoosterActive { .. }));
        assert_eq!(ledger.profile(id).unwrap().money, 7000);

        // once expired it can be bought again
        let later = now + Duration::hours(25);
        let user = ledger.purchase(id, &booster, 5000, later).unwrap();
        assert_eq!(user.money, 2000);
        assert_eq!(user.xp_booster_expires, Some(later + Duration::hours(24)));
    }

    #[test]
    fn test_purchase_unknown_user_and_blank_item() {
        let (ledger, _) = ledger();
        assert!(matches!(
            ledger.purchase(5, "skin", 1, Utc::now()),
            Err(LedgerError::NotFound(5))
        ));
        let id = ledger.register("minji", "pw").unwrap().id;
        assert!(matches!(
            ledger.purchase(id, " ", 0, Utc::now()),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_concurrent_grants_lose_nothing() {
        const THREADS: u64 = 8;
        const GRANTS: u64 = 25;

        let (ledger, _) = ledger();
        let id = ledger.register("minji", "pw").unwrap().id;
        let now = Utc::now();

        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..GRANTS {
                        ledger.grant(id, Grant::Progress, now).unwrap();
                    }
                });
            }
        });

        let user = ledger.profile(id).unwrap();
        assert_eq!(user.xp, THREADS * GRANTS * PROGRESS_BASE_XP);
        assert_eq!(user.money, THREADS * GRANTS * PROGRESS_MONEY);
        assert_eq!(user.reputation, Reputation::for_xp(user.xp));
    }

    #[test]
    fn test_concurrent_purchases_of_one_item() {
        let (ledger, repo) = ledger();
        let id = ledger.register("minji", "pw").unwrap().id;
        set_fields(&repo, id, |u| u.money = 1500);
        let now = Utc::now();

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| s.spawn(|| ledger.purchase(id, "캐릭터 스킨 1", 1000, now)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let user = ledger.profile(id).unwrap();
        assert_eq!(user.money, 500);
        assert_eq!(user.inventory, vec!["캐릭터 스킨 1".to_string()]);
    }

    #[test]
    fn test_profile_wire_format() {
        let (ledger, _) = ledger();
        let user = ledger.register("minji", "pw").unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["reputation"], "스타터");
        assert!(json["xpBoosterExpires"].is_null());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_classify() {
        let policy = ShopPolicy::default();
        assert_eq!(policy.classify("XP 2배 부스터 (1일)"), ItemKind::Booster);
        assert_eq!(policy.classify("캐릭터 스킨 1"), ItemKind::Durable);
    }
}
