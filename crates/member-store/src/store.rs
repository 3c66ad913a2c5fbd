//! Persistent member store.

use crate::error::StoreError;
use crate::types::{LedgerEntry, LedgerMemo, Member, MemberId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Data version for schema migrations.
const DATA_VERSION: u32 = 1;

/// Snapshot written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemberData {
    version: u32,
    next_id: MemberId,
    members: HashMap<MemberId, Member>,
    ledger: Vec<LedgerEntry>,
    /// Telegram id -> member id. Rebuilt on load.
    #[serde(skip)]
    by_telegram_id: HashMap<i64, MemberId>,
}

impl Default for MemberData {
    fn default() -> Self {
        Self {
            version: DATA_VERSION,
            next_id: 1,
            members: HashMap::new(),
            ledger: Vec::new(),
            by_telegram_id: HashMap::new(),
        }
    }
}

impl MemberData {
    fn reindex(&mut self) {
        self.by_telegram_id = self
            .members
            .values()
            .map(|m| (m.telegram_id, m.id))
            .collect();
    }

    fn member_mut(&mut self, id: MemberId) -> Result<&mut Member, StoreError> {
        self.members
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

/// Member identities and points ledger.
///
/// All mutations take the write lock, so creating a member is a single
/// check-and-insert and balance changes are atomic. When a storage path is
/// set, the snapshot is rewritten after every mutation; a failed write rolls
/// the mutation back.
pub struct MemberStore {
    data: RwLock<MemberData>,
    storage_path: Option<PathBuf>,
}

impl MemberStore {
    /// Create a store that lives only in memory.
    pub fn memory() -> Self {
        Self {
            data: RwLock::new(MemberData::default()),
            storage_path: None,
        }
    }

    /// Open a store backed by a JSON snapshot, loading it if present.
    pub async fn open(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        let data = load(&storage_path).await?;

        info!(
            "Loaded {} members and {} ledger entries from {:?}",
            data.members.len(),
            data.ledger.len(),
            storage_path
        );

        Ok(Self {
            data: RwLock::new(data),
            storage_path: Some(storage_path),
        })
    }

    /// Number of registered members.
    pub async fn count(&self) -> usize {
        self.data.read().await.members.len()
    }

    /// Look up a member by Telegram user id.
    pub async fn find_by_telegram_id(&self, telegram_id: i64) -> Option<Member> {
        let data = self.data.read().await;
        data.by_telegram_id
            .get(&telegram_id)
            .and_then(|id| data.members.get(id))
            .cloned()
    }

    /// Create a member for a Telegram user.
    ///
    /// Fails with [`StoreError::AlreadyRegistered`] if the user already has
    /// a member record.
    pub async fn create(
        &self,
        telegram_id: i64,
        display_name: &str,
    ) -> Result<Member, StoreError> {
        let mut data = self.data.write().await;

        if data.by_telegram_id.contains_key(&telegram_id) {
            return Err(StoreError::AlreadyRegistered(telegram_id));
        }

        let id = data.next_id;
        let member = Member::new(id, telegram_id, display_name);
        data.next_id += 1;
        data.members.insert(id, member.clone());
        data.by_telegram_id.insert(telegram_id, id);

        if let Err(e) = self.save(&data).await {
            data.members.remove(&id);
            data.by_telegram_id.remove(&telegram_id);
            data.next_id = id;
            return Err(e);
        }

        info!(member_id = id, telegram_id, "Member created");
        Ok(member)
    }

    /// Current balance of a member.
    pub async fn balance(&self, id: MemberId) -> Result<i64, StoreError> {
        self.data
            .read()
            .await
            .members
            .get(&id)
            .map(|m| m.balance)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Add points to a member.
    pub async fn credit(
        &self,
        id: MemberId,
        points: i64,
        memo: LedgerMemo,
    ) -> Result<LedgerEntry, StoreError> {
        if points <= 0 {
            return Err(StoreError::InvalidAmount(points));
        }
        self.apply(id, points, memo).await
    }

    /// Remove points from a member. The balance may not go below zero.
    pub async fn debit(
        &self,
        id: MemberId,
        points: i64,
        memo: LedgerMemo,
    ) -> Result<LedgerEntry, StoreError> {
        if points <= 0 {
            return Err(StoreError::InvalidAmount(points));
        }
        self.apply(id, -points, memo).await
    }

    async fn apply(
        &self,
        id: MemberId,
        delta: i64,
        memo: LedgerMemo,
    ) -> Result<LedgerEntry, StoreError> {
        let mut data = self.data.write().await;
        let member = data.member_mut(id)?;

        if member.excluded {
            return Err(StoreError::Excluded(id));
        }

        let previous = member.balance;
        let balance_after = previous
            .checked_add(delta)
            .ok_or(StoreError::BalanceOverflow {
                balance: previous,
                delta,
            })?;
        if balance_after < 0 {
            return Err(StoreError::InsufficientBalance {
                balance: previous,
                requested: -delta,
            });
        }
        member.balance = balance_after;

        let entry = LedgerEntry {
            member_id: id,
            delta,
            reference: memo.reference,
            entry: memo.entry,
            actor: memo.actor,
            balance_after,
            timestamp: Utc::now(),
        };
        data.ledger.push(entry.clone());

        if let Err(e) = self.save(&data).await {
            data.ledger.pop();
            data.member_mut(id)?.balance = previous;
            return Err(e);
        }

        info!(member_id = id, delta, balance_after, reference = %entry.reference, "Ledger updated");
        Ok(entry)
    }

    /// Include or exclude a member from the points ledger.
    pub async fn set_excluded(&self, id: MemberId, excluded: bool) -> Result<Member, StoreError> {
        let mut data = self.data.write().await;
        let member = data.member_mut(id)?;
        let previous = member.excluded;
        member.excluded = excluded;
        let updated = member.clone();

        if let Err(e) = self.save(&data).await {
            data.member_mut(id)?.excluded = previous;
            return Err(e);
        }

        info!(member_id = id, excluded, "Member exclusion updated");
        Ok(updated)
    }

    /// Whether a member is excluded from the points ledger.
    pub async fn is_excluded(&self, id: MemberId) -> Result<bool, StoreError> {
        self.data
            .read()
            .await
            .members
            .get(&id)
            .map(|m| m.excluded)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Ledger entries for a member, oldest first.
    pub async fn history(&self, id: MemberId) -> Vec<LedgerEntry> {
        self.data
            .read()
            .await
            .ledger
            .iter()
            .filter(|e| e.member_id == id)
            .cloned()
            .collect()
    }

    async fn save(&self, data: &MemberData) -> Result<(), StoreError> {
        let Some(path) = &self.storage_path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(data)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Atomic write
        let temp_path = path.with_extension("tmp");
        let result = async {
            fs::write(&temp_path, &bytes).await?;
            fs::rename(&temp_path, path).await
        }
        .await;

        if let Err(e) = result {
            error!("Failed to save member store to {:?}: {}", path, e);
            return Err(e.into());
        }

        debug!("Saved member store ({} bytes) to {:?}", bytes.len(), path);
        Ok(())
    }
}

async fn load(path: &Path) -> Result<MemberData, StoreError> {
    if !fs::try_exists(path).await? {
        info!("No member store at {:?}, starting empty", path);
        return Ok(MemberData::default());
    }

    let bytes = fs::read(path).await?;
    let mut data: MemberData = serde_json::from_slice(&bytes)?;
    data.reindex();
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn memo() -> LedgerMemo {
        LedgerMemo::new("test", "Test adjustment").with_actor("admin")
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemberStore::memory();
        let member = store.create(42, "Ada").await.unwrap();

        assert_eq!(member.id, 1);
        assert_eq!(member.login, "tgvipmem_42");

        let found = store.find_by_telegram_id(42).await.unwrap();
        assert_eq!(found, member);
        assert!(store.find_by_telegram_id(43).await.is_none());
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_create_twice_rejected() {
        let store = MemberStore::memory();
        store.create(42, "Ada").await.unwrap();

        let second = store.create(42, "Ada again").await;
        assert!(matches!(second, Err(StoreError::AlreadyRegistered(42))));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_create_single_member() {
        let store = Arc::new(MemberStore::memory());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(7, "Racer").await.is_ok() })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_credit_and_debit() {
        let store = MemberStore::memory();
        let member = store.create(42, "Ada").await.unwrap();

        let entry = store.credit(member.id, 100, memo()).await.unwrap();
        assert_eq!(entry.delta, 100);
        assert_eq!(entry.balance_after, 100);
        assert_eq!(entry.actor.as_deref(), Some("admin"));

        let entry = store.debit(member.id, 30, memo()).await.unwrap();
        assert_eq!(entry.delta, -30);
        assert_eq!(store.balance(member.id).await.unwrap(), 70);
        assert_eq!(store.history(member.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_debit_insufficient_balance() {
        let store = MemberStore::memory();
        let member = store.create(42, "Ada").await.unwrap();
        store.credit(member.id, 10, memo()).await.unwrap();

        let result = store.debit(member.id, 11, memo()).await;
        assert!(matches!(
            result,
            Err(StoreError::InsufficientBalance { balance: 10, requested: 11 })
        ));
        assert_eq!(store.balance(member.id).await.unwrap(), 10);
        assert_eq!(store.history(member.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_credit_overflow_rejected() {
        let store = MemberStore::memory();
        let member = store.create(42, "Ada").await.unwrap();
        store.credit(member.id, 1, memo()).await.unwrap();

        let result = store.credit(member.id, i64::MAX, memo()).await;
        assert!(matches!(
            result,
            Err(StoreError::BalanceOverflow { balance: 1, delta: i64::MAX })
        ));
        assert_eq!(store.balance(member.id).await.unwrap(), 1);
        assert_eq!(store.history(member.id).await.len(), 1);

        // Deducting the largest amount from zero is a plain shortfall
        let other = store.create(43, "Bob").await.unwrap();
        let result = store.debit(other.id, i64::MAX, memo()).await;
        assert!(matches!(result, Err(StoreError::InsufficientBalance { .. })));
    }

    #[tokio::test]
    async fn test_invalid_amount() {
        let store = MemberStore::memory();
        let member = store.create(42, "Ada").await.unwrap();

        assert!(matches!(
            store.credit(member.id, 0, memo()).await,
            Err(StoreError::InvalidAmount(0))
        ));
        assert!(matches!(
            store.debit(member.id, -5, memo()).await,
            Err(StoreError::InvalidAmount(-5))
        ));
    }

    #[tokio::test]
    async fn test_excluded_member_blocked() {
        let store = MemberStore::memory();
        let member = store.create(42, "Ada").await.unwrap();
        store.set_excluded(member.id, true).await.unwrap();

        assert!(store.is_excluded(member.id).await.unwrap());
        assert!(matches!(
            store.credit(member.id, 5, memo()).await,
            Err(StoreError::Excluded(_))
        ));

        store.set_excluded(member.id, false).await.unwrap();
        assert!(store.credit(member.id, 5, memo()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_member() {
        let store = MemberStore::memory();
        assert!(matches!(store.balance(99).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.credit(99, 1, memo()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_persistence_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("members.json");

        {
            let store = MemberStore::open(&path).await.unwrap();
            let member = store.create(42, "Ada").await.unwrap();
            store.credit(member.id, 25, memo()).await.unwrap();
        }

        let reopened = MemberStore::open(&path).await.unwrap();
        let member = reopened.find_by_telegram_id(42).await.unwrap();
        assert_eq!(member.balance, 25);
        assert_eq!(reopened.history(member.id).await.len(), 1);

        let next = reopened.create(43, "Bob").await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let dir = TempDir::new().unwrap();
        // A directory where the snapshot file should be makes the rename fail.
        let path = dir.path().join("members.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();

        let store = MemberStore {
            data: RwLock::new(MemberData::default()),
            storage_path: Some(path),
        };

        assert!(store.create(42, "Ada").await.is_err());
        assert!(store.find_by_telegram_id(42).await.is_none());
        assert_eq!(store.count().await, 0);
    }
}
