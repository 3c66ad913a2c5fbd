//! Identity and balance lookups used by command handlers.

use async_trait::async_trait;
use member_store::{Member, MemberStore, StoreError};

/// Member identities keyed by Telegram user id, plus balance reads.
///
/// Implementations must guarantee at most one member per Telegram id, even
/// under concurrent `create_member` calls.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn find_member(&self, telegram_id: i64) -> Result<Option<Member>, StoreError>;

    async fn create_member(
        &self,
        telegram_id: i64,
        display_name: &str,
    ) -> Result<Member, StoreError>;

    async fn balance(&self, member: &Member) -> Result<i64, StoreError>;
}

#[async_trait]
impl MemberDirectory for MemberStore {
    async fn find_member(&self, telegram_id: i64) -> Result<Option<Member>, StoreError> {
        Ok(self.find_by_telegram_id(telegram_id).await)
    }

    async fn create_member(
        &self,
        telegram_id: i64,
        display_name: &str,
    ) -> Result<Member, StoreError> {
        self.create(telegram_id, display_name).await
    }

    async fn balance(&self, member: &Member) -> Result<i64, StoreError> {
        MemberStore::balance(self, member.id).await
    }
}
