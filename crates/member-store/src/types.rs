//! Member store types.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Internal member id.
pub type MemberId = u64;

/// Login prefix for members created from Telegram.
pub const LOGIN_PREFIX: &str = "tgvipmem_";

/// Payload prefix encoded into member-card QR codes.
pub const MEMBER_CODE_PREFIX: &str = "tgvipmem_user_id:";

/// A registered member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Login name, `tgvipmem_<telegram id>`.
    pub login: String,
    pub telegram_id: i64,
    pub display_name: String,
    /// Current points balance.
    pub balance: i64,
    /// Excluded members cannot gain or lose points.
    #[serde(default)]
    pub excluded: bool,
    pub registered_at: DateTime<Utc>,
}

impl Member {
    pub fn new(id: MemberId, telegram_id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            login: login_for(telegram_id),
            telegram_id,
            display_name: display_name.into(),
            balance: 0,
            excluded: false,
            registered_at: Utc::now(),
        }
    }

    /// Code printed on this member's card.
    pub fn member_code(&self) -> MemberCode {
        MemberCode(self.telegram_id)
    }
}

/// Login name for a Telegram user.
pub fn login_for(telegram_id: i64) -> String {
    format!("{}{}", LOGIN_PREFIX, telegram_id)
}

/// One balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub member_id: MemberId,
    /// Signed change; negative for debits.
    pub delta: i64,
    /// Machine-readable reason, e.g. `admin_qr_adjustment`.
    pub reference: String,
    /// Human-readable log line.
    pub entry: String,
    /// Who made the change.
    pub actor: Option<String>,
    pub balance_after: i64,
    pub timestamp: DateTime<Utc>,
}

/// Description of a ledger operation, without the amount.
#[derive(Debug, Clone)]
pub struct LedgerMemo {
    pub reference: String,
    pub entry: String,
    pub actor: Option<String>,
}

impl LedgerMemo {
    pub fn new(reference: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            entry: entry.into(),
            actor: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// Identifier carried by a member card: `tgvipmem_user_id:<telegram id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberCode(pub i64);

impl MemberCode {
    pub fn telegram_id(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MemberCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", MEMBER_CODE_PREFIX, self.0)
    }
}

impl FromStr for MemberCode {
    type Err = StoreError;

    /// Accepts the full card payload or a bare Telegram id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(MEMBER_CODE_PREFIX).unwrap_or(trimmed);

        match digits.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(StoreError::InvalidMemberCode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_code_display() {
        assert_eq!(MemberCode(42).to_string(), "tgvipmem_user_id:42");
    }

    #[test]
    fn test_member_code_parse() {
        assert_eq!("tgvipmem_user_id:42".parse::<MemberCode>().unwrap(), MemberCode(42));
        assert_eq!(" 42 ".parse::<MemberCode>().unwrap(), MemberCode(42));
        assert!("tgvipmem_user_id:".parse::<MemberCode>().is_err());
        assert!("tgvipmem_user_id:-5".parse::<MemberCode>().is_err());
        assert!("0".parse::<MemberCode>().is_err());
        assert!("someone_else:42".parse::<MemberCode>().is_err());
    }

    #[test]
    fn test_new_member() {
        let member = Member::new(1, 42, "Ada");
        assert_eq!(member.login, "tgvipmem_42");
        assert_eq!(member.balance, 0);
        assert!(!member.excluded);
        assert_eq!(member.member_code(), MemberCode(42));
    }
}
