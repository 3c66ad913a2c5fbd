//! API request and response types.

use member_store::Member;
use serde::{Deserialize, Deserializer, Serialize};

/// Body returned to Telegram by the webhook.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub members: usize,
    pub telegram_configured: bool,
}

/// Points adjustment submitted after scanning a member card.
///
/// Fields are optional so that missing values get the same validation
/// messages as malformed ones.
#[derive(Debug, Default, Deserialize)]
pub struct AdjustPointsRequest {
    /// Scanned member code (`tgvipmem_user_id:<id>`) or bare Telegram id
    #[serde(default)]
    pub member: Option<String>,

    /// Points to move, as a number or numeric string; the sign is ignored
    #[serde(default, deserialize_with = "lenient_points")]
    pub points: Option<i64>,

    /// "add" or "deduct"
    #[serde(default)]
    pub operation: Option<String>,
}

/// Accept `10`, `"10"` or `10.0`. Anything else becomes `None` so the
/// handler reports it with the points validation message.
fn lenient_points<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

#[derive(Debug, Serialize)]
pub struct AdjustPointsResponse {
    pub message: String,
    pub balance: i64,
}

/// Toggle a member's exclusion from the points ledger.
#[derive(Debug, Deserialize)]
pub struct ExclusionRequest {
    pub excluded: bool,
}

/// Member summary for the admin API.
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: u64,
    pub login: String,
    pub telegram_id: i64,
    pub display_name: String,
    pub balance: i64,
    pub excluded: bool,
    pub registered_at: String,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            login: member.login,
            telegram_id: member.telegram_id,
            display_name: member.display_name,
            balance: member.balance,
            excluded: member.excluded,
            registered_at: member.registered_at.to_rfc3339(),
        }
    }
}

/// Direction of a points adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsOperation {
    Add,
    Deduct,
}

impl PointsOperation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Self::Add),
            "deduct" => Some(Self::Deduct),
            _ => None,
        }
    }

    /// Past tense used in confirmation messages.
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Add => "added",
            Self::Deduct => "deducted",
        }
    }
}
