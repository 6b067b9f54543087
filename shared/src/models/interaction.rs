//! Product Interaction Model (append-only telemetry)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Interaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "interaction_kind", rename_all = "lowercase")
)]
pub enum InteractionKind {
    View,
    Favorite,
    Nutrition,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 3] = [Self::View, Self::Favorite, Self::Nutrition];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Favorite => "favorite",
            Self::Nutrition => "nutrition",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "favorite" => Ok(Self::Favorite),
            "nutrition" => Ok(Self::Nutrition),
            other => Err(format!("unknown interaction type '{other}'")),
        }
    }
}

/// Interaction log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductInteraction {
    pub id: i64,
    pub product_id: Uuid,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Record interaction payload
///
/// `type` stays a raw string so an unknown value is rejected with
/// `InteractionTypeInvalid` instead of a body deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionInput {
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Interaction count for one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionStat {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub count: i64,
}
