use chrono::{DateTime, Utc};
use strum_macros::{Display, EnumString};

use super::{parse_variant, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ClientType {
    #[default]
    Individual,
    Corporate,
}

impl ClientType {
    pub fn label(&self) -> &'static str {
        match self {
            ClientType::Individual => "Individual",
            ClientType::Corporate => "Corporate",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ClientType::Individual => ClientType::Corporate,
            ClientType::Corporate => ClientType::Individual,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub client_type: ClientType,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Unsaved client; `id == 0` and an empty token until the store assigns them
    pub fn draft() -> Self {
        Self {
            id: 0,
            name: String::new(),
            client_type: ClientType::default(),
            email: None,
            phone: None,
            company: None,
            notes: None,
            tags: Vec::new(),
            share_token: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Comma separated tags, trimmed, empty entries dropped
    pub fn set_tags_from_str(&mut self, raw: &str) {
        self.tags = raw
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
    }

    pub fn tags_display(&self) -> String {
        self.tags.join(", ")
    }
}

/// Client as stored in the `clients` table
#[derive(sqlx::FromRow, Debug)]
pub struct ClientRow {
    pub id: i32,
    pub name: String,
    pub client_type: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
    type Error = ModelError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            client_type: parse_variant("client type", &row.client_type)?,
            email: row.email,
            phone: row.phone,
            company: row.company,
            notes: row.notes,
            tags: row.tags,
            share_token: row.share_token,
            created_at: row.created_at,
        })
    }
}
