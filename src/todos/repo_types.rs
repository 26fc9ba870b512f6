use std::fmt;

use serde::Serialize;
use sqlx::FromRow;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Row as stored; `created_at` is RFC 3339 text on every backend.
#[derive(Debug, FromRow)]
pub struct TodoRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: String,
}

/// Todo record handed to handlers and templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<TodoRow> for Todo {
    type Error = anyhow::Error;

    fn try_from(r: TodoRow) -> Result<Self, Self::Error> {
        let created_at = OffsetDateTime::parse(&r.created_at, &Rfc3339)
            .map_err(|e| anyhow::anyhow!("todo {}: bad created_at {:?}: {}", r.id, r.created_at, e))?;
        Ok(Self {
            id: r.id,
            title: r.title,
            description: r.description,
            created_at,
        })
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.title)
    }
}
