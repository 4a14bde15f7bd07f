// Postgres persistence for events and templates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{ArchiveError, Result};
use crate::traits::EventStore;
use crate::types::{Event, EventStatus, Template};

pub struct PgEventStore {
    pool: PgPool,
}

/// A row from `events` joined with its template.
#[derive(Debug, Clone, sqlx::FromRow)]
struct EventRow {
    id: i64,
    title: String,
    status: String,
    archive_time: Option<DateTime<Utc>>,
    template_id: Option<i64>,
    template_name: Option<String>,
    template_environment: serde_json::Value,
}

impl TryFrom<EventRow> for Event {
    type Error = ArchiveError;

    fn try_from(row: EventRow) -> Result<Self> {
        let status = row
            .status
            .parse::<EventStatus>()
            .map_err(|e| ArchiveError::Other(anyhow::anyhow!("event {}: {e}", row.id)))?;
        let template = match (row.template_id, row.template_name) {
            (Some(id), Some(name)) => Some(Template { id, name }),
            _ => None,
        };
        let template_environment = match row.template_environment {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        Ok(Event {
            id: row.id,
            title: row.title,
            status,
            archive_time: row.archive_time,
            template,
            template_environment,
        })
    }
}

const EVENT_COLUMNS: &str = r#"
    e.id, e.title, e.status, e.archive_time,
    t.id AS template_id, t.name AS template_name,
    e.template_environment
"#;

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ArchiveError::Database(e.into()))?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn event(&self, id: i64) -> Result<Option<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events e \
             LEFT JOIN templates t ON t.id = e.template_id \
             WHERE e.id = $1"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Event::try_from).transpose()
    }

    async fn pending_archive_candidates(&self, provider_marker: &str) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events e \
             JOIN templates t ON t.id = e.template_id \
             WHERE e.status = $1 \
               AND e.archive_time IS NULL \
               AND strpos(t.name, $2) > 0 \
             ORDER BY e.id"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(EventStatus::Pending.as_str())
            .bind(provider_marker)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn save_archive_state(&self, event: &Event) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET status = $2, archive_time = $3
            WHERE id = $1
            "#,
        )
        .bind(event.id)
        .bind(event.status.as_str())
        .bind(event.archive_time)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ArchiveError::EventNotFound(event.id));
        }
        Ok(())
    }
}
