//! Database operations for the `businesses` table.

use bizscrape_core::BusinessRecord;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `businesses` table.
///
/// `name` and `url` are nullable because the scraper only ever writes a stub
/// keyed by `business_id`; the rest is owned by business management.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessRow {
    pub business_id: String,
    pub name: Option<String>,
    pub url: Option<String>,
    pub about: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessRow {
    /// Converts to a [`BusinessRecord`] when the row has a usable URL.
    ///
    /// Returns `None` for stub rows that were never given a target URL. A
    /// missing display name falls back to the business id.
    #[must_use]
    pub fn into_record(self) -> Option<BusinessRecord> {
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.business_id.clone());
        Some(BusinessRecord {
            business_id: self.business_id,
            name,
            url,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns a single business by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_business(
    pool: &PgPool,
    business_id: &str,
) -> Result<Option<BusinessRow>, DbError> {
    let row = sqlx::query_as::<_, BusinessRow>(
        "SELECT business_id, name, url, about, created_at, updated_at \
         FROM businesses \
         WHERE business_id = $1",
    )
    .bind(business_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Ensures a `businesses` row exists for `business_id`.
///
/// Never touches `name` or `url`. `about` is only written when `Some`, so a
/// run that found no about text keeps the previously stored value.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_business_stub(
    pool: &PgPool,
    business_id: &str,
    about: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO businesses (business_id, about) \
         VALUES ($1, $2) \
         ON CONFLICT (business_id) DO UPDATE SET \
           about      = COALESCE(EXCLUDED.about, businesses.about), \
           updated_at = NOW()",
    )
    .bind(business_id)
    .bind(about)
    .execute(pool)
    .await?;
    Ok(())
}
