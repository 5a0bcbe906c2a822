//! Database operations for the scraped profile collections:
//! `business_services`, `business_contacts`, and `business_faqs`.
//!
//! Every write is a wholesale replacement for one business id. Collection
//! replacements run in a transaction so readers never observe a half-written
//! list.

use bizscrape_core::{ExtractedContact, ExtractedFaq, ExtractedService};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{position, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `business_services` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: i64,
    pub business_id: String,
    pub position: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A row from the `business_contacts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub business_id: String,
    pub phone: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `business_faqs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FaqRow {
    pub id: i64,
    pub business_id: String,
    pub position: i32,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Replaces the service list for `business_id` with `services`, in order.
///
/// An empty slice clears the list.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails; the transaction is rolled back
/// and the previous list is left in place.
pub async fn replace_services(
    pool: &PgPool,
    business_id: &str,
    services: &[ExtractedService],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM business_services WHERE business_id = $1")
        .bind(business_id)
        .execute(&mut *tx)
        .await?;

    for (index, service) in services.iter().enumerate() {
        sqlx::query(
            "INSERT INTO business_services (business_id, position, name) \
             VALUES ($1, $2, $3)",
        )
        .bind(business_id)
        .bind(position(index)?)
        .bind(&service.name)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(services.len())
}

/// Replaces the contact record for `business_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn replace_contact(
    pool: &PgPool,
    business_id: &str,
    contact: &ExtractedContact,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO business_contacts (business_id, phone, email) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (business_id) DO UPDATE SET \
           phone      = EXCLUDED.phone, \
           email      = EXCLUDED.email, \
           updated_at = NOW()",
    )
    .bind(business_id)
    .bind(&contact.phone)
    .bind(&contact.email)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replaces the FAQ list for `business_id` with `faqs`, in order.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails; the transaction is rolled back
/// and the previous list is left in place.
pub async fn replace_faqs(
    pool: &PgPool,
    business_id: &str,
    faqs: &[ExtractedFaq],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM business_faqs WHERE business_id = $1")
        .bind(business_id)
        .execute(&mut *tx)
        .await?;

    for (index, faq) in faqs.iter().enumerate() {
        sqlx::query(
            "INSERT INTO business_faqs (business_id, position, question, answer) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(business_id)
        .bind(position(index)?)
        .bind(&faq.question)
        .bind(&faq.answer)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(faqs.len())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns the stored services for `business_id`, in position order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_services(
    pool: &PgPool,
    business_id: &str,
) -> Result<Vec<ServiceRow>, DbError> {
    let rows = sqlx::query_as::<_, ServiceRow>(
        "SELECT id, business_id, position, name, created_at \
         FROM business_services \
         WHERE business_id = $1 \
         ORDER BY position",
    )
    .bind(business_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the stored contact for `business_id`, or `None` if never written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_contact(
    pool: &PgPool,
    business_id: &str,
) -> Result<Option<ContactRow>, DbError> {
    let row = sqlx::query_as::<_, ContactRow>(
        "SELECT business_id, phone, email, updated_at \
         FROM business_contacts \
         WHERE business_id = $1",
    )
    .bind(business_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the stored FAQs for `business_id`, in position order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_faqs(pool: &PgPool, business_id: &str) -> Result<Vec<FaqRow>, DbError> {
    let rows = sqlx::query_as::<_, FaqRow>(
        "SELECT id, business_id, position, question, answer, created_at \
         FROM business_faqs \
         WHERE business_id = $1 \
         ORDER BY position",
    )
    .bind(business_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
