//! Atomic per-day document number allocation
//!
//! Transfer, dispatch and receiving numbers are date-prefixed sequences
//! (e.g. `TR-20250114-0007`). Allocation goes through an upsert on the
//! `document_sequences` counter table so that concurrent creations on the
//! same day cannot observe the same value: the conflicting update serializes
//! on the (doc_type, seq_date) row.

use chrono::Utc;
use sqlx::{Postgres, Transaction};

use crate::error::AppResult;
use shared::models::DocumentKind;

pub struct SequenceService;

impl SequenceService {
    /// Allocate the next number for a document family inside the caller's
    /// transaction. The allocation is rolled back with the enclosing
    /// operation, so aborted operations may leave gaps but never duplicates.
    pub async fn next_number_in(
        tx: &mut Transaction<'_, Postgres>,
        kind: DocumentKind,
    ) -> AppResult<String> {
        let today = Utc::now().date_naive();

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO document_sequences (doc_type, seq_date, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (doc_type, seq_date)
            DO UPDATE SET last_value = document_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(kind.prefix())
        .bind(today)
        .fetch_one(&mut **tx)
        .await?;

        Ok(kind.format_number(today, sequence))
    }
}
