//! Attempt recording. One submission turns into an attempt row, its
//! discrepancy rows and an updated progress summary, written atomically
//! inside a single `BEGIN IMMEDIATE` transaction so two submissions for the
//! same (student, passage) pair can never interleave.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use color_eyre::Result;
use libsql::{params, TransactionBehavior};
use thiserror::Error;

use super::helpers::query_all;
use super::models::{AttemptModel, ProgressModel};
use super::Db;
use crate::names;
use crate::progress;
use crate::scoring::{self, Discrepancy};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("score {0} is outside the 0-100 range")]
    InvalidScore(f64),
    #[error("passage {0} does not exist")]
    PassageNotFound(i64),
    #[error("passage {0} is no longer active")]
    PassageInactive(i64),
    #[error("progress write for student {student_id} on passage {passage_id} kept conflicting")]
    Conflict { student_id: i64, passage_id: i64 },
    #[error("storage failure: {0}")]
    Storage(#[from] libsql::Error),
}

/// Client-reported details about how the attempt was made.
#[derive(Debug, Default, Clone)]
pub struct AttemptMeta {
    pub time_spent_seconds: Option<i64>,
    pub used_speech_recognition: bool,
}

struct PendingAttempt<'a> {
    student_id: i64,
    passage_id: i64,
    recitation: &'a str,
    score: f64,
    is_passing: bool,
    now: &'a str,
    meta: &'a AttemptMeta,
    discrepancies: &'a [Discrepancy],
}

impl Db {
    /// Record one graded attempt. When `reference_text` is supplied the
    /// recitation is compared against it and the resulting discrepancies are
    /// persisted alongside the attempt. Returns the attempt id and the
    /// progress summary as of this attempt.
    pub async fn record_attempt(
        &self,
        student_id: i64,
        passage_id: i64,
        recitation: &str,
        score: f64,
        reference_text: Option<&str>,
        meta: &AttemptMeta,
    ) -> Result<(i64, ProgressModel), RecordError> {
        if !(names::MIN_SCORE..=names::MAX_SCORE).contains(&score) {
            return Err(RecordError::InvalidScore(score));
        }

        let conn = self.db.connect()?;

        // busy_timeout is per-connection. Remote servers may refuse the
        // pragma, in which case the retry loop below still covers us.
        let _ = conn
            .query(
                &format!("PRAGMA busy_timeout = {}", names::BUSY_TIMEOUT_MS),
                (),
            )
            .await;

        let active = match conn
            .query(
                "SELECT is_active FROM passages WHERE id = ?",
                params![passage_id],
            )
            .await?
            .next()
            .await?
        {
            None => return Err(RecordError::PassageNotFound(passage_id)),
            Some(row) => row.get::<bool>(0)?,
        };
        if !active {
            return Err(RecordError::PassageInactive(passage_id));
        }

        // Pure computation happens before the transaction; only row writes
        // and the progress fold run under the lock.
        let discrepancies = reference_text
            .map(|reference| scoring::compare(recitation, reference))
            .unwrap_or_default();
        let is_passing = score >= names::PASSING_SCORE;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let pending = PendingAttempt {
            student_id,
            passage_id,
            recitation,
            score,
            is_passing,
            now: &now,
            meta,
            discrepancies: &discrepancies,
        };

        let mut tries = 0;
        loop {
            tries += 1;
            match run_attempt_tx(&conn, &pending).await {
                Ok((attempt_id, summary)) => {
                    tracing::info!(
                        "attempt recorded: student={student_id}, passage={passage_id}, \
                         score={score}, attempt_number={}",
                        summary.total_attempts
                    );
                    return Ok((attempt_id, summary));
                }
                Err(e) if is_busy(&e) && tries < names::WRITE_RETRIES => {
                    tracing::debug!("attempt write contended (try {tries}), backing off: {e}");
                    tokio::time::sleep(Duration::from_millis(
                        names::WRITE_RETRY_BACKOFF_MS * u64::from(tries),
                    ))
                    .await;
                }
                Err(e) if is_busy(&e) => {
                    tracing::warn!(
                        "attempt write for student={student_id}, passage={passage_id} \
                         gave up after {tries} tries: {e}"
                    );
                    return Err(RecordError::Conflict {
                        student_id,
                        passage_id,
                    });
                }
                Err(e) => return Err(RecordError::Storage(e)),
            }
        }
    }

    pub async fn recent_attempts(&self, student_id: i64, limit: i64) -> Result<Vec<AttemptModel>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT a.id, a.passage_id, p.reference, p.text AS passage_text, a.recitation,
                   a.score, a.attempt_number, a.is_passing, a.time_spent_seconds,
                   a.used_speech_recognition, a.created_at
            FROM attempts a
            JOIN passages p ON a.passage_id = p.id
            WHERE a.student_id = ?
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT ?
            "#,
            params![student_id, limit],
        )
        .await
    }

    pub async fn attempts_for_passage(
        &self,
        student_id: i64,
        passage_id: i64,
    ) -> Result<Vec<AttemptModel>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT a.id, a.passage_id, p.reference, p.text AS passage_text, a.recitation,
                   a.score, a.attempt_number, a.is_passing, a.time_spent_seconds,
                   a.used_speech_recognition, a.created_at
            FROM attempts a
            JOIN passages p ON a.passage_id = p.id
            WHERE a.student_id = ? AND a.passage_id = ?
            ORDER BY a.created_at DESC, a.id DESC
            "#,
            params![student_id, passage_id],
        )
        .await
    }
}

/// The transactional body of [`Db::record_attempt`]. Reads the previous
/// summary, numbers the attempt from it, inserts attempt + discrepancies and
/// writes the folded summary back, all under one IMMEDIATE transaction.
async fn run_attempt_tx(
    conn: &libsql::Connection,
    pending: &PendingAttempt<'_>,
) -> Result<(i64, ProgressModel), libsql::Error> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .await?;

    let previous = match tx
        .query(
            r#"
            SELECT total_attempts, best_score, latest_score, average_score,
                   is_memorized, first_memorized_at, trend, last_attempt_at
            FROM progress
            WHERE student_id = ? AND passage_id = ?
            "#,
            params![pending.student_id, pending.passage_id],
        )
        .await?
        .next()
        .await?
    {
        Some(row) => Some(ProgressModel {
            student_id: pending.student_id,
            passage_id: pending.passage_id,
            total_attempts: row.get::<i64>(0)?,
            best_score: row.get::<f64>(1)?,
            latest_score: row.get::<f64>(2)?,
            average_score: row.get::<f64>(3)?,
            is_memorized: row.get::<bool>(4)?,
            first_memorized_at: row.get::<Option<String>>(5)?,
            trend: row.get::<String>(6)?,
            last_attempt_at: row.get::<String>(7)?,
        }),
        None => None,
    };

    let summary = progress::fold(
        previous.as_ref(),
        pending.student_id,
        pending.passage_id,
        pending.score,
        pending.is_passing,
        pending.now,
    );

    // The attempt number doubles as the post-insert attempt count; the
    // unique (student_id, passage_id) summary row keeps it gapless.
    let attempt_id = tx
        .query(
            r#"INSERT INTO attempts
                   (student_id, passage_id, recitation, score, attempt_number, is_passing,
                    time_spent_seconds, used_speech_recognition, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING id"#,
            params![
                pending.student_id,
                pending.passage_id,
                pending.recitation,
                pending.score,
                summary.total_attempts,
                pending.is_passing as i64,
                pending.meta.time_spent_seconds,
                pending.meta.used_speech_recognition as i64,
                pending.now
            ],
        )
        .await?
        .next()
        .await?
        .ok_or(libsql::Error::QueryReturnedNoRows)?
        .get::<i64>(0)?;

    for d in pending.discrepancies {
        tx.execute(
            r#"INSERT INTO discrepancies
                   (attempt_id, kind, position, expected_word, actual_word,
                    context_before, context_after)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                attempt_id,
                d.kind.as_str(),
                d.position as i64,
                d.expected.as_deref(),
                d.actual.as_deref(),
                d.context_before.as_str(),
                d.context_after.as_str()
            ],
        )
        .await?;
    }

    if previous.is_some() {
        tx.execute(
            r#"UPDATE progress
               SET total_attempts = ?, best_score = ?, latest_score = ?, average_score = ?,
                   is_memorized = ?, first_memorized_at = ?, trend = ?, last_attempt_at = ?
               WHERE student_id = ? AND passage_id = ?"#,
            params![
                summary.total_attempts,
                summary.best_score,
                summary.latest_score,
                summary.average_score,
                summary.is_memorized as i64,
                summary.first_memorized_at.as_deref(),
                summary.trend.as_str(),
                summary.last_attempt_at.as_str(),
                pending.student_id,
                pending.passage_id
            ],
        )
        .await?;
    } else {
        tx.execute(
            r#"INSERT INTO progress
                   (student_id, passage_id, total_attempts, best_score, latest_score,
                    average_score, is_memorized, first_memorized_at, trend, last_attempt_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                pending.student_id,
                pending.passage_id,
                summary.total_attempts,
                summary.best_score,
                summary.latest_score,
                summary.average_score,
                summary.is_memorized as i64,
                summary.first_memorized_at.as_deref(),
                summary.trend.as_str(),
                summary.last_attempt_at.as_str()
            ],
        )
        .await?;
    }

    tx.commit().await?;
    Ok((attempt_id, summary))
}

/// SQLITE_BUSY / SQLITE_LOCKED, including their extended codes.
fn is_busy(err: &libsql::Error) -> bool {
    matches!(err, libsql::Error::SqliteFailure(code, _) if code % 256 == 5 || code % 256 == 6)
}
