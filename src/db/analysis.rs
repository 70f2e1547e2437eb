use color_eyre::Result;
use libsql::params;

use super::helpers::query_all;
use super::models::{ErrorPattern, ProblemWord};
use super::Db;
use crate::names;

impl Db {
    /// How a student's recitation errors break down by kind, with the
    /// distinct expected words involved in each kind.
    pub async fn error_patterns(&self, student_id: i64) -> Result<Vec<ErrorPattern>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT d.kind AS error_type,
                   COUNT(*) AS count,
                   GROUP_CONCAT(DISTINCT d.expected_word) AS common_words
            FROM discrepancies d
            JOIN attempts a ON d.attempt_id = a.id
            WHERE a.student_id = ?
            GROUP BY d.kind
            ORDER BY count DESC
            "#,
            params![student_id],
        )
        .await
    }

    /// Reference words a student has stumbled over more than once. The
    /// substitution rate is the share of those errors where some other word
    /// was said rather than the word being skipped.
    pub async fn problem_words(&self, student_id: i64) -> Result<Vec<ProblemWord>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT d.expected_word,
                   COUNT(*) AS error_count,
                   AVG(CASE WHEN d.actual_word IS NOT NULL THEN 1.0 ELSE 0.0 END)
                       AS substitution_rate
            FROM discrepancies d
            JOIN attempts a ON d.attempt_id = a.id
            WHERE a.student_id = ? AND d.expected_word IS NOT NULL
            GROUP BY d.expected_word
            HAVING error_count > 1
            ORDER BY error_count DESC
            LIMIT ?
            "#,
            params![student_id, names::PROBLEM_WORD_LIMIT],
        )
        .await
    }
}
