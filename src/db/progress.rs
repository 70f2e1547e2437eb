use color_eyre::Result;
use libsql::params;

use super::helpers::{query_all, query_optional};
use super::models::{ProgressModel, ProgressWithPassage};
use super::Db;

impl Db {
    /// All of a student's per-passage summaries, without passage details.
    /// This is the input shape `progress::summarize` expects.
    pub async fn progress_rows(&self, student_id: i64) -> Result<Vec<ProgressModel>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT student_id, passage_id, total_attempts, best_score, latest_score,
                   average_score, is_memorized, first_memorized_at, trend, last_attempt_at
            FROM progress
            WHERE student_id = ?
            "#,
            params![student_id],
        )
        .await
    }

    /// A student's summaries joined with the passages they belong to, most
    /// recently practiced first. Optionally narrowed to a single passage.
    pub async fn progress_for_student(
        &self,
        student_id: i64,
        passage_id: Option<i64>,
    ) -> Result<Vec<ProgressWithPassage>> {
        let conn = self.db.connect()?;
        match passage_id {
            Some(passage_id) => {
                query_all(
                    &conn,
                    r#"
                    SELECT pr.student_id, pr.passage_id, p.reference, p.text AS passage_text,
                           p.difficulty_level, pr.total_attempts, pr.best_score,
                           pr.latest_score, pr.average_score, pr.is_memorized,
                           pr.first_memorized_at, pr.trend, pr.last_attempt_at
                    FROM progress pr
                    JOIN passages p ON pr.passage_id = p.id
                    WHERE pr.student_id = ? AND pr.passage_id = ?
                    ORDER BY pr.last_attempt_at DESC, pr.id DESC
                    "#,
                    params![student_id, passage_id],
                )
                .await
            }
            None => {
                query_all(
                    &conn,
                    r#"
                    SELECT pr.student_id, pr.passage_id, p.reference, p.text AS passage_text,
                           p.difficulty_level, pr.total_attempts, pr.best_score,
                           pr.latest_score, pr.average_score, pr.is_memorized,
                           pr.first_memorized_at, pr.trend, pr.last_attempt_at
                    FROM progress pr
                    JOIN passages p ON pr.passage_id = p.id
                    WHERE pr.student_id = ?
                    ORDER BY pr.last_attempt_at DESC, pr.id DESC
                    "#,
                    params![student_id],
                )
                .await
            }
        }
    }

    /// The summary for one (student, passage) pair, if any attempts exist.
    pub async fn get_progress(
        &self,
        student_id: i64,
        passage_id: i64,
    ) -> Result<Option<ProgressModel>> {
        let conn = self.db.connect()?;
        query_optional(
            &conn,
            r#"
            SELECT student_id, passage_id, total_attempts, best_score, latest_score,
                   average_score, is_memorized, first_memorized_at, trend, last_attempt_at
            FROM progress
            WHERE student_id = ? AND passage_id = ?
            "#,
            params![student_id, passage_id],
        )
        .await
    }
}
