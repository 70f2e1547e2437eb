use color_eyre::{eyre::OptionExt, Result};
use libsql::params;

use super::helpers::{query_all, query_flag, query_optional};
use super::models::{
    ClassModel, ClassOverviewStudent, ClassProgressRow, ExportRow, PassageDifficultyRow,
    RecentActivityRow, RosterStudent, StudentListItem, TimelineRow,
};
use super::Db;
use crate::names;

impl Db {
    pub async fn create_class(
        &self,
        name: &str,
        description: Option<&str>,
        teacher_id: i64,
    ) -> Result<i64> {
        let conn = self.db.connect()?;
        let class_id = conn
            .query(
                r#"INSERT INTO classes (name, description, teacher_id)
                   VALUES (?, ?, ?) RETURNING id"#,
                params![name, description, teacher_id],
            )
            .await?
            .next()
            .await?
            .ok_or_eyre("could not get class id")?
            .get::<i64>(0)?;

        tracing::info!("new class created: id={class_id}, teacher={teacher_id}");
        Ok(class_id)
    }

    pub async fn classes_for_teacher(&self, teacher_id: i64) -> Result<Vec<ClassModel>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT c.id, c.name, c.description, c.teacher_id,
                   COUNT(cm.student_id) AS student_count
            FROM classes c
            LEFT JOIN class_members cm ON c.id = cm.class_id AND cm.is_active = 1
            WHERE c.teacher_id = ? AND c.is_active = 1
            GROUP BY c.id
            ORDER BY c.name
            "#,
            params![teacher_id],
        )
        .await
    }

    pub async fn class_owned_by(&self, class_id: i64, teacher_id: i64) -> Result<bool> {
        let conn = self.db.connect()?;
        query_flag(
            &conn,
            "SELECT 1 FROM classes WHERE id = ? AND teacher_id = ? AND is_active = 1",
            params![class_id, teacher_id],
        )
        .await
    }

    /// A teacher's class by id, or `None` when it does not exist or belongs
    /// to somebody else.
    pub async fn find_class(
        &self,
        class_id: i64,
        teacher_id: i64,
    ) -> Result<Option<ClassModel>> {
        let conn = self.db.connect()?;
        query_optional(
            &conn,
            r#"
            SELECT c.id, c.name, c.description, c.teacher_id,
                   COUNT(cm.student_id) AS student_count
            FROM classes c
            LEFT JOIN class_members cm ON c.id = cm.class_id AND cm.is_active = 1
            WHERE c.id = ? AND c.teacher_id = ? AND c.is_active = 1
            GROUP BY c.id
            "#,
            params![class_id, teacher_id],
        )
        .await
    }

    pub async fn is_class_member(&self, class_id: i64, student_id: i64) -> Result<bool> {
        let conn = self.db.connect()?;
        query_flag(
            &conn,
            r#"SELECT 1 FROM class_members
               WHERE class_id = ? AND student_id = ? AND is_active = 1"#,
            params![class_id, student_id],
        )
        .await
    }

    /// Whether a teacher teaches any active class the student belongs to.
    pub async fn teacher_can_access_student(
        &self,
        teacher_id: i64,
        student_id: i64,
    ) -> Result<bool> {
        let conn = self.db.connect()?;
        query_flag(
            &conn,
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM class_members cm
                JOIN classes c ON cm.class_id = c.id
                WHERE cm.student_id = ? AND c.teacher_id = ?
                  AND cm.is_active = 1 AND c.is_active = 1
            )
            "#,
            params![student_id, teacher_id],
        )
        .await
    }

    pub async fn class_roster(&self, class_id: i64) -> Result<Vec<RosterStudent>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, cm.joined_at
            FROM users u
            JOIN class_members cm ON u.id = cm.student_id
            WHERE cm.class_id = ? AND cm.is_active = 1 AND u.is_active = 1
            ORDER BY u.last_name, u.first_name
            "#,
            params![class_id],
        )
        .await
    }

    /// Active students not yet enrolled in the given class.
    pub async fn available_students(&self, class_id: i64) -> Result<Vec<StudentListItem>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.created_at
            FROM users u
            WHERE u.role = ? AND u.is_active = 1
              AND u.id NOT IN (
                  SELECT cm.student_id FROM class_members cm
                  WHERE cm.class_id = ? AND cm.is_active = 1
              )
            ORDER BY u.last_name, u.first_name
            "#,
            params![names::ROLE_STUDENT, class_id],
        )
        .await
    }

    /// Enroll a student. Re-enrolling a previously removed student reactivates
    /// the old membership instead of creating a duplicate.
    pub async fn add_student_to_class(&self, class_id: i64, student_id: i64) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute(
            r#"INSERT INTO class_members (class_id, student_id)
               VALUES (?, ?)
               ON CONFLICT(class_id, student_id)
               DO UPDATE SET is_active = 1, joined_at = datetime('now')"#,
            params![class_id, student_id],
        )
        .await?;

        tracing::info!("student {student_id} added to class {class_id}");
        Ok(())
    }

    /// Drop a student from a class. Membership is deactivated, not deleted,
    /// so their attempt history stays attributable.
    pub async fn remove_student_from_class(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> Result<bool> {
        let conn = self.db.connect()?;
        let affected = conn
            .execute(
                r#"UPDATE class_members SET is_active = 0
                   WHERE class_id = ? AND student_id = ?"#,
                params![class_id, student_id],
            )
            .await?;

        if affected > 0 {
            tracing::info!("student {student_id} removed from class {class_id}");
        }
        Ok(affected > 0)
    }

    pub async fn class_progress(&self, class_id: i64) -> Result<Vec<ClassProgressRow>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT u.id, u.first_name, u.last_name,
                   COUNT(DISTINCT pr.passage_id) AS verses_attempted,
                   COUNT(CASE WHEN pr.is_memorized = 1 THEN 1 END) AS verses_memorized,
                   AVG(pr.best_score) AS average_best_score,
                   SUM(pr.total_attempts) AS total_attempts,
                   MAX(pr.last_attempt_at) AS last_activity
            FROM users u
            JOIN class_members cm ON u.id = cm.student_id
            LEFT JOIN progress pr ON u.id = pr.student_id
            WHERE cm.class_id = ? AND cm.is_active = 1 AND u.is_active = 1
            GROUP BY u.id
            ORDER BY u.last_name, u.first_name
            "#,
            params![class_id],
        )
        .await
    }

    /// `class_progress` plus per-student trend counts, for the teacher's
    /// class overview report.
    pub async fn class_overview_students(
        &self,
        class_id: i64,
    ) -> Result<Vec<ClassOverviewStudent>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT u.id, u.first_name, u.last_name,
                   COUNT(DISTINCT pr.passage_id) AS verses_attempted,
                   COUNT(CASE WHEN pr.is_memorized = 1 THEN 1 END) AS verses_memorized,
                   AVG(pr.best_score) AS average_best_score,
                   SUM(pr.total_attempts) AS total_attempts,
                   MAX(pr.last_attempt_at) AS last_activity,
                   COUNT(CASE WHEN pr.trend = 'improving' THEN 1 END) AS improving_count,
                   COUNT(CASE WHEN pr.trend = 'declining' THEN 1 END) AS declining_count
            FROM users u
            JOIN class_members cm ON u.id = cm.student_id
            LEFT JOIN progress pr ON u.id = pr.student_id
            WHERE cm.class_id = ? AND cm.is_active = 1 AND u.is_active = 1
            GROUP BY u.id
            ORDER BY u.last_name, u.first_name
            "#,
            params![class_id],
        )
        .await
    }

    /// Which passages a class finds hard, hardest first. Only passages
    /// somebody in the class has attempted show up.
    pub async fn passage_difficulty(&self, class_id: i64) -> Result<Vec<PassageDifficultyRow>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT p.reference, p.text, p.difficulty_level,
                   COUNT(DISTINCT a.student_id) AS students_attempted,
                   AVG(a.score) AS average_score,
                   COUNT(CASE WHEN a.is_passing = 1 THEN 1 END) * 100.0 / COUNT(*) AS pass_rate
            FROM passages p
            LEFT JOIN attempts a ON p.id = a.passage_id
            LEFT JOIN class_members cm ON a.student_id = cm.student_id
            WHERE cm.class_id = ? AND cm.is_active = 1
            GROUP BY p.id
            HAVING students_attempted > 0
            ORDER BY average_score ASC
            "#,
            params![class_id],
        )
        .await
    }

    pub async fn recent_activity(&self, class_id: i64) -> Result<Vec<RecentActivityRow>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT u.first_name, u.last_name, p.reference, a.score, a.is_passing, a.created_at
            FROM attempts a
            JOIN users u ON a.student_id = u.id
            JOIN passages p ON a.passage_id = p.id
            JOIN class_members cm ON u.id = cm.student_id
            WHERE cm.class_id = ? AND cm.is_active = 1
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT ?
            "#,
            params![class_id, names::RECENT_ACTIVITY_LIMIT],
        )
        .await
    }

    /// Day-by-day practice history for one student, newest first.
    pub async fn student_timeline(&self, student_id: i64) -> Result<Vec<TimelineRow>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT DATE(a.created_at) AS date, p.reference,
                   COUNT(*) AS attempts,
                   MAX(a.score) AS best_score,
                   AVG(a.score) AS average_score
            FROM attempts a
            JOIN passages p ON a.passage_id = p.id
            WHERE a.student_id = ?
            GROUP BY DATE(a.created_at), p.id
            ORDER BY date DESC
            LIMIT ?
            "#,
            params![student_id, names::TIMELINE_DAYS],
        )
        .await
    }

    /// Every attempt made by the class's students, flattened for CSV export.
    pub async fn export_rows(&self, class_id: i64) -> Result<Vec<ExportRow>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"
            SELECT u.first_name, u.last_name, u.email,
                   p.reference, a.recitation, a.score, a.is_passing,
                   a.attempt_number, a.created_at, a.used_speech_recognition
            FROM attempts a
            JOIN users u ON a.student_id = u.id
            JOIN passages p ON a.passage_id = p.id
            JOIN class_members cm ON u.id = cm.student_id
            WHERE cm.class_id = ? AND cm.is_active = 1
            ORDER BY u.last_name, u.first_name, a.created_at
            "#,
            params![class_id],
        )
        .await
    }
}
