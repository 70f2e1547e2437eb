// Database model structs

use serde::{Deserialize, Deserializer, Serialize};

use crate::names;

/// SQLite stores booleans as 0/1 integers; accept either when mapping rows.
fn int_bool<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    let v = i64::deserialize(de)?;
    Ok(v != 0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl AuthUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_teacher(&self) -> bool {
        self.role == names::ROLE_TEACHER || self.role == names::ROLE_ADMIN
    }

    pub fn is_admin(&self) -> bool {
        self.role == names::ROLE_ADMIN
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageModel {
    pub id: i64,
    pub reference: String,
    pub text: String,
    pub translation: String,
    pub book: Option<String>,
    pub chapter: Option<i64>,
    pub verse_start: Option<i64>,
    pub verse_end: Option<i64>,
    pub difficulty_level: i64,
    pub word_count: i64,
    #[serde(deserialize_with = "int_bool")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptModel {
    pub id: i64,
    pub passage_id: i64,
    pub reference: String,
    pub passage_text: String,
    pub recitation: String,
    pub score: f64,
    pub attempt_number: i64,
    #[serde(deserialize_with = "int_bool")]
    pub is_passing: bool,
    pub time_spent_seconds: Option<i64>,
    #[serde(deserialize_with = "int_bool")]
    pub used_speech_recognition: bool,
    pub created_at: String,
}

/// One student's running summary for one passage. Maintained incrementally
/// by `progress::fold`; never recomputed from attempt history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressModel {
    pub student_id: i64,
    pub passage_id: i64,
    pub total_attempts: i64,
    pub best_score: f64,
    pub latest_score: f64,
    pub average_score: f64,
    #[serde(deserialize_with = "int_bool")]
    pub is_memorized: bool,
    pub first_memorized_at: Option<String>,
    pub trend: String,
    pub last_attempt_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressWithPassage {
    pub student_id: i64,
    pub passage_id: i64,
    pub reference: String,
    pub passage_text: String,
    pub difficulty_level: i64,
    pub total_attempts: i64,
    pub best_score: f64,
    pub latest_score: f64,
    pub average_score: f64,
    #[serde(deserialize_with = "int_bool")]
    pub is_memorized: bool,
    pub first_memorized_at: Option<String>,
    pub trend: String,
    pub last_attempt_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentListItem {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAdminRow {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[serde(deserialize_with = "int_bool")]
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassModel {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub teacher_id: i64,
    pub student_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterStudent {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub joined_at: String,
}

/// Per-student rollup across a class; aggregates may be NULL for students
/// with no progress rows yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassProgressRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub verses_attempted: i64,
    pub verses_memorized: i64,
    pub average_best_score: Option<f64>,
    pub total_attempts: Option<i64>,
    pub last_activity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassOverviewStudent {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub verses_attempted: i64,
    pub verses_memorized: i64,
    pub average_best_score: Option<f64>,
    pub total_attempts: Option<i64>,
    pub last_activity: Option<String>,
    pub improving_count: i64,
    pub declining_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageDifficultyRow {
    pub reference: String,
    pub text: String,
    pub difficulty_level: i64,
    pub students_attempted: i64,
    pub average_score: Option<f64>,
    pub pass_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentActivityRow {
    pub first_name: String,
    pub last_name: String,
    pub reference: String,
    pub score: f64,
    #[serde(deserialize_with = "int_bool")]
    pub is_passing: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineRow {
    pub date: String,
    pub reference: String,
    pub attempts: i64,
    pub best_score: f64,
    pub average_score: f64,
}

/// How often each discrepancy kind shows up for a student, with a sample of
/// the words involved. `common_words` is NULL for extra words (no expected
/// word to collect).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub error_type: String,
    pub count: i64,
    pub common_words: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemWord {
    pub expected_word: String,
    pub error_count: i64,
    pub substitution_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub reference: String,
    pub recitation: String,
    pub score: f64,
    #[serde(deserialize_with = "int_bool")]
    pub is_passing: bool,
    pub attempt_number: i64,
    pub created_at: String,
    #[serde(deserialize_with = "int_bool")]
    pub used_speech_recognition: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}
