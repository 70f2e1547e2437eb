use serde::Deserialize;

// The practice frontend submits camelCase keys; the rest of the API speaks
// snake_case.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRecitation {
    pub passage_id: i64,
    pub recitation: String,
    pub score: f64,
    /// When present, the recitation is compared against this text and the
    /// differences are stored with the attempt.
    pub reference_text: Option<String>,
    pub time_spent_seconds: Option<i64>,
    #[serde(default)]
    pub used_speech_recognition: bool,
}

#[derive(Deserialize)]
pub struct Register {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreatePassage {
    pub reference: String,
    pub text: String,
    pub translation: Option<String>,
    pub difficulty_level: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdatePassage {
    pub text: Option<String>,
    pub translation: Option<String>,
    pub difficulty_level: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateClass {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddStudent {
    pub student_id: i64,
}

#[derive(Deserialize)]
pub struct RecentAttemptsQuery {
    pub limit: Option<i64>,
}
