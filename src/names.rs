pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const SESSION_COOKIE_NAME: &str = "vc_session";
pub const SESSION_MAX_AGE_SECONDS: i64 = 60 * 60 * 24 * 30;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_ADMIN: &str = "admin";

// Scores are percentages supplied by the client-side grader.
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;
pub const PASSING_SCORE: f64 = 90.0;

pub const DEFAULT_TRANSLATION: &str = "NIV";
pub const DEFAULT_DIFFICULTY: i64 = 1;

// Query limits
pub const DEFAULT_RECENT_ATTEMPTS: i64 = 10;
pub const MAX_RECENT_ATTEMPTS: i64 = 50;
pub const PROBLEM_WORD_LIMIT: i64 = 20;
pub const RECENT_ACTIVITY_LIMIT: i64 = 50;
pub const TIMELINE_DAYS: i64 = 30;

// Bounded retry for contended progress writes
pub const WRITE_RETRIES: u32 = 3;
pub const WRITE_RETRY_BACKOFF_MS: u64 = 25;
pub const BUSY_TIMEOUT_MS: u64 = 5000;
