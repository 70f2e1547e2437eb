mod common;

use std::collections::HashSet;

use common::{create_test_db, seed_passage, seed_student, seed_teacher};
use versecraft::db::{AttemptMeta, Db, RecordError};
use versecraft::{names, progress};

const JOHN_3_16: &str = "For God so loved the world";

async fn seed_attempt(db: &Db, student_id: i64, passage_id: i64, score: f64) {
    db.record_attempt(
        student_id,
        passage_id,
        JOHN_3_16,
        score,
        None,
        &AttemptMeta::default(),
    )
    .await
    .expect("failed to record attempt");
}

#[tokio::test]
async fn test_db_connection() {
    let db = create_test_db().await;
    let passages = db.list_passages(true).await.unwrap();
    assert!(passages.is_empty());
}

#[tokio::test]
async fn test_user_and_session_lifecycle() {
    let db = create_test_db().await;

    let user_id = db
        .create_user(
            "amy@example.com",
            "hunter22",
            "Amy",
            "Pond",
            names::ROLE_STUDENT,
        )
        .await
        .unwrap();

    let user = db
        .find_user_by_email("amy@example.com")
        .await
        .unwrap()
        .expect("user should exist");
    assert_eq!(user.id, user_id);
    assert_eq!(user.role, names::ROLE_STUDENT);
    assert_eq!(user.full_name(), "Amy Pond");
    assert!(!user.is_teacher());

    assert!(db
        .verify_user_password("amy@example.com", "hunter22")
        .await
        .unwrap());
    assert!(!db
        .verify_user_password("amy@example.com", "wrong")
        .await
        .unwrap());

    let session = db.create_session(user_id).await.unwrap();
    let resolved = db.get_user_by_session(&session).await.unwrap();
    assert_eq!(resolved.map(|u| u.id), Some(user_id));

    db.delete_session(&session).await.unwrap();
    assert!(db.get_user_by_session(&session).await.unwrap().is_none());
}

#[tokio::test]
async fn test_deactivated_user_loses_sessions_and_login() {
    let db = create_test_db().await;
    let user_id = seed_student(&db, "rory@example.com").await;
    let session = db.create_session(user_id).await.unwrap();

    let active = db.toggle_user_active(user_id).await.unwrap();
    assert_eq!(active, Some(false));

    assert!(db.get_user_by_session(&session).await.unwrap().is_none());
    assert!(!db
        .verify_user_password("rory@example.com", "hunter22")
        .await
        .unwrap());

    // Reactivation brings the account and its sessions back
    let active = db.toggle_user_active(user_id).await.unwrap();
    assert_eq!(active, Some(true));
    assert!(db.get_user_by_session(&session).await.unwrap().is_some());

    assert_eq!(db.toggle_user_active(9999).await.unwrap(), None);
}

#[tokio::test]
async fn test_passage_creation_parses_reference() {
    let db = create_test_db().await;

    let passage = db
        .create_passage("John 3:16", JOHN_3_16, "NIV", 1)
        .await
        .unwrap()
        .expect("reference should be free");

    assert_eq!(passage.book.as_deref(), Some("John"));
    assert_eq!(passage.chapter, Some(3));
    assert_eq!(passage.verse_start, Some(16));
    assert_eq!(passage.verse_end, None);
    assert_eq!(passage.word_count, 6);
    assert!(passage.is_active);

    let ranged = db
        .create_passage("1 John 3:16-18", "some longer text here", "ESV", 2)
        .await
        .unwrap()
        .expect("reference should be free");
    assert_eq!(ranged.book.as_deref(), Some("1 John"));
    assert_eq!(ranged.chapter, Some(3));
    assert_eq!(ranged.verse_start, Some(16));
    assert_eq!(ranged.verse_end, Some(18));

    // Same reference again is refused
    let dup = db
        .create_passage("John 3:16", "different text", "NIV", 1)
        .await
        .unwrap();
    assert!(dup.is_none());
}

#[tokio::test]
async fn test_passage_update_and_deactivate() {
    let db = create_test_db().await;
    let passage_id = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    let updated = db
        .update_passage(passage_id, Some("For God so loved"), None, Some(3))
        .await
        .unwrap()
        .expect("passage should exist");
    assert_eq!(updated.text, "For God so loved");
    assert_eq!(updated.word_count, 4);
    assert_eq!(updated.difficulty_level, 3);
    assert_eq!(updated.translation, "NIV");
    assert_eq!(updated.reference, "John 3:16");

    assert!(db.deactivate_passage(passage_id).await.unwrap());

    let active_only = db.list_passages(false).await.unwrap();
    assert!(active_only.is_empty());
    let all = db.list_passages(true).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].is_active);

    assert!(db.random_passage().await.unwrap().is_none());

    let missing = db.update_passage(9999, Some("x"), None, None).await.unwrap();
    assert!(missing.is_none());
    assert!(!db.deactivate_passage(9999).await.unwrap());
}

#[tokio::test]
async fn test_random_passage_skips_inactive() {
    let db = create_test_db().await;
    let first = seed_passage(&db, "John 3:16", JOHN_3_16).await;
    let second = seed_passage(&db, "Psalm 23:1", "The Lord is my shepherd").await;

    db.deactivate_passage(first).await.unwrap();

    for _ in 0..5 {
        let picked = db.random_passage().await.unwrap().expect("one is active");
        assert_eq!(picked.id, second);
    }
}

#[tokio::test]
async fn test_first_attempt_creates_progress() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    let (attempt_id, progress) = db
        .record_attempt(
            student,
            passage,
            "For God so loves the world",
            85.0,
            Some(JOHN_3_16),
            &AttemptMeta::default(),
        )
        .await
        .unwrap();

    assert!(attempt_id > 0);
    assert_eq!(progress.total_attempts, 1);
    assert_eq!(progress.best_score, 85.0);
    assert_eq!(progress.latest_score, 85.0);
    assert_eq!(progress.average_score, 85.0);
    assert!(!progress.is_memorized);
    assert_eq!(progress.first_memorized_at, None);
    assert_eq!(progress.trend, "stable");

    let stored = db
        .get_progress(student, passage)
        .await
        .unwrap()
        .expect("progress row should exist");
    assert_eq!(stored, progress);
}

#[tokio::test]
async fn test_second_attempt_folds_into_summary() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    seed_attempt(&db, student, passage, 85.0).await;
    let (_, progress) = db
        .record_attempt(
            student,
            passage,
            JOHN_3_16,
            95.0,
            None,
            &AttemptMeta::default(),
        )
        .await
        .unwrap();

    assert_eq!(progress.total_attempts, 2);
    assert_eq!(progress.best_score, 95.0);
    assert_eq!(progress.latest_score, 95.0);
    assert!((progress.average_score - 90.0).abs() < 1e-9);
    assert!(progress.is_memorized);
    assert!(progress.first_memorized_at.is_some());
    assert_eq!(progress.trend, "improving");
}

#[tokio::test]
async fn test_attempt_numbers_are_sequential() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    for score in [70.0, 80.0, 90.0] {
        seed_attempt(&db, student, passage, score).await;
    }

    let attempts = db.attempts_for_passage(student, passage).await.unwrap();
    assert_eq!(attempts.len(), 3);
    // Newest first
    assert_eq!(attempts[0].attempt_number, 3);
    assert_eq!(attempts[0].score, 90.0);
    assert!(attempts[0].is_passing);
    assert_eq!(attempts[2].attempt_number, 1);
    assert!(!attempts[2].is_passing);
    assert_eq!(attempts[0].reference, "John 3:16");
}

#[tokio::test]
async fn test_first_memorized_at_survives_score_drop() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    seed_attempt(&db, student, passage, 95.0).await;
    let memorized_at = db
        .get_progress(student, passage)
        .await
        .unwrap()
        .unwrap()
        .first_memorized_at
        .expect("passing attempt should set first_memorized_at");

    // A later failing attempt clears the memorized flag but not the date
    let (_, after_drop) = db
        .record_attempt(
            student,
            passage,
            "For God",
            70.0,
            None,
            &AttemptMeta::default(),
        )
        .await
        .unwrap();
    assert!(!after_drop.is_memorized);
    assert_eq!(
        after_drop.first_memorized_at.as_deref(),
        Some(memorized_at.as_str())
    );
    assert_eq!(after_drop.trend, "declining");

    // Passing again keeps the original date
    let (_, after_recovery) = db
        .record_attempt(
            student,
            passage,
            JOHN_3_16,
            92.0,
            None,
            &AttemptMeta::default(),
        )
        .await
        .unwrap();
    assert!(after_recovery.is_memorized);
    assert_eq!(
        after_recovery.first_memorized_at.as_deref(),
        Some(memorized_at.as_str())
    );
}

#[tokio::test]
async fn test_record_attempt_rejects_bad_input() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    let err = db
        .record_attempt(student, passage, "x", 150.0, None, &AttemptMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::InvalidScore(_)));

    let err = db
        .record_attempt(student, passage, "x", -0.5, None, &AttemptMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::InvalidScore(_)));

    let err = db
        .record_attempt(student, 9999, "x", 50.0, None, &AttemptMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::PassageNotFound(9999)));

    db.deactivate_passage(passage).await.unwrap();
    let err = db
        .record_attempt(student, passage, "x", 50.0, None, &AttemptMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::PassageInactive(_)));

    // Nothing was recorded along the way
    assert!(db.get_progress(student, passage).await.unwrap().is_none());
    assert!(db
        .attempts_for_passage(student, passage)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_attempt_metadata_is_stored() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    let meta = AttemptMeta {
        time_spent_seconds: Some(42),
        used_speech_recognition: true,
    };
    db.record_attempt(student, passage, JOHN_3_16, 91.0, None, &meta)
        .await
        .unwrap();

    let attempts = db.recent_attempts(student, 10).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].time_spent_seconds, Some(42));
    assert!(attempts[0].used_speech_recognition);
}

#[tokio::test]
async fn test_recent_attempts_honors_limit() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    for i in 0..5 {
        seed_attempt(&db, student, passage, 60.0 + f64::from(i)).await;
    }

    let attempts = db.recent_attempts(student, 3).await.unwrap();
    assert_eq!(attempts.len(), 3);
    // Newest first
    assert_eq!(attempts[0].attempt_number, 5);
    assert_eq!(attempts[2].attempt_number, 3);
}

#[tokio::test]
async fn test_discrepancies_feed_error_analysis() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    // Twice dropping the last word, once substituting "loves" for "loved"
    for _ in 0..2 {
        db.record_attempt(
            student,
            passage,
            "For God so loved the",
            80.0,
            Some(JOHN_3_16),
            &AttemptMeta::default(),
        )
        .await
        .unwrap();
    }
    db.record_attempt(
        student,
        passage,
        "For God so loves the world",
        85.0,
        Some(JOHN_3_16),
        &AttemptMeta::default(),
    )
    .await
    .unwrap();

    let patterns = db.error_patterns(student).await.unwrap();
    assert_eq!(patterns.len(), 2);
    assert_eq!(patterns[0].error_type, "missing_word");
    assert_eq!(patterns[0].count, 2);
    assert_eq!(patterns[0].common_words.as_deref(), Some("world"));
    assert_eq!(patterns[1].error_type, "wrong_word");
    assert_eq!(patterns[1].count, 1);

    // Only words missed more than once qualify
    let problem_words = db.problem_words(student).await.unwrap();
    assert_eq!(problem_words.len(), 1);
    assert_eq!(problem_words[0].expected_word, "world");
    assert_eq!(problem_words[0].error_count, 2);
    assert!((problem_words[0].substitution_rate - 0.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_attempt_without_reference_stores_no_discrepancies() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    seed_attempt(&db, student, passage, 55.0).await;

    assert!(db.error_patterns(student).await.unwrap().is_empty());
    assert!(db.problem_words(student).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_progress_listing_joins_passages() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let john = seed_passage(&db, "John 3:16", JOHN_3_16).await;
    let psalm = seed_passage(&db, "Psalm 23:1", "The Lord is my shepherd").await;

    seed_attempt(&db, student, john, 95.0).await;
    seed_attempt(&db, student, psalm, 65.0).await;

    let all = db.progress_for_student(student, None).await.unwrap();
    assert_eq!(all.len(), 2);
    let references: HashSet<&str> = all.iter().map(|p| p.reference.as_str()).collect();
    assert_eq!(references, HashSet::from(["John 3:16", "Psalm 23:1"]));

    let only_john = db.progress_for_student(student, Some(john)).await.unwrap();
    assert_eq!(only_john.len(), 1);
    assert_eq!(only_john[0].reference, "John 3:16");
    assert_eq!(only_john[0].best_score, 95.0);
    assert!(only_john[0].is_memorized);
}

#[tokio::test]
async fn test_student_summary_from_progress_rows() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let john = seed_passage(&db, "John 3:16", JOHN_3_16).await;
    let psalm = seed_passage(&db, "Psalm 23:1", "The Lord is my shepherd").await;

    seed_attempt(&db, student, john, 95.0).await;
    seed_attempt(&db, student, psalm, 60.0).await;
    seed_attempt(&db, student, psalm, 65.0).await;

    let rows = db.progress_rows(student).await.unwrap();
    let summary = progress::summarize(&rows);

    assert_eq!(summary.verses_attempted, 2);
    assert_eq!(summary.verses_memorized, 1);
    assert!((summary.average_best_score - 80.0).abs() < 1e-9);
    assert_eq!(summary.total_attempts, 3);
    assert!((summary.completion_rate - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_class_roster_management() {
    let db = create_test_db().await;
    let teacher = seed_teacher(&db, "river@example.com").await;
    let other_teacher = seed_teacher(&db, "missy@example.com").await;
    let student = seed_student(&db, "amy@example.com").await;

    let class_id = db
        .create_class("Year 7", Some("First period"), teacher)
        .await
        .unwrap();

    assert!(db.class_owned_by(class_id, teacher).await.unwrap());
    assert!(!db.class_owned_by(class_id, other_teacher).await.unwrap());
    assert!(db
        .find_class(class_id, other_teacher)
        .await
        .unwrap()
        .is_none());

    // Students start out available, not enrolled
    let available = db.available_students(class_id).await.unwrap();
    assert_eq!(available.len(), 1);
    assert!(db.class_roster(class_id).await.unwrap().is_empty());
    assert!(!db.is_class_member(class_id, student).await.unwrap());

    db.add_student_to_class(class_id, student).await.unwrap();
    let roster = db.class_roster(class_id).await.unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].id, student);
    assert!(db.available_students(class_id).await.unwrap().is_empty());
    assert!(db.is_class_member(class_id, student).await.unwrap());
    assert!(db
        .teacher_can_access_student(teacher, student)
        .await
        .unwrap());
    assert!(!db
        .teacher_can_access_student(other_teacher, student)
        .await
        .unwrap());

    let class = db
        .find_class(class_id, teacher)
        .await
        .unwrap()
        .expect("class should exist");
    assert_eq!(class.student_count, 1);

    // Removal is a soft delete; re-adding reactivates the same membership
    assert!(db
        .remove_student_from_class(class_id, student)
        .await
        .unwrap());
    assert!(db.class_roster(class_id).await.unwrap().is_empty());
    assert!(!db
        .remove_student_from_class(class_id, 9999)
        .await
        .unwrap());

    db.add_student_to_class(class_id, student).await.unwrap();
    assert_eq!(db.class_roster(class_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_class_progress_rollup() {
    let db = create_test_db().await;
    let teacher = seed_teacher(&db, "river@example.com").await;
    let amy = db
        .create_user(
            "amy@example.com",
            "hunter22",
            "Amy",
            "Pond",
            names::ROLE_STUDENT,
        )
        .await
        .unwrap();
    let clara = db
        .create_user(
            "clara@example.com",
            "hunter22",
            "Clara",
            "Oswald",
            names::ROLE_STUDENT,
        )
        .await
        .unwrap();
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    let class_id = db.create_class("Year 7", None, teacher).await.unwrap();
    db.add_student_to_class(class_id, amy).await.unwrap();
    db.add_student_to_class(class_id, clara).await.unwrap();

    seed_attempt(&db, amy, passage, 95.0).await;
    seed_attempt(&db, clara, passage, 70.0).await;
    seed_attempt(&db, clara, passage, 80.0).await;

    let rows = db.class_progress(class_id).await.unwrap();
    assert_eq!(rows.len(), 2);

    // Ordered by last name: Oswald before Pond
    assert_eq!(rows[0].last_name, "Oswald");
    assert_eq!(rows[0].verses_attempted, 1);
    assert_eq!(rows[0].verses_memorized, 0);
    assert_eq!(rows[0].total_attempts, Some(2));

    assert_eq!(rows[1].last_name, "Pond");
    assert_eq!(rows[1].verses_memorized, 1);
    assert_eq!(rows[1].average_best_score, Some(95.0));

    let overview = db.class_overview_students(class_id).await.unwrap();
    assert_eq!(overview.len(), 2);
    assert_eq!(overview[0].improving_count, 1);
    assert_eq!(overview[0].declining_count, 0);
}

#[tokio::test]
async fn test_passage_difficulty_and_recent_activity() {
    let db = create_test_db().await;
    let teacher = seed_teacher(&db, "river@example.com").await;
    let student = seed_student(&db, "amy@example.com").await;
    let john = seed_passage(&db, "John 3:16", JOHN_3_16).await;
    let psalm = seed_passage(&db, "Psalm 23:1", "The Lord is my shepherd").await;

    let class_id = db.create_class("Year 7", None, teacher).await.unwrap();
    db.add_student_to_class(class_id, student).await.unwrap();

    seed_attempt(&db, student, john, 95.0).await;
    seed_attempt(&db, student, john, 91.0).await;
    seed_attempt(&db, student, psalm, 50.0).await;

    let difficulty = db.passage_difficulty(class_id).await.unwrap();
    assert_eq!(difficulty.len(), 2);
    // Hardest (lowest average) first
    assert_eq!(difficulty[0].reference, "Psalm 23:1");
    assert_eq!(difficulty[0].pass_rate, Some(0.0));
    assert_eq!(difficulty[1].reference, "John 3:16");
    assert_eq!(difficulty[1].students_attempted, 1);
    assert_eq!(difficulty[1].pass_rate, Some(100.0));

    let activity = db.recent_activity(class_id).await.unwrap();
    assert_eq!(activity.len(), 3);
    // Newest first
    assert_eq!(activity[0].reference, "Psalm 23:1");
    assert_eq!(activity[0].score, 50.0);
    assert!(!activity[0].is_passing);
}

#[tokio::test]
async fn test_student_timeline_groups_by_day() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    seed_attempt(&db, student, passage, 70.0).await;
    seed_attempt(&db, student, passage, 90.0).await;

    let timeline = db.student_timeline(student).await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].reference, "John 3:16");
    assert_eq!(timeline[0].attempts, 2);
    assert_eq!(timeline[0].best_score, 90.0);
    assert!((timeline[0].average_score - 80.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_export_rows_flatten_class_attempts() {
    let db = create_test_db().await;
    let teacher = seed_teacher(&db, "river@example.com").await;
    let student = db
        .create_user(
            "amy@example.com",
            "hunter22",
            "Amy",
            "Pond",
            names::ROLE_STUDENT,
        )
        .await
        .unwrap();
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    let class_id = db.create_class("Year 7", None, teacher).await.unwrap();
    db.add_student_to_class(class_id, student).await.unwrap();

    let meta = AttemptMeta {
        time_spent_seconds: None,
        used_speech_recognition: true,
    };
    db.record_attempt(student, passage, JOHN_3_16, 93.5, None, &meta)
        .await
        .unwrap();

    let rows = db.export_rows(class_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].first_name, "Amy");
    assert_eq!(rows[0].email, "amy@example.com");
    assert_eq!(rows[0].reference, "John 3:16");
    assert_eq!(rows[0].score, 93.5);
    assert!(rows[0].is_passing);
    assert_eq!(rows[0].attempt_number, 1);
    assert!(rows[0].used_speech_recognition);
}

#[tokio::test]
async fn test_students_listing_excludes_other_roles() {
    let db = create_test_db().await;
    let teacher = seed_teacher(&db, "river@example.com").await;
    let student = seed_student(&db, "amy@example.com").await;

    let students = db.list_students().await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].id, student);

    assert!(db.find_student(student).await.unwrap().is_some());
    assert!(db.find_student(teacher).await.unwrap().is_none());

    let users = db.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.is_active));
}

#[tokio::test]
async fn test_settings_upsert_and_read() {
    let db = create_test_db().await;

    db.upsert_setting("passing_score", "90").await.unwrap();
    db.upsert_setting("passing_score", "85").await.unwrap();
    db.upsert_setting("welcome_message", "hello").await.unwrap();

    let settings = db.get_settings().await.unwrap();
    assert_eq!(settings.len(), 2);
    let passing = settings
        .iter()
        .find(|s| s.key == "passing_score")
        .expect("setting should exist");
    assert_eq!(passing.value, "85");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_attempts_stay_consistent() {
    let db = create_test_db().await;
    let student = seed_student(&db, "amy@example.com").await;
    let passage = seed_passage(&db, "John 3:16", JOHN_3_16).await;

    let submit = |score: f64| {
        let db = db.clone();
        async move {
            db.record_attempt(
                student,
                passage,
                JOHN_3_16,
                score,
                None,
                &AttemptMeta::default(),
            )
            .await
        }
    };

    let (a, b, c, d) = tokio::join!(submit(70.0), submit(75.0), submit(80.0), submit(85.0));
    a.unwrap();
    b.unwrap();
    c.unwrap();
    d.unwrap();

    let attempts = db.attempts_for_passage(student, passage).await.unwrap();
    let numbers: HashSet<i64> = attempts.iter().map(|a| a.attempt_number).collect();
    assert_eq!(numbers, HashSet::from([1, 2, 3, 4]));

    let progress = db.get_progress(student, passage).await.unwrap().unwrap();
    assert_eq!(progress.total_attempts, 4);
    assert_eq!(progress.best_score, 85.0);
    assert!((progress.average_score - 77.5).abs() < 1e-9);
}
