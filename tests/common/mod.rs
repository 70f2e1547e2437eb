use versecraft::db::Db;
use versecraft::names;

pub async fn create_test_db() -> Db {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("versecraft_test_{}_{}.db", std::process::id(), id));
    // Clean up leftovers from previous runs, including WAL sidecars
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
    let url = format!("file:{}", path.display());
    Db::new(url, String::new())
        .await
        .expect("failed to create test database")
}

#[allow(dead_code)]
pub async fn seed_student(db: &Db, email: &str) -> i64 {
    db.create_user(email, "hunter22", "Test", "Student", names::ROLE_STUDENT)
        .await
        .expect("failed to create student")
}

#[allow(dead_code)]
pub async fn seed_teacher(db: &Db, email: &str) -> i64 {
    db.create_user(email, "hunter22", "Test", "Teacher", names::ROLE_TEACHER)
        .await
        .expect("failed to create teacher")
}

#[allow(dead_code)]
pub async fn seed_passage(db: &Db, reference: &str, text: &str) -> i64 {
    db.create_passage(reference, text, "NIV", 1)
        .await
        .expect("failed to create passage")
        .expect("passage reference already taken")
        .id
}
