//! Integration tests for the PostgreSQL repository
//!
//! These run against the database named by `DATABASE_URL` and are ignored by
//! default. Run them with `cargo test -p attendance -- --ignored` once a
//! PostgreSQL instance is reachable. Every test uses fresh codes and student
//! ids, so they can run repeatedly against the same database.

use std::sync::Arc;

use attendance::repository::InsertOutcome;
use attendance::{AttendanceRecord, AttendanceRepository, PostgresRepository, Session};
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::database::{DatabaseConfig, init_pool};
use serial_test::serial;

type TestResult = Result<(), Box<dyn std::error::Error>>;

async fn repository() -> Result<PostgresRepository, Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;
    let pool = init_pool(&config).await?;
    let repository = PostgresRepository::new(pool);
    repository.ensure_schema().await?;
    Ok(repository)
}

fn unique(prefix: &str) -> String {
    format!("{prefix}{:08X}", rand::random::<u32>())
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap()
}

fn session(code: &str) -> Session {
    Session {
        code: code.to_string(),
        subject: "Databases".to_string(),
        room: "D3".to_string(),
        created_at: t0(),
        duration_minutes: Some(90),
        expires_at: None,
        is_active: true,
        ended_at: None,
    }
}

fn record(student_id: &str, name: &str, code: &str) -> AttendanceRecord {
    AttendanceRecord {
        student_id: student_id.to_string(),
        name: name.to_string(),
        session_code: code.to_string(),
        timestamp: t0() + Duration::minutes(5),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn duplicate_session_code_conflicts() -> TestResult {
    let repo = repository().await?;
    let code = unique("S");

    assert_eq!(repo.insert_session(&session(&code)).await?, InsertOutcome::Inserted);
    assert_eq!(repo.insert_session(&session(&code)).await?, InsertOutcome::Conflict);

    let stored = repo.find_session(&code).await?.expect("session stored");
    assert_eq!(stored.duration_minutes, Some(90));
    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn re_ending_keeps_first_end_time() -> TestResult {
    let repo = repository().await?;
    let code = unique("S");
    repo.insert_session(&session(&code)).await?;

    let first_end = t0() + Duration::minutes(10);
    let first = repo.end_session(&code, first_end).await?.expect("session exists");
    let second = repo
        .end_session(&code, t0() + Duration::minutes(40))
        .await?
        .expect("session exists");

    assert!(!first.is_active);
    assert_eq!(first.ended_at, Some(first_end));
    assert_eq!(second.ended_at, Some(first_end));
    assert!(repo.end_session(&unique("SNONE"), first_end).await?.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn concurrent_registrations_insert_once() -> TestResult {
    let repo = Arc::new(repository().await?);
    let code = unique("S");
    let student_id = unique("stu-");
    repo.insert_session(&session(&code)).await?;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let repo = repo.clone();
        let record = record(&student_id, "Hana", &code);
        handles.push(tokio::spawn(async move {
            repo.record_attendance(&record).await
        }));
    }

    let mut inserted = 0;
    for handle in handles {
        if handle.await?? == InsertOutcome::Inserted {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);
    assert_eq!(repo.session_attendance(&code).await?.len(), 1);
    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn percentage_inputs_group_distinct_sessions_per_student() -> TestResult {
    let repo = repository().await?;
    let first = unique("S");
    let second = unique("S");
    repo.insert_session(&session(&first)).await?;
    repo.insert_session(&session(&second)).await?;

    let regular = unique("stu-");
    let occasional = unique("stu-");
    repo.record_attendance(&record(&regular, "Omar", &first)).await?;
    repo.record_attendance(&record(&regular, "Omar B.", &second)).await?;
    assert_eq!(
        repo.record_attendance(&record(&regular, "Omar", &second)).await?,
        InsertOutcome::Conflict
    );
    repo.record_attendance(&record(&occasional, "Dina", &second)).await?;

    let inputs = repo.percentage_inputs().await?;
    assert_eq!(inputs.attended.get(&regular), Some(&2));
    assert_eq!(inputs.attended.get(&occasional), Some(&1));

    let student = inputs
        .students
        .iter()
        .find(|s| s.student_id == regular)
        .expect("student on roster");
    assert_eq!(student.name, "Omar");
    assert!(inputs.sessions.iter().any(|s| s.code == first));
    Ok(())
}
