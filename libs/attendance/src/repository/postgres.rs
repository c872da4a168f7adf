//! PostgreSQL repository
//!
//! Uniqueness lives in the schema: `sessions.code` is the primary key and
//! `attendance` carries `UNIQUE (student_id, session_code)`. Conditional
//! inserts use `ON CONFLICT DO NOTHING` and read the affected row count, so a
//! concurrent duplicate is rejected by the database rather than by a prior
//! read.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgExecutor, PgPool, Row};
use tracing::{debug, info};

use super::{AttendanceRepository, InsertOutcome, PercentageInputs};
use crate::models::{AttendanceRecord, Session, Student};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        code TEXT PRIMARY KEY,
        subject TEXT NOT NULL,
        room TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        duration_minutes INTEGER CHECK (duration_minutes > 0),
        expires_at TIMESTAMPTZ,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        ended_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS students (
        student_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id BIGSERIAL PRIMARY KEY,
        student_id TEXT NOT NULL REFERENCES students (student_id),
        name TEXT NOT NULL,
        session_code TEXT NOT NULL REFERENCES sessions (code),
        recorded_at TIMESTAMPTZ NOT NULL,
        UNIQUE (student_id, session_code)
    )
    "#,
];

const SESSION_COLUMNS: &str =
    "code, subject, room, created_at, duration_minutes, expires_at, is_active, ended_at";

async fn select_sessions<'e>(executor: impl PgExecutor<'e>) -> DatabaseResult<Vec<Session>> {
    let query = format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY created_at DESC, code");
    sqlx::query_as::<_, Session>(&query)
        .fetch_all(executor)
        .await
        .map_err(DatabaseError::from_query)
}

async fn select_students<'e>(executor: impl PgExecutor<'e>) -> DatabaseResult<Vec<Student>> {
    sqlx::query_as::<_, Student>(
        "SELECT student_id, name, created_at FROM students ORDER BY student_id",
    )
    .fetch_all(executor)
    .await
    .map_err(DatabaseError::from_query)
}

async fn select_attended_counts<'e>(
    executor: impl PgExecutor<'e>,
) -> DatabaseResult<HashMap<String, i64>> {
    let rows = sqlx::query(
        r#"
        SELECT student_id, COUNT(DISTINCT session_code) AS attended
        FROM attendance
        GROUP BY student_id
        "#,
    )
    .fetch_all(executor)
    .await
    .map_err(DatabaseError::from_query)?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("student_id"), row.get("attended")))
        .collect())
}

/// Repository backed by PostgreSQL
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository over an initialised pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables this repository needs if they do not exist yet
    pub async fn ensure_schema(&self) -> DatabaseResult<()> {
        info!("Ensuring attendance schema");
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceRepository for PostgresRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_session(&self, session: &Session) -> DatabaseResult<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (code, subject, room, created_at, duration_minutes, expires_at, is_active, ended_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&session.code)
        .bind(&session.subject)
        .bind(&session.room)
        .bind(session.created_at)
        .bind(session.duration_minutes)
        .bind(session.expires_at)
        .bind(session.is_active)
        .bind(session.ended_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        if result.rows_affected() == 0 {
            debug!("Session code {} already taken", session.code);
            return Ok(InsertOutcome::Conflict);
        }
        Ok(InsertOutcome::Inserted)
    }

    async fn find_session(&self, code: &str) -> DatabaseResult<Option<Session>> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE code = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn end_session(
        &self,
        code: &str,
        ended_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Session>> {
        let query = format!(
            r#"
            UPDATE sessions
            SET is_active = FALSE, ended_at = COALESCE(ended_at, $2)
            WHERE code = $1
            RETURNING {SESSION_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(code)
            .bind(ended_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list_sessions(&self) -> DatabaseResult<Vec<Session>> {
        select_sessions(&self.pool).await
    }

    async fn count_sessions(&self) -> DatabaseResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn record_attendance(&self, record: &AttendanceRecord) -> DatabaseResult<InsertOutcome> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_query)?;

        sqlx::query(
            r#"
            INSERT INTO students (student_id, name, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (student_id) DO NOTHING
            "#,
        )
        .bind(&record.student_id)
        .bind(&record.name)
        .bind(record.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        let result = sqlx::query(
            r#"
            INSERT INTO attendance (student_id, name, session_code, recorded_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id, session_code) DO NOTHING
            "#,
        )
        .bind(&record.student_id)
        .bind(&record.name)
        .bind(&record.session_code)
        .bind(record.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(DatabaseError::from_query)?;
            return Ok(InsertOutcome::Conflict);
        }

        tx.commit().await.map_err(DatabaseError::from_query)?;
        Ok(InsertOutcome::Inserted)
    }

    async fn session_attendance(&self, code: &str) -> DatabaseResult<Vec<AttendanceRecord>> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT student_id, name, session_code, recorded_at
            FROM attendance
            WHERE session_code = $1
            ORDER BY recorded_at, id
            "#,
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn percentage_inputs(&self) -> DatabaseResult<PercentageInputs> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_query)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_query)?;

        let students = select_students(&mut *tx).await?;
        let attended = select_attended_counts(&mut *tx).await?;
        let sessions = select_sessions(&mut *tx).await?;

        tx.commit().await.map_err(DatabaseError::from_query)?;
        Ok(PercentageInputs {
            students,
            attended,
            sessions,
        })
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.pool).await
    }
}
