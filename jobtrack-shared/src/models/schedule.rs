/// Calendar reminders (`calendar_schedule` table)

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const SCHEDULE_COLUMNS: &str =
    "id, user_id, title, description, date, time, created_at, updated_at";

/// A reminder owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSchedule {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Partial update; `Some(None)` clears the description
#[derive(Debug, Clone, Default)]
pub struct UpdateSchedule {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl Schedule {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        data: CreateSchedule,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO calendar_schedule (user_id, title, description, date, time) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            SCHEDULE_COLUMNS
        );

        sqlx::query_as::<_, Schedule>(&query)
            .bind(user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.date)
            .bind(data.time)
            .fetch_one(pool)
            .await
    }

    /// A user's schedules in chronological order
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM calendar_schedule WHERE user_id = $1 ORDER BY date ASC, time ASC",
            SCHEDULE_COLUMNS
        );

        sqlx::query_as::<_, Schedule>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM calendar_schedule WHERE id = $1 AND user_id = $2",
            SCHEDULE_COLUMNS
        );

        sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Applies a partial update; `None` if not found for this user
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateSchedule,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder =
            QueryBuilder::<Postgres>::new("UPDATE calendar_schedule SET updated_at = NOW()");

        if let Some(title) = data.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(date) = data.date {
            builder.push(", date = ").push_bind(date);
        }
        if let Some(time) = data.time {
            builder.push(", time = ").push_bind(time);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND user_id = ").push_bind(user_id);
        builder.push(" RETURNING ").push(SCHEDULE_COLUMNS);

        builder.build_query_as::<Schedule>().fetch_optional(pool).await
    }

    /// `false` if not found for this user
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM calendar_schedule WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
