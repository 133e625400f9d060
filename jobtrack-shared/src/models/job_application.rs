/// Job applications and their status history
///
/// Every query filters by `user_id`; an application owned by someone else
/// behaves exactly like a missing one.
///
/// Creating an application, or changing its `status_id`, appends a row to
/// `application_status_history` in the same transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE job_applications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     application_date DATE NOT NULL,
///     job_position VARCHAR(255) NOT NULL,
///     job_portal VARCHAR(255) NOT NULL,
///     job_url TEXT,
///     company_name VARCHAR(255) NOT NULL,
///     status_id INTEGER NOT NULL REFERENCES application_statuses(id),
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

/// A row of `job_applications`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub application_date: NaiveDate,
    pub job_position: String,
    pub job_portal: String,
    pub job_url: Option<String>,
    pub company_name: String,
    pub status_id: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An application joined with its status name, as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobApplicationView {
    pub id: Uuid,
    pub application_date: NaiveDate,
    pub job_position: String,
    pub job_portal: String,
    pub job_url: Option<String>,
    pub company_name: String,
    pub status: String,
    pub status_id: i32,
    pub notes: Option<String>,
}

/// One status change of an application
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusHistoryEntry {
    pub changed_at: DateTime<Utc>,
    pub status: String,
    pub status_id: i32,
}

/// An application with its full status history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobApplicationDetail {
    #[serde(flatten)]
    pub application: JobApplicationView,
    pub status_history: Vec<StatusHistoryEntry>,
}

/// Input for creating an application
#[derive(Debug, Clone)]
pub struct CreateJobApplication {
    pub application_date: NaiveDate,
    pub job_position: String,
    pub job_portal: String,
    pub job_url: Option<String>,
    pub company_name: String,
    pub status_id: i32,
    pub notes: Option<String>,
}

/// Partial update; `Some(None)` clears a nullable column
#[derive(Debug, Clone, Default)]
pub struct UpdateJobApplication {
    pub application_date: Option<NaiveDate>,
    pub job_position: Option<String>,
    pub job_portal: Option<String>,
    pub job_url: Option<Option<String>>,
    pub company_name: Option<String>,
    pub status_id: Option<i32>,
    pub notes: Option<Option<String>>,
}

const VIEW_SELECT: &str = "SELECT ja.id, ja.application_date, ja.job_position, ja.job_portal, \
     ja.job_url, ja.company_name, s.name AS status, ja.status_id, ja.notes \
     FROM job_applications ja \
     JOIN application_statuses s ON s.id = ja.status_id";

const APPLICATION_COLUMNS: &str = "id, user_id, application_date, job_position, job_portal, \
     job_url, company_name, status_id, notes, created_at, updated_at";

async fn record_status(
    conn: &mut PgConnection,
    application_id: Uuid,
    status_id: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO application_status_history (application_id, status_id) VALUES ($1, $2)",
    )
    .bind(application_id)
    .bind(status_id)
    .execute(conn)
    .await?;

    Ok(())
}

async fn fetch_view(
    conn: &mut PgConnection,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<JobApplicationView>, sqlx::Error> {
    let query = format!("{} WHERE ja.id = $1 AND ja.user_id = $2", VIEW_SELECT);

    sqlx::query_as::<_, JobApplicationView>(&query)
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

impl JobApplication {
    /// Inserts an application and its initial history row
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        data: CreateJobApplication,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO job_applications \
             (user_id, application_date, job_position, job_portal, job_url, company_name, status_id, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            APPLICATION_COLUMNS
        );

        let application = sqlx::query_as::<_, JobApplication>(&query)
            .bind(user_id)
            .bind(data.application_date)
            .bind(data.job_position)
            .bind(data.job_portal)
            .bind(data.job_url)
            .bind(data.company_name)
            .bind(data.status_id)
            .bind(data.notes)
            .fetch_one(&mut *tx)
            .await?;

        record_status(&mut tx, application.id, application.status_id).await?;
        tx.commit().await?;

        debug!(application_id = %application.id, user_id = %user_id, "Job application created");
        Ok(application)
    }

    /// A user's applications, newest application date first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        status_id: Option<i32>,
    ) -> Result<Vec<JobApplicationView>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(VIEW_SELECT);
        builder.push(" WHERE ja.user_id = ").push_bind(user_id);

        if let Some(status_id) = status_id {
            builder.push(" AND ja.status_id = ").push_bind(status_id);
        }

        builder.push(" ORDER BY ja.application_date DESC, ja.created_at DESC");

        builder
            .build_query_as::<JobApplicationView>()
            .fetch_all(pool)
            .await
    }

    /// One application with its status history, oldest change first
    pub async fn find_detail(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<JobApplicationDetail>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let Some(application) = fetch_view(&mut conn, id, user_id).await? else {
            return Ok(None);
        };

        let status_history = sqlx::query_as::<_, StatusHistoryEntry>(
            "SELECT h.changed_at, s.name AS status, h.status_id \
             FROM application_status_history h \
             JOIN application_statuses s ON s.id = h.status_id \
             WHERE h.application_id = $1 \
             ORDER BY h.changed_at ASC",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(JobApplicationDetail {
            application,
            status_history,
        }))
    }

    /// Applies a partial update, recording a history row on status change
    ///
    /// Returns `None` if the application does not exist for this user.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateJobApplication,
    ) -> Result<Option<JobApplicationView>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<i32> = sqlx::query_scalar(
            "SELECT status_id FROM job_applications WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current_status) = current else {
            return Ok(None);
        };

        let mut builder =
            QueryBuilder::<Postgres>::new("UPDATE job_applications SET updated_at = NOW()");

        if let Some(date) = data.application_date {
            builder.push(", application_date = ").push_bind(date);
        }
        if let Some(position) = data.job_position {
            builder.push(", job_position = ").push_bind(position);
        }
        if let Some(portal) = data.job_portal {
            builder.push(", job_portal = ").push_bind(portal);
        }
        if let Some(url) = data.job_url {
            builder.push(", job_url = ").push_bind(url);
        }
        if let Some(company) = data.company_name {
            builder.push(", company_name = ").push_bind(company);
        }
        if let Some(status_id) = data.status_id {
            builder.push(", status_id = ").push_bind(status_id);
        }
        if let Some(notes) = data.notes {
            builder.push(", notes = ").push_bind(notes);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND user_id = ").push_bind(user_id);
        builder.build().execute(&mut *tx).await?;

        if let Some(new_status) = data.status_id.filter(|s| *s != current_status) {
            record_status(&mut tx, id, new_status).await?;
            debug!(
                application_id = %id,
                from = current_status,
                to = new_status,
                "Job application status changed"
            );
        }

        let view = fetch_view(&mut tx, id, user_id).await?;
        tx.commit().await?;

        Ok(view)
    }

    /// Deletes one application; `false` if it was not found for this user
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM job_applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes all of a user's applications
    pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM job_applications WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_flattens_view() {
        let detail = JobApplicationDetail {
            application: JobApplicationView {
                id: Uuid::new_v4(),
                application_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                job_position: "Backend Engineer".to_string(),
                job_portal: "LinkedIn".to_string(),
                job_url: None,
                company_name: "Acme".to_string(),
                status: "Apply".to_string(),
                status_id: 1,
                notes: None,
            },
            status_history: vec![StatusHistoryEntry {
                changed_at: Utc::now(),
                status: "Apply".to_string(),
                status_id: 1,
            }],
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["company_name"], "Acme");
        assert_eq!(json["application_date"], "2024-05-01");
        assert_eq!(json["status"], "Apply");
        assert_eq!(json["status_history"][0]["status_id"], 1);
        assert!(json.get("application").is_none());
    }

    #[test]
    fn test_update_default_touches_nothing() {
        let update = UpdateJobApplication::default();
        assert!(update.status_id.is_none());
        assert!(update.notes.is_none());
    }
}
