/// Application status lookup table and per-user status counts
///
/// The `application_statuses` table is seeded by migration with 21 fixed
/// rows; ids are stable and referenced directly by [`StatusSummary`].

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Seeded status ids
pub mod ids {
    pub const APPLY: i32 = 1;
    pub const SCREENING: i32 = 2;
    pub const INTERVIEW_HR: i32 = 3;
    pub const INTERVIEW_USER: i32 = 4;
    pub const REJECT: i32 = 5;
    pub const SUCCESS: i32 = 6;
    pub const INTERVIEW_HR_II: i32 = 7;
    pub const INTERVIEW_USER_II: i32 = 8;
    pub const INTERVIEW_C_LEVEL: i32 = 9;
    pub const INTERVIEW_C_LEVEL_II: i32 = 10;
    pub const INTERVIEW_CEO: i32 = 11;
    pub const PSYCHOLOGICAL_TEST: i32 = 12;
    pub const HR_TEST: i32 = 13;
    pub const TECHNICAL_TEST: i32 = 14;
    pub const IGNORED_BY_COMPANY: i32 = 15;
    pub const REJECT_CV: i32 = 16;
    pub const REJECT_INTERVIEW_HR: i32 = 17;
    pub const REJECT_INTERVIEW_USER: i32 = 18;
    pub const REJECT_HR_TEST: i32 = 19;
    pub const REJECT_TECHNICAL_TEST: i32 = 20;
    pub const CLOSED_VACANCY: i32 = 21;
}

/// A row of `application_statuses`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationStatus {
    pub id: i32,
    pub name: String,
}

impl ApplicationStatus {
    /// All statuses ordered by id
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ApplicationStatus>(
            "SELECT id, name FROM application_statuses ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await
    }

    /// Whether a status id exists
    pub async fn exists(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM application_statuses WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }
}

/// Number of a user's applications in each status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total_application: i64,
    pub apply: i64,
    pub screening: i64,
    pub interview_hr: i64,
    pub interview_hr_ii: i64,
    pub hr_test: i64,
    pub psychological_test: i64,
    pub interview_user: i64,
    pub interview_user_ii: i64,
    pub technical_test: i64,
    #[serde(rename = "interview_C_level")]
    pub interview_c_level: i64,
    #[serde(rename = "interview_C_level_ii")]
    pub interview_c_level_ii: i64,
    #[serde(rename = "interview_CEO")]
    pub interview_ceo: i64,
    pub ignored_by_company: i64,
    pub reject_cv: i64,
    pub reject_interview_hr: i64,
    pub reject_interview_user: i64,
    pub reject_hr_test: i64,
    pub reject_technical_test: i64,
    pub reject: i64,
    pub closed_vacancy: i64,
    pub success: i64,
}

impl StatusSummary {
    /// Tallies one status id per application
    ///
    /// Unknown ids still count toward `total_application`.
    pub fn from_status_ids<I>(status_ids: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut summary = Self::default();

        for status_id in status_ids {
            summary.total_application += 1;

            let slot = match status_id {
                ids::APPLY => &mut summary.apply,
                ids::SCREENING => &mut summary.screening,
                ids::INTERVIEW_HR => &mut summary.interview_hr,
                ids::INTERVIEW_USER => &mut summary.interview_user,
                ids::REJECT => &mut summary.reject,
                ids::SUCCESS => &mut summary.success,
                ids::INTERVIEW_HR_II => &mut summary.interview_hr_ii,
                ids::INTERVIEW_USER_II => &mut summary.interview_user_ii,
                ids::INTERVIEW_C_LEVEL => &mut summary.interview_c_level,
                ids::INTERVIEW_C_LEVEL_II => &mut summary.interview_c_level_ii,
                ids::INTERVIEW_CEO => &mut summary.interview_ceo,
                ids::PSYCHOLOGICAL_TEST => &mut summary.psychological_test,
                ids::HR_TEST => &mut summary.hr_test,
                ids::TECHNICAL_TEST => &mut summary.technical_test,
                ids::IGNORED_BY_COMPANY => &mut summary.ignored_by_company,
                ids::REJECT_CV => &mut summary.reject_cv,
                ids::REJECT_INTERVIEW_HR => &mut summary.reject_interview_hr,
                ids::REJECT_INTERVIEW_USER => &mut summary.reject_interview_user,
                ids::REJECT_HR_TEST => &mut summary.reject_hr_test,
                ids::REJECT_TECHNICAL_TEST => &mut summary.reject_technical_test,
                ids::CLOSED_VACANCY => &mut summary.closed_vacancy,
                _ => continue,
            };
            *slot += 1;
        }

        summary
    }

    /// Summary over all of a user's applications
    pub async fn for_user(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let status_ids: Vec<i32> =
            sqlx::query_scalar("SELECT status_id FROM job_applications WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        Ok(Self::from_status_ids(status_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = StatusSummary::from_status_ids(Vec::new());
        assert_eq!(summary, StatusSummary::default());
    }

    #[test]
    fn test_summary_counts() {
        let summary = StatusSummary::from_status_ids(vec![
            ids::APPLY,
            ids::APPLY,
            ids::INTERVIEW_CEO,
            ids::CLOSED_VACANCY,
            ids::SUCCESS,
            99,
        ]);

        assert_eq!(summary.total_application, 6);
        assert_eq!(summary.apply, 2);
        assert_eq!(summary.interview_ceo, 1);
        assert_eq!(summary.closed_vacancy, 1);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.reject, 0);
    }

    #[test]
    fn test_summary_field_names() {
        let summary = StatusSummary::from_status_ids(vec![
            ids::INTERVIEW_C_LEVEL,
            ids::INTERVIEW_C_LEVEL_II,
        ]);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["interview_C_level"], 1);
        assert_eq!(json["interview_C_level_ii"], 1);
        assert_eq!(json["interview_CEO"], 0);
        assert_eq!(json["total_application"], 2);
        assert_eq!(json.as_object().unwrap().len(), 22);
    }
}
