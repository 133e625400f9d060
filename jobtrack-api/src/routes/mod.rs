/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: liveness and health check
/// - `auth`: register, login, logout, token refresh
/// - `users`: profile, password, resume and profile picture
/// - `job_applications`: application tracking and status statistics
/// - `schedules`: calendar reminders

pub mod auth;
pub mod health;
pub mod job_applications;
pub mod schedules;
pub mod users;

use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{ApiError, ApiResult};

/// Runs derive-based validation plus hand-written field checks
///
/// All failures are collected into one [`ApiError::ValidationError`].
pub(crate) fn validate_request<T: Validate>(
    payload: &T,
    checks: Vec<(&'static str, Result<(), String>)>,
) -> ApiResult<()> {
    let mut errors = payload.validate().err().unwrap_or_else(ValidationErrors::new);

    for (field, result) in checks {
        if let Err(message) = result {
            let mut error = ValidationError::new("invalid");
            error.message = Some(message.into());
            errors.add(field, error);
        }
    }

    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(ApiError::from(errors))
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`); use with `#[serde(default)]`
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, Validate)]
    #[serde(default)]
    struct Probe {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        phone: String,
        #[serde(deserialize_with = "nullable")]
        notes: Option<Option<String>>,
    }

    #[test]
    fn test_validate_request_merges_checks() {
        let probe = Probe::default();
        let err = validate_request(
            &probe,
            vec![("phone", Err("Phone number must start with +62".to_string()))],
        )
        .unwrap_err();

        match err {
            ApiError::ValidationError(details) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "phone"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validate_request_passes() {
        let probe = Probe {
            name: "Alice".to_string(),
            ..Default::default()
        };
        assert!(validate_request(&probe, vec![("phone", Ok(()))]).is_ok());
    }

    #[test]
    fn test_nullable() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.notes, None);

        let cleared: Probe = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(cleared.notes, Some(None));

        let set: Probe = serde_json::from_str(r#"{"notes": "hi"}"#).unwrap();
        assert_eq!(set.notes, Some(Some("hi".to_string())));
    }
}
