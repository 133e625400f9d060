/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     phone_number VARCHAR(32) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     profile_picture_url TEXT,
///     resume_url TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Users are never hard-deleted by the API.
///
/// # Example
///
/// ```no_run
/// use jobtrack_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: "Alice".to_string(),
///         email: "alice@example.com".to_string(),
///         phone_number: "+6281234567890".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
///
/// let found = User::find_by_email(&pool, "alice@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Columns selected for every `User` query
const USER_COLUMNS: &str = "id, name, email, phone_number, password_hash, \
     profile_picture_url, resume_url, created_at, updated_at";

/// Required phone number prefix (Indonesia)
pub const PHONE_PREFIX: &str = "+62";

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// E-mail address, unique across users
    pub email: String,

    /// Phone number in `+62XXXXXXXXX` form, unique across users
    pub phone_number: String,

    /// Argon2id PHC hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Public URL of the profile picture
    pub profile_picture_url: Option<String>,

    /// Public URL of the uploaded resume (PDF)
    pub resume_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub phone_number: String,

    /// Argon2id hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Partial update of a user
///
/// `None` leaves a column untouched. For the nullable URL columns,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub profile_picture_url: Option<Option<String>>,
    pub resume_url: Option<Option<String>>,
}

impl UpdateUser {
    /// True when no column would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.password_hash.is_none()
            && self.profile_picture_url.is_none()
            && self.resume_url.is_none()
    }

    /// Applies the update to an in-memory user, bumping `updated_at`
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(phone_number) = self.phone_number {
            user.phone_number = phone_number;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(url) = self.profile_picture_url {
            user.profile_picture_url = url;
        }
        if let Some(url) = self.resume_url {
            user.resume_url = url;
        }
        user.updated_at = Utc::now();
    }
}

/// User fields safe to return to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub profile_picture_url: Option<String>,
    pub resume_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            profile_picture_url: user.profile_picture_url.clone(),
            resume_url: user.resume_url.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Checks the `+62` followed by 9 to 12 digits rule
pub fn validate_phone_number(phone: &str) -> Result<(), String> {
    let digits = phone
        .strip_prefix(PHONE_PREFIX)
        .ok_or_else(|| "Phone number must start with +62".to_string())?;

    let len = digits.len();
    if !(9..=12).contains(&len) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number must start with +62 followed by 9-12 digits".to_string());
    }

    Ok(())
}

/// Login identifiers containing `@` are e-mails, anything else a phone
pub fn identifier_is_email(identifier: &str) -> bool {
    identifier.contains('@')
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Unique violations on `email` / `phone_number` surface as
    /// `sqlx::Error::Database`.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, phone_number, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.phone_number)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by e-mail address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by phone number
    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE phone_number = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Finds any user holding either the e-mail or the phone number
    ///
    /// Used by registration to reject duplicates before inserting.
    pub async fn find_by_email_or_phone(
        pool: &PgPool,
        email: &str,
        phone: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE email = $1 OR phone_number = $2 LIMIT 1",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Applies a partial update and returns the new row
    ///
    /// Returns `None` if the user does not exist. `updated_at` is always
    /// bumped.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");

        if let Some(name) = data.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(email) = data.email {
            builder.push(", email = ").push_bind(email);
        }
        if let Some(phone_number) = data.phone_number {
            builder.push(", phone_number = ").push_bind(phone_number);
        }
        if let Some(password_hash) = data.password_hash {
            builder.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(url) = data.profile_picture_url {
            builder.push(", profile_picture_url = ").push_bind(url);
        }
        if let Some(url) = data.resume_url {
            builder.push(", resume_url = ").push_bind(url);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(USER_COLUMNS);

        builder.build_query_as::<User>().fetch_optional(pool).await
    }
}
