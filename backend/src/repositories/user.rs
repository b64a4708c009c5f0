//! PostgreSQL user repository

use super::{NewUser, StoreError, UpdateUserProfile, UserStore};
use async_trait::async_trait;
use bandsync_shared::models::{Band, BandMembership, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            phone_number: record.phone_number,
            profile_image_url: record.profile_image_url,
            timezone: record.timezone,
            created_at: record.created_at,
        }
    }
}

/// Membership joined with its band
#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    band_id: Uuid,
    role: String,
    joined_at: DateTime<Utc>,
    band_name: String,
    band_description: Option<String>,
    band_created_at: DateTime<Utc>,
}

impl From<MembershipRow> for BandMembership {
    fn from(row: MembershipRow) -> Self {
        BandMembership {
            id: row.id,
            band_id: row.band_id,
            role: row.role,
            joined_at: row.joined_at,
            band: Band {
                id: row.band_id,
                name: row.band_name,
                description: row.band_description,
                created_at: row.band_created_at,
            },
        }
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone_number, \
                            profile_image_url, timezone, created_at, updated_at";

/// User store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        updates: UpdateUserProfile,
    ) -> Result<UserRecord, StoreError> {
        sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone_number = COALESCE($4, phone_number),
                timezone = COALESCE($5, timezone),
                profile_image_url = COALESCE($6, profile_image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(updates.first_name)
        .bind(updates.last_name)
        .bind(updates.phone_number)
        .bind(updates.timezone)
        .bind(updates.profile_image_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> Result<Vec<BandMembership>, StoreError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT m.id, m.band_id, m.role, m.joined_at,
                   b.name AS band_name, b.description AS band_description,
                   b.created_at AS band_created_at
            FROM band_members m
            JOIN bands b ON b.id = m.band_id
            WHERE m.user_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BandMembership::from).collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!("Database health check failed: {}", e);
                e.into()
            })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversion_drops_password_hash() {
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$...".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: None,
            profile_image_url: None,
            timezone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let id = record.id;
        let user = User::from(record);
        assert_eq!(user.id, id);

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::NotFound));
    }
}
