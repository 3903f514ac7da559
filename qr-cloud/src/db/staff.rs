//! Staff account database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{StaffMember, StaffRole};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::{ServiceError, ServiceResult, is_unique_violation};

const STAFF_COLUMNS: &str = "id, name, email, role, is_active, created_at";

/// Login lookup row (includes the password hash)
#[derive(Debug, sqlx::FromRow)]
pub struct StaffAuthRow {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: i64,
}

impl StaffAuthRow {
    pub fn into_member(self) -> StaffMember {
        StaffMember {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

pub struct NewStaff<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: StaffRole,
}

/// Field changes already checked by the handler; `None` keeps the current value
#[derive(Default)]
pub struct StaffChanges<'a> {
    pub name: Option<&'a str>,
    pub role: Option<StaffRole>,
    pub is_active: Option<bool>,
    pub password_hash: Option<&'a str>,
}

fn email_conflict(e: sqlx::Error) -> ServiceError {
    if is_unique_violation(&e) {
        AppError::new(ErrorCode::StaffEmailExists).into()
    } else {
        e.into()
    }
}

pub async fn find_auth_by_email(pool: &PgPool, email: &str) -> Result<Option<StaffAuthRow>, BoxError> {
    let row = sqlx::query_as(
        r#"
        SELECT s.id, s.restaurant_id, s.name, s.email, s.password_hash, s.role, s.is_active, s.created_at
        FROM staff s
        JOIN restaurants r ON r.id = s.restaurant_id AND r.deleted_at IS NULL
        WHERE s.email = $1 AND s.deleted_at IS NULL
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list(pool: &PgPool, restaurant_id: i64) -> Result<Vec<StaffMember>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {STAFF_COLUMNS} FROM staff \
         WHERE restaurant_id = $1 AND deleted_at IS NULL ORDER BY created_at"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<Option<StaffMember>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {STAFF_COLUMNS} FROM staff \
         WHERE restaurant_id = $1 AND id = $2 AND deleted_at IS NULL"
    ))
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(
    pool: &PgPool,
    restaurant_id: i64,
    data: &NewStaff<'_>,
) -> ServiceResult<StaffMember> {
    let now = now_millis();
    let member = sqlx::query_as(&format!(
        "INSERT INTO staff (id, restaurant_id, name, email, password_hash, role, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {STAFF_COLUMNS}"
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.name.trim())
    .bind(data.email)
    .bind(data.password_hash)
    .bind(data.role)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(email_conflict)?;
    Ok(member)
}

pub async fn update(
    pool: &PgPool,
    restaurant_id: i64,
    id: i64,
    changes: &StaffChanges<'_>,
) -> Result<Option<StaffMember>, BoxError> {
    let row = sqlx::query_as(&format!(
        "UPDATE staff SET \
            name = COALESCE($1, name), \
            role = COALESCE($2, role), \
            is_active = COALESCE($3, is_active), \
            password_hash = COALESCE($4, password_hash), \
            updated_at = $5 \
         WHERE restaurant_id = $6 AND id = $7 AND deleted_at IS NULL \
         RETURNING {STAFF_COLUMNS}"
    ))
    .bind(changes.name.map(str::trim))
    .bind(changes.role)
    .bind(changes.is_active)
    .bind(changes.password_hash)
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn soft_delete(pool: &PgPool, restaurant_id: i64, id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE staff SET deleted_at = $1, is_active = FALSE, updated_at = $1
        WHERE restaurant_id = $2 AND id = $3 AND deleted_at IS NULL
        "#,
    )
    .bind(now_millis())
    .bind(restaurant_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Live accounts, the owner included
pub async fn count(pool: &PgPool, restaurant_id: i64) -> Result<i64, BoxError> {
    let n = sqlx::query_scalar(
        "SELECT COUNT(*) FROM staff WHERE restaurant_id = $1 AND deleted_at IS NULL",
    )
    .bind(restaurant_id)
    .fetch_one(pool)
    .await?;
    Ok(n)
}
