//! Restaurant (tenant) database operations

use shared::error::{AppError, ErrorCode};
use shared::models::{Restaurant, RestaurantUpdate, StaffMember, StaffRole, slugify};
use shared::util::{now_millis, random_token, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::{ServiceResult, is_unique_violation};

pub struct NewRestaurant<'a> {
    pub name: &'a str,
    pub owner_name: &'a str,
    pub owner_email: &'a str,
    pub password_hash: &'a str,
}

const SLUG_ATTEMPTS: usize = 5;

/// Create a restaurant together with its owner account
pub async fn create_with_owner(
    pool: &PgPool,
    data: &NewRestaurant<'_>,
) -> ServiceResult<(Restaurant, StaffMember)> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let email_taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM staff WHERE email = $1 AND deleted_at IS NULL)",
    )
    .bind(data.owner_email)
    .fetch_one(&mut *tx)
    .await?;
    if email_taken {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered).into());
    }

    let base = slugify(data.name);
    let mut slug = base.clone();
    for _ in 0..SLUG_ATTEMPTS {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM restaurants WHERE slug = $1)")
                .bind(&slug)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            break;
        }
        slug = format!("{base}-{}", random_token(5).to_lowercase());
    }

    let restaurant: Restaurant = sqlx::query_as(
        r#"
        INSERT INTO restaurants (id, name, slug, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING id, name, slug, address, phone, currency, tax_rate, logo_url, created_at
        "#,
    )
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&slug)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let owner = sqlx::query_as::<_, StaffMember>(
        r#"
        INSERT INTO staff (id, restaurant_id, name, email, password_hash, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING id, name, email, role, is_active, created_at
        "#,
    )
    .bind(snowflake_id())
    .bind(restaurant.id)
    .bind(data.owner_name.trim())
    .bind(data.owner_email)
    .bind(data.password_hash)
    .bind(StaffRole::Owner)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| -> crate::error::ServiceError {
        if is_unique_violation(&e) {
            AppError::new(ErrorCode::EmailAlreadyRegistered).into()
        } else {
            e.into()
        }
    })?;

    tx.commit().await?;
    Ok((restaurant, owner))
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Restaurant>, BoxError> {
    let row = sqlx::query_as(
        r#"
        SELECT id, name, slug, address, phone, currency, tax_rate, logo_url, created_at
        FROM restaurants
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &RestaurantUpdate,
) -> Result<Option<Restaurant>, BoxError> {
    let row = sqlx::query_as(
        r#"
        UPDATE restaurants SET
            name = COALESCE($1, name),
            address = COALESCE($2, address),
            phone = COALESCE($3, phone),
            currency = COALESCE($4, currency),
            tax_rate = COALESCE($5, tax_rate),
            logo_url = COALESCE($6, logo_url),
            updated_at = $7
        WHERE id = $8 AND deleted_at IS NULL
        RETURNING id, name, slug, address, phone, currency, tax_rate, logo_url, created_at
        "#,
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.address)
    .bind(&data.phone)
    .bind(&data.currency)
    .bind(data.tax_rate)
    .bind(&data.logo_url)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn set_logo(pool: &PgPool, id: i64, logo_url: &str) -> Result<(), BoxError> {
    sqlx::query("UPDATE restaurants SET logo_url = $1, updated_at = $2 WHERE id = $3")
        .bind(logo_url)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
