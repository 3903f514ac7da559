//! Staff accounts
//!
//! Owner protection: only the owner may edit the owner account, the owner
//! keeps its role and stays active, and it can never be deleted.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{QuotaResource, StaffCreate, StaffMember, StaffRole, StaffUpdate, normalize_email};

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, quota, require_manager};
use crate::db;
use crate::state::AppState;
use crate::util::hash_password;

fn not_found() -> AppError {
    AppError::new(ErrorCode::StaffNotFound)
}

fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}

/// Rules for editing `target` as `editor`
fn check_owner_update(editor: &StaffIdentity, target: &StaffMember, data: &StaffUpdate) -> AppResult<()> {
    if target.role != StaffRole::Owner {
        return Ok(());
    }
    if editor.staff_id != target.id {
        return Err(AppError::permission_denied("Only the owner can edit the owner account"));
    }
    if data.role.is_some_and(|r| r != StaffRole::Owner) {
        return Err(AppError::with_message(
            ErrorCode::InvalidRole,
            "The owner role cannot be changed",
        ));
    }
    if data.is_active == Some(false) {
        return Err(AppError::with_message(
            ErrorCode::InvalidRequest,
            "The owner account cannot be deactivated",
        ));
    }
    Ok(())
}

fn check_delete(editor: &StaffIdentity, target: &StaffMember) -> AppResult<()> {
    if editor.staff_id == target.id {
        return Err(AppError::new(ErrorCode::StaffCannotDeleteSelf));
    }
    if target.role == StaffRole::Owner {
        return Err(AppError::new(ErrorCode::CannotDeleteOwner));
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
) -> ApiResult<Vec<StaffMember>> {
    require_manager(&identity)?;
    let staff = db::staff::list(&state.pool, identity.restaurant_id)
        .await
        .map_err(internal)?;
    Ok(Json(staff))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Json(data): Json<StaffCreate>,
) -> ApiResult<StaffMember> {
    require_manager(&identity)?;
    data.validate()?;
    quota::enforce(&state.pool, identity.restaurant_id, QuotaResource::Staff).await?;

    let password_hash = hash(&data.password)?;
    let email = normalize_email(&data.email);
    let member = db::staff::create(
        &state.pool,
        identity.restaurant_id,
        &db::staff::NewStaff {
            name: data.name.trim(),
            email: &email,
            password_hash: &password_hash,
            role: data.role,
        },
    )
    .await?;

    tracing::info!(
        restaurant_id = identity.restaurant_id,
        staff_id = member.id,
        role = %member.role,
        created_by = identity.staff_id,
        "Staff member created"
    );
    Ok(Json(member))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<StaffUpdate>,
) -> ApiResult<StaffMember> {
    require_manager(&identity)?;
    data.validate()?;

    let target = db::staff::get(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    check_owner_update(&identity, &target, &data)?;

    let password_hash = data.password.as_deref().map(hash).transpose()?;
    let member = db::staff::update(
        &state.pool,
        identity.restaurant_id,
        id,
        &db::staff::StaffChanges {
            name: data.name.as_deref().map(str::trim),
            role: data.role,
            is_active: data.is_active,
            password_hash: password_hash.as_deref(),
        },
    )
    .await
    .map_err(internal)?
    .ok_or_else(not_found)?;
    Ok(Json(member))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<bool> {
    require_manager(&identity)?;
    let target = db::staff::get(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    check_delete(&identity, &target)?;

    if !db::staff::soft_delete(&state.pool, identity.restaurant_id, id)
        .await
        .map_err(internal)?
    {
        return Err(not_found());
    }
    tracing::info!(
        restaurant_id = identity.restaurant_id,
        staff_id = id,
        deleted_by = identity.staff_id,
        "Staff member deleted"
    );
    Ok(Json(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(staff_id: i64, role: StaffRole) -> StaffIdentity {
        StaffIdentity {
            staff_id,
            restaurant_id: 1,
            role,
        }
    }

    fn member(id: i64, role: StaffRole) -> StaffMember {
        StaffMember {
            id,
            name: "Asha".into(),
            email: "asha@example.com".into(),
            role,
            is_active: true,
            created_at: 0,
        }
    }

    #[test]
    fn test_manager_cannot_edit_owner() {
        let err = check_owner_update(
            &identity(2, StaffRole::Manager),
            &member(1, StaffRole::Owner),
            &StaffUpdate::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn test_owner_cannot_demote_or_deactivate_self() {
        let owner = identity(1, StaffRole::Owner);
        let target = member(1, StaffRole::Owner);

        let demote = StaffUpdate {
            role: Some(StaffRole::Manager),
            ..Default::default()
        };
        assert_eq!(
            check_owner_update(&owner, &target, &demote).unwrap_err().code,
            ErrorCode::InvalidRole
        );

        let deactivate = StaffUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(check_owner_update(&owner, &target, &deactivate).is_err());

        let rename = StaffUpdate {
            name: Some("Asha K".into()),
            ..Default::default()
        };
        assert!(check_owner_update(&owner, &target, &rename).is_ok());
    }

    #[test]
    fn test_edit_regular_staff() {
        let update = StaffUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(
            check_owner_update(&identity(2, StaffRole::Manager), &member(3, StaffRole::Waiter), &update)
                .is_ok()
        );
    }

    #[test]
    fn test_delete_rules() {
        let manager = identity(2, StaffRole::Manager);
        assert_eq!(
            check_delete(&manager, &member(2, StaffRole::Manager)).unwrap_err().code,
            ErrorCode::StaffCannotDeleteSelf
        );
        assert_eq!(
            check_delete(&manager, &member(1, StaffRole::Owner)).unwrap_err().code,
            ErrorCode::CannotDeleteOwner
        );
        assert!(check_delete(&manager, &member(3, StaffRole::Chef)).is_ok());
    }
}
