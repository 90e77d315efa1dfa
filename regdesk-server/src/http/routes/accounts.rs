//! Account endpoints
//!
//! `password_hash` is accepted as an opaque string and never returned.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::{Account, AccountChanges, AccountRepo, NewAccount};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{
    required_text, Email, Paginated, Pagination, PaginationParams, Role, Username,
    ValidationError,
};

const MAX_HASH_LEN: usize = 255;

/// Create account request
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub password_hash: String,
}

impl TryFrom<CreateAccountRequest> for NewAccount {
    type Error = ValidationError;

    fn try_from(req: CreateAccountRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            username: Username::new(&req.username)?,
            email: Email::new(&req.email)?,
            role: req.role,
            password_hash: required_text("password_hash", &req.password_hash, MAX_HASH_LEN)?,
        })
    }
}

/// Partial update; usernames are immutable
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

impl TryFrom<UpdateAccountRequest> for AccountChanges {
    type Error = ValidationError;

    fn try_from(req: UpdateAccountRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: req.email.as_deref().map(Email::new).transpose()?,
            role: req.role,
            password_hash: req
                .password_hash
                .as_deref()
                .map(|h| required_text("password_hash", h, MAX_HASH_LEN))
                .transpose()?,
        })
    }
}

/// `?role=&page=&per_page=`
#[derive(Debug, Default, Deserialize)]
pub struct AccountListParams {
    pub role: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/accounts
async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AccountListParams>,
) -> Result<Json<Paginated<Account>>, ApiError> {
    let role = params.role.as_deref().map(str::parse::<Role>).transpose()?;
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    Ok(Json(AccountRepo::new(&state.db).list(role, page).await?))
}

/// POST /api/accounts
async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = AccountRepo::new(&state.db)
        .create(NewAccount::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /api/accounts/{id}
async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(AccountRepo::new(&state.db).get(id).await?))
}

/// PUT /api/accounts/{id}
async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<Account>, ApiError> {
    let changes = AccountChanges::try_from(req)?;
    Ok(Json(AccountRepo::new(&state.db).update(id, changes).await?))
}

/// DELETE /api/accounts/{id}
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    AccountRepo::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Account routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/accounts", get(list_accounts).post(create_account))
        .route(
            "/api/accounts/{id}",
            get(get_account).put(update_account).delete(delete_account),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_student() {
        let req: CreateAccountRequest = serde_json::from_value(serde_json::json!({
            "username": "Ada.L",
            "email": "ada@uni.edu",
            "password_hash": "$argon2id$v=19$abc"
        }))
        .unwrap();
        let account = NewAccount::try_from(req).unwrap();
        assert_eq!(account.role, Role::Student);
        assert_eq!(account.username.as_str(), "ada.l");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed: Result<CreateAccountRequest, _> = serde_json::from_value(serde_json::json!({
            "username": "ada",
            "email": "ada@uni.edu",
            "role": "dean",
            "password_hash": "x"
        }));
        assert!(parsed.is_err());
        assert!("dean".parse::<Role>().is_err());
    }

    #[test]
    fn blank_hash_is_rejected() {
        let req = CreateAccountRequest {
            username: "ada".into(),
            email: "ada@uni.edu".into(),
            role: Role::Admin,
            password_hash: "  ".into(),
        };
        assert!(matches!(
            NewAccount::try_from(req),
            Err(ValidationError::Empty { field: "password_hash" })
        ));
    }
}
