//! Users: sign-up, authentication lookup and basic budget selection.

use api_types::user::{BasicBudget, SignUp};
use axum::{Extension, Json, extract::State, http::StatusCode};
use sea_orm::entity::prelude::*;

use crate::{ServerError, server::ServerState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub basic_budget_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Register a new user with its default categories
pub async fn signup(
    State(state): State<ServerState>,
    Json(payload): Json<SignUp>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .register_user(&payload.username, &payload.password)
        .await?;
    Ok(StatusCode::CREATED)
}

/// Choose the budget cloned by `POST /budgets/basic`
pub async fn set_basic_budget(
    Extension(user): Extension<Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BasicBudget>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .set_basic_budget(&user.username, payload.budget_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
