//! Category registry endpoints

use api_types::category::{CategoryNew, CategoryUpdate, CategoryView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn category_view(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        icon: category.icon,
        title: category.title,
        is_expense: category.is_expense,
        is_default: category.is_default,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = state.engine.list_categories(&user.username).await?;
    Ok(Json(categories.into_iter().map(category_view).collect()))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(
            &user.username,
            engine::CategoryNew {
                icon: payload.icon,
                title: payload.title,
                is_expense: payload.is_expense,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(category_view(category))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .update_category(
            &user.username,
            id,
            engine::CategoryUpdate {
                icon: payload.icon,
                title: payload.title,
            },
        )
        .await?;
    Ok(Json(category_view(category)))
}

/// Delete a category; its transactions move to the default category
pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
