//! Assets and cards endpoints

use api_types::{
    asset::{AssetNew, AssetView, CardLink, CardNew, CardUpdate, CardView},
    transaction::TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, transactions::transaction_view, user};

fn asset_view(asset: engine::Asset) -> AssetView {
    AssetView {
        id: asset.id,
        icon: asset.icon,
        title: asset.title,
        amount: asset.amount,
    }
}

fn card_view(card: engine::Card) -> CardView {
    CardView {
        id: card.id,
        icon: card.icon,
        title: card.title,
        detail: card.detail,
        linked_asset_id: card.linked_asset_id,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<AssetView>>, ServerError> {
    let assets = state.engine.list_assets(&user.username).await?;
    Ok(Json(assets.into_iter().map(asset_view).collect()))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AssetNew>,
) -> Result<(StatusCode, Json<AssetView>), ServerError> {
    let asset = state
        .engine
        .create_asset(
            &user.username,
            engine::AssetNew {
                icon: payload.icon,
                title: payload.title,
                amount: payload.amount,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(asset_view(asset))))
}

pub async fn list_cards(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CardView>>, ServerError> {
    let cards = state.engine.list_cards(&user.username).await?;
    Ok(Json(cards.into_iter().map(card_view).collect()))
}

pub async fn create_card(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CardNew>,
) -> Result<(StatusCode, Json<CardView>), ServerError> {
    let card = state
        .engine
        .create_card(
            &user.username,
            engine::CardNew {
                icon: payload.icon,
                title: payload.title,
                detail: payload.detail,
                linked_asset_id: payload.linked_asset_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(card_view(card))))
}

/// Link a card to an asset (or unlink it with `null`)
pub async fn link_card(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CardLink>,
) -> Result<Json<CardView>, ServerError> {
    let card = state
        .engine
        .link_card(&user.username, id, payload.linked_asset_id)
        .await?;
    Ok(Json(card_view(card)))
}

pub async fn update_card(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CardUpdate>,
) -> Result<Json<CardView>, ServerError> {
    let card = state
        .engine
        .update_card(
            &user.username,
            id,
            engine::CardUpdate {
                icon: payload.icon,
                title: payload.title,
                detail: payload.detail,
            },
        )
        .await?;
    Ok(Json(card_view(card)))
}

/// Delete a card; transactions paid with it keep their amounts and lose the
/// payment method
pub async fn delete_card(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_card(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn card_transactions(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let transactions = state
        .engine
        .list_card_transactions(&user.username, id)
        .await?;
    Ok(Json(transactions.into_iter().map(transaction_view).collect()))
}
