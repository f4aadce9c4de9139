//! Transactions API endpoints

use api_types::transaction::{
    PaymentMethod, PaymentMethodKind, TransactionNew, TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn to_engine_method(method: PaymentMethod) -> engine::PaymentMethod {
    match method.kind {
        PaymentMethodKind::Asset => engine::PaymentMethod::Asset(method.id),
        PaymentMethodKind::Card => engine::PaymentMethod::Card(method.id),
    }
}

fn from_engine_method(method: engine::PaymentMethod) -> PaymentMethod {
    match method {
        engine::PaymentMethod::Asset(id) => PaymentMethod {
            kind: PaymentMethodKind::Asset,
            id,
        },
        engine::PaymentMethod::Card(id) => PaymentMethod {
            kind: PaymentMethodKind::Card,
            id,
        },
    }
}

pub(crate) fn transaction_view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        budget_id: tx.budget_id,
        category_id: tx.category_id,
        is_expense: tx.is_expense,
        is_current: tx.is_current,
        amount: tx.amount,
        title: tx.title,
        memo: tx.memo,
        date: tx.date.fixed_offset(),
        payment_method: tx.payment_method.map(from_engine_method),
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let transactions = state
        .engine
        .list_transactions(&user.username, budget_id)
        .await?;
    Ok(Json(transactions.into_iter().map(transaction_view).collect()))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let tx = state
        .engine
        .create_transaction(
            &user.username,
            budget_id,
            engine::TransactionNew {
                category_id: payload.category_id,
                is_current: payload.is_current,
                amount: payload.amount,
                title: payload.title,
                memo: payload.memo,
                date: payload.date.with_timezone(&Utc),
                payment_method: payload.payment_method.map(to_engine_method),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    if payload.clear_payment_method && payload.payment_method.is_some() {
        return Err(ServerError::Generic(
            "payment_method and clear_payment_method are exclusive".to_string(),
        ));
    }
    let payment_method = if payload.clear_payment_method {
        Some(None)
    } else {
        payload.payment_method.map(|m| Some(to_engine_method(m)))
    };

    let tx = state
        .engine
        .update_transaction(
            &user.username,
            id,
            engine::TransactionUpdate {
                category_id: payload.category_id,
                is_current: payload.is_current,
                amount: payload.amount,
                title: payload.title,
                memo: payload.memo,
                date: payload.date.map(|d| d.with_timezone(&Utc)),
                payment_method,
            },
        )
        .await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
