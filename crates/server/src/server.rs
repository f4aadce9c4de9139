use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{assets, budgets, categories, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to load user: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let authenticated = Router::new()
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            patch(categories::update).delete(categories::remove),
        )
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/basic", post(budgets::create_from_basic))
        .route(
            "/budgets/{id}",
            get(budgets::get)
                .patch(budgets::update)
                .delete(budgets::remove),
        )
        .route(
            "/budgets/{id}/categories",
            post(budgets::add_category).put(budgets::replace_categories),
        )
        .route(
            "/budgets/{id}/categories/{category_id}",
            patch(budgets::update_category).delete(budgets::remove_category),
        )
        .route(
            "/budgets/{id}/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transactions/{id}",
            patch(transactions::update).delete(transactions::remove),
        )
        .route("/assets", get(assets::list).post(assets::create))
        .route("/cards", get(assets::list_cards).post(assets::create_card))
        .route(
            "/cards/{id}",
            patch(assets::update_card).delete(assets::delete_card),
        )
        .route("/cards/{id}/link", put(assets::link_card))
        .route("/cards/{id}/transactions", get(assets::card_transactions))
        .route("/user/basic-budget", put(user::set_basic_budget))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/signup", post(user::signup))
        .merge(authenticated)
        .with_state(state)
}

/// The full HTTP application, ready to be served.
pub fn app(engine: Engine, db: DatabaseConnection) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

pub async fn run(engine: Engine, db: DatabaseConnection, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine, db)).await
}
