use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{app, run, run_with_listener};

mod assets;
mod budgets;
mod categories;
mod server;
mod transactions;
mod user;

pub mod types {
    pub mod user {
        pub use api_types::user::{BasicBudget, SignUp};
    }

    pub mod category {
        pub use api_types::category::{CategoryNew, CategoryUpdate, CategoryView};
    }

    pub mod budget {
        pub use api_types::budget::{
            BudgetCategoryView, BudgetDetail, BudgetFromBasic, BudgetNew, BudgetUpdate,
            BudgetView, CategoriesReplace, CategoryPlan, CategoryPlannedUpdate,
        };
    }

    pub mod transaction {
        pub use api_types::transaction::{
            PaymentMethod, PaymentMethodKind, TransactionNew, TransactionUpdate, TransactionView,
        };
    }

    pub mod asset {
        pub use api_types::asset::{AssetNew, AssetView, CardLink, CardNew, CardUpdate, CardView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::FieldRequired(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::ForbiddenMutation(_) => StatusCode::FORBIDDEN,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidDate(_)
        | EngineError::InvalidName(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Inconsistent(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Inconsistent(msg) => {
            tracing::error!("inconsistent budget: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
