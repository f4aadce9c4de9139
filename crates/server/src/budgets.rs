//! Budget API endpoints
//!
//! `PUT /budgets/{id}/categories` replaces the whole category plan and moves
//! transactions of dropped categories to the defaults. `DELETE` on a single
//! budget category refuses while transactions still use it.

use api_types::budget::{
    BudgetCategoryView, BudgetDetail, BudgetFromBasic, BudgetNew, BudgetUpdate, BudgetView,
    CategoriesReplace, CategoryPlan, CategoryPlannedUpdate,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, transactions::transaction_view, user};

fn to_engine_plan(plan: CategoryPlan) -> engine::CategoryPlan {
    engine::CategoryPlan {
        category_id: plan.category_id,
        amount_planned: plan.amount_planned,
        is_default: plan.is_default,
    }
}

fn budget_view(budget: engine::Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        title: budget.title,
        start_date: budget.start_date,
        end_date: budget.end_date,
        expense_planned: budget.expense_planned,
        income_planned: budget.income_planned,
        revision: budget.revision,
        categories: budget
            .categories
            .into_iter()
            .map(|c| BudgetCategoryView {
                category_id: c.category_id,
                icon: c.icon,
                title: c.title,
                is_expense: c.is_expense,
                is_default: c.is_default,
                amount_planned: c.amount_planned,
                amount_scheduled: c.amount_scheduled,
                amount_current: c.amount_current,
            })
            .collect(),
    }
}

fn budget_detail(view: engine::BudgetView) -> BudgetDetail {
    BudgetDetail {
        budget: budget_view(view.budget),
        transactions: view.transactions.into_iter().map(transaction_view).collect(),
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BudgetView>>, ServerError> {
    let budgets = state.engine.list_budgets(&user.username).await?;
    Ok(Json(budgets.into_iter().map(budget_view).collect()))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let budget = state
        .engine
        .create_budget(
            &user.username,
            engine::BudgetNew {
                title: payload.title,
                start_date: payload.start_date,
                end_date: payload.end_date,
                expense_planned: payload.expense_planned,
                income_planned: payload.income_planned,
                categories: payload.categories.into_iter().map(to_engine_plan).collect(),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(budget_view(budget))))
}

/// Clone the basic budget, with its transactions, into a month
pub async fn create_from_basic(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetFromBasic>,
) -> Result<(StatusCode, Json<BudgetDetail>), ServerError> {
    let view = state
        .engine
        .create_budget_from_basic(
            &user.username,
            engine::BudgetFromBasic {
                year: payload.year,
                month: payload.month,
                title: payload.title,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(budget_detail(view))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BudgetDetail>, ServerError> {
    let view = state.engine.budget(&user.username, id).await?;
    Ok(Json(budget_detail(view)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state
        .engine
        .update_budget(
            &user.username,
            id,
            engine::BudgetUpdate {
                title: payload.title,
                start_date: payload.start_date,
                end_date: payload.end_date,
                expense_planned: payload.expense_planned,
                income_planned: payload.income_planned,
                categories: payload
                    .categories
                    .map(|plans| plans.into_iter().map(to_engine_plan).collect()),
            },
        )
        .await?;
    Ok(Json(budget_view(budget)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_category(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryPlan>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let budget = state
        .engine
        .add_budget_category(&user.username, id, to_engine_plan(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(budget_view(budget))))
}

pub async fn replace_categories(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoriesReplace>,
) -> Result<Json<BudgetView>, ServerError> {
    let plans = payload
        .categories
        .ok_or_else(|| engine::EngineError::field_required("categories"))?;
    let budget = state
        .engine
        .update_budget(
            &user.username,
            id,
            engine::BudgetUpdate {
                categories: Some(plans.into_iter().map(to_engine_plan).collect()),
                ..Default::default()
            },
        )
        .await?;
    Ok(Json(budget_view(budget)))
}

pub async fn update_category(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((id, category_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CategoryPlannedUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state
        .engine
        .update_budget_category(&user.username, id, category_id, payload.amount_planned)
        .await?;
    Ok(Json(budget_view(budget)))
}

pub async fn remove_category(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state
        .engine
        .remove_budget_category(&user.username, id, category_id)
        .await?;
    Ok(Json(budget_view(budget)))
}
