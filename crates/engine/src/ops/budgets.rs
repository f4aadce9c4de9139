use chrono::NaiveDate;
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Budget, BudgetCategory, Category, CategoryPlan, EngineError, MovedAmounts, ResultEngine,
    Transaction, budget_categories,
    budgets::{self, validate_period},
    categories,
    error::Resource,
    reconcile::{Axis, checked_add},
    transactions, users,
    util::{month_bounds, move_into_month, normalize_title_display},
};

use super::{Engine, with_tx};

/// Input of [`Engine::create_budget`].
#[derive(Clone, Debug)]
pub struct BudgetNew {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub expense_planned: i64,
    pub income_planned: i64,
    /// Non-default categories with their planned amounts.
    pub categories: Vec<CategoryPlan>,
}

/// Input of [`Engine::create_budget_from_basic`].
#[derive(Clone, Debug)]
pub struct BudgetFromBasic {
    pub year: i32,
    pub month: u32,
    pub title: Option<String>,
}

/// Input of [`Engine::update_budget`]. `None` keeps the current value.
///
/// When both `categories` and planned totals are given, the categories are
/// applied first and the totals second.
#[derive(Clone, Debug, Default)]
pub struct BudgetUpdate {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expense_planned: Option<i64>,
    pub income_planned: Option<i64>,
    pub categories: Option<Vec<CategoryPlan>>,
}

/// A budget with its transactions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetView {
    pub budget: Budget,
    pub transactions: Vec<Transaction>,
}

impl Engine {
    /// Load a budget of `user_id` with its categories joined from the
    /// registry.
    pub(super) async fn load_budget(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        budget_id: Uuid,
    ) -> ResultEngine<Budget> {
        let model = self
            .require_budget_model(db, user_id, budget_id)
            .await?;

        let rows = budget_categories::Entity::find()
            .filter(budget_categories::Column::BudgetId.eq(budget_id))
            .order_by_asc(budget_categories::Column::Position)
            .find_also_related(categories::Entity)
            .all(db)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for (row, category) in rows {
            let category = category.ok_or_else(|| {
                EngineError::Inconsistent(format!(
                    "budget {budget_id} references missing category {}",
                    row.category_id
                ))
            })?;
            entries.push(BudgetCategory {
                category_id: category.id,
                icon: category.icon,
                title: category.title,
                is_expense: category.is_expense,
                is_default: category.is_default,
                amount_planned: row.amount_planned,
                amount_scheduled: row.amount_scheduled,
                amount_current: row.amount_current,
            });
        }

        Ok(Budget::from_model(model, entries))
    }

    async fn insert_budget_categories(
        &self,
        db: &DatabaseTransaction,
        budget: &Budget,
    ) -> ResultEngine<()> {
        let rows = budget
            .categories
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                budget_categories::ActiveModel::from_entry(budget.id, position, entry)
            })
            .collect::<ResultEngine<Vec<_>>>()?;
        budget_categories::Entity::insert_many(rows).exec(db).await?;
        Ok(())
    }

    async fn insert_budget(&self, db: &DatabaseTransaction, budget: &Budget) -> ResultEngine<()> {
        budget.check_invariants()?;
        budgets::ActiveModel::from(budget).insert(db).await?;
        self.insert_budget_categories(db, budget).await
    }

    /// Write back a loaded budget. The row is only updated if nobody else
    /// bumped its revision since it was loaded.
    pub(super) async fn persist_budget(
        &self,
        db: &DatabaseTransaction,
        budget: &mut Budget,
    ) -> ResultEngine<()> {
        budget.check_invariants()?;

        let result = budgets::Entity::update_many()
            .col_expr(budgets::Column::Title, Expr::value(budget.title.clone()))
            .col_expr(budgets::Column::StartDate, Expr::value(budget.start_date))
            .col_expr(budgets::Column::EndDate, Expr::value(budget.end_date))
            .col_expr(
                budgets::Column::ExpensePlanned,
                Expr::value(budget.expense_planned),
            )
            .col_expr(
                budgets::Column::IncomePlanned,
                Expr::value(budget.income_planned),
            )
            .col_expr(
                budgets::Column::Revision,
                Expr::col(budgets::Column::Revision).add(1),
            )
            .filter(budgets::Column::Id.eq(budget.id))
            .filter(budgets::Column::Revision.eq(budget.revision))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(
                "budget was modified concurrently".to_string(),
            ));
        }
        budget.revision += 1;

        budget_categories::Entity::delete_many()
            .filter(budget_categories::Column::BudgetId.eq(budget.id))
            .exec(db)
            .await?;
        self.insert_budget_categories(db, budget).await
    }

    /// Point every transaction of `removed` at the default category of its
    /// axis with a single update, and credit the default with the moved
    /// current/scheduled amounts.
    pub(super) async fn reassign_transactions_on_removal(
        &self,
        db: &DatabaseTransaction,
        budget: &mut Budget,
        removed: &BudgetCategory,
    ) -> ResultEngine<MovedAmounts> {
        let axis = removed.axis();
        let default_id = budget.default_category(axis)?.category_id;

        let moving = transactions::Entity::find()
            .filter(transactions::Column::BudgetId.eq(budget.id))
            .filter(transactions::Column::CategoryId.eq(removed.category_id))
            .all(db)
            .await?;

        let mut moved = MovedAmounts::default();
        for tx in &moving {
            if tx.is_current {
                moved.current = checked_add(moved.current, tx.amount)?;
            } else {
                moved.scheduled = checked_add(moved.scheduled, tx.amount)?;
            }
        }
        moved.transactions = moving.len() as u64;

        if moved.transactions > 0 {
            transactions::Entity::update_many()
                .col_expr(transactions::Column::CategoryId, Expr::value(default_id))
                .filter(transactions::Column::BudgetId.eq(budget.id))
                .filter(transactions::Column::CategoryId.eq(removed.category_id))
                .exec(db)
                .await?;
        }
        budget.absorb_moved(axis, moved)?;

        tracing::info!(
            budget = %budget.id,
            category = %removed.category_id,
            axis = axis.as_str(),
            moved = moved.transactions,
            "reassigned transactions to default category"
        );
        Ok(moved)
    }

    async fn budget_transactions(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
    ) -> ResultEngine<Vec<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::BudgetId.eq(budget_id))
            .order_by_asc(transactions::Column::Date)
            .all(db)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    pub async fn create_budget(&self, user_id: &str, input: BudgetNew) -> ResultEngine<Budget> {
        let title = normalize_title_display(&input.title, "title")?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let registry = self.registry(&db_tx, user_id).await?;

            let mut entries = Vec::with_capacity(input.categories.len());
            for plan in &input.categories {
                if plan.is_default {
                    return Err(EngineError::ForbiddenMutation(
                        "you can't set default category".to_string(),
                    ));
                }
                let planned = plan.planned()?;
                let category = registry
                    .get(&plan.category_id)
                    .ok_or_else(|| EngineError::not_found(Resource::Category, plan.category_id))?;
                entries.push(BudgetCategory::from_category(category, planned));
            }
            let defaults: Vec<_> = registry.into_values().filter(|c| c.is_default).collect();

            let budget = Budget::new(
                user_id,
                title,
                input.start_date,
                input.end_date,
                input.expense_planned,
                input.income_planned,
                entries,
                &defaults,
            )?;
            self.insert_budget(&db_tx, &budget).await?;

            tracing::info!(user = user_id, budget = %budget.id, "created budget");
            Ok(budget)
        })
    }

    /// Clone the user's basic budget into a calendar month. Transactions are
    /// copied with their day of month clamped into the target month; the
    /// copies carry no payment method, so no asset balance moves.
    pub async fn create_budget_from_basic(
        &self,
        user_id: &str,
        input: BudgetFromBasic,
    ) -> ResultEngine<BudgetView> {
        let (start_date, end_date) = month_bounds(input.year, input.month)?;
        let title = input
            .title
            .as_deref()
            .map(|t| normalize_title_display(t, "title"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let basic_id = user
                .basic_budget_id
                .ok_or_else(|| EngineError::not_found(Resource::Budget, "basic"))?;
            let basic = self.load_budget(&db_tx, user_id, basic_id).await?;

            let title = title.unwrap_or_else(|| basic.title.clone());
            let budget = basic.clone_for_period(title, start_date, end_date)?;
            self.insert_budget(&db_tx, &budget).await?;

            let mut copies = Vec::new();
            for tx in self.budget_transactions(&db_tx, basic.id).await? {
                let copy = Transaction {
                    id: Uuid::new_v4(),
                    budget_id: budget.id,
                    date: move_into_month(tx.date, input.year, input.month)?,
                    payment_method: None,
                    moved_asset_id: None,
                    ..tx
                };
                transactions::ActiveModel::from(&copy).insert(&db_tx).await?;
                copies.push(copy);
            }

            tracing::info!(
                user = user_id,
                basic = %basic.id,
                budget = %budget.id,
                transactions = copies.len(),
                "cloned basic budget"
            );
            Ok(BudgetView {
                budget,
                transactions: copies,
            })
        })
    }

    pub async fn budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<BudgetView> {
        with_tx!(self, |db_tx| {
            let budget = self.load_budget(&db_tx, user_id, budget_id).await?;
            let transactions = self.budget_transactions(&db_tx, budget_id).await?;
            Ok(BudgetView {
                budget,
                transactions,
            })
        })
    }

    /// Budgets of the user, most recent period first.
    pub async fn list_budgets(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let ids: Vec<Uuid> = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(budgets::Column::StartDate)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();

            let mut out = Vec::with_capacity(ids.len());
            for id in ids {
                out.push(self.load_budget(&db_tx, user_id, id).await?);
            }
            Ok(out)
        })
    }

    pub async fn update_budget(
        &self,
        user_id: &str,
        budget_id: Uuid,
        input: BudgetUpdate,
    ) -> ResultEngine<Budget> {
        let title = input
            .title
            .as_deref()
            .map(|t| normalize_title_display(t, "title"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let mut budget = self.load_budget(&db_tx, user_id, budget_id).await?;

            if let Some(title) = title {
                budget.title = title;
            }
            let start_date = input.start_date.unwrap_or(budget.start_date);
            let end_date = input.end_date.unwrap_or(budget.end_date);
            validate_period(start_date, end_date)?;
            budget.start_date = start_date;
            budget.end_date = end_date;

            if let Some(plans) = &input.categories {
                let registry = self.registry(&db_tx, user_id).await?;
                let removed = budget.apply_category_plan(plans, &registry)?;
                for entry in &removed {
                    self.reassign_transactions_on_removal(&db_tx, &mut budget, entry)
                        .await?;
                }
            }

            for (axis, total) in [
                (Axis::Expense, input.expense_planned),
                (Axis::Income, input.income_planned),
            ] {
                if let Some(total) = total {
                    budget.reconcile_default_on_total_change(axis, total)?;
                }
            }

            self.persist_budget(&db_tx, &mut budget).await?;
            Ok(budget)
        })
    }

    /// Delete a budget with its categories and transactions.
    pub async fn delete_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_budget_model(&db_tx, user_id, budget_id)
                .await?;

            let removed = transactions::Entity::delete_many()
                .filter(transactions::Column::BudgetId.eq(budget_id))
                .exec(&db_tx)
                .await?;
            budget_categories::Entity::delete_many()
                .filter(budget_categories::Column::BudgetId.eq(budget_id))
                .exec(&db_tx)
                .await?;
            budgets::Entity::delete_by_id(budget_id)
                .exec(&db_tx)
                .await?;

            users::Entity::update_many()
                .col_expr(
                    users::Column::BasicBudgetId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(users::Column::Username.eq(user_id.to_string()))
                .filter(users::Column::BasicBudgetId.eq(budget_id))
                .exec(&db_tx)
                .await?;

            tracing::info!(
                user = user_id,
                budget = %budget_id,
                transactions = removed.rows_affected,
                "deleted budget"
            );
            Ok(())
        })
    }

    /// Add one registry category to a budget.
    pub async fn add_budget_category(
        &self,
        user_id: &str,
        budget_id: Uuid,
        plan: CategoryPlan,
    ) -> ResultEngine<Budget> {
        if plan.is_default {
            return Err(EngineError::ForbiddenMutation(
                "you can't set default category".to_string(),
            ));
        }
        let planned = plan.planned()?;

        with_tx!(self, |db_tx| {
            let mut budget = self.load_budget(&db_tx, user_id, budget_id).await?;
            let category = Category::from(
                self.require_category(&db_tx, user_id, plan.category_id)
                    .await?,
            );
            let entry = BudgetCategory::from_category(&category, planned);

            budget.add_category(entry)?;
            self.persist_budget(&db_tx, &mut budget).await?;
            Ok(budget)
        })
    }

    /// Set the planned amount of one budget category.
    pub async fn update_budget_category(
        &self,
        user_id: &str,
        budget_id: Uuid,
        category_id: Uuid,
        amount_planned: Option<i64>,
    ) -> ResultEngine<Budget> {
        let amount_planned =
            amount_planned.ok_or_else(|| EngineError::field_required("amount_planned"))?;

        with_tx!(self, |db_tx| {
            let mut budget = self.load_budget(&db_tx, user_id, budget_id).await?;
            budget.set_category_planned(category_id, amount_planned)?;
            self.persist_budget(&db_tx, &mut budget).await?;
            Ok(budget)
        })
    }

    /// Remove a category from a budget. Refused while transactions still
    /// reference it; use [`Engine::update_budget`] with a category plan to
    /// move them to the default category instead.
    pub async fn remove_budget_category(
        &self,
        user_id: &str,
        budget_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let mut budget = self.load_budget(&db_tx, user_id, budget_id).await?;
            budget.remove_category(category_id)?;

            let in_use = transactions::Entity::find()
                .filter(transactions::Column::BudgetId.eq(budget_id))
                .filter(transactions::Column::CategoryId.eq(category_id))
                .count(&db_tx)
                .await?;
            if in_use > 0 {
                return Err(EngineError::Conflict(format!(
                    "category {category_id} is used by {in_use} transactions"
                )));
            }

            self.persist_budget(&db_tx, &mut budget).await?;
            Ok(budget)
        })
    }
}

#[cfg(test)]
mod tests {
    use migration::MigratorTrait;
    use sea_orm::{Database, DatabaseConnection};

    use super::*;

    async fn engine_with_budget() -> (Engine, DatabaseConnection, Budget) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        engine.register_user("alice", "password").await.unwrap();
        let budget = engine
            .create_budget(
                "alice",
                BudgetNew {
                    title: "April".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2026, 4, 30).unwrap(),
                    expense_planned: 500,
                    income_planned: 0,
                    categories: Vec::new(),
                },
            )
            .await
            .unwrap();
        (engine, db, budget)
    }

    #[tokio::test]
    async fn persist_refuses_a_stale_revision() {
        let (engine, db, budget) = engine_with_budget().await;

        let db_tx = db.begin().await.unwrap();
        let mut loaded = engine
            .load_budget(&db_tx, "alice", budget.id)
            .await
            .unwrap();
        budgets::Entity::update_many()
            .col_expr(
                budgets::Column::Revision,
                Expr::col(budgets::Column::Revision).add(1),
            )
            .filter(budgets::Column::Id.eq(budget.id))
            .exec(&db_tx)
            .await
            .unwrap();

        loaded.title = "Stale".to_string();
        let err = engine
            .persist_budget(&db_tx, &mut loaded)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Conflict("budget was modified concurrently".to_string())
        );
        assert_eq!(loaded.revision, 0);
    }

    #[tokio::test]
    async fn persist_bumps_a_current_revision() {
        let (engine, db, budget) = engine_with_budget().await;

        let db_tx = db.begin().await.unwrap();
        let mut loaded = engine
            .load_budget(&db_tx, "alice", budget.id)
            .await
            .unwrap();
        engine.persist_budget(&db_tx, &mut loaded).await.unwrap();
        db_tx.commit().await.unwrap();

        assert_eq!(loaded.revision, 1);
        let stored = engine.budget("alice", budget.id).await.unwrap().budget;
        assert_eq!(stored.revision, 1);
    }
}
