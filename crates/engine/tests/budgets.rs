use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::Database;

use engine::{
    Axis, BudgetFromBasic, BudgetNew, BudgetUpdate, Category, CategoryNew, CategoryPlan, Engine,
    EngineError, Resource, TransactionNew,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine.register_user("alice", "password").await.unwrap();
    engine
}

async fn category(engine: &Engine, title: &str, is_expense: bool) -> Category {
    engine
        .create_category(
            "alice",
            CategoryNew {
                icon: String::new(),
                title: title.to_string(),
                is_expense,
            },
        )
        .await
        .unwrap()
}

fn plan(category: &Category, amount: i64) -> CategoryPlan {
    CategoryPlan {
        category_id: category.id,
        amount_planned: Some(amount),
        is_default: false,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn march(categories: Vec<CategoryPlan>) -> BudgetNew {
    BudgetNew {
        title: "March".to_string(),
        start_date: date(2026, 3, 1),
        end_date: date(2026, 3, 31),
        expense_planned: 1000,
        income_planned: 3000,
        categories,
    }
}

fn spend(category: &Category, amount: i64, is_current: bool) -> TransactionNew {
    TransactionNew {
        category_id: category.id,
        is_current,
        amount: Some(amount),
        title: "Groceries".to_string(),
        memo: None,
        date: Utc.with_ymd_and_hms(2026, 3, 12, 9, 0, 0).unwrap(),
        payment_method: None,
    }
}

#[tokio::test]
async fn register_creates_one_default_per_axis() {
    let engine = engine().await;

    let categories = engine.list_categories("alice").await.unwrap();
    assert_eq!(categories.len(), 2);
    assert!(categories.iter().all(|c| c.is_default));
    assert!(categories.iter().any(|c| c.axis() == Axis::Expense));
    assert!(categories.iter().any(|c| c.axis() == Axis::Income));

    let err = engine.register_user("alice", "other").await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn usernames_with_surrounding_whitespace_are_rejected() {
    let engine = engine().await;

    let err = engine.register_user(" bob", "password").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));
    let err = engine.register_user("bob\t", "password").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));
    let err = engine.register_user("   ", "password").await.unwrap_err();
    assert_eq!(err, EngineError::field_required("username"));

    engine.register_user("bob", "password").await.unwrap();
}

#[tokio::test]
async fn create_budget_gives_remainder_to_defaults() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;
    let salary = category(&engine, "Salary", false).await;

    let budget = engine
        .create_budget("alice", march(vec![plan(&food, 200), plan(&salary, 2500)]))
        .await
        .unwrap();

    assert_eq!(budget.categories.len(), 4);
    assert_eq!(
        budget.default_category(Axis::Expense).unwrap().amount_planned,
        800
    );
    assert_eq!(
        budget.default_category(Axis::Income).unwrap().amount_planned,
        500
    );

    let loaded = engine.budget("alice", budget.id).await.unwrap();
    assert_eq!(loaded.budget, budget);
    assert!(loaded.transactions.is_empty());
}

#[tokio::test]
async fn create_budget_rejects_bad_input() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;

    let mut inverted = march(vec![]);
    inverted.end_date = date(2026, 2, 1);
    let err = engine.create_budget("alice", inverted).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));

    let missing = CategoryPlan {
        amount_planned: None,
        ..plan(&food, 0)
    };
    let err = engine
        .create_budget("alice", march(vec![missing]))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::field_required("amount_planned"));

    let categories = engine.list_categories("alice").await.unwrap();
    let default = categories.iter().find(|c| c.is_default).unwrap();
    let err = engine
        .create_budget("alice", march(vec![plan(default, 10)]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ForbiddenMutation(_)));

    assert!(engine.list_budgets("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn total_change_lands_on_default_and_bumps_revision() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;
    let budget = engine
        .create_budget("alice", march(vec![plan(&food, 200)]))
        .await
        .unwrap();
    assert_eq!(budget.revision, 0);

    let budget = engine
        .update_budget(
            "alice",
            budget.id,
            BudgetUpdate {
                expense_planned: Some(1500),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(budget.expense_planned, 1500);
    assert_eq!(
        budget.default_category(Axis::Expense).unwrap().amount_planned,
        1300
    );
    assert_eq!(budget.revision, 1);
}

#[tokio::test]
async fn category_plan_change_is_balanced_by_default() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;
    let budget = engine
        .create_budget("alice", march(vec![plan(&food, 200)]))
        .await
        .unwrap();

    let budget = engine
        .update_budget_category("alice", budget.id, food.id, Some(350))
        .await
        .unwrap();
    assert_eq!(budget.category(food.id).unwrap().amount_planned, 350);
    assert_eq!(
        budget.default_category(Axis::Expense).unwrap().amount_planned,
        650
    );

    let err = engine
        .update_budget_category("alice", budget.id, food.id, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::field_required("amount_planned"));

    let default_id = budget.default_category(Axis::Expense).unwrap().category_id;
    let err = engine
        .update_budget_category("alice", budget.id, default_id, Some(10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ForbiddenMutation(_)));
}

#[tokio::test]
async fn add_then_remove_budget_category() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;
    let budget = engine.create_budget("alice", march(vec![])).await.unwrap();

    let budget = engine
        .add_budget_category("alice", budget.id, plan(&food, 300))
        .await
        .unwrap();
    assert_eq!(
        budget.default_category(Axis::Expense).unwrap().amount_planned,
        700
    );

    let err = engine
        .add_budget_category("alice", budget.id, plan(&food, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let budget = engine
        .remove_budget_category("alice", budget.id, food.id)
        .await
        .unwrap();
    assert!(budget.category(food.id).is_none());
    assert_eq!(
        budget.default_category(Axis::Expense).unwrap().amount_planned,
        1000
    );
}

#[tokio::test]
async fn remove_budget_category_refuses_while_in_use() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;
    let budget = engine
        .create_budget("alice", march(vec![plan(&food, 200)]))
        .await
        .unwrap();
    engine
        .create_transaction("alice", budget.id, spend(&food, 40, true))
        .await
        .unwrap();

    let err = engine
        .remove_budget_category("alice", budget.id, food.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let unchanged = engine.budget("alice", budget.id).await.unwrap().budget;
    assert_eq!(unchanged.category(food.id).unwrap().amount_current, 40);
}

#[tokio::test]
async fn replacing_categories_moves_transactions_to_default() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;
    let rent = category(&engine, "Rent", true).await;
    let budget = engine
        .create_budget("alice", march(vec![plan(&food, 200), plan(&rent, 500)]))
        .await
        .unwrap();
    assert_eq!(budget.categories.len(), 4);
    engine
        .create_transaction("alice", budget.id, spend(&food, 50, true))
        .await
        .unwrap();
    engine
        .create_transaction("alice", budget.id, spend(&food, 30, false))
        .await
        .unwrap();

    let budget = engine
        .update_budget(
            "alice",
            budget.id,
            BudgetUpdate {
                categories: Some(vec![plan(&rent, 600)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(budget.categories.len(), 3);
    assert!(budget.category(food.id).is_none());
    let default = budget.default_category(Axis::Expense).unwrap();
    assert_eq!(default.amount_planned, 400);
    assert_eq!(default.amount_current, 50);
    assert_eq!(default.amount_scheduled, 30);

    let transactions = engine.list_transactions("alice", budget.id).await.unwrap();
    assert_eq!(transactions.len(), 2);
    assert!(
        transactions
            .iter()
            .all(|tx| tx.category_id == default.category_id)
    );
}

#[tokio::test]
async fn overflowing_reassignment_rolls_back() {
    let engine = engine().await;
    let rent = category(&engine, "Rent", true).await;
    let food = category(&engine, "Food", true).await;
    let budget = engine
        .create_budget("alice", march(vec![plan(&rent, 200), plan(&food, 300)]))
        .await
        .unwrap();
    engine
        .create_transaction("alice", budget.id, spend(&rent, i64::MAX - 10, true))
        .await
        .unwrap();
    engine
        .create_transaction("alice", budget.id, spend(&food, 100, true))
        .await
        .unwrap();
    let before = engine.budget("alice", budget.id).await.unwrap();

    let err = engine
        .update_budget(
            "alice",
            budget.id,
            BudgetUpdate {
                categories: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let after = engine.budget("alice", budget.id).await.unwrap();
    assert_eq!(after.budget.revision, before.budget.revision);
    assert_eq!(after.budget.categories, before.budget.categories);
    assert_eq!(after.transactions, before.transactions);

    let mut category_ids: Vec<Uuid> = after.transactions.iter().map(|tx| tx.category_id).collect();
    category_ids.sort();
    let mut expected = vec![rent.id, food.id];
    expected.sort();
    assert_eq!(category_ids, expected);
}

#[tokio::test]
async fn categories_apply_before_new_totals() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;
    let budget = engine
        .create_budget("alice", march(vec![plan(&food, 200)]))
        .await
        .unwrap();

    let budget = engine
        .update_budget(
            "alice",
            budget.id,
            BudgetUpdate {
                expense_planned: Some(2000),
                categories: Some(vec![plan(&food, 900)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(
        budget.default_category(Axis::Expense).unwrap().amount_planned,
        1100
    );
}

#[tokio::test]
async fn clone_from_basic_moves_transactions_into_month() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;
    let basic = engine
        .create_budget(
            "alice",
            BudgetNew {
                title: "Template".to_string(),
                start_date: date(2026, 1, 1),
                end_date: date(2026, 1, 31),
                ..march(vec![plan(&food, 200)])
            },
        )
        .await
        .unwrap();
    let mut rent_day = spend(&food, 75, false);
    rent_day.date = Utc.with_ymd_and_hms(2026, 1, 31, 10, 30, 0).unwrap();
    engine
        .create_transaction("alice", basic.id, rent_day)
        .await
        .unwrap();

    let err = engine
        .create_budget_from_basic(
            "alice",
            BudgetFromBasic {
                year: 2026,
                month: 2,
                title: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::not_found(Resource::Budget, "basic"));

    engine.set_basic_budget("alice", basic.id).await.unwrap();
    let view = engine
        .create_budget_from_basic(
            "alice",
            BudgetFromBasic {
                year: 2026,
                month: 2,
                title: Some("February".to_string()),
            },
        )
        .await
        .unwrap();

    assert_ne!(view.budget.id, basic.id);
    assert_eq!(view.budget.title, "February");
    assert_eq!(view.budget.start_date, date(2026, 2, 1));
    assert_eq!(view.budget.end_date, date(2026, 2, 28));
    assert_eq!(view.budget.category(food.id).unwrap().amount_scheduled, 75);

    assert_eq!(view.transactions.len(), 1);
    assert_eq!(
        view.transactions[0].date,
        Utc.with_ymd_and_hms(2026, 2, 28, 10, 30, 0).unwrap()
    );

    let stored = engine.budget("alice", view.budget.id).await.unwrap();
    assert_eq!(stored, view);
}

#[tokio::test]
async fn delete_budget_clears_basic_selection() {
    let engine = engine().await;
    let food = category(&engine, "Food", true).await;
    let budget = engine
        .create_budget("alice", march(vec![plan(&food, 200)]))
        .await
        .unwrap();
    engine
        .create_transaction("alice", budget.id, spend(&food, 20, true))
        .await
        .unwrap();
    engine.set_basic_budget("alice", budget.id).await.unwrap();

    engine.delete_budget("alice", budget.id).await.unwrap();

    let err = engine.budget("alice", budget.id).await.unwrap_err();
    assert_eq!(err, EngineError::not_found(Resource::Budget, budget.id));
    let err = engine
        .create_budget_from_basic(
            "alice",
            BudgetFromBasic {
                year: 2026,
                month: 4,
                title: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::not_found(Resource::Budget, "basic"));
}

#[tokio::test]
async fn budgets_are_private_to_their_user() {
    let engine = engine().await;
    engine.register_user("bob", "password").await.unwrap();
    let budget = engine.create_budget("alice", march(vec![])).await.unwrap();

    let err = engine.budget("bob", budget.id).await.unwrap_err();
    assert_eq!(err, EngineError::not_found(Resource::Budget, budget.id));

    let err = engine
        .update_budget(
            "bob",
            budget.id,
            BudgetUpdate {
                expense_planned: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::not_found(Resource::Budget, budget.id));

    assert!(engine.list_budgets("bob").await.unwrap().is_empty());
    assert_eq!(engine.list_budgets("alice").await.unwrap().len(), 1);

    let unknown = Uuid::new_v4();
    let err = engine.delete_budget("alice", unknown).await.unwrap_err();
    assert_eq!(err, EngineError::not_found(Resource::Budget, unknown));
}
