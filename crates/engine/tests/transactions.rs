use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::Database;

use engine::{
    AssetNew, Axis, Budget, BudgetNew, Card, CardNew, CardUpdate, Category, CategoryNew,
    CategoryPlan, Engine, EngineError, PaymentMethod, Resource, TransactionNew, TransactionUpdate,
};
use migration::MigratorTrait;
use uuid::Uuid;

struct Fixture {
    engine: Engine,
    budget: Budget,
    food: Category,
    salary: Category,
}

async fn fixture() -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine.register_user("alice", "password").await.unwrap();

    let mut created = Vec::new();
    for (title, is_expense) in [("Food", true), ("Salary", false)] {
        let category = engine
            .create_category(
                "alice",
                CategoryNew {
                    icon: String::new(),
                    title: title.to_string(),
                    is_expense,
                },
            )
            .await
            .unwrap();
        created.push(category);
    }
    let salary = created.pop().unwrap();
    let food = created.pop().unwrap();

    let budget = engine
        .create_budget(
            "alice",
            BudgetNew {
                title: "September".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
                expense_planned: 1000,
                income_planned: 3000,
                categories: vec![
                    CategoryPlan {
                        category_id: food.id,
                        amount_planned: Some(300),
                        is_default: false,
                    },
                    CategoryPlan {
                        category_id: salary.id,
                        amount_planned: Some(3000),
                        is_default: false,
                    },
                ],
            },
        )
        .await
        .unwrap();

    Fixture {
        engine,
        budget,
        food,
        salary,
    }
}

fn new_tx(category: &Category, amount: i64, method: Option<PaymentMethod>) -> TransactionNew {
    TransactionNew {
        category_id: category.id,
        is_current: true,
        amount: Some(amount),
        title: "Entry".to_string(),
        memo: None,
        date: Utc.with_ymd_and_hms(2026, 9, 10, 12, 0, 0).unwrap(),
        payment_method: method,
    }
}

async fn asset(engine: &Engine, title: &str, amount: i64) -> Uuid {
    engine
        .create_asset(
            "alice",
            AssetNew {
                icon: String::new(),
                title: title.to_string(),
                amount,
            },
        )
        .await
        .unwrap()
        .id
}

async fn card(engine: &Engine, title: &str, linked_asset_id: Option<Uuid>) -> Card {
    engine
        .create_card(
            "alice",
            CardNew {
                icon: String::new(),
                title: title.to_string(),
                detail: Some("**** 1234".to_string()),
                linked_asset_id,
            },
        )
        .await
        .unwrap()
}

async fn balance(engine: &Engine, asset_id: Uuid) -> i64 {
    engine.asset("alice", asset_id).await.unwrap().amount
}

#[tokio::test]
async fn transaction_moves_category_amounts() {
    let f = fixture().await;

    let tx = f
        .engine
        .create_transaction("alice", f.budget.id, new_tx(&f.food, 120, None))
        .await
        .unwrap();
    assert!(tx.is_expense);

    let mut scheduled = new_tx(&f.salary, 2800, None);
    scheduled.is_current = false;
    let pay = f
        .engine
        .create_transaction("alice", f.budget.id, scheduled)
        .await
        .unwrap();
    assert!(!pay.is_expense);

    let budget = f.engine.budget("alice", f.budget.id).await.unwrap().budget;
    assert_eq!(budget.category(f.food.id).unwrap().amount_current, 120);
    assert_eq!(budget.category(f.salary.id).unwrap().amount_scheduled, 2800);
    assert_eq!(budget.category(f.salary.id).unwrap().amount_current, 0);
}

#[tokio::test]
async fn create_rejects_missing_amount_and_foreign_category() {
    let f = fixture().await;

    let mut input = new_tx(&f.food, 0, None);
    input.amount = None;
    let err = f
        .engine
        .create_transaction("alice", f.budget.id, input)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::field_required("amount"));

    let stray = f
        .engine
        .create_category(
            "alice",
            CategoryNew {
                icon: String::new(),
                title: "Travel".to_string(),
                is_expense: true,
            },
        )
        .await
        .unwrap();
    let err = f
        .engine
        .create_transaction("alice", f.budget.id, new_tx(&stray, 10, None))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::not_found(Resource::Category, stray.id));

    assert!(
        f.engine
            .list_transactions("alice", f.budget.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn update_moves_amounts_between_categories_and_status() {
    let f = fixture().await;
    let tx = f
        .engine
        .create_transaction("alice", f.budget.id, new_tx(&f.food, 80, None))
        .await
        .unwrap();
    let default_id = f.budget.default_category(Axis::Expense).unwrap().category_id;

    let updated = f
        .engine
        .update_transaction(
            "alice",
            tx.id,
            TransactionUpdate {
                category_id: Some(default_id),
                is_current: Some(false),
                amount: Some(95),
                memo: Some("moved".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.category_id, default_id);
    assert_eq!(updated.memo.as_deref(), Some("moved"));

    let budget = f.engine.budget("alice", f.budget.id).await.unwrap().budget;
    let food = budget.category(f.food.id).unwrap();
    assert_eq!((food.amount_current, food.amount_scheduled), (0, 0));
    let default = budget.default_category(Axis::Expense).unwrap();
    assert_eq!((default.amount_current, default.amount_scheduled), (0, 95));
}

#[tokio::test]
async fn delete_reverts_category_amounts() {
    let f = fixture().await;
    let tx = f
        .engine
        .create_transaction("alice", f.budget.id, new_tx(&f.food, 45, None))
        .await
        .unwrap();

    f.engine.delete_transaction("alice", tx.id).await.unwrap();

    let budget = f.engine.budget("alice", f.budget.id).await.unwrap().budget;
    assert_eq!(budget.category(f.food.id).unwrap().amount_current, 0);
    let err = f.engine.delete_transaction("alice", tx.id).await.unwrap_err();
    assert_eq!(err, EngineError::not_found(Resource::Transaction, tx.id));
}

#[tokio::test]
async fn asset_payment_moves_balance_by_axis() {
    let f = fixture().await;
    let cash = asset(&f.engine, "Cash", 500).await;

    let expense = f
        .engine
        .create_transaction(
            "alice",
            f.budget.id,
            new_tx(&f.food, 70, Some(PaymentMethod::Asset(cash))),
        )
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, cash).await, 430);

    f.engine
        .create_transaction(
            "alice",
            f.budget.id,
            new_tx(&f.salary, 1000, Some(PaymentMethod::Asset(cash))),
        )
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, cash).await, 1430);

    f.engine
        .update_transaction(
            "alice",
            expense.id,
            TransactionUpdate {
                amount: Some(100),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, cash).await, 1400);

    f.engine
        .update_transaction(
            "alice",
            expense.id,
            TransactionUpdate {
                payment_method: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, cash).await, 1500);
}

#[tokio::test]
async fn card_payment_moves_linked_asset() {
    let f = fixture().await;
    let checking = asset(&f.engine, "Checking", 1000).await;
    let savings = asset(&f.engine, "Savings", 0).await;
    let card = f
        .engine
        .create_card(
            "alice",
            CardNew {
                icon: String::new(),
                title: "Visa".to_string(),
                detail: Some("**** 1234".to_string()),
                linked_asset_id: Some(checking),
            },
        )
        .await
        .unwrap();

    let tx = f
        .engine
        .create_transaction(
            "alice",
            f.budget.id,
            new_tx(&f.food, 250, Some(PaymentMethod::Card(card.id))),
        )
        .await
        .unwrap();
    assert_eq!(tx.moved_asset_id, Some(checking));
    assert_eq!(balance(&f.engine, checking).await, 750);

    f.engine
        .link_card("alice", card.id, Some(savings))
        .await
        .unwrap();
    f.engine.delete_transaction("alice", tx.id).await.unwrap();

    assert_eq!(balance(&f.engine, checking).await, 1000);
    assert_eq!(balance(&f.engine, savings).await, 0);
}

#[tokio::test]
async fn unlinked_card_moves_nothing() {
    let f = fixture().await;
    let checking = asset(&f.engine, "Checking", 1000).await;
    let card = f
        .engine
        .create_card(
            "alice",
            CardNew {
                icon: String::new(),
                title: "Prepaid".to_string(),
                detail: None,
                linked_asset_id: None,
            },
        )
        .await
        .unwrap();

    let tx = f
        .engine
        .create_transaction(
            "alice",
            f.budget.id,
            new_tx(&f.food, 40, Some(PaymentMethod::Card(card.id))),
        )
        .await
        .unwrap();

    assert_eq!(tx.moved_asset_id, None);
    assert_eq!(tx.payment_method, Some(PaymentMethod::Card(card.id)));
    assert_eq!(balance(&f.engine, checking).await, 1000);

    let err = f
        .engine
        .link_card("alice", card.id, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: Resource::Asset, .. }));
}

#[tokio::test]
async fn edit_keeps_moving_the_booked_asset() {
    let f = fixture().await;
    let checking = asset(&f.engine, "Checking", 1000).await;
    let savings = asset(&f.engine, "Savings", 0).await;
    let visa = card(&f.engine, "Visa", Some(checking)).await;

    let tx = f
        .engine
        .create_transaction(
            "alice",
            f.budget.id,
            new_tx(&f.food, 100, Some(PaymentMethod::Card(visa.id))),
        )
        .await
        .unwrap();
    f.engine
        .link_card("alice", visa.id, Some(savings))
        .await
        .unwrap();

    let tx = f
        .engine
        .update_transaction(
            "alice",
            tx.id,
            TransactionUpdate {
                amount: Some(150),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tx.moved_asset_id, Some(checking));
    assert_eq!(balance(&f.engine, checking).await, 850);
    assert_eq!(balance(&f.engine, savings).await, 0);

    let tx = f
        .engine
        .update_transaction(
            "alice",
            tx.id,
            TransactionUpdate {
                payment_method: Some(Some(PaymentMethod::Card(visa.id))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tx.moved_asset_id, Some(savings));
    assert_eq!(balance(&f.engine, checking).await, 1000);
    assert_eq!(balance(&f.engine, savings).await, -150);
}

#[tokio::test]
async fn update_card_changes_display_fields() {
    let f = fixture().await;
    let checking = asset(&f.engine, "Checking", 0).await;
    let visa = card(&f.engine, "Visa", Some(checking)).await;

    let updated = f
        .engine
        .update_card(
            "alice",
            visa.id,
            CardUpdate {
                title: Some("  Visa   Gold ".to_string()),
                detail: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Visa Gold");
    assert_eq!(updated.detail, None);
    assert_eq!(updated.icon, visa.icon);
    assert_eq!(updated.linked_asset_id, Some(checking));

    let err = f
        .engine
        .update_card(
            "alice",
            visa.id,
            CardUpdate {
                title: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::field_required("title"));
}

#[tokio::test]
async fn card_transactions_only_lists_that_card() {
    let f = fixture().await;
    let visa = card(&f.engine, "Visa", None).await;
    let amex = card(&f.engine, "Amex", None).await;

    for (amount, method) in [
        (10, Some(PaymentMethod::Card(visa.id))),
        (20, Some(PaymentMethod::Card(amex.id))),
        (30, None),
        (40, Some(PaymentMethod::Card(visa.id))),
    ] {
        f.engine
            .create_transaction("alice", f.budget.id, new_tx(&f.food, amount, method))
            .await
            .unwrap();
    }

    let listed = f
        .engine
        .list_card_transactions("alice", visa.id)
        .await
        .unwrap();
    let mut amounts: Vec<i64> = listed.iter().map(|tx| tx.amount).collect();
    amounts.sort();
    assert_eq!(amounts, vec![10, 40]);
    assert!(
        listed
            .iter()
            .all(|tx| tx.payment_method == Some(PaymentMethod::Card(visa.id)))
    );

    let err = f
        .engine
        .list_card_transactions("alice", Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: Resource::Card, .. }));
}

#[tokio::test]
async fn deleted_card_leaves_transactions_revertible() {
    let f = fixture().await;
    let checking = asset(&f.engine, "Checking", 1000).await;
    let visa = card(&f.engine, "Visa", Some(checking)).await;

    let kept = f
        .engine
        .create_transaction(
            "alice",
            f.budget.id,
            new_tx(&f.food, 100, Some(PaymentMethod::Card(visa.id))),
        )
        .await
        .unwrap();
    let dropped = f
        .engine
        .create_transaction(
            "alice",
            f.budget.id,
            new_tx(&f.food, 50, Some(PaymentMethod::Card(visa.id))),
        )
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, checking).await, 850);

    f.engine.delete_card("alice", visa.id).await.unwrap();
    assert!(f.engine.list_cards("alice").await.unwrap().is_empty());
    let err = f
        .engine
        .list_card_transactions("alice", visa.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: Resource::Card, .. }));

    let transactions = f
        .engine
        .list_transactions("alice", f.budget.id)
        .await
        .unwrap();
    assert!(transactions.iter().all(|tx| tx.payment_method.is_none()));
    assert!(
        transactions
            .iter()
            .all(|tx| tx.moved_asset_id == Some(checking))
    );
    assert_eq!(balance(&f.engine, checking).await, 850);

    let kept = f
        .engine
        .update_transaction(
            "alice",
            kept.id,
            TransactionUpdate {
                amount: Some(120),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(kept.moved_asset_id, Some(checking));
    assert_eq!(balance(&f.engine, checking).await, 830);

    f.engine
        .delete_transaction("alice", dropped.id)
        .await
        .unwrap();
    assert_eq!(balance(&f.engine, checking).await, 880);
}
