use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Budget, EngineError, PaymentMethod, ResultEngine, Transaction,
    error::Resource,
    reconcile::checked_sub,
    transactions,
    util::{normalize_optional_text, normalize_title_display},
};

use super::{Engine, with_tx};

/// Input of [`Engine::create_transaction`]. The axis follows the category.
#[derive(Clone, Debug)]
pub struct TransactionNew {
    pub category_id: Uuid,
    pub is_current: bool,
    pub amount: Option<i64>,
    pub title: String,
    pub memo: Option<String>,
    pub date: DateTime<Utc>,
    pub payment_method: Option<PaymentMethod>,
}

/// Input of [`Engine::update_transaction`]. `None` keeps the current value;
/// `payment_method: Some(None)` clears it.
#[derive(Clone, Debug, Default)]
pub struct TransactionUpdate {
    pub category_id: Option<Uuid>,
    pub is_current: Option<bool>,
    pub amount: Option<i64>,
    pub title: Option<String>,
    pub memo: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub payment_method: Option<Option<PaymentMethod>>,
}

impl Engine {
    /// Apply a transaction to its budget category and to an asset. With
    /// `resolve_asset` the asset comes from the payment method; otherwise the
    /// asset recorded on the transaction is reused.
    async fn book_transaction(
        &self,
        db: &DatabaseTransaction,
        budget: &mut Budget,
        tx: &mut Transaction,
        resolve_asset: bool,
    ) -> ResultEngine<()> {
        let entry = budget
            .category(tx.category_id)
            .ok_or_else(|| EngineError::not_found(Resource::Category, tx.category_id))?;
        tx.is_expense = entry.is_expense;
        budget.record_transaction(tx.category_id, tx.is_current, tx.amount)?;

        if resolve_asset {
            tx.moved_asset_id = self
                .payment_asset(db, &tx.user_id, tx.payment_method)
                .await?;
        }
        if let Some(asset_id) = tx.moved_asset_id {
            self.adjust_asset_balance(db, &tx.user_id, asset_id, tx.asset_delta()?)
                .await?;
        }
        Ok(())
    }

    /// Undo [`Engine::book_transaction`].
    async fn unbook_transaction(
        &self,
        db: &DatabaseTransaction,
        budget: &mut Budget,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        budget.revert_transaction(tx.category_id, tx.is_current, tx.amount)?;
        if let Some(asset_id) = tx.moved_asset_id {
            let delta = checked_sub(0, tx.asset_delta()?)?;
            self.adjust_asset_balance(db, &tx.user_id, asset_id, delta)
                .await?;
        }
        Ok(())
    }

    pub async fn create_transaction(
        &self,
        user_id: &str,
        budget_id: Uuid,
        input: TransactionNew,
    ) -> ResultEngine<Transaction> {
        let amount = input
            .amount
            .ok_or_else(|| EngineError::field_required("amount"))?;
        let title = normalize_title_display(&input.title, "title")?;

        with_tx!(self, |db_tx| {
            let mut budget = self.load_budget(&db_tx, user_id, budget_id).await?;
            let mut tx = Transaction {
                id: Uuid::new_v4(),
                budget_id,
                user_id: user_id.to_string(),
                category_id: input.category_id,
                is_expense: true,
                is_current: input.is_current,
                amount,
                title,
                memo: normalize_optional_text(input.memo.as_deref()),
                date: input.date,
                payment_method: input.payment_method,
                moved_asset_id: None,
            };

            self.book_transaction(&db_tx, &mut budget, &mut tx, true)
                .await?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            self.persist_budget(&db_tx, &mut budget).await?;
            Ok(tx)
        })
    }

    /// Edit a transaction. The old bookkeeping is reverted and the new one
    /// applied, so category, amount, status and payment method may all change.
    /// The asset moved at booking time keeps moving unless the payment method
    /// itself is changed.
    pub async fn update_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
        input: TransactionUpdate,
    ) -> ResultEngine<Transaction> {
        let title = input
            .title
            .as_deref()
            .map(|t| normalize_title_display(t, "title"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let old = Transaction::try_from(
                self.require_transaction(&db_tx, user_id, transaction_id)
                    .await?,
            )?;
            let mut budget = self.load_budget(&db_tx, user_id, old.budget_id).await?;
            self.unbook_transaction(&db_tx, &mut budget, &old).await?;

            let mut tx = old.clone();
            if let Some(category_id) = input.category_id {
                tx.category_id = category_id;
            }
            if let Some(is_current) = input.is_current {
                tx.is_current = is_current;
            }
            if let Some(amount) = input.amount {
                tx.amount = amount;
            }
            if let Some(title) = title {
                tx.title = title;
            }
            if let Some(memo) = input.memo.as_deref() {
                tx.memo = normalize_optional_text(Some(memo));
            }
            if let Some(date) = input.date {
                tx.date = date;
            }
            let method_changed = input.payment_method.is_some();
            if let Some(method) = input.payment_method {
                tx.payment_method = method;
            }

            self.book_transaction(&db_tx, &mut budget, &mut tx, method_changed)
                .await?;
            transactions::ActiveModel::from(&tx).update(&db_tx).await?;
            self.persist_budget(&db_tx, &mut budget).await?;
            Ok(tx)
        })
    }

    pub async fn delete_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let tx = Transaction::try_from(
                self.require_transaction(&db_tx, user_id, transaction_id)
                    .await?,
            )?;
            let mut budget = self.load_budget(&db_tx, user_id, tx.budget_id).await?;
            self.unbook_transaction(&db_tx, &mut budget, &tx).await?;

            transactions::Entity::delete_by_id(tx.id)
                .exec(&db_tx)
                .await?;
            self.persist_budget(&db_tx, &mut budget).await?;
            Ok(())
        })
    }

    pub async fn list_transactions(
        &self,
        user_id: &str,
        budget_id: Uuid,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            self.require_budget_model(&db_tx, user_id, budget_id)
                .await?;
            transactions::Entity::find()
                .filter(transactions::Column::BudgetId.eq(budget_id))
                .order_by_asc(transactions::Column::Date)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
