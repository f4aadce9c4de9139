//! Budget transactions.
//!
//! A transaction belongs to one budget and points at one of its categories by
//! id. It moves the category's `amount_current` when settled
//! (`is_current`) or its `amount_scheduled` otherwise. When paid with an
//! asset, or with a card linked to an asset, it also moves that asset's
//! balance.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, reconcile::Axis};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PaymentMethod {
    Asset(Uuid),
    Card(Uuid),
}

impl PaymentMethod {
    pub fn kind_str(self) -> &'static str {
        match self {
            Self::Asset(_) => "asset",
            Self::Card(_) => "card",
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Asset(id) | Self::Card(id) => id,
        }
    }

    fn from_columns(kind: Option<&str>, id: Option<Uuid>) -> ResultEngine<Option<Self>> {
        match (kind, id) {
            (None, None) => Ok(None),
            (Some("asset"), Some(id)) => Ok(Some(Self::Asset(id))),
            (Some("card"), Some(id)) => Ok(Some(Self::Card(id))),
            (kind, id) => Err(EngineError::Inconsistent(format!(
                "invalid payment method {kind:?} / {id:?}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub user_id: String,
    pub category_id: Uuid,
    pub is_expense: bool,
    /// Settled (`true`) or scheduled (`false`).
    pub is_current: bool,
    pub amount: i64,
    pub title: String,
    pub memo: Option<String>,
    pub date: DateTime<Utc>,
    pub payment_method: Option<PaymentMethod>,
    /// Asset whose balance this transaction moved when it was recorded.
    pub moved_asset_id: Option<Uuid>,
}

impl Transaction {
    pub fn axis(&self) -> Axis {
        Axis::from_is_expense(self.is_expense)
    }

    /// Signed change this transaction applies to a linked asset balance.
    pub fn asset_delta(&self) -> ResultEngine<i64> {
        if self.is_expense {
            self.amount
                .checked_neg()
                .ok_or_else(|| EngineError::InvalidAmount(format!("-{} overflows", self.amount)))
        } else {
            Ok(self.amount)
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_id: Uuid,
    pub user_id: String,
    pub category_id: Uuid,
    pub is_expense: bool,
    pub is_current: bool,
    pub amount: i64,
    pub title: String,
    pub memo: Option<String>,
    pub date: DateTimeUtc,
    pub payment_method_kind: Option<String>,
    pub payment_method_id: Option<Uuid>,
    pub moved_asset_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Budget,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            budget_id: ActiveValue::Set(tx.budget_id),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            category_id: ActiveValue::Set(tx.category_id),
            is_expense: ActiveValue::Set(tx.is_expense),
            is_current: ActiveValue::Set(tx.is_current),
            amount: ActiveValue::Set(tx.amount),
            title: ActiveValue::Set(tx.title.clone()),
            memo: ActiveValue::Set(tx.memo.clone()),
            date: ActiveValue::Set(tx.date),
            payment_method_kind: ActiveValue::Set(
                tx.payment_method.map(|m| m.kind_str().to_string()),
            ),
            payment_method_id: ActiveValue::Set(tx.payment_method.map(PaymentMethod::id)),
            moved_asset_id: ActiveValue::Set(tx.moved_asset_id),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let payment_method = PaymentMethod::from_columns(
            model.payment_method_kind.as_deref(),
            model.payment_method_id,
        )?;
        Ok(Self {
            id: model.id,
            budget_id: model.budget_id,
            user_id: model.user_id,
            category_id: model.category_id,
            is_expense: model.is_expense,
            is_current: model.is_current,
            amount: model.amount,
            title: model.title,
            memo: model.memo,
            date: model.date,
            payment_method,
            moved_asset_id: model.moved_asset_id,
        })
    }
}
