//! Per-budget category amounts.
//!
//! A row only stores the amounts a budget tracks for a category. Icon, title
//! and flags are joined from the registry when the budget is loaded.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{BudgetCategory, EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub budget_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: Uuid,
    pub position: i32,
    pub amount_planned: i64,
    pub amount_scheduled: i64,
    pub amount_current: i64,
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
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_entry(
        budget_id: Uuid,
        position: usize,
        entry: &BudgetCategory,
    ) -> ResultEngine<Self> {
        let position = i32::try_from(position).map_err(|_| {
            EngineError::Inconsistent(format!(
                "budget {budget_id} has too many categories ({position})"
            ))
        })?;
        Ok(Self {
            budget_id: ActiveValue::Set(budget_id),
            category_id: ActiveValue::Set(entry.category_id),
            position: ActiveValue::Set(position),
            amount_planned: ActiveValue::Set(entry.amount_planned),
            amount_scheduled: ActiveValue::Set(entry.amount_scheduled),
            amount_current: ActiveValue::Set(entry.amount_current),
        })
    }
}
