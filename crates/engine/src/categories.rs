//! Category registry per user.
//!
//! The registry is the single source of truth for a category's icon, title
//! and flags. Budgets only keep amount overrides keyed by `category_id` and
//! read everything else from here.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reconcile::Axis;

/// Title given to the two default categories created with every user.
pub const DEFAULT_CATEGORY_TITLE: &str = "Unallocated";

/// A registry category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub user_id: String,
    pub icon: String,
    pub title: String,
    pub is_expense: bool,
    /// The default category of its axis. It absorbs unallocated planned
    /// amounts and the transactions of removed categories.
    pub is_default: bool,
}

impl Category {
    pub fn new(user_id: &str, icon: String, title: String, is_expense: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            icon,
            title,
            is_expense,
            is_default: false,
        }
    }

    /// The balancing category of `axis` for a freshly registered user.
    pub fn default_for(user_id: &str, axis: Axis) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            icon: String::new(),
            title: DEFAULT_CATEGORY_TITLE.to_string(),
            is_expense: axis.is_expense(),
            is_default: true,
        }
    }

    pub fn axis(&self) -> Axis {
        Axis::from_is_expense(self.is_expense)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub icon: String,
    pub title: String,
    pub title_norm: String,
    pub is_expense: bool,
    pub is_default: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::budget_categories::Entity")]
    BudgetCategories,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::budget_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            icon: model.icon,
            title: model.title,
            is_expense: model.is_expense,
            is_default: model.is_default,
        }
    }
}

impl ActiveModel {
    pub(crate) fn from_category(category: &Category, title_norm: String) -> Self {
        Self {
            id: ActiveValue::Set(category.id),
            user_id: ActiveValue::Set(category.user_id.clone()),
            icon: ActiveValue::Set(category.icon.clone()),
            title: ActiveValue::Set(category.title.clone()),
            title_norm: ActiveValue::Set(title_norm),
            is_expense: ActiveValue::Set(category.is_expense),
            is_default: ActiveValue::Set(category.is_default),
        }
    }
}
