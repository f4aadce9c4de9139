//! Assets hold a balance that transactions paid with them move.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub user_id: String,
    pub icon: String,
    pub title: String,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub icon: String,
    pub title: String,
    pub amount: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cards::Entity")]
    Cards,
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Asset {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            icon: model.icon,
            title: model.title,
            amount: model.amount,
        }
    }
}

impl From<&Asset> for ActiveModel {
    fn from(asset: &Asset) -> Self {
        Self {
            id: ActiveValue::Set(asset.id),
            user_id: ActiveValue::Set(asset.user_id.clone()),
            icon: ActiveValue::Set(asset.icon.clone()),
            title: ActiveValue::Set(asset.title.clone()),
            amount: ActiveValue::Set(asset.amount),
        }
    }
}
