//! Cards. A card has no balance of its own; a card linked to an asset
//! forwards transaction amounts to that asset.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub user_id: String,
    pub icon: String,
    pub title: String,
    pub detail: Option<String>,
    pub linked_asset_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub icon: String,
    pub title: String,
    pub detail: Option<String>,
    pub linked_asset_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assets::Entity",
        from = "Column::LinkedAssetId",
        to = "super::assets::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    LinkedAsset,
}

impl Related<super::assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LinkedAsset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Card {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            icon: model.icon,
            title: model.title,
            detail: model.detail,
            linked_asset_id: model.linked_asset_id,
        }
    }
}

impl From<&Card> for ActiveModel {
    fn from(card: &Card) -> Self {
        Self {
            id: ActiveValue::Set(card.id),
            user_id: ActiveValue::Set(card.user_id.clone()),
            icon: ActiveValue::Set(card.icon.clone()),
            title: ActiveValue::Set(card.title.clone()),
            detail: ActiveValue::Set(card.detail.clone()),
            linked_asset_id: ActiveValue::Set(card.linked_asset_id),
        }
    }
}
