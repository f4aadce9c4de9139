use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, assets, budgets, cards, categories, error::Resource, transactions,
    users,
};

use super::Engine;

/// Generates a `require_*` lookup for an entity owned by a user. Rows owned
/// by somebody else are reported as missing.
macro_rules! impl_owned_by_user {
    ($require_fn:ident, $entity:path, $model:path, $user_col:expr, $resource:expr) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            user_id: &str,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .filter($user_col.eq(user_id.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::not_found($resource, id))
        }
    };
}

impl Engine {
    impl_owned_by_user!(
        require_category,
        categories::Entity,
        categories::Model,
        categories::Column::UserId,
        Resource::Category
    );

    impl_owned_by_user!(
        require_budget_model,
        budgets::Entity,
        budgets::Model,
        budgets::Column::UserId,
        Resource::Budget
    );

    impl_owned_by_user!(
        require_transaction,
        transactions::Entity,
        transactions::Model,
        transactions::Column::UserId,
        Resource::Transaction
    );

    impl_owned_by_user!(
        require_asset,
        assets::Entity,
        assets::Model,
        assets::Column::UserId,
        Resource::Asset
    );

    impl_owned_by_user!(
        require_card,
        cards::Entity,
        cards::Model,
        cards::Column::UserId,
        Resource::Card
    );

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::not_found(Resource::User, username))
    }
}
