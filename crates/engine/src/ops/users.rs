use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, reconcile::Axis, users};

use super::{Engine, with_tx};

impl Engine {
    /// Register a user together with the default category of each axis.
    pub async fn register_user(&self, username: &str, password: &str) -> ResultEngine<()> {
        if username.trim().is_empty() {
            return Err(EngineError::field_required("username"));
        }
        if username.trim() != username {
            return Err(EngineError::InvalidName(
                "username must not start or end with whitespace".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(EngineError::field_required("password"));
        }

        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.to_string())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::Conflict(format!(
                    "user '{username}' already exists"
                )));
            }

            users::ActiveModel {
                username: ActiveValue::Set(username.to_string()),
                password: ActiveValue::Set(password.to_string()),
                basic_budget_id: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;

            for axis in Axis::ALL {
                self.insert_category(&db_tx, &Category::default_for(username, axis))
                    .await?;
            }

            tracing::info!(user = username, "registered user");
            Ok(())
        })
    }

    /// Pick the budget `create_budget_from_basic` clones.
    pub async fn set_basic_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            self.require_budget_model(&db_tx, user_id, budget_id)
                .await?;

            let mut user: users::ActiveModel = user.into();
            user.basic_budget_id = ActiveValue::Set(Some(budget_id));
            user.update(&db_tx).await?;
            Ok(())
        })
    }
}
