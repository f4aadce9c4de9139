use std::collections::HashMap;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Category, EngineError, ResultEngine, budget_categories, budgets, categories,
    util::{normalize_title_display, normalize_title_key},
};

use super::{Engine, with_tx};

/// Input of [`Engine::create_category`].
#[derive(Clone, Debug)]
pub struct CategoryNew {
    pub icon: String,
    pub title: String,
    pub is_expense: bool,
}

/// Input of [`Engine::update_category`]. `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct CategoryUpdate {
    pub icon: Option<String>,
    pub title: Option<String>,
}

impl Engine {
    /// Every registry category of the user, keyed by id.
    pub(super) async fn registry(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<HashMap<Uuid, Category>> {
        Ok(categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id.to_string()))
            .all(db)
            .await?
            .into_iter()
            .map(|model| (model.id, Category::from(model)))
            .collect())
    }

    async fn ensure_unique_title(
        &self,
        db: &DatabaseTransaction,
        category: &Category,
        title_norm: &str,
    ) -> ResultEngine<()> {
        let clash = categories::Entity::find()
            .filter(categories::Column::UserId.eq(category.user_id.clone()))
            .filter(categories::Column::IsExpense.eq(category.is_expense))
            .filter(categories::Column::TitleNorm.eq(title_norm.to_string()))
            .filter(categories::Column::Id.ne(category.id))
            .one(db)
            .await?;
        if let Some(existing) = clash {
            return Err(EngineError::Conflict(format!(
                "category '{}' already exists",
                existing.title
            )));
        }
        Ok(())
    }

    pub(super) async fn insert_category(
        &self,
        db: &DatabaseTransaction,
        category: &Category,
    ) -> ResultEngine<()> {
        let title_norm = normalize_title_key(&category.title)?;
        self.ensure_unique_title(db, category, &title_norm).await?;
        categories::ActiveModel::from_category(category, title_norm)
            .insert(db)
            .await?;
        Ok(())
    }

    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let models = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(categories::Column::IsExpense)
                .order_by_asc(categories::Column::IsDefault)
                .order_by_asc(categories::Column::TitleNorm)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Category::from).collect())
        })
    }

    pub async fn category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_category(&db_tx, user_id, category_id)
                .await?;
            Ok(Category::from(model))
        })
    }

    pub async fn create_category(
        &self,
        user_id: &str,
        input: CategoryNew,
    ) -> ResultEngine<Category> {
        let title = normalize_title_display(&input.title, "title")?;
        let icon = input.icon.trim().to_string();
        let category = Category::new(user_id, icon, title, input.is_expense);

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.insert_category(&db_tx, &category).await?;
            Ok(category)
        })
    }

    /// Edit icon and title. Budgets read both by reference, so the change
    /// shows up in every budget of the user.
    pub async fn update_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        input: CategoryUpdate,
    ) -> ResultEngine<Category> {
        let title = input
            .title
            .as_deref()
            .map(|t| normalize_title_display(t, "title"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_category(&db_tx, user_id, category_id)
                .await?;
            let mut category = Category::from(model.clone());
            let mut active: categories::ActiveModel = model.into();

            if let Some(icon) = input.icon {
                category.icon = icon.trim().to_string();
                active.icon = ActiveValue::Set(category.icon.clone());
            }
            if let Some(title) = title {
                let title_norm = normalize_title_key(&title)?;
                category.title = title;
                self.ensure_unique_title(&db_tx, &category, &title_norm)
                    .await?;
                active.title = ActiveValue::Set(category.title.clone());
                active.title_norm = ActiveValue::Set(title_norm);
            }

            active.update(&db_tx).await?;
            Ok(category)
        })
    }

    /// Delete a registry category. Every budget holding it drops the entry
    /// and moves its transactions to the default category of the same axis.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_category(&db_tx, user_id, category_id)
                .await?;
            if model.is_default {
                return Err(EngineError::ForbiddenMutation(
                    "default categories cannot be deleted".to_string(),
                ));
            }

            let budget_ids: Vec<Uuid> = budget_categories::Entity::find()
                .filter(budget_categories::Column::CategoryId.eq(category_id))
                .inner_join(budgets::Entity)
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|row| row.budget_id)
                .collect();

            for budget_id in &budget_ids {
                let mut budget = self.load_budget(&db_tx, user_id, *budget_id).await?;
                let removed = budget.remove_category(category_id)?;
                self.reassign_transactions_on_removal(&db_tx, &mut budget, &removed)
                    .await?;
                self.persist_budget(&db_tx, &mut budget).await?;
            }

            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;

            tracing::info!(
                user = user_id,
                category = %category_id,
                budgets = budget_ids.len(),
                "deleted category"
            );
            Ok(())
        })
    }
}
