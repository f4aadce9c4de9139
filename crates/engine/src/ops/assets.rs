use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Asset, Card, PaymentMethod, ResultEngine, Transaction, assets, cards,
    reconcile::checked_add,
    transactions,
    util::{normalize_optional_text, normalize_title_display},
};

use super::{Engine, with_tx};

/// Input of [`Engine::create_asset`].
#[derive(Clone, Debug)]
pub struct AssetNew {
    pub icon: String,
    pub title: String,
    /// Opening balance.
    pub amount: i64,
}

/// Input of [`Engine::create_card`].
#[derive(Clone, Debug)]
pub struct CardNew {
    pub icon: String,
    pub title: String,
    pub detail: Option<String>,
    pub linked_asset_id: Option<Uuid>,
}

/// Input of [`Engine::update_card`]. `None` keeps the current value; an
/// empty `detail` clears it.
#[derive(Clone, Debug, Default)]
pub struct CardUpdate {
    pub icon: Option<String>,
    pub title: Option<String>,
    pub detail: Option<String>,
}

impl Engine {
    /// The asset whose balance a payment method moves, if any. A card moves
    /// its linked asset; an unlinked card moves nothing.
    pub(super) async fn payment_asset(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        method: Option<PaymentMethod>,
    ) -> ResultEngine<Option<Uuid>> {
        match method {
            None => Ok(None),
            Some(PaymentMethod::Asset(id)) => {
                self.require_asset(db, user_id, id).await?;
                Ok(Some(id))
            }
            Some(PaymentMethod::Card(id)) => {
                let card = self.require_card(db, user_id, id).await?;
                Ok(card.linked_asset_id)
            }
        }
    }

    pub(super) async fn adjust_asset_balance(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        asset_id: Uuid,
        delta: i64,
    ) -> ResultEngine<()> {
        let model = self.require_asset(db, user_id, asset_id).await?;
        let amount = checked_add(model.amount, delta)?;

        let mut active: assets::ActiveModel = model.into();
        active.amount = ActiveValue::Set(amount);
        active.update(db).await?;

        tracing::debug!(asset = %asset_id, delta, amount, "asset balance moved");
        Ok(())
    }

    pub async fn create_asset(&self, user_id: &str, input: AssetNew) -> ResultEngine<Asset> {
        let asset = Asset {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            icon: input.icon.trim().to_string(),
            title: normalize_title_display(&input.title, "title")?,
            amount: input.amount,
        };

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            assets::ActiveModel::from(&asset).insert(&db_tx).await?;
            Ok(asset)
        })
    }

    pub async fn list_assets(&self, user_id: &str) -> ResultEngine<Vec<Asset>> {
        with_tx!(self, |db_tx| {
            let models = assets::Entity::find()
                .filter(assets::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(assets::Column::Title)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Asset::from).collect())
        })
    }

    pub async fn asset(&self, user_id: &str, asset_id: Uuid) -> ResultEngine<Asset> {
        with_tx!(self, |db_tx| {
            let model = self.require_asset(&db_tx, user_id, asset_id).await?;
            Ok(Asset::from(model))
        })
    }

    pub async fn create_card(&self, user_id: &str, input: CardNew) -> ResultEngine<Card> {
        let card = Card {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            icon: input.icon.trim().to_string(),
            title: normalize_title_display(&input.title, "title")?,
            detail: normalize_optional_text(input.detail.as_deref()),
            linked_asset_id: input.linked_asset_id,
        };

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            if let Some(asset_id) = card.linked_asset_id {
                self.require_asset(&db_tx, user_id, asset_id).await?;
            }
            cards::ActiveModel::from(&card).insert(&db_tx).await?;
            Ok(card)
        })
    }

    /// Link a card to an asset, or unlink it with `None`. Existing
    /// transactions keep the asset they moved when recorded.
    pub async fn link_card(
        &self,
        user_id: &str,
        card_id: Uuid,
        linked_asset_id: Option<Uuid>,
    ) -> ResultEngine<Card> {
        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, user_id, card_id).await?;
            if let Some(asset_id) = linked_asset_id {
                self.require_asset(&db_tx, user_id, asset_id).await?;
            }

            let mut active: cards::ActiveModel = model.into();
            active.linked_asset_id = ActiveValue::Set(linked_asset_id);
            let model = active.update(&db_tx).await?;
            Ok(Card::from(model))
        })
    }

    pub async fn list_cards(&self, user_id: &str) -> ResultEngine<Vec<Card>> {
        with_tx!(self, |db_tx| {
            let models = cards::Entity::find()
                .filter(cards::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(cards::Column::Title)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Card::from).collect())
        })
    }

    pub async fn update_card(
        &self,
        user_id: &str,
        card_id: Uuid,
        input: CardUpdate,
    ) -> ResultEngine<Card> {
        let title = input
            .title
            .as_deref()
            .map(|t| normalize_title_display(t, "title"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self.require_card(&db_tx, user_id, card_id).await?;
            let mut active: cards::ActiveModel = model.into();
            if let Some(icon) = input.icon {
                active.icon = ActiveValue::Set(icon.trim().to_string());
            }
            if let Some(title) = title {
                active.title = ActiveValue::Set(title);
            }
            if let Some(detail) = input.detail.as_deref() {
                active.detail = ActiveValue::Set(normalize_optional_text(Some(detail)));
            }
            let model = active.update(&db_tx).await?;
            Ok(Card::from(model))
        })
    }

    /// Delete a card. Transactions paid with it lose the payment method but
    /// keep `moved_asset_id`, so reverting them still restores the asset the
    /// card was linked to when they were booked.
    pub async fn delete_card(&self, user_id: &str, card_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_card(&db_tx, user_id, card_id).await?;

            let detached = transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::PaymentMethodKind,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    transactions::Column::PaymentMethodId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .filter(
                    transactions::Column::PaymentMethodKind
                        .eq(PaymentMethod::Card(card_id).kind_str()),
                )
                .filter(transactions::Column::PaymentMethodId.eq(card_id))
                .exec(&db_tx)
                .await?;
            cards::Entity::delete_by_id(card_id).exec(&db_tx).await?;

            tracing::info!(
                user = user_id,
                card = %card_id,
                transactions = detached.rows_affected,
                "deleted card"
            );
            Ok(())
        })
    }

    /// Transactions paid with a card, across every budget of the user.
    pub async fn list_card_transactions(
        &self,
        user_id: &str,
        card_id: Uuid,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            self.require_card(&db_tx, user_id, card_id).await?;
            transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .filter(
                    transactions::Column::PaymentMethodKind
                        .eq(PaymentMethod::Card(card_id).kind_str()),
                )
                .filter(transactions::Column::PaymentMethodId.eq(card_id))
                .order_by_asc(transactions::Column::Date)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
