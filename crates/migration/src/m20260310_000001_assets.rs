//! Assets, cards and transaction payment methods.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
}

#[derive(Iden)]
enum Assets {
    Table,
    Id,
    UserId,
    Icon,
    Title,
    Amount,
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
    UserId,
    Icon,
    Title,
    Detail,
    LinkedAssetId,
}

#[derive(Iden)]
enum Transactions {
    Table,
    PaymentMethodKind,
    PaymentMethodId,
    MovedAssetId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Assets::UserId).string().not_null())
                    .col(ColumnDef::new(Assets::Icon).string().not_null().default(""))
                    .col(ColumnDef::new(Assets::Title).string().not_null())
                    .col(
                        ColumnDef::new(Assets::Amount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-assets-user_id")
                            .from(Assets::Table, Assets::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cards::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Cards::UserId).string().not_null())
                    .col(ColumnDef::new(Cards::Icon).string().not_null().default(""))
                    .col(ColumnDef::new(Cards::Title).string().not_null())
                    .col(ColumnDef::new(Cards::Detail).string())
                    .col(ColumnDef::new(Cards::LinkedAssetId).uuid())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cards-user_id")
                            .from(Cards::Table, Cards::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cards-linked_asset_id")
                            .from(Cards::Table, Cards::LinkedAssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // SQLite only accepts one column per ALTER TABLE.
        for column in [
            ColumnDef::new(Transactions::PaymentMethodKind)
                .string()
                .to_owned(),
            ColumnDef::new(Transactions::PaymentMethodId).uuid().to_owned(),
            ColumnDef::new(Transactions::MovedAssetId).uuid().to_owned(),
        ] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Transactions::Table)
                        .add_column(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for column in [
            Transactions::MovedAssetId,
            Transactions::PaymentMethodId,
            Transactions::PaymentMethodKind,
        ] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Transactions::Table)
                        .drop_column(column)
                        .to_owned(),
                )
                .await?;
        }
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assets::Table).to_owned())
            .await
    }
}
