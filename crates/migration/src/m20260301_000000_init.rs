//! Initial schema.
//!
//! - `users`: authentication and the basic budget used for monthly cloning
//! - `categories`: per-user category registry, one default per axis
//! - `budgets`: planned totals per axis and the optimistic revision counter
//! - `budget_categories`: per-budget amounts, keyed by registry category
//! - `transactions`: budget transactions pointing at a registry category

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    BasicBudgetId,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Icon,
    Title,
    TitleNorm,
    IsExpense,
    IsDefault,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    UserId,
    Title,
    StartDate,
    EndDate,
    ExpensePlanned,
    IncomePlanned,
    Revision,
}

#[derive(Iden)]
enum BudgetCategories {
    Table,
    BudgetId,
    CategoryId,
    Position,
    AmountPlanned,
    AmountScheduled,
    AmountCurrent,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    BudgetId,
    UserId,
    CategoryId,
    IsExpense,
    IsCurrent,
    Amount,
    Title,
    Memo,
    Date,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::BasicBudgetId).uuid())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Category registry
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Categories::Icon)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Categories::Title).string().not_null())
                    .col(ColumnDef::new(Categories::TitleNorm).string().not_null())
                    .col(ColumnDef::new(Categories::IsExpense).boolean().not_null())
                    .col(
                        ColumnDef::new(Categories::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-user_id")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id-is_expense-title_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::IsExpense)
                    .col(Categories::TitleNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Budgets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Budgets::UserId).string().not_null())
                    .col(ColumnDef::new(Budgets::Title).string().not_null())
                    .col(ColumnDef::new(Budgets::StartDate).date().not_null())
                    .col(ColumnDef::new(Budgets::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(Budgets::ExpensePlanned)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Budgets::IncomePlanned)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Budgets::Revision)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-user_id")
                            .from(Budgets::Table, Budgets::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-user_id-start_date")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .col(Budgets::StartDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Budget categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetCategories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BudgetCategories::BudgetId).uuid().not_null())
                    .col(
                        ColumnDef::new(BudgetCategories::CategoryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetCategories::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetCategories::AmountPlanned)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetCategories::AmountScheduled)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BudgetCategories::AmountCurrent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(BudgetCategories::BudgetId)
                            .col(BudgetCategories::CategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-budget_id")
                            .from(BudgetCategories::Table, BudgetCategories::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-category_id")
                            .from(BudgetCategories::Table, BudgetCategories::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::BudgetId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::UserId).string().not_null())
                    .col(ColumnDef::new(Transactions::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::IsExpense).boolean().not_null())
                    .col(ColumnDef::new(Transactions::IsCurrent).boolean().not_null())
                    .col(ColumnDef::new(Transactions::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Title).string().not_null())
                    .col(ColumnDef::new(Transactions::Memo).string())
                    .col(
                        ColumnDef::new(Transactions::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-budget_id")
                            .from(Transactions::Table, Transactions::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-budget_id-category_id")
                    .table(Transactions::Table)
                    .col(Transactions::BudgetId)
                    .col(Transactions::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
