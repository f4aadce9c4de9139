//! Budget engine.
//!
//! The engine owns the budgeting rules: a per-user category registry, budgets
//! that plan amounts per category, and transactions that move those amounts.
//! Each budget keeps one default category per axis that absorbs unallocated
//! planned amounts and the transactions of removed categories.
//!
//! The pure rules live in [`reconcile`] and on [`Budget`]; [`Engine`] loads
//! and persists them through sea-orm inside one database transaction per
//! operation.

pub use assets::Asset;
pub use budgets::{Budget, BudgetCategory, MovedAmounts};
pub use cards::Card;
pub use categories::{Category, DEFAULT_CATEGORY_TITLE};
pub use error::{EngineError, Resource};
pub use ops::{
    AssetNew, BudgetFromBasic, BudgetNew, BudgetUpdate, BudgetView, CardNew, CardUpdate,
    CategoryNew, CategoryUpdate, Engine, EngineBuilder, TransactionNew, TransactionUpdate,
};
pub use reconcile::{AmountField, Axis, CategoryPlan};
pub use transactions::{PaymentMethod, Transaction};

pub mod reconcile;

mod assets;
mod budget_categories;
mod budgets;
mod cards;
mod categories;
mod error;
mod ops;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
