use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignUp {
        pub username: String,
        pub password: String,
    }

    /// Budget cloned by `POST /budgets/basic`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BasicBudget {
        pub budget_id: Uuid,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        #[serde(default)]
        pub icon: String,
        pub title: String,
        pub is_expense: bool,
    }

    /// Both fields are optional; absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub icon: Option<String>,
        pub title: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub icon: String,
        pub title: String,
        pub is_expense: bool,
        pub is_default: bool,
    }
}

pub mod budget {
    use super::*;
    use crate::transaction::TransactionView;

    /// A category entry as submitted when planning a budget.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CategoryPlan {
        pub category_id: Uuid,
        /// Required; a missing value is rejected with 400.
        pub amount_planned: Option<i64>,
        /// Clients echo this flag back; default categories are rejected.
        #[serde(default)]
        pub is_default: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub title: String,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub expense_planned: i64,
        pub income_planned: i64,
        #[serde(default)]
        pub categories: Vec<CategoryPlan>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetFromBasic {
        pub year: i32,
        /// 1-based month.
        pub month: u32,
        pub title: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub title: Option<String>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub expense_planned: Option<i64>,
        pub income_planned: Option<i64>,
        /// Replaces every non-default category. Transactions of the dropped
        /// ones move to the default category of their axis.
        pub categories: Option<Vec<CategoryPlan>>,
    }

    /// Body of `PUT /budgets/{id}/categories`. `categories` is required; an
    /// empty list drops every non-default category.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoriesReplace {
        pub categories: Option<Vec<CategoryPlan>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryPlannedUpdate {
        pub amount_planned: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetCategoryView {
        pub category_id: Uuid,
        pub icon: String,
        pub title: String,
        pub is_expense: bool,
        pub is_default: bool,
        pub amount_planned: i64,
        pub amount_scheduled: i64,
        pub amount_current: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub title: String,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub expense_planned: i64,
        pub income_planned: i64,
        pub revision: i64,
        pub categories: Vec<BudgetCategoryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetDetail {
        pub budget: BudgetView,
        pub transactions: Vec<TransactionView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMethodKind {
        Asset,
        Card,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PaymentMethod {
        pub kind: PaymentMethodKind,
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub category_id: Uuid,
        /// `true` for a settled transaction, `false` for a scheduled one.
        pub is_current: bool,
        pub amount: Option<i64>,
        pub title: String,
        pub memo: Option<String>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub date: DateTime<FixedOffset>,
        pub payment_method: Option<PaymentMethod>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub category_id: Option<Uuid>,
        pub is_current: Option<bool>,
        pub amount: Option<i64>,
        pub title: Option<String>,
        pub memo: Option<String>,
        pub date: Option<DateTime<FixedOffset>>,
        pub payment_method: Option<PaymentMethod>,
        /// Drop the payment method. Cannot be combined with `payment_method`.
        #[serde(default)]
        pub clear_payment_method: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub budget_id: Uuid,
        pub category_id: Uuid,
        pub is_expense: bool,
        pub is_current: bool,
        pub amount: i64,
        pub title: String,
        pub memo: Option<String>,
        pub date: DateTime<FixedOffset>,
        pub payment_method: Option<PaymentMethod>,
    }
}

pub mod asset {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssetNew {
        #[serde(default)]
        pub icon: String,
        pub title: String,
        #[serde(default)]
        pub amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssetView {
        pub id: Uuid,
        pub icon: String,
        pub title: String,
        pub amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardNew {
        #[serde(default)]
        pub icon: String,
        pub title: String,
        pub detail: Option<String>,
        pub linked_asset_id: Option<Uuid>,
    }

    /// Absent fields are left untouched; an empty `detail` clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CardUpdate {
        pub icon: Option<String>,
        pub title: Option<String>,
        pub detail: Option<String>,
    }

    /// Body of `PUT /cards/{id}/link`; `null` unlinks the card.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardLink {
        pub linked_asset_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardView {
        pub id: Uuid,
        pub icon: String,
        pub title: String,
        pub detail: Option<String>,
        pub linked_asset_id: Option<Uuid>,
    }
}
