//! The `Budget` aggregate and its categories.
//!
//! A budget plans amounts per category over a date range. Each axis
//! (expense / income) has a planned total, and one default category per axis
//! absorbs whatever the other categories leave unallocated:
//!
//! ```text
//! default.amount_planned + sum(other.amount_planned) == axis planned total
//! ```
//!
//! Every mutation below keeps that equality. The methods only touch memory;
//! persistence is done by the engine operations.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Category, EngineError, ResultEngine,
    error::Resource,
    reconcile::{
        AmountField, Axis, CategoryPlan, checked_add, checked_sub, checked_sum, diff_categories,
        rebalance,
    },
};

/// A category as tracked by one budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub category_id: Uuid,
    pub icon: String,
    pub title: String,
    pub is_expense: bool,
    pub is_default: bool,
    pub amount_planned: i64,
    pub amount_scheduled: i64,
    pub amount_current: i64,
}

impl BudgetCategory {
    pub fn from_category(category: &Category, amount_planned: i64) -> Self {
        Self {
            category_id: category.id,
            icon: category.icon.clone(),
            title: category.title.clone(),
            is_expense: category.is_expense,
            is_default: category.is_default,
            amount_planned,
            amount_scheduled: 0,
            amount_current: 0,
        }
    }

    pub fn axis(&self) -> Axis {
        Axis::from_is_expense(self.is_expense)
    }

    pub fn amount(&self, field: AmountField) -> i64 {
        match field {
            AmountField::Planned => self.amount_planned,
            AmountField::Scheduled => self.amount_scheduled,
            AmountField::Current => self.amount_current,
        }
    }

    fn amount_mut(&mut self, field: AmountField) -> &mut i64 {
        match field {
            AmountField::Planned => &mut self.amount_planned,
            AmountField::Scheduled => &mut self.amount_scheduled,
            AmountField::Current => &mut self.amount_current,
        }
    }

    fn adjust(&mut self, field: AmountField, delta: i64) -> ResultEngine<()> {
        let slot = self.amount_mut(field);
        *slot = checked_add(*slot, delta)?;
        Ok(())
    }
}

/// Current and scheduled amounts moved onto a default category when the
/// transactions of a removed category are reassigned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovedAmounts {
    pub transactions: u64,
    pub current: i64,
    pub scheduled: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub expense_planned: i64,
    pub income_planned: i64,
    /// Bumped on every write; used to detect concurrent edits.
    pub revision: i64,
    pub categories: Vec<BudgetCategory>,
}

pub(crate) fn validate_period(start_date: NaiveDate, end_date: NaiveDate) -> ResultEngine<()> {
    if start_date > end_date {
        return Err(EngineError::InvalidDate(format!(
            "start date {start_date} is after end date {end_date}"
        )));
    }
    Ok(())
}

impl Budget {
    /// Build a budget from its non-default categories and the user's two
    /// default categories. The defaults receive the unallocated remainder of
    /// each axis.
    pub fn new(
        user_id: &str,
        title: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        expense_planned: i64,
        income_planned: i64,
        entries: Vec<BudgetCategory>,
        defaults: &[Category],
    ) -> ResultEngine<Self> {
        validate_period(start_date, end_date)?;

        let mut ids = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.is_default {
                return Err(EngineError::ForbiddenMutation(
                    "you can't set default category".to_string(),
                ));
            }
            if !ids.insert(entry.category_id) {
                return Err(EngineError::Conflict(format!(
                    "category {} submitted more than once",
                    entry.category_id
                )));
            }
        }

        let mut budget = Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title,
            start_date,
            end_date,
            expense_planned,
            income_planned,
            revision: 0,
            categories: entries,
        };

        for axis in Axis::ALL {
            let default = defaults
                .iter()
                .find(|c| c.is_default && c.axis() == axis)
                .ok_or_else(|| {
                    EngineError::Inconsistent(format!("missing default {} category", axis.as_str()))
                })?;
            let planned = rebalance(budget.planned_total(axis), budget.allocated_planned(axis)?)?;
            budget
                .categories
                .push(BudgetCategory::from_category(default, planned));
        }

        Ok(budget)
    }

    pub fn category(&self, category_id: Uuid) -> Option<&BudgetCategory> {
        self.categories.iter().find(|c| c.category_id == category_id)
    }

    fn position_of(&self, category_id: Uuid) -> ResultEngine<usize> {
        self.categories
            .iter()
            .position(|c| c.category_id == category_id)
            .ok_or_else(|| EngineError::not_found(Resource::Category, category_id))
    }

    pub fn default_category(&self, axis: Axis) -> ResultEngine<&BudgetCategory> {
        self.categories
            .iter()
            .find(|c| c.is_default && c.axis() == axis)
            .ok_or_else(|| {
                EngineError::Inconsistent(format!("missing default {} category", axis.as_str()))
            })
    }

    fn default_category_mut(&mut self, axis: Axis) -> ResultEngine<&mut BudgetCategory> {
        self.categories
            .iter_mut()
            .find(|c| c.is_default && c.axis() == axis)
            .ok_or_else(|| {
                EngineError::Inconsistent(format!("missing default {} category", axis.as_str()))
            })
    }

    /// Non-default categories of `axis`.
    pub fn non_default(&self, axis: Axis) -> impl Iterator<Item = &BudgetCategory> {
        self.categories
            .iter()
            .filter(move |c| !c.is_default && c.axis() == axis)
    }

    pub fn planned_total(&self, axis: Axis) -> i64 {
        match axis {
            Axis::Expense => self.expense_planned,
            Axis::Income => self.income_planned,
        }
    }

    fn planned_total_mut(&mut self, axis: Axis) -> &mut i64 {
        match axis {
            Axis::Expense => &mut self.expense_planned,
            Axis::Income => &mut self.income_planned,
        }
    }

    /// Sum of the planned amounts of the non-default categories of `axis`.
    pub fn allocated_planned(&self, axis: Axis) -> ResultEngine<i64> {
        checked_sum(self.non_default(axis).map(|c| c.amount_planned))
    }

    /// Sum of `field` over every category of `axis`, default included.
    pub fn axis_amount(&self, axis: Axis, field: AmountField) -> ResultEngine<i64> {
        checked_sum(
            self.categories
                .iter()
                .filter(|c| c.axis() == axis)
                .map(|c| c.amount(field)),
        )
    }

    pub fn increase_default(
        &mut self,
        axis: Axis,
        field: AmountField,
        delta: i64,
    ) -> ResultEngine<()> {
        self.default_category_mut(axis)?.adjust(field, delta)
    }

    /// Apply a new planned total to `axis`, moving the difference onto the
    /// default category. Returns the applied delta.
    pub fn reconcile_default_on_total_change(
        &mut self,
        axis: Axis,
        new_total: i64,
    ) -> ResultEngine<i64> {
        let delta = checked_sub(new_total, self.planned_total(axis))?;
        self.increase_default(axis, AmountField::Planned, delta)?;
        *self.planned_total_mut(axis) = new_total;
        tracing::debug!(
            budget = %self.id,
            axis = axis.as_str(),
            delta,
            "planned total changed"
        );
        Ok(delta)
    }

    /// A non-default category of `axis` changed its plan; `delta` is
    /// `old planned - new planned` and goes to the default category so the
    /// axis total stays constant.
    pub fn reconcile_default_on_category_change(
        &mut self,
        axis: Axis,
        delta: i64,
    ) -> ResultEngine<()> {
        self.increase_default(axis, AmountField::Planned, delta)
    }

    /// Set the planned amount of one category. Returns the delta applied to
    /// the default category.
    pub fn set_category_planned(
        &mut self,
        category_id: Uuid,
        amount_planned: i64,
    ) -> ResultEngine<i64> {
        let idx = self.position_of(category_id)?;
        let entry = &self.categories[idx];
        if entry.is_default {
            return Err(EngineError::ForbiddenMutation(
                "amount_planned of default category cannot be updated".to_string(),
            ));
        }
        let axis = entry.axis();
        let delta = checked_sub(entry.amount_planned, amount_planned)?;

        self.reconcile_default_on_category_change(axis, delta)?;
        self.categories[idx].amount_planned = amount_planned;
        Ok(delta)
    }

    /// Add a non-default category, taking its planned amount from the
    /// default category of the same axis.
    pub fn add_category(&mut self, entry: BudgetCategory) -> ResultEngine<()> {
        if entry.is_default {
            return Err(EngineError::ForbiddenMutation(
                "you can't set default category".to_string(),
            ));
        }
        if self.category(entry.category_id).is_some() {
            return Err(EngineError::Conflict(format!(
                "budget category {} already exists",
                entry.category_id
            )));
        }

        let delta = checked_sub(0, entry.amount_planned)?;
        self.reconcile_default_on_category_change(entry.axis(), delta)?;

        let at = self
            .categories
            .iter()
            .position(|c| c.is_default)
            .unwrap_or(self.categories.len());
        self.categories.insert(at, entry);
        Ok(())
    }

    /// Remove a non-default category. Its planned amount returns to the
    /// default category; its current/scheduled amounts are dropped and must
    /// be re-absorbed through [`Budget::absorb_moved`] by the caller.
    pub fn remove_category(&mut self, category_id: Uuid) -> ResultEngine<BudgetCategory> {
        let idx = self.position_of(category_id)?;
        let entry = &self.categories[idx];
        if entry.is_default {
            return Err(EngineError::ForbiddenMutation(
                "default categories cannot be removed".to_string(),
            ));
        }

        self.reconcile_default_on_category_change(entry.axis(), entry.amount_planned)?;
        Ok(self.categories.remove(idx))
    }

    /// Credit the default category of `axis` with reassigned transactions.
    pub fn absorb_moved(&mut self, axis: Axis, moved: MovedAmounts) -> ResultEngine<()> {
        let default = self.default_category_mut(axis)?;
        let current = checked_add(default.amount_current, moved.current)?;
        let scheduled = checked_add(default.amount_scheduled, moved.scheduled)?;
        default.amount_current = current;
        default.amount_scheduled = scheduled;
        Ok(())
    }

    /// Replace the non-default categories with `plans`.
    ///
    /// New categories are looked up in `registry`; matched ones keep their
    /// scheduled/current amounts and take the new planned amount. Defaults are
    /// recomputed from the axis totals. Returns the removed entries, whose
    /// transactions the caller must reassign.
    pub fn apply_category_plan(
        &mut self,
        plans: &[CategoryPlan],
        registry: &HashMap<Uuid, Category>,
    ) -> ResultEngine<Vec<BudgetCategory>> {
        let (mut next, removed) = {
            let diff = diff_categories(&self.categories, plans)?;
            let matched: HashMap<Uuid, &BudgetCategory> = diff
                .updated
                .iter()
                .map(|(current, _)| (current.category_id, *current))
                .collect();

            let mut next = Vec::with_capacity(plans.len() + 2);
            for plan in plans {
                let planned = plan.planned()?;
                let entry = match matched.get(&plan.category_id) {
                    Some(current) => BudgetCategory {
                        amount_planned: planned,
                        ..(*current).clone()
                    },
                    None => {
                        let category = registry.get(&plan.category_id).ok_or_else(|| {
                            EngineError::not_found(Resource::Category, plan.category_id)
                        })?;
                        if category.is_default {
                            return Err(EngineError::ForbiddenMutation(
                                "you can't set default category".to_string(),
                            ));
                        }
                        if category.user_id != self.user_id {
                            return Err(EngineError::ForbiddenMutation(format!(
                                "category {} is not owned by the budget's user",
                                category.id
                            )));
                        }
                        BudgetCategory::from_category(category, planned)
                    }
                };
                next.push(entry);
            }

            let removed: Vec<BudgetCategory> = diff.removed.into_iter().cloned().collect();
            (next, removed)
        };

        for axis in Axis::ALL {
            let allocated = checked_sum(
                next.iter()
                    .filter(|c| c.axis() == axis)
                    .map(|c| c.amount_planned),
            )?;
            let mut default = self.default_category(axis)?.clone();
            default.amount_planned = rebalance(self.planned_total(axis), allocated)?;
            next.push(default);
        }

        self.categories = next;
        Ok(removed)
    }

    /// Book a transaction amount on its category. Returns the category axis.
    pub fn record_transaction(
        &mut self,
        category_id: Uuid,
        is_current: bool,
        amount: i64,
    ) -> ResultEngine<Axis> {
        let idx = self.position_of(category_id)?;
        let entry = &mut self.categories[idx];
        entry.adjust(AmountField::for_transaction(is_current), amount)?;
        Ok(entry.axis())
    }

    /// Undo [`Budget::record_transaction`].
    pub fn revert_transaction(
        &mut self,
        category_id: Uuid,
        is_current: bool,
        amount: i64,
    ) -> ResultEngine<Axis> {
        self.record_transaction(category_id, is_current, checked_sub(0, amount)?)
    }

    /// Verify one default per axis and the planned totals equality.
    pub fn check_invariants(&self) -> ResultEngine<()> {
        for axis in Axis::ALL {
            let defaults = self
                .categories
                .iter()
                .filter(|c| c.is_default && c.axis() == axis)
                .count();
            if defaults != 1 {
                return Err(EngineError::Inconsistent(format!(
                    "{defaults} default {} categories",
                    axis.as_str()
                )));
            }

            let planned = checked_add(
                self.default_category(axis)?.amount_planned,
                self.allocated_planned(axis)?,
            )?;
            if planned != self.planned_total(axis) {
                return Err(EngineError::Inconsistent(format!(
                    "{} categories plan {planned}, budget plans {}",
                    axis.as_str(),
                    self.planned_total(axis)
                )));
            }
        }
        Ok(())
    }

    /// Copy of this budget over another period, with a fresh id.
    pub fn clone_for_period(
        &self,
        title: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ResultEngine<Self> {
        validate_period(start_date, end_date)?;
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            start_date,
            end_date,
            revision: 0,
            ..self.clone()
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub start_date: Date,
    pub end_date: Date,
    pub expense_planned: i64,
    pub income_planned: i64,
    pub revision: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_categories::Entity")]
    BudgetCategories,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::budget_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCategories.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(value: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            title: ActiveValue::Set(value.title.clone()),
            start_date: ActiveValue::Set(value.start_date),
            end_date: ActiveValue::Set(value.end_date),
            expense_planned: ActiveValue::Set(value.expense_planned),
            income_planned: ActiveValue::Set(value.income_planned),
            revision: ActiveValue::Set(value.revision),
        }
    }
}

impl Budget {
    pub(crate) fn from_model(model: Model, categories: Vec<BudgetCategory>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            start_date: model.start_date,
            end_date: model.end_date,
            expense_planned: model.expense_planned,
            income_planned: model.income_planned,
            revision: model.revision,
            categories,
        }
    }
}
