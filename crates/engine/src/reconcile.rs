//! Pure reconciliation primitives.
//!
//! Nothing in here touches the database. The budget aggregate
//! ([`crate::Budget`]) and the engine operations are built on top of these
//! functions, so the arithmetic and the diff rules can be tested in isolation.
//!
//! All amounts are whole currency units stored as `i64`. Any sign is allowed
//! for planned amounts (a negative plan is a planned deficit). Arithmetic is
//! checked and an overflow surfaces as [`EngineError::InvalidAmount`].

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BudgetCategory, EngineError, ResultEngine};

/// The two independent sides of a budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Expense,
    Income,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Expense, Axis::Income];

    pub fn from_is_expense(is_expense: bool) -> Self {
        if is_expense {
            Self::Expense
        } else {
            Self::Income
        }
    }

    pub fn is_expense(self) -> bool {
        matches!(self, Self::Expense)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

/// One of the three amounts tracked per budget category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountField {
    Planned,
    Scheduled,
    Current,
}

impl AmountField {
    /// Settled transactions move `Current`, the others move `Scheduled`.
    pub fn for_transaction(is_current: bool) -> Self {
        if is_current {
            Self::Current
        } else {
            Self::Scheduled
        }
    }
}

pub(crate) fn checked_add(lhs: i64, rhs: i64) -> ResultEngine<i64> {
    lhs.checked_add(rhs)
        .ok_or_else(|| EngineError::InvalidAmount(format!("{lhs} + {rhs} overflows")))
}

pub(crate) fn checked_sub(lhs: i64, rhs: i64) -> ResultEngine<i64> {
    lhs.checked_sub(rhs)
        .ok_or_else(|| EngineError::InvalidAmount(format!("{lhs} - {rhs} overflows")))
}

pub(crate) fn checked_sum(values: impl IntoIterator<Item = i64>) -> ResultEngine<i64> {
    values.into_iter().try_fold(0_i64, checked_add)
}

/// Amount left for the unallocated (default) category of an axis.
///
/// `axis_total` is the budget-level planned total of the axis and
/// `allocated_sum` the planned amounts of every non-default category on it.
pub fn rebalance(axis_total: i64, allocated_sum: i64) -> ResultEngine<i64> {
    checked_sub(axis_total, allocated_sum)
}

/// Result of comparing a current list against an incoming one.
///
/// `added` and `updated` follow the incoming order, `removed` the current
/// order.
#[derive(Debug)]
pub struct Diff<'a, C, I> {
    pub added: Vec<&'a I>,
    pub updated: Vec<(&'a C, &'a I)>,
    /// Matched pairs the caller predicate considered equal.
    pub unchanged: Vec<(&'a C, &'a I)>,
    pub removed: Vec<&'a C>,
}

impl<C, I> Diff<'_, C, I> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Default predicate for [`diff_by_key`]: every matched pair is an update.
pub fn always_differs<C, I>(_: &C, _: &I) -> bool {
    true
}

/// Partition `current` and `incoming` by key.
///
/// Keys present only in `incoming` are added, keys present only in `current`
/// are removed, and matched pairs are updated when `differs` returns `true`.
/// Duplicated keys in `incoming` are matched independently; callers that need
/// unique keys must reject duplicates before diffing.
pub fn diff_by_key<'a, C, I, K, FC, FI, P>(
    current: &'a [C],
    incoming: &'a [I],
    current_key: FC,
    incoming_key: FI,
    differs: P,
) -> Diff<'a, C, I>
where
    K: Eq + Hash,
    FC: Fn(&C) -> K,
    FI: Fn(&I) -> K,
    P: Fn(&C, &I) -> bool,
{
    let by_key: HashMap<K, &'a C> = current.iter().map(|c| (current_key(c), c)).collect();
    let mut seen: HashSet<K> = HashSet::with_capacity(incoming.len());

    let mut diff = Diff {
        added: Vec::new(),
        updated: Vec::new(),
        unchanged: Vec::new(),
        removed: Vec::new(),
    };

    for item in incoming {
        let key = incoming_key(item);
        match by_key.get(&key) {
            Some(existing) if differs(existing, item) => diff.updated.push((*existing, item)),
            Some(existing) => diff.unchanged.push((*existing, item)),
            None => diff.added.push(item),
        }
        seen.insert(key);
    }

    diff.removed = current
        .iter()
        .filter(|&c| !seen.contains(&current_key(c)))
        .collect();

    diff
}

/// A category as submitted by a client when planning a budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPlan {
    pub category_id: Uuid,
    pub amount_planned: Option<i64>,
    /// Echo of the flag clients receive with budget categories. Submitting a
    /// default category is rejected.
    #[serde(default)]
    pub is_default: bool,
}

impl CategoryPlan {
    pub fn new(category_id: Uuid, amount_planned: i64) -> Self {
        Self {
            category_id,
            amount_planned: Some(amount_planned),
            is_default: false,
        }
    }

    /// The planned amount, which every submitted category must carry.
    pub fn planned(&self) -> ResultEngine<i64> {
        self.amount_planned
            .ok_or_else(|| EngineError::field_required("amount_planned"))
    }
}

/// Diff of a budget's categories against a client category plan.
///
/// Default categories never take part in the classification: they are owned
/// by the reconciler. Every matched pair is treated as an update.
///
/// Fails with:
/// - `FieldRequired("amount_planned")` if an entry has no planned amount;
/// - `ForbiddenMutation` if an entry is (or claims to be) a default category;
/// - `Conflict` if the same category is submitted twice.
pub fn diff_categories<'a>(
    current: &'a [BudgetCategory],
    incoming: &'a [CategoryPlan],
) -> ResultEngine<Diff<'a, BudgetCategory, CategoryPlan>> {
    let defaults: HashSet<Uuid> = current
        .iter()
        .filter(|c| c.is_default)
        .map(|c| c.category_id)
        .collect();

    let mut ids = HashSet::with_capacity(incoming.len());
    for plan in incoming {
        plan.planned()?;
        if plan.is_default || defaults.contains(&plan.category_id) {
            return Err(EngineError::ForbiddenMutation(
                "default categories cannot be set".to_string(),
            ));
        }
        if !ids.insert(plan.category_id) {
            return Err(EngineError::Conflict(format!(
                "category {} submitted more than once",
                plan.category_id
            )));
        }
    }

    let mut diff = diff_by_key(
        current,
        incoming,
        |c| c.category_id,
        |p| p.category_id,
        always_differs,
    );
    diff.removed.retain(|c| !c.is_default);
    Ok(diff)
}
