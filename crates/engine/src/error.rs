//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`FieldRequired`] thrown when an input is missing a mandatory field.
//! - [`NotFound`] thrown when an item is not found for the caller.
//! - [`ForbiddenMutation`] thrown when a default category would be edited by
//!   the client, or a category is not owned by the budget's user.
//! - [`Conflict`] thrown when the change clashes with the current state (the
//!   item already exists, is still in use, or was modified concurrently).
//!
//!  [`FieldRequired`]: EngineError::FieldRequired
//!  [`NotFound`]: EngineError::NotFound
//!  [`ForbiddenMutation`]: EngineError::ForbiddenMutation
//!  [`Conflict`]: EngineError::Conflict
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

/// Kind of item a [`EngineError::NotFound`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    User,
    Category,
    Budget,
    Transaction,
    Asset,
    Card,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Category => "category",
            Self::Budget => "budget",
            Self::Transaction => "transaction",
            Self::Asset => "asset",
            Self::Card => "card",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("field '{0}' is required")]
    FieldRequired(String),
    #[error("{kind} \"{id}\" not found")]
    NotFound { kind: Resource, id: String },
    #[error("Forbidden: {0}")]
    ForbiddenMutation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Inconsistent budget: {0}")]
    Inconsistent(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub fn not_found(kind: Resource, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn field_required(field: &str) -> Self {
        Self::FieldRequired(field.to_string())
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::FieldRequired(a), Self::FieldRequired(b)) => a == b,
            (
                Self::NotFound { kind: ka, id: ia },
                Self::NotFound { kind: kb, id: ib },
            ) => ka == kb && ia == ib,
            (Self::ForbiddenMutation(a), Self::ForbiddenMutation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::Inconsistent(a), Self::Inconsistent(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
