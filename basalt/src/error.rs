use thiserror::Error;

use crate::plan::GroupId;

/// Errors raised by the planner.
///
/// Only the driver raises [`PlanError::Unplannable`]; it is a compilation error of the query and
/// retrying without changing the query or the schema yields the same result.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to generate an executable physical plan for group {group_id}")]
    Unplannable { group_id: GroupId },
    #[error("illegal plan state: {0}")]
    IllegalState(String),
    #[error("no value bound for literal binding {0}")]
    MissingBinding(usize),
    #[error("invalid planner configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type PlanResult<T> = Result<T, PlanError>;

/// Shorthand for a [`PlanError::IllegalState`] result.
pub(crate) fn illegal_state<T, S: Into<String>>(msg: S) -> PlanResult<T> {
    Err(PlanError::IllegalState(msg.into()))
}
