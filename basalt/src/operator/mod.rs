//! Contains the operators a plan is built from: scans, filters, sorts, projections, etc.
//!
//! They are classified into two categories: logical and physical. Logical operators describe
//! what a query computes, physical operators how it is executed. Operator payloads such as
//! [`Filter`] are shared by both families, while the physical family adds access paths like
//! [`IndexScan`] and [`FullScan`] that only exist after implementation.
mod logical;
pub use logical::*;
mod physical;
pub use physical::*;
mod filter;
pub use filter::*;
mod projection;
pub use projection::*;
mod scan;
pub use scan::*;
mod sort;
pub use sort::*;

use std::fmt::{Display, Formatter};

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;

use crate::catalog::ColumnDef;
use crate::operator::Operator::{Logical, Physical};
use crate::plan::PlanNodeRef;

#[derive(Clone, Debug, Hash, Eq, PartialEq, EnumAsInner)]
pub enum Operator {
    Logical(LogicalOperator),
    Physical(PhysicalOperator),
}

/// Number of inputs an operator accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Nullary,
    Unary,
    Binary,
    /// One or more inputs.
    NAry,
}

impl Arity {
    pub fn accepts(&self, inputs: usize) -> bool {
        match self {
            Arity::Nullary => inputs == 0,
            Arity::Unary => inputs == 1,
            Arity::Binary => inputs == 2,
            Arity::NAry => inputs >= 1,
        }
    }
}

#[enum_dispatch(LogicalOperator, PhysicalOperator)]
pub trait OperatorTrait {
    fn arity(&self) -> Arity;

    /// Columns produced by this operator, given its inputs.
    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef>;

    /// Columns this operator reads from its inputs.
    fn requires(&self) -> Vec<ColumnDef> {
        vec![]
    }
}

#[enum_dispatch(LogicalOperator, PhysicalOperator)]
pub trait DisplayFields {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result;
}

impl Operator {
    pub fn arity(&self) -> Arity {
        match self {
            Logical(op) => op.arity(),
            Physical(op) => op.arity(),
        }
    }

    pub fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        match self {
            Logical(op) => op.derive_columns(inputs),
            Physical(op) => op.derive_columns(inputs),
        }
    }

    pub fn requires(&self) -> Vec<ColumnDef> {
        match self {
            Logical(op) => op.requires(),
            Physical(op) => op.requires(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Logical(op) => op.as_ref(),
            Physical(op) => op.as_ref(),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Logical(op) => write!(f, "{}", op),
            Physical(op) => write!(f, "{}", op),
        }
    }
}

/// Columns of the input at `idx`, empty if there is no such input.
fn input_columns(inputs: &[PlanNodeRef], idx: usize) -> Vec<ColumnDef> {
    inputs
        .get(idx)
        .map(|input| input.columns().to_vec())
        .unwrap_or_default()
}

/// Formats columns as `[a, b]`.
fn display_columns(columns: &[ColumnDef]) -> String {
    let names: Vec<&str> = columns.iter().map(|c| c.name()).collect();
    format!("[{}]", names.join(", "))
}
