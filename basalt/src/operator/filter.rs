use std::fmt::Formatter;

use crate::catalog::ColumnDef;
use crate::expr::Predicate;
use crate::operator::{input_columns, Arity, DisplayFields, OperatorTrait};
use crate::plan::PlanNodeRef;
use crate::stat::Selectivity;

/// Keeps rows matching a predicate.
///
/// The selectivity is estimated when the filter is implemented, logical filters don't carry one.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Filter {
    predicate: Predicate,
    selectivity: Option<Selectivity>,
}

impl Filter {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            selectivity: None,
        }
    }

    pub fn with_selectivity(predicate: Predicate, selectivity: Selectivity) -> Self {
        Self {
            predicate,
            selectivity: Some(selectivity),
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn selectivity(&self) -> Option<Selectivity> {
        self.selectivity
    }
}

impl OperatorTrait for Filter {
    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        input_columns(inputs, 0)
    }

    fn requires(&self) -> Vec<ColumnDef> {
        self.predicate.columns()
    }
}

impl DisplayFields for Filter {
    fn display(&self, fmt: &mut Formatter) -> std::fmt::Result {
        let mut s = fmt.debug_struct("");
        s.field("predicate", &format_args!("{}", self.predicate));
        if let Some(selectivity) = self.selectivity {
            s.field("selectivity", &format_args!("{}", selectivity));
        }
        s.finish()
    }
}

/// Keeps rows of the first input matching a predicate that refers to the second input, the
/// result of a sub-query.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct SubSelectFilter {
    predicate: Predicate,
    selectivity: Option<Selectivity>,
}

impl SubSelectFilter {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            selectivity: None,
        }
    }

    pub fn with_selectivity(predicate: Predicate, selectivity: Selectivity) -> Self {
        Self {
            predicate,
            selectivity: Some(selectivity),
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn selectivity(&self) -> Option<Selectivity> {
        self.selectivity
    }
}

impl OperatorTrait for SubSelectFilter {
    fn arity(&self) -> Arity {
        Arity::Binary
    }

    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        input_columns(inputs, 0)
    }

    fn requires(&self) -> Vec<ColumnDef> {
        self.predicate.columns()
    }
}

impl DisplayFields for SubSelectFilter {
    fn display(&self, fmt: &mut Formatter) -> std::fmt::Result {
        let mut s = fmt.debug_struct("");
        s.field("predicate", &format_args!("{}", self.predicate));
        if let Some(selectivity) = self.selectivity {
            s.field("selectivity", &format_args!("{}", selectivity));
        }
        s.finish()
    }
}
