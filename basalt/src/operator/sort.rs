use std::fmt::Formatter;

use itertools::Itertools;

use crate::catalog::ColumnDef;
use crate::expr::SortOrder;
use crate::operator::{input_columns, Arity, DisplayFields, OperatorTrait};
use crate::plan::PlanNodeRef;

fn display_order(order: &[(ColumnDef, SortOrder)]) -> String {
    format!(
        "[{}]",
        order
            .iter()
            .map(|(column, order)| format!("{} {}", column, order))
            .join(", ")
    )
}

fn order_columns(order: &[(ColumnDef, SortOrder)]) -> Vec<ColumnDef> {
    order.iter().map(|(column, _)| column.clone()).collect()
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Sort {
    order: Vec<(ColumnDef, SortOrder)>,
}

impl Sort {
    pub fn new(order: Vec<(ColumnDef, SortOrder)>) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &[(ColumnDef, SortOrder)] {
        &self.order
    }
}

impl OperatorTrait for Sort {
    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        input_columns(inputs, 0)
    }

    fn requires(&self) -> Vec<ColumnDef> {
        order_columns(&self.order)
    }
}

impl DisplayFields for Sort {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("order", &format_args!("{}", display_order(&self.order)))
            .finish()
    }
}

/// Skips `skip` rows, then passes at most `limit` rows.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Limit {
    limit: u64,
    skip: u64,
}

impl Limit {
    pub fn new(limit: u64) -> Self {
        Self { limit, skip: 0 }
    }

    pub fn with_skip(limit: u64, skip: u64) -> Self {
        Self { limit, skip }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }
}

impl OperatorTrait for Limit {
    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        input_columns(inputs, 0)
    }
}

impl DisplayFields for Limit {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("limit", &self.limit);
        if self.skip > 0 {
            s.field("skip", &self.skip);
        }
        s.finish()
    }
}

/// Sort that only keeps the first `skip + limit` rows in memory.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct LimitingSort {
    order: Vec<(ColumnDef, SortOrder)>,
    limit: u64,
    skip: u64,
}

impl LimitingSort {
    pub fn new(order: Vec<(ColumnDef, SortOrder)>, limit: u64, skip: u64) -> Self {
        Self { order, limit, skip }
    }

    pub fn order(&self) -> &[(ColumnDef, SortOrder)] {
        &self.order
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }
}

impl OperatorTrait for LimitingSort {
    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        input_columns(inputs, 0)
    }

    fn requires(&self) -> Vec<ColumnDef> {
        order_columns(&self.order)
    }
}

impl DisplayFields for LimitingSort {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("order", &format_args!("{}", display_order(&self.order)))
            .field("limit", &self.limit);
        if self.skip > 0 {
            s.field("skip", &self.skip);
        }
        s.finish()
    }
}
