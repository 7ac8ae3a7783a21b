use std::fmt::Formatter;

use crate::catalog::ColumnDef;
use crate::expr::FunctionCall;
use crate::operator::{display_columns, input_columns, Arity, DisplayFields, OperatorTrait};
use crate::plan::PlanNodeRef;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Projection {
    columns: Vec<ColumnDef>,
}

impl Projection {
    pub fn new<I: IntoIterator<Item = ColumnDef>>(columns: I) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }
}

impl OperatorTrait for Projection {
    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn derive_columns(&self, _inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        self.columns.clone()
    }

    fn requires(&self) -> Vec<ColumnDef> {
        self.columns.clone()
    }
}

impl DisplayFields for Projection {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("columns", &format_args!("{}", display_columns(&self.columns)))
            .finish()
    }
}

/// Evaluates a function per row and appends the result as column `out`.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Function {
    function: FunctionCall,
    out: ColumnDef,
}

impl Function {
    pub fn new(function: FunctionCall, out: ColumnDef) -> Self {
        Self { function, out }
    }

    pub fn function(&self) -> &FunctionCall {
        &self.function
    }

    pub fn out(&self) -> &ColumnDef {
        &self.out
    }
}

impl OperatorTrait for Function {
    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        let mut columns = input_columns(inputs, 0);
        if !columns.contains(&self.out) {
            columns.push(self.out.clone());
        }
        columns
    }

    fn requires(&self) -> Vec<ColumnDef> {
        self.function.columns()
    }
}

impl DisplayFields for Function {
    fn display(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("")
            .field("function", &format_args!("{}", self.function))
            .field("out", &format_args!("{}", self.out))
            .finish()
    }
}

/// Concatenates the rows of all inputs.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct Union {}

impl Union {
    pub fn new() -> Self {
        Self {}
    }
}

impl OperatorTrait for Union {
    fn arity(&self) -> Arity {
        Arity::NAry
    }

    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        input_columns(inputs, 0)
    }
}

impl DisplayFields for Union {
    fn display(&self, _f: &mut Formatter) -> std::fmt::Result {
        Ok(())
    }
}
