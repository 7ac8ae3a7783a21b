//! Predicates, functions and value bindings referenced by operators.

use std::fmt::{Display, Formatter};

use crate::catalog::ColumnDef;
use crate::error::{PlanError, PlanResult};
use crate::plan::GroupId;

/// A literal value bound to a query.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    FloatVector(Vec<f32>),
}

/// Reference to a value an operator works on.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Binding {
    Column(ColumnDef),
    /// Positional literal bound in the query's [`BindingContext`]. Plans refer to literals only
    /// by position, so the same plan can be reused with different values.
    Literal(usize),
    /// Result of the sub-query planned as the given group.
    Subquery(GroupId),
}

impl Binding {
    pub fn column(&self) -> Option<&ColumnDef> {
        match self {
            Binding::Column(c) => Some(c),
            _ => None,
        }
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Column(c) => write!(f, "{}", c),
            Binding::Literal(idx) => write!(f, ":{}", idx),
            Binding::Subquery(group) => write!(f, "${}", group),
        }
    }
}

/// Values of the literal bindings of a query.
#[derive(Clone, Debug, Default)]
pub struct BindingContext {
    values: Vec<Value>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a new value and returns the binding referring to it.
    pub fn bind(&mut self, value: Value) -> Binding {
        self.values.push(value);
        Binding::Literal(self.values.len() - 1)
    }

    pub fn update(&mut self, binding: &Binding, value: Value) -> PlanResult<()> {
        match binding {
            Binding::Literal(idx) => match self.values.get_mut(*idx) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(PlanError::MissingBinding(*idx)),
            },
            other => Err(PlanError::IllegalState(format!(
                "binding {} is not a literal",
                other
            ))),
        }
    }

    pub fn get(&self, idx: usize) -> PlanResult<&Value> {
        self.values.get(idx).ok_or(PlanError::MissingBinding(idx))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Between,
    In,
    IsNull,
    Like,
    /// Full text match, can only be answered by an index.
    Match,
}

impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::GreaterEqual => ">=",
            ComparisonOperator::Less => "<",
            ComparisonOperator::LessEqual => "<=",
            ComparisonOperator::Between => "BETWEEN",
            ComparisonOperator::In => "IN",
            ComparisonOperator::IsNull => "IS NULL",
            ComparisonOperator::Like => "LIKE",
            ComparisonOperator::Match => "MATCH",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Comparison {
    pub left: Binding,
    pub operator: ComparisonOperator,
    pub right: Vec<Binding>,
    pub negated: bool,
}

impl Display for Comparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "NOT ")?;
        }
        write!(f, "{} {}", self.left, self.operator)?;
        for (idx, binding) in self.right.iter().enumerate() {
            let sep = if idx == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, binding)?;
        }
        Ok(())
    }
}

/// Boolean predicate evaluated by filters and boolean index scans.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Predicate {
    Comparison(Comparison),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn comparison(left: ColumnDef, operator: ComparisonOperator, right: Vec<Binding>) -> Self {
        Predicate::Comparison(Comparison {
            left: Binding::Column(left),
            operator,
            right,
            negated: false,
        })
    }

    pub fn not(self) -> Self {
        match self {
            Predicate::Comparison(mut c) => {
                c.negated = !c.negated;
                Predicate::Comparison(c)
            }
            Predicate::And(l, r) => Predicate::Or(Box::new(l.not()), Box::new(r.not())),
            Predicate::Or(l, r) => Predicate::And(Box::new(l.not()), Box::new(r.not())),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Atomic comparisons of this predicate in evaluation order.
    pub fn atomics(&self) -> Vec<&Comparison> {
        let mut atomics = Vec::new();
        self.collect_atomics(&mut atomics);
        atomics
    }

    fn collect_atomics<'a>(&'a self, atomics: &mut Vec<&'a Comparison>) {
        match self {
            Predicate::Comparison(c) => atomics.push(c),
            Predicate::And(l, r) | Predicate::Or(l, r) => {
                l.collect_atomics(atomics);
                r.collect_atomics(atomics);
            }
        }
    }

    /// Columns this predicate reads, without duplicates.
    pub fn columns(&self) -> Vec<ColumnDef> {
        let mut columns: Vec<ColumnDef> = Vec::new();
        for atomic in self.atomics() {
            let bindings = std::iter::once(&atomic.left).chain(atomic.right.iter());
            for column in bindings.filter_map(Binding::column) {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        columns
    }

    /// Whether the predicate can only be evaluated with the help of an index.
    pub fn requires_index(&self) -> bool {
        self.atomics()
            .iter()
            .any(|c| c.operator == ComparisonOperator::Match)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Comparison(c) => write!(f, "{}", c),
            Predicate::And(l, r) => write!(f, "({} AND {})", l, r),
            Predicate::Or(l, r) => write!(f, "({} OR {})", l, r),
        }
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Distance {
    Manhattan,
    Euclidean,
    SquaredEuclidean,
    Cosine,
    InnerProduct,
}

impl Distance {
    /// Floating point operations needed per vector dimension.
    pub fn flops_per_dimension(&self) -> f64 {
        match self {
            Distance::Manhattan => 3.0,
            Distance::Euclidean | Distance::SquaredEuclidean => 3.0,
            Distance::Cosine => 6.0,
            Distance::InnerProduct => 2.0,
        }
    }

    /// Constant number of operations added once per evaluation.
    pub fn flops_constant(&self) -> f64 {
        match self {
            Distance::Euclidean => 1.0,
            Distance::Cosine => 3.0,
            _ => 0.0,
        }
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Distance::Manhattan => "manhattan",
            Distance::Euclidean => "euclidean",
            Distance::SquaredEuclidean => "squaredeuclidean",
            Distance::Cosine => "cosine",
            Distance::InnerProduct => "innerproduct",
        };
        write!(f, "{}", name)
    }
}

/// Function evaluated once per row.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum FunctionCall {
    Distance {
        column: ColumnDef,
        query: Binding,
        distance: Distance,
    },
}

impl FunctionCall {
    /// Columns read by the function.
    pub fn columns(&self) -> Vec<ColumnDef> {
        match self {
            FunctionCall::Distance { column, .. } => vec![column.clone()],
        }
    }

    /// Floating point operations per evaluation.
    pub fn flops(&self) -> f64 {
        match self {
            FunctionCall::Distance {
                column, distance, ..
            } => {
                let dims = column.dimensions().unwrap_or(1) as f64;
                dims * distance.flops_per_dimension() + distance.flops_constant()
            }
        }
    }

    /// Memory accesses per evaluation.
    pub fn memory_accesses(&self) -> f64 {
        match self {
            FunctionCall::Distance { column, .. } => 2.0 * column.dimensions().unwrap_or(1) as f64,
        }
    }
}

impl Display for FunctionCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionCall::Distance {
                column,
                query,
                distance,
            } => write!(f, "{}({}, {})", distance, column, query),
        }
    }
}

/// Nearest neighbour search: the `k` rows whose `column` is closest to `query`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ProximityPredicate {
    pub column: ColumnDef,
    pub query: Binding,
    pub k: u64,
    pub distance: Distance,
    /// Column the computed distance is written to.
    pub out: ColumnDef,
}

impl Display for ProximityPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "knn(k={}, {}({}, {}) -> {})",
            self.k, self.distance, self.column, self.query, self.out
        )
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ASC"),
            SortOrder::Descending => write!(f, "DESC"),
        }
    }
}
