use std::sync::Arc;

use arrow_schema::DataType;

use crate::catalog::{Catalogue, ColumnDef};
use crate::error::{PlanError, PlanResult};
use crate::expr::{Binding, Distance, FunctionCall, Predicate, SortOrder};
use crate::operator::LogicalOperator::{
    LogicalFilter, LogicalFilterOnSubSelect, LogicalFunction, LogicalLimit, LogicalProjection,
    LogicalSample, LogicalScan, LogicalSort, LogicalUnion,
};
use crate::operator::{
    EntitySample, EntityScan, Filter, Function, Limit, LogicalOperator, Projection, Sort,
    SubSelectFilter, Union,
};
use crate::plan::{GroupId, Plan, PlanNode, PlanNodeRef};

/// Builds logical plans bottom up.
///
/// Errors, e.g. unknown entities or columns, are remembered and returned by [`build`], so calls
/// can be chained.
///
/// [`build`]: LogicalPlanBuilder::build
pub struct LogicalPlanBuilder {
    catalogue: Arc<dyn Catalogue>,
    group_id: GroupId,
    root: Option<PlanNodeRef>,
    error: Option<PlanError>,
}

impl LogicalPlanBuilder {
    pub fn new(catalogue: Arc<dyn Catalogue>) -> Self {
        Self::with_group(catalogue, 0)
    }

    /// Builder for a sub-query planned as group `group_id`.
    pub fn with_group(catalogue: Arc<dyn Catalogue>, group_id: GroupId) -> Self {
        Self {
            catalogue,
            group_id,
            root: None,
            error: None,
        }
    }

    fn fail(&mut self, error: PlanError) -> &mut Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    fn push(&mut self, operator: LogicalOperator, inputs: Vec<PlanNodeRef>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        match PlanNode::logical(self.group_id, operator, inputs) {
            Ok(node) => {
                self.root = Some(node);
                self
            }
            Err(e) => self.fail(e),
        }
    }

    /// Pushes a unary operator on top of the current root.
    fn push_unary(&mut self, operator: LogicalOperator) -> &mut Self {
        match self.root.clone() {
            Some(root) => self.push(operator, vec![root]),
            None => self.fail(PlanError::IllegalState(format!(
                "{} requires an input",
                operator.as_ref()
            ))),
        }
    }

    /// Column of the current root named `name`.
    pub fn column(&self, name: &str) -> PlanResult<ColumnDef> {
        self.root
            .as_ref()
            .and_then(|r| r.columns().iter().find(|c| c.name() == name).cloned())
            .ok_or_else(|| PlanError::IllegalState(format!("unknown column {}", name)))
    }

    fn columns(&self, names: &[&str]) -> PlanResult<Vec<ColumnDef>> {
        names.iter().map(|name| self.column(name)).collect()
    }

    /// Scans all columns of `entity`.
    pub fn scan(&mut self, entity: &str) -> &mut Self {
        match self.catalogue.entity(entity) {
            Some(e) => {
                let fetch = e.columns().to_vec();
                self.push(LogicalScan(EntityScan::new(e, fetch)), vec![])
            }
            None => self.fail(PlanError::IllegalState(format!("unknown entity {}", entity))),
        }
    }

    /// Scans the given columns of `entity`.
    pub fn scan_columns(&mut self, entity: &str, columns: &[&str]) -> &mut Self {
        let e = match self.catalogue.entity(entity) {
            Some(e) => e,
            None => {
                return self.fail(PlanError::IllegalState(format!("unknown entity {}", entity)))
            }
        };
        let mut fetch = Vec::with_capacity(columns.len());
        for name in columns {
            match e.column(name) {
                Some(c) => fetch.push(c.clone()),
                None => {
                    return self.fail(PlanError::IllegalState(format!(
                        "unknown column {}.{}",
                        entity, name
                    )))
                }
            }
        }
        self.push(LogicalScan(EntityScan::new(e, fetch)), vec![])
    }

    pub fn sample(&mut self, entity: &str, size: u64, seed: u64) -> &mut Self {
        match self.catalogue.entity(entity) {
            Some(e) => {
                let fetch = e.columns().to_vec();
                self.push(
                    LogicalSample(EntitySample::new(e, fetch, size, seed)),
                    vec![],
                )
            }
            None => self.fail(PlanError::IllegalState(format!("unknown entity {}", entity))),
        }
    }

    pub fn filter(&mut self, predicate: Predicate) -> &mut Self {
        self.push_unary(LogicalFilter(Filter::new(predicate)))
    }

    /// Filters with a predicate on the result of `subquery`, which must belong to another group.
    pub fn filter_on_sub_select(&mut self, predicate: Predicate, subquery: PlanNodeRef) -> &mut Self {
        if subquery.group_id() == self.group_id {
            return self.fail(PlanError::IllegalState(format!(
                "sub-query must not belong to group {}",
                self.group_id
            )));
        }
        match self.root.clone() {
            Some(root) => self.push(
                LogicalFilterOnSubSelect(SubSelectFilter::new(predicate)),
                vec![root, subquery],
            ),
            None => self.fail(PlanError::IllegalState(
                "filter on sub-select requires an input".to_string(),
            )),
        }
    }

    pub fn sort(&mut self, order: &[(&str, SortOrder)]) -> &mut Self {
        let mut resolved = Vec::with_capacity(order.len());
        for (name, order) in order {
            match self.column(name) {
                Ok(column) => resolved.push((column, *order)),
                Err(e) => return self.fail(e),
            }
        }
        self.push_unary(LogicalSort(Sort::new(resolved)))
    }

    pub fn limit(&mut self, limit: u64, skip: u64) -> &mut Self {
        self.push_unary(LogicalLimit(Limit::with_skip(limit, skip)))
    }

    pub fn project(&mut self, columns: &[&str]) -> &mut Self {
        match self.columns(columns) {
            Ok(columns) => self.push_unary(LogicalProjection(Projection::new(columns))),
            Err(e) => self.fail(e),
        }
    }

    pub fn function(&mut self, function: FunctionCall, out: ColumnDef) -> &mut Self {
        self.push_unary(LogicalFunction(Function::new(function, out)))
    }

    /// Computes the distance between `column` and `query`, written to a new column `out`.
    pub fn distance(
        &mut self,
        column: &str,
        query: Binding,
        distance: Distance,
        out: &str,
    ) -> &mut Self {
        match self.column(column) {
            Ok(column) => {
                let function = FunctionCall::Distance {
                    column,
                    query,
                    distance,
                };
                self.function(function, ColumnDef::new(out, DataType::Float64, false))
            }
            Err(e) => self.fail(e),
        }
    }

    /// Concatenates the current root with `others`.
    pub fn union<I: IntoIterator<Item = PlanNodeRef>>(&mut self, others: I) -> &mut Self {
        match self.root.clone() {
            Some(root) => {
                let inputs = std::iter::once(root).chain(others).collect();
                self.push(LogicalUnion(Union::new()), inputs)
            }
            None => self.fail(PlanError::IllegalState("union requires an input".to_string())),
        }
    }

    /// Consumes current plan, but not the rest of the state, e.g. the group id.
    pub fn build(&mut self) -> PlanResult<Plan> {
        if let Some(error) = self.error.take() {
            self.root = None;
            return Err(error);
        }
        self.root
            .take()
            .map(Plan::new)
            .ok_or_else(|| PlanError::IllegalState("empty plan".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::PlanError;
    use crate::expr::SortOrder;
    use crate::plan::LogicalPlanBuilder;
    use crate::test_utils::test_catalogue;

    #[test]
    fn test_build_records_first_error() {
        let result = LogicalPlanBuilder::new(test_catalogue())
            .scan("unknown")
            .project(&["x"])
            .build();

        match result {
            Err(PlanError::IllegalState(msg)) => assert_eq!("unknown entity unknown", msg),
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_unknown_column() {
        let result = LogicalPlanBuilder::new(test_catalogue())
            .scan_columns("t1", &["id", "x"])
            .sort(&[("name", SortOrder::Ascending)])
            .build();

        assert!(matches!(result, Err(PlanError::IllegalState(_))));
    }

    #[test]
    fn test_build_columns() {
        let plan = LogicalPlanBuilder::new(test_catalogue())
            .scan("t1")
            .project(&["x", "id"])
            .limit(10, 0)
            .build()
            .unwrap();

        let root = plan.root();
        let names: Vec<&str> = root.columns().iter().map(|c| c.name()).collect();
        assert_eq!(vec!["x", "id"], names);
    }
}
