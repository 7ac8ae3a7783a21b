pub mod catalog;

use std::fmt::Debug;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use basalt::catalog::Catalogue;
use basalt::cost::CostPolicy;
use basalt::expr::{Binding, ComparisonOperator, Distance, Predicate, SortOrder};
use basalt::plan::{explain_to_string, LogicalPlanBuilder, Plan};
use basalt::planner::QueryPlanner;
use serde::Deserialize;
use serde::Serialize;

/// Nearest neighbour search by euclidean distance, ordered ascending and limited to `k`.
#[derive(Serialize, Deserialize)]
pub struct Nearest {
    pub column: String,
    pub k: u64,
    #[serde(default = "default_distance_column")]
    pub out: String,
}

fn default_distance_column() -> String {
    "distance".to_string()
}

#[derive(Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    #[serde(default)]
    pub descending: bool,
}

/// A query over a single entity. Each filter column is compared for equality with the next
/// literal binding.
#[derive(Serialize, Deserialize)]
pub struct Query {
    pub entity: String,
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub filter: Vec<String>,
    pub nearest: Option<Nearest>,
    #[serde(default)]
    pub order: Vec<Order>,
    pub limit: Option<u64>,
}

impl Query {
    pub fn to_logical_plan(&self, catalogue: Arc<dyn Catalogue>) -> anyhow::Result<Plan> {
        let entity = catalogue
            .entity(&self.entity)
            .with_context(|| format!("Unknown entity: {}", self.entity))?;

        let mut builder = LogicalPlanBuilder::new(catalogue.clone());
        match &self.columns {
            Some(columns) => {
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                builder.scan_columns(&self.entity, &columns);
            }
            None => {
                builder.scan(&self.entity);
            }
        }

        let mut literals = 0;
        let mut predicate: Option<Predicate> = None;
        for name in &self.filter {
            let column = entity
                .column(name)
                .cloned()
                .with_context(|| format!("Unknown column: {}.{}", self.entity, name))?;
            let comparison = Predicate::comparison(
                column,
                ComparisonOperator::Equal,
                vec![Binding::Literal(literals)],
            );
            literals += 1;
            predicate = Some(match predicate {
                Some(p) => p.and(comparison),
                None => comparison,
            });
        }
        if let Some(predicate) = predicate {
            builder.filter(predicate);
        }

        if let Some(nearest) = &self.nearest {
            builder
                .distance(
                    &nearest.column,
                    Binding::Literal(literals),
                    Distance::Euclidean,
                    &nearest.out,
                )
                .sort(&[(nearest.out.as_str(), SortOrder::Ascending)])
                .limit(nearest.k, 0);
        }

        if !self.order.is_empty() {
            let order: Vec<(&str, SortOrder)> = self
                .order
                .iter()
                .map(|o| {
                    let order = if o.descending {
                        SortOrder::Descending
                    } else {
                        SortOrder::Ascending
                    };
                    (o.column.as_str(), order)
                })
                .collect();
            builder.sort(&order);
        }

        if let Some(limit) = self.limit {
            builder.limit(limit, 0);
        }

        Ok(builder.build()?)
    }
}

#[derive(Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub query: Query,
    pub policy: Option<CostPolicy>,
    pub expected_plan: String,
}

pub struct TestCaseRunner {
    /// Input file path.
    pub paths: Vec<PathBuf>,
    pub catalogue: Arc<dyn Catalogue>,
    pub planner: QueryPlanner,
}

impl TestCaseRunner {
    pub fn run(self) {
        for path in &self.paths {
            let file = File::options()
                .read(true)
                .open(path)
                .with_context(|| format!("Failed to open test case file: {:?}", &path))
                .unwrap();

            let test_cases: Vec<TestCase> = serde_yaml::from_reader(file)
                .with_context(|| format!("Failed to load test cases from file: {:?}", &path))
                .unwrap();

            for test_case in test_cases {
                self.run_case(path, test_case);
            }
        }
    }

    fn run_case<P: AsRef<Path> + Debug>(&self, path: &P, test_case: TestCase) {
        let logical = test_case
            .query
            .to_logical_plan(self.catalogue.clone())
            .unwrap();

        let mut ctx = self
            .planner
            .new_context(logical.root(), self.catalogue.clone())
            .bypass_cache(true)
            .cache(false);
        if let Some(policy) = test_case.policy {
            ctx = ctx.with_policy(policy);
        }

        let selected = self.planner.plan_and_select(&ctx).unwrap();
        let selected_string = explain_to_string(&selected).unwrap();

        assert_eq!(
            test_case.expected_plan, selected_string,
            "Plan for {} in {:?} is different.",
            test_case.name, path
        );
    }
}
