use std::borrow::Cow;
use std::io::{BufWriter, Write};

use ptree::print_config::UTF_CHARS;
use ptree::{write_tree_with, PrintConfig, Style, TreeItem};

use crate::plan::{Plan, PlanNode};

/// A plan node as printed by [`explain`].
#[derive(Clone)]
struct ExplainItem<'a> {
    node: &'a PlanNode,
    verbose: bool,
}

impl<'a> TreeItem for ExplainItem<'a> {
    type Child = Self;

    fn write_self<W: Write>(&self, f: &mut W, style: &Style) -> std::io::Result<()> {
        write!(f, "{}", style.paint(&self.node.operator))?;
        if self.verbose {
            if self.node.group_id != 0 {
                write!(f, " #{}", self.node.group_id)?;
            }
            if let Some(props) = &self.node.physical {
                write!(f, " rows={} cost=({})", props.output_size, props.cost)?;
            }
        }
        Ok(())
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(
            self.node
                .inputs
                .iter()
                .map(|c| ExplainItem {
                    node: c,
                    verbose: self.verbose,
                })
                .collect::<Vec<ExplainItem<'a>>>(),
        )
    }
}

/// Writes `plan` as a tree. Verbose output adds the group of sub-query nodes, and output size
/// and cost of physical nodes.
pub fn explain<W: Write>(plan: &Plan, output: &mut W, verbose: bool) -> std::io::Result<()> {
    let config = PrintConfig {
        indent: 3,
        characters: UTF_CHARS.into(),
        ..Default::default()
    };
    let root = ExplainItem {
        node: &plan.root,
        verbose,
    };
    write_tree_with(&root, output, &config)
}

pub fn explain_to_string(plan: &Plan) -> std::io::Result<String> {
    to_string(plan, false)
}

pub fn explain_verbose_to_string(plan: &Plan) -> std::io::Result<String> {
    to_string(plan, true)
}

fn to_string(plan: &Plan, verbose: bool) -> std::io::Result<String> {
    let mut buf = BufWriter::new(Vec::new());
    explain(plan, &mut buf, verbose)?;
    let bytes = buf.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use crate::expr::SortOrder;
    use crate::operator::PhysicalOperator::{PhysicalFetch, PhysicalLimit};
    use crate::operator::{Fetch, Limit};
    use crate::plan::explain::{explain_to_string, explain_verbose_to_string};
    use crate::plan::{LogicalPlanBuilder, Plan, PlanNode};
    use crate::test_utils::{column, eq_predicate, index_scan, test_catalogue};
    use crate::cost::Cost;

    #[test]
    fn test_explain_logical_plan() {
        let catalogue = test_catalogue();
        let t1 = catalogue.entity("t1").unwrap();
        let plan = LogicalPlanBuilder::new(catalogue.clone())
            .scan_columns("t1", &["id", "x"])
            .filter(eq_predicate(&t1, "x", 0))
            .sort(&[("id", SortOrder::Descending)])
            .limit(10, 0)
            .build()
            .unwrap();

        let expected_result = "\
LogicalLimit { limit: 10 }
└─ LogicalSort { order: [id DESC] }
   └─ LogicalFilter { predicate: x = :0 }
      └─ LogicalScan { entity: \"t1\", fetch: [id, x] }
";

        let result = explain_to_string(&plan).unwrap();

        assert_eq!(expected_result, result);
    }

    #[test]
    fn test_explain_physical_plan() {
        let catalogue = test_catalogue();
        let t1 = catalogue.entity("t1").unwrap();
        let plan = {
            let scan = index_scan(&t1, "x", Cost::io(1.0));
            let fetch = PlanNode::physical(
                0,
                PhysicalFetch(Fetch::new(t1.clone(), vec![column(&t1, "name")])),
                vec![scan],
            )
            .unwrap();
            Plan::new(
                PlanNode::physical(0, PhysicalLimit(Limit::with_skip(5, 2)), vec![fetch]).unwrap(),
            )
        };

        let expected_result = "\
PhysicalLimit { limit: 5, skip: 2 }
└─ PhysicalFetch { entity: \"t1\", fetch: [name] }
   └─ PhysicalIndexScan { entity: \"t1\", index: \"t1_x\", predicate: x = :0, fetch: [x] }
";
        let result = explain_to_string(&plan).unwrap();
        assert_eq!(expected_result, result);
    }

    #[test]
    fn test_explain_verbose() {
        let catalogue = test_catalogue();
        let t1 = catalogue.entity("t1").unwrap();
        let plan = Plan::new(index_scan(&t1, "x", Cost::io(1.0)));

        let result = explain_verbose_to_string(&plan).unwrap();
        assert!(result.starts_with("PhysicalIndexScan"));
        assert!(result.contains(" rows=10 cost=(io=1.000e0"));
    }
}
