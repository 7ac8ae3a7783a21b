use crate::error::{illegal_state, PlanResult};
use crate::plan::{Plan, PlanNode, PlanNodeRef};
use crate::planner::QueryContext;

/// Visits a plan bottom up, combining the results of the inputs of each node.
pub trait PlanVisitor {
    type R;

    fn visit(&self, node: &PlanNode, inputs: Vec<Self::R>) -> PlanResult<Self::R>;
}

pub fn visit<V>(visitor: &V, root: &PlanNodeRef) -> PlanResult<V::R>
where
    V: PlanVisitor,
{
    let inputs = root
        .inputs()
        .iter()
        .map(|input| visit(visitor, input))
        .collect::<PlanResult<Vec<_>>>()?;
    visitor.visit(root, inputs)
}

/// Creates the executable operator for a physical plan node.
///
/// Implemented by the execution engine, the planner only drives the translation.
pub trait OperatorFactory {
    type Operator;

    fn create(
        &self,
        node: &PlanNode,
        inputs: Vec<Self::Operator>,
        ctx: &QueryContext,
    ) -> PlanResult<Self::Operator>;
}

struct OperatorFactoryVisitor<'a, F> {
    factory: &'a F,
    ctx: &'a QueryContext,
}

impl<'a, F: OperatorFactory> PlanVisitor for OperatorFactoryVisitor<'a, F> {
    type R = F::Operator;

    fn visit(&self, node: &PlanNode, inputs: Vec<Self::R>) -> PlanResult<Self::R> {
        if !node.executable() {
            return illegal_state(format!("{} is not executable", node));
        }
        self.factory.create(node, inputs, self.ctx)
    }
}

impl Plan {
    /// Translates this plan into an operator tree of the execution engine.
    pub fn to_operator<F: OperatorFactory>(
        &self,
        factory: &F,
        ctx: &QueryContext,
    ) -> PlanResult<F::Operator> {
        visit(&OperatorFactoryVisitor { factory, ctx }, &self.root)
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::error::{PlanError, PlanResult};
    use crate::expr::{Binding, Value};
    use crate::operator::Operator::Physical;
    use crate::operator::PhysicalOperator::{PhysicalFilter, PhysicalFullScan, PhysicalUnresolvedScan};
    use crate::operator::{EntityScan, Filter, FullScan};
    use crate::plan::{OperatorFactory, Plan, PlanNode};
    use crate::planner::QueryContext;
    use crate::stat::Selectivity;
    use crate::test_utils::{eq_predicate, test_catalogue, test_entity};

    /// Renders operators as strings, with literals resolved.
    struct StringFactory;

    impl OperatorFactory for StringFactory {
        type Operator = String;

        fn create(
            &self,
            node: &PlanNode,
            inputs: Vec<String>,
            ctx: &QueryContext,
        ) -> PlanResult<String> {
            let name = match node.operator() {
                Physical(PhysicalFilter(filter)) => {
                    let values: Vec<String> = filter
                        .predicate()
                        .atomics()
                        .iter()
                        .flat_map(|a| a.right.iter())
                        .map(|b| match b {
                            Binding::Literal(idx) => {
                                ctx.bindings().get(*idx).map(|v| format!("{:?}", v))
                            }
                            other => Ok(other.to_string()),
                        })
                        .collect::<PlanResult<_>>()?;
                    format!("Filter[{}]", values.join(","))
                }
                Physical(PhysicalFullScan(scan)) => format!("Scan[{}]", scan.entity().name()),
                op => op.name().to_string(),
            };
            Ok(format!("{}({})", name, inputs.iter().join(",")))
        }
    }

    #[test]
    fn test_to_operator() {
        let entity = test_entity("t1", 100);
        let scan = PlanNode::physical(
            0,
            PhysicalFullScan(FullScan::new(EntityScan::new(
                entity.clone(),
                entity.columns().to_vec(),
            ))),
            vec![],
        )
        .unwrap();
        let filter = PlanNode::physical(
            0,
            PhysicalFilter(Filter::with_selectivity(
                eq_predicate(&entity, "x", 0),
                Selectivity::ALL,
            )),
            vec![scan],
        )
        .unwrap();
        let plan = Plan::new(filter.clone());

        let mut ctx = QueryContext::new(filter, test_catalogue());
        ctx.bindings_mut().bind(Value::Int(42));

        assert_eq!(
            "Filter[Int(42)](Scan[t1]())",
            plan.to_operator(&StringFactory, &ctx).unwrap()
        );
    }

    #[test]
    fn test_to_operator_requires_executable_plan() {
        let entity = test_entity("t1", 100);
        let scan = PlanNode::physical(
            0,
            PhysicalUnresolvedScan(EntityScan::new(entity.clone(), entity.columns().to_vec())),
            vec![],
        )
        .unwrap();
        let plan = Plan::new(scan.clone());
        let ctx = QueryContext::new(scan, test_catalogue());

        let result = plan.to_operator(&StringFactory, &ctx);
        assert!(matches!(result, Err(PlanError::IllegalState(_))));

        // Missing literals are reported.
        let filter = PlanNode::physical(
            0,
            PhysicalFilter(Filter::new(eq_predicate(&entity, "x", 3))),
            vec![PlanNode::physical(
                0,
                PhysicalFullScan(FullScan::new(EntityScan::new(
                    entity.clone(),
                    entity.columns().to_vec(),
                ))),
                vec![],
            )
            .unwrap()],
        )
        .unwrap();
        let result = Plan::new(filter).to_operator(&StringFactory, &ctx);
        assert!(matches!(result, Err(PlanError::MissingBinding(3))));
    }
}
