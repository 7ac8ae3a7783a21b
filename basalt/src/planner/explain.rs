use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use prettytable::Table;

use crate::plan::{GroupId, PlanNode};
use crate::planner::ScoredCandidate;

/// Ranked candidates of every group of a query, as returned by [`QueryPlanner::explain`].
///
/// [`QueryPlanner::explain`]: crate::planner::QueryPlanner::explain
#[derive(Debug)]
pub struct Explanation {
    groups: BTreeMap<GroupId, Vec<ScoredCandidate>>,
}

impl Explanation {
    pub fn new(groups: BTreeMap<GroupId, Vec<ScoredCandidate>>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.keys().copied()
    }

    /// Candidates of `group_id`, best first.
    pub fn candidates(&self, group_id: GroupId) -> &[ScoredCandidate] {
        self.groups
            .get(&group_id)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    pub fn winner(&self, group_id: GroupId) -> Option<&ScoredCandidate> {
        self.candidates(group_id).first()
    }
}

/// One line per node, indented by depth.
fn breakdown(node: &PlanNode, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!(
        "{}{} rows={} cost=({})",
        "  ".repeat(depth),
        node.operator().name(),
        node.output_size(),
        node.cost()
    ));
    for input in node.inputs() {
        breakdown(input, depth + 1, lines);
    }
}

impl Display for Explanation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (group_id, candidates) in &self.groups {
            writeln!(f, "Group {}:", group_id)?;

            let mut table = Table::new();
            table.add_row(row![
                "Rank",
                "Score",
                "Digest",
                "IO",
                "CPU",
                "Memory",
                "Accuracy",
                "Plan"
            ]);
            for (rank, candidate) in candidates.iter().enumerate() {
                let mut lines = vec![];
                breakdown(&candidate.plan.root(), 0, &mut lines);
                let normalized = &candidate.normalized;
                table.add_row(row![
                    rank + 1,
                    format!("{:.4}", candidate.score),
                    format!("{:016x}", candidate.plan.digest()),
                    format!("{:.4}", normalized.io),
                    format!("{:.4}", normalized.cpu),
                    format!("{:.4}", normalized.memory),
                    format!("{:.4}", normalized.accuracy),
                    lines.join("\n")
                ]);
            }

            writeln!(f, "{}", table)?;
        }
        Ok(())
    }
}
