use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};

use log::{trace, warn};

use crate::error::PlanResult;
use crate::plan::{Digest, GroupId, PlanNodeRef};
use crate::planner::QueryContext;
use crate::rules::{RewriteRule, RuleImpl};

/// Planning stage an [`Explorer`] runs in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Logical,
    Physical,
}

/// Result of exploring a plan.
#[derive(Debug, Default)]
pub struct Exploration {
    /// Distinct plans equivalent to the explored plan, in discovery order, starting with the
    /// explored plan itself if it qualifies as a candidate.
    pub candidates: Vec<PlanNodeRef>,
    /// Non-primary inputs that belong to another group, by group. These are not explored
    /// inline but planned as a group of their own.
    pub deferred: BTreeMap<GroupId, PlanNodeRef>,
}

/// A node being explored, addressed by its path from the root of the plan it's part of.
struct Focus {
    root: PlanNodeRef,
    path: Vec<usize>,
    node: PlanNodeRef,
}

impl Focus {
    fn key(&self) -> Digest {
        let mut hasher = DefaultHasher::new();
        self.root.digest().hash(&mut hasher);
        self.path.hash(&mut hasher);
        hasher.finish()
    }
}

/// Queue that drops nodes it has seen before.
#[derive(Default)]
struct MemoizingQueue {
    queue: VecDeque<Focus>,
    seen: HashSet<Digest>,
}

impl MemoizingQueue {
    fn push(&mut self, focus: Focus) {
        if self.seen.insert(focus.key()) {
            self.queue.push_back(focus);
        }
    }

    fn pop(&mut self) -> Option<Focus> {
        self.queue.pop_front()
    }
}

/// Applies a rule set to every node of a plan, breadth first, until no new plans come up.
///
/// Each rule result replaces the node it was produced from, and the resulting plan is both a
/// candidate and explored again from its root, so rewrites that move a node below its parent
/// expose the parent to further rules. Plans are deduplicated by digest, which bounds the search
/// to the distinct reachable plans.
pub struct Explorer<'a> {
    stage: Stage,
    rules: &'a [RuleImpl],
    ctx: &'a QueryContext,
}

impl<'a> Explorer<'a> {
    pub fn new(stage: Stage, rules: &'a [RuleImpl], ctx: &'a QueryContext) -> Self {
        Self { stage, rules, ctx }
    }

    pub fn explore(&self, root: &PlanNodeRef) -> PlanResult<Exploration> {
        let mut exploration = Exploration::default();
        let mut candidates = HashSet::new();
        let mut queue = MemoizingQueue::default();

        self.offer(root, &mut exploration, &mut candidates);
        queue.push(Focus {
            root: root.clone(),
            path: vec![],
            node: root.clone(),
        });

        while let Some(focus) = queue.pop() {
            for rule in self.rules {
                if !self.ctx.is_enabled(rule.rule_id()) || !rule.can_apply(&focus.node, self.ctx) {
                    continue;
                }
                let result = match rule.apply(&focus.node, self.ctx)? {
                    Some(result) => result,
                    None => continue,
                };
                if result.is_logical() != (self.stage == Stage::Logical) {
                    warn!(
                        "Rule {:?} produced {} in {:?} stage, ignored",
                        rule, result, self.stage
                    );
                    continue;
                }
                if result.digest() == focus.node.digest() {
                    continue;
                }
                trace!("Rule {:?} rewrote {} into {}", rule, focus.node, result);

                let root = focus.root.replace_at(&focus.path, result)?;
                self.offer(&root, &mut exploration, &mut candidates);
                queue.push(Focus {
                    root: root.clone(),
                    path: vec![],
                    node: root,
                });
            }

            for (idx, input) in focus.node.inputs().iter().enumerate() {
                if idx > 0 && input.group_id() != focus.node.group_id() {
                    exploration
                        .deferred
                        .entry(input.group_id())
                        .or_insert_with(|| input.clone());
                    continue;
                }
                let mut path = focus.path.clone();
                path.push(idx);
                queue.push(Focus {
                    root: focus.root.clone(),
                    path,
                    node: input.clone(),
                });
            }
        }

        Ok(exploration)
    }

    /// Records `root` as candidate. Physical plans must be executable.
    fn offer(&self, root: &PlanNodeRef, exploration: &mut Exploration, seen: &mut HashSet<Digest>) {
        if self.stage == Stage::Physical && !root.executable() {
            return;
        }
        if seen.insert(root.digest()) {
            exploration.candidates.push(root.clone());
        }
    }
}
