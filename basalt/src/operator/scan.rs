use std::fmt::Formatter;

use crate::catalog::{ColumnDef, EntityRef, IndexPredicate, IndexRef};
use crate::operator::{display_columns, input_columns, Arity, DisplayFields, OperatorTrait};
use crate::plan::{GroupId, PlanNodeRef};

/// Reads columns of all rows of an entity.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct EntityScan {
    entity: EntityRef,
    fetch: Vec<ColumnDef>,
}

impl EntityScan {
    pub fn new(entity: EntityRef, fetch: Vec<ColumnDef>) -> Self {
        Self { entity, fetch }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn fetch(&self) -> &[ColumnDef] {
        &self.fetch
    }
}

impl OperatorTrait for EntityScan {
    fn arity(&self) -> Arity {
        Arity::Nullary
    }

    fn derive_columns(&self, _inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        self.fetch.clone()
    }
}

impl DisplayFields for EntityScan {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("entity", &self.entity.name())
            .field("fetch", &format_args!("{}", display_columns(&self.fetch)))
            .finish()
    }
}

/// Partition `index` out of `count` of a partitioned scan.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct Partition {
    pub index: usize,
    pub count: usize,
}

/// Sequential scan of an entity, optionally restricted to one partition of it.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct FullScan {
    scan: EntityScan,
    partition: Option<Partition>,
}

impl FullScan {
    pub fn new(scan: EntityScan) -> Self {
        Self {
            scan,
            partition: None,
        }
    }

    pub fn with_partition(scan: EntityScan, partition: Partition) -> Self {
        Self {
            scan,
            partition: Some(partition),
        }
    }

    pub fn scan(&self) -> &EntityScan {
        &self.scan
    }

    pub fn entity(&self) -> &EntityRef {
        self.scan.entity()
    }

    pub fn fetch(&self) -> &[ColumnDef] {
        self.scan.fetch()
    }

    pub fn partition(&self) -> Option<Partition> {
        self.partition
    }
}

impl OperatorTrait for FullScan {
    fn arity(&self) -> Arity {
        Arity::Nullary
    }

    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        self.scan.derive_columns(inputs)
    }
}

impl DisplayFields for FullScan {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("entity", &self.entity().name())
            .field("fetch", &format_args!("{}", display_columns(self.fetch())));
        if let Some(partition) = self.partition {
            s.field(
                "partition",
                &format_args!("{}/{}", partition.index, partition.count),
            );
        }
        s.finish()
    }
}

/// Random sample of `size` rows of an entity.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct EntitySample {
    entity: EntityRef,
    fetch: Vec<ColumnDef>,
    size: u64,
    seed: u64,
}

impl EntitySample {
    pub fn new(entity: EntityRef, fetch: Vec<ColumnDef>, size: u64, seed: u64) -> Self {
        Self {
            entity,
            fetch,
            size,
            seed,
        }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn fetch(&self) -> &[ColumnDef] {
        &self.fetch
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl OperatorTrait for EntitySample {
    fn arity(&self) -> Arity {
        Arity::Nullary
    }

    fn derive_columns(&self, _inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        self.fetch.clone()
    }
}

impl DisplayFields for EntitySample {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("entity", &self.entity.name())
            .field("fetch", &format_args!("{}", display_columns(&self.fetch)))
            .field("size", &self.size)
            .field("seed", &self.seed)
            .finish()
    }
}

/// Answers a predicate with an index instead of scanning the entity.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct IndexScan {
    entity: EntityRef,
    index: IndexRef,
    predicate: IndexPredicate,
    fetch: Vec<ColumnDef>,
}

impl IndexScan {
    pub fn new(
        entity: EntityRef,
        index: IndexRef,
        predicate: IndexPredicate,
        fetch: Vec<ColumnDef>,
    ) -> Self {
        Self {
            entity,
            index,
            predicate,
            fetch,
        }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn index(&self) -> &IndexRef {
        &self.index
    }

    pub fn predicate(&self) -> &IndexPredicate {
        &self.predicate
    }

    pub fn fetch(&self) -> &[ColumnDef] {
        &self.fetch
    }
}

impl OperatorTrait for IndexScan {
    fn arity(&self) -> Arity {
        Arity::Nullary
    }

    fn derive_columns(&self, _inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        self.fetch.clone()
    }
}

impl DisplayFields for IndexScan {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("entity", &self.entity.name())
            .field("index", &self.index.name())
            .field("predicate", &format_args!("{}", self.predicate))
            .field("fetch", &format_args!("{}", display_columns(&self.fetch)))
            .finish()
    }
}

/// Looks up additional columns of the entity for each input row.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Fetch {
    entity: EntityRef,
    fetch: Vec<ColumnDef>,
}

impl Fetch {
    pub fn new(entity: EntityRef, fetch: Vec<ColumnDef>) -> Self {
        Self { entity, fetch }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn fetch(&self) -> &[ColumnDef] {
        &self.fetch
    }
}

impl OperatorTrait for Fetch {
    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn derive_columns(&self, inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        let mut columns = input_columns(inputs, 0);
        for column in &self.fetch {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }
}

impl DisplayFields for Fetch {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("entity", &self.entity.name())
            .field("fetch", &format_args!("{}", display_columns(&self.fetch)))
            .finish()
    }
}

/// Placeholder for the winning plan of another group, e.g. a sub-query.
///
/// Group references are resolved when the plans of all groups are composed into the final plan.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct GroupRef {
    group_id: GroupId,
    columns: Vec<ColumnDef>,
}

impl GroupRef {
    pub fn new(group_id: GroupId, columns: Vec<ColumnDef>) -> Self {
        Self { group_id, columns }
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }
}

impl OperatorTrait for GroupRef {
    fn arity(&self) -> Arity {
        Arity::Nullary
    }

    fn derive_columns(&self, _inputs: &[PlanNodeRef]) -> Vec<ColumnDef> {
        self.columns.clone()
    }
}

impl DisplayFields for GroupRef {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("").field("group", &self.group_id).finish()
    }
}
