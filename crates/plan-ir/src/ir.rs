//! Core tree structures: operations, regions and blocks.
//!
//! The tree is plainly owned. An [`Operation`] owns its regions, a [`Region`]
//! owns its blocks and a [`Block`] owns its operations, so a node has at most
//! one parent and dropping the root releases the whole tree.
//!
//! Operations can only be created by [`crate::Context::build`]; once built
//! they expose read-only accessors. Regions and blocks are freely assembled
//! by callers and then moved into the operation that owns them.

use smallvec::SmallVec;

use crate::symbol::{QualifiedName, Symbol};
use crate::types::{Attribute, DataType};

// ============================================================================
// Value
// ============================================================================

/// A typed operand reference (`%name: !type`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Value {
    name: Symbol,
    ty: DataType,
}

impl Value {
    pub fn new(name: impl Into<Symbol>, ty: DataType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn ty(&self) -> &DataType {
        &self.ty
    }
}

// ============================================================================
// Operation
// ============================================================================

/// A validated, immutable tree node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    kind: QualifiedName,
    attributes: SmallVec<[(Symbol, Attribute); 4]>,
    operands: SmallVec<[Value; 2]>,
    results: SmallVec<[DataType; 1]>,
    regions: SmallVec<[Region; 2]>,
}

impl Operation {
    /// Assemble a node whose parts have already been validated.
    pub(crate) fn from_parts(
        kind: QualifiedName,
        attributes: SmallVec<[(Symbol, Attribute); 4]>,
        operands: Vec<Value>,
        results: Vec<DataType>,
        regions: Vec<Region>,
    ) -> Self {
        Self {
            kind,
            attributes,
            operands: operands.into(),
            results: results.into(),
            regions: regions.into(),
        }
    }

    pub fn kind(&self) -> QualifiedName {
        self.kind
    }

    pub fn dialect(&self) -> Symbol {
        self.kind.dialect()
    }

    pub fn name(&self) -> Symbol {
        self.kind.name()
    }

    /// Attributes in schema declaration order.
    pub fn attributes(&self) -> &[(Symbol, Attribute)] {
        &self.attributes
    }

    pub fn attr(&self, key: impl Into<Symbol>) -> Option<&Attribute> {
        let key = key.into();
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn operands(&self) -> &[Value] {
        &self.operands
    }

    pub fn results(&self) -> &[DataType] {
        &self.results
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }
}

// ============================================================================
// Region / Block
// ============================================================================

/// An ordered list of blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    blocks: SmallVec<[Block; 1]>,
}

impl Region {
    pub fn new(blocks: impl IntoIterator<Item = Block>) -> Self {
        Self {
            blocks: blocks.into_iter().collect(),
        }
    }

    /// A region with a single block holding `ops`.
    pub fn single(ops: impl IntoIterator<Item = Operation>) -> Self {
        Self::new([Block::new(ops)])
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The block of a single-block region.
    pub fn single_block(&self) -> Option<&Block> {
        match self.blocks.as_slice() {
            [block] => Some(block),
            _ => None,
        }
    }

    /// Top-level operations of every block, in order.
    pub fn ops(&self) -> impl Iterator<Item = &Operation> {
        self.blocks.iter().flat_map(|b| b.ops())
    }
}

impl From<Block> for Region {
    fn from(block: Block) -> Self {
        Self::new([block])
    }
}

/// A single-block region holding just `op`.
impl From<Operation> for Region {
    fn from(op: Operation) -> Self {
        Self::single([op])
    }
}

/// An ordered, straight-line list of operations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    ops: Vec<Operation>,
}

impl Block {
    pub fn new(ops: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            ops: ops.into_iter().collect(),
        }
    }

    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// ============================================================================
// OperationState
// ============================================================================

/// Unvalidated inputs for [`crate::Context::build`].
///
/// Defaults to no attributes, operands, results or regions.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationState {
    pub kind: QualifiedName,
    pub attributes: Vec<(Symbol, Attribute)>,
    pub operands: Vec<Value>,
    pub results: Vec<DataType>,
    pub regions: Vec<Region>,
}

impl OperationState {
    pub fn new(kind: QualifiedName) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            operands: Vec::new(),
            results: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<Symbol>, val: impl Into<Attribute>) -> Self {
        self.attributes.push((key.into(), val.into()));
        self
    }

    pub fn operand(mut self, v: Value) -> Self {
        self.operands.push(v);
        self
    }

    pub fn operands(mut self, vs: impl IntoIterator<Item = Value>) -> Self {
        self.operands.extend(vs);
        self
    }

    pub fn result(mut self, ty: DataType) -> Self {
        self.results.push(ty);
        self
    }

    pub fn results(mut self, tys: impl IntoIterator<Item = DataType>) -> Self {
        self.results.extend(tys);
        self
    }

    pub fn region(mut self, r: Region) -> Self {
        self.regions.push(r);
        self
    }

    pub fn regions(mut self, rs: impl IntoIterator<Item = Region>) -> Self {
        self.regions.extend(rs);
        self
    }
}

/// Take a built node apart so a rewrite can build a modified copy.
impl From<Operation> for OperationState {
    fn from(op: Operation) -> Self {
        Self {
            kind: op.kind,
            attributes: op.attributes.into_vec(),
            operands: op.operands.into_vec(),
            results: op.results.into_vec(),
            regions: op.regions.into_vec(),
        }
    }
}
