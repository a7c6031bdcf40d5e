//! Operation schemas: attribute, operand, result and region slots.
//!
//! An [`OpSchema`] is the registered declaration of one operation kind.
//! Schemas are plain data assembled with a fluent builder:
//!
//! ```
//! use plan_ir::{AttrConstraint, OpSchema, QualifiedName, RegionSlot};
//!
//! let expr = QualifiedName::from_static("rel_alg", "expression");
//! let compare = OpSchema::new(QualifiedName::from_static("rel_alg", "compare"))
//!     .category(expr)
//!     .attr("comparator", AttrConstraint::String)
//!     .region(RegionSlot::single("left").categories([expr]))
//!     .region(RegionSlot::single("right").categories([expr]));
//!
//! assert_eq!(compare.regions().len(), 2);
//! ```

use std::fmt;

use smallvec::SmallVec;

use crate::symbol::{QualifiedName, Symbol};

// ============================================================================
// Constraints
// ============================================================================

/// Constraint on a type-valued slot (type attributes, operands).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeConstraint {
    /// Any type registered in the context.
    Any,
    /// Exactly the named type tag (parameters unconstrained).
    Exact(QualifiedName),
    /// Any type tag registered under the named dialect.
    Dialect(Symbol),
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeConstraint::Any => f.write_str("DataType"),
            TypeConstraint::Exact(name) => write!(f, "!{name}"),
            TypeConstraint::Dialect(dialect) => write!(f, "!{dialect}.*"),
        }
    }
}

/// Constraint on an attribute slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrConstraint {
    Any,
    /// Integer of any width.
    Integer,
    IntegerOfWidth(u32),
    String,
    Type(TypeConstraint),
    ArrayOf(Box<AttrConstraint>),
}

impl fmt::Display for AttrConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrConstraint::Any => f.write_str("any attribute"),
            AttrConstraint::Integer => f.write_str("integer"),
            AttrConstraint::IntegerOfWidth(width) => write!(f, "i{width} integer"),
            AttrConstraint::String => f.write_str("string"),
            AttrConstraint::Type(ty) => write!(f, "type {ty}"),
            AttrConstraint::ArrayOf(inner) => write!(f, "array of {inner}"),
        }
    }
}

/// Number of blocks a region slot accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockCount {
    /// Exactly one block.
    Single,
    /// Any number of blocks, including none.
    Any,
}

/// What a region slot accepts as top-level operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionContent {
    Any,
    /// Operations whose schema belongs to one of these categories.
    Categories(SmallVec<[QualifiedName; 2]>),
    /// Only the listed operation kinds.
    Ops(SmallVec<[QualifiedName; 2]>),
}

impl fmt::Display for RegionContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (what, names) = match self {
            RegionContent::Any => return f.write_str("any operation"),
            RegionContent::Categories(names) => ("category", names),
            RegionContent::Ops(names) => ("operation", names),
        };
        write!(f, "{what} ")?;
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{name}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Slots
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrSlot {
    pub name: Symbol,
    pub constraint: AttrConstraint,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperandSlot {
    pub name: Symbol,
    pub ty: TypeConstraint,
}

/// A positional region slot such as `left`/`right` of a comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSlot {
    pub name: Symbol,
    pub blocks: BlockCount,
    pub content: RegionContent,
}

impl RegionSlot {
    /// Slot holding exactly one block.
    pub fn single(name: impl Into<Symbol>) -> Self {
        Self {
            name: name.into(),
            blocks: BlockCount::Single,
            content: RegionContent::Any,
        }
    }

    /// Slot holding any number of blocks.
    pub fn multi(name: impl Into<Symbol>) -> Self {
        Self {
            name: name.into(),
            blocks: BlockCount::Any,
            content: RegionContent::Any,
        }
    }

    pub fn categories(mut self, names: impl IntoIterator<Item = QualifiedName>) -> Self {
        self.content = RegionContent::Categories(names.into_iter().collect());
        self
    }

    pub fn ops(mut self, names: impl IntoIterator<Item = QualifiedName>) -> Self {
        self.content = RegionContent::Ops(names.into_iter().collect());
        self
    }
}

// ============================================================================
// OpSchema
// ============================================================================

/// Registered declaration of an operation kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpSchema {
    name: QualifiedName,
    category: Option<QualifiedName>,
    attrs: SmallVec<[AttrSlot; 4]>,
    operands: SmallVec<[OperandSlot; 2]>,
    results: usize,
    regions: SmallVec<[RegionSlot; 2]>,
}

impl OpSchema {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            category: None,
            attrs: SmallVec::new(),
            operands: SmallVec::new(),
            results: 0,
            regions: SmallVec::new(),
        }
    }

    pub fn category(mut self, category: QualifiedName) -> Self {
        self.category = Some(category);
        self
    }

    pub fn attr(mut self, name: impl Into<Symbol>, constraint: AttrConstraint) -> Self {
        self.attrs.push(AttrSlot {
            name: name.into(),
            constraint,
        });
        self
    }

    pub fn operand(mut self, name: impl Into<Symbol>, ty: TypeConstraint) -> Self {
        self.operands.push(OperandSlot {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn results(mut self, count: usize) -> Self {
        self.results = count;
        self
    }

    pub fn region(mut self, slot: RegionSlot) -> Self {
        self.regions.push(slot);
        self
    }

    pub fn name(&self) -> QualifiedName {
        self.name
    }

    pub fn structural_category(&self) -> Option<QualifiedName> {
        self.category
    }

    pub fn attrs(&self) -> &[AttrSlot] {
        &self.attrs
    }

    pub fn operands(&self) -> &[OperandSlot] {
        &self.operands
    }

    pub fn num_results(&self) -> usize {
        self.results
    }

    pub fn regions(&self) -> &[RegionSlot] {
        &self.regions
    }

    /// Position of a named region slot.
    pub fn region_index(&self, name: impl Into<Symbol>) -> Option<usize> {
        let name = name.into();
        self.regions.iter().position(|slot| slot.name == name)
    }
}

// ============================================================================
// CategoryRule
// ============================================================================

/// A structural category and the categories its subtrees may contain.
///
/// A category does not implicitly contain itself; list it explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryRule {
    name: QualifiedName,
    may_contain: SmallVec<[QualifiedName; 2]>,
}

impl CategoryRule {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            may_contain: SmallVec::new(),
        }
    }

    pub fn may_contain(mut self, categories: impl IntoIterator<Item = QualifiedName>) -> Self {
        self.may_contain.extend(categories);
        self
    }

    pub fn name(&self) -> QualifiedName {
        self.name
    }

    pub fn allowed(&self) -> &[QualifiedName] {
        &self.may_contain
    }

    pub fn allows(&self, category: QualifiedName) -> bool {
        self.may_contain.contains(&category)
    }
}
