//! Typed tree IR infrastructure for declarative query plans.
//!
//! Dialects register type tags, structural categories and operation schemas
//! into an explicit [`Context`]. Operations are then built bottom-up through
//! [`Context::build`], which validates every attribute, region and nested
//! operation against the registered schema. Finished trees are plain owned
//! values that can be walked, verified, printed and parsed back.

// === IR infrastructure ===
mod builder;
pub mod context;
pub mod error;
pub mod ir;
pub mod ops;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod symbol;
pub mod types;
pub mod verify;
pub mod walk;

pub use context::{Context, Dialect};
pub use error::{ConversionError, IrError, IrErrorKind, IrResult};
pub use ir::{Block, Operation, OperationState, Region, Value};
pub use ops::DialectOp;
pub use parser::{parse_op, parse_type};
pub use printer::print_op;
pub use schema::{
    AttrConstraint, AttrSlot, BlockCount, CategoryRule, OpSchema, OperandSlot, RegionContent,
    RegionSlot, TypeConstraint,
};
pub use symbol::{QualifiedName, Symbol};
pub use types::{Attribute, DataType, ParamKind, RawParam, TypeSchema};
pub use verify::verify;
pub use walk::{WalkAction, count_ops, walk_block, walk_op, walk_region, walk_typed};
