//! Text format parser.
//!
//! Parses the textual form produced by [`crate::print_op`].
//!
//! # Two-stage parsing
//!
//! 1. **Raw parse**: winnow combinators in [`raw`] turn text into `Raw*`
//!    structures. Failures here are [`IrErrorKind::MalformedText`] with the
//!    byte offset where parsing stopped.
//! 2. **Build**: `Raw*` structures are resolved against a [`Context`] and
//!    assembled bottom-up through [`Context::build`]. Failures here are the
//!    same semantic errors a programmatic build would report.
//!
//! [`IrErrorKind::MalformedText`]: crate::IrErrorKind::MalformedText

pub(crate) mod raw;

use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

use self::raw::{RawAttribute, RawOperation, RawRegion, RawType, RawTypeParam};
use crate::context::Context;
use crate::error::{IrError, IrResult};
use crate::ir::{Block, Operation, OperationState, Region, Value};
use crate::symbol::{QualifiedName, Symbol};
use crate::types::{Attribute, DataType, RawParam};

/// Parse a single top-level operation and build it against `ctx`.
pub fn parse_op(ctx: &Context, input: &str) -> IrResult<Operation> {
    let mut remaining = input;
    let offset = |remaining: &str| input.len() - remaining.len();

    let raw_op = raw::raw_operation
        .parse_next(&mut remaining)
        .map_err(|e| IrError::malformed_text(offset(remaining), describe(&e)))?;

    // Reject trailing input
    raw::ws
        .parse_next(&mut remaining)
        .map_err(|e| IrError::malformed_text(offset(remaining), describe(&e)))?;
    if !remaining.is_empty() {
        return Err(IrError::malformed_text(
            offset(remaining),
            "trailing input after top-level operation",
        ));
    }

    tracing::trace!(
        dialect = raw_op.dialect,
        op = raw_op.op_name,
        "parsed raw operation"
    );
    build_operation(ctx, raw_op)
}

/// Parse a type such as `!rel_alg.string<nullable: 0>`.
pub fn parse_type(ctx: &Context, input: &str) -> IrResult<DataType> {
    let mut remaining = input;
    let raw_ty = (raw::ws, raw::raw_type, raw::ws)
        .map(|(_, ty, _)| ty)
        .parse_next(&mut remaining)
        .map_err(|e| IrError::malformed_text(input.len() - remaining.len(), describe(&e)))?;
    if !remaining.is_empty() {
        return Err(IrError::malformed_text(
            input.len() - remaining.len(),
            "trailing input after type",
        ));
    }
    build_type(ctx, raw_ty)
}

fn describe(err: &ErrMode<ContextError>) -> String {
    match err {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => {
            let detail = e.to_string().replace('\n', "; ");
            if detail.is_empty() {
                "parse error: unexpected input".to_owned()
            } else {
                format!("parse error: {detail}")
            }
        }
        ErrMode::Incomplete(_) => "parse error: unexpected end of input".to_owned(),
    }
}

// ============================================================================
// Raw -> IR
// ============================================================================

fn build_operation(ctx: &Context, raw: RawOperation<'_>) -> IrResult<Operation> {
    let kind = QualifiedName::new(
        Symbol::from_dynamic(raw.dialect),
        Symbol::from_dynamic(raw.op_name),
    );

    let mut state = OperationState::new(kind);
    for (name, ty) in raw.operands {
        state = state.operand(Value::new(Symbol::from_dynamic(&name), build_type(ctx, ty)?));
    }
    for (key, value) in raw.attributes {
        state = state.attr(Symbol::from_dynamic(&key), build_attribute(ctx, value)?);
    }
    for ty in raw.result_types {
        state = state.result(build_type(ctx, ty)?);
    }
    for region in raw.regions {
        state = state.region(build_region(ctx, region)?);
    }
    ctx.build(state)
}

fn build_region(ctx: &Context, raw: RawRegion<'_>) -> IrResult<Region> {
    let mut region = Region::empty();
    for block in raw.blocks {
        let ops = block
            .ops
            .into_iter()
            .map(|op| build_operation(ctx, op))
            .collect::<IrResult<Vec<_>>>()?;
        region.push_block(Block::new(ops));
    }
    Ok(region)
}

fn build_type(ctx: &Context, raw: RawType<'_>) -> IrResult<DataType> {
    let name = QualifiedName::new(
        Symbol::from_dynamic(raw.dialect),
        Symbol::from_dynamic(raw.name),
    );
    let params = raw
        .params
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                RawTypeParam::Int(v) => RawParam::Int(v),
                RawTypeParam::Attr(attr) => RawParam::Attr(build_attribute(ctx, attr)?),
            };
            Ok((Symbol::from_dynamic(key), value))
        })
        .collect::<IrResult<Vec<_>>>()?;
    ctx.make_type(name, params)
}

fn build_attribute(ctx: &Context, raw: RawAttribute<'_>) -> IrResult<Attribute> {
    Ok(match raw {
        RawAttribute::Int { value, width } => Attribute::Integer { value, width },
        RawAttribute::String(s) => Attribute::String(s),
        RawAttribute::Type(ty) => Attribute::Type(build_type(ctx, ty)?),
        RawAttribute::Array(items) => Attribute::Array(
            items
                .into_iter()
                .map(|item| build_attribute(ctx, item))
                .collect::<IrResult<_>>()?,
        ),
    })
}
