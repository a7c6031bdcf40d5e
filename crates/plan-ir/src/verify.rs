//! Whole-tree verification against a context.
//!
//! Every operation is built through [`Context::build`], so a tree is valid
//! for the context that built it. `verify` re-checks a tree that came from
//! elsewhere (another context, a rewrite) before a pass relies on it.

use std::ops::ControlFlow;

use crate::context::Context;
use crate::error::IrResult;
use crate::ir::Operation;
use crate::walk::{WalkAction, walk_op};

/// Re-check every operation under `root` (root included).
pub fn verify(ctx: &Context, root: &Operation) -> IrResult<()> {
    let outcome = walk_op(root, &mut |op| match ctx.check_operation(op) {
        Ok(()) => ControlFlow::Continue(WalkAction::Advance),
        Err(err) => ControlFlow::Break(err),
    });
    match outcome {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(err) => {
            tracing::debug!(kind = %root.kind(), %err, "verification failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IrErrorKind;
    use crate::ir::{OperationState, Region};
    use crate::schema::{AttrConstraint, OpSchema, RegionSlot};
    use crate::symbol::QualifiedName;

    fn q(name: &'static str) -> QualifiedName {
        QualifiedName::from_static("v", name)
    }

    #[test]
    fn tree_from_a_richer_context_fails_in_a_poorer_one() {
        let mut full = Context::new();
        full.register_op(OpSchema::new(q("leaf")).attr("n", AttrConstraint::Integer))
            .unwrap();
        full.register_op(OpSchema::new(q("wrap")).region(RegionSlot::single("body")))
            .unwrap();

        let leaf = full
            .build(OperationState::new(q("leaf")).attr("n", 1i64))
            .unwrap();
        let root = full
            .build(OperationState::new(q("wrap")).region(Region::single([leaf])))
            .unwrap();
        assert!(verify(&full, &root).is_ok());

        let mut partial = Context::new();
        partial
            .register_op(OpSchema::new(q("wrap")).region(RegionSlot::single("body")))
            .unwrap();
        let err = verify(&partial, &root).unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::UnknownIdentifier(_)));

        let mut stricter = Context::new();
        stricter
            .register_op(OpSchema::new(q("leaf")).attr("n", AttrConstraint::String))
            .unwrap();
        stricter
            .register_op(OpSchema::new(q("wrap")).region(RegionSlot::single("body")))
            .unwrap();
        let err = verify(&stricter, &root).unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }));
    }
}
