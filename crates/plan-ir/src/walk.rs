//! Recursive, read-only traversal of operation trees.
//!
//! The callback decides per operation whether to descend into its regions,
//! and can stop the walk early by returning `ControlFlow::Break`.

use std::ops::ControlFlow;

use crate::ir::{Block, Operation, Region};
use crate::ops::DialectOp;

/// Controls whether to descend into children during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Continue walking and descend into nested regions.
    Advance,
    /// Skip the nested regions of the current operation.
    Skip,
}

/// Walk all operations in a region recursively.
pub fn walk_region<'a, B>(
    region: &'a Region,
    f: &mut dyn FnMut(&'a Operation) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    for block in region.blocks() {
        walk_block(block, f)?;
    }
    ControlFlow::Continue(())
}

/// Walk all operations in a block recursively.
pub fn walk_block<'a, B>(
    block: &'a Block,
    f: &mut dyn FnMut(&'a Operation) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    for op in block.ops() {
        walk_op(op, f)?;
    }
    ControlFlow::Continue(())
}

/// Walk an operation and its nested regions recursively (pre-order).
pub fn walk_op<'a, B>(
    op: &'a Operation,
    f: &mut dyn FnMut(&'a Operation) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    match f(op) {
        ControlFlow::Break(b) => return ControlFlow::Break(b),
        ControlFlow::Continue(WalkAction::Skip) => return ControlFlow::Continue(()),
        ControlFlow::Continue(WalkAction::Advance) => {}
    }
    for region in op.regions() {
        walk_region(region, f)?;
    }
    ControlFlow::Continue(())
}

/// Walk operations of a specific dialect type under `root` (root included).
pub fn walk_typed<'a, T, B>(
    root: &'a Operation,
    f: &mut dyn FnMut(T) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()>
where
    T: DialectOp<'a>,
{
    walk_op(root, &mut |op| {
        if let Ok(typed) = T::from_op(op) {
            f(typed)
        } else {
            ControlFlow::Continue(WalkAction::Advance)
        }
    })
}

/// Number of operations in the tree rooted at `op`, `op` included.
pub fn count_ops(op: &Operation) -> usize {
    let mut count = 0;
    let _ = walk_op::<()>(op, &mut |_| {
        count += 1;
        ControlFlow::Continue(WalkAction::Advance)
    });
    count
}
