//! Relational algebra query plans on top of `plan-ir`.
//!
//! The binary in `main.rs` is a thin shell over [`session`].

pub mod session;

pub use session::{CheckReport, check, demo_plan, reprint, standard_context};
