//! IR Optimizations
//!
//! Only peephole constant folding exists; it runs while nodes are built.

pub mod constant_fold;

pub use constant_fold::{number_to_string, to_int32, ConstantFolder};
