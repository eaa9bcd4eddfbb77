//! Transformation passes over the IR.

pub mod cse;
pub mod scope;

pub use cse::{
    common_subexpression_elimination, common_subexpression_elimination_stmt,
};
pub use scope::Scope;
