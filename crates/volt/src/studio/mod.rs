//! Query studio support
//!
//! Splits SQL scripts into statements and runs them as `@AdHoc` calls on
//! a call queue.

mod script;
mod split;

pub use script::{ScriptReport, StatementOutcome, run_script};
pub use split::split_statements;
