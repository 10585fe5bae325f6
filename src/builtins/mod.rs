// ABOUTME: Built-in procedure registration — the fixed table of spec.md section 4.4.6

pub mod arithmetic;
pub mod comparison;
pub mod lists;

use crate::interpreter::Interpreter;

/// Bind every built-in procedure into the global environment. Called once
/// from `Interpreter::new`, before the REPL loads `library.lisp`.
pub fn register_builtins(interp: &mut Interpreter) {
    arithmetic::register(interp);
    comparison::register(interp);
    lists::register(interp);
}
