// ABOUTME: Arithmetic builtins: +, -, *, /, per spec.md section 4.4.6
// ABOUTME: All four take exactly two integer arguments; no variadic forms.

use crate::error::LispError;
use crate::interpreter::Interpreter;
use crate::value::{Builtin, Value};

fn two_ints(args: &[Value]) -> Result<(i64, i64), LispError> {
    if args.len() != 2 {
        return Err(LispError::Args);
    }
    let a = match args[0] {
        Value::Integer(n) => n,
        _ => return Err(LispError::Type),
    };
    let b = match args[1] {
        Value::Integer(n) => n,
        _ => return Err(LispError::Type),
    };
    Ok((a, b))
}

fn add(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    let (a, b) = two_ints(args)?;
    Ok(Value::Integer(a.wrapping_add(b)))
}

fn sub(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    let (a, b) = two_ints(args)?;
    Ok(Value::Integer(a.wrapping_sub(b)))
}

fn mul(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    let (a, b) = two_ints(args)?;
    Ok(Value::Integer(a.wrapping_mul(b)))
}

/// Truncates toward zero, matching Rust's native `/` on `i64`. Division by
/// zero is implementation-defined per spec.md section 9, but must not abort
/// the process — `checked_div` turns it (and the `i64::MIN / -1` overflow
/// case) into an ordinary `LispError::Type` instead of a panic.
fn div(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    let (a, b) = two_ints(args)?;
    a.checked_div(b).map(Value::Integer).ok_or(LispError::Type)
}

pub static ADD: Builtin = Builtin { name: "+", arity: 2, func: add };
pub static SUB: Builtin = Builtin { name: "-", arity: 2, func: sub };
pub static MUL: Builtin = Builtin { name: "*", arity: 2, func: mul };
pub static DIV: Builtin = Builtin { name: "/", arity: 2, func: div };

pub fn register(interp: &mut Interpreter) {
    for b in [&ADD, &SUB, &MUL, &DIV] {
        let sym = interp.intern(b.name);
        interp.env_set(interp.global_env, sym, Value::Builtin(b));
    }
}
