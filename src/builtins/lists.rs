// ABOUTME: Pair/list builtins: car, cdr, cons, pair?, eq?, apply, per spec.md section 4.4.6

use crate::error::LispError;
use crate::interpreter::Interpreter;
use crate::value::{Builtin, Value};

/// `car` of `nil` is `nil`, per spec.md section 4.4.6 — no error on empty list.
fn car(interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    if args.len() != 1 {
        return Err(LispError::Args);
    }
    match args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::Pair(h) => Ok(interp.heap.car(h)),
        _ => Err(LispError::Type),
    }
}

/// `cdr` of `nil` is `nil`, symmetric with `car`.
fn cdr(interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    if args.len() != 1 {
        return Err(LispError::Args);
    }
    match args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::Pair(h) => Ok(interp.heap.cdr(h)),
        _ => Err(LispError::Type),
    }
}

fn cons(interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    if args.len() != 2 {
        return Err(LispError::Args);
    }
    Ok(interp.cons(args[0], args[1]))
}

fn pair_p(interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    if args.len() != 1 {
        return Err(LispError::Args);
    }
    Ok(match args[0] {
        Value::Pair(_) => interp.true_value(),
        _ => Value::Nil,
    })
}

/// Identity equality: same variant and same underlying identity (handle,
/// symbol, or static pointer), never structural comparison. See the
/// `PartialEq` impl on `Value`.
fn eq_p(interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    if args.len() != 2 {
        return Err(LispError::Args);
    }
    Ok(if args[0] == args[1] { interp.true_value() } else { Value::Nil })
}

/// `(apply proc list)` as an ordinary first-class procedure. Unlike the
/// `apply` special form, this does not preserve tail calls — see
/// `Interpreter::apply_value`.
fn apply(interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    if args.len() != 2 {
        return Err(LispError::Args);
    }
    let arg_list = interp.list_to_vec(args[1])?;
    interp.apply_value(args[0], arg_list)
}

pub static CAR: Builtin = Builtin { name: "car", arity: 1, func: car };
pub static CDR: Builtin = Builtin { name: "cdr", arity: 1, func: cdr };
pub static CONS: Builtin = Builtin { name: "cons", arity: 2, func: cons };
pub static PAIR_P: Builtin = Builtin { name: "pair?", arity: 1, func: pair_p };
pub static EQ_P: Builtin = Builtin { name: "eq?", arity: 2, func: eq_p };
pub static APPLY: Builtin = Builtin { name: "apply", arity: 2, func: apply };

pub fn register(interp: &mut Interpreter) {
    for b in [&CAR, &CDR, &CONS, &PAIR_P, &EQ_P, &APPLY] {
        let sym = interp.intern(b.name);
        interp.env_set(interp.global_env, sym, Value::Builtin(b));
    }
}
