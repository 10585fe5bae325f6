// ABOUTME: Comparison builtins: = and <, per spec.md section 4.4.6
// ABOUTME: Both take exactly two integer arguments and return t/nil.

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

fn numeq(interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    let (a, b) = two_ints(args)?;
    Ok(if a == b { interp.true_value() } else { Value::Nil })
}

fn lt(interp: &mut Interpreter, args: &[Value]) -> Result<Value, LispError> {
    let (a, b) = two_ints(args)?;
    Ok(if a < b { interp.true_value() } else { Value::Nil })
}

pub static NUMEQ: Builtin = Builtin { name: "=", arity: 2, func: numeq };
pub static LT: Builtin = Builtin { name: "<", arity: 2, func: lt };

pub fn register(interp: &mut Interpreter) {
    for b in [&NUMEQ, &LT] {
        let sym = interp.intern(b.name);
        interp.env_set(interp.global_env, sym, Value::Builtin(b));
    }
}
