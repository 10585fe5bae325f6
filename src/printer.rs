// ABOUTME: Writes a value back out in readable form, per spec.md section 4.2

use crate::heap::Handle;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Render `v` the way the reader would need to see it to read it back,
/// except for `Builtin`/`Closure`/`Macro`, which print opaquely.
pub fn print_value(interp: &Interpreter, v: Value) -> String {
    match v {
        Value::Nil => "nil".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Symbol(s) => interp.symbol_name(s).to_string(),
        Value::Pair(h) => print_pair(interp, h),
        Value::Builtin(b) => format!("#<BUILTIN:{}>", b.name),
        Value::Closure(h) => print_params_and_body(interp, h),
        Value::Macro(h) => print_params_and_body(interp, h),
    }
}

fn print_pair(interp: &Interpreter, h: Handle) -> String {
    let mut out = String::from("(");
    let mut cur = Value::Pair(h);
    let mut first = true;
    loop {
        match cur {
            Value::Pair(ph) => {
                let (car, cdr) = interp.heap.car_cdr(ph);
                if !first {
                    out.push(' ');
                }
                first = false;
                out.push_str(&print_value(interp, car));
                cur = cdr;
            }
            Value::Nil => {
                out.push(')');
                break;
            }
            other => {
                out.push_str(" . ");
                out.push_str(&print_value(interp, other));
                out.push(')');
                break;
            }
        }
    }
    out
}

/// Closures and macros print only their `(params . body)` portion, per
/// spec.md section 4.2 — the captured environment is never shown.
fn print_params_and_body(interp: &Interpreter, payload: Handle) -> String {
    let (_, rest) = interp.heap.car_cdr(payload);
    match rest {
        Value::Pair(inner) => print_pair(interp, inner),
        _ => "nil".to_string(),
    }
}
