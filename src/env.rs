// ABOUTME: Lexical environments as ordinary heap values — a pair (parent . bindings)
// ABOUTME: per spec.md section 3.4, rather than a host-side record type.

use crate::interpreter::Interpreter;
use crate::value::Value;

impl Interpreter {
    /// A new, empty frame extending `parent` (`Nil` for a root frame).
    pub fn env_create(&mut self, parent: Value) -> Value {
        let h = self.heap.alloc(parent, Value::Nil);
        Value::Pair(h)
    }

    /// Innermost-out lookup, comparing symbols by identity. `None` on miss
    /// at the root (the caller surfaces `LispError::Unbound`).
    pub fn env_get(&self, env: Value, sym: crate::symbol::Symbol) -> Option<Value> {
        let mut cur = env;
        loop {
            let h = match cur {
                Value::Pair(h) => h,
                Value::Nil => return None,
                _ => unreachable!("environments are always Pair or Nil"),
            };
            let (parent, bindings) = self.heap.car_cdr(h);
            let mut b = bindings;
            while let Value::Pair(bh) = b {
                let (entry, rest) = self.heap.car_cdr(bh);
                if let Value::Pair(eh) = entry {
                    let (key, val) = self.heap.car_cdr(eh);
                    if key == Value::Symbol(sym) {
                        return Some(val);
                    }
                }
                b = rest;
            }
            cur = parent;
        }
    }

    /// Rebind `sym` if it's already bound in THIS frame; otherwise prepend a
    /// new `(sym . value)` entry to this frame's bindings. Never ascends to
    /// `parent` — this is the one mutation primitive `define` relies on.
    pub fn env_set(&mut self, env: Value, sym: crate::symbol::Symbol, value: Value) {
        let h = match env {
            Value::Pair(h) => h,
            _ => unreachable!("env_set called on a non-environment value"),
        };
        let (_, bindings) = self.heap.car_cdr(h);
        let mut b = bindings;
        while let Value::Pair(bh) = b {
            let (entry, rest) = self.heap.car_cdr(bh);
            if let Value::Pair(eh) = entry {
                let (key, _) = self.heap.car_cdr(eh);
                if key == Value::Symbol(sym) {
                    self.heap.set_cdr(eh, value);
                    return;
                }
            }
            b = rest;
        }
        let entry = self.cons(Value::Symbol(sym), value);
        let new_bindings = self.cons(entry, bindings);
        self.heap.set_cdr(h, new_bindings);
    }
}
