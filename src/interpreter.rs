// ABOUTME: Central interpreter state: heap, symbol table, root environment, and the
// ABOUTME: shared helpers the reader, evaluator, and built-ins all allocate values through.

use crate::error::LispError;
use crate::heap::{Handle, Heap};
use crate::symbol::{Symbol, SymbolTable};
use crate::value::Value;

/// Iterations of the evaluator's main loop between reclamation sweeps, per
/// spec.md section 4.5's "periodic reclamation" trigger.
pub const GC_ITERATION_THRESHOLD: u64 = 100_000;

/// The special-form symbols, interned once and compared by identity
/// thereafter. User redefinition of these names has no effect on dispatch —
/// this is intentional, per spec.md's design notes.
pub struct SpecialForms {
    pub quote: Symbol,
    pub define: Symbol,
    pub lambda: Symbol,
    pub if_: Symbol,
    pub defmacro: Symbol,
    pub apply: Symbol,
    pub quasiquote: Symbol,
    pub unquote: Symbol,
    pub unquote_splicing: Symbol,
}

/// Owns every piece of process-wide mutable state: the symbol table, the
/// cons heap, the root environment, and the canonical `t` symbol. One
/// `Interpreter` is built at startup and threaded through reading,
/// evaluating, and printing for the life of the process.
pub struct Interpreter {
    pub heap: Heap,
    pub symbols: SymbolTable,
    pub global_env: Value,
    pub forms: SpecialForms,
    pub sym_t: Symbol,
    gc_counter: u64,
}

impl Interpreter {
    pub fn new() -> Self {
        let mut symbols = SymbolTable::new();
        let forms = SpecialForms {
            quote: symbols.intern("quote"),
            define: symbols.intern("define"),
            lambda: symbols.intern("lambda"),
            if_: symbols.intern("if"),
            defmacro: symbols.intern("defmacro"),
            apply: symbols.intern("apply"),
            quasiquote: symbols.intern("quasiquote"),
            unquote: symbols.intern("unquote"),
            unquote_splicing: symbols.intern("unquote-splicing"),
        };
        let sym_t = symbols.intern("t");

        let mut heap = Heap::new();
        let root_handle = heap.alloc(Value::Nil, Value::Nil);
        let global_env = Value::Pair(root_handle);

        let mut interp = Interpreter {
            heap,
            symbols,
            global_env,
            forms,
            sym_t,
            gc_counter: 0,
        };

        let t = Value::Symbol(interp.sym_t);
        interp.env_set(interp.global_env, interp.sym_t, t);
        crate::builtins::register_builtins(&mut interp);
        interp
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        self.symbols.intern(text)
    }

    pub fn symbol_name(&self, sym: Symbol) -> &str {
        self.symbols.name(sym)
    }

    pub fn true_value(&self) -> Value {
        Value::Symbol(self.sym_t)
    }

    pub fn cons(&mut self, car: Value, cdr: Value) -> Value {
        Value::Pair(self.heap.alloc(car, cdr))
    }

    /// Build a proper list terminated by `Nil` from `items`, right to left.
    pub fn list_of(&mut self, items: &[Value]) -> Value {
        self.list_with_tail(items, Value::Nil)
    }

    /// Build a list from `items` terminated by `tail` instead of `Nil` —
    /// used for both ordinary lists (`tail = Nil`) and dotted reader output.
    pub fn list_with_tail(&mut self, items: &[Value], tail: Value) -> Value {
        let mut acc = tail;
        for &item in items.iter().rev() {
            acc = self.cons(item, acc);
        }
        acc
    }

    /// `true` iff `v` is a finite chain of pairs terminated by `Nil`. Uses
    /// Floyd's cycle detection rather than a naive walk: the reader never
    /// produces cyclic lists, but nothing in the data model forbids user
    /// code from building one, and this must not hang on one.
    pub fn is_proper_list(&self, v: Value) -> bool {
        let mut slow = v;
        let mut fast = v;
        loop {
            fast = match fast {
                Value::Nil => return true,
                Value::Pair(h) => self.heap.cdr(h),
                _ => return false,
            };
            fast = match fast {
                Value::Nil => return true,
                Value::Pair(h) => self.heap.cdr(h),
                _ => return false,
            };
            slow = match slow {
                Value::Pair(h) => self.heap.cdr(h),
                _ => unreachable!("slow pointer always trails a pair"),
            };
            if let (Value::Pair(a), Value::Pair(b)) = (slow, fast) {
                if a == b {
                    return false;
                }
            }
        }
    }

    /// Collect a proper list into a `Vec`, in source order. `Syntax` if `v`
    /// is not a proper list.
    pub fn list_to_vec(&self, v: Value) -> Result<Vec<Value>, LispError> {
        if !self.is_proper_list(v) {
            return Err(LispError::Syntax);
        }
        let mut out = Vec::new();
        let mut cur = v;
        while let Value::Pair(h) = cur {
            let (car, cdr) = self.heap.car_cdr(h);
            out.push(car);
            cur = cdr;
        }
        Ok(out)
    }

    /// Allocate a closure or macro payload: a heap chain `(env . (params .
    /// body))`, per spec.md section 3.1.
    pub fn make_closure(&mut self, env: Value, params: Value, body: &[Value], is_macro: bool) -> Value {
        let body_list = self.list_of(body);
        let inner = self.heap.alloc(params, body_list);
        let payload = self.heap.alloc(env, Value::Pair(inner));
        if is_macro {
            Value::Macro(payload)
        } else {
            Value::Closure(payload)
        }
    }

    /// Unpack a closure/macro payload handle into `(captured_env, params, body)`.
    pub fn closure_parts(&self, h: Handle) -> (Value, Value, Value) {
        let (env, rest) = self.heap.car_cdr(h);
        match rest {
            Value::Pair(inner) => {
                let (params, body) = self.heap.car_cdr(inner);
                (env, params, body)
            }
            _ => unreachable!("closure/macro payload is always a 3-element chain"),
        }
    }

    /// Reclaim unreachable cells, rooted at the global environment plus
    /// whatever extra values the caller is holding live right now (the
    /// in-flight `expr`/`env`/frame stack of a running `eval_expr`).
    pub fn collect_garbage_with(&mut self, extra_roots: &[Value]) {
        let mut roots = Vec::with_capacity(extra_roots.len() + 1);
        roots.push(self.global_env);
        roots.extend_from_slice(extra_roots);
        self.heap.collect(&roots);
    }

    /// Reclaim between top-level forms, per spec.md section 4.5's trigger list.
    pub fn collect_garbage(&mut self) {
        self.collect_garbage_with(&[]);
    }

    /// Advance the evaluator's iteration counter; `true` once every
    /// `GC_ITERATION_THRESHOLD` calls, signalling the caller should collect.
    pub(crate) fn gc_counter_due(&mut self) -> bool {
        self.gc_counter += 1;
        self.gc_counter % GC_ITERATION_THRESHOLD == 0
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
