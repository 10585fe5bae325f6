// ABOUTME: The iterative, explicit-frame-stack evaluator — section 4.4 of spec.md.
// ABOUTME: No host recursion: tail calls through closures, `if`, and `apply` reuse frames.

use crate::error::LispError;
use crate::heap::Handle;
use crate::interpreter::Interpreter;
use crate::symbol::Symbol;
use crate::value::Value;

/// What the next step of the trampoline should do.
enum State {
    /// Evaluate `expr` in `env`.
    Eval(Value, Value),
    /// A value was just produced; feed it to the frame on top of the stack.
    Return(Value),
}

/// A continuation frame. Corresponds to one instantiation of the 6-slot
/// record of spec.md section 4.4.1, specialized per in-flight operation
/// rather than carrying all six slots on every frame.
struct Frame {
    env: Value,
    kind: FrameKind,
}

enum FrameKind {
    /// Operator expression is being evaluated; `pending` are its unevaluated
    /// argument expressions, in source order.
    EvalOperator { pending: Vec<Value> },
    /// Operator resolved to `proc`; evaluating `pending` left to right,
    /// accumulating `evaluated` in source order as each one returns.
    EvalArgs {
        proc: Value,
        pending: Vec<Value>,
        evaluated: Vec<Value>,
    },
    /// `(define sym value-expr)`: evaluating `value-expr`.
    Define { sym: Symbol },
    /// `(if test then else)`: evaluating `test`.
    If { then_branch: Value, else_branch: Value },
    /// `apply`, stage 1: evaluating the procedure expression.
    ApplyProc { args_expr: Value },
    /// `apply`, stage 2: evaluating the argument-list expression.
    ApplyArgs { proc: Value },
    /// Running a closure/macro body in tail position; `remaining` are the
    /// body expressions after the one currently being evaluated.
    Body { remaining: Vec<Value> },
    /// A macro's body has produced an expansion; re-evaluate it in `env`
    /// (the environment at the macro's call site, not its body env).
    MacroExpand,
}

impl Frame {
    fn collect_roots(&self, out: &mut Vec<Value>) {
        out.push(self.env);
        match &self.kind {
            FrameKind::EvalOperator { pending } => out.extend_from_slice(pending),
            FrameKind::EvalArgs { proc, pending, evaluated } => {
                out.push(*proc);
                out.extend_from_slice(pending);
                out.extend_from_slice(evaluated);
            }
            FrameKind::Define { .. } | FrameKind::MacroExpand => {}
            FrameKind::If { then_branch, else_branch } => {
                out.push(*then_branch);
                out.push(*else_branch);
            }
            FrameKind::ApplyProc { args_expr } => out.push(*args_expr),
            FrameKind::ApplyArgs { proc } => out.push(*proc),
            FrameKind::Body { remaining } => out.extend_from_slice(remaining),
        }
    }
}

impl Interpreter {
    /// Evaluate `expr` in `env` to completion. The only public entry point
    /// into the evaluator, per spec.md section 4.4.
    pub fn eval_expr(&mut self, expr: Value, env: Value) -> Result<Value, LispError> {
        self.drive(State::Eval(expr, env), Vec::new())
    }

    /// Apply `proc` to already-evaluated `args`, independent of any
    /// in-flight evaluation. Used by the `apply` built-in procedure — unlike
    /// the `apply` special form, this path does not preserve tail calls.
    pub fn apply_value(&mut self, proc: Value, args: Vec<Value>) -> Result<Value, LispError> {
        let mut stack = Vec::new();
        let env = self.global_env;
        let state = self.apply_proc(proc, args, env, &mut stack)?;
        self.drive(state, stack)
    }

    fn drive(&mut self, mut state: State, mut stack: Vec<Frame>) -> Result<Value, LispError> {
        loop {
            if self.gc_counter_due() {
                let mut roots = Vec::new();
                match &state {
                    State::Eval(expr, env) => {
                        roots.push(*expr);
                        roots.push(*env);
                    }
                    State::Return(value) => roots.push(*value),
                }
                for frame in &stack {
                    frame.collect_roots(&mut roots);
                }
                self.collect_garbage_with(&roots);
            }

            state = match state {
                State::Eval(expr, env) => self.step_eval(expr, env, &mut stack)?,
                State::Return(value) => match stack.pop() {
                    None => return Ok(value),
                    Some(frame) => self.step_return(value, frame, &mut stack)?,
                },
            };
        }
    }

    /// Classify `expr` and either produce a value directly or begin
    /// application dispatch (section 4.4.2 step 2, 4.4.3).
    fn step_eval(&mut self, expr: Value, env: Value, stack: &mut Vec<Frame>) -> Result<State, LispError> {
        match expr {
            Value::Symbol(s) => self
                .env_get(env, s)
                .map(State::Return)
                .ok_or(LispError::Unbound),
            Value::Nil
            | Value::Integer(_)
            | Value::Builtin(_)
            | Value::Closure(_)
            | Value::Macro(_) => Ok(State::Return(expr)),
            Value::Pair(_) => {
                if !self.is_proper_list(expr) {
                    return Err(LispError::Syntax);
                }
                let items = self.list_to_vec(expr)?;
                let op_expr = items[0];
                let args = items[1..].to_vec();
                self.dispatch_application(op_expr, args, env, stack)
            }
        }
    }

    fn dispatch_application(
        &mut self,
        op_expr: Value,
        args: Vec<Value>,
        env: Value,
        stack: &mut Vec<Frame>,
    ) -> Result<State, LispError> {
        if let Value::Symbol(s) = op_expr {
            if s == self.forms.quote {
                if args.len() != 1 {
                    return Err(LispError::Args);
                }
                return Ok(State::Return(args[0]));
            }
            if s == self.forms.define {
                return self.eval_define(args, env, stack);
            }
            if s == self.forms.lambda {
                return self.eval_lambda(args, env);
            }
            if s == self.forms.defmacro {
                return self.eval_defmacro(args, env);
            }
            if s == self.forms.if_ {
                if args.len() != 3 {
                    return Err(LispError::Args);
                }
                stack.push(Frame {
                    env,
                    kind: FrameKind::If { then_branch: args[1], else_branch: args[2] },
                });
                return Ok(State::Eval(args[0], env));
            }
            if s == self.forms.apply {
                if args.len() != 2 {
                    return Err(LispError::Args);
                }
                stack.push(Frame { env, kind: FrameKind::ApplyProc { args_expr: args[1] } });
                return Ok(State::Eval(args[0], env));
            }
        }
        stack.push(Frame { env, kind: FrameKind::EvalOperator { pending: args } });
        Ok(State::Eval(op_expr, env))
    }

    fn eval_define(&mut self, args: Vec<Value>, env: Value, stack: &mut Vec<Frame>) -> Result<State, LispError> {
        if args.is_empty() {
            return Err(LispError::Args);
        }
        match args[0] {
            Value::Symbol(sym) => {
                if args.len() != 2 {
                    return Err(LispError::Args);
                }
                stack.push(Frame { env, kind: FrameKind::Define { sym } });
                Ok(State::Eval(args[1], env))
            }
            Value::Pair(h) => {
                if args.len() < 2 {
                    return Err(LispError::Args);
                }
                let (name_val, params) = self.heap.car_cdr(h);
                let name = name_val.as_symbol().ok_or(LispError::Type)?;
                let closure = self.make_closure(env, params, &args[1..], false);
                self.env_set(env, name, closure);
                Ok(State::Return(Value::Symbol(name)))
            }
            _ => Err(LispError::Type),
        }
    }

    fn eval_lambda(&mut self, args: Vec<Value>, env: Value) -> Result<State, LispError> {
        if args.len() < 2 {
            return Err(LispError::Args);
        }
        let closure = self.make_closure(env, args[0], &args[1..], false);
        Ok(State::Return(closure))
    }

    fn eval_defmacro(&mut self, args: Vec<Value>, env: Value) -> Result<State, LispError> {
        if args.len() < 2 {
            return Err(LispError::Args);
        }
        let (name_val, params) = match args[0] {
            Value::Pair(h) => self.heap.car_cdr(h),
            _ => return Err(LispError::Type),
        };
        let name = name_val.as_symbol().ok_or(LispError::Type)?;
        let closure = self.make_closure(env, params, &args[1..], true);
        self.env_set(env, name, closure);
        Ok(State::Return(Value::Symbol(name)))
    }

    /// Advance the frame on top of the stack now that it's holding `value`
    /// (section 4.4.4).
    fn step_return(&mut self, value: Value, frame: Frame, stack: &mut Vec<Frame>) -> Result<State, LispError> {
        let env = frame.env;
        match frame.kind {
            FrameKind::EvalOperator { pending } => {
                if let Value::Macro(h) = value {
                    // Macro arguments are the raw, unevaluated expressions.
                    let new_env = self.bind_params(h, pending)?;
                    stack.push(Frame { env, kind: FrameKind::MacroExpand });
                    let (_, _, body) = self.closure_parts(h);
                    let body = self.list_to_vec(body).expect("macro body is always a proper list");
                    Ok(self.enter_body(new_env, body, stack))
                } else if pending.is_empty() {
                    self.apply_proc(value, Vec::new(), env, stack)
                } else {
                    self.continue_args(value, pending, Vec::new(), env, stack)
                }
            }
            FrameKind::EvalArgs { proc, pending, mut evaluated } => {
                evaluated.push(value);
                if pending.is_empty() {
                    self.apply_proc(proc, evaluated, env, stack)
                } else {
                    self.continue_args(proc, pending, evaluated, env, stack)
                }
            }
            FrameKind::Define { sym } => {
                self.env_set(env, sym, value);
                Ok(State::Return(Value::Symbol(sym)))
            }
            FrameKind::If { then_branch, else_branch } => {
                let arm = if value.is_truthy() { then_branch } else { else_branch };
                Ok(State::Eval(arm, env))
            }
            FrameKind::ApplyProc { args_expr } => {
                stack.push(Frame { env, kind: FrameKind::ApplyArgs { proc: value } });
                Ok(State::Eval(args_expr, env))
            }
            FrameKind::ApplyArgs { proc } => {
                let arg_values = self.list_to_vec(value).map_err(|_| LispError::Syntax)?;
                self.apply_proc(proc, arg_values, env, stack)
            }
            FrameKind::Body { mut remaining } => {
                let next = remaining.remove(0);
                if !remaining.is_empty() {
                    stack.push(Frame { env, kind: FrameKind::Body { remaining } });
                }
                Ok(State::Eval(next, env))
            }
            FrameKind::MacroExpand => Ok(State::Eval(value, env)),
        }
    }

    fn continue_args(
        &mut self,
        proc: Value,
        mut pending: Vec<Value>,
        evaluated: Vec<Value>,
        env: Value,
        stack: &mut Vec<Frame>,
    ) -> Result<State, LispError> {
        let next_expr = pending.remove(0);
        stack.push(Frame { env, kind: FrameKind::EvalArgs { proc, pending, evaluated } });
        Ok(State::Eval(next_expr, env))
    }

    /// Apply a resolved procedure to already-evaluated arguments. Builtins
    /// return immediately; closures and macros push a body frame and
    /// continue the trampoline (section 4.4.5).
    fn apply_proc(&mut self, proc: Value, args: Vec<Value>, caller_env: Value, stack: &mut Vec<Frame>) -> Result<State, LispError> {
        match proc {
            Value::Builtin(b) => {
                if args.len() != b.arity {
                    return Err(LispError::Args);
                }
                let result = (b.func)(self, &args)?;
                Ok(State::Return(result))
            }
            Value::Closure(h) => {
                let new_env = self.bind_params(h, args)?;
                let (_, _, body) = self.closure_parts(h);
                let body = self.list_to_vec(body).expect("closure body is always a proper list");
                Ok(self.enter_body(new_env, body, stack))
            }
            Value::Macro(h) => {
                let new_env = self.bind_params(h, args)?;
                stack.push(Frame { env: caller_env, kind: FrameKind::MacroExpand });
                let (_, _, body) = self.closure_parts(h);
                let body = self.list_to_vec(body).expect("macro body is always a proper list");
                Ok(self.enter_body(new_env, body, stack))
            }
            _ => Err(LispError::Type),
        }
    }

    fn enter_body(&mut self, env: Value, mut body: Vec<Value>, stack: &mut Vec<Frame>) -> State {
        if body.is_empty() {
            return State::Return(Value::Nil);
        }
        let first = body.remove(0);
        if !body.is_empty() {
            stack.push(Frame { env, kind: FrameKind::Body { remaining: body } });
        }
        State::Eval(first, env)
    }

    /// Bind a closure/macro's formal parameters to actual arguments in a
    /// fresh environment extending its captured one.
    fn bind_params(&mut self, closure_handle: Handle, args: Vec<Value>) -> Result<Value, LispError> {
        let (captured_env, params, _) = self.closure_parts(closure_handle);
        let new_env = self.env_create(captured_env);
        self.bind_param_list(params, args, new_env)?;
        Ok(new_env)
    }

    fn bind_param_list(&mut self, params: Value, mut args: Vec<Value>, env: Value) -> Result<(), LispError> {
        let mut cur = params;
        let mut idx = 0usize;
        loop {
            match cur {
                Value::Nil => {
                    return if idx == args.len() { Ok(()) } else { Err(LispError::Args) };
                }
                Value::Symbol(s) => {
                    let rest = args.split_off(idx);
                    let rest_list = self.list_of(&rest);
                    self.env_set(env, s, rest_list);
                    return Ok(());
                }
                Value::Pair(h) => {
                    if idx >= args.len() {
                        return Err(LispError::Args);
                    }
                    let (car, cdr) = self.heap.car_cdr(h);
                    let sym = car.as_symbol().ok_or(LispError::Type)?;
                    self.env_set(env, sym, args[idx]);
                    idx += 1;
                    cur = cdr;
                }
                _ => return Err(LispError::Type),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_str(interp: &mut Interpreter, src: &str) -> Result<Value, LispError> {
        let (expr, _) = interp.read_expr(src).expect("test input parses");
        let env = interp.global_env;
        interp.eval_expr(expr, env)
    }

    #[test]
    fn self_evaluating_integer() {
        let mut interp = Interpreter::new();
        assert_eq!(eval_str(&mut interp, "42"), Ok(Value::Integer(42)));
    }

    #[test]
    fn unbound_symbol_errors() {
        let mut interp = Interpreter::new();
        assert_eq!(eval_str(&mut interp, "undef"), Err(LispError::Unbound));
    }

    #[test]
    fn quote_returns_unevaluated() {
        let mut interp = Interpreter::new();
        let result = eval_str(&mut interp, "(quote (a b))").unwrap();
        let items = interp.list_to_vec(result).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn define_returns_symbol_and_binds_value() {
        let mut interp = Interpreter::new();
        let defined = eval_str(&mut interp, "(define x 42)").unwrap();
        let sym = interp.intern("x");
        assert_eq!(defined, Value::Symbol(sym));
        assert_eq!(eval_str(&mut interp, "x"), Ok(Value::Integer(42)));
    }

    #[test]
    fn if_selects_arm_by_truthiness() {
        let mut interp = Interpreter::new();
        assert_eq!(eval_str(&mut interp, "(if t 1 2)"), Ok(Value::Integer(1)));
        assert_eq!(eval_str(&mut interp, "(if nil 1 2)"), Ok(Value::Integer(2)));
    }

    #[test]
    fn lambda_application_and_lexical_scope_shadowing() {
        let mut interp = Interpreter::new();
        let result = eval_str(&mut interp, "((lambda (x) ((lambda (x) x) 2)) 1)").unwrap();
        assert_eq!(result, Value::Integer(2));
        let result = eval_str(&mut interp, "((lambda (x) ((lambda (y) x) 2)) 1)").unwrap();
        assert_eq!(result, Value::Integer(1));
    }

    #[test]
    fn rest_parameter_collects_remaining_args() {
        let mut interp = Interpreter::new();
        let result = eval_str(&mut interp, "((lambda (a . rest) rest) 1 2 3)").unwrap();
        assert_eq!(
            interp.list_to_vec(result).unwrap(),
            vec![Value::Integer(2), Value::Integer(3)]
        );
    }

    #[test]
    fn bare_symbol_params_binds_all_args_as_list() {
        let mut interp = Interpreter::new();
        let result = eval_str(&mut interp, "((lambda xs xs) 1 2 3)").unwrap();
        assert_eq!(
            interp.list_to_vec(result).unwrap(),
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
    }

    #[test]
    fn wrong_arity_on_closure_call_is_args_error() {
        let mut interp = Interpreter::new();
        assert_eq!(eval_str(&mut interp, "((lambda (x y) x) 1)"), Err(LispError::Args));
        assert_eq!(eval_str(&mut interp, "((lambda (x) x) 1 2)"), Err(LispError::Args));
    }

    #[test]
    fn defmacro_expansion_is_re_evaluated_not_returned_literally() {
        let mut interp = Interpreter::new();
        eval_str(&mut interp, "(defmacro (m) '(+ 1 2))").unwrap();
        assert_eq!(eval_str(&mut interp, "(m)"), Ok(Value::Integer(3)));
    }

    #[test]
    fn factorial_via_self_recursive_define() {
        let mut interp = Interpreter::new();
        eval_str(
            &mut interp,
            "(define (fact n) (if (= n 0) 1 (* n (fact (- n 1)))))",
        )
        .unwrap();
        assert_eq!(eval_str(&mut interp, "(fact 6)"), Ok(Value::Integer(720)));
    }

    #[test]
    fn deep_self_tail_recursion_does_not_grow_host_stack() {
        let mut interp = Interpreter::new();
        eval_str(
            &mut interp,
            "(define (count n) (if (= n 0) 0 (count (- n 1))))",
        )
        .unwrap();
        assert_eq!(eval_str(&mut interp, "(count 1000000)"), Ok(Value::Integer(0)));
    }

    #[test]
    fn mutual_tail_recursion_via_if_does_not_grow_host_stack() {
        let mut interp = Interpreter::new();
        eval_str(
            &mut interp,
            "(define (even? n) (if (= n 0) t (odd? (- n 1))))",
        )
        .unwrap();
        eval_str(
            &mut interp,
            "(define (odd? n) (if (= n 0) nil (even? (- n 1))))",
        )
        .unwrap();
        assert_eq!(eval_str(&mut interp, "(even? 500000)"), Ok(interp.true_value()));
    }

    #[test]
    fn apply_special_form_applies_proc_to_evaluated_list() {
        let mut interp = Interpreter::new();
        let result = eval_str(&mut interp, "(apply + '(3 4))").unwrap();
        assert_eq!(result, Value::Integer(7));
    }

    #[test]
    fn apply_special_form_is_tail_call_preserving() {
        let mut interp = Interpreter::new();
        eval_str(
            &mut interp,
            "(define (count n) (if (= n 0) 0 (apply count (cons (- n 1) nil))))",
        )
        .unwrap();
        assert_eq!(eval_str(&mut interp, "(count 1000000)"), Ok(Value::Integer(0)));
    }

    #[test]
    fn eq_on_symbols_is_interning_identity() {
        let mut interp = Interpreter::new();
        assert_eq!(eval_str(&mut interp, "(eq? 'a 'a)"), Ok(interp.true_value()));
    }

    #[test]
    fn eq_on_structurally_equal_pairs_is_false() {
        let mut interp = Interpreter::new();
        assert_eq!(eval_str(&mut interp, "(eq? '(1) '(1))"), Ok(Value::Nil));
    }
}
