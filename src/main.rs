// ABOUTME: Interactive entry point — the REPL contract of spec.md section 6.

use lisp_frame_vm::printer::print_value;
use lisp_frame_vm::Interpreter;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};

fn main() {
    let mut interp = Interpreter::new();

    if let Ok(source) = std::fs::read_to_string("library.lisp") {
        println!("Reading library.lisp...");
        load_forms(&mut interp, &source);
    }

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), rustyline::history::DefaultHistory> =
        Editor::with_config(config).expect("readline editor initializes");

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                run_line(&mut interp, &line);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(_) => break,
        }
    }
}

/// Wrap one input line in an outer pair of parens and read it back as a
/// single list, per spec.md section 6 — its elements are the top-level
/// forms on that line. Reclaims after each one, per spec.md section 4.5's
/// "after every top-level form evaluated by the REPL" trigger.
fn run_line(interp: &mut Interpreter, line: &str) {
    let wrapped = format!("({})", line);
    let forms = match interp.read_expr(&wrapped) {
        Ok((value, _)) => interp.list_to_vec(value),
        Err(e) => {
            println!("{}", e);
            return;
        }
    };
    let forms = match forms {
        Ok(forms) => forms,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };

    let env = interp.global_env;
    for form in forms {
        match interp.eval_expr(form, env) {
            Ok(value) => println!("{}", print_value(interp, value)),
            Err(e) => println!("{}", e),
        }
        interp.collect_garbage();
    }
}

/// Load every top-level form in `source` in order, per spec.md section 6's
/// `library.lisp` contract: each error prints the offending form before the
/// diagnostic, and loading continues with the next form. Reclaims after
/// each form, per spec.md section 4.5's "after every top-level form
/// evaluated by ... the loader" trigger.
fn load_forms(interp: &mut Interpreter, source: &str) {
    let forms = match interp.read_all(source) {
        Ok(forms) => forms,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };

    let env = interp.global_env;
    for form in forms {
        match interp.eval_expr(form, env) {
            Ok(value) => println!("{}", print_value(interp, value)),
            Err(e) => {
                println!("Error in expression:");
                println!("{}", print_value(interp, form));
                println!("{}", e);
            }
        }
        interp.collect_garbage();
    }
}
