// ABOUTME: Evaluator — special forms, application dispatch, and the tail-call trampoline

use crate::cell::CellRef;
use crate::env;
use crate::error::EvalError;
use crate::heap::Heap;
use crate::printer::print_to_string;
use crate::quasiquote;

/// Reports an error on the diagnostic channel and yields `NIL` in its place
/// rather than unwinding. Every special form and
/// application path below funnels its failures through this one function so
/// the "do not unwind" contract is satisfied at a single choke point.
fn report(heap: &Heap, err: impl std::fmt::Display) -> CellRef {
    eprintln!("{err}");
    heap.nil()
}

/// Evaluates `obj` in the current global environment, outside of any tail
/// position.
pub fn eval(heap: &mut Heap, obj: CellRef) -> CellRef {
    let mut tail_args = None;
    eval_ex(heap, obj, None, &mut tail_args)
}

/// The evaluator's single entry point, parameterized by the trampoline's two
/// hidden arguments: `last_lambda` names the lambda currently executing in
/// tail position, if any, and `tail_args` is how a self-call to that same
/// lambda hands its (already evaluated) argument list back to
/// `apply_lambda`'s loop instead of recursing. Every recursive call below
/// that sits in a genuine tail position forwards both; every other
/// recursive call (argument positions, operator position, `define`'s value
/// expression, ...) goes through the plain `eval` helper instead, which
/// passes `None`/`&mut None` and so can never trigger a trampoline bounce.
///
/// Roots the sink at entry and truncates back to that level at exit.
/// `heap.result` is updated first so the returned cell stays reachable
/// across the truncation.
fn eval_ex(
    heap: &mut Heap,
    obj: CellRef,
    last_lambda: Option<CellRef>,
    tail_args: &mut Option<CellRef>,
) -> CellRef {
    let sink_mark = heap.sink_level();
    let ret = eval_dispatch(heap, obj, last_lambda, tail_args);
    heap.result = ret;
    heap.truncate_sink(sink_mark);
    ret
}

fn eval_dispatch(
    heap: &mut Heap,
    obj: CellRef,
    last_lambda: Option<CellRef>,
    tail_args: &mut Option<CellRef>,
) -> CellRef {
    if heap.is_nil(obj) {
        return report(heap, EvalError::Custom("cannot evaluate ()".to_string()));
    }
    if heap.is_symbol(obj) {
        return env::lookup(heap, heap.env, obj);
    }
    if !heap.is_pair(obj) {
        // Self-evaluating: integers, strings, #t/#f, and any already-built
        // lambda/primop/macro cell that ends up in value position.
        return obj;
    }

    let head = heap.car(obj);
    let args = heap.cdr(obj);

    if heap.is_symbol(head) {
        if head == heap.reserved.quote {
            return heap.car(args);
        }
        if head == heap.reserved.if_ {
            return eval_if(heap, args, last_lambda, tail_args);
        }
        if head == heap.reserved.define {
            return eval_define(heap, args);
        }
        if head == heap.reserved.lambda {
            return eval_lambda_form(heap, args);
        }
        if head == heap.reserved.begin {
            return eval_begin(heap, args, last_lambda, tail_args);
        }
        if head == heap.reserved.macro_ {
            return eval_macro_form(heap, args);
        }
        if head == heap.reserved.quasiquote {
            let template = heap.car(args);
            return match quasiquote::expand(heap, template) {
                Ok(v) => v,
                Err(e) => report(heap, e),
            };
        }
        // A failed lookup already reported itself; unlike the generic
        // "cannot apply" fallback below, an unbound-symbol call site does
        // not get a second diagnostic.
        return match env::lookup_checked(heap, heap.env, head) {
            Ok(callee) => apply_resolved(heap, callee, args, last_lambda, tail_args),
            Err(e) => report(heap, e),
        };
    }

    if heap.is_pair(head) {
        // Operator position: evaluate the sub-expression to get the callee.
        // Not itself in tail position, but the trampoline parameters are
        // still forwarded through this call.
        let callee = eval_ex(heap, head, last_lambda, tail_args);
        return apply_resolved(heap, callee, args, last_lambda, tail_args);
    }

    if heap.is_lambda(head) || heap.is_macro(head) || heap.is_primop(head) {
        return apply_resolved(heap, head, args, last_lambda, tail_args);
    }

    report(heap, EvalError::NotApplicable(print_to_string(heap, head)))
}

/// `(if cond then else)`: exactly three forms, both branches in tail
/// position.
fn eval_if(
    heap: &mut Heap,
    args: CellRef,
    last_lambda: Option<CellRef>,
    tail_args: &mut Option<CellRef>,
) -> CellRef {
    if heap.list_len(args) != 3 {
        return report(heap, EvalError::arity("if", "3", heap.list_len(args)));
    }
    let cond = heap.car(args);
    let rest = heap.cdr(args);
    let then_branch = heap.car(rest);
    let else_branch = heap.car(heap.cdr(rest));

    let cond_val = eval(heap, cond);
    if heap.is_truthy(cond_val) {
        eval_ex(heap, then_branch, last_lambda, tail_args)
    } else {
        eval_ex(heap, else_branch, last_lambda, tail_args)
    }
}

/// `(define s e)`: binds `s` in whatever environment is currently active —
/// the global table at the top level, or a lambda's locally-extended
/// environment if evaluated from inside one (there is only ever one flat
/// environment list, `heap.env`).
fn eval_define(heap: &mut Heap, args: CellRef) -> CellRef {
    if heap.list_len(args) != 2 {
        return report(heap, EvalError::arity("define", "2", heap.list_len(args)));
    }
    let name = heap.car(args);
    if !heap.is_symbol(name) {
        return report(
            heap,
            EvalError::type_mismatch("define", "symbol", heap.type_name(name)),
        );
    }
    let value_expr = heap.car(heap.cdr(args));
    let value = eval(heap, value_expr);
    heap.env = env::define(heap, heap.env, name, value);
    value
}

/// `(lambda params body)`: `params` is a proper list of symbols, a single
/// symbol (varargs), or `()`.
fn eval_lambda_form(heap: &mut Heap, args: CellRef) -> CellRef {
    if heap.list_len(args) != 2 {
        return report(heap, EvalError::arity("lambda", "2", heap.list_len(args)));
    }
    let params = heap.car(args);
    let body = heap.car(heap.cdr(args));
    if !(heap.is_nil(params) || heap.is_symbol(params) || is_symbol_list(heap, params)) {
        return report(
            heap,
            EvalError::type_mismatch(
                "lambda",
                "a symbol list, a single symbol, or ()",
                heap.type_name(params),
            ),
        );
    }
    heap.make_lambda(params, body)
}

fn is_symbol_list(heap: &Heap, mut r: CellRef) -> bool {
    while heap.is_pair(r) {
        if !heap.is_symbol(heap.car(r)) {
            return false;
        }
        r = heap.cdr(r);
    }
    heap.is_nil(r)
}

/// `(begin e1 e2 ... en)`: evaluates each expression in order; the last is
/// in tail position, the rest are not.
fn eval_begin(
    heap: &mut Heap,
    args: CellRef,
    last_lambda: Option<CellRef>,
    tail_args: &mut Option<CellRef>,
) -> CellRef {
    if heap.is_nil(args) {
        return heap.nil();
    }
    let mut rest = args;
    loop {
        let expr = heap.car(rest);
        let next = heap.cdr(rest);
        if heap.is_nil(next) {
            return eval_ex(heap, expr, last_lambda, tail_args);
        }
        eval(heap, expr);
        rest = next;
    }
}

/// `(macro (name arg) body)`: binds `name` to a first-class macro cell, the
/// same way `define` binds a value — in whatever environment is currently
/// active.
fn eval_macro_form(heap: &mut Heap, args: CellRef) -> CellRef {
    if heap.list_len(args) != 2 {
        return report(heap, EvalError::arity("macro", "2", heap.list_len(args)));
    }
    let signature = heap.car(args);
    let body = heap.car(heap.cdr(args));
    if heap.list_len(signature) != 2 {
        return report(
            heap,
            EvalError::type_mismatch(
                "macro",
                "(name arg)",
                print_to_string(heap, signature).as_str(),
            ),
        );
    }
    let name = heap.car(signature);
    let arg_name = heap.car(heap.cdr(signature));
    if !heap.is_symbol(name) || !heap.is_symbol(arg_name) {
        return report(
            heap,
            EvalError::type_mismatch("macro", "two symbols", "non-symbol in signature"),
        );
    }
    let macro_cell = heap.make_macro(arg_name, body);
    heap.env = env::define(heap, heap.env, name, macro_cell);
    macro_cell
}

/// Evaluates each element of an unevaluated argument-expression list
/// left-to-right, building a proper list of the results. Argument
/// evaluation is never a tail position, so this never trampolines; only a
/// lambda's own body does.
fn eval_list(heap: &mut Heap, mut exprs: CellRef) -> CellRef {
    let mut values = Vec::new();
    while heap.is_pair(exprs) {
        let v = eval(heap, heap.car(exprs));
        values.push(v);
        exprs = heap.cdr(exprs);
    }
    heap.vec_to_list(&values)
}

/// Resolves a callee cell (already evaluated, or a primop/lambda/macro found
/// directly in head position) against an unevaluated argument-expression
/// list, dispatching on the callee's tag.
fn apply_resolved(
    heap: &mut Heap,
    callee: CellRef,
    args: CellRef,
    last_lambda: Option<CellRef>,
    tail_args: &mut Option<CellRef>,
) -> CellRef {
    if heap.is_primop(callee) {
        apply_primop(heap, callee, args)
    } else if heap.is_lambda(callee) {
        apply_lambda(heap, callee, args, last_lambda, tail_args)
    } else if heap.is_macro(callee) {
        let call_form = heap.cons(callee, args);
        apply_macro(heap, callee, call_form)
    } else {
        report(heap, EvalError::NotApplicable(print_to_string(heap, callee)))
    }
}

fn apply_primop(heap: &mut Heap, primop: CellRef, arg_exprs: CellRef) -> CellRef {
    let evaluated = eval_list(heap, arg_exprs);
    let func = heap
        .primop_func(primop)
        .expect("apply_primop only called with a checked primop cell");
    match func(heap, evaluated) {
        Ok(v) => v,
        Err(e) => report(heap, e),
    }
}

/// Binds the macro's single parameter to the whole unevaluated call form
/// (head included) and evaluates the body twice — once to produce the
/// expanded form, once to run it — restoring the prior environment only
/// after both.
fn apply_macro(heap: &mut Heap, macro_cell: CellRef, call_form: CellRef) -> CellRef {
    let (arg_name, body) = heap
        .macro_parts(macro_cell)
        .expect("apply_macro only called with a checked macro cell");
    let old_env = heap.env;
    heap.env = env::define(heap, heap.env, arg_name, call_form);
    let expanded = eval(heap, body);
    let result = eval(heap, expanded);
    heap.env = old_env;
    result
}

/// Applies a lambda to an unevaluated argument-expression list, trampolining
/// self-tail-calls instead of recursing. `last_lambda`/`tail_args` are this
/// call's own inherited trampoline parameters: if the caller is itself a
/// lambda body evaluating in tail position and that body happens to call
/// the very same lambda, the caller's `eval_ex` bounces back here via
/// `tail_args` rather than growing the Rust stack.
///
/// Arity mismatches are reported as errors: a lambda applied to the wrong
/// number of arguments does not silently truncate or leave parameters
/// unbound.
fn apply_lambda(
    heap: &mut Heap,
    lambda: CellRef,
    args: CellRef,
    last_lambda: Option<CellRef>,
    tail_args: &mut Option<CellRef>,
) -> CellRef {
    apply_lambda_ex(heap, lambda, args, last_lambda, tail_args, false)
}

/// Applies `callee` to an already-evaluated list of values — the `apply`
/// primitive's calling convention, which binds parameters directly instead
/// of re-evaluating each argument the way a call written in source does.
pub fn apply_to_values(heap: &mut Heap, callee: CellRef, values: CellRef) -> CellRef {
    if heap.is_primop(callee) {
        let func = heap
            .primop_func(callee)
            .expect("apply_to_values only called with a checked primop cell");
        match func(heap, values) {
            Ok(v) => v,
            Err(e) => report(heap, e),
        }
    } else if heap.is_lambda(callee) {
        apply_lambda_ex(heap, callee, values, None, &mut None, true)
    } else {
        report(heap, EvalError::NotApplicable(print_to_string(heap, callee)))
    }
}

fn apply_lambda_ex(
    heap: &mut Heap,
    lambda: CellRef,
    args: CellRef,
    last_lambda: Option<CellRef>,
    tail_args: &mut Option<CellRef>,
    start_evaluated: bool,
) -> CellRef {
    if last_lambda == Some(lambda) {
        *tail_args = Some(eval_list(heap, args));
        return heap.nil();
    }

    let old_env = heap.env;
    let old_sink = heap.sink_level();
    let mut current_args = args;
    let mut already_evaluated = start_evaluated;

    loop {
        let (params, body) = heap
            .lambda_parts(lambda)
            .expect("apply_lambda only called with a checked lambda cell");

        if let Err(e) = bind_params(heap, params, current_args, already_evaluated) {
            heap.env = old_env;
            heap.truncate_sink(old_sink);
            return report(heap, e);
        }

        let mut rec: Option<CellRef> = None;
        let body_result = eval_ex(heap, body, Some(lambda), &mut rec);

        heap.env = old_env;
        heap.truncate_sink(old_sink);

        match rec {
            Some(new_args) => {
                current_args = new_args;
                already_evaluated = true;
                heap.args = current_args;
            }
            None => return body_result,
        }
    }
}

/// Binds `params` against `current_args` in a freshly extended `heap.env`.
/// `already_evaluated` distinguishes a first call (where `current_args` are
/// still unevaluated expressions) from a trampoline bounce (where
/// `apply_lambda`'s tail-call branch already reduced them to values).
fn bind_params(
    heap: &mut Heap,
    params: CellRef,
    current_args: CellRef,
    already_evaluated: bool,
) -> Result<(), EvalError> {
    if heap.is_pair(params) || heap.is_nil(params) {
        let mut p = params;
        let mut a = current_args;
        while heap.is_pair(p) && heap.is_pair(a) {
            let psym = heap.car(p);
            let argval = if already_evaluated {
                heap.car(a)
            } else {
                eval(heap, heap.car(a))
            };
            heap.env = env::define(heap, heap.env, psym, argval);
            p = heap.cdr(p);
            a = heap.cdr(a);
        }
        if !heap.is_nil(p) || !heap.is_nil(a) {
            return Err(EvalError::arity(
                "lambda",
                heap.list_len(params).to_string(),
                heap.list_len(current_args),
            ));
        }
    } else {
        let bound = if already_evaluated {
            current_args
        } else {
            eval_list(heap, current_args)
        };
        heap.env = env::define(heap, heap.env, params, bound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    /// `#t`/`#f` are plain symbols to the reader; production code binds them
    /// via `primitives::install`, so test harnesses that skip that do it
    /// here instead.
    fn bind_booleans(heap: &mut Heap) {
        let t_sym = heap.intern("#t");
        let truth = heap.truth();
        heap.env = env::define(heap, heap.env, t_sym, truth);
        let f_sym = heap.intern("#f");
        let falsity = heap.falsity();
        heap.env = env::define(heap, heap.env, f_sym, falsity);
    }

    fn run(heap: &mut Heap, src: &str) -> String {
        bind_booleans(heap);
        let obj = {
            let mut reader = Reader::new(src, heap);
            reader.read_object().unwrap().unwrap()
        };
        let result = eval(heap, obj);
        print_to_string(heap, result)
    }

    fn install_arith(heap: &mut Heap) {
        let plus = heap.intern("+");
        let plus_op = heap.make_primop("+", |heap, args| {
            let xs = heap.list_to_vec(args);
            let mut total = 0i64;
            for x in xs {
                total += heap.integer_value(x).unwrap_or(0);
            }
            Ok(heap.make_integer(total))
        });
        heap.env = env::define(heap, heap.env, plus, plus_op);

        let eq = heap.intern("=");
        let eq_op = heap.make_primop("=", |heap, args| {
            let xs = heap.list_to_vec(args);
            let a = heap.integer_value(xs[0]).unwrap_or(0);
            let b = heap.integer_value(xs[1]).unwrap_or(0);
            Ok(if a == b { heap.truth() } else { heap.falsity() })
        });
        heap.env = env::define(heap, heap.env, eq, eq_op);
    }

    #[test]
    fn self_evaluating_atoms() {
        let mut heap = Heap::new(4096, 1024);
        assert_eq!(run(&mut heap, "42"), "42");
        assert_eq!(run(&mut heap, "\"hi\""), "\"hi\"");
    }

    #[test]
    fn quote_returns_unevaluated_form() {
        let mut heap = Heap::new(4096, 1024);
        assert_eq!(run(&mut heap, "(quote (a b c))"), "(a b c)");
        assert_eq!(run(&mut heap, "'(1 2)"), "(1 2)");
    }

    #[test]
    fn if_picks_the_right_branch() {
        let mut heap = Heap::new(4096, 1024);
        assert_eq!(run(&mut heap, "(if #t 1 2)"), "1");
        assert_eq!(run(&mut heap, "(if #f 1 2)"), "2");
        assert_eq!(run(&mut heap, "(if 0 1 2)"), "1");
    }

    #[test]
    fn define_and_lookup() {
        let mut heap = Heap::new(4096, 1024);
        run(&mut heap, "(define x 10)");
        assert_eq!(run(&mut heap, "x"), "10");
    }

    #[test]
    fn begin_returns_last_value() {
        let mut heap = Heap::new(4096, 1024);
        assert_eq!(run(&mut heap, "(begin 1 2 3)"), "3");
    }

    #[test]
    fn lambda_application() {
        let mut heap = Heap::new(4096, 1024);
        install_arith(&mut heap);
        run(&mut heap, "(define add (lambda (a b) (+ a b)))");
        assert_eq!(run(&mut heap, "(add 3 4)"), "7");
    }

    #[test]
    fn lambda_arity_mismatch_reports_and_returns_nil() {
        let mut heap = Heap::new(4096, 1024);
        run(&mut heap, "(define f (lambda (a b) a))");
        assert_eq!(run(&mut heap, "(f 1)"), "()");
    }

    #[test]
    fn varargs_lambda_binds_whole_list() {
        let mut heap = Heap::new(4096, 1024);
        run(&mut heap, "(define list-of (lambda xs xs))");
        assert_eq!(run(&mut heap, "(list-of 1 2 3)"), "(1 2 3)");
    }

    #[test]
    fn deep_tail_recursion_does_not_grow_the_rust_stack() {
        let mut heap = Heap::new(1 << 14, 1024);
        install_arith(&mut heap);
        run(
            &mut heap,
            "(define loop (lambda (n acc) (if (= n 0) acc (loop (+ n -1) (+ acc 1)))))",
        );
        assert_eq!(run(&mut heap, "(loop 100000 0)"), "100000");
    }

    #[test]
    fn macro_expands_the_call_form_before_running_it() {
        let mut heap = Heap::new(4096, 1024);
        run(
            &mut heap,
            "(macro (my-if c) (quote (if (car (cdr c)) 1 2)))",
        );
        // Expanding `(my-if #t)` substitutes the literal `(car (cdr c))`
        // form into `if`'s condition slot, then the second eval runs it.
        assert_eq!(run(&mut heap, "(my-if #t)"), "1");
    }
}
