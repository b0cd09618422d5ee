//! `apply`, `eval`, `%gc-stats`
//!
//! `apply` takes a callable and an already-built argument list and invokes
//! it without re-evaluating the arguments. `eval` evaluates its single
//! argument in the current global environment.
//!
//! `%gc-stats` exposes the arena's free/used slot counts as
//! `(free . used)`, so tests can observe GC behavior without reaching into
//! `Heap` internals directly.

use crate::cell::CellRef;
use crate::error::EvalError;
use crate::eval::{apply_to_values, eval};
use crate::heap::Heap;
use crate::primitives::{define_primop, expect_args};

fn apply(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 2, "apply")?;
    Ok(apply_to_values(heap, xs[0], xs[1]))
}

fn eval_primop(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 1, "eval")?;
    Ok(eval(heap, xs[0]))
}

fn gc_stats(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    expect_args(heap, args, 0, "%gc-stats")?;
    let (free, used) = heap.stats();
    let free_cell = heap.make_integer(free as i64);
    let used_cell = heap.make_integer(used as i64);
    Ok(heap.cons(free_cell, used_cell))
}

pub fn register(heap: &mut Heap) {
    define_primop(heap, "apply", apply);
    define_primop(heap, "eval", eval_primop);
    define_primop(heap, "%gc-stats", gc_stats);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_to_string;

    #[test]
    fn apply_invokes_a_primop_without_reevaluating_arguments() {
        let mut heap = Heap::new(4096, 1024);
        crate::primitives::install(&mut heap);
        let plus = crate::env::lookup(&heap, heap.env, heap.intern("+"));
        let one = heap.make_integer(1);
        let two = heap.make_integer(2);
        let arg_list = heap.vec_to_list(&[one, two]);
        let args = heap.vec_to_list(&[plus, arg_list]);
        let result = apply(&mut heap, args).unwrap();
        assert_eq!(print_to_string(&heap, result), "3");
    }

    #[test]
    fn gc_stats_reports_free_and_used_slots() {
        let mut heap = Heap::new(64, 64);
        let (free, used) = heap.stats();
        let result = gc_stats(&mut heap, heap.nil()).unwrap();
        assert_eq!(
            print_to_string(&heap, result),
            format!("({} . {})", free, used)
        );
    }

    #[test]
    fn eval_evaluates_its_argument() {
        let mut heap = Heap::new(4096, 1024);
        let sym = heap.intern("x");
        let val = heap.make_integer(9);
        let env = heap.env;
        heap.env = crate::env::define(&mut heap, env, sym, val);
        let args = heap.vec_to_list(&[sym]);
        let result = eval_primop(&mut heap, args).unwrap();
        assert_eq!(print_to_string(&heap, result), "9");
    }
}
