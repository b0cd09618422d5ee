//! Integer comparisons: =, <, >, <=, >=
//!
//! Every one of these is binary — exactly two integers — rather than
//! chained variadic comparisons.

use crate::cell::CellRef;
use crate::error::EvalError;
use crate::heap::Heap;
use crate::primitives::{define_primop, expect_args, expect_integer};

fn compare(
    heap: &mut Heap,
    args: CellRef,
    form: &'static str,
    pred: fn(i64, i64) -> bool,
) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 2, form)?;
    let a = expect_integer(heap, xs[0], form)?;
    let b = expect_integer(heap, xs[1], form)?;
    Ok(if pred(a, b) { heap.truth() } else { heap.falsity() })
}

fn num_eq(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    compare(heap, args, "=", |a, b| a == b)
}

fn lt(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    compare(heap, args, "<", |a, b| a < b)
}

fn gt(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    compare(heap, args, ">", |a, b| a > b)
}

fn le(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    compare(heap, args, "<=", |a, b| a <= b)
}

fn ge(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    compare(heap, args, ">=", |a, b| a >= b)
}

pub fn register(heap: &mut Heap) {
    define_primop(heap, "=", num_eq);
    define_primop(heap, "<", lt);
    define_primop(heap, ">", gt);
    define_primop(heap, "<=", le);
    define_primop(heap, ">=", ge);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_to_string;

    fn apply(heap: &mut Heap, f: crate::cell::PrimopFn, a: i64, b: i64) -> String {
        let av = heap.make_integer(a);
        let bv = heap.make_integer(b);
        let args = heap.vec_to_list(&[av, bv]);
        let ret = f(heap, args).unwrap();
        print_to_string(heap, ret)
    }

    #[test]
    fn equal_values() {
        let mut heap = Heap::new(256, 64);
        assert_eq!(apply(&mut heap, num_eq, 3, 3), "#t");
        assert_eq!(apply(&mut heap, num_eq, 3, 4), "#f");
    }

    #[test]
    fn ordering() {
        let mut heap = Heap::new(256, 64);
        assert_eq!(apply(&mut heap, lt, 1, 2), "#t");
        assert_eq!(apply(&mut heap, gt, 1, 2), "#f");
        assert_eq!(apply(&mut heap, le, 2, 2), "#t");
        assert_eq!(apply(&mut heap, ge, 1, 2), "#f");
    }

    #[test]
    fn wrong_arity_is_reported() {
        let mut heap = Heap::new(256, 64);
        let one = heap.make_integer(1);
        let args = heap.vec_to_list(&[one]);
        assert!(lt(&mut heap, args).is_err());
    }
}
