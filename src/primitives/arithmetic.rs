//! Arithmetic operations: +, -, *, /, modulo
//!
//! All five are variadic over integers except `modulo`, which takes exactly
//! two. Each folds left to right seeded by its *first* argument, not a
//! fixed identity element — `(*)` is `0`, not `1`.

use crate::cell::CellRef;
use crate::error::EvalError;
use crate::heap::Heap;
use crate::primitives::{define_primop, expect_args, expect_integer};

fn fold_integers(
    heap: &mut Heap,
    args: CellRef,
    form: &'static str,
    combine: fn(i64, i64) -> Result<i64, EvalError>,
) -> Result<CellRef, EvalError> {
    let mut ret: i64 = 0;
    let mut cur = args;
    let mut i = 0;
    while heap.is_pair(cur) {
        let item = heap.car(cur);
        let v = expect_integer(heap, item, form)?;
        ret = if i == 0 { v } else { combine(ret, v)? };
        i += 1;
        cur = heap.cdr(cur);
    }
    Ok(heap.make_integer(ret))
}

/// `(+ 1 2 3) => 6`, `(+) => 0`
fn add(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    fold_integers(heap, args, "+", |a, b| Ok(a + b))
}

/// `(- 10 3 2) => 5`
fn sub(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    fold_integers(heap, args, "-", |a, b| Ok(a - b))
}

/// `(* 2 3 4) => 24`
fn mul(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    fold_integers(heap, args, "*", |a, b| Ok(a * b))
}

/// `(/ 20 4) => 5`. Division by zero is reported rather than panicking.
fn div(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    fold_integers(heap, args, "/", |a, b| {
        a.checked_div(b).ok_or(EvalError::DivisionByZero("/"))
    })
}

/// `(modulo 17 5) => 2`. Exactly two arguments.
fn modulo(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 2, "modulo")?;
    let a = expect_integer(heap, xs[0], "modulo")?;
    let b = expect_integer(heap, xs[1], "modulo")?;
    let r = a.checked_rem(b).ok_or(EvalError::DivisionByZero("modulo"))?;
    Ok(heap.make_integer(r))
}

pub fn register(heap: &mut Heap) {
    define_primop(heap, "+", add);
    define_primop(heap, "-", sub);
    define_primop(heap, "*", mul);
    define_primop(heap, "/", div);
    define_primop(heap, "modulo", modulo);
}
