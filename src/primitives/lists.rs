//! `cons`, `car`, `cdr`, `length`
//!
//! `car`/`cdr` require a pair argument; `length` counts the proper-list
//! prefix and stops at the first non-pair rather than erroring on improper
//! lists.

use crate::cell::CellRef;
use crate::error::EvalError;
use crate::heap::Heap;
use crate::primitives::{define_primop, expect_args, expect_pair};

fn cons(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 2, "cons")?;
    Ok(heap.cons(xs[0], xs[1]))
}

fn car(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 1, "car")?;
    let pair = expect_pair(heap, xs[0], "car")?;
    Ok(heap.car(pair))
}

fn cdr(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 1, "cdr")?;
    let pair = expect_pair(heap, xs[0], "cdr")?;
    Ok(heap.cdr(pair))
}

fn length(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 1, "length")?;
    let n = heap.list_len(xs[0]) as i64;
    Ok(heap.make_integer(n))
}

pub fn register(heap: &mut Heap) {
    define_primop(heap, "cons", cons);
    define_primop(heap, "car", car);
    define_primop(heap, "cdr", cdr);
    define_primop(heap, "length", length);
}
