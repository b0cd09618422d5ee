//! `write`, `display`, `newline`, `flush-output`
//!
//! All four always return `NIL`. `write` quotes strings; `display` emits a
//! string's raw characters.

use crate::cell::CellRef;
use crate::error::EvalError;
use crate::heap::Heap;
use crate::primitives::{define_primop, expect_args};
use crate::printer::{display_to_string, print_to_string};
use std::io::Write as _;

fn write(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 1, "write")?;
    print!("{}", print_to_string(heap, xs[0]));
    Ok(heap.nil())
}

fn display(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 1, "display")?;
    print!("{}", display_to_string(heap, xs[0]));
    Ok(heap.nil())
}

fn newline(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    expect_args(heap, args, 0, "newline")?;
    println!();
    Ok(heap.nil())
}

fn flush_output(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    expect_args(heap, args, 0, "flush-output")?;
    let _ = std::io::stdout().flush();
    Ok(heap.nil())
}

pub fn register(heap: &mut Heap) {
    define_primop(heap, "write", write);
    define_primop(heap, "display", display);
    define_primop(heap, "newline", newline);
    define_primop(heap, "flush-output", flush_output);
}
