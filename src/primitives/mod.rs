// ABOUTME: Primitive registry — defines every built-in primop in the global environment

mod arithmetic;
mod comparison;
mod identity;
mod io;
mod lists;
mod system;

use crate::cell::CellRef;
use crate::error::EvalError;
use crate::heap::Heap;

/// Installs every primitive into `heap.env`. Called once, before the first
/// form is read.
///
/// `#t`/`#f` are ordinary symbols to the reader (the policy table in the
/// reader has no literal-boolean entry), so they only evaluate to the
/// `TRUE`/`FALSE` sentinels because they are bound here, exactly the way
/// the source's `init_env` binds them before installing any primop.
pub fn install(heap: &mut Heap) {
    let t_sym = heap.intern("#t");
    let truth = heap.truth();
    heap.env = crate::env::define(heap, heap.env, t_sym, truth);
    let f_sym = heap.intern("#f");
    let falsity = heap.falsity();
    heap.env = crate::env::define(heap, heap.env, f_sym, falsity);

    arithmetic::register(heap);
    comparison::register(heap);
    identity::register(heap);
    io::register(heap);
    lists::register(heap);
    system::register(heap);
}

fn define_primop(heap: &mut Heap, name: &'static str, func: crate::cell::PrimopFn) {
    let cell = heap.make_primop(name, func);
    let sym = heap.intern(name);
    heap.env = crate::env::define(heap, heap.env, sym, cell);
}

/// Collects `args` into a `Vec` and checks it has exactly `n` elements.
/// Callers that need typed arguments check each element themselves.
fn expect_args(heap: &Heap, args: CellRef, n: usize, form: &str) -> Result<Vec<CellRef>, EvalError> {
    let xs = heap.list_to_vec(args);
    if xs.len() != n {
        return Err(EvalError::arity(form, n.to_string(), xs.len()));
    }
    Ok(xs)
}

fn expect_integer(heap: &Heap, obj: CellRef, form: &str) -> Result<i64, EvalError> {
    heap.integer_value(obj)
        .ok_or_else(|| EvalError::type_mismatch(form, "integer", heap.type_name(obj)))
}

fn expect_pair(heap: &Heap, obj: CellRef, form: &str) -> Result<CellRef, EvalError> {
    if heap.is_pair(obj) {
        Ok(obj)
    } else {
        Err(EvalError::type_mismatch(form, "pair", heap.type_name(obj)))
    }
}
