// ABOUTME: Environment — flat association-list bindings with latest-wins shadowing

use crate::cell::CellRef;
use crate::error::EvalError;
use crate::heap::Heap;

/// Prepends `(symbol . (value . ()))` onto `env`, shadowing any earlier
/// binding of the same symbol without mutating it. The global environment
/// (`heap.env`) and a lambda's local bindings are the very same kind of
/// list, so a lambda body sees whatever is currently bound in its caller's
/// frame as well as its own parameters — scoping is dynamic, not lexical.
pub fn define(heap: &mut Heap, env: CellRef, symbol: CellRef, value: CellRef) -> CellRef {
    let nil = heap.nil();
    let value_cell = heap.cons(value, nil);
    let binding = heap.cons(symbol, value_cell);
    heap.cons(binding, env)
}

/// Walks `env` head to tail, returning the first binding whose symbol is
/// identity-equal to `symbol`. Reports and returns `NIL` on a miss rather
/// than propagating an error that would unwind the caller —
/// `lookup_checked` is provided for call sites that do want the `Result`.
pub fn lookup(heap: &Heap, env: CellRef, symbol: CellRef) -> CellRef {
    match lookup_checked(heap, env, symbol) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            heap.nil()
        }
    }
}

pub fn lookup_checked(heap: &Heap, mut env: CellRef, symbol: CellRef) -> Result<CellRef, EvalError> {
    while heap.is_pair(env) {
        let binding = heap.car(env);
        if heap.car(binding) == symbol {
            return Ok(heap.car(heap.cdr(binding)));
        }
        env = heap.cdr(env);
    }
    let name = heap.symbol_name(symbol).unwrap_or("?").to_string();
    Err(EvalError::UndefinedSymbol(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_binding_wins() {
        let mut heap = Heap::new(256, 64);
        let sym = heap.intern("x");
        let one = heap.make_integer(1);
        let two = heap.make_integer(2);
        let env = heap.nil();
        let env = define(&mut heap, env, sym, one);
        let env = define(&mut heap, env, sym, two);
        assert_eq!(lookup(&heap, env, sym), two);
    }

    #[test]
    fn unbound_symbol_reports_and_returns_nil() {
        let mut heap = Heap::new(256, 64);
        let sym = heap.intern("missing");
        let env = heap.nil();
        assert!(lookup_checked(&heap, env, sym).is_err());
        assert_eq!(lookup(&heap, env, sym), heap.nil());
    }

    #[test]
    fn define_after_lookup_returns_latest_value() {
        let mut heap = Heap::new(256, 64);
        let sym = heap.intern("counter");
        let mut env = heap.nil();
        for v in 0..5 {
            let cell = heap.make_integer(v);
            env = define(&mut heap, env, sym, cell);
        }
        let looked_up = lookup(&heap, env, sym);
        assert_eq!(heap.integer_value(looked_up), Some(4));
    }
}
