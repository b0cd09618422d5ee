//! `eq?` and `eqv?`
//!
//! `eq?` is raw `CellRef` identity: two interned symbols are `eq?` because
//! they're the same slot, but two freshly-read string literals with
//! identical spelling are not, because strings are not interned.
//!
//! `eqv?` gives structural equality on integers and strings, falling back
//! to identity (`eq?`) on everything else.

use crate::cell::{CellData, CellRef};
use crate::error::EvalError;
use crate::heap::Heap;
use crate::primitives::{define_primop, expect_args};

fn eq(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 2, "eq?")?;
    Ok(if xs[0] == xs[1] { heap.truth() } else { heap.falsity() })
}

fn eqv(heap: &mut Heap, args: CellRef) -> Result<CellRef, EvalError> {
    let xs = expect_args(heap, args, 2, "eqv?")?;
    let (a, b) = (xs[0], xs[1]);
    let equal = if a == b {
        true
    } else {
        match (heap.data(a), heap.data(b)) {
            (CellData::Integer(x), CellData::Integer(y)) => x == y,
            (CellData::String(x), CellData::String(y)) => x == y,
            _ => false,
        }
    };
    Ok(if equal { heap.truth() } else { heap.falsity() })
}

pub fn register(heap: &mut Heap) {
    define_primop(heap, "eq?", eq);
    define_primop(heap, "eqv?", eqv);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_is_identity_not_structural_equality() {
        let mut heap = Heap::new(256, 64);
        let x1 = heap.intern("x");
        let x2 = heap.intern("x");
        let args = heap.vec_to_list(&[x1, x2]);
        assert_eq!(eq(&mut heap, args).unwrap(), heap.truth());

        let a = heap.make_string("a");
        let b = heap.make_string("a");
        let args = heap.vec_to_list(&[a, b]);
        assert_eq!(eq(&mut heap, args).unwrap(), heap.falsity());
    }

    #[test]
    fn eqv_treats_equal_integers_and_strings_as_equivalent() {
        let mut heap = Heap::new(256, 64);
        let a = heap.make_integer(5);
        let b = heap.make_integer(5);
        let args = heap.vec_to_list(&[a, b]);
        assert_eq!(eqv(&mut heap, args).unwrap(), heap.truth());

        let s1 = heap.make_string("hi");
        let s2 = heap.make_string("hi");
        let args = heap.vec_to_list(&[s1, s2]);
        assert_eq!(eqv(&mut heap, args).unwrap(), heap.truth());
    }

    #[test]
    fn eqv_falls_back_to_identity_for_other_types() {
        let mut heap = Heap::new(256, 64);
        let p1 = heap.cons(heap.nil(), heap.nil());
        let p2 = heap.cons(heap.nil(), heap.nil());
        let args = heap.vec_to_list(&[p1, p2]);
        assert_eq!(eqv(&mut heap, args).unwrap(), heap.falsity());
    }
}
