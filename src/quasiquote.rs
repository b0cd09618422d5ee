// ABOUTME: Quasiquote engine — structural template expansion with unquote/unquote-splice escapes

use crate::cell::CellRef;
use crate::error::EvalError;
use crate::eval::eval;
use crate::heap::Heap;

/// Expands a quasiquote template: identity on non-pairs; on a pair
/// `(h . t)`, a bare `(unquote e)` at the current position collapses to
/// `eval(e)`, an `(unquote e)` found as the *head* element substitutes
/// `eval(e)` for that element and keeps expanding the tail, and anything
/// else has both its head and tail expanded recursively — a pair head that
/// itself contains an `unquote`/`unquote-splice` (e.g. `(begin ,@body)`
/// nested inside a larger template) is not copied verbatim.
///
/// `unquote-splice` (`,@e`) is implemented as real splicing: `e` must
/// evaluate to a list, whose elements are appended in place of the single
/// spliced element.
pub fn expand(heap: &mut Heap, template: CellRef) -> Result<CellRef, EvalError> {
    if !heap.is_pair(template) {
        return Ok(template);
    }
    let h = heap.car(template);
    let t = heap.cdr(template);

    if h == heap.reserved.unquote && is_single(heap, t) {
        let e = heap.car(t);
        return Ok(eval(heap, e));
    }

    if heap.is_pair(h) {
        let hh = heap.car(h);
        let ht = heap.cdr(h);
        if hh == heap.reserved.unquote_splice && is_single(heap, ht) {
            let e = heap.car(ht);
            let spliced = eval(heap, e);
            let rest = expand(heap, t)?;
            return Ok(append_onto(heap, spliced, rest));
        }
        if hh == heap.reserved.unquote && is_single(heap, ht) {
            let e = heap.car(ht);
            let value = eval(heap, e);
            let rest = expand(heap, t)?;
            return Ok(heap.cons(value, rest));
        }
    }

    let head = if heap.is_pair(h) { expand(heap, h)? } else { h };
    let rest = expand(heap, t)?;
    Ok(heap.cons(head, rest))
}

/// True when `r` is a one-element proper list, i.e. `(x)` — the shape of
/// the argument position in `(unquote x)`/`(unquote-splice x)`.
fn is_single(heap: &Heap, r: CellRef) -> bool {
    heap.is_pair(r) && heap.is_nil(heap.cdr(r))
}

/// Appends the elements of proper list `list` onto `tail`. A non-list
/// `list` (spliced value isn't actually a list) degenerates to treating it
/// as a single dotted tail, rather than panicking — nothing here unwinds.
fn append_onto(heap: &mut Heap, list: CellRef, tail: CellRef) -> CellRef {
    if !heap.is_pair(list) {
        return if heap.is_nil(list) { tail } else { list };
    }
    let items = heap.list_to_vec(list);
    let mut result = tail;
    for &item in items.iter().rev() {
        result = heap.cons(item, result);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_to_string;
    use crate::reader::Reader;

    fn run(src_template: &str) -> String {
        let mut heap = Heap::new(4096, 1024);
        let template = {
            let mut reader = Reader::new(src_template, &mut heap);
            reader.read_object().unwrap().unwrap()
        };
        let result = expand(&mut heap, template).unwrap();
        print_to_string(&heap, result)
    }

    #[test]
    fn identity_on_non_pair() {
        assert_eq!(run("5"), "5");
        assert_eq!(run("x"), "x");
    }

    #[test]
    fn copies_verbatim_without_unquote() {
        assert_eq!(run("(1 2 3)"), "(1 2 3)");
    }

    #[test]
    fn substitutes_unquote_in_element_position() {
        assert_eq!(run("(1 (unquote (+ 2 3)) 4)"), "(1 5 4)");
    }

    #[test]
    fn bare_unquote_at_top_collapses_to_eval() {
        assert_eq!(run("(unquote (+ 1 2))"), "3");
    }

    #[test]
    fn splices_a_list_in_place() {
        let mut heap = Heap::new(4096, 1024);
        let xs = heap.intern("xs");
        let one = heap.make_integer(1);
        let two = heap.make_integer(2);
        let nil = heap.nil();
        let tail = heap.cons(two, nil);
        let list = heap.cons(one, tail);
        let env = heap.env;
        heap.env = crate::env::define(&mut heap, env, xs, list);

        let template = {
            let mut reader = Reader::new("(0 (unquote-splice xs) 3)", &mut heap);
            reader.read_object().unwrap().unwrap()
        };
        let result = expand(&mut heap, template).unwrap();
        assert_eq!(print_to_string(&heap, result), "(0 1 2 3)");
    }

    #[test]
    fn splice_nested_inside_an_element_head_is_expanded_not_copied_verbatim() {
        let mut heap = Heap::new(4096, 1024);
        let xs = heap.intern("xs");
        let one = heap.make_integer(1);
        let two = heap.make_integer(2);
        let nil = heap.nil();
        let tail = heap.cons(two, nil);
        let list = heap.cons(one, tail);
        let env = heap.env;
        heap.env = crate::env::define(&mut heap, env, xs, list);

        // `(begin ,@xs)` sits as an *element*, not the template's own head,
        // the way `when`'s expansion nests `,@body` inside `(begin ...)`.
        let template = {
            let mut reader = Reader::new("(if #t (begin (unquote-splice xs)) ())", &mut heap);
            reader.read_object().unwrap().unwrap()
        };
        let result = expand(&mut heap, template).unwrap();
        assert_eq!(print_to_string(&heap, result), "(if #t (begin 1 2) ())");
    }
}
