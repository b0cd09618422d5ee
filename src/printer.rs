// ABOUTME: Printer — recursive S-expression writer, with write/display distinction

use crate::cell::{CellData, CellRef};
use crate::heap::Heap;
use std::fmt::Write as _;

/// `write` quotes strings (`"like this"`); `display` emits a string's raw
/// characters instead. Both spellings agree on every other cell type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Write,
    Display,
}

pub fn print_to_string(heap: &Heap, obj: CellRef) -> String {
    let mut out = String::new();
    print_obj(heap, obj, Style::Write, &mut out);
    out
}

pub fn display_to_string(heap: &Heap, obj: CellRef) -> String {
    let mut out = String::new();
    print_obj(heap, obj, Style::Display, &mut out);
    out
}

fn print_obj(heap: &Heap, obj: CellRef, style: Style, out: &mut String) {
    if heap.is_nil(obj) {
        out.push_str("()");
        return;
    }
    if obj == heap.truth() {
        out.push_str("#t");
        return;
    }
    if obj == heap.falsity() {
        out.push_str("#f");
        return;
    }
    match heap.data(obj) {
        CellData::Pair { .. } => print_pair(heap, obj, style, out),
        CellData::String(s) => {
            if style == Style::Display {
                out.push_str(s);
            } else {
                out.push('"');
                out.push_str(s);
                out.push('"');
            }
        }
        CellData::Symbol(s) => out.push_str(s),
        CellData::Integer(v) => {
            let _ = write!(out, "{v}");
        }
        CellData::Primop { .. } => out.push_str("<primop>"),
        CellData::Lambda { .. } => out.push_str("<lambda>"),
        CellData::Macro { .. } => out.push_str("<macro>"),
        CellData::Empty => out.push_str("()"),
    }
}

fn print_pair(heap: &Heap, mut pair: CellRef, style: Style, out: &mut String) {
    out.push('(');
    let mut first = true;
    while heap.is_pair(pair) {
        if !first {
            out.push(' ');
        }
        first = false;
        print_obj(heap, heap.car(pair), style, out);
        pair = heap.cdr(pair);
    }
    if !heap.is_nil(pair) {
        out.push_str(" . ");
        print_obj(heap, pair, style, out);
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    fn roundtrip(src: &str) -> String {
        let mut heap = Heap::new(4096, 1024);
        let obj = {
            let mut reader = Reader::new(src, &mut heap);
            reader.read_object().unwrap().unwrap()
        };
        print_to_string(&heap, obj)
    }

    #[test]
    fn prints_sentinels() {
        let mut heap = Heap::new(64, 64);
        assert_eq!(print_to_string(&heap, heap.nil()), "()");
        assert_eq!(print_to_string(&heap, heap.truth()), "#t");
        assert_eq!(print_to_string(&heap, heap.falsity()), "#f");
        let n = heap.make_integer(5);
        assert_eq!(print_to_string(&heap, n), "5");
    }

    #[test]
    fn round_trips_lists_up_to_whitespace() {
        assert_eq!(roundtrip("(1 2 3)"), "(1 2 3)");
        assert_eq!(roundtrip("(1 . 2)"), "(1 . 2)");
        assert_eq!(roundtrip("(  1   2 )"), "(1 2)");
    }

    #[test]
    fn write_quotes_strings_display_does_not() {
        let mut heap = Heap::new(64, 64);
        let s = heap.make_string("hi");
        assert_eq!(print_to_string(&heap, s), "\"hi\"");
        assert_eq!(display_to_string(&heap, s), "hi");
    }
}
