// ABOUTME: Fixed-capacity cell arena with mark-sweep GC, symbol table, and the root registers

use crate::cell::{Cell, CellData, CellRef, PrimopFn};
use crate::error::FatalError;
use std::collections::HashMap;

/// `NIL`, `TRUE` and `FALSE` are sentinels owned by the context rather than
/// the arena: they never get marked/swept and never count against
/// `max_cells`. Reserved indices above any real arena slot.
const NIL_REF: CellRef = CellRef(usize::MAX);
const TRUE_REF: CellRef = CellRef(usize::MAX - 1);
const FALSE_REF: CellRef = CellRef(usize::MAX - 2);

fn fatal(err: FatalError) -> ! {
    eprintln!("fatal: {err}");
    std::process::exit(1);
}

/// Interned cells for the reader macros and special-form keywords, resolved
/// once at startup so the rest of the interpreter can dispatch on `CellRef`
/// identity rather than re-comparing strings.
#[derive(Debug, Clone, Copy)]
pub struct Symbols {
    pub quote: CellRef,
    pub quasiquote: CellRef,
    pub unquote: CellRef,
    pub unquote_splice: CellRef,
    pub if_: CellRef,
    pub begin: CellRef,
    pub define: CellRef,
    pub lambda: CellRef,
    pub macro_: CellRef,
    pub dot: CellRef,
}

impl Symbols {
    fn placeholder(nil: CellRef) -> Self {
        Symbols {
            quote: nil,
            quasiquote: nil,
            unquote: nil,
            unquote_splice: nil,
            if_: nil,
            begin: nil,
            define: nil,
            lambda: nil,
            macro_: nil,
            dot: nil,
        }
    }
}

/// The cell arena, GC, symbol table, and the evaluator's root registers
/// (`env`, `result`, `args`), all bundled together — there is exactly one
/// of these per running interpreter.
pub struct Heap {
    cells: Vec<Cell>,
    max_cells: usize,
    cursor: usize,
    in_use: usize,

    sink: Vec<CellRef>,
    max_sink: usize,

    symbols: HashMap<String, CellRef>,
    syms_list: CellRef,

    /// The global environment: a cons-list of `(symbol . (value . ()))`
    /// entries. Flat, not a lexical-scope chain.
    pub env: CellRef,
    /// The evaluator's current result, kept alive across allocations that
    /// might trigger a collection mid-expression.
    pub result: CellRef,
    /// The evaluator's current argument list under construction.
    pub args: CellRef,

    pub reserved: Symbols,

    nil_cell: Cell,
    true_cell: Cell,
    false_cell: Cell,
}

impl Heap {
    pub fn new(max_cells: usize, max_sink: usize) -> Self {
        let mut heap = Heap {
            cells: (0..max_cells).map(|_| Cell::default()).collect(),
            max_cells,
            cursor: 0,
            in_use: 0,
            sink: Vec::with_capacity(max_sink.min(256)),
            max_sink,
            symbols: HashMap::new(),
            syms_list: NIL_REF,
            env: NIL_REF,
            result: NIL_REF,
            args: NIL_REF,
            reserved: Symbols::placeholder(NIL_REF),
            nil_cell: Cell {
                data: CellData::Empty,
                used: true,
                mark: false,
            },
            true_cell: Cell {
                data: CellData::Empty,
                used: true,
                mark: false,
            },
            false_cell: Cell {
                data: CellData::Empty,
                used: true,
                mark: false,
            },
        };
        heap.env = NIL_REF;

        let quote = heap.intern("quote");
        let quasiquote = heap.intern("quasiquote");
        let unquote = heap.intern("unquote");
        let unquote_splice = heap.intern("unquote-splice");
        let if_ = heap.intern("if");
        let begin = heap.intern("begin");
        let define = heap.intern("define");
        let lambda = heap.intern("lambda");
        let macro_ = heap.intern("macro");
        let dot = heap.intern(".");
        heap.reserved = Symbols {
            quote,
            quasiquote,
            unquote,
            unquote_splice,
            if_,
            begin,
            define,
            lambda,
            macro_,
            dot,
        };
        heap
    }

    // ===== sentinels =====

    pub fn nil(&self) -> CellRef {
        NIL_REF
    }

    pub fn truth(&self) -> CellRef {
        TRUE_REF
    }

    pub fn falsity(&self) -> CellRef {
        FALSE_REF
    }

    pub fn is_nil(&self, r: CellRef) -> bool {
        r == NIL_REF
    }

    /// Every value except `FALSE` is truthy, `NIL` included.
    pub fn is_truthy(&self, r: CellRef) -> bool {
        r != FALSE_REF
    }

    fn is_sentinel(r: CellRef) -> bool {
        r == NIL_REF || r == TRUE_REF || r == FALSE_REF
    }

    // ===== raw cell access =====

    pub fn get(&self, r: CellRef) -> &Cell {
        match r {
            NIL_REF => &self.nil_cell,
            TRUE_REF => &self.true_cell,
            FALSE_REF => &self.false_cell,
            _ => &self.cells[r.0],
        }
    }

    fn set_data(&mut self, r: CellRef, data: CellData) {
        debug_assert!(!Self::is_sentinel(r), "sentinels have no payload");
        self.cells[r.0].data = data;
    }

    pub fn data(&self, r: CellRef) -> &CellData {
        &self.get(r).data
    }

    pub fn is_pair(&self, r: CellRef) -> bool {
        matches!(self.data(r), CellData::Pair { .. })
    }

    pub fn is_symbol(&self, r: CellRef) -> bool {
        matches!(self.data(r), CellData::Symbol(_))
    }

    pub fn is_integer(&self, r: CellRef) -> bool {
        matches!(self.data(r), CellData::Integer(_))
    }

    pub fn is_lambda(&self, r: CellRef) -> bool {
        matches!(self.data(r), CellData::Lambda { .. })
    }

    pub fn is_macro(&self, r: CellRef) -> bool {
        matches!(self.data(r), CellData::Macro { .. })
    }

    pub fn is_primop(&self, r: CellRef) -> bool {
        matches!(self.data(r), CellData::Primop { .. })
    }

    pub fn is_string(&self, r: CellRef) -> bool {
        matches!(self.data(r), CellData::String(_))
    }

    pub fn integer_value(&self, r: CellRef) -> Option<i64> {
        match self.data(r) {
            CellData::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn string_value(&self, r: CellRef) -> Option<&str> {
        match self.data(r) {
            CellData::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn lambda_parts(&self, r: CellRef) -> Option<(CellRef, CellRef)> {
        match self.data(r) {
            CellData::Lambda { params, body } => Some((*params, *body)),
            _ => None,
        }
    }

    pub fn macro_parts(&self, r: CellRef) -> Option<(CellRef, CellRef)> {
        match self.data(r) {
            CellData::Macro { arg_name, body } => Some((*arg_name, *body)),
            _ => None,
        }
    }

    pub fn primop_func(&self, r: CellRef) -> Option<PrimopFn> {
        match self.data(r) {
            CellData::Primop { func, .. } => Some(*func),
            _ => None,
        }
    }

    /// Length of a proper list — stops at the first non-pair (dotted tails
    /// and improper lists just count their pair prefix).
    pub fn list_len(&self, mut r: CellRef) -> usize {
        let mut n = 0;
        while self.is_pair(r) {
            n += 1;
            r = self.cdr(r);
        }
        n
    }

    /// Collects a proper list's elements into a `Vec`, in order. Stops at
    /// the first non-pair, mirroring `list_len`.
    pub fn list_to_vec(&self, mut r: CellRef) -> Vec<CellRef> {
        let mut out = Vec::new();
        while self.is_pair(r) {
            out.push(self.car(r));
            r = self.cdr(r);
        }
        out
    }

    /// Unchecked accessor — callers are expected to have checked `is_pair`
    /// (or come from a context where the shape is already guaranteed, e.g.
    /// a freshly-built list).
    pub fn car(&self, r: CellRef) -> CellRef {
        match self.data(r) {
            CellData::Pair { car, .. } => *car,
            _ => self.nil(),
        }
    }

    pub fn cdr(&self, r: CellRef) -> CellRef {
        match self.data(r) {
            CellData::Pair { cdr, .. } => *cdr,
            _ => self.nil(),
        }
    }

    pub fn type_name(&self, r: CellRef) -> &'static str {
        match r {
            NIL_REF => "empty",
            TRUE_REF | FALSE_REF => "boolean",
            _ => self.data(r).type_name(),
        }
    }

    // ===== allocation =====

    /// The pre-sink allocator: returns a fresh, `used` slot without pushing
    /// it onto the sink. `tmp_a`/`tmp_b` are rooted for the duration of the
    /// call so a collection triggered by arena pressure can't reclaim
    /// operands that aren't attached to any other root yet.
    fn raw_get_cell(&mut self, tmp_a: CellRef, tmp_b: CellRef) -> CellRef {
        if self.max_cells.saturating_sub(self.in_use) < 1 {
            self.collect(tmp_a, tmp_b);
        }
        let mut i = self.cursor;
        for _ in 0..self.max_cells {
            if !self.cells[i].used {
                self.cells[i].used = true;
                self.in_use += 1;
                self.cursor = (i + 1) % self.max_cells;
                return CellRef(i);
            }
            i = (i + 1) % self.max_cells;
        }
        fatal(FatalError::ArenaExhausted(self.max_cells))
    }

    fn push_sink(&mut self, r: CellRef) {
        if self.sink.len() >= self.max_sink {
            eprintln!("warning: out of sink space, cell is unrooted until attached");
            return;
        }
        self.sink.push(r);
    }

    /// The public allocator: allocates a cell and pushes it to the sink so
    /// it survives until explicitly attached elsewhere or the sink is
    /// truncated.
    fn alloc(&mut self, tmp_a: CellRef, tmp_b: CellRef) -> CellRef {
        let r = self.raw_get_cell(tmp_a, tmp_b);
        self.push_sink(r);
        r
    }

    pub fn cons(&mut self, car: CellRef, cdr: CellRef) -> CellRef {
        let r = self.alloc(car, cdr);
        self.set_data(r, CellData::Pair { car, cdr });
        r
    }

    /// A cons that does not push its result to the sink, for callers who
    /// immediately attach it to an existing root (e.g. prepending to the
    /// environment or symbol list).
    pub fn raw_cons(&mut self, car: CellRef, cdr: CellRef) -> CellRef {
        let r = self.raw_get_cell(car, cdr);
        self.set_data(r, CellData::Pair { car, cdr });
        r
    }

    pub fn make_string(&mut self, s: impl Into<String>) -> CellRef {
        let r = self.alloc(self.nil(), self.nil());
        self.set_data(r, CellData::String(s.into()));
        r
    }

    pub fn make_integer(&mut self, v: i64) -> CellRef {
        let r = self.alloc(self.nil(), self.nil());
        self.set_data(r, CellData::Integer(v));
        r
    }

    pub fn make_primop(&mut self, name: &'static str, func: PrimopFn) -> CellRef {
        let r = self.alloc(self.nil(), self.nil());
        self.set_data(r, CellData::Primop { name, func });
        r
    }

    pub fn make_lambda(&mut self, params: CellRef, body: CellRef) -> CellRef {
        let r = self.alloc(params, body);
        self.set_data(r, CellData::Lambda { params, body });
        r
    }

    pub fn make_macro(&mut self, arg_name: CellRef, body: CellRef) -> CellRef {
        let r = self.alloc(arg_name, body);
        self.set_data(r, CellData::Macro { arg_name, body });
        r
    }

    /// Interns `name`, returning the canonical cell for that spelling.
    /// Symbol identity is spelling equality; the interned-symbol list is a
    /// GC root so every interned symbol lives for the lifetime of the
    /// context.
    pub fn intern(&mut self, name: &str) -> CellRef {
        if let Some(&r) = self.symbols.get(name) {
            return r;
        }
        let r = self.alloc(self.nil(), self.nil());
        self.set_data(r, CellData::Symbol(name.to_string()));
        self.symbols.insert(name.to_string(), r);
        self.syms_list = self.raw_cons(r, self.syms_list);
        r
    }

    pub fn symbol_name(&self, r: CellRef) -> Option<&str> {
        match self.data(r) {
            CellData::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    // ===== GC =====

    fn mark(&mut self, r: CellRef) {
        if Self::is_sentinel(r) {
            return;
        }
        let idx = r.0;
        if self.cells[idx].mark {
            return;
        }
        self.cells[idx].mark = true;
        let children: [Option<CellRef>; 2] = match &self.cells[idx].data {
            CellData::Pair { car, cdr } => [Some(*car), Some(*cdr)],
            CellData::Lambda { params, body } => [Some(*params), Some(*body)],
            CellData::Macro { arg_name, body } => [Some(*arg_name), Some(*body)],
            _ => [None, None],
        };
        for child in children.into_iter().flatten() {
            self.mark(child);
        }
    }

    /// Runs one mark-sweep cycle rooted in the symbol list, the global
    /// environment, the evaluator's result/args registers, the sink, and
    /// the two caller-supplied temporaries.
    pub fn collect(&mut self, tmp_a: CellRef, tmp_b: CellRef) {
        let sink_snapshot = self.sink.clone();
        for r in sink_snapshot {
            self.mark(r);
        }
        self.mark(self.syms_list);
        self.mark(self.env);
        self.mark(self.args);
        self.mark(self.result);
        self.mark(tmp_a);
        self.mark(tmp_b);

        let mut freed = 0usize;
        for cell in self.cells.iter_mut() {
            if cell.used && !cell.mark {
                cell.used = false;
                cell.data = CellData::Empty;
                freed += 1;
            }
            cell.mark = false;
        }
        self.in_use -= freed;
    }

    /// Truncates the sink back to `level`, releasing temporaries from the
    /// finished evaluation step. The sink is truncated, not emptied, at
    /// defined program points.
    pub fn sink_level(&self) -> usize {
        self.sink.len()
    }

    pub fn truncate_sink(&mut self, level: usize) {
        self.sink.truncate(level);
    }

    pub fn stats(&self) -> (usize, usize) {
        (self.max_cells - self.in_use, self.in_use)
    }

    pub fn capacity(&self) -> usize {
        self.max_cells
    }

    /// Builds a proper list from `items`, right to left, rooting the
    /// in-progress tail as a temporary so a collection mid-build can't
    /// reclaim it (same discipline as `raw_get_cell`'s `tmp_a`/`tmp_b`).
    pub fn vec_to_list(&mut self, items: &[CellRef]) -> CellRef {
        let mut tail = self.nil();
        for &item in items.iter().rev() {
            tail = self.cons(item, tail);
        }
        tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_identity() {
        let mut heap = Heap::new(64, 64);
        let a = heap.intern("foo");
        let b = heap.intern("foo");
        assert_eq!(a, b);
        let c = heap.intern("bar");
        assert_ne!(a, c);
    }

    #[test]
    fn cons_car_cdr_roundtrip() {
        let mut heap = Heap::new(64, 64);
        let one = heap.make_integer(1);
        let two = heap.make_integer(2);
        let pair = heap.cons(one, two);
        assert!(heap.is_pair(pair));
        assert_eq!(heap.car(pair), one);
        assert_eq!(heap.cdr(pair), two);
    }

    #[test]
    fn collection_reclaims_unreachable_cells() {
        // Only a handful of slots remain free after the reserved symbols are
        // interned; 100 allocations would exhaust a 32-cell arena outright
        // (and exit the process) unless collection is actually reclaiming
        // garbage between allocations.
        let mut heap = Heap::new(32, 32);
        for i in 0..100 {
            let r = heap.make_integer(i);
            heap.result = r;
            heap.truncate_sink(0);
        }
        let (free, used) = heap.stats();
        assert!(used <= 32);
        assert!(free + used == 32);
    }

    #[test]
    fn allocation_succeeds_after_collection_within_capacity() {
        let mut heap = Heap::new(32, 64);
        for _ in 0..1000 {
            let r = heap.make_integer(42);
            heap.truncate_sink(0);
            let _ = r;
        }
        assert!(heap.stats().1 <= 32);
    }

    #[test]
    fn everything_but_false_is_truthy() {
        let heap = Heap::new(32, 32);
        assert!(heap.is_truthy(heap.nil()));
        assert!(heap.is_truthy(heap.truth()));
        assert!(!heap.is_truthy(heap.falsity()));
    }
}
