// ABOUTME: Reader — consumes tokens and builds cell trees, handling reader macros and dotted pairs

use crate::error::ReaderError;
use crate::heap::Heap;
use crate::tokenizer::{Token, Tokenizer};

/// Reads cell trees from a token stream, one top-level object at a time.
/// The `)`/`.` sentinels are returned as an idiomatic Rust enum instead of
/// interned cells compared by pointer identity.
pub struct Reader<'a, 'h> {
    tokenizer: Tokenizer<'a>,
    heap: &'h mut Heap,
}

/// What a single token, at the head of `read_object`, produced.
enum Leading {
    Object(crate::cell::CellRef),
    Close,
}

impl<'a, 'h> Reader<'a, 'h> {
    pub fn new(src: &'a str, heap: &'h mut Heap) -> Self {
        Reader {
            tokenizer: Tokenizer::new(src),
            heap,
        }
    }

    /// The unconsumed remainder of the source, as of the last object read.
    /// A driver reading multiple top-level forms one at a time re-creates a
    /// `Reader` from this each time, so each read's mutable borrow of `Heap`
    /// ends before the next form is evaluated.
    pub fn remaining(&self) -> &'a str {
        self.tokenizer.remaining()
    }

    /// Reads one top-level object. `Ok(None)` is clean end-of-input.
    pub fn read_object(&mut self) -> Result<Option<crate::cell::CellRef>, ReaderError> {
        match self.read_leading()? {
            None => Ok(None),
            Some(Leading::Close) => Err(ReaderError::UnexpectedCloseParen),
            Some(Leading::Object(r)) => Ok(Some(r)),
        }
    }

    /// Dispatches on the leading token. Returns
    /// `None` on end-of-input, `Some(Leading::Close)` for a bare `)` (the
    /// list terminator, meaningful only inside `read_list`), otherwise the
    /// fully-read object.
    fn read_leading(&mut self) -> Result<Option<Leading>, ReaderError> {
        let Some(tok) = self.tokenizer.next_token()? else {
            return Ok(None);
        };
        match tok {
            Token::RParen => Ok(Some(Leading::Close)),
            Token::LParen => Ok(Some(Leading::Object(self.read_list()?))),
            Token::Quote => Ok(Some(Leading::Object(self.read_wrapped(|h| h.reserved.quote)?))),
            Token::Quasiquote => Ok(Some(Leading::Object(
                self.read_wrapped(|h| h.reserved.quasiquote)?,
            ))),
            Token::Unquote => Ok(Some(Leading::Object(
                self.read_wrapped(|h| h.reserved.unquote)?,
            ))),
            Token::UnquoteSplice => Ok(Some(Leading::Object(
                self.read_wrapped(|h| h.reserved.unquote_splice)?,
            ))),
            Token::Str(s) => Ok(Some(Leading::Object(self.heap.make_string(s)))),
            Token::Atom(a) => Ok(Some(Leading::Object(self.atom_to_cell(&a)))),
        }
    }

    /// `'x` -> `(quote x)`; `` `x `` -> `(quasiquote x)`; `,x` -> `(unquote x)`;
    /// `,@x` -> `(unquote-splice x)`. All four reader macros wrap the next
    /// object in a two-element list headed by the given symbol.
    fn read_wrapped(
        &mut self,
        sym: impl FnOnce(&Heap) -> crate::cell::CellRef,
    ) -> Result<crate::cell::CellRef, ReaderError> {
        let head = sym(self.heap);
        let inner = self.read_required_object()?;
        let nil = self.heap.nil();
        let tail = self.heap.cons(inner, nil);
        Ok(self.heap.cons(head, tail))
    }

    fn read_required_object(&mut self) -> Result<crate::cell::CellRef, ReaderError> {
        match self.read_leading()? {
            None => Err(ReaderError::UnterminatedList),
            Some(Leading::Close) => Err(ReaderError::UnexpectedCloseParen),
            Some(Leading::Object(r)) => Ok(r),
        }
    }

    fn atom_to_cell(&mut self, atom: &str) -> crate::cell::CellRef {
        let is_numeric_shaped = !atom.is_empty() && atom.chars().all(|c| c == '-' || c.is_ascii_digit());
        if is_numeric_shaped {
            if let Ok(v) = atom.parse::<i64>() {
                return self.heap.make_integer(v);
            }
        }
        self.heap.intern(atom)
    }

    /// Reads the contents of a list after the opening `(` has already been
    /// consumed, terminating at `)` (-> `NIL`) or handling `. tail)` dotted
    /// pairs. Recurses rather than using an explicit stack; list depth is
    /// bounded by source nesting in practice.
    fn read_list(&mut self) -> Result<crate::cell::CellRef, ReaderError> {
        match self.read_leading()? {
            None => Err(ReaderError::UnterminatedList),
            Some(Leading::Close) => Ok(self.heap.nil()),
            Some(Leading::Object(obj)) if obj == self.heap.reserved.dot => {
                let tail = self.read_required_object()?;
                match self.read_leading()? {
                    Some(Leading::Close) => Ok(tail),
                    None => Err(ReaderError::UnterminatedList),
                    _ => Err(ReaderError::MalformedDottedPair),
                }
            }
            Some(Leading::Object(obj)) => {
                let rest = self.read_list()?;
                Ok(self.heap.cons(obj, rest))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_to_string;

    fn read_one(src: &str) -> (String, Heap) {
        let mut heap = Heap::new(4096, 1024);
        let r = {
            let mut reader = Reader::new(src, &mut heap);
            reader.read_object().unwrap().unwrap()
        };
        (print_to_string(&heap, r), heap)
    }

    #[test]
    fn reads_integer() {
        let (s, _) = read_one("42");
        assert_eq!(s, "42");
        let (s, _) = read_one("-7");
        assert_eq!(s, "-7");
    }

    #[test]
    fn reads_symbol() {
        let (s, _) = read_one("foo-bar?");
        assert_eq!(s, "foo-bar?");
    }

    #[test]
    fn reads_proper_list() {
        let (s, _) = read_one("(1 2 3)");
        assert_eq!(s, "(1 2 3)");
    }

    #[test]
    fn reads_dotted_pair() {
        let (s, _) = read_one("(1 . 2)");
        assert_eq!(s, "(1 . 2)");
    }

    #[test]
    fn reads_nested_list() {
        let (s, _) = read_one("(1 (2 3) 4)");
        assert_eq!(s, "(1 (2 3) 4)");
    }

    #[test]
    fn quote_reader_macro() {
        let (s, _) = read_one("'x");
        assert_eq!(s, "(quote x)");
    }

    #[test]
    fn quasiquote_and_unquote_reader_macros() {
        let (s, _) = read_one("`(1 ,x 3)");
        assert_eq!(s, "(quasiquote (1 (unquote x) 3))");
    }

    #[test]
    fn unquote_splice_reader_macro() {
        let (s, _) = read_one("`(1 ,@xs)");
        assert_eq!(s, "(quasiquote (1 (unquote-splice xs)))");
    }

    #[test]
    fn empty_list_is_nil() {
        let (s, _) = read_one("()");
        assert_eq!(s, "()");
    }

    #[test]
    fn unterminated_list_is_error() {
        let mut heap = Heap::new(256, 64);
        let mut reader = Reader::new("(1 2", &mut heap);
        assert_eq!(reader.read_object(), Err(ReaderError::UnterminatedList));
    }

    #[test]
    fn malformed_dotted_pair_is_error() {
        let mut heap = Heap::new(256, 64);
        let mut reader = Reader::new("(1 . 2 3)", &mut heap);
        assert_eq!(reader.read_object(), Err(ReaderError::MalformedDottedPair));
    }

    #[test]
    fn empty_input_is_clean_eof() {
        let mut heap = Heap::new(256, 64);
        let mut reader = Reader::new("", &mut heap);
        assert_eq!(reader.read_object(), Ok(None));
    }

    #[test]
    fn string_literal() {
        let (s, _) = read_one(r#""hello\nworld""#);
        assert_eq!(s, "\"hello\nworld\"");
    }
}
