use std::sync::Arc;

use super::{ICharStream, IIntStream, InputStream};
use crate::token::TOKEN_EOF;
use crate::util::{Code, Position};

impl InputStream {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self::with_name(text, "<unknown>")
    }

    pub fn with_name<T: Into<String>>(text: T, name: &str) -> Self {
        Self {
            code: Code::new(text),
            name: Arc::from(name),
            pointer: 0,
            mark_depth: 0,
        }
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn name(&self) -> Arc<str> {
        self.name.clone()
    }

    /// Line and column of a code point offset, for error reporting paths
    /// which have no token to read the position from.
    pub fn position_of(&self, pointer: usize) -> Position {
        self.code.obtain_position(pointer)
    }
}

impl IIntStream for InputStream {
    fn consume(&mut self) {
        if self.pointer >= self.code.len() {
            panic!("cannot consume EOF");
        }
        self.pointer += 1;
    }

    fn la(&mut self, offset: isize) -> i32 {
        if offset == 0 {
            return 0;
        }
        let index = if offset > 0 {
            self.pointer as isize + offset - 1
        } else {
            self.pointer as isize + offset
        };
        if index < 0 {
            return TOKEN_EOF;
        }
        match self.code.char_at(index as usize) {
            Some(c) => c as i32,
            None => TOKEN_EOF,
        }
    }

    fn mark(&mut self) -> isize {
        self.mark_depth += 1;
        -(self.mark_depth as isize)
    }

    fn release(&mut self, marker: isize) {
        let expected = -(self.mark_depth as isize);
        if marker != expected {
            panic!(
                "release() called with an invalid marker; expected {} got {}",
                expected, marker
            );
        }
        self.mark_depth -= 1;
    }

    fn index(&self) -> usize {
        self.pointer
    }

    fn seek(&mut self, index: usize) {
        self.pointer = std::cmp::min(index, self.code.len());
    }

    fn size(&mut self) -> usize {
        self.code.len()
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

impl ICharStream for InputStream {
    fn get_text(&self, start: usize, stop: usize) -> String {
        self.code.text_range(start, stop)
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn lookahead_and_consume() {
        let mut s = InputStream::new("ab");
        assert_eq!(s.la(1), 'a' as i32);
        assert_eq!(s.la(2), 'b' as i32);
        assert_eq!(s.la(3), TOKEN_EOF);
        s.consume();
        assert_eq!(s.la(-1), 'a' as i32);
        assert_eq!(s.la(1), 'b' as i32);
        s.consume();
        assert_eq!(s.la(1), TOKEN_EOF);
    }

    #[test]
    fn balanced_mark_release_preserves_index() {
        let mut s = InputStream::new("xyz");
        s.consume();
        let before = s.index();
        let m = s.mark();
        s.consume();
        s.consume();
        s.seek(before);
        s.release(m);
        assert_eq!(s.index(), before);
    }

    #[test]
    #[should_panic(expected = "invalid marker")]
    fn out_of_order_release_is_fatal() {
        let mut s = InputStream::new("xyz");
        let first = s.mark();
        let _second = s.mark();
        s.release(first);
    }
}
