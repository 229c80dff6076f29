use super::{ITokenSource, ITokenStream, UnbufferedTokenStream};
use crate::token::Token;

impl UnbufferedTokenStream {
    pub fn new(source: Box<dyn ITokenSource>) -> Self {
        let mut stream = Self {
            source,
            tokens: Vec::new(),
            pointer: 0,
            num_markers: 0,
            last_token: None,
            last_token_buffer_start: None,
            current_token_index: 0,
        };
        stream.fill(1);
        stream
    }

    /// Absolute index of the first token still held in the window.
    fn buffer_start_index(&self) -> usize {
        self.current_token_index - self.pointer
    }

    /// Ensure the window holds the token `want` steps ahead of the current one.
    fn sync(&mut self, want: usize) {
        let have = self.tokens.len() - self.pointer;
        if want > have {
            self.fill(want - have);
        }
    }

    fn fill(&mut self, count: usize) -> usize {
        for fetched in 0..count {
            if self.tokens.last().map_or(false, |t| t.is_eof()) {
                return fetched;
            }
            let mut token = self.source.next_token();
            token.token_index = Some(self.buffer_start_index() + self.tokens.len());
            self.tokens.push(token);
        }
        count
    }
}

impl ITokenStream for UnbufferedTokenStream {
    fn lt(&mut self, offset: isize) -> Option<Token> {
        if offset == 0 {
            panic!("LT(0) is not a valid lookahead");
        }
        if offset == -1 {
            return self.last_token.clone();
        }
        if offset < 0 {
            let back = (-offset) as usize;
            if back > self.pointer {
                // Slid out of the window; only LT(-1) survives a window reset.
                return None;
            }
            return Some(self.tokens[self.pointer - back].clone());
        }
        self.sync(offset as usize);
        let index = self.pointer + offset as usize - 1;
        if index >= self.tokens.len() {
            // Asking beyond EOF keeps answering the EOF token.
            return self.tokens.last().cloned();
        }
        Some(self.tokens[index].clone())
    }

    fn consume(&mut self) {
        if self.la(1) == crate::token::TOKEN_EOF {
            panic!("cannot consume EOF");
        }
        self.last_token = Some(self.tokens[self.pointer].clone());
        if self.pointer == self.tokens.len() - 1 && self.num_markers == 0 {
            // Nobody can rewind; drop the window.
            self.tokens.clear();
            self.pointer = 0;
            self.last_token_buffer_start = self.last_token.clone();
            self.current_token_index += 1;
            self.sync(1);
            return;
        }
        self.pointer += 1;
        self.current_token_index += 1;
        self.sync(1);
    }

    fn mark(&mut self) -> isize {
        if self.num_markers == 0 {
            self.last_token_buffer_start = self.last_token.clone();
        }
        self.num_markers += 1;
        -(self.num_markers as isize)
    }

    fn release(&mut self, marker: isize) {
        let expected = -(self.num_markers as isize);
        if marker != expected {
            panic!(
                "release() called with an invalid marker; expected {} got {}",
                expected, marker
            );
        }
        self.num_markers -= 1;
        if self.num_markers == 0 {
            if self.pointer > 0 {
                // Shrink the window back to the current token.
                self.tokens.drain(..self.pointer);
                self.pointer = 0;
            }
            self.last_token_buffer_start = self.last_token.clone();
        }
    }

    fn index(&self) -> usize {
        self.current_token_index
    }

    fn seek(&mut self, index: usize) {
        if index == self.current_token_index {
            return;
        }
        let mut index = index;
        if index > self.current_token_index {
            self.sync(index - self.current_token_index);
            // Seeking at or past EOF clamps to the last buffered token.
            index = std::cmp::min(index, self.buffer_start_index() + self.tokens.len() - 1);
        }
        let buffer_start = self.buffer_start_index();
        if index < buffer_start {
            panic!(
                "cannot seek to index {}; window starts at {}",
                index, buffer_start
            );
        }
        let offset = index - buffer_start;
        self.pointer = offset;
        self.current_token_index = index;
        self.last_token = if offset == 0 {
            self.last_token_buffer_start.clone()
        } else {
            Some(self.tokens[offset - 1].clone())
        };
    }

    fn size(&mut self) -> usize {
        panic!("unbuffered token stream cannot know its size");
    }

    fn get(&mut self, index: usize) -> Token {
        let buffer_start = self.buffer_start_index();
        if index < buffer_start || index >= buffer_start + self.tokens.len() {
            panic!(
                "token index {} is outside the buffered window {}..{}",
                index,
                buffer_start,
                buffer_start + self.tokens.len()
            );
        }
        self.tokens[index - buffer_start].clone()
    }

    fn source_name(&self) -> &str {
        self.source.source_name()
    }
}
