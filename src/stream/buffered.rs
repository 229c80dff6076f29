use super::{BufferedTokenStream, CommonTokenStream, ITokenSource, ITokenStream};
use crate::token::{Token, DEFAULT_CHANNEL};

impl BufferedTokenStream {
    pub fn new(source: Box<dyn ITokenSource>) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            pointer: 0,
            fetched_eof: false,
        }
    }

    /// Make sure the token at `index` has been pulled from the source.
    /// Returns false when the stream ended before reaching it.
    fn sync(&mut self, index: usize) -> bool {
        if index < self.tokens.len() {
            return true;
        }
        let need = index - self.tokens.len() + 1;
        self.fetch(need) >= need
    }

    fn fetch(&mut self, count: usize) -> usize {
        if self.fetched_eof {
            return 0;
        }
        for fetched in 0..count {
            let mut token = self.source.next_token();
            token.token_index = Some(self.tokens.len());
            let is_eof = token.is_eof();
            self.tokens.push(token);
            if is_eof {
                self.fetched_eof = true;
                return fetched + 1;
            }
        }
        count
    }

    /// Pull every remaining token from the source.
    pub fn fill(&mut self) {
        while !self.fetched_eof {
            self.fetch(64);
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    fn token_at(&mut self, index: usize) -> Token {
        self.sync(index);
        match self.tokens.get(index) {
            Some(t) => t.clone(),
            None => {
                debug_assert!(!self.tokens.is_empty(), "token source produced no EOF");
                self.tokens[self.tokens.len() - 1].clone()
            }
        }
    }
}

impl ITokenStream for BufferedTokenStream {
    fn lt(&mut self, offset: isize) -> Option<Token> {
        if offset == 0 {
            panic!("LT(0) is not a valid lookahead");
        }
        if offset < 0 {
            let back = (-offset) as usize;
            if back > self.pointer {
                return None;
            }
            return Some(self.tokens[self.pointer - back].clone());
        }
        let index = self.pointer + offset as usize - 1;
        Some(self.token_at(index))
    }

    fn consume(&mut self) {
        self.sync(self.pointer);
        let at_eof = self
            .tokens
            .get(self.pointer)
            .map_or(true, |t| t.is_eof());
        if at_eof {
            panic!("cannot consume EOF");
        }
        self.pointer += 1;
        self.sync(self.pointer);
    }

    fn mark(&mut self) -> isize {
        0
    }

    fn release(&mut self, _marker: isize) {}

    fn index(&self) -> usize {
        self.pointer
    }

    fn seek(&mut self, index: usize) {
        self.sync(index);
        self.pointer = std::cmp::min(index, self.tokens.len().saturating_sub(1));
    }

    fn size(&mut self) -> usize {
        self.fill();
        self.tokens.len()
    }

    fn get(&mut self, index: usize) -> Token {
        self.token_at(index)
    }

    fn source_name(&self) -> &str {
        self.source.source_name()
    }
}

impl CommonTokenStream {
    pub fn new(source: Box<dyn ITokenSource>) -> Self {
        Self::with_channel(source, DEFAULT_CHANNEL)
    }

    pub fn with_channel(source: Box<dyn ITokenSource>, channel: usize) -> Self {
        let mut stream = Self {
            inner: BufferedTokenStream::new(source),
            channel,
        };
        // Position on the first token of the visible channel.
        stream.inner.sync(0);
        stream.inner.pointer = stream.next_on_channel(0);
        stream
    }

    pub fn fill(&mut self) {
        self.inner.fill();
    }

    pub fn tokens(&self) -> &[Token] {
        self.inner.tokens()
    }

    /// Index of the first token at or after `index` on the visible channel;
    /// EOF stops the scan.
    fn next_on_channel(&mut self, mut index: usize) -> usize {
        self.inner.sync(index);
        loop {
            if index >= self.inner.tokens.len() {
                return self.inner.tokens.len().saturating_sub(1);
            }
            let token = &self.inner.tokens[index];
            if token.channel == self.channel || token.is_eof() {
                return index;
            }
            index += 1;
            self.inner.sync(index);
        }
    }

    fn previous_on_channel(&mut self, start: usize) -> Option<usize> {
        self.inner.sync(start);
        let mut index = std::cmp::min(start, self.inner.tokens.len().saturating_sub(1));
        loop {
            let token = &self.inner.tokens[index];
            if token.channel == self.channel || token.is_eof() {
                return Some(index);
            }
            if index == 0 {
                return None;
            }
            index -= 1;
        }
    }
}

impl ITokenStream for CommonTokenStream {
    fn lt(&mut self, offset: isize) -> Option<Token> {
        if offset == 0 {
            panic!("LT(0) is not a valid lookahead");
        }
        if offset < 0 {
            let mut index = self.inner.pointer;
            for _ in 0..(-offset) as usize {
                if index == 0 {
                    return None;
                }
                index = self.previous_on_channel(index - 1)?;
            }
            return Some(self.inner.tokens[index].clone());
        }
        let mut index = self.inner.pointer;
        self.inner.sync(index);
        index = self.next_on_channel(index);
        for _ in 1..offset as usize {
            self.inner.sync(index + 1);
            index = self.next_on_channel(index + 1);
        }
        Some(self.inner.token_at(index))
    }

    fn consume(&mut self) {
        self.inner.sync(self.inner.pointer);
        let at_eof = self
            .inner
            .tokens
            .get(self.inner.pointer)
            .map_or(true, |t| t.is_eof());
        if at_eof {
            panic!("cannot consume EOF");
        }
        self.inner.pointer = self.next_on_channel(self.inner.pointer + 1);
    }

    fn mark(&mut self) -> isize {
        0
    }

    fn release(&mut self, _marker: isize) {}

    fn index(&self) -> usize {
        self.inner.pointer
    }

    fn seek(&mut self, index: usize) {
        self.inner.sync(index);
        self.inner.pointer = self.next_on_channel(index);
    }

    fn size(&mut self) -> usize {
        self.inner.size()
    }

    fn get(&mut self, index: usize) -> Token {
        self.inner.get(index)
    }

    fn source_name(&self) -> &str {
        self.inner.source_name()
    }
}
