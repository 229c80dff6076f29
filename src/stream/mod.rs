//! Character and token streams feeding the recognizers.
//!
//! Streams are random access within their buffered region, markable with
//! nested last-in-first-out markers, and seekable. The character stream is
//! consumed by the lexer; token streams sit between a token source (usually
//! a lexer) and the parser. The buffered token stream knows its full size;
//! the unbuffered variant keeps a sliding window and rejects size queries.

mod buffered;
mod input;
mod unbuffered;

use std::sync::Arc;

use crate::token::Token;
use crate::util::Code;

/// Random access stream of integer symbols.
///
/// Every `mark()` must be balanced by a `release()` on all exit paths;
/// releasing markers out of order is an invariant violation.
pub trait IIntStream {
    /// Advance past the current symbol. Consuming beyond end of input is an
    /// invariant violation.
    fn consume(&mut self);

    /// Lookahead; `la(1)` is the current symbol, `la(-1)` the previous one.
    /// Returns [`TOKEN_EOF`](crate::token::TOKEN_EOF) past either end.
    fn la(&mut self, offset: isize) -> i32;

    fn mark(&mut self) -> isize;

    fn release(&mut self, marker: isize);

    /// Absolute offset of the current symbol.
    fn index(&self) -> usize;

    fn seek(&mut self, index: usize);

    fn size(&mut self) -> usize;

    fn source_name(&self) -> &str;
}

/// A stream of code points with text extraction.
pub trait ICharStream: IIntStream {
    /// The text between two code point offsets, both inclusive.
    fn get_text(&self, start: usize, stop: usize) -> String;
}

/// A producer of tokens, usually a lexer.
pub trait ITokenSource {
    fn next_token(&mut self) -> Token;

    /// Line of the upcoming token, 1 based.
    fn line(&self) -> usize;

    /// Column of the upcoming token, 0 based.
    fn column(&self) -> usize;

    fn source_name(&self) -> &str;
}

/// A stream of tokens with absolute indexing and token-level lookahead.
///
/// `lt(-1)` is the last consumed token. `get(i)` addresses tokens by their
/// absolute index; the unbuffered implementation only honours it inside the
/// current window.
pub trait ITokenStream {
    /// `lt(1)` is the upcoming token, `lt(-1)` the last consumed one. `None`
    /// is only possible for negative offsets reaching before the start.
    fn lt(&mut self, offset: isize) -> Option<Token>;

    fn la(&mut self, offset: isize) -> i32 {
        self.lt(offset)
            .map(|t| t.token_type)
            .unwrap_or(crate::token::TOKEN_INVALID_TYPE)
    }

    fn consume(&mut self);

    fn mark(&mut self) -> isize;

    fn release(&mut self, marker: isize);

    fn index(&self) -> usize;

    fn seek(&mut self, index: usize);

    fn size(&mut self) -> usize;

    fn get(&mut self, index: usize) -> Token;

    fn source_name(&self) -> &str;
}

/// An in-memory [`ICharStream`] over a [`Code`] wrapper.
pub struct InputStream {
    code: Code,
    name: Arc<str>,
    pointer: usize,
    mark_depth: usize,
}

/// A token stream which buffers the entire run of tokens from its source.
pub struct BufferedTokenStream {
    source: Box<dyn ITokenSource>,
    tokens: Vec<Token>,
    pointer: usize,
    fetched_eof: bool,
}

/// A [`BufferedTokenStream`] whose lookahead only sees one channel.
///
/// The full stream stays addressable through `get(i)`; `lt`/`la`/`consume`
/// skip tokens that were routed to other channels.
pub struct CommonTokenStream {
    inner: BufferedTokenStream,
    channel: usize,
}

/// A token stream holding only a sliding window of tokens.
///
/// The window grows while markers are outstanding and shrinks back once the
/// last marker is released. Absolute indices stay stable; tokens that have
/// slid out of the window are unreachable.
pub struct UnbufferedTokenStream {
    source: Box<dyn ITokenSource>,
    tokens: Vec<Token>,
    pointer: usize,
    num_markers: usize,
    last_token: Option<Token>,
    last_token_buffer_start: Option<Token>,
    current_token_index: usize,
}
