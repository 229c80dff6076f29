use crate::examples::branches::{self, EQ, ID, WS};
use crate::lexer::Lexer;
use crate::stream::{
    BufferedTokenStream, CommonTokenStream, ITokenStream, InputStream, UnbufferedTokenStream,
};
use crate::token::{HIDDEN_CHANNEL, TOKEN_EOF};

fn call_lexer(text: &str) -> Lexer {
    Lexer::new(branches::call_lexer(), Box::new(InputStream::new(text)))
}

#[test]
pub fn hidden_channel_is_invisible_to_lookahead() {
    let mut stream = CommonTokenStream::new(Box::new(call_lexer("x = y")));
    assert_eq!(stream.la(1), ID);
    assert_eq!(stream.la(2), EQ);
    assert_eq!(stream.la(3), ID);
    stream.consume();
    assert_eq!(stream.la(1), EQ);
    assert_eq!(stream.la(-1), ID);

    // The whitespace still exists at its absolute index.
    stream.fill();
    let hidden = stream.get(1);
    assert_eq!(hidden.token_type, WS);
    assert_eq!(hidden.channel, HIDDEN_CHANNEL);
}

#[test]
pub fn buffered_stream_sees_every_channel() {
    let mut stream = BufferedTokenStream::new(Box::new(call_lexer("x = y")));
    assert_eq!(stream.la(1), ID);
    assert_eq!(stream.la(2), WS);
    assert!(stream.lt(-1).is_none());
    assert_eq!(stream.size(), 6);
}

#[test]
pub fn seek_restores_lookahead() {
    let mut stream = CommonTokenStream::new(Box::new(call_lexer("x = y")));
    let before = stream.index();
    let first = stream.la(1);
    stream.consume();
    stream.consume();
    stream.seek(before);
    assert_eq!(stream.index(), before);
    assert_eq!(stream.la(1), first);
}

#[test]
pub fn unbuffered_window_slides_and_marks_hold_it_open() {
    let mut stream = UnbufferedTokenStream::new(Box::new(call_lexer("x = y")));
    assert_eq!(stream.la(1), ID);

    let marker = stream.mark();
    let start = stream.index();
    stream.consume();
    stream.consume();
    assert_eq!(stream.la(1), EQ);
    // All tokens since the mark are still addressable.
    assert_eq!(stream.get(start).token_type, ID);
    stream.seek(start);
    stream.release(marker);
    assert_eq!(stream.la(1), ID);
}

#[test]
pub fn unbuffered_seek_past_end_clamps_to_eof() {
    let mut stream = UnbufferedTokenStream::new(Box::new(call_lexer("x")));
    stream.seek(100);
    assert_eq!(stream.la(1), TOKEN_EOF);
}

#[test]
#[should_panic(expected = "cannot know its size")]
pub fn unbuffered_stream_rejects_size_queries() {
    let mut stream = UnbufferedTokenStream::new(Box::new(call_lexer("x")));
    stream.size();
}

#[test]
#[should_panic(expected = "cannot consume EOF")]
pub fn consuming_past_eof_is_fatal() {
    let mut stream = CommonTokenStream::new(Box::new(call_lexer("x")));
    stream.consume();
    stream.consume();
}
