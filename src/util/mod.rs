mod code;
mod logger;
mod position;
use once_cell::unsync::OnceCell;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// The line and column information at a code point.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Owned input text together with its code points and lazily computed line breaks.
///
/// Recognition works on code points rather than bytes so that one lookahead
/// symbol is always one character; the original string is kept around for
/// text extraction.
pub struct Code {
    text: String,
    points: Vec<char>,
    line_breaks: OnceCell<Vec<usize>>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A enum structure to assign multiple level debugging to the simulators.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
