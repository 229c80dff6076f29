use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Token type of the synthesized end-of-file token.
pub const TOKEN_EOF: i32 = -1;
/// Token type reserved for invalid tokens; never produced by a grammar rule.
pub const TOKEN_INVALID_TYPE: i32 = 0;
/// Imaginary token type used by follow computations for non-consuming paths.
pub const TOKEN_EPSILON: i32 = -2;
/// Smallest token type the code generator assigns to a grammar symbol.
pub const MIN_USER_TOKEN_TYPE: i32 = 1;

/// Channel all tokens are emitted on unless a lexer command moves them.
pub const DEFAULT_CHANNEL: usize = 0;
/// Conventional channel for tokens hidden from the parser, e.g. whitespace.
pub const HIDDEN_CHANNEL: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One recognized symbol of the input.
///
/// `start`/`stop` are code point offsets into the character stream, both
/// inclusive; the text is copied out at creation so a token stays valid
/// after its stream is gone. `source_name` records provenance.
pub struct Token {
    pub token_type: i32,
    pub channel: usize,
    pub start: usize,
    pub stop: usize,
    pub token_index: Option<usize>,
    pub line: usize,
    pub column: usize,
    pub text: String,
    pub source_name: Option<Arc<str>>,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        self.token_type == TOKEN_EOF
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let index = self.token_index.map(|i| i as isize).unwrap_or(-1);
        let text = if self.is_eof() {
            "<EOF>".to_string()
        } else {
            self.text.replace('\n', "\\n").replace('\r', "\\r").replace('\t', "\\t")
        };
        write!(
            f,
            "[@{},{}:{}='{}',<{}>,{}:{}]",
            index, self.start, self.stop, text, self.token_type, self.line, self.column
        )
    }
}

/// An interface to construct tokens on behalf of a lexer or an error strategy.
pub trait ITokenFactory {
    /// Create a token spanning `[start, stop]` of the input; `text` is the
    /// already extracted slice for that range.
    fn create(
        &self,
        token_type: i32,
        channel: usize,
        start: usize,
        stop: usize,
        line: usize,
        column: usize,
        text: String,
        source_name: Option<Arc<str>>,
    ) -> Token;

    /// Create a detached token with explicit text, e.g. an inserted error token.
    fn create_detached(&self, token_type: i32, text: String) -> Token;
}

/// The default factory; token text is always copied out of the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonTokenFactory;

impl ITokenFactory for CommonTokenFactory {
    fn create(
        &self,
        token_type: i32,
        channel: usize,
        start: usize,
        stop: usize,
        line: usize,
        column: usize,
        text: String,
        source_name: Option<Arc<str>>,
    ) -> Token {
        let text = if token_type == TOKEN_EOF {
            String::new()
        } else {
            text
        };
        Token {
            token_type,
            channel,
            start,
            stop,
            token_index: None,
            line,
            column,
            text,
            source_name,
        }
    }

    fn create_detached(&self, token_type: i32, text: String) -> Token {
        Token {
            token_type,
            channel: DEFAULT_CHANNEL,
            start: 0,
            stop: 0,
            token_index: None,
            line: 0,
            column: 0,
            text,
            source_name: None,
        }
    }
}

/// Display names for the token types of one grammar.
///
/// A literal name is the quoted form from the grammar (`'='`); a symbolic
/// name is the declared identifier (`ID`). Either may be absent for a type.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    literal_names: Vec<Option<String>>,
    symbolic_names: Vec<Option<String>>,
}

impl Vocabulary {
    pub fn new(literal_names: Vec<Option<String>>, symbolic_names: Vec<Option<String>>) -> Self {
        Self {
            literal_names,
            symbolic_names,
        }
    }

    pub fn from_symbolic(names: &[&str]) -> Self {
        Self {
            literal_names: Vec::new(),
            symbolic_names: names.iter().map(|n| Some(n.to_string())).collect(),
        }
    }

    pub fn literal_name(&self, token_type: i32) -> Option<&str> {
        if token_type < 0 {
            return None;
        }
        self.literal_names
            .get(token_type as usize)
            .and_then(|n| n.as_deref())
    }

    pub fn symbolic_name(&self, token_type: i32) -> Option<&str> {
        if token_type == TOKEN_EOF {
            return Some("EOF");
        }
        if token_type < 0 {
            return None;
        }
        self.symbolic_names
            .get(token_type as usize)
            .and_then(|n| n.as_deref())
    }

    pub fn display_name(&self, token_type: i32) -> String {
        if let Some(name) = self.literal_name(token_type) {
            return name.to_string();
        }
        if let Some(name) = self.symbolic_name(token_type) {
            return name.to_string();
        }
        token_type.to_string()
    }
}
