//! An adaptive LL(*) parser runtime in the ANTLR family.
//!
//! # Overview
//! A grammar is compiled offline into a serialized transition network and a
//! pair of generated recognizer skeletons. At run time the skeletons
//! delegate every piece of recognition work to this crate: the
//! [Lexer] pulls characters from an [InputStream] and asks the
//! [lexer simulator](atn::LexerATNSimulator) for the longest matching rule,
//! and the [Parser] pulls tokens and asks the
//! [parser simulator](atn::ParserATNSimulator) which alternative each
//! decision takes, falling back from strong-LL to full-context simulation
//! when lookahead alone cannot decide.
//!
//! Predictions are memoized in per-decision [DFA]s and call stack
//! summaries are shared as [prediction contexts](atn::PredictionContext),
//! so the cost of a distinct lookahead pattern is paid once per grammar
//! rather than once per input. The network, the DFAs and the context cache
//! are immutable or insert-only and may be shared by any number of
//! recognizer instances.
//!
//! A [ParserInterpreter] walks the network without any generated code,
//! which is also how the bundled [examples] drive the engine.
//!
//! # Example
//!
//! ```
//! use lang_atn::examples::keywords;
//! use lang_atn::{InputStream, Lexer, TOKEN_EOF};
//!
//! let mut lexer = Lexer::new(keywords::grammar(), Box::new(InputStream::new("if ab")));
//!
//! let kw = lexer.next_token();
//! assert_eq!(kw.token_type, keywords::KW);
//! assert_eq!(kw.text, "if");
//!
//! let id = lexer.next_token();
//! assert_eq!(id.token_type, keywords::ID);
//! assert_eq!(id.text, "ab");
//!
//! assert_eq!(lexer.next_token().token_type, TOKEN_EOF);
//! ```
//!
//! # License
//! [lang_atn](crate) is provided under the MIT license.

pub mod atn;
mod context;
mod dfa;
mod error;
pub mod examples;
mod interval;
mod lexer;
mod meta;
mod parser;
mod stream;
mod token;
mod util;

pub use context::{ParseTree, ParserRuleContext};
pub use dfa::{DFAEdge, DFAState, DFAStateInfo, PredPrediction, DFA, INVALID_ALT};
pub use error::{
    ConsoleErrorListener, DefaultErrorStrategy, ErrorListeners, IErrorListener, IErrorStrategy,
    RecognitionError, RecoveryContext,
};
pub use interval::{Interval, IntervalSet, MAX_CHAR_VALUE};
pub use lexer::{DefaultLexerHooks, ILexerHooks, Lexer, DEFAULT_MODE};
pub use meta::{RuntimeMetaData, VERSION};
pub use parser::{Parser, ParserInterpreter};
pub use stream::{
    BufferedTokenStream, CommonTokenStream, ICharStream, IIntStream, ITokenSource, ITokenStream,
    InputStream, UnbufferedTokenStream,
};
pub use token::{
    CommonTokenFactory, ITokenFactory, Token, Vocabulary, DEFAULT_CHANNEL, HIDDEN_CHANNEL,
    MIN_USER_TOKEN_TYPE, TOKEN_EOF, TOKEN_EPSILON, TOKEN_INVALID_TYPE,
};
pub use util::{Code, Log, Position};
