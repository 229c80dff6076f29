mod deserializer_test;
mod expr_test;
mod lexer_test;
mod parser_test;
mod stream_test;

use std::cell::RefCell;
use std::rc::Rc;

use bit_set::BitSet;

use crate::atn::ATNConfigSet;
use crate::error::IErrorListener;
use crate::stream::{CommonTokenStream, ITokenSource};
use crate::token::{Token, DEFAULT_CHANNEL, TOKEN_EOF};

/// A token source over a fixed token-type sequence, for parser grammars
/// whose terminals never came from a real lexer.
pub(super) struct ListTokenSource {
    tokens: Vec<Token>,
    pointer: usize,
}

impl ListTokenSource {
    pub(super) fn new(token_types: &[(i32, &str)]) -> Self {
        let tokens = token_types
            .iter()
            .enumerate()
            .map(|(index, (token_type, text))| Token {
                token_type: *token_type,
                channel: DEFAULT_CHANNEL,
                start: index,
                stop: index,
                token_index: None,
                line: 1,
                column: index,
                text: text.to_string(),
                source_name: None,
            })
            .collect();
        Self { tokens, pointer: 0 }
    }
}

impl ITokenSource for ListTokenSource {
    fn next_token(&mut self) -> Token {
        match self.tokens.get(self.pointer) {
            Some(token) => {
                self.pointer += 1;
                token.clone()
            }
            None => Token {
                token_type: TOKEN_EOF,
                channel: DEFAULT_CHANNEL,
                start: self.tokens.len(),
                stop: self.tokens.len(),
                token_index: None,
                line: 1,
                column: self.tokens.len(),
                text: String::new(),
                source_name: None,
            },
        }
    }

    fn line(&self) -> usize {
        1
    }

    fn column(&self) -> usize {
        self.pointer
    }

    fn source_name(&self) -> &str {
        "<list>"
    }
}

pub(super) fn token_stream(token_types: &[(i32, &str)]) -> CommonTokenStream {
    CommonTokenStream::new(Box::new(ListTokenSource::new(token_types)))
}

/// Captures everything the engine reports so tests can assert on it.
#[derive(Default)]
pub(super) struct Recorder {
    pub errors: RefCell<Vec<String>>,
    pub ambiguities: RefCell<Vec<BitSet>>,
    pub full_context_retries: RefCell<usize>,
    pub context_sensitivities: RefCell<usize>,
}

pub(super) struct RecordingListener(pub Rc<Recorder>);

impl IErrorListener for RecordingListener {
    fn syntax_error(
        &self,
        line: usize,
        column: usize,
        message: &str,
        _error: Option<&crate::error::RecognitionError>,
    ) {
        self.0
            .errors
            .borrow_mut()
            .push(format!("line {}:{} {}", line, column, message));
    }

    fn report_ambiguity(
        &self,
        _decision: usize,
        _start_index: usize,
        _stop_index: usize,
        _exact: bool,
        ambig_alts: &BitSet,
        _configs: &ATNConfigSet,
    ) {
        self.0.ambiguities.borrow_mut().push(ambig_alts.clone());
    }

    fn report_attempting_full_context(
        &self,
        _decision: usize,
        _start_index: usize,
        _stop_index: usize,
        _conflicting_alts: &BitSet,
        _configs: &ATNConfigSet,
    ) {
        *self.0.full_context_retries.borrow_mut() += 1;
    }

    fn report_context_sensitivity(
        &self,
        _decision: usize,
        _start_index: usize,
        _stop_index: usize,
        _prediction: usize,
        _configs: &ATNConfigSet,
    ) {
        *self.0.context_sensitivities.borrow_mut() += 1;
    }
}
