use std::fmt::{Display, Formatter};
use std::rc::Rc;

use bit_set::BitSet;

use crate::atn::{ATNConfigSet, ATNStateKind, ATN};
use crate::context::ParserRuleContext;
use crate::interval::IntervalSet;
use crate::stream::ITokenStream;
use crate::token::{ITokenFactory, Token, Vocabulary, TOKEN_EOF, TOKEN_EPSILON};
use crate::util::Position;

/// A recoverable recognition failure.
///
/// These are reported to listeners and handed to the error strategy, which
/// may consume-and-retry, synthesize a token or rethrow. Internal invariant
/// violations are not represented here; they abort the parse.
#[derive(Debug, Clone)]
pub enum RecognitionError {
    /// No alternative of a decision matches the lookahead.
    NoViableAlt {
        decision: usize,
        start_token: Option<Token>,
        offending_token: Option<Token>,
    },
    /// The expected token set does not contain the upcoming token.
    InputMismatch {
        offending_token: Token,
        expected: IntervalSet,
        expected_display: String,
    },
    /// A semantic or precedence predicate required by the taken path was
    /// false.
    FailedPredicate {
        offending_token: Option<Token>,
        rule_index: usize,
        pred_index: usize,
        message: String,
    },
    /// No lexer rule matches the character at the error position.
    LexerNoViableAlt {
        start_index: usize,
        position: Position,
        text: String,
    },
}

impl RecognitionError {
    pub fn offending_token(&self) -> Option<&Token> {
        match self {
            RecognitionError::NoViableAlt {
                offending_token, ..
            }
            | RecognitionError::FailedPredicate {
                offending_token, ..
            } => offending_token.as_ref(),
            RecognitionError::InputMismatch {
                offending_token, ..
            } => Some(offending_token),
            RecognitionError::LexerNoViableAlt { .. } => None,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            RecognitionError::LexerNoViableAlt { position, .. } => *position,
            other => other
                .offending_token()
                .map(|t| Position::new(t.line, t.column + 1))
                .unwrap_or(Position::new(0, 1)),
        }
    }
}

impl Display for RecognitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionError::NoViableAlt {
                offending_token, ..
            } => {
                let text = offending_token
                    .as_ref()
                    .map(|t| if t.is_eof() { "<EOF>".to_string() } else { t.text.clone() })
                    .unwrap_or_default();
                write!(f, "no viable alternative at input '{}'", text)
            }
            RecognitionError::InputMismatch {
                offending_token,
                expected_display,
                ..
            } => {
                let text = if offending_token.is_eof() {
                    "<EOF>".to_string()
                } else {
                    offending_token.text.clone()
                };
                write!(f, "mismatched input '{}' expecting {}", text, expected_display)
            }
            RecognitionError::FailedPredicate { message, .. } => {
                write!(f, "{}", message)
            }
            RecognitionError::LexerNoViableAlt { text, .. } => {
                write!(f, "token recognition error at: '{}'", text)
            }
        }
    }
}

/// Receiver of recognition events.
///
/// The `report_*` hooks fire from the prediction engine: true ambiguities,
/// SLL conflicts which forced a full-context retry, and full-context
/// decisions that proved context sensitive.
pub trait IErrorListener {
    fn syntax_error(
        &self,
        line: usize,
        column: usize,
        message: &str,
        error: Option<&RecognitionError>,
    );

    fn report_ambiguity(
        &self,
        _decision: usize,
        _start_index: usize,
        _stop_index: usize,
        _exact: bool,
        _ambig_alts: &BitSet,
        _configs: &ATNConfigSet,
    ) {
    }

    fn report_attempting_full_context(
        &self,
        _decision: usize,
        _start_index: usize,
        _stop_index: usize,
        _conflicting_alts: &BitSet,
        _configs: &ATNConfigSet,
    ) {
    }

    fn report_context_sensitivity(
        &self,
        _decision: usize,
        _start_index: usize,
        _stop_index: usize,
        _prediction: usize,
        _configs: &ATNConfigSet,
    ) {
    }
}

/// Writes one line per syntax error to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleErrorListener;

impl IErrorListener for ConsoleErrorListener {
    fn syntax_error(
        &self,
        line: usize,
        column: usize,
        message: &str,
        _error: Option<&RecognitionError>,
    ) {
        eprintln!("line {}:{} {}", line, column, message);
    }
}

/// The listener list owned by a recognizer; starts with the console
/// listener installed.
pub struct ErrorListeners {
    listeners: Vec<Box<dyn IErrorListener>>,
}

impl Default for ErrorListeners {
    fn default() -> Self {
        Self {
            listeners: vec![Box::new(ConsoleErrorListener)],
        }
    }
}

impl ErrorListeners {
    pub fn none() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add(&mut self, listener: Box<dyn IErrorListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_all(&mut self) {
        self.listeners.clear();
    }

    pub fn syntax_error(
        &self,
        line: usize,
        column: usize,
        message: &str,
        error: Option<&RecognitionError>,
    ) {
        for listener in &self.listeners {
            listener.syntax_error(line, column, message, error);
        }
    }

    pub fn report_ambiguity(
        &self,
        decision: usize,
        start_index: usize,
        stop_index: usize,
        exact: bool,
        ambig_alts: &BitSet,
        configs: &ATNConfigSet,
    ) {
        for listener in &self.listeners {
            listener.report_ambiguity(decision, start_index, stop_index, exact, ambig_alts, configs);
        }
    }

    pub fn report_attempting_full_context(
        &self,
        decision: usize,
        start_index: usize,
        stop_index: usize,
        conflicting_alts: &BitSet,
        configs: &ATNConfigSet,
    ) {
        for listener in &self.listeners {
            listener.report_attempting_full_context(
                decision,
                start_index,
                stop_index,
                conflicting_alts,
                configs,
            );
        }
    }

    pub fn report_context_sensitivity(
        &self,
        decision: usize,
        start_index: usize,
        stop_index: usize,
        prediction: usize,
        configs: &ATNConfigSet,
    ) {
        for listener in &self.listeners {
            listener.report_context_sensitivity(
                decision,
                start_index,
                stop_index,
                prediction,
                configs,
            );
        }
    }
}

/// The split-borrow view of a parser the error strategy operates on.
pub struct RecoveryContext<'a> {
    pub input: &'a mut dyn ITokenStream,
    pub atn: &'a ATN,
    /// Current ATN state of the parser.
    pub state: usize,
    pub ctx: Option<&'a Rc<ParserRuleContext>>,
    pub listeners: &'a ErrorListeners,
    pub vocabulary: &'a Vocabulary,
    pub factory: &'a dyn ITokenFactory,
}

/// How a parser responds to recognition failures.
///
/// `sync` runs at every decision and rule entry; it may return an error to
/// abort a long parse cooperatively, which is the runtime's cancellation
/// hook.
pub trait IErrorStrategy {
    fn reset(&mut self);

    fn in_error_recovery_mode(&self) -> bool;

    /// A token matched; leaves error recovery mode.
    fn report_match(&mut self);

    fn report_error(&mut self, rc: &mut RecoveryContext, error: &RecognitionError);

    /// Re-synchronize after `error` was reported, typically by consuming
    /// until the follow set of the rule invocation chain.
    fn recover(&mut self, rc: &mut RecoveryContext, error: &RecognitionError)
        -> Result<(), RecognitionError>;

    /// Recover from a failed `match` in place: delete or synthesize one
    /// token, or rethrow.
    fn recover_inline(&mut self, rc: &mut RecoveryContext) -> Result<Token, RecognitionError>;

    fn sync(&mut self, rc: &mut RecoveryContext) -> Result<(), RecognitionError>;
}

/// Single-token deletion and insertion with follow-set resynchronization.
#[derive(Default)]
pub struct DefaultErrorStrategy {
    error_recovery_mode: bool,
    last_error_index: Option<usize>,
    last_error_states: IntervalSet,
}

impl DefaultErrorStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin_error_condition(&mut self) {
        self.error_recovery_mode = true;
    }

    fn end_error_condition(&mut self) {
        self.error_recovery_mode = false;
        self.last_error_index = None;
        self.last_error_states = IntervalSet::new();
    }

    fn expected_tokens(rc: &RecoveryContext) -> IntervalSet {
        rc.atn.get_expected_tokens(rc.state, rc.ctx)
    }

    /// Union of the follow sets along the rule invocation chain.
    fn error_recovery_set(rc: &RecoveryContext) -> IntervalSet {
        let mut recover_set = IntervalSet::new();
        let mut ctx = rc.ctx.cloned();
        while let Some(frame) = ctx {
            let invoking = match frame.invoking_state() {
                None => break,
                Some(s) => s,
            };
            if let Some(crate::atn::Transition::Rule { follow_state, .. }) =
                rc.atn.states[invoking].transitions.first()
            {
                recover_set.add_set(rc.atn.next_tokens(*follow_state));
            }
            ctx = frame.parent();
        }
        recover_set.subtract(&IntervalSet::of_one(TOKEN_EPSILON))
    }

    fn consume_until(rc: &mut RecoveryContext, set: &IntervalSet) {
        loop {
            let ttype = rc.input.la(1);
            if ttype == TOKEN_EOF || set.contains(ttype) {
                break;
            }
            rc.input.consume();
        }
    }

    fn report_unwanted_token(&mut self, rc: &mut RecoveryContext) {
        if self.error_recovery_mode {
            return;
        }
        self.begin_error_condition();
        if let Some(token) = rc.input.lt(1) {
            let expected = Self::expected_tokens(rc);
            let message = format!(
                "extraneous input '{}' expecting {}",
                if token.is_eof() { "<EOF>" } else { token.text.as_str() },
                expected.display_with_vocabulary(rc.vocabulary)
            );
            rc.listeners
                .syntax_error(token.line, token.column, &message, None);
        }
    }

    fn report_missing_token(&mut self, rc: &mut RecoveryContext) {
        if self.error_recovery_mode {
            return;
        }
        self.begin_error_condition();
        if let Some(token) = rc.input.lt(1) {
            let expected = Self::expected_tokens(rc);
            let message = format!(
                "missing {} at '{}'",
                expected.display_with_vocabulary(rc.vocabulary),
                if token.is_eof() { "<EOF>" } else { token.text.as_str() }
            );
            rc.listeners
                .syntax_error(token.line, token.column, &message, None);
        }
    }

    /// Try deleting the upcoming token so the one after it matches.
    fn single_token_deletion(&mut self, rc: &mut RecoveryContext) -> Option<Token> {
        let next_type = rc.input.la(2);
        let expecting = Self::expected_tokens(rc);
        if !expecting.contains(next_type) {
            return None;
        }
        self.report_unwanted_token(rc);
        rc.input.consume();
        let matched = rc.input.lt(1);
        self.report_match();
        matched
    }

    /// Whether synthesizing the missing token would let the parse continue.
    fn single_token_insertion(&mut self, rc: &mut RecoveryContext) -> bool {
        let current_type = rc.input.la(1);
        let current_state = &rc.atn.states[rc.state];
        let next = match current_state.transitions.first() {
            Some(t) => t.target(),
            None => return false,
        };
        let expecting_at_ll2 = rc.atn.next_tokens_in_context(next, rc.ctx);
        if expecting_at_ll2.contains(current_type) {
            self.report_missing_token(rc);
            return true;
        }
        false
    }

    fn missing_symbol(rc: &mut RecoveryContext) -> Token {
        let expected = Self::expected_tokens(rc);
        let expected_type = expected.min_element().unwrap_or(TOKEN_EOF);
        let name = if expected_type == TOKEN_EOF {
            "<missing EOF>".to_string()
        } else {
            format!("<missing {}>", rc.vocabulary.display_name(expected_type))
        };
        let mut token = rc.factory.create_detached(expected_type, name);
        if let Some(current) = rc.input.lt(1) {
            token.line = current.line;
            token.column = current.column;
            token.start = current.start;
            token.stop = current.start;
        }
        token
    }
}

impl IErrorStrategy for DefaultErrorStrategy {
    fn reset(&mut self) {
        self.end_error_condition();
    }

    fn in_error_recovery_mode(&self) -> bool {
        self.error_recovery_mode
    }

    fn report_match(&mut self) {
        self.end_error_condition();
    }

    fn report_error(&mut self, rc: &mut RecoveryContext, error: &RecognitionError) {
        if self.error_recovery_mode {
            return;
        }
        self.begin_error_condition();
        let position = error.position();
        let column = error
            .offending_token()
            .map(|t| t.column)
            .unwrap_or(position.column.saturating_sub(1));
        rc.listeners
            .syntax_error(position.line, column, &error.to_string(), Some(error));
    }

    fn recover(
        &mut self,
        rc: &mut RecoveryContext,
        _error: &RecognitionError,
    ) -> Result<(), RecognitionError> {
        if self.last_error_index == Some(rc.input.index())
            && self.last_error_states.contains(rc.state as i32)
        {
            // Second failure at the same place; eat one token so the parse
            // cannot loop forever.
            if rc.input.la(1) != TOKEN_EOF {
                rc.input.consume();
            }
        }
        self.last_error_index = Some(rc.input.index());
        self.last_error_states.add_one(rc.state as i32);
        let follow_set = Self::error_recovery_set(rc);
        Self::consume_until(rc, &follow_set);
        Ok(())
    }

    fn recover_inline(&mut self, rc: &mut RecoveryContext) -> Result<Token, RecognitionError> {
        if let Some(matched) = self.single_token_deletion(rc) {
            rc.input.consume();
            return Ok(matched);
        }
        if self.single_token_insertion(rc) {
            return Ok(Self::missing_symbol(rc));
        }
        let expected = Self::expected_tokens(rc);
        let expected_display = expected.display_with_vocabulary(rc.vocabulary);
        let offending = rc.input.lt(1).unwrap_or_else(|| {
            rc.factory.create_detached(TOKEN_EOF, String::new())
        });
        Err(RecognitionError::InputMismatch {
            offending_token: offending,
            expected,
            expected_display,
        })
    }

    fn sync(&mut self, rc: &mut RecoveryContext) -> Result<(), RecognitionError> {
        if self.error_recovery_mode {
            return Ok(());
        }
        let kind = rc.atn.states[rc.state].kind;
        let la = rc.input.la(1);
        let next_tokens = rc.atn.next_tokens(rc.state);
        if next_tokens.contains(la) || next_tokens.contains(TOKEN_EPSILON) {
            return Ok(());
        }
        match kind {
            ATNStateKind::BlockStart
            | ATNStateKind::StarBlockStart
            | ATNStateKind::PlusBlockStart
            | ATNStateKind::PlusLoopBack
            | ATNStateKind::StarLoopBack => {
                if self.single_token_deletion(rc).is_some() {
                    return Ok(());
                }
                let expected = Self::expected_tokens(rc);
                let expected_display = expected.display_with_vocabulary(rc.vocabulary);
                let offending = rc
                    .input
                    .lt(1)
                    .unwrap_or_else(|| rc.factory.create_detached(TOKEN_EOF, String::new()));
                Err(RecognitionError::InputMismatch {
                    offending_token: offending,
                    expected,
                    expected_display,
                })
            }
            _ => Ok(()),
        }
    }
}
