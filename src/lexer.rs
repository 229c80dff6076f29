use std::rc::Rc;
use std::sync::Arc;

use crate::atn::{
    GrammarType, IPredicateEvaluator, LexerATNSimulator, LexerAction, LexerActionExecutor,
    PredictionContextCache, ATN, LEXER_MORE, LEXER_SKIP,
};
use crate::context::ParserRuleContext;
use crate::dfa::DFA;
use crate::error::{ErrorListeners, IErrorListener, RecognitionError};
use crate::stream::{ICharStream, ITokenSource};
use crate::token::{
    CommonTokenFactory, ITokenFactory, Token, DEFAULT_CHANNEL, TOKEN_EOF, TOKEN_INVALID_TYPE,
};

/// The default lexer mode every lexer starts in.
pub const DEFAULT_MODE: usize = 0;

/// Host hooks for generated lexers: semantic predicates plus embedded
/// custom actions. The defaults accept every predicate and ignore custom
/// actions, which is the interpreter behavior for a grammar without code.
pub trait ILexerHooks: IPredicateEvaluator {
    fn custom_action(&mut self, _rule_index: usize, _action_index: usize) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLexerHooks;

impl IPredicateEvaluator for DefaultLexerHooks {
    fn sempred(
        &mut self,
        _ctx: Option<&Rc<ParserRuleContext>>,
        _rule_index: usize,
        _pred_index: usize,
    ) -> bool {
        true
    }

    fn precpred(&mut self, _ctx: Option<&Rc<ParserRuleContext>>, _precedence: i32) -> bool {
        true
    }
}

impl ILexerHooks for DefaultLexerHooks {}

/// The tokenizing façade: drives the [`LexerATNSimulator`] over a character
/// stream and assembles tokens through the factory.
///
/// `next_token` wraps every match in a mark/release pair, treats the SKIP
/// and MORE sentinels specially (SKIP restarts without emitting, MORE keeps
/// accumulating into the current token), recovers from unmatchable input by
/// dropping one character, and pins a `hit_eof` flag once end of input is
/// seen so every later call emits a stable EOF token. Mode changes go
/// through an explicit stack; popping the empty stack is fatal.
pub struct Lexer {
    interp: LexerATNSimulator,
    input: Box<dyn ICharStream>,
    source_name: Arc<str>,
    factory: Box<dyn ITokenFactory>,
    hooks: Box<dyn ILexerHooks>,
    listeners: ErrorListeners,
    pub mode: usize,
    mode_stack: Vec<usize>,
    token_start_index: usize,
    token_start_line: usize,
    token_start_column: usize,
    hit_eof: bool,
    token_type: i32,
    channel: usize,
    text_override: Option<String>,
}

impl Lexer {
    /// A lexer with its own fresh DFA cache.
    pub fn new(atn: Arc<ATN>, input: Box<dyn ICharStream>) -> Self {
        let decision_to_dfa: Vec<DFA> = atn
            .mode_to_start_state
            .iter()
            .enumerate()
            .map(|(mode, &start)| DFA::new(mode, start, false))
            .collect();
        Self::with_shared(
            atn,
            input,
            Arc::new(decision_to_dfa),
            Arc::new(PredictionContextCache::new()),
        )
    }

    /// A lexer sharing the grammar-wide caches with other lexer instances.
    pub fn with_shared(
        atn: Arc<ATN>,
        input: Box<dyn ICharStream>,
        decision_to_dfa: Arc<Vec<DFA>>,
        shared_context_cache: Arc<PredictionContextCache>,
    ) -> Self {
        debug_assert!(atn.grammar_type == GrammarType::Lexer);
        let source_name: Arc<str> = Arc::from(input.source_name());
        Self {
            interp: LexerATNSimulator::new(atn, decision_to_dfa, shared_context_cache),
            input,
            source_name,
            factory: Box::new(CommonTokenFactory),
            hooks: Box::new(DefaultLexerHooks),
            listeners: ErrorListeners::default(),
            mode: DEFAULT_MODE,
            mode_stack: Vec::new(),
            token_start_index: 0,
            token_start_line: 1,
            token_start_column: 0,
            hit_eof: false,
            token_type: TOKEN_INVALID_TYPE,
            channel: DEFAULT_CHANNEL,
            text_override: None,
        }
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn ILexerHooks>) {
        self.hooks = hooks;
    }

    pub fn set_factory(&mut self, factory: Box<dyn ITokenFactory>) {
        self.factory = factory;
    }

    pub fn add_error_listener(&mut self, listener: Box<dyn IErrorListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_error_listeners(&mut self) {
        self.listeners.remove_all();
    }

    pub fn interpreter(&self) -> &LexerATNSimulator {
        &self.interp
    }

    /// Recognize and return the next token, never failing: recognition
    /// errors are reported to the listeners and recovered from by dropping
    /// one character.
    pub fn next_token(&mut self) -> Token {
        let marker = self.input.mark();
        let token = self.next_token_inner();
        self.input.release(marker);
        token
    }

    fn next_token_inner(&mut self) -> Token {
        'outer: loop {
            if self.hit_eof {
                return self.emit_eof();
            }
            self.token_start_index = self.input.index();
            self.token_start_line = self.interp.line;
            self.token_start_column = self.interp.column;
            self.text_override = None;
            self.channel = DEFAULT_CHANNEL;
            self.token_type = TOKEN_INVALID_TYPE;
            loop {
                let hooks: &mut dyn IPredicateEvaluator = self.hooks.as_mut();
                let matched = self.interp.match_token(self.input.as_mut(), self.mode, hooks);
                let rule_type = match matched {
                    Err(error) => {
                        self.notify(&error);
                        self.recover();
                        LEXER_SKIP
                    }
                    Ok(outcome) => {
                        if let Some(executor) = outcome.executor.clone() {
                            self.execute_actions(&executor);
                        }
                        outcome.token_type
                    }
                };
                if self.input.la(1) == TOKEN_EOF {
                    self.hit_eof = true;
                }
                if self.token_type == TOKEN_INVALID_TYPE {
                    self.token_type = rule_type;
                }
                if self.token_type == LEXER_SKIP {
                    continue 'outer;
                }
                if self.token_type != LEXER_MORE {
                    break;
                }
            }
            return self.emit();
        }
    }

    /// Replay the recorded commands, seeking to the pinned offset before
    /// every position-dependent action.
    fn execute_actions(&mut self, executor: &Arc<LexerActionExecutor>) {
        let stop_index = self.input.index();
        let mut requires_seek = false;
        for action in executor.actions() {
            let mut action = action;
            if let LexerAction::Indexed { offset, action: inner } = action {
                let target = self.token_start_index + offset;
                self.input.seek(target);
                requires_seek = target != stop_index;
                action = inner.as_ref();
            } else if action.is_position_dependent() {
                self.input.seek(stop_index);
                requires_seek = false;
            }
            match action {
                LexerAction::Channel(channel) => self.channel = *channel,
                LexerAction::Custom {
                    rule_index,
                    action_index,
                } => self.hooks.custom_action(*rule_index, *action_index),
                LexerAction::Mode(mode) => self.mode = *mode,
                LexerAction::More => self.token_type = LEXER_MORE,
                LexerAction::PopMode => {
                    self.pop_mode();
                }
                LexerAction::PushMode(mode) => self.push_mode(*mode),
                LexerAction::Skip => self.token_type = LEXER_SKIP,
                LexerAction::Type(token_type) => self.token_type = *token_type,
                LexerAction::Indexed { .. } => {}
            }
        }
        if requires_seek {
            self.input.seek(stop_index);
        }
    }

    pub fn push_mode(&mut self, mode: usize) {
        self.mode_stack.push(self.mode);
        self.mode = mode;
    }

    pub fn pop_mode(&mut self) -> usize {
        match self.mode_stack.pop() {
            Some(mode) => {
                self.mode = mode;
                mode
            }
            None => panic!("cannot pop from an empty lexer mode stack"),
        }
    }

    pub fn set_type(&mut self, token_type: i32) {
        self.token_type = token_type;
    }

    pub fn set_channel(&mut self, channel: usize) {
        self.channel = channel;
    }

    pub fn set_text(&mut self, text: String) {
        self.text_override = Some(text);
    }

    pub fn skip(&mut self) {
        self.token_type = LEXER_SKIP;
    }

    pub fn more(&mut self) {
        self.token_type = LEXER_MORE;
    }

    fn recover(&mut self) {
        if self.input.la(1) != TOKEN_EOF {
            self.interp.consume(self.input.as_mut());
        }
    }

    fn notify(&mut self, error: &RecognitionError) {
        let position = error.position();
        self.listeners.syntax_error(
            position.line,
            position.column.saturating_sub(1),
            &error.to_string(),
            Some(error),
        );
    }

    fn emit(&mut self) -> Token {
        let stop = self.input.index().saturating_sub(1);
        let text = match self.text_override.take() {
            Some(text) => text,
            None => self.input.get_text(self.token_start_index, stop),
        };
        self.factory.create(
            self.token_type,
            self.channel,
            self.token_start_index,
            stop,
            self.token_start_line,
            self.token_start_column,
            text,
            Some(self.source_name.clone()),
        )
    }

    fn emit_eof(&mut self) -> Token {
        let index = self.input.index();
        let mut token = self.factory.create(
            TOKEN_EOF,
            DEFAULT_CHANNEL,
            index,
            index.saturating_sub(1),
            self.interp.line,
            self.interp.column,
            String::new(),
            Some(self.source_name.clone()),
        );
        token.stop = index.saturating_sub(1);
        token
    }
}

impl ITokenSource for Lexer {
    fn next_token(&mut self) -> Token {
        Lexer::next_token(self)
    }

    fn line(&self) -> usize {
        self.interp.line
    }

    fn column(&self) -> usize {
        self.interp.column
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}
