use std::rc::Rc;
use std::sync::Arc;

use crate::atn::{
    ATNStateKind, DefaultPredicateEvaluator, GrammarType, IPredicateEvaluator,
    ParserATNSimulator, PredictionContextCache, PredictionEnv, PredictionMode, Transition, ATN,
};
use crate::context::{ParseTree, ParserRuleContext};
use crate::dfa::DFA;
use crate::error::{
    DefaultErrorStrategy, ErrorListeners, IErrorListener, IErrorStrategy, RecognitionError,
    RecoveryContext,
};
use crate::stream::ITokenStream;
use crate::token::{
    CommonTokenFactory, ITokenFactory, Token, Vocabulary, MIN_USER_TOKEN_TYPE, TOKEN_EOF,
};

/// The parsing façade: owns the token stream, the rule context chain, the
/// precedence stack and the error machinery, and delegates every decision
/// to the [`ParserATNSimulator`].
///
/// Generated parsers call the rule entry/exit surface below while walking
/// their alternatives; [`ParserInterpreter`] drives the same surface
/// directly from the transition network with no generated code.
pub struct Parser {
    atn: Arc<ATN>,
    interp: ParserATNSimulator,
    input: Box<dyn ITokenStream>,
    ctx: Option<Rc<ParserRuleContext>>,
    state: usize,
    precedence_stack: Vec<i32>,
    listeners: ErrorListeners,
    err_strategy: Box<dyn IErrorStrategy>,
    evaluator: Box<dyn IPredicateEvaluator>,
    factory: Box<dyn ITokenFactory>,
    vocabulary: Vocabulary,
    rule_names: Vec<String>,
    syntax_errors: usize,
}

impl Parser {
    /// A parser with its own fresh DFA cache.
    pub fn new(
        atn: Arc<ATN>,
        input: Box<dyn ITokenStream>,
        rule_names: Vec<String>,
        vocabulary: Vocabulary,
    ) -> Self {
        let decision_to_dfa: Vec<DFA> = atn
            .decision_to_state
            .iter()
            .enumerate()
            .map(|(decision, &state)| {
                DFA::new(decision, state, atn.states[state].is_precedence_decision)
            })
            .collect();
        Self::with_shared(
            atn,
            input,
            rule_names,
            vocabulary,
            Arc::new(decision_to_dfa),
            Arc::new(PredictionContextCache::new()),
        )
    }

    /// A parser sharing the grammar-wide caches with other parser
    /// instances; prediction work done by any of them benefits all.
    pub fn with_shared(
        atn: Arc<ATN>,
        input: Box<dyn ITokenStream>,
        rule_names: Vec<String>,
        vocabulary: Vocabulary,
        decision_to_dfa: Arc<Vec<DFA>>,
        shared_context_cache: Arc<PredictionContextCache>,
    ) -> Self {
        debug_assert!(atn.grammar_type == GrammarType::Parser);
        Self {
            interp: ParserATNSimulator::new(atn.clone(), decision_to_dfa, shared_context_cache),
            atn,
            input,
            ctx: None,
            state: 0,
            precedence_stack: Vec::new(),
            listeners: ErrorListeners::default(),
            err_strategy: Box::new(DefaultErrorStrategy::new()),
            evaluator: Box::new(DefaultPredicateEvaluator::default()),
            factory: Box::new(CommonTokenFactory),
            vocabulary,
            rule_names,
            syntax_errors: 0,
        }
    }

    pub fn atn(&self) -> &Arc<ATN> {
        &self.atn
    }

    pub fn interpreter(&self) -> &ParserATNSimulator {
        &self.interp
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rule_names.iter().map(|n| n.as_str()).collect()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn context(&self) -> Option<Rc<ParserRuleContext>> {
        self.ctx.clone()
    }

    pub fn state(&self) -> usize {
        self.state
    }

    pub fn set_state(&mut self, state: usize) {
        self.state = state;
    }

    pub fn syntax_error_count(&self) -> usize {
        self.syntax_errors
    }

    pub fn set_prediction_mode(&mut self, mode: PredictionMode) {
        self.interp.prediction_mode = mode;
    }

    pub fn prediction_mode(&self) -> PredictionMode {
        self.interp.prediction_mode
    }

    pub fn set_error_strategy(&mut self, strategy: Box<dyn IErrorStrategy>) {
        self.err_strategy = strategy;
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn IPredicateEvaluator>) {
        self.evaluator = evaluator;
    }

    pub fn add_error_listener(&mut self, listener: Box<dyn IErrorListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_error_listeners(&mut self) {
        self.listeners.remove_all();
    }

    pub fn input_mut(&mut self) -> &mut dyn ITokenStream {
        self.input.as_mut()
    }

    /// Current precedence; the empty stack reads as unrestricted.
    pub fn precedence(&self) -> i32 {
        self.precedence_stack.last().copied().unwrap_or(-1)
    }

    /// Ask the prediction engine which alternative the decision takes from
    /// the current input position.
    pub fn predict(&mut self, decision: usize) -> Result<usize, RecognitionError> {
        let precedence = self.precedence();
        self.evaluator.update_precedence(precedence);
        let mut env = PredictionEnv {
            input: self.input.as_mut(),
            evaluator: self.evaluator.as_mut(),
            listeners: &self.listeners,
            outer_context: self.ctx.clone(),
        };
        self.interp.adaptive_predict(&mut env, decision, precedence)
    }

    /// The cooperative cancellation and resynchronization hook, called at
    /// every decision and rule entry.
    pub fn sync(&mut self) -> Result<(), RecognitionError> {
        let mut rc = RecoveryContext {
            input: self.input.as_mut(),
            atn: &self.atn,
            state: self.state,
            ctx: self.ctx.as_ref(),
            listeners: &self.listeners,
            vocabulary: &self.vocabulary,
            factory: self.factory.as_ref(),
        };
        self.err_strategy.sync(&mut rc)
    }

    pub fn report_error(&mut self, error: &RecognitionError) {
        self.syntax_errors += 1;
        let mut rc = RecoveryContext {
            input: self.input.as_mut(),
            atn: &self.atn,
            state: self.state,
            ctx: self.ctx.as_ref(),
            listeners: &self.listeners,
            vocabulary: &self.vocabulary,
            factory: self.factory.as_ref(),
        };
        self.err_strategy.report_error(&mut rc, error);
    }

    pub fn recover(&mut self, error: &RecognitionError) -> Result<(), RecognitionError> {
        let mut rc = RecoveryContext {
            input: self.input.as_mut(),
            atn: &self.atn,
            state: self.state,
            ctx: self.ctx.as_ref(),
            listeners: &self.listeners,
            vocabulary: &self.vocabulary,
            factory: self.factory.as_ref(),
        };
        self.err_strategy.recover(&mut rc, error)
    }

    /// Match the upcoming token against `token_type`, consuming it into the
    /// tree, or let the error strategy repair the mismatch.
    pub fn match_token(&mut self, token_type: i32) -> Result<Token, RecognitionError> {
        let current = self.input.lt(1);
        if current.as_ref().map(|t| t.token_type) == Some(token_type) {
            self.err_strategy.report_match();
            return Ok(self.consume());
        }
        let recovered = {
            let mut rc = RecoveryContext {
                input: self.input.as_mut(),
                atn: &self.atn,
                state: self.state,
                ctx: self.ctx.as_ref(),
                listeners: &self.listeners,
                vocabulary: &self.vocabulary,
                factory: self.factory.as_ref(),
            };
            self.err_strategy.recover_inline(&mut rc)
        };
        let token = recovered?;
        if token.token_index.is_none() {
            // A synthesized token was never consumed; attach it as an error
            // leaf so the tree still covers the input.
            if let Some(ctx) = &self.ctx {
                ctx.add_child(ParseTree::Error(token.clone()));
            }
        }
        Ok(token)
    }

    /// Match any single token, used for wildcard transitions.
    pub fn match_wildcard(&mut self) -> Token {
        self.err_strategy.report_match();
        self.consume()
    }

    /// Consume the upcoming token into the current context; error-recovery
    /// consumption produces error leaves instead of terminals.
    pub fn consume(&mut self) -> Token {
        let token = self
            .input
            .lt(1)
            .unwrap_or_else(|| self.factory.create_detached(TOKEN_EOF, String::new()));
        if !token.is_eof() {
            self.input.consume();
        }
        if let Some(ctx) = &self.ctx {
            if self.err_strategy.in_error_recovery_mode() {
                ctx.add_child(ParseTree::Error(token.clone()));
            } else {
                ctx.add_child(ParseTree::Terminal(token.clone()));
            }
        }
        token
    }

    pub fn enter_rule(&mut self, ctx: Rc<ParserRuleContext>, state: usize) {
        self.state = state;
        ctx.set_start(self.input.lt(1));
        if let Some(parent) = ctx.parent() {
            parent.add_child(ParseTree::Rule(ctx.clone()));
        }
        self.ctx = Some(ctx);
    }

    pub fn exit_rule(&mut self) {
        if let Some(ctx) = &self.ctx {
            ctx.set_stop(self.input.lt(-1));
            let parent = ctx.parent();
            self.state = ctx.invoking_state().unwrap_or(0);
            self.ctx = parent;
        }
    }

    pub fn enter_recursion_rule(
        &mut self,
        ctx: Rc<ParserRuleContext>,
        state: usize,
        precedence: i32,
    ) {
        self.state = state;
        self.precedence_stack.push(precedence);
        self.evaluator.update_precedence(precedence);
        ctx.set_start(self.input.lt(1));
        self.ctx = Some(ctx);
    }

    /// Wrap the current left-recursive context into a fresh one for the
    /// next loop iteration; the previous iteration becomes its first child.
    pub fn push_new_recursion_context(&mut self, ctx: Rc<ParserRuleContext>, state: usize) {
        if let Some(previous) = self.ctx.take() {
            previous.set_parent(Some(&ctx));
            previous.set_invoking_state(Some(state));
            previous.set_stop(self.input.lt(-1));
            ctx.set_start(previous.start());
            ctx.add_child(ParseTree::Rule(previous));
        }
        self.ctx = Some(ctx);
    }

    /// Unwind the recursion wrappers back to `parent_ctx` when a
    /// left-recursive rule finishes.
    pub fn unroll_recursion_contexts(&mut self, parent_ctx: Option<&Rc<ParserRuleContext>>) {
        self.precedence_stack.pop();
        self.evaluator.update_precedence(self.precedence());
        let ret_ctx = match self.ctx.take() {
            None => return,
            Some(ctx) => ctx,
        };
        ret_ctx.set_stop(self.input.lt(-1));
        ret_ctx.set_parent(parent_ctx);
        if let Some(parent) = parent_ctx {
            parent.add_child(ParseTree::Rule(ret_ctx));
            self.ctx = Some(parent.clone());
        } else {
            self.ctx = None;
        }
    }

    pub fn get_expected_tokens(&self) -> crate::interval::IntervalSet {
        self.atn.get_expected_tokens(self.state, self.ctx.as_ref())
    }
}

/// Walks the transition network directly, using the same simulator and DFA
/// cache a generated parser would, so any grammar can be parsed from its
/// serialized form alone.
///
/// A single decision can be overridden: when `override_decision` fires at
/// `override_decision_input_index`, the interpreter takes
/// `override_decision_alt` instead of predicting. Tools resolving
/// ambiguities externally re-parse with the override to force the other
/// interpretation.
pub struct ParserInterpreter {
    parser: Parser,
    parent_context_stack: Vec<(Option<Rc<ParserRuleContext>>, Option<usize>)>,
    pub override_decision: Option<usize>,
    pub override_decision_input_index: usize,
    pub override_decision_alt: usize,
    override_decision_reached: bool,
}

impl ParserInterpreter {
    pub fn new(parser: Parser) -> Self {
        Self {
            parser,
            parent_context_stack: Vec::new(),
            override_decision: None,
            override_decision_input_index: 0,
            override_decision_alt: 0,
            override_decision_reached: false,
        }
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut Parser {
        &mut self.parser
    }

    /// Force `alt` at `decision` when prediction would otherwise run at
    /// input position `input_index`.
    pub fn add_decision_override(&mut self, decision: usize, input_index: usize, alt: usize) {
        self.override_decision = Some(decision);
        self.override_decision_input_index = input_index;
        self.override_decision_alt = alt;
        self.override_decision_reached = false;
    }

    /// Parse from `start_rule` to its completion and return the tree.
    pub fn parse(&mut self, start_rule: usize) -> Result<ParseTree, RecognitionError> {
        let start_state = self.parser.atn.rule_to_start_state[start_rule];
        let left_recursive = self.parser.atn.states[start_state].is_left_recursive;
        let root = ParserRuleContext::new(None, None, start_rule);
        self.parent_context_stack.clear();

        if left_recursive {
            self.parent_context_stack
                .push((self.parser.ctx.clone(), root.invoking_state()));
            self.parser.enter_recursion_rule(root.clone(), start_state, 0);
        } else {
            self.parser.enter_rule(root.clone(), start_state);
        }

        loop {
            let p = self.parser.state;
            if self.parser.atn.states[p].is_rule_stop() {
                let at_root = self
                    .parser
                    .ctx
                    .as_ref()
                    .map_or(true, |ctx| ctx.is_empty());
                if at_root {
                    if left_recursive {
                        let result = match self.parser.ctx.clone() {
                            Some(ctx) => ctx,
                            None => root.clone(),
                        };
                        let (parent, _) = self
                            .parent_context_stack
                            .pop()
                            .unwrap_or((None, None));
                        self.parser.unroll_recursion_contexts(parent.as_ref());
                        return Ok(ParseTree::Rule(result));
                    }
                    self.parser.exit_rule();
                    return Ok(ParseTree::Rule(root));
                }
                self.visit_rule_stop_state(p);
                continue;
            }
            if let Err(error) = self.visit_state(p) {
                let rule = self.parser.atn.states[p].rule_index;
                self.parser
                    .set_state(self.parser.atn.rule_to_stop_state[rule]);
                self.parser.report_error(&error);
                self.parser.recover(&error)?;
            }
        }
    }

    fn visit_state(&mut self, p: usize) -> Result<(), RecognitionError> {
        let mut predicted_alt = 1;
        if self.parser.atn.states[p].is_decision()
            && self.parser.atn.states[p].transitions.len() > 1
        {
            predicted_alt = self.visit_decision_state(p)?;
        }

        let transition = self.parser.atn.states[p].transitions[predicted_alt - 1].clone();
        match &transition {
            Transition::Epsilon { target, .. } => {
                let state = &self.parser.atn.states[p];
                if state.kind == ATNStateKind::StarLoopEntry
                    && state.is_precedence_decision
                    && self.parser.atn.states[*target].kind != ATNStateKind::LoopEnd
                {
                    // Another loop iteration of a left-recursive rule: wrap
                    // what has been parsed so far into a new context.
                    let (stack_parent, stack_state) = self
                        .parent_context_stack
                        .last()
                        .cloned()
                        .unwrap_or((None, None));
                    let rule_index = self
                        .parser
                        .ctx
                        .as_ref()
                        .map(|c| c.rule_index())
                        .unwrap_or(state.rule_index);
                    let localctx =
                        ParserRuleContext::new(stack_parent.as_ref(), stack_state, rule_index);
                    let rule_start = self.parser.atn.rule_to_start_state[state.rule_index];
                    self.parser.push_new_recursion_context(localctx, rule_start);
                }
            }
            Transition::Atom { label, .. } => {
                self.parser.match_token(*label)?;
            }
            Transition::Range { .. } | Transition::Set { .. } | Transition::NotSet { .. } => {
                if !transition.matches(
                    self.parser.input.la(1),
                    MIN_USER_TOKEN_TYPE,
                    self.parser.atn.max_token_type,
                ) {
                    let mut rc = RecoveryContext {
                        input: self.parser.input.as_mut(),
                        atn: &self.parser.atn,
                        state: self.parser.state,
                        ctx: self.parser.ctx.as_ref(),
                        listeners: &self.parser.listeners,
                        vocabulary: &self.parser.vocabulary,
                        factory: self.parser.factory.as_ref(),
                    };
                    self.parser.err_strategy.recover_inline(&mut rc)?;
                }
                self.parser.match_wildcard();
            }
            Transition::Wildcard { .. } => {
                self.parser.match_wildcard();
            }
            Transition::Rule {
                target,
                rule_index,
                precedence,
                ..
            } => {
                let newctx = ParserRuleContext::new(
                    self.parser.ctx.as_ref(),
                    Some(p),
                    *rule_index,
                );
                if self.parser.atn.states[*target].is_left_recursive {
                    self.parent_context_stack
                        .push((self.parser.ctx.clone(), Some(p)));
                    self.parser
                        .enter_recursion_rule(newctx, *target, *precedence);
                } else {
                    self.parser.enter_rule(newctx, *target);
                }
            }
            Transition::Predicate {
                rule_index,
                pred_index,
                ..
            } => {
                let ctx = self.parser.ctx.clone();
                if !self
                    .parser
                    .evaluator
                    .sempred(ctx.as_ref(), *rule_index, *pred_index)
                {
                    return Err(self.failed_predicate(*rule_index, *pred_index));
                }
            }
            Transition::Action { .. } => {
                // Embedded actions belong to generated code; the
                // interpreter has nothing to run.
            }
            Transition::Precedence { precedence, .. } => {
                let satisfied = {
                    let current = self.parser.precedence();
                    self.parser.evaluator.update_precedence(current);
                    let ctx = self.parser.ctx.clone();
                    self.parser.evaluator.precpred(ctx.as_ref(), *precedence)
                };
                if !satisfied {
                    return Err(self.failed_precedence(*precedence));
                }
            }
        }

        self.parser.set_state(transition.target());
        Ok(())
    }

    fn visit_decision_state(&mut self, p: usize) -> Result<usize, RecognitionError> {
        self.parser.sync()?;
        let decision = match self.parser.atn.states[p].decision {
            Some(d) => d,
            None => return Ok(1),
        };
        if Some(decision) == self.override_decision
            && self.parser.input.index() == self.override_decision_input_index
            && !self.override_decision_reached
        {
            self.override_decision_reached = true;
            return Ok(self.override_decision_alt);
        }
        self.parser.predict(decision)
    }

    fn visit_rule_stop_state(&mut self, p: usize) {
        let rule_start = self.parser.atn.rule_to_start_state[self.parser.atn.states[p].rule_index];
        if self.parser.atn.states[rule_start].is_left_recursive {
            let (parent, parent_state) = self
                .parent_context_stack
                .pop()
                .unwrap_or((None, None));
            self.parser.unroll_recursion_contexts(parent.as_ref());
            if let Some(state) = parent_state {
                self.parser.set_state(state);
            }
        } else {
            self.parser.exit_rule();
        }
        // Continue after the rule invocation.
        let invoking = &self.parser.atn.states[self.parser.state];
        match invoking.transitions.first() {
            Some(Transition::Rule { follow_state, .. }) => {
                self.parser.set_state(*follow_state);
            }
            _ => panic!(
                "state {} is not a rule invocation site",
                self.parser.state
            ),
        }
    }

    fn failed_predicate(&mut self, rule_index: usize, pred_index: usize) -> RecognitionError {
        RecognitionError::FailedPredicate {
            offending_token: self.parser.input.lt(1),
            rule_index,
            pred_index,
            message: format!("failed predicate {} of rule {}", pred_index, rule_index),
        }
    }

    fn failed_precedence(&mut self, precedence: i32) -> RecognitionError {
        RecognitionError::FailedPredicate {
            offending_token: self.parser.input.lt(1),
            rule_index: 0,
            pred_index: 0,
            message: format!("failed predicate {{precpred(_ctx, {})}}?", precedence),
        }
    }
}
