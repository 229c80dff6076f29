use std::sync::Arc;

use super::config::ATNConfig;
use super::config_set::ATNConfigSet;
use super::lexer_action::LexerActionExecutor;
use super::prediction_context::{MergeCache, PredictionContext, PredictionContextCache,
    EMPTY_RETURN_STATE};
use super::semantic_context::IPredicateEvaluator;
use super::{Transition, ATN};
use crate::dfa::{DFAEdge, DFAState, DFA, INVALID_ALT};
use crate::error::RecognitionError;
use crate::interval::MAX_CHAR_VALUE;
use crate::stream::ICharStream;
use crate::token::TOKEN_EOF;
use crate::util::{Log, Position};

/// Sentinel token type commanding the lexer to restart without emitting.
pub const LEXER_SKIP: i32 = -3;
/// Sentinel token type commanding the lexer to keep accumulating.
pub const LEXER_MORE: i32 = -2;

/// Lexer DFA edges are only memoized for this symbol range; rarer symbols
/// recompute their reach on every hit.
const MIN_DFA_EDGE: i32 = 0;
const MAX_DFA_EDGE: i32 = 127;

/// The outcome of one longest-match simulation.
pub struct MatchOutcome {
    /// The matched rule's token type, or the SKIP/MORE sentinel once the
    /// recorded actions ran.
    pub token_type: i32,
    /// Commands recorded along the accepting path; the lexer replays them
    /// after backing the input up to the accept point.
    pub executor: Option<Arc<LexerActionExecutor>>,
}

/// Farthest accept seen so far during a simulation.
#[derive(Default, Clone, Copy)]
struct SimState {
    index: usize,
    line: usize,
    column: usize,
    dfa_state: Option<usize>,
}

/// Longest-match recognition of one token under the current mode.
///
/// The simulator consults the mode's DFA character by character, extending
/// it from transition network closures on misses, and tracks the farthest
/// accepting configuration. When the simulation dies it backs the input up
/// to that accept; an input with no accept at all is a no-viable-alternative
/// error at the token start.
pub struct LexerATNSimulator {
    atn: Arc<ATN>,
    decision_to_dfa: Arc<Vec<DFA>>,
    shared_context_cache: Arc<PredictionContextCache>,
    /// Current line, 1 based; maintained by `consume`.
    pub line: usize,
    /// Current column, 0 based.
    pub column: usize,
    start_index: usize,
    debug: Log<&'static str>,
}

impl LexerATNSimulator {
    pub fn new(
        atn: Arc<ATN>,
        decision_to_dfa: Arc<Vec<DFA>>,
        shared_context_cache: Arc<PredictionContextCache>,
    ) -> Self {
        Self {
            atn,
            decision_to_dfa,
            shared_context_cache,
            line: 1,
            column: 0,
            start_index: 0,
            debug: Log::None,
        }
    }

    pub fn atn(&self) -> &Arc<ATN> {
        &self.atn
    }

    pub fn set_log(&mut self, log: Log<&'static str>) {
        self.debug = log;
    }

    pub fn reset_position(&mut self) {
        self.line = 1;
        self.column = 0;
    }

    /// Recognize the longest token starting at the current input position
    /// under `mode`. On failure the input is restored to the start position
    /// so the caller can discard one character and retry.
    pub fn match_token(
        &mut self,
        input: &mut dyn ICharStream,
        mode: usize,
        hooks: &mut dyn IPredicateEvaluator,
    ) -> Result<MatchOutcome, RecognitionError> {
        self.start_index = input.index();
        let start_position = Position::new(self.line, self.column + 1);
        let dfas = self.decision_to_dfa.clone();
        let dfa = &dfas[mode];
        let result = match dfa.s0() {
            Some(s0) => self.exec_atn(input, dfa, s0, hooks),
            None => {
                let start_state = self.atn.mode_to_start_state[mode];
                let mut s0_closure = self.compute_start_state(input, start_state, hooks);
                let suppress_edge = s0_closure.has_semantic_context;
                s0_closure.has_semantic_context = false;
                let next = self.add_dfa_state(dfa, s0_closure);
                if !suppress_edge {
                    dfa.set_s0(next);
                }
                self.exec_atn(input, dfa, next, hooks)
            }
        };
        result.ok_or_else(|| {
            let start_index = self.start_index;
            let text = input.get_text(start_index, start_index);
            input.seek(start_index);
            RecognitionError::LexerNoViableAlt {
                start_index,
                position: start_position,
                text,
            }
        })
    }

    fn exec_atn(
        &mut self,
        input: &mut dyn ICharStream,
        dfa: &DFA,
        s0: usize,
        hooks: &mut dyn IPredicateEvaluator,
    ) -> Option<MatchOutcome> {
        let mut prev_accept = SimState::default();
        if dfa.state_info(s0).is_accept_state {
            self.capture_sim_state(&mut prev_accept, input, s0);
        }

        let mut t = input.la(1);
        let mut s = s0;
        loop {
            let target = match self.existing_target(dfa, s, t) {
                Some(target) => target,
                None => self.compute_target_state(input, dfa, s, t, hooks),
            };
            let target = match target {
                DFAEdge::Error => break,
                DFAEdge::State(id) => id,
            };

            // Consume before capturing the accept state so line and column
            // reflect the character just matched.
            if t != TOKEN_EOF {
                self.consume(input);
            }
            if dfa.state_info(target).is_accept_state {
                self.capture_sim_state(&mut prev_accept, input, target);
                if t == TOKEN_EOF {
                    break;
                }
            }
            t = input.la(1);
            s = target;
        }

        self.fail_or_accept(input, dfa, prev_accept, t)
    }

    fn existing_target(&self, dfa: &DFA, s: usize, t: i32) -> Option<DFAEdge> {
        if !(MIN_DFA_EDGE..=MAX_DFA_EDGE).contains(&t) {
            return None;
        }
        dfa.edge(s, t)
    }

    fn compute_target_state(
        &mut self,
        input: &mut dyn ICharStream,
        dfa: &DFA,
        s: usize,
        t: i32,
        hooks: &mut dyn IPredicateEvaluator,
    ) -> DFAEdge {
        let closure_configs = dfa.state_info(s).configs;
        let mut reach = ATNConfigSet::ordered();
        self.reachable_config_set(input, &closure_configs, &mut reach, t, hooks);

        if reach.is_empty() {
            if !reach.has_semantic_context {
                self.set_edge(dfa, s, t, DFAEdge::Error);
            }
            return DFAEdge::Error;
        }

        // Predicated reaches must not be memoized; the predicate may answer
        // differently next time.
        let suppress_edge = reach.has_semantic_context;
        reach.has_semantic_context = false;
        let to = self.add_dfa_state(dfa, reach);
        if !suppress_edge {
            self.set_edge(dfa, s, t, DFAEdge::State(to));
        }
        DFAEdge::State(to)
    }

    fn set_edge(&self, dfa: &DFA, from: usize, t: i32, target: DFAEdge) {
        if (MIN_DFA_EDGE..=MAX_DFA_EDGE).contains(&t) {
            dfa.set_edge(from, t, target);
        }
    }

    /// Move every viable configuration over `t`, closing each result.
    /// Configurations of an alternative that already reached an accept are
    /// skipped once the accept was committed by a non-greedy path.
    fn reachable_config_set(
        &mut self,
        input: &mut dyn ICharStream,
        closure_configs: &ATNConfigSet,
        reach: &mut ATNConfigSet,
        t: i32,
        hooks: &mut dyn IPredicateEvaluator,
    ) {
        let mut skip_alt = INVALID_ALT;
        for config in closure_configs.configs() {
            let current_alt_reached_accept = config.alt == skip_alt;
            if current_alt_reached_accept && config.passed_through_non_greedy {
                continue;
            }
            let transition_count = self.atn.states[config.state].transitions.len();
            for index in 0..transition_count {
                let target = {
                    let transition = &self.atn.states[config.state].transitions[index];
                    if !transition.matches(t, 0, MAX_CHAR_VALUE) {
                        continue;
                    }
                    transition.target()
                };
                let executor = config.lexer_executor.as_ref().map(|executor| {
                    executor.fix_offset_before_match(input.index() - self.start_index)
                });
                let treat_eof_as_epsilon = t == TOKEN_EOF;
                let moved = self.derive_config(config, target, config.context.clone(), executor);
                if self.closure(
                    input,
                    moved,
                    reach,
                    current_alt_reached_accept,
                    true,
                    treat_eof_as_epsilon,
                    hooks,
                ) {
                    // The alternative committed an accept; lower priority
                    // transitions of it are irrelevant.
                    skip_alt = config.alt;
                    break;
                }
            }
        }
    }

    /// A configuration derived from `source`, keeping the non-greedy marker
    /// sticky across non-greedy decision states.
    fn derive_config(
        &self,
        source: &ATNConfig,
        target: usize,
        context: Arc<PredictionContext>,
        executor: Option<Arc<LexerActionExecutor>>,
    ) -> ATNConfig {
        let mut config = source.to_state_with_context(target, context);
        config.lexer_executor = executor;
        config.passed_through_non_greedy = source.passed_through_non_greedy
            || (self.atn.states[target].is_decision() && self.atn.states[target].non_greedy);
        config
    }

    /// Returns whether the configuration's alternative reached an accept
    /// state.
    #[allow(clippy::too_many_arguments)]
    fn closure(
        &mut self,
        input: &mut dyn ICharStream,
        config: ATNConfig,
        configs: &mut ATNConfigSet,
        mut current_alt_reached_accept: bool,
        speculative: bool,
        treat_eof_as_epsilon: bool,
        hooks: &mut dyn IPredicateEvaluator,
    ) -> bool {
        let mut merge_cache = MergeCache::new();
        if self.atn.states[config.state].is_rule_stop() {
            if config.context.has_empty_path() {
                if config.context.is_empty() {
                    configs.add(config, &mut merge_cache);
                    return true;
                } else {
                    let rebased = config
                        .to_state_with_context(config.state, PredictionContext::empty());
                    configs.add(rebased, &mut merge_cache);
                    current_alt_reached_accept = true;
                }
            }
            if !config.context.is_empty() {
                for i in 0..config.context.len() {
                    if config.context.return_state(i) == EMPTY_RETURN_STATE {
                        continue;
                    }
                    let return_state = config.context.return_state(i) as usize;
                    let new_context = config
                        .context
                        .parent(i)
                        .cloned()
                        .unwrap_or_else(PredictionContext::empty);
                    let popped = self.derive_config(
                        &config,
                        return_state,
                        new_context,
                        config.lexer_executor.clone(),
                    );
                    current_alt_reached_accept = self.closure(
                        input,
                        popped,
                        configs,
                        current_alt_reached_accept,
                        speculative,
                        treat_eof_as_epsilon,
                        hooks,
                    );
                }
            }
            return current_alt_reached_accept;
        }

        if !self.atn.states[config.state].epsilon_only_transitions
            && (!current_alt_reached_accept || !config.passed_through_non_greedy)
        {
            configs.add(config.clone(), &mut merge_cache);
        }

        for index in 0..self.atn.states[config.state].transitions.len() {
            let c = self.epsilon_target(
                input,
                &config,
                index,
                configs,
                speculative,
                treat_eof_as_epsilon,
                hooks,
            );
            if let Some(c) = c {
                current_alt_reached_accept = self.closure(
                    input,
                    c,
                    configs,
                    current_alt_reached_accept,
                    speculative,
                    treat_eof_as_epsilon,
                    hooks,
                );
            }
        }
        current_alt_reached_accept
    }

    #[allow(clippy::too_many_arguments)]
    fn epsilon_target(
        &mut self,
        input: &mut dyn ICharStream,
        config: &ATNConfig,
        transition_index: usize,
        configs: &mut ATNConfigSet,
        speculative: bool,
        treat_eof_as_epsilon: bool,
        hooks: &mut dyn IPredicateEvaluator,
    ) -> Option<ATNConfig> {
        let transition = self.atn.states[config.state].transitions[transition_index].clone();
        match transition {
            Transition::Rule {
                target,
                follow_state,
                ..
            } => {
                let new_context =
                    PredictionContext::singleton(config.context.clone(), follow_state as i32);
                Some(self.derive_config(config, target, new_context, config.lexer_executor.clone()))
            }
            Transition::Precedence { .. } => {
                panic!("precedence predicates are not used in lexer grammars");
            }
            Transition::Predicate {
                target,
                rule_index,
                pred_index,
                ..
            } => {
                // Predicated reaches are speculative: protect the stream
                // position and the printing position around the evaluation.
                configs.has_semantic_context = true;
                if self.evaluate_predicate(input, rule_index, pred_index, speculative, hooks) {
                    Some(self.derive_config(
                        config,
                        target,
                        config.context.clone(),
                        config.lexer_executor.clone(),
                    ))
                } else {
                    None
                }
            }
            Transition::Action { target, action_index, .. } => {
                if config.context.has_empty_path() {
                    // Actions only fire for the outermost token rule; in
                    // called rules they are deferred to that rule's own
                    // tokens.
                    let executor = Some(LexerActionExecutor::append(
                        config.lexer_executor.as_ref(),
                        self.atn.lexer_actions[action_index].clone(),
                    ));
                    Some(self.derive_config(config, target, config.context.clone(), executor))
                } else {
                    Some(self.derive_config(
                        config,
                        target,
                        config.context.clone(),
                        config.lexer_executor.clone(),
                    ))
                }
            }
            Transition::Epsilon { target, .. } => Some(self.derive_config(
                config,
                target,
                config.context.clone(),
                config.lexer_executor.clone(),
            )),
            Transition::Atom { .. } | Transition::Range { .. } | Transition::Set { .. } => {
                if treat_eof_as_epsilon && transition.matches(TOKEN_EOF, 0, 1) {
                    Some(self.derive_config(
                        config,
                        transition.target(),
                        config.context.clone(),
                        config.lexer_executor.clone(),
                    ))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn evaluate_predicate(
        &mut self,
        input: &mut dyn ICharStream,
        rule_index: usize,
        pred_index: usize,
        speculative: bool,
        hooks: &mut dyn IPredicateEvaluator,
    ) -> bool {
        if !speculative {
            return hooks.sempred(None, rule_index, pred_index);
        }
        let saved_column = self.column;
        let saved_line = self.line;
        let index = input.index();
        let marker = input.mark();
        self.consume(input);
        let result = hooks.sempred(None, rule_index, pred_index);
        self.column = saved_column;
        self.line = saved_line;
        input.seek(index);
        input.release(marker);
        result
    }

    fn compute_start_state(
        &mut self,
        input: &mut dyn ICharStream,
        start_state: usize,
        hooks: &mut dyn IPredicateEvaluator,
    ) -> ATNConfigSet {
        let mut configs = ATNConfigSet::ordered();
        let initial_context = PredictionContext::empty();
        for i in 0..self.atn.states[start_state].transitions.len() {
            let target = self.atn.states[start_state].transitions[i].target();
            let seed = ATNConfig::new(target, i + 1, initial_context.clone());
            let seed = self.derive_config(&seed, target, initial_context.clone(), None);
            self.closure(input, seed, &mut configs, false, false, false, hooks);
        }
        configs
    }

    fn fail_or_accept(
        &mut self,
        input: &mut dyn ICharStream,
        dfa: &DFA,
        prev_accept: SimState,
        t: i32,
    ) -> Option<MatchOutcome> {
        if let Some(dfa_state) = prev_accept.dfa_state {
            let info = dfa.state_info(dfa_state);
            // Back up to the longest match.
            input.seek(prev_accept.index);
            self.line = prev_accept.line;
            self.column = prev_accept.column;

            #[cfg(debug_assertions)]
            if self.debug.enabled(Log::Success(())) {
                println!(
                    "[{}; LexerAccept]: type {} at index {}",
                    self.debug, info.prediction, prev_accept.index
                );
            }

            return Some(MatchOutcome {
                token_type: info.prediction as i32,
                executor: info.lexer_executor,
            });
        }
        if t == TOKEN_EOF && input.index() == self.start_index {
            return Some(MatchOutcome {
                token_type: TOKEN_EOF,
                executor: None,
            });
        }
        None
    }

    fn add_dfa_state(&self, dfa: &DFA, configs: ATNConfigSet) -> usize {
        let accept_config = configs
            .configs()
            .iter()
            .find(|c| self.atn.states[c.state].is_rule_stop())
            .cloned();
        // Share call stack summaries across tokens and lexer instances.
        let mut canonical = ATNConfigSet::ordered();
        let mut merge_cache = MergeCache::new();
        for config in configs.configs() {
            let mut config = config.clone();
            config.context = self.shared_context_cache.canonical(&config.context);
            canonical.add(config, &mut merge_cache);
        }
        canonical.has_semantic_context = configs.has_semantic_context;
        canonical.freeze();
        let mut state = DFAState::new(Arc::new(canonical));
        if let Some(config) = accept_config {
            state.is_accept_state = true;
            state.lexer_executor = config.lexer_executor.clone();
            state.prediction = self.atn.rule_to_token_type[self.atn.states[config.state].rule_index] as usize;
        }
        dfa.add_state(state)
    }

    fn capture_sim_state(
        &self,
        prev_accept: &mut SimState,
        input: &dyn ICharStream,
        dfa_state: usize,
    ) {
        prev_accept.index = input.index();
        prev_accept.line = self.line;
        prev_accept.column = self.column;
        prev_accept.dfa_state = Some(dfa_state);
    }

    /// Advance one character, maintaining the printing position.
    pub fn consume(&mut self, input: &mut dyn ICharStream) {
        let current = input.la(1);
        if current == '\n' as i32 {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        input.consume();
    }
}
