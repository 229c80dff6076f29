use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use bit_set::BitSet;

use super::prediction_context::{MergeCache, PredictionContext, PredictionContextCache,
    EMPTY_RETURN_STATE};
use super::prediction_mode::{
    all_configs_in_rule_stop_states, all_subsets_conflict, all_subsets_equal, get_alts,
    get_conflicting_alt_subsets, has_config_in_rule_stop_state,
    has_sll_conflict_terminating_prediction, min_alt, resolves_to_just_one_viable_alt,
    PredictionMode,
};
use super::semantic_context::{IPredicateEvaluator, SemanticContext};
use super::{ATNConfig, ATNConfigSet, Transition, ATN};
use crate::context::ParserRuleContext;
use crate::dfa::{DFAEdge, DFAState, DFAStateInfo, PredPrediction, DFA, INVALID_ALT};
use crate::error::{ErrorListeners, RecognitionError};
use crate::stream::ITokenStream;
use crate::token::{TOKEN_EOF, TOKEN_EPSILON};
use crate::util::Log;

/// The per-prediction borrows the simulator works against: the token
/// stream, the host's predicate hooks, the listener list and the rule
/// context prediction started in.
pub struct PredictionEnv<'a> {
    pub input: &'a mut dyn ITokenStream,
    pub evaluator: &'a mut dyn IPredicateEvaluator,
    pub listeners: &'a ErrorListeners,
    pub outer_context: Option<Rc<ParserRuleContext>>,
}

/// The adaptive LL(*) prediction engine.
///
/// Prediction runs against the decision's DFA first; misses simulate the
/// transition network (move + closure) and install the discovered states
/// and edges, so later predictions with the same lookahead are table
/// lookups. An SLL conflict falls back to a full-context simulation which
/// can tell real ambiguity from context sensitivity. Among surviving
/// alternatives the minimum is always chosen; generated parsers rely on
/// that tie-break.
pub struct ParserATNSimulator {
    atn: Arc<ATN>,
    decision_to_dfa: Arc<Vec<DFA>>,
    shared_context_cache: Arc<PredictionContextCache>,
    pub prediction_mode: PredictionMode,
    debug: Log<&'static str>,
}

impl ParserATNSimulator {
    pub fn new(
        atn: Arc<ATN>,
        decision_to_dfa: Arc<Vec<DFA>>,
        shared_context_cache: Arc<PredictionContextCache>,
    ) -> Self {
        Self {
            atn,
            decision_to_dfa,
            shared_context_cache,
            prediction_mode: PredictionMode::Ll,
            debug: Log::None,
        }
    }

    pub fn atn(&self) -> &Arc<ATN> {
        &self.atn
    }

    pub fn decision_to_dfa(&self) -> &Arc<Vec<DFA>> {
        &self.decision_to_dfa
    }

    pub fn set_log(&mut self, log: Log<&'static str>) {
        self.debug = log;
    }

    /// Predict the alternative taken at `decision` from the current input
    /// position. The input is restored to its entry position on every path;
    /// the caller consumes tokens by walking the chosen alternative.
    pub fn adaptive_predict(
        &self,
        env: &mut PredictionEnv,
        decision: usize,
        precedence: i32,
    ) -> Result<usize, RecognitionError> {
        let dfa = &self.decision_to_dfa[decision];
        let start_index = env.input.index();
        let marker = env.input.mark();
        let mut merge_cache = MergeCache::new();
        let result = self.predict(env, dfa, precedence, start_index, &mut merge_cache);
        env.input.seek(start_index);
        env.input.release(marker);
        result
    }

    fn predict(
        &self,
        env: &mut PredictionEnv,
        dfa: &DFA,
        precedence: i32,
        start_index: usize,
        merge_cache: &mut MergeCache,
    ) -> Result<usize, RecognitionError> {
        let existing_s0 = if dfa.is_precedence_dfa() {
            dfa.precedence_start_state(precedence)
        } else {
            dfa.s0()
        };
        let s0 = match existing_s0 {
            Some(s0) => s0,
            None => {
                // Cold start: closure of the decision state with the empty
                // stack summary.
                let s0_closure =
                    self.compute_start_state(env, dfa.atn_start_state, None, false, start_index,
                        merge_cache, Some(dfa));
                let id = if dfa.is_precedence_dfa() {
                    let filtered = self.apply_precedence_filter(env, &s0_closure, merge_cache);
                    let id = self.install_start_state(dfa, filtered);
                    dfa.set_precedence_start_state(precedence, id);
                    id
                } else {
                    let id = self.install_start_state(dfa, s0_closure);
                    dfa.set_s0(id);
                    id
                };
                id
            }
        };

        #[cfg(debug_assertions)]
        if self.debug.enabled(Log::Verbose(())) {
            println!(
                "[{}; predict]: decision {} at input {}",
                self.debug, dfa.decision, start_index
            );
        }

        self.exec_atn(env, dfa, s0, start_index, merge_cache)
    }

    fn install_start_state(&self, dfa: &DFA, mut configs: ATNConfigSet) -> usize {
        configs.freeze();
        let canonical = self.canonical_set(configs);
        dfa.add_state(DFAState::new(Arc::new(canonical)))
    }

    /// Re-point the frozen set's summaries at the shared pool so equal
    /// stacks collapse across predictions and recognizers.
    fn canonical_set(&self, configs: ATNConfigSet) -> ATNConfigSet {
        let mut result = ATNConfigSet::new(configs.full_ctx);
        let read_only = configs.is_read_only();
        let mut merge_cache = MergeCache::new();
        result.unique_alt = configs.unique_alt;
        result.conflicting_alts = configs.conflicting_alts.clone();
        for config in configs.configs() {
            let mut config = config.clone();
            config.context = self.shared_context_cache.canonical(&config.context);
            result.add(config, &mut merge_cache);
        }
        result.dips_into_outer_context = configs.dips_into_outer_context;
        if read_only {
            result.freeze();
        }
        result
    }

    fn exec_atn(
        &self,
        env: &mut PredictionEnv,
        dfa: &DFA,
        s0: usize,
        start_index: usize,
        merge_cache: &mut MergeCache,
    ) -> Result<usize, RecognitionError> {
        let mut previous = dfa.state_info(s0);
        let mut t = env.input.la(1);

        loop {
            let edge = match self.existing_target(dfa, &previous, t) {
                Some(edge) => edge,
                None => self.compute_target_state(env, dfa, &previous, t, start_index, merge_cache),
            };

            let d = match edge {
                DFAEdge::Error => {
                    let error = self.no_viable_alt(env, dfa.decision, start_index);
                    env.input.seek(start_index);
                    let alt = self.syn_valid_or_sem_invalid_alt(env, &previous.configs);
                    if alt != INVALID_ALT {
                        return Ok(alt);
                    }
                    return Err(error);
                }
                DFAEdge::State(d) => d,
            };
            let info = dfa.state_info(d);

            if info.requires_full_context && self.prediction_mode != PredictionMode::Sll {
                let mut conflicting_alts = info
                    .configs
                    .conflicting_alts
                    .clone()
                    .unwrap_or_else(|| info.configs.get_alts());
                if let Some(predicates) = &info.predicates {
                    let conflict_index = env.input.index();
                    if conflict_index != start_index {
                        env.input.seek(start_index);
                    }
                    conflicting_alts = self.eval_semantic_context(env, predicates, true);
                    if conflicting_alts.len() == 1 {
                        return Ok(min_alt(&conflicting_alts));
                    }
                    if conflict_index != start_index {
                        env.input.seek(conflict_index);
                    }
                }
                env.listeners.report_attempting_full_context(
                    dfa.decision,
                    start_index,
                    env.input.index(),
                    &conflicting_alts,
                    &info.configs,
                );
                let outer = env.outer_context.clone();
                env.input.seek(start_index);
                let s0_closure = self.compute_start_state(
                    env,
                    dfa.atn_start_state,
                    outer.as_ref(),
                    true,
                    start_index,
                    merge_cache,
                    Some(dfa),
                );
                return self.exec_atn_with_full_context(
                    env,
                    dfa,
                    s0_closure,
                    start_index,
                    merge_cache,
                );
            }

            if info.is_accept_state {
                let predicates = match &info.predicates {
                    None => return Ok(info.prediction),
                    Some(p) => p,
                };
                let stop_index = env.input.index();
                env.input.seek(start_index);
                let alts = self.eval_semantic_context(env, predicates, true);
                return match alts.len() {
                    0 => Err(self.no_viable_alt(env, dfa.decision, start_index)),
                    1 => Ok(min_alt(&alts)),
                    _ => {
                        env.listeners.report_ambiguity(
                            dfa.decision,
                            start_index,
                            stop_index,
                            false,
                            &alts,
                            &info.configs,
                        );
                        Ok(min_alt(&alts))
                    }
                };
            }

            previous = info;
            if t != TOKEN_EOF {
                env.input.consume();
                t = env.input.la(1);
            }
        }
    }

    fn existing_target(&self, dfa: &DFA, previous: &DFAStateInfo, t: i32) -> Option<DFAEdge> {
        dfa.edge(previous.id, t)
    }

    fn compute_target_state(
        &self,
        env: &mut PredictionEnv,
        dfa: &DFA,
        previous: &DFAStateInfo,
        t: i32,
        start_index: usize,
        merge_cache: &mut MergeCache,
    ) -> DFAEdge {
        let reach = self.compute_reach_set(
            env,
            &previous.configs,
            t,
            false,
            start_index,
            merge_cache,
            Some(dfa),
        );
        let mut reach = match reach {
            None => {
                dfa.set_edge(previous.id, t, DFAEdge::Error);
                return DFAEdge::Error;
            }
            Some(r) => r,
        };

        let predicted_alt = get_unique_alt(&reach);
        let mut state = DFAState::new(Arc::new(ATNConfigSet::new(false)));
        if predicted_alt != INVALID_ALT {
            reach.unique_alt = predicted_alt;
            state.is_accept_state = true;
            state.prediction = predicted_alt;
        } else if has_sll_conflict_terminating_prediction(self.prediction_mode, &reach, &self.atn)
        {
            let conflicting = get_alts(&get_conflicting_alt_subsets(&reach));
            reach.conflicting_alts = Some(conflicting.clone());
            state.requires_full_context = true;
            state.is_accept_state = true;
            state.prediction = min_alt(&conflicting);
        }

        if state.is_accept_state && reach.has_semantic_context {
            let decision_state = self.atn.state(dfa.atn_start_state);
            let alts_to_collect = reach.conflicting_alts.clone().unwrap_or_else(|| {
                let mut only = BitSet::new();
                only.insert(state.prediction);
                only
            });
            match self.preds_for_ambig_alts(&alts_to_collect, &reach, decision_state.transitions.len())
            {
                Some(alt_to_pred) => {
                    state.predicates =
                        Some(self.predicate_predictions(&alts_to_collect, &alt_to_pred));
                    state.prediction = INVALID_ALT;
                }
                None => {
                    state.prediction = min_alt(&alts_to_collect);
                }
            }
        }

        reach.freeze();
        state.configs = Arc::new(self.canonical_set(reach));
        let id = dfa.add_state(state);
        dfa.set_edge(previous.id, t, DFAEdge::State(id));
        DFAEdge::State(id)
    }

    fn exec_atn_with_full_context(
        &self,
        env: &mut PredictionEnv,
        dfa: &DFA,
        s0_closure: ATNConfigSet,
        start_index: usize,
        merge_cache: &mut MergeCache,
    ) -> Result<usize, RecognitionError> {
        let mut previous = s0_closure;
        env.input.seek(start_index);
        let mut t = env.input.la(1);
        let mut found_exact_ambig = false;

        let predicted = loop {
            let mut reach = match self.compute_reach_set(
                env,
                &previous,
                t,
                true,
                start_index,
                merge_cache,
                Some(dfa),
            ) {
                None => {
                    let error = self.no_viable_alt(env, dfa.decision, start_index);
                    env.input.seek(start_index);
                    let alt = self.syn_valid_or_sem_invalid_alt(env, &previous);
                    if alt != INVALID_ALT {
                        return Ok(alt);
                    }
                    return Err(error);
                }
                Some(r) => r,
            };

            let alt_subsets = get_conflicting_alt_subsets(&reach);
            reach.unique_alt = get_unique_alt(&reach);
            if reach.unique_alt != INVALID_ALT {
                let alt = reach.unique_alt;
                previous = reach;
                break alt;
            }
            if self.prediction_mode != PredictionMode::LlExactAmbigDetection {
                let alt = resolves_to_just_one_viable_alt(&alt_subsets);
                if alt != INVALID_ALT {
                    previous = reach;
                    break alt;
                }
            } else if all_subsets_conflict(&alt_subsets) && all_subsets_equal(&alt_subsets) {
                found_exact_ambig = true;
                let alt = min_alt(&get_alts(&alt_subsets));
                previous = reach;
                break alt;
            }
            previous = reach;
            if t != TOKEN_EOF {
                env.input.consume();
                t = env.input.la(1);
            }
        };

        if previous.unique_alt != INVALID_ALT {
            // The full-context pass disagrees with SLL only in needing the
            // context; report and commit.
            env.listeners.report_context_sensitivity(
                dfa.decision,
                start_index,
                env.input.index(),
                predicted,
                &previous,
            );
            return Ok(predicted);
        }
        env.listeners.report_ambiguity(
            dfa.decision,
            start_index,
            env.input.index(),
            found_exact_ambig,
            &previous.get_alts(),
            &previous,
        );
        Ok(predicted)
    }

    fn compute_reach_set(
        &self,
        env: &mut PredictionEnv,
        closure: &ATNConfigSet,
        t: i32,
        full_ctx: bool,
        start_index: usize,
        merge_cache: &mut MergeCache,
        dfa: Option<&DFA>,
    ) -> Option<ATNConfigSet> {
        let mut intermediate = ATNConfigSet::new(full_ctx);
        let mut skipped_stop_states: Vec<ATNConfig> = Vec::new();

        for config in closure.configs() {
            if self.atn.states[config.state].is_rule_stop() {
                debug_assert!(config.context.is_empty() || full_ctx);
                if full_ctx || t == TOKEN_EOF {
                    skipped_stop_states.push(config.clone());
                }
                continue;
            }
            for transition in &self.atn.states[config.state].transitions {
                if let Some(target) = self.reachable_target(transition, t) {
                    intermediate.add(config.to_state(target), merge_cache);
                }
            }
        }

        // A trivial move result needs no closure pass.
        let take_intermediate = skipped_stop_states.is_empty()
            && t != TOKEN_EOF
            && (intermediate.len() == 1 || get_unique_alt(&intermediate) != INVALID_ALT);
        let mut reach = if take_intermediate {
            intermediate
        } else {
            let mut result = ATNConfigSet::new(full_ctx);
            let mut closure_busy: HashSet<ATNConfig> = HashSet::new();
            let treat_eof_as_epsilon = t == TOKEN_EOF;
            for config in intermediate.configs().to_vec() {
                self.closure(
                    env,
                    config,
                    &mut result,
                    &mut closure_busy,
                    false,
                    full_ctx,
                    0,
                    treat_eof_as_epsilon,
                    start_index,
                    merge_cache,
                    dfa,
                );
            }
            result
        };

        if t == TOKEN_EOF {
            reach = self.remove_non_rule_stop_configs(reach, merge_cache);
        }
        if !skipped_stop_states.is_empty()
            && (!full_ctx || !has_config_in_rule_stop_state(&reach, &self.atn))
        {
            for config in skipped_stop_states {
                reach.add(config, merge_cache);
            }
        }
        if reach.is_empty() {
            return None;
        }
        Some(reach)
    }

    /// On EOF only configurations already at a rule stop survive; other
    /// epsilon-reachable rule ends are completed when requested.
    fn remove_non_rule_stop_configs(
        &self,
        configs: ATNConfigSet,
        merge_cache: &mut MergeCache,
    ) -> ATNConfigSet {
        if all_configs_in_rule_stop_states(&configs, &self.atn) {
            return configs;
        }
        let mut result = ATNConfigSet::new(configs.full_ctx);
        for config in configs.configs() {
            if self.atn.states[config.state].is_rule_stop() {
                result.add(config.clone(), merge_cache);
                continue;
            }
            if self.atn.states[config.state].epsilon_only_transitions {
                let next_tokens = self.atn.next_tokens(config.state);
                if next_tokens.contains(TOKEN_EPSILON) {
                    let rule = self.atn.states[config.state].rule_index;
                    let end_of_rule = self.atn.rule_to_stop_state[rule];
                    result.add(config.to_state(end_of_rule), merge_cache);
                }
            }
        }
        result
    }

    fn compute_start_state(
        &self,
        env: &mut PredictionEnv,
        p: usize,
        ctx: Option<&Rc<ParserRuleContext>>,
        full_ctx: bool,
        start_index: usize,
        merge_cache: &mut MergeCache,
        dfa: Option<&DFA>,
    ) -> ATNConfigSet {
        let initial_context = PredictionContext::from_rule_context(&self.atn, ctx);
        let mut configs = ATNConfigSet::new(full_ctx);
        let mut closure_busy: HashSet<ATNConfig> = HashSet::new();
        let transitions: Vec<usize> = (0..self.atn.states[p].transitions.len()).collect();
        for i in transitions {
            let target = self.atn.states[p].transitions[i].target();
            let config = ATNConfig::new(target, i + 1, initial_context.clone());
            self.closure(
                env,
                config,
                &mut configs,
                &mut closure_busy,
                true,
                full_ctx,
                0,
                false,
                start_index,
                merge_cache,
                dfa,
            );
        }
        configs
    }

    /// Drop configurations of the left-recursive entry whose first
    /// alternative already covers them under the current precedence, so a
    /// lower-precedence loop iteration cannot be predicted.
    fn apply_precedence_filter(
        &self,
        env: &mut PredictionEnv,
        configs: &ATNConfigSet,
        merge_cache: &mut MergeCache,
    ) -> ATNConfigSet {
        let mut states_from_alt1: HashMap<usize, Arc<PredictionContext>> = HashMap::new();
        let mut result = ATNConfigSet::new(configs.full_ctx);
        let outer = env.outer_context.clone();

        for config in configs.configs() {
            if config.alt != 1 {
                continue;
            }
            let updated = config
                .semantic_context
                .eval_precedence(env.evaluator, outer.as_ref());
            let updated = match updated {
                None => continue,
                Some(u) => u,
            };
            states_from_alt1.insert(config.state, config.context.clone());
            if *updated != *config.semantic_context {
                result.add(
                    config.to_state_with_semantic(config.state, updated),
                    merge_cache,
                );
            } else {
                result.add(config.clone(), merge_cache);
            }
        }

        for config in configs.configs() {
            if config.alt == 1 {
                continue;
            }
            if !config.precedence_filter_suppressed {
                if let Some(context) = states_from_alt1.get(&config.state) {
                    if **context == *config.context {
                        // Eliminated by the alt 1 coverage.
                        continue;
                    }
                }
            }
            result.add(config.clone(), merge_cache);
        }
        result
    }

    fn reachable_target(&self, transition: &Transition, t: i32) -> Option<usize> {
        if transition.matches(t, 0, self.atn.max_token_type) {
            Some(transition.target())
        } else {
            None
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn closure(
        &self,
        env: &mut PredictionEnv,
        config: ATNConfig,
        configs: &mut ATNConfigSet,
        closure_busy: &mut HashSet<ATNConfig>,
        collect_predicates: bool,
        full_ctx: bool,
        depth: i32,
        treat_eof_as_epsilon: bool,
        start_index: usize,
        merge_cache: &mut MergeCache,
        dfa: Option<&DFA>,
    ) {
        if self.atn.states[config.state].is_rule_stop() {
            if !config.context.is_empty() {
                for i in 0..config.context.len() {
                    if config.context.return_state(i) == EMPTY_RETURN_STATE {
                        if full_ctx {
                            let c = config
                                .to_state_with_context(config.state, PredictionContext::empty());
                            configs.add(c, merge_cache);
                        } else {
                            // End of the seed stack in SLL: chase the
                            // global follow edges instead.
                            self.closure_work(
                                env,
                                config.clone(),
                                configs,
                                closure_busy,
                                collect_predicates,
                                full_ctx,
                                depth,
                                treat_eof_as_epsilon,
                                start_index,
                                merge_cache,
                                dfa,
                            );
                        }
                        continue;
                    }
                    let return_state = config.context.return_state(i) as usize;
                    let new_context = config
                        .context
                        .parent(i)
                        .cloned()
                        .unwrap_or_else(PredictionContext::empty);
                    let mut c = ATNConfig::with_semantic(
                        return_state,
                        config.alt,
                        new_context,
                        config.semantic_context.clone(),
                    );
                    c.reaches_into_outer_context = config.reaches_into_outer_context;
                    c.precedence_filter_suppressed = config.precedence_filter_suppressed;
                    self.closure(
                        env,
                        c,
                        configs,
                        closure_busy,
                        collect_predicates,
                        full_ctx,
                        depth - 1,
                        treat_eof_as_epsilon,
                        start_index,
                        merge_cache,
                        dfa,
                    );
                }
                return;
            } else if full_ctx {
                configs.add(config, merge_cache);
                return;
            }
            // No stack left in SLL mode: fall through and chase follow
            // links.
        }
        self.closure_work(
            env,
            config,
            configs,
            closure_busy,
            collect_predicates,
            full_ctx,
            depth,
            treat_eof_as_epsilon,
            start_index,
            merge_cache,
            dfa,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn closure_work(
        &self,
        env: &mut PredictionEnv,
        config: ATNConfig,
        configs: &mut ATNConfigSet,
        closure_busy: &mut HashSet<ATNConfig>,
        collect_predicates: bool,
        full_ctx: bool,
        depth: i32,
        treat_eof_as_epsilon: bool,
        start_index: usize,
        merge_cache: &mut MergeCache,
        dfa: Option<&DFA>,
    ) {
        let p = config.state;
        if !self.atn.states[p].epsilon_only_transitions {
            configs.add(config.clone(), merge_cache);
        }

        for index in 0..self.atn.states[p].transitions.len() {
            let transition = &self.atn.states[p].transitions[index];
            let continue_collecting =
                collect_predicates && !matches!(transition, Transition::Action { .. });
            let c = self.epsilon_target(
                env,
                &config,
                transition,
                continue_collecting,
                depth == 0,
                full_ctx,
                treat_eof_as_epsilon,
                start_index,
            );
            let mut c = match c {
                None => continue,
                Some(c) => c,
            };

            let mut new_depth = depth;
            if self.atn.states[config.state].is_rule_stop() {
                debug_assert!(!full_ctx);
                // The configuration fell off the end of the decision's
                // entry rule into the invoking grammar.
                if let Some(dfa) = dfa {
                    if dfa.is_precedence_dfa() {
                        if let Transition::Epsilon {
                            outermost_precedence_return: Some(rule),
                            ..
                        } = &self.atn.states[p].transitions[index]
                        {
                            if *rule == self.atn.states[dfa.atn_start_state].rule_index {
                                c.precedence_filter_suppressed = true;
                            }
                        }
                    }
                }
                c.reaches_into_outer_context += 1;
                if !closure_busy.insert(c.clone()) {
                    continue;
                }
                configs.dips_into_outer_context = true;
                new_depth -= 1;
            } else {
                let transition = &self.atn.states[p].transitions[index];
                if !transition.is_epsilon() && !closure_busy.insert(c.clone()) {
                    continue;
                }
                if matches!(transition, Transition::Rule { .. }) && new_depth >= 0 {
                    new_depth += 1;
                }
            }

            self.closure(
                env,
                c,
                configs,
                closure_busy,
                continue_collecting,
                full_ctx,
                new_depth,
                treat_eof_as_epsilon,
                start_index,
                merge_cache,
                dfa,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn epsilon_target(
        &self,
        env: &mut PredictionEnv,
        config: &ATNConfig,
        transition: &Transition,
        collect_predicates: bool,
        in_context: bool,
        full_ctx: bool,
        treat_eof_as_epsilon: bool,
        start_index: usize,
    ) -> Option<ATNConfig> {
        match transition {
            Transition::Rule {
                target,
                follow_state,
                ..
            } => {
                let new_context =
                    PredictionContext::singleton(config.context.clone(), *follow_state as i32);
                Some(config.to_state_with_context(*target, new_context))
            }
            Transition::Precedence { target, precedence } => self.predicate_like_target(
                env,
                config,
                *target,
                &SemanticContext::precedence(*precedence),
                collect_predicates && in_context,
                full_ctx,
                start_index,
            ),
            Transition::Predicate {
                target,
                rule_index,
                pred_index,
                is_ctx_dependent,
            } => self.predicate_like_target(
                env,
                config,
                *target,
                &SemanticContext::predicate(*rule_index, *pred_index, *is_ctx_dependent),
                collect_predicates && (!*is_ctx_dependent || in_context),
                full_ctx,
                start_index,
            ),
            Transition::Action { target, .. } => Some(config.to_state(*target)),
            Transition::Epsilon { target, .. } => Some(config.to_state(*target)),
            Transition::Atom { .. } | Transition::Range { .. } | Transition::Set { .. } => {
                if treat_eof_as_epsilon && transition.matches(TOKEN_EOF, 0, 1) {
                    Some(config.to_state(transition.target()))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn predicate_like_target(
        &self,
        env: &mut PredictionEnv,
        config: &ATNConfig,
        target: usize,
        predicate: &Arc<SemanticContext>,
        collect: bool,
        full_ctx: bool,
        start_index: usize,
    ) -> Option<ATNConfig> {
        if !collect {
            return Some(config.to_state(target));
        }
        if full_ctx {
            // Evaluate against the real context right now; the input must
            // sit at the decision start while the host looks around.
            let current_position = env.input.index();
            env.input.seek(start_index);
            let outer = env.outer_context.clone();
            let succeeds = predicate.eval(env.evaluator, outer.as_ref());
            env.input.seek(current_position);
            if succeeds {
                Some(config.to_state(target))
            } else {
                None
            }
        } else {
            let new_semantic = SemanticContext::and(&config.semantic_context, predicate);
            Some(config.to_state_with_semantic(target, new_semantic))
        }
    }

    fn preds_for_ambig_alts(
        &self,
        ambig_alts: &BitSet,
        configs: &ATNConfigSet,
        nalts: usize,
    ) -> Option<Vec<Arc<SemanticContext>>> {
        let mut alt_to_pred: Vec<Option<Arc<SemanticContext>>> = vec![None; nalts + 1];
        for config in configs.configs() {
            if ambig_alts.contains(config.alt) {
                let slot = &mut alt_to_pred[config.alt];
                *slot = Some(match slot.take() {
                    None => config.semantic_context.clone(),
                    Some(existing) => SemanticContext::or(&existing, &config.semantic_context),
                });
            }
        }
        let mut n_pred_alts = 0;
        let resolved: Vec<Arc<SemanticContext>> = alt_to_pred
            .into_iter()
            .map(|pred| match pred {
                None => SemanticContext::none(),
                Some(p) => {
                    if !p.is_none() {
                        n_pred_alts += 1;
                    }
                    p
                }
            })
            .collect();
        if n_pred_alts == 0 {
            return None;
        }
        Some(resolved)
    }

    fn predicate_predictions(
        &self,
        ambig_alts: &BitSet,
        alt_to_pred: &[Arc<SemanticContext>],
    ) -> Vec<PredPrediction> {
        let mut pairs = Vec::new();
        for (alt, pred) in alt_to_pred.iter().enumerate().skip(1) {
            if ambig_alts.contains(alt) {
                pairs.push(PredPrediction {
                    pred: pred.clone(),
                    alt,
                });
            }
        }
        pairs
    }

    fn eval_semantic_context(
        &self,
        env: &mut PredictionEnv,
        predicates: &[PredPrediction],
        complete: bool,
    ) -> BitSet {
        let mut predictions = BitSet::new();
        let outer = env.outer_context.clone();
        for pair in predicates {
            if pair.pred.is_none() {
                predictions.insert(pair.alt);
                if !complete {
                    break;
                }
                continue;
            }
            if pair.pred.eval(env.evaluator, outer.as_ref()) {
                predictions.insert(pair.alt);
                if !complete {
                    break;
                }
            }
        }
        predictions
    }

    /// When prediction dead-ends, prefer an alternative which already
    /// finished the decision's entry rule; semantically valid ones first.
    fn syn_valid_or_sem_invalid_alt(&self, env: &mut PredictionEnv, configs: &ATNConfigSet) -> usize {
        let outer = env.outer_context.clone();
        let mut sem_valid = Vec::new();
        let mut sem_invalid = Vec::new();
        for config in configs.configs() {
            if config.semantic_context.is_none()
                || config.semantic_context.eval(env.evaluator, outer.as_ref())
            {
                sem_valid.push(config);
            } else {
                sem_invalid.push(config);
            }
        }
        let alt = self.alt_that_finished_decision_entry_rule(&sem_valid);
        if alt != INVALID_ALT {
            return alt;
        }
        if !sem_invalid.is_empty() {
            return self.alt_that_finished_decision_entry_rule(&sem_invalid);
        }
        INVALID_ALT
    }

    fn alt_that_finished_decision_entry_rule(&self, configs: &[&ATNConfig]) -> usize {
        let mut alts: Option<usize> = None;
        for config in configs {
            let at_stop = self.atn.states[config.state].is_rule_stop();
            if config.reaches_into_outer_context > 0
                || (at_stop && config.context.has_empty_path())
            {
                alts = Some(match alts {
                    None => config.alt,
                    Some(found) => found.min(config.alt),
                });
            }
        }
        alts.unwrap_or(INVALID_ALT)
    }

    fn no_viable_alt(
        &self,
        env: &mut PredictionEnv,
        decision: usize,
        start_index: usize,
    ) -> RecognitionError {
        RecognitionError::NoViableAlt {
            decision,
            start_token: Some(env.input.get(start_index)),
            offending_token: env.input.lt(1),
        }
    }
}

fn get_unique_alt(configs: &ATNConfigSet) -> usize {
    let mut alt = INVALID_ALT;
    for config in configs.configs() {
        if alt == INVALID_ALT {
            alt = config.alt;
        } else if config.alt != alt {
            return INVALID_ALT;
        }
    }
    alt
}
