use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use bit_set::BitSet;

use super::prediction_context::{CtxKey, PredictionContext, EMPTY_RETURN_STATE};
use super::{Transition, ATN};
use crate::context::ParserRuleContext;
use crate::interval::IntervalSet;
use crate::token::{MIN_USER_TOKEN_TYPE, TOKEN_EOF, TOKEN_EPSILON};

impl ATN {
    /// The set of tokens which can follow `state` without leaving its rule.
    /// [`TOKEN_EPSILON`] in the result marks paths that fall off the end of
    /// the rule. The computation is cached on the state.
    pub fn next_tokens(&self, state: usize) -> &IntervalSet {
        self.states[state]
            .next_tokens_cache
            .get_or_init(|| self.look(state, None, None))
    }

    /// The set of tokens which can follow `state` given the live rule
    /// invocation chain; [`TOKEN_EOF`] appears when the chain can end.
    pub fn next_tokens_in_context(
        &self,
        state: usize,
        ctx: Option<&Rc<ParserRuleContext>>,
    ) -> IntervalSet {
        let look_ctx = ctx.map(|c| PredictionContext::from_rule_context(self, Some(c)));
        self.look(state, None, look_ctx)
    }

    /// Tokens acceptable at `state` for error reporting: the within-rule
    /// follow set widened through the invocation chain while epsilon paths
    /// keep escaping.
    pub fn get_expected_tokens(
        &self,
        state: usize,
        ctx: Option<&Rc<ParserRuleContext>>,
    ) -> IntervalSet {
        let epsilon = IntervalSet::of_one(TOKEN_EPSILON);
        let mut following = self.next_tokens(state).clone();
        if !following.contains(TOKEN_EPSILON) {
            return following;
        }
        let mut expected = following.subtract(&epsilon);
        let mut current = ctx.cloned();
        while let Some(frame) = current {
            let invoking_state = match frame.invoking_state() {
                None => break,
                Some(s) => s,
            };
            if !following.contains(TOKEN_EPSILON) {
                break;
            }
            match self.states[invoking_state].transitions.first() {
                Some(Transition::Rule { follow_state, .. }) => {
                    following = self.next_tokens(*follow_state).clone();
                    expected.add_set(&following.subtract(&epsilon));
                }
                _ => break,
            }
            current = frame.parent();
        }
        if following.contains(TOKEN_EPSILON) {
            expected.add_one(TOKEN_EOF);
        }
        expected
    }

    fn look(
        &self,
        state: usize,
        stop_state: Option<usize>,
        ctx: Option<Arc<PredictionContext>>,
    ) -> IntervalSet {
        let mut result = IntervalSet::new();
        let mut busy = HashSet::new();
        let mut called_rule_stack = BitSet::new();
        self.look_impl(
            state,
            stop_state,
            ctx,
            &mut result,
            &mut busy,
            &mut called_rule_stack,
            true,
        );
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn look_impl(
        &self,
        state: usize,
        stop_state: Option<usize>,
        ctx: Option<Arc<PredictionContext>>,
        look: &mut IntervalSet,
        busy: &mut HashSet<(usize, Option<CtxKey>)>,
        called_rule_stack: &mut BitSet,
        add_eof: bool,
    ) {
        if !busy.insert((state, ctx.as_ref().map(|c| CtxKey(c.clone())))) {
            return;
        }

        let s = &self.states[state];
        if Some(state) == stop_state || s.is_rule_stop() {
            match &ctx {
                None => {
                    look.add_one(TOKEN_EPSILON);
                    return;
                }
                Some(c) if c.is_empty() && add_eof => {
                    look.add_one(TOKEN_EOF);
                    return;
                }
                _ => {}
            }
        }
        if s.is_rule_stop() {
            if let Some(c) = &ctx {
                if !c.is_empty() {
                    let removed = called_rule_stack.contains(s.rule_index);
                    called_rule_stack.remove(s.rule_index);
                    for i in 0..c.len() {
                        if c.return_state(i) == EMPTY_RETURN_STATE {
                            continue;
                        }
                        self.look_impl(
                            c.return_state(i) as usize,
                            stop_state,
                            c.parent(i).cloned(),
                            look,
                            busy,
                            called_rule_stack,
                            add_eof,
                        );
                    }
                    if removed {
                        called_rule_stack.insert(s.rule_index);
                    }
                    return;
                }
            }
        }

        for transition in &s.transitions {
            match transition {
                Transition::Rule {
                    target,
                    rule_index,
                    follow_state,
                    ..
                } => {
                    if called_rule_stack.contains(*rule_index) {
                        continue;
                    }
                    let new_ctx = Some(PredictionContext::singleton_opt(
                        ctx.clone(),
                        *follow_state as i32,
                    ));
                    called_rule_stack.insert(*rule_index);
                    self.look_impl(
                        *target,
                        stop_state,
                        new_ctx,
                        look,
                        busy,
                        called_rule_stack,
                        add_eof,
                    );
                    called_rule_stack.remove(*rule_index);
                }
                Transition::Predicate { target, .. } | Transition::Precedence { target, .. } => {
                    self.look_impl(
                        *target,
                        stop_state,
                        ctx.clone(),
                        look,
                        busy,
                        called_rule_stack,
                        add_eof,
                    );
                }
                Transition::Epsilon { target, .. } | Transition::Action { target, .. } => {
                    self.look_impl(
                        *target,
                        stop_state,
                        ctx.clone(),
                        look,
                        busy,
                        called_rule_stack,
                        add_eof,
                    );
                }
                Transition::Wildcard { .. } => {
                    look.add_range(MIN_USER_TOKEN_TYPE, self.max_token_type);
                }
                Transition::NotSet { set, .. } => {
                    look.add_set(&set.complement(MIN_USER_TOKEN_TYPE, self.max_token_type));
                }
                other => {
                    if let Some(set) = other.label() {
                        look.add_set(&set);
                    }
                }
            }
        }
    }
}
