use std::sync::Arc;

use crate::atn::{
    finalize_atn, ATNState, ATNStateKind, GrammarType, LexerAction, Transition, ATN,
};
use crate::interval::IntervalSet;

/// Assembles a transition network in memory, mirroring what the
/// deserializer produces from a tool-emitted blob.
pub(crate) struct GrammarBuilder {
    atn: ATN,
}

impl GrammarBuilder {
    pub fn new(grammar_type: GrammarType, max_token_type: i32) -> Self {
        Self {
            atn: ATN {
                grammar_type,
                max_token_type,
                states: Vec::new(),
                decision_to_state: Vec::new(),
                rule_to_start_state: Vec::new(),
                rule_to_stop_state: Vec::new(),
                rule_to_token_type: Vec::new(),
                lexer_actions: Vec::new(),
                mode_to_start_state: Vec::new(),
            },
        }
    }

    pub fn state(&mut self, kind: ATNStateKind, rule: usize) -> usize {
        let number = self.atn.states.len();
        self.atn.states.push(ATNState::new(number, kind, rule));
        number
    }

    pub fn left_recursive(&mut self, rule_start: usize) {
        self.atn.states[rule_start].is_left_recursive = true;
    }

    pub fn block_end(&mut self, block_start: usize, end: usize) {
        self.atn.states[block_start].block_end = Some(end);
    }

    pub fn loop_back(&mut self, state: usize, loop_back: usize) {
        self.atn.states[state].loop_back = Some(loop_back);
    }

    pub fn epsilon(&mut self, from: usize, to: usize) {
        self.atn.states[from].add_transition(Transition::Epsilon {
            target: to,
            outermost_precedence_return: None,
        });
    }

    pub fn atom(&mut self, from: usize, to: usize, label: i32) {
        self.atn.states[from].add_transition(Transition::Atom { target: to, label });
    }

    pub fn range(&mut self, from: usize, to: usize, lo: i32, hi: i32) {
        self.atn.states[from].add_transition(Transition::Range { target: to, lo, hi });
    }

    pub fn set(&mut self, from: usize, to: usize, set: IntervalSet) {
        self.atn.states[from].add_transition(Transition::Set { target: to, set });
    }

    pub fn rule_call(
        &mut self,
        from: usize,
        rule_start: usize,
        rule_index: usize,
        precedence: i32,
        follow_state: usize,
    ) {
        self.atn.states[from].add_transition(Transition::Rule {
            target: rule_start,
            rule_index,
            precedence,
            follow_state,
        });
    }

    pub fn precedence(&mut self, from: usize, to: usize, precedence: i32) {
        self.atn.states[from].add_transition(Transition::Precedence {
            target: to,
            precedence,
        });
    }

    pub fn action(&mut self, from: usize, to: usize, rule_index: usize, action_index: usize) {
        self.atn.states[from].add_transition(Transition::Action {
            target: to,
            rule_index,
            action_index,
            is_ctx_dependent: false,
        });
    }

    pub fn rule(&mut self, start: usize, token_type: i32) -> usize {
        self.atn.rule_to_start_state.push(start);
        self.atn.rule_to_token_type.push(token_type);
        self.atn.rule_to_start_state.len() - 1
    }

    pub fn mode(&mut self, token_start: usize) {
        self.atn.mode_to_start_state.push(token_start);
    }

    pub fn decision(&mut self, state: usize) -> usize {
        let decision = self.atn.decision_to_state.len();
        self.atn.states[state].decision = Some(decision);
        self.atn.decision_to_state.push(state);
        decision
    }

    pub fn lexer_action(&mut self, action: LexerAction) -> usize {
        self.atn.lexer_actions.push(action);
        self.atn.lexer_actions.len() - 1
    }

    pub fn build(mut self) -> Arc<ATN> {
        if let Err(error) = finalize_atn(&mut self.atn) {
            panic!("malformed demo grammar: {}", error);
        }
        Arc::new(self.atn)
    }
}
