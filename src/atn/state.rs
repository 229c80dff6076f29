use once_cell::sync::OnceCell;

use super::{ATNState, ATNStateKind, Transition};
use crate::interval::IntervalSet;

impl ATNState {
    pub fn new(state_number: usize, kind: ATNStateKind, rule_index: usize) -> Self {
        Self {
            state_number,
            kind,
            rule_index,
            epsilon_only_transitions: false,
            decision: None,
            non_greedy: false,
            is_precedence_decision: false,
            is_left_recursive: false,
            block_end: None,
            loop_back: None,
            transitions: Vec::new(),
            next_tokens_cache: OnceCell::new(),
        }
    }

    pub fn add_transition(&mut self, transition: Transition) {
        if self.transitions.is_empty() {
            self.epsilon_only_transitions = transition.is_epsilon();
        } else if !transition.is_epsilon() {
            self.epsilon_only_transitions = false;
        }
        self.transitions.push(transition);
    }

    pub fn is_rule_stop(&self) -> bool {
        self.kind == ATNStateKind::RuleStop
    }

    pub fn is_decision(&self) -> bool {
        self.decision.is_some()
    }
}

impl std::fmt::Debug for ATNState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ATNState")
            .field("state_number", &self.state_number)
            .field("kind", &self.kind)
            .field("rule_index", &self.rule_index)
            .field("transitions", &self.transitions.len())
            .finish()
    }
}

impl Transition {
    pub fn target(&self) -> usize {
        match *self {
            Transition::Epsilon { target, .. }
            | Transition::Atom { target, .. }
            | Transition::Range { target, .. }
            | Transition::Set { target, .. }
            | Transition::NotSet { target, .. }
            | Transition::Wildcard { target }
            | Transition::Rule { target, .. }
            | Transition::Predicate { target, .. }
            | Transition::Precedence { target, .. }
            | Transition::Action { target, .. } => target,
        }
    }

    /// Non-consuming edges followed during closure computation.
    pub fn is_epsilon(&self) -> bool {
        matches!(
            self,
            Transition::Epsilon { .. }
                | Transition::Rule { .. }
                | Transition::Predicate { .. }
                | Transition::Precedence { .. }
                | Transition::Action { .. }
        )
    }

    /// Whether the edge matches `symbol`, with the wildcard and negated-set
    /// forms bounded by the `[min, max]` symbol universe.
    pub fn matches(&self, symbol: i32, min: i32, max: i32) -> bool {
        match self {
            Transition::Atom { label, .. } => *label == symbol,
            Transition::Range { lo, hi, .. } => symbol >= *lo && symbol <= *hi,
            Transition::Set { set, .. } => set.contains(symbol),
            Transition::NotSet { set, .. } => {
                symbol >= min && symbol <= max && !set.contains(symbol)
            }
            Transition::Wildcard { .. } => symbol >= min && symbol <= max,
            _ => false,
        }
    }

    /// The positive symbol set of a consuming edge; `NotSet` reports the set
    /// it negates, callers complement it against their universe.
    pub fn label(&self) -> Option<IntervalSet> {
        match self {
            Transition::Atom { label, .. } => Some(IntervalSet::of_one(*label)),
            Transition::Range { lo, hi, .. } => Some(IntervalSet::of(*lo, *hi)),
            Transition::Set { set, .. } | Transition::NotSet { set, .. } => Some(set.clone()),
            _ => None,
        }
    }
}
