//! The grammar transition network and the machinery which simulates it.
//!
//! The network is produced by an offline tool, serialized, and rebuilt here
//! by the [deserializer](ATNDeserializer). States live in an arena owned by
//! the [`ATN`] and refer to each other through stable integer indices, so
//! the cyclic graph needs no owning references.

mod config;
mod config_set;
mod deserializer;
mod lexer_action;
mod lexer_simulator;
mod look;
mod parser_simulator;
mod prediction_context;
mod prediction_mode;
mod semantic_context;
mod state;

#[cfg(test)]
mod __tests__;

pub(crate) use deserializer::finalize_atn;

pub use config::ATNConfig;
pub use config_set::ATNConfigSet;
pub use deserializer::{ATNDataError, ATNDeserializer, SERIALIZED_UUID, SERIALIZED_VERSION};
pub use lexer_action::{LexerAction, LexerActionExecutor};
pub use lexer_simulator::{LexerATNSimulator, MatchOutcome, LEXER_MORE, LEXER_SKIP};
pub use parser_simulator::{ParserATNSimulator, PredictionEnv};
pub use prediction_context::{
    merge, MergeCache, PredictionContext, PredictionContextCache, EMPTY_RETURN_STATE,
};
pub use prediction_mode::PredictionMode;
pub use semantic_context::{DefaultPredicateEvaluator, IPredicateEvaluator, SemanticContext};

use once_cell::sync::OnceCell;

use crate::interval::IntervalSet;

/// Whether the network was compiled from a lexer or a parser grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarType {
    Lexer,
    Parser,
}

/// Discriminator for the node kinds of the transition network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ATNStateKind {
    Basic,
    RuleStart,
    RuleStop,
    BlockStart,
    PlusBlockStart,
    StarBlockStart,
    TokenStart,
    BlockEnd,
    StarLoopBack,
    StarLoopEntry,
    PlusLoopBack,
    LoopEnd,
}

/// One node of the transition network.
///
/// The per-kind references (`block_end`, `loop_back`) and flags are only
/// populated for the kinds which carry them; everything is immutable once
/// deserialization finishes.
pub struct ATNState {
    pub state_number: usize,
    pub kind: ATNStateKind,
    pub rule_index: usize,
    pub epsilon_only_transitions: bool,
    /// Decision index for states the parser predicts at; such states have at
    /// least two outgoing transitions.
    pub decision: Option<usize>,
    pub non_greedy: bool,
    /// Star-loop entries of a left-recursive rule carry this flag; the
    /// simulator applies the precedence filter there.
    pub is_precedence_decision: bool,
    /// Rule-start states of left-recursive rules.
    pub is_left_recursive: bool,
    /// Block-start kinds: the matching block end.
    pub block_end: Option<usize>,
    /// Loop ends and star-loop entries: the loop-back state.
    pub loop_back: Option<usize>,
    pub transitions: Vec<Transition>,
    pub(crate) next_tokens_cache: OnceCell<IntervalSet>,
}

/// One edge of the transition network.
///
/// `Epsilon`, `Rule`, `Predicate`, `Precedence` and `Action` are
/// non-consuming; the rest match exactly one input symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Epsilon {
        target: usize,
        /// Set on the follow edges of a left-recursive rule's stop state:
        /// the rule whose outermost invocation is being returned from. The
        /// precedence filter keeps configurations crossing such an edge.
        outermost_precedence_return: Option<usize>,
    },
    Atom {
        target: usize,
        label: i32,
    },
    Range {
        target: usize,
        lo: i32,
        hi: i32,
    },
    Set {
        target: usize,
        set: IntervalSet,
    },
    NotSet {
        target: usize,
        set: IntervalSet,
    },
    Wildcard {
        target: usize,
    },
    Rule {
        /// The invoked rule's start state.
        target: usize,
        rule_index: usize,
        precedence: i32,
        /// Where recognition continues after the invoked rule returns.
        follow_state: usize,
    },
    Predicate {
        target: usize,
        rule_index: usize,
        pred_index: usize,
        is_ctx_dependent: bool,
    },
    Precedence {
        target: usize,
        precedence: i32,
    },
    Action {
        target: usize,
        rule_index: usize,
        action_index: usize,
        is_ctx_dependent: bool,
    },
}

/// The immutable transition network of one grammar.
#[derive(Debug)]
pub struct ATN {
    pub grammar_type: GrammarType,
    pub max_token_type: i32,
    pub states: Vec<ATNState>,
    /// Decision index to decision state, as numbered by the tool.
    pub decision_to_state: Vec<usize>,
    pub rule_to_start_state: Vec<usize>,
    pub rule_to_stop_state: Vec<usize>,
    /// For lexer grammars, the token type each rule emits by default.
    pub rule_to_token_type: Vec<i32>,
    pub lexer_actions: Vec<LexerAction>,
    /// For lexer grammars, the token-start state of each mode.
    pub mode_to_start_state: Vec<usize>,
}

impl ATN {
    pub fn state(&self, index: usize) -> &ATNState {
        &self.states[index]
    }

    pub fn decision_state(&self, decision: usize) -> usize {
        self.decision_to_state[decision]
    }

    pub fn rule_count(&self) -> usize {
        self.rule_to_start_state.len()
    }
}
