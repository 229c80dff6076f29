use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::atn::{ATNConfigSet, LexerActionExecutor, SemanticContext};

/// Alternative number meaning "not decided"; real alternatives are 1 based.
pub const INVALID_ALT: usize = 0;

/// A predicate guarding one alternative of a predicated accept state.
#[derive(Debug, Clone)]
pub struct PredPrediction {
    pub pred: Arc<SemanticContext>,
    pub alt: usize,
}

/// Target of a memoized DFA edge. The error edge remembers that a symbol has
/// no viable continuation so the failure is also a cache hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DFAEdge {
    Error,
    State(usize),
}

/// One memoized prediction state: a frozen configuration set plus the
/// decision bookkeeping derived from it.
pub struct DFAState {
    pub configs: Arc<ATNConfigSet>,
    /// Lazily grown; index is `symbol + 1`, slot 0 is the EOF edge.
    pub edges: Vec<Option<DFAEdge>>,
    pub is_accept_state: bool,
    pub prediction: usize,
    pub requires_full_context: bool,
    pub predicates: Option<Vec<PredPrediction>>,
    pub lexer_executor: Option<Arc<LexerActionExecutor>>,
}

impl DFAState {
    pub fn new(configs: Arc<ATNConfigSet>) -> Self {
        Self {
            configs,
            edges: Vec::new(),
            is_accept_state: false,
            prediction: INVALID_ALT,
            requires_full_context: false,
            predicates: None,
            lexer_executor: None,
        }
    }
}

/// Cheap copy of the decision bookkeeping of a state, readable without
/// holding the store lock across simulation steps.
#[derive(Clone)]
pub struct DFAStateInfo {
    pub id: usize,
    pub is_accept_state: bool,
    pub prediction: usize,
    pub requires_full_context: bool,
    pub predicates: Option<Vec<PredPrediction>>,
    pub lexer_executor: Option<Arc<LexerActionExecutor>>,
    pub configs: Arc<ATNConfigSet>,
}

struct DFAStore {
    states: Vec<DFAState>,
    index: HashMap<u64, Vec<usize>>,
    s0: Option<usize>,
    /// For precedence decisions: one start state per precedence value.
    precedence_s0: Vec<Option<usize>>,
}

/// The per-decision memoization cache.
///
/// States accumulate monotonically for the lifetime of the grammar's shared
/// caches; the only mutations are edge installs and state additions, both
/// serialized by the store lock. Readers take short read locks and tolerate
/// stale views, since any published state is valid.
pub struct DFA {
    pub decision: usize,
    pub atn_start_state: usize,
    precedence_dfa: bool,
    store: RwLock<DFAStore>,
}

impl DFA {
    pub fn new(decision: usize, atn_start_state: usize, precedence_dfa: bool) -> Self {
        Self {
            decision,
            atn_start_state,
            precedence_dfa,
            store: RwLock::new(DFAStore {
                states: Vec::new(),
                index: HashMap::new(),
                s0: None,
                precedence_s0: Vec::new(),
            }),
        }
    }

    pub fn is_precedence_dfa(&self) -> bool {
        self.precedence_dfa
    }

    /// Add a state, reusing an existing one with a structurally equal
    /// configuration set. Returns the state's index.
    pub fn add_state(&self, state: DFAState) -> usize {
        debug_assert!(state.configs.is_read_only(), "DFA states hold frozen sets");
        let key = configs_hash(&state.configs);
        let mut store = self.store.write();
        if let Some(candidates) = store.index.get(&key) {
            for &existing in candidates {
                if *store.states[existing].configs == *state.configs {
                    return existing;
                }
            }
        }
        let id = store.states.len();
        store.states.push(state);
        store.index.entry(key).or_default().push(id);
        id
    }

    pub fn state_count(&self) -> usize {
        self.store.read().states.len()
    }

    pub fn state_info(&self, id: usize) -> DFAStateInfo {
        let store = self.store.read();
        let state = &store.states[id];
        DFAStateInfo {
            id,
            is_accept_state: state.is_accept_state,
            prediction: state.prediction,
            requires_full_context: state.requires_full_context,
            predicates: state.predicates.clone(),
            lexer_executor: state.lexer_executor.clone(),
            configs: state.configs.clone(),
        }
    }

    pub fn edge(&self, from: usize, symbol: i32) -> Option<DFAEdge> {
        debug_assert!(symbol >= -1);
        let store = self.store.read();
        let slot = (symbol + 1) as usize;
        store.states[from].edges.get(slot).copied().flatten()
    }

    pub fn set_edge(&self, from: usize, symbol: i32, target: DFAEdge) {
        debug_assert!(symbol >= -1);
        let mut store = self.store.write();
        let slot = (symbol + 1) as usize;
        let edges = &mut store.states[from].edges;
        if edges.len() <= slot {
            edges.resize(slot + 1, None);
        }
        edges[slot] = Some(target);
    }

    pub fn s0(&self) -> Option<usize> {
        self.store.read().s0
    }

    pub fn set_s0(&self, id: usize) {
        self.store.write().s0 = Some(id);
    }

    pub fn precedence_start_state(&self, precedence: i32) -> Option<usize> {
        if !self.precedence_dfa {
            panic!("only precedence DFAs keep start states per precedence");
        }
        if precedence < 0 {
            return None;
        }
        let store = self.store.read();
        store
            .precedence_s0
            .get(precedence as usize)
            .copied()
            .flatten()
    }

    pub fn set_precedence_start_state(&self, precedence: i32, id: usize) {
        if !self.precedence_dfa {
            panic!("only precedence DFAs keep start states per precedence");
        }
        if precedence < 0 {
            return;
        }
        let mut store = self.store.write();
        let slot = precedence as usize;
        if store.precedence_s0.len() <= slot {
            store.precedence_s0.resize(slot + 1, None);
        }
        store.precedence_s0[slot] = Some(id);
    }
}

fn configs_hash(configs: &ATNConfigSet) -> u64 {
    let mut hasher = DefaultHasher::new();
    configs.hash(&mut hasher);
    hasher.finish()
}
