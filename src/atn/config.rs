use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::lexer_action::LexerActionExecutor;
use super::prediction_context::PredictionContext;
use super::semantic_context::SemanticContext;

/// One thread of an in-progress simulation: an ATN state, the alternative
/// being tried, a call stack summary, and the predicate formula collected on
/// the way here.
///
/// `reaches_into_outer_context` counts how far the closure escaped past the
/// seed context; set membership deliberately ignores it, merging such
/// configurations and keeping the maximum. The lexer adds the pending action
/// executor and the non-greedy marker.
#[derive(Clone)]
pub struct ATNConfig {
    pub state: usize,
    pub alt: usize,
    pub context: Arc<PredictionContext>,
    pub semantic_context: Arc<SemanticContext>,
    pub reaches_into_outer_context: u32,
    pub precedence_filter_suppressed: bool,
    pub lexer_executor: Option<Arc<LexerActionExecutor>>,
    pub passed_through_non_greedy: bool,
}

impl ATNConfig {
    pub fn new(state: usize, alt: usize, context: Arc<PredictionContext>) -> Self {
        Self {
            state,
            alt,
            context,
            semantic_context: SemanticContext::none(),
            reaches_into_outer_context: 0,
            precedence_filter_suppressed: false,
            lexer_executor: None,
            passed_through_non_greedy: false,
        }
    }

    pub fn with_semantic(
        state: usize,
        alt: usize,
        context: Arc<PredictionContext>,
        semantic_context: Arc<SemanticContext>,
    ) -> Self {
        let mut config = Self::new(state, alt, context);
        config.semantic_context = semantic_context;
        config
    }

    /// The same thread moved to another state.
    pub fn to_state(&self, state: usize) -> Self {
        let mut config = self.clone();
        config.state = state;
        config
    }

    pub fn to_state_with_context(&self, state: usize, context: Arc<PredictionContext>) -> Self {
        let mut config = self.to_state(state);
        config.context = context;
        config
    }

    pub fn to_state_with_semantic(
        &self,
        state: usize,
        semantic_context: Arc<SemanticContext>,
    ) -> Self {
        let mut config = self.to_state(state);
        config.semantic_context = semantic_context;
        config
    }

    pub fn to_state_with_executor(
        &self,
        state: usize,
        lexer_executor: Option<Arc<LexerActionExecutor>>,
    ) -> Self {
        let mut config = self.to_state(state);
        config.lexer_executor = lexer_executor;
        config
    }
}

impl PartialEq for ATNConfig {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
            && self.alt == other.alt
            && self.precedence_filter_suppressed == other.precedence_filter_suppressed
            && self.passed_through_non_greedy == other.passed_through_non_greedy
            && *self.semantic_context == *other.semantic_context
            && executor_eq(&self.lexer_executor, &other.lexer_executor)
            && *self.context == *other.context
    }
}

impl Eq for ATNConfig {}

impl Hash for ATNConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.hash(state);
        self.alt.hash(state);
        state.write_u64(self.context.cached_hash());
        self.semantic_context.hash(state);
        self.passed_through_non_greedy.hash(state);
        if let Some(executor) = &self.lexer_executor {
            executor.hash(state);
        }
    }
}

fn executor_eq(
    a: &Option<Arc<LexerActionExecutor>>,
    b: &Option<Arc<LexerActionExecutor>>,
) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => Arc::ptr_eq(x, y) || **x == **y,
        _ => false,
    }
}

impl std::fmt::Debug for ATNConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{:?}", self.state, self.alt, self.context)?;
        if !self.semantic_context.is_none() {
            write!(f, ",{:?}", self.semantic_context)?;
        }
        if self.reaches_into_outer_context > 0 {
            write!(f, ",up={}", self.reaches_into_outer_context)?;
        }
        write!(f, ")")
    }
}
