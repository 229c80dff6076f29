use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One lexer command recorded while simulating a rule.
///
/// The `Indexed` form pins a position-dependent action to the code point
/// offset (relative to the token start) it was collected at, so replay can
/// seek there before executing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LexerAction {
    Channel(usize),
    Custom {
        rule_index: usize,
        action_index: usize,
    },
    Mode(usize),
    More,
    PopMode,
    PushMode(usize),
    Skip,
    Type(i32),
    Indexed {
        offset: usize,
        action: Box<LexerAction>,
    },
}

impl LexerAction {
    /// Whether the action's effect depends on the offset it executes at.
    /// Mode, channel and type changes do not; custom code does.
    pub fn is_position_dependent(&self) -> bool {
        matches!(
            self,
            LexerAction::Custom { .. } | LexerAction::Indexed { .. }
        )
    }
}

/// The deduplicated sequence of lexer commands attached to an accepting
/// configuration, replayed once the longest match is committed.
#[derive(Debug, Clone)]
pub struct LexerActionExecutor {
    actions: Vec<LexerAction>,
    cached_hash: u64,
}

impl LexerActionExecutor {
    pub fn new(actions: Vec<LexerAction>) -> Arc<Self> {
        let mut hasher = DefaultHasher::new();
        actions.hash(&mut hasher);
        Arc::new(Self {
            cached_hash: hasher.finish(),
            actions,
        })
    }

    /// Extend `existing` (possibly absent) with one more action.
    pub fn append(existing: Option<&Arc<Self>>, action: LexerAction) -> Arc<Self> {
        let mut actions = existing.map(|e| e.actions.clone()).unwrap_or_default();
        actions.push(action);
        Self::new(actions)
    }

    /// Pin every unpinned position-dependent action to `offset`. Returns the
    /// receiver unchanged when there is nothing to pin.
    pub fn fix_offset_before_match(self: &Arc<Self>, offset: usize) -> Arc<Self> {
        let mut changed = false;
        let actions: Vec<LexerAction> = self
            .actions
            .iter()
            .map(|action| {
                if action.is_position_dependent() && !matches!(action, LexerAction::Indexed { .. })
                {
                    changed = true;
                    LexerAction::Indexed {
                        offset,
                        action: Box::new(action.clone()),
                    }
                } else {
                    action.clone()
                }
            })
            .collect();
        if changed {
            Self::new(actions)
        } else {
            self.clone()
        }
    }

    pub fn actions(&self) -> &[LexerAction] {
        &self.actions
    }
}

impl PartialEq for LexerActionExecutor {
    fn eq(&self, other: &Self) -> bool {
        self.cached_hash == other.cached_hash && self.actions == other.actions
    }
}

impl Eq for LexerActionExecutor {}

impl Hash for LexerActionExecutor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash);
    }
}
