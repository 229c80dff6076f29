use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::{Transition, ATN};
use crate::context::ParserRuleContext;

/// Sentinel return state marking the root of the call stack summary.
pub const EMPTY_RETURN_STATE: i32 = i32::MAX;

/// A shareable summary of parser call stacks.
///
/// A singleton node records one invocation frame (parent summary plus the
/// follow state to return to); an array node records several alternative
/// frames, kept sorted by return state. Nodes are immutable, hashed at
/// construction, and shared through `Arc`, so structurally equal summaries
/// compare cheaply and merges preserve sharing.
pub enum PredictionContext {
    Singleton {
        parent: Option<Arc<PredictionContext>>,
        return_state: i32,
        cached_hash: u64,
    },
    Array {
        /// Parallel to `return_states`; `None` only under the
        /// [`EMPTY_RETURN_STATE`] entry.
        parents: Vec<Option<Arc<PredictionContext>>>,
        return_states: Vec<i32>,
        cached_hash: u64,
    },
}

static EMPTY: Lazy<Arc<PredictionContext>> = Lazy::new(|| {
    Arc::new(PredictionContext::Singleton {
        parent: None,
        return_state: EMPTY_RETURN_STATE,
        cached_hash: hash_parts(&[None], &[EMPTY_RETURN_STATE]),
    })
});

fn hash_parts(parents: &[Option<Arc<PredictionContext>>], return_states: &[i32]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for parent in parents {
        match parent {
            Some(p) => p.cached_hash().hash(&mut hasher),
            None => 0u64.hash(&mut hasher),
        }
    }
    return_states.hash(&mut hasher);
    hasher.finish()
}

impl PredictionContext {
    /// The shared root summary: the caller is the outer world.
    pub fn empty() -> Arc<PredictionContext> {
        EMPTY.clone()
    }

    /// One invocation frame on top of `parent`.
    pub fn singleton(parent: Arc<PredictionContext>, return_state: i32) -> Arc<PredictionContext> {
        Self::singleton_opt(Some(parent), return_state)
    }

    /// Like [`singleton`](Self::singleton) but keeping a missing parent
    /// distinct from the empty summary; follow-set analysis walks such
    /// chains the way closures walk real ones.
    pub(crate) fn singleton_opt(
        parent: Option<Arc<PredictionContext>>,
        return_state: i32,
    ) -> Arc<PredictionContext> {
        if parent.is_none() && return_state == EMPTY_RETURN_STATE {
            return Self::empty();
        }
        Arc::new(PredictionContext::Singleton {
            cached_hash: hash_parts(std::slice::from_ref(&parent), &[return_state]),
            parent,
            return_state,
        })
    }

    fn array(
        parents: Vec<Option<Arc<PredictionContext>>>,
        return_states: Vec<i32>,
    ) -> Arc<PredictionContext> {
        debug_assert_eq!(parents.len(), return_states.len());
        debug_assert!(return_states.windows(2).all(|w| w[0] < w[1]));
        Arc::new(PredictionContext::Array {
            cached_hash: hash_parts(&parents, &return_states),
            parents,
            return_states,
        })
    }

    /// Summarize the live parse-time rule context chain. Each frame's
    /// invoking state contributes one singleton; the root contributes the
    /// empty summary.
    pub fn from_rule_context(atn: &ATN, ctx: Option<&Rc<ParserRuleContext>>) -> Arc<Self> {
        let ctx = match ctx {
            None => return Self::empty(),
            Some(c) => c,
        };
        let invoking_state = match ctx.invoking_state() {
            None => return Self::empty(),
            Some(s) => s,
        };
        let parent = Self::from_rule_context(atn, ctx.parent().as_ref());
        match atn.state(invoking_state).transitions.first() {
            Some(Transition::Rule { follow_state, .. }) => {
                Self::singleton(parent, *follow_state as i32)
            }
            _ => panic!(
                "invoking state {} has no rule transition",
                invoking_state
            ),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PredictionContext::Singleton { .. } => 1,
            PredictionContext::Array { return_states, .. } => return_states.len(),
        }
    }

    pub fn return_state(&self, index: usize) -> i32 {
        match self {
            PredictionContext::Singleton { return_state, .. } => {
                debug_assert_eq!(index, 0);
                *return_state
            }
            PredictionContext::Array { return_states, .. } => return_states[index],
        }
    }

    pub fn parent(&self, index: usize) -> Option<&Arc<PredictionContext>> {
        match self {
            PredictionContext::Singleton { parent, .. } => {
                debug_assert_eq!(index, 0);
                parent.as_ref()
            }
            PredictionContext::Array { parents, .. } => parents[index].as_ref(),
        }
    }

    /// A summary is empty iff its only frame is the root sentinel.
    pub fn is_empty(&self) -> bool {
        self.len() == 1 && self.return_state(0) == EMPTY_RETURN_STATE
    }

    /// Whether some path of the summary reaches the root. Return states are
    /// sorted, so only the last entry can be the sentinel.
    pub fn has_empty_path(&self) -> bool {
        self.return_state(self.len() - 1) == EMPTY_RETURN_STATE
    }

    pub fn cached_hash(&self) -> u64 {
        match self {
            PredictionContext::Singleton { cached_hash, .. }
            | PredictionContext::Array { cached_hash, .. } => *cached_hash,
        }
    }
}

impl PartialEq for PredictionContext {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.cached_hash() != other.cached_hash() {
            return false;
        }
        match (self, other) {
            (
                PredictionContext::Singleton {
                    parent: pa,
                    return_state: ra,
                    ..
                },
                PredictionContext::Singleton {
                    parent: pb,
                    return_state: rb,
                    ..
                },
            ) => ra == rb && option_arc_eq(pa, pb),
            (
                PredictionContext::Array {
                    parents: pa,
                    return_states: ra,
                    ..
                },
                PredictionContext::Array {
                    parents: pb,
                    return_states: rb,
                    ..
                },
            ) => {
                ra == rb
                    && pa.len() == pb.len()
                    && pa.iter().zip(pb.iter()).all(|(x, y)| option_arc_eq(x, y))
            }
            _ => false,
        }
    }
}

impl Eq for PredictionContext {}

impl Hash for PredictionContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash());
    }
}

fn option_arc_eq(
    a: &Option<Arc<PredictionContext>>,
    b: &Option<Arc<PredictionContext>>,
) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => Arc::ptr_eq(x, y) || **x == **y,
        _ => false,
    }
}

impl Debug for PredictionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionContext::Singleton {
                parent,
                return_state,
                ..
            } => {
                if *return_state == EMPTY_RETURN_STATE && parent.is_none() {
                    return write!(f, "$");
                }
                match parent {
                    Some(p) => write!(f, "{} {:?}", return_state, p),
                    None => write!(f, "{}", return_state),
                }
            }
            PredictionContext::Array { return_states, .. } => {
                write!(f, "[")?;
                for (index, rs) in return_states.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    if *rs == EMPTY_RETURN_STATE {
                        write!(f, "$")?;
                    } else {
                        write!(f, "{}", rs)?;
                    }
                }
                write!(f, "]")
            }
        }
    }
}

/// Merge results are memoized per prediction so repeated deep merges stay
/// tractable and share structure.
pub type MergeCache = HashMap<(u64, u64), Arc<PredictionContext>>;

fn cache_key(a: &Arc<PredictionContext>, b: &Arc<PredictionContext>) -> (u64, u64) {
    (Arc::as_ptr(a) as u64, Arc::as_ptr(b) as u64)
}

/// Merge two call stack summaries, preserving set semantics over
/// root-to-leaf paths.
///
/// `root_is_wildcard` is true during SLL simulation, where the empty summary
/// stands for "any caller" and absorbs the other operand; in full-context
/// mode the empty summary is a real frame and merging tracks it explicitly.
pub fn merge(
    a: &Arc<PredictionContext>,
    b: &Arc<PredictionContext>,
    root_is_wildcard: bool,
    cache: &mut MergeCache,
) -> Arc<PredictionContext> {
    if Arc::ptr_eq(a, b) || **a == **b {
        return a.clone();
    }
    let singletons = matches!(**a, PredictionContext::Singleton { .. })
        && matches!(**b, PredictionContext::Singleton { .. });
    if singletons {
        return merge_singletons(a, b, root_is_wildcard, cache);
    }
    if root_is_wildcard {
        if a.is_empty() {
            return a.clone();
        }
        if b.is_empty() {
            return b.clone();
        }
    }
    merge_arrays(a, b, root_is_wildcard, cache)
}

fn merge_singletons(
    a: &Arc<PredictionContext>,
    b: &Arc<PredictionContext>,
    root_is_wildcard: bool,
    cache: &mut MergeCache,
) -> Arc<PredictionContext> {
    if let Some(found) = cache.get(&cache_key(a, b)).or_else(|| cache.get(&cache_key(b, a))) {
        return found.clone();
    }
    if let Some(root) = merge_root(a, b, root_is_wildcard) {
        cache.insert(cache_key(a, b), root.clone());
        return root;
    }

    let (ra, rb) = (a.return_state(0), b.return_state(0));
    let result = if ra == rb {
        let pa = parent_or_empty(a.parent(0));
        let pb = parent_or_empty(b.parent(0));
        let parent = merge(&pa, &pb, root_is_wildcard, cache);
        if Arc::ptr_eq(&parent, &pa) {
            a.clone()
        } else if Arc::ptr_eq(&parent, &pb) {
            b.clone()
        } else {
            PredictionContext::singleton(parent, ra)
        }
    } else {
        let (first, second) = if ra < rb { (a, b) } else { (b, a) };
        PredictionContext::array(
            vec![first.parent(0).cloned(), second.parent(0).cloned()],
            vec![first.return_state(0), second.return_state(0)],
        )
    };
    cache.insert(cache_key(a, b), result.clone());
    result
}

/// Handle merges where one operand is the root summary.
fn merge_root(
    a: &Arc<PredictionContext>,
    b: &Arc<PredictionContext>,
    root_is_wildcard: bool,
) -> Option<Arc<PredictionContext>> {
    if root_is_wildcard {
        if a.is_empty() || b.is_empty() {
            return Some(PredictionContext::empty());
        }
        return None;
    }
    if a.is_empty() && b.is_empty() {
        return Some(PredictionContext::empty());
    }
    if a.is_empty() {
        return Some(PredictionContext::array(
            vec![b.parent(0).cloned(), None],
            vec![b.return_state(0), EMPTY_RETURN_STATE],
        ));
    }
    if b.is_empty() {
        return Some(PredictionContext::array(
            vec![a.parent(0).cloned(), None],
            vec![a.return_state(0), EMPTY_RETURN_STATE],
        ));
    }
    None
}

fn merge_arrays(
    a: &Arc<PredictionContext>,
    b: &Arc<PredictionContext>,
    root_is_wildcard: bool,
    cache: &mut MergeCache,
) -> Arc<PredictionContext> {
    if let Some(found) = cache.get(&cache_key(a, b)).or_else(|| cache.get(&cache_key(b, a))) {
        return found.clone();
    }

    let (mut i, mut j) = (0, 0);
    let mut merged_parents: Vec<Option<Arc<PredictionContext>>> = Vec::new();
    let mut merged_returns: Vec<i32> = Vec::new();

    while i < a.len() && j < b.len() {
        let (ra, rb) = (a.return_state(i), b.return_state(j));
        if ra == rb {
            let pa = a.parent(i);
            let pb = b.parent(j);
            let both_root = ra == EMPTY_RETURN_STATE && pa.is_none() && pb.is_none();
            let same_parent = match (pa, pb) {
                (Some(x), Some(y)) => Arc::ptr_eq(x, y) || **x == **y,
                _ => false,
            };
            if both_root || same_parent {
                merged_parents.push(pa.cloned());
            } else {
                let merged = merge(
                    &parent_or_empty(pa),
                    &parent_or_empty(pb),
                    root_is_wildcard,
                    cache,
                );
                merged_parents.push(Some(merged));
            }
            merged_returns.push(ra);
            i += 1;
            j += 1;
        } else if ra < rb {
            merged_parents.push(a.parent(i).cloned());
            merged_returns.push(ra);
            i += 1;
        } else {
            merged_parents.push(b.parent(j).cloned());
            merged_returns.push(rb);
            j += 1;
        }
    }
    while i < a.len() {
        merged_parents.push(a.parent(i).cloned());
        merged_returns.push(a.return_state(i));
        i += 1;
    }
    while j < b.len() {
        merged_parents.push(b.parent(j).cloned());
        merged_returns.push(b.return_state(j));
        j += 1;
    }

    let result = if merged_returns.len() == 1 {
        if merged_returns[0] == EMPTY_RETURN_STATE && merged_parents[0].is_none() {
            PredictionContext::empty()
        } else {
            PredictionContext::singleton(
                parent_or_empty(merged_parents[0].as_ref()),
                merged_returns[0],
            )
        }
    } else {
        let candidate = PredictionContext::array(merged_parents, merged_returns);
        if *candidate == **a {
            a.clone()
        } else if *candidate == **b {
            b.clone()
        } else {
            candidate
        }
    };
    cache.insert(cache_key(a, b), result.clone());
    result
}

fn parent_or_empty(parent: Option<&Arc<PredictionContext>>) -> Arc<PredictionContext> {
    parent.cloned().unwrap_or_else(PredictionContext::empty)
}

/// Value-keyed wrapper so summaries can index hash maps.
#[derive(Clone)]
pub struct CtxKey(pub Arc<PredictionContext>);

impl PartialEq for CtxKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}
impl Eq for CtxKey {}
impl Hash for CtxKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.cached_hash());
    }
}

/// A process-wide hash-cons pool shared by every recognizer of a grammar.
///
/// Entries are insert-only; `canonical` rebuilds a summary bottom-up out of
/// pooled nodes so structurally equal summaries collapse to one allocation.
pub struct PredictionContextCache {
    pool: Mutex<HashMap<CtxKey, Arc<PredictionContext>>>,
}

impl Default for PredictionContextCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionContextCache {
    pub fn new() -> Self {
        Self {
            pool: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.pool.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.lock().is_empty()
    }

    pub fn canonical(&self, context: &Arc<PredictionContext>) -> Arc<PredictionContext> {
        if context.is_empty() {
            return PredictionContext::empty();
        }
        let mut pool = self.pool.lock();
        Self::canonicalize(&mut pool, context)
    }

    fn canonicalize(
        pool: &mut HashMap<CtxKey, Arc<PredictionContext>>,
        context: &Arc<PredictionContext>,
    ) -> Arc<PredictionContext> {
        if let Some(found) = pool.get(&CtxKey(context.clone())) {
            return found.clone();
        }
        let rebuilt = match &**context {
            PredictionContext::Singleton {
                parent,
                return_state,
                ..
            } => match parent {
                Some(p) => {
                    let canon = Self::canonicalize(pool, p);
                    if Arc::ptr_eq(&canon, p) {
                        context.clone()
                    } else {
                        PredictionContext::singleton(canon, *return_state)
                    }
                }
                None => context.clone(),
            },
            PredictionContext::Array {
                parents,
                return_states,
                ..
            } => {
                let canon_parents: Vec<_> = parents
                    .iter()
                    .map(|p| p.as_ref().map(|p| Self::canonicalize(pool, p)))
                    .collect();
                let unchanged = canon_parents
                    .iter()
                    .zip(parents.iter())
                    .all(|(x, y)| match (x, y) {
                        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                        (None, None) => true,
                        _ => false,
                    });
                if unchanged {
                    context.clone()
                } else {
                    PredictionContext::array(canon_parents, return_states.clone())
                }
            }
        };
        pool.insert(CtxKey(rebuilt.clone()), rebuilt.clone());
        rebuilt
    }
}
