use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use bit_set::BitSet;

use super::prediction_context::{merge, MergeCache};
use super::ATNConfig;
use crate::dfa::INVALID_ALT;

/// A set of [`ATNConfig`] with list + hash hybrid storage.
///
/// `configs` preserves insertion order for deterministic iteration; `lookup`
/// is the dedup index. The parser flavor keys dedup on
/// (state, alt, semantic context) and merges call stack summaries on
/// collision; the lexer flavor (`ordered`) keys on full configuration
/// identity and never merges. Once frozen the set is shared inside a DFA
/// state and any mutation is an invariant violation.
pub struct ATNConfigSet {
    configs: Vec<ATNConfig>,
    lookup: HashMap<u64, Vec<usize>>,
    pub full_ctx: bool,
    ordered: bool,
    pub unique_alt: usize,
    pub conflicting_alts: Option<BitSet>,
    pub has_semantic_context: bool,
    pub dips_into_outer_context: bool,
    read_only: bool,
}

impl ATNConfigSet {
    pub fn new(full_ctx: bool) -> Self {
        Self {
            configs: Vec::new(),
            lookup: HashMap::new(),
            full_ctx,
            ordered: false,
            unique_alt: INVALID_ALT,
            conflicting_alts: None,
            has_semantic_context: false,
            dips_into_outer_context: false,
            read_only: false,
        }
    }

    /// The lexer flavor: full-identity dedup, no context merging.
    pub fn ordered() -> Self {
        let mut set = Self::new(false);
        set.ordered = true;
        set
    }

    fn dedup_hash(&self, config: &ATNConfig) -> u64 {
        let mut hasher = DefaultHasher::new();
        if self.ordered {
            config.hash(&mut hasher);
        } else {
            config.state.hash(&mut hasher);
            config.alt.hash(&mut hasher);
            config.semantic_context.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn dedup_matches(&self, a: &ATNConfig, b: &ATNConfig) -> bool {
        if self.ordered {
            a == b
        } else {
            a.state == b.state
                && a.alt == b.alt
                && *a.semantic_context == *b.semantic_context
        }
    }

    /// Add a configuration, merging it into an existing entry when the dedup
    /// key collides. Returns whether the set changed.
    pub fn add(&mut self, config: ATNConfig, merge_cache: &mut MergeCache) -> bool {
        if self.read_only {
            panic!("cannot add a configuration to a frozen set");
        }
        if !config.semantic_context.is_none() {
            self.has_semantic_context = true;
        }
        if config.reaches_into_outer_context > 0 {
            self.dips_into_outer_context = true;
        }

        let key = self.dedup_hash(&config);
        if let Some(candidates) = self.lookup.get(&key) {
            for &index in candidates {
                if self.dedup_matches(&self.configs[index], &config) {
                    if self.ordered {
                        return false;
                    }
                    let existing = &mut self.configs[index];
                    let root_is_wildcard = !self.full_ctx;
                    let merged = merge(
                        &existing.context,
                        &config.context,
                        root_is_wildcard,
                        merge_cache,
                    );
                    existing.reaches_into_outer_context = std::cmp::max(
                        existing.reaches_into_outer_context,
                        config.reaches_into_outer_context,
                    );
                    existing.precedence_filter_suppressed |= config.precedence_filter_suppressed;
                    existing.context = merged;
                    return true;
                }
            }
        }
        let index = self.configs.len();
        self.lookup.entry(key).or_default().push(index);
        self.configs.push(config);
        true
    }

    pub fn configs(&self) -> &[ATNConfig] {
        &self.configs
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// The distinct alternatives present in the set.
    pub fn get_alts(&self) -> BitSet {
        let mut alts = BitSet::new();
        for config in &self.configs {
            alts.insert(config.alt);
        }
        alts
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Freeze the set before it is shared inside a DFA state.
    pub fn freeze(&mut self) {
        self.read_only = true;
    }
}

impl PartialEq for ATNConfigSet {
    fn eq(&self, other: &Self) -> bool {
        self.full_ctx == other.full_ctx && self.configs == other.configs
    }
}

impl Eq for ATNConfigSet {}

impl Hash for ATNConfigSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for config in &self.configs {
            config.hash(state);
        }
    }
}

impl std::fmt::Debug for ATNConfigSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.configs.iter()).finish()
    }
}
