use std::collections::HashMap;

use bit_set::BitSet;

use super::prediction_context::CtxKey;
use super::{ATNConfigSet, SemanticContext, ATN};
use crate::dfa::INVALID_ALT;

/// How much context the parser simulator may use and how precisely it
/// reports ambiguities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMode {
    /// Strong-LL only: conflicts resolve to the minimum alternative without
    /// a full-context retry.
    Sll,
    /// SLL first, full-context on conflict; the default.
    Ll,
    /// Like `Ll`, but keeps simulating until ambiguities are exact.
    LlExactAmbigDetection,
}

/// Whether an SLL conflict in `configs` terminates prediction for `mode`.
///
/// Pure-SLL screening strips semantic contexts first so predicated
/// alternatives do not mask a conflict the full-context pass would have to
/// resolve.
pub(super) fn has_sll_conflict_terminating_prediction(
    mode: PredictionMode,
    configs: &ATNConfigSet,
    atn: &ATN,
) -> bool {
    if all_configs_in_rule_stop_states(configs, atn) {
        return true;
    }

    let stripped;
    let configs = if mode == PredictionMode::Sll && configs.has_semantic_context {
        let mut dup = ATNConfigSet::new(configs.full_ctx);
        let mut merge_cache = HashMap::new();
        for config in configs.configs() {
            let mut config = config.clone();
            config.semantic_context = SemanticContext::none();
            dup.add(config, &mut merge_cache);
        }
        stripped = dup;
        &stripped
    } else {
        configs
    };

    let altsets = get_conflicting_alt_subsets(configs);
    has_conflicting_alt_set(&altsets) && !has_state_associated_with_one_alt(configs)
}

pub(super) fn has_config_in_rule_stop_state(configs: &ATNConfigSet, atn: &ATN) -> bool {
    configs
        .configs()
        .iter()
        .any(|c| atn.states[c.state].is_rule_stop())
}

pub(super) fn all_configs_in_rule_stop_states(configs: &ATNConfigSet, atn: &ATN) -> bool {
    configs
        .configs()
        .iter()
        .all(|c| atn.states[c.state].is_rule_stop())
}

/// Group the alternatives of the set by (state, context) pair. Two
/// alternatives in one group mean the configurations cannot be told apart
/// without more lookahead or more context.
pub(super) fn get_conflicting_alt_subsets(configs: &ATNConfigSet) -> Vec<BitSet> {
    let mut map: HashMap<(usize, CtxKey), BitSet> = HashMap::new();
    let mut order: Vec<(usize, CtxKey)> = Vec::new();
    for config in configs.configs() {
        let key = (config.state, CtxKey(config.context.clone()));
        let entry = map.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            BitSet::new()
        });
        entry.insert(config.alt);
    }
    order
        .into_iter()
        .map(|key| map.remove(&key).unwrap_or_default())
        .collect()
}

fn get_state_to_alt_map(configs: &ATNConfigSet) -> HashMap<usize, BitSet> {
    let mut map: HashMap<usize, BitSet> = HashMap::new();
    for config in configs.configs() {
        map.entry(config.state).or_default().insert(config.alt);
    }
    map
}

fn has_state_associated_with_one_alt(configs: &ATNConfigSet) -> bool {
    get_state_to_alt_map(configs)
        .values()
        .any(|alts| alts.len() == 1)
}

fn has_conflicting_alt_set(altsets: &[BitSet]) -> bool {
    altsets.iter().any(|alts| alts.len() > 1)
}

pub(super) fn all_subsets_conflict(altsets: &[BitSet]) -> bool {
    !altsets.iter().any(|alts| alts.len() == 1)
}

pub(super) fn all_subsets_equal(altsets: &[BitSet]) -> bool {
    match altsets.split_first() {
        None => true,
        Some((first, rest)) => rest.iter().all(|alts| alts == first),
    }
}

/// The union of every group's alternatives.
pub(super) fn get_alts(altsets: &[BitSet]) -> BitSet {
    let mut union = BitSet::new();
    for alts in altsets {
        union.union_with(alts);
    }
    union
}

/// If every group resolves to the same minimum alternative, prediction can
/// stop with it; otherwise more lookahead is needed.
pub(super) fn resolves_to_just_one_viable_alt(altsets: &[BitSet]) -> usize {
    let mut viable = BitSet::new();
    for alts in altsets {
        let min = match alts.iter().next() {
            Some(alt) => alt,
            None => continue,
        };
        viable.insert(min);
        if viable.len() > 1 {
            return INVALID_ALT;
        }
    }
    viable.iter().next().unwrap_or(INVALID_ALT)
}

pub(super) fn min_alt(alts: &BitSet) -> usize {
    alts.iter().next().unwrap_or(INVALID_ALT)
}
