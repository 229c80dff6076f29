use std::sync::Arc;

use super::prediction_context::{merge, MergeCache};
use super::{ATNConfig, ATNConfigSet, PredictionContext, PredictionContextCache, SemanticContext};
use crate::examples::branches;
use crate::token::TOKEN_EPSILON;

fn frame(return_state: i32) -> Arc<PredictionContext> {
    PredictionContext::singleton(PredictionContext::empty(), return_state)
}

#[test]
fn merging_identical_summaries_returns_the_input() {
    let a = frame(7);
    let mut cache = MergeCache::new();
    let merged = merge(&a, &a.clone(), true, &mut cache);
    assert!(Arc::ptr_eq(&merged, &a));
}

#[test]
fn the_empty_summary_absorbs_under_wildcard_root() {
    let a = frame(7);
    let mut cache = MergeCache::new();
    let merged = merge(&a, &PredictionContext::empty(), true, &mut cache);
    assert!(merged.is_empty());
    let merged = merge(&PredictionContext::empty(), &a, true, &mut cache);
    assert!(merged.is_empty());
}

#[test]
fn full_context_merge_keeps_the_root_as_a_real_frame() {
    let a = frame(7);
    let mut cache = MergeCache::new();
    let merged = merge(&a, &PredictionContext::empty(), false, &mut cache);
    assert_eq!(merged.len(), 2);
    assert!(merged.has_empty_path());
    assert!(!merged.is_empty());
}

#[test]
fn merge_is_commutative_and_associative_structurally() {
    let a = frame(1);
    let b = frame(5);
    let c = frame(9);
    let mut cache = MergeCache::new();

    let ab = merge(&a, &b, true, &mut cache);
    let ba = merge(&b, &a, true, &mut cache);
    assert_eq!(*ab, *ba);

    let ab_c = merge(&ab, &c, true, &mut cache);
    let bc = merge(&b, &c, true, &mut cache);
    let a_bc = merge(&a, &bc, true, &mut cache);
    assert_eq!(*ab_c, *a_bc);
    assert_eq!(ab_c.len(), 3);
    // Return states stay sorted through the pairwise merges.
    assert_eq!(
        (0..ab_c.len()).map(|i| ab_c.return_state(i)).collect::<Vec<_>>(),
        vec![1, 5, 9]
    );
}

#[test]
fn deep_merge_shares_common_suffixes() {
    let shared = frame(3);
    let a = PredictionContext::singleton(shared.clone(), 10);
    let b = PredictionContext::singleton(shared.clone(), 20);
    let mut cache = MergeCache::new();
    let merged = merge(&a, &b, true, &mut cache);
    assert_eq!(merged.len(), 2);
    let pa = merged.parent(0).expect("parent");
    let pb = merged.parent(1).expect("parent");
    assert!(Arc::ptr_eq(pa, &shared) && Arc::ptr_eq(pb, &shared));
}

#[test]
fn the_pool_collapses_structural_duplicates() {
    let pool = PredictionContextCache::new();
    let first = pool.canonical(&frame(4));
    let second = pool.canonical(&frame(4));
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.len(), 1);
}

#[test]
fn config_sets_merge_stacks_for_equal_state_and_alt() {
    let mut set = ATNConfigSet::new(false);
    let mut cache = MergeCache::new();
    let mut low = ATNConfig::new(3, 1, frame(11));
    low.reaches_into_outer_context = 1;
    set.add(low, &mut cache);
    set.add(ATNConfig::new(3, 1, frame(22)), &mut cache);

    assert_eq!(set.len(), 1);
    let merged = &set.configs()[0];
    assert_eq!(merged.context.len(), 2);
    assert_eq!(merged.reaches_into_outer_context, 1);
    assert!(set.dips_into_outer_context);
}

#[test]
fn ordered_config_sets_keep_distinct_stacks_apart() {
    let mut set = ATNConfigSet::ordered();
    let mut cache = MergeCache::new();
    set.add(ATNConfig::new(3, 1, frame(11)), &mut cache);
    set.add(ATNConfig::new(3, 1, frame(22)), &mut cache);
    set.add(ATNConfig::new(3, 1, frame(11)), &mut cache);
    assert_eq!(set.len(), 2);
}

#[test]
#[should_panic(expected = "frozen")]
fn frozen_config_sets_reject_additions() {
    let mut set = ATNConfigSet::new(false);
    let mut cache = MergeCache::new();
    set.add(ATNConfig::new(0, 1, PredictionContext::empty()), &mut cache);
    set.freeze();
    set.add(ATNConfig::new(1, 1, PredictionContext::empty()), &mut cache);
}

#[test]
fn conjunction_drops_the_always_true_operand() {
    let none = SemanticContext::none();
    let pred = SemanticContext::predicate(2, 0, false);
    assert_eq!(*SemanticContext::and(&none, &pred), *pred);
    assert!(SemanticContext::or(&none, &pred).is_none());
}

#[test]
fn precedence_bounds_reduce_to_the_decisive_one() {
    let two = SemanticContext::precedence(2);
    let three = SemanticContext::precedence(3);
    let conj = SemanticContext::and(&two, &three);
    assert_eq!(*conj, SemanticContext::PrecedencePredicate { precedence: 2 });
    let disj = SemanticContext::or(&two, &three);
    assert_eq!(*disj, SemanticContext::PrecedencePredicate { precedence: 3 });
}

#[test]
fn follow_sets_read_straight_off_the_network() {
    let atn = branches::ab_ac();
    let decision = atn.decision_to_state[0];
    let at_decision = atn.next_tokens(decision);
    assert!(at_decision.contains(branches::A));
    assert!(!at_decision.contains(branches::B));

    // After the first token of alternative 1 only 'b' continues the rule.
    let after_a = atn
        .states
        .iter()
        .find(|s| {
            s.transitions
                .iter()
                .any(|t| t.matches(branches::B, 0, atn.max_token_type))
        })
        .map(|s| s.state_number)
        .expect("state with a 'b' edge");
    let following = atn.next_tokens(after_a);
    assert!(following.contains(branches::B));
    assert!(!following.contains(TOKEN_EPSILON));
}
