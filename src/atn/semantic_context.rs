use std::rc::Rc;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::context::ParserRuleContext;

/// Host hooks evaluating grammar predicates during prediction.
///
/// Generated recognizers implement this against their rule methods; the
/// interpreters use [`DefaultPredicateEvaluator`], which accepts everything.
pub trait IPredicateEvaluator {
    fn sempred(
        &mut self,
        ctx: Option<&Rc<ParserRuleContext>>,
        rule_index: usize,
        pred_index: usize,
    ) -> bool;

    fn precpred(&mut self, ctx: Option<&Rc<ParserRuleContext>>, precedence: i32) -> bool;

    /// The parser announces its current precedence here whenever the
    /// precedence stack changes; `precpred` compares against it.
    fn update_precedence(&mut self, _precedence: i32) {}
}

/// Accepts every semantic predicate; precedence predicates still compare
/// against the precedence the caller passes through `precpred`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPredicateEvaluator {
    pub current_precedence: i32,
}

impl IPredicateEvaluator for DefaultPredicateEvaluator {
    fn sempred(
        &mut self,
        _ctx: Option<&Rc<ParserRuleContext>>,
        _rule_index: usize,
        _pred_index: usize,
    ) -> bool {
        true
    }

    fn precpred(&mut self, _ctx: Option<&Rc<ParserRuleContext>>, precedence: i32) -> bool {
        precedence >= self.current_precedence
    }

    fn update_precedence(&mut self, precedence: i32) {
        self.current_precedence = precedence;
    }
}

/// A composable predicate formula attached to a configuration.
///
/// Formulas accumulate while the closure walks predicate transitions and are
/// evaluated against the live parser state when a prediction commits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticContext {
    Predicate {
        rule_index: i32,
        pred_index: i32,
        is_ctx_dependent: bool,
    },
    PrecedencePredicate {
        precedence: i32,
    },
    And(Vec<SemanticContext>),
    Or(Vec<SemanticContext>),
}

static NONE: Lazy<Arc<SemanticContext>> = Lazy::new(|| {
    Arc::new(SemanticContext::Predicate {
        rule_index: -1,
        pred_index: -1,
        is_ctx_dependent: false,
    })
});

impl SemanticContext {
    /// The always-true formula carried by predicate-free configurations.
    pub fn none() -> Arc<SemanticContext> {
        NONE.clone()
    }

    pub fn is_none(&self) -> bool {
        matches!(
            self,
            SemanticContext::Predicate {
                rule_index: -1,
                pred_index: -1,
                ..
            }
        )
    }

    pub fn predicate(rule_index: usize, pred_index: usize, is_ctx_dependent: bool) -> Arc<Self> {
        Arc::new(SemanticContext::Predicate {
            rule_index: rule_index as i32,
            pred_index: pred_index as i32,
            is_ctx_dependent,
        })
    }

    pub fn precedence(precedence: i32) -> Arc<Self> {
        Arc::new(SemanticContext::PrecedencePredicate { precedence })
    }

    pub fn eval(
        &self,
        evaluator: &mut dyn IPredicateEvaluator,
        ctx: Option<&Rc<ParserRuleContext>>,
    ) -> bool {
        match self {
            SemanticContext::Predicate {
                rule_index,
                pred_index,
                ..
            } => {
                if self.is_none() {
                    true
                } else {
                    evaluator.sempred(ctx, *rule_index as usize, *pred_index as usize)
                }
            }
            SemanticContext::PrecedencePredicate { precedence } => {
                evaluator.precpred(ctx, *precedence)
            }
            SemanticContext::And(operands) => operands.iter().all(|o| o.eval(evaluator, ctx)),
            SemanticContext::Or(operands) => operands.iter().any(|o| o.eval(evaluator, ctx)),
        }
    }

    /// Partially evaluate the precedence predicates of the formula against
    /// the current precedence. `None` means the formula is already false;
    /// the always-true remainder is [`SemanticContext::none`].
    pub fn eval_precedence(
        self: &Arc<Self>,
        evaluator: &mut dyn IPredicateEvaluator,
        ctx: Option<&Rc<ParserRuleContext>>,
    ) -> Option<Arc<SemanticContext>> {
        match &**self {
            SemanticContext::Predicate { .. } => Some(self.clone()),
            SemanticContext::PrecedencePredicate { precedence } => {
                if evaluator.precpred(ctx, *precedence) {
                    Some(SemanticContext::none())
                } else {
                    None
                }
            }
            SemanticContext::And(operands) => {
                let mut differs = false;
                let mut remaining: Vec<Arc<SemanticContext>> = Vec::new();
                for operand in operands {
                    let evaluated = Arc::new(operand.clone()).eval_precedence(evaluator, ctx)?;
                    differs |= *evaluated != *operand;
                    if !evaluated.is_none() {
                        remaining.push(evaluated);
                    }
                }
                if !differs {
                    return Some(self.clone());
                }
                if remaining.is_empty() {
                    return Some(SemanticContext::none());
                }
                let mut result = remaining[0].clone();
                for operand in &remaining[1..] {
                    result = SemanticContext::and(&result, operand);
                }
                Some(result)
            }
            SemanticContext::Or(operands) => {
                let mut differs = false;
                let mut remaining: Vec<Arc<SemanticContext>> = Vec::new();
                for operand in operands {
                    match Arc::new(operand.clone()).eval_precedence(evaluator, ctx) {
                        Some(evaluated) => {
                            if evaluated.is_none() {
                                // One true operand satisfies the disjunction.
                                return Some(SemanticContext::none());
                            }
                            differs |= *evaluated != *operand;
                            remaining.push(evaluated);
                        }
                        None => differs = true,
                    }
                }
                if !differs {
                    return Some(self.clone());
                }
                if remaining.is_empty() {
                    return None;
                }
                let mut result = remaining[0].clone();
                for operand in &remaining[1..] {
                    result = SemanticContext::or(&result, operand);
                }
                Some(result)
            }
        }
    }

    /// Conjunction with flattening, deduplication and reduction of
    /// precedence predicates to the weakest one.
    pub fn and(a: &Arc<SemanticContext>, b: &Arc<SemanticContext>) -> Arc<SemanticContext> {
        if a.is_none() {
            return b.clone();
        }
        if b.is_none() {
            return a.clone();
        }
        let mut operands: Vec<SemanticContext> = Vec::new();
        collect_operands(a, true, &mut operands);
        collect_operands(b, true, &mut operands);
        reduce(operands, true)
    }

    /// Disjunction; a true operand absorbs the formula, precedence
    /// predicates reduce to the strongest one.
    pub fn or(a: &Arc<SemanticContext>, b: &Arc<SemanticContext>) -> Arc<SemanticContext> {
        if a.is_none() || b.is_none() {
            return SemanticContext::none();
        }
        let mut operands: Vec<SemanticContext> = Vec::new();
        collect_operands(a, false, &mut operands);
        collect_operands(b, false, &mut operands);
        reduce(operands, false)
    }
}

fn collect_operands(ctx: &Arc<SemanticContext>, conjunction: bool, out: &mut Vec<SemanticContext>) {
    match &**ctx {
        SemanticContext::And(operands) if conjunction => out.extend(operands.iter().cloned()),
        SemanticContext::Or(operands) if !conjunction => out.extend(operands.iter().cloned()),
        other => out.push(other.clone()),
    }
}

fn reduce(mut operands: Vec<SemanticContext>, conjunction: bool) -> Arc<SemanticContext> {
    operands.sort();
    operands.dedup();

    // A conjunction only needs its weakest precedence bound, a disjunction
    // its strongest.
    let mut reduced: Vec<SemanticContext> = Vec::new();
    let mut best_precedence: Option<i32> = None;
    for operand in operands {
        if let SemanticContext::PrecedencePredicate { precedence } = operand {
            best_precedence = Some(match best_precedence {
                None => precedence,
                Some(found) => {
                    if conjunction {
                        found.min(precedence)
                    } else {
                        found.max(precedence)
                    }
                }
            });
        } else {
            reduced.push(operand);
        }
    }
    if let Some(precedence) = best_precedence {
        reduced.push(SemanticContext::PrecedencePredicate { precedence });
        reduced.sort();
    }
    if reduced.len() == 1 {
        return Arc::new(reduced.pop().unwrap());
    }
    if conjunction {
        Arc::new(SemanticContext::And(reduced))
    } else {
        Arc::new(SemanticContext::Or(reduced))
    }
}
