//! A left-recursive expression grammar with precedence climbing.
//!
//! The authored rules are
//!
//! ```text
//! s : e ;
//! e : e '*' e | e '+' e | INT ;
//! ```
//!
//! and the network encodes the precedence-eliminated form of `e`
//!
//! ```text
//! e[p] : INT ( {3 >= p}? '*' e[4] | {2 >= p}? '+' e[3] )* ;
//! ```
//!
//! so `'*'` binds tighter than `'+'` and both associate to the left,
//! enforced at prediction time by the precedence filter and the precedence
//! predicates rather than by grammar rewriting in the parser. The wrapper
//! rule invokes `e` at precedence zero, which is what lets the loop see
//! the outer follow (end of input) when deciding to stop iterating.

use std::sync::Arc;

use super::GrammarBuilder;
use crate::atn::{ATNStateKind, GrammarType, LexerAction, ATN};
use crate::token::Vocabulary;

pub const STAR: i32 = 1;
pub const PLUS: i32 = 2;
pub const INT: i32 = 3;
pub const WS: i32 = 4;

pub fn rule_names() -> Vec<String> {
    vec!["s".to_string(), "e".to_string()]
}

pub fn vocabulary() -> Vocabulary {
    Vocabulary::new(
        vec![
            None,
            Some("'*'".to_string()),
            Some("'+'".to_string()),
            None,
            None,
        ],
        vec![
            None,
            Some("STAR".to_string()),
            Some("PLUS".to_string()),
            Some("INT".to_string()),
            Some("WS".to_string()),
        ],
    )
}

pub fn grammar() -> Arc<ATN> {
    let mut g = GrammarBuilder::new(GrammarType::Parser, WS);

    // s : e ;
    let s_start = g.state(ATNStateKind::RuleStart, 0);
    let s_stop = g.state(ATNStateKind::RuleStop, 0);
    let s_call = g.state(ATNStateKind::Basic, 0);
    let s_done = g.state(ATNStateKind::Basic, 0);

    let start = g.state(ATNStateKind::RuleStart, 1);
    let stop = g.state(ATNStateKind::RuleStop, 1);
    g.left_recursive(start);

    g.epsilon(s_start, s_call);
    g.rule_call(s_call, start, 1, 0, s_done);
    g.epsilon(s_done, s_stop);

    // primary operand
    let primary_in = g.state(ATNStateKind::Basic, 1);
    let primary_out = g.state(ATNStateKind::Basic, 1);
    g.epsilon(start, primary_in);
    g.atom(primary_in, primary_out, INT);

    // operator loop
    let loop_entry = g.state(ATNStateKind::StarLoopEntry, 1);
    let block = g.state(ATNStateKind::StarBlockStart, 1);
    let block_end = g.state(ATNStateKind::BlockEnd, 1);
    let loop_back = g.state(ATNStateKind::StarLoopBack, 1);
    let loop_end = g.state(ATNStateKind::LoopEnd, 1);
    g.block_end(block, block_end);
    g.loop_back(loop_entry, loop_back);
    g.loop_back(loop_end, loop_back);
    g.epsilon(primary_out, loop_entry);

    // {3 >= p}? '*' e[4]
    let mul_pred = g.state(ATNStateKind::Basic, 1);
    let mul_op = g.state(ATNStateKind::Basic, 1);
    let mul_call = g.state(ATNStateKind::Basic, 1);
    let mul_done = g.state(ATNStateKind::Basic, 1);
    g.epsilon(block, mul_pred);
    g.precedence(mul_pred, mul_op, 3);
    g.atom(mul_op, mul_call, STAR);
    g.rule_call(mul_call, start, 1, 4, mul_done);
    g.epsilon(mul_done, block_end);

    // {2 >= p}? '+' e[3]
    let add_pred = g.state(ATNStateKind::Basic, 1);
    let add_op = g.state(ATNStateKind::Basic, 1);
    let add_call = g.state(ATNStateKind::Basic, 1);
    let add_done = g.state(ATNStateKind::Basic, 1);
    g.epsilon(block, add_pred);
    g.precedence(add_pred, add_op, 2);
    g.atom(add_op, add_call, PLUS);
    g.rule_call(add_call, start, 1, 3, add_done);
    g.epsilon(add_done, block_end);

    g.epsilon(block_end, loop_back);
    g.epsilon(loop_back, loop_entry);
    // Loop exit must be the entry's last transition.
    g.epsilon(loop_entry, block);
    g.epsilon(loop_entry, loop_end);
    g.epsilon(loop_end, stop);

    g.decision(loop_entry);
    g.decision(block);
    g.rule(s_start, 0);
    g.rule(start, 0);
    g.build()
}

/// The matching lexer: operators, integers and skipped blanks.
pub fn lexer() -> Arc<ATN> {
    let mut g = GrammarBuilder::new(GrammarType::Lexer, WS);

    let token_start = g.state(ATNStateKind::TokenStart, 0);
    g.mode(token_start);
    g.decision(token_start);

    let mut punctuation = |g: &mut GrammarBuilder, rule: usize, label: i32, token_type: i32| {
        let start = g.state(ATNStateKind::RuleStart, rule);
        let stop = g.state(ATNStateKind::RuleStop, rule);
        let s1 = g.state(ATNStateKind::Basic, rule);
        let s2 = g.state(ATNStateKind::Basic, rule);
        g.epsilon(start, s1);
        g.atom(s1, s2, label);
        g.epsilon(s2, stop);
        g.rule(start, token_type);
        start
    };

    let star_start = punctuation(&mut g, 0, '*' as i32, STAR);
    let plus_start = punctuation(&mut g, 1, '+' as i32, PLUS);

    // INT : [0-9]+
    let int_start = g.state(ATNStateKind::RuleStart, 2);
    let int_stop = g.state(ATNStateKind::RuleStop, 2);
    let int_block = g.state(ATNStateKind::PlusBlockStart, 2);
    let int_in = g.state(ATNStateKind::Basic, 2);
    let int_out = g.state(ATNStateKind::Basic, 2);
    let int_end = g.state(ATNStateKind::BlockEnd, 2);
    let int_loop = g.state(ATNStateKind::PlusLoopBack, 2);
    let int_exit = g.state(ATNStateKind::LoopEnd, 2);
    g.block_end(int_block, int_end);
    g.loop_back(int_exit, int_loop);
    g.epsilon(int_start, int_block);
    g.epsilon(int_block, int_in);
    g.range(int_in, int_out, '0' as i32, '9' as i32);
    g.epsilon(int_out, int_end);
    g.epsilon(int_end, int_loop);
    g.epsilon(int_loop, int_block);
    g.epsilon(int_loop, int_exit);
    g.decision(int_loop);
    g.epsilon(int_exit, int_stop);
    g.rule(int_start, INT);

    // WS : ' '+ -> skip
    let skip_action = g.lexer_action(LexerAction::Skip);
    let ws_start = g.state(ATNStateKind::RuleStart, 3);
    let ws_stop = g.state(ATNStateKind::RuleStop, 3);
    let ws_in = g.state(ATNStateKind::Basic, 3);
    let ws_out = g.state(ATNStateKind::Basic, 3);
    let ws_loop = g.state(ATNStateKind::PlusLoopBack, 3);
    let ws_exit = g.state(ATNStateKind::LoopEnd, 3);
    let ws_act = g.state(ATNStateKind::Basic, 3);
    g.loop_back(ws_exit, ws_loop);
    g.epsilon(ws_start, ws_in);
    g.atom(ws_in, ws_out, ' ' as i32);
    g.epsilon(ws_out, ws_loop);
    g.epsilon(ws_loop, ws_in);
    g.epsilon(ws_loop, ws_exit);
    g.decision(ws_loop);
    g.epsilon(ws_exit, ws_act);
    g.action(ws_act, ws_stop, 3, skip_action);
    g.rule(ws_start, WS);

    g.epsilon(token_start, star_start);
    g.epsilon(token_start, plus_start);
    g.epsilon(token_start, int_start);
    g.epsilon(token_start, ws_start);

    g.build()
}
