//! Plain alternative-block parser grammars with shared-prefix lookahead.
//!
//! `ab_ac` is `s : 'a' 'b' | 'a' 'c' ;` — one token of lookahead past the
//! shared prefix decides. `ambig` is the pathological `s : 'a' | 'a' ;`,
//! which stays ambiguous under full context. `call` is
//! `s : ID '=' ID | ID '(' ID ')' ;` with its own lexer, whose whitespace
//! goes to the hidden channel instead of being skipped.

use std::sync::Arc;

use super::GrammarBuilder;
use crate::atn::{ATNStateKind, GrammarType, LexerAction, ATN};
use crate::token::{Vocabulary, HIDDEN_CHANNEL};

pub const A: i32 = 1;
pub const B: i32 = 2;
pub const C: i32 = 3;

/// `s : 'a' 'b' | 'a' 'c' ;` over token types [`A`], [`B`], [`C`].
pub fn ab_ac() -> Arc<ATN> {
    let mut g = GrammarBuilder::new(GrammarType::Parser, C);

    let start = g.state(ATNStateKind::RuleStart, 0);
    let stop = g.state(ATNStateKind::RuleStop, 0);
    let block = g.state(ATNStateKind::BlockStart, 0);
    let end = g.state(ATNStateKind::BlockEnd, 0);
    g.block_end(block, end);

    let alt1_a = g.state(ATNStateKind::Basic, 0);
    let alt1_b = g.state(ATNStateKind::Basic, 0);
    let alt1_c = g.state(ATNStateKind::Basic, 0);
    g.epsilon(block, alt1_a);
    g.atom(alt1_a, alt1_b, A);
    g.atom(alt1_b, alt1_c, B);
    g.epsilon(alt1_c, end);

    let alt2_a = g.state(ATNStateKind::Basic, 0);
    let alt2_b = g.state(ATNStateKind::Basic, 0);
    let alt2_c = g.state(ATNStateKind::Basic, 0);
    g.epsilon(block, alt2_a);
    g.atom(alt2_a, alt2_b, A);
    g.atom(alt2_b, alt2_c, C);
    g.epsilon(alt2_c, end);

    g.epsilon(start, block);
    g.epsilon(end, stop);
    g.decision(block);
    g.rule(start, 0);
    g.build()
}

/// `s : 'a' | 'a' ;` — a true ambiguity reported with alternatives {1, 2}.
pub fn ambig() -> Arc<ATN> {
    let mut g = GrammarBuilder::new(GrammarType::Parser, A);

    let start = g.state(ATNStateKind::RuleStart, 0);
    let stop = g.state(ATNStateKind::RuleStop, 0);
    let block = g.state(ATNStateKind::BlockStart, 0);
    let end = g.state(ATNStateKind::BlockEnd, 0);
    g.block_end(block, end);

    let alt1_a = g.state(ATNStateKind::Basic, 0);
    let alt1_b = g.state(ATNStateKind::Basic, 0);
    g.epsilon(block, alt1_a);
    g.atom(alt1_a, alt1_b, A);
    g.epsilon(alt1_b, end);

    let alt2_a = g.state(ATNStateKind::Basic, 0);
    let alt2_b = g.state(ATNStateKind::Basic, 0);
    g.epsilon(block, alt2_a);
    g.atom(alt2_a, alt2_b, A);
    g.epsilon(alt2_b, end);

    g.epsilon(start, block);
    g.epsilon(end, stop);
    g.decision(block);
    g.rule(start, 0);
    g.build()
}

pub const ID: i32 = 1;
pub const EQ: i32 = 2;
pub const LP: i32 = 3;
pub const RP: i32 = 4;
pub const WS: i32 = 5;

/// `s : ID '=' ID | ID '(' ID ')' ;`
pub fn call() -> Arc<ATN> {
    let mut g = GrammarBuilder::new(GrammarType::Parser, WS);

    let start = g.state(ATNStateKind::RuleStart, 0);
    let stop = g.state(ATNStateKind::RuleStop, 0);
    let block = g.state(ATNStateKind::BlockStart, 0);
    let end = g.state(ATNStateKind::BlockEnd, 0);
    g.block_end(block, end);

    let mut chain = |g: &mut GrammarBuilder, labels: &[i32]| {
        let first = g.state(ATNStateKind::Basic, 0);
        let mut current = first;
        for &label in labels {
            let next = g.state(ATNStateKind::Basic, 0);
            g.atom(current, next, label);
            current = next;
        }
        (first, current)
    };

    let (assign_in, assign_out) = chain(&mut g, &[ID, EQ, ID]);
    g.epsilon(block, assign_in);
    g.epsilon(assign_out, end);

    let (invoke_in, invoke_out) = chain(&mut g, &[ID, LP, ID, RP]);
    g.epsilon(block, invoke_in);
    g.epsilon(invoke_out, end);

    g.epsilon(start, block);
    g.epsilon(end, stop);
    g.decision(block);
    g.rule(start, 0);
    g.build()
}

pub fn call_vocabulary() -> Vocabulary {
    Vocabulary::new(
        vec![
            None,
            None,
            Some("'='".to_string()),
            Some("'('".to_string()),
            Some("')'".to_string()),
            None,
        ],
        vec![
            None,
            Some("ID".to_string()),
            Some("EQ".to_string()),
            Some("LP".to_string()),
            Some("RP".to_string()),
            Some("WS".to_string()),
        ],
    )
}

/// The matching lexer; whitespace is routed to the hidden channel.
pub fn call_lexer() -> Arc<ATN> {
    let mut g = GrammarBuilder::new(GrammarType::Lexer, WS);

    let token_start = g.state(ATNStateKind::TokenStart, 0);
    g.mode(token_start);
    g.decision(token_start);

    // ID : [a-z]+
    let id_start = g.state(ATNStateKind::RuleStart, 0);
    let id_stop = g.state(ATNStateKind::RuleStop, 0);
    let id_block = g.state(ATNStateKind::PlusBlockStart, 0);
    let id_in = g.state(ATNStateKind::Basic, 0);
    let id_out = g.state(ATNStateKind::Basic, 0);
    let id_end = g.state(ATNStateKind::BlockEnd, 0);
    let id_loop = g.state(ATNStateKind::PlusLoopBack, 0);
    let id_exit = g.state(ATNStateKind::LoopEnd, 0);
    g.block_end(id_block, id_end);
    g.loop_back(id_exit, id_loop);
    g.epsilon(id_start, id_block);
    g.epsilon(id_block, id_in);
    g.range(id_in, id_out, 'a' as i32, 'z' as i32);
    g.epsilon(id_out, id_end);
    g.epsilon(id_end, id_loop);
    g.epsilon(id_loop, id_block);
    g.epsilon(id_loop, id_exit);
    g.decision(id_loop);
    g.epsilon(id_exit, id_stop);
    g.rule(id_start, ID);

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

    let eq_start = punctuation(&mut g, 1, '=' as i32, EQ);
    let lp_start = punctuation(&mut g, 2, '(' as i32, LP);
    let rp_start = punctuation(&mut g, 3, ')' as i32, RP);

    // WS : ' '+ -> channel(HIDDEN)
    let hidden = g.lexer_action(LexerAction::Channel(HIDDEN_CHANNEL));
    let ws_start = g.state(ATNStateKind::RuleStart, 4);
    let ws_stop = g.state(ATNStateKind::RuleStop, 4);
    let ws_block = g.state(ATNStateKind::PlusBlockStart, 4);
    let ws_in = g.state(ATNStateKind::Basic, 4);
    let ws_out = g.state(ATNStateKind::Basic, 4);
    let ws_end = g.state(ATNStateKind::BlockEnd, 4);
    let ws_loop = g.state(ATNStateKind::PlusLoopBack, 4);
    let ws_exit = g.state(ATNStateKind::LoopEnd, 4);
    let ws_act = g.state(ATNStateKind::Basic, 4);
    g.block_end(ws_block, ws_end);
    g.loop_back(ws_exit, ws_loop);
    g.epsilon(ws_start, ws_block);
    g.epsilon(ws_block, ws_in);
    g.atom(ws_in, ws_out, ' ' as i32);
    g.epsilon(ws_out, ws_end);
    g.epsilon(ws_end, ws_loop);
    g.epsilon(ws_loop, ws_block);
    g.epsilon(ws_loop, ws_exit);
    g.decision(ws_loop);
    g.epsilon(ws_exit, ws_act);
    g.action(ws_act, ws_stop, 4, hidden);
    g.rule(ws_start, WS);

    g.epsilon(token_start, id_start);
    g.epsilon(token_start, eq_start);
    g.epsilon(token_start, lp_start);
    g.epsilon(token_start, rp_start);
    g.epsilon(token_start, ws_start);

    g.build()
}
