//! A keyword-versus-identifier lexer and a two-mode island lexer.
//!
//! The main grammar is
//!
//! ```text
//! KW : 'if' ;
//! ID : [a-z]+ ;
//! WS : (' ' | '\t' | '\n')+ -> skip ;
//! ```
//!
//! `KW` is declared before `ID`, so an input like `if`, which both rules
//! match with the same length, lexes as the keyword: among accepting
//! configurations of equal extent the earliest rule wins.

use std::sync::Arc;

use super::GrammarBuilder;
use crate::atn::{ATNStateKind, GrammarType, LexerAction, ATN};
use crate::interval::IntervalSet;

pub const KW: i32 = 1;
pub const ID: i32 = 2;
pub const WS: i32 = 3;

/// Append a `[lo-hi]+` loop for `rule` to the builder, returning the
/// states to wire the rule start into and out of.
fn plus_loop(g: &mut GrammarBuilder, rule: usize, lo: i32, hi: i32) -> (usize, usize) {
    let block_start = g.state(ATNStateKind::PlusBlockStart, rule);
    let body_in = g.state(ATNStateKind::Basic, rule);
    let body_out = g.state(ATNStateKind::Basic, rule);
    let block_end = g.state(ATNStateKind::BlockEnd, rule);
    let loop_back = g.state(ATNStateKind::PlusLoopBack, rule);
    let loop_end = g.state(ATNStateKind::LoopEnd, rule);

    g.block_end(block_start, block_end);
    g.loop_back(loop_end, loop_back);
    g.epsilon(block_start, body_in);
    g.range(body_in, body_out, lo, hi);
    g.epsilon(body_out, block_end);
    g.epsilon(block_end, loop_back);
    g.epsilon(loop_back, block_start);
    g.epsilon(loop_back, loop_end);
    g.decision(loop_back);
    (block_start, loop_end)
}

pub fn grammar() -> Arc<ATN> {
    let mut g = GrammarBuilder::new(GrammarType::Lexer, WS);

    let token_start = g.state(ATNStateKind::TokenStart, 0);
    g.mode(token_start);
    g.decision(token_start);

    // KW : 'if'
    let kw_start = g.state(ATNStateKind::RuleStart, 0);
    let kw_stop = g.state(ATNStateKind::RuleStop, 0);
    let kw_1 = g.state(ATNStateKind::Basic, 0);
    let kw_2 = g.state(ATNStateKind::Basic, 0);
    let kw_3 = g.state(ATNStateKind::Basic, 0);
    g.epsilon(kw_start, kw_1);
    g.atom(kw_1, kw_2, 'i' as i32);
    g.atom(kw_2, kw_3, 'f' as i32);
    g.epsilon(kw_3, kw_stop);
    g.rule(kw_start, KW);

    // ID : [a-z]+
    let id_start = g.state(ATNStateKind::RuleStart, 1);
    let id_stop = g.state(ATNStateKind::RuleStop, 1);
    let (id_in, id_out) = plus_loop(&mut g, 1, 'a' as i32, 'z' as i32);
    g.epsilon(id_start, id_in);
    g.epsilon(id_out, id_stop);
    g.rule(id_start, ID);

    // WS : (' ' | '\t' | '\n')+ -> skip
    let skip_action = g.lexer_action(LexerAction::Skip);
    let ws_start = g.state(ATNStateKind::RuleStart, 2);
    let ws_stop = g.state(ATNStateKind::RuleStop, 2);
    let ws_block = g.state(ATNStateKind::PlusBlockStart, 2);
    let ws_in = g.state(ATNStateKind::Basic, 2);
    let ws_out = g.state(ATNStateKind::Basic, 2);
    let ws_end = g.state(ATNStateKind::BlockEnd, 2);
    let ws_loop = g.state(ATNStateKind::PlusLoopBack, 2);
    let ws_exit = g.state(ATNStateKind::LoopEnd, 2);
    let ws_act = g.state(ATNStateKind::Basic, 2);
    g.block_end(ws_block, ws_end);
    g.loop_back(ws_exit, ws_loop);
    let mut blanks = IntervalSet::new();
    blanks.add_one(' ' as i32);
    blanks.add_one('\t' as i32);
    blanks.add_one('\n' as i32);
    g.epsilon(ws_start, ws_block);
    g.epsilon(ws_block, ws_in);
    g.set(ws_in, ws_out, blanks);
    g.epsilon(ws_out, ws_end);
    g.epsilon(ws_end, ws_loop);
    g.epsilon(ws_loop, ws_block);
    g.epsilon(ws_loop, ws_exit);
    g.decision(ws_loop);
    g.epsilon(ws_exit, ws_act);
    g.action(ws_act, ws_stop, 2, skip_action);
    g.rule(ws_start, WS);

    g.epsilon(token_start, kw_start);
    g.epsilon(token_start, id_start);
    g.epsilon(token_start, ws_start);

    g.build()
}

pub const OPEN: i32 = 1;
pub const WORD: i32 = 2;
pub const CHAR: i32 = 3;
pub const CLOSE: i32 = 4;

/// A two-mode lexer: a quote pushes the island mode, where letters come
/// back one per token until the closing quote pops back out.
///
/// ```text
/// OPEN  : '\'' -> pushMode(ISLAND) ;
/// WORD  : [a-z]+ ;
/// mode ISLAND;
/// CHAR  : [a-z] ;
/// CLOSE : '\'' -> popMode ;
/// ```
pub fn island_grammar() -> Arc<ATN> {
    let mut g = GrammarBuilder::new(GrammarType::Lexer, CLOSE);

    let default_start = g.state(ATNStateKind::TokenStart, 0);
    let island_start = g.state(ATNStateKind::TokenStart, 0);
    g.mode(default_start);
    g.mode(island_start);
    g.decision(default_start);
    g.decision(island_start);

    let push_island = g.lexer_action(LexerAction::PushMode(1));
    let pop_island = g.lexer_action(LexerAction::PopMode);

    // OPEN : '\'' -> pushMode
    let open_start = g.state(ATNStateKind::RuleStart, 0);
    let open_stop = g.state(ATNStateKind::RuleStop, 0);
    let open_1 = g.state(ATNStateKind::Basic, 0);
    let open_2 = g.state(ATNStateKind::Basic, 0);
    g.epsilon(open_start, open_1);
    g.atom(open_1, open_2, '\'' as i32);
    g.action(open_2, open_stop, 0, push_island);
    g.rule(open_start, OPEN);

    // WORD : [a-z]+
    let word_start = g.state(ATNStateKind::RuleStart, 1);
    let word_stop = g.state(ATNStateKind::RuleStop, 1);
    let (word_in, word_out) = plus_loop(&mut g, 1, 'a' as i32, 'z' as i32);
    g.epsilon(word_start, word_in);
    g.epsilon(word_out, word_stop);
    g.rule(word_start, WORD);

    // CHAR : [a-z]
    let char_start = g.state(ATNStateKind::RuleStart, 2);
    let char_stop = g.state(ATNStateKind::RuleStop, 2);
    let char_1 = g.state(ATNStateKind::Basic, 2);
    let char_2 = g.state(ATNStateKind::Basic, 2);
    g.epsilon(char_start, char_1);
    g.range(char_1, char_2, 'a' as i32, 'z' as i32);
    g.epsilon(char_2, char_stop);
    g.rule(char_start, CHAR);

    // CLOSE : '\'' -> popMode
    let close_start = g.state(ATNStateKind::RuleStart, 3);
    let close_stop = g.state(ATNStateKind::RuleStop, 3);
    let close_1 = g.state(ATNStateKind::Basic, 3);
    let close_2 = g.state(ATNStateKind::Basic, 3);
    g.epsilon(close_start, close_1);
    g.atom(close_1, close_2, '\'' as i32);
    g.action(close_2, close_stop, 3, pop_island);
    g.rule(close_start, CLOSE);

    g.epsilon(default_start, open_start);
    g.epsilon(default_start, word_start);
    g.epsilon(island_start, char_start);
    g.epsilon(island_start, close_start);

    g.build()
}
