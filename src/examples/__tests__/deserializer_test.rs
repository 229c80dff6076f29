use crate::atn::{ATNDeserializer, ATNStateKind, GrammarType, SERIALIZED_UUID, SERIALIZED_VERSION};
use crate::lexer::Lexer;
use crate::stream::InputStream;
use crate::token::TOKEN_EOF;

/// The serialized form of
///
/// ```text
/// lexer grammar AB;
/// A : 'a' ;
/// B : 'b' ;
/// ```
///
/// authored word by word against the layout the tool emits.
fn ab_lexer_blob() -> Vec<u32> {
    let mut data = vec![SERIALIZED_VERSION];
    data.extend_from_slice(&SERIALIZED_UUID);
    data.extend_from_slice(&[
        0, // grammar type: lexer
        2, // max token type
        // states: kind, rule, argument
        9, // count
        6, 0, 0, // 0 token start
        2, 0, 0, // 1 rule start A
        7, 0, 0, // 2 rule stop A
        2, 1, 0, // 3 rule start B
        7, 1, 0, // 4 rule stop B
        1, 0, 0, // 5 basic (after 'a')
        1, 1, 0, // 6 basic (after 'b')
        1, 0, 0, // 7 basic (body A)
        1, 1, 0, // 8 basic (body B)
        0, // non-greedy states
        0, // left-recursive rule starts
        // rules: start state, token type
        2, 1, 1, 3, 2,
        // modes
        1, 0,
        // sets
        0,
        // transitions: src, trg, kind, args
        8, //
        0, 1, 1, 0, 0, 0, // token start -> rule A
        0, 3, 1, 0, 0, 0, // token start -> rule B
        1, 7, 1, 0, 0, 0, //
        7, 5, 5, 97, 0, 0, // 'a'
        5, 2, 1, 0, 0, 0, //
        3, 8, 1, 0, 0, 0, //
        8, 6, 5, 98, 0, 0, // 'b'
        6, 4, 1, 0, 0, 0, //
        // decisions
        1, 0,
        // lexer actions
        0,
    ]);
    data
}

#[test]
pub fn round_trips_a_lexer_grammar() {
    let atn = ATNDeserializer::new().deserialize(&ab_lexer_blob()).unwrap();
    assert_eq!(atn.grammar_type, GrammarType::Lexer);
    assert_eq!(atn.max_token_type, 2);
    assert_eq!(atn.states.len(), 9);
    assert_eq!(atn.states[0].kind, ATNStateKind::TokenStart);
    assert_eq!(atn.mode_to_start_state, vec![0]);
    assert_eq!(atn.rule_to_start_state, vec![1, 3]);
    assert_eq!(atn.rule_to_stop_state, vec![2, 4]);
    assert_eq!(atn.rule_to_token_type, vec![1, 2]);
    assert_eq!(atn.decision_to_state, vec![0]);
    // Indices are identity: state 7 carries the 'a' edge.
    assert!(atn.states[7]
        .transitions
        .iter()
        .any(|t| t.matches('a' as i32, 0, 0x10FFFF)));
}

#[test]
pub fn deserialized_grammar_drives_the_lexer() {
    let atn = ATNDeserializer::new().deserialize(&ab_lexer_blob()).unwrap();
    let mut lexer = Lexer::new(std::sync::Arc::new(atn), Box::new(InputStream::new("ab")));
    let kinds: Vec<i32> = (0..3).map(|_| lexer.next_token().token_type).collect();
    assert_eq!(kinds, vec![1, 2, TOKEN_EOF]);
}

#[test]
pub fn version_mismatch_is_fatal() {
    let mut data = ab_lexer_blob();
    data[0] = SERIALIZED_VERSION + 1;
    let error = ATNDeserializer::new().deserialize(&data).unwrap_err();
    assert!(error.to_string().contains("version"));
}

#[test]
pub fn uuid_mismatch_is_fatal() {
    let mut data = ab_lexer_blob();
    data[1] ^= 1;
    let error = ATNDeserializer::new().deserialize(&data).unwrap_err();
    assert!(error.to_string().contains("UUID"));
}

#[test]
pub fn truncated_data_is_fatal() {
    let data = ab_lexer_blob();
    let error = ATNDeserializer::new()
        .deserialize(&data[..data.len() - 4])
        .unwrap_err();
    assert!(error.to_string().contains("truncated"));
}
