use std::rc::Rc;

use super::{Recorder, RecordingListener};
use crate::examples::keywords::{self, CHAR, CLOSE, ID, KW, OPEN, WORD};
use crate::lexer::Lexer;
use crate::stream::InputStream;
use crate::token::{Token, TOKEN_EOF};

fn lex(text: &str) -> (Vec<Token>, Rc<Recorder>) {
    let mut lexer = Lexer::new(keywords::grammar(), Box::new(InputStream::new(text)));
    let recorder = Rc::new(Recorder::default());
    lexer.remove_error_listeners();
    lexer.add_error_listener(Box::new(RecordingListener(recorder.clone())));
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.is_eof();
        tokens.push(token);
        if done {
            break;
        }
    }
    (tokens, recorder)
}

#[test]
pub fn keyword_wins_a_tie_with_identifier() {
    let (tokens, recorder) = lex("if");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].token_type, KW);
    assert_eq!(tokens[0].text, "if");
    assert!(recorder.errors.borrow().is_empty());
}

#[test]
pub fn longest_match_beats_the_keyword_prefix() {
    let (tokens, _) = lex("iffy");
    assert_eq!(tokens[0].token_type, ID);
    assert_eq!(tokens[0].text, "iffy");
}

#[test]
pub fn blanks_are_skipped_and_positions_tracked() {
    let (tokens, _) = lex("if ab\nfi");
    let kinds: Vec<i32> = tokens.iter().map(|t| t.token_type).collect();
    assert_eq!(kinds, vec![KW, ID, ID, TOKEN_EOF]);
    assert_eq!((tokens[0].line, tokens[0].column), (1, 0));
    assert_eq!((tokens[1].line, tokens[1].column), (1, 3));
    assert_eq!((tokens[2].line, tokens[2].column), (2, 0));
}

#[test]
pub fn unmatched_character_is_reported_and_dropped() {
    let (tokens, recorder) = lex("if9ab");
    let kinds: Vec<i32> = tokens.iter().map(|t| t.token_type).collect();
    assert_eq!(kinds, vec![KW, ID, TOKEN_EOF]);
    let errors = recorder.errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0].contains("token recognition error at: '9'"),
        "unexpected error {}",
        errors[0]
    );
}

#[test]
pub fn eof_is_pinned_once_hit() {
    let mut lexer = Lexer::new(keywords::grammar(), Box::new(InputStream::new("ab")));
    assert_eq!(lexer.next_token().token_type, ID);
    let first_eof = lexer.next_token();
    let second_eof = lexer.next_token();
    assert!(first_eof.is_eof() && second_eof.is_eof());
    assert_eq!(first_eof.start, second_eof.start);
}

#[test]
pub fn island_mode_is_pushed_and_popped() {
    let mut lexer = Lexer::new(
        keywords::island_grammar(),
        Box::new(InputStream::new("'ab'cd")),
    );
    let mut kinds = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.is_eof() {
            break;
        }
        kinds.push((token.token_type, token.text.clone()));
    }
    assert_eq!(
        kinds,
        vec![
            (OPEN, "'".to_string()),
            (CHAR, "a".to_string()),
            (CHAR, "b".to_string()),
            (CLOSE, "'".to_string()),
            (WORD, "cd".to_string()),
        ]
    );
}

#[test]
#[should_panic(expected = "empty lexer mode stack")]
pub fn popping_the_base_mode_is_fatal() {
    let mut lexer = Lexer::new(
        keywords::island_grammar(),
        Box::new(InputStream::new("x")),
    );
    lexer.pop_mode();
}
