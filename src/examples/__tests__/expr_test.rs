use std::rc::Rc;
use std::sync::Arc;

use super::{Recorder, RecordingListener};
use crate::atn::PredictionContextCache;
use crate::dfa::DFA;
use crate::examples::calc;
use crate::lexer::Lexer;
use crate::parser::{Parser, ParserInterpreter};
use crate::stream::{CommonTokenStream, InputStream};

fn parse(text: &str) -> (String, Rc<Recorder>) {
    let lexer = Lexer::new(calc::lexer(), Box::new(InputStream::new(text)));
    let stream = CommonTokenStream::new(Box::new(lexer));
    let mut parser = Parser::new(
        calc::grammar(),
        Box::new(stream),
        calc::rule_names(),
        calc::vocabulary(),
    );
    let recorder = Rc::new(Recorder::default());
    parser.remove_error_listeners();
    parser.add_error_listener(Box::new(RecordingListener(recorder.clone())));
    let mut interp = ParserInterpreter::new(parser);
    let tree = interp.parse(0).unwrap();
    (tree.to_string_tree(&["s", "e"]), recorder)
}

#[test]
pub fn multiplication_binds_tighter_than_addition() {
    let (tree, recorder) = parse("1+2*3");
    assert_eq!(tree, "(s (e (e 1) + (e (e 2) * (e 3))))");
    assert!(recorder.errors.borrow().is_empty());
}

#[test]
pub fn higher_precedence_on_the_left_completes_first() {
    let (tree, recorder) = parse("1*2+3");
    assert_eq!(tree, "(s (e (e (e 1) * (e 2)) + (e 3)))");
    assert!(recorder.errors.borrow().is_empty());
}

#[test]
pub fn equal_precedence_associates_left() {
    let (tree, _) = parse("1+2+3");
    assert_eq!(tree, "(s (e (e (e 1) + (e 2)) + (e 3)))");
}

#[test]
pub fn single_operand_is_just_the_operand() {
    let (tree, recorder) = parse("1");
    assert_eq!(tree, "(s (e 1))");
    assert!(recorder.errors.borrow().is_empty());
}

#[test]
pub fn blanks_are_skipped_between_tokens() {
    let (tree, recorder) = parse("1 + 2 * 3");
    assert_eq!(tree, "(s (e (e 1) + (e (e 2) * (e 3))))");
    assert!(recorder.errors.borrow().is_empty());
}

#[test]
pub fn shared_dfa_reproduces_cold_results_warm() {
    let atn = calc::grammar();
    let decision_to_dfa: Arc<Vec<DFA>> = Arc::new(
        atn.decision_to_state
            .iter()
            .enumerate()
            .map(|(decision, &state)| {
                DFA::new(decision, state, atn.states[state].is_precedence_decision)
            })
            .collect(),
    );
    let cache = Arc::new(PredictionContextCache::new());

    let mut seen = None;
    for _ in 0..3 {
        let lexer = Lexer::new(calc::lexer(), Box::new(InputStream::new("1+2*3")));
        let stream = CommonTokenStream::new(Box::new(lexer));
        let parser = Parser::with_shared(
            atn.clone(),
            Box::new(stream),
            calc::rule_names(),
            calc::vocabulary(),
            decision_to_dfa.clone(),
            cache.clone(),
        );
        let mut interp = ParserInterpreter::new(parser);
        let tree = interp.parse(0).unwrap();
        let rendered = tree.to_string_tree(&["s", "e"]);
        match &seen {
            None => seen = Some(rendered),
            Some(expected) => assert_eq!(expected, &rendered),
        }
    }
}
