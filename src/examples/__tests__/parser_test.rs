use std::rc::Rc;

use super::{token_stream, Recorder, RecordingListener};
use crate::examples::branches::{self, A, B, C, ID, LP, RP};
use crate::lexer::Lexer;
use crate::parser::{Parser, ParserInterpreter};
use crate::stream::{CommonTokenStream, InputStream};
use crate::token::Vocabulary;

fn branch_vocabulary() -> Vocabulary {
    Vocabulary::from_symbolic(&["<invalid>", "A", "B", "C"])
}

fn interpreter_for(
    atn: std::sync::Arc<crate::atn::ATN>,
    stream: CommonTokenStream,
    vocabulary: Vocabulary,
) -> (ParserInterpreter, Rc<Recorder>) {
    let mut parser = Parser::new(atn, Box::new(stream), vec!["s".to_string()], vocabulary);
    let recorder = Rc::new(Recorder::default());
    parser.remove_error_listeners();
    parser.add_error_listener(Box::new(RecordingListener(recorder.clone())));
    (ParserInterpreter::new(parser), recorder)
}

#[test]
pub fn shared_prefix_resolves_with_one_extra_token() {
    let stream = token_stream(&[(A, "a"), (B, "b")]);
    let (mut interp, recorder) = interpreter_for(branches::ab_ac(), stream, branch_vocabulary());

    let tree = interp.parse(0).unwrap();
    assert_eq!(tree.to_string_tree(&["s"]), "(s a b)");
    assert!(recorder.errors.borrow().is_empty());
    assert!(recorder.ambiguities.borrow().is_empty());

    // The walk of the decision left its lookahead memoized.
    let dfa = &interp.parser().interpreter().decision_to_dfa()[0];
    assert!(dfa.state_count() >= 2);
}

#[test]
pub fn second_alternative_wins_without_full_context() {
    let stream = token_stream(&[(ID, "x"), (LP, "("), (ID, "y"), (RP, ")")]);
    let (mut interp, recorder) =
        interpreter_for(branches::call(), stream, branches::call_vocabulary());

    let tree = interp.parse(0).unwrap();
    assert_eq!(tree.to_string_tree(&["s"]), "(s x ( y ))");
    assert!(recorder.errors.borrow().is_empty());
    assert!(recorder.ambiguities.borrow().is_empty());
    assert_eq!(*recorder.full_context_retries.borrow(), 0);
}

#[test]
pub fn call_grammar_parses_through_real_lexer() {
    let lexer = Lexer::new(
        branches::call_lexer(),
        Box::new(InputStream::new("x ( y )")),
    );
    let stream = CommonTokenStream::new(Box::new(lexer));
    let (mut interp, recorder) =
        interpreter_for(branches::call(), stream, branches::call_vocabulary());

    let tree = interp.parse(0).unwrap();
    assert_eq!(tree.to_string_tree(&["s"]), "(s x ( y ))");
    assert!(recorder.errors.borrow().is_empty());
}

#[test]
pub fn identical_alternatives_report_ambiguity_and_take_the_first() {
    let stream = token_stream(&[(A, "a")]);
    let (mut interp, recorder) = interpreter_for(branches::ambig(), stream, branch_vocabulary());

    let tree = interp.parse(0).unwrap();
    assert_eq!(tree.to_string_tree(&["s"]), "(s a)");

    let ambiguities = recorder.ambiguities.borrow();
    assert_eq!(ambiguities.len(), 1);
    assert!(ambiguities[0].contains(1) && ambiguities[0].contains(2));
    // The conflict was found by the full-context pass.
    assert_eq!(*recorder.full_context_retries.borrow(), 1);
}

#[test]
pub fn missing_token_is_synthesized_and_reported() {
    let stream = token_stream(&[(ID, "x"), (LP, "("), (ID, "y")]);
    let (mut interp, recorder) =
        interpreter_for(branches::call(), stream, branches::call_vocabulary());

    let tree = interp.parse(0).unwrap();
    let rendered = tree.to_string_tree(&["s"]);
    assert!(
        rendered.contains("<missing"),
        "unexpected tree {}",
        rendered
    );
    let errors = recorder.errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("missing"), "unexpected error {}", errors[0]);
}

#[test]
pub fn decision_override_forces_the_other_interpretation() {
    // Without an override, `a c` picks alternative 2 and parses cleanly.
    let stream = token_stream(&[(A, "a"), (C, "c")]);
    let (mut interp, recorder) = interpreter_for(branches::ab_ac(), stream, branch_vocabulary());
    let tree = interp.parse(0).unwrap();
    assert_eq!(tree.to_string_tree(&["s"]), "(s a c)");
    assert!(recorder.errors.borrow().is_empty());

    // Forcing alternative 1 at the same position must fail the `b` match.
    let stream = token_stream(&[(A, "a"), (C, "c")]);
    let (mut interp, recorder) = interpreter_for(branches::ab_ac(), stream, branch_vocabulary());
    interp.add_decision_override(0, 0, 1);
    let _ = interp.parse(0).unwrap();
    let errors = recorder.errors.borrow();
    assert!(!errors.is_empty());
    assert!(
        errors[0].contains("mismatched input") || errors[0].contains("missing"),
        "unexpected error {}",
        errors[0]
    );
}

#[test]
pub fn predictions_are_identical_warm_and_cold() {
    let atn = branches::ab_ac();
    let mut first = None;
    for _ in 0..3 {
        let stream = token_stream(&[(A, "a"), (B, "b")]);
        let (mut interp, _) = interpreter_for(atn.clone(), stream, branch_vocabulary());
        let tree = interp.parse(0).unwrap();
        let rendered = tree.to_string_tree(&["s"]);
        match &first {
            None => first = Some(rendered),
            Some(expected) => assert_eq!(expected, &rendered),
        }
    }
}
