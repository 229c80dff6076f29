use std::fmt::{Display, Formatter};

use super::{ATNState, ATNStateKind, GrammarType, LexerAction, Transition, ATN};
use crate::interval::IntervalSet;
use crate::token::{TOKEN_EOF, TOKEN_INVALID_TYPE};

/// Format version the deserializer accepts; anything else is fatal.
pub const SERIALIZED_VERSION: u32 = 4;

/// Identity of the serialization layout, checked word for word.
pub const SERIALIZED_UUID: [u32; 4] = [0x3f1b_8d27, 0x9a64_02cd, 0x51e0_77b3, 0x0c8a_46f5];

const STATE_BASIC: u32 = 1;
const STATE_RULE_START: u32 = 2;
const STATE_BLOCK_START: u32 = 3;
const STATE_PLUS_BLOCK_START: u32 = 4;
const STATE_STAR_BLOCK_START: u32 = 5;
const STATE_TOKEN_START: u32 = 6;
const STATE_RULE_STOP: u32 = 7;
const STATE_BLOCK_END: u32 = 8;
const STATE_STAR_LOOP_BACK: u32 = 9;
const STATE_STAR_LOOP_ENTRY: u32 = 10;
const STATE_PLUS_LOOP_BACK: u32 = 11;
const STATE_LOOP_END: u32 = 12;

const TRANSITION_EPSILON: u32 = 1;
const TRANSITION_RANGE: u32 = 2;
const TRANSITION_RULE: u32 = 3;
const TRANSITION_PREDICATE: u32 = 4;
const TRANSITION_ATOM: u32 = 5;
const TRANSITION_ACTION: u32 = 6;
const TRANSITION_SET: u32 = 7;
const TRANSITION_NOT_SET: u32 = 8;
const TRANSITION_WILDCARD: u32 = 9;
const TRANSITION_PRECEDENCE: u32 = 10;

const ACTION_CHANNEL: u32 = 0;
const ACTION_CUSTOM: u32 = 1;
const ACTION_MODE: u32 = 2;
const ACTION_MORE: u32 = 3;
const ACTION_POP_MODE: u32 = 4;
const ACTION_PUSH_MODE: u32 = 5;
const ACTION_SKIP: u32 = 6;
const ACTION_TYPE: u32 = 7;

#[derive(Debug)]
/// A fatal defect in a serialized grammar blob.
pub struct ATNDataError {
    message: String,
}

impl ATNDataError {
    fn new<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ATNDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ATNDataError: {}", self.message)
    }
}

struct Reader<'d> {
    data: &'d [u32],
    pointer: usize,
}

impl<'d> Reader<'d> {
    fn next(&mut self) -> Result<u32, ATNDataError> {
        match self.data.get(self.pointer) {
            Some(value) => {
                self.pointer += 1;
                Ok(*value)
            }
            None => Err(ATNDataError::new(format!(
                "serialized data truncated at word {}",
                self.pointer
            ))),
        }
    }

    fn next_usize(&mut self) -> Result<usize, ATNDataError> {
        Ok(self.next()? as usize)
    }

    fn next_bool(&mut self) -> Result<bool, ATNDataError> {
        Ok(self.next()? != 0)
    }
}

/// Rebuilds an [`ATN`] from the word sequence the offline tool emits.
///
/// The layout is table ordered: header, states (with the non-greedy and
/// left-recursive marker lists), rules, modes, sets, transitions, decision
/// states and lexer actions. Indices inside the blob are preserved exactly;
/// they are the identity generated recognizers compiled against the same
/// grammar use at run time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ATNDeserializer;

impl ATNDeserializer {
    pub fn new() -> Self {
        Self
    }

    pub fn deserialize(&self, data: &[u32]) -> Result<ATN, ATNDataError> {
        let mut reader = Reader { data, pointer: 0 };
        self.check_header(&mut reader)?;

        let grammar_type = match reader.next()? {
            0 => GrammarType::Lexer,
            1 => GrammarType::Parser,
            other => {
                return Err(ATNDataError::new(format!(
                    "unknown grammar type {}",
                    other
                )))
            }
        };
        let max_token_type = reader.next()? as i32;

        let mut atn = ATN {
            grammar_type,
            max_token_type,
            states: Vec::new(),
            decision_to_state: Vec::new(),
            rule_to_start_state: Vec::new(),
            rule_to_stop_state: Vec::new(),
            rule_to_token_type: Vec::new(),
            lexer_actions: Vec::new(),
            mode_to_start_state: Vec::new(),
        };

        self.read_states(&mut reader, &mut atn)?;
        self.read_rules(&mut reader, &mut atn)?;
        self.read_modes(&mut reader, &mut atn)?;
        let sets = self.read_sets(&mut reader)?;
        self.read_transitions(&mut reader, &mut atn, &sets)?;
        self.read_decisions(&mut reader, &mut atn)?;
        if grammar_type == GrammarType::Lexer {
            self.read_lexer_actions(&mut reader, &mut atn)?;
        }

        finalize_atn(&mut atn)?;
        Ok(atn)
    }

    fn check_header(&self, reader: &mut Reader) -> Result<(), ATNDataError> {
        let version = reader.next()?;
        if version != SERIALIZED_VERSION {
            return Err(ATNDataError::new(format!(
                "serialized data version {} does not match runtime version {}",
                version, SERIALIZED_VERSION
            )));
        }
        for expected in SERIALIZED_UUID {
            if reader.next()? != expected {
                return Err(ATNDataError::new(
                    "serialized data UUID does not match the runtime layout",
                ));
            }
        }
        Ok(())
    }

    fn read_states(&self, reader: &mut Reader, atn: &mut ATN) -> Result<(), ATNDataError> {
        let count = reader.next_usize()?;
        for state_number in 0..count {
            let kind_word = reader.next()?;
            let rule_index = reader.next_usize()?;
            let arg = reader.next_usize()?;
            let kind = match kind_word {
                STATE_BASIC => ATNStateKind::Basic,
                STATE_RULE_START => ATNStateKind::RuleStart,
                STATE_BLOCK_START => ATNStateKind::BlockStart,
                STATE_PLUS_BLOCK_START => ATNStateKind::PlusBlockStart,
                STATE_STAR_BLOCK_START => ATNStateKind::StarBlockStart,
                STATE_TOKEN_START => ATNStateKind::TokenStart,
                STATE_RULE_STOP => ATNStateKind::RuleStop,
                STATE_BLOCK_END => ATNStateKind::BlockEnd,
                STATE_STAR_LOOP_BACK => ATNStateKind::StarLoopBack,
                STATE_STAR_LOOP_ENTRY => ATNStateKind::StarLoopEntry,
                STATE_PLUS_LOOP_BACK => ATNStateKind::PlusLoopBack,
                STATE_LOOP_END => ATNStateKind::LoopEnd,
                other => {
                    return Err(ATNDataError::new(format!(
                        "unknown state kind {} for state {}",
                        other, state_number
                    )))
                }
            };
            let mut state = ATNState::new(state_number, kind, rule_index);
            match kind {
                ATNStateKind::BlockStart
                | ATNStateKind::PlusBlockStart
                | ATNStateKind::StarBlockStart => state.block_end = Some(arg),
                ATNStateKind::LoopEnd | ATNStateKind::StarLoopEntry => {
                    state.loop_back = Some(arg)
                }
                _ => {}
            }
            atn.states.push(state);
        }

        let non_greedy = reader.next_usize()?;
        for _ in 0..non_greedy {
            let state = reader.next_usize()?;
            self.state_mut(atn, state)?.non_greedy = true;
        }
        let left_recursive = reader.next_usize()?;
        for _ in 0..left_recursive {
            let state = reader.next_usize()?;
            self.state_mut(atn, state)?.is_left_recursive = true;
        }
        Ok(())
    }

    fn read_rules(&self, reader: &mut Reader, atn: &mut ATN) -> Result<(), ATNDataError> {
        let count = reader.next_usize()?;
        for _ in 0..count {
            let start = reader.next_usize()?;
            let token_type = reader.next()? as i32;
            if start >= atn.states.len() {
                return Err(ATNDataError::new(format!(
                    "rule start state {} is out of range",
                    start
                )));
            }
            atn.rule_to_start_state.push(start);
            atn.rule_to_token_type.push(if token_type == 0 && atn.grammar_type == GrammarType::Lexer
            {
                TOKEN_INVALID_TYPE
            } else {
                token_type
            });
        }
        Ok(())
    }

    fn read_modes(&self, reader: &mut Reader, atn: &mut ATN) -> Result<(), ATNDataError> {
        let count = reader.next_usize()?;
        for _ in 0..count {
            let state = reader.next_usize()?;
            atn.mode_to_start_state.push(state);
        }
        Ok(())
    }

    fn read_sets(&self, reader: &mut Reader) -> Result<Vec<IntervalSet>, ATNDataError> {
        let count = reader.next_usize()?;
        let mut sets = Vec::with_capacity(count);
        for _ in 0..count {
            let intervals = reader.next_usize()?;
            let contains_eof = reader.next_bool()?;
            let mut set = IntervalSet::new();
            if contains_eof {
                set.add_one(TOKEN_EOF);
            }
            for _ in 0..intervals {
                let lo = reader.next()? as i32;
                let hi = reader.next()? as i32;
                set.add_range(lo, hi);
            }
            sets.push(set);
        }
        Ok(sets)
    }

    fn read_transitions(
        &self,
        reader: &mut Reader,
        atn: &mut ATN,
        sets: &[IntervalSet],
    ) -> Result<(), ATNDataError> {
        let count = reader.next_usize()?;
        for _ in 0..count {
            let src = reader.next_usize()?;
            let trg = reader.next_usize()?;
            let kind = reader.next()?;
            let arg1 = reader.next_usize()?;
            let arg2 = reader.next_usize()?;
            let arg3 = reader.next_usize()?;
            if src >= atn.states.len() || trg >= atn.states.len() {
                return Err(ATNDataError::new(format!(
                    "transition endpoints {}->{} out of range",
                    src, trg
                )));
            }
            let transition = match kind {
                TRANSITION_EPSILON => Transition::Epsilon {
                    target: trg,
                    outermost_precedence_return: None,
                },
                TRANSITION_RANGE => Transition::Range {
                    target: trg,
                    lo: arg1 as i32,
                    hi: arg2 as i32,
                },
                TRANSITION_RULE => Transition::Rule {
                    target: trg,
                    rule_index: arg1,
                    precedence: arg2 as i32,
                    follow_state: arg3,
                },
                TRANSITION_PREDICATE => Transition::Predicate {
                    target: trg,
                    rule_index: arg1,
                    pred_index: arg2,
                    is_ctx_dependent: arg3 != 0,
                },
                TRANSITION_ATOM => Transition::Atom {
                    target: trg,
                    label: arg1 as i32,
                },
                TRANSITION_ACTION => Transition::Action {
                    target: trg,
                    rule_index: arg1,
                    action_index: arg2,
                    is_ctx_dependent: arg3 != 0,
                },
                TRANSITION_SET | TRANSITION_NOT_SET => {
                    let set = match sets.get(arg1) {
                        // A missing or empty payload degrades to the set of
                        // the invalid token type, which matches nothing.
                        Some(s) if !s.is_nil() => s.clone(),
                        _ => IntervalSet::of_one(TOKEN_INVALID_TYPE),
                    };
                    if kind == TRANSITION_SET {
                        Transition::Set { target: trg, set }
                    } else {
                        Transition::NotSet { target: trg, set }
                    }
                }
                TRANSITION_WILDCARD => Transition::Wildcard { target: trg },
                TRANSITION_PRECEDENCE => Transition::Precedence {
                    target: trg,
                    precedence: arg1 as i32,
                },
                other => {
                    return Err(ATNDataError::new(format!(
                        "unknown transition kind {}",
                        other
                    )))
                }
            };
            atn.states[src].add_transition(transition);
        }
        Ok(())
    }

    fn read_decisions(&self, reader: &mut Reader, atn: &mut ATN) -> Result<(), ATNDataError> {
        let count = reader.next_usize()?;
        for decision in 0..count {
            let state = reader.next_usize()?;
            self.state_mut(atn, state)?.decision = Some(decision);
            atn.decision_to_state.push(state);
        }
        Ok(())
    }

    fn read_lexer_actions(&self, reader: &mut Reader, atn: &mut ATN) -> Result<(), ATNDataError> {
        let count = reader.next_usize()?;
        for _ in 0..count {
            let kind = reader.next()?;
            let data1 = reader.next_usize()?;
            let data2 = reader.next_usize()?;
            let action = match kind {
                ACTION_CHANNEL => LexerAction::Channel(data1),
                ACTION_CUSTOM => LexerAction::Custom {
                    rule_index: data1,
                    action_index: data2,
                },
                ACTION_MODE => LexerAction::Mode(data1),
                ACTION_MORE => LexerAction::More,
                ACTION_POP_MODE => LexerAction::PopMode,
                ACTION_PUSH_MODE => LexerAction::PushMode(data1),
                ACTION_SKIP => LexerAction::Skip,
                ACTION_TYPE => LexerAction::Type(data1 as i32),
                other => {
                    return Err(ATNDataError::new(format!(
                        "unknown lexer action kind {}",
                        other
                    )))
                }
            };
            atn.lexer_actions.push(action);
        }
        Ok(())
    }

    fn state_mut<'a>(
        &self,
        atn: &'a mut ATN,
        state: usize,
    ) -> Result<&'a mut ATNState, ATNDataError> {
        let count = atn.states.len();
        atn.states
            .get_mut(state)
            .ok_or_else(|| ATNDataError::new(format!("state {} out of range {}", state, count)))
    }
}

/// Post-processing shared by every way of constructing a network: derive
/// the stop-state table, wire the global follow edges, mark precedence
/// decisions and check the structural invariants.
pub(crate) fn finalize_atn(atn: &mut ATN) -> Result<(), ATNDataError> {
    connect_rule_stops(atn);
    mark_precedence_decisions(atn);
    verify(atn)
}

/// Derive the per-rule stop states and give every rule stop the epsilon
/// follow edges closures chase when the stack summary runs out.
fn connect_rule_stops(atn: &mut ATN) {
    atn.rule_to_stop_state = vec![usize::MAX; atn.rule_to_start_state.len()];
    for state in 0..atn.states.len() {
        if atn.states[state].is_rule_stop() {
            let rule = atn.states[state].rule_index;
            if rule < atn.rule_to_stop_state.len() {
                atn.rule_to_stop_state[rule] = state;
            }
        }
    }
    let mut follow_edges: Vec<(usize, usize, Option<usize>)> = Vec::new();
    for state in &atn.states {
        for transition in &state.transitions {
            if let Transition::Rule {
                rule_index,
                precedence,
                follow_state,
                ..
            } = transition
            {
                let start = atn.rule_to_start_state[*rule_index];
                let outermost = if atn.states[start].is_left_recursive && *precedence == 0 {
                    Some(*rule_index)
                } else {
                    None
                };
                follow_edges.push((
                    atn.rule_to_stop_state[*rule_index],
                    *follow_state,
                    outermost,
                ));
            }
        }
    }
    for (stop, follow, outermost) in follow_edges {
        atn.states[stop].add_transition(Transition::Epsilon {
            target: follow,
            outermost_precedence_return: outermost,
        });
    }
}

/// A star-loop entry of a left-recursive rule whose loop exits straight
/// into the rule stop is the precedence decision of that rule.
fn mark_precedence_decisions(atn: &mut ATN) {
    let mut precedence_states = Vec::new();
    for state in &atn.states {
        if state.kind != ATNStateKind::StarLoopEntry {
            continue;
        }
        let rule_start = atn.rule_to_start_state[state.rule_index];
        if !atn.states[rule_start].is_left_recursive {
            continue;
        }
        let maybe_loop_end = match state.transitions.last() {
            Some(t) => t.target(),
            None => continue,
        };
        let loop_end = &atn.states[maybe_loop_end];
        if loop_end.kind == ATNStateKind::LoopEnd
            && loop_end.epsilon_only_transitions
            && loop_end
                .transitions
                .first()
                .map_or(false, |t| atn.states[t.target()].is_rule_stop())
        {
            precedence_states.push(state.state_number);
        }
    }
    for state in precedence_states {
        atn.states[state].is_precedence_decision = true;
    }
}

fn verify(atn: &ATN) -> Result<(), ATNDataError> {
    for (rule, &start) in atn.rule_to_start_state.iter().enumerate() {
        if atn.states[start].kind != ATNStateKind::RuleStart
            || atn.states[start].rule_index != rule
        {
            return Err(ATNDataError::new(format!(
                "rule {} start state is inconsistent",
                rule
            )));
        }
        if atn
            .rule_to_stop_state
            .get(rule)
            .map_or(true, |&s| s == usize::MAX)
        {
            return Err(ATNDataError::new(format!(
                "rule {} has no stop state",
                rule
            )));
        }
    }
    let mut stops_per_rule = vec![0usize; atn.rule_to_start_state.len()];
    for state in &atn.states {
        if state.is_rule_stop() {
            if let Some(count) = stops_per_rule.get_mut(state.rule_index) {
                *count += 1;
            }
        }
    }
    if stops_per_rule.iter().any(|&c| c != 1) {
        return Err(ATNDataError::new("every rule needs exactly one stop state"));
    }
    for &decision in &atn.decision_to_state {
        let state = &atn.states[decision];
        let minimum = if state.kind == ATNStateKind::TokenStart {
            1
        } else {
            2
        };
        if state.transitions.len() < minimum {
            return Err(ATNDataError::new(format!(
                "decision state {} has too few transitions",
                decision
            )));
        }
    }
    Ok(())
}
