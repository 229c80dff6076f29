use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

use ptree::TreeItem;

use crate::token::Token;

/// One rule invocation frame of the parse, doubling as the interior node of
/// the parse tree.
///
/// Nodes are shared through `Rc` and mutated through interior cells while
/// the parse is in flight: left-recursive rule handling re-parents nodes and
/// rewrites their invoking state after the fact. The parent link is weak;
/// ownership always flows root-to-leaf through the child lists.
pub struct ParserRuleContext {
    parent: RefCell<Option<Weak<ParserRuleContext>>>,
    invoking_state: Cell<Option<usize>>,
    rule_index: usize,
    start: RefCell<Option<Token>>,
    stop: RefCell<Option<Token>>,
    children: RefCell<Vec<ParseTree>>,
}

/// A node of the parse tree.
#[derive(Clone)]
pub enum ParseTree {
    Rule(Rc<ParserRuleContext>),
    Terminal(Token),
    /// A token synthesized or skipped during error recovery.
    Error(Token),
}

impl ParserRuleContext {
    pub fn new(
        parent: Option<&Rc<ParserRuleContext>>,
        invoking_state: Option<usize>,
        rule_index: usize,
    ) -> Rc<Self> {
        Rc::new(Self {
            parent: RefCell::new(parent.map(Rc::downgrade)),
            invoking_state: Cell::new(invoking_state),
            rule_index,
            start: RefCell::new(None),
            stop: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    pub fn parent(&self) -> Option<Rc<ParserRuleContext>> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn set_parent(&self, parent: Option<&Rc<ParserRuleContext>>) {
        *self.parent.borrow_mut() = parent.map(Rc::downgrade);
    }

    pub fn invoking_state(&self) -> Option<usize> {
        self.invoking_state.get()
    }

    pub fn set_invoking_state(&self, state: Option<usize>) {
        self.invoking_state.set(state);
    }

    pub fn rule_index(&self) -> usize {
        self.rule_index
    }

    /// A context is empty when nothing invoked it, i.e. it is the root.
    pub fn is_empty(&self) -> bool {
        self.invoking_state.get().is_none()
    }

    pub fn start(&self) -> Option<Token> {
        self.start.borrow().clone()
    }

    pub fn set_start(&self, token: Option<Token>) {
        *self.start.borrow_mut() = token;
    }

    pub fn stop(&self) -> Option<Token> {
        self.stop.borrow().clone()
    }

    pub fn set_stop(&self, token: Option<Token>) {
        *self.stop.borrow_mut() = token;
    }

    pub fn add_child(&self, child: ParseTree) {
        self.children.borrow_mut().push(child);
    }

    /// Remove the most recently added child; error recovery uses this to
    /// drop a speculatively attached node.
    pub fn remove_last_child(&self) {
        self.children.borrow_mut().pop();
    }

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn child(&self, index: usize) -> Option<ParseTree> {
        self.children.borrow().get(index).cloned()
    }

    pub fn children(&self) -> Vec<ParseTree> {
        self.children.borrow().clone()
    }

    pub fn rule_child(&self, index: usize) -> Option<Rc<ParserRuleContext>> {
        self.children
            .borrow()
            .iter()
            .filter_map(|c| match c {
                ParseTree::Rule(r) => Some(r.clone()),
                _ => None,
            })
            .nth(index)
    }

    pub fn token_child(&self, index: usize) -> Option<Token> {
        self.children
            .borrow()
            .iter()
            .filter_map(|c| match c {
                ParseTree::Terminal(t) | ParseTree::Error(t) => Some(t.clone()),
                _ => None,
            })
            .nth(index)
    }

    /// Concatenated text of every terminal below this node.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in self.children.borrow().iter() {
            match child {
                ParseTree::Rule(r) => out.push_str(&r.text()),
                ParseTree::Terminal(t) | ParseTree::Error(t) => out.push_str(&t.text),
            }
        }
        out
    }

    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.parent();
        while let Some(p) = current {
            depth += 1;
            current = p.parent();
        }
        depth
    }
}

impl Debug for ParserRuleContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRuleContext")
            .field("rule_index", &self.rule_index)
            .field("invoking_state", &self.invoking_state.get())
            .field("children", &self.child_count())
            .finish()
    }
}

impl ParseTree {
    /// Render the tree in the compact parenthesized form, e.g.
    /// `(expr (expr 1) + (expr 2))`.
    pub fn to_string_tree(&self, rule_names: &[&str]) -> String {
        match self {
            ParseTree::Terminal(t) | ParseTree::Error(t) => {
                if t.is_eof() {
                    "<EOF>".to_string()
                } else {
                    t.text.clone()
                }
            }
            ParseTree::Rule(ctx) => {
                let name = rule_names
                    .get(ctx.rule_index())
                    .copied()
                    .unwrap_or("<unknown>");
                let mut out = format!("({}", name);
                for child in ctx.children() {
                    out.push(' ');
                    out.push_str(&child.to_string_tree(rule_names));
                }
                out.push(')');
                out
            }
        }
    }

    pub fn contains_rule(&self, rule_index: usize) -> bool {
        match self {
            ParseTree::Rule(ctx) => {
                ctx.rule_index() == rule_index
                    || ctx.children().iter().any(|c| c.contains_rule(rule_index))
            }
            _ => false,
        }
    }

    /// Search through all nested children and return the first rule node
    /// matching the predicate.
    pub fn find_tree<F: Fn(&Rc<ParserRuleContext>) -> bool>(
        &self,
        predicate: &F,
    ) -> Option<Rc<ParserRuleContext>> {
        match self {
            ParseTree::Rule(ctx) => {
                if predicate(ctx) {
                    return Some(ctx.clone());
                }
                ctx.children()
                    .iter()
                    .find_map(|child| child.find_tree(predicate))
            }
            _ => None,
        }
    }

    pub fn print(&self, rule_names: &[&str]) -> Result<(), std::io::Error> {
        ptree::print_tree(&TreeDisplay {
            node: self.clone(),
            rule_names: Rc::new(rule_names.iter().map(|n| n.to_string()).collect()),
        })
    }
}

#[derive(Clone)]
struct TreeDisplay {
    node: ParseTree,
    rule_names: Rc<Vec<String>>,
}

impl TreeItem for TreeDisplay {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match &self.node {
            ParseTree::Rule(ctx) => {
                let name = self
                    .rule_names
                    .get(ctx.rule_index())
                    .map(|n| n.as_str())
                    .unwrap_or("<unknown>");
                write!(f, "{}", name)
            }
            ParseTree::Terminal(t) => write!(f, "{:?} # {}-{}", t.text, t.start, t.stop),
            ParseTree::Error(t) => write!(f, "<error {:?}>", t.text),
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        match &self.node {
            ParseTree::Rule(ctx) => Cow::from(
                ctx.children()
                    .into_iter()
                    .map(|c| TreeDisplay {
                        node: c,
                        rule_names: self.rule_names.clone(),
                    })
                    .collect::<Vec<_>>(),
            ),
            _ => Cow::from(Vec::new()),
        }
    }
}
