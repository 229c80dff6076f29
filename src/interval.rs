use std::cmp::{max, min};
use std::fmt::{Debug, Display, Formatter, Write};

use crate::token::{Vocabulary, TOKEN_EOF, TOKEN_EPSILON};

/// A closed range of symbol values, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub a: i32,
    pub b: i32,
}

impl Interval {
    pub fn of(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> usize {
        if self.b < self.a {
            0
        } else {
            (self.b - self.a) as usize + 1
        }
    }
}

/// An ordered set of symbol values kept as sorted, non-overlapping and
/// non-adjacent closed ranges.
///
/// The set is used both for token sets of a parser decision, where the
/// universe is `[MIN_USER_TOKEN_TYPE, max_token_type]`, and for character
/// sets of a lexer rule, where the universe is `[0, 0x10FFFF]`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
    read_only: bool,
}

/// Upper bound of the lexer symbol universe.
pub const MAX_CHAR_VALUE: i32 = 0x10FFFF;

impl IntervalSet {
    pub fn new() -> Self {
        Self {
            intervals: Vec::new(),
            read_only: false,
        }
    }

    pub fn of_one(value: i32) -> Self {
        let mut s = Self::new();
        s.add_one(value);
        s
    }

    pub fn of(lo: i32, hi: i32) -> Self {
        let mut s = Self::new();
        s.add_range(lo, hi);
        s
    }

    pub fn add_one(&mut self, value: i32) {
        self.add_range(value, value);
    }

    /// Add the closed range `[lo, hi]`, merging overlapping or adjacent
    /// ranges so the normalization invariant holds after the mutation.
    pub fn add_range(&mut self, lo: i32, hi: i32) {
        if self.read_only {
            panic!("Attempting to modify a read only IntervalSet");
        }
        if hi < lo {
            return;
        }
        let at = match self.intervals.binary_search_by_key(&lo, |iv| iv.a) {
            Ok(index) | Err(index) => index,
        };
        // The new range may coalesce with the predecessor as well as with any
        // number of successors.
        let mut start = at;
        if at > 0 && adjacent_or_overlapping(self.intervals[at - 1].b, lo) {
            start = at - 1;
        }
        let mut end = start;
        let mut merged = Interval::of(lo, hi);
        while end < self.intervals.len() && adjacent_or_overlapping(merged.b, self.intervals[end].a)
        {
            merged.a = min(merged.a, self.intervals[end].a);
            merged.b = max(merged.b, self.intervals[end].b);
            end += 1;
        }
        self.intervals.splice(start..end, [merged]);
    }

    pub fn add_set(&mut self, other: &IntervalSet) {
        for iv in &other.intervals {
            self.add_range(iv.a, iv.b);
        }
    }

    pub fn contains(&self, value: i32) -> bool {
        self.intervals
            .binary_search_by(|iv| {
                if value < iv.a {
                    std::cmp::Ordering::Greater
                } else if value > iv.b {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// The complement of self within the universe `[universe_min, universe_max]`.
    pub fn complement(&self, universe_min: i32, universe_max: i32) -> IntervalSet {
        let mut result = IntervalSet::new();
        let mut next = universe_min;
        for iv in &self.intervals {
            if iv.b < universe_min {
                continue;
            }
            if iv.a > universe_max {
                break;
            }
            if iv.a > next {
                result.add_range(next, iv.a - 1);
            }
            if iv.b == i32::MAX {
                return result;
            }
            next = max(next, iv.b + 1);
        }
        if next <= universe_max {
            result.add_range(next, universe_max);
        }
        result
    }

    pub fn and(&self, other: &IntervalSet) -> IntervalSet {
        let mut result = IntervalSet::new();
        let (mut i, mut j) = (0, 0);
        while i < self.intervals.len() && j < other.intervals.len() {
            let x = self.intervals[i];
            let y = other.intervals[j];
            let lo = max(x.a, y.a);
            let hi = min(x.b, y.b);
            if lo <= hi {
                result.add_range(lo, hi);
            }
            if x.b < y.b {
                i += 1;
            } else {
                j += 1;
            }
        }
        result
    }

    pub fn or(&self, other: &IntervalSet) -> IntervalSet {
        let mut result = self.clone();
        result.read_only = false;
        result.add_set(other);
        result
    }

    pub fn subtract(&self, other: &IntervalSet) -> IntervalSet {
        if other.is_nil() {
            let mut r = self.clone();
            r.read_only = false;
            return r;
        }
        // a - b == a ∩ complement(b) over a universe covering both sets.
        let lo = min(self.min_element().unwrap_or(0), other.min_element().unwrap_or(0));
        let hi = max(self.max_element().unwrap_or(0), other.max_element().unwrap_or(0));
        self.and(&other.complement(lo, hi))
    }

    pub fn is_nil(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Total number of elements across all ranges.
    pub fn size(&self) -> usize {
        self.intervals.iter().map(|iv| iv.length()).sum()
    }

    pub fn min_element(&self) -> Option<i32> {
        self.intervals.first().map(|iv| iv.a)
    }

    pub fn max_element(&self) -> Option<i32> {
        self.intervals.last().map(|iv| iv.b)
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Render the set against a vocabulary, e.g. `{'=', ID}`.
    pub fn display_with_vocabulary(&self, vocabulary: &Vocabulary) -> String {
        let mut out = String::new();
        if self.size() > 1 {
            out.push('{');
        }
        let mut first = true;
        for iv in &self.intervals {
            for value in iv.a..=iv.b {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                match value {
                    TOKEN_EOF => out.push_str("<EOF>"),
                    TOKEN_EPSILON => out.push_str("<EPSILON>"),
                    _ => out.push_str(&vocabulary.display_name(value)),
                }
            }
        }
        if self.size() > 1 {
            out.push('}');
        }
        out
    }
}

fn adjacent_or_overlapping(left_hi: i32, right_lo: i32) -> bool {
    right_lo <= left_hi.saturating_add(1)
}

impl Display for IntervalSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_nil() {
            return write!(f, "{{}}");
        }
        f.write_char('{')?;
        for (index, iv) in self.intervals.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            if iv.a == iv.b {
                write!(f, "{}", iv.a)?;
            } else {
                write!(f, "{}..{}", iv.a, iv.b)?;
            }
        }
        f.write_char('}')
    }
}

impl Debug for IntervalSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn ranges_are_normalized_after_mutation() {
        let mut s = IntervalSet::new();
        s.add_range(10, 20);
        s.add_range(30, 40);
        s.add_range(21, 29);
        assert_eq!(s.intervals().len(), 1);
        assert_eq!(s.intervals()[0], Interval::of(10, 40));

        s.add_one(42);
        assert_eq!(s.intervals().len(), 2);
        s.add_one(41);
        assert_eq!(s.intervals().len(), 1, "adjacent values must coalesce");
    }

    #[test]
    fn complement_round_trips_inside_universe() {
        let mut s = IntervalSet::new();
        s.add_range(5, 9);
        s.add_one(20);
        let complement = s.complement(0, 30);
        assert!(!complement.contains(7));
        assert!(complement.contains(4));
        assert!(complement.contains(30));
        assert_eq!(complement.complement(0, 30), s);
        assert!(s.and(&complement).is_nil());
    }

    #[test]
    fn or_behaves_like_set_union() {
        let s = IntervalSet::of(1, 4);
        let t = IntervalSet::of_one(9);
        let u = s.or(&t);
        for x in 0..12 {
            assert_eq!(u.contains(x), s.contains(x) || t.contains(x), "x = {}", x);
        }
        assert_eq!(u.size(), 5);
    }

    #[test]
    fn subtract_removes_only_shared_elements() {
        let s = IntervalSet::of(1, 10);
        let t = IntervalSet::of(4, 6);
        let d = s.subtract(&t);
        assert_eq!(d.size(), 7);
        assert!(d.contains(3) && d.contains(7) && !d.contains(5));
    }

    #[test]
    fn min_element_reads_first_range() {
        let mut s = IntervalSet::new();
        s.add_range(7, 9);
        s.add_range(2, 3);
        assert_eq!(s.min_element(), Some(2));
        assert_eq!(s.max_element(), Some(9));
    }

    #[test]
    #[should_panic(expected = "read only")]
    fn frozen_set_rejects_mutation() {
        let mut s = IntervalSet::of(1, 2);
        s.set_read_only(true);
        s.add_one(5);
    }
}
