use super::{Code, Position};
use once_cell::unsync::OnceCell;

impl From<&str> for Code {
    fn from(value: &str) -> Self {
        Code::new(value)
    }
}
impl From<String> for Code {
    fn from(value: String) -> Self {
        Code::new(value)
    }
}

impl Code {
    pub fn new<T: Into<String>>(value: T) -> Self {
        let text: String = value.into();
        let points = text.chars().collect();
        Self {
            text,
            points,
            line_breaks: OnceCell::new(),
        }
    }

    /// Number of code points in the input.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn char_at(&self, pointer: usize) -> Option<char> {
        self.points.get(pointer).copied()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Extract the text between two code point offsets, both inclusive.
    pub fn text_range(&self, start: usize, stop: usize) -> String {
        if start >= self.points.len() || stop < start {
            return String::new();
        }
        let stop = std::cmp::min(stop, self.points.len() - 1);
        self.points[start..=stop].iter().collect()
    }

    pub fn obtain_line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.points
                .iter()
                .enumerate()
                .filter_map(|(index, c)| if *c == '\n' { Some(index) } else { None })
                .collect()
        })
    }

    /// Locate the line and column of a code point offset.
    pub fn obtain_position(&self, pointer: usize) -> Position {
        let line_breaks = self.obtain_line_breaks();
        let index = match line_breaks.binary_search(&pointer) {
            Ok(index) | Err(index) => index,
        };

        if index == 0 {
            Position::new(1, pointer + 1)
        } else {
            let break_point = line_breaks[index - 1] + 1;
            Position::new(index + 1, pointer - break_point + 1)
        }
    }
}
