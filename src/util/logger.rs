use std::fmt::{Display, Formatter};

use super::Log;

impl<T> Log<T> {
    /// Verbosity rank of this setting; a higher rank prints everything a
    /// lower one does.
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }

    /// Whether messages at `level` are printed under this setting. The
    /// simulators guard their trace output with this.
    pub fn enabled(&self, level: Log<()>) -> bool {
        self.order() >= level.order()
    }

    /// The label attached to the setting, if any.
    pub fn label(&self) -> Option<&T> {
        match self {
            Log::None => None,
            Log::Default(label)
            | Log::Success(label)
            | Log::Result(label)
            | Log::Verbose(label) => Some(label),
        }
    }
}

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{}", label),
            None => Ok(()),
        }
    }
}
