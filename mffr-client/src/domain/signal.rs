use std::fmt;

use serde::{Deserialize, Serialize};

/// Activation direction of a reserve slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Discharge / increase.
    #[serde(rename = "UP")]
    Up,
    /// Charge / decrease.
    #[serde(rename = "DOWN")]
    Down,
}

impl Signal {
    /// Exact, case-sensitive match on the feed value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UP" => Some(Signal::Up),
            "DOWN" => Some(Signal::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Up => "UP",
            Signal::Down => "DOWN",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_exact() {
        assert_eq!(Signal::parse("UP"), Some(Signal::Up));
        assert_eq!(Signal::parse("DOWN"), Some(Signal::Down));
        assert_eq!(Signal::parse("up"), None);
        assert_eq!(Signal::parse(""), None);
    }
}
