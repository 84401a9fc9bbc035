use serde::{Deserialize, Serialize};

/// A feed value that is either well typed or kept verbatim as malformed JSON.
///
/// The feed is produced by a loosely typed store, so a single bad cell must
/// not fail deserialization of the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field<T> {
    Value(T),
    Malformed(serde_json::Value),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            Field::Malformed(_) => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Field::Malformed(_))
    }
}

impl<T: Copy> Field<T> {
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FlagError {
    #[error("flag must be a boolean or 0/1, got {0}")]
    OutOfRange(i64),
}

/// Boolean column as written by the slot store: `true`/`false` or `0`/`1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FlagRepr", into = "bool")]
pub struct Flag(pub bool);

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
}

impl TryFrom<FlagRepr> for Flag {
    type Error = FlagError;

    fn try_from(repr: FlagRepr) -> Result<Self, Self::Error> {
        match repr {
            FlagRepr::Bool(b) => Ok(Flag(b)),
            FlagRepr::Int(0) => Ok(Flag(false)),
            FlagRepr::Int(1) => Ok(Flag(true)),
            FlagRepr::Int(other) => Err(FlagError::OutOfRange(other)),
        }
    }
}

impl From<Flag> for bool {
    fn from(flag: Flag) -> Self {
        flag.0
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Flag(b)
    }
}
