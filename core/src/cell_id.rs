use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const CELL_ID_SEPARATOR: char = '-';

/// Grid position addressed as `"{row}-{col}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId {
    pub row: u32,
    pub col: u32,
}

impl CellId {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn parse(value: &str) -> Result<Self, CellIdError> {
        let Some((row, col)) = value.split_once(CELL_ID_SEPARATOR) else {
            return Err(CellIdError::MissingSeparator {
                value: value.to_string(),
            });
        };
        let row = parse_index(row, value)?;
        let col = parse_index(col, value)?;
        Ok(Self { row, col })
    }
}

fn parse_index(part: &str, value: &str) -> Result<u32, CellIdError> {
    // One spelling per cell: "01-0" would alias "1-0".
    let non_canonical = part.len() > 1 && part.starts_with('0');
    if part.is_empty() || non_canonical || !part.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(CellIdError::InvalidIndex {
            value: value.to_string(),
            part: part.to_string(),
        });
    }
    part.parse::<u32>().map_err(|_| CellIdError::InvalidIndex {
        value: value.to_string(),
        part: part.to_string(),
    })
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.row, CELL_ID_SEPARATOR, self.col)
    }
}

impl std::str::FromStr for CellId {
    type Err = CellIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellIdError {
    MissingSeparator { value: String },
    InvalidIndex { value: String, part: String },
}

impl fmt::Display for CellIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellIdError::MissingSeparator { value } => {
                write!(f, "cell id '{value}' must look like row-col")
            }
            CellIdError::InvalidIndex { value, part } => {
                write!(f, "invalid index '{part}' in cell id '{value}'")
            }
        }
    }
}

impl std::error::Error for CellIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_keys_only() {
        assert_eq!(CellId::parse("0-0"), Ok(CellId::new(0, 0)));
        assert_eq!(CellId::parse("10-3"), Ok(CellId::new(10, 3)));
        assert!(matches!(CellId::parse("01-0"), Err(CellIdError::InvalidIndex { .. })));
        assert!(matches!(CellId::parse("1-00"), Err(CellIdError::InvalidIndex { .. })));
        assert!(matches!(CellId::parse("1-+2"), Err(CellIdError::InvalidIndex { .. })));
        assert!(matches!(CellId::parse("12"), Err(CellIdError::MissingSeparator { .. })));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let cell = CellId::new(7, 2);
        assert_eq!(cell.to_string(), "7-2");
        assert_eq!(cell.to_string().parse::<CellId>(), Ok(cell));
    }
}
