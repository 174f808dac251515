use serde::{Deserialize, Serialize};

/// Opaque, case-insensitive unit identifier (a currency code in practice).
/// Stored lower-cased so `USD`, `usd` and ` Usd ` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitCode(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitCodeError {
    Empty,
}

impl std::fmt::Display for UnitCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            UnitCodeError::Empty => write!(f, "unit code must not be empty"),
        }
    }
}

impl std::error::Error for UnitCodeError {}

impl UnitCode {
    pub fn new(raw: &str) -> Result<Self, UnitCodeError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(UnitCodeError::Empty);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-case form used for display labels.
    pub fn display_label(&self) -> String {
        self.0.to_uppercase()
    }
}

impl std::str::FromStr for UnitCode {
    type Err = UnitCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UnitCode {
    type Error = UnitCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<UnitCode> for String {
    fn from(code: UnitCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for UnitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
