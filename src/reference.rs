use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Shipment reference code: `P`, two uppercase letters, six ASCII digits.
const CORE_REFERENCE_PATTERN: &str = r"P[A-Z]{2}[0-9]{6}";

fn core_reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CORE_REFERENCE_PATTERN).expect("core reference pattern compiles"))
}

/// Canonical shipment identifier extracted from a raw reference string.
///
/// Raw references often carry prefixes or suffixes (`RPVI251574`,
/// `PVI251574A`); the core is the first `P[A-Z]{2}[0-9]{6}` match inside them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CoreReference(String);

impl CoreReference {
    /// Extracts the first core match, or `None` when the raw string has none.
    pub fn extract(raw: &str) -> Option<Self> {
        core_reference_regex()
            .find(raw)
            .map(|m| Self(m.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the raw reference is the bare core with nothing around it.
    pub fn matches_exactly(&self, raw: &str) -> bool {
        self.0 == raw
    }
}

impl fmt::Display for CoreReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CoreReference {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::extract(&raw).ok_or_else(|| format!("'{}' contains no core reference", raw))
    }
}

impl From<CoreReference> for String {
    fn from(core: CoreReference) -> Self {
        core.0
    }
}
