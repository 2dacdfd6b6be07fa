// Canonical reference-data model
//
// Every provider adapter emits these records. They are created in bulk during a
// load, never mutated, and dropped together with the generation that owns them.
//
// Fields:
// - adif: ADIF/ARRL DXCC entity number
// - continent: Two-letter continent code (NA, SA, EU, AF, AS, OC, AN)
// - cq_zone: CQ zone number (1-40)
// - itu_zone: ITU zone number (1-90)
// - latitude/longitude: degrees, north and east positive

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::callsign::ParsedCallsign;
use crate::error::{LookupError, Result};

/// ADIF number providers give to calls that count for no DXCC entity
pub const NO_DXCC: u16 = 0;

/// Half-open validity window `[from, to)`; `None` means unbounded on that side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Window")]
pub struct Validity {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct Window {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

impl TryFrom<Window> for Validity {
    type Error = LookupError;

    fn try_from(window: Window) -> Result<Self> {
        Validity::new(window.from, window.to)
    }
}

impl Validity {
    /// Window with no bounds (always valid)
    pub const ALWAYS: Validity = Validity { from: None, to: None };

    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from >= to {
                return Err(LookupError::InvalidWindow { from, to });
            }
        }
        Ok(Self { from, to })
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.from
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.to
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| from <= at) && self.to.map_or(true, |to| at < to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Continent {
    AF,
    AN,
    AS,
    EU,
    NA,
    OC,
    SA,
}

impl Continent {
    pub fn code(&self) -> &'static str {
        match self {
            Continent::AF => "AF",
            Continent::AN => "AN",
            Continent::AS => "AS",
            Continent::EU => "EU",
            Continent::NA => "NA",
            Continent::OC => "OC",
            Continent::SA => "SA",
        }
    }
}

impl FromStr for Continent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AF" => Ok(Continent::AF),
            "AN" => Ok(Continent::AN),
            "AS" => Ok(Continent::AS),
            "EU" => Ok(Continent::EU),
            "NA" => Ok(Continent::NA),
            "OC" => Ok(Continent::OC),
            "SA" => Ok(Continent::SA),
            other => Err(format!("unknown continent code {:?}", other)),
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A DXCC entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub adif: u16,
    pub name: String,
    /// Primary prefix as published by the provider (e.g. "DL")
    pub prefix: String,
    pub continent: Continent,
    pub cq_zone: u8,
    /// Not every provider publishes ITU zones
    pub itu_zone: Option<u8>,
    pub latitude: f64,
    pub longitude: f64,
    pub validity: Validity,
    pub deleted: bool,
    /// Clublog only accepts this entity's QSOs from calls it lists
    #[serde(default)]
    pub whitelist: bool,
    #[serde(default)]
    pub whitelist_validity: Option<Validity>,
}

/// Per-rule deviations from the referenced entity's defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    pub cq_zone: Option<u8>,
    pub itu_zone: Option<u8>,
    pub continent: Option<Continent>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        *self == Overrides::default()
    }

    /// The entity as seen through this rule
    pub fn apply(&self, entity: &Entity) -> Entity {
        let mut out = entity.clone();
        if let Some(cq) = self.cq_zone {
            out.cq_zone = cq;
        }
        if let Some(itu) = self.itu_zone {
            out.itu_zone = Some(itu);
        }
        if let Some(cont) = self.continent {
            out.continent = cont;
        }
        if let Some(lat) = self.latitude {
            out.latitude = lat;
        }
        if let Some(lon) = self.longitude {
            out.longitude = lon;
        }
        out
    }
}

/// One position of a prefix pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Atom {
    Literal(char),
    /// Any digit 0-9
    Digit,
    /// Any letter A-Z
    Letter,
    /// Any letter or digit
    Any,
}

impl Atom {
    pub fn matches(&self, c: char) -> bool {
        match self {
            Atom::Literal(l) => *l == c,
            Atom::Digit => c.is_ascii_digit(),
            Atom::Letter => c.is_ascii_uppercase(),
            Atom::Any => c.is_ascii_alphanumeric(),
        }
    }
}

/// Normalized prefix pattern; provider wildcard syntax is translated at load time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern(Vec<Atom>);

impl Pattern {
    /// Pattern made of literal characters only
    pub fn literal(text: &str) -> Self {
        Pattern(text.trim().to_uppercase().chars().map(Atom::Literal).collect())
    }

    /// Pattern using `#` for a digit, `@` for a letter and `?` for either
    pub fn with_wildcards(text: &str) -> Self {
        Pattern(
            text.trim()
                .to_uppercase()
                .chars()
                .map(|c| match c {
                    '#' => Atom::Digit,
                    '@' => Atom::Letter,
                    '?' => Atom::Any,
                    other => Atom::Literal(other),
                })
                .collect(),
        )
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of characters the pattern consumes when it matches
    pub fn specificity(&self) -> usize {
        self.0.len()
    }

    pub fn literal_count(&self) -> usize {
        self.0.iter().filter(|a| matches!(a, Atom::Literal(_))).count()
    }

    pub fn matches_start_of(&self, text: &str) -> bool {
        let mut chars = text.chars();
        self.0.iter().all(|atom| chars.next().map_or(false, |c| atom.matches(c)))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for atom in &self.0 {
            match atom {
                Atom::Literal(c) => write!(f, "{}", c)?,
                Atom::Digit => f.write_str("#")?,
                Atom::Letter => f.write_str("@")?,
                Atom::Any => f.write_str("?")?,
            }
        }
        Ok(())
    }
}

/// Maps a callsign prefix pattern to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixRule {
    pub pattern: Pattern,
    pub adif: u16,
    pub overrides: Overrides,
    pub validity: Validity,
    /// Provider marks this pattern as the default for an ambiguous prefix
    pub primary: bool,
    pub provider: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionKind {
    /// Matches the complete callsign only
    Exact,
    /// Matches any callsign starting with the text
    Prefix,
}

/// A callsign whose entity deviates from its apparent prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    pub call: String,
    pub kind: ExceptionKind,
    /// `NO_DXCC` when the call counts for no entity at all
    pub adif: u16,
    pub overrides: Overrides,
    pub validity: Validity,
    pub provider: String,
}

impl Exception {
    pub fn is_no_dxcc(&self) -> bool {
        self.adif == NO_DXCC
    }
}

/// CQ zone assignment for a call that differs from its entity's zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneException {
    pub call: String,
    pub cq_zone: u8,
    pub validity: Validity,
    pub provider: String,
}

/// Operation known not to count for DXCC during the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidOperation {
    pub call: String,
    pub validity: Validity,
    pub provider: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    Exception,
    Prefix,
}

/// Which part of the input produced the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchedVia {
    /// The complete normalized input, modifiers included
    FullCall,
    /// The leading prefix modifier (e.g. "DL" in "DL/W1AW")
    Modifier,
    Base,
}

/// Result of resolving one callsign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    /// Normalized input
    pub callsign: String,
    pub parsed: ParsedCallsign,
    /// Entity with the matching rule's overrides applied
    pub entity: Entity,
    pub source: MatchSource,
    /// Exception call or prefix pattern that matched
    pub matched: String,
    pub via: MatchedVia,
    /// Validity window of the matching rule
    pub validity: Validity,
    pub generation: Uuid,
}
