// Callsign Tokenizer
//
// Splits a raw callsign into base call, leading prefix modifier and trailing
// suffix modifiers. Amateur callsign conventions are not a strict grammar, so
// this is a heuristic:
//
//   DL/W1AW/P  -> prefix "DL", base "W1AW", suffixes [Portable]
//   W1AW/MM    -> base "W1AW", suffixes [MaritimeMobile]
//   KH6/W1AW   -> prefix "KH6", base "W1AW"
//
// The base is the longest segment that has at least one letter and one digit
// and is 3+ characters long. Equal-length candidates resolve to the leftmost.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};

/// Trailing modifier after the base call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    /// /P
    Portable,
    /// /M
    Mobile,
    /// /MM
    MaritimeMobile,
    /// /AM
    AeronauticalMobile,
    /// /QRP
    Qrp,
    /// Single digit call area, e.g. W1AW/4
    CallArea(u8),
    /// 1-3 character country prefix, e.g. W1AW/KH6
    CountryPrefix(String),
    Other(String),
}

impl Modifier {
    pub fn parse(segment: &str) -> Self {
        match segment {
            "P" => Modifier::Portable,
            "M" => Modifier::Mobile,
            "MM" => Modifier::MaritimeMobile,
            "AM" => Modifier::AeronauticalMobile,
            "QRP" => Modifier::Qrp,
            s if s.len() == 1 && s.as_bytes()[0].is_ascii_digit() => {
                Modifier::CallArea(s.as_bytes()[0] - b'0')
            }
            s if (1..=3).contains(&s.len())
                && s.chars().all(|c| c.is_ascii_alphanumeric())
                && s.chars().any(|c| c.is_ascii_alphabetic()) =>
            {
                Modifier::CountryPrefix(s.to_string())
            }
            s => Modifier::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> String {
        match self {
            Modifier::Portable => "P".to_string(),
            Modifier::Mobile => "M".to_string(),
            Modifier::MaritimeMobile => "MM".to_string(),
            Modifier::AeronauticalMobile => "AM".to_string(),
            Modifier::Qrp => "QRP".to_string(),
            Modifier::CallArea(n) => n.to_string(),
            Modifier::CountryPrefix(s) | Modifier::Other(s) => s.clone(),
        }
    }
}

/// Structural decomposition of a callsign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCallsign {
    /// Core call without modifiers
    pub base: String,
    /// Segment before the base, e.g. "DL" in "DL/W1AW"
    pub prefix_modifier: Option<String>,
    /// Segments after the base, in input order
    pub suffix_modifiers: Vec<Modifier>,
}

impl ParsedCallsign {
    pub fn is_maritime_mobile(&self) -> bool {
        self.suffix_modifiers.contains(&Modifier::MaritimeMobile)
    }

    pub fn has_modifiers(&self) -> bool {
        self.prefix_modifier.is_some() || !self.suffix_modifiers.is_empty()
    }
}

/// Canonical spelling: segments joined by '/', empty segments dropped
impl fmt::Display for ParsedCallsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix_modifier {
            write!(f, "{}/", prefix)?;
        }
        f.write_str(&self.base)?;
        for modifier in &self.suffix_modifiers {
            write!(f, "/{}", modifier.as_str())?;
        }
        Ok(())
    }
}

/// Uppercase and strip surrounding whitespace
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn is_plausible_base(segment: &str) -> bool {
    segment.len() >= 3
        && segment.chars().all(|c| c.is_ascii_alphanumeric())
        && segment.chars().any(|c| c.is_ascii_digit())
        && segment.chars().any(|c| c.is_ascii_alphabetic())
}

/// Tokenize a raw callsign
pub fn tokenize(raw: &str) -> Result<ParsedCallsign> {
    let call = normalize(raw);
    let malformed = || LookupError::MalformedCallsign { input: raw.to_string() };

    let segments: Vec<&str> = call.split('/').filter(|s| !s.is_empty()).collect();

    let mut base_idx: Option<usize> = None;
    for (i, segment) in segments.iter().enumerate() {
        if !is_plausible_base(segment) {
            continue;
        }
        match base_idx {
            Some(best) if segments[best].len() >= segment.len() => {}
            _ => base_idx = Some(i),
        }
    }
    let base_idx = base_idx.ok_or_else(malformed)?;

    // Only one segment may precede the base
    if base_idx > 1 {
        return Err(malformed());
    }

    Ok(ParsedCallsign {
        base: segments[base_idx].to_string(),
        prefix_modifier: (base_idx == 1).then(|| segments[0].to_string()),
        suffix_modifiers: segments[base_idx + 1..].iter().map(|s| Modifier::parse(s)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_call() {
        let parsed = tokenize("  dh1tw ").unwrap();
        assert_eq!(parsed.base, "DH1TW");
        assert_eq!(parsed.prefix_modifier, None);
        assert!(parsed.suffix_modifiers.is_empty());
    }

    #[test]
    fn test_maritime_mobile() {
        let parsed = tokenize("W1AW/MM").unwrap();
        assert_eq!(parsed.base, "W1AW");
        assert_eq!(parsed.suffix_modifiers, vec![Modifier::MaritimeMobile]);
        assert!(parsed.is_maritime_mobile());
    }

    #[test]
    fn test_prefix_and_suffix() {
        let parsed = tokenize("DL/W1AW/P").unwrap();
        assert_eq!(parsed.base, "W1AW");
        assert_eq!(parsed.prefix_modifier.as_deref(), Some("DL"));
        assert_eq!(parsed.suffix_modifiers, vec![Modifier::Portable]);
    }

    #[test]
    fn test_longest_segment_is_base() {
        let parsed = tokenize("KH6/W1AW").unwrap();
        assert_eq!(parsed.base, "W1AW");
        assert_eq!(parsed.prefix_modifier.as_deref(), Some("KH6"));

        let parsed = tokenize("W1AW/KH6").unwrap();
        assert_eq!(parsed.base, "W1AW");
        assert_eq!(parsed.suffix_modifiers, vec![Modifier::CountryPrefix("KH6".to_string())]);
    }

    #[test]
    fn test_suffix_vocabulary() {
        let parsed = tokenize("G4ABC/AM/QRP/4/M").unwrap();
        assert_eq!(
            parsed.suffix_modifiers,
            vec![
                Modifier::AeronauticalMobile,
                Modifier::Qrp,
                Modifier::CallArea(4),
                Modifier::Mobile,
            ]
        );
        assert_eq!(parsed.suffix_modifiers[1].as_str(), "QRP");
    }

    #[test]
    fn test_display_is_canonical() {
        let parsed = tokenize(" dl//w1aw/p/ ").unwrap();
        assert_eq!(parsed.to_string(), "DL/W1AW/P");
        assert!(parsed.has_modifiers());
        assert!(!tokenize("W1AW").unwrap().has_modifiers());
    }

    #[test]
    fn test_equal_length_prefers_leftmost() {
        let parsed = tokenize("DL1AB/G4ABC").unwrap();
        assert_eq!(parsed.base, "DL1AB");
        assert_eq!(parsed.prefix_modifier, None);
        let parsed = tokenize("DL1ABC/G4ABC").unwrap();
        assert_eq!(parsed.base, "DL1ABC");
        assert_eq!(parsed.suffix_modifiers, vec![Modifier::Other("G4ABC".to_string())]);
    }

    #[test]
    fn test_malformed() {
        for raw in ["", "   ", "///", "123", "A", "AB/CD", "W1/", "W1 AW"] {
            let err = tokenize(raw).unwrap_err();
            assert!(
                matches!(err, LookupError::MalformedCallsign { .. }),
                "expected MalformedCallsign for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_too_many_leading_segments() {
        assert!(tokenize("F/DL/W1AW").is_err());
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn tokenize_never_panics(raw in "\\PC{0,24}") {
                let _ = tokenize(&raw);
            }

            #[test]
            fn base_is_always_plausible(raw in "[A-Za-z0-9/]{0,16}") {
                if let Ok(parsed) = tokenize(&raw) {
                    prop_assert!(is_plausible_base(&parsed.base));
                    prop_assert!(normalize(&raw).contains(&parsed.base));
                }
            }
        }
    }
}
