// Reference Data Normalizer
//
// One adapter per provider format. Every adapter turns its raw payload into the
// same canonical records (see model.rs); the index builder never sees provider
// syntax. Bad records are skipped and reported as warnings; a payload that
// yields nothing usable fails with SourceDataInvalid.

pub mod clublog_xml;
pub mod countryfile_json;
pub mod cty_dat;

pub use clublog_xml::ClublogXmlNormalizer;
pub use countryfile_json::CountryfileJsonNormalizer;
pub use cty_dat::CtyDatNormalizer;

use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{LookupError, Result};
use crate::model::{Entity, Exception, InvalidOperation, PrefixRule, ZoneException};
use crate::reference::dxcc;

/// Canonical output of one provider load
#[derive(Debug, Clone, Default)]
pub struct NormalizedData {
    pub provider: String,
    /// Publication date from the payload header, if the format has one
    pub published: Option<DateTime<Utc>>,
    pub entities: Vec<Entity>,
    pub prefixes: Vec<PrefixRule>,
    pub exceptions: Vec<Exception>,
    pub zone_exceptions: Vec<ZoneException>,
    pub invalid_operations: Vec<InvalidOperation>,
    /// Skipped records
    pub warnings: Vec<String>,
}

impl NormalizedData {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            ..Default::default()
        }
    }

    /// Record a skipped record
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}: {}", self.provider, message);
        self.warnings.push(message);
    }

    pub fn record_count(&self) -> usize {
        self.entities.len()
            + self.prefixes.len()
            + self.exceptions.len()
            + self.zone_exceptions.len()
            + self.invalid_operations.len()
    }

    /// Fail when the payload produced no entities or no matchable rules
    pub fn ensure_usable(self) -> Result<Self> {
        if self.entities.is_empty() {
            return Err(LookupError::source_invalid(&self.provider, "no entities found"));
        }
        if self.prefixes.is_empty() && self.exceptions.is_empty() {
            return Err(LookupError::source_invalid(&self.provider, "no prefixes or exceptions found"));
        }
        log::info!(
            "{}: normalized {} records: {} entities, {} prefixes, {} exceptions ({} records skipped)",
            self.provider,
            self.record_count(),
            self.entities.len(),
            self.prefixes.len(),
            self.exceptions.len(),
            self.warnings.len()
        );
        Ok(self)
    }
}

/// Converts one provider's raw payload into canonical records
pub trait Normalizer: Send + Sync {
    /// Provider name used for tie-break priority and diagnostics
    fn provider(&self) -> &str;

    fn normalize(&self, raw: &str) -> Result<NormalizedData>;
}

/// Country name to ADIF number mapping for formats that publish names only
#[derive(Debug, Clone, Default)]
pub struct AdifMapping {
    names: HashMap<String, u16>,
}

impl AdifMapping {
    pub fn new(names: HashMap<String, u16>) -> Self {
        Self {
            names: names.into_iter().map(|(k, v)| (k.trim().to_uppercase(), v)).collect(),
        }
    }

    /// Parse a JSON object of `"Country name": adif`
    pub fn from_json(raw: &str) -> Result<Self> {
        let names: HashMap<String, u16> = serde_json::from_str(raw)
            .map_err(|e| LookupError::Config(format!("invalid ADIF mapping: {}", e)))?;
        Ok(Self::new(names))
    }

    /// Explicit mapping first, then the built-in entity table
    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.names
            .get(&name.trim().to_uppercase())
            .copied()
            .or_else(|| dxcc::row_by_name(name).map(|row| row.adif))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Zone numbering systems carried on entities and overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Cq,
    Itu,
}

impl Zone {
    pub fn range(&self) -> RangeInclusive<u8> {
        match self {
            Zone::Cq => 1..=40,
            Zone::Itu => 1..=90,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Zone::Cq => "CQ zone",
            Zone::Itu => "ITU zone",
        }
    }

    pub fn check(&self, zone: u8) -> Result<u8, String> {
        if self.range().contains(&zone) {
            Ok(zone)
        } else {
            Err(format!("{} {} out of range", self.label(), zone))
        }
    }

    pub fn parse(&self, text: &str) -> Result<u8, String> {
        let text = text.trim();
        let zone = text
            .parse::<u8>()
            .map_err(|_| format!("invalid {} {:?}", self.label(), text))?;
        self.check(zone)
    }
}

/// Parse provider timestamps: `YYYY-MM-DDTHH:MM:SS` (anything after the
/// seconds is ignored, as Clublog appends an offset) or a bare `YYYY-MM-DD`
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Some(head) = text.get(..19) {
        if let Ok(dt) = NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S") {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parse an optional timestamp field; `Ok(None)` when absent or blank
pub(crate) fn optional_timestamp(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_timestamp(text)
            .map(Some)
            .ok_or_else(|| format!("invalid {} date {:?}", field, text)),
    }
}
