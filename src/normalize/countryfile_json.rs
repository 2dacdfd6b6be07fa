// Country-files.com JSON Parser
//
// The JSON export of the country file is one object keyed by prefix or call:
//
// {
//   "DL":     {"Country": "Fed. Rep. of Germany", "ADIF": 230, "CQZone": 14, "ITUZone": 28,
//              "Continent": "EU", "Latitude": 51.0, "Longitude": 10.0, "ExactCallsign": false},
//   "DL0IMD": {"Country": "Fed. Rep. of Germany", ..., "ExactCallsign": true},
//   "KG4##":  {...}
// }
//
// Longitudes are east positive. Keys may carry wildcards: '#' any digit,
// '@' any letter, '?' any letter or digit. ADIF is optional; without it the
// country name goes through AdifMapping. Start/End (optional) bound the record.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{LookupError, Result};
use crate::model::{Continent, Entity, Exception, ExceptionKind, Overrides, Pattern, PrefixRule, Validity};
use crate::normalize::{optional_timestamp, AdifMapping, NormalizedData, Normalizer, Zone};
use crate::reference::dxcc;

pub const PROVIDER: &str = "countryfile_json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JsonRecord {
    country: String,
    #[serde(rename = "ADIF")]
    adif: Option<u16>,
    #[serde(rename = "CQZone")]
    cq_zone: u8,
    #[serde(rename = "ITUZone")]
    itu_zone: Option<u8>,
    continent: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    exact_callsign: bool,
    start: Option<String>,
    end: Option<String>,
}

/// Record that passed validation, keyed by its upper-cased call or prefix
struct Checked {
    call: String,
    adif: u16,
    continent: Continent,
    validity: Validity,
    record: JsonRecord,
}

impl Checked {
    fn entity(&self, prefix: &str) -> Entity {
        Entity {
            adif: self.adif,
            name: self.record.country.trim().to_string(),
            prefix: prefix.to_string(),
            continent: self.continent,
            cq_zone: self.record.cq_zone,
            itu_zone: self.record.itu_zone,
            latitude: self.record.latitude,
            longitude: self.record.longitude,
            validity: Validity::ALWAYS,
            deleted: false,
            whitelist: false,
            whitelist_validity: None,
        }
    }

    /// Fields that differ from the entity defaults; everything when there is no entity
    fn overrides(&self, entity: Option<&Entity>) -> Overrides {
        let record = &self.record;
        let Some(entity) = entity else {
            return Overrides {
                cq_zone: Some(record.cq_zone),
                itu_zone: record.itu_zone,
                continent: Some(self.continent),
                latitude: Some(record.latitude),
                longitude: Some(record.longitude),
            };
        };
        Overrides {
            cq_zone: (record.cq_zone != entity.cq_zone).then_some(record.cq_zone),
            itu_zone: record.itu_zone.filter(|z| Some(*z) != entity.itu_zone),
            continent: (self.continent != entity.continent).then_some(self.continent),
            latitude: (record.latitude != entity.latitude).then_some(record.latitude),
            longitude: (record.longitude != entity.longitude).then_some(record.longitude),
        }
    }
}

/// Country-files.com JSON adapter
#[derive(Debug, Clone, Default)]
pub struct CountryfileJsonNormalizer {
    mapping: AdifMapping,
}

impl CountryfileJsonNormalizer {
    pub fn new(mapping: AdifMapping) -> Self {
        Self { mapping }
    }

    fn check(&self, call: String, value: serde_json::Value) -> Result<Checked, String> {
        let record: JsonRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;
        let adif = record
            .adif
            .or_else(|| self.mapping.lookup(&record.country))
            .ok_or_else(|| format!("no ADIF number for {:?}", record.country))?;
        let continent: Continent = record.continent.parse()?;
        Zone::Cq.check(record.cq_zone)?;
        if let Some(itu) = record.itu_zone {
            Zone::Itu.check(itu)?;
        }
        let validity = validity(&record)?;
        Ok(Checked {
            call,
            adif,
            continent,
            validity,
            record,
        })
    }
}

impl Normalizer for CountryfileJsonNormalizer {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn normalize(&self, raw: &str) -> Result<NormalizedData> {
        // Records are parsed one by one so a bad record only costs itself
        let records: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| LookupError::source_invalid(PROVIDER, format!("invalid JSON: {}", e)))?;

        let mut data = NormalizedData::new(PROVIDER);
        let mut checked: Vec<Checked> = Vec::new();
        for (key, value) in records {
            let call = key.trim().to_uppercase();
            match self.check(call.clone(), value) {
                Ok(c) => checked.push(c),
                Err(e) => data.warn(format!("{}: {}", call, e)),
            }
        }

        // Entity defaults come from the record keyed by the primary prefix,
        // else from the first prefix record of the entity
        let mut entities: BTreeMap<u16, Entity> = BTreeMap::new();
        for c in checked.iter().filter(|c| !c.record.exact_callsign) {
            let primary = dxcc::row_by_adif(c.adif).map(|row| row.prefix);
            if primary == Some(c.call.as_str()) || !entities.contains_key(&c.adif) {
                entities.insert(c.adif, c.entity(primary.unwrap_or(c.call.as_str())));
            }
        }

        for c in checked {
            let entity = entities.get(&c.adif);
            let overrides = c.overrides(entity);
            if c.record.exact_callsign {
                data.exceptions.push(Exception {
                    call: c.call,
                    kind: ExceptionKind::Exact,
                    adif: c.adif,
                    overrides,
                    validity: c.validity,
                    provider: PROVIDER.to_string(),
                });
                continue;
            }
            let pattern = Pattern::with_wildcards(&c.call);
            if pattern.is_empty() {
                data.warn(format!("{}: empty pattern", c.call));
                continue;
            }
            data.prefixes.push(PrefixRule {
                primary: entity.map_or(false, |e| e.prefix == c.call),
                pattern,
                adif: c.adif,
                overrides,
                validity: c.validity,
                provider: PROVIDER.to_string(),
            });
        }

        data.entities = entities.into_values().collect();
        data.ensure_usable()
    }
}

fn validity(record: &JsonRecord) -> Result<Validity, String> {
    let from = optional_timestamp("Start", record.start.as_deref())?;
    let to = optional_timestamp("End", record.end.as_deref())?;
    Validity::new(from, to).map_err(|e| e.to_string())
}
