// Reference data module - built-in DXCC and prefix data
// Source: ARRL DXCC List and ITU Radio Regulations
//
// Compiled into the crate so lookups work without any provider file. Exposed
// through the same Normalizer capability as the file-based providers and
// ranked last by default, so any loaded provider file takes precedence.

pub mod dxcc;
pub mod prefixes;

use crate::error::Result;
use crate::model::{Continent, Entity, Exception, ExceptionKind, Overrides, Pattern, PrefixRule, Validity};
use crate::normalize::{parse_timestamp, NormalizedData, Normalizer};

pub const PROVIDER: &str = "builtin";

/// Normalizer over the static tables in this module
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinNormalizer;

impl BuiltinNormalizer {
    /// Canonical records without a payload
    pub fn load(&self) -> Result<NormalizedData> {
        let mut data = NormalizedData::new(PROVIDER);

        for row in dxcc::ENTITY_ROWS {
            let continent: Continent = match row.continent.parse() {
                Ok(c) => c,
                Err(e) => {
                    data.warn(format!("entity {}: {}", row.adif, e));
                    continue;
                }
            };
            let validity = match window(None, row.valid_to) {
                Ok(v) => v,
                Err(e) => {
                    data.warn(format!("entity {}: {}", row.adif, e));
                    continue;
                }
            };
            data.entities.push(Entity {
                adif: row.adif,
                name: row.name.to_string(),
                prefix: row.prefix.to_string(),
                continent,
                cq_zone: row.cq_zone,
                itu_zone: Some(row.itu_zone),
                latitude: row.lat,
                longitude: row.lon,
                validity,
                deleted: row.deleted,
                whitelist: false,
                whitelist_validity: None,
            });
        }

        for row in prefixes::PREFIX_ROWS {
            let validity = match window(row.from, row.to) {
                Ok(v) => v,
                Err(e) => {
                    data.warn(format!("prefix {}: {}", row.prefix, e));
                    continue;
                }
            };
            data.prefixes.push(PrefixRule {
                pattern: Pattern::literal(row.prefix),
                adif: row.adif,
                overrides: Overrides::default(),
                validity,
                primary: row.primary,
                provider: PROVIDER.to_string(),
            });
        }

        for row in prefixes::EXCEPTION_ROWS {
            data.exceptions.push(Exception {
                call: row.call.to_string(),
                kind: if row.prefix { ExceptionKind::Prefix } else { ExceptionKind::Exact },
                adif: row.adif,
                overrides: Overrides::default(),
                validity: Validity::ALWAYS,
                provider: PROVIDER.to_string(),
            });
        }

        data.ensure_usable()
    }
}

impl Normalizer for BuiltinNormalizer {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn normalize(&self, _raw: &str) -> Result<NormalizedData> {
        self.load()
    }
}

fn window(from: Option<&str>, to: Option<&str>) -> Result<Validity, String> {
    let parse = |text: &str| parse_timestamp(text).ok_or_else(|| format!("invalid date {:?}", text));
    let from = from.map(parse).transpose()?;
    let to = to.map(parse).transpose()?;
    Validity::new(from, to).map_err(|e| e.to_string())
}

/// ITU zone for an ADIF number, for providers that do not publish one
pub fn itu_zone_for(adif: u16) -> Option<u8> {
    dxcc::row_by_adif(adif).map(|row| row.itu_zone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads_cleanly() {
        let data = BuiltinNormalizer.load().unwrap();
        assert!(data.warnings.is_empty(), "warnings: {:?}", data.warnings);
        assert_eq!(data.entities.len(), dxcc::ENTITY_ROWS.len());
        assert_eq!(data.prefixes.len(), prefixes::PREFIX_ROWS.len());
        assert!(data.prefixes.iter().all(|r| r.provider == PROVIDER));
    }

    #[test]
    fn test_historical_windows() {
        let data = BuiltinNormalizer.load().unwrap();
        let ddr = data.entities.iter().find(|e| e.adif == 229).unwrap();
        assert!(ddr.deleted);
        assert!(ddr.validity.end().is_some());

        let y2: Vec<_> = data.prefixes.iter().filter(|r| r.pattern == Pattern::literal("Y2")).collect();
        assert_eq!(y2.len(), 2);
        assert!(y2.iter().any(|r| r.adif == 229 && r.validity.end().is_some()));
        assert!(y2.iter().any(|r| r.adif == 230 && r.validity.start().is_some()));
    }

    #[test]
    fn test_antarctic_bases_are_a_prefix_exception() {
        let data = BuiltinNormalizer.load().unwrap();
        let bases = data.exceptions.iter().find(|e| e.call == "KC4US").unwrap();
        assert_eq!(bases.kind, ExceptionKind::Prefix);
        assert_eq!(bases.adif, 13);
    }

    #[test]
    fn test_itu_zone_for() {
        assert_eq!(itu_zone_for(230), Some(28));
        assert_eq!(itu_zone_for(9999), None);
    }
}
