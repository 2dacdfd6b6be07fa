// CTY.DAT Parser
//
// Parses the country-files.com CTY.DAT "general country file".
//
// Format: one record per entity, terminated by ';'. The first line holds
// 8 colon-separated header fields, followed by a comma-separated alias list:
//
// Fed. Rep. of Germany:     14:  28:  EU:   51.00:   -10.00:    -1.0:  DL:
//     DA,DB,DC,DD,DF,DG,DH,DJ,DK,DL,DM,DN,DO,DP,DQ,DR,=DL0IMD(14)[28];
//
// 0: Entity name
// 1: CQ zone
// 2: ITU zone
// 3: Continent
// 4: Latitude (north positive)
// 5: Longitude (WEST positive)
// 6: UTC offset
// 7: Primary prefix ('*' marks entities that are not on the DXCC list)
//
// Alias syntax: '=' marks an exact callsign; a call may be followed by
// (cq) [itu] <lat/lon> {continent} ~utc offset~ overrides.
//
// CTY.DAT carries no ADIF numbers; names are mapped through AdifMapping.

use crate::error::Result;
use crate::model::{Continent, Entity, Exception, ExceptionKind, Overrides, Pattern, PrefixRule, Validity};
use crate::normalize::{AdifMapping, NormalizedData, Normalizer, Zone};

pub const PROVIDER: &str = "cty_dat";

/// CTY.DAT adapter
#[derive(Debug, Clone, Default)]
pub struct CtyDatNormalizer {
    mapping: AdifMapping,
}

impl CtyDatNormalizer {
    pub fn new(mapping: AdifMapping) -> Self {
        Self { mapping }
    }
}

impl Normalizer for CtyDatNormalizer {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn normalize(&self, raw: &str) -> Result<NormalizedData> {
        let mut data = NormalizedData::new(PROVIDER);

        for (n, chunk) in raw.split(';').enumerate() {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                continue;
            }
            let fields: Vec<&str> = chunk.splitn(9, ':').collect();
            if fields.len() < 9 {
                data.warn(format!("record {}: expected 8 header fields, got {}", n + 1, fields.len() - 1));
                continue;
            }

            let header = match parse_header(&fields) {
                Ok(h) => h,
                Err(e) => {
                    data.warn(format!("record {}: {}", n + 1, e));
                    continue;
                }
            };
            if header.primary.starts_with('*') {
                log::debug!("{}: skipping non-DXCC entry {}", PROVIDER, header.name);
                continue;
            }
            let adif = match self.mapping.lookup(&header.name) {
                Some(adif) => adif,
                None => {
                    data.warn(format!("record {}: no ADIF number for {:?}", n + 1, header.name));
                    continue;
                }
            };

            data.entities.push(Entity {
                adif,
                name: header.name.clone(),
                prefix: header.primary.clone(),
                continent: header.continent,
                cq_zone: header.cq_zone,
                itu_zone: Some(header.itu_zone),
                latitude: header.latitude,
                longitude: header.longitude,
                validity: Validity::ALWAYS,
                deleted: false,
                whitelist: false,
                whitelist_validity: None,
            });

            for alias in fields[8].split(',') {
                // Aliases may wrap across lines
                let alias: String = alias.chars().filter(|c| !c.is_whitespace()).collect();
                if alias.is_empty() {
                    continue;
                }
                match parse_alias(&alias) {
                    Ok(parsed) => push_alias(&mut data, parsed, adif, &header.primary),
                    Err(e) => data.warn(format!("{}: alias {:?}: {}", header.name, alias, e)),
                }
            }
        }

        data.ensure_usable()
    }
}

struct Header {
    name: String,
    cq_zone: u8,
    itu_zone: u8,
    continent: Continent,
    latitude: f64,
    longitude: f64,
    primary: String,
}

fn parse_header(fields: &[&str]) -> Result<Header, String> {
    let name = fields[0].trim();
    if name.is_empty() {
        return Err("empty entity name".to_string());
    }
    let number = |i: usize, what: &str| -> Result<f64, String> {
        fields[i].trim().parse::<f64>().map_err(|_| format!("invalid {} {:?}", what, fields[i].trim()))
    };

    Ok(Header {
        name: name.to_string(),
        cq_zone: Zone::Cq.parse(fields[1])?,
        itu_zone: Zone::Itu.parse(fields[2])?,
        continent: fields[3].parse()?,
        latitude: number(4, "latitude")?,
        longitude: -number(5, "longitude")?,
        primary: fields[7].trim().to_uppercase(),
    })
}

#[derive(Debug)]
struct Alias {
    call: String,
    exact: bool,
    overrides: Overrides,
}

fn parse_alias(alias: &str) -> Result<Alias, String> {
    let (exact, rest) = match alias.strip_prefix('=') {
        Some(rest) => (true, rest),
        None => (false, alias),
    };
    let split = rest.find(|c| "([<{~".contains(c)).unwrap_or(rest.len());
    let call = rest[..split].to_uppercase();
    if call.is_empty() {
        return Err("empty call".to_string());
    }

    let mut overrides = Overrides::default();
    let mut tail = &rest[split..];
    while let Some(open) = tail.chars().next() {
        let close = match open {
            '(' => ')',
            '[' => ']',
            '<' => '>',
            '{' => '}',
            '~' => '~',
            other => return Err(format!("unexpected {:?}", other)),
        };
        let end = tail[1..].find(close).ok_or_else(|| format!("unterminated {:?}", open))? + 1;
        let value = &tail[1..end];
        match open {
            '(' => overrides.cq_zone = Some(Zone::Cq.parse(value)?),
            '[' => overrides.itu_zone = Some(Zone::Itu.parse(value)?),
            '{' => overrides.continent = Some(value.parse()?),
            '<' => {
                let (lat, lon) = value.split_once('/').ok_or_else(|| format!("invalid location {:?}", value))?;
                overrides.latitude = Some(lat.parse().map_err(|_| format!("invalid latitude {:?}", lat))?);
                let lon: f64 = lon.parse().map_err(|_| format!("invalid longitude {:?}", lon))?;
                overrides.longitude = Some(-lon);
            }
            _ => {} // UTC offset is not part of the canonical model
        }
        tail = &tail[end + 1..];
    }

    Ok(Alias { call, exact, overrides })
}

fn push_alias(data: &mut NormalizedData, alias: Alias, adif: u16, primary: &str) {
    if alias.exact {
        data.exceptions.push(Exception {
            call: alias.call,
            kind: ExceptionKind::Exact,
            adif,
            overrides: alias.overrides,
            validity: Validity::ALWAYS,
            provider: PROVIDER.to_string(),
        });
    } else {
        data.prefixes.push(PrefixRule {
            primary: alias.call == primary,
            pattern: Pattern::literal(&alias.call),
            adif,
            overrides: alias.overrides,
            validity: Validity::ALWAYS,
            provider: PROVIDER.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Fed. Rep. of Germany:     14:  28:  EU:   51.00:   -10.00:    -1.0:  DL:
    DA,DB,DC,DD,DF,DG,DH,DJ,DK,DL,DM,DN,DO,DP,DQ,DR,=DL0IMD(14)[28];
Asiatic Russia:           17:  30:  AS:   55.88:   -84.08:    -7.0:  UA9:
    R0,R9,UA0,UA9,UA9S(16)[29]{EU},=R9FM/P<54.5/-82.0>;
Sicily:                   15:  28:  EU:   37.50:   -14.00:    -1.0:  *IT9:
    IT9;
Atlantis:                 99:  99:  XX:    0.00:     0.00:     0.0:  AT:
    AT0;
";

    #[test]
    fn test_parse_sample() {
        let data = CtyDatNormalizer::default().normalize(SAMPLE).unwrap();
        assert_eq!(data.entities.len(), 2);

        let germany = &data.entities[0];
        assert_eq!(germany.adif, 230);
        assert_eq!(germany.cq_zone, 14);
        assert_eq!(germany.itu_zone, Some(28));
        assert_eq!(germany.longitude, 10.0);
        assert_eq!(germany.prefix, "DL");

        let dl = data.prefixes.iter().find(|r| r.pattern == Pattern::literal("DL")).unwrap();
        assert!(dl.primary);
        let dh = data.prefixes.iter().find(|r| r.pattern == Pattern::literal("DH")).unwrap();
        assert!(!dh.primary);

        let exc = data.exceptions.iter().find(|e| e.call == "DL0IMD").unwrap();
        assert_eq!(exc.kind, ExceptionKind::Exact);
        assert_eq!(exc.overrides.cq_zone, Some(14));
        assert_eq!(exc.overrides.itu_zone, Some(28));
    }

    #[test]
    fn test_overrides() {
        let data = CtyDatNormalizer::default().normalize(SAMPLE).unwrap();
        let ua9s = data.prefixes.iter().find(|r| r.pattern == Pattern::literal("UA9S")).unwrap();
        assert_eq!(ua9s.adif, 15);
        assert_eq!(ua9s.overrides.cq_zone, Some(16));
        assert_eq!(ua9s.overrides.itu_zone, Some(29));
        assert_eq!(ua9s.overrides.continent, Some(Continent::EU));

        let portable = data.exceptions.iter().find(|e| e.call == "R9FM/P").unwrap();
        assert_eq!(portable.overrides.latitude, Some(54.5));
        assert_eq!(portable.overrides.longitude, Some(82.0));
    }

    #[test]
    fn test_skips_non_dxcc_and_bad_records() {
        let data = CtyDatNormalizer::default().normalize(SAMPLE).unwrap();
        assert!(data.entities.iter().all(|e| e.name != "Sicily"));
        assert!(data.entities.iter().all(|e| e.name != "Atlantis"));
        assert_eq!(data.warnings.len(), 1, "warnings: {:?}", data.warnings);
    }

    #[test]
    fn test_out_of_range_zones_are_skipped() {
        let raw = "\
Fed. Rep. of Germany:     99:   0:  EU:   51.00:   -10.00:    -1.0:  DL:
    DL;
Asiatic Russia:           17:  30:  AS:   55.88:   -84.08:    -7.0:  UA9:
    UA9,UA0(41),R0[91];
";
        let data = CtyDatNormalizer::default().normalize(raw).unwrap();
        assert_eq!(data.entities.len(), 1);
        assert_eq!(data.entities[0].adif, 15);
        assert_eq!(data.prefixes.len(), 1);
        assert_eq!(data.prefixes[0].pattern, Pattern::literal("UA9"));
        assert_eq!(data.warnings.len(), 3, "warnings: {:?}", data.warnings);
        assert!(data.warnings[0].contains("CQ zone 99"));
    }

    #[test]
    fn test_unparseable_payload() {
        let err = CtyDatNormalizer::default().normalize("this is not a country file").unwrap_err();
        assert_eq!(err.kind(), "SourceDataInvalid");
    }

    #[test]
    fn test_parse_alias_errors() {
        assert!(parse_alias("=").is_err());
        assert!(parse_alias("DL(14").is_err());
        assert!(parse_alias("DL(X)").is_err());
        let alias = parse_alias("=W1AW~-5.0~").unwrap();
        assert!(alias.exact);
        assert!(alias.overrides.is_empty());
    }
}
