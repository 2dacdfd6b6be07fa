// Clublog cty.xml Parser
//
// Layout of the Clublog country file:
//
// <clublog date="2024-05-01T09:10:11+00:00" xmlns="https://clublog.org/cty/v1.2">
//   <entities>           <entity>         adif, name, prefix, deleted, cqz, cont, long, lat, start, end,
//                                         whitelist, whitelist_start, whitelist_end
//   <exceptions>         <exception>      call, entity, adif, cqz, cont, long, lat, start, end
//   <prefixes>           <prefix>         call, entity, adif, cqz, cont, long, lat, start, end
//   <invalid_operations> <invalid>        call, start, end
//   <zone_exceptions>    <zone_exception> call, zone, start, end
// </clublog>
//
// Every record element carries a `record` attribute. Dates are
// YYYY-MM-DDTHH:MM:SS followed by an offset. Longitudes are published west
// positive and are negated here. Clublog has no ITU zones; they are taken from
// the built-in entity table where known. An exception with adif 0 marks a
// call that counts for no DXCC entity.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::Result;
use crate::model::{
    Continent, Entity, Exception, ExceptionKind, InvalidOperation, Overrides, Pattern, PrefixRule, Validity,
    ZoneException,
};
use crate::normalize::{optional_timestamp, parse_timestamp, NormalizedData, Normalizer, Zone};
use crate::reference::itu_zone_for;

pub const PROVIDER: &str = "clublog_xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Entities,
    Exceptions,
    Prefixes,
    InvalidOperations,
    ZoneExceptions,
}

impl Section {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "entities" => Some(Section::Entities),
            "exceptions" => Some(Section::Exceptions),
            "prefixes" => Some(Section::Prefixes),
            "invalid_operations" => Some(Section::InvalidOperations),
            "zone_exceptions" => Some(Section::ZoneExceptions),
            _ => None,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Section::Entities => "entities",
            Section::Exceptions => "exceptions",
            Section::Prefixes => "prefixes",
            Section::InvalidOperations => "invalid_operations",
            Section::ZoneExceptions => "zone_exceptions",
        }
    }

    fn record_tag(&self) -> &'static str {
        match self {
            Section::Entities => "entity",
            Section::Exceptions => "exception",
            Section::Prefixes => "prefix",
            Section::InvalidOperations => "invalid",
            Section::ZoneExceptions => "zone_exception",
        }
    }
}

/// Child elements of one record, by tag name
#[derive(Debug, Default)]
struct RawRecord {
    id: Option<String>,
    fields: HashMap<String, String>,
}

impl RawRecord {
    fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|s| s.as_str())
    }

    fn label(&self) -> String {
        self.id.clone().unwrap_or_else(|| "?".to_string())
    }

    fn required(&self, key: &str) -> Result<&str, String> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| format!("missing <{}>", key))
    }

    fn number<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, String> {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some).map_err(|_| format!("invalid <{}> {:?}", key, v)),
        }
    }

    fn required_number<T: std::str::FromStr>(&self, key: &str) -> Result<T, String> {
        self.number(key)?.ok_or_else(|| format!("missing <{}>", key))
    }

    fn zone(&self, key: &str, zone: Zone) -> Result<Option<u8>, String> {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => zone.parse(v).map(Some),
        }
    }

    fn required_zone(&self, key: &str, zone: Zone) -> Result<u8, String> {
        self.zone(key, zone)?.ok_or_else(|| format!("missing <{}>", key))
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key).map_or(false, |v| v.trim().eq_ignore_ascii_case("TRUE"))
    }

    fn validity(&self) -> Result<Validity, String> {
        let from = optional_timestamp("start", self.get("start"))?;
        let to = optional_timestamp("end", self.get("end"))?;
        Validity::new(from, to).map_err(|e| e.to_string())
    }

    fn whitelist_validity(&self) -> Result<Option<Validity>, String> {
        let from = optional_timestamp("whitelist_start", self.get("whitelist_start"))?;
        let to = optional_timestamp("whitelist_end", self.get("whitelist_end"))?;
        if from.is_none() && to.is_none() {
            return Ok(None);
        }
        Validity::new(from, to).map(Some).map_err(|e| e.to_string())
    }

    fn call(&self) -> Result<String, String> {
        Ok(self.required("call")?.trim().to_uppercase())
    }

    fn overrides(&self) -> Result<Overrides, String> {
        Ok(Overrides {
            cq_zone: self.zone("cqz", Zone::Cq)?,
            itu_zone: None,
            continent: self.get("cont").map(|c| c.parse::<Continent>()).transpose()?,
            latitude: self.number("lat")?,
            longitude: self.number::<f64>("long")?.map(|lon| -lon),
        })
    }
}

/// Clublog cty.xml adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct ClublogXmlNormalizer;

impl Normalizer for ClublogXmlNormalizer {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn normalize(&self, raw: &str) -> Result<NormalizedData> {
        let mut data = NormalizedData::new(PROVIDER);
        let mut reader = Reader::from_str(raw);
        reader.config_mut().trim_text(true);

        let mut section: Option<Section> = None;
        let mut record: Option<RawRecord> = None;
        let mut field: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let tag = tag_name(&e);
                    match (section, record.as_ref()) {
                        (None, _) if tag == "clublog" => {
                            data.published = attribute(&e, "date").and_then(|d| parse_timestamp(&d));
                        }
                        (None, _) => section = Section::from_tag(&tag),
                        (Some(s), None) if tag == s.record_tag() => {
                            record = Some(RawRecord {
                                id: attribute(&e, "record"),
                                fields: HashMap::new(),
                            });
                        }
                        (Some(_), Some(_)) => field = Some(tag),
                        _ => {}
                    }
                }
                Ok(Event::Text(t)) => {
                    if let (Some(rec), Some(name)) = (record.as_mut(), field.as_ref()) {
                        match t.unescape() {
                            Ok(value) => {
                                rec.fields.insert(name.clone(), value.into_owned());
                            }
                            Err(e) => {
                                let label = rec.label();
                                data.warn(format!("record {}: bad <{}> text: {}", label, name, e));
                            }
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if field.as_deref() == Some(tag.as_str()) {
                        field = None;
                    } else if let Some(s) = section {
                        if record.is_some() && tag == s.record_tag() {
                            if let Some(rec) = record.take() {
                                dispatch(&mut data, s, rec);
                            }
                        } else if tag == s.tag() {
                            section = None;
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    data.warn(format!("XML error at byte {}: {}", reader.buffer_position(), e));
                    break;
                }
                _ => {}
            }
        }

        log::debug!(
            "{}: {} zone exceptions, {} invalid operations",
            PROVIDER,
            data.zone_exceptions.len(),
            data.invalid_operations.len()
        );
        data.ensure_usable()
    }
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn dispatch(data: &mut NormalizedData, section: Section, rec: RawRecord) {
    let result = match section {
        Section::Entities => entity(&rec).map(|e| data.entities.push(e)),
        Section::Exceptions => exception(&rec).map(|e| data.exceptions.push(e)),
        Section::Prefixes => prefix(&rec).map(|p| data.prefixes.push(p)),
        Section::InvalidOperations => invalid_operation(&rec).map(|i| data.invalid_operations.push(i)),
        Section::ZoneExceptions => zone_exception(&rec).map(|z| data.zone_exceptions.push(z)),
    };
    if let Err(e) = result {
        data.warn(format!("{} record {}: {}", section.record_tag(), rec.label(), e));
    }
}

fn entity(rec: &RawRecord) -> Result<Entity, String> {
    let adif: u16 = rec.required_number("adif")?;
    Ok(Entity {
        adif,
        name: rec.required("name")?.trim().to_string(),
        prefix: rec.get("prefix").unwrap_or("").trim().to_uppercase(),
        continent: rec.required("cont")?.parse()?,
        cq_zone: rec.required_zone("cqz", Zone::Cq)?,
        itu_zone: itu_zone_for(adif),
        latitude: rec.required_number("lat")?,
        longitude: -rec.required_number::<f64>("long")?,
        validity: rec.validity()?,
        deleted: rec.flag("deleted"),
        whitelist: rec.flag("whitelist"),
        whitelist_validity: rec.whitelist_validity()?,
    })
}

fn exception(rec: &RawRecord) -> Result<Exception, String> {
    Ok(Exception {
        call: rec.call()?,
        kind: ExceptionKind::Exact,
        adif: rec.required_number("adif")?,
        overrides: rec.overrides()?,
        validity: rec.validity()?,
        provider: PROVIDER.to_string(),
    })
}

fn prefix(rec: &RawRecord) -> Result<PrefixRule, String> {
    Ok(PrefixRule {
        pattern: Pattern::literal(&rec.call()?),
        adif: rec.required_number("adif")?,
        overrides: rec.overrides()?,
        validity: rec.validity()?,
        primary: false,
        provider: PROVIDER.to_string(),
    })
}

fn invalid_operation(rec: &RawRecord) -> Result<InvalidOperation, String> {
    Ok(InvalidOperation {
        call: rec.call()?,
        validity: rec.validity()?,
        provider: PROVIDER.to_string(),
    })
}

fn zone_exception(rec: &RawRecord) -> Result<ZoneException, String> {
    Ok(ZoneException {
        call: rec.call()?,
        cq_zone: rec.required_zone("zone", Zone::Cq)?,
        validity: rec.validity()?,
        provider: PROVIDER.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<clublog date="2024-05-01T09:10:11+00:00" xmlns="https://clublog.org/cty/v1.2">
<entities>
  <entity><adif>230</adif><name>FEDERAL REPUBLIC OF GERMANY</name><prefix>DL</prefix><deleted>FALSE</deleted><cqz>14</cqz><cont>EU</cont><long>-10.0</long><lat>51.0</lat><whitelist>TRUE</whitelist><whitelist_start>2018-01-01T00:00:00+00:00</whitelist_start></entity>
  <entity><adif>229</adif><name>GERMAN DEMOCRATIC REPUBLIC</name><prefix>Y2</prefix><deleted>TRUE</deleted><cqz>14</cqz><cont>EU</cont><long>-13.4</long><lat>52.5</lat><end>1990-10-02T23:59:59+00:00</end></entity>
  <entity><adif>999</adif><name>BROKEN</name><cqz>14</cqz><cont>ZZ</cont><long>0</long><lat>0</lat></entity>
</entities>
<exceptions>
  <exception record="1"><call>DL0XX</call><entity>GERMAN DEMOCRATIC REPUBLIC</entity><adif>229</adif><cqz>14</cqz><cont>EU</cont><long>-13.4</long><lat>52.5</lat><start>1985-01-01T00:00:00+00:00</start><end>1986-01-01T00:00:00+00:00</end></exception>
  <exception record="2"><call>W1AW/MM</call><entity>MARITIME MOBILE</entity><adif>0</adif></exception>
</exceptions>
<prefixes>
  <prefix record="1"><call>DL</call><entity>FEDERAL REPUBLIC OF GERMANY</entity><adif>230</adif><cqz>14</cqz><cont>EU</cont><long>-10.0</long><lat>51.0</lat></prefix>
  <prefix record="2"><call>Y2</call><entity>GERMAN DEMOCRATIC REPUBLIC</entity><adif>229</adif><cqz>14</cqz><cont>EU</cont><long>-13.4</long><lat>52.5</lat><end>1990-10-02T23:59:59+00:00</end></prefix>
  <prefix record="3"><call>Y2</call><entity>FEDERAL REPUBLIC OF GERMANY</entity><adif>230</adif><start>1990-10-03T00:00:00+00:00</start></prefix>
</prefixes>
<invalid_operations>
  <invalid record="1"><call>DL0BAD</call><start>2001-01-01T00:00:00+00:00</start><end>2002-01-01T00:00:00+00:00</end></invalid>
</invalid_operations>
<zone_exceptions>
  <zone_exception record="1"><call>DL0ZZ</call><zone>15</zone></zone_exception>
</zone_exceptions>
</clublog>
"#;

    #[test]
    fn test_parse_sample() {
        let data = ClublogXmlNormalizer.normalize(SAMPLE).unwrap();
        assert_eq!(data.published, Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 10, 11).unwrap()));
        assert_eq!(data.entities.len(), 2);
        assert_eq!(data.prefixes.len(), 3);
        assert_eq!(data.exceptions.len(), 2);
        assert_eq!(data.invalid_operations.len(), 1);
        assert_eq!(data.zone_exceptions.len(), 1);
        // bad continent
        assert_eq!(data.warnings.len(), 1, "warnings: {:?}", data.warnings);
    }

    #[test]
    fn test_entity_fields() {
        let data = ClublogXmlNormalizer.normalize(SAMPLE).unwrap();
        let germany = data.entities.iter().find(|e| e.adif == 230).unwrap();
        assert_eq!(germany.longitude, 10.0);
        assert_eq!(germany.itu_zone, Some(28));
        assert!(!germany.deleted);
        assert!(germany.whitelist);
        let whitelist = germany.whitelist_validity.unwrap();
        assert_eq!(whitelist.start(), Some(Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(whitelist.end(), None);

        let ddr = data.entities.iter().find(|e| e.adif == 229).unwrap();
        assert!(ddr.deleted);
        assert!(!ddr.whitelist);
        assert_eq!(ddr.whitelist_validity, None);
        assert_eq!(ddr.validity.end(), Some(Utc.with_ymd_and_hms(1990, 10, 2, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_exception_window() {
        let data = ClublogXmlNormalizer.normalize(SAMPLE).unwrap();
        let exc = &data.exceptions[0];
        assert_eq!(exc.call, "DL0XX");
        assert!(exc.validity.contains(Utc.with_ymd_and_hms(1985, 6, 1, 0, 0, 0).unwrap()));
        assert!(!exc.validity.contains(Utc.with_ymd_and_hms(1987, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(exc.overrides.longitude, Some(13.4));
    }

    #[test]
    fn test_no_dxcc_exception_is_kept() {
        let data = ClublogXmlNormalizer.normalize(SAMPLE).unwrap();
        let mm = data.exceptions.iter().find(|e| e.call == "W1AW/MM").unwrap();
        assert!(mm.is_no_dxcc());
        assert!(mm.overrides.is_empty());
    }

    #[test]
    fn test_out_of_range_zones_are_skipped() {
        let raw = r#"<clublog>
<entities>
  <entity><adif>230</adif><name>FEDERAL REPUBLIC OF GERMANY</name><prefix>DL</prefix><cqz>14</cqz><cont>EU</cont><long>-10.0</long><lat>51.0</lat></entity>
  <entity><adif>15</adif><name>ASIATIC RUSSIA</name><prefix>UA9</prefix><cqz>41</cqz><cont>AS</cont><long>-84.0</long><lat>55.0</lat></entity>
</entities>
<exceptions>
  <exception record="1"><call>DL0AA</call><adif>230</adif><cqz>0</cqz></exception>
</exceptions>
<prefixes>
  <prefix record="1"><call>DL</call><adif>230</adif><cqz>14</cqz></prefix>
  <prefix record="2"><call>DA</call><adif>230</adif><cqz>99</cqz></prefix>
</prefixes>
<zone_exceptions>
  <zone_exception record="1"><call>DL0ZZ</call><zone>45</zone></zone_exception>
</zone_exceptions>
</clublog>"#;
        let data = ClublogXmlNormalizer.normalize(raw).unwrap();
        assert_eq!(data.entities.len(), 1);
        assert_eq!(data.prefixes.len(), 1);
        assert!(data.exceptions.is_empty());
        assert!(data.zone_exceptions.is_empty());
        assert_eq!(data.warnings.len(), 4, "warnings: {:?}", data.warnings);
    }

    #[test]
    fn test_zone_exception() {
        let data = ClublogXmlNormalizer.normalize(SAMPLE).unwrap();
        assert_eq!(data.zone_exceptions[0].call, "DL0ZZ");
        assert_eq!(data.zone_exceptions[0].cq_zone, 15);
    }

    #[test]
    fn test_unparseable_payload() {
        let err = ClublogXmlNormalizer.normalize("<clublog><entities><entity>").unwrap_err();
        assert_eq!(err.kind(), "SourceDataInvalid");
        let err = ClublogXmlNormalizer.normalize("not xml at all").unwrap_err();
        assert_eq!(err.kind(), "SourceDataInvalid");
    }
}
