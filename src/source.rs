// Reference Data Sources
//
// Reads provider payloads from disk (plain files or a member of a .zip
// archive), hands them to the matching Normalizer and assembles a Generation.
// A source that fails to load is logged and skipped; loading fails only when
// no configured source produced usable data.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::config::{LookupConfig, SourceConfig, SourceKind};
use crate::error::{LookupError, Result};
use crate::generation::{Generation, GenerationBuilder};
use crate::normalize::{
    AdifMapping, ClublogXmlNormalizer, CountryfileJsonNormalizer, CtyDatNormalizer, NormalizedData, Normalizer,
};
use crate::reference::BuiltinNormalizer;

/// Read a payload as text. Provider files are not always valid UTF-8
/// (CTY.DAT is Latin-1), so invalid bytes are replaced.
pub fn read_payload(path: &Path, member: Option<&str>) -> Result<String> {
    let is_zip = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("zip"));
    let bytes = if is_zip {
        read_zip_member(path, member)?
    } else {
        std::fs::read(path).map_err(|e| LookupError::io(path, e))?
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Named member (case-insensitive), or the first file in the archive
fn read_zip_member(path: &Path, member: Option<&str>) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| LookupError::io(path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| LookupError::io(path, format!("invalid zip archive: {}", e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| LookupError::io(path, format!("failed to read zip entry: {}", e)))?;
        if entry.is_dir() {
            continue;
        }
        let wanted = match member {
            Some(name) => entry.name().eq_ignore_ascii_case(name),
            None => true,
        };
        if !wanted {
            continue;
        }

        log::info!("Reading {} from {:?} ({} bytes compressed)", entry.name(), path, entry.compressed_size());
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| LookupError::io(path, format!("failed to read {}: {}", entry.name(), e)))?;
        return Ok(contents);
    }

    Err(LookupError::io(
        path,
        format!("{} not found in archive", member.unwrap_or("payload")),
    ))
}

pub fn load_adif_mapping(path: &Path) -> Result<AdifMapping> {
    let raw = std::fs::read_to_string(path).map_err(|e| LookupError::io(path, e))?;
    let mapping = AdifMapping::from_json(&raw)?;
    log::debug!("Loaded {} ADIF name mappings from {:?}", mapping.len(), path);
    Ok(mapping)
}

/// Adapter for one configured source
pub fn normalizer_for(source: &SourceConfig) -> Result<Box<dyn Normalizer>> {
    let mapping = match &source.adif_mapping {
        Some(path) => load_adif_mapping(path)?,
        None => AdifMapping::default(),
    };
    Ok(match source.kind {
        SourceKind::CtyDat => Box::new(CtyDatNormalizer::new(mapping)),
        SourceKind::ClublogXml => Box::new(ClublogXmlNormalizer),
        SourceKind::CountryfileJson => Box::new(CountryfileJsonNormalizer::new(mapping)),
        SourceKind::Builtin => Box::new(BuiltinNormalizer),
    })
}

/// Read and normalize one source
pub fn load_source(source: &SourceConfig) -> Result<NormalizedData> {
    if source.kind == SourceKind::Builtin {
        return BuiltinNormalizer.load();
    }
    let path = source
        .path
        .as_deref()
        .ok_or_else(|| LookupError::Config(format!("{} source needs a path", source.kind)))?;
    let normalizer = normalizer_for(source)?;
    let raw = read_payload(path, source.member.as_deref())?;
    log::info!("Normalizing {} ({} bytes) from {:?}", normalizer.provider(), raw.len(), path);
    normalizer.normalize(&raw)
}

/// Build a generation from every configured source
pub fn load_generation(config: &LookupConfig) -> Result<Generation> {
    let mut builder = GenerationBuilder::new(config.priority());
    let defaults;
    let sources = if config.sources.is_empty() {
        defaults = vec![SourceConfig::builtin()];
        &defaults
    } else {
        &config.sources
    };

    let mut failures = Vec::new();
    for source in sources {
        match load_source(source) {
            Ok(data) => {
                builder.add(data);
            }
            Err(e) => {
                log::error!("Failed to load {} source: {}", source.kind, e);
                failures.push(e);
            }
        }
    }

    if builder.is_empty() {
        // A single failing source keeps its own error
        if failures.len() == 1 {
            return Err(failures.remove(0));
        }
        return Err(LookupError::source_invalid(
            "all",
            format!("none of {} sources could be loaded", sources.len()),
        ));
    }
    builder.build()
}

/// load_generation on the blocking pool
pub async fn load_generation_async(config: LookupConfig) -> Result<Generation> {
    tokio::task::spawn_blocking(move || load_generation(&config))
        .await
        .map_err(|e| LookupError::Config(format!("loader task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CTY: &str = "\
Fed. Rep. of Germany:     14:  28:  EU:   51.00:   -10.00:    -1.0:  DL:
    DA,DB,DC,DD,DF,DG,DH,DJ,DK,DL,DM,DN,DO,DP,DQ,DR;
";

    fn write_zip(path: &Path, member: &str, contents: &str) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(member, zip::write::SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_read_plain_and_zip() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("cty.dat");
        std::fs::write(&plain, CTY).unwrap();
        assert_eq!(read_payload(&plain, None).unwrap(), CTY);

        let zipped = dir.path().join("cty.ZIP");
        write_zip(&zipped, "CTY.DAT", CTY);
        assert_eq!(read_payload(&zipped, Some("cty.dat")).unwrap(), CTY);
        assert_eq!(read_payload(&zipped, None).unwrap(), CTY);
        assert_eq!(read_payload(&zipped, Some("other.dat")).unwrap_err().kind(), "Io");
    }

    #[test]
    fn test_latin1_payload_is_lossy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cty.dat");
        std::fs::write(&path, b"C\xf4te d'Ivoire").unwrap();
        let text = read_payload(&path, None).unwrap();
        assert!(text.starts_with('C'));
        assert!(text.ends_with("te d'Ivoire"));
    }

    #[test]
    fn test_load_generation_skips_broken_sources() {
        let dir = tempfile::tempdir().unwrap();
        let cty = dir.path().join("cty.dat");
        std::fs::write(&cty, CTY).unwrap();

        let config = LookupConfig {
            sources: vec![
                SourceConfig::file(SourceKind::CtyDat, &cty),
                SourceConfig::file(SourceKind::ClublogXml, dir.path().join("missing.xml")),
            ],
            ..LookupConfig::default()
        };
        let generation = load_generation(&config).unwrap();
        assert_eq!(generation.providers(), &["cty_dat".to_string()]);
        assert_eq!(generation.resolve("DH1TW").unwrap().entity.adif, 230);
    }

    #[test]
    fn test_load_generation_fails_without_data() {
        let config = LookupConfig {
            sources: vec![SourceConfig::file(SourceKind::CtyDat, "/nonexistent/cty.dat")],
            ..LookupConfig::default()
        };
        assert_eq!(load_generation(&config).unwrap_err().kind(), "Io");

        let config = LookupConfig {
            sources: vec![SourceConfig {
                kind: SourceKind::CountryfileJson,
                path: None,
                adif_mapping: None,
                member: None,
            }],
            ..LookupConfig::default()
        };
        assert_eq!(load_generation(&config).unwrap_err().kind(), "Config");
    }

    #[test]
    fn test_adif_mapping_file() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = dir.path().join("mapping.json");
        std::fs::write(&mapping, r#"{"Fed. Rep. of Germany": 230, "Neverland": 4242}"#).unwrap();
        let loaded = load_adif_mapping(&mapping).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.lookup("neverland"), Some(4242));
    }

    #[tokio::test]
    async fn test_load_generation_async_defaults_to_builtin() {
        let config = LookupConfig {
            sources: Vec::new(),
            ..LookupConfig::default()
        };
        let generation = load_generation_async(config).await.unwrap();
        assert_eq!(generation.providers(), &["builtin".to_string()]);
        assert_eq!(generation.resolve("JA1ABC").unwrap().entity.adif, 339);
    }
}
