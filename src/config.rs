// Lookup Configuration
//
// JSON file, every field optional:
//
// {
//   "provider_priority": ["clublog_xml", "countryfile_json", "cty_dat", "builtin"],
//   "sources": [
//     {"kind": "clublog_xml", "path": "cty.xml.zip", "member": "cty.xml"},
//     {"kind": "cty_dat", "path": "cty.dat", "adif_mapping": "mapping.json"},
//     {"kind": "builtin"}
//   ],
//   "cache": {"enabled": true, "timeout_ms": 250, "sqlite_url": "sqlite:lookup-cache.db"}
// }
//
// DXLOOKUP_CONFIG names the file when none is given explicitly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};
use crate::index::ProviderPriority;

pub const CONFIG_ENV: &str = "DXLOOKUP_CONFIG";

/// Supported reference data formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    CtyDat,
    ClublogXml,
    CountryfileJson,
    Builtin,
}

impl SourceKind {
    /// Provider name used in priority lists
    pub fn provider(&self) -> &'static str {
        match self {
            SourceKind::CtyDat => crate::normalize::cty_dat::PROVIDER,
            SourceKind::ClublogXml => crate::normalize::clublog_xml::PROVIDER,
            SourceKind::CountryfileJson => crate::normalize::countryfile_json::PROVIDER,
            SourceKind::Builtin => crate::reference::PROVIDER,
        }
    }
}

impl FromStr for SourceKind {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cty_dat" | "cty" => Ok(SourceKind::CtyDat),
            "clublog_xml" | "clublog" => Ok(SourceKind::ClublogXml),
            "countryfile_json" | "json" => Ok(SourceKind::CountryfileJson),
            "builtin" => Ok(SourceKind::Builtin),
            other => Err(LookupError::Config(format!("unknown source kind {:?}", other))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider())
    }
}

/// One reference data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Country name to ADIF mapping (JSON) for formats without ADIF numbers
    #[serde(default)]
    pub adif_mapping: Option<PathBuf>,
    /// Archive member to read when `path` is a zip file
    #[serde(default)]
    pub member: Option<String>,
}

impl SourceConfig {
    pub fn builtin() -> Self {
        Self {
            kind: SourceKind::Builtin,
            path: None,
            adif_mapping: None,
            member: None,
        }
    }

    pub fn file(kind: SourceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: Some(path.into()),
            adif_mapping: None,
            member: None,
        }
    }

    /// Parse `KIND=PATH` as given on the command line
    pub fn parse_arg(arg: &str) -> Result<Self> {
        let (kind, path) = arg
            .split_once('=')
            .ok_or_else(|| LookupError::Config(format!("expected KIND=PATH, got {:?}", arg)))?;
        Ok(Self::file(kind.parse()?, path.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Upper bound for one cache store round trip
    pub timeout_ms: u64,
    /// SQLite URL; in-memory store when absent
    pub sqlite_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: 250,
            sqlite_url: None,
        }
    }
}

impl CacheConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Tie-break order between providers, highest priority first
    pub provider_priority: Vec<String>,
    pub sources: Vec<SourceConfig>,
    pub cache: CacheConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            provider_priority: [
                SourceKind::ClublogXml,
                SourceKind::CountryfileJson,
                SourceKind::CtyDat,
                SourceKind::Builtin,
            ]
            .iter()
            .map(|k| k.provider().to_string())
            .collect(),
            sources: vec![SourceConfig::builtin()],
            cache: CacheConfig::default(),
        }
    }
}

impl LookupConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| LookupError::Config(e.to_string()))
    }

    /// Read a JSON config file; relative source paths resolve against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| LookupError::io(path, e))?;
        let mut config = Self::from_json(&raw)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        log::info!("Loaded config {:?}: {} sources", path, config.sources.len());
        Ok(config)
    }

    /// Config named by DXLOOKUP_CONFIG, or the defaults when unset
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => {
                log::debug!("{} not set, using built-in reference data only", CONFIG_ENV);
                Ok(Self::default())
            }
        }
    }

    pub fn priority(&self) -> ProviderPriority {
        ProviderPriority::new(self.provider_priority.as_slice())
    }

    fn resolve_paths(&mut self, dir: &Path) {
        let join = |p: &mut Option<PathBuf>| {
            if let Some(path) = p.as_mut() {
                if path.is_relative() {
                    *path = dir.join(&*path);
                }
            }
        };
        for source in &mut self.sources {
            join(&mut source.path);
            join(&mut source.adif_mapping);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LookupConfig::default();
        assert_eq!(config.provider_priority, vec!["clublog_xml", "countryfile_json", "cty_dat", "builtin"]);
        assert_eq!(config.sources, vec![SourceConfig::builtin()]);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_json() {
        let config = LookupConfig::from_json(
            r#"{"sources": [{"kind": "cty_dat", "path": "cty.dat"}], "cache": {"enabled": true}}"#,
        )
        .unwrap();
        assert_eq!(config.sources[0].kind, SourceKind::CtyDat);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.timeout_ms, 250);
        assert_eq!(config.provider_priority.len(), 4);

        assert_eq!(LookupConfig::from_json("{\"sources\": 5}").unwrap_err().kind(), "Config");
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dxlookup.json");
        std::fs::write(
            &path,
            r#"{"sources": [{"kind": "clublog_xml", "path": "cty.xml", "adif_mapping": "/abs/map.json"}]}"#,
        )
        .unwrap();

        let config = LookupConfig::load(&path).unwrap();
        assert_eq!(config.sources[0].path.as_deref(), Some(dir.path().join("cty.xml").as_path()));
        assert_eq!(config.sources[0].adif_mapping.as_deref(), Some(Path::new("/abs/map.json")));

        let missing = LookupConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(missing.kind(), "Io");
    }

    #[test]
    fn test_parse_source_arg() {
        let source = SourceConfig::parse_arg("clublog=/data/cty.xml").unwrap();
        assert_eq!(source.kind, SourceKind::ClublogXml);
        assert_eq!(source.path, Some(PathBuf::from("/data/cty.xml")));
        assert!(SourceConfig::parse_arg("cty.dat").is_err());
        assert!(SourceConfig::parse_arg("xml=cty.xml").is_err());
    }
}
