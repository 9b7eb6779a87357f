//! Guide generation settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::resolver::ExtentNormalization;
use crate::core::TimeCode;
use crate::geom::{BBoxCache, Purpose, VisibilityPolicy};
use crate::util::{Error, Result};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "AUTOGUIDE_CONFIG";

/// Settings for bounds computation and normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    /// Purposes whose geometry counts toward the bound.
    pub included_purposes: Vec<Purpose>,
    pub visibility: VisibilityPolicy,
    pub normalization: ExtentNormalization,
    /// Time to evaluate at; `None` is the default time.
    pub time: Option<f64>,
    /// Use authored `extentsHint` instead of walking subtrees.
    pub use_extents_hint: bool,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            included_purposes: vec![Purpose::Default, Purpose::Render],
            visibility: VisibilityPolicy::Ignore,
            normalization: ExtentNormalization::Exact,
            time: None,
            use_extents_hint: false,
        }
    }
}

impl GuideConfig {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("autoguide");
            p.push("config.json");
            p
        })
    }

    /// Load from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings: `explicit` if given, else `$AUTOGUIDE_CONFIG`, else
    /// the default location if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Self::load_from(Path::new(&path));
        }
        match Self::default_path().filter(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::load_from(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Reject settings that cannot produce a bound.
    pub fn validate(&self) -> Result<()> {
        if self.included_purposes.is_empty() {
            return Err(Error::Config("included_purposes must not be empty".into()));
        }
        if self.time.is_some_and(|t| !t.is_finite()) {
            return Err(Error::Config("time must be finite".into()));
        }
        Ok(())
    }

    /// Time code the bounds are evaluated at.
    pub fn time_code(&self) -> TimeCode {
        TimeCode::from(self.time)
    }

    /// Bound query configured from these settings.
    pub fn bbox_cache(&self) -> BBoxCache {
        BBoxCache::new(
            self.time_code(),
            self.included_purposes.iter().copied(),
            self.visibility,
            self.use_extents_hint,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = GuideConfig::default();
        assert_eq!(c.included_purposes, vec![Purpose::Default, Purpose::Render]);
        assert_eq!(c.visibility, VisibilityPolicy::Ignore);
        assert_eq!(c.normalization, ExtentNormalization::Exact);
        assert_eq!(c.time_code(), TimeCode::Default);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c: GuideConfig =
            serde_json::from_str(r#"{"visibility": "respect", "normalization": "legacy_mantissa", "time": 12}"#)
                .unwrap();
        assert_eq!(c.visibility, VisibilityPolicy::Respect);
        assert_eq!(c.normalization, ExtentNormalization::LegacyMantissa);
        assert_eq!(c.time_code(), TimeCode::At(12.0));
        assert_eq!(c.included_purposes.len(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"included_purposes": ["default", "proxy"], "use_extents_hint": true}}"#).unwrap();
        let c = GuideConfig::load(Some(file.path())).unwrap();
        assert_eq!(c.included_purposes, vec![Purpose::Default, Purpose::Proxy]);
        assert!(c.use_extents_hint);
        assert_eq!(c.bbox_cache().included_purposes(), &[Purpose::Default, Purpose::Proxy]);
    }

    #[test]
    fn test_invalid_configs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"included_purposes": []}}"#).unwrap();
        assert!(matches!(GuideConfig::load_from(file.path()), Err(Error::Config(_))));

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "not json").unwrap();
        assert!(matches!(GuideConfig::load_from(bad.path()), Err(Error::Config(_))));

        assert!(GuideConfig::load(Some(Path::new("/definitely/missing.json"))).is_err());
    }
}
