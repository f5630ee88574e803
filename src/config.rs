use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::engine::{Move, DEFAULT_FOUR_PROBABILITY};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("four_probability must lie in [0, 1], got {0}")]
    FourProbability(f64),
}

/// Settings for one play session, usually read from a TOML file.
///
/// Every field is optional in the file:
///
/// ```toml
/// seed = 42
/// four_probability = 0.1
///
/// [display]
/// color = true
///
/// [keys]
/// k = "Up"
/// ```
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameConfig {
    /// RNG seed; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Chance that a spawned tile is a 4 instead of a 2.
    #[serde(default = "defaults::four_probability")]
    pub four_probability: f64,

    #[serde(default)]
    pub display: DisplayConfig,

    /// Extra keys, each bound to a direction. A key is a character or one of
    /// `up`, `down`, `left`, `right`, `esc`. These take precedence over the
    /// built-in bindings.
    #[serde(default)]
    pub keys: BTreeMap<String, Move>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    #[serde(default = "defaults::color")]
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self { Self { color: defaults::color() } }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            four_probability: defaults::four_probability(),
            display: DisplayConfig::default(),
            keys: BTreeMap::new(),
        }
    }
}

impl GameConfig {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = std::fs::File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the engine cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.four_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::FourProbability(p));
        }
        Ok(())
    }
}

mod defaults {
    pub fn four_probability() -> f64 { super::DEFAULT_FOUR_PROBABILITY }
    pub fn color() -> bool { true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, GameConfig::default());
        assert_eq!(cfg.four_probability, 0.1);
        assert!(cfg.display.color);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn parses_full_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "seed = 42\nfour_probability = 0.25\n\n[display]\ncolor = false\n\n[keys]\nk = \"Up\"\nx = \"Down\""
        )
        .unwrap();
        let cfg = GameConfig::from_toml(tmp.path()).unwrap();
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.four_probability, 0.25);
        assert!(!cfg.display.color);
        assert_eq!(cfg.keys.get("k"), Some(&Move::Up));
        assert_eq!(cfg.keys.get("x"), Some(&Move::Down));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let err = GameConfig::from_toml_str("four_probability = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::FourProbability(p) if p == 1.5));
        assert!(GameConfig::from_toml_str("four_probability = -0.1").is_err());
        assert!(GameConfig::from_toml_str("four_probability = nan").is_err());
    }

    #[test]
    fn rejects_unknown_direction_and_fields() {
        let err = GameConfig::from_toml_str("[keys]\nq = \"Sideways\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
        assert!(GameConfig::from_toml_str("speed = 3").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = GameConfig::from_toml("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
