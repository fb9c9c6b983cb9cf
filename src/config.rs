use crate::error::{AnalystError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "git-analyst.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabeledPattern {
    pub label: String,
    pub pattern: String,
}

impl LabeledPattern {
    fn new(label: &str, pattern: &str) -> Self {
        Self {
            label: label.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalystConfig {
    pub style: StyleConfig,
    pub secure: SecureConfig,
    pub hot: HotConfig,
    pub people: PeopleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub patterns: Vec<LabeledPattern>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            patterns: vec![LabeledPattern::new(
                "conventional",
                r"^(feat|fix|docs|style|refactor|test|chore)(\(.*\))?: .+",
            )],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecureConfig {
    pub patterns: Vec<LabeledPattern>,
}

impl Default for SecureConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                LabeledPattern::new("apikey", r"(?i)apikey"),
                LabeledPattern::new("secret", r"(?i)secret"),
                LabeledPattern::new("password", r"(?i)password"),
                LabeledPattern::new("passwd", r"(?i)passwd"),
                LabeledPattern::new("token", r"(?i)token"),
                LabeledPattern::new("access-key", r"(?i)access[_-]?key"),
                LabeledPattern::new("private-key", r"(?i)private[_-]?key"),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HotConfig {
    pub top: usize,
}

impl Default for HotConfig {
    fn default() -> Self {
        Self { top: 10 }
    }
}

/// Night window in the author's local hours: `[night_start, 24) ∪ [0, night_end)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeopleConfig {
    pub night_start: u32,
    pub night_end: u32,
}

impl Default for PeopleConfig {
    fn default() -> Self {
        Self {
            night_start: 22,
            night_end: 6,
        }
    }
}

impl AnalystConfig {
    /// Load `explicit` if given, otherwise `git-analyst.toml` in the current
    /// directory when present, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(p) => {
                if !p.is_file() {
                    return Err(AnalystError::Configuration(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !local.is_file() {
                    return Ok(Self::default());
                }
                local
            }
        };

        tracing::debug!(path = %path.display(), "loading config");
        let text = std::fs::read_to_string(&path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.people.night_start > 23 || self.people.night_end > 23 {
            return Err(AnalystError::Configuration(format!(
                "people night hours must be within 0..=23, got {}..{}",
                self.people.night_start, self.people.night_end
            )));
        }
        if self.hot.top == 0 {
            return Err(AnalystError::Configuration("hot.top must be at least 1".into()));
        }
        Ok(())
    }
}
