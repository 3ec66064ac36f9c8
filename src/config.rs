use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "fixturegen";
const CONFIG_FILE: &str = "fixturegen.yaml";

/// Longest value accepted for `users.name` and `tags.title` (`VARCHAR(64)`).
pub const MAX_LABEL_LEN: usize = 64;

const DEFAULT_NAMES: [&str; 16] = [
    "adam", "ben", "charlie", "dawson", "ernest", "ferdinand", "gunther", "harold", "ingram",
    "jack", "kevin", "lex", "martin", "nick", "olaf", "patric",
];

const DEFAULT_TAGS: [&str; 10] = [
    "smart",
    "beautiful",
    "slow",
    "smelly",
    "good-looking",
    "clever",
    "curious",
    "intelligent",
    "annoying",
    "self-centered",
];

/// Everything a generation run reads: the word lists and the row counts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub names: Vec<String>,
    pub tags: Vec<String>,
    /// The run inserts `desired_user_entries + 1` users.
    pub desired_user_entries: usize,
    pub min_tag_assocs: usize,
    pub max_tag_assocs: usize,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            names: DEFAULT_NAMES.iter().map(|s| s.to_string()).collect(),
            tags: DEFAULT_TAGS.iter().map(|s| s.to_string()).collect(),
            desired_user_entries: 100_000,
            min_tag_assocs: 0,
            max_tag_assocs: 1,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Number of user rows a run produces. The loop bound is inclusive.
    pub fn user_rows(&self) -> usize {
        self.desired_user_entries.saturating_add(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.desired_user_entries.checked_add(1).is_none() {
            bail!(
                "config: desired_user_entries ({}) is too large",
                self.desired_user_entries
            );
        }
        if self.names.is_empty() {
            bail!("config: names must not be empty");
        }
        if self.min_tag_assocs > self.max_tag_assocs {
            bail!(
                "config: min_tag_assocs ({}) is greater than max_tag_assocs ({})",
                self.min_tag_assocs,
                self.max_tag_assocs
            );
        }
        if self.tags.is_empty() && self.max_tag_assocs > 0 {
            bail!("config: tags must not be empty when max_tag_assocs > 0");
        }
        for value in self.names.iter().chain(self.tags.iter()) {
            if value.chars().count() > MAX_LABEL_LEN {
                bail!("config: {value:?} is longer than {MAX_LABEL_LEN} characters");
            }
        }
        Ok(())
    }

    /// Parse and validate a YAML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: GeneratorConfig = serde_yaml::from_slice(&data)
            .with_context(|| format!("failed to parse YAML at {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config at {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the config for a run: explicit path, then `<working_dir>/fixturegen.yaml`,
    /// then the user config dir, then built-in defaults.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let path = expand_path(path).ok_or_else(|| anyhow::anyhow!("cannot expand file path"))?;
            return Ok((Self::from_file(&path)?, Some(path)));
        }
        let mut candidates = vec![working_dir.join(CONFIG_FILE)];
        if let Some(dir) = app_config_dir() {
            candidates.push(dir.join(CONFIG_FILE));
        }
        for path in candidates {
            if path.is_file() {
                return Ok((Self::from_file(&path)?, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }
}

/// The per-user config directory, without creating it.
pub fn app_config_dir() -> Option<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs_next::home_dir().map(|h| h.join(".config"))
    } else {
        dirs_next::config_dir()
    };
    base.map(|p| p.join(APP_NAME))
}

/// Expand a leading `~` and `$VAR` (or `%VAR%` on Windows) components.
pub fn expand_path(path: &Path) -> Option<PathBuf> {
    let mut expanded_path = PathBuf::new();
    let mut path_iter = path.iter();
    if path.starts_with("~") {
        path_iter.next()?;
        expanded_path = expanded_path.join(dirs_next::home_dir()?);
    }
    for path in path_iter {
        let path = path.to_str()?;
        expanded_path = if cfg!(unix) && path.starts_with('$') {
            expanded_path.join(std::env::var(path.strip_prefix('$')?).unwrap_or_default())
        } else if cfg!(windows) && path.starts_with('%') && path.ends_with('%') {
            expanded_path
                .join(std::env::var(path.strip_prefix('%')?.strip_suffix('%')?).unwrap_or_default())
        } else {
            expanded_path.join(path)
        }
    }
    Some(expanded_path)
}
