use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Config file looked up in the target directory when none is given explicitly
pub const DEFAULT_CONFIG_FILE: &str = "preflight.toml";

const DEFAULT_REQUIRED_FILES: [&str; 3] = ["app.py", "requirements.txt", "runtime.txt"];
const DEFAULT_SECRETS_FILE: &str = ".env";
const DEFAULT_SECRETS_TEMPLATE: &str = ".env.example";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Deployment target the repository is checked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Render backend plus a GitHub Pages frontend, deployed from `main`
    #[default]
    Fullstack,
    /// Render backend only, deployed from `master`
    Backend,
}

impl Profile {
    pub fn name(&self) -> &'static str {
        match self {
            Profile::Fullstack => "fullstack",
            Profile::Backend => "backend",
        }
    }

    pub fn expected_branch(&self) -> &'static str {
        match self {
            Profile::Fullstack => "main",
            Profile::Backend => "master",
        }
    }

    /// Whether the static frontend is published alongside the backend
    pub fn includes_pages(&self) -> bool {
        matches!(self, Profile::Fullstack)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fullstack" => Ok(Profile::Fullstack),
            "backend" => Ok(Profile::Backend),
            other => Err(format!(
                "unknown profile '{}', expected 'fullstack' or 'backend'",
                other
            )),
        }
    }
}

/// Contents of a `preflight.toml`. Every key is optional and overrides the
/// profile default it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub profile: Option<Profile>,
    pub required_files: Option<Vec<PathBuf>>,
    pub secrets_file: Option<PathBuf>,
    pub secrets_template: Option<PathBuf>,
    pub expected_branch: Option<String>,
}

impl ConfigFile {
    pub fn parse(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config file {}", path.display());
        toml::from_str(&contents).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `preflight.toml` from `dir` if present
    pub fn discover(dir: impl AsRef<Path>) -> ConfigResult<Option<Self>> {
        let candidate = dir.as_ref().join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(candidate).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Resolved settings for one pre-flight run
#[derive(Debug, Clone, PartialEq)]
pub struct PreflightConfig {
    pub profile: Profile,
    /// Checked in order, relative to the repository root
    pub required_files: Vec<PathBuf>,
    pub secrets_file: PathBuf,
    /// Suggested source for the secrets file when it is missing
    pub secrets_template: PathBuf,
    pub expected_branch: String,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

impl PreflightConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_profile(profile: Profile) -> Self {
        Self {
            profile,
            required_files: DEFAULT_REQUIRED_FILES.iter().map(PathBuf::from).collect(),
            secrets_file: PathBuf::from(DEFAULT_SECRETS_FILE),
            secrets_template: PathBuf::from(DEFAULT_SECRETS_TEMPLATE),
            expected_branch: profile.expected_branch().to_string(),
        }
    }

    /// Layer a config file over profile defaults. A profile chosen on the
    /// command line wins over the one named in the file.
    pub fn from_layers(file: ConfigFile, profile_override: Option<Profile>) -> Self {
        let profile = profile_override.or(file.profile).unwrap_or_default();
        let mut config = Self::for_profile(profile);

        if let Some(required_files) = file.required_files {
            config.required_files = required_files;
        }
        if let Some(secrets_file) = file.secrets_file {
            config.secrets_file = secrets_file;
        }
        if let Some(secrets_template) = file.secrets_template {
            config.secrets_template = secrets_template;
        }
        if let Some(expected_branch) = file.expected_branch {
            config.expected_branch = expected_branch;
        }

        config
    }

    pub fn with_required_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.required_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_secrets_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_file = path.into();
        self
    }

    pub fn with_secrets_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_template = path.into();
        self
    }

    pub fn with_expected_branch(mut self, branch: impl Into<String>) -> Self {
        self.expected_branch = branch.into();
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.expected_branch.trim().is_empty() {
            return Err(invalid("Expected branch cannot be empty"));
        }

        let mut seen = HashSet::new();
        for path in &self.required_files {
            if path.as_os_str().is_empty() {
                return Err(invalid("Required file paths cannot be empty"));
            }
            if path.is_absolute() {
                return Err(invalid(format!(
                    "Required file {} must be relative to the repository root",
                    path.display()
                )));
            }
            // `./app.py` and `app.py` name the same file
            let normalized: PathBuf = path
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect();
            if !seen.insert(normalized) {
                return Err(invalid(format!(
                    "Required file {} is listed more than once",
                    path.display()
                )));
            }
        }

        if self.secrets_file.as_os_str().is_empty() {
            return Err(invalid("Secrets file path cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}
