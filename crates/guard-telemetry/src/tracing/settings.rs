//! Settings of the individual log outputs.
use std::path::PathBuf;

use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;

/// The level filter of one output.
///
/// If [`Self::environment_variable`] is set, its value is parsed as an
/// [`EnvFilter`] directive list and takes precedence over
/// [`Self::default_level`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSettings {
    pub environment_variable: &'static str,
    pub default_level: LevelFilter,
}

impl LevelSettings {
    pub const fn new(environment_variable: &'static str, default_level: LevelFilter) -> Self {
        Self {
            environment_variable,
            default_level,
        }
    }

    /// Invalid directives in the environment variable are ignored.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_env_var(self.environment_variable)
            .with_default_directive(self.default_level.into())
            .from_env_lossy()
    }
}

/// Rolling JSON log files written to [`Self::directory`].
///
/// Files are named `<service name>.<filename suffix>`, with the rotation
/// date inserted in between unless [`Rotation::NEVER`] is used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileLogSettings {
    pub level: LevelSettings,
    pub directory: PathBuf,
    pub rotation: Rotation,
    pub filename_suffix: String,

    /// Keep at most this many files, older ones are deleted on rotation.
    pub max_files: Option<usize>,
}

impl FileLogSettings {
    /// Never rotates and keeps all files until changed with
    /// [`Self::with_rotation`] and [`Self::with_max_files`].
    pub fn new(
        level: LevelSettings,
        directory: impl Into<PathBuf>,
        filename_suffix: impl Into<String>,
    ) -> Self {
        Self {
            level,
            directory: directory.into(),
            rotation: Rotation::NEVER,
            filename_suffix: filename_suffix.into(),
            max_files: None,
        }
    }

    pub fn with_rotation(mut self, rotation: impl Into<Rotation>) -> Self {
        self.rotation = rotation.into();
        self
    }

    pub fn with_max_files(mut self, max_files: impl Into<Option<usize>>) -> Self {
        self.max_files = max_files.into();
        self
    }
}
