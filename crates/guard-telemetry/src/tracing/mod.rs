//! Console and rolling file log subscribers.
//!
//! To get started, see [`Tracing`].

use std::path::PathBuf;

use snafu::{ResultExt as _, Snafu};
use tracing::{level_filters::LevelFilter, subscriber::SetGlobalDefaultError};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{Layer, Registry, layer::SubscriberExt};

pub use crate::tracing::settings::{FileLogSettings, LevelSettings};

pub mod settings;

type Result<T, E = Error> = std::result::Result<T, E>;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Errors which can be encountered when initialising [`Tracing`].
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to create rolling log files in {directory:?}"))]
    InitRollingFileAppender {
        source: InitError,
        directory: PathBuf,
    },

    #[snafu(display("unable to set the global default subscriber"))]
    SetGlobalDefaultSubscriber { source: SetGlobalDefaultError },
}

/// The log outputs of a process.
///
/// Console logs go to stderr, so tools can keep stdout for the data they
/// produce. File logs are JSON lines written by a background thread.
///
/// The outputs stay active while the value returned by [`Tracing::init`] is
/// alive. Dropping it flushes and stops the file writer.
///
/// <div class="warning">
/// Name the guard variable appropriately, do not just use <code>let _ =</code>, as that will drop
/// immediately.
/// </div>
///
/// ```
/// use guard_telemetry::tracing::{Error, TelemetryOptions, Tracing};
///
/// fn main() -> Result<(), Error> {
///     let _tracing_guard = Tracing::from_options("guard", TelemetryOptions::default()).init()?;
///
///     tracing::info!("log a message");
///     Ok(())
/// }
/// ```
pub struct Tracing {
    service_name: &'static str,
    console_log: Option<LevelSettings>,
    file_log: Option<FileLogSettings>,

    file_log_guard: Option<WorkerGuard>,
}

impl Tracing {
    /// Overrides the console level filter, `INFO` if unset.
    pub const CONSOLE_LOG_LEVEL: &str = "CONSOLE_LOG_LEVEL";
    /// Overrides the file level filter, `INFO` if unset.
    pub const FILE_LOG_LEVEL: &str = "FILE_LOG_LEVEL";
    pub const FILE_LOG_SUFFIX: &str = "tracing-rs.json";

    /// Creates a [`Tracing`] without any output. `service_name` is used as
    /// the log file prefix.
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            console_log: None,
            file_log: None,
            file_log_guard: None,
        }
    }

    /// Creates a [`Tracing`] from CLI arguments.
    ///
    /// Console logs are on unless disabled, file logs are written only if a
    /// directory is given. Both default to `INFO`.
    pub fn from_options(service_name: &'static str, options: TelemetryOptions) -> Self {
        let TelemetryOptions {
            console_log_disabled,
            file_log_directory,
            file_log_rotation_period,
            file_log_max_files,
        } = options;

        let console_log = (!console_log_disabled)
            .then_some(LevelSettings::new(Self::CONSOLE_LOG_LEVEL, LevelFilter::INFO));
        let file_log = file_log_directory.map(|directory| {
            FileLogSettings::new(
                LevelSettings::new(Self::FILE_LOG_LEVEL, LevelFilter::INFO),
                directory,
                Self::FILE_LOG_SUFFIX,
            )
            .with_rotation(file_log_rotation_period.unwrap_or_default())
            .with_max_files(file_log_max_files)
        });

        Self::new(service_name)
            .with_console_output(console_log)
            .with_file_output(file_log)
    }

    pub fn with_console_output(mut self, settings: impl Into<Option<LevelSettings>>) -> Self {
        self.console_log = settings.into();
        self
    }

    pub fn with_file_output(mut self, settings: impl Into<Option<FileLogSettings>>) -> Self {
        self.file_log = settings.into();
        self
    }

    /// Installs the configured outputs as the global default subscriber.
    ///
    /// Nothing is installed if no output is enabled.
    pub fn init(mut self) -> Result<Self> {
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if let Some(console_log) = &self.console_log {
            layers.push(console_layer(console_log));
        }

        if let Some(file_log) = &self.file_log {
            let (layer, guard) = file_layer(self.service_name, file_log)?;
            layers.push(layer);
            self.file_log_guard = Some(guard);
        }

        if !layers.is_empty() {
            tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layers))
                .context(SetGlobalDefaultSubscriberSnafu)?;
        }

        // The file writer stops once the guard is dropped.
        Ok(self)
    }
}

fn console_layer(settings: &LevelSettings) -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(settings.env_filter())
        .boxed()
}

fn file_layer(
    service_name: &'static str,
    settings: &FileLogSettings,
) -> Result<(BoxedLayer, WorkerGuard)> {
    let mut file_appender = RollingFileAppender::builder()
        .rotation(settings.rotation.clone())
        .filename_prefix(service_name)
        .filename_suffix(settings.filename_suffix.as_str());
    if let Some(max_files) = settings.max_files {
        file_appender = file_appender.max_log_files(max_files);
    }

    let file_appender = file_appender
        .build(&settings.directory)
        .with_context(|_| InitRollingFileAppenderSnafu {
            directory: settings.directory.clone(),
        })?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(writer)
        .with_filter(settings.level.env_filter())
        .boxed();
    Ok((layer, guard))
}

/// Log output options, flattened into the CLI of the Guard tools.
///
/// Additionally, this struct can be used as CLI arguments. This functionality is only
/// available if the feature `clap` is enabled.
#[cfg_attr(
    feature = "clap",
    doc = r#"
```
# use guard_telemetry::tracing::TelemetryOptions;
use clap::Parser;

#[derive(Parser)]
struct Cli {
    #[clap(flatten)]
    telemetry: TelemetryOptions,
}
```
"#
)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
#[cfg_attr(feature = "clap", command(next_help_heading = "Telemetry Options"))]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TelemetryOptions {
    /// Disable console logs.
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub console_log_disabled: bool,

    /// Write JSON logs to files in DIRECTORY.
    #[cfg_attr(
        feature = "clap",
        arg(long, env, value_name = "DIRECTORY", group = "file_log")
    )]
    pub file_log_directory: Option<PathBuf>,

    /// Time PERIOD after which log files are rolled over.
    #[cfg_attr(
        feature = "clap",
        arg(long, env, value_name = "PERIOD", requires = "file_log")
    )]
    pub file_log_rotation_period: Option<RotationPeriod>,

    /// Maximum number of log files to keep.
    #[cfg_attr(feature = "clap", arg(long, env, requires = "file_log"))]
    pub file_log_max_files: Option<usize>,
}

#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RotationPeriod {
    Minutely,
    Hourly,
    Daily,

    #[default]
    Never,
}

impl From<RotationPeriod> for Rotation {
    fn from(value: RotationPeriod) -> Self {
        match value {
            RotationPeriod::Minutely => Self::MINUTELY,
            RotationPeriod::Hourly => Self::HOURLY,
            RotationPeriod::Daily => Self::DAILY,
            RotationPeriod::Never => Self::NEVER,
        }
    }
}
