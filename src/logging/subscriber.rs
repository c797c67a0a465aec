//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::utils::strip_ansi;

/// Target for stage headers.
pub const STAGE_TARGET: &str = "quadlet_app::stage";

/// Target for dry-run notices.
pub const DRY_RUN_TARGET: &str = "quadlet_app::dry_run";

/// Environment variable holding an `EnvFilter` directive for the console.
pub const LOG_ENV: &str = "QUADLET_APP_LOG";

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.message.push_str(&format!(" {}={value:?}", field.name()));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.message.push_str(&format!(" {}={value}", field.name()));
        }
    }
}

/// A [`tracing_subscriber::Layer`] that appends every event to a log file
/// with ANSI codes stripped.
#[derive(Debug)]
pub(crate) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open `path` for appending and write a run header.
    ///
    /// Returns `None` if the file cannot be opened.
    pub(crate) fn new(path: &Path) -> Option<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).ok()?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()?;
        let version =
            option_env!("QUADLET_APP_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        writeln!(file, "==========================================").ok()?;
        writeln!(file, "quadlet-app {version}").ok()?;
        writeln!(file, "==========================================").ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = strip_ansi(&extractor.message);

        let line = match (level, target) {
            (tracing::Level::INFO, STAGE_TARGET) => format!("==> {msg}"),
            (tracing::Level::INFO, DRY_RUN_TARGET) => format!("    [dry run] {msg}"),
            (tracing::Level::ERROR, _) => format!("    [error] {msg}"),
            (tracing::Level::WARN, _) => format!("    [warn] {msg}"),
            (tracing::Level::DEBUG | tracing::Level::TRACE, _) => format!("    [debug] {msg}"),
            _ => format!("    {msg}"),
        };

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits the console style.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.message;

        match level {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO if target == STAGE_TARGET => {
                writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
            }
            tracing::Level::INFO if target == DRY_RUN_TARGET => {
                writeln!(writer, "  \x1b[33m[DRY RUN]\x1b[0m {msg}")
            }
            tracing::Level::INFO => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Console and file logging options.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Show debug events on the console.
    pub verbose: bool,
    /// Keep stdout free for machine-readable output; all console logging
    /// goes to stderr.
    pub json: bool,
    /// Append every event at DEBUG and above to this file.
    pub log_file: Option<PathBuf>,
}

/// Initialise the global [`tracing`] subscriber.
///
/// The console filter comes from [`LOG_ENV`] when set, otherwise INFO (or
/// DEBUG with `verbose`). Must be called once at program startup, before
/// any logging.
pub fn init_subscriber(options: &LogOptions) {
    use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt as _};
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let default_level = if options.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let make_writer = if options.json {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(
            std::io::stderr
                .with_max_level(tracing::Level::WARN)
                .or_else(std::io::stdout),
        )
    };

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer)
        .with_filter(console_filter);

    let file_layer = options
        .log_file
        .as_deref()
        .and_then(FileLayer::new)
        .map(|l| l.with_filter(LevelFilter::DEBUG));
    let file_failed = options.log_file.is_some() && file_layer.is_none();

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    if file_failed && let Some(path) = &options.log_file {
        tracing::warn!("cannot open log file {}", path.display());
    }
}
