//! Component-scoped logging on top of the `log` facade.
//!
//! Every record is tagged with a component (the `log` target) and written as
//!
//! ```text
//!              [Packager: BFF] I | Creating .bff file
//! ```
//!
//! with the `[component] L | ` prefix right-aligned to [`LEFT_COLUMN`].
//! [`init`] installs an `env_logger` backend using that format.

mod live_stream;
mod severity;

pub use live_stream::{LineSink, LiveStream};
pub use severity::{SEVERITY_TABLE, Severity};

use crate::bundler::Result;
use log::kv::Source;
use std::{
    collections::HashMap,
    fmt,
    io::Write,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

/// Width of the right-aligned prefix column.
pub const LEFT_COLUMN: usize = 40;

/// Format one log line, including the trailing newline.
///
/// `severity_label` is only used for its first character.
pub fn format_line(component: Option<&str>, severity_label: &str, message: &str) -> String {
    let letter = severity_label.chars().next().unwrap_or('?');
    let left = match component {
        Some(component) => format!("[{component}] {letter} | "),
        None => format!("{letter} | "),
    };
    format!("{left:>width$}{message}\n", width = LEFT_COLUMN)
}

/// Record key carrying the [`Severity`] label of records emitted by [`Logger`].
pub const SEVERITY_KEY: &str = "severity";

/// Render a `log` record as one line.
///
/// The level letter comes from the record's [`SEVERITY_KEY`] value when
/// present, so `FATAL` and `ANY` survive the mapping onto `log::Level`.
pub fn render_record(record: &log::Record<'_>) -> String {
    let target = record.target();
    let component = (!target.is_empty()).then_some(target);
    let label = record
        .key_values()
        .get(log::kv::Key::from_str(SEVERITY_KEY))
        .map(|value| value.to_string())
        .unwrap_or_else(|| record.level().as_str().to_string());
    format_line(component, &label, &record.args().to_string())
}

/// Install the global `env_logger` backend at `level`.
///
/// Records from modules that log through the `log` macros directly keep their
/// module path as the component. Calling this twice is a no-op.
pub fn init(level: Severity) {
    let _ = env_logger::Builder::new()
        .filter_level(level.to_log_level().to_level_filter())
        .format(|buf, record| buf.write_all(render_record(record).as_bytes()))
        .try_init();
}

/// A clonable logging handle for one component.
///
/// Clones share the threshold, so [`Logger::set_level`] on any clone affects
/// all of them. The default threshold is [`Severity::Warn`].
#[derive(Clone)]
pub struct Logger {
    component: Arc<str>,
    threshold: Arc<AtomicU8>,
}

impl Logger {
    /// Create a logger for `component` at the default threshold.
    pub fn new(component: impl Into<Arc<str>>) -> Self {
        Self::with_level(component, Severity::Warn)
    }

    /// Create a logger for `component` at `level`.
    pub fn with_level(component: impl Into<Arc<str>>, level: Severity) -> Self {
        Self {
            component: component.into(),
            threshold: Arc::new(AtomicU8::new(level.as_u8())),
        }
    }

    /// A logger for another component sharing this logger's threshold.
    pub fn scoped(&self, component: impl Into<Arc<str>>) -> Self {
        Self {
            component: component.into(),
            threshold: Arc::clone(&self.threshold),
        }
    }

    /// Component name used as the record target.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Current threshold.
    pub fn level(&self) -> Severity {
        Severity::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    /// Set the threshold by name.
    ///
    /// Unrecognized names fail with [`crate::bundler::Error::InvalidLogLevel`]
    /// and leave the threshold unchanged.
    pub fn set_level(&self, level: &str) -> Result<()> {
        let severity: Severity = level.parse()?;
        self.set_severity(severity);
        Ok(())
    }

    /// Set the threshold.
    pub fn set_severity(&self, level: Severity) {
        self.threshold.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Whether a record at `severity` passes the threshold.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level()
    }

    /// Emit `message` at `severity`.
    pub fn log(&self, severity: Severity, message: impl fmt::Display) {
        if self.enabled(severity) {
            log::log!(
                target: self.component(),
                severity.to_log_level(),
                severity = severity.label();
                "{message}"
            );
        }
    }

    /// Emit at [`Severity::Debug`].
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message);
    }

    /// Emit at [`Severity::Info`].
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message);
    }

    /// Emit at [`Severity::Warn`].
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Severity::Warn, message);
    }

    /// Emit at [`Severity::Error`].
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message);
    }

    /// Emit at [`Severity::Fatal`].
    pub fn fatal(&self, message: impl fmt::Display) {
        self.log(Severity::Fatal, message);
    }

    /// Emit a deprecation warning, prefixed with `DEPRECATED: `.
    pub fn deprecated(&self, message: impl fmt::Display) {
        self.log(Severity::Warn, format_args!("DEPRECATED: {message}"));
    }

    /// A new live stream feeding this logger at `severity`.
    ///
    /// Prefer [`LiveStreams`] to keep one stream per severity alive for the
    /// logger's lifetime.
    pub fn live_stream(&self, severity: Severity) -> LiveStream<Logger> {
        LiveStream::new(self.clone(), severity)
    }
}

impl LineSink for Logger {
    fn emit_line(&mut self, severity: Severity, line: &str) {
        self.log(severity, line);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("component", &self.component)
            .field("level", &self.level())
            .finish()
    }
}

/// One [`LiveStream`] per severity for a single logger.
#[derive(Debug)]
pub struct LiveStreams {
    logger: Logger,
    streams: HashMap<Severity, LiveStream<Logger>>,
}

impl LiveStreams {
    /// Empty cache for `logger`.
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            streams: HashMap::new(),
        }
    }

    /// The stream for `severity`, created on first use.
    pub fn get(&mut self, severity: Severity) -> &mut LiveStream<Logger> {
        self.streams
            .entry(severity)
            .or_insert_with(|| self.logger.live_stream(severity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, Once};

    /// (target, level, rendered line) for every record.
    struct Captured(Mutex<Vec<(String, log::Level, String)>>);

    impl log::Log for Captured {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            self.0.lock().unwrap().push((
                record.target().to_string(),
                record.level(),
                render_record(record),
            ));
        }

        fn flush(&self) {}
    }

    static CAPTURED: Captured = Captured(Mutex::new(Vec::new()));

    /// Records emitted so far for `target`. Tests use distinct targets.
    fn records_for(target: &str) -> Vec<(log::Level, String)> {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            log::set_logger(&CAPTURED).unwrap();
            log::set_max_level(log::LevelFilter::Trace);
        });
        CAPTURED
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _, _)| t == target)
            .map(|(_, level, line)| (*level, line.clone()))
            .collect()
    }

    #[test]
    fn test_format_line_with_component() {
        let line = format_line(Some("Packager: BFF"), "INFO", "Creating .bff file");
        let prefix = "[Packager: BFF] I | ";
        assert!(line.ends_with("Creating .bff file\n"));
        assert_eq!(line.len(), LEFT_COLUMN + "Creating .bff file\n".len());
        assert_eq!(&line[LEFT_COLUMN - prefix.len()..LEFT_COLUMN], prefix);
        assert!(line[..LEFT_COLUMN - prefix.len()].chars().all(|c| c == ' '));
    }

    #[test]
    fn test_format_line_without_component() {
        let line = format_line(None, "WARN", "careful");
        assert_eq!(line, format!("{}W | careful\n", " ".repeat(LEFT_COLUMN - 4)));
    }

    #[test]
    fn test_long_component_is_not_truncated() {
        let component = "c".repeat(60);
        let line = format_line(Some(&component), "DEBUG", "m");
        assert_eq!(line, format!("[{component}] D | m\n"));
    }

    #[test]
    fn test_default_level_is_warn() {
        let logger = Logger::new("test");
        assert_eq!(logger.level(), Severity::Warn);
        assert!(!logger.enabled(Severity::Info));
        assert!(logger.enabled(Severity::Error));
    }

    #[test]
    fn test_set_level_shared_between_clones() {
        let logger = Logger::new("test");
        let clone = logger.clone();
        clone.set_level("debug").unwrap();
        assert_eq!(logger.level(), Severity::Debug);
    }

    #[test]
    fn test_scoped_logger_follows_parent_level() {
        let root = Logger::with_level("bundler", Severity::Info);
        let child = root.scoped("Packager: BFF");
        root.set_severity(Severity::Error);
        assert_eq!(child.component(), "Packager: BFF");
        assert_eq!(child.level(), Severity::Error);
    }

    #[test]
    fn test_set_invalid_level_keeps_previous() {
        let logger = Logger::with_level("test", Severity::Info);
        assert!(logger.set_level("chatty").is_err());
        assert_eq!(logger.level(), Severity::Info);
    }

    #[test]
    fn test_live_streams_reuse_instance_per_severity() {
        let mut streams = LiveStreams::new(Logger::new("test"));
        streams.get(Severity::Debug).push_str("partial");
        streams.get(Severity::Info).push_str("other");

        assert_eq!(streams.get(Severity::Debug).pending(), b"partial");
        assert_eq!(streams.get(Severity::Info).pending(), b"other");
        assert_eq!(streams.get(Severity::Info).severity(), Severity::Info);
    }

    #[test]
    fn test_debug_shows_level() {
        let logger = Logger::with_level("Packager: BFF", Severity::Info);
        let rendered = format!("{logger:?}");
        assert!(rendered.contains("Info"));
        assert!(rendered.contains("Packager: BFF"));
    }

    #[test]
    fn test_fatal_renders_fatal_letter() {
        records_for("fatal-test");
        let logger = Logger::with_level("fatal-test", Severity::Debug);
        logger.fatal("boom");
        logger.error("bust");

        let records = records_for("fatal-test");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, log::Level::Error);
        assert!(records[0].1.ends_with("[fatal-test] F | boom\n"));
        assert!(records[1].1.ends_with("[fatal-test] E | bust\n"));
    }

    #[test]
    fn test_unknown_renders_any_letter() {
        records_for("unknown-test");
        Logger::with_level("unknown-test", Severity::Debug).log(Severity::Unknown, "who");

        let records = records_for("unknown-test");
        assert_eq!(records.len(), 1);
        assert!(records[0].1.ends_with("[unknown-test] A | who\n"));
    }

    #[test]
    fn test_deprecated_emits_prefixed_warning() {
        records_for("deprecated-test");
        let logger = Logger::new("deprecated-test");
        logger.deprecated("use staging_root");

        let records = records_for("deprecated-test");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, log::Level::Warn);
        assert_eq!(
            records[0].1,
            format_line(Some("deprecated-test"), "WARN", "DEPRECATED: use staging_root")
        );
    }

    #[test]
    fn test_deprecated_suppressed_above_warn() {
        records_for("deprecated-quiet-test");
        let logger = Logger::new("deprecated-quiet-test");
        logger.set_severity(Severity::Error);
        logger.deprecated("use staging_root");

        assert!(records_for("deprecated-quiet-test").is_empty());
    }
}
