//! Logging setup: a human-readable console layer plus JSON file layers routed per subsystem.
//!
//! Each key of [`LoggingConfig`] other than `"default"` names a target prefix
//! (`habits`, `api_ingress`, `tower_http`, ...). A record is governed by the longest
//! matching prefix, or by the `"default"` section when none matches. When `RUST_LOG`
//! is set it replaces the configured console levels.

use crate::config::{LoggingConfig, Section};
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{Level, Metadata};
use tracing_subscriber::{filter::FilterFn, fmt, EnvFilter};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 5;

// -------- level helpers --------
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// Returns true if target == prefix or target starts with "prefix::"
fn matches_crate_prefix(target: &str, prefix: &str) -> bool {
    target == prefix || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
}

/// Maximum level per subsystem; `None` silences the subsystem.
#[derive(Clone, Debug, Default)]
struct LevelTable {
    default: Option<Level>,
    // Longest prefix first so nested subsystems win over their parents.
    by_prefix: Vec<(String, Option<Level>)>,
}

impl LevelTable {
    fn new(default: Option<Level>, mut by_prefix: Vec<(String, Option<Level>)>) -> Self {
        by_prefix.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { default, by_prefix }
    }

    fn console(cfg: &LoggingConfig) -> Self {
        let default = cfg
            .get(DEFAULT_SECTION)
            .and_then(|s| parse_tracing_level(&s.console_level));
        let by_prefix = explicit_sections(cfg)
            .map(|(name, s)| (name.to_owned(), parse_tracing_level(&s.console_level)))
            .collect();
        Self::new(default, by_prefix)
    }

    fn level_for(&self, target: &str) -> Option<Level> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_crate_prefix(target, prefix))
            .map_or(self.default, |(_, level)| *level)
    }

    fn enabled(&self, meta: &Metadata<'_>) -> bool {
        self.level_for(meta.target())
            .is_some_and(|max| meta.level() <= &max)
    }

    fn is_silent(&self) -> bool {
        self.default.is_none() && self.by_prefix.iter().all(|(_, l)| l.is_none())
    }

    fn into_filter(self) -> FilterFn<impl Fn(&Metadata<'_>) -> bool + Send + Sync + 'static> {
        FilterFn::new(move |meta| self.enabled(meta))
    }
}

fn explicit_sections(cfg: &LoggingConfig) -> impl Iterator<Item = (&str, &Section)> {
    cfg.iter()
        .filter(|(k, _)| k.as_str() != DEFAULT_SECTION)
        .map(|(k, v)| (k.as_str(), v))
}

// -------- rotating writer for files --------
type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

#[derive(Clone)]
struct RotWriter(SharedRotate);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().flush()
    }
}

/// Writer for one record: the subsystem's file, or a sink that drops the bytes.
struct RoutedWriter(Option<RotWriter>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes records to files by target prefix, using the same matching as [`LevelTable`].
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: Vec<(String, Option<RotWriter>)>,
}

impl FileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_crate_prefix(target, prefix))
            .map_or_else(|| self.default.clone(), |(_, w)| w.clone())
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve_for(meta.target()))
    }
}

// -------- path resolution helpers --------

/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer_at_path(
    log_path: &Path,
    max_bytes: usize,
    max_backups: usize,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_backups)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

/// File writer and level for one section; `None` when the section writes no file.
fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<(RotWriter, Level)> {
    if section.file.trim().is_empty() {
        return None;
    }
    let level = parse_tracing_level(&section.file_level)?;
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let max_backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
    let log_path = resolve_log_path(&section.file, base_dir);

    match create_rotating_writer_at_path(&log_path, max_bytes as usize, max_backups) {
        Ok(writer) => Some((writer, level)),
        Err(e) => {
            eprintln!(
                "Failed to init log file for subsystem '{}': {} ({})",
                name,
                log_path.display(),
                e
            );
            None
        }
    }
}

/// Writers and levels for every section with a usable file.
fn build_file_sink(cfg: &LoggingConfig, base_dir: &Path) -> Option<(LevelTable, FileRouter)> {
    let mut router = FileRouter::default();
    let mut default_level = None;
    if let Some(section) = cfg.get(DEFAULT_SECTION) {
        if let Some((writer, level)) = open_section_file(DEFAULT_SECTION, section, base_dir) {
            router.default = Some(writer);
            default_level = Some(level);
        }
    }

    let mut levels = Vec::new();
    for (name, section) in explicit_sections(cfg) {
        let opened = open_section_file(name, section, base_dir);
        levels.push((name.to_owned(), opened.as_ref().map(|(_, l)| *l)));
        router
            .by_prefix
            .push((name.to_owned(), opened.map(|(w, _)| w)));
    }

    let table = LevelTable::new(default_level, levels);
    (!table.is_silent()).then_some((table, router))
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: logging sections keyed by subsystem
/// - `base_dir`: directory used to resolve relative log file paths
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` before installing the subscriber.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

    let ansi = std::io::stdout().is_terminal();
    let console = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());
    let console = match EnvFilter::try_from_default_env() {
        Ok(env) => console.with_filter(env).boxed(),
        Err(_) => console
            .with_filter(LevelTable::console(cfg).into_filter())
            .boxed(),
    };

    let mut layers = vec![console];
    if let Some((table, router)) = build_file_sink(cfg, base_dir) {
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_current_span(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router)
                .with_filter(table.into_filter())
                .boxed(),
        );
    }

    let _ = Registry::default().with(layers).try_init();
}

/// Console-only logging at `RUST_LOG` (or info) for when no configuration is available.
pub fn init_default_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

// =================== tests ===================
