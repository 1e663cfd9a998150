//! Rolling Logger
//!
//! File logger for the scan client. Output goes to `<dir>/<app>.log`; once the
//! file grows past the size limit it is archived with a timestamp suffix and a
//! fresh file is started. Only the newest archives are kept.
//!
//! The most recent lines are also held in a circular in-memory buffer so a
//! diagnostics screen can show them without touching the disk.
//!
//! `log` records from library crates are bridged into the same subscriber.
//! On Android they additionally go to logcat.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

/// Size and retention limits for the log files
#[derive(Debug, Clone, Copy)]
pub struct RollPolicy {
    /// Roll the active file once it would exceed this many bytes
    pub max_bytes: u64,
    /// Archived files kept next to the active one
    pub max_archives: usize,
    /// Lines held in the in-memory ring
    pub ring_capacity: usize,
}

impl Default for RollPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            max_archives: 3,
            ring_capacity: 200,
        }
    }
}

/// Logger errors
#[derive(Debug)]
pub enum LoggerError {
    Io(io::Error),
    AlreadyInitialized,
    NotInitialized,
}

impl std::fmt::Display for LoggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggerError::Io(e) => write!(f, "log file error: {}", e),
            LoggerError::AlreadyInitialized => write!(f, "logger already initialized"),
            LoggerError::NotInitialized => write!(f, "logger not initialized"),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<io::Error> for LoggerError {
    fn from(e: io::Error) -> Self {
        LoggerError::Io(e)
    }
}

struct RollingState {
    dir: PathBuf,
    app_name: String,
    policy: RollPolicy,
    file: File,
    written: u64,
    recent: VecDeque<String>,
    partial: String,
}

impl RollingState {
    fn active_path(dir: &Path, app_name: &str) -> PathBuf {
        dir.join(format!("{}.log", app_name))
    }

    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.written > 0 && self.written + buf.len() as u64 > self.policy.max_bytes {
            self.roll()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;

        // Writers may hand over a line in several fragments
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(end) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=end).collect();
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if self.recent.len() == self.policy.ring_capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }
        Ok(())
    }

    fn roll(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let active = Self::active_path(&self.dir, &self.app_name);
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
        let archived = self.dir.join(format!("{}.{}.log", self.app_name, stamp));
        fs::rename(&active, &archived)?;

        self.file = OpenOptions::new().create(true).append(true).open(&active)?;
        self.written = 0;
        self.prune_archives()
    }

    fn prune_archives(&self) -> io::Result<()> {
        let prefix = format!("{}.", self.app_name);
        let active = format!("{}.log", self.app_name);
        let mut archives: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&prefix) && n.ends_with(".log") && n != active)
                    .unwrap_or(false)
            })
            .collect();

        // Timestamp suffixes sort chronologically
        archives.sort();
        let excess = archives.len().saturating_sub(self.policy.max_archives);
        for old in archives.into_iter().take(excess) {
            fs::remove_file(old)?;
        }
        Ok(())
    }
}

/// Shared handle to the rolling file; cheap to clone
#[derive(Clone)]
pub struct RollingLog {
    inner: Arc<Mutex<RollingState>>,
}

impl RollingLog {
    /// Open (or continue) the log file for `app_name` inside `dir`
    pub fn open(dir: impl Into<PathBuf>, app_name: &str, policy: RollPolicy) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let path = RollingState::active_path(&dir, app_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            inner: Arc::new(Mutex::new(RollingState {
                dir,
                app_name: app_name.to_string(),
                policy,
                file,
                written,
                recent: VecDeque::with_capacity(policy.ring_capacity),
                partial: String::new(),
            })),
        })
    }

    /// Snapshot of the circular buffer, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.recent.iter().cloned().collect()
    }
}

impl Write for RollingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.append(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingLog {
    type Writer = RollingLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// On Android the `log` facade has a single slot; this logger fills it and
/// sends every record both to logcat and into the tracing subscriber.
#[cfg(target_os = "android")]
mod android {
    use android_logger::{AndroidLogger, Config};
    use log::{Log, Metadata, Record};

    pub(crate) struct LogcatBridge {
        logcat: AndroidLogger,
    }

    impl LogcatBridge {
        pub(crate) fn new(tag: &str) -> Self {
            let config = Config::default()
                .with_max_level(log::LevelFilter::Info)
                .with_tag(tag.to_string());
            Self {
                logcat: AndroidLogger::new(config),
            }
        }
    }

    impl Log for LogcatBridge {
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            self.logcat.enabled(metadata)
        }

        fn log(&self, record: &Record<'_>) {
            self.logcat.log(record);
            // Into the rolling file via the global subscriber
            let _ = tracing_log::format_trace(record);
        }

        fn flush(&self) {}
    }
}

static LOGGER: OnceLock<RollingLog> = OnceLock::new();

/// Install the global subscriber writing to `log_dir/<app_name>.log`
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, app_name, RollPolicy::default())
}

/// Same as [`init_logger`] with explicit limits
pub fn init_logger_with(log_dir: PathBuf, app_name: &str, policy: RollPolicy) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }
    let rolling = RollingLog::open(log_dir, app_name, policy)?;

    let subscriber = tracing_subscriber::fmt()
        .with_writer(rolling.clone())
        .with_ansi(false)
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .finish();

    #[cfg(target_os = "android")]
    {
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|_| LoggerError::AlreadyInitialized)?;
        let bridge = android::LogcatBridge::new(app_name);
        log::set_logger(Box::leak(Box::new(bridge)))
            .map_err(|_| LoggerError::AlreadyInitialized)?;
        log::set_max_level(log::LevelFilter::Info);
    }

    #[cfg(not(target_os = "android"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;
        subscriber
            .try_init()
            .map_err(|_| LoggerError::AlreadyInitialized)?;
    }

    LOGGER.set(rolling).map_err(|_| LoggerError::AlreadyInitialized)?;
    log::info!(target: "rolling_logger", "logger ready for {}", app_name);
    Ok(())
}

fn ensure_init() -> Result<(), LoggerError> {
    LOGGER.get().map(|_| ()).ok_or(LoggerError::NotInitialized)
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    ensure_init()?;
    tracing::info!("{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), LoggerError> {
    ensure_init()?;
    tracing::warn!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    ensure_init()?;
    tracing::error!("{}", msg);
    Ok(())
}

/// Recent lines of the global logger; empty before initialization
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(RollingLog::recent_lines).unwrap_or_default()
}
