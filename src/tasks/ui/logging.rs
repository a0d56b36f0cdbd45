use crate::FailResult;
use crate::ui::color::paint;

use log::{Level, LevelFilter};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Handle to a log file that only begins receiving output once it has a path.
///
/// Logging starts before the trial directory exists, and anything logged before
/// `start` goes to stdout only.
#[derive(Debug, Clone)]
pub struct SetGlobalLogfile(Arc<Mutex<Option<File>>>);

impl SetGlobalLogfile {
    pub fn start(&self, path: impl AsRef<Path>) -> FailResult<()> {
        let file = asgrid_fs_util::create(path)?;
        match self.0.lock() {
            Ok(mut guard) => *guard = Some(file),
            Err(_) => bail!("the logfile lock was poisoned"),
        }
        Ok(())
    }
}

struct DelayedLogfile(Arc<Mutex<Option<File>>>);

impl log::Log for DelayedLogfile {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool { true }

    fn log(&self, record: &log::Record<'_>) {
        if let Ok(mut guard) = self.0.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = writeln!(file, "{}", record.args());
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.0.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Install the global logger. Call this once, at the top of `main`.
pub fn init_global_logger() -> FailResult<SetGlobalLogfile> {
    use std::time::Instant;

    let logfile = SetGlobalLogfile(Arc::new(Mutex::new(None)));

    let start = Instant::now();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            let t = start.elapsed();
            out.finish(format_args!("[{:>4}.{:03}s][{}][{}] {}",
                t.as_secs(),
                t.subsec_millis(),
                record.target(),
                ColorizedLevel(record.level()),
                message))
        })
        .level(LevelFilter::Debug)
        .level_for("asgrid_tasks", LevelFilter::Trace)
        .level_for("asgrid_subspace", LevelFilter::Trace)
        .level_for("asgrid_sparse_grid", LevelFilter::Debug)
        .chain(std::io::stdout())
        .chain(Box::new(DelayedLogfile(logfile.0.clone())) as Box<dyn log::Log>)
        .apply()?;

    Ok(logfile)
}

#[derive(Debug, Copy, Clone)]
pub struct ColorizedLevel(pub Level);
impl fmt::Display for ColorizedLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let style = match self.0 {
            Level::Error => ansi_term::Colour::Red.bold(),
            Level::Warn  => ansi_term::Colour::Red.normal(),
            Level::Info  => ansi_term::Colour::Cyan.bold(),
            Level::Debug => ansi_term::Colour::Yellow.dimmed(),
            Level::Trace => ansi_term::Colour::Cyan.normal(),
        };
        write!(f, "{}", paint(style, self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn logfile_is_silent_until_started() {
        let tmp = asgrid_fs_util::TempDir::new("asgrid-logging").unwrap();
        let handle = SetGlobalLogfile(Arc::new(Mutex::new(None)));
        let sink = DelayedLogfile(handle.0.clone());

        let record = |msg: &str| {
            sink.log(&log::Record::builder().args(format_args!("{}", msg)).level(Level::Info).build());
        };
        record("dropped");
        let path = tmp.path().join("asgrid.log");
        handle.start(&path).unwrap();
        record("kept");
        sink.flush();

        assert_eq!(asgrid_fs_util::read_to_string(&path).unwrap(), "kept\n");
    }

    #[test]
    fn levels_are_colorized() {
        let s = ColorizedLevel(Level::Warn).to_string();
        assert!(s.contains("WARN"));
    }
}
