use std::collections::VecDeque;

use time::{OffsetDateTime, UtcOffset, macros::format_description};

use crate::{launcher::RunStopper, selection::Selection};

/// Lines kept in the log pane; older ones are dropped.
pub const LOG_CAPACITY: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Stdout,
    Stderr,
    App,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub stamp: String,
    pub source: LogSource,
    pub text: String,
}

impl LogLine {
    /// Text shown in the log pane. Stderr lines are prefixed.
    pub fn rendered(&self) -> String {
        match self.source {
            LogSource::Stderr => format!("[{}] stderr: {}", self.stamp, self.text),
            LogSource::Stdout | LogSource::App => format!("[{}] {}", self.stamp, self.text),
        }
    }
}

/// Local offset, read while the process is still single-threaded. `time`
/// refuses to read it once other threads exist; falls back to UTC.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or_else(|e| {
        tracing::debug!("local offset unavailable, log times are UTC: {e}");
        UtcOffset::UTC
    })
}

#[derive(Debug)]
pub struct RunLog {
    lines: VecDeque<LogLine>,
    capacity: usize,
    offset: UtcOffset,
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new(LOG_CAPACITY, UtcOffset::UTC)
    }
}

impl RunLog {
    pub fn new(capacity: usize, offset: UtcOffset) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
            offset,
        }
    }

    pub fn push(&mut self, source: LogSource, text: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(LogLine {
            stamp: stamp_at(OffsetDateTime::now_utc(), self.offset),
            source,
            text: text.into(),
        });
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }
}

fn stamp_at(at: OffsetDateTime, offset: UtcOffset) -> String {
    at.to_offset(offset)
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

/// Per-window state. The selection is not persisted.
#[derive(Debug, Default)]
pub struct AppState {
    pub selection: Selection,
    pub log: RunLog,
    /// Present while a detector is running.
    pub stopper: Option<RunStopper>,
}

impl AppState {
    pub fn new(offset: UtcOffset) -> Self {
        Self {
            log: RunLog::new(LOG_CAPACITY, offset),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{datetime, offset};

    use super::*;

    #[test]
    fn log_drops_oldest_past_capacity() {
        let mut log = RunLog::new(3, UtcOffset::UTC);
        for i in 0..5 {
            log.push(LogSource::Stdout, format!("line {i}"));
        }
        let texts: Vec<_> = log.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn stamp_is_clock_time() {
        let mut log = RunLog::default();
        log.push(LogSource::App, "x");
        let stamp = &log.iter().next().unwrap().stamp;
        assert_eq!(stamp.len(), 8);
        assert_eq!(stamp.matches(':').count(), 2);
    }

    #[test]
    fn stderr_lines_are_prefixed() {
        let line = |source| LogLine {
            stamp: "12:00:00".into(),
            source,
            text: "cannot load weights".into(),
        };
        assert_eq!(
            line(LogSource::Stderr).rendered(),
            "[12:00:00] stderr: cannot load weights"
        );
        assert_eq!(line(LogSource::Stdout).rendered(), "[12:00:00] cannot load weights");
    }

    #[test]
    fn stamp_uses_the_captured_offset() {
        let at = datetime!(2024-03-01 23:30:05 UTC);
        assert_eq!(stamp_at(at, UtcOffset::UTC), "23:30:05");
        assert_eq!(stamp_at(at, offset!(+1:00)), "00:30:05");
        assert_eq!(stamp_at(at, offset!(-5:30)), "18:00:05");
    }
}
