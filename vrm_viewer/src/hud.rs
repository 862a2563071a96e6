//! On-screen log, the native version of the page's HUD panel: an append-only
//! list of leveled entries that the text overlay draws and that also mirrors
//! into the `log` facade for terminal capture. Entries are never evicted;
//! viewer sessions are short-lived.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Ok,
    Err,
}

impl LogLevel {
    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Info => "--",
            LogLevel::Ok => "ok",
            LogLevel::Err => "!!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn line(&self) -> String {
        format!("{} {}", self.level.prefix(), self.message)
    }
}

#[derive(Debug, Default)]
pub struct HudLog {
    entries: Vec<LogEntry>,
}

impl HudLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn ok(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Ok, message.into());
    }

    pub fn err(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Err, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Err => log::error!("[hud] {message}"),
            _ => log::info!("[hud] {message}"),
        }
        self.entries.push(LogEntry { level, message });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.level == LogLevel::Err)
            .count()
    }

    /// Newest `max` lines, oldest first, for the overlay panel.
    pub fn tail_lines(&self, max: usize) -> Vec<String> {
        let start = self.entries.len().saturating_sub(max);
        self.entries[start..]
            .iter()
            .map(LogEntry::line)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_arrival_order_and_levels() {
        let mut hud = HudLog::new();
        hud.info("booting");
        hud.ok("loaded abbey.vrm");
        hud.err("missing model");
        let entries = hud.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[2].level, LogLevel::Err);
        assert_eq!(hud.error_count(), 1);
    }

    #[test]
    fn tail_returns_newest_lines_oldest_first() {
        let mut hud = HudLog::new();
        for index in 0..10 {
            hud.info(format!("entry {index}"));
        }
        let tail = hud.tail_lines(3);
        assert_eq!(tail, vec!["-- entry 7", "-- entry 8", "-- entry 9"]);
    }

    #[test]
    fn tail_handles_short_logs() {
        let mut hud = HudLog::new();
        hud.ok("only one");
        assert_eq!(hud.tail_lines(5), vec!["ok only one"]);
    }
}
