use std::time::{Duration, Instant};

use log::LevelFilter;

/// Controls per-statement logging on a connection.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub(crate) statements_level: LevelFilter,
    pub(crate) slow_statements_level: LevelFilter,
    pub(crate) slow_statements_duration: Duration,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            statements_level: LevelFilter::Debug,
            slow_statements_level: LevelFilter::Warn,
            slow_statements_duration: Duration::from_secs(1),
        }
    }
}

impl LogSettings {
    pub fn log_statements(&mut self, level: LevelFilter) {
        self.statements_level = level;
    }

    pub fn log_slow_statements(&mut self, level: LevelFilter, duration: Duration) {
        self.slow_statements_level = level;
        self.slow_statements_duration = duration;
    }
}

/// Logs a summary of one statement when dropped: elapsed time and row
/// counts, at the configured level (escalating for slow statements).
pub(crate) struct QueryLogger<'q> {
    sql: &'q str,
    rows_returned: u64,
    rows_affected: u64,
    start: Instant,
    settings: LogSettings,
}

impl<'q> QueryLogger<'q> {
    pub(crate) fn new(sql: &'q str, settings: LogSettings) -> Self {
        Self {
            sql,
            rows_returned: 0,
            rows_affected: 0,
            start: Instant::now(),
            settings,
        }
    }

    pub(crate) fn increment_rows_returned(&mut self) {
        self.rows_returned += 1;
    }

    pub(crate) fn increase_rows_affected(&mut self, n: u64) {
        self.rows_affected += n;
    }
}

impl<'q> Drop for QueryLogger<'q> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let was_slow = elapsed >= self.settings.slow_statements_duration;

        let lvl = if was_slow {
            self.settings.slow_statements_level
        } else {
            self.settings.statements_level
        };

        if let Some(lvl) = lvl
            .to_level()
            .filter(|lvl| log::log_enabled!(target: "unisql::query", *lvl))
        {
            log::logger().log(
                &log::Record::builder()
                    .args(format_args!(
                        "{}; rows returned: {}, rows affected: {}, elapsed: {:.3?}",
                        self.sql, self.rows_returned, self.rows_affected, elapsed
                    ))
                    .level(lvl)
                    .module_path_static(Some("unisql::query"))
                    .target("unisql::query")
                    .build(),
            );
        }
    }
}
