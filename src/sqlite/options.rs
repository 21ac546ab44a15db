use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::connection::LogSettings;
use crate::error::Error;

/// Options for opening an SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteConnectOptions {
    pub(crate) filename: PathBuf,
    pub(crate) in_memory: bool,
    pub(crate) create_if_missing: bool,
    pub(crate) read_only: bool,
    pub(crate) log_settings: LogSettings,
}

impl Default for SqliteConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteConnectOptions {
    pub fn new() -> Self {
        Self {
            filename: PathBuf::from(":memory:"),
            in_memory: true,
            create_if_missing: false,
            read_only: false,
            log_settings: Default::default(),
        }
    }

    pub fn filename(mut self, filename: impl AsRef<Path>) -> Self {
        self.filename = filename.as_ref().to_owned();
        self.in_memory = false;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn log_statements(mut self, level: log::LevelFilter) -> Self {
        self.log_settings.log_statements(level);
        self
    }
}

impl FromStr for SqliteConnectOptions {
    type Err = Error;

    /// Parse `sqlite://path/to/db.sqlite`, `sqlite::memory:`, or a bare
    /// filesystem path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut options = Self::new();

        let path = s
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        if path == ":memory:" || path.is_empty() {
            return Ok(options);
        }

        options = options.filename(path).create_if_missing(true);

        Ok(options)
    }
}

#[test]
fn it_parses_urls_and_memory() {
    let memory: SqliteConnectOptions = "sqlite::memory:".parse().unwrap();
    assert!(memory.in_memory);

    let file: SqliteConnectOptions = "sqlite://data/app.db".parse().unwrap();
    assert!(!file.in_memory);
    assert_eq!(file.filename, std::path::PathBuf::from("data/app.db"));
}
