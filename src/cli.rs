use crate::{error::LogError, level::LogLevel, options::Options};
use clap::Parser;
use std::path::PathBuf;

/// xlog - copy stdin into a leveled, daily-rotating log
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Base log file name; writes <FILE>.<YYYYMMDD> and keeps <FILE> as a symlink to it.
    /// Logs to stdout when omitted.
    #[clap(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// JSON options file (level, queue_capacity, pool_capacity)
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Minimum level to write; overrides the options file
    #[clap(short = 'l', long, value_enum)]
    pub level: Option<LogLevel>,

    /// Record queue capacity; overrides the options file
    #[clap(short = 'q', long)]
    pub queue_capacity: Option<usize>,

    /// Level each input line is logged at
    #[clap(short = 'a', long = "as", value_enum, default_value_t = LogLevel::Info)]
    pub as_level: LogLevel,

    /// printf-style template for each line; the line is its only operand
    #[clap(short = 't', long)]
    pub template: Option<String>,
}

impl Args {
    /// Options from the config file, if any, with command-line overrides applied.
    pub fn options(&self) -> Result<Options, LogError> {
        let mut options = match &self.config {
            Some(path) => Options::from_json_file(path)?,
            None => Options::default(),
        };
        if let Some(level) = self.level {
            options.level = level;
        }
        if let Some(capacity) = self.queue_capacity {
            options.queue_capacity = capacity;
        }
        Ok(options)
    }
}
