//! Console logging.
//!
//! Messages go through the `log` facade when the host application has installed a
//! logger. Without one, they are printed to the console with a timestamp and a
//! colored level tag so the binary stays readable out of the box.

use chrono::Local;
use colored::Colorize;

const TARGET: &str = "solana_wallet_monitor";

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

impl LogLevel {
    fn as_log_level(self) -> log::Level {
        match self {
            LogLevel::Info | LogLevel::Success => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

/// Logs a message at the given level.
pub fn log(level: LogLevel, message: &str) {
    if log::max_level() != log::LevelFilter::Off {
        log::log!(target: TARGET, level.as_log_level(), "{message}");
        return;
    }

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    match level {
        LogLevel::Info => println!("{timestamp} {} {message}", "INFO".blue().bold()),
        LogLevel::Success => println!("{timestamp} {} {message}", "OK".green().bold()),
        LogLevel::Warning => eprintln!("{timestamp} {} {message}", "WARN".yellow().bold()),
        LogLevel::Error => eprintln!("{timestamp} {} {message}", "ERROR".red().bold()),
        LogLevel::Debug => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogLevel::Success.as_log_level(), log::Level::Info);
        assert_eq!(LogLevel::Warning.as_log_level(), log::Level::Warn);
        assert_eq!(LogLevel::Debug.as_log_level(), log::Level::Debug);
    }
}
