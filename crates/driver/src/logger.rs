//! stderr 日志输出
//!
//! 为 `log` 门面注册一个最简单的后端：每条记录一行，带级别与来源模块。
//! 级别由环境变量 `PAGESIM_LOG` 决定，未设置时为 `warn`，`-v` 提升到 `trace`。

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

/// 控制日志级别的环境变量
pub const LOG_ENV: &str = "PAGESIM_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:5}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// 解析日志级别名称
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// 安装日志后端
///
/// `verbose` 优先于环境变量。重复安装时保持第一次的后端，只更新级别。
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Trace
    } else {
        match std::env::var(LOG_ENV) {
            Ok(name) => parse_level(&name).unwrap_or_else(|| {
                eprintln!("Warning: unknown {} level '{}', using warn", LOG_ENV, name);
                LevelFilter::Warn
            }),
            Err(_) => LevelFilter::Warn,
        }
    };

    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
