//! pagesim - 虚拟内存模拟器的脚本驱动程序
//!
//! Usage: pagesim [OPTIONS] [script]
//!
//! 从脚本文件（省略时为标准输入）逐行读取命令并在模拟器上执行，
//! 每条命令的结果打印到标准输出，日志打印到标准错误。
//!
//! Options:
//!   --frames N     物理帧数量（默认 128，最多 1048576）
//!   --ptes N       每张页表的表项数量（默认 16，最多 4096）
//!   -v, --verbose  打印所有映射变化的日志
//!   -h, --help     打印帮助信息

mod command;
mod logger;

use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process;

use pagesim::{MAX_PAGEFRAMES, MAX_PTES_PER_PAGE, MmConfig, NR_PAGEFRAMES, NR_PTES_PER_PAGE, Vm};

use command::{execute, parse_line};

/// 命令行配置
#[derive(Debug, PartialEq, Eq)]
struct Config {
    nr_pageframes: usize,
    nr_ptes_per_page: usize,
    verbose: bool,
    script: Option<String>,
}

impl MmConfig for Config {
    fn nr_pageframes(&self) -> usize {
        self.nr_pageframes
    }

    fn nr_ptes_per_page(&self) -> usize {
        self.nr_ptes_per_page
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("pagesim");

    let config = match parse_args(&args[1.min(args.len())..]) {
        Ok(Some(config)) => config,
        Ok(None) => {
            print_help(program);
            return;
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Try '{} --help' for more information.", program);
            process::exit(1);
        }
    };

    logger::init(config.verbose);

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn print_help(program: &str) {
    eprintln!("pagesim - two-level paging and copy-on-write fork simulator");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] [script]", program);
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  script  - Command script (reads stdin when omitted)");
    eprintln!();
    eprintln!("Options:");
    eprintln!(
        "  --frames N     Number of physical frames (default {}, max {})",
        NR_PAGEFRAMES, MAX_PAGEFRAMES
    );
    eprintln!(
        "  --ptes N       Entries per page table (default {}, max {})",
        NR_PTES_PER_PAGE, MAX_PTES_PER_PAGE
    );
    eprintln!("  -v, --verbose  Log every mapping change");
    eprintln!("  -h, --help     Print this help message");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  alloc <vpn> r|rw   free <vpn>   read <vpn>   write <vpn>");
    eprintln!("  switch <pid>   show   pages   stats   check   exit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!(
        "  {}  error|warn|info|debug|trace (default warn)",
        logger::LOG_ENV
    );
}

/// 解析命令行参数；请求帮助时返回 `Ok(None)`
fn parse_args(args: &[String]) -> Result<Option<Config>, String> {
    let mut config = Config {
        nr_pageframes: NR_PAGEFRAMES,
        nr_ptes_per_page: NR_PTES_PER_PAGE,
        verbose: false,
        script: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-v" | "--verbose" => config.verbose = true,
            "--frames" => {
                config.nr_pageframes = parse_count(arg, iter.next(), 0, MAX_PAGEFRAMES)?;
            }
            "--ptes" => {
                config.nr_ptes_per_page = parse_count(arg, iter.next(), 1, MAX_PTES_PER_PAGE)?;
            }
            s if s.starts_with('-') && s != "-" => {
                return Err(format!("Unknown option: {}", s));
            }
            path => {
                if config.script.is_some() {
                    return Err(format!("Unexpected argument: {}", path));
                }
                config.script = Some(path.to_string());
            }
        }
    }

    Ok(Some(config))
}

/// 解析数值参数并检查其范围 `min..=max`
fn parse_count(
    flag: &str,
    value: Option<&String>,
    min: usize,
    max: usize,
) -> Result<usize, String> {
    let value = value.ok_or_else(|| format!("{} requires a value", flag))?;
    let count = value
        .parse::<usize>()
        .map_err(|_| format!("{}: invalid number '{}'", flag, value))?;
    if !(min..=max).contains(&count) {
        return Err(format!(
            "{}: {} is out of range ({}..={})",
            flag, count, min, max
        ));
    }
    Ok(count)
}

/// 执行整个脚本
///
/// 格式错误的行会被报告并跳过，不中断脚本。
fn run(config: &Config) -> Result<(), String> {
    let input: Box<dyn BufRead> = match config.script.as_deref() {
        None | Some("-") => Box::new(BufReader::new(io::stdin())),
        Some(path) => {
            let file = File::open(path).map_err(|e| format!("cannot open {}: {}", path, e))?;
            Box::new(BufReader::new(file))
        }
    };

    let mut vm = Vm::new(config);
    log::info!(
        "pagesim: {} frames, {} ptes per table, {} addressable pages",
        vm.layout().nr_pageframes,
        vm.layout().nr_ptes_per_page,
        vm.layout().nr_vpns()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (lineno, line) in input.lines().enumerate() {
        let line = line.map_err(|e| format!("read error: {}", e))?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("line {}: {}", lineno + 1, e);
                continue;
            }
        };
        let keep_going =
            execute(&mut vm, command, &mut out).map_err(|e| format!("write error: {}", e))?;
        if !keep_going {
            break;
        }
    }
    out.flush().map_err(|e| format!("write error: {}", e))?;

    if let Err(mismatch) = vm.verify_mapcounts() {
        log::warn!("pagesim: mapcount audit failed: {}", mismatch);
    }
    Ok(())
}
