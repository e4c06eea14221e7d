//! 脚本命令的解析与执行
//!
//! 每行一条命令，`#` 之后的内容为注释，空行被忽略。

use std::io::{self, Write};

use pagesim::{AccessMode, Pid, SwitchOutcome, Vm, Vpn};

/// 一条脚本命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `alloc <vpn> r|rw`
    Alloc(Vpn, AccessMode),
    /// `free <vpn>`
    Free(Vpn),
    /// `read <vpn>` / `write <vpn>`
    Access(Vpn, AccessMode),
    /// `switch <pid>`
    Switch(Pid),
    /// `show`：打印当前页表
    Show,
    /// `pages`：打印所有被映射的帧
    Pages,
    /// `stats`：打印帧池与缺页统计
    Stats,
    /// `check`：校验映射计数
    Check,
    /// `exit`
    Exit,
}

/// 解析一行脚本；空行或纯注释返回 `Ok(None)`
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.split('#').next().unwrap_or("");
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };

    let command = match name {
        "alloc" => {
            let vpn = parse_vpn(words.next())?;
            let rw = match words.next() {
                Some("r") => AccessMode::READ,
                Some("rw") => AccessMode::RW,
                Some(other) => return Err(format!("invalid permission '{}'", other)),
                None => return Err("alloc: missing permission (r|rw)".into()),
            };
            Command::Alloc(vpn, rw)
        }
        "free" => Command::Free(parse_vpn(words.next())?),
        "read" => Command::Access(parse_vpn(words.next())?, AccessMode::READ),
        "write" => Command::Access(parse_vpn(words.next())?, AccessMode::WRITE),
        "switch" => {
            let pid = words.next().ok_or("switch: missing pid")?;
            let pid = pid
                .parse::<u32>()
                .map_err(|_| format!("invalid pid '{}'", pid))?;
            Command::Switch(Pid(pid))
        }
        "show" => Command::Show,
        "pages" => Command::Pages,
        "stats" => Command::Stats,
        "check" => Command::Check,
        "exit" => Command::Exit,
        other => return Err(format!("unknown command '{}'", other)),
    };

    if let Some(extra) = words.next() {
        return Err(format!("{}: unexpected argument '{}'", name, extra));
    }
    Ok(Some(command))
}

fn parse_vpn(word: Option<&str>) -> Result<Vpn, String> {
    let word = word.ok_or("missing vpn")?;
    word.parse::<usize>()
        .map(Vpn)
        .map_err(|_| format!("invalid vpn '{}'", word))
}

/// 执行一条命令，结果写入 `out`
///
/// 返回 `false` 表示脚本应当结束。
pub fn execute(vm: &mut Vm, command: Command, out: &mut impl Write) -> io::Result<bool> {
    let pid = vm.current_pid();
    match command {
        Command::Alloc(vpn, rw) => match vm.allocate_page(vpn, rw) {
            Ok(pfn) => writeln!(out, "[{}] alloc vpn {} ({}) -> pfn {}", pid, vpn, rw, pfn)?,
            Err(err) => writeln!(out, "[{}] alloc vpn {} failed: {}", pid, vpn, err)?,
        },
        Command::Free(vpn) => match vm.try_free_page(vpn) {
            Ok(pfn) => writeln!(out, "[{}] free vpn {} (pfn {})", pid, vpn, pfn)?,
            Err(err) => writeln!(out, "[{}] free vpn {} ignored: {}", pid, vpn, err)?,
        },
        Command::Access(vpn, rw) => {
            let op = if rw.is_write() { "write" } else { "read" };
            match vm.access(vpn, rw) {
                Ok(pfn) => writeln!(out, "[{}] {} vpn {} -> pfn {}", pid, op, vpn, pfn)?,
                Err(err) => writeln!(out, "[{}] {} vpn {} denied: {}", pid, op, vpn, err)?,
            }
        }
        Command::Switch(target) => match vm.switch_or_fork(target) {
            SwitchOutcome::Switched => writeln!(out, "switch {} -> {}", pid, target)?,
            SwitchOutcome::Forked => writeln!(out, "fork {} -> {}", pid, target)?,
        },
        Command::Show => {
            writeln!(out, "[{}] page table:", pid)?;
            write!(out, "{}", vm.ptbr())?;
        }
        Command::Pages => {
            for (pfn, &count) in vm.frames().mapcounts().iter().enumerate() {
                if count > 0 {
                    writeln!(out, "pfn {:>4}: {} mapping(s)", pfn, count)?;
                }
            }
        }
        Command::Stats => {
            let (total, allocated, free) = vm.frames().get_stats();
            let stats = vm.stats();
            writeln!(
                out,
                "frames: {} total, {} allocated, {} free",
                total, allocated, free
            )?;
            writeln!(
                out,
                "faults: {} total, {} cow copies, {} cow reuses, {} spurious, {} denied",
                stats.total(),
                stats.cow_copies,
                stats.cow_reuses,
                stats.spurious,
                stats.denied
            )?;
            writeln!(out, "processes: {}", vm.processes().len())?;
        }
        Command::Check => match vm.verify_mapcounts() {
            Ok(()) => writeln!(out, "check: ok")?,
            Err(mismatch) => writeln!(out, "check: {}", mismatch)?,
        },
        Command::Exit => return Ok(false),
    }
    Ok(true)
}
