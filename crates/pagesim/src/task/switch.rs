//! 进程切换与写时复制 fork

use crate::task::{Pid, Process};
use crate::vm::Vm;

/// [`Vm::switch_or_fork`] 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// 切换到了已存在的进程
    Switched,
    /// 没有匹配的进程，从当前进程 fork 出了新进程
    Forked,
}

impl Vm {
    /// 切换到 `pid` 对应的进程；不存在时从当前进程 fork 一个新进程并切换过去。
    ///
    /// fork 时子进程获得与父进程相同的页表项值：同样的帧号和原始权限，
    /// 但父子双方的表项都被清除可写位，每条新的共享映射使帧计数加一。
    /// 之后任意一方写入都会触发 [`Vm::handle_page_fault`] 进行写时复制。
    pub fn switch_or_fork(&mut self, pid: Pid) -> SwitchOutcome {
        if let Some(index) = self.processes.position(pid) {
            self.set_current(index);
            log::trace!("switch: now running pid {}", pid);
            return SwitchOutcome::Switched;
        }

        let parent_pid = self.current_pid();
        let child_table = self.current_process_mut().page_table_mut().clone_for_fork();

        let mut shared = 0usize;
        for (_, pte) in child_table.valid_entries() {
            self.frames.increment(pte.pfn());
            shared += 1;
        }

        let index = self.processes.push_back(Process::new(pid, child_table));
        self.set_current(index);
        log::trace!(
            "fork: pid {} -> pid {}, {} page(s) shared copy-on-write",
            parent_pid,
            pid,
            shared
        );
        SwitchOutcome::Forked
    }
}
