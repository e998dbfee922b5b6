use std::sync::OnceLock;

use sysinfo::{CpuRefreshKind, RefreshKind, System};

/// `EX_UNAVAILABLE` from sysexits.h, used for fatal startup errors.
pub const EX_UNAVAILABLE: i32 = 69;

/// Online logical processors of the host.
///
/// Scheduler affinity and cgroup CPU quotas are not applied: a container
/// limited to 2 of the node's 8 processors still counts 8.
pub fn logical_cpus() -> u32 {
    static CPUS: OnceLock<u32> = OnceLock::new();
    *CPUS.get_or_init(|| {
        let sys = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));
        let online = match sys.cpus().len() {
            // unsupported platform
            0 => std::thread::available_parallelism().map_or(1, usize::from),
            n => n,
        };
        u32::try_from(online).unwrap_or(u32::MAX)
    })
}

/// Prints `<prog>: <error chain>` on one stderr line and exits with
/// [`EX_UNAVAILABLE`].
pub fn exit_fatal(prog: &str, err: &anyhow::Error) -> ! {
    eprintln!("{prog}: {err:#}");
    std::process::exit(EX_UNAVAILABLE)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn at_least_one_cpu() {
        assert!(logical_cpus() >= 1);
        assert_eq!(logical_cpus(), logical_cpus());
    }

    #[test]
    fn not_limited_by_affinity_or_quota() {
        let usable = std::thread::available_parallelism().unwrap().get();
        assert!(logical_cpus() as usize >= usable);
    }

    #[test]
    fn matches_online_processors() {
        // every online processor has a cpuN line in /proc/stat
        let Ok(stat) = std::fs::read_to_string("/proc/stat") else {
            return;
        };
        let online = stat
            .lines()
            .filter(|l| l.starts_with("cpu") && l.as_bytes().get(3).is_some_and(u8::is_ascii_digit))
            .count();
        assert_eq!(logical_cpus() as usize, online);
    }
}
