//! Parsers for the `/proc` pseudo-filesystem.
//!
//! Every reader here is best-effort: a missing or malformed source file
//! yields a zero/empty/`None` result, never an error. Each reader is
//! split into a pure `parse_*` function over the file text and a thin
//! `read_*` wrapper that does the bounded file I/O, so the parsing rules
//! stay unit-testable without a live kernel.

use std::fs;
use std::path::Path;

use crate::core::snapshot::{CpuTimes, MemorySnapshot};

/// Longest process name kept in the table; `/proc/<pid>/comm` is 15
/// bytes but kernel threads can render longer through stat.
const MAX_NAME_LEN: usize = 64;

/// System page size in bytes, for converting resident page counts.
pub fn page_size() -> u64 {
    let sz = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if sz > 0 {
        sz as u64
    } else {
        4096
    }
}

/// Aggregate CPU tick counters from the first line of `/proc/stat`.
pub fn read_cpu_times() -> CpuTimes {
    fs::read_to_string("/proc/stat")
        .ok()
        .and_then(|text| parse_cpu_times(&text))
        .unwrap_or_default()
}

/// Number of logical CPUs, counted from the per-core `cpuN` lines of
/// `/proc/stat`. Never less than 1.
pub fn read_cpu_count() -> usize {
    fs::read_to_string("/proc/stat")
        .map(|text| parse_cpu_count(&text))
        .unwrap_or(1)
}

/// Memory usage from `/proc/meminfo`.
pub fn read_memory() -> MemorySnapshot {
    fs::read_to_string("/proc/meminfo")
        .map(|text| parse_meminfo(&text))
        .unwrap_or_default()
}

/// Cumulative (interface, rx bytes, tx bytes) counters from
/// `/proc/net/dev`, with loopback excluded.
pub fn read_net_counters() -> Vec<(String, u64, u64)> {
    fs::read_to_string("/proc/net/dev")
        .map(|text| parse_net_dev(&text))
        .unwrap_or_default()
}

/// Fields extracted from one `/proc/<pid>/stat` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidStat {
    pub name: String,
    pub total_ticks: u64,
    pub threads: i64,
    pub rss_pages: u64,
}

/// Read and parse `/proc/<pid>/stat`.
///
/// Returns `None` when the process exited between the directory listing
/// and this read (the common transient race) or the line does not parse.
pub fn read_pid_stat(pid: i32) -> Option<PidStat> {
    let text = fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    parse_pid_stat(&text)
}

/// List currently known pids from the numeric entries of `/proc`.
pub fn list_pids() -> Vec<i32> {
    let mut pids = Vec::new();
    let Ok(entries) = fs::read_dir("/proc") else {
        return pids;
    };
    for entry in entries.flatten() {
        if let Some(pid) = entry
            .file_name()
            .to_str()
            .filter(|name| name.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|name| name.parse::<i32>().ok())
        {
            pids.push(pid);
        }
    }
    pids
}

/// Parse the aggregate `cpu ` line: eight unsigned counters in fixed
/// field order (user nice system idle iowait irq softirq steal).
pub fn parse_cpu_times(text: &str) -> Option<CpuTimes> {
    let line = text.lines().next()?;
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }
    let mut next = || fields.next().and_then(|f| f.parse::<u64>().ok());
    Some(CpuTimes {
        user: next()?,
        nice: next()?,
        system: next()?,
        idle: next()?,
        iowait: next()?,
        irq: next()?,
        softirq: next()?,
        steal: next()?,
    })
}

/// Count lines beginning with `cpu<digit>`.
pub fn parse_cpu_count(text: &str) -> usize {
    let count = text
        .lines()
        .filter(|line| {
            line.strip_prefix("cpu")
                .and_then(|rest| rest.bytes().next())
                .is_some_and(|b| b.is_ascii_digit())
        })
        .count();
    count.max(1)
}

/// Scan `/proc/meminfo` key:value lines; all values are kilobytes.
pub fn parse_meminfo(text: &str) -> MemorySnapshot {
    let mut total = 0u64;
    let mut avail = 0u64;
    let mut swap_total = 0u64;
    let mut swap_free = 0u64;
    let mut cma_total = 0u64;
    let mut cma_free = 0u64;

    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(kb) = rest.split_whitespace().next().and_then(|v| v.parse().ok()) else {
            continue;
        };
        match key {
            "MemTotal" => total = kb,
            "MemAvailable" => avail = kb,
            "SwapTotal" => swap_total = kb,
            "SwapFree" => swap_free = kb,
            "CmaTotal" => cma_total = kb,
            "CmaFree" => cma_free = kb,
            _ => {}
        }
    }

    MemorySnapshot {
        total_bytes: total * 1024,
        used_bytes: total.saturating_sub(avail) * 1024,
        swap_total_bytes: swap_total * 1024,
        swap_used_bytes: swap_total.saturating_sub(swap_free) * 1024,
        cma_total_bytes: cma_total * 1024,
        cma_used_bytes: cma_total.saturating_sub(cma_free) * 1024,
    }
}

/// Parse `/proc/net/dev`: two header lines, then one line per interface
/// with the name before a colon and the cumulative rx/tx byte counters
/// as the 1st and 9th numeric fields. Loopback is excluded here so no
/// caller can ever pick it.
pub fn parse_net_dev(text: &str) -> Vec<(String, u64, u64)> {
    let mut counters = Vec::new();
    for line in text.lines().skip(2) {
        let Some((iface, rest)) = line.split_once(':') else {
            continue;
        };
        let iface = iface.trim();
        if iface.is_empty() || iface == "lo" {
            continue;
        }
        let mut fields = rest.split_whitespace();
        let Some(rx) = fields.next().and_then(|f| f.parse::<u64>().ok()) else {
            continue;
        };
        let Some(tx) = fields.nth(7).and_then(|f| f.parse::<u64>().ok()) else {
            continue;
        };
        counters.push((iface.to_string(), rx, tx));
    }
    counters
}

/// Parse one `/proc/<pid>/stat` line.
///
/// The name sits between the first `(` and the *last* `)` — process
/// names may themselves contain parentheses or whitespace, which is why
/// a plain whitespace split cannot work. After the closing parenthesis
/// the fields are fixed-position: utime and stime at offsets 11/12,
/// thread count at 17, resident page count at 21 (the state character
/// is offset 0).
pub fn parse_pid_stat(text: &str) -> Option<PidStat> {
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    let mut name = text.get(open + 1..close)?.to_string();
    name.truncate(MAX_NAME_LEN);

    let fields: Vec<&str> = text.get(close + 1..)?.split_whitespace().collect();
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    let threads: i64 = fields.get(17)?.parse().ok()?;
    let rss: i64 = fields.get(21)?.parse().ok()?;

    Some(PidStat {
        name,
        total_ticks: utime + stime,
        threads,
        rss_pages: rss.max(0) as u64,
    })
}

/// Read a file expected to contain a single number, with a small bound
/// on how much is pulled in. Shared by the sysfs probes.
pub fn read_number_file(path: &Path) -> Option<f64> {
    let text = fs::read_to_string(path).ok()?;
    text.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_cpu_times() {
        let text = "cpu  100 20 300 4000 50 6 7 8\ncpu0 50 10 150 2000 25 3 3 4\n";
        let t = parse_cpu_times(text).unwrap();
        assert_eq!(t.user, 100);
        assert_eq!(t.steal, 8);
        assert_eq!(t.total(), 4491);
        assert_eq!(t.idle_total(), 4050);
    }

    #[test]
    fn test_parse_cpu_times_rejects_garbage() {
        assert!(parse_cpu_times("intr 12345").is_none());
        assert!(parse_cpu_times("cpu 1 2 3").is_none());
        assert!(parse_cpu_times("").is_none());
    }

    #[test]
    fn test_parse_cpu_count() {
        let text = "cpu  1 2 3 4 5 6 7 8\ncpu0 0 0 0 0 0 0 0 0\ncpu1 0 0 0 0 0 0 0 0\nintr 99\n";
        assert_eq!(parse_cpu_count(text), 2);
        // No per-core lines still reports one CPU.
        assert_eq!(parse_cpu_count("cpu 1 2 3 4 5 6 7 8\n"), 1);
    }

    #[test]
    fn test_parse_meminfo_scenario() {
        let text = "MemTotal:        8000000 kB\n\
                    MemFree:          500000 kB\n\
                    MemAvailable:    2000000 kB\n\
                    SwapTotal:       1000000 kB\n\
                    SwapFree:         750000 kB\n";
        let m = parse_meminfo(text);
        assert_eq!(m.total_bytes, 8_000_000 * 1024);
        assert_eq!(m.used_bytes, 6_000_000 * 1024);
        assert!((m.used_percent() - 75.0).abs() < 1e-9);
        assert_eq!(m.swap_used_bytes, 250_000 * 1024);
        assert!(!m.has_cma());
    }

    #[test]
    fn test_parse_meminfo_clamps_used() {
        // MemAvailable larger than MemTotal must not underflow.
        let m = parse_meminfo("MemTotal: 100 kB\nMemAvailable: 200 kB\n");
        assert_eq!(m.used_bytes, 0);
    }

    #[test]
    fn test_parse_net_dev_skips_loopback() {
        let text = "Inter-|   Receive                                                |  Transmit\n\
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n\
    lo: 9999999    100    0    0    0     0          0         0  9999999     100    0    0    0     0       0          0\n\
  eth0:    1000     10    0    0    0     0          0         0     1000      10    0    0    0     0       0          0\n\
 wlan0:      50      1    0    0    0     0          0         0       50       1    0    0    0     0       0          0\n";
        let counters = parse_net_dev(text);
        assert_eq!(counters.len(), 2);
        assert_eq!(counters[0], ("eth0".to_string(), 1000, 1000));
        assert_eq!(counters[1], ("wlan0".to_string(), 50, 50));
    }

    #[test]
    fn test_parse_pid_stat_plain() {
        let text = "1234 (bash) S 1 1234 1234 34816 1234 4194304 1000 2000 0 0 \
                    150 75 10 5 20 0 3 0 100 10000000 512 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0";
        let stat = parse_pid_stat(text).unwrap();
        assert_eq!(stat.name, "bash");
        assert_eq!(stat.total_ticks, 150 + 75);
        assert_eq!(stat.threads, 3);
        assert_eq!(stat.rss_pages, 512);
    }

    #[test]
    fn test_parse_pid_stat_parens_in_name() {
        // The name must span first-( to last-), not the first matching pair.
        let text = "42 (alice (test)) R 1 42 42 0 -1 4194304 0 0 0 0 \
                    7 3 0 0 20 0 2 0 50 1000 64 0 1 1 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0";
        let stat = parse_pid_stat(text).unwrap();
        assert_eq!(stat.name, "alice (test)");
        assert_eq!(stat.total_ticks, 10);
        assert_eq!(stat.threads, 2);
        assert_eq!(stat.rss_pages, 64);
    }

    #[test]
    fn test_parse_pid_stat_short_line() {
        assert!(parse_pid_stat("42 (x) R 1 42").is_none());
        assert!(parse_pid_stat("no parens here").is_none());
    }

    #[test]
    fn test_read_number_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "  37000  ").unwrap();
        assert_eq!(read_number_file(f.path()), Some(37000.0));
        assert_eq!(read_number_file(Path::new("/nonexistent/ltop-test")), None);
    }
}
