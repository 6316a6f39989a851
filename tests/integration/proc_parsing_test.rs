use ltop::platform::proc::{
    parse_cpu_count, parse_cpu_times, parse_meminfo, parse_net_dev, parse_pid_stat,
};

// A realistic /proc/stat capture from a 4-core machine.
const PROC_STAT: &str = "\
cpu  36084 120 11099 1437169 2212 0 543 0 0 0
cpu0 9112 31 2874 359100 580 0 213 0 0 0
cpu1 8997 29 2751 359432 511 0 110 0 0 0
cpu2 9023 33 2792 359218 566 0 112 0 0 0
cpu3 8952 27 2682 359419 555 0 108 0 0 0
intr 7224061 9 0 0 0
ctxt 14560405
btime 1714412345
";

#[test]
fn test_proc_stat_capture() {
    let times = parse_cpu_times(PROC_STAT).unwrap();
    assert_eq!(times.user, 36084);
    assert_eq!(times.idle, 1_437_169);
    assert_eq!(times.iowait, 2212);
    assert_eq!(parse_cpu_count(PROC_STAT), 4);
}

#[test]
fn test_delta_between_two_captures() {
    let before = parse_cpu_times("cpu  100 0 100 800 0 0 0 0\n").unwrap();
    let after = parse_cpu_times("cpu  200 0 200 1400 0 0 0 0\n").unwrap();
    let total_delta = after.total() - before.total();
    let idle_delta = after.idle_total() - before.idle_total();
    assert_eq!(total_delta, 800);
    assert_eq!(idle_delta, 600);
    assert_eq!(
        ltop::core::sampler::aggregate_cpu_percent(total_delta, idle_delta),
        25.0
    );
}

#[test]
fn test_meminfo_capture() {
    let text = "\
MemTotal:       16290816 kB
MemFree:         1204120 kB
MemAvailable:    8145408 kB
Buffers:          402144 kB
Cached:          5120000 kB
SwapTotal:       2097148 kB
SwapFree:        2097148 kB
CmaTotal:         262144 kB
CmaFree:          131072 kB
";
    let mem = parse_meminfo(text);
    assert_eq!(mem.total_bytes, 16_290_816 * 1024);
    // Used is total minus available, not total minus free.
    assert_eq!(mem.used_bytes, 8_145_408 * 1024);
    assert!((mem.used_percent() - 50.0).abs() < 1e-9);
    assert!(mem.has_swap());
    assert_eq!(mem.swap_used_bytes, 0);
    assert!(mem.has_cma());
    assert_eq!(mem.cma_used_bytes, 131_072 * 1024);
}

#[test]
fn test_net_dev_busiest_is_derivable() {
    let text = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 500000000 1000 0 0 0 0 0 0 500000000 1000 0 0 0 0 0 0
  eth0: 123456789 5000 0 0 0 0 0 0 98765432 4000 0 0 0 0 0 0
 wlan0: 1000 10 0 0 0 0 0 0 2000 10 0 0 0 0 0 0
";
    let counters = parse_net_dev(text);
    // Loopback is dropped even though its counters dwarf the others.
    assert!(counters.iter().all(|(name, _, _)| name != "lo"));
    let busiest = counters.iter().max_by_key(|(_, rx, tx)| rx + tx).unwrap();
    assert_eq!(busiest.0, "eth0");
}

#[test]
fn test_pid_stat_full_pipeline_fields() {
    let line = "971 (tmux: server) S 1 971 971 0 -1 4194368 5000 100 12 0 \
                840 420 3 1 20 0 1 0 5000 12500000 900 18446744073709551615 \
                1 1 0 0 0 0 0 0 0 0 0 0 17 2 0 0 0 0 0";
    let stat = parse_pid_stat(line).unwrap();
    assert_eq!(stat.name, "tmux: server");
    assert_eq!(stat.total_ticks, 1260);
    assert_eq!(stat.threads, 1);
    assert_eq!(stat.rss_pages, 900);
}
