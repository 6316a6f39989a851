use ltop::core::sampler::{compare_processes, matches_filter, process_cpu_percent};
use ltop::core::snapshot::{ProcessInfo, SortMode};
use ltop::ui::dashboard::{clamp_selection, human_bytes, scroll_window, visible_rows};

fn row(pid: i32, name: &str, cpu: f64, mem: u64) -> ProcessInfo {
    ProcessInfo {
        pid,
        name: name.to_string(),
        cpu_percent: cpu,
        mem_bytes: mem,
        threads: 1,
    }
}

fn sample_table() -> Vec<ProcessInfo> {
    vec![
        row(1, "systemd", 0.1, 12 << 20),
        row(842, "firefox", 24.5, 900 << 20),
        row(843, "firefox", 3.0, 400 << 20),
        row(1200, "bash", 0.0, 5 << 20),
        row(1999, "cargo", 88.0, 300 << 20),
    ]
}

#[test]
fn test_filter_then_sort_pipeline() {
    let mut table: Vec<ProcessInfo> = sample_table()
        .into_iter()
        .filter(|p| matches_filter(&p.name, p.pid, "fire"))
        .collect();
    table.sort_by(|a, b| compare_processes(a, b, SortMode::Cpu));

    let pids: Vec<i32> = table.iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![842, 843]);
}

#[test]
fn test_pid_filter_pipeline() {
    let table: Vec<ProcessInfo> = sample_table()
        .into_iter()
        .filter(|p| matches_filter(&p.name, p.pid, "12"))
        .collect();
    // "12" matches pid 1200 only; no name contains it.
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].pid, 1200);
}

#[test]
fn test_memory_sort_order() {
    let mut table = sample_table();
    table.sort_by(|a, b| compare_processes(a, b, SortMode::Mem));
    let pids: Vec<i32> = table.iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![842, 843, 1999, 1, 1200]);
}

#[test]
fn test_selection_window_tracks_filtered_table() {
    // The table shrank under a filter; the old selection index must be
    // pulled back in range and the window re-derived from it.
    let count = 3;
    let selection = clamp_selection(40, count);
    assert_eq!(selection, 2);
    let visible = visible_rows(24);
    let (start, end) = scroll_window(selection, count, visible);
    assert_eq!((start, end), (0, 3));
}

#[test]
fn test_deep_table_window_and_footer_range() {
    let count = 500;
    let visible = visible_rows(40); // 27 rows of table
    let selection = clamp_selection(250, count);
    let (start, end) = scroll_window(selection, count, visible);
    assert!(start <= selection && selection < end);
    assert_eq!(end - start, visible);
    // Footer is 1-based inclusive: "Showing 238-264 of 500".
    assert_eq!(start + 1, 238);
    assert_eq!(end, 264);
}

#[test]
fn test_process_percent_matches_table_scale() {
    // 2 cores, 1000 total ticks in the window, one process burned 500:
    // the table shows 50%, same scale as the aggregate line.
    assert_eq!(process_cpu_percent(1500, 1000, 1000), 50.0);
}

#[test]
fn test_memory_column_formatting() {
    assert_eq!(human_bytes(900 << 20), "900.0 MiB");
    assert_eq!(human_bytes(5 << 30), "5.00 GiB");
    assert_eq!(human_bytes(1023), "1023 B");
}
