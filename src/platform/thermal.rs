//! CPU temperature and frequency from `/sys` and `/proc/cpuinfo`.
//!
//! Same best-effort contract as the rest of the platform layer: every
//! reader returns `None` when the machine does not expose the source.

use std::fs;
use std::path::Path;

use super::proc::read_number_file;

/// CPU package temperature in degrees Celsius.
///
/// First pass scans the thermal zones for a type that looks like a CPU
/// sensor; hwmon is the fallback for machines (mostly x86) that only
/// publish coretemp/k10temp there, where the hottest sensor wins.
pub fn read_cpu_temp() -> Option<f64> {
    thermal_zone_temp().or_else(hwmon_cpu_temp)
}

/// Temperature of thermal_zone0, the catch-all sensor SoC GPU probes
/// fall back to.
pub fn read_thermal_zone0() -> Option<f64> {
    read_number_file(Path::new("/sys/class/thermal/thermal_zone0/temp")).map(millidegrees)
}

/// Average core frequency in MHz, from `/proc/cpuinfo` with the cpufreq
/// sysfs tree as fallback.
pub fn read_cpu_freq_mhz() -> Option<f64> {
    fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|text| parse_cpuinfo_mhz(&text))
        .or_else(scaling_freq_mhz)
}

fn thermal_zone_temp() -> Option<f64> {
    let entries = fs::read_dir("/sys/class/thermal").ok()?;
    for entry in entries.flatten() {
        let zone = entry.path();
        if !entry
            .file_name()
            .to_string_lossy()
            .starts_with("thermal_zone")
        {
            continue;
        }
        let Ok(kind) = fs::read_to_string(zone.join("type")) else {
            continue;
        };
        if !is_cpu_sensor(&kind, &["pkg", "cpu", "core", "soc"]) {
            continue;
        }
        if let Some(t) = read_number_file(&zone.join("temp")) {
            return Some(millidegrees(t));
        }
    }
    None
}

fn hwmon_cpu_temp() -> Option<f64> {
    let entries = fs::read_dir("/sys/class/hwmon").ok()?;
    for entry in entries.flatten() {
        let hwmon = entry.path();
        let Ok(name) = fs::read_to_string(hwmon.join("name")) else {
            continue;
        };
        if !is_cpu_sensor(&name, &["coretemp", "cpu", "k10temp"]) {
            continue;
        }
        let mut best: Option<f64> = None;
        for sensor in fs::read_dir(&hwmon).ok()?.flatten() {
            let file = sensor.file_name().to_string_lossy().into_owned();
            if file.starts_with("temp") && file.ends_with("_input") {
                if let Some(t) = read_number_file(&sensor.path()).map(millidegrees) {
                    best = Some(best.map_or(t, |b: f64| b.max(t)));
                }
            }
        }
        if best.is_some() {
            return best;
        }
    }
    None
}

fn scaling_freq_mhz() -> Option<f64> {
    let entries = fs::read_dir("/sys/devices/system/cpu").ok()?;
    let mut total = 0.0;
    let mut count = 0u32;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let core = name
            .strip_prefix("cpu")
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()));
        if !core {
            continue;
        }
        if let Some(khz) = read_number_file(&entry.path().join("cpufreq/scaling_cur_freq")) {
            total += khz / 1000.0;
            count += 1;
        }
    }
    (count > 0).then(|| total / f64::from(count))
}

fn is_cpu_sensor(label: &str, needles: &[&str]) -> bool {
    let label = label.to_lowercase();
    needles.iter().any(|n| label.contains(n))
}

fn millidegrees(raw: f64) -> f64 {
    raw / 1000.0
}

/// Average the `cpu MHz` lines of `/proc/cpuinfo`.
pub fn parse_cpuinfo_mhz(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0u32;
    for line in text.lines() {
        if !line.starts_with("cpu MHz") {
            continue;
        }
        if let Some(mhz) = line
            .split_once(':')
            .and_then(|(_, v)| v.trim().parse::<f64>().ok())
        {
            total += mhz;
            count += 1;
        }
    }
    (count > 0).then(|| total / f64::from(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpuinfo_mhz() {
        let text = "processor\t: 0\ncpu MHz\t\t: 2400.000\nprocessor\t: 1\ncpu MHz\t\t: 1600.000\n";
        assert_eq!(parse_cpuinfo_mhz(text), Some(2000.0));
        assert_eq!(parse_cpuinfo_mhz("model name : foo\n"), None);
    }

    #[test]
    fn test_is_cpu_sensor() {
        assert!(is_cpu_sensor("x86_pkg_temp\n", &["pkg", "cpu"]));
        assert!(is_cpu_sensor("CPU-thermal", &["pkg", "cpu"]));
        assert!(!is_cpu_sensor("nvme\n", &["pkg", "cpu", "core", "soc"]));
    }
}
