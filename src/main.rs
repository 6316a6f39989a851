use anyhow::Result;
use clap::{Arg, Command};

use ltop::core::sampler::Sampler;
use ltop::core::snapshot::SortMode;
use ltop::platform::gpu::GpuMonitor;
use ltop::ui::{run_monitor, MonitorConfig};

fn main() -> Result<()> {
    ltop::init_logging();

    let matches = Command::new("ltop")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lightweight terminal resource monitor for Linux")
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("MS")
                .help("Sampling interval in milliseconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("500"),
        )
        .arg(
            Arg::new("no-gpu")
                .long("no-gpu")
                .help("Disable GPU probing")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print one JSON sample per interval instead of the dashboard")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let interval_ms = *matches.get_one::<u64>("interval").unwrap();
    let enable_gpu = !matches.get_flag("no-gpu");

    if matches.get_flag("json") {
        run_json_output(interval_ms, enable_gpu)
    } else {
        run_monitor(MonitorConfig {
            interval_ms,
            enable_gpu,
        })
    }
}

/// Headless mode: stream samples as JSON lines for scripts. Runs until
/// killed; a SIGINT lands between samples and needs no terminal cleanup.
fn run_json_output(interval_ms: u64, enable_gpu: bool) -> Result<()> {
    let gpu = if enable_gpu {
        GpuMonitor::new()
    } else {
        GpuMonitor::disabled()
    };
    let mut sampler = Sampler::new(gpu);

    loop {
        let sample = sampler.sample(SortMode::Cpu, "");
        println!("{}", serde_json::to_string(&sample)?);
        std::thread::sleep(std::time::Duration::from_millis(interval_ms.max(1)));
    }
}
