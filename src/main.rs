//! CLI Entry Point for sensor_daq
//!
//! Provides command-line access to the device catalog and a live monitor backed
//! by the simulated sensor source.
//!
//! # Usage
//!
//! List devices:
//! ```bash
//! sensor_daq list --category motion
//! sensor_daq list --search gyro --json
//! ```
//!
//! Inspect and monitor one device:
//! ```bash
//! sensor_daq describe 1
//! sensor_daq monitor 1 --rate game --seconds 10
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sensor_daq::config::{AppConfig, DEFAULT_CONFIG_PATH};
use sensor_daq::hardware::labels;
use sensor_daq::hardware::{
    DeviceCatalog, DeviceDescriptor, DeviceId, DeviceRegistry, SamplingRate, SensorCategory,
    SimulatedSensorSource,
};
use sensor_daq::logging::{self, OutputFormat, TracingConfig};
use sensor_daq::modules::{StreamController, TRACKED_AXES};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sensor_daq")]
#[command(about = "Live sensor streaming with bounded history and running statistics", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true, default_value = "compact")]
    log_format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available devices
    List {
        /// Only devices of this category (motion, position, environment, other)
        #[arg(long)]
        category: Option<SensorCategory>,

        /// Case-insensitive match on device or sensor type name
        #[arg(long)]
        search: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the full descriptor of one device
    Describe {
        /// Platform sensor type id
        id: DeviceId,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Stream one device and print running statistics
    Monitor {
        /// Platform sensor type id
        id: DeviceId,

        /// Sampling rate (normal, ui, game, fastest); defaults to the configured rate
        #[arg(long)]
        rate: Option<SamplingRate>,

        /// Stop after this many seconds (runs until Ctrl-C when omitted)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate()?;

    let tracing_config = TracingConfig::from_app_config(&config)?.with_format(cli.log_format);
    logging::init(tracing_config)?;

    let registry = config.device_registry()?;

    match cli.command {
        Commands::List {
            category,
            search,
            json,
        } => list_devices(&registry, category, search.as_deref(), json),
        Commands::Describe { id, json } => describe_device(&registry, id, json),
        Commands::Monitor { id, rate, seconds } => {
            let rate = rate.unwrap_or(config.monitoring.default_rate);
            monitor(registry, &config, id, rate, seconds).await
        }
    }
}

fn list_devices(
    registry: &DeviceRegistry,
    category: Option<SensorCategory>,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    let devices: Vec<DeviceDescriptor> = registry
        .search(search.unwrap_or_default())
        .into_iter()
        .filter(|d| category.map_or(true, |c| d.category == c))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    let mut current: Option<SensorCategory> = None;
    for device in &devices {
        if current != Some(device.category) {
            current = Some(device.category);
            println!("{}", labels::category_label(device.category));
        }
        println!(
            "  {:>3}  {:<32} {:<28} {} axis",
            device.type_id,
            device.name,
            device.type_label(),
            device.axis_count
        );
    }
    println!("{} device(s)", devices.len());
    Ok(())
}

fn describe_device(registry: &DeviceRegistry, id: DeviceId, json: bool) -> Result<()> {
    let device = registry.describe(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&device)?);
        return Ok(());
    }

    println!("{} ({})", device.name, device.type_label());
    println!("  Type id:      {}", device.type_id);
    println!("  Category:     {}", labels::category_label(device.category));
    println!("  Vendor:       {}", device.vendor);
    println!("  Version:      {}", device.version);
    println!("  Resolution:   {}", device.resolution);
    println!("  Max range:    {}", device.max_range);
    println!("  Power:        {} mA", device.power_ma);
    println!(
        "  Delay:        {} .. {} us",
        device.min_delay_us, device.max_delay_us
    );
    println!(
        "  FIFO:         {} reserved / {} max",
        device.fifo_reserved_event_count, device.fifo_max_event_count
    );
    println!("  Wake-up:      {}", device.wake_up);
    println!("  Dynamic:      {}", device.dynamic);
    println!("  Axes:         {}", device.axis_count);
    Ok(())
}

async fn monitor(
    registry: DeviceRegistry,
    config: &AppConfig,
    id: DeviceId,
    rate: SamplingRate,
    seconds: Option<u64>,
) -> Result<()> {
    let descriptor = registry.describe(id)?;
    let source = Arc::new(SimulatedSensorSource::new(Arc::new(registry)));
    let mut controller = StreamController::new(source, config.monitoring.history_capacity);

    controller.start(id, rate).await?;
    println!(
        "Monitoring {} at {} rate (Ctrl-C to stop)",
        descriptor.name,
        labels::rate_label(rate)
    );

    let axes = descriptor.axis_count.clamp(1, TRACKED_AXES);
    let deadline = seconds.map(|s| tokio::time::Instant::now() + Duration::from_secs(s));
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                print_statistics(&controller, axes);
                if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.stop().await;
    let counters = controller.counters().get();
    println!(
        "Stopped: {} received, {} applied, {} discarded",
        counters.received, counters.applied, counters.discarded
    );
    Ok(())
}

fn print_statistics(controller: &StreamController, axes: usize) {
    let stats = controller.statistics().get();
    let history = controller.history().get();
    let Some(reading) = controller.current().get() else {
        println!("waiting for data...");
        return;
    };
    let mut line = format!("t={:>14}ns", reading.timestamp_ns());
    for axis in 0..axes {
        let s = stats.axis(axis);
        let (Some(min), Some(max)) = (s.min(), s.max()) else {
            continue;
        };
        line.push_str(&format!(
            " | [{axis}] now {:>9.3} min {:>9.3} max {:>9.3} avg {:>9.3} ({} kept)",
            reading.value(axis).unwrap_or(f32::NAN),
            min,
            max,
            s.average(),
            history.axis(axis).len()
        ));
    }
    println!("{line}");
}
