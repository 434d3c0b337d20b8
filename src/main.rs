use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use lora_modbus_rs::util::hex::{decode_hex, encode_hex_upper, format_hex_spaced, pretty_hex};
use lora_modbus_rs::logging::{init_logger_with_level, log_block, log_debug, log_error, log_warn};
use lora_modbus_rs::{
    decode, init_logger, log_info, DataType, FileFlash, Gateway, GatewayConfig, SerialTransport,
    SlotOutcome,
};
use log::{Level, LevelFilter};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "lora-modbus-cli")]
#[command(about = "Modbus RTU gateway core for LoRaWAN sensor nodes")]
struct Cli {
    /// Gateway configuration file (JSON); defaults apply when it does not exist
    #[arg(short, long, default_value = "gateway.json")]
    config: PathBuf,

    /// Serial port, overriding the configuration file
    #[arg(short, long)]
    port: Option<String>,

    /// Flash image, overriding the configuration file
    #[arg(short, long)]
    flash: Option<PathBuf>,

    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one segment of one device
    Scan {
        #[arg(short, long)]
        device: u8,
        #[arg(short, long)]
        segment: u8,
    },
    /// Run one monitoring check of a slot
    Check {
        #[arg(short, long)]
        slot: u8,
    },
    /// Scan every enabled segment of every active device once
    Cycle,
    /// Execute one provisioning command line
    Exec { line: String },
    /// Read provisioning command lines from stdin
    Shell,
    /// Alternate scan cycles and monitoring passes until Ctrl-C
    Run,
    /// Decode hex bytes with a data type (tag number or name)
    Decode {
        #[arg(short = 't', long)]
        data_type: String,
        hex: String,
    },
}

type SerialGateway = Gateway<SerialTransport, FileFlash>;

fn open_gateway(cli: &Cli) -> anyhow::Result<SerialGateway> {
    let mut config = GatewayConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(port) = &cli.port {
        config.serial_port = port.clone();
    }
    if let Some(flash) = &cli.flash {
        config.flash_image = flash.clone();
    }

    let flash = FileFlash::open(&config.flash_image)
        .with_context(|| format!("opening flash image {}", config.flash_image.display()))?;
    let transport = SerialTransport::new(&config.serial_port);
    let mut gateway = Gateway::new(transport, flash, config);
    gateway.boot()?;
    Ok(gateway)
}

fn report_outcome(slot: u8, outcome: &SlotOutcome) {
    match outcome {
        SlotOutcome::Skipped { device_active, slot_active } => log_info(&format!(
            "Slot {slot}: skipped (device active: {device_active}, slot active: {slot_active})"
        )),
        SlotOutcome::NoResponse { received } => {
            log_warn(&format!("Slot {slot}: no response ({received} bytes)"))
        }
        SlotOutcome::Undecodable(e) => log_warn(&format!("Slot {slot}: undecodable: {e}")),
        SlotOutcome::Evaluated(report) => {
            log_info(&format!(
                "Slot {slot}: value {} (previous {})",
                report.value,
                report
                    .prev_value
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "none".to_string())
            ));
            for event in &report.alarms {
                log_info(&format!("Slot {slot}: {} at {}", event.alarm, event.at));
                if let Ok(json) = serde_json::to_string(event) {
                    println!("{json}");
                }
            }
        }
    }
}

async fn run_scheduler(gateway: &mut SerialGateway) -> anyhow::Result<()> {
    let schedule = gateway.config().schedule;
    let mut scan = tokio::time::interval(Duration::from_secs(schedule.scan_interval_secs.max(1)));
    let monitor_every = gateway
        .engine()
        .monitor_interval()
        .max(Duration::from_secs(1));
    let mut monitor = tokio::time::interval(monitor_every);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = scan.tick() => {
                let mut readings = gateway.flush_send_now().await;
                readings.extend(gateway.scan_cycle().await);
                let payload = gateway.build_uplink(&readings);
                if !payload.is_empty() {
                    log_info(&format!("Uplink ({} bytes): {}", payload.len(), encode_hex_upper(&payload)));
                    log_block(Level::Debug, &pretty_hex(&payload, 16));
                }
            }
            _ = monitor.tick() => {
                for (slot, outcome) in gateway.monitor_pass().await {
                    report_outcome(slot, &outcome);
                }
            }
            _ = &mut ctrl_c => {
                log_info("Shutting down");
                return Ok(());
            }
        }
    }
}

async fn run_shell(gateway: &mut SerialGateway) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }
        log_debug(&format!("Command: {line}"));
        match gateway.execute(line) {
            Ok(output) => println!("{output}"),
            Err(e) => log_error(&format!("{e}")),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        init_logger_with_level(LevelFilter::Debug);
    } else {
        init_logger();
    }

    match &cli.command {
        Commands::Decode { data_type, hex } => {
            let data_type: DataType = data_type.parse()?;
            let bytes = decode_hex(hex).map_err(|e| anyhow!("invalid hex input: {e}"))?;
            let value = decode(&bytes, data_type)?;
            println!("{}: {value}", data_type.name());
        }
        Commands::Scan { device, segment } => {
            let mut gateway = open_gateway(&cli)?;
            let data = gateway.scan_device(*device, *segment).await?;
            println!("{} bytes ({:?})", data.count(), data.kind);
            println!("{}", pretty_hex(&data.bytes, 16));
        }
        Commands::Check { slot } => {
            let mut gateway = open_gateway(&cli)?;
            let outcome = gateway.check_slot(*slot).await?;
            report_outcome(*slot, &outcome);
        }
        Commands::Cycle => {
            let mut gateway = open_gateway(&cli)?;
            let readings = gateway.scan_cycle().await;
            for reading in &readings {
                println!(
                    "Device {} segment {}: {}",
                    reading.device,
                    reading.segment,
                    format_hex_spaced(&reading.data.bytes)
                );
            }
        }
        Commands::Exec { line } => {
            let mut gateway = open_gateway(&cli)?;
            println!("{}", gateway.execute(line)?);
        }
        Commands::Shell => {
            let mut gateway = open_gateway(&cli)?;
            run_shell(&mut gateway).await?;
        }
        Commands::Run => {
            let mut gateway = open_gateway(&cli)?;
            run_scheduler(&mut gateway).await?;
        }
    }

    Ok(())
}
