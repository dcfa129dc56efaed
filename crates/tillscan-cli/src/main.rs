//! tillscan demo
//!
//! Drives the barcode input panel against a scripted mock camera from an
//! interactive prompt.
//!
//! Usage:
//!     tillscan --devices handset --config scanner.json
//!     RUST_LOG=tillscan_scanner=debug tillscan

mod command;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use command::{Command, HELP};
use tillscan_hardware::mock::MockCamera;
use tillscan_hardware::{AnyCameraPlatform, CaptureDevice, PlatformError};
use tillscan_scanner::{BarcodeInput, KeyEvent, ScannerConfig, ScannerEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tillscan", version, about = "Barcode input demo over a mock camera")]
struct Args {
    /// Scanner configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cameras the mock platform reports.
    #[arg(long, value_enum, default_value_t = DevicePreset::Handset)]
    devices: DevicePreset,

    /// Time the mock spends opening a camera.
    #[arg(long, default_value_t = 0)]
    acquire_delay_ms: u64,

    /// Panel title used on startup.
    #[arg(long, default_value = "Scan item")]
    title: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DevicePreset {
    /// Front and back camera.
    Handset,
    /// One USB webcam.
    Webcam,
    /// No cameras at all.
    None,
}

impl DevicePreset {
    fn devices(self) -> Vec<CaptureDevice> {
        match self {
            Self::Handset => vec![
                CaptureDevice::new("camera2 1", "Front Camera"),
                CaptureDevice::new("camera2 0", "Back Camera"),
            ],
            Self::Webcam => vec![CaptureDevice::new("usb-046d-0825", "HD Webcam C270")],
            Self::None => Vec::new(),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ScannerConfig> {
    let Some(path) = path else {
        return Ok(ScannerConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: ScannerConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

fn print_event(event: &ScannerEvent) {
    match event {
        ScannerEvent::Scan(scan) => println!("scan: {scan}"),
        ScannerEvent::Error(message) => println!("error: {message}"),
        ScannerEvent::Closed => println!("camera closed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let debounce = config.keystroke.debounce;

    let (camera, handle) = MockCamera::with_devices(args.devices.devices());
    handle.set_acquire_delay(Duration::from_millis(args.acquire_delay_ms));

    let (input, mut events) = BarcodeInput::new(AnyCameraPlatform::Mock(camera), config)
        .context("invalid scanner config")?;
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    tracing::info!(devices = ?args.devices, "starting tillscan demo");
    input.open(args.title.clone()).await;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            Command::Open(title) => {
                input
                    .open(title.unwrap_or_else(|| args.title.clone()))
                    .await;
            }
            Command::Close => input.close().await,
            Command::Stop => println!("{:?}", input.stop().await),
            Command::Facing(facing) => println!("{:?}", input.select_facing(facing).await),
            Command::Device(id) => println!("{:?}", input.select_device(id).await),
            Command::Retry => println!("{:?}", input.retry().await),
            Command::Decode(text) => {
                if handle.decode(text) == 0 {
                    println!("no camera running");
                }
            }
            Command::Miss => {
                handle.miss();
            }
            Command::Type(text) => {
                for c in text.chars() {
                    input.press_key(KeyEvent::char(c));
                }
                // let the debounce window close before the next prompt
                tokio::time::sleep(debounce + Duration::from_millis(50)).await;
            }
            Command::Scan(text) => {
                for c in text.chars() {
                    input.press_key(KeyEvent::char(c));
                }
                input.press_key(KeyEvent::enter());
                tokio::task::yield_now().await;
            }
            Command::Manual(text) => {
                input.submit_manual_text(&text);
            }
            Command::Deny => {
                handle.fail_next_acquire(PlatformError::permission_denied("denied from prompt"))
            }
            Command::Devices => {
                for device in input.devices() {
                    println!("  {device} facing={:?}", device.facing());
                }
            }
            Command::Status => {
                println!("open:      {}", input.is_open());
                println!("state:     {}", input.session_state());
                println!("for:       {:?}", input.time_in_state());
                println!("mode:      {:?}", input.selection_mode());
                println!("target:    {:?}", input.current_target());
                println!("remember:  {:?}", input.last_choice());
                println!("error:     {:?}", input.last_error());
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    input.close().await;
    printer.abort();
    Ok(())
}
