use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::sync::Arc;
use tracing::info;

use ble_debugger::{load_config_file, Debugger, DebuggerConfig};
use event_sink::LogEvent;
use frame_decoder::FrameDecoder;
use host_api::{
    BluetoothDevice, DeviceFilter, DeviceRequestSlot, MockBluetooth, RequestDeviceOptions,
    RequestError,
};

#[derive(Parser, Debug)]
#[command(
    name = "btdbg",
    version,
    about = "Bluetooth request and frame debugger",
    disable_help_subcommand = true
)]
struct Cli {
    /// Debugger config file (YAML)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Disable event emission (decoding and requests still run)
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    disabled: bool,

    /// Print Prometheus counters when done
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a single frame
    Decode {
        /// Device kind the frame came from
        #[arg(long, default_value = frame_decoder::GAN_CUBE_KIND)]
        kind: String,
        /// Frame bytes as hex (e.g., 00 00 00 ED)
        #[arg(required = true, num_args = 1..)]
        data: Vec<String>,
    },
    /// Decode every frame in a file (one frame of hex bytes per line)
    Replay {
        /// Input file; blank lines and lines starting with '#' are skipped
        #[arg(long)]
        file: String,
        /// Device kind the frames came from
        #[arg(long, default_value = frame_decoder::GAN_CUBE_KIND)]
        kind: String,
        /// Write the event log to a JSONL file
        #[arg(long)]
        to: Option<String>,
    },
    /// Run a device request against the mock host through the interceptor
    Request {
        /// Name the mock peripheral advertises
        #[arg(long, default_value = "GAN356 i3")]
        device_name: String,
        /// Only accept devices whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Make the host fail the request
        #[arg(long, value_enum)]
        fail: Option<Failure>,
    },
    /// List registered decode rules
    Tables,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Failure {
    NotFound,
    Security,
    Aborted,
    Network,
}

impl Failure {
    fn into_error(self) -> RequestError {
        match self {
            Failure::NotFound => {
                RequestError::NotFound("User cancelled the requestDevice() chooser.".into())
            }
            Failure::Security => {
                RequestError::Security("Origin is not allowed to use Bluetooth".into())
            }
            Failure::Aborted => RequestError::Aborted("Request was aborted".into()),
            Failure::Network => RequestError::Network("GATT server is disconnected".into()),
        }
    }
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => load_config_file(path)?,
        None => DebuggerConfig {
            console: false,
            ..Default::default()
        },
    };
    if cli.disabled {
        config.enabled = false;
    }

    match cli.command {
        Commands::Decode { kind, data } => decode_one(&config, &kind, &data, cli.metrics),
        Commands::Replay { file, kind, to } => {
            replay(&config, &file, &kind, to.as_deref(), cli.metrics)
        }
        Commands::Request {
            device_name,
            prefix,
            fail,
        } => request(&config, &device_name, prefix.as_deref(), fail, cli.metrics),
        Commands::Tables => list_tables(&config),
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A debugger whose events are echoed to stdout as they happen.
fn debugger_with_echo(config: &DebuggerConfig) -> Result<Debugger> {
    let dbg = Debugger::new(config)?;
    dbg.sink().subscribe(|ev: &LogEvent| {
        println!("{:<7} {}", ev.severity(), ev.display_line());
    });
    Ok(dbg)
}

fn print_metrics(dbg: &Debugger, on: bool) {
    if on {
        print!("{}", dbg.metrics().encode_text());
    }
}

fn decode_one(config: &DebuggerConfig, kind: &str, data: &[String], metrics: bool) -> Result<()> {
    let dbg = debugger_with_echo(config)?;
    let bytes = parse_hex_bytes(data)?;
    let cmd = dbg.observe_frame(kind, &bytes);
    println!("{}", serde_json::to_string_pretty(&cmd)?);
    print_metrics(&dbg, metrics);
    Ok(())
}

fn replay(
    config: &DebuggerConfig,
    file: &str,
    kind: &str,
    to: Option<&str>,
    metrics: bool,
) -> Result<()> {
    let dbg = debugger_with_echo(config)?;
    let raw = fs::read_to_string(file).with_context(|| format!("reading frames: {file}"))?;

    let mut frames = 0usize;
    for (lineno, line) in raw.lines().enumerate() {
        let t = line.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        let items: Vec<String> = t
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let bytes = parse_hex_bytes(&items).with_context(|| format!("{file}:{}", lineno + 1))?;
        dbg.observe_frame(kind, &bytes);
        frames += 1;
    }
    info!(frames, file, "replay finished");

    if let Some(path) = to {
        let mut w = BufWriter::new(File::create(path)?);
        for ev in dbg.history().snapshot() {
            let json = serde_json::to_string(&ev.to_record())?;
            w.write_all(json.as_bytes())?;
            w.write_all(b"\n")?;
        }
        w.flush()?;
    }
    print_metrics(&dbg, metrics);
    Ok(())
}

fn request(
    config: &DebuggerConfig,
    device_name: &str,
    prefix: Option<&str>,
    fail: Option<Failure>,
    metrics: bool,
) -> Result<()> {
    let mock = Arc::new(MockBluetooth::with_devices(vec![BluetoothDevice::new(
        "mock-0001",
        Some(device_name),
    )]));
    if let Some(f) = fail {
        mock.fail_next(f.into_error());
    }
    let slot = DeviceRequestSlot::new(mock);
    let dbg = debugger_with_echo(config)?;
    dbg.install(&slot);

    let options = match prefix {
        Some(p) => RequestDeviceOptions::default().with_filter(DeviceFilter::name_prefix(p)),
        None => RequestDeviceOptions::accept_all(),
    };

    // One execution context, as in a page.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = rt.block_on(slot.request_device(&options));
    print_metrics(&dbg, metrics);
    match outcome {
        Ok(dev) => {
            println!("selected: {dev}");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("{}: {}", e.kind(), e.message())),
    }
}

fn list_tables(config: &DebuggerConfig) -> Result<()> {
    let dbg = Debugger::new(config)?;
    let registry = dbg.registry();
    for (i, rule) in registry.rules().iter().enumerate() {
        println!(
            "{i}\t{:?}\t{}\tmin_len={}",
            rule.matcher,
            rule.decoder.label(),
            rule.decoder.min_len()
        );
    }
    Ok(())
}

fn parse_hex_bytes(items: &[String]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(items.len());
    for s in items {
        let t = s.trim();
        let no_prefix = t
            .strip_prefix("0x")
            .or_else(|| t.strip_prefix("0X"))
            .unwrap_or(t);
        let b = u8::from_str_radix(no_prefix, 16)
            .map_err(|e| anyhow::anyhow!("invalid hex byte '{t}': {e}"))?;
        out.push(b);
    }
    Ok(out)
}
