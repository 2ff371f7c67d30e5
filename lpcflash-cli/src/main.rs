//! lpcflash CLI - serial ISP programmer for NXP LPC microcontrollers.
//!
//! ## Features
//!
//! - Flash Intel HEX or raw binary images, or download them into RAM
//! - Detect the connected part without programming it
//! - Hardware reset into the bootloader via DTR/RTS wiring
//! - Interactive serial port selection
//! - Shell completion generation
//! - Environment variable support

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use console::style;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use lpcflash::{
    ControlLines, FlashOptions, Flasher, Image, NativePort, SerialConfig, available_ports,
};

mod serial;

use serial::{SerialOptions, select_serial_port};

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: AtomicBool = AtomicBool::new(true);

/// Set by the Ctrl-C handler, polled by the library between sync attempts.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Check if progress animations should be used (TTY and colors enabled).
fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(Ordering::Relaxed) && console::colors_enabled_stderr()
}

/// lpcflash - flash NXP LPC microcontrollers over the serial bootloader.
///
/// Environment variables:
///   LPCFLASH_PORT   - Default serial port
///   LPCFLASH_BAUD   - Default baud rate (default: 115200)
///   LPCFLASH_OSC    - Default crystal frequency in kHz (default: 10000)
#[derive(Parser)]
#[command(name = "lpcflash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Serial port to use (interactive selection if not specified).
    #[arg(short, long, global = true, env = "LPCFLASH_PORT")]
    port: Option<String>,

    /// Baud rate for the ISP session.
    #[arg(
        short,
        long,
        global = true,
        default_value = "115200",
        env = "LPCFLASH_BAUD"
    )]
    baud: u32,

    /// Crystal frequency in kHz, passed to the bootloader verbatim.
    #[arg(
        short,
        long,
        global = true,
        default_value = "10000",
        env = "LPCFLASH_OSC"
    )]
    osc: String,

    /// Reset the target into the bootloader through DTR/RTS.
    #[arg(long, global = true)]
    control: bool,

    /// DTR and RTS are crossed on the adapter.
    #[arg(long, global = true, requires = "control")]
    control_swap: bool,

    /// DTR and RTS pass through inverting drivers.
    #[arg(long, global = true, requires = "control")]
    control_invert: bool,

    /// Keep the ISP-enable line asserted after reset.
    #[arg(long, global = true, requires = "control")]
    boot_hold: bool,

    /// Verbose output level (-v, -vv, -vvv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Non-interactive mode (fail instead of prompting).
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Flash an image to the target (or download it into RAM).
    Flash {
        /// Intel HEX file, or a raw binary with --bin.
        file: PathBuf,

        /// Treat the file as a raw binary instead of Intel HEX.
        #[arg(long)]
        bin: bool,

        /// Load address for a raw binary (a RAM address downloads to RAM).
        #[arg(long, default_value = "0", value_parser = parse_hex_u32, requires = "bin")]
        offset: u32,

        /// Erase the whole device before programming.
        #[arg(long)]
        wipe: bool,

        /// Compare each chunk against flash after copying it.
        #[arg(long)]
        verify: bool,

        /// Leave the bootloader running instead of starting the program.
        #[arg(long)]
        no_start: bool,
    },

    /// Identify the connected part without programming it.
    Detect,

    /// List available serial ports.
    ListPorts,

    /// Generate shell completion scripts.
    Completions {
        /// Shell type for completions.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse an address (supports 0x prefix and underscores, decimal otherwise).
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let cleaned: String = s.chars().filter(|c| *c != '_').collect();
    let parsed = if let Some(hex) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)
    } else {
        cleaned.parse()
    };
    parsed.map_err(|e| format!("Invalid address '{s}': {e}"))
}

fn main() {
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, Ordering::Relaxed);
    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();

    debug!(
        "lpcflash v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    let _ = ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::Relaxed);
    });
    lpcflash::set_interrupt_checker(|| INTERRUPTED.load(Ordering::Relaxed));

    if let Err(err) = run(&cli) {
        eprintln!("{} {err:#}", style("Error:").red().bold());
        // Protocol failures carry a structured code so scripts can tell
        // apart which phase failed and what the bootloader reported.
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<lpcflash::Error>())
            .map_or(1, lpcflash::Error::exit_code);
        std::process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Flash {
            file,
            bin,
            offset,
            wipe,
            verify,
            no_start,
        } => cmd_flash(cli, file, *bin, *offset, *wipe, *verify, *no_start),
        Commands::Detect => cmd_detect(cli),
        Commands::ListPorts => {
            cmd_list_ports()?;
            Ok(())
        },
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            Ok(())
        },
    }
}

fn control_lines(cli: &Cli) -> ControlLines {
    ControlLines {
        enabled: cli.control,
        swapped: cli.control_swap,
        inverted: cli.control_invert,
        boot_hold: cli.boot_hold,
    }
}

/// Open the selected (or interactively chosen) serial port.
fn open_port(cli: &Cli) -> Result<NativePort> {
    let options = SerialOptions {
        port: cli.port.clone(),
        non_interactive: cli.non_interactive,
    };
    let name = select_serial_port(&options)?;
    if !cli.quiet {
        eprintln!(
            "{} Using port {} at {} baud",
            style("🔌").cyan(),
            style(&name).cyan(),
            cli.baud
        );
    }
    let config = SerialConfig::new(&name, cli.baud).with_timeout(Duration::from_millis(100));
    NativePort::open(&config)
        .with_context(|| format!("failed to open serial port {name}"))
}

/// Connect and print what was found.
fn connect(cli: &Cli, flasher: &mut Flasher<NativePort>) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "{} Synchronizing (reset the target into ISP mode now)...",
            style("⏳").yellow()
        );
    }
    let detected = flasher.connect()?;
    if !cli.quiet {
        let device = detected.device;
        eprintln!(
            "{} Found LPC{}: {} KiB flash, {} KiB RAM, {} sectors, boot code {}",
            style("✓").green(),
            style(device.name).bold(),
            device.flash_kib,
            device.ram_kib,
            device.sector_count,
            detected.boot_version
        );
    }
    Ok(())
}

/// Flash command implementation.
fn cmd_flash(
    cli: &Cli,
    file: &PathBuf,
    bin: bool,
    offset: u32,
    wipe: bool,
    verify: bool,
    no_start: bool,
) -> Result<()> {
    let raw = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut image = if bin {
        Image::from_binary(raw, offset)
    } else {
        Image::from_hex(&raw).with_context(|| format!("failed to parse {}", file.display()))?
    };
    if image.is_empty() {
        bail!("{} contains no data", file.display());
    }
    if !cli.quiet {
        eprintln!(
            "{} Loaded {} ({} bytes at 0x{:08X})",
            style("📦").cyan(),
            file.display(),
            image.len(),
            image.offset
        );
    }

    let port = open_port(cli)?;
    let mut flasher = Flasher::new(
        port,
        FlashOptions {
            osc_khz: cli.osc.clone(),
            wipe,
            verify,
            no_start,
            control: control_lines(cli),
            ..FlashOptions::default()
        },
    );
    connect(cli, &mut flasher)?;

    let pb = if cli.quiet || !use_fancy_output() {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(image.len() as u64);
        #[allow(clippy::unwrap_used)] // Static template string
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb
    };

    flasher.program(&mut image, &mut |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();

    // When the bootloader is left running on request but the reset lines
    // are wired, put the target back into the application anyway.
    if no_start && cli.control {
        flasher.reset_to_run()?;
    }

    if !cli.quiet {
        eprintln!("\n{} Download finished", style("🎉").green().bold());
    }
    Ok(())
}

/// Detect command implementation.
fn cmd_detect(cli: &Cli) -> Result<()> {
    let port = open_port(cli)?;
    let mut flasher = Flasher::new(
        port,
        FlashOptions {
            osc_khz: cli.osc.clone(),
            control: control_lines(cli),
            ..FlashOptions::default()
        },
    );
    connect(cli, &mut flasher)?;

    // The summary already went to stderr; emit the identity words on
    // stdout so scripts can capture them.
    if let Some(detected) = flasher.detected() {
        println!("id: 0x{:08X}", detected.id);
        if let Some(id2) = detected.id2 {
            println!("id2: 0x{id2:08X}");
        }
        println!("device: LPC{}", detected.device.name);
        println!("boot code: {}", detected.boot_version);
    }
    Ok(())
}

/// List-ports command implementation.
fn cmd_list_ports() -> Result<()> {
    let ports = available_ports()?;

    eprintln!("{}", style("Available serial ports:").bold().underlined());
    if ports.is_empty() {
        eprintln!("  {}", style("no serial ports found").dim());
        return Ok(());
    }
    for port in &ports {
        let vid_pid = if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            format!(" ({vid:04X}:{pid:04X})")
        } else {
            String::new()
        };
        let product = port
            .product
            .as_deref()
            .map(|p| format!(" - {}", style(p).dim()))
            .unwrap_or_default();
        eprintln!(
            "  {} {}{}{}",
            style("•").green(),
            style(&port.name).cyan(),
            vid_pid,
            product
        );
        // Machine-readable copy on stdout.
        println!("{}", port.name);
    }
    Ok(())
}

/// Completions command implementation.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
