// Altrs Headless Runner
// Loads a profile and runs the polling engine until interrupted

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use altrs_core::config::{keys, AppConfig};
use altrs_core::engine::{StateManager, ThreadManager};
use altrs_core::event::{EventReport, ReportPayload};
use altrs_core::item::Named;
use altrs_core::output::{InputSimulator, LogSimulator};
use altrs_core::profile::Profile;
use altrs_core::source::InputBackend;
use altrs_core::window::Rect;

/// Input remapping engine driven by situation-aware profiles
#[derive(Parser, Debug)]
#[command(name = "altrs")]
#[command(version)]
#[command(about = "Input remapping engine driven by situation-aware profiles", long_about = None)]
struct Args {
    /// Profile file (XML); defaults to the ProfileFile config setting
    #[arg(short, long, value_name = "PROFILE")]
    profile: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Input devices to read (can be used multiple times)
    #[arg(short, long, value_name = "DEVICE")]
    devices: Vec<String>,

    /// Screen size used to normalise pointer positions
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value = "1920x1080", value_parser = parse_screen)]
    screen: Rect,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate the profile and exit
    #[arg(long)]
    check_profile: bool,

    /// List available input devices
    #[arg(long)]
    list_devices: bool,
}

fn parse_screen(value: &str) -> Result<Rect, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| format!("invalid screen dimension '{}'", s))
    };
    Ok(Rect::new(
        0.0,
        0.0,
        f64::from(parse(width)?),
        f64::from(parse(height)?),
    ))
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load_default().context("loading default config")?,
    };
    config.validate().context("validating config")?;
    Ok(config)
}

fn load_profile(args: &Args, config: &AppConfig) -> Result<Profile> {
    let path = match &args.profile {
        Some(path) => path.clone(),
        None => {
            let stored = config.get_string(keys::PROFILE_FILE);
            if stored.is_empty() {
                bail!("no profile given: pass --profile or set {}", keys::PROFILE_FILE);
            }
            PathBuf::from(stored)
        }
    };
    Profile::from_file(&path).with_context(|| format!("loading profile {}", path.display()))
}

fn describe(profile: &Profile) {
    println!("Profile '{}' is valid", profile.name());
    println!("  sources: {}", profile.sources().len());
    println!(
        "  modes: {}",
        profile.modes().iter().map(Named::name).collect::<Vec<_>>().join(", ")
    );
    println!(
        "  apps: {}",
        profile.apps().iter().map(Named::name).collect::<Vec<_>>().join(", ")
    );
    println!(
        "  pages: {}",
        profile.pages().iter().map(Named::name).collect::<Vec<_>>().join(", ")
    );
    println!("  regions: {}", profile.regions().len());
    let lists: usize = profile.mappings().values().map(|t| t.len()).sum();
    println!("  action lists: {}", lists);
}

#[cfg(feature = "evdev")]
fn list_devices() -> Result<()> {
    let devices = altrs_core::source::EvdevBackend::list_devices();
    println!("Found {} input device(s):", devices.len());
    for device in &devices {
        let mut kinds = Vec::new();
        if device.keyboard {
            kinds.push("keyboard");
        }
        if device.pointer {
            kinds.push("pointer");
        }
        println!("  {} ({}) {}", device.name, device.path, kinds.join(", "));
    }
    Ok(())
}

#[cfg(not(feature = "evdev"))]
fn list_devices() -> Result<()> {
    bail!("device listing requires the 'evdev' feature")
}

#[cfg(feature = "evdev")]
fn open_backend(args: &Args) -> Result<Box<dyn InputBackend>> {
    let backend = altrs_core::source::EvdevBackend::open(&args.devices, args.screen)
        .context("opening input devices")?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "evdev"))]
fn open_backend(args: &Args) -> Result<Box<dyn InputBackend>> {
    log::warn!("Built without the 'evdev' feature: no input will be read");
    let backend = altrs_core::source::ManualBackend::new();
    backend.set_screen(args.screen);
    Ok(Box::new(backend))
}

#[cfg(feature = "evdev")]
fn open_simulator() -> Box<dyn InputSimulator> {
    match altrs_core::output::UinputSimulator::new() {
        Ok(simulator) => Box::new(simulator),
        Err(e) => {
            log::warn!("Could not create uinput device ({}), only logging output", e);
            Box::new(LogSimulator)
        }
    }
}

#[cfg(not(feature = "evdev"))]
fn open_simulator() -> Box<dyn InputSimulator> {
    Box::new(LogSimulator)
}

fn log_report(report: &EventReport) {
    match &report.payload {
        ReportPayload::StateChange {
            mode_name,
            app_name,
            page_name,
            ..
        } => log::info!("State: {} / {} / {}", mode_name, app_name, page_name),
        ReportPayload::ProfileChange { name } => log::info!("Profile: {}", name),
        other => log::debug!("{}: {:?}", report.event_type(), other),
    }
}

fn install_signal_handler(threads: Arc<ThreadManager>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("installing signal handler")?;
    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            log::info!("Received signal {}, shutting down", signal);
            threads.stop_polling();
        }
    });
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let profile = load_profile(&args, &config)?;

    if args.check_profile {
        describe(&profile);
        return Ok(());
    }

    let backend = open_backend(&args)?;
    let threads = Arc::new(ThreadManager::new());
    install_signal_handler(Arc::clone(&threads))?;

    let mut manager = StateManager::new(profile, config, backend, open_simulator())
        .with_thread_manager(Arc::clone(&threads));
    let poller = thread::Builder::new()
        .name("altrs-poll".into())
        .spawn(move || manager.run())
        .context("starting polling thread")?;

    while !poller.is_finished() {
        for report in threads.get_new_event_reports() {
            log_report(&report);
        }
        thread::sleep(Duration::from_millis(50));
    }
    poller
        .join()
        .map_err(|_| anyhow!("polling thread panicked"))?;
    for report in threads.get_new_event_reports() {
        log_report(&report);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.list_devices {
        return list_devices();
    }
    run(args)
}
