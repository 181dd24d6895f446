//! Access point discovery through `iw dev <iface> scan`.
//!
//! Only WPS-enabled networks are kept; they come back strongest first.

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use macaddr::MacAddr6;
use regex::Regex;
use tracing::{debug, warn};

use crate::domain::MacAddress;
use crate::error::ScanError;
use crate::parser::unescape_ssid;

/// One scanned access point that advertises WPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    pub bssid: MacAddress,
    pub essid: String,
    /// `Open`, `WEP`, `WPA`, `WPA2`, `WPA/WPA2` or `Unknown`.
    pub security: String,
    /// dBm.
    pub signal: i32,
    pub wps: bool,
    pub wps_locked: bool,
    pub model: String,
    pub model_number: String,
    pub device_name: String,
}

impl AccessPoint {
    fn new(bssid: MacAddress) -> Self {
        Self {
            bssid,
            essid: String::new(),
            security: "Unknown".to_string(),
            signal: 0,
            wps: false,
            wps_locked: false,
            model: String::new(),
            model_number: String::new(),
            device_name: String::new(),
        }
    }

    /// Model and model number as listed in the vulnerable-device list.
    pub fn full_model(&self) -> String {
        format!("{} {}", self.model, self.model_number)
    }
}

/// How the target list highlights an access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMark {
    None,
    /// Credentials for this BSSID and ESSID are already in the report.
    Stored,
    Locked,
    /// The model appears in the vulnerable-device list.
    Vulnerable,
}

/// Mark for `ap`, with stored taking precedence over locked and locked
/// over vulnerable.
pub fn mark(ap: &AccessPoint, stored: &[(String, String)], vuln_list: &[String]) -> ScanMark {
    let bssid = ap.bssid.to_string();
    if stored.iter().any(|(b, e)| *b == bssid && *e == ap.essid) {
        ScanMark::Stored
    } else if ap.wps_locked {
        ScanMark::Locked
    } else if vuln_list.iter().any(|m| *m == ap.full_model()) {
        ScanMark::Vulnerable
    } else {
        ScanMark::None
    }
}

/// Scan on `interface` and return WPS networks, strongest first.
pub fn scan(interface: &str) -> Result<Vec<AccessPoint>, ScanError> {
    debug!("Scanning on {}", interface);
    let output = Command::new("iw")
        .args(["dev", interface, "scan"])
        .output()?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    if !output.status.success() {
        return Err(ScanError::CommandFailed(text.trim().to_string()));
    }
    parse_iw_scan(&text)
}

/// Load the vulnerable-model list; a missing file is an empty list.
pub fn load_vuln_list(path: &Path) -> Result<Vec<String>, ScanError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No vulnerable device list at {}", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

struct Matchers {
    bss: Regex,
    ssid: Regex,
    signal: Regex,
    capability: Regex,
    rsn: Regex,
    wpa: Regex,
    wps: Regex,
    locked: Regex,
    model: Regex,
    model_number: Regex,
    device_name: Regex,
}

fn matchers() -> &'static Matchers {
    static RE: OnceLock<Matchers> = OnceLock::new();
    RE.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("valid scan regex");
        Matchers {
            bss: re(r"^BSS (\S+?)\s?\(on \w+\)"),
            ssid: re(r"^SSID: (.*)$"),
            signal: re(r"^signal: ([+-]?\d*\.?\d+) dBm"),
            capability: re(r"^capability: (.+)$"),
            rsn: re(r"^RSN:\t \* Version: \d+"),
            wpa: re(r"^WPA:\t \* Version: \d+"),
            wps: re(r"^WPS:\t \* Version: \d*\.?\d+"),
            locked: re(r"^ \* AP setup locked: 0x([0-9]+)"),
            model: re(r"^ \* Model: (.*)$"),
            model_number: re(r"^ \* Model Number: (.*)$"),
            device_name: re(r"^ \* Device name: (.*)$"),
        }
    })
}

/// Parse `iw` scan output.
pub fn parse_iw_scan(text: &str) -> Result<Vec<AccessPoint>, ScanError> {
    let m = matchers();
    let mut networks: Vec<AccessPoint> = Vec::new();

    for raw in text.lines() {
        if raw.starts_with("command failed:") {
            return Err(ScanError::CommandFailed(raw.to_string()));
        }
        let line = raw.trim_start_matches('\t');

        if let Some(caps) = m.bss.captures(line) {
            match caps[1].parse::<MacAddr6>() {
                Ok(bssid) => networks.push(AccessPoint::new(MacAddress::from(bssid))),
                Err(e) => warn!("Skipping scan entry {}: {}", &caps[1], e),
            }
            continue;
        }
        let Some(ap) = networks.last_mut() else {
            continue;
        };

        if let Some(caps) = m.ssid.captures(line) {
            ap.essid = unescape_ssid(&caps[1]);
        } else if let Some(caps) = m.signal.captures(line) {
            ap.signal = caps[1].parse::<f64>().map(|v| v as i32).unwrap_or(0);
        } else if let Some(caps) = m.capability.captures(line) {
            ap.security = if caps[1].contains("Privacy") { "WEP" } else { "Open" }.to_string();
        } else if m.rsn.is_match(line) {
            ap.security = upgrade_security(&ap.security, "RSN").to_string();
        } else if m.wpa.is_match(line) {
            ap.security = upgrade_security(&ap.security, "WPA").to_string();
        } else if m.wps.is_match(line) {
            ap.wps = true;
        } else if let Some(caps) = m.locked.captures(line) {
            ap.wps_locked = u32::from_str_radix(&caps[1], 16).map_or(false, |v| v != 0);
        } else if let Some(caps) = m.model_number.captures(line) {
            ap.model_number = unescape_ssid(&caps[1]);
        } else if let Some(caps) = m.model.captures(line) {
            ap.model = unescape_ssid(&caps[1]);
        } else if let Some(caps) = m.device_name.captures(line) {
            ap.device_name = unescape_ssid(&caps[1]);
        }
    }

    networks.retain(|ap| ap.wps);
    networks.sort_by(|a, b| b.signal.cmp(&a.signal));
    Ok(networks)
}

/// Security after seeing an `RSN` or `WPA` element.
fn upgrade_security<'a>(current: &'a str, element: &str) -> &'a str {
    match (current, element) {
        ("WEP", "RSN") => "WPA2",
        ("WEP", "WPA") => "WPA",
        ("WPA", "RSN") | ("WPA2", "WPA") => "WPA/WPA2",
        _ => current,
    }
}
