//! Append-only credential reports (`stored.txt` and `stored.csv`).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use super::{read_optional, write_locked};
use crate::domain::{AttackOutcome, MacAddress};
use crate::error::StoreError;

const REPORT_STEM: &str = "stored";
const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";
const CSV_HEADER: [&str; 5] = ["Date", "BSSID", "ESSID", "WPS PIN", "WPA PSK"];

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub date: String,
    pub bssid: String,
    pub essid: String,
    pub pin: String,
    pub psk: String,
}

impl CredentialRecord {
    pub fn new(bssid: MacAddress, essid: &str, pin: &str, psk: &str, at: DateTime<Local>) -> Self {
        Self {
            date: at.format(DATE_FORMAT).to_string(),
            bssid: bssid.to_string(),
            essid: essid.to_string(),
            pin: pin.to_string(),
            psk: psk.to_string(),
        }
    }

    /// Record for a successful outcome, stamped now.
    pub fn from_outcome(outcome: &AttackOutcome) -> Self {
        Self::new(
            outcome.bssid,
            outcome.essid.as_deref().unwrap_or(""),
            &outcome.pin,
            outcome.passphrase.as_deref().unwrap_or(""),
            Local::now(),
        )
    }

    pub fn to_text_block(&self) -> String {
        format!(
            "{}\nBSSID: {}\nESSID: {}\nWPS PIN: {}\nWPA PSK: {}\n\n",
            self.date, self.bssid, self.essid, self.pin, self.psk
        )
    }

    pub fn to_csv_line(&self) -> String {
        csv_line(&[&self.date, &self.bssid, &self.essid, &self.pin, &self.psk])
    }
}

/// Report files in one directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    reports_dir: PathBuf,
}

impl ResultStore {
    pub fn new(reports_dir: &Path) -> Self {
        Self {
            reports_dir: reports_dir.to_path_buf(),
        }
    }

    pub fn text_path(&self) -> PathBuf {
        self.reports_dir.join(format!("{}.txt", REPORT_STEM))
    }

    pub fn csv_path(&self) -> PathBuf {
        self.reports_dir.join(format!("{}.csv", REPORT_STEM))
    }

    /// Append a record to both reports; the CSV gets a header when new.
    pub fn append(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        write_locked(&self.text_path(), &record.to_text_block(), true)?;

        let csv_path = self.csv_path();
        let mut rows = String::new();
        if !csv_path.exists() {
            rows.push_str(&csv_line(&CSV_HEADER));
            rows.push('\n');
        }
        rows.push_str(&record.to_csv_line());
        rows.push('\n');
        write_locked(&csv_path, &rows, true)?;

        info!(
            "Credentials saved to {}, {}",
            self.text_path().display(),
            csv_path.display()
        );
        Ok(())
    }

    /// `(BSSID, ESSID)` pairs already in the CSV report.
    pub fn stored_targets(&self) -> Result<Vec<(String, String)>, StoreError> {
        let Some(content) = read_optional(&self.csv_path())? else {
            return Ok(Vec::new());
        };
        Ok(content
            .lines()
            .skip(1)
            .map(parse_csv_line)
            .filter(|fields| fields.len() >= 3)
            .map(|fields| (fields[1].clone(), fields[2].clone()))
            .collect())
    }
}

/// `;`-delimited line with every field quoted.
fn csv_line(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ';' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
