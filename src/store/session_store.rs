//! Per-target session files.
//!
//! `<sessions>/<BSSID>.run` holds the bruteforce mask; `<pixiewps>/<BSSID>.run`
//! holds a PIN recovered offline but not yet confirmed.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{read_optional, remove_optional, write_locked};
use crate::domain::MacAddress;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions_dir: PathBuf,
    pixiewps_dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            sessions_dir: data_dir.join("sessions"),
            pixiewps_dir: data_dir.join("pixiewps"),
        }
    }

    pub fn mask_path(&self, bssid: MacAddress) -> PathBuf {
        self.sessions_dir.join(file_name(bssid))
    }

    pub fn pin_path(&self, bssid: MacAddress) -> PathBuf {
        self.pixiewps_dir.join(file_name(bssid))
    }

    /// Persist the next untried bruteforce mask.
    pub fn save_mask(&self, bssid: MacAddress, mask: &str) -> Result<(), StoreError> {
        let path = self.mask_path(bssid);
        write_locked(&path, mask, false)?;
        debug!("Session saved in {}", path.display());
        Ok(())
    }

    pub fn load_mask(&self, bssid: MacAddress) -> Result<Option<String>, StoreError> {
        read_first_line(&self.mask_path(bssid))
    }

    pub fn clear_mask(&self, bssid: MacAddress) -> Result<(), StoreError> {
        remove_optional(&self.mask_path(bssid))
    }

    /// Remember a recovered PIN for the next run against `bssid`.
    pub fn save_pin(&self, bssid: MacAddress, pin: &str) -> Result<(), StoreError> {
        let path = self.pin_path(bssid);
        write_locked(&path, pin, false)?;
        debug!("PIN saved in {}", path.display());
        Ok(())
    }

    /// The stored PIN; `Some("")` is the stored empty PIN.
    pub fn load_pin(&self, bssid: MacAddress) -> Result<Option<String>, StoreError> {
        read_first_line(&self.pin_path(bssid))
    }

    pub fn clear_pin(&self, bssid: MacAddress) -> Result<(), StoreError> {
        remove_optional(&self.pin_path(bssid))
    }
}

fn file_name(bssid: MacAddress) -> String {
    format!("{}.run", bssid.hex_digits())
}

fn read_first_line(path: &Path) -> Result<Option<String>, StoreError> {
    Ok(read_optional(path)?.map(|content| content.lines().next().unwrap_or("").trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bssid() -> MacAddress {
        MacAddress::parse("00:90:4c:c1:ac:21").unwrap()
    }

    #[test]
    fn test_mask_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        assert_eq!(store.load_mask(bssid()).unwrap(), None);

        store.save_mask(bssid(), "1234").unwrap();
        assert_eq!(store.load_mask(bssid()).unwrap().as_deref(), Some("1234"));
        assert!(dir.path().join("sessions/00904CC1AC21.run").exists());

        store.save_mask(bssid(), "1234005").unwrap();
        assert_eq!(
            store.load_mask(bssid()).unwrap().as_deref(),
            Some("1234005")
        );

        store.clear_mask(bssid()).unwrap();
        assert_eq!(store.load_mask(bssid()).unwrap(), None);
        store.clear_mask(bssid()).unwrap();
    }

    #[test]
    fn test_pin_hint() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.save_pin(bssid(), "12345670").unwrap();
        assert!(dir.path().join("pixiewps/00904CC1AC21.run").exists());
        assert_eq!(
            store.load_pin(bssid()).unwrap().as_deref(),
            Some("12345670")
        );
        store.clear_pin(bssid()).unwrap();
        assert_eq!(store.load_pin(bssid()).unwrap(), None);
    }

    #[test]
    fn test_empty_pin_hint() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.save_pin(bssid(), "").unwrap();
        assert_eq!(store.load_pin(bssid()).unwrap().as_deref(), Some(""));
    }
}
