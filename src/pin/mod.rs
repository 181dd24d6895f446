//! WPS PIN generation and vendor suggestions.
//!
//! `WpsPinGenerator` combines the algorithm table with an OUI index so
//! callers can ask for a single PIN, the full candidate list, or the
//! candidates most likely to work for a given access point.

mod algorithm;
mod suggest;

pub use algorithm::{
    checksum, find_algorithm, format_pin, is_valid_pin, Derivation, PinAlgorithm, PinMode,
    ALGORITHMS,
};
pub use suggest::OuiIndex;

use std::fmt;

use crate::domain::MacAddress;
use crate::error::PinError;

/// A generated candidate with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPin {
    pub id: &'static str,
    pub name: String,
    pub pin: String,
}

impl GeneratedPin {
    fn new(algorithm: &'static PinAlgorithm, mac: MacAddress) -> Self {
        Self {
            id: algorithm.id,
            name: algorithm.display_name(),
            pin: algorithm.generate(mac),
        }
    }
}

impl fmt::Display for GeneratedPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pin = if self.pin.is_empty() {
            "<empty>"
        } else {
            self.pin.as_str()
        };
        write!(f, "{:<8} | {}", pin, self.name)
    }
}

/// PIN generator backed by an OUI suggestion table.
#[derive(Debug, Clone)]
pub struct WpsPinGenerator {
    index: OuiIndex,
}

impl Default for WpsPinGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl WpsPinGenerator {
    /// Generator using the embedded OUI table.
    pub fn new() -> Self {
        Self {
            index: OuiIndex::embedded().clone(),
        }
    }

    /// Generator using a custom OUI table.
    pub fn with_index(index: OuiIndex) -> Self {
        Self { index }
    }

    /// Generate the PIN of algorithm `id` for `mac`.
    pub fn generate(&self, id: &str, mac: MacAddress) -> Result<String, PinError> {
        Ok(find_algorithm(id)?.generate(mac))
    }

    /// Every registered algorithm, optionally without the static PINs.
    pub fn all(&self, mac: MacAddress, include_static: bool) -> Vec<GeneratedPin> {
        ALGORITHMS
            .iter()
            .filter(|algo| include_static || !algo.is_static())
            .map(|algo| GeneratedPin::new(algo, mac))
            .collect()
    }

    pub fn list(&self, mac: MacAddress, include_static: bool) -> Vec<String> {
        self.all(mac, include_static)
            .into_iter()
            .map(|g| g.pin)
            .collect()
    }

    /// Candidates for algorithms the vendor prefix points at.
    pub fn suggested(&self, mac: MacAddress) -> Vec<GeneratedPin> {
        self.index
            .suggest(mac)
            .into_iter()
            .map(|algo| GeneratedPin::new(algo, mac))
            .collect()
    }

    pub fn suggested_list(&self, mac: MacAddress) -> Vec<String> {
        self.suggested(mac).into_iter().map(|g| g.pin).collect()
    }

    /// First suggested PIN, if the vendor prefix is known.
    pub fn likely(&self, mac: MacAddress) -> Option<String> {
        self.index
            .suggest(mac)
            .first()
            .map(|algo| algo.generate(mac))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(s: &str) -> MacAddress {
        MacAddress::parse(s).unwrap()
    }

    #[test]
    fn test_generate_by_id() {
        let generator = WpsPinGenerator::new();
        assert_eq!(
            generator.generate("pin24", mac("00:90:4C:C1:AC:21")).unwrap(),
            "26925134"
        );
        assert!(matches!(
            generator.generate("bogus", mac("00:90:4C:C1:AC:21")),
            Err(PinError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_all_with_and_without_static() {
        let generator = WpsPinGenerator::new();
        let m = mac("14:D6:4D:12:34:56");
        let all = generator.all(m, true);
        assert_eq!(all.len(), 30);
        assert_eq!(all[0].id, "pin24");
        assert_eq!(all[8].name, "Static PIN - Cisco");

        let dynamic = generator.list(m, false);
        assert_eq!(dynamic.len(), 8);
        assert_eq!(dynamic[7], "");
    }

    #[test]
    fn test_suggested_list() {
        let generator = WpsPinGenerator::new();
        let pins = generator.suggested_list(mac("14:D6:4D:12:34:56"));
        assert_eq!(
            pins,
            vec![
                "11930464", "76465154", "66672982", "46264848", "76229909", "62327145",
                "10864111", "31957199"
            ]
        );
    }

    #[test]
    fn test_likely() {
        let generator = WpsPinGenerator::new();
        assert_eq!(
            generator.likely(mac("14:D6:4D:12:34:56")).as_deref(),
            Some("11930464")
        );
        assert_eq!(
            generator.likely(mac("04:92:26:AB:CD:EF")).as_deref(),
            Some("01424232")
        );
        assert_eq!(
            generator.likely(mac("C8:3A:35:00:00:01")).as_deref(),
            Some("00000017")
        );
        assert_eq!(generator.likely(mac("00:90:4C:C1:AC:21")), None);
    }

    #[test]
    fn test_custom_index() {
        let index = OuiIndex::parse("pinEmpty: 00904C\n").unwrap();
        let generator = WpsPinGenerator::with_index(index);
        assert_eq!(
            generator.likely(mac("00:90:4C:C1:AC:21")).as_deref(),
            Some("")
        );
        assert!(generator.suggested(mac("14:D6:4D:12:34:56")).is_empty());
    }

    #[test]
    fn test_display_empty_pin() {
        let generator = WpsPinGenerator::new();
        let empty = generator
            .all(mac("00:00:00:00:00:00"), false)
            .into_iter()
            .find(|g| g.id == "pinEmpty")
            .unwrap();
        assert!(empty.to_string().starts_with("<empty>"));
    }
}
