//! OUI prefix table mapping vendors to their likely PIN algorithms.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

use super::algorithm::{find_algorithm, PinAlgorithm};
use crate::domain::MacAddress;
use crate::error::PinError;

const EMBEDDED_TABLE: &str = include_str!("../../data/oui_suggestions.txt");

/// Prefixes known to use one algorithm.
#[derive(Debug, Clone)]
struct SuggestionRule {
    algorithm: &'static PinAlgorithm,
    prefixes: Vec<String>,
}

impl SuggestionRule {
    fn matches(&self, hex_digits: &str) -> bool {
        self.prefixes.iter().any(|p| hex_digits.starts_with(p.as_str()))
    }
}

/// Parsed OUI suggestion table.
///
/// Rule order is the order of the table file and is the order in which
/// suggestions are returned.
#[derive(Debug, Clone)]
pub struct OuiIndex {
    rules: Vec<SuggestionRule>,
}

impl OuiIndex {
    /// The table compiled into the binary, parsed on first use.
    pub fn embedded() -> &'static OuiIndex {
        static INDEX: OnceLock<OuiIndex> = OnceLock::new();
        INDEX.get_or_init(|| {
            // The embedded table is covered by tests; an empty index is
            // only reachable if the asset was edited into an invalid state.
            Self::parse(EMBEDDED_TABLE).unwrap_or_else(|e| {
                tracing::error!("Embedded OUI table is invalid: {}", e);
                OuiIndex { rules: Vec::new() }
            })
        })
    }

    /// Load a replacement table from disk.
    pub fn load(path: &Path) -> Result<Self, PinError> {
        let content = fs::read_to_string(path).map_err(|e| PinError::TableRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let index = Self::parse(&content)?;
        debug!(
            "Loaded OUI table {} with {} rules",
            path.display(),
            index.rules.len()
        );
        Ok(index)
    }

    /// Parse `<algorithm id>: <prefix> <prefix> ...` lines.
    ///
    /// Blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self, PinError> {
        let mut rules: Vec<SuggestionRule> = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = |reason: String| PinError::MalformedTable {
                line: idx + 1,
                reason,
            };

            let (id, prefixes) = line
                .split_once(':')
                .ok_or_else(|| malformed("missing ':' after algorithm id".into()))?;
            let algorithm =
                find_algorithm(id.trim()).map_err(|e| malformed(e.to_string()))?;

            let prefixes: Vec<String> = prefixes
                .split_whitespace()
                .map(|p| p.to_ascii_uppercase())
                .collect();
            if let Some(bad) = prefixes.iter().find(|p| !is_valid_prefix(p)) {
                return Err(malformed(format!("invalid prefix '{}'", bad)));
            }

            match rules.iter_mut().find(|r| r.algorithm.id == algorithm.id) {
                Some(rule) => rule.prefixes.extend(prefixes),
                None => rules.push(SuggestionRule {
                    algorithm,
                    prefixes,
                }),
            }
        }

        Ok(Self { rules })
    }

    /// Algorithms whose prefixes match `mac`, each at most once.
    pub fn suggest(&self, mac: MacAddress) -> Vec<&'static PinAlgorithm> {
        let digits = mac.hex_digits();
        self.rules
            .iter()
            .filter(|rule| rule.matches(&digits))
            .map(|rule| rule.algorithm)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    (6..=8).contains(&prefix.len()) && prefix.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ids(index: &OuiIndex, mac: &str) -> Vec<&'static str> {
        index
            .suggest(MacAddress::parse(mac).unwrap())
            .into_iter()
            .map(|a| a.id)
            .collect()
    }

    #[test]
    fn embedded_table_parses() {
        assert!(OuiIndex::parse(EMBEDDED_TABLE).is_ok());
        assert_eq!(OuiIndex::embedded().len(), 30);
    }

    #[test]
    fn suggests_in_table_order() {
        assert_eq!(
            ids(OuiIndex::embedded(), "14:D6:4D:12:34:56"),
            vec![
                "pin24",
                "pinDLink",
                "pinDLink1",
                "pinBrcm2",
                "pinBrcm3",
                "pinBrcm4",
                "pinBrcm5",
                "pinBrcm6"
            ]
        );
    }

    #[test]
    fn single_suggestion() {
        assert_eq!(ids(OuiIndex::embedded(), "04:92:26:AB:CD:EF"), vec!["pinASUS"]);
        assert_eq!(ids(OuiIndex::embedded(), "C8:3A:35:00:00:01"), vec!["pin24"]);
    }

    #[test]
    fn unknown_vendor_has_no_suggestion() {
        assert!(ids(OuiIndex::embedded(), "00:90:4C:C1:AC:21").is_empty());
    }

    #[test]
    fn long_prefixes_need_full_match() {
        // pinUR814AC lists D4BF7F60 only; pinOnlime lists D4BF7F.
        let a = ids(OuiIndex::embedded(), "D4:BF:7F:60:00:01");
        assert!(a.contains(&"pinUR814AC"));
        assert!(a.contains(&"pinOnlime"));
        let b = ids(OuiIndex::embedded(), "D4:BF:7F:61:00:01");
        assert!(!b.contains(&"pinUR814AC"));
        assert!(b.contains(&"pinOnlime"));
    }

    #[test]
    fn parse_rejects_unknown_algorithm() {
        let err = OuiIndex::parse("# header\npinFoo: 001122\n").unwrap_err();
        assert!(matches!(err, PinError::MalformedTable { line: 2, .. }));
    }

    #[test]
    fn parse_rejects_bad_prefix() {
        assert!(OuiIndex::parse("pin24: 0011\n").is_err());
        assert!(OuiIndex::parse("pin24: 00112G\n").is_err());
        assert!(OuiIndex::parse("pin24 001122\n").is_err());
    }

    #[test]
    fn repeated_ids_are_merged() {
        let index = OuiIndex::parse("pin24: 001122\npin28: 001122\npin24: AABBCC\n").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(ids(&index, "AA:BB:CC:00:00:00"), vec!["pin24"]);
        assert_eq!(ids(&index, "00:11:22:00:00:00"), vec!["pin24", "pin28"]);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pinCisco: aabbcc").unwrap();
        let index = OuiIndex::load(file.path()).unwrap();
        assert_eq!(ids(&index, "AA:BB:CC:DD:EE:FF"), vec!["pinCisco"]);
    }

    #[test]
    fn load_missing_file() {
        let err = OuiIndex::load(Path::new("/nonexistent/oui.txt")).unwrap_err();
        assert!(matches!(err, PinError::TableRead { .. }));
    }
}
