use std::io;
use std::process::Command;

use tracing::debug;

/// Whether the process runs with an effective uid of 0.
#[cfg(unix)]
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Arguments for `ip` to bring `interface` up or down.
pub fn link_args(interface: &str, up: bool) -> [&str; 4] {
    ["link", "set", interface, if up { "up" } else { "down" }]
}

/// Bring `interface` up or down with `ip link set`.
pub fn set_link(interface: &str, up: bool) -> io::Result<()> {
    let args = link_args(interface, up);
    let output = Command::new("ip").args(args).output()?;
    debug!("ip {} -> {}", args.join(" "), output.status);

    if output.status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "failed to set {} {}: {}",
                interface,
                args[3],
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ))
    }
}

/// Cut `s` to `width` characters, ending with an ellipsis when cut.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_args() {
        assert_eq!(link_args("wlan0", true), ["link", "set", "wlan0", "up"]);
        assert_eq!(link_args("wlan0", false)[3], "down");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 25), "short");
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
        assert_eq!(truncate("ééééé", 5), "ééééé");
    }
}
