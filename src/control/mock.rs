//! Scripted in-memory engine for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{ControlChannel, TraceRead, TraceSource};
use crate::error::ControlError;

type Script = Box<dyn FnMut(&str) -> Vec<String> + Send>;

/// Engine that answers `WPS_REG` with a canned trace chosen per PIN.
pub struct ScriptedSupplicant {
    script: Script,
    queue: VecDeque<String>,
    /// Every command received, in order.
    pub commands: Vec<String>,
    /// Reply to `WPS_REG`.
    pub reply: String,
    /// What an exhausted queue reports.
    pub when_empty: TraceRead,
    /// Raise `flag` when this many registrations have been received.
    interrupt_at: Option<(usize, Arc<AtomicBool>)>,
}

impl ScriptedSupplicant {
    pub fn new(script: impl FnMut(&str) -> Vec<String> + Send + 'static) -> Self {
        Self {
            script: Box::new(script),
            queue: VecDeque::new(),
            commands: Vec::new(),
            reply: "OK".to_string(),
            when_empty: TraceRead::Closed,
            interrupt_at: None,
        }
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    pub fn with_when_empty(mut self, read: TraceRead) -> Self {
        self.when_empty = read;
        self
    }

    pub fn with_interrupt_at(mut self, registrations: usize, flag: Arc<AtomicBool>) -> Self {
        self.interrupt_at = Some((registrations, flag));
        self
    }

    /// PINs submitted so far, in order.
    pub fn pins(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| c.strip_prefix("WPS_REG "))
            .filter_map(|rest| rest.split_whitespace().nth(1))
            .map(|pin| pin.to_string())
            .collect()
    }

    pub fn cancels(&self) -> usize {
        self.commands.iter().filter(|c| *c == "WPS_CANCEL").count()
    }
}

impl ControlChannel for ScriptedSupplicant {
    fn request(&mut self, command: &str) -> Result<String, ControlError> {
        self.commands.push(command.to_string());
        if let Some(rest) = command.strip_prefix("WPS_REG ") {
            let pin = rest.split_whitespace().nth(1).unwrap_or_default();
            let pin = if pin == "''" { "" } else { pin };
            self.queue = (self.script)(pin).into();

            let registrations = self.pins().len();
            if let Some((at, flag)) = &self.interrupt_at {
                if registrations == *at {
                    flag.store(true, Ordering::SeqCst);
                }
            }
        }
        Ok(self.reply.clone())
    }

    fn send(&mut self, command: &str) -> Result<(), ControlError> {
        self.commands.push(command.to_string());
        if command == "WPS_CANCEL" {
            self.queue.clear();
        }
        Ok(())
    }
}

impl TraceSource for ScriptedSupplicant {
    fn next_line(&mut self, _wait: Duration) -> TraceRead {
        match self.queue.pop_front() {
            Some(line) => TraceRead::Line(line),
            None => self.when_empty.clone(),
        }
    }

    fn drain(&mut self) {
        self.queue.clear();
    }
}

fn exchange(up_to: u8) -> Vec<String> {
    let mut lines = vec![
        "wlan0: State: DISCONNECTED -> SCANNING".to_string(),
        "wlan0: Trying to associate with 00:90:4c:c1:ac:21 (SSID='TestNet' freq=2412 MHz)"
            .to_string(),
        "wlan0: Associated with 00:90:4c:c1:ac:21".to_string(),
        "EAPOL: txStart".to_string(),
    ];
    for n in 1..=up_to {
        if n % 2 == 1 {
            lines.push(format!("WPS: Received M{}", n));
        } else {
            lines.push(format!("WPS: Building Message M{}", n));
        }
    }
    lines
}

/// The access point rejects the first PIN half.
pub fn wrong_first_half() -> Vec<String> {
    let mut lines = exchange(4);
    lines.push("WPS: Received WSC_NACK".to_string());
    lines
}

/// The access point accepts the first half and rejects the second.
pub fn wrong_second_half() -> Vec<String> {
    let mut lines = exchange(6);
    lines.push("WPS: Received WSC_NACK".to_string());
    lines
}

/// Full success; the network key is `psk`.
pub fn success(psk: &str) -> Vec<String> {
    let mut lines = exchange(8);
    let hex: Vec<String> = psk.bytes().map(|b| format!("{:02x}", b)).collect();
    lines.push(format!(
        "WPS: Network Key - hexdump(len={}): {}",
        psk.len(),
        hex.join(" ")
    ));
    lines
}

/// The supplicant gives up on the transaction.
pub fn wps_fail() -> Vec<String> {
    let mut lines = exchange(0);
    lines.push("wlan0: WPS-FAIL msg=8 config_error=0".to_string());
    lines
}

/// Handshake parameters followed by a NACK on the first half.
pub fn pixie_exchange() -> Vec<String> {
    let dump = |label: &str, byte: &str, len: usize| {
        format!(
            "WPS: {} - hexdump(len={}): {}",
            label,
            len,
            vec![byte; len].join(" ")
        )
    };
    let mut lines = exchange(1);
    lines.push(dump("Enrollee Nonce", "11", 16));
    lines.push(dump("DH own Public Key", "22", 192));
    lines.push(dump("DH peer Public Key", "33", 192));
    lines.push(dump("AuthKey", "44", 32));
    lines.push("WPS: Building Message M2".to_string());
    lines.push("WPS: Received M3".to_string());
    lines.push(dump("E-Hash1", "55", 32));
    lines.push(dump("E-Hash2", "66", 32));
    lines.push("WPS: Building Message M4".to_string());
    lines.push("WPS: Received WSC_NACK".to_string());
    lines
}
