//! # Connectivity
//!
//! Best-effort answer to "is there likely network access", taken from the
//! host's own view of its interfaces. Nothing here touches the network.
//!
//! The newsroom receives a checker at construction, so tests substitute a
//! fixed answer instead of reading the host.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

/// Linux exposes one directory per interface here.
pub const SYSFS_NET_ROOT: &str = "/sys/class/net";

/// `ARPHRD_ETHER` from `<linux/if_arp.h>`.
const ARPHRD_ETHER: &str = "1";

pub trait ConnectivityChecker: Send + Sync {
    /// True if some interface has an active path over a usable transport.
    /// Must not panic; anything undeterminable counts as offline.
    fn is_connected(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Wifi,
    Cellular,
    Ethernet,
}

/// Skips the check entirely. For hosts without sysfs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOnline;

impl ConnectivityChecker for AlwaysOnline {
    fn is_connected(&self) -> bool {
        true
    }
}

/// Reads interface state from sysfs.
#[derive(Debug, Clone)]
pub struct SysfsConnectivity {
    root: PathBuf,
}

impl Default for SysfsConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsConnectivity {
    pub fn new() -> Self {
        Self::with_root(SYSFS_NET_ROOT)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Interfaces that are up, paired with their transport. Interfaces with
    /// no recognised transport (loopback, bridges, tunnels) are left out.
    pub fn active_transports(&self) -> Vec<(String, Transport)> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot read {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut active: Vec<(String, Transport)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let dir = entry.path();
                if !is_up(&dir) {
                    return None;
                }
                let transport = transport_of(&dir)?;
                Some((entry.file_name().to_string_lossy().into_owned(), transport))
            })
            .collect();
        active.sort_by(|a, b| a.0.cmp(&b.0));
        active
    }
}

impl ConnectivityChecker for SysfsConnectivity {
    fn is_connected(&self) -> bool {
        let active = self.active_transports();
        debug!("Active interfaces: {:?}", active);
        !active.is_empty()
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

/// `unknown` is common for cellular modems; trust the carrier bit there.
fn is_up(dir: &Path) -> bool {
    match read_trimmed(&dir.join("operstate")).as_deref() {
        Some("up") => true,
        Some("unknown") => read_trimmed(&dir.join("carrier")).as_deref() == Some("1"),
        _ => false,
    }
}

fn transport_of(dir: &Path) -> Option<Transport> {
    if dir.join("wireless").exists() || dir.join("phy80211").exists() {
        return Some(Transport::Wifi);
    }

    let is_wwan = read_trimmed(&dir.join("uevent"))
        .map(|uevent| uevent.lines().any(|line| line.trim() == "DEVTYPE=wwan"))
        .unwrap_or(false);
    if is_wwan {
        return Some(Transport::Cellular);
    }

    // Virtual interfaces (bridges, veth) also report ARPHRD_ETHER but have
    // no backing device.
    if read_trimmed(&dir.join("type")).as_deref() == Some(ARPHRD_ETHER)
        && dir.join("device").exists()
    {
        return Some(Transport::Ethernet);
    }

    None
}
