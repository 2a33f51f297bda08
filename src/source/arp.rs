//! [`AddressResolver`] that reads the kernel neighbour table through `arp -n`.

use super::{AddressResolver, SourceFuture};
use crate::mac_address::{self, MacAddress};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Default deadline for a single `arp` invocation.
pub const ARP_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct ArpResolver {
    timeout: Duration,
}

impl Default for ArpResolver {
    fn default() -> Self {
        Self {
            timeout: ARP_TIMEOUT,
        }
    }
}

impl ArpResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn lookup(&self, ip: &str) -> Option<MacAddress> {
        let mut command = Command::new("arp");
        command.args(["-n", ip]).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("Failed to run arp for {}: {}", ip, e);
                return None;
            }
            Err(_) => {
                debug!("arp lookup for {} timed out", ip);
                return None;
            }
        };

        let mac = parse_arp_output(&String::from_utf8_lossy(&output.stdout));
        if mac.is_none() {
            info!("No MAC address found for {}", ip);
        }
        mac
    }
}

/// Extract the hardware address from `arp -n <ip>` output.
///
/// Incomplete entries and the all-zero address are treated as missing.
pub fn parse_arp_output(output: &str) -> Option<MacAddress> {
    output
        .lines()
        .filter_map(mac_address::find_in)
        .find(|mac| *mac != MacAddress::default())
}

impl AddressResolver for ArpResolver {
    fn resolve<'a>(&'a self, ip: &'a str) -> SourceFuture<'a, Option<MacAddress>> {
        Box::pin(self.lookup(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_linux_output() {
        let output = "Address                  HWtype  HWaddress           Flags Mask            Iface\n\
                      192.168.1.20             ether   3c:22:fb:01:02:03   C                     wlan0\n";
        assert_eq!(
            parse_arp_output(output),
            Some(MacAddress([0x3C, 0x22, 0xFB, 0x01, 0x02, 0x03]))
        );
    }

    #[test]
    fn test_parse_macos_output() {
        // macOS drops leading zeros in each group
        let output = "? (192.168.1.20) at 3c:22:fb:1:2:3 on en0 ifscope [ethernet]\n";
        assert_eq!(
            parse_arp_output(output),
            Some(MacAddress([0x3C, 0x22, 0xFB, 0x01, 0x02, 0x03]))
        );
    }

    #[test]
    fn test_parse_incomplete_entry() {
        let output = "Address                  HWtype  HWaddress           Flags Mask            Iface\n\
                      192.168.1.21                     (incomplete)                              wlan0\n";
        assert_eq!(parse_arp_output(output), None);
        assert_eq!(parse_arp_output("192.168.1.22 (192.168.1.22) -- no entry\n"), None);
    }

    #[test]
    fn test_parse_all_zero_address() {
        let output = "192.168.1.23             ether   00:00:00:00:00:00   C                     eth0\n";
        assert_eq!(parse_arp_output(output), None);
    }
}
