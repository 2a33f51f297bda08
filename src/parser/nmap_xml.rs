//! Parser for nmap's XML report (`nmap -oX -`).

use crate::source::ProbeHost;
use quick_xml::de::from_str;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct NmapRun {
    #[serde(rename = "host", default)]
    hosts: Vec<Host>,
}

#[derive(Debug, Deserialize)]
struct Host {
    #[serde(default)]
    status: Option<Status>,
    #[serde(rename = "address", default)]
    addresses: Vec<Address>,
    #[serde(default)]
    hostnames: Option<Hostnames>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(rename = "@state")]
    state: String,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(rename = "@addr")]
    addr: String,
    #[serde(rename = "@addrtype")]
    addrtype: String,
}

#[derive(Debug, Default, Deserialize)]
struct Hostnames {
    #[serde(rename = "hostname", default)]
    names: Vec<Hostname>,
}

#[derive(Debug, Deserialize)]
struct Hostname {
    #[serde(rename = "@name")]
    name: String,
}

impl Host {
    fn address(&self, kind: &str) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.addrtype == kind)
            .map(|a| a.addr.as_str())
    }

    fn into_probe_host(self) -> Option<ProbeHost> {
        let ip = self.address("ipv4").or_else(|| self.address("ipv6"))?.to_string();
        let mac = self.address("mac").map(str::to_string);
        let up = self.status.as_ref().is_some_and(|s| s.state == "up");
        let hostnames = self
            .hostnames
            .map(|h| {
                h.names
                    .into_iter()
                    .map(|n| n.name)
                    .filter(|name| !name.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Some(ProbeHost {
            ip,
            up,
            hostnames,
            mac,
        })
    }
}

/// Parse an nmap XML report into per-host results.
///
/// Hosts without an IP address are skipped.
pub fn parse_report(xml: &str) -> Result<Vec<ProbeHost>, quick_xml::DeError> {
    let run: NmapRun = from_str(xml)?;
    Ok(run
        .hosts
        .into_iter()
        .filter_map(Host::into_probe_host)
        .collect())
}
