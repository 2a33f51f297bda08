use crate::mac_address::MacAddress;
use crate::source::{
    AddressResolver, Clock, Credentials, FetchError, Fetcher, ProbeError, ProbeHost, ProbeOptions,
    Prober, Response, SourceFuture,
};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Stable MAC addresses for unit tests.
pub const TEST_MAC: MacAddress = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
pub const TEST_MAC_2: MacAddress = MacAddress([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
pub const TEST_MAC_3: MacAddress = MacAddress([0x02, 0x00, 0x00, 0x00, 0x00, 0x03]);

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Fetcher that serves scripted responses per URL and records every request.
///
/// Each URL has a queue of results; the last one is repeated once the queue
/// is down to a single entry.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, VecDeque<Result<Response, FetchError>>>>,
    requests: Mutex<Vec<String>>,
    stalled: AtomicBool,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, result: Result<Response, FetchError>) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(result);
    }

    /// Make every later request hang forever.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| *u == url)
            .count()
    }

    fn next(&self, url: &str) -> Result<Response, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Ok(Response {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

impl Fetcher for FakeFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        _credentials: &'a Credentials,
        _timeout: Duration,
    ) -> SourceFuture<'a, Result<Response, FetchError>> {
        let result = self.next(url);
        if self.stalled.load(Ordering::SeqCst) {
            return Box::pin(std::future::pending());
        }
        Box::pin(async move { result })
    }
}

/// Prober that returns scripted results and records the options it was given.
#[derive(Debug, Default)]
pub struct FakeProber {
    results: Mutex<VecDeque<Result<Vec<ProbeHost>, ProbeError>>>,
    calls: Mutex<Vec<ProbeOptions>>,
    stalled: AtomicBool,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<Vec<ProbeHost>, ProbeError>) {
        self.results.lock().unwrap().push_back(result);
    }

    /// Make every later sweep hang forever.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ProbeOptions> {
        self.calls.lock().unwrap().clone()
    }
}

impl Prober for FakeProber {
    fn run_probe<'a>(
        &'a self,
        _hosts: &'a [String],
        options: &'a ProbeOptions,
        _timeout: Duration,
    ) -> SourceFuture<'a, Result<Vec<ProbeHost>, ProbeError>> {
        self.calls.lock().unwrap().push(options.clone());
        if self.stalled.load(Ordering::SeqCst) {
            return Box::pin(std::future::pending());
        }
        let result = self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        Box::pin(async move { result })
    }
}

/// Resolver backed by a fixed IP to address table.
#[derive(Debug, Default)]
pub struct FakeResolver {
    table: HashMap<String, MacAddress>,
    lookups: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn new(entries: &[(&str, MacAddress)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(ip, mac)| (ip.to_string(), *mac))
                .collect(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl AddressResolver for FakeResolver {
    fn resolve<'a>(&'a self, ip: &'a str) -> SourceFuture<'a, Option<MacAddress>> {
        self.lookups.lock().unwrap().push(ip.to_string());
        let mac = self.table.get(ip).copied();
        Box::pin(async move { mac })
    }
}

/// Build an up host as a probe would report it.
pub fn up_host(ip: &str, hostname: Option<&str>, mac: Option<&str>) -> ProbeHost {
    ProbeHost {
        ip: ip.to_string(),
        up: true,
        hostnames: hostname.into_iter().map(String::from).collect(),
        mac: mac.map(String::from),
    }
}
