//! Presence scanner for routers running DD-WRT firmware.
//!
//! Presence comes from the wireless status page (associated clients), names
//! come from the LAN status page (DHCP leases). The two pages are cached and
//! throttled separately: presence is refreshed on every poll, names only when
//! a lookup misses.

use super::{DeviceScanner, ScanError, ScanFuture, ThrottledScanner};
use crate::mac_address::MacAddress;
use crate::names::NameIndex;
use crate::parser::braces::BraceParser;
use crate::parser::ddwrt::{ACTIVE_WIRELESS_FIELD, DHCP_LEASES_FIELD, active_clients, lease_names};
use crate::parser::{Fields, PayloadParser};
use crate::source::{Clock, Credentials, Fetcher};
use crate::throttle::MIN_TIME_BETWEEN_SCANS;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default deadline for one request to the router.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

const WIRELESS_PAGE: &str = "Status_Wireless.live.asp";
const LAN_PAGE: &str = "Status_Lan.live.asp";

/// Settings for a [`DdWrtScanner`].
#[derive(Debug, Clone)]
pub struct DdWrtConfig {
    /// Router address, e.g. `192.168.1.1`
    pub host: String,
    pub credentials: Credentials,
    /// Minimum time between two fetches of the same status page
    pub min_interval: Duration,
    pub request_timeout: Duration,
    /// Names that take precedence over the lease table
    pub aliases: NameIndex,
}

impl DdWrtConfig {
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            credentials,
            min_interval: MIN_TIME_BETWEEN_SCANS,
            request_timeout: REQUEST_TIMEOUT,
            aliases: NameIndex::new(),
        }
    }

    fn url(&self, page: &str) -> String {
        format!("http://{}/{}", self.host, page)
    }
}

/// Queries a DD-WRT router for associated wireless clients.
pub struct DdWrtScanner {
    config: DdWrtConfig,
    fetcher: Arc<dyn Fetcher>,
    parser: Box<dyn PayloadParser>,
    presence: ThrottledScanner<Vec<MacAddress>>,
    names: ThrottledScanner<NameIndex>,
    init_succeeded: bool,
}

impl DdWrtScanner {
    /// Create a scanner and check that the router answers.
    ///
    /// The check fetches the wireless status page once; if it fails,
    /// [`DeviceScanner::init_succeeded`] returns `false` and every later
    /// refresh is refused.
    pub async fn connect(
        config: DdWrtConfig,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut scanner = Self::unchecked(config, fetcher, clock);
        let url = scanner.config.url(WIRELESS_PAGE);
        scanner.init_succeeded = match scanner.fetch_fields(&url).await {
            Ok(_) => true,
            Err(err) => {
                super::report("DD-WRT router", &err);
                false
            }
        };
        scanner
    }

    fn unchecked(config: DdWrtConfig, fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>) -> Self {
        let interval = config.min_interval;
        Self {
            config,
            fetcher,
            parser: Box::new(BraceParser),
            presence: ThrottledScanner::new(
                "DD-WRT wireless status",
                interval,
                clock.clone(),
                Vec::new(),
            ),
            names: ThrottledScanner::new("DD-WRT lease table", interval, clock, NameIndex::new()),
            init_succeeded: false,
        }
    }

    /// Fetch a status page and parse it into fields.
    async fn fetch_fields(&self, url: &str) -> Result<Fields, ScanError> {
        let response = tokio::time::timeout(
            self.config.request_timeout,
            self.fetcher
                .fetch(url, &self.config.credentials, self.config.request_timeout),
        )
        .await
        .map_err(|_| ScanError::Transport("Connection to the router timed out".into()))??;

        match response.status {
            200 => Ok(self.parser.parse(&response.body)),
            401 => Err(ScanError::Auth),
            status => Err(ScanError::Transport(format!(
                "Invalid response from ddwrt: HTTP {}",
                status
            ))),
        }
    }

    /// Fetch one list-valued field. A page without fields, or without this
    /// field, is malformed.
    async fn fetch_field(&self, page: &str, field: &str) -> Result<String, ScanError> {
        let mut fields = self.fetch_fields(&self.config.url(page)).await?;
        if fields.is_empty() {
            return Err(ScanError::MalformedPayload(format!("{} contains no fields", page)));
        }
        fields
            .remove(field)
            .ok_or_else(|| ScanError::MalformedPayload(format!("{} has no {} field", page, field)))
    }

    async fn fetch_active_clients(&self) -> Result<Vec<MacAddress>, ScanError> {
        info!("Checking ARP");
        let value = self.fetch_field(WIRELESS_PAGE, ACTIVE_WIRELESS_FIELD).await?;
        let clients = active_clients(&value);
        debug!("{} active wireless clients", clients.len());
        Ok(clients)
    }

    async fn fetch_lease_names(&self) -> Result<NameIndex, ScanError> {
        let value = self.fetch_field(LAN_PAGE, DHCP_LEASES_FIELD).await?;
        let names = lease_names(&value);
        debug!("{} named DHCP leases", names.len());
        Ok(names)
    }

    /// Refresh the client list if the throttle window has passed.
    pub async fn refresh(&self) -> bool {
        if !self.init_succeeded {
            return false;
        }
        self.presence
            .refresh(|_| self.fetch_active_clients())
            .await
    }

    async fn lookup(&self, id: MacAddress) -> Option<String> {
        if let Some(name) = self.config.aliases.get(&id) {
            return Some(name.clone());
        }

        let cached = self.names.with_results(|names| names.get(&id).cloned()).await;
        if cached.is_some() || !self.init_succeeded {
            return cached;
        }

        // Miss: rebuild the whole index from the lease table.
        self.names.refresh(|_| self.fetch_lease_names()).await;
        self.names.with_results(|names| names.get(&id).cloned()).await
    }
}

impl DeviceScanner for DdWrtScanner {
    fn scan_devices(&self) -> ScanFuture<'_, Vec<MacAddress>> {
        Box::pin(async move {
            self.refresh().await;
            self.presence.results().await
        })
    }

    fn get_device_name(&self, id: MacAddress) -> ScanFuture<'_, Option<String>> {
        Box::pin(self.lookup(id))
    }

    fn init_succeeded(&self) -> bool {
        self.init_succeeded
    }
}
