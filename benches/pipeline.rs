//! Integration benchmark for the presence polling pipeline.
//!
//! Drives a real `DdWrtScanner` against an in-memory router through
//! `poll_once`: fetch, brace parsing, name lookup and line formatting.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use presence_scanner::app::poll_once;
use presence_scanner::source::{
    Credentials, FetchError, Fetcher, Response, SourceFuture, SystemClock,
};
use presence_scanner::{DdWrtConfig, DdWrtScanner, InfluxDbFormatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Serves the same status pages for every request.
struct StaticRouter {
    wireless: String,
    lan: String,
}

impl StaticRouter {
    fn with_clients(count: u8) -> Self {
        let macs: Vec<String> = (0..count)
            .map(|i| format!("AA:BB:CC:DD:EE:{:02X}", i))
            .collect();

        let wireless = macs
            .iter()
            .map(|mac| format!("'{}','eth1','0:12:34','72M','72M','-45','-92','47','1000'", mac))
            .collect::<Vec<_>>()
            .join(",");
        let lan = macs
            .iter()
            .enumerate()
            .map(|(i, mac)| {
                format!(
                    "\"device-{}\",\"192.168.1.{}\",\"{}\",\"1 day 00:00:00\",\"{}\"",
                    i,
                    i + 10,
                    mac,
                    i + 10
                )
            })
            .collect::<Vec<_>>()
            .join(",");

        Self {
            wireless: format!("{{wl_mac::00:11:22:33:44:55}}\n{{active_wireless::{}}}\n", wireless),
            lan: format!("{{lan_ip::192.168.1.1}}\n{{dhcp_leases:: {}}}\n", lan),
        }
    }
}

impl Fetcher for StaticRouter {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        _credentials: &'a Credentials,
        _timeout: Duration,
    ) -> SourceFuture<'a, Result<Response, FetchError>> {
        let body = if url.ends_with("Status_Wireless.live.asp") {
            self.wireless.clone()
        } else {
            self.lan.clone()
        };
        Box::pin(async move { Ok(Response::ok(body)) })
    }
}

fn scanner(rt: &Runtime, clients: u8) -> DdWrtScanner {
    let mut config = DdWrtConfig::new("192.168.1.1", Credentials::new("admin", "admin"));
    // Refresh on every poll so each iteration hits the parser
    config.min_interval = Duration::ZERO;
    rt.block_on(DdWrtScanner::connect(
        config,
        Arc::new(StaticRouter::with_clients(clients)),
        Arc::new(SystemClock),
    ))
}

/// Benchmark a full poll with growing numbers of associated clients
fn bench_ddwrt_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddwrt_poll");
    let rt = Runtime::new().unwrap();
    let formatter = InfluxDbFormatter::new("device_presence".to_string());

    for clients in [1u8, 10, 100] {
        let scanner = scanner(&rt, clients);
        group.throughput(Throughput::Elements(clients as u64));
        group.bench_with_input(BenchmarkId::from_parameter(clients), &clients, |b, &size| {
            b.iter(|| {
                let mut out = Vec::<u8>::with_capacity(128 * size as usize);
                rt.block_on(async {
                    poll_once(&scanner, &formatter, chrono::Utc::now(), &mut out)
                        .await
                        .unwrap();
                });
                black_box(out)
            })
        });
    }

    group.finish();
}

/// Benchmark polls answered from cache inside the throttle window
fn bench_throttled_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("throttled_poll");
    let rt = Runtime::new().unwrap();
    let formatter = InfluxDbFormatter::new("device_presence".to_string());

    let mut config = DdWrtConfig::new("192.168.1.1", Credentials::new("admin", "admin"));
    config.min_interval = Duration::from_secs(3600);
    let scanner = rt.block_on(DdWrtScanner::connect(
        config,
        Arc::new(StaticRouter::with_clients(10)),
        Arc::new(SystemClock),
    ));

    group.throughput(Throughput::Elements(10));
    group.bench_function("10_cached_devices", |b| {
        b.iter(|| {
            let mut out = Vec::<u8>::with_capacity(1280);
            tokio_test::block_on(async {
                poll_once(&scanner, &formatter, chrono::Utc::now(), &mut out)
                    .await
                    .unwrap();
            });
            black_box(out)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_ddwrt_poll, bench_throttled_poll);
criterion_main!(benches);
