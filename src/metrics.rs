//! Process-wide detection counters (default prometheus registry).

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, TextEncoder};

pub static TICKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new("ids_ticks_total", "Total detection ticks executed").unwrap();
    prometheus::register(Box::new(c.clone())).unwrap();
    c
});

pub static INTRUSIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new(
        "ids_intrusions_total",
        "Total samples classified as intrusions",
    )
    .unwrap();
    prometheus::register(Box::new(c.clone())).unwrap();
    c
});

pub static ANOMALIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new(
        "ids_anomalies_total",
        "Total anomaly findings reported by window scans",
    )
    .unwrap();
    prometheus::register(Box::new(c.clone())).unwrap();
    c
});

/// Force registration so the counters show up before the first tick.
pub fn init() {
    let _ = &*TICKS_TOTAL;
    let _ = &*INTRUSIONS_TOTAL;
    let _ = &*ANOMALIES_TOTAL;
}

/// Text exposition of the default registry.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&prometheus::gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
