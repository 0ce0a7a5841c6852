//! Metrics Module
//!
//! Prometheus text exposition (format 0.0.4) for the cache counters plus
//! labeled latency histograms for the HTTP and line-protocol adapters.

use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::CacheStats;

/// Prefix shared by every exported metric name.
pub const METRIC_PREFIX: &str = "zencache";

/// Latency bucket upper bounds in seconds, dense at the low end.
pub const DEFAULT_BUCKETS: [f64; 13] = [
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

// == Labeled Histogram ==
/// Labels sorted by name, used as the series key.
type LabelSet = Vec<(String, String)>;

#[derive(Debug, Clone)]
struct Series {
    /// Per-bucket counts, one extra slot for +Inf. Not cumulative.
    counts: Vec<u64>,
    sum: f64,
    count: u64,
}

/// Histogram with one series per distinct label set.
#[derive(Debug)]
pub struct LabeledHistogram {
    name: String,
    help: String,
    buckets: Vec<f64>,
    series: Mutex<BTreeMap<LabelSet, Series>>,
}

impl LabeledHistogram {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::with_buckets(name, help, DEFAULT_BUCKETS.to_vec())
    }

    /// `buckets` must be sorted ascending.
    pub fn with_buckets(name: impl Into<String>, help: impl Into<String>, buckets: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            buckets,
            series: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records one observation of `seconds` under `labels`.
    pub fn observe(&self, seconds: f64, labels: &[(&str, &str)]) {
        let mut key: LabelSet = labels
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        key.sort();

        let slot = self
            .buckets
            .iter()
            .position(|bound| seconds <= *bound)
            .unwrap_or(self.buckets.len());

        let mut series = self.series.lock();
        let entry = series.entry(key).or_insert_with(|| Series {
            counts: vec![0; self.buckets.len() + 1],
            sum: 0.0,
            count: 0,
        });
        entry.counts[slot] += 1;
        entry.sum += seconds;
        entry.count += 1;
    }

    /// Total observations recorded under exactly `labels`.
    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        let mut key: LabelSet = labels
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        key.sort();
        self.series.lock().get(&key).map_or(0, |series| series.count)
    }

    fn write_to(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "# HELP {} {}", self.name, self.help)?;
        writeln!(out, "# TYPE {} histogram", self.name)?;

        let series = self.series.lock();
        for (labels, series) in series.iter() {
            let mut cumulative = 0;
            for (bound, count) in self.buckets.iter().zip(&series.counts) {
                cumulative += count;
                let le = bound.to_string();
                writeln!(
                    out,
                    "{}_bucket{} {}",
                    self.name,
                    render_labels(labels, Some(&le)),
                    cumulative
                )?;
            }
            cumulative += series.counts[self.buckets.len()];
            writeln!(
                out,
                "{}_bucket{} {}",
                self.name,
                render_labels(labels, Some("+Inf")),
                cumulative
            )?;
            writeln!(out, "{}_sum{} {}", self.name, render_labels(labels, None), series.sum)?;
            writeln!(out, "{}_count{} {}", self.name, render_labels(labels, None), series.count)?;
        }
        Ok(())
    }
}

/// Renders `{a="x",b="y"}`, appending `le` last when given. Empty sets render
/// as nothing.
fn render_labels(labels: &[(String, String)], le: Option<&str>) -> String {
    let mut parts: Vec<String> = labels
        .iter()
        .map(|(name, value)| format!("{}=\"{}\"", name, escape_label_value(value)))
        .collect();
    if let Some(le) = le {
        parts.push(format!("le=\"{}\"", le));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", parts.join(","))
    }
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

// == Metrics Registry ==
/// Process-wide metrics shared by both adapters.
#[derive(Debug)]
pub struct Metrics {
    http: LabeledHistogram,
    resp: LabeledHistogram,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            http: LabeledHistogram::new(
                format!("{}_http_seconds", METRIC_PREFIX),
                "HTTP request duration in seconds",
            ),
            resp: LabeledHistogram::new(
                format!("{}_resp_seconds", METRIC_PREFIX),
                "RESP command duration in seconds",
            ),
        }
    }

    pub fn http(&self) -> &LabeledHistogram {
        &self.http
    }

    pub fn resp(&self) -> &LabeledHistogram {
        &self.resp
    }

    /// Records the latency of one HTTP request.
    pub fn observe_http(&self, method: &str, route: &str, elapsed: Duration) {
        self.http
            .observe(elapsed.as_secs_f64(), &[("method", method), ("route", route)]);
    }

    /// Records the latency of one line-protocol command.
    pub fn observe_resp(&self, cmd: &str, elapsed: Duration) {
        self.resp.observe(elapsed.as_secs_f64(), &[("cmd", cmd)]);
    }

    /// Renders the cache snapshot and both histograms.
    pub fn render(&self, stats: &CacheStats) -> String {
        let mut out = String::with_capacity(4096);
        // writing into a String cannot fail
        let _ = self.write_to(&mut out, stats);
        out
    }

    fn write_to(&self, out: &mut String, stats: &CacheStats) -> fmt::Result {
        write_metric(out, "hits_total", "counter", "Cache hits", stats.hits)?;
        write_metric(out, "misses_total", "counter", "Cache misses", stats.misses)?;
        write_metric(
            out,
            "evictions_total",
            "counter",
            "Entries evicted to stay under capacity",
            stats.evictions,
        )?;
        write_metric(
            out,
            "admission_rejections_total",
            "counter",
            "New keys refused by the admission filter",
            stats.rejections,
        )?;
        write_metric(out, "items", "gauge", "Live entries", stats.items)?;
        write_metric(
            out,
            "size_bytes",
            "gauge",
            "Approximate bytes held by live entries",
            stats.total_size_bytes,
        )?;
        write_metric(
            out,
            "capacity_bytes",
            "gauge",
            "Configured byte capacity",
            stats.capacity_bytes,
        )?;
        write_metric(
            out,
            "started_at_seconds",
            "gauge",
            "Cache start time as a Unix timestamp",
            stats.started_at as f64 / 1000.0,
        )?;
        write_metric(
            out,
            "lfu_enabled",
            "gauge",
            "Whether TinyLFU admission is enabled",
            u8::from(stats.lfu_enabled),
        )?;
        write_metric(out, "up", "gauge", "Whether the cache is serving", 1)?;

        self.http.write_to(out)?;
        self.resp.write_to(out)
    }
}

fn write_metric(
    out: &mut String,
    suffix: &str,
    kind: &str,
    help: &str,
    value: impl fmt::Display,
) -> fmt::Result {
    let name = format!("{}_{}", METRIC_PREFIX, suffix);
    writeln!(out, "# HELP {} {}", name, help)?;
    writeln!(out, "# TYPE {} {}", name, kind)?;
    writeln!(out, "{} {}", name, value)
}
