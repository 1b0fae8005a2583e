use serde::Serialize;

// ─── Descriptors ─────────────────────────────────────────────────

/// Static identity of one exported metric and the `tcp_info` field
/// feeding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub unit: Option<&'static str>,
    #[serde(skip)]
    pub field: &'static str,
}

pub const TCP_RTT: Descriptor = Descriptor {
    name: "tcp_rtt",
    help: "tcp socket stats per flow latency[rtt]",
    unit: None,
    field: "rtt",
};

pub const TCP_CWND: Descriptor = Descriptor {
    name: "tcp_cwnd",
    help: "tcp socket per flow congestion window stats",
    unit: None,
    field: "snd_cwnd",
};

pub const TCP_DELIVERY_RATE: Descriptor = Descriptor {
    name: "tcp_delivery_rate",
    help: "tcp socket per flow delivery rate",
    unit: Some("bytes"),
    field: "delivery_rate",
};

pub const TCP_DATA_SEGS_IN: Descriptor = Descriptor {
    name: "tcp_data_segs_in",
    help: "tcp per flow received data segments",
    unit: Some("segments"),
    field: "data_segs_in",
};

pub const TCP_DATA_SEGS_OUT: Descriptor = Descriptor {
    name: "tcp_data_segs_out",
    help: "tcp per flow sent data segments",
    unit: Some("segments"),
    field: "data_segs_out",
};

pub const TCP_RTT_HIST: Descriptor = Descriptor {
    name: "tcp_rtt_hist",
    help: "tcp flows latency outline",
    unit: Some("ms"),
    field: "rtt",
};

// ─── Finalized families ──────────────────────────────────────────

/// Label dimension carried by every gauge and counter sample.
pub const FLOW_LABEL: &str = "flow";

/// Label names of a gauge or counter family, in sample order.
pub const FLOW_LABELS: &[&str] = &[FLOW_LABEL];

/// One value under one `flow` label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledSample {
    pub flow: String,
    pub value: f64,
}

/// A gauge or counter family: one sample per reported flow key, ordered
/// by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledFamily {
    #[serde(flatten)]
    pub descriptor: Descriptor,
    pub labels: &'static [&'static str],
    pub samples: Vec<LabeledSample>,
}

/// The unlabeled per-scrape histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramFamily {
    #[serde(flatten)]
    pub descriptor: Descriptor,
    /// `(upper bound, count)` pairs, `+Inf` last
    pub buckets: Vec<(String, u64)>,
    pub sum: u64,
}

/// A finalized family handed to the metrics transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricFamily {
    Gauge(LabeledFamily),
    Counter(LabeledFamily),
    Histogram(HistogramFamily),
}

impl MetricFamily {
    /// Exported metric name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gauge(f) | Self::Counter(f) => f.descriptor.name,
            Self::Histogram(f) => f.descriptor.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_serializes_for_transport() {
        let family = MetricFamily::Gauge(LabeledFamily {
            descriptor: TCP_DELIVERY_RATE,
            labels: FLOW_LABELS,
            samples: vec![LabeledSample {
                flow: "(SRC#a|1)(DST#b|2)".into(),
                value: 125.0,
            }],
        });

        let json = serde_json::to_value(&family).unwrap();
        assert_eq!(json["type"], "gauge");
        assert_eq!(json["name"], "tcp_delivery_rate");
        assert_eq!(json["unit"], "bytes");
        assert_eq!(json["labels"], serde_json::json!([FLOW_LABEL]));
        assert!(json.get("field").is_none());
        assert_eq!(json["samples"][0]["flow"], "(SRC#a|1)(DST#b|2)");
    }

    #[test]
    fn histogram_serializes_buckets_in_order() {
        let family = MetricFamily::Histogram(HistogramFamily {
            descriptor: TCP_RTT_HIST,
            buckets: vec![("1.0".into(), 0), ("+Inf".into(), 1)],
            sum: 1,
        });

        let json = serde_json::to_value(&family).unwrap();
        assert_eq!(json["type"], "histogram");
        assert_eq!(json["buckets"][1][0], "+Inf");
        assert_eq!(family.name(), "tcp_rtt_hist");
    }
}
