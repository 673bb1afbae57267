//! Typed view over the payload shape produced by the instrumentation engine.
//!
//! The engine emits a mapping from call edges (`"parent==>child"`, or just
//! `"child"` for the root) to a map of metric counters such as `ct` (call
//! count) and `wt` (wall time). The store itself never looks inside a
//! payload; this module exists for callers that want to build or inspect one.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::Payload;

/// Separator between caller and callee in an edge key.
pub const EDGE_SEPARATOR: &str = "==>";

/// Metric counters recorded for a single call edge.
pub type Metrics = BTreeMap<String, i64>;

/// A caller/callee pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallEdge {
    /// The calling function, `None` for the root of the call graph.
    pub parent: Option<String>,
    /// The called function.
    pub child: String,
}

impl CallEdge {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            child: child.into(),
        }
    }

    pub fn root(child: impl Into<String>) -> Self {
        Self {
            parent: None,
            child: child.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Display for CallEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{parent}{EDGE_SEPARATOR}{}", self.child),
            None => f.write_str(&self.child),
        }
    }
}

impl FromStr for CallEdge {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(EDGE_SEPARATOR) {
            Some((parent, child)) => {
                if parent.is_empty() || child.is_empty() || child.contains(EDGE_SEPARATOR) {
                    return Err(TypeError::InvalidCallEdge(s.to_string()));
                }
                Ok(Self::new(parent, child))
            }
            None if s.is_empty() => Err(TypeError::InvalidCallEdge(s.to_string())),
            None => Ok(Self::root(s)),
        }
    }
}

/// Call-edge keyed profile, the usual content of a run payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileData {
    edges: BTreeMap<String, Metrics>,
}

impl ProfileData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `metric` on `edge`, replacing any previous value.
    pub fn record(&mut self, edge: &CallEdge, metric: impl Into<String>, value: i64) {
        self.edges
            .entry(edge.to_string())
            .or_default()
            .insert(metric.into(), value);
    }

    /// Metrics recorded for `edge`.
    pub fn metrics(&self, edge: &CallEdge) -> Option<&Metrics> {
        self.edges.get(&edge.to_string())
    }

    /// Iterate edges with their metrics. Keys that do not parse as call
    /// edges are skipped.
    pub fn edges(&self) -> impl Iterator<Item = (CallEdge, &Metrics)> {
        self.edges
            .iter()
            .filter_map(|(key, metrics)| key.parse().ok().map(|edge| (edge, metrics)))
    }

    /// Value of `metric` summed over all root edges, e.g. total wall time.
    pub fn root_total(&self, metric: &str) -> i64 {
        self.edges()
            .filter(|(edge, _)| edge.is_root())
            .filter_map(|(_, metrics)| metrics.get(metric))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Convert to an opaque payload for storage.
    pub fn to_payload(&self) -> Result<Payload, TypeError> {
        serde_json::to_value(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Interpret an opaque payload as a profile.
    pub fn from_payload(payload: &Payload) -> Result<Self, TypeError> {
        Self::deserialize(payload).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_edge_with_parent() {
        let edge: CallEdge = "main()==>foo".parse().unwrap();
        assert_eq!(edge.parent.as_deref(), Some("main()"));
        assert_eq!(edge.child, "foo");
        assert!(!edge.is_root());
        assert_eq!(edge.to_string(), "main()==>foo");
    }

    #[test]
    fn parse_root_edge() {
        let edge: CallEdge = "main()".parse().unwrap();
        assert!(edge.is_root());
        assert_eq!(edge.to_string(), "main()");
    }

    #[test]
    fn reject_malformed_edges() {
        assert!("".parse::<CallEdge>().is_err());
        assert!("==>foo".parse::<CallEdge>().is_err());
        assert!("main()==>".parse::<CallEdge>().is_err());
        assert!("a==>b==>c".parse::<CallEdge>().is_err());
    }

    #[test]
    fn record_and_read_metrics() {
        let mut profile = ProfileData::new();
        let edge = CallEdge::new("main()", "foo");
        profile.record(&edge, "ct", 1);
        profile.record(&edge, "wt", 120);
        profile.record(&edge, "wt", 130);

        let metrics = profile.metrics(&edge).unwrap();
        assert_eq!(metrics["ct"], 1);
        assert_eq!(metrics["wt"], 130);
        assert_eq!(profile.len(), 1);
    }

    #[test]
    fn root_total_sums_root_edges_only() {
        let mut profile = ProfileData::new();
        profile.record(&CallEdge::root("main()"), "wt", 500);
        profile.record(&CallEdge::new("main()", "foo"), "wt", 120);
        assert_eq!(profile.root_total("wt"), 500);
        assert_eq!(profile.root_total("cpu"), 0);
    }

    #[test]
    fn payload_shape_matches_engine_output() {
        let mut profile = ProfileData::new();
        let edge = CallEdge::new("main", "foo");
        profile.record(&edge, "ct", 1);
        profile.record(&edge, "wt", 120);

        let payload = profile.to_payload().unwrap();
        assert_eq!(payload, json!({"main==>foo": {"ct": 1, "wt": 120}}));

        let back = ProfileData::from_payload(&payload).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn from_payload_rejects_other_shapes() {
        assert!(ProfileData::from_payload(&json!([1, 2, 3])).is_err());
        assert!(ProfileData::from_payload(&json!({"main": {"wt": "slow"}})).is_err());
    }

    #[test]
    fn edges_skips_unparseable_keys() {
        let payload = json!({"": {"ct": 1}, "main()": {"ct": 1}});
        let profile = ProfileData::from_payload(&payload).unwrap();
        assert_eq!(profile.len(), 2);
        assert_eq!(profile.edges().count(), 1);
    }
}
