//! Published port discovery
//!
//! Parses the port summary a container runtime prints for
//! `ps --format={{.Ports}}`, e.g.
//!
//! ```text
//! 0.0.0.0:32808->8300/tcp, 0.0.0.0:32791->8301/udp, 0.0.0.0:32807->8301/tcp
//! ```
//!
//! into typed [`PortBinding`]s keyed by their position in the list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// `<bind>:<published>-><exposed>/<protocol>`; every group may be empty.
static PORT_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?P<bind>[^:]*):(?P<published>[^:]*)->(?P<exposed>[^/]*)/(?P<protocol>.*)$")
        .expect("port segment pattern is valid")
});

/// Fields captured from a single port-mapping segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMatch {
    /// Host address the port is bound on
    pub bind_host: String,
    /// Host-visible port assigned by the runtime
    pub published_port: String,
    /// Container-internal port
    pub exposed_port: String,
    /// Protocol token ("tcp", "udp", ...)
    pub protocol: String,
}

/// Match one trimmed segment against the port-mapping grammar.
///
/// Returns `None` when the segment does not have the
/// `<bind>:<published>-><exposed>/<protocol>` shape. Empty captures are
/// valid matches.
pub fn parse_port_segment(segment: &str) -> Option<PortMatch> {
    let caps = PORT_SEGMENT.captures(segment)?;
    Some(PortMatch {
        bind_host: caps["bind"].to_string(),
        published_port: caps["published"].to_string(),
        exposed_port: caps["exposed"].to_string(),
        protocol: caps["protocol"].to_string(),
    })
}

/// A published port of a running container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBinding {
    /// Position of the segment in the comma-separated summary
    pub index: usize,
    /// Host address the port is bound on
    pub bind_host: String,
    /// Host-visible port assigned by the runtime
    pub published_port: String,
    /// Container-internal port
    pub exposed_port: String,
    /// Protocol token
    pub protocol: String,
    /// The trimmed segment the binding was parsed from
    pub raw: String,
}

impl PortBinding {
    fn from_match(index: usize, raw: &str, m: PortMatch) -> Self {
        Self {
            index,
            bind_host: m.bind_host,
            published_port: m.published_port,
            exposed_port: m.exposed_port,
            protocol: m.protocol,
            raw: raw.to_string(),
        }
    }

    /// Connection URL `<scheme>://<bind>:<published>/`
    pub fn url(&self, scheme: &str) -> String {
        format!("{}://{}:{}/", scheme, self.bind_host, self.published_port)
    }

    /// Environment entries describing this binding.
    ///
    /// With `Some(i)` every key gets an `_<i>` suffix; with `None` the
    /// un-suffixed aliases are produced.
    pub fn env_entries(&self, suffix: Option<usize>) -> Vec<(String, String)> {
        let key = |name: &str| match suffix {
            Some(i) => format!("{}_{}", name, i),
            None => name.to_string(),
        };

        vec![
            (key("RAW_PORT"), self.raw.clone()),
            (key("PORT_TYPE"), self.protocol.clone()),
            (key("BIND"), self.bind_host.clone()),
            (key("PORT_EXPOSED"), self.exposed_port.clone()),
            (key("PORT"), self.published_port.clone()),
        ]
    }
}

/// All bindings parsed from one port summary, keyed by segment position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortTable {
    bindings: BTreeMap<usize, PortBinding>,
}

impl PortTable {
    /// Parse a full port summary.
    ///
    /// The summary is split on `,` and each segment trimmed. Segments that
    /// don't match the grammar are skipped without disturbing the indices of
    /// the others.
    pub fn parse(raw: &str) -> Self {
        let mut bindings = BTreeMap::new();

        for (index, segment) in raw.split(',').enumerate() {
            let segment = segment.trim();
            match parse_port_segment(segment) {
                Some(m) => {
                    bindings.insert(index, PortBinding::from_match(index, segment, m));
                }
                None if segment.is_empty() => {}
                None => debug!("Skipping unrecognized port segment {}: {:?}", index, segment),
            }
        }

        Self { bindings }
    }

    /// Binding parsed from the segment at `index`
    pub fn get(&self, index: usize) -> Option<&PortBinding> {
        self.bindings.get(&index)
    }

    /// Bindings in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = &PortBinding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The binding with the lowest index, used for the un-suffixed aliases
    pub fn primary(&self) -> Option<&PortBinding> {
        self.bindings.values().next()
    }
}
