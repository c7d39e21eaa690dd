// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The full gateway command, delivered once over the watchdog process's
/// stdin by whoever spawned it (the Reconciler). Never placed on the
/// watchdog's own argv — that's exactly the leak the original's
/// cmdline-scraping approach had to avoid, and it's why this spec arrives
/// over a pipe instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySpawnSpec {
    /// Path to the real gateway executable (e.g. the UG or RG binary).
    pub program: String,
    /// Full argv for the gateway child, `-K`/`-P` values included. Split
    /// into non-sensitive argv and a sensitive stdin blob by
    /// [`split_sensitive_args`] before the child is ever spawned.
    pub args: Vec<String>,
    /// The binary name this watchdog rewrites its own title to, matching
    /// `GatewayKind::watchdog_binary()` (e.g. `"syndicate-ug"`).
    pub watchdog_binary: String,
    /// Attributes encoded into this watchdog's own process title, e.g.
    /// `volume` and (for UG) `mountpoint`.
    pub title_attrs: BTreeMap<String, String>,
}

impl GatewaySpawnSpec {
    /// The discoverable process title: `"<binary> attr:k=v attr:k=v ..."`.
    pub fn process_title(&self) -> String {
        let mut title = self.watchdog_binary.clone();
        for (key, value) in &self.title_attrs {
            title.push_str(&format!(" attr:{key}={value}"));
        }
        title
    }
}

/// Flags whose *value* (the following argv element) must never reach the
/// child's argv, per the gateway binary contract.
const SENSITIVE_FLAGS: &[&str] = &["-K", "-P"];

/// Split a gateway argv into what stays on the child's argv and what must
/// instead go over the child's stdin as JSON (`{"K": ..., "P": ...}`).
pub fn split_sensitive_args(args: &[String]) -> (Vec<String>, serde_json::Value) {
    let mut non_sensitive = Vec::with_capacity(args.len());
    let mut sensitive = serde_json::Map::new();
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        if let Some(flag) = SENSITIVE_FLAGS.iter().find(|f| *f == arg) {
            if let Some(value) = iter.next() {
                sensitive.insert(flag.trim_start_matches('-').to_string(), serde_json::Value::String(value.clone()));
            }
            continue;
        }
        non_sensitive.push(arg.clone());
    }
    (non_sensitive, serde_json::Value::Object(sensitive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_sensitive_flags_out_of_argv() {
        let args = vec![
            "-m".to_string(), "https://obs".to_string(),
            "-K".to_string(), "keypass".to_string(),
            "-v".to_string(), "v1".to_string(),
            "-P".to_string(), "-----BEGIN KEY-----".to_string(),
        ];
        let (non_sensitive, sensitive) = split_sensitive_args(&args);
        assert_eq!(non_sensitive, vec!["-m", "https://obs", "-v", "v1"]);
        assert_eq!(sensitive["K"], "keypass");
        assert_eq!(sensitive["P"], "-----BEGIN KEY-----");
    }

    #[test]
    fn process_title_encodes_attrs_sorted_by_key() {
        let spec = GatewaySpawnSpec {
            program: "/usr/bin/syndicate-ug".to_string(),
            args: vec![],
            watchdog_binary: "syndicate-ug".to_string(),
            title_attrs: BTreeMap::from([
                ("volume".to_string(), "v1".to_string()),
                ("mountpoint".to_string(), "/tmp/syndicate-mounts/v1".to_string()),
            ]),
        };
        assert_eq!(spec.process_title(), "syndicate-ug attr:mountpoint=/tmp/syndicate-mounts/v1 attr:volume=v1");
    }

    #[test]
    fn round_trips_through_json() {
        let spec = GatewaySpawnSpec {
            program: "/usr/bin/syndicate-rg".to_string(),
            args: vec!["-v".to_string(), "v1".to_string()],
            watchdog_binary: "syndicate-rg".to_string(),
            title_attrs: BTreeMap::from([("volume".to_string(), "v1".to_string())]),
        };
        let json = serde_json::to_string(&spec).expect("serialize");
        let back: GatewaySpawnSpec = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.program, spec.program);
        assert_eq!(back.title_attrs, spec.title_attrs);
    }
}
