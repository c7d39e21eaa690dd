// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::probe::{ProcessInfo, ProcessProbe};

/// Parse a rewritten process title of the form
/// `"<binary> attr:k1=v1 attr:k2=v2 ..."` into its binary name and attr map.
/// Tokens that aren't `attr:key=value` are ignored; a repeated key keeps its
/// last occurrence.
fn parse_title(title: &str) -> (&str, HashMap<&str, &str>) {
    let mut tokens = title.split_whitespace();
    let binary = tokens.next().unwrap_or("");
    let mut attrs = HashMap::new();
    for token in tokens {
        if let Some(rest) = token.strip_prefix("attr:") {
            if let Some((key, value)) = rest.split_once('=') {
                attrs.insert(key, value);
            }
        }
    }
    (binary, attrs)
}

fn matches(process: &ProcessInfo, watchdog_binary_name: &str, required_attrs: &HashMap<String, String>) -> bool {
    let Some(title) = process.cmdline.first() else {
        return false;
    };
    let (binary, attrs) = parse_title(title);
    if binary != watchdog_binary_name {
        return false;
    }
    required_attrs.iter().all(|(key, value)| attrs.get(key.as_str()) == Some(&value.as_str()))
}

/// Finds running watchdogs by binary name and attribute set, reading
/// process titles rewritten per the convention in
/// [`crate::watchdog::Watchdog`].
#[derive(Debug, Default)]
pub struct GatewayRegistry {
    probe: ProcessProbe,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self { probe: ProcessProbe::new() }
    }

    /// PIDs of every live process whose title starts with
    /// `watchdog_binary_name` and whose attrs are a superset of
    /// `required_attrs`.
    pub fn find(&self, watchdog_binary_name: &str, required_attrs: &HashMap<String, String>) -> Vec<i32> {
        find_in(&self.probe.list_processes(), watchdog_binary_name, required_attrs)
    }

    /// Every live watchdog of the given binary, with its full attr map —
    /// used to find gateways that are running but no longer in the target
    /// set, which `find` (a required-attrs lookup) can't enumerate.
    pub fn list(&self, watchdog_binary_name: &str) -> Vec<(i32, HashMap<String, String>)> {
        list_in(&self.probe.list_processes(), watchdog_binary_name)
    }
}

/// Pure listing logic over an already-fetched process list.
pub fn list_in(processes: &[ProcessInfo], watchdog_binary_name: &str) -> Vec<(i32, HashMap<String, String>)> {
    processes
        .iter()
        .filter_map(|p| {
            let title = p.cmdline.first()?;
            let (binary, attrs) = parse_title(title);
            if binary != watchdog_binary_name {
                return None;
            }
            Some((p.pid, attrs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()))
        })
        .collect()
}

/// Pure matching logic over an already-fetched process list, split out so
/// it's testable without touching the real process table.
pub fn find_in(processes: &[ProcessInfo], watchdog_binary_name: &str, required_attrs: &HashMap<String, String>) -> Vec<i32> {
    processes
        .iter()
        .filter(|p| matches(p, watchdog_binary_name, required_attrs))
        .map(|p| p.pid)
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn attr_tokens_round_trip(
            binary in "[a-zA-Z][a-zA-Z0-9_-]{0,12}",
            attrs in prop::collection::hash_map("[a-zA-Z][a-zA-Z0-9_]{0,8}", "[a-zA-Z0-9_./-]{0,12}", 0..5),
        ) {
            let mut title = binary.clone();
            for (key, value) in &attrs {
                title.push_str(&format!(" attr:{key}={value}"));
            }
            let (parsed_binary, parsed_attrs) = parse_title(&title);
            prop_assert_eq!(parsed_binary, binary.as_str());
            prop_assert_eq!(parsed_attrs.len(), attrs.len());
            for (key, value) in &attrs {
                prop_assert_eq!(parsed_attrs.get(key.as_str()), Some(&value.as_str()));
            }
        }
    }

    fn proc(pid: i32, title: &str) -> ProcessInfo {
        ProcessInfo { pid, cmdline: vec![title.to_string()] }
    }

    #[test]
    fn matches_binary_and_required_attrs() {
        let processes = vec![
            proc(1, "syndicate-ug attr:volume=v1 attr:mountpoint=/mnt/v1"),
            proc(2, "syndicate-rg attr:volume=v1"),
            proc(3, "unrelated-binary attr:volume=v1"),
        ];
        let mut required = HashMap::new();
        required.insert("volume".to_string(), "v1".to_string());
        let found = find_in(&processes, "syndicate-ug", &required);
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn required_attrs_are_a_subset_match() {
        let processes = vec![proc(1, "syndicate-ug attr:volume=v1 attr:mountpoint=/mnt/v1 attr:extra=z")];
        let mut required = HashMap::new();
        required.insert("volume".to_string(), "v1".to_string());
        assert_eq!(find_in(&processes, "syndicate-ug", &required), vec![1]);
    }

    #[test]
    fn missing_required_attr_excludes() {
        let processes = vec![proc(1, "syndicate-ug attr:volume=v1")];
        let mut required = HashMap::new();
        required.insert("mountpoint".to_string(), "/mnt/v1".to_string());
        assert!(find_in(&processes, "syndicate-ug", &required).is_empty());
    }

    #[test]
    fn duplicate_attr_keeps_last_value() {
        let (_, attrs) = parse_title("syndicate-ug attr:volume=old attr:volume=new");
        assert_eq!(attrs.get("volume"), Some(&"new"));
    }

    #[test]
    fn empty_cmdline_never_matches() {
        let processes = vec![ProcessInfo { pid: 1, cmdline: vec![] }];
        assert!(find_in(&processes, "syndicate-ug", &HashMap::new()).is_empty());
    }

    #[test]
    fn list_returns_every_matching_binary_with_its_attrs() {
        let processes = vec![
            proc(1, "syndicate-rg attr:volume=v1"),
            proc(2, "syndicate-rg attr:volume=v2"),
            proc(3, "syndicate-ug attr:volume=v1"),
        ];
        let mut rgs = list_in(&processes, "syndicate-rg");
        rgs.sort_by_key(|(pid, _)| *pid);
        assert_eq!(rgs.len(), 2);
        assert_eq!(rgs[0].1.get("volume"), Some(&"v1".to_string()));
        assert_eq!(rgs[1].1.get("volume"), Some(&"v2".to_string()));
    }
}
