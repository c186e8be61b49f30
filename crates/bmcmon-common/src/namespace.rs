//! Hierarchical metric namespace paths.
//!
//! Every metric the collector exposes is addressed by a path of the form
//! `bmc/ipmi/<host>/<metrics-root>[/<sub-metric>]`. The sub-metric segment
//! is omitted when a decoder declares the empty metric name, which is the
//! reserved convention for "this command's primary value has no sub-label".

/// Fixed namespace prefix shared by all metrics this collector produces.
pub const NAMESPACE_PREFIX: [&str; 2] = ["bmc", "ipmi"];

/// Appends `ext` to `path` with a `/` separator.
///
/// An empty `ext` leaves the path unchanged, so empty metric names land
/// directly under their metrics root.
///
/// # Examples
///
/// ```
/// use bmcmon_common::namespace::extend_path;
///
/// assert_eq!(extend_path("node1/power", "min"), "node1/power/min");
/// assert_eq!(extend_path("node1/power", ""), "node1/power");
/// ```
pub fn extend_path(path: &str, ext: &str) -> String {
    if ext.is_empty() {
        path.to_string()
    } else {
        format!("{path}/{ext}")
    }
}

/// Builds a full namespace path from a prefix-relative metric path.
pub fn make_name(metric: &str) -> String {
    let mut name = NAMESPACE_PREFIX.join("/");
    name.push('/');
    name.push_str(metric);
    name
}

/// Strips the fixed prefix, returning the `<host>/<root>[/<sub>]` remainder.
///
/// Returns `None` when `namespace` does not start with the prefix.
pub fn parse_name(namespace: &str) -> Option<&str> {
    let mut rest = namespace;
    for segment in NAMESPACE_PREFIX {
        rest = rest.strip_prefix(segment)?.strip_prefix('/')?;
    }
    Some(rest)
}

/// Splits a prefix-relative path into its host and host-relative remainder.
pub fn split_host(relative: &str) -> Option<(&str, &str)> {
    relative.split_once('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_and_parse_round_trip() {
        let name = make_name("node1/power/min");
        assert_eq!(name, "bmc/ipmi/node1/power/min");
        assert_eq!(parse_name(&name), Some("node1/power/min"));
    }

    #[test]
    fn parse_rejects_foreign_prefix() {
        assert_eq!(parse_name("other/tree/node1/power"), None);
        assert_eq!(parse_name("bmc/node1/power"), None);
    }

    #[test]
    fn extend_path_skips_empty_segment() {
        assert_eq!(extend_path("node1", "power"), "node1/power");
        assert_eq!(extend_path("node1/power", ""), "node1/power");
    }

    #[test]
    fn split_host_separates_first_segment() {
        assert_eq!(split_host("node1/power/min"), Some(("node1", "power/min")));
        assert_eq!(split_host("node1"), None);
    }
}
