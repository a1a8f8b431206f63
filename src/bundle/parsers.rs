//! Parsers for the text and JSON files found in a node folder

use super::error::{VerifyError, VerifyResult};
use procfs::FromRead;
use procfs::process::{LimitValue, Limits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Case-insensitive view over `key=value` / `key: value` lines.
///
/// Covers `os-release` and `os-info.txt`, which are section-less INI files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyValues {
    entries: HashMap<String, String>,
}

impl KeyValues {
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            // Split at whichever delimiter comes first
            let Some(split_at) = line.find(['=', ':']) else {
                continue;
            };
            let key = line[..split_at].trim().to_lowercase();
            let value = line[split_at + 1..].trim().to_string();
            if !key.is_empty() {
                entries.insert(key, value);
            }
        }

        Self { entries }
    }

    /// Raw value, quotes included
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Value with one pair of surrounding quotes removed
    pub fn get_unquoted(&self, key: &str) -> Option<&str> {
        self.get(key).map(unquote)
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Numeric value of a `/etc/debian_version` dump, e.g. `11.7`
pub fn parse_debian_version(content: &str) -> VerifyResult<f64> {
    let trimmed = content.trim();
    let not_numeric = || {
        VerifyError::parse_error(
            "debian_version",
            &format!("'{}' is not a numeric release", trimmed),
        )
    };
    let version = trimmed.parse::<f64>().map_err(|_| not_numeric())?;
    if !version.is_finite() {
        return Err(not_numeric());
    }
    Ok(version)
}

/// JMX dump written as `jmx_dump.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsDump {
    pub beans: Vec<Bean>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bean {
    pub name: String,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl MetricsDump {
    pub fn parse(content: &str) -> VerifyResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| VerifyError::parse_error("jmx_dump.json", &e.to_string()))
    }

    pub fn has_bean(&self, name: &str) -> bool {
        self.beans.iter().any(|bean| bean.name == name)
    }
}

/// Open file limits read from a `/proc/<pid>/limits` dump
#[derive(Debug, Clone, PartialEq)]
pub struct OpenFileLimits {
    pub soft: Option<u64>,
    pub hard: Option<u64>,
}

impl OpenFileLimits {
    /// `None` when the dump is not in the kernel's limits table format
    pub fn parse(content: &str) -> Option<Self> {
        // Every row of the kernel table has a name, two limits and usually a unit
        let table: String = content
            .lines()
            .filter(|line| line.split_whitespace().count() >= 4)
            .map(|line| format!("{}\n", line))
            .collect();
        let limits = Limits::from_read(table.as_bytes()).ok()?;
        Some(Self {
            soft: limit_value(&limits.max_open_files.soft_limit),
            hard: limit_value(&limits.max_open_files.hard_limit),
        })
    }
}

/// `None` stands for unlimited
fn limit_value(value: &LimitValue) -> Option<u64> {
    match value {
        LimitValue::Unlimited => None,
        LimitValue::Value(v) => Some(*v),
    }
}

impl std::fmt::Display for OpenFileLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let show = |v: Option<u64>| v.map_or_else(|| "unlimited".to_string(), |v| v.to_string());
        write!(
            f,
            "max open files soft={} hard={}",
            show(self.soft),
            show(self.hard)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OS_RELEASE: &str = r#"NAME="Ubuntu"
VERSION="18.04.5 LTS (Bionic Beaver)"
ID=ubuntu
ID_LIKE=debian
PRETTY_NAME="Ubuntu 18.04.5 LTS"
# comment line
HOME_URL="https://www.ubuntu.com/"
"#;

    #[test]
    fn test_key_values_os_release() {
        let kv = KeyValues::parse(OS_RELEASE);
        assert_eq!(kv.get("NAME"), Some("\"Ubuntu\""));
        assert_eq!(kv.get_unquoted("name"), Some("Ubuntu"));
        assert_eq!(kv.get("id_like"), Some("debian"));
        assert_eq!(kv.get_unquoted("home_url"), Some("https://www.ubuntu.com/"));
        assert_eq!(kv.get("# comment line"), None);
    }

    #[test]
    fn test_key_values_colon_delimiter() {
        let kv = KeyValues::parse("kernel_name: Linux\nmachine_type : x86_64\nnot a pair\n");
        assert_eq!(kv.get("kernel_name"), Some("Linux"));
        assert_eq!(kv.get("MACHINE_TYPE"), Some("x86_64"));
        assert_eq!(kv.get("not a pair"), None);
    }

    #[test]
    fn test_key_values_first_delimiter_wins() {
        let kv = KeyValues::parse("url=http://host:8080\n");
        assert_eq!(kv.get("url"), Some("http://host:8080"));
    }

    #[test]
    fn test_unquote_single_quote_and_lone_quote() {
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn test_debian_version() {
        assert_eq!(parse_debian_version("9").unwrap(), 9.0);
        assert_eq!(parse_debian_version("10.13").unwrap(), 10.13);
        assert_eq!(parse_debian_version("11.7\n").unwrap(), 11.7);
        assert!(parse_debian_version("bullseye/sid").is_err());
        assert!(parse_debian_version("").is_err());
        assert!(parse_debian_version("nan\n").is_err());
        assert!(parse_debian_version("inf").is_err());
        assert!(parse_debian_version("-infinity").is_err());
    }

    #[test]
    fn test_metrics_dump_keeps_attributes() {
        let dump = MetricsDump::parse(
            r#"{"beans": [
                {"name": "java.lang:type=Runtime", "modelerType": "sun.management.RuntimeImpl", "Uptime": 12345},
                {"name": "org.apache.cassandra.db:type=StorageService"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(dump.beans.len(), 2);
        assert!(dump.has_bean("org.apache.cassandra.db:type=StorageService"));
        assert!(!dump.has_bean("org.apache.cassandra.db:type=Storage"));
        assert_eq!(dump.beans[0].attributes["Uptime"], 12345);
    }

    #[test]
    fn test_metrics_dump_rejects_bad_shapes() {
        assert!(MetricsDump::parse("not json").is_err());
        assert!(MetricsDump::parse(r#"{"mbeans": []}"#).is_err());
        assert!(MetricsDump::parse(r#"{"beans": [{"value": 1}]}"#).is_err());
    }

    const PROC_LIMITS: &str = "\
Limit                     Soft Limit           Hard Limit           Units
Max cpu time              unlimited            unlimited            seconds
Max file size             unlimited            unlimited            bytes
Max data size             unlimited            unlimited            bytes
Max stack size            8388608              unlimited            bytes
Max core file size        0                    unlimited            bytes
Max resident set          unlimited            unlimited            bytes
Max processes             32768                32768                processes
Max open files            100000               100000               files
Max locked memory         unlimited            unlimited            bytes
Max address space         unlimited            unlimited            bytes
Max file locks            unlimited            unlimited            locks
Max pending signals       63448                63448                signals
Max msgqueue size         819200               819200               bytes
Max nice priority         0                    0
Max realtime priority     0                    0
Max realtime timeout      unlimited            unlimited            us
";

    #[test]
    fn test_open_file_limits_from_kernel_table() {
        let limits = OpenFileLimits::parse(PROC_LIMITS).unwrap();
        assert_eq!(limits.soft, Some(100000));
        assert_eq!(limits.hard, Some(100000));
    }

    #[test]
    fn test_open_file_limits_from_non_table_text() {
        assert_eq!(OpenFileLimits::parse("Max open files\nMax file locks\n"), None);
    }

    #[test]
    fn test_open_file_limits_display() {
        let limits = OpenFileLimits {
            soft: Some(100000),
            hard: None,
        };
        assert_eq!(
            limits.to_string(),
            "max open files soft=100000 hard=unlimited"
        );
    }
}
