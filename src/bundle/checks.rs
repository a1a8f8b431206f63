use super::error::{VerifyError, VerifyResult};
use serde::{Deserialize, Serialize};

pub const CASSANDRA_DAEMON_CLASS: &str = "org.apache.cassandra.service.CassandraDaemon";
pub const DEFAULT_METRICS_FILE: &str = "jmx_dump.json";

/// One verification step of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "check")]
pub enum Check {
    /// The artifact root exists and is a directory
    ArtifactsAvailable,
    /// Exactly `expected` folders exist in `<root>/<subdirectory>`;
    /// an empty `subdirectory` is the configured nodes folder
    NodeCount {
        #[serde(default)]
        subdirectory: String,
        expected: usize,
    },
    /// `<node>/<subdirectory>/<file>` exists for every node
    FileInEachNode {
        file: String,
        #[serde(default)]
        subdirectory: String,
    },
    /// The first node's metrics dump is valid JSON with a `beans` list
    MetricsParse,
    /// The first node's metrics dump contains a bean with this exact name
    BeanPresent { name: String },
    /// Content of a well-known collected file, checked on the selected nodes
    Content { file: String },
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Check::ArtifactsAvailable => write!(f, "artifacts are available"),
            Check::NodeCount {
                subdirectory,
                expected,
            } if subdirectory.is_empty() => write!(f, "{} node folders exist", expected),
            Check::NodeCount {
                subdirectory,
                expected,
            } => write!(f, "{} folders exist in {}", expected, subdirectory),
            Check::FileInEachNode { file, subdirectory } if subdirectory.is_empty() => {
                write!(f, "{} exists for each node", file)
            }
            Check::FileInEachNode { file, subdirectory } => {
                write!(f, "{}/{} exists for each node", subdirectory, file)
            }
            Check::MetricsParse => write!(f, "metrics file of the first node parses"),
            Check::BeanPresent { name } => write!(f, "bean {} is in the metrics file", name),
            Check::Content { file } => write!(f, "content of {} is valid", file),
        }
    }
}

/// Content checks known by file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCheck {
    OsRelease,
    OsInfo,
    DebianVersion,
    JavaCmdline,
    JavaVersion,
    ProcessLimits,
    PsAux,
}

impl ContentCheck {
    pub const ALL: [ContentCheck; 7] = [
        ContentCheck::OsRelease,
        ContentCheck::OsInfo,
        ContentCheck::DebianVersion,
        ContentCheck::JavaCmdline,
        ContentCheck::JavaVersion,
        ContentCheck::ProcessLimits,
        ContentCheck::PsAux,
    ];

    pub fn from_filename(file: &str) -> VerifyResult<Self> {
        Self::ALL
            .into_iter()
            .find(|check| check.file_name() == file)
            .ok_or_else(|| VerifyError::UnknownContentCheck(file.to_string()))
    }

    /// Name used to select the check
    pub fn file_name(&self) -> &'static str {
        match self {
            ContentCheck::OsRelease => "os-release",
            ContentCheck::OsInfo => "os-info.txt",
            ContentCheck::DebianVersion => "debian_version",
            ContentCheck::JavaCmdline => "java_cmdline",
            ContentCheck::JavaVersion => "java_version.txt",
            ContentCheck::ProcessLimits => "process_limits",
            ContentCheck::PsAux => "ps-aux.txt",
        }
    }

    /// Location of the file inside a node folder
    pub fn relative_path(&self) -> &'static str {
        match self {
            ContentCheck::PsAux => "os-metrics/ps-aux.txt",
            other => other.file_name(),
        }
    }
}

/// Values the content checks compare against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expectations {
    /// `NAME` in os-release, without quotes
    pub os_name: String,
    /// `kernel_name` in os-info.txt
    pub kernel_name: String,
    pub min_debian_version: f64,
    /// Marker expected in java_cmdline and ps-aux.txt
    pub daemon_class: String,
    /// Substring of java_version.txt
    pub java_version: String,
    /// Rows that must appear in process_limits
    pub limits: Vec<String>,
    pub metrics_file: String,
    /// Beans the default plan looks for
    pub beans: Vec<String>,
    /// Files the default plan expects in every node, relative to the node folder
    pub node_files: Vec<String>,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            os_name: "Ubuntu".to_string(),
            kernel_name: "Linux".to_string(),
            min_debian_version: 9.0,
            daemon_class: CASSANDRA_DAEMON_CLASS.to_string(),
            java_version: "1.8.0".to_string(),
            limits: vec!["Max open files".to_string(), "Max file locks".to_string()],
            metrics_file: DEFAULT_METRICS_FILE.to_string(),
            beans: Vec::new(),
            node_files: vec![
                "os-release".to_string(),
                "os-info.txt".to_string(),
                "java_cmdline".to_string(),
                "java_version.txt".to_string(),
                "process_limits".to_string(),
                "os-metrics/ps-aux.txt".to_string(),
                DEFAULT_METRICS_FILE.to_string(),
            ],
        }
    }
}
