use super::checks::{Check, ContentCheck, Expectations};
use super::error::{VerifyError, VerifyResult};
use super::layout::{ArtifactLayout, NodeSelection};
use super::parsers::{KeyValues, MetricsDump, OpenFileLimits, parse_debian_version};
use crate::display::format_bytes;
use crate::report::{CheckOutcome, Evidence};
use crate::system::FilesystemReader;
use tracing::{debug, warn};

/// Longest excerpt of file content quoted in a failure reason
const EXCERPT_LEN: usize = 60;

/// Runs checks against one artifact directory
pub struct BundleVerifier<F: FilesystemReader> {
    filesystem_reader: F,
    layout: ArtifactLayout,
    selection: NodeSelection,
    expectations: Expectations,
}

impl<F: FilesystemReader> BundleVerifier<F> {
    pub fn new(filesystem_reader: F, layout: ArtifactLayout) -> Self {
        Self {
            filesystem_reader,
            layout,
            selection: NodeSelection::default(),
            expectations: Expectations::default(),
        }
    }

    pub fn with_selection(mut self, selection: NodeSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_expectations(mut self, expectations: Expectations) -> Self {
        self.expectations = expectations;
        self
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn selection(&self) -> NodeSelection {
        self.selection
    }

    /// Execute one check and record its outcome
    pub fn run(&self, check: &Check) -> CheckOutcome {
        debug!(check = %check, "running check");
        let result = match check {
            Check::ArtifactsAvailable => self.check_artifacts_available(),
            Check::NodeCount {
                subdirectory,
                expected,
            } => self.check_node_count(subdirectory, *expected),
            Check::FileInEachNode { file, subdirectory } => {
                self.check_file_in_each_node(file, subdirectory)
            }
            Check::MetricsParse => self.check_metrics_parse(),
            Check::BeanPresent { name } => self.check_bean_present(name),
            Check::Content { file } => self.check_content(file),
        };

        match result {
            Ok(evidence) => CheckOutcome::passed(check.clone(), evidence),
            Err(e) => {
                warn!(check = %check, error = %e, "check failed");
                CheckOutcome::failed(check.clone(), &e)
            }
        }
    }

    pub fn run_all(&self, checks: &[Check]) -> Vec<CheckOutcome> {
        checks.iter().map(|check| self.run(check)).collect()
    }

    pub fn check_artifacts_available(&self) -> VerifyResult<Evidence> {
        let root = self.layout.root();
        if !self.filesystem_reader.is_dir(root) {
            return Err(VerifyError::artifact_dir_missing(root));
        }
        Ok(Evidence::default())
    }

    pub fn check_node_count(&self, subdirectory: &str, expected: usize) -> VerifyResult<Evidence> {
        let subdirectory = if subdirectory.is_empty() {
            self.layout.nodes_dir()
        } else {
            subdirectory
        };
        let folders = self
            .layout
            .list_folders(&self.filesystem_reader, subdirectory)?;
        debug!(subdirectory, count = folders.len(), "listed folders");

        if folders.len() != expected {
            return Err(VerifyError::node_count_mismatch(
                subdirectory,
                expected,
                folders.len(),
            ));
        }
        Ok(Evidence::nodes(folders))
    }

    pub fn check_file_in_each_node(&self, file: &str, subdirectory: &str) -> VerifyResult<Evidence> {
        let nodes = self.layout.list_nodes(&self.filesystem_reader)?;
        let mut total_size = 0u64;

        for node in &nodes {
            let path = self.layout.node_file(node, subdirectory).join(file);
            if !self.filesystem_reader.is_file(&path) {
                return Err(VerifyError::missing_file(node, &path));
            }
            total_size += self.filesystem_reader.file_size(&path).unwrap_or(0);
        }

        Ok(Evidence::nodes(nodes).with_detail(format!("{} in total", format_bytes(total_size))))
    }

    /// Parse the metrics dump of the first node
    pub fn load_metrics_of_first_node(&self) -> VerifyResult<(String, MetricsDump)> {
        let node = self.layout.first_node(&self.filesystem_reader)?;
        let content = self.read_node_file(&node, &self.expectations.metrics_file)?;
        let dump = MetricsDump::parse(&content)?;
        Ok((node, dump))
    }

    pub fn check_metrics_parse(&self) -> VerifyResult<Evidence> {
        let (node, dump) = self.load_metrics_of_first_node()?;
        Ok(Evidence::nodes(vec![node]).with_detail(format!("{} beans", dump.beans.len())))
    }

    pub fn check_bean_present(&self, name: &str) -> VerifyResult<Evidence> {
        let (node, dump) = self.load_metrics_of_first_node()?;
        if !dump.has_bean(name) {
            return Err(VerifyError::bean_not_found(&node, name));
        }
        Ok(Evidence::nodes(vec![node]))
    }

    /// Check a well-known file on the selected nodes
    pub fn check_content(&self, file: &str) -> VerifyResult<Evidence> {
        let content_check = ContentCheck::from_filename(file)?;
        let nodes = self.layout.list_nodes(&self.filesystem_reader)?;
        let selected = self.selection.select(&nodes);

        let mut details = Vec::new();
        for node in &selected {
            if let Some(detail) = self.verify_content(content_check, node)? {
                details.push(format!("{}: {}", node, detail));
            }
        }

        let evidence = Evidence::nodes(selected);
        if details.is_empty() {
            Ok(evidence)
        } else {
            Ok(evidence.with_detail(details.join("; ")))
        }
    }

    fn verify_content(&self, check: ContentCheck, node: &str) -> VerifyResult<Option<String>> {
        let file = check.file_name();
        let content = self.read_node_file(node, check.relative_path())?;
        let expectations = &self.expectations;

        match check {
            ContentCheck::OsRelease => {
                expect_key(node, file, &content, "NAME", &expectations.os_name)?;
                Ok(None)
            }
            ContentCheck::OsInfo => {
                expect_key(node, file, &content, "kernel_name", &expectations.kernel_name)?;
                Ok(None)
            }
            ContentCheck::DebianVersion => {
                let version = parse_debian_version(&content)?;
                if version < expectations.min_debian_version {
                    return Err(VerifyError::content_mismatch(
                        node,
                        file,
                        &format!(">= {}", expectations.min_debian_version),
                        &version.to_string(),
                    ));
                }
                Ok(Some(format!("version {}", version)))
            }
            ContentCheck::JavaCmdline | ContentCheck::PsAux => {
                expect_contains(node, file, &content, &expectations.daemon_class)?;
                Ok(None)
            }
            ContentCheck::JavaVersion => {
                expect_contains(node, file, &content, &expectations.java_version)?;
                Ok(None)
            }
            ContentCheck::ProcessLimits => {
                for marker in &expectations.limits {
                    expect_contains(node, file, &content, marker)?;
                }
                match OpenFileLimits::parse(&content) {
                    Some(limits) => Ok(Some(limits.to_string())),
                    None => {
                        debug!(node, "process_limits is not a kernel limits table");
                        Ok(None)
                    }
                }
            }
        }
    }

    fn read_node_file(&self, node: &str, relative: &str) -> VerifyResult<String> {
        let path = self.layout.node_file(node, relative);
        if !self.filesystem_reader.is_file(&path) {
            return Err(VerifyError::missing_file(node, &path));
        }
        self.filesystem_reader
            .read_to_string(&path)
            .map_err(|e| VerifyError::filesystem_error(&path, "read", &e.to_string()))
    }
}

/// `key` must be present in a key/value file with exactly the expected value
fn expect_key(node: &str, file: &str, content: &str, key: &str, expected: &str) -> VerifyResult<()> {
    let values = KeyValues::parse(content);
    let found = values.get_unquoted(key);
    if found != Some(expected) {
        return Err(VerifyError::content_mismatch(
            node,
            file,
            &format!("{}={}", key, expected),
            found.unwrap_or("<missing>"),
        ));
    }
    Ok(())
}

fn expect_contains(node: &str, file: &str, content: &str, marker: &str) -> VerifyResult<()> {
    if !content.contains(marker) {
        return Err(VerifyError::content_mismatch(
            node,
            file,
            &format!("'{}'", marker),
            &excerpt(content),
        ));
    }
    Ok(())
}

/// First line of `content`, shortened for messages
fn excerpt(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return "<empty>".to_string();
    }
    if first_line.chars().count() > EXCERPT_LEN {
        let cut: String = first_line.chars().take(EXCERPT_LEN).collect();
        format!("'{}…'", cut)
    } else {
        format!("'{}'", first_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::data::{DEMO_ROOT, demo_bundle};
    use crate::report::CheckStatus;
    use crate::system::filesystem::DemoFilesystemReader;
    use std::path::Path;

    fn verifier(reader: DemoFilesystemReader) -> BundleVerifier<DemoFilesystemReader> {
        BundleVerifier::new(reader, ArtifactLayout::new(DEMO_ROOT))
            .with_selection(NodeSelection::All)
    }

    fn node_file(node: &str, relative: &str) -> String {
        format!("{}/nodes/{}/{}", DEMO_ROOT, node, relative)
    }

    #[test]
    fn test_artifacts_available() {
        assert!(verifier(demo_bundle()).check_artifacts_available().is_ok());

        let missing = BundleVerifier::new(demo_bundle(), ArtifactLayout::new("/nowhere"));
        assert_eq!(
            missing.check_artifacts_available(),
            Err(VerifyError::artifact_dir_missing(Path::new("/nowhere")))
        );
    }

    #[test]
    fn test_node_count() {
        let verifier = verifier(demo_bundle());
        let evidence = verifier.check_node_count("nodes", 3).unwrap();
        assert_eq!(evidence.nodes.len(), 3);
        assert_eq!(
            verifier.check_node_count("nodes", 2),
            Err(VerifyError::node_count_mismatch("nodes", 2, 3))
        );
    }

    #[test]
    fn test_node_count_ignores_hidden_folders() {
        let reader = demo_bundle().with_file(node_file(".snapshot", "os-release"), "NAME=x");
        assert!(verifier(reader).check_node_count("nodes", 3).is_ok());
    }

    #[test]
    fn test_file_in_each_node_reports_missing_node() {
        let mut reader = demo_bundle();
        let missing = node_file("10.0.0.2", "os-metrics/ps-aux.txt");
        reader.remove_file(Path::new(&missing));

        let verifier = verifier(reader);
        assert!(verifier.check_file_in_each_node("os-release", "").is_ok());
        assert_eq!(
            verifier.check_file_in_each_node("ps-aux.txt", "os-metrics"),
            Err(VerifyError::missing_file("10.0.0.2", Path::new(&missing)))
        );
    }

    #[test]
    fn test_file_in_each_node_rejects_directory() {
        let verifier = verifier(demo_bundle());
        assert!(matches!(
            verifier.check_file_in_each_node("os-metrics", ""),
            Err(VerifyError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_file_in_each_node_needs_at_least_one_node() {
        let reader =
            DemoFilesystemReader::new().with_file(format!("{}/nodes/.keep", DEMO_ROOT), "");
        assert_eq!(
            verifier(reader).check_file_in_each_node("os-release", ""),
            Err(VerifyError::no_nodes(Path::new(&format!("{}/nodes", DEMO_ROOT))))
        );
    }

    #[test]
    fn test_bean_present_exact_match() {
        let verifier = verifier(demo_bundle());
        assert!(verifier.check_metrics_parse().is_ok());
        assert!(
            verifier
                .check_bean_present("org.apache.cassandra.db:type=StorageService")
                .is_ok()
        );
        assert_eq!(
            verifier.check_bean_present("org.apache.cassandra.db:type=Storage"),
            Err(VerifyError::bean_not_found(
                "10.0.0.1",
                "org.apache.cassandra.db:type=Storage"
            ))
        );
    }

    #[test]
    fn test_metrics_parse_failure() {
        let reader =
            demo_bundle().with_file(node_file("10.0.0.1", "jmx_dump.json"), "{\"beans\": 3}");
        assert!(matches!(
            verifier(reader).check_metrics_parse(),
            Err(VerifyError::Parse { .. })
        ));
    }

    #[test]
    fn test_all_content_checks_pass_on_demo_bundle() {
        let verifier = verifier(demo_bundle());
        for check in ContentCheck::ALL {
            let evidence = verifier.check_content(check.file_name()).unwrap();
            assert_eq!(evidence.nodes.len(), 3, "{:?}", check);
        }
    }

    #[test]
    fn test_os_release_other_distribution() {
        let reader = demo_bundle().with_file(
            node_file("10.0.0.3", "os-release"),
            "NAME=\"Debian GNU/Linux\"\nID=debian\n",
        );
        assert_eq!(
            verifier(reader).check_content("os-release"),
            Err(VerifyError::content_mismatch(
                "10.0.0.3",
                "os-release",
                "NAME=Ubuntu",
                "Debian GNU/Linux"
            ))
        );
    }

    #[test]
    fn test_os_info_missing_key() {
        let reader =
            demo_bundle().with_file(node_file("10.0.0.1", "os-info.txt"), "machine: x86_64\n");
        let err = verifier(reader).check_content("os-info.txt").unwrap_err();
        assert!(err.to_string().contains("<missing>"));
    }

    #[test]
    fn test_debian_version_bounds() {
        let old = demo_bundle().with_file(node_file("10.0.0.1", "debian_version"), "8.11\n");
        assert!(matches!(
            verifier(old).check_content("debian_version"),
            Err(VerifyError::ContentMismatch { .. })
        ));

        let codename =
            demo_bundle().with_file(node_file("10.0.0.1", "debian_version"), "bullseye/sid\n");
        assert!(matches!(
            verifier(codename).check_content("debian_version"),
            Err(VerifyError::Parse { .. })
        ));

        let not_a_number = demo_bundle().with_file(node_file("10.0.0.1", "debian_version"), "nan\n");
        assert!(matches!(
            verifier(not_a_number).check_content("debian_version"),
            Err(VerifyError::Parse { .. })
        ));
    }

    #[test]
    fn test_process_limits_markers_and_detail() {
        let evidence = verifier(demo_bundle())
            .check_content("process_limits")
            .unwrap();
        assert!(evidence.detail.unwrap().contains("max open files soft=100000"));

        let reader = demo_bundle().with_file(
            node_file("10.0.0.2", "process_limits"),
            "Max open files 1024 1024 files\n",
        );
        let err = verifier(reader).check_content("process_limits").unwrap_err();
        assert!(err.to_string().contains("'Max file locks'"));
    }

    #[test]
    fn test_java_checks_quote_content_excerpt() {
        let reader = demo_bundle().with_file(
            node_file("10.0.0.1", "java_version.txt"),
            "openjdk version \"11.0.20\"\nmore\n",
        );
        let err = verifier(reader).check_content("java_version.txt").unwrap_err();
        assert_eq!(
            err,
            VerifyError::content_mismatch(
                "10.0.0.1",
                "java_version.txt",
                "'1.8.0'",
                "'openjdk version \"11.0.20\"'"
            )
        );
    }

    #[test]
    fn test_unknown_content_check() {
        assert_eq!(
            verifier(demo_bundle()).check_content("lsblk.txt"),
            Err(VerifyError::UnknownContentCheck("lsblk.txt".to_string()))
        );
    }

    #[test]
    fn test_first_selection_only_checks_first_node() {
        // Broken on the third node only
        let reader =
            demo_bundle().with_file(node_file("10.0.0.3", "java_cmdline"), "java -jar other.jar");
        let verifier = BundleVerifier::new(reader, ArtifactLayout::new(DEMO_ROOT))
            .with_selection(NodeSelection::First);
        let evidence = verifier.check_content("java_cmdline").unwrap();
        assert_eq!(evidence.nodes, vec!["10.0.0.1".to_string()]);
    }

    #[test]
    fn test_run_records_failure_reason() {
        let verifier = verifier(demo_bundle());
        let outcome = verifier.run(&Check::NodeCount {
            subdirectory: "nodes".to_string(),
            expected: 5,
        });
        assert_eq!(
            outcome.status,
            CheckStatus::Failed {
                reason: "expected 5 folders in the nodes subdirectory, found 3".to_string()
            }
        );
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt(""), "<empty>");
        assert_eq!(excerpt("short\nsecond"), "'short'");
        let long = "x".repeat(100);
        assert_eq!(excerpt(&long), format!("'{}…'", "x".repeat(EXCERPT_LEN)));
    }
}
