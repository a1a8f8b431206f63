use crate::bundle::checks::{Check, ContentCheck, Expectations};
use crate::config::{ConfigError, read_config_file};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered checks executed in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<Check>,
}

impl Plan {
    /// Built-in plan covering the whole collected bundle.
    ///
    /// The node count step is only added when a count is known.
    pub fn standard(
        expectations: &Expectations,
        expected_nodes: Option<usize>,
        nodes_dir: &str,
    ) -> Self {
        let mut steps = vec![Check::ArtifactsAvailable];

        if let Some(expected) = expected_nodes {
            steps.push(Check::NodeCount {
                subdirectory: nodes_dir.to_string(),
                expected,
            });
        }

        for relative in &expectations.node_files {
            let (subdirectory, file) = match relative.rsplit_once('/') {
                Some((subdirectory, file)) => (subdirectory.to_string(), file.to_string()),
                None => (String::new(), relative.clone()),
            };
            steps.push(Check::FileInEachNode { file, subdirectory });
        }

        steps.push(Check::MetricsParse);
        steps.extend(
            expectations
                .beans
                .iter()
                .map(|name| Check::BeanPresent { name: name.clone() }),
        );
        steps.extend(ContentCheck::ALL.iter().map(|check| Check::Content {
            file: check.file_name().to_string(),
        }));

        Self { steps }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let plan: Plan = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read_config_file(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::Invalid("plan has no steps".to_string()));
        }
        for step in &self.steps {
            match step {
                Check::NodeCount { subdirectory, .. }
                    if !subdirectory.is_empty() && subdirectory.trim().is_empty() =>
                {
                    return Err(ConfigError::Invalid(
                        "node_count subdirectory must not be blank".to_string(),
                    ));
                }
                Check::FileInEachNode { file, .. } if file.trim().is_empty() => {
                    return Err(ConfigError::Invalid(
                        "file_in_each_node step needs a file".to_string(),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_plan_without_node_count() {
        let plan = Plan::standard(&Expectations::default(), None, "nodes");
        assert_eq!(plan.steps[0], Check::ArtifactsAvailable);
        assert!(
            !plan
                .steps
                .iter()
                .any(|step| matches!(step, Check::NodeCount { .. }))
        );
        assert!(plan.steps.contains(&Check::FileInEachNode {
            file: "ps-aux.txt".to_string(),
            subdirectory: "os-metrics".to_string(),
        }));
        assert!(plan.steps.contains(&Check::MetricsParse));
        let content_steps = plan
            .steps
            .iter()
            .filter(|step| matches!(step, Check::Content { .. }))
            .count();
        assert_eq!(content_steps, 7);
    }

    #[test]
    fn test_standard_plan_with_nodes_and_beans() {
        let expectations = Expectations {
            beans: vec!["java.lang:type=Runtime".to_string()],
            ..Expectations::default()
        };
        let plan = Plan::standard(&expectations, Some(3), "cluster");
        assert_eq!(
            plan.steps[1],
            Check::NodeCount {
                subdirectory: "cluster".to_string(),
                expected: 3
            }
        );
        assert!(plan.steps.contains(&Check::BeanPresent {
            name: "java.lang:type=Runtime".to_string()
        }));
    }

    #[test]
    fn test_plan_from_toml() {
        let plan = Plan::from_toml(
            r#"
            [[steps]]
            check = "artifacts_available"

            [[steps]]
            check = "content"
            file = "os-release"
            "#,
        )
        .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan.steps[1],
            Check::Content {
                file: "os-release".to_string()
            }
        );
    }

    #[test]
    fn test_plan_rejects_empty_and_malformed() {
        assert!(matches!(
            Plan::from_toml("steps = []"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Plan::from_toml("[[steps]]\ncheck = \"teleport\"\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Plan::from_toml("[[steps]]\ncheck = \"node_count\"\nsubdirectory = \" \"\nexpected = 1\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_plan_load_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        let step = "[[steps]]\ncheck = \"metrics_parse\"\n\n";
        std::fs::write(&path, step.repeat(20_000)).unwrap();

        assert!(matches!(Plan::load(&path), Err(ConfigError::Invalid(msg)) if msg.contains("exceeds")));
    }

    #[test]
    fn test_plan_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Plan::load(&dir.path().join("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
