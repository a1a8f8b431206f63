use crate::config::{ARTIFACT_DIR_ENV_VAR, CONFIG_ENV_VAR, SelectionMode, VerifierConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bundle-verify",
    version,
    about = "Verify diagnostic bundles collected from cluster nodes"
)]
pub struct Cli {
    /// Artifact root containing the nodes directory
    #[arg(env = ARTIFACT_DIR_ENV_VAR)]
    pub artifact_dir: Option<PathBuf>,
    #[arg(short, long, env = CONFIG_ENV_VAR, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
    #[arg(short, long, help = "TOML plan replacing the built-in checks")]
    pub plan: Option<PathBuf>,
    #[arg(long, help = "Expected number of node folders")]
    pub nodes: Option<usize>,
    #[arg(long, value_enum, help = "Nodes inspected by content checks")]
    pub node_selection: Option<SelectionMode>,
    #[arg(long, help = "Seed for random node selection")]
    pub seed: Option<u64>,
    #[arg(long, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(long, value_name = "SECS", help = "Re-run until all checks pass or SECS elapse")]
    pub wait: Option<u64>,
    #[arg(long, value_name = "SECS", help = "Pause between passes in wait mode")]
    pub interval: Option<u64>,
    #[arg(long, help = "Print the checks that would run and exit")]
    pub list_checks: bool,
}

impl Cli {
    /// Command line values win over the config file
    pub fn apply_to(&self, config: &mut VerifierConfig) {
        if let Some(dir) = &self.artifact_dir {
            config.artifact_dir = Some(dir.clone());
        }
        if let Some(plan) = &self.plan {
            config.plan = Some(plan.clone());
        }
        if let Some(nodes) = self.nodes {
            config.expected_nodes = Some(nodes);
        }
        if let Some(mode) = self.node_selection {
            config.node_selection = mode;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(wait) = self.wait {
            config.wait.timeout_secs = Some(wait);
        }
        if let Some(interval) = self.interval {
            config.wait.interval_secs = interval;
        }
    }
}
