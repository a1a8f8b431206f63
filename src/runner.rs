use crate::bundle::error::VerifyError;
use crate::bundle::layout::ArtifactLayout;
use crate::bundle::BundleVerifier;
use crate::config::{VerifierConfig, WaitConfig};
use crate::demo::data::{DEMO_BEANS, DEMO_NODES, DEMO_ROOT, demo_bundle};
use crate::display::Terminal;
use crate::plan::Plan;
use crate::report::Report;
use crate::system::FilesystemReader;
use crate::system::filesystem::RealFilesystemReader;
use chrono::Utc;
use std::error::Error;
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How results are printed
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub json: bool,
    pub list_checks: bool,
}

/// Verify the configured bundle, returning whether every check passed
pub async fn run_with_config(
    demo_mode: bool,
    config: VerifierConfig,
    options: RunOptions,
) -> Result<bool, Box<dyn Error>> {
    let terminal = Terminal::new();

    if demo_mode {
        run_demo_mode(&terminal, config, options).await
    } else {
        run_live_mode(&terminal, config, options).await
    }
}

async fn run_demo_mode(
    terminal: &Terminal,
    mut config: VerifierConfig,
    options: RunOptions,
) -> Result<bool, Box<dyn Error>> {
    config.artifact_dir = Some(PathBuf::from(DEMO_ROOT));
    config.expected_nodes = config.expected_nodes.or(Some(DEMO_NODES.len()));
    if config.expectations.beans.is_empty() {
        config.expectations.beans = DEMO_BEANS.iter().map(|b| b.to_string()).collect();
    }
    info!(root = DEMO_ROOT, "verifying the embedded demo bundle");
    run_verification(terminal, demo_bundle(), &config, options).await
}

async fn run_live_mode(
    terminal: &Terminal,
    config: VerifierConfig,
    options: RunOptions,
) -> Result<bool, Box<dyn Error>> {
    run_verification(terminal, RealFilesystemReader, &config, options).await
}

async fn run_verification<F: FilesystemReader>(
    terminal: &Terminal,
    filesystem_reader: F,
    config: &VerifierConfig,
    options: RunOptions,
) -> Result<bool, Box<dyn Error>> {
    let plan = resolve_plan(config)?;

    if options.list_checks {
        for (index, step) in plan.steps.iter().enumerate() {
            println!("{:>3}. {}", index + 1, step);
        }
        return Ok(true);
    }

    let layout = ArtifactLayout::with_nodes_dir(config.artifact_dir()?, &config.nodes_dir);
    let verifier = BundleVerifier::new(filesystem_reader, layout)
        .with_selection(config.selection())
        .with_expectations(config.expectations.clone());

    info!(steps = plan.len(), selection = %verifier.selection(), "running plan");

    let report = if config.wait.timeout_secs.is_some() {
        let live_refresh = !options.json && terminal.is_interactive();
        let report = run_until_pass(&verifier, &plan, &config.wait, |attempt| {
            if live_refresh {
                let shown = terminal
                    .clear_screen()
                    .and_then(|_| terminal.hide_cursor());
                if let Err(e) = shown {
                    debug!(error = %e, "failed to refresh the screen");
                }
                print!("{}", attempt.render_text(terminal));
            }
        })
        .await;
        if live_refresh {
            let restored = terminal
                .clear_screen()
                .and_then(|_| terminal.show_cursor());
            if let Err(e) = restored {
                debug!(error = %e, "failed to restore the screen");
            }
        }
        report
    } else {
        run_once(&verifier, &plan, 1)
    };

    if options.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text(terminal));
    }

    info!(
        passed = report.passed_count(),
        failed = report.failed_count(),
        "verification finished"
    );
    Ok(report.is_success())
}

/// Plan file from the config, or the built-in plan
pub fn resolve_plan(config: &VerifierConfig) -> Result<Plan, Box<dyn Error>> {
    match &config.plan {
        Some(path) => {
            debug!(path = %path.display(), "loading plan");
            Ok(Plan::load(path)?)
        }
        None => Ok(Plan::standard(
            &config.expectations,
            config.expected_nodes,
            &config.nodes_dir,
        )),
    }
}

/// Run every step of the plan once
pub fn run_once<F: FilesystemReader>(
    verifier: &BundleVerifier<F>,
    plan: &Plan,
    attempt: u32,
) -> Report {
    let started_at = Utc::now();
    let outcomes = verifier.run_all(&plan.steps);

    Report {
        artifact_dir: verifier.layout().root().to_path_buf(),
        selection: verifier.selection(),
        started_at,
        finished_at: Utc::now(),
        attempt,
        outcomes,
        stopped: None,
    }
}

/// Re-run the plan until it passes, the wait timeout expires or Ctrl+C is pressed.
///
/// `on_retry` sees every failing report that is followed by another attempt.
pub async fn run_until_pass<F: FilesystemReader>(
    verifier: &BundleVerifier<F>,
    plan: &Plan,
    wait: &WaitConfig,
    mut on_retry: impl FnMut(&Report),
) -> Report {
    let timeout = wait.timeout().unwrap_or_default();
    let deadline = Instant::now() + timeout;

    // Set up signal handler for Ctrl+C
    let (tx, mut rx) = tokio::sync::mpsc::channel(1);
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(()).await;
        }
    });

    let mut attempt = 1;
    let report = loop {
        let mut report = run_once(verifier, plan, attempt);
        if report.is_success() {
            break report;
        }

        let now = Instant::now();
        if now >= deadline {
            let error = VerifyError::timeout_error("bundle verification", timeout);
            warn!(attempts = attempt, "{}", error);
            report.stopped = Some(error.to_string());
            break report;
        }

        let pending: Vec<String> = report
            .failures()
            .map(|outcome| outcome.check.to_string())
            .collect();
        debug!(attempt, ?pending, "bundle not verified yet");
        on_retry(&report);

        let pause = wait.interval().min(deadline - now);
        tokio::select! {
            Some(()) = rx.recv() => {
                // Ctrl+C received, stop waiting
                report.stopped = Some("interrupted".to_string());
                break report;
            }
            _ = tokio::time::sleep(pause) => {
                // Time to retry
            }
        }
        attempt += 1;
    };

    signal_task.abort();
    report
}
