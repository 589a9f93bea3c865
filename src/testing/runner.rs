//! Test runner implementation
//!
//! Executes suites step by step against the booking service, threading a
//! `SuiteState` through every step and asserting on structured responses.

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::http::{ApiResponse, HttpClient, RequestOptions};

use super::assertions::{check_response, lookup};
use super::config::{TestStep, TestSuite};
use super::state::{StateKey, SuiteState};

/// What happened to a single step
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    Passed,
    Failed(String),
    Skipped(String),
}

/// Outcome of one step
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub name: String,
    pub status: StepStatus,
}

/// Result of a suite run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub steps: Vec<StepOutcome>,
    pub steps_total: usize,
    /// Set when the suite could not be loaded, or a before-all hook failed
    /// and the steps were skipped
    pub error: Option<String>,
}

impl TestResult {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed(_)))
    }

    pub fn passed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Passed)
            .count()
    }
}

/// Load a suite from a YAML file
pub fn load_suite(path: &Path) -> Result<TestSuite> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read test suite '{}': {}",
            path.display(),
            e
        ))
    })?;

    serde_yaml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse test suite '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Expand files and directories into the suite files to run
///
/// Directories contribute their `*.yml`/`*.yaml` files in name order.
pub fn collect_suite_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|e| Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            let mut found = Vec::new();
            for entry in entries {
                let p = entry?.path();
                if p.is_file()
                    && matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("yml") | Some("yaml")
                    )
                {
                    found.push(p);
                }
            }
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(Error::Config(format!(
                "Test suite path '{}' does not exist",
                path.display()
            )));
        }
    }

    if files.is_empty() {
        return Err(Error::Config("No test suites found".to_string()));
    }

    Ok(files)
}

/// Run a test suite from a YAML file
pub async fn run_suite(path: &Path, config: &Config, verbose: bool) -> Result<TestResult> {
    let suite = load_suite(path)?;
    let client = HttpClient::from_config(config)?;
    let mut state = SuiteState::new(config.credentials.clone());

    Ok(run_loaded_suite(&suite, &client, &mut state, verbose).await)
}

/// Run every suite under `paths`, each with fresh state
///
/// A suite file that cannot be read or parsed is reported as a failed suite
/// and the remaining files still run.
pub async fn run_suites(
    paths: &[PathBuf],
    config: &Config,
    verbose: bool,
) -> Result<Vec<TestResult>> {
    let files = collect_suite_files(paths)?;
    let client = HttpClient::from_config(config)?;
    let mut results = Vec::with_capacity(files.len());

    for file in &files {
        tracing::info!("Running suite {}", file.display());
        let suite = match load_suite(file) {
            Ok(suite) => suite,
            Err(e) => {
                tracing::warn!("Skipping suite {}: {}", file.display(), e);
                println!("\n{} {}", "✗".red().bold(), e);
                results.push(TestResult {
                    name: file.display().to_string(),
                    passed: false,
                    steps: Vec::new(),
                    steps_total: 0,
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        let mut state = SuiteState::new(config.credentials.clone());
        results.push(run_loaded_suite(&suite, &client, &mut state, verbose).await);
    }

    Ok(results)
}

/// Run an already-parsed suite
///
/// Steps run strictly in declaration order. A failing step is reported and
/// the next one still runs. After-all hooks always run and never fail the
/// suite.
pub async fn run_loaded_suite(
    suite: &TestSuite,
    client: &HttpClient,
    state: &mut SuiteState,
    verbose: bool,
) -> TestResult {
    let steps_total = suite.steps.len();

    println!(
        "\n{} {}",
        "Running Suite:".blue().bold(),
        suite.name.white().bold()
    );

    if let Some(desc) = &suite.description {
        println!("  {}", desc.dimmed());
    }

    // Before-all hooks
    let mut hook_error = None;
    if !suite.before_all.is_empty() {
        println!("\n{}", "Setup:".cyan());
        for hook in &suite.before_all {
            if let Some(key) = missing_requirement(hook, state) {
                tracing::debug!("Skipping hook '{}': no {}", hook.name, key);
                continue;
            }
            match execute_step(client, state, hook, verbose).await {
                Ok(_) => println!("  {} {}", "✓".green(), hook.name.dimmed()),
                Err(e) => {
                    println!("  {} {}: {}", "✗".red(), hook.name, e);
                    hook_error = Some(format!("Setup '{}' failed: {}", hook.name, e));
                    break;
                }
            }
        }
    }

    // Steps
    println!("\n{}", "Steps:".cyan());
    let mut steps = Vec::with_capacity(steps_total);

    for (i, step) in suite.steps.iter().enumerate() {
        let step_num = i + 1;

        let status = if let Some(reason) = &hook_error {
            StepStatus::Skipped(reason.clone())
        } else {
            match execute_step(client, state, step, verbose).await {
                Ok(_) => StepStatus::Passed,
                Err(e) => StepStatus::Failed(e.to_string()),
            }
        };

        report_step(step_num, step, &status);
        steps.push(StepOutcome {
            name: step.name.clone(),
            status,
        });
    }

    // After-all hooks: best effort, failures never mask step results
    if !suite.after_all.is_empty() {
        println!("\n{}", "Teardown:".cyan());
        for hook in &suite.after_all {
            if let Some(key) = missing_requirement(hook, state) {
                tracing::debug!("Skipping cleanup '{}': no {}", hook.name, key);
                continue;
            }
            match execute_step(client, state, hook, verbose).await {
                Ok(_) => println!("  {} {}", "✓".green(), hook.name.dimmed()),
                Err(e) => {
                    tracing::warn!("Cleanup '{}' failed (ignored): {}", hook.name, e);
                    println!("  {} {} (ignored: {})", "-".yellow(), hook.name.dimmed(), e);
                }
            }
        }
    }

    state.clear();

    let passed = hook_error.is_none()
        && steps
            .iter()
            .all(|s| s.status == StepStatus::Passed);

    if passed {
        println!(
            "\n{} {}\n",
            "✓".green().bold(),
            "Suite Passed".green().bold()
        );
    } else {
        let failed = steps
            .iter()
            .filter(|s| s.status != StepStatus::Passed)
            .count();
        println!(
            "\n{} {} ({} of {} steps did not pass)\n",
            "✗".red().bold(),
            "Suite Failed".red().bold(),
            failed,
            steps_total
        );
    }

    TestResult {
        name: suite.name.clone(),
        passed,
        steps,
        steps_total,
        error: hook_error,
    }
}

fn missing_requirement(step: &TestStep, state: &SuiteState) -> Option<String> {
    step.required_keys()
        .into_iter()
        .find(|k| !state.contains(*k))
        .map(|k| k.to_string())
}

/// Execute a single step: request, assertions, then saved outputs
async fn execute_step(
    client: &HttpClient,
    state: &mut SuiteState,
    step: &TestStep,
    verbose: bool,
) -> Result<ApiResponse> {
    for key in step.required_keys() {
        state.require(key)?;
    }

    let spec = &step.request;
    let path = state.render(&spec.path)?;

    let mut options = if spec.fail_on_status_code {
        RequestOptions::default()
    } else {
        RequestOptions::tolerant()
    };
    for (name, value) in &spec.headers {
        options = options.header(name.clone(), state.render(value)?);
    }
    if spec.auth {
        let token = state.require(StateKey::Token)?;
        let token = token.as_str().map(str::to_string).unwrap_or_else(|| token.to_string());
        options = options.token(&token);
    }
    if let Some(body) = &spec.body {
        options = options.json(state.render_value(body)?);
    }

    if verbose {
        println!("    {} {}", spec.method.as_str().dimmed(), path.dimmed());
    }

    let response = client.send(spec.method, &path, options).await?;

    if verbose {
        println!(
            "    {} {}",
            response.status.to_string().dimmed(),
            response.body.to_string().dimmed()
        );
    }

    if let Some(expect) = &step.expect {
        check_response(&response, expect)?;
    }

    for (key, body_path) in &step.save {
        let value = lookup(&response.body, body_path).ok_or_else(|| {
            Error::TestAssertion(format!(
                "Cannot save '{}': response has no 'body.{}'",
                key, body_path
            ))
        })?;
        state.set(*key, value.clone());
    }

    Ok(response)
}

fn report_step(step_num: usize, step: &TestStep, status: &StepStatus) {
    match status {
        StepStatus::Passed => {
            println!("  {} Step {}: {}", "✓".green(), step_num, step.name.dimmed());
            if let Some(note) = &step.quirk {
                println!("      {} {}", "known quirk:".yellow(), note.dimmed());
            }
        }
        StepStatus::Failed(e) => {
            println!("  {} Step {}: {}: {}", "✗".red(), step_num, step.name, e);
        }
        StepStatus::Skipped(reason) => {
            println!(
                "  {} Step {}: {} (skipped: {})",
                "-".yellow(),
                step_num,
                step.name.dimmed(),
                reason
            );
        }
    }
}
