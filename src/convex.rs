//! Convex `dev --once` deployment preset
//!
//! Answers the anonymous-deployment prompt sequence of `npx convex dev --once`
//! and then checks that `.env.local` received a deployment URL.
//!
//! The login and account prompts are answered once each. The device-name and
//! project-name prompts are answered on every poll iteration in which their
//! text is visible in the accumulated output, which can resend the answer
//! while the prompt text stays in the buffer.

use crate::pattern::Trigger;
use crate::postcheck::{Outcome, PostCheck};
use crate::responder::{Responder, Rule};
use crate::result::PatternError;
use crate::session::SessionBuilder;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Project the deployment runs in
pub const PROJECT_DIR: &str = "/Users/irawatkins/Documents/Coolify Managment Folder/stepperslife";

/// Variable cleared so the CLI falls back to anonymous mode
pub const DEPLOYMENT_ENV: &str = "CONVEX_DEPLOYMENT";

/// Program spawned on the pty
pub const PROGRAM: &str = "npx";

/// Arguments passed to [`PROGRAM`]
pub const ARGS: [&str; 3] = ["convex", "dev", "--once"];

/// File the CLI writes the deployment URL into
pub const RESULTS_FILE: &str = ".env.local";

/// Marker proving a hosted deployment URL was written
pub const URL_MARKER: &str = "NEXT_PUBLIC_CONVEX_URL=https://";

/// Answer to the device-name prompt
pub const DEVICE_NAME: &str = "stepperslife-server";

/// Answer to the project-name prompt
pub const PROJECT_NAME: &str = "stepperslife";

/// Rule name of the guarded login prompt
pub const LOGIN_RULE: &str = "login";

/// Rule name of the guarded account prompt
pub const ACCOUNT_RULE: &str = "account";

/// Rule name of the device-name prompt
pub const DEVICE_RULE: &str = "device-name";

/// Rule name of the project-name prompt
pub const PROJECT_RULE: &str = "project-name";

/// Notice printed when the operator interrupts the run
pub const INTERRUPT_NOTICE: &str = "\n\nDeployment interrupted by user";

const SEPARATOR_WIDTH: usize = 50;

/// The four prompt rules, in priority order.
pub fn rules() -> Result<Vec<Rule>, PatternError> {
    Ok(vec![
        Rule::new(
            LOGIN_RULE,
            Trigger::exact("Would you like to login to your account?"),
            "n\n",
        )?
        .once()
        .notice("No - Try without account"),
        Rule::new(
            ACCOUNT_RULE,
            Trigger::exact("Try Convex without an account"),
            "y\n",
        )?
        .once()
        .notice("Yes - Try without account"),
        Rule::new(
            DEVICE_RULE,
            Trigger::exact("Device name:"),
            format!("{DEVICE_NAME}\n"),
        )?
        .notice("Device name"),
        Rule::new(
            PROJECT_RULE,
            Trigger::ignore_case("project name"),
            format!("{PROJECT_NAME}\n"),
        )?
        .notice("Project name"),
    ])
}

/// Responder loaded with [`rules`].
pub fn responder() -> Result<Responder, PatternError> {
    Ok(Responder::new(rules()?))
}

/// Check for [`URL_MARKER`] in [`RESULTS_FILE`].
pub fn post_check() -> Result<PostCheck, PatternError> {
    PostCheck::new(RESULTS_FILE, URL_MARKER)
}

/// Settings for one deployment run.
///
/// The defaults reproduce the fixed flow; the binary only overrides what the
/// operator passes explicitly.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Directory to change into before spawning.
    pub project_dir: PathBuf,
    /// Program to spawn.
    pub program: String,
    /// Arguments for the program.
    pub args: Vec<String>,
    /// Variables cleared for the child.
    pub cleared_env: Vec<String>,
    /// Sleep between polls when no output is available.
    pub poll_interval: Duration,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from(PROJECT_DIR),
            program: PROGRAM.to_string(),
            args: ARGS.iter().map(|arg| arg.to_string()).collect(),
            cleared_env: vec![DEPLOYMENT_ENV.to_string()],
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl DeployConfig {
    /// Session builder with the cleared variables applied.
    ///
    /// The child runs in the caller's current directory, which the binary has
    /// already changed to [`DeployConfig::project_dir`].
    pub fn session_builder(&self) -> SessionBuilder {
        self.cleared_env
            .iter()
            .fold(SessionBuilder::new(), |builder, key| builder.clear_env(key))
    }
}

/// Opening banner
pub fn write_banner(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Starting Convex deployment...")?;
    writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    out.flush()
}

/// Closing footer
pub fn write_footer(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\n{}", "=".repeat(SEPARATOR_WIDTH))?;
    writeln!(out, "Convex deployment process completed!")?;
    out.flush()
}

/// Human readable report for a post-check outcome
pub fn write_report(out: &mut impl Write, outcome: Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Configured => {
            writeln!(out, "✅ Success! Convex URL has been configured.")?;
            writeln!(out, "\nYou can now run: npm run dev")?;
        }
        Outcome::MarkerMissing => {
            writeln!(out, "⚠️  Convex URL not found in {RESULTS_FILE}")?;
            writeln!(out, "You may need to run: npx convex dev")?;
        }
        Outcome::FileMissing => {
            writeln!(out, "⚠️  {RESULTS_FILE} was not created")?;
            writeln!(out, "You may need to run: npx convex dev")?;
        }
    }
    out.flush()
}
