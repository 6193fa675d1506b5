use anyhow::{Context, Result};
use clap::Parser;
use convex_deploy::convex::{self, DeployConfig};
use convex_deploy::Driver;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Run `npx convex dev --once` unattended and check the resulting `.env.local`.
#[derive(Parser)]
#[command(name = "convex-deploy")]
#[command(version, about, long_about = None)]
struct Args {
    /// Project directory to deploy from
    #[arg(long, env = "CONVEX_DEPLOY_DIR", default_value = convex::PROJECT_DIR)]
    project_dir: PathBuf,

    /// Sleep between polls when the CLI is silent, in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_interval_ms: u64,
}

impl Args {
    fn into_config(self) -> DeployConfig {
        DeployConfig {
            project_dir: self.project_dir,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..DeployConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so the echoed CLI output on stdout stays untouched
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CONVEX_DEPLOY_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();

    std::env::set_current_dir(&config.project_dir).with_context(|| {
        format!(
            "failed to change into project directory {}",
            config.project_dir.display()
        )
    })?;

    let mut stdout = std::io::stdout();
    convex::write_banner(&mut stdout)?;

    let session = config
        .session_builder()
        .spawn_argv(&config.program, &config.args)
        .with_context(|| format!("failed to start {} {}", config.program, config.args.join(" ")))?;

    let transcript = Driver::new(convex::responder()?)
        .poll_interval(config.poll_interval)
        .interrupt_notice(convex::INTERRUPT_NOTICE)
        .run(session, &mut stdout, tokio::signal::ctrl_c())
        .await
        .context("deployment session failed")?;

    tracing::info!(
        exchanges = transcript.exchanges.len(),
        code = transcript.exit_status.exit_code(),
        "session finished"
    );

    convex::write_footer(&mut stdout)?;

    let outcome = convex::post_check()?
        .check()
        .with_context(|| format!("failed to read {}", convex::RESULTS_FILE))?;
    convex::write_report(&mut stdout, outcome)?;
    stdout.flush()?;

    Ok(())
}
