mod api;
mod cli;
mod config;
mod error;
mod lifecycle;
mod params;
mod session;
mod state_machine;
mod ui;
mod upload;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::HttpRemixClient;
use cli::{Cli, Command};
use config::NrxConfig;
use lifecycle::SubmitOutcome;
use session::RemixSession;
use state_machine::{Job, JobState};
use ui::JobProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "nrx=debug" } else { "nrx=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = NrxConfig::load()
        .context("failed to load configuration")?
        .with_overrides(cli.api_url.clone(), cli.poll_interval_ms);
    tracing::debug!(
        api_url = %config.api_url,
        poll_interval_ms = config.poll_interval_ms,
        "Loaded configuration",
    );

    let client = Arc::new(HttpRemixClient::new(
        config.api_url.clone(),
        config.connect_timeout(),
        config.request_timeout(),
    )?);

    match cli.command {
        Command::Remix {
            file,
            style,
            energy,
            brightness,
            output,
            json,
        } => {
            let style = style.or_else(|| config.default_style.clone());
            let job = run_remix(
                client,
                &config,
                &file,
                RemixArgs {
                    style,
                    energy,
                    brightness,
                    json,
                },
                output.as_deref(),
            )
            .await?;
            remix_verdict(&job)?;
        }
        Command::Styles => {
            let styles = client.fetch_styles().await?;
            ui::print_styles(&styles);
        }
        Command::System => {
            let info = client.fetch_system_info().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Status { job_id } => {
            use api::RemixApi;
            let status = client.fetch_job_status(&job_id).await?;
            ui::print_status(&job_id, &status);
        }
        Command::Download { job_id, output } => {
            save_result(&client, &job_id, &output).await?;
        }
    }

    Ok(())
}

struct RemixArgs {
    style: Option<String>,
    energy: Option<f64>,
    brightness: Option<f64>,
    json: bool,
}

/// Upload `file`, submit a remix and follow it to a terminal state.
async fn run_remix(
    client: Arc<HttpRemixClient>,
    config: &NrxConfig,
    file: &Path,
    args: RemixArgs,
    output: Option<&Path>,
) -> Result<Job> {
    let mut session = RemixSession::new(Arc::clone(&client), config.lifecycle_settings());
    session.load_catalog(client.fetch_styles().await.context("failed to fetch styles")?);
    if session.params().catalog().is_empty() {
        bail!("the remix service offers no styles");
    }

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let artifact = session.select_artifact(bytes, &name).await?;

    let mut warnings = Vec::new();
    if let Some(style) = &args.style
        && let Err(err) = session.set_style(style)
    {
        warnings.push(format!(
            "{err}, keeping {}",
            session.params().style().unwrap_or("no style")
        ));
    }
    if let Some(value) = args.energy {
        let applied = session.set_energy(value);
        if applied != value {
            warnings.push(format!("energy {value} clamped to {applied:.1}"));
        }
    }
    if let Some(value) = args.brightness {
        let applied = session.set_brightness(value);
        if applied != value {
            warnings.push(format!("brightness {value} clamped to {applied:.1}"));
        }
    }

    let progress = JobProgress::start(&artifact, session.params());
    for warning in &warnings {
        progress.warn(warning);
    }

    match session.submit().await? {
        SubmitOutcome::Started { job_id } => {
            tracing::debug!(job_id = %job_id, "Following remix job");
            let mut rx = session.jobs().subscribe();
            let render = async {
                loop {
                    progress.update(&rx.borrow_and_update().clone());
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
            };
            tokio::select! {
                job = session.jobs().wait_until_settled() => progress.update(&job),
                _ = render => {}
                _ = tokio::signal::ctrl_c() => {
                    progress.warn("interrupted, stopping status polling");
                }
            }
        }
        SubmitOutcome::Failed { .. } => {}
        SubmitOutcome::Ignored { state } => bail!("a remix is already in flight ({state})"),
    }

    let job = session.jobs().snapshot();
    let reference = session.jobs().result_reference();
    session.shutdown().await;

    progress.complete(&job);
    if args.json {
        progress.print_summary(&job)?;
    }

    if job.state == JobState::Completed
        && let (Some(path), Some(reference)) = (output, reference)
    {
        save_result(&client, &reference.job_id, path).await?;
    }

    Ok(job)
}

/// Turn a settled job into the process exit status.
fn remix_verdict(job: &Job) -> Result<()> {
    if let Some(message) = &job.error_message {
        bail!("remix failed: {message}");
    }
    if !job.state.is_terminal() {
        bail!("remix interrupted while {}", job.state);
    }
    Ok(())
}

async fn save_result(client: &HttpRemixClient, job_id: &str, path: &Path) -> Result<()> {
    let bytes = client
        .download_result(job_id)
        .await
        .with_context(|| format!("failed to download remix {job_id}"))?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("  Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
