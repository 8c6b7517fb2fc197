use anyhow::Result;
use dvfscraper::{config::PipelineConfig, fetch, pipeline, report, write};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) resolve configuration ────────────────────────────────────
    // optional single argument: path to a JSON config overriding the defaults
    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::from_path(&path)?,
        None => PipelineConfig::default(),
    };
    info!(
        departments = ?config.criteria.departments,
        type_local = %config.criteria.type_local,
        nature_mutation = %config.criteria.nature_mutation,
        years = config.sources.len(),
        "starting DVF download and filter run"
    );

    // ─── 3) fetch, filter, and combine every year ────────────────────
    let client = fetch::build_client(config.request_timeout())?;
    let (combined, _stats) = pipeline::run(&client, &config).await?;

    // ─── 4) save and report ──────────────────────────────────────────
    let files = write::save_combined(
        &combined,
        &config.output_dir,
        &config.base_name,
        config.max_file_size_mb,
    )?;
    report::print_summary(&combined, &files)?;

    Ok(())
}
