use anyhow::Context;
use artwalkcore::processing::StreamMerger;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use std::fs;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WalkConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Art walk engine driver")]
struct Args {
    /// Replay one synthetic walk through the catalog and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a walk config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Artwork catalog (JSON) used when no workflow file is given
    #[arg(long, default_value = "data/public_art.json")]
    catalog: PathBuf,
    #[arg(long, default_value_t = 100)]
    step_goal: u64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Write the session history as JSON after the run
    #[arg(long)]
    history_out: Option<PathBuf>,
    /// Keep the HTTP bridge alive for a presentation client
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let (offline, serve, history_out) = (args.offline, args.serve, args.history_out);

    let walk_config = if let Some(path) = args.workflow {
        WalkConfig::load(path)?
    } else {
        WalkConfig::from_args(args.catalog, args.step_goal, args.seed)
    };
    let catalog = walk_config.load_catalog()?;

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    runtime.block_on(async {
        let (handle, merger_task) = StreamMerger::spawn(catalog, walk_config.engine.clone());
        let gui_bridge = GuiBridge::new(handle.clone());
        gui_bridge.publish_status(&format!(
            "Catalog loaded with {} artworks",
            handle.catalog().len()
        ));

        if offline {
            let runner = Runner::new(walk_config.clone());
            let result = runner.execute(&handle).await?;

            for event in &result.discoveries {
                gui_bridge.publish_discovery(event);
            }
            println!(
                "Offline walk -> positions {}, step samples {}, discoveries {}, steps walked {}, duration {}",
                result.positions_sent,
                result.steps_sent,
                result.record.artwork_count,
                result.record.steps_walked,
                result.record.duration
            );
            println!(
                "Daily goal {} -> {:.0}% ({} remaining), metrics {:?}",
                result.snapshot.step_progress.goal,
                result.snapshot.step_progress.percent,
                result.snapshot.step_progress.remaining,
                result.metrics
            );
        }

        if let Some(path) = history_out.as_ref() {
            let history = serde_json::to_string_pretty(&handle.session_history())
                .context("serializing session history")?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, history)
                .with_context(|| format!("writing session history {}", path.display()))?;
        }

        if serve {
            let server = tokio::spawn(GuiBridge::new(handle.clone()).serve(walk_config.bind));
            gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            server.abort();
        }

        handle.shutdown().await?;
        merger_task.await.context("joining stream merger")?;
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
