use clap::Parser;
use log::info;

use kiota_setup::action::{self, WorkflowCommands};
use kiota_setup::cli::Args;
use kiota_setup::install::download::Platform;

fn main() {
    // stdout carries workflow commands, so the log stays on stderr
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    // Single-threaded: reporting mutates this process's environment
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let inputs = args.inputs();
    let mut reporter = WorkflowCommands::from_env();
    let launched = action::launch(
        &inputs,
        args.config.as_deref(),
        Platform::detect(),
        &mut reporter,
    );
    if let Some(result) = rt.block_on(launched) {
        info!("kiota {} ready at {}", result.version, result.path.display());
    }

    if reporter.failed() {
        std::process::exit(1);
    }
}
