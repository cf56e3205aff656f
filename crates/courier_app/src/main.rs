mod config;
mod logging;
mod scripted_host;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use courier_core::{StatusKind, StatusNotification};
use courier_engine::{ChannelStatusSink, EngineHandle};
use engine_logging::engine_info;

use crate::logging::LogDestination;
use crate::scripted_host::{Script, ScriptedHost};

#[derive(Parser, Debug)]
#[command(name = "courier_app")]
#[command(about = "Broadcasts one message to a list of numbers through a rehearsal host")]
struct Args {
    /// Job file (RON): recipients, message and attachment URIs
    #[arg(long)]
    job: PathBuf,

    /// Config file (RON); defaults apply when it is missing
    #[arg(long)]
    config: Option<PathBuf>,

    /// Screen script (RON) for the rehearsal host; a built-in chat app
    /// is used when omitted
    #[arg(long)]
    script: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::initialize(args.log, args.verbose);

    let config = config::load_config(args.config.as_deref()).context("loading config")?;
    let job = config::load_job(&args.job).context("loading job")?;
    let script = match &args.script {
        Some(path) => config::load_ron(path).context("loading screen script")?,
        None => Script::chat_app(&config.target_package),
    };

    let host = Arc::new(ScriptedHost::new(script));
    let (sink, mut status) = ChannelStatusSink::channel();
    let engine = EngineHandle::start(config.engine_config(), host.clone(), Arc::new(sink))
        .context("starting engine")?;

    let handle = match engine.enqueue_job(&job.recipients, &job.message, &job.attachments) {
        Ok(handle) => handle,
        Err(err) => {
            while let Ok(notification) = status.try_recv() {
                print_status(&notification);
            }
            return Err(err).context("job refused");
        }
    };
    engine_info!(
        "job {} queued for {} recipients",
        handle.job_id(),
        handle.recipients().len()
    );

    let mut outcome = None;
    while let Some(notification) = status.blocking_recv() {
        print_status(&notification);
        if notification.is_terminal() && notification.job_id == Some(handle.job_id()) {
            outcome = Some(notification.kind);
            break;
        }
    }
    engine.shutdown();
    engine_info!(
        "rehearsal launched {} chats, ended on {:?}",
        host.launches().len(),
        host.current_screen()
    );

    match outcome {
        Some(StatusKind::JobFailed(reason)) => bail!("job {} failed: {}", handle.job_id(), reason),
        Some(_) => Ok(()),
        None => bail!("engine stopped before job {} finished", handle.job_id()),
    }
}

fn print_status(notification: &StatusNotification) {
    println!(
        "{} {}",
        chrono::Local::now().format("%H:%M:%S%.3f"),
        notification
    );
}
