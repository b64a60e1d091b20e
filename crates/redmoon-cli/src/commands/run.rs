use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::Args;
use redmoon_core::{
    run_alarm_dispatch, AlarmScheduler, Command, Direction, FileConfig, FilterService,
    PlatformLevel, TokioTimerService,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::CommandResult;

#[derive(Args)]
pub struct RunArgs {
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub for_secs: Option<u64>,
    /// Platform level to emulate (selects the timer tier)
    #[arg(long)]
    pub level: Option<u32>,
}

/// Prints filter commands instead of driving an overlay.
struct ConsoleFilter;

impl FilterService for ConsoleFilter {
    fn toggle(&self, command: Command) {
        println!("{} toggle {command}", Local::now().format("%H:%M:%S"));
    }

    fn fade(&self, command: Command) {
        println!("{} fade {command}", Local::now().format("%H:%M:%S"));
    }
}

pub fn run(args: RunArgs) -> CommandResult {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(serve(args))
}

async fn serve(args: RunArgs) -> CommandResult {
    let level = args.level.map(PlatformLevel).unwrap_or_default();
    let config = FileConfig::default_location()?;
    info!(path = %config.path().display(), level = level.0, "starting scheduler");

    let (timers, fired_rx) = TokioTimerService::new();
    let scheduler = Arc::new(AlarmScheduler::new(
        Arc::new(config),
        Arc::new(timers.with_level(level)),
        Arc::new(ConsoleFilter),
    ));

    for direction in Direction::ALL {
        match scheduler.schedule_next(direction)? {
            Some(pending) => println!(
                "{direction:<3}  next: {}  ({:?})",
                pending.at.format("%Y-%m-%d %H:%M"),
                pending.tier
            ),
            None => println!("{direction:<3}  disabled"),
        }
    }

    let cancel = CancellationToken::new();
    let dispatch = tokio::spawn(run_alarm_dispatch(
        Arc::clone(&scheduler),
        fired_rx,
        cancel.clone(),
    ));

    match args.for_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    info!("shutting down");
    cancel.cancel();
    let _ = dispatch.await;
    scheduler.cancel_all();
    Ok(())
}
