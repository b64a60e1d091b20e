use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Subcommand;
use redmoon_core::{
    ClassificationPolicy, Command, CommandSink, Config, ForegroundMonitor, ForegroundSource,
    ProcessId,
};
use tokio_util::sync::CancellationToken;

use super::CommandResult;

#[derive(Subcommand)]
pub enum MonitorAction {
    /// Classify app identifiers against the suspend list
    Classify {
        /// App identifiers (e.g. "com.android.packageinstaller")
        #[arg(required = true)]
        ids: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the monitor loop over a scripted sequence of foreground apps
    Simulate {
        /// Foreground app per poll, in order
        #[arg(required = true)]
        ids: Vec<String>,
        /// Poll interval in milliseconds (default: monitor.poll_interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

/// Replays identifiers one per poll and stops the monitor after the last.
struct ScriptedSource {
    ids: Mutex<VecDeque<String>>,
    cancel: CancellationToken,
}

impl ForegroundSource for ScriptedSource {
    fn current(&self) -> ProcessId {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        let id = ProcessId::from(ids.pop_front().unwrap_or_default());
        if ids.is_empty() {
            self.cancel.cancel();
        }
        println!("{id}");
        id
    }
}

struct PrintSink;

impl CommandSink for PrintSink {
    fn send(&self, command: Command) {
        println!("  -> {command}");
    }
}

pub fn run(action: MonitorAction) -> CommandResult {
    let config = Config::load()?;

    match action {
        MonitorAction::Classify { ids, json } => {
            let policy = ClassificationPolicy::from_config(&config.monitor);
            let rows: Vec<_> = ids
                .into_iter()
                .map(ProcessId::from)
                .map(|id| {
                    let class = policy.classify(&id);
                    (id, class)
                })
                .collect();
            if json {
                let out: Vec<_> = rows
                    .iter()
                    .map(|(id, class)| {
                        serde_json::json!({
                            "id": id,
                            "class": class,
                            "command": class.command(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for (id, class) in rows {
                    let command = class
                        .command()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "none".to_string());
                    println!("{id}: {class:?} ({command})");
                }
            }
        }
        MonitorAction::Simulate { ids, interval_ms } => {
            let cancel = CancellationToken::new();
            let source = Arc::new(ScriptedSource {
                ids: Mutex::new(ids.into()),
                cancel: cancel.clone(),
            });
            let mut monitor =
                ForegroundMonitor::from_config(&config.monitor, source, Arc::new(PrintSink), cancel);
            if let Some(ms) = interval_ms {
                monitor = monitor.with_poll_interval(Duration::from_millis(ms));
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(monitor.run());
        }
    }
    Ok(())
}
