use chrono::Local;
use clap::Subcommand;
use redmoon_core::alarm::{next_occurrence, DEFAULT_GUARD};
use redmoon_core::{Config, Direction};

use super::CommandResult;

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Show when the next on/off alarm would fire
    Next {
        /// Only this direction ("on" or "off")
        direction: Option<Direction>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ScheduleAction) -> CommandResult {
    match action {
        ScheduleAction::Next { direction, json } => {
            let config = Config::load()?;
            let now = Local::now();
            let directions = match direction {
                Some(d) => vec![d],
                None => Direction::ALL.to_vec(),
            };

            let mut rows = Vec::new();
            for d in directions {
                let time = config.schedule.time_for(d);
                let next = config
                    .schedule
                    .time_toggle
                    .then(|| next_occurrence(time, &now, DEFAULT_GUARD));
                rows.push((d, time, next));
            }

            if json {
                let out: Vec<_> = rows
                    .iter()
                    .map(|(d, time, next)| {
                        serde_json::json!({
                            "direction": d.as_str(),
                            "time": time.to_string(),
                            "enabled": next.is_some(),
                            "next": next.map(|n| n.to_rfc3339()),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for (d, time, next) in rows {
                    match next {
                        Some(at) => println!("{d:<3}  {time}  next: {}", at.format("%Y-%m-%d %H:%M")),
                        None => println!("{d:<3}  {time}  disabled"),
                    }
                }
            }
        }
    }
    Ok(())
}
