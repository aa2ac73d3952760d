use breakwise_core::clock::{Clock, SystemClock};
use breakwise_core::stats::{date_key, MAX_HISTORY_DAYS};
use breakwise_core::{App, Config};
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// All-time stats with the full daily history
    Show,
    /// Today's bucket
    Today,
    /// Per-day history, oldest first
    History {
        /// Number of days ending today
        #[arg(
            long,
            default_value_t = 7,
            value_parser = clap::value_parser!(u32).range(1..=MAX_HISTORY_DAYS as i64)
        )]
        days: u32,
    },
    /// Clear all statistics
    Reset,
}

pub fn run(action: StatsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::open(config)?;
    let today = SystemClock.today();

    match action {
        StatsAction::Show => {
            println!("{}", serde_json::to_string_pretty(app.stats())?);
        }
        StatsAction::Today => {
            let day = app.stats().day(today).copied().unwrap_or_default();
            let out = json!({
                "date": date_key(today),
                "completed": day.completed,
                "skipped": day.skipped,
                "minutes": day.minutes,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        StatsAction::History { days } => {
            let history: Vec<_> = app
                .stats()
                .recent_days(today, days)
                .into_iter()
                .map(|(date, day)| {
                    json!({
                        "date": date_key(date),
                        "completed": day.completed,
                        "skipped": day.skipped,
                        "minutes": day.minutes,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        StatsAction::Reset => {
            app.reset_stats();
            println!("stats reset");
        }
    }
    Ok(())
}
