//! Countdown command handler.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use crate::cli::CountdownArgs;
use crate::cli::output::{CountdownEntry, CountdownReport, OutputFormat, print_json};
use crate::domain::{AnnualEvent, Countdown};

pub fn handle_countdown(args: &CountdownArgs) -> Result<()> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let countdowns = countdowns(today, &args.events)?;

    match args.format {
        OutputFormat::Human => {
            print!("{}", render_human(today, &countdowns));
            Ok(())
        }
        OutputFormat::Json => print_json(&countdown_report(today, countdowns)),
    }
}

/// Built-in events first, then the extra ones in the order given.
pub(crate) fn countdowns(today: NaiveDate, extra: &[AnnualEvent]) -> Result<Vec<Countdown>> {
    [AnnualEvent::halloween(), AnnualEvent::new_years_eve()]
        .iter()
        .chain(extra)
        .map(|event| {
            event
                .countdown(today)
                .with_context(|| format!("no date for {} on or after {}", event.name(), today))
        })
        .collect()
}

pub(crate) fn render_human(today: NaiveDate, countdowns: &[Countdown]) -> String {
    let mut out = format!("Today is {}.\n\n", today.format("%B %d, %Y"));
    for countdown in countdowns {
        out.push_str(&countdown.to_string());
        out.push('\n');
    }
    out
}

fn countdown_report(today: NaiveDate, countdowns: Vec<Countdown>) -> CountdownReport {
    CountdownReport {
        today,
        countdowns: countdowns
            .into_iter()
            .map(|c| CountdownEntry {
                is_today: c.is_today(),
                name: c.name,
                date: c.date,
                year: c.year,
                days: c.days,
            })
            .collect(),
    }
}
