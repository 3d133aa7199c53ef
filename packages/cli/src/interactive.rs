//! Interactive menu for the crowd-flow toolchain.
//!
//! Lets users pick a view and a date, hour, and location from the loaded
//! dataset without memorizing CLI flags.

use std::error::Error;
use std::path::Path;

use crowd_flow_analytics::{Selection, available_dates, filter_by_date, unique_locations};
use crowd_flow_cli_utils::MultiProgress;
use crowd_flow_playback::HOURS_PER_DAY;
use dialoguer::{Input, Select};

use crate::commands::{self, Context};

/// Top-level actions available in the interactive menu.
enum Action {
    Snapshot,
    Series,
    Flows,
    Play,
    Dates,
    Locations,
    Generate,
    Serve,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Snapshot,
        Self::Series,
        Self::Flows,
        Self::Play,
        Self::Dates,
        Self::Locations,
        Self::Generate,
        Self::Serve,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Snapshot => "Show hourly snapshot",
            Self::Series => "Show location series",
            Self::Flows => "Estimate flows",
            Self::Play => "Play through a day",
            Self::Dates => "List dates",
            Self::Locations => "List locations",
            Self::Generate => "Write sample CSV",
            Self::Serve => "Start server",
        }
    }
}

/// Prompts for an action and runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub async fn run(ctx: Context, multi: &MultiProgress) -> Result<(), Box<dyn Error>> {
    println!("Crowd Flow Toolchain");
    println!(
        "{} observations over {} days",
        ctx.dataset.len(),
        available_dates(&ctx.dataset).len()
    );
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Dates => println!("{}", commands::dates(&ctx, false)?),
        Action::Locations => {
            let Some(selection) = prompt_selection(&ctx, false, false)? else {
                return Ok(());
            };
            println!("{}", commands::locations(&ctx, &selection, false)?);
        }
        Action::Snapshot => {
            let Some(selection) = prompt_selection(&ctx, true, true)? else {
                return Ok(());
            };
            println!("{}", commands::snapshot(&ctx, &selection, false)?);
        }
        Action::Series => {
            let Some(selection) = prompt_selection(&ctx, false, true)? else {
                return Ok(());
            };
            println!("{}", commands::series(&ctx, &selection, false)?);
        }
        Action::Flows => {
            let Some(selection) = prompt_selection(&ctx, true, false)? else {
                return Ok(());
            };
            println!("{}", commands::flows(&ctx, &selection, false)?);
        }
        Action::Play => {
            let Some(selection) = prompt_selection(&ctx, true, true)? else {
                return Ok(());
            };
            let steps: u32 = Input::new()
                .with_prompt("Hours to play")
                .default(HOURS_PER_DAY)
                .interact_text()?;
            commands::play(&ctx, multi, &selection, steps).await?;
        }
        Action::Generate => {
            let output: String = Input::new()
                .with_prompt("Output file")
                .default("crowd_sample.csv".to_string())
                .interact_text()?;
            commands::generate(Some(Path::new(&output)))?;
        }
        Action::Serve => commands::serve(ctx, None).await?,
    }

    Ok(())
}

/// Prompts for a date, then optionally an hour and a location on that date.
/// Returns `None` when the dataset has no dates to choose from.
fn prompt_selection(
    ctx: &Context,
    ask_hour: bool,
    ask_location: bool,
) -> Result<Option<Selection>, Box<dyn Error>> {
    let dates = available_dates(&ctx.dataset);
    if dates.is_empty() {
        println!("The dataset has no dates.");
        return Ok(None);
    }

    let idx = Select::new()
        .with_prompt("Date")
        .items(&dates)
        .default(0)
        .interact()?;
    let date = dates[idx].clone();

    let hour = if ask_hour {
        let hours: Vec<String> = (0..HOURS_PER_DAY).map(|h| format!("{h:02}:00")).collect();
        let default = usize::try_from(crowd_flow_server::current_hour()).unwrap_or(0);
        let idx = Select::new()
            .with_prompt("Hour")
            .items(&hours)
            .default(default)
            .interact()?;
        u32::try_from(idx).ok()
    } else {
        None
    };

    let location = if ask_location {
        let rows = filter_by_date(&ctx.dataset, &date);
        let names: Vec<String> = unique_locations(&rows).into_iter().map(|l| l.name).collect();
        if names.is_empty() {
            None
        } else {
            let idx = Select::new()
                .with_prompt("Location")
                .items(&names)
                .default(0)
                .interact()?;
            Some(names[idx].clone())
        }
    } else {
        None
    };

    Ok(Some(ctx.selection(Some(date), hour, location)))
}
