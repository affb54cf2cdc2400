//! calmux CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Instrument;

use calmux_client::cli::{Cli, Command, SourcesAction};
use calmux_client::commands::{self, Output};
use calmux_client::output::OutputFormat;
use calmux_client::{App, ClientResult, Settings};
use calmux_core::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            for warning in &output.warnings {
                eprintln!("{warning}");
            }
            if !output.stdout.is_empty() {
                println!("{}", output.stdout);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<Output> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    init_tracing(settings.tracing_config(cli.debug)?)?;

    let app = App::build(&settings)?;
    dispatch(cli.command, &settings, &app)
        .instrument(app.span.clone())
        .await
}

async fn dispatch(command: Command, settings: &Settings, app: &App) -> ClientResult<Output> {
    match command {
        Command::Events { days, json } => {
            commands::events::run(
                &app.engine,
                settings.window_days(days),
                OutputFormat::from_flag(json),
            )
            .await
        }
        Command::Sources { action } => match action {
            SourcesAction::List { json } => {
                commands::sources::list(&app.manager, OutputFormat::from_flag(json))
            }
            SourcesAction::Names => commands::sources::names(&app.manager),
            SourcesAction::Add(args) => commands::sources::add(&app.manager, args).await,
            SourcesAction::Update(args) => commands::sources::update(&app.manager, args).await,
            SourcesAction::Remove { id } => commands::sources::remove(&app.manager, &id).await,
        },
    }
}
