//! `calmux sources ...`.

use calmux_core::{NewSource, SourceEdits};
use calmux_server::SourceManager;

use crate::cli::{AddArgs, UpdateArgs, join_urls};
use crate::commands::Output;
use crate::error::ClientResult;
use crate::output::{OutputFormat, format_names, format_sources};

/// Lists configured sources.
pub fn list(manager: &SourceManager, format: OutputFormat) -> ClientResult<Output> {
    Ok(Output::text(format_sources(&manager.list()?, format)?))
}

/// Shows the name and colour legend.
pub fn names(manager: &SourceManager) -> ClientResult<Output> {
    Ok(Output::text(format_names(&manager.names()?)))
}

/// Adds a source and prints its id.
pub async fn add(manager: &SourceManager, args: AddArgs) -> ClientResult<Output> {
    let mut input = NewSource::new(args.name, args.provider, args.colour);
    input.url = join_urls(&args.url);
    input.auth_code = args.auth_code;

    let config = manager.add(input).await?;
    Ok(Output::text(format!(
        "Calendar {} added with id {}",
        config.display_name, config.id
    )))
}

/// Updates a source. Name and colour default to their current values.
pub async fn update(manager: &SourceManager, args: UpdateArgs) -> ClientResult<Output> {
    let existing = manager.get(&args.id)?;
    let edits = SourceEdits {
        display_name: args.name.unwrap_or(existing.display_name),
        colour: args.colour.unwrap_or(existing.colour),
        url: join_urls(&args.url),
    };

    let config = manager.update(&args.id, edits).await?;
    Ok(Output::text(format!("Calendar {} updated", config.display_name)))
}

/// Removes a source.
pub async fn remove(manager: &SourceManager, id: &str) -> ClientResult<Output> {
    let removed = manager.remove(id).await?;
    Ok(Output::text(format!("Calendar {} removed", removed.display_name)))
}
