//! Status command - list recent notes

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use billet_core::config::Config;

use crate::commands::{get_context, resolve_backend};
use crate::{output, StoreArgs};

#[derive(Debug, Serialize)]
struct StatusReport {
    recent_notes: Vec<String>,
}

pub fn run(store: StoreArgs, limit: usize, json: bool) -> Result<()> {
    let config = Config::new(resolve_backend(&store)).with_recent_notes(limit);
    let ctx = get_context(config)?;

    let report = StatusReport {
        recent_notes: ctx.note_service.recent(limit)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.recent_notes.is_empty() {
        println!("No notes yet.");
        return Ok(());
    }

    println!("{}", "Recent notes".bold());
    let mut table = output::create_table();
    table.set_header(vec!["Name"]);
    for name in &report.recent_notes {
        table.add_row(vec![name]);
    }
    println!("{table}");
    Ok(())
}
