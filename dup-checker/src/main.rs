mod config;
mod context;

use config::Config;
use context::Context;
use duplicate_detection::fhir::Bundle;
use duplicate_detection::{DuplicateAlert, DuplicateGroup};
use log::info;
use serde::Serialize;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use std::fs;

#[derive(Serialize)]
struct Report {
    groups: Vec<DuplicateGroup>,
    alerts: Vec<DuplicateAlert>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    TermLogger::init(
        config.level_filter()?,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: dup-checker <medication-request-bundle.json>")?;
    let bundle: Bundle = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let records = bundle.medication_records();
    info!("Loaded {} medication requests from {}", records.len(), path);

    let context = Context::new(config);
    info!("Using RxClass endpoint {}", context.config().rxclass_url());
    let groups = context.detector().detect_active_duplicates(&records).await?;
    info!("Found {} duplicate groups", groups.len());

    let alerts = groups.iter().map(DuplicateAlert::from).collect();
    let report = Report { groups, alerts };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
