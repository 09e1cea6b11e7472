use super::{json_pretty, EXIT_SUCCESS};
use pipspec_core::Engine;
use pipspec_schema::{Entry, Section};
use std::path::Path;

pub fn run(
    engine: &Engine,
    manifest_path: &Path,
    section: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let filter = section.map(str::parse::<Section>).transpose()?;
    let manifest = engine.load(manifest_path).map_err(|e| e.to_string())?;
    let entries: Vec<Entry> = manifest
        .entries()
        .into_iter()
        .filter(|e| filter.map_or(true, |s| e.section == s))
        .collect();

    if json {
        println!("{}", json_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("no entries");
    } else {
        for entry in &entries {
            println!("{entry}");
        }
    }
    Ok(EXIT_SUCCESS)
}
