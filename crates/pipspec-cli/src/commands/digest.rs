use super::{json_pretty, EXIT_SUCCESS};
use pipspec_core::Engine;
use std::path::Path;

pub fn run(engine: &Engine, manifest_path: &Path, short: bool, json: bool) -> Result<u8, String> {
    let identity = engine.digest(manifest_path).map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "manifest": manifest_path,
            "digest": identity.digest,
            "short": identity.short,
        });
        println!("{}", json_pretty(&payload)?);
    } else if short {
        println!("{}", identity.short);
    } else {
        println!("{}", identity.digest);
    }
    Ok(EXIT_SUCCESS)
}
