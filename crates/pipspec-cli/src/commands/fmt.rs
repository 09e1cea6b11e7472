use super::{json_pretty, write_atomic, EXIT_FAILURE, EXIT_SUCCESS};
use pipspec_core::Engine;
use std::path::Path;
use tracing::debug;

pub fn run(engine: &Engine, manifest_path: &Path, check: bool, json: bool) -> Result<u8, String> {
    let current = std::fs::read_to_string(manifest_path)
        .map_err(|e| format!("failed to read manifest {}: {e}", manifest_path.display()))?;
    let manifest = engine.load(manifest_path).map_err(|e| e.to_string())?;
    let canonical = manifest.to_toml_string();
    let formatted = current == canonical;
    debug!(
        "{} is {}canonical",
        manifest_path.display(),
        if formatted { "" } else { "not " }
    );

    let status = match (formatted, check) {
        (true, _) => "unchanged",
        (false, true) => "needs-format",
        (false, false) => {
            write_atomic(manifest_path, &canonical)?;
            "formatted"
        }
    };

    if json {
        let payload = serde_json::json!({
            "manifest": manifest_path,
            "status": status,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        match status {
            "unchanged" => println!("{} is already formatted", manifest_path.display()),
            "needs-format" => println!(
                "{} is not formatted (run 'pipspec fmt')",
                manifest_path.display()
            ),
            _ => println!("formatted {}", manifest_path.display()),
        }
    }

    Ok(if status == "needs-format" {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    })
}
