use super::{json_pretty, EXIT_LOCK_ERROR, EXIT_SUCCESS};
use pipspec_core::Engine;
use std::path::Path;

pub fn run(
    engine: &Engine,
    manifest_path: &Path,
    lock_path: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    let result = engine
        .verify_lock(manifest_path, lock_path)
        .map_err(|e| e.to_string())?;
    let in_sync = result.drift.is_empty();

    if json {
        let payload = serde_json::json!({
            "manifest": manifest_path,
            "lock": result.lock_path,
            "digest": result.identity.digest,
            "in_sync": in_sync,
            "drift": result.drift,
        });
        println!("{}", json_pretty(&payload)?);
    } else if in_sync {
        println!(
            "{} satisfies {}",
            result.lock_path.display(),
            manifest_path.display()
        );
    } else {
        println!(
            "{} has drifted from {}:",
            result.lock_path.display(),
            manifest_path.display()
        );
        for d in &result.drift {
            println!("  {d}");
        }
    }

    Ok(if in_sync { EXIT_SUCCESS } else { EXIT_LOCK_ERROR })
}
