use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use std::path::Path;

pub fn run(old: &Path, new: &Path, json: bool) -> Result<u8, String> {
    let diff = pipspec_core::diff_files(old, new).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&diff)?);
    } else if diff.has_changes {
        println!("{} -> {}:", old.display(), new.display());
        for e in &diff.added {
            println!("  + {e}");
        }
        for c in &diff.changed {
            println!("  ~ [{}] {} = {} -> {}", c.section, c.key, c.old, c.new);
        }
        for e in &diff.removed {
            println!("  - {e}");
        }
    } else {
        println!("no differences");
    }

    Ok(if diff.has_changes {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    })
}
