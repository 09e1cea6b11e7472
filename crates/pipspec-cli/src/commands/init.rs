use super::{json_pretty, write_atomic, EXIT_SUCCESS};
use pipspec_schema::{get_preset, list_presets, parse_manifest_str};
use std::path::Path;

fn print_presets(json: bool) -> Result<(), String> {
    if json {
        println!("{}", json_pretty(&list_presets())?);
    } else {
        for p in list_presets() {
            println!("{:<14} {}", p.name, p.description);
        }
    }
    Ok(())
}

pub fn run(dest: &Path, preset: &str, force: bool, list: bool, json: bool) -> Result<u8, String> {
    if list {
        print_presets(json)?;
        return Ok(EXIT_SUCCESS);
    }

    let template = get_preset(preset).ok_or_else(|| {
        let names: Vec<_> = list_presets().iter().map(|p| p.name).collect();
        format!(
            "unknown preset '{preset}' (expected: {})",
            names.join(", ")
        )
    })?;
    if dest.exists() && !force {
        return Err(format!(
            "refusing to overwrite existing {} (pass --force)",
            dest.display()
        ));
    }

    let manifest = parse_manifest_str(template.manifest)
        .map_err(|e| format!("preset '{preset}' is invalid: {e}"))?;
    write_atomic(dest, &manifest.to_toml_string())?;

    if json {
        let payload = serde_json::json!({
            "status": "written",
            "path": dest,
            "preset": template.name,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("wrote {} from preset '{}'", dest.display(), template.name);
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_each_preset() {
        let dir = tempfile::tempdir().unwrap();
        for p in list_presets() {
            let dest = dir.path().join(format!("{}.Pipfile", p.name));
            assert_eq!(run(&dest, p.name, false, false, false).unwrap(), EXIT_SUCCESS);
            let written = pipspec_schema::parse_manifest_file(&dest).unwrap();
            assert!(written.normalize().is_ok());
        }
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Pipfile");
        std::fs::write(&dest, "[packages]\n").unwrap();
        let err = run(&dest, "minimal", false, false, false).unwrap_err();
        assert!(err.contains("--force"));
        assert!(run(&dest, "minimal", true, false, false).is_ok());
    }

    #[test]
    fn rejects_unknown_preset() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&dir.path().join("Pipfile"), "nope", false, false, false).unwrap_err();
        assert!(err.contains("unknown preset 'nope'"));
        assert!(err.contains("data-science"));
    }
}
