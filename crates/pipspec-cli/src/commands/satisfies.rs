use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use pipspec_schema::{Version, VersionConstraint};

pub fn run(constraint: &str, version: &str, json: bool) -> Result<u8, String> {
    let parsed_constraint =
        VersionConstraint::parse(constraint).map_err(|e| format!("invalid constraint: {e}"))?;
    let parsed_version = Version::parse(version).map_err(|e| e.to_string())?;
    let satisfied = parsed_constraint.matches(&parsed_version);

    if json {
        let payload = serde_json::json!({
            "constraint": parsed_constraint,
            "version": parsed_version,
            "satisfied": satisfied,
        });
        println!("{}", json_pretty(&payload)?);
    } else if satisfied {
        println!("{parsed_version} satisfies {parsed_constraint}");
    } else {
        println!("{parsed_version} does not satisfy {parsed_constraint}");
    }

    Ok(if satisfied { EXIT_SUCCESS } else { EXIT_FAILURE })
}
