//! Canonical Pipfile text output.
//!
//! Sections are written in a fixed order, packages sorted by key, and
//! detailed requirements as single-line inline tables.

use crate::entry::Section;
use crate::manifest::{DetailedRequirement, Pipfile, Requirement};
use std::collections::BTreeMap;
use std::fmt::Write;

pub fn render_pipfile(pipfile: &Pipfile) -> String {
    let mut out = String::new();
    for section in Section::ALL {
        let start = out.len();
        match section {
            Section::Source => render_sources(pipfile, &mut out),
            Section::DevPackages => render_packages(section, &pipfile.dev_packages, &mut out),
            Section::Packages => render_packages(section, &pipfile.packages, &mut out),
            Section::Requires => render_requires(pipfile, &mut out),
            Section::Scripts => render_scripts(pipfile, &mut out),
            Section::Pipenv => render_pipenv(pipfile, &mut out),
        }
        if out.len() > start {
            out.push('\n');
        }
    }
    // Drop the blank separator after the last section.
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

fn render_sources(pipfile: &Pipfile, out: &mut String) {
    for (i, source) in pipfile.sources.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str("[[source]]\n");
        let _ = writeln!(out, "name = {}", quote(&source.name));
        let _ = writeln!(out, "url = {}", quote(&source.url));
        let _ = writeln!(out, "verify_ssl = {}", source.verify_ssl);
    }
}

fn render_packages(section: Section, packages: &BTreeMap<String, Requirement>, out: &mut String) {
    let _ = writeln!(out, "[{section}]");
    for (name, req) in packages {
        let value = match req {
            Requirement::Version(v) => quote(v),
            Requirement::Detailed(d) => inline_table(d),
        };
        let _ = writeln!(out, "{} = {value}", key(name));
    }
}

fn render_requires(pipfile: &Pipfile, out: &mut String) {
    if pipfile.requires.is_empty() {
        return;
    }
    out.push_str("[requires]\n");
    if let Some(v) = &pipfile.requires.python_version {
        let _ = writeln!(out, "python_version = {}", quote(v));
    }
    if let Some(v) = &pipfile.requires.python_full_version {
        let _ = writeln!(out, "python_full_version = {}", quote(v));
    }
}

fn render_scripts(pipfile: &Pipfile, out: &mut String) {
    if pipfile.scripts.is_empty() {
        return;
    }
    out.push_str("[scripts]\n");
    for (name, command) in &pipfile.scripts {
        let _ = writeln!(out, "{} = {}", key(name), quote(command));
    }
}

fn render_pipenv(pipfile: &Pipfile, out: &mut String) {
    let flags = pipfile.pipenv.enabled_flags();
    if flags.is_empty() {
        return;
    }
    out.push_str("[pipenv]\n");
    for flag in flags {
        let _ = writeln!(out, "{flag} = true");
    }
}

/// Render a detailed requirement as a TOML inline table.
pub fn inline_table(req: &DetailedRequirement) -> String {
    let mut fields: Vec<String> = Vec::new();
    if let Some(v) = &req.version {
        fields.push(format!("version = {}", quote(v)));
    }
    if !req.extras.is_empty() {
        let extras: Vec<String> = req.extras.iter().map(|e| quote(e)).collect();
        fields.push(format!("extras = [{}]", extras.join(", ")));
    }
    let optional = [
        ("markers", &req.markers),
        ("index", &req.index),
        ("git", &req.git),
        ("ref", &req.reference),
        ("path", &req.path),
    ];
    for (name, value) in optional {
        if let Some(v) = value {
            fields.push(format!("{name} = {}", quote(v)));
        }
    }
    if req.editable {
        fields.push("editable = true".to_owned());
    }
    format!("{{{}}}", fields.join(", "))
}

fn quote(s: &str) -> String {
    toml::Value::String(s.to_owned()).to_string()
}

fn key(k: &str) -> String {
    let bare = !k.is_empty()
        && k
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if bare {
        k.to_owned()
    } else {
        quote(k)
    }
}
