use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub manifest: &'static str,
}

pub const BUILTIN_PRESETS: &[Preset] = &[
    Preset {
        name: "minimal",
        description: "Empty manifest with the public package index",
        manifest: r#"[[source]]
name = "pypi"
url = "https://pypi.org/simple"
verify_ssl = true

[dev-packages]

[packages]

[requires]
python_version = "3.8"
"#,
    },
    Preset {
        name: "data-science",
        description: "Notebooks, plotting, widgets, data analysis, and spreadsheet interop",
        manifest: r#"[[source]]
name = "pypi"
url = "https://pypi.org/simple"
verify_ssl = true

[dev-packages]

[packages]
jupyterlab = ">=1.0.0"
voila = "*"
altair = "*"
bqplot = "*"
ipywidgets = "*"
ipyvolume = "*"
matplotlib = "*"
pandas = ">=0.25.0"
numpy = ">=1.16.4"
scipy = "*"
xarray = "*"
qgrid = "*"
selenium = "*"
webdrivermanager = "*"
xlwings = "*"
xlrd = "*"
fair = "*"
numpy-financial = "*"

[requires]
python_version = "3.8"
"#,
    },
    Preset {
        name: "notebook",
        description: "JupyterLab with dashboards and test tooling",
        manifest: r#"[[source]]
name = "pypi"
url = "https://pypi.org/simple"
verify_ssl = true

[dev-packages]
pytest = "*"
nbval = "*"

[packages]
jupyterlab = ">=1.0.0"
voila = "*"
ipywidgets = "*"

[requires]
python_version = "3.8"

[scripts]
lab = "jupyter lab"
dashboard = "voila"
"#,
    },
];

pub fn get_preset(name: &str) -> Option<&'static Preset> {
    BUILTIN_PRESETS.iter().find(|p| p.name == name)
}

pub fn list_presets() -> &'static [Preset] {
    BUILTIN_PRESETS
}
