use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;
use tower_lsp::lsp_types::ClientCapabilities;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub hover: bool,
    /// Report `ERROR`/`MISSING` parse nodes
    pub syntax_diagnostics: bool,
    /// Offer names from modules that are not imported yet
    pub auto_import_completions: bool,
    /// Offer `Module.name` forms in expressions
    pub qualified_completions: bool,
    pub completion_limit: usize,
}

impl Settings {
    /// Reads `~/.config/elmwood/settings` and `<root>/.elmwood`, in that
    /// order; both are optional.
    pub fn new(root_dir: &Path, capabilities: &ClientCapabilities) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/elmwood/settings");
        Self::from_sources(&expanded, root_dir, capabilities)
    }

    fn from_sources(
        user_settings: &str,
        root_dir: &Path,
        capabilities: &ClientCapabilities,
    ) -> anyhow::Result<Settings> {
        let settings = Config::builder()
            .add_source(File::with_name(user_settings).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.elmwood",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("hover", true)?
            .set_default("syntax_diagnostics", true)?
            .set_default("auto_import_completions", true)?
            .set_default("qualified_completions", true)?
            .set_default("completion_limit", 100)?
            .set_override_option(
                "hover",
                capabilities
                    .text_document
                    .as_ref()
                    .and_then(|it| match it.hover.is_none() {
                        true => Some(false),
                        false => None,
                    }),
            )?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            hover: true,
            syntax_diagnostics: true,
            auto_import_completions: true,
            qualified_completions: true,
            completion_limit: 100,
        }
    }
}
