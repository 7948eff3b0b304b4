//! YAML loading and `${VAR}` environment expansion for [`super::PipelineConfig`].
//!
//! spec §1 names configuration loading an external collaborator of the core
//! engine; this module is the ambient convenience layer that plays that
//! role, grounded on the teacher's `config.rs`/`ref_utils.rs` use of
//! `serde_yaml` and `regex`.

use super::PipelineConfig;
use crate::error::SiphonError;
use std::path::Path;
use std::sync::LazyLock;

static VAR_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

/// Expand `${VAR}` references against the process environment. Unset
/// variables expand to the empty string. `$VAR` (without braces) is left
/// untouched, per spec §6.
#[must_use]
pub fn expand_env(input: &str) -> String {
    VAR_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            crate::environment::var(name).unwrap_or_default()
        })
        .into_owned()
}

/// Parse and validate a pipeline configuration from a YAML string.
///
/// # Errors
///
/// Returns [`SiphonError::Configuration`] if the YAML cannot be parsed or
/// the resulting configuration fails [`PipelineConfig::validate`].
pub fn load_str(yaml: &str) -> Result<PipelineConfig, SiphonError> {
    let expanded = expand_env(yaml);
    let config: PipelineConfig = serde_yaml::from_str(&expanded)
        .map_err(|e| SiphonError::configuration(format!("invalid pipeline YAML: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a pipeline configuration from a YAML file.
///
/// # Errors
///
/// Returns [`SiphonError::Configuration`] if the file cannot be read, the
/// YAML cannot be parsed, or validation fails.
pub fn load_path(path: impl AsRef<Path>) -> Result<PipelineConfig, SiphonError> {
    let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        SiphonError::configuration(format!("reading {}: {e}", path.as_ref().display()))
    })?;
    load_str(&text)
}
