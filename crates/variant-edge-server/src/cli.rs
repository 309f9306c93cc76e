//! Offline commands: inspect the rule table and rewrite local documents.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use variant_edge::{Branding, MarkupTransformer, RuleSet};

/// Render the rule table for `branding` as pretty JSON.
pub fn rules_json(branding: &Branding) -> Result<String> {
    let rules = RuleSet::branded(branding);
    Ok(serde_json::to_string_pretty(&rules)?)
}

/// Rewrite the document at `input` (`-` reads stdin).
pub fn transform_input(input: &Path, branding: &Branding) -> Result<String> {
    let html = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };

    let transformer = MarkupTransformer::branded(branding)?;
    Ok(transformer.transform_str(&html)?)
}
