//! Markdown summary of a [`Comparison`] for review workflows.

use crate::diff::engine::Comparison;
use crate::diff::model::{Change, Severity};

/// Render a Markdown summary of `comparison`.
///
/// Informational only; the structured [`Comparison`] stays authoritative.
pub fn render_human_summary(comparison: &Comparison<'_>) -> String {
    let mut out = String::new();
    let bump = &comparison.bump;

    out.push_str("## Token Registry Comparison\n\n");
    out.push_str(&format!(
        "**Version**: {} → {}  \n**Change type**: {}\n\n",
        bump.current, bump.suggested, bump.change_type
    ));

    // Identity
    let identity = &comparison.identity;
    out.push_str("### Identity\n\n");
    out.push_str(&format!(
        "| | Digest | Entries |\n\
         |---|---|---|\n\
         | Old | `{}` | {} |\n\
         | New | `{}` | {} |\n\n",
        short(&identity.old_digest),
        identity.old_entry_count,
        short(&identity.new_digest),
        identity.new_entry_count,
    ));

    out.push_str(&format!("{}\n\n", bump.summary));

    let changes = comparison.changes();
    let (structural, entries): (Vec<&Change<'_>>, Vec<&Change<'_>>) =
        changes.iter().partition(|c| c.category.is_structural());

    push_section(&mut out, "Structural Changes", &structural);
    for (title, severity) in [
        ("Breaking Changes", Severity::Breaking),
        ("Additions", Severity::Addition),
        ("Patches", Severity::Patch),
    ] {
        let group: Vec<&Change<'_>> = entries
            .iter()
            .copied()
            .filter(|c| c.severity == severity)
            .collect();
        push_section(&mut out, title, &group);
    }

    if let Some(validation) = comparison.validation.as_ref().filter(|v| !v.valid) {
        out.push_str("### ⚠ Alias Findings\n\n");
        for broken in &validation.broken_aliases {
            out.push_str(&format!(
                "- Broken alias: `{}` → `{}`\n",
                broken.token_path, broken.alias_reference
            ));
        }
        for cycle in &validation.circular_references {
            out.push_str(&format!("- Circular reference: {}\n", cycle.path.join(" → ")));
        }
        out.push('\n');
    }

    if !comparison.match_warnings.is_empty() {
        out.push_str("### Match Warnings\n\n");
        for warning in &comparison.match_warnings {
            out.push_str(&format!("- {warning}\n"));
        }
        out.push('\n');
    }

    out
}

fn push_section(out: &mut String, title: &str, changes: &[&Change<'_>]) {
    if changes.is_empty() {
        return;
    }
    out.push_str(&format!("### {title} ({})\n\n", changes.len()));
    for change in changes {
        out.push_str(&format!(
            "- **{}** `{}`: {}\n",
            change.category, change.path, change.description
        ));
    }
    out.push('\n');
}

/// Return the first 12 characters of a digest for display.
fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
