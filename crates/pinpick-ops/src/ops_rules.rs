//! Operation: print the loaded compatibility rules and aliases.

use std::path::Path;

use pinpick_resolver::graph::RuleGraph;

use crate::project::Project;

pub fn rules(project_root: &Path) -> miette::Result<()> {
    let project = Project::load(project_root)?;
    print!("{}", render(&project));
    Ok(())
}

/// Rules grouped by the dependent that activates them, then aliases.
pub fn render(project: &Project) -> String {
    let mut out = String::new();
    if project.rules.is_empty() {
        out.push_str("No compatibility rules.\n");
    } else {
        out.push_str("Compatibility rules (dependent, then the packages it caps):\n");
        out.push_str(&RuleGraph::from_rules(&project.rules).print_tree());
    }
    let aliases: Vec<(&str, &str)> = project.aliases.iter().collect();
    if aliases.is_empty() {
        out.push_str("No aliases.\n");
    } else {
        out.push_str("Aliases:\n");
        for (alias, canonical) in aliases {
            out.push_str(&format!("  {alias} -> {canonical}\n"));
        }
    }
    out
}
