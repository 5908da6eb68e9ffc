//! Schematic-to-graph rendering for diagnostics.

use crate::schematic::Schematic;

/// Renders a schematic to a directed-graph text description.
pub trait Cartographer: Send + Sync {
    fn write_map(&self, schematic: &Schematic) -> String;
}

/// Renders DOT: nodes are states (the initial state double-ringed), edges
/// are transitions labeled by trigger, guarded edges dashed. Output is
/// deterministic: states and edges are emitted in sorted order.
#[derive(Debug, Default)]
pub struct DotGraphCartographer;

impl DotGraphCartographer {
    pub fn new() -> Self {
        Self
    }
}

impl Cartographer for DotGraphCartographer {
    fn write_map(&self, schematic: &Schematic) -> String {
        let mut names: Vec<&str> = schematic
            .states()
            .map(|config| config.state_name().as_str())
            .collect();
        names.sort_unstable();

        let mut out = String::new();
        out.push_str(&format!("digraph \"{}\" {{\n", schematic.schematic_name()));
        out.push_str("  rankdir=LR;\n");

        for name in &names {
            if *name == schematic.initial_state().as_str() {
                out.push_str(&format!("  \"{name}\" [peripheries=2];\n"));
            } else {
                out.push_str(&format!("  \"{name}\";\n"));
            }
        }

        let mut edges: Vec<(String, String, String, bool)> = schematic
            .states()
            .flat_map(|config| {
                config.transitions().map(|transition| {
                    (
                        config.state_name().to_string(),
                        transition.resultant_state().to_string(),
                        transition.trigger().to_string(),
                        transition.guard().is_some(),
                    )
                })
            })
            .collect();
        edges.sort();

        for (from, to, trigger, guarded) in edges {
            if guarded {
                out.push_str(&format!(
                    "  \"{from}\" -> \"{to}\" [label=\"{trigger}\", style=dashed];\n"
                ));
            } else {
                out.push_str(&format!("  \"{from}\" -> \"{to}\" [label=\"{trigger}\"];\n"));
            }
        }

        out.push_str("}\n");
        out
    }
}
