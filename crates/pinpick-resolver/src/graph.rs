//! Rule graph construction and deterministic resolution order.
//!
//! Every rule `(constrained, dependent, bound)` becomes an edge
//! `dependent -> constrained`. Resolving in topological order means a rule's
//! dependent is always settled before the package it constrains, so whether a
//! rule applies no longer depends on discovery order.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use pinpick_core::package::normalize;
use pinpick_core::rules::RuleSet;
use pinpick_core::version::Version;

/// A package queued for resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPackage {
    /// Name as it was discovered; the ledger key.
    pub observed: String,
    /// Name after alias resolution; used for rules, catalog and installer.
    pub canonical: String,
}

impl fmt::Display for PlannedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if normalize(&self.observed) == normalize(&self.canonical) {
            f.write_str(&self.observed)
        } else {
            write!(f, "{} ({})", self.observed, self.canonical)
        }
    }
}

/// Directed graph of compatibility rules backed by petgraph.
pub struct RuleGraph {
    graph: DiGraph<String, Version>,
    index: HashMap<String, NodeIndex>,
}

impl RuleGraph {
    /// Build the graph from every rule in `rules`.
    pub fn from_rules(rules: &RuleSet) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };
        for rule in rules.iter() {
            let from = graph.add_node(&rule.dependent);
            let to = graph.add_node(&rule.constrained);
            graph.graph.add_edge(from, to, rule.upper_bound.clone());
        }
        graph
    }

    /// Add or retrieve a node. Keys are normalized names.
    fn add_node(&mut self, name: &str) -> NodeIndex {
        let key = normalize(name);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.index.insert(key, idx);
        idx
    }

    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(&normalize(name)).copied()
    }

    /// Packages whose rules mention `name` as dependent, with the bound.
    pub fn constrained_by(&self, name: &str) -> Vec<(&str, &Version)> {
        let Some(idx) = self.find(name) else {
            return Vec::new();
        };
        let mut out: Vec<(&str, &Version)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (self.graph[e.target()].as_str(), e.weight()))
            .collect();
        out.sort();
        out
    }

    /// Render as `dependent` lines with the packages each one caps.
    pub fn print_tree(&self) -> String {
        let mut output = String::new();
        let roots: BTreeSet<&str> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Outgoing)
                    .next()
                    .is_some()
            })
            .map(|idx| self.graph[idx].as_str())
            .collect();
        for root in roots {
            output.push_str(&format!("{root}\n"));
            let capped = self.constrained_by(root);
            let count = capped.len();
            for (i, (name, bound)) in capped.into_iter().enumerate() {
                let connector = if i == count - 1 { "└── " } else { "├── " };
                output.push_str(&format!("{connector}{name} < {bound}\n"));
            }
        }
        output
    }
}

/// Order `packages` so that every rule's dependent is resolved before the
/// package it constrains.
///
/// Kahn's algorithm over the rule graph restricted to the packages present,
/// always taking the alphabetically first ready package, so the result is
/// fully deterministic. Packages caught in a rule cycle are appended in name
/// order after everything else.
pub fn resolution_order(packages: Vec<PlannedPackage>, rules: &RuleSet) -> Vec<PlannedPackage> {
    // group observed names that share a canonical identity
    let mut groups: BTreeMap<String, Vec<PlannedPackage>> = BTreeMap::new();
    for pkg in packages {
        groups.entry(normalize(&pkg.canonical)).or_default().push(pkg);
    }
    for members in groups.values_mut() {
        members.sort_by(|a, b| a.observed.cmp(&b.observed));
    }

    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut index: HashMap<String, NodeIndex> = HashMap::new();
    for key in groups.keys() {
        index.insert(key.clone(), graph.add_node(key.clone()));
    }
    for rule in rules.iter() {
        let (Some(&from), Some(&to)) = (
            index.get(&normalize(&rule.dependent)),
            index.get(&normalize(&rule.constrained)),
        ) else {
            continue;
        };
        if from != to && graph.find_edge(from, to).is_none() {
            graph.add_edge(from, to, ());
        }
    }

    let mut in_degree: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|idx| (idx, graph.edges_directed(idx, Direction::Incoming).count()))
        .collect();
    let mut ready: BTreeSet<(String, NodeIndex)> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&idx, _)| (graph[idx].clone(), idx))
        .collect();

    let mut ordered_keys: Vec<String> = Vec::with_capacity(groups.len());
    while let Some((key, idx)) = ready.pop_first() {
        ordered_keys.push(key);
        for edge in graph.edges_directed(idx, Direction::Outgoing) {
            let target = edge.target();
            if let Some(deg) = in_degree.get_mut(&target) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert((graph[target].clone(), target));
                }
            }
        }
        in_degree.remove(&idx);
    }

    if !in_degree.is_empty() {
        let mut cyclic: Vec<String> = in_degree.keys().map(|&idx| graph[idx].clone()).collect();
        cyclic.sort();
        tracing::warn!(
            "Compatibility rules form a cycle between {}; resolving them in name order",
            cyclic.join(", ")
        );
        ordered_keys.extend(cyclic);
    }

    ordered_keys
        .into_iter()
        .flat_map(|key| groups.remove(&key).unwrap_or_default())
        .collect()
}
