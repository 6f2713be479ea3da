//! Service dependency graph.
//!
//! Produces the initialization order: every dependency before its
//! dependents. Services with no ordering constraint between them keep their
//! registration order, so the result is deterministic.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{OrchestratorError, Result};

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Nodes in registration order.
    nodes: Vec<String>,
    /// `edges[A] = [B, C]` means A depends on B and C
    edges: HashMap<String, Vec<String>>,
    /// `reverse[A] = [B, C]` means B and C depend on A
    reverse: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) {
        if !self.edges.contains_key(name) {
            self.nodes.push(name.to_string());
            self.edges.insert(name.to_string(), Vec::new());
            self.reverse.entry(name.to_string()).or_default();
        }
    }

    /// Record that `from` depends on `to`. Both must already be nodes.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<()> {
        if !self.edges.contains_key(to) {
            return Err(OrchestratorError::UnknownDependency {
                service: from.to_string(),
                dependency: to.to_string(),
            });
        }
        self.edges.entry(from.to_string()).or_default().push(to.to_string());
        self.reverse.entry(to.to_string()).or_default().push(from.to_string());
        Ok(())
    }

    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.reverse.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Kahn's algorithm. A cycle is reported with its path.
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|n| (n.as_str(), self.edges.get(n).map_or(0, Vec::len)))
            .collect();

        let mut queue: VecDeque<&str> = self
            .nodes
            .iter()
            .map(String::as_str)
            .filter(|n| in_degree.get(n) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = queue.pop_front() {
            order.push(node.to_string());

            let mut ready: Vec<&str> = Vec::new();
            for dependent in self.dependents_of(node) {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(dependent.as_str());
                    }
                }
            }
            ready.sort_by_key(|n| self.position(n));
            queue.extend(ready);
        }

        if order.len() != self.nodes.len() {
            return Err(OrchestratorError::DependencyCycle(self.find_cycle()));
        }
        Ok(order)
    }

    fn position(&self, name: &str) -> usize {
        self.nodes.iter().position(|n| n == name).unwrap_or(usize::MAX)
    }

    fn find_cycle(&self) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node.as_str()) {
                if let Some(cycle) = self.cycle_dfs(node, &mut visited, &mut on_stack, &mut path) {
                    return cycle;
                }
            }
        }
        Vec::new()
    }

    fn cycle_dfs<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        on_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(node);

        for dep in self.edges.get(node).into_iter().flatten() {
            if on_stack.contains(dep.as_str()) {
                let start = path.iter().position(|n| *n == dep.as_str()).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(dep.clone());
                return Some(cycle);
            }
            if !visited.contains(dep.as_str()) {
                if let Some(cycle) = self.cycle_dfs(dep, visited, on_stack, path) {
                    return Some(cycle);
                }
            }
        }

        on_stack.remove(node);
        path.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for n in nodes {
            g.add_node(n);
        }
        for (from, to) in edges {
            g.add_edge(from, to).unwrap();
        }
        g
    }

    #[test]
    fn chain_orders_dependencies_first() {
        let g = graph(&["c", "b", "a"], &[("c", "b"), ("b", "a")]);
        assert_eq!(g.topological_sort().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn independent_nodes_keep_registration_order() {
        let g = graph(&["x", "y", "z"], &[]);
        assert_eq!(g.topological_sort().unwrap(), vec!["x", "y", "z"]);
    }

    #[test]
    fn diamond_respects_every_edge() {
        let g = graph(
            &["app", "cache", "db", "api"],
            &[("app", "api"), ("api", "db"), ("api", "cache"), ("cache", "db")],
        );
        let order = g.topological_sort().unwrap();
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("db") < pos("cache"));
        assert!(pos("cache") < pos("api"));
        assert!(pos("api") < pos("app"));
    }

    #[test]
    fn cycle_is_reported_with_path() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        match g.topological_sort() {
            Err(OrchestratorError::DependencyCycle(path)) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 4);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let mut g = DependencyGraph::new();
        g.add_node("a");
        assert!(matches!(
            g.add_edge("a", "ghost"),
            Err(OrchestratorError::UnknownDependency { .. })
        ));
    }
}
