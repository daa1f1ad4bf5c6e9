//! Dependency graph construction and traversal.
//!
//! Nodes are addressed by package identifier and stored in a petgraph arena;
//! edges point from a package to the packages it declares. A declared
//! dependency with no installed package behind it is materialised as a
//! [`Node::Placeholder`], so every edge always has a target.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use keel_core::lockfile::{Dependency, LockPackage, PackageType};
use miette::Diagnostic;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use thiserror::Error;

/// A node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An installed package backed by a lock entry.
    Resolved(LockPackage),
    /// A declared dependency with no installed package behind it yet.
    Placeholder(Dependency),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Self::Resolved(pkg) => &pkg.source,
            Self::Placeholder(dep) => &dep.package,
        }
    }

    /// Installed version; placeholders have none.
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Resolved(pkg) => Some(&pkg.version),
            Self::Placeholder(_) => None,
        }
    }

    /// Declared outgoing dependencies; placeholders have none.
    pub fn dependencies(&self) -> &[Dependency] {
        match self {
            Self::Resolved(pkg) => &pkg.dependencies,
            Self::Placeholder(_) => &[],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(pkg) if pkg.version.is_empty() => f.write_str(&pkg.source),
            Self::Resolved(pkg) => write!(f, "{}:{}", pkg.source, pkg.version),
            Self::Placeholder(dep) => write!(f, "{} (missing)", dep.package),
        }
    }
}

/// Edge label in the dependency graph.
#[derive(Debug, Clone)]
pub struct DepEdge {
    pub kind: PackageType,
    pub constraint: Option<String>,
}

/// Errors raised while building or querying a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum GraphError {
    #[error("node {id} already exists")]
    DuplicateNode { id: String },

    #[error("node {id} not found")]
    NodeNotFound { id: String },

    #[error("dependency {from} -> {to} would introduce a cycle")]
    #[diagnostic(help("the lock or package metadata declares a circular dependency"))]
    Cycle { from: String, to: String },

    #[error("cannot link node {id}: {message}")]
    Link { id: String, message: String },
}

/// Reads a node during construction and reports the dependencies it should
/// have edges to.
pub trait Linker {
    fn link(&self, position: usize, node: &Node) -> Result<Vec<Dependency>, GraphError>;
}

/// Links every node to the dependencies it declares.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredDependencies;

impl Linker for DeclaredDependencies {
    fn link(&self, _position: usize, node: &Node) -> Result<Vec<Dependency>, GraphError> {
        Ok(node.dependencies().to_vec())
    }
}

/// The graph operations resolution relies on.
///
/// [`DependencyGraph`] is the implementation; the trait is the seam for
/// substituting another one.
pub trait Dag {
    /// Index `nodes`, then apply each linker to every `(position, node)`
    /// pair. Returns the placeholders created along the way.
    fn init(&mut self, nodes: Vec<Node>, linkers: &[&dyn Linker]) -> Result<Vec<Node>, GraphError>;

    /// Insert a new node without edges.
    fn add_node(&mut self, node: Node) -> Result<(), GraphError>;

    fn node_exists(&self, id: &str) -> bool;

    /// Replace or insert each node, re-linking its declared dependencies.
    fn add_or_update_nodes(&mut self, nodes: Vec<Node>) -> Result<(), GraphError>;

    /// Point lookup. A missing node is [`GraphError::NodeNotFound`].
    fn get_node(&self, id: &str) -> Result<&Node, GraphError>;

    /// Every node reachable from `id`, excluding `id` itself.
    fn trace_node(&self, id: &str) -> Result<BTreeMap<String, Node>, GraphError>;
}

/// An acyclic dependency graph backed by petgraph.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Node, DepEdge>,
    /// Lookup from package identifier to node index.
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from lock entries, linking their declared dependencies.
    pub fn from_packages(packages: &[LockPackage]) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        let nodes = packages.iter().cloned().map(Node::Resolved).collect();
        let linkers: [&dyn Linker; 1] = [&DeclaredDependencies];
        graph.init(nodes, &linkers)?;
        Ok(graph)
    }

    fn insert(&mut self, node: Node) -> Result<NodeIndex, GraphError> {
        if self.index.contains_key(node.id()) {
            return Err(GraphError::DuplicateNode {
                id: node.id().to_string(),
            });
        }
        let id = node.id().to_string();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        Ok(idx)
    }

    /// Add an edge from `from` to the node for `dep`, creating a placeholder
    /// when no such node exists yet.
    fn link(
        &mut self,
        from: NodeIndex,
        dep: Dependency,
        created: &mut Vec<Node>,
    ) -> Result<(), GraphError> {
        let to = match self.index.get(&dep.package) {
            Some(&idx) => idx,
            None => {
                let placeholder = Node::Placeholder(dep.clone());
                created.push(placeholder.clone());
                self.insert(placeholder)?
            }
        };

        if from == to || has_path_connecting(&self.graph, to, from, None) {
            return Err(GraphError::Cycle {
                from: self.graph[from].id().to_string(),
                to: dep.package,
            });
        }

        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(
                from,
                to,
                DepEdge {
                    kind: dep.kind,
                    constraint: dep.version,
                },
            );
        }
        Ok(())
    }

    fn relink(&mut self, idx: NodeIndex, created: &mut Vec<Node>) -> Result<(), GraphError> {
        let mut stale: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        // Removal swaps the last edge into the freed slot; go high to low.
        stale.sort_unstable_by(|a, b| b.cmp(a));
        for edge in stale {
            self.graph.remove_edge(edge);
        }

        let deps = self.graph[idx].dependencies().to_vec();
        for dep in deps {
            self.link(idx, dep, created)?;
        }
        Ok(())
    }

    /// Direct dependencies of a node.
    pub fn dependencies_of(&self, id: &str) -> Vec<(&Node, &DepEdge)> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut deps: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (&self.graph[e.target()], e.weight()))
            .collect();
        deps.sort_by(|a, b| a.0.id().cmp(b.0.id()));
        deps
    }

    /// Reverse dependencies (who depends on this node).
    pub fn dependents_of(&self, id: &str) -> Vec<&Node> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut dependents: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| &self.graph[e.source()])
            .collect();
        dependents.sort_by(|a, b| a.id().cmp(b.id()));
        dependents
    }

    /// Placeholders currently in the graph, sorted by identifier.
    pub fn placeholders(&self) -> Vec<&Node> {
        let mut nodes: Vec<_> = self
            .graph
            .node_weights()
            .filter(|n| n.is_placeholder())
            .collect();
        nodes.sort_by(|a, b| a.id().cmp(b.id()));
        nodes
    }

    /// Print the dependency tree below `id` to a string.
    pub fn print_tree(&self, id: &str, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let Some(&root) = self.index.get(id) else {
            return output;
        };
        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = HashSet::new();
        visited.insert(root);
        let deps = self.children(root);
        let count = deps.len();
        for (i, child) in deps.into_iter().enumerate() {
            self.print_subtree(&mut output, child, "", i == count - 1, 1, max_depth, &mut visited);
        }
        output
    }

    fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<_> = self.graph.edges(idx).map(|e| e.target()).collect();
        children.sort_by(|a, b| self.graph[*a].id().cmp(self.graph[*b].id()));
        children
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.children(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(
                output,
                child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Number of nodes, placeholders included.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Dag for DependencyGraph {
    fn init(&mut self, nodes: Vec<Node>, linkers: &[&dyn Linker]) -> Result<Vec<Node>, GraphError> {
        self.graph.clear();
        self.index.clear();

        let mut order = Vec::with_capacity(nodes.len());
        for node in nodes {
            order.push(self.insert(node)?);
        }

        let mut created = Vec::new();
        for (position, idx) in order.into_iter().enumerate() {
            for linker in linkers {
                let deps = linker.link(position, &self.graph[idx])?;
                for dep in deps {
                    self.link(idx, dep, &mut created)?;
                }
            }
        }

        tracing::debug!(
            "built dependency graph: {} nodes, {} edges, {} placeholders",
            self.graph.node_count(),
            self.graph.edge_count(),
            created.len()
        );
        Ok(created)
    }

    fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        self.insert(node).map(|_| ())
    }

    fn node_exists(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn add_or_update_nodes(&mut self, nodes: Vec<Node>) -> Result<(), GraphError> {
        let mut created = Vec::new();
        for node in nodes {
            let idx = match self.index.get(node.id()) {
                Some(&idx) => {
                    self.graph[idx] = node;
                    idx
                }
                None => self.insert(node)?,
            };
            self.relink(idx, &mut created)?;
        }
        if !created.is_empty() {
            tracing::debug!("upsert created {} placeholders", created.len());
        }
        Ok(())
    }

    fn get_node(&self, id: &str) -> Result<&Node, GraphError> {
        self.index
            .get(id)
            .map(|&idx| &self.graph[idx])
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })
    }

    fn trace_node(&self, id: &str) -> Result<BTreeMap<String, Node>, GraphError> {
        let &start = self
            .index
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })?;

        let mut tree = BTreeMap::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            if idx == start {
                continue;
            }
            let node = &self.graph[idx];
            tree.insert(node.id().to_string(), node.clone());
        }
        Ok(tree)
    }
}
