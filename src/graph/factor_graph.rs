//! FactorGraph — validated collections of factor nodes with wave scheduling.
//!
//! Purpose
//! -------
//! Assemble factor nodes into a single callable model: validate the node
//! collection once, derive a dependency-respecting call sequence, and
//! evaluate the joint log value by accumulating every node's contribution
//! over a shared variable namespace.
//!
//! Key behaviors
//! -------------
//! - Construction validates deterministic-name uniqueness, derives the
//!   graph's variable and plate namespaces, schedules nodes into waves, and
//!   computes the shared positional call signature. A graph that constructs
//!   is guaranteed to evaluate without dependency failures.
//! - Evaluation runs the waves in order, aligning each node's log
//!   contribution to the graph-wide plate order before accumulating, and
//!   threads deterministic outputs into the variable map for later waves.
//! - `*` composes nodes and graphs into larger graphs by concatenating
//!   member nodes and re-running construction validation.
//!
//! Invariants & assumptions
//! ------------------------
//! - A graph is immutable after construction; composition builds a new one.
//! - The call sequence is total: every node lands in exactly one wave, and
//!   each wave's requirements are satisfiable from the graph's inputs plus
//!   all earlier waves' outputs.
//! - Member-node insertion order is preserved for display and used as the
//!   tie-break within a wave.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction validation, scheduling (including
//!   cycles), evaluation with plate alignment, and the composition algebra.
//! - End-to-end model coverage lives in `tests/`.
use crate::graph::core::broadcast;
use crate::graph::core::plate::Plate;
use crate::graph::core::validation;
use crate::graph::core::value::{scalar, FactorValue, Tensor};
use crate::graph::core::variable::Variable;
use crate::graph::errors::{GraphError, GraphResult};
use crate::graph::nodes::deterministic::DeterministicFactorNode;
use crate::graph::nodes::factor_node::FactorNode;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Mul;

// -------------------------------------------------------------------------
// Graph membership
// -------------------------------------------------------------------------

/// One member of a factor graph.
#[derive(Clone)]
pub enum GraphNode {
    /// A factor contributing a log value.
    Factor(FactorNode),
    /// A factor producing deterministic variables (zero log contribution).
    Deterministic(DeterministicFactorNode),
}

impl GraphNode {
    /// The member factor's name.
    pub fn name(&self) -> &str {
        match self {
            GraphNode::Factor(node) => node.name(),
            GraphNode::Deterministic(node) => node.name(),
        }
    }

    /// Ordered plates the member ranges over.
    pub fn plates(&self) -> &[Plate] {
        match self {
            GraphNode::Factor(node) => node.plates(),
            GraphNode::Deterministic(node) => node.plates(),
        }
    }

    /// Ordered positional variables of the member.
    pub fn positional_variables(&self) -> &[Variable] {
        match self {
            GraphNode::Factor(node) => node.positional_variables(),
            GraphNode::Deterministic(node) => node.node().positional_variables(),
        }
    }

    /// Deterministic output variables declared by the member.
    pub fn deterministic_variables(&self) -> &[Variable] {
        match self {
            GraphNode::Factor(_) => &[],
            GraphNode::Deterministic(node) => node.output_variables(),
        }
    }

    /// Every variable the member binds as an input.
    pub fn input_variables(&self) -> Vec<&Variable> {
        match self {
            GraphNode::Factor(node) => node.variables().collect(),
            GraphNode::Deterministic(node) => node.node().variables().collect(),
        }
    }

    /// Names the member binds that are absent from `available`.
    pub fn variables_difference(&self, available: &BTreeSet<String>) -> BTreeSet<String> {
        match self {
            GraphNode::Factor(node) => node.variables_difference(available),
            GraphNode::Deterministic(node) => node.variables_difference(available),
        }
    }

    /// Render the member's call signature for error messages.
    pub fn call_signature(&self) -> String {
        match self {
            GraphNode::Factor(node) => node.call_signature(),
            GraphNode::Deterministic(node) => node.call_signature(),
        }
    }

    /// Call the member with positional and keyword values.
    pub fn call(
        &self, positional: &[Tensor], named: &HashMap<String, Tensor>,
    ) -> GraphResult<FactorValue> {
        match self {
            GraphNode::Factor(node) => node.call(positional, named),
            GraphNode::Deterministic(node) => node.call(positional, named),
        }
    }
}

impl From<FactorNode> for GraphNode {
    fn from(node: FactorNode) -> GraphNode {
        GraphNode::Factor(node)
    }
}

impl From<DeterministicFactorNode> for GraphNode {
    fn from(node: DeterministicFactorNode) -> GraphNode {
        GraphNode::Deterministic(node)
    }
}

impl std::fmt::Display for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphNode::Factor(node) => write!(f, "{node}"),
            GraphNode::Deterministic(node) => write!(f, "{node}"),
        }
    }
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GraphNode({self})")
    }
}

// -------------------------------------------------------------------------
// FactorGraph
// -------------------------------------------------------------------------

/// A validated, schedulable collection of factor nodes.
#[derive(Clone)]
pub struct FactorGraph {
    nodes: Vec<GraphNode>,
    name: String,
    variables: BTreeMap<String, Variable>,
    deterministic_variables: BTreeMap<String, Variable>,
    plates: Vec<Plate>,
    positional: Vec<Variable>,
    call_sequence: Vec<Vec<usize>>,
}

impl FactorGraph {
    /// Validate a node collection and derive its evaluation plan.
    ///
    /// # Errors
    /// - [`GraphError::DuplicateDeterministicVariables`] when two members
    ///   declare the same deterministic variable name.
    /// - [`GraphError::UnresolvableDependencies`] when some members can
    ///   never be called, reporting each blocked member and its unresolved
    ///   names.
    pub fn new(nodes: Vec<GraphNode>) -> GraphResult<FactorGraph> {
        let duplicates = validation::duplicate_names(
            nodes.iter().flat_map(|node| node.deterministic_variables().iter()),
        );
        if !duplicates.is_empty() {
            return Err(GraphError::DuplicateDeterministicVariables { names: duplicates });
        }

        let mut deterministic_variables: BTreeMap<String, Variable> = BTreeMap::new();
        for node in &nodes {
            for variable in node.deterministic_variables() {
                deterministic_variables.insert(variable.name().to_string(), variable.clone());
            }
        }
        let mut variables: BTreeMap<String, Variable> = BTreeMap::new();
        for node in &nodes {
            for variable in node.input_variables() {
                if !deterministic_variables.contains_key(variable.name()) {
                    variables
                        .entry(variable.name().to_string())
                        .or_insert_with(|| variable.clone());
                }
            }
        }

        let plates = validation::ordered_plate_union(nodes.iter().map(|node| node.plates()));
        let call_sequence = Self::schedule(&nodes, &variables)?;

        let deterministic_names: BTreeSet<String> =
            deterministic_variables.keys().cloned().collect();
        let positional_lists: Vec<&[Variable]> =
            nodes.iter().map(|node| node.positional_variables()).collect();
        let positional =
            validation::shared_positional_prefix(&positional_lists, &deterministic_names);

        let name =
            nodes.iter().map(|node| node.name().to_string()).collect::<Vec<_>>().join(".");

        Ok(FactorGraph {
            nodes,
            name,
            variables,
            deterministic_variables,
            plates,
            positional,
            call_sequence,
        })
    }

    // Missing-set grouping: nodes sharing the same unresolved-name set form
    // a group; a wave is the group whose set is empty, and its deterministic
    // outputs shrink the remaining sets.
    fn schedule(
        nodes: &[GraphNode], variables: &BTreeMap<String, Variable>,
    ) -> GraphResult<Vec<Vec<usize>>> {
        let available: BTreeSet<String> = variables.keys().cloned().collect();
        let mut groups: BTreeMap<BTreeSet<String>, Vec<usize>> = BTreeMap::new();
        for (index, node) in nodes.iter().enumerate() {
            groups.entry(node.variables_difference(&available)).or_default().push(index);
        }

        let mut call_sequence = Vec::new();
        while !groups.is_empty() {
            let Some(mut wave) = groups.remove(&BTreeSet::new()) else {
                let mut blocked: Vec<(usize, Vec<String>)> = groups
                    .into_iter()
                    .flat_map(|(missing, members)| {
                        let names: Vec<String> = missing.into_iter().collect();
                        members.into_iter().map(move |index| (index, names.clone()))
                    })
                    .collect();
                blocked.sort_by_key(|&(index, _)| index);
                return Err(GraphError::UnresolvableDependencies {
                    blocked: blocked
                        .into_iter()
                        .map(|(index, missing)| (nodes[index].call_signature(), missing))
                        .collect(),
                });
            };
            wave.sort_unstable();

            let produced: BTreeSet<String> = wave
                .iter()
                .flat_map(|&index| {
                    nodes[index]
                        .deterministic_variables()
                        .iter()
                        .map(|variable| variable.name().to_string())
                })
                .collect();
            let drained = std::mem::take(&mut groups);
            for (missing, members) in drained {
                let remaining: BTreeSet<String> =
                    missing.difference(&produced).cloned().collect();
                groups.entry(remaining).or_default().extend(members);
            }
            call_sequence.push(wave);
        }
        Ok(call_sequence)
    }

    /// The graph's name: member factor names joined with `"."`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member nodes in insertion order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Required input variables, keyed by name.
    pub fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    /// Deterministic variables produced inside the graph, keyed by name.
    pub fn deterministic_variables(&self) -> &BTreeMap<String, Variable> {
        &self.deterministic_variables
    }

    /// Ordered graph-wide plate union.
    pub fn plates(&self) -> &[Plate] {
        &self.plates
    }

    /// Number of plates the graph ranges over.
    pub fn ndim(&self) -> usize {
        self.plates.len()
    }

    /// Shared positional parameters, in call order.
    pub fn positional_variables(&self) -> &[Variable] {
        &self.positional
    }

    /// Scheduled waves of node indices, ascending within a wave.
    pub fn call_sequence(&self) -> &[Vec<usize>] {
        &self.call_sequence
    }

    /// Render the graph's call signature for error messages.
    pub fn call_signature(&self) -> String {
        let mut parts: Vec<String> =
            self.positional.iter().map(|variable| variable.name().to_string()).collect();
        let keyword: Vec<String> = self
            .variables
            .keys()
            .filter(|name| !self.positional.iter().any(|variable| variable.name() == *name))
            .cloned()
            .collect();
        if !keyword.is_empty() {
            parts.push("*".to_string());
            parts.extend(keyword);
        }
        format!("{}({})", self.name, parts.join(", "))
    }

    /// Evaluate the graph, returning the joint log value and every
    /// deterministic variable produced along the way.
    ///
    /// Positional values fill the shared positional parameters in order;
    /// everything else resolves from `named` by variable name. Extra named
    /// entries are ignored.
    ///
    /// # Errors
    /// - [`GraphError::TooManyArguments`] when more positional values are
    ///   supplied than the graph has positional parameters.
    /// - [`GraphError::MissingArguments`] enumerating every required
    ///   variable left unsupplied.
    /// - Shape and factor errors from member nodes, propagated unchanged.
    pub fn call(
        &self, positional: &[Tensor], named: &HashMap<String, Tensor>,
    ) -> GraphResult<FactorValue> {
        if positional.len() > self.positional.len() {
            return Err(GraphError::TooManyArguments {
                given: positional.len(),
                expected: self.positional.len(),
                signature: self.call_signature(),
            });
        }

        let mut values: HashMap<String, Tensor> =
            HashMap::with_capacity(self.variables.len() + self.deterministic_variables.len());
        for (name, value) in named {
            if self.variables.contains_key(name) {
                values.insert(name.clone(), value.clone());
            }
        }
        for (variable, value) in self.positional.iter().zip(positional) {
            values.insert(variable.name().to_string(), value.clone());
        }
        let missing: Vec<String> =
            self.variables.keys().filter(|name| !values.contains_key(*name)).cloned().collect();
        if !missing.is_empty() {
            return Err(GraphError::MissingArguments {
                missing,
                signature: self.call_signature(),
            });
        }

        let mut log_value = scalar(0.0);
        let mut deterministic_values = HashMap::new();
        for wave in &self.call_sequence {
            for &index in wave {
                let node = &self.nodes[index];
                let result = node.call(positional, &values)?;
                let aligned = broadcast::broadcast_plates(
                    result.log_value,
                    node.plates(),
                    &self.plates,
                    node.name(),
                )?;
                log_value = broadcast::add_arrays(&log_value, &aligned)?;
                for (name, value) in result.deterministic_values {
                    values.insert(name.clone(), value.clone());
                    deterministic_values.insert(name, value);
                }
            }
        }
        Ok(FactorValue::new(log_value, deterministic_values))
    }
}

impl std::fmt::Display for FactorGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members: Vec<String> = self.nodes.iter().map(|node| node.to_string()).collect();
        write!(f, "({})", members.join(" * "))
    }
}

impl std::fmt::Debug for FactorGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FactorGraph({self})")
    }
}

// -------------------------------------------------------------------------
// Composition algebra
// -------------------------------------------------------------------------

/// Decompose a value into the graph members it contributes.
///
/// Bare nodes behave as one-node graphs; graphs contribute their members in
/// insertion order. Implementing this trait is what makes a type a valid
/// right-hand side of `*`.
pub trait IntoGraphNodes {
    /// The member nodes, in insertion order.
    fn into_graph_nodes(self) -> Vec<GraphNode>;
}

impl IntoGraphNodes for FactorNode {
    fn into_graph_nodes(self) -> Vec<GraphNode> {
        vec![GraphNode::Factor(self)]
    }
}

impl IntoGraphNodes for DeterministicFactorNode {
    fn into_graph_nodes(self) -> Vec<GraphNode> {
        vec![GraphNode::Deterministic(self)]
    }
}

impl IntoGraphNodes for GraphNode {
    fn into_graph_nodes(self) -> Vec<GraphNode> {
        vec![self]
    }
}

impl IntoGraphNodes for FactorGraph {
    fn into_graph_nodes(self) -> Vec<GraphNode> {
        self.nodes
    }
}

impl<T: IntoGraphNodes> Mul<T> for FactorNode {
    type Output = GraphResult<FactorGraph>;

    fn mul(self, rhs: T) -> GraphResult<FactorGraph> {
        let mut nodes = self.into_graph_nodes();
        nodes.extend(rhs.into_graph_nodes());
        FactorGraph::new(nodes)
    }
}

impl<T: IntoGraphNodes> Mul<T> for DeterministicFactorNode {
    type Output = GraphResult<FactorGraph>;

    fn mul(self, rhs: T) -> GraphResult<FactorGraph> {
        let mut nodes = self.into_graph_nodes();
        nodes.extend(rhs.into_graph_nodes());
        FactorGraph::new(nodes)
    }
}

impl<T: IntoGraphNodes> Mul<T> for GraphNode {
    type Output = GraphResult<FactorGraph>;

    fn mul(self, rhs: T) -> GraphResult<FactorGraph> {
        let mut nodes = self.into_graph_nodes();
        nodes.extend(rhs.into_graph_nodes());
        FactorGraph::new(nodes)
    }
}

impl<T: IntoGraphNodes> Mul<T> for FactorGraph {
    type Output = GraphResult<FactorGraph>;

    fn mul(self, rhs: T) -> GraphResult<FactorGraph> {
        let mut nodes = self.into_graph_nodes();
        nodes.extend(rhs.into_graph_nodes());
        FactorGraph::new(nodes)
    }
}
