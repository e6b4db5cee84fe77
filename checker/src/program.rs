// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The program representation consumed by the engine: an interprocedural control flow graph
//! whose nodes carry instructions over value and object variables. The representation is
//! produced by an external front end and is read from JSON.

use crate::error::{EngineError, EngineResult};

use log_derive::logfn_inputs;
use petgraph::algo::dominators::{simple_fast, Dominators};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::{EdgeRef, Reversed};
use petgraph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

pub type NodeId = u32;
pub type VarId = u32;
pub type FunctionId = u32;
pub type BlockId = u32;

/// Distinguishes registers from memory objects.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// An SSA register holding one symbolic scalar.
    Value,
    /// A register whose value is a known constant.
    ConstantValue(i64),
    /// An address taken memory object (global, stack, heap or dummy).
    Object,
    /// Constant data. A null pointer is the constant object 0.
    ConstantObject(i64),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Variable {
    pub id: VarId,
    pub kind: VariableKind,
    /// The function that defines this variable. Globals have none.
    #[serde(default)]
    pub function: Option<FunctionId>,
}

impl Variable {
    pub fn is_object(&self) -> bool {
        matches!(
            self.kind,
            VariableKind::Object | VariableKind::ConstantObject(..)
        )
    }
}

/// Relational predicates of compare instructions. Signed and unsigned variants
/// are modeled identically.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
    Xor,
    And,
    Or,
    AShr,
    Shl,
}

/// The index operand of one term of a field offset computation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OffsetIndex {
    Constant(i64),
    Variable(VarId),
}

/// How an index is scaled into a flattened element offset. Layouts are computed by the front end.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexScale {
    #[default]
    None,
    /// Indexing through a pointer to elements that each flatten to `element_count` fields.
    Pointer { element_count: i64 },
    /// Indexing into an aggregate; `flattened_indices[i]` is the flattened index of element `i`.
    Aggregate { flattened_indices: Vec<i64> },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct OffsetTerm {
    pub index: OffsetIndex,
    #[serde(default)]
    pub scale: IndexScale,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldOffset {
    /// A field index known to the front end.
    Constant(i64),
    /// A list of index terms that are summed, last term first.
    Indexed(Vec<OffsetTerm>),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PhiIncoming {
    pub value: VarId,
    /// The node that defines `value`.
    pub node: NodeId,
}

/// The instruction kinds understood by the translator.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    AddressOf {
        result: VarId,
        object: VarId,
    },
    Copy {
        result: VarId,
        source: VarId,
    },
    Load {
        result: VarId,
        pointer: VarId,
    },
    Store {
        pointer: VarId,
        value: VarId,
    },
    FieldOffset {
        result: VarId,
        base: VarId,
        offset: FieldOffset,
    },
    Compare {
        result: VarId,
        left: VarId,
        right: VarId,
        predicate: Predicate,
    },
    Binary {
        result: VarId,
        left: VarId,
        right: VarId,
        operator: BinaryOperator,
    },
    /// Conditions are decided on the outgoing edges of the node that holds the branch.
    Branch {
        condition: VarId,
    },
    Phi {
        result: VarId,
        incoming: Vec<PhiIncoming>,
    },
    Select {
        result: VarId,
        condition: VarId,
        true_value: VarId,
        false_value: VarId,
    },
}

impl Instruction {
    /// All of the variable ids named by this instruction.
    pub fn variables(&self) -> Vec<VarId> {
        match self {
            Instruction::AddressOf { result, object } => vec![*result, *object],
            Instruction::Copy { result, source } => vec![*result, *source],
            Instruction::Load { result, pointer } => vec![*result, *pointer],
            Instruction::Store { pointer, value } => vec![*pointer, *value],
            Instruction::FieldOffset {
                result,
                base,
                offset,
            } => {
                let mut vars = vec![*result, *base];
                if let FieldOffset::Indexed(terms) = offset {
                    vars.extend(terms.iter().filter_map(|t| match t.index {
                        OffsetIndex::Variable(v) => Some(v),
                        OffsetIndex::Constant(..) => None,
                    }));
                }
                vars
            }
            Instruction::Compare {
                result,
                left,
                right,
                ..
            }
            | Instruction::Binary {
                result,
                left,
                right,
                ..
            } => vec![*result, *left, *right],
            Instruction::Branch { condition } => vec![*condition],
            Instruction::Phi { result, incoming } => {
                let mut vars = vec![*result];
                vars.extend(incoming.iter().map(|i| i.value));
                vars
            }
            Instruction::Select {
                result,
                condition,
                true_value,
                false_value,
            } => vec![*result, *condition, *true_value, *false_value],
        }
    }
}

/// The callee and actual arguments of a call node.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CallSite {
    pub callee: String,
    #[serde(default)]
    pub arguments: Vec<VarId>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IcfgNode {
    pub id: NodeId,
    #[serde(default)]
    pub function: Option<FunctionId>,
    /// Nodes without a block form a basic block of their own.
    #[serde(default)]
    pub block: Option<BlockId>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub call: Option<CallSite>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BranchCondition {
    pub variable: VarId,
    pub successor_value: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ParameterBinding {
    pub formal: VarId,
    pub actual: VarId,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReturnBinding {
    /// The variable in the caller that receives the returned value.
    pub receiver: VarId,
    /// The returned variable in the callee.
    pub value: VarId,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    Intra {
        #[serde(default)]
        condition: Option<BranchCondition>,
    },
    Call {
        #[serde(default)]
        parameters: Vec<ParameterBinding>,
    },
    Return {
        call_site: NodeId,
        #[serde(default)]
        result: Option<ReturnBinding>,
    },
}

/// The kind of the synthetic edge that leads into the entry node.
pub static START_EDGE_KIND: EdgeKind = EdgeKind::Intra { condition: None };

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IcfgEdge {
    pub src: NodeId,
    pub dst: NodeId,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

/// The wire format of a whole program.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProgramDescription {
    pub entry: NodeId,
    #[serde(default)]
    pub variables: Vec<Variable>,
    pub nodes: Vec<IcfgNode>,
    #[serde(default)]
    pub edges: Vec<IcfgEdge>,
}

/// A reference to an edge of the graph, or to the synthetic edge that enters the entry node.
#[derive(Clone, Copy, Debug)]
pub struct ControlFlowEdge<'program> {
    pub index: Option<EdgeIndex>,
    pub src: Option<NodeId>,
    pub dst: NodeId,
    pub kind: &'program EdgeKind,
}

impl ControlFlowEdge<'static> {
    pub fn start(entry: NodeId) -> ControlFlowEdge<'static> {
        ControlFlowEdge {
            index: None,
            src: None,
            dst: entry,
            kind: &START_EDGE_KIND,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum BlockKey {
    Block(BlockId),
    Node(NodeId),
}

impl BlockKey {
    fn of(node: &IcfgNode) -> BlockKey {
        match node.block {
            Some(block) => BlockKey::Block(block),
            None => BlockKey::Node(node.id),
        }
    }
}

/// Post-dominator tree over the basic blocks of one function.
struct PostDominatorTree {
    block_indices: HashMap<BlockKey, NodeIndex>,
    dominators: Dominators<NodeIndex>,
}

impl PostDominatorTree {
    fn post_dominates(&self, dominator: BlockKey, block: BlockKey) -> bool {
        let (Some(d), Some(b)) = (
            self.block_indices.get(&dominator),
            self.block_indices.get(&block),
        ) else {
            return false;
        };
        match self.dominators.dominators(*b) {
            Some(mut chain) => chain.any(|n| n == *d),
            None => false,
        }
    }
}

/// An immutable interprocedural control flow graph together with its variables.
pub struct Program {
    graph: Graph<IcfgNode, EdgeKind>,
    node_indices: HashMap<NodeId, NodeIndex>,
    variables: HashMap<VarId, Variable>,
    post_dominators: HashMap<Option<FunctionId>, PostDominatorTree>,
    entry: NodeId,
    max_variable_id: VarId,
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Program(entry: {}, nodes: {}, edges: {})",
            self.entry,
            self.graph.node_count(),
            self.graph.edge_count()
        )
    }
}

impl Program {
    #[logfn_inputs(TRACE)]
    pub fn from_json(json: &str) -> EngineResult<Program> {
        let description: ProgramDescription = serde_json::from_str(json)?;
        Program::new(description)
    }

    pub fn load(path: &Path) -> EngineResult<Program> {
        let json = fs::read_to_string(path)?;
        Program::from_json(&json)
    }

    /// Builds the graph, checking that every edge and call site refers to a known node.
    pub fn new(description: ProgramDescription) -> EngineResult<Program> {
        let mut graph = Graph::new();
        let mut node_indices = HashMap::new();
        let mut max_variable_id = 0;
        for node in description.nodes {
            let id = node.id;
            for instruction in &node.instructions {
                max_variable_id = instruction
                    .variables()
                    .into_iter()
                    .fold(max_variable_id, VarId::max);
            }
            if let Some(call) = &node.call {
                max_variable_id = call
                    .arguments
                    .iter()
                    .copied()
                    .fold(max_variable_id, VarId::max);
            }
            let index = graph.add_node(node);
            if node_indices.insert(id, index).is_some() {
                return Err(EngineError::DuplicateNode(id));
            }
        }
        let lookup = |id: NodeId| {
            node_indices
                .get(&id)
                .copied()
                .ok_or(EngineError::UnknownNode(id))
        };
        lookup(description.entry)?;
        for edge in description.edges {
            match &edge.kind {
                EdgeKind::Intra {
                    condition: Some(condition),
                } => max_variable_id = max_variable_id.max(condition.variable),
                EdgeKind::Intra { condition: None } => {}
                EdgeKind::Call { parameters } => {
                    for p in parameters {
                        max_variable_id = max_variable_id.max(p.formal).max(p.actual);
                    }
                }
                EdgeKind::Return { call_site, result } => {
                    lookup(*call_site)?;
                    if let Some(r) = result {
                        max_variable_id = max_variable_id.max(r.receiver).max(r.value);
                    }
                }
            }
            graph.add_edge(lookup(edge.src)?, lookup(edge.dst)?, edge.kind);
        }
        let mut variables = HashMap::new();
        for variable in description.variables {
            max_variable_id = max_variable_id.max(variable.id);
            variables.insert(variable.id, variable);
        }
        let post_dominators = compute_post_dominators(&graph);
        Ok(Program {
            graph,
            node_indices,
            variables,
            post_dominators,
            entry: description.entry,
            max_variable_id,
        })
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn max_variable_id(&self) -> VarId {
        self.max_variable_id
    }

    pub fn node(&self, id: NodeId) -> EngineResult<&IcfgNode> {
        self.node_indices
            .get(&id)
            .map(|i| &self.graph[*i])
            .ok_or(EngineError::UnknownNode(id))
    }

    /// Returns the declaration of the given variable. Undeclared variables are registers.
    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(&id)
    }

    /// The outgoing edges of `node` in the order in which the front end listed them.
    pub fn outgoing_edges(&self, node: NodeId) -> EngineResult<Vec<ControlFlowEdge<'_>>> {
        let index = self
            .node_indices
            .get(&node)
            .ok_or(EngineError::UnknownNode(node))?;
        let mut edges: Vec<ControlFlowEdge<'_>> = self
            .graph
            .edges(*index)
            .map(|e| ControlFlowEdge {
                index: Some(e.id()),
                src: Some(node),
                dst: self.graph[e.target()].id,
                kind: e.weight(),
            })
            .collect();
        edges.sort_by_key(|e| e.index);
        Ok(edges)
    }

    /// Call nodes whose callee is one of `callees`, ordered by node id.
    pub fn call_sites_of(&self, callees: &[String]) -> Vec<&IcfgNode> {
        let mut nodes: Vec<&IcfgNode> = self
            .graph
            .node_weights()
            .filter(|n| {
                n.call
                    .as_ref()
                    .map_or(false, |c| callees.iter().any(|name| *name == c.callee))
            })
            .collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    /// True if the basic block of `dominator` post-dominates the basic block of `node`.
    /// Blocks of different functions never post-dominate each other.
    pub fn post_dominates(&self, dominator: NodeId, node: NodeId) -> bool {
        let (Ok(d), Ok(n)) = (self.node(dominator), self.node(node)) else {
            return false;
        };
        if d.function != n.function {
            return false;
        }
        let (dk, nk) = (BlockKey::of(d), BlockKey::of(n));
        if dk == nk {
            return true;
        }
        self.post_dominators
            .get(&n.function)
            .map_or(false, |tree| tree.post_dominates(dk, nk))
    }
}

/// Builds a block level graph per function from the intraprocedural edges, links every block
/// without successors to a virtual exit, and computes dominators of the reversed graph.
fn compute_post_dominators(
    graph: &Graph<IcfgNode, EdgeKind>,
) -> HashMap<Option<FunctionId>, PostDominatorTree> {
    let mut block_graphs: HashMap<Option<FunctionId>, Graph<(), ()>> = HashMap::new();
    let mut block_indices: HashMap<Option<FunctionId>, HashMap<BlockKey, NodeIndex>> =
        HashMap::new();
    for node in graph.node_weights() {
        let blocks = block_graphs.entry(node.function).or_default();
        block_indices
            .entry(node.function)
            .or_default()
            .entry(BlockKey::of(node))
            .or_insert_with(|| blocks.add_node(()));
    }
    let mut seen = HashSet::new();
    for edge in graph.edge_references() {
        if !matches!(edge.weight(), EdgeKind::Intra { .. }) {
            continue;
        }
        let (src, dst) = (&graph[edge.source()], &graph[edge.target()]);
        if src.function != dst.function {
            continue;
        }
        let (sk, dk) = (BlockKey::of(src), BlockKey::of(dst));
        if sk == dk || !seen.insert((src.function, sk, dk)) {
            continue;
        }
        let indices = &block_indices[&src.function];
        if let Some(blocks) = block_graphs.get_mut(&src.function) {
            blocks.add_edge(indices[&sk], indices[&dk], ());
        }
    }
    let mut trees = HashMap::new();
    for (function, mut blocks) in block_graphs {
        let exits: Vec<NodeIndex> = blocks
            .node_indices()
            .filter(|b| blocks.neighbors(*b).next().is_none())
            .collect();
        let exit = blocks.add_node(());
        for block in exits {
            blocks.add_edge(block, exit, ());
        }
        let dominators = simple_fast(Reversed(&blocks), exit);
        trees.insert(
            function,
            PostDominatorTree {
                block_indices: block_indices.remove(&function).unwrap_or_default(),
                dominators,
            },
        );
    }
    trees
}
