//! Dependency graph over a task set, plus a topological order.
//!
//! Nodes are indexed by first appearance in the task slice. Edges pointing
//! at tasks outside the set are dropped, which is how removed tasks vanish
//! from a scenario without any special casing.
//!
//! Cycles are not rejected. Kahn's algorithm orders everything it can, and
//! the tasks it could not reach are appended in task order. Every
//! task still gets scheduled, but times inside a cyclic subgraph are only
//! approximate.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;

use crate::task::{Dependency, Task};

#[derive(Debug, Clone)]
pub struct TaskGraph {
    /// task id -> node index, in task order.
    ids: IndexMap<String, usize>,
    /// node -> position of the task in the slice the graph was built from.
    task_pos: Vec<usize>,
    predecessors: Vec<Vec<usize>>,
    successors: Vec<Vec<usize>>,
    order: Vec<usize>,
    /// How many nodes were appended by the cycle fallback.
    unordered: usize,
}

impl TaskGraph {
    pub fn build(tasks: &[Task], edges: &[Dependency]) -> Self {
        let mut ids: IndexMap<String, usize> = IndexMap::with_capacity(tasks.len());
        let mut task_pos = Vec::with_capacity(tasks.len());
        for (pos, task) in tasks.iter().enumerate() {
            if ids.contains_key(&task.id) {
                tracing::warn!(task_id = %task.id, "duplicate task id ignored");
                continue;
            }
            ids.insert(task.id.clone(), task_pos.len());
            task_pos.push(pos);
        }

        let n = task_pos.len();
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut dropped = 0usize;

        for edge in edges {
            let (Some(&node), Some(&dep)) = (ids.get(&edge.task_id), ids.get(&edge.depends_on_id))
            else {
                dropped += 1;
                continue;
            };
            if !seen.insert((node, dep)) {
                continue;
            }
            predecessors[node].push(dep);
            successors[dep].push(node);
        }

        let (order, unordered) = kahn_order(&predecessors, &successors);

        tracing::debug!(
            tasks = n,
            edges = seen.len(),
            dropped_edges = dropped,
            "built dependency graph"
        );
        if unordered > 0 {
            tracing::warn!(
                unordered,
                "dependency cycle detected; appending tasks in task order"
            );
        }

        Self {
            ids,
            task_pos,
            predecessors,
            successors,
            order,
            unordered,
        }
    }

    pub fn len(&self) -> usize {
        self.task_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_pos.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.get(id).copied()
    }

    pub fn id(&self, node: usize) -> &str {
        self.ids
            .get_index(node)
            .map(|(id, _)| id.as_str())
            .unwrap_or_default()
    }

    /// Position of the node's task in the slice passed to [`TaskGraph::build`].
    pub fn task_position(&self, node: usize) -> usize {
        self.task_pos[node]
    }

    pub fn predecessors(&self, node: usize) -> &[usize] {
        &self.predecessors[node]
    }

    pub fn successors(&self, node: usize) -> &[usize] {
        &self.successors[node]
    }

    /// Topological order, with any cyclic remainder appended at the end.
    pub fn topological_order(&self) -> &[usize] {
        &self.order
    }

    pub fn has_cycle(&self) -> bool {
        self.unordered > 0
    }

    /// Nodes with no predecessors.
    pub fn start_nodes(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.predecessors[i].is_empty())
            .collect()
    }
}

/// Kahn's algorithm. Returns the order and how many nodes had to be appended
/// because they sit on (or behind) a cycle.
fn kahn_order(predecessors: &[Vec<usize>], successors: &[Vec<usize>]) -> (Vec<usize>, usize) {
    let n = predecessors.len();
    let mut in_degree: Vec<usize> = predecessors.iter().map(Vec::len).collect();
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut placed = vec![false; n];

    while let Some(node) = queue.pop_front() {
        order.push(node);
        placed[node] = true;
        for &succ in &successors[node] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                queue.push_back(succ);
            }
        }
    }

    let unordered = n - order.len();
    if unordered > 0 {
        order.extend((0..n).filter(|&i| !placed[i]));
    }
    (order, unordered)
}
