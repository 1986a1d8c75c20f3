use serde::{Deserialize, Serialize};

/// Index of a node in the distance matrix. Node 0 is where every tour starts.
pub type NodeId = usize;

/// A partial or complete tour: the nodes visited so far (always starting at
/// node 0) and the total weight of the edges walked.
///
/// Routes are values. `extend` and `close` hand back a new route and leave
/// `self` untouched, so sibling branches of a search never share a path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: Vec<NodeId>,
    pub distance: u32,
}

impl Route {
    pub fn initial() -> Self {
        Self {
            path: vec![0],
            distance: 0,
        }
    }

    /// Caller guarantees `node` is unvisited and `edge_distance` is the matrix
    /// entry from `self.last()` to `node`.
    pub fn extend(&self, node: NodeId, edge_distance: u32) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(node);
        Self {
            path,
            distance: self.distance + edge_distance,
        }
    }

    /// Adds the edge back to the start without repeating node 0 in the path.
    pub fn close(&self, edge_distance: u32) -> Self {
        Self {
            path: self.path.clone(),
            distance: self.distance + edge_distance,
        }
    }

    pub fn last(&self) -> NodeId {
        self.path[self.path.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.path.contains(&node)
    }

    /// Nodes of `0..num_vertices` not on the path yet, in ascending order.
    pub fn unvisited(&self, num_vertices: usize) -> Vec<NodeId> {
        let mut visited = vec![false; num_vertices];
        for &node in &self.path {
            if node < num_vertices {
                visited[node] = true;
            }
        }
        (0..num_vertices).filter(|&node| !visited[node]).collect()
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::initial()
    }
}
