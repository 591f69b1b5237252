use kd_tree::{KDTree, NearestVisitor};
use tracing::trace;

use crate::error::TreeError;
use crate::point::{Edge, Point};

/// The tree grown by the planner. Vertices keep their insertion order and the root is always the
/// vertex at index 0. Every other vertex has exactly one parent, which was inserted before it.
#[derive(Debug, Clone)]
pub struct PlanningTree {
    vertices: Vec<Point>,
    // Parent of each vertex, `None` until an edge reaches it. Always `None` for the root.
    parents: Vec<Option<usize>>,
    edges: Vec<Edge>,
    // Index of the child vertex of each edge, in the same order as `edges`.
    edge_children: Vec<usize>,
    index: KDTree<Point, 2>,
}

impl Default for PlanningTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanningTree {
    pub const ROOT_IDX: usize = 0;

    pub fn new() -> Self {
        PlanningTree {
            vertices: Vec::new(),
            parents: Vec::new(),
            edges: Vec::new(),
            edge_children: Vec::new(),
            index: KDTree::new(),
        }
    }

    pub fn with_root(root: Point) -> Self {
        let mut tree = PlanningTree::new();
        tree.insert_vertex(root);
        tree
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn root(&self) -> Option<Point> {
        self.vertices.first().copied()
    }

    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    /// Appends a vertex and returns its index. The vertex is disconnected until
    /// [`PlanningTree::insert_edge`] links it to a parent.
    pub fn insert_vertex(&mut self, p: Point) -> usize {
        let idx = self.index.insert(p);
        self.vertices.push(p);
        self.parents.push(None);
        debug_assert_eq!(idx, self.vertices.len() - 1);

        if self.index.depth() > Self::max_balanced_depth(self.len()) {
            trace!(vertices = self.len(), depth = self.index.depth(), "rebalancing spatial index");
            self.index.rebuild();
        }

        idx
    }

    /// Adds the edge `parent -> child`. Collision checking is the caller's job. The parent must
    /// have been inserted before the child, and the child can't have a parent already.
    pub fn insert_edge(&mut self, parent: usize, child: usize) -> Result<(), TreeError> {
        let invalid = || TreeError::InvalidEdge { parent, child };

        if parent >= child || child >= self.len() || self.parents[child].is_some() {
            return Err(invalid());
        }

        self.parents[child] = Some(parent);
        self.edges.push(Edge::new(self.vertices[parent], self.vertices[child]));
        self.edge_children.push(child);
        Ok(())
    }

    /// Euclidean distance to the vertex nearest to `query`, and that vertex's index. Ties go to the
    /// oldest vertex.
    pub fn nearest(&self, query: &Point) -> Result<(f32, usize), TreeError> {
        self.index
            .query(query, NearestVisitor::new())
            .map(|(idx, _, dist_sq)| (dist_sq.sqrt(), idx))
            .ok_or(TreeError::EmptyTree)
    }

    /// Vertex at `index`. Negative indices count from the most recent vertex, `-1` being the last
    /// one inserted.
    pub fn vertex_at(&self, index: isize) -> Result<Point, TreeError> {
        let resolved = if index < 0 {
            self.len().checked_sub(index.unsigned_abs())
        } else {
            Some(index as usize)
        };

        resolved
            .and_then(|idx| self.vertices.get(idx).copied())
            .ok_or(TreeError::IndexOutOfRange(index))
    }

    /// Removes the `k` most recently inserted vertices together with the edges leading to them, as
    /// long as more than `k` edges exist. Otherwise the tree is left untouched. Vertices that were
    /// never connected count toward `k`, but have no edge to remove.
    pub fn prune_last(&mut self, k: usize) {
        if self.edges.len() <= k {
            return;
        }

        let len = self.len() - k;
        self.vertices.truncate(len);
        self.parents.truncate(len);
        // Parents always have a lower index than their children, so an edge goes away exactly when
        // its child does.
        let (edge_children, edges): (Vec<usize>, Vec<Edge>) = self
            .edge_children
            .iter()
            .copied()
            .zip(self.edges.iter().copied())
            .filter(|&(child, _)| child < len)
            .unzip();
        self.edge_children = edge_children;
        self.edges = edges;
        self.index.truncate(len);
        trace!(removed = k, vertices = len, "pruned tree");
    }

    /// Walks the parent links from the vertex at `from` up to the root. The result starts at `from`
    /// and ends at the root, so it has to be reversed to be followed from the root.
    pub fn path_to_root(&self, from: usize) -> Result<Vec<Point>, TreeError> {
        if from >= self.len() {
            return Err(TreeError::IndexOutOfRange(from as isize));
        }

        let mut path = Vec::new();
        let mut curr = from;
        loop {
            path.push(self.vertices[curr]);
            if curr == Self::ROOT_IDX {
                break;
            }
            // Parents always have a lower index, so this terminates.
            curr = self.parents[curr].ok_or(TreeError::DisconnectedVertex(curr))?;
        }

        Ok(path)
    }

    fn max_balanced_depth(len: usize) -> usize {
        let log2 = usize::BITS - len.leading_zeros();
        2 * log2 as usize + 4
    }
}
