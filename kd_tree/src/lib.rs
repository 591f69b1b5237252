pub mod visitor;

use nalgebra as na;

pub use visitor::{NearestVisitor, Visitor};

pub trait HasCoords<const N: usize> {
    fn coords(&self) -> [f32; N];

    fn point(&self) -> na::Point<f32, N> {
        self.coords().into()
    }

    fn get_coord(&self, axis: usize) -> f32 {
        self.coords()[axis]
    }
}

impl<const N: usize> HasCoords<N> for na::Point<f32, N> {
    #[inline]
    fn coords(&self) -> [f32; N] {
        let mut array = [0.0; N];
        array.copy_from_slice(self.coords.data.as_slice());
        array
    }
}

///
/// A K-D Tree whose nodes live in a vector in insertion order. The index of a point is the
/// position at which it was inserted, and it never changes while the point is in the tree, not
/// even when the tree is rebalanced with [`KDTree::rebuild`].
///
/// Insertion does not rebalance, so adversarial insertion orders produce deep trees. Callers that
/// care should watch [`KDTree::depth`] and call [`KDTree::rebuild`] when it grows too large.
///
#[derive(Debug, Clone)]
pub struct KDTree<P, const N: usize> {
    nodes: Vec<Node<P>>,
    root: Option<usize>,
    // Upper bound for the depth of the tree. Exact right after a rebuild.
    depth: usize,
}

#[derive(Debug, Clone)]
struct Node<P> {
    data: P,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

impl<P> Node<P> {
    fn new(data: P, parent: Option<usize>) -> Self {
        Node {
            data,
            parent,
            left: None,
            right: None,
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

impl<P: HasCoords<N>, const N: usize> Default for KDTree<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, const N: usize> KDTree<P, N>
where
    P: HasCoords<N>,
{
    #[inline]
    pub fn new() -> KDTree<P, N> {
        KDTree {
            nodes: Vec::new(),
            root: None,
            depth: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&P> {
        self.nodes.get(index).map(|node| &node.data)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Inserts a point and returns its index.
    pub fn insert(&mut self, p: P) -> usize {
        let idx = self.nodes.len();

        let Some(mut curr) = self.root else {
            self.nodes.push(Node::new(p, None));
            self.root = Some(idx);
            self.depth = self.depth.max(1);
            return idx;
        };

        let mut depth = 0;
        loop {
            let axis = depth % N;
            let node = &self.nodes[curr];
            let go_left = p.get_coord(axis) <= node.data.get_coord(axis);
            let next = if go_left { node.left } else { node.right };
            depth += 1;

            match next {
                Some(child) => curr = child,
                None => {
                    if go_left {
                        self.nodes[curr].left = Some(idx);
                    } else {
                        self.nodes[curr].right = Some(idx);
                    }
                    break;
                }
            }
        }

        self.nodes.push(Node::new(p, Some(curr)));
        self.depth = self.depth.max(depth + 1);
        idx
    }

    pub fn extend_vec(&mut self, points: Vec<P>) {
        self.nodes.reserve(points.len());
        for p in points {
            self.insert(p);
        }
    }

    pub fn query<'a, V>(&'a self, p: &na::Point<f32, N>, mut vis: V) -> V::Result
    where
        V: Visitor<'a, P, N>,
    {
        if let Some(root) = self.root {
            self.query_node(root, &mut vis, p, 0);
        }
        vis.result()
    }

    fn query_node<'a, V>(&'a self, idx: usize, visitor: &mut V, p: &na::Point<f32, N>, depth: usize)
    where
        V: Visitor<'a, P, N>,
    {
        let node = &self.nodes[idx];
        let axis = depth % N;

        let p_ax = p[axis];
        let m_ax = node.data.get_coord(axis);

        // We first follow the axis comparison to get a first candidate of nearest point.
        let (fst, snd) = if p_ax <= m_ax {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = fst {
            self.query_node(child, visitor, p, depth + 1);
        }

        if na::distance_squared(&node.data.point(), p) <= visitor.radius_sq(p) {
            visitor.accept(idx, &node.data, p);
        }

        // Points at exactly the current radius may still win a tie, so the far side is searched
        // with a non-strict comparison.
        if visitor.radius_sq(p) >= (p_ax - m_ax).powi(2) {
            if let Some(child) = snd {
                self.query_node(child, visitor, p, depth + 1);
            }
        }
    }

    /// Keeps only the first `len` points, dropping the most recently inserted ones.
    pub fn truncate(&mut self, len: usize) {
        while self.nodes.len() > len {
            let last = self.nodes.len() - 1;

            // Points are popped in reverse insertion order, so they are usually leaves. A
            // rebalanced tree doesn't give that guarantee and has to be rebuilt.
            if !self.nodes[last].is_leaf() {
                self.nodes.truncate(len);
                self.rebuild();
                return;
            }

            let node = self.nodes.pop().expect("tree is not empty");
            match node.parent {
                Some(parent) => {
                    let parent = &mut self.nodes[parent];
                    if parent.left == Some(last) {
                        parent.left = None;
                    } else {
                        parent.right = None;
                    }
                }
                None => self.root = None,
            }
        }

        if self.nodes.is_empty() {
            self.depth = 0;
        }
    }

    /// Rebuilds the links of the K-D Tree into a balanced tree. Indices of the points don't change.
    pub fn rebuild(&mut self) {
        for node in self.nodes.iter_mut() {
            node.parent = None;
            node.left = None;
            node.right = None;
        }

        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        self.depth = 0;
        self.root = self.rec_rebuild(&mut order, None, 0);
    }

    fn rec_rebuild(
        &mut self,
        order: &mut [usize],
        parent: Option<usize>,
        depth: usize,
    ) -> Option<usize> {
        if order.is_empty() {
            return None;
        }
        self.depth = self.depth.max(depth + 1);

        let axis = depth % N;
        let nodes = &self.nodes;
        order.sort_unstable_by(|&a, &b| {
            nodes[a]
                .data
                .get_coord(axis)
                .total_cmp(&nodes[b].data.get_coord(axis))
        });

        let mut mid = order.len() / 2;

        // Insertion sends points equal to the median along the axis to the left, so the median
        // must be the last of a run of equal coordinates.
        while let Some(&upper) = order.get(mid + 1) {
            if nodes[upper].data.get_coord(axis) != nodes[order[mid]].data.get_coord(axis) {
                break;
            }
            mid += 1;
        }

        let (left, right) = order.split_at_mut(mid);
        // `mid` is a valid index, so `right` holds at least one element.
        let (&mut median, right) = right.split_first_mut().expect("median exists");

        self.nodes[median].parent = parent;
        let left = self.rec_rebuild(left, Some(median), depth + 1);
        let right = self.rec_rebuild(right, Some(median), depth + 1);
        self.nodes[median].left = left;
        self.nodes[median].right = right;

        Some(median)
    }
}

impl<P: HasCoords<N>, const N: usize> Extend<P> for KDTree<P, N> {
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = P>,
    {
        for item in iter {
            self.insert(item);
        }
    }
}
