use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a new feature index from a zero-based column position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable id of a node in a decision tree arena. The root is always 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The root node id.
    pub const ROOT: NodeIndex = NodeIndex(0);

    /// Create a new node index from a zero-based arena position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` where children are referenced by
/// [`NodeIndex`] rather than pointers. Every node carries the value it would
/// predict as a leaf, so interior nodes can be inspected the same way.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior split node.
    Split {
        /// Feature used for the split.
        feature: FeatureIndex,
        /// Threshold value: samples with feature <= threshold go left.
        threshold: f64,
        /// Id of the left child node.
        left: NodeIndex,
        /// Id of the right child node.
        right: NodeIndex,
        /// Leaf value of the rows that reached this node, one entry per target.
        value: Vec<f64>,
        /// Number of training samples that reached this node.
        n_samples: usize,
        /// Scalar normalized gain of the chosen split.
        gain: f64,
    },
    /// A terminal leaf node.
    Leaf {
        /// Predicted value per target: majority label or mean.
        value: Vec<f64>,
        /// Number of training samples in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the per-target leaf value of the rows that reached this node.
    #[must_use]
    pub fn value(&self) -> &[f64] {
        match self {
            Node::Split { value, .. } | Node::Leaf { value, .. } => value,
        }
    }

    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureIndex, Node, NodeIndex};

    #[test]
    fn feature_index_roundtrip() {
        let fi = FeatureIndex::new(7);
        assert_eq!(fi.index(), 7);
        assert_eq!(format!("{fi}"), "7");
    }

    #[test]
    fn node_index_root_is_zero() {
        assert_eq!(NodeIndex::ROOT.index(), 0);
        assert!(NodeIndex::ROOT < NodeIndex::new(1));
    }

    fn make_leaf() -> Node {
        Node::Leaf {
            value: vec![1.0, 2.5],
            n_samples: 10,
        }
    }

    fn make_split() -> Node {
        Node::Split {
            feature: FeatureIndex::new(2),
            threshold: 3.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            value: vec![0.0, 4.0],
            n_samples: 20,
            gain: 0.16,
        }
    }

    #[test]
    fn leaf_accessors() {
        let leaf = make_leaf();
        assert!(leaf.is_leaf());
        assert_eq!(leaf.n_samples(), 10);
        assert_eq!(leaf.value(), &[1.0, 2.5]);
    }

    #[test]
    fn split_keeps_leaf_value() {
        let split = make_split();
        assert!(!split.is_leaf());
        assert_eq!(split.n_samples(), 20);
        assert_eq!(split.value(), &[0.0, 4.0]);
    }
}
