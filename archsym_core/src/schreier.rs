use enum_dispatch::enum_dispatch;
use fxhash::FxHashMap;

use crate::perm::{Perm, PermSet};

/// Which transversal representation a BSGS level stores.
///
/// Both variants satisfy the same contract and yield identical transversals;
/// the explicit form trades memory for O(1) lookups, the tree form
/// reconstructs transversals by walking label edges root-wards.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TransversalVariant {
    #[default]
    Explicit,
    SchreierTree,
}

/// Orbit-plus-transversal store rooted at a base point.
///
/// The label set is fixed once [`SchreierStructure::create_labels`] has run;
/// edges refer to labels by index.
#[enum_dispatch]
pub trait SchreierStructure {
    fn create_root(&mut self, root: usize);

    fn create_labels(&mut self, labels: PermSet);

    /// Record that `labels[label]` maps `destination` to `origin`.
    fn create_edge(&mut self, origin: usize, destination: usize, label: usize);

    fn root(&self) -> usize;

    /// All orbit points, root first.
    fn nodes(&self) -> Vec<usize>;

    fn labels(&self) -> &PermSet;

    fn contains(&self, node: usize) -> bool;

    /// Whether the back-edge of `node` is labelled by `edge`. Only
    /// meaningful for the tree variant, the explicit variant keeps no edges.
    fn incoming(&self, node: usize, edge: &Perm) -> bool;

    /// The transversal `u` with `u(root) = origin`, if `origin` is in the
    /// orbit.
    fn transversal(&self, origin: usize) -> Option<Perm>;
}

#[enum_dispatch(SchreierStructure)]
#[derive(Clone, Debug)]
pub enum Transversals {
    Explicit(ExplicitTransversals),
    Tree(SchreierTree),
}

impl Transversals {
    #[must_use]
    pub fn new(variant: TransversalVariant, degree: usize) -> Transversals {
        match variant {
            TransversalVariant::Explicit => {
                Transversals::Explicit(ExplicitTransversals::new(degree))
            }
            TransversalVariant::SchreierTree => {
                Transversals::Tree(SchreierTree::new(degree))
            }
        }
    }
}

/// Stores the full transversal for every orbit point.
#[derive(Clone, Debug)]
pub struct ExplicitTransversals {
    degree: usize,
    root: usize,
    labels: PermSet,
    orbit: FxHashMap<usize, Perm>,
}

impl ExplicitTransversals {
    #[must_use]
    pub fn new(degree: usize) -> ExplicitTransversals {
        ExplicitTransversals {
            degree,
            root: 0,
            labels: PermSet::new(),
            orbit: FxHashMap::default(),
        }
    }
}

impl SchreierStructure for ExplicitTransversals {
    fn create_root(&mut self, root: usize) {
        self.root = root;
        self.orbit.insert(root, Perm::identity(self.degree));
    }

    fn create_labels(&mut self, labels: PermSet) {
        self.labels = labels;
    }

    fn create_edge(&mut self, origin: usize, destination: usize, label: usize) {
        let u = &self.orbit[&destination] * &self.labels[label];
        self.orbit.insert(origin, u);
    }

    fn root(&self) -> usize {
        self.root
    }

    fn nodes(&self) -> Vec<usize> {
        let mut nodes = vec![self.root];
        let mut rest: Vec<usize> =
            self.orbit.keys().copied().filter(|&n| n != self.root).collect();
        rest.sort_unstable();
        nodes.extend(rest);
        nodes
    }

    fn labels(&self) -> &PermSet {
        &self.labels
    }

    fn contains(&self, node: usize) -> bool {
        self.orbit.contains_key(&node)
    }

    fn incoming(&self, _node: usize, _edge: &Perm) -> bool {
        false
    }

    fn transversal(&self, origin: usize) -> Option<Perm> {
        self.orbit.get(&origin).cloned()
    }
}

/// Stores one back-edge plus label index per orbit point and reconstructs
/// transversals on demand.
#[derive(Clone, Debug)]
pub struct SchreierTree {
    degree: usize,
    root: usize,
    labels: PermSet,
    edges: FxHashMap<usize, usize>,
    edge_labels: FxHashMap<usize, usize>,
}

impl SchreierTree {
    #[must_use]
    pub fn new(degree: usize) -> SchreierTree {
        SchreierTree {
            degree,
            root: 0,
            labels: PermSet::new(),
            edges: FxHashMap::default(),
            edge_labels: FxHashMap::default(),
        }
    }
}

impl SchreierStructure for SchreierTree {
    fn create_root(&mut self, root: usize) {
        self.root = root;
    }

    fn create_labels(&mut self, labels: PermSet) {
        self.labels = labels;
    }

    fn create_edge(&mut self, origin: usize, destination: usize, label: usize) {
        self.edges.insert(origin, destination);
        self.edge_labels.insert(origin, label);
    }

    fn root(&self) -> usize {
        self.root
    }

    fn nodes(&self) -> Vec<usize> {
        let mut nodes = vec![self.root];
        let mut rest: Vec<usize> = self.edges.keys().copied().collect();
        rest.sort_unstable();
        nodes.extend(rest);
        nodes
    }

    fn labels(&self) -> &PermSet {
        &self.labels
    }

    fn contains(&self, node: usize) -> bool {
        node == self.root || self.edges.contains_key(&node)
    }

    fn incoming(&self, node: usize, edge: &Perm) -> bool {
        self.edge_labels
            .get(&node)
            .is_some_and(|&label| self.labels[label] == *edge)
    }

    fn transversal(&self, origin: usize) -> Option<Perm> {
        if !self.contains(origin) {
            return None;
        }

        let mut result = Perm::identity(self.degree);
        let mut current = origin;

        while current != self.root {
            let label = &self.labels[self.edge_labels[&current]];
            result = label * &result;
            current = self.edges[&current];
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::{SchreierStructure, TransversalVariant};
    use crate::orbits;
    use crate::perm::{Perm, PermSet};

    fn cycle_labels() -> PermSet {
        PermSet::from_perms([
            Perm::from_cycles(4, &[vec![1, 2, 3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 3]]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn variants_yield_identical_transversals() {
        let explicit =
            orbits::schreier_structure(TransversalVariant::Explicit, 4, 1, cycle_labels());
        let tree =
            orbits::schreier_structure(TransversalVariant::SchreierTree, 4, 1, cycle_labels());

        assert_eq!(explicit.nodes(), tree.nodes());

        for node in explicit.nodes() {
            let u_explicit = explicit.transversal(node).unwrap();
            let u_tree = tree.transversal(node).unwrap();

            assert_eq!(u_explicit, u_tree);
            assert_eq!(u_explicit.apply(1), node);
        }
    }

    #[test]
    fn transversal_maps_root_to_node() {
        let st = orbits::schreier_structure(TransversalVariant::SchreierTree, 4, 2, cycle_labels());

        assert_eq!(st.root(), 2);
        for node in st.nodes() {
            assert_eq!(st.transversal(node).unwrap().apply(2), node);
        }
        assert!(st.transversal(2).unwrap().is_identity());
    }

    #[test]
    fn missing_nodes_have_no_transversal() {
        let labels = PermSet::from_perms([Perm::from_cycles(4, &[vec![1, 2]]).unwrap()]).unwrap();

        let st = orbits::schreier_structure(TransversalVariant::SchreierTree, 4, 1, labels);

        assert!(st.contains(2));
        assert!(!st.contains(3));
        assert!(st.transversal(3).is_none());
    }

    #[test]
    fn incoming_identifies_tree_edge_labels() {
        let labels = cycle_labels();
        let rotation = labels[0].clone();

        let st = orbits::schreier_structure(TransversalVariant::SchreierTree, 4, 1, labels);

        // 2 was first reached via the rotation
        assert!(st.incoming(2, &rotation));
        assert!(!st.incoming(2, &Perm::from_cycles(4, &[vec![1, 3]]).unwrap()));
    }
}
