//! Automorphism search for vertex-colored graphs.
//!
//! This is the default canonical-labeling collaborator behind
//! [`crate::arch_graph::ArchGraph::automorphisms`]: a backtracking
//! enumeration of color- and adjacency-preserving vertex bijections. It is
//! sized for leaf architecture graphs; composed systems derive their groups
//! from direct and wreath products instead.

use fxhash::FxHashSet;

pub(crate) struct ColoredGraph {
    n: usize,
    colors: Vec<usize>,
    adjacency: Vec<FxHashSet<usize>>,
}

impl ColoredGraph {
    pub(crate) fn new(n: usize, colors: Vec<usize>) -> ColoredGraph {
        assert_eq!(colors.len(), n);

        ColoredGraph {
            n,
            colors,
            adjacency: vec![FxHashSet::default(); n],
        }
    }

    pub(crate) fn add_edge(&mut self, a: usize, b: usize) {
        self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
    }

    /// All automorphisms as 0-based image vectors, identity included.
    pub(crate) fn automorphisms(&self) -> Vec<Vec<usize>> {
        let mut result = Vec::new();
        let mut mapping: Vec<Option<usize>> = vec![None; self.n];
        let mut used = vec![false; self.n];

        self.search(0, &mut mapping, &mut used, &mut result);

        result
    }

    fn search(
        &self,
        vertex: usize,
        mapping: &mut Vec<Option<usize>>,
        used: &mut Vec<bool>,
        result: &mut Vec<Vec<usize>>,
    ) {
        if vertex == self.n {
            result.push(mapping.iter().map(|m| m.expect("assignment complete")).collect());
            return;
        }

        for image in 0..self.n {
            if used[image] || self.colors[image] != self.colors[vertex] {
                continue;
            }

            if !self.consistent(vertex, image, mapping) {
                continue;
            }

            mapping[vertex] = Some(image);
            used[image] = true;

            self.search(vertex + 1, mapping, used, result);

            mapping[vertex] = None;
            used[image] = false;
        }
    }

    // Adjacency between `vertex` and every already-assigned vertex must be
    // mirrored between `image` and the corresponding assignments.
    fn consistent(&self, vertex: usize, image: usize, mapping: &[Option<usize>]) -> bool {
        for earlier in 0..vertex {
            let Some(earlier_image) = mapping[earlier] else {
                continue;
            };

            if self.adjacency[vertex].contains(&earlier)
                != self.adjacency[image].contains(&earlier_image)
            {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::ColoredGraph;

    #[test]
    fn square_has_the_dihedral_automorphisms() {
        let mut graph = ColoredGraph::new(4, vec![0; 4]);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            graph.add_edge(a, b);
        }

        assert_eq!(graph.automorphisms().len(), 8);
    }

    #[test]
    fn colors_cut_down_the_automorphisms() {
        // alternately colored square: only the color-preserving symmetries
        // remain
        let mut graph = ColoredGraph::new(4, vec![0, 1, 0, 1]);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            graph.add_edge(a, b);
        }

        assert_eq!(graph.automorphisms().len(), 4);
    }

    #[test]
    fn path_graph_has_one_reflection() {
        let mut graph = ColoredGraph::new(3, vec![0; 3]);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);

        let autos = graph.automorphisms();
        assert_eq!(autos.len(), 2);
        assert!(autos.contains(&vec![0, 1, 2]));
        assert!(autos.contains(&vec![2, 1, 0]));
    }

    #[test]
    fn disconnected_same_color_vertices_swap() {
        let graph = ColoredGraph::new(2, vec![0, 0]);

        assert_eq!(graph.automorphisms().len(), 2);
    }
}
