//! Action components of partial permutations: the orbit of a point set
//! under right multiplication by generators, with the Schreier tree and
//! orbit graph of the action.

use log::trace;
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;

use crate::partial_perm::PartialPerm;

/// Parent index and generator index per non-root component element;
/// element `k >= 1` of the component has its incoming edge at `data[k - 1]`.
#[derive(Clone, Debug, Default)]
pub struct ActionSchreierTree {
    pub dom_max: usize,
    pub data: Vec<(usize, usize)>,
}

/// Per-generator destination table: `data[j][i]` is the component index
/// reached from element `i` under generator `j`.
#[derive(Clone, Debug, Default)]
pub struct OrbitGraph {
    pub data: Vec<Vec<usize>>,
}

/// The component of `alpha` under the action, in discovery order, together
/// with the Schreier tree and orbit graph of the walk.
///
/// Candidate sets are deduplicated through per-size hash buckets, so very
/// large components only ever compare sets of equal cardinality and equal
/// hash.
#[must_use]
pub fn action_component(
    alpha: &[usize],
    generators: &[PartialPerm],
) -> (Vec<Vec<usize>>, ActionSchreierTree, OrbitGraph) {
    let dom_max = generators.iter().map(PartialPerm::dom_max).max().unwrap_or(0);
    let dom_min = generators
        .iter()
        .map(|g| g.dom().first().copied().unwrap_or(usize::MAX))
        .min()
        .unwrap_or(usize::MAX);
    let dom_range_max = if dom_max == 0 { 0 } else { dom_max - dom_min + 1 };

    let mut component: Vec<Vec<usize>> = vec![alpha.to_vec()];
    let mut tree_data: Vec<(usize, usize)> = Vec::new();
    let mut graph_data: Vec<Vec<usize>> = vec![Vec::new(); generators.len()];

    // per-cardinality buckets of (component index, hash)
    let mut size_present = vec![false; dom_max + 2];
    let mut buckets: Vec<Vec<(usize, u64)>> = vec![Vec::new(); dom_max + 2];

    size_present[alpha.len()] = true;
    buckets[alpha.len()].push((0, set_hash(alpha)));

    let mut i = 0;
    while i < component.len() {
        let beta = component[i].clone();

        for (j, r#gen) in generators.iter().enumerate() {
            let beta_prime = r#gen.image_of_set(&beta);

            let size = beta_prime.len();
            let mut found = None;

            if size == dom_range_max && size_present[size] {
                // only one full-size element can exist
                found = Some(buckets[size][0].0);
            } else if size_present[size] {
                let hash = set_hash(&beta_prime);
                found = buckets[size]
                    .iter()
                    .find(|&&(id, h)| h == hash && component[id] == beta_prime)
                    .map(|&(id, _)| id);
            }

            match found {
                Some(id) => {
                    graph_data[j].push(id);
                }
                None => {
                    let id = component.len();
                    trace!("adjoining {beta_prime:?} as component element {id}");

                    size_present[size] = true;
                    buckets[size].push((id, set_hash(&beta_prime)));

                    component.push(beta_prime);
                    tree_data.push((i, j));
                    graph_data[j].push(id);
                }
            }
        }

        i += 1;
    }

    (
        component,
        ActionSchreierTree {
            dom_max,
            data: tree_data,
        },
        OrbitGraph { data: graph_data },
    )
}

/// The partial permutation carrying the component root to element `i`,
/// composed from the generator labels along the tree path.
#[must_use]
pub fn schreier_trace(
    mut i: usize,
    tree: &ActionSchreierTree,
    generators: &[PartialPerm],
) -> PartialPerm {
    let mut result = PartialPerm::identity(tree.dom_max);

    while i > 0 {
        let (parent, label) = tree.data[i - 1];
        result = &generators[label] * &result;
        i = parent;
    }

    result
}

/// Strongly connected components of the orbit graph viewed as a directed
/// multigraph, inner indices ascending.
#[must_use]
pub fn strongly_connected_components(orbit_graph: &OrbitGraph) -> Vec<Vec<usize>> {
    let n = orbit_graph.data.first().map_or(0, Vec::len);

    let mut graph = DiGraph::<(), ()>::new();
    let nodes: Vec<_> = (0..n).map(|_| graph.add_node(())).collect();

    for i in 0..n {
        for row in &orbit_graph.data {
            let j = row[i];
            if j != i {
                graph.add_edge(nodes[i], nodes[j], ());
            }
        }
    }

    let mut components: Vec<Vec<usize>> = tarjan_scc(&graph)
        .into_iter()
        .map(|scc| {
            let mut indices: Vec<usize> = scc.into_iter().map(|n| n.index()).collect();
            indices.sort_unstable();
            indices
        })
        .collect();

    components.sort();
    components
}

fn set_hash(set: &[usize]) -> u64 {
    fxhash::hash64(set)
}

#[cfg(test)]
mod tests {
    use super::{action_component, schreier_trace, strongly_connected_components};
    use crate::partial_perm::PartialPerm;

    // the classic 9-point example
    fn generators() -> Vec<PartialPerm> {
        vec![
            PartialPerm::from_images(vec![4, 6, 8, 1, 5, 2, 7, 3, 9]).unwrap(),
            PartialPerm::from_images(vec![5, 7, 9, 2, 4, 1, 6, 3, 8]).unwrap(),
            PartialPerm::from_images(vec![0, 5, 0, 0, 6, 2]).unwrap(),
            PartialPerm::from_images(vec![3, 1, 2]).unwrap(),
        ]
    }

    #[test]
    fn computes_the_action_component() {
        let alpha: Vec<usize> = (1..=9).collect();
        let (component, tree, graph) = action_component(&alpha, &generators());

        let expected_component: Vec<Vec<usize>> = vec![
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9],
            vec![2, 5, 6],
            vec![1, 2, 3],
            vec![1, 4, 7],
            vec![1],
            vec![4, 6, 8],
            vec![5, 7, 9],
            vec![5],
            vec![],
            vec![3],
            vec![4],
            vec![2],
            vec![6],
            vec![8],
            vec![9],
            vec![7],
        ];

        assert_eq!(component, expected_component);

        let expected_tree = vec![
            (0, 2),
            (0, 3),
            (1, 1),
            (1, 3),
            (2, 0),
            (2, 1),
            (2, 2),
            (3, 2),
            (3, 3),
            (4, 0),
            (5, 2),
            (6, 2),
            (9, 0),
            (9, 1),
            (11, 1),
        ];

        assert_eq!(tree.data, expected_tree);

        let expected_graph = vec![
            vec![0, 1, 5, 3, 10, 2, 6, 7, 8, 13, 4, 12, 11, 9, 14, 15],
            vec![0, 3, 6, 1, 7, 2, 5, 10, 8, 14, 11, 15, 4, 9, 13, 12],
            vec![1, 1, 7, 8, 8, 11, 12, 12, 8, 8, 8, 7, 11, 8, 8, 8],
            vec![2, 4, 2, 9, 9, 8, 8, 8, 8, 11, 8, 4, 8, 8, 8, 8],
        ];

        assert_eq!(graph.data, expected_graph);
    }

    #[test]
    fn traces_reach_their_component_elements() {
        let alpha: Vec<usize> = (1..=9).collect();
        let gens = generators();
        let (component, tree, _) = action_component(&alpha, &gens);

        for (i, element) in component.iter().enumerate() {
            let trace = schreier_trace(i, &tree, &gens);
            assert_eq!(&trace.image_of_set(&alpha), element);
        }
    }

    #[test]
    fn orbit_graph_strongly_connected_components() {
        let alpha: Vec<usize> = (1..=9).collect();
        let (_, _, graph) = action_component(&alpha, &generators());

        let components = strongly_connected_components(&graph);

        let mut expected = vec![
            vec![0],
            vec![1, 3],
            vec![2, 5, 6],
            vec![4, 7, 9, 10, 11, 12, 13, 14, 15],
            vec![8],
        ];
        expected.sort();

        assert_eq!(components, expected);
    }
}
