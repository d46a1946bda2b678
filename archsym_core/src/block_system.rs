//! Block systems of transitive permutation groups.

use fxhash::FxHashSet;
use log::{debug, trace};

use crate::bsgs::BsgsOptions;
use crate::error::{Error, Result};
use crate::math::union_find::UnionFind;
use crate::orbits;
use crate::perm::PermSet;
use crate::perm_group::PermGroup;

/// A partition of `1..=degree` into equally sized blocks permuted setwise
/// by a group.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlockSystem {
    degree: usize,
    blocks: Vec<Vec<usize>>,
    // block index per point, indexed by point - 1
    block_of: Vec<usize>,
}

impl BlockSystem {
    /// Build a block system from a class vector assigning every point a
    /// class representative. Blocks are ordered by first appearance, points
    /// within a block ascend.
    ///
    /// Unequal block sizes are a programmer error.
    #[must_use]
    pub fn from_classes(classes: &[usize]) -> BlockSystem {
        let degree = classes.len();

        let mut blocks: Vec<Vec<usize>> = Vec::new();
        let mut block_of = vec![0; degree];
        let mut class_index: Vec<Option<usize>> = vec![None; degree + 1];

        for (i, &class) in classes.iter().enumerate() {
            let point = i + 1;

            match class_index[class] {
                Some(index) => {
                    blocks[index].push(point);
                    block_of[i] = index;
                }
                None => {
                    class_index[class] = Some(blocks.len());
                    block_of[i] = blocks.len();
                    blocks.push(vec![point]);
                }
            }
        }

        assert!(
            blocks.iter().all(|b| b.len() == blocks[0].len()),
            "blocks in a block system have equal size"
        );

        BlockSystem {
            degree,
            blocks,
            block_of,
        }
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of blocks.
    #[must_use]
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn blocks(&self) -> &[Vec<usize>] {
        &self.blocks
    }

    #[must_use]
    pub fn block(&self, i: usize) -> &[usize] {
        &self.blocks[i]
    }

    /// The index of the block containing `point`.
    #[must_use]
    pub fn block_index(&self, point: usize) -> usize {
        self.block_of[point - 1]
    }

    /// Singleton blocks or one block covering everything.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.size() == 1 || self.size() == self.degree
    }

    /// The smallest block system in which all points of `initial_class`
    /// share a block, by union-find over a FIFO of merged representatives.
    #[must_use]
    pub fn minimal(generators: &PermSet, initial_class: &[usize]) -> BlockSystem {
        assert!(initial_class.len() >= 2, "seed class needs at least two points");

        let degree = generators.degree();

        let mut classes = UnionFind::new(degree + 1);
        let mut queue: Vec<usize> = Vec::new();

        for &point in &initial_class[1..] {
            if let Some((_, absorbed)) = classes.union(initial_class[0], point) {
                queue.push(absorbed);
            }
        }

        let mut i = 0;
        while i < queue.len() {
            let gamma = queue[i];
            i += 1;

            for r#gen in generators {
                let c1 = r#gen.apply(gamma);
                let c2 = r#gen.apply(classes.find(gamma));

                trace!("unioning {c1} and {c2}");

                if let Some((_, absorbed)) = classes.union(c1, c2) {
                    queue.push(absorbed);
                }
            }
        }

        let class_vector: Vec<usize> = (1..=degree).map(|x| classes.find(x)).collect();
        BlockSystem::from_classes(&class_vector)
    }

    /// All non-trivial block systems of a transitive group: one `minimal`
    /// call per orbit of the first base point's stabilizer, deduplicated.
    ///
    /// # Errors
    ///
    /// `NotImplemented` for non-transitive groups.
    pub fn non_trivial(group: &PermGroup, assume_transitive: bool) -> Result<Vec<BlockSystem>> {
        if !assume_transitive && !group.is_transitive() {
            return Err(Error::NotImplemented(
                "block systems of non-transitive groups",
            ));
        }

        if group.is_trivial() {
            return Ok(Vec::new());
        }

        let generators = group.generators();
        let beta = group.bsgs().base_point(0);

        let stabilizer_generators = if group.bsgs().base_size() >= 2 {
            group.bsgs().stabilizers(1).clone()
        } else {
            PermSet::new()
        };

        debug!("stabilizer of {beta} has {} generators", stabilizer_generators.len());

        let mut result = Vec::new();
        let mut seen: FxHashSet<Vec<Vec<usize>>> = FxHashSet::default();

        for orbit in orbits::orbit_partition(group.degree(), &stabilizer_generators) {
            let representative = orbit[0];
            if representative == beta {
                continue;
            }

            let bs = BlockSystem::minimal(generators, &[beta, representative]);

            if !bs.is_trivial() && seen.insert(bs.blocks.clone()) {
                trace!("found block system {:?}", bs.blocks);
                result.push(bs);
            }
        }

        Ok(result)
    }

    /// The group induced on the blocks.
    ///
    /// # Errors
    ///
    /// Construction errors of the underlying BSGS build.
    pub fn block_permuter(&self, generators: &PermSet) -> Result<PermGroup> {
        let mut induced = PermSet::new();

        for r#gen in generators {
            let images: Vec<usize> = self
                .blocks
                .iter()
                .map(|block| self.block_index(r#gen.apply(block[0])) + 1)
                .collect();

            induced.push(crate::perm::Perm::from_images(images).expect("blocks map to blocks"));
        }

        induced.make_unique();

        PermGroup::from_generators(self.size(), induced, &BsgsOptions::default())
    }

    /// Whether every generator maps `block` onto a block of the system.
    #[must_use]
    pub fn is_invariant_under(&self, generators: &PermSet) -> bool {
        generators.iter().all(|r#gen| {
            self.blocks.iter().all(|block| {
                let target = self.block_index(r#gen.apply(block[0]));
                block.iter().all(|&p| self.block_index(r#gen.apply(p)) == target)
            })
        })
    }

    /// The subset of `generators` stabilizing `block` setwise.
    #[must_use]
    pub fn block_stabilizers(generators: &PermSet, block: &[usize]) -> PermSet {
        let members: FxHashSet<usize> = block.iter().copied().collect();

        generators
            .iter()
            .filter(|r#gen| block.iter().all(|&p| members.contains(&r#gen.apply(p))))
            .cloned()
            .collect()
    }
}
