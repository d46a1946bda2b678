//! Wreath-product decomposition over non-trivial block systems.

use log::{debug, trace};

use crate::block_system::BlockSystem;
use crate::bsgs::BsgsOptions;
use crate::error::Result;
use crate::perm::{Perm, PermSet};
use crate::perm_group::PermGroup;

impl PermGroup {
    /// Try to write the group as a wreath product over one of its
    /// non-trivial block systems.
    ///
    /// Returns `Some(decomposition)` with `decomposition[0]` the lifted
    /// block permuter and `decomposition[i]` the stabilizer of block `i - 1`
    /// restricted to that block (all at full degree), or `None` when no
    /// block system passes the order check
    /// `|G| = |bottom|^blocks * |top|` or the monomorphism verification
    /// fails.
    ///
    /// # Errors
    ///
    /// `NotImplemented` for non-transitive groups (block-system
    /// enumeration is only defined on the transitive path).
    pub fn wreath_decomposition(&self) -> Result<Option<Vec<PermGroup>>> {
        for block_system in BlockSystem::non_trivial(self, false)? {
            trace!("considering block system {:?}", block_system.blocks());

            let top = block_system.block_permuter(self.generators())?;

            // bottom group: stabilizer of the first block, restricted
            let first_bottom = self.block_restriction(&block_system, 0)?;

            let expected_order =
                first_bottom.order().pow(block_system.size()) * top.order();

            if expected_order != self.order() {
                trace!("group order equality not satisfied");
                continue;
            }

            let mut decomposition = Vec::with_capacity(block_system.size() + 1);

            match self.lift_block_permuter(&block_system, &top)? {
                Some(lifted) => decomposition.push(lifted),
                None => {
                    // a decomposition over this system may exist but the
                    // heuristic monomorphism reconstruction missed it
                    debug!("wreath monomorphism reconstruction failed");
                    return Ok(None);
                }
            }

            decomposition.push(first_bottom);
            for i in 1..block_system.size() {
                decomposition.push(self.block_restriction(&block_system, i)?);
            }

            debug!("found wreath decomposition over {} blocks", block_system.size());
            return Ok(Some(decomposition));
        }

        Ok(None)
    }

    // The setwise stabilizer generators of block i restricted to the block,
    // as a full-degree group. An empty stabilizer set yields the trivial
    // group, which the caller's order check rejects.
    fn block_restriction(&self, block_system: &BlockSystem, i: usize) -> Result<PermGroup> {
        let block = block_system.block(i);
        let stabilizers = BlockSystem::block_stabilizers(self.generators(), block);

        let mut restricted = PermSet::new();
        for r#gen in &stabilizers {
            restricted.push(r#gen.restricted(block).expect("stabilizers fix the block"));
        }
        restricted.make_unique();

        PermGroup::from_generators(self.degree(), restricted, &BsgsOptions::default())
    }

    // Lift the top generators to full degree, mapping block i onto block
    // sigma(i) preserving intra-block order; verify the lifts are group
    // members and induce exactly the block permuter.
    fn lift_block_permuter(
        &self,
        block_system: &BlockSystem,
        top: &PermGroup,
    ) -> Result<Option<PermGroup>> {
        let mut lifted = PermSet::new();
        let mut reconstructed = PermSet::new();

        for r#gen in top.generators() {
            let mut images: Vec<usize> = (1..=self.degree()).collect();

            for i in 0..block_system.size() {
                let source = block_system.block(i);
                let target = block_system.block(r#gen.apply(i + 1) - 1);

                for (a, b) in source.iter().zip(target) {
                    images[a - 1] = *b;
                }
            }

            let lift = Perm::from_images(images).expect("blockwise bijection");

            if !self.is_element(&lift) {
                return Ok(None);
            }

            // the lift must induce the generator we started from
            let induced: Vec<usize> = (1..=block_system.size())
                .map(|i| block_system.block_index(lift.apply(block_system.block(i - 1)[0])) + 1)
                .collect();
            let induced = Perm::from_images(induced).expect("blocks map to blocks");

            if !top.is_element(&induced) {
                return Ok(None);
            }

            reconstructed.push(induced);
            lifted.push(lift);
        }

        let reconstruction =
            PermGroup::from_generators(block_system.size(), reconstructed, &BsgsOptions::default())?;

        if reconstruction.order() != top.order() {
            return Ok(None);
        }

        Ok(Some(PermGroup::from_generators(
            self.degree(),
            lifted,
            &BsgsOptions::default(),
        )?))
    }
}
