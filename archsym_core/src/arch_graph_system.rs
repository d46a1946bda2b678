//! Composable systems of automorphism sources: leaf graphs, clusters
//! (direct products) and uniform super-graphs (wreath products), with
//! cached automorphism groups and orbit-representative queries.

use log::debug;

use crate::arch_graph::ArchGraph;
use crate::bsgs::BsgsOptions;
use crate::error::{Error, Result};
use crate::inverse_semigroup::PartialPermInverseSemigroup;
use crate::math::Order;
use crate::partial_perm::PartialPerm;
use crate::perm_group::PermGroup;
use crate::task_mapping::{self, ReprOptions, TaskAllocation, TaskMapping, TaskOrbits};

/// Cache state of a system node.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SystemState {
    #[default]
    Uninitialized,
    /// The automorphism group is cached.
    AutoReady,
    /// Representative queries are fully prepared (including children).
    ReprReady,
}

/// One node of the composition tree.
#[derive(Clone, Debug)]
pub enum ArchGraphNode {
    /// A concrete architecture graph, automorphisms from the colored-graph
    /// search.
    Graph(ArchGraph),
    /// A leaf over an explicitly given automorphism group.
    Automorphisms(PermGroup),
    /// Independent subsystems side by side, automorphisms compose as the
    /// direct product.
    Cluster(Vec<ArchGraphSystem>),
    /// `outer.num_processors()` copies of `proto` arranged like `outer`,
    /// automorphisms compose as the wreath product `proto ≀ outer`.
    Super {
        outer: Box<ArchGraphSystem>,
        proto: Box<ArchGraphSystem>,
    },
}

/// A composable source of architecture symmetry.
///
/// The node lazily caches its automorphism group; `init_repr` additionally
/// prepares every child for representative queries. `reset_repr` drops back
/// to `AutoReady`, `reset_automorphisms` all the way to `Uninitialized`.
#[derive(Clone, Debug)]
pub struct ArchGraphSystem {
    node: ArchGraphNode,
    automorphisms: Option<PermGroup>,
    state: SystemState,
}

impl ArchGraphSystem {
    #[must_use]
    pub fn from_graph(graph: ArchGraph) -> ArchGraphSystem {
        ArchGraphSystem {
            node: ArchGraphNode::Graph(graph),
            automorphisms: None,
            state: SystemState::Uninitialized,
        }
    }

    /// A leaf with a known automorphism group.
    #[must_use]
    pub fn leaf(automorphisms: PermGroup) -> ArchGraphSystem {
        ArchGraphSystem {
            node: ArchGraphNode::Automorphisms(automorphisms),
            automorphisms: None,
            state: SystemState::Uninitialized,
        }
    }

    #[must_use]
    pub fn cluster(children: Vec<ArchGraphSystem>) -> ArchGraphSystem {
        assert!(!children.is_empty(), "clusters have at least one subsystem");

        ArchGraphSystem {
            node: ArchGraphNode::Cluster(children),
            automorphisms: None,
            state: SystemState::Uninitialized,
        }
    }

    #[must_use]
    pub fn super_graph(outer: ArchGraphSystem, proto: ArchGraphSystem) -> ArchGraphSystem {
        ArchGraphSystem {
            node: ArchGraphNode::Super {
                outer: Box::new(outer),
                proto: Box::new(proto),
            },
            automorphisms: None,
            state: SystemState::Uninitialized,
        }
    }

    #[must_use]
    pub fn node(&self) -> &ArchGraphNode {
        &self.node
    }

    #[must_use]
    pub fn num_processors(&self) -> usize {
        match &self.node {
            ArchGraphNode::Graph(graph) => graph.num_processors(),
            ArchGraphNode::Automorphisms(group) => group.degree(),
            ArchGraphNode::Cluster(children) => {
                children.iter().map(ArchGraphSystem::num_processors).sum()
            }
            ArchGraphNode::Super { outer, proto } => {
                outer.num_processors() * proto.num_processors()
            }
        }
    }

    /// # Errors
    ///
    /// `NotImplemented` for leaves built from a bare automorphism group,
    /// they carry no channel information.
    pub fn num_channels(&self) -> Result<usize> {
        match &self.node {
            ArchGraphNode::Graph(graph) => Ok(graph.num_channels()),
            ArchGraphNode::Automorphisms(_) => Err(Error::NotImplemented(
                "channel count of an automorphism-group leaf",
            )),
            ArchGraphNode::Cluster(children) => {
                let mut total = 0;
                for child in children {
                    total += child.num_channels()?;
                }
                Ok(total)
            }
            ArchGraphNode::Super { outer, proto } => {
                Ok(outer.num_channels()? + outer.num_processors() * proto.num_channels()?)
            }
        }
    }

    #[must_use]
    pub fn automorphisms_ready(&self) -> bool {
        self.automorphisms.is_some()
    }

    /// The automorphism group of the system, computed once and cached.
    ///
    /// # Errors
    ///
    /// Construction errors of the underlying group builds.
    pub fn automorphisms(&mut self, options: &BsgsOptions) -> Result<&PermGroup> {
        if self.automorphisms.is_none() {
            let group = match &mut self.node {
                ArchGraphNode::Graph(graph) => graph.automorphisms(options)?,
                ArchGraphNode::Automorphisms(group) => group.clone(),
                ArchGraphNode::Cluster(children) => {
                    let mut groups = Vec::with_capacity(children.len());
                    for child in children.iter_mut() {
                        groups.push(child.automorphisms(options)?.clone());
                    }
                    PermGroup::direct_product(groups.iter(), options)?
                }
                ArchGraphNode::Super { outer, proto } => {
                    let outer_group = outer.automorphisms(options)?.clone();
                    let proto_group = proto.automorphisms(options)?.clone();
                    PermGroup::wreath_product(&proto_group, &outer_group, options)?
                }
            };

            debug!("cached automorphism group of order {}", group.order());

            self.automorphisms = Some(group);
            if self.state == SystemState::Uninitialized {
                self.state = SystemState::AutoReady;
            }
        }

        Ok(self.automorphisms.as_ref().expect("cache was just filled"))
    }

    /// # Errors
    ///
    /// See [`ArchGraphSystem::automorphisms`].
    pub fn num_automorphisms(&mut self, options: &BsgsOptions) -> Result<Order> {
        Ok(self.automorphisms(options)?.order())
    }

    /// Drop all automorphism caches, recursively.
    pub fn reset_automorphisms(&mut self) {
        self.automorphisms = None;
        self.state = SystemState::Uninitialized;

        match &mut self.node {
            ArchGraphNode::Cluster(children) => {
                for child in children {
                    child.reset_automorphisms();
                }
            }
            ArchGraphNode::Super { outer, proto } => {
                outer.reset_automorphisms();
                proto.reset_automorphisms();
            }
            _ => {}
        }
    }

    #[must_use]
    pub fn repr_ready(&self) -> bool {
        self.state == SystemState::ReprReady
    }

    /// Eagerly prepare representative queries on this node and every child.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// See [`ArchGraphSystem::automorphisms`].
    pub fn init_repr(&mut self, options: &BsgsOptions) -> Result<()> {
        if self.repr_ready() {
            return Ok(());
        }

        self.automorphisms(options)?;

        match &mut self.node {
            ArchGraphNode::Cluster(children) => {
                for child in children {
                    child.init_repr(options)?;
                }
            }
            ArchGraphNode::Super { outer, proto } => {
                outer.init_repr(options)?;
                proto.init_repr(options)?;
            }
            _ => {}
        }

        self.state = SystemState::ReprReady;
        Ok(())
    }

    /// Drop back to `AutoReady`, keeping the automorphism caches.
    pub fn reset_repr(&mut self) {
        if self.state == SystemState::ReprReady {
            self.state = SystemState::AutoReady;
        }

        match &mut self.node {
            ArchGraphNode::Cluster(children) => {
                for child in children {
                    child.reset_repr();
                }
            }
            ArchGraphNode::Super { outer, proto } => {
                outer.reset_repr();
                proto.reset_repr();
            }
            _ => {}
        }
    }

    /// The canonical representative of the allocation's orbit under the
    /// system's automorphisms. Initializes representative state implicitly
    /// when necessary; the computed representative is registered in
    /// `orbits` when one is passed.
    ///
    /// # Errors
    ///
    /// See [`ArchGraphSystem::automorphisms`]; `CacheInvalid` when a cache
    /// was reset between `init_repr` and this call.
    pub fn repr(
        &mut self,
        allocation: &TaskAllocation,
        orbits: Option<&mut TaskOrbits>,
        options: &ReprOptions,
    ) -> Result<TaskMapping> {
        if !self.repr_ready() {
            self.init_repr(&BsgsOptions::default())?;
        }

        let representative =
            self.repr_in_range(allocation.clone(), options.offset, orbits.as_deref(), options)?;

        if let Some(orbits) = orbits {
            orbits.insert(representative.clone());
        }

        Ok(TaskMapping::new(allocation.clone(), representative))
    }

    // Representative within the acting range starting at `offset`. Clusters
    // canonicalize child by child with an accumulating offset; every other
    // node runs the configured search over its cached group.
    fn repr_in_range(
        &self,
        allocation: TaskAllocation,
        offset: usize,
        orbits: Option<&TaskOrbits>,
        options: &ReprOptions,
    ) -> Result<TaskAllocation> {
        match &self.node {
            ArchGraphNode::Cluster(children) => {
                let mut current = allocation;
                let mut offset = offset;

                for child in children {
                    current = child.repr_in_range(current, offset, None, options)?;
                    offset += child.num_processors();
                }

                Ok(current)
            }
            _ => {
                let group = self.cached_automorphisms()?;

                let child_options = ReprOptions {
                    offset,
                    ..options.clone()
                };

                Ok(task_mapping::min_elem(group, &allocation, orbits, &child_options))
            }
        }
    }

    fn cached_automorphisms(&self) -> Result<&PermGroup> {
        self.automorphisms.as_ref().ok_or(Error::CacheInvalid)
    }

    /// The partial-permutation inverse semigroup generated by the
    /// automorphisms, viewed as total partial permutations.
    ///
    /// # Errors
    ///
    /// `NotImplemented` on composite nodes.
    pub fn partial_automorphisms(
        &mut self,
        options: &BsgsOptions,
    ) -> Result<PartialPermInverseSemigroup> {
        match &self.node {
            ArchGraphNode::Cluster(_) => {
                return Err(Error::NotImplemented("partial automorphisms of a cluster"));
            }
            ArchGraphNode::Super { .. } => {
                return Err(Error::NotImplemented(
                    "partial automorphisms of a uniform super-graph",
                ));
            }
            _ => {}
        }

        let group = self.automorphisms(options)?;

        let generators: Vec<PartialPerm> = group
            .generators()
            .iter()
            .map(|r#gen| {
                PartialPerm::from_images(r#gen.images().to_vec())
                    .expect("permutations are partial permutations")
            })
            .collect();

        Ok(PartialPermInverseSemigroup::new(&generators))
    }
}
