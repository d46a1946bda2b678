//! Labeled architecture graphs: processing elements typed by capability,
//! channels typed by protocol.

use std::fmt::Write as _;

use internment::ArcIntern;
use log::{debug, trace};

use crate::bsgs::BsgsOptions;
use crate::colored_graph::ColoredGraph;
use crate::error::{Error, Result};
use crate::perm::{Perm, PermSet};
use crate::perm_group::PermGroup;

/// An undirected multigraph of processing elements and communication
/// channels, both typed by interned string labels. Processing elements are
/// numbered `1..=n` in insertion order, matching the points the
/// automorphism group acts on.
#[derive(Clone, Debug, Default)]
pub struct ArchGraph {
    processor_types: Vec<ArcIntern<str>>,
    channel_types: Vec<ArcIntern<str>>,
    // processor type index per PE
    processors: Vec<usize>,
    // endpoints (1-based) and channel type index
    channels: Vec<(usize, usize, usize)>,
}

impl ArchGraph {
    #[must_use]
    pub fn new() -> ArchGraph {
        ArchGraph::default()
    }

    /// Register a processor type, returning its index. Registering the same
    /// label twice returns the existing index.
    pub fn new_processor_type(&mut self, label: &str) -> usize {
        let label = ArcIntern::<str>::from(label);

        if let Some(existing) = self.processor_types.iter().position(|t| *t == label) {
            return existing;
        }

        self.processor_types.push(label);
        self.processor_types.len() - 1
    }

    /// Register a channel type, returning its index.
    pub fn new_channel_type(&mut self, label: &str) -> usize {
        let label = ArcIntern::<str>::from(label);

        if let Some(existing) = self.channel_types.iter().position(|t| *t == label) {
            return existing;
        }

        self.channel_types.push(label);
        self.channel_types.len() - 1
    }

    /// The index of a registered processor type.
    #[must_use]
    pub fn processor_type_index(&self, label: &str) -> Option<usize> {
        self.processor_types.iter().position(|t| &**t == label)
    }

    /// The index of a registered channel type.
    #[must_use]
    pub fn channel_type_index(&self, label: &str) -> Option<usize> {
        self.channel_types.iter().position(|t| &**t == label)
    }

    /// Add a processing element of the given type; returns its 1-based id.
    pub fn add_processor(&mut self, processor_type: usize) -> usize {
        assert!(processor_type < self.processor_types.len(), "registered processor type");

        self.processors.push(processor_type);
        self.processors.len()
    }

    /// Add an undirected channel between two processing elements.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if an endpoint is not a registered processing element.
    pub fn add_channel(&mut self, from: usize, to: usize, channel_type: usize) -> Result<()> {
        assert!(channel_type < self.channel_types.len(), "registered channel type");

        for point in [from, to] {
            if point < 1 || point > self.processors.len() {
                return Err(Error::OutOfRange {
                    point,
                    degree: self.processors.len(),
                });
            }
        }

        self.channels.push((from, to, channel_type));
        Ok(())
    }

    #[must_use]
    pub fn num_processors(&self) -> usize {
        self.processors.len()
    }

    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn processor_type_label(&self, pe: usize) -> &str {
        &self.processor_types[self.processors[pe - 1]]
    }

    /// The automorphism group of the colored graph: all PE permutations
    /// preserving processor types, adjacency and channel types.
    ///
    /// Channel types are folded into vertex colors by stacking
    /// `floor(log2(types)) + 1` copies of the vertex set connected by
    /// vertical chains, with the level-`l` copy of an edge present iff bit
    /// `l` of `type index + 1` is set; the stacked graph's vertex-colored
    /// automorphisms restricted to the base layer are exactly the channel
    /// automorphisms.
    ///
    /// # Errors
    ///
    /// Construction errors of the selected [`BsgsOptions`].
    pub fn automorphisms(&self, options: &BsgsOptions) -> Result<PermGroup> {
        let n = self.num_processors();
        assert!(n >= 1, "automorphisms of an empty architecture are undefined");

        let mut type_bits = 0;
        let mut remaining = self.channel_types.len();
        while remaining > 0 {
            type_bits += 1;
            remaining >>= 1;
        }
        let levels = type_bits.max(1);

        debug!("encoding {} channel types over {levels} vertex levels", self.channel_types.len());

        let colors: Vec<usize> = (0..levels)
            .flat_map(|level| {
                self.processors
                    .iter()
                    .map(move |&t| t + level * self.processor_types.len())
            })
            .collect();

        let mut graph = ColoredGraph::new(n * levels, colors);

        for level in 1..levels {
            for v in 0..n {
                graph.add_edge(v + level * n, v + (level - 1) * n);
            }
        }

        for &(from, to, channel_type) in &self.channels {
            for level in 0..levels {
                if (channel_type + 1) & (1 << level) != 0 {
                    graph.add_edge(from - 1 + level * n, to - 1 + level * n);
                }
            }
        }

        let mut generators = PermSet::new();
        for automorphism in graph.automorphisms() {
            let images: Vec<usize> = automorphism[..n].iter().map(|&v| v + 1).collect();
            let perm = Perm::from_images(images).expect("automorphisms are bijections");

            if !perm.is_identity() {
                trace!("found automorphism {perm}");
                generators.push(perm);
            }
        }

        PermGroup::from_generators(n, generators, options)
    }

    /// DOT rendering, processing elements filled by processor type and
    /// channels colored by channel type.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::new();

        out.push_str("graph {\n");
        out.push_str("layout=neato\n");
        out.push_str("splines=true\n");
        out.push_str("overlap=scalexy\n");
        out.push_str("sep=1\n");

        for (i, &t) in self.processors.iter().enumerate() {
            let _ = writeln!(
                out,
                "{i} [label=PE{},style=filled,colorscheme=accent8,fillcolor={}]",
                i + 1,
                t + 1
            );
        }

        for &(from, to, channel_type) in &self.channels {
            let _ = writeln!(
                out,
                "{} -- {} [penwidth=2,colorscheme=accent8,color={}]",
                from - 1,
                to - 1,
                channel_type + 1
            );
        }

        out.push_str("}\n");
        out
    }
}
