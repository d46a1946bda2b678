//! Loader for the declarative architecture description format.
//!
//! ```text
//! graph {
//!   processor_types { P1 P2 }
//!   channel_types { bus }
//!   processors { 1 P1  2 P2  3 P1  4 P2 }
//!   channels { 1 -- 2 bus  2 -- 3 bus  3 -- 4 bus  4 -- 1 bus }
//! }
//! ```
//!
//! `cluster { <node> ... }` and `super { <outer> <proto> }` compose nodes
//! recursively.

use pest::Parser;
use pest::error::ErrorVariant;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::arch_graph::ArchGraph;
use crate::arch_graph_system::ArchGraphSystem;
use crate::error::{Error, Result};

#[derive(Parser)]
#[grammar = "arch.pest"]
struct DescriptionParser;

/// Parse a textual architecture description into a system tree.
///
/// # Errors
///
/// A `Parse` error with a span pointing at the offending token: syntax
/// errors, undeclared type labels, out-of-range processor ids.
pub fn parse(description: &str) -> Result<ArchGraphSystem> {
    let mut parsed = DescriptionParser::parse(Rule::description, description)
        .map_err(Box::new)?
        .next()
        .expect("description rule matched")
        .into_inner();

    parse_node(parsed.next().expect("description contains a node"))
}

fn custom_error(message: String, span: pest::Span<'_>) -> Error {
    Error::Parse(Box::new(pest::error::Error::new_from_span(
        ErrorVariant::CustomError { message },
        span,
    )))
}

fn parse_node(pair: Pair<'_, Rule>) -> Result<ArchGraphSystem> {
    let inner = pair.into_inner().next().expect("node has a variant");

    match inner.as_rule() {
        Rule::graph => parse_graph(inner),
        Rule::cluster => {
            let children = inner
                .into_inner()
                .map(parse_node)
                .collect::<Result<Vec<_>>>()?;

            Ok(ArchGraphSystem::cluster(children))
        }
        Rule::super_graph => {
            let mut nodes = inner.into_inner();
            let outer = parse_node(nodes.next().expect("super graph has an outer node"))?;
            let proto = parse_node(nodes.next().expect("super graph has a proto node"))?;

            Ok(ArchGraphSystem::super_graph(outer, proto))
        }
        _ => unreachable!("node matches exactly one variant"),
    }
}

fn parse_number(pair: &Pair<'_, Rule>) -> Result<usize> {
    pair.as_str()
        .parse()
        .map_err(|_| custom_error("number too large".to_owned(), pair.as_span()))
}

fn parse_graph(pair: Pair<'_, Rule>) -> Result<ArchGraphSystem> {
    let mut graph = ArchGraph::new();
    let mut sections = pair.into_inner();

    for label in sections.next().expect("processor_types section").into_inner() {
        graph.new_processor_type(label.as_str());
    }

    for label in sections.next().expect("channel_types section").into_inner() {
        graph.new_channel_type(label.as_str());
    }

    for processor in sections.next().expect("processors section").into_inner() {
        let mut parts = processor.into_inner();

        let id_pair = parts.next().expect("processor id");
        let id = parse_number(&id_pair)?;

        let type_pair = parts.next().expect("processor type label");
        let Some(type_index) = graph.processor_type_index(type_pair.as_str()) else {
            return Err(custom_error(
                format!("undeclared processor type `{}`", type_pair.as_str()),
                type_pair.as_span(),
            ));
        };

        let assigned = graph.add_processor(type_index);
        if assigned != id {
            return Err(custom_error(
                format!("processor ids must be consecutive from 1, expected {assigned}"),
                id_pair.as_span(),
            ));
        }
    }

    for channel in sections.next().expect("channels section").into_inner() {
        let mut parts = channel.into_inner();

        let from_pair = parts.next().expect("channel source");
        let from = parse_number(&from_pair)?;

        let to_pair = parts.next().expect("channel target");
        let to = parse_number(&to_pair)?;

        let type_pair = parts.next().expect("channel type label");
        let Some(type_index) = graph.channel_type_index(type_pair.as_str()) else {
            return Err(custom_error(
                format!("undeclared channel type `{}`", type_pair.as_str()),
                type_pair.as_span(),
            ));
        };

        if graph.add_channel(from, to, type_index).is_err() {
            return Err(custom_error(
                format!(
                    "channel endpoint out of range, processors are 1..={}",
                    graph.num_processors()
                ),
                from_pair.as_span(),
            ));
        }
    }

    Ok(ArchGraphSystem::from_graph(graph))
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::arch_graph_system::ArchGraphNode;
    use crate::bsgs::BsgsOptions;
    use crate::error::Error;

    const SQUARE: &str = "
        graph {
          processor_types { P }
          channel_types { bus }
          processors { 1 P  2 P  3 P  4 P }
          channels { 1 -- 2 bus  2 -- 3 bus  3 -- 4 bus  4 -- 1 bus }
        }
    ";

    #[test]
    fn parses_a_leaf_graph() {
        let mut system = parse(SQUARE).unwrap();

        assert_eq!(system.num_processors(), 4);
        assert_eq!(system.num_channels().unwrap(), 4);
        assert_eq!(
            system
                .num_automorphisms(&BsgsOptions::default())
                .unwrap()
                .to_u64(),
            8
        );
    }

    #[test]
    fn parses_compositions() {
        let description = format!("cluster {{ {SQUARE} {SQUARE} }}");
        let mut system = parse(&description).unwrap();

        assert!(matches!(system.node(), ArchGraphNode::Cluster(children) if children.len() == 2));
        assert_eq!(system.num_processors(), 8);
        assert_eq!(
            system
                .num_automorphisms(&BsgsOptions::default())
                .unwrap()
                .to_u64(),
            64
        );

        let description = format!("super {{ {SQUARE} {SQUARE} }}");
        let system = parse(&description).unwrap();
        assert_eq!(system.num_processors(), 16);
    }

    #[test]
    fn rejects_syntax_errors() {
        assert!(matches!(parse("graph { oops }"), Err(Error::Parse(_))));
        assert!(matches!(parse(""), Err(Error::Parse(_))));
    }

    #[test]
    fn rejects_undeclared_labels() {
        let description = "
            graph {
              processor_types { P }
              channel_types { bus }
              processors { 1 Q }
              channels { }
            }
        ";

        assert!(matches!(parse(description), Err(Error::Parse(_))));
    }

    #[test]
    fn rejects_bad_channel_endpoints() {
        let description = "
            graph {
              processor_types { P }
              channel_types { bus }
              processors { 1 P  2 P }
              channels { 1 -- 7 bus }
            }
        ";

        assert!(matches!(parse(description), Err(Error::Parse(_))));
    }

    #[test]
    fn rejects_non_consecutive_processor_ids() {
        let description = "
            graph {
              processor_types { P }
              channel_types { bus }
              processors { 1 P  3 P }
              channels { }
            }
        ";

        assert!(matches!(parse(description), Err(Error::Parse(_))));
    }

    #[test]
    fn comments_are_ignored() {
        let description = "
            # two processing elements on a bus
            graph {
              processor_types { P }
              channel_types { bus }
              processors { 1 P  2 P }
              channels { 1 -- 2 bus }  # the bus
            }
        ";

        let system = parse(description).unwrap();
        assert_eq!(system.num_processors(), 2);
    }
}
