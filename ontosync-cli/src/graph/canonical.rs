//! Stable blank node labels
//!
//! Parsers invent fresh labels for anonymous nodes (`[ ... ]` in Turtle,
//! nested descriptions in RDF/XML) on every run. Relabeling each blank node
//! from a hash of its neighbourhood makes two loads of the same document
//! produce equal graphs, which the diff relies on.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use uuid::Uuid;

use super::model::{Graph, Term, Triple};

/// Prefix of every canonical blank node label
pub const CANONICAL_PREFIX: &str = "c14n";

const HASH_LEN: usize = 16;

/// Replace every blank node label with one derived from the node's
/// surrounding triples.
///
/// Colors are refined until the partition of blank nodes stops splitting.
/// Nodes left with the same color are structurally indistinguishable and are
/// numbered in order of their original label.
pub fn canonicalize_blank_nodes(graph: Graph) -> Graph {
    let labels = canonical_labels(&graph);
    if labels.is_empty() {
        return graph;
    }

    let relabel = |term: &Term| -> Term {
        match term {
            Term::BlankNode(id) => match labels.get(id) {
                Some(label) => Term::blank(label.clone()),
                None => term.clone(),
            },
            other => other.clone(),
        }
    };

    graph
        .iter()
        .map(|triple| Triple::new(relabel(&triple.subject), triple.predicate.clone(), relabel(&triple.object)))
        .collect()
}

/// Original label to canonical label, for every blank node in the graph
fn canonical_labels(graph: &Graph) -> HashMap<String, String> {
    let mut adjacency: BTreeMap<&str, Vec<&Triple>> = BTreeMap::new();
    for triple in graph.iter() {
        if let Term::BlankNode(id) = &triple.subject {
            adjacency.entry(id.as_str()).or_default().push(triple);
        }
        if let Term::BlankNode(id) = &triple.object {
            if triple.subject != triple.object {
                adjacency.entry(id.as_str()).or_default().push(triple);
            }
        }
    }

    let mut colors: HashMap<&str, String> =
        adjacency.keys().map(|id| (*id, String::new())).collect();
    let mut classes = 0;

    for _ in 0..=adjacency.len() {
        let refined: HashMap<&str, String> = adjacency
            .iter()
            .map(|(id, triples)| (*id, signature(id, triples, &colors)))
            .collect();
        let refined_classes = refined.values().collect::<BTreeSet<_>>().len();
        colors = refined;
        if refined_classes == classes {
            break;
        }
        classes = refined_classes;
    }

    let mut by_color: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, color) in &colors {
        by_color.entry(color.as_str()).or_default().push(*id);
    }

    let mut labels = HashMap::with_capacity(colors.len());
    for (color, mut ids) in by_color {
        ids.sort_unstable();
        let short = &color[..HASH_LEN.min(color.len())];
        if ids.len() == 1 {
            labels.insert(ids[0].to_string(), format!("{}{}", CANONICAL_PREFIX, short));
        } else {
            for (n, id) in ids.into_iter().enumerate() {
                labels.insert(id.to_string(), format!("{}{}_{}", CANONICAL_PREFIX, short, n));
            }
        }
    }
    labels
}

fn signature(id: &str, triples: &[&Triple], colors: &HashMap<&str, String>) -> String {
    let render = |term: &Term| -> String {
        match term {
            Term::BlankNode(other) if other == id => "@".to_string(),
            Term::BlankNode(other) => format!("_:{}", colors.get(other.as_str()).map(String::as_str).unwrap_or("")),
            other => other.to_string(),
        }
    };

    let mut edges: Vec<String> = triples
        .iter()
        .map(|triple| {
            if triple.subject == triple.object {
                format!("= <{}>", triple.predicate)
            } else if matches!(&triple.subject, Term::BlankNode(s) if s == id) {
                format!("> <{}> {}", triple.predicate, render(&triple.object))
            } else {
                format!("< <{}> {}", triple.predicate, render(&triple.subject))
            }
        })
        .collect();
    edges.sort_unstable();

    let own = colors.get(id).map(String::as_str).unwrap_or("");
    let input = format!("{}\n{}", own, edges.join("\n"));
    Uuid::new_v5(&Uuid::NAMESPACE_OID, input.as_bytes()).simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    const SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    const ON_PROPERTY: &str = "http://www.w3.org/2002/07/owl#onProperty";
    const RESTRICTION: &str = "http://www.w3.org/2002/07/owl#Restriction";

    fn ex(name: &str) -> Term {
        Term::iri(format!("http://example.org/{}", name))
    }

    fn restriction(label: &str, property: &str) -> Vec<Triple> {
        vec![
            Triple::new(ex("Cat"), SUBCLASS_OF, Term::blank(label)),
            Triple::new(Term::blank(label), RDF_TYPE, Term::iri(RESTRICTION)),
            Triple::new(Term::blank(label), ON_PROPERTY, ex(property)),
        ]
    }

    #[test]
    fn test_labels_do_not_depend_on_parser_labels() {
        let a: Graph = restriction("genid42", "owner").into_iter().collect();
        let b: Graph = restriction("xyz", "owner").into_iter().collect();

        assert_ne!(a, b);
        assert_eq!(canonicalize_blank_nodes(a), canonicalize_blank_nodes(b));
    }

    #[test]
    fn test_different_structures_keep_different_labels() {
        let graph: Graph = restriction("a", "owner")
            .into_iter()
            .chain(restriction("b", "friend"))
            .collect();

        let canonical = canonicalize_blank_nodes(graph);
        let blanks: BTreeSet<_> = canonical
            .iter()
            .filter_map(|t| match &t.subject {
                Term::BlankNode(id) => Some(id.clone()),
                _ => None,
            })
            .collect();

        assert_eq!(canonical.len(), 6);
        assert_eq!(blanks.len(), 2);
        assert!(blanks.iter().all(|id| id.starts_with(CANONICAL_PREFIX)));
    }

    #[test]
    fn test_chained_blank_nodes() {
        let list = |head: &str, tail: &str| -> Graph {
            let first = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
            let rest = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
            let nil = Term::iri("http://www.w3.org/1999/02/22-rdf-syntax-ns#nil");
            vec![
                Triple::new(ex("Pet"), "http://www.w3.org/2002/07/owl#unionOf", Term::blank(head)),
                Triple::new(Term::blank(head), first, ex("Cat")),
                Triple::new(Term::blank(head), rest, Term::blank(tail)),
                Triple::new(Term::blank(tail), first, ex("Dog")),
                Triple::new(Term::blank(tail), rest, nil),
            ]
            .into_iter()
            .collect()
        };

        assert_eq!(
            canonicalize_blank_nodes(list("n1", "n2")),
            canonicalize_blank_nodes(list("q9", "q3"))
        );
    }

    #[test]
    fn test_indistinguishable_nodes_stay_distinct() {
        let graph: Graph = vec![
            Triple::new(ex("Cat"), SUBCLASS_OF, Term::blank("x")),
            Triple::new(ex("Cat"), SUBCLASS_OF, Term::blank("y")),
        ]
        .into_iter()
        .collect();

        let canonical = canonicalize_blank_nodes(graph);
        assert_eq!(canonical.len(), 2);
    }

    #[test]
    fn test_graph_without_blank_nodes_unchanged() {
        let graph: Graph = vec![Triple::new(ex("fluffy"), RDF_TYPE, ex("Cat"))]
            .into_iter()
            .collect();

        assert_eq!(canonicalize_blank_nodes(graph.clone()), graph);
    }
}
