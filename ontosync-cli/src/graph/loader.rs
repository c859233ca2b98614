//! Parsing serialized RDF documents into [`Graph`]s
//!
//! Loading is all-or-nothing: a syntax error anywhere in the input fails the
//! whole load and no partial graph is returned.

use std::fmt;
use std::path::{Path, PathBuf};

use oxttl::{NTriplesParser, TurtleParser};
use rio_api::model::{Literal as RioLiteral, Subject as RioSubject, Term as RioTerm, Triple as RioTriple};
use rio_api::parser::TriplesParser;
use rio_xml::{RdfXmlError, RdfXmlParser};
use serde::{Deserialize, Serialize};

use super::canonical::canonicalize_blank_nodes;
use super::model::{Graph, Term, Triple};
use super::vocab::{RDF_LANG_STRING, XSD_STRING};

/// Supported text serializations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RdfFormat {
    Turtle,
    NTriples,
    RdfXml,
}

impl RdfFormat {
    /// Detect format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "ttl" | "turtle" => Some(Self::Turtle),
            "nt" | "ntriples" => Some(Self::NTriples),
            "rdf" | "xml" | "owl" | "rdfxml" => Some(Self::RdfXml),
            _ => None,
        }
    }

    /// Detect format from a path, defaulting to Turtle
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Self::Turtle)
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Turtle => "Turtle",
            Self::NTriples => "N-Triples",
            Self::RdfXml => "RDF/XML",
        };
        f.write_str(name)
    }
}

/// Where a graph comes from
#[derive(Debug, Clone)]
pub enum GraphSource {
    /// A file on disk; format is detected from the extension
    File(PathBuf),
    /// Serialized text already in memory
    Text { content: String, format: RdfFormat },
    /// No prior state (e.g., a freshly deployed knowledge base)
    Empty,
}

impl GraphSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn turtle(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            format: RdfFormat::Turtle,
        }
    }

    /// Human-readable origin for logs and error messages
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Text { format, .. } => format!("inline {} text", format),
            Self::Empty => "empty graph".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("RDF source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} from {origin}: {message}")]
    Parse {
        origin: String,
        format: RdfFormat,
        message: String,
    },
}

/// Parses RDF sources into graphs
#[derive(Debug, Clone, Default)]
pub struct GraphLoader {
    base_iri: Option<String>,
}

impl GraphLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base IRI used to resolve relative IRIs in text sources.
    /// Files default to their own `file://` location.
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    pub fn load(&self, source: &GraphSource) -> Result<Graph, LoadError> {
        match source {
            GraphSource::File(path) => self.load_file(path),
            GraphSource::Text { content, format } => {
                self.parse(content, *format, self.base_iri.as_deref(), &source.describe())
            }
            GraphSource::Empty => Ok(Graph::new()),
        }
    }

    pub fn load_file(&self, path: &Path) -> Result<Graph, LoadError> {
        if !path.is_file() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let base_iri = match &self.base_iri {
            Some(base) => Some(base.clone()),
            None => std::fs::canonicalize(path)
                .ok()
                .map(|abs| format!("file://{}", abs.display())),
        };

        let format = RdfFormat::from_path(path);
        let graph = self.parse(&content, format, base_iri.as_deref(), &path.display().to_string())?;
        log::debug!("Loaded {} triples from {} ({})", graph.len(), path.display(), format);
        Ok(graph)
    }

    pub fn load_str(&self, content: &str, format: RdfFormat) -> Result<Graph, LoadError> {
        self.parse(content, format, self.base_iri.as_deref(), &format!("inline {} text", format))
    }

    fn parse(
        &self,
        content: &str,
        format: RdfFormat,
        base_iri: Option<&str>,
        origin: &str,
    ) -> Result<Graph, LoadError> {
        if content.trim().is_empty() {
            return Ok(Graph::new());
        }

        let parse_error = |message: String| LoadError::Parse {
            origin: origin.to_string(),
            format,
            message,
        };

        let graph = match format {
            RdfFormat::Turtle => parse_turtle(content, base_iri),
            RdfFormat::NTriples => parse_ntriples(content),
            RdfFormat::RdfXml => parse_rdf_xml(content, base_iri),
        }
        .map_err(parse_error)?;

        Ok(canonicalize_blank_nodes(graph))
    }
}

/// Load a graph with default loader settings
pub fn load(source: &GraphSource) -> Result<Graph, LoadError> {
    GraphLoader::new().load(source)
}

fn parse_turtle(content: &str, base_iri: Option<&str>) -> Result<Graph, String> {
    let mut parser = TurtleParser::new();
    if let Some(base) = base_iri {
        parser = parser
            .with_base_iri(base)
            .map_err(|e| format!("invalid base IRI '{}': {}", base, e))?;
    }

    let mut graph = Graph::new();
    for result in parser.for_reader(content.as_bytes()) {
        let triple = result.map_err(|e| e.to_string())?;
        graph.insert(convert_ox_triple(triple)?);
    }
    Ok(graph)
}

fn parse_ntriples(content: &str) -> Result<Graph, String> {
    let mut graph = Graph::new();
    for result in NTriplesParser::new().for_reader(content.as_bytes()) {
        let triple = result.map_err(|e| e.to_string())?;
        graph.insert(convert_ox_triple(triple)?);
    }
    Ok(graph)
}

fn parse_rdf_xml(content: &str, base_iri: Option<&str>) -> Result<Graph, String> {
    let base = match base_iri {
        Some(base) => Some(
            oxiri::Iri::parse(base.to_string())
                .map_err(|e| format!("invalid base IRI '{}': {}", base, e))?,
        ),
        None => None,
    };

    let mut parser = RdfXmlParser::new(content.as_bytes(), base);
    let mut graph = Graph::new();
    let mut unsupported: Option<String> = None;

    parser
        .parse_all(&mut |triple: RioTriple<'_>| -> Result<(), RdfXmlError> {
            match convert_rio_triple(&triple) {
                Ok(triple) => {
                    graph.insert(triple);
                }
                Err(message) => {
                    unsupported.get_or_insert(message);
                }
            }
            Ok(())
        })
        .map_err(|e| e.to_string())?;

    match unsupported {
        Some(message) => Err(message),
        None => Ok(graph),
    }
}

fn convert_ox_triple(triple: oxrdf::Triple) -> Result<Triple, String> {
    let subject = match triple.subject {
        oxrdf::Subject::NamedNode(node) => Term::iri(node.as_str()),
        oxrdf::Subject::BlankNode(node) => Term::blank(node.as_str()),
        #[allow(unreachable_patterns)]
        other => return Err(format!("unsupported subject: {}", other)),
    };

    let object = match triple.object {
        oxrdf::Term::NamedNode(node) => Term::iri(node.as_str()),
        oxrdf::Term::BlankNode(node) => Term::blank(node.as_str()),
        oxrdf::Term::Literal(literal) => {
            make_literal(literal.value(), literal.language(), Some(literal.datatype().as_str()))
        }
        #[allow(unreachable_patterns)]
        other => return Err(format!("unsupported object: {}", other)),
    };

    Ok(Triple::new(subject, triple.predicate.as_str(), object))
}

fn convert_rio_triple(triple: &RioTriple<'_>) -> Result<Triple, String> {
    let subject = match triple.subject {
        RioSubject::NamedNode(node) => Term::iri(node.iri),
        RioSubject::BlankNode(node) => Term::blank(node.id),
        #[allow(unreachable_patterns)]
        _ => return Err("quoted triples are not supported in subject position".to_string()),
    };

    let object = match triple.object {
        RioTerm::NamedNode(node) => Term::iri(node.iri),
        RioTerm::BlankNode(node) => Term::blank(node.id),
        RioTerm::Literal(RioLiteral::Simple { value }) => make_literal(value, None, None),
        RioTerm::Literal(RioLiteral::LanguageTaggedString { value, language }) => {
            make_literal(value, Some(language), None)
        }
        RioTerm::Literal(RioLiteral::Typed { value, datatype }) => {
            make_literal(value, None, Some(datatype.iri))
        }
        #[allow(unreachable_patterns)]
        _ => return Err("quoted triples are not supported in object position".to_string()),
    };

    Ok(Triple::new(subject, triple.predicate.iri, object))
}

/// Build a literal so that equal values compare equal regardless of the
/// serialization they came from.
fn make_literal(value: &str, language: Option<&str>, datatype: Option<&str>) -> Term {
    if let Some(language) = language {
        return Term::lang_literal(value, language);
    }
    match datatype {
        None | Some(XSD_STRING) | Some(RDF_LANG_STRING) => Term::literal(value),
        Some(datatype) => Term::typed_literal(value, datatype),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::vocab::Vocabulary;
    use std::io::Write;

    const CATS_TTL: &str = r#"
        @prefix ex: <http://example.org/> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

        ex:Cat a rdfs:Class ;
            rdfs:label "Cat"@en .
        ex:fluffy a ex:Cat ;
            ex:age "4"^^<http://www.w3.org/2001/XMLSchema#integer> ;
            ex:nickname "Fluff" .
    "#;

    #[test]
    fn test_load_turtle_text() {
        let graph = GraphLoader::new().load_str(CATS_TTL, RdfFormat::Turtle).unwrap();

        assert_eq!(graph.len(), 5);
        let fluffy = Term::iri("http://example.org/fluffy");
        let types: Vec<_> = graph.objects(&fluffy, Vocabulary::RdfType.iri()).collect();
        assert_eq!(types, vec![&Term::iri("http://example.org/Cat")]);

        let nickname: Vec<_> = graph.objects(&fluffy, "http://example.org/nickname").collect();
        assert_eq!(nickname, vec![&Term::literal("Fluff")]);
    }

    #[test]
    fn test_turtle_and_ntriples_agree() {
        let ntriples = concat!(
            "<http://example.org/Cat> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/2000/01/rdf-schema#Class> .\n",
            "<http://example.org/Cat> <http://www.w3.org/2000/01/rdf-schema#label> \"Cat\"@en .\n",
            "<http://example.org/fluffy> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/Cat> .\n",
            "<http://example.org/fluffy> <http://example.org/age> \"4\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n",
            "<http://example.org/fluffy> <http://example.org/nickname> \"Fluff\"^^<http://www.w3.org/2001/XMLSchema#string> .\n",
        );

        let loader = GraphLoader::new();
        let from_turtle = loader.load_str(CATS_TTL, RdfFormat::Turtle).unwrap();
        let from_ntriples = loader.load_str(ntriples, RdfFormat::NTriples).unwrap();

        assert_eq!(from_turtle, from_ntriples);
    }

    #[test]
    fn test_load_rdf_xml() {
        let xml = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#">
  <rdfs:Class rdf:about="http://example.org/Cat">
    <rdfs:label xml:lang="en">Cat</rdfs:label>
  </rdfs:Class>
</rdf:RDF>"#;

        let graph = GraphLoader::new().load_str(xml, RdfFormat::RdfXml).unwrap();

        assert_eq!(graph.len(), 2);
        assert!(graph.contains(&Triple::new(
            Term::iri("http://example.org/Cat"),
            Vocabulary::RdfsLabel.iri(),
            Term::lang_literal("Cat", "en"),
        )));
    }

    #[test]
    fn test_anonymous_nodes_load_identically() {
        let ttl = r#"
            @prefix ex: <http://example.org/> .
            @prefix owl: <http://www.w3.org/2002/07/owl#> .
            @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

            ex:Cat a rdfs:Class ;
                rdfs:subClassOf [ a owl:Restriction ; owl:onProperty ex:owner ] .
            ex:Pet owl:unionOf ( ex:Cat ex:Dog ) .
        "#;

        let loader = GraphLoader::new();
        let first = loader.load_str(ttl, RdfFormat::Turtle).unwrap();
        let second = loader.load_str(ttl, RdfFormat::Turtle).unwrap();

        assert_eq!(first.len(), 9);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_error_is_all_or_nothing() {
        let broken = "@prefix ex: <http://example.org/> .\nex:a ex:b ex:c .\nex:d ex:e";

        let err = GraphLoader::new().load_str(broken, RdfFormat::Turtle).unwrap_err();
        assert!(matches!(err, LoadError::Parse { format: RdfFormat::Turtle, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load(&GraphSource::file("/definitely/not/here.ttl")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_load_file_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cats.nt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "<http://example.org/fluffy> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/Cat> ."
        )
        .unwrap();

        let graph = load(&GraphSource::file(&path)).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_empty_sources() {
        assert!(load(&GraphSource::Empty).unwrap().is_empty());
        assert!(load(&GraphSource::turtle("   \n")).unwrap().is_empty());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(RdfFormat::from_path(Path::new("a.ttl")), RdfFormat::Turtle);
        assert_eq!(RdfFormat::from_path(Path::new("a.NT")), RdfFormat::NTriples);
        assert_eq!(RdfFormat::from_path(Path::new("a.owl")), RdfFormat::RdfXml);
        assert_eq!(RdfFormat::from_path(Path::new("a.unknown")), RdfFormat::Turtle);
    }
}
