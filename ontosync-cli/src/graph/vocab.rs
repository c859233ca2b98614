//! Recognized RDF, RDFS and OWL vocabulary terms
//!
//! Classification and the Wikibase mapping only ever compare against this
//! closed set. Any IRI that is not listed here is treated as an ordinary,
//! user-defined term.

use std::fmt;

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    RdfType,
    RdfProperty,
    RdfsClass,
    RdfsLabel,
    RdfsComment,
    RdfsSubClassOf,
    RdfsSubPropertyOf,
    RdfsDomain,
    RdfsRange,
    OwlClass,
    OwlObjectProperty,
    OwlDatatypeProperty,
    OwlAnnotationProperty,
}

impl Vocabulary {
    pub const ALL: [Vocabulary; 13] = [
        Self::RdfType,
        Self::RdfProperty,
        Self::RdfsClass,
        Self::RdfsLabel,
        Self::RdfsComment,
        Self::RdfsSubClassOf,
        Self::RdfsSubPropertyOf,
        Self::RdfsDomain,
        Self::RdfsRange,
        Self::OwlClass,
        Self::OwlObjectProperty,
        Self::OwlDatatypeProperty,
        Self::OwlAnnotationProperty,
    ];

    /// Full IRI of the term
    pub fn iri(self) -> &'static str {
        match self {
            Self::RdfType => "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
            Self::RdfProperty => "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property",
            Self::RdfsClass => "http://www.w3.org/2000/01/rdf-schema#Class",
            Self::RdfsLabel => "http://www.w3.org/2000/01/rdf-schema#label",
            Self::RdfsComment => "http://www.w3.org/2000/01/rdf-schema#comment",
            Self::RdfsSubClassOf => "http://www.w3.org/2000/01/rdf-schema#subClassOf",
            Self::RdfsSubPropertyOf => "http://www.w3.org/2000/01/rdf-schema#subPropertyOf",
            Self::RdfsDomain => "http://www.w3.org/2000/01/rdf-schema#domain",
            Self::RdfsRange => "http://www.w3.org/2000/01/rdf-schema#range",
            Self::OwlClass => "http://www.w3.org/2002/07/owl#Class",
            Self::OwlObjectProperty => "http://www.w3.org/2002/07/owl#ObjectProperty",
            Self::OwlDatatypeProperty => "http://www.w3.org/2002/07/owl#DatatypeProperty",
            Self::OwlAnnotationProperty => "http://www.w3.org/2002/07/owl#AnnotationProperty",
        }
    }

    /// Look up a recognized term by IRI
    pub fn from_iri(iri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|term| term.iri() == iri)
    }

    /// Prefixed form for display (e.g., "owl:ObjectProperty")
    pub fn curie(self) -> String {
        let iri = self.iri();
        [("rdf", RDF_NS), ("rdfs", RDFS_NS), ("owl", OWL_NS)]
            .into_iter()
            .find_map(|(prefix, ns)| iri.strip_prefix(ns).map(|local| format!("{}:{}", prefix, local)))
            .unwrap_or_else(|| iri.to_string())
    }

    /// Types that declare their subject to be a property
    pub fn is_property_marker(self) -> bool {
        matches!(
            self,
            Self::OwlDatatypeProperty
                | Self::OwlObjectProperty
                | Self::OwlAnnotationProperty
                | Self::RdfProperty
        )
    }

    /// Types that declare their subject to be a class
    pub fn is_class_marker(self) -> bool {
        matches!(self, Self::RdfsClass)
    }

    /// Types whose subject becomes a Wikibase item rather than a claim.
    /// `owl:Class` is only a declaration here; classification treats it as an
    /// ordinary type.
    pub fn is_item_declaration(self) -> bool {
        matches!(self, Self::RdfsClass | Self::OwlClass)
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.curie())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_terms() {
        for term in Vocabulary::ALL {
            assert_eq!(Vocabulary::from_iri(term.iri()), Some(term));
        }
    }

    #[test]
    fn test_unrecognized_iri() {
        assert_eq!(Vocabulary::from_iri("http://example.org/Cat"), None);
        assert_eq!(Vocabulary::from_iri("http://www.w3.org/2002/07/owl#FunctionalProperty"), None);
    }

    #[test]
    fn test_markers_are_disjoint() {
        for term in Vocabulary::ALL {
            assert!(!(term.is_property_marker() && term.is_class_marker()), "{}", term);
        }
        assert!(Vocabulary::RdfProperty.is_property_marker());
        assert!(Vocabulary::RdfsClass.is_class_marker());
        assert!(!Vocabulary::OwlClass.is_class_marker());
        assert!(Vocabulary::OwlClass.is_item_declaration());
        assert!(!Vocabulary::RdfsLabel.is_property_marker());
    }

    #[test]
    fn test_curie() {
        assert_eq!(Vocabulary::OwlObjectProperty.curie(), "owl:ObjectProperty");
        assert_eq!(Vocabulary::RdfType.to_string(), "rdf:type");
    }
}
