//! Translating triples into Wikibase edits
//!
//! Pure decision logic; the adapter turns each [`Edit`] into API calls.

use crate::api::adapter::AdapterError;
use crate::graph::{Term, Triple, Vocabulary};

use super::values::PropertyDatatype;

/// Fingerprint term written by a label or comment triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermField {
    Label,
    Description,
}

impl TermField {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Label => "wbsetlabel",
            Self::Description => "wbsetdescription",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<'a> {
    /// Create a property entity
    DeclareProperty { uri: &'a str, datatype: PropertyDatatype },
    /// Make sure an item exists for a class
    DeclareItem { uri: &'a str },
    SetTerm {
        uri: &'a str,
        field: TermField,
        language: String,
        value: &'a str,
    },
    ClearTerm {
        uri: &'a str,
        field: TermField,
        language: String,
    },
    /// Statement on the subject's entity
    Claim {
        subject: &'a str,
        predicate: &'a str,
        object: &'a Term,
    },
}

fn subject_uri(triple: &Triple) -> Result<&str, AdapterError> {
    match &triple.subject {
        Term::Iri(iri) => Ok(iri),
        Term::BlankNode(id) => Err(AdapterError::not_implemented(format!(
            "blank node subject _:{} has no Wikibase entity",
            id
        ))),
        Term::Literal(_) => Err(AdapterError::malformed("literal in subject position")),
    }
}

fn declaration_marker(triple: &Triple) -> Option<Vocabulary> {
    if triple.predicate != Vocabulary::RdfType.iri() {
        return None;
    }
    triple
        .object
        .as_iri()
        .and_then(Vocabulary::from_iri)
        .filter(|term| term.is_property_marker() || term.is_item_declaration())
}

fn term_field(predicate: &str) -> Option<TermField> {
    match Vocabulary::from_iri(predicate) {
        Some(Vocabulary::RdfsLabel) => Some(TermField::Label),
        Some(Vocabulary::RdfsComment) => Some(TermField::Description),
        _ => None,
    }
}

fn claim(triple: &Triple) -> Result<Edit<'_>, AdapterError> {
    let subject = subject_uri(triple)?;
    if let Term::BlankNode(id) = &triple.object {
        return Err(AdapterError::not_implemented(format!(
            "blank node object _:{} cannot be stored as a claim value",
            id
        )));
    }
    Ok(Edit::Claim {
        subject,
        predicate: &triple.predicate,
        object: &triple.object,
    })
}

pub fn map_addition<'a>(triple: &'a Triple, default_language: &str) -> Result<Edit<'a>, AdapterError> {
    let uri = subject_uri(triple)?;

    if let Some(marker) = declaration_marker(triple) {
        return Ok(match PropertyDatatype::for_declaration(marker) {
            Some(datatype) => Edit::DeclareProperty { uri, datatype },
            None => Edit::DeclareItem { uri },
        });
    }

    if let Some(field) = term_field(&triple.predicate) {
        let literal = triple.object.as_literal().ok_or_else(|| {
            AdapterError::malformed(format!("{} value must be a literal, got {}", field.action(), triple.object))
        })?;
        return Ok(Edit::SetTerm {
            uri,
            field,
            language: literal
                .language
                .clone()
                .unwrap_or_else(|| default_language.to_string()),
            value: &literal.value,
        });
    }

    claim(triple)
}

pub fn map_removal<'a>(triple: &'a Triple, default_language: &str) -> Result<Edit<'a>, AdapterError> {
    let uri = subject_uri(triple)?;

    if let Some(marker) = declaration_marker(triple) {
        return Err(AdapterError::not_implemented(format!(
            "removing the {} declaration of <{}> would delete the entity",
            marker, uri
        )));
    }

    if let Some(field) = term_field(&triple.predicate) {
        let language = triple
            .object
            .as_literal()
            .and_then(|literal| literal.language.clone())
            .unwrap_or_else(|| default_language.to_string());
        return Ok(Edit::ClearTerm { uri, field, language });
    }

    claim(triple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::adapter::OperationErrorKind;

    fn ex(name: &str) -> Term {
        Term::iri(format!("http://example.org/{}", name))
    }

    fn typed(subject: Term, marker: Vocabulary) -> Triple {
        Triple::new(subject, Vocabulary::RdfType.iri(), Term::iri(marker.iri()))
    }

    #[test]
    fn test_property_declarations() {
        let object_prop = typed(ex("owner"), Vocabulary::OwlObjectProperty);
        let data_prop = typed(ex("age"), Vocabulary::OwlDatatypeProperty);

        assert_eq!(
            map_addition(&object_prop, "en").unwrap(),
            Edit::DeclareProperty {
                uri: "http://example.org/owner",
                datatype: PropertyDatatype::WikibaseItem
            }
        );
        assert_eq!(
            map_addition(&data_prop, "en").unwrap(),
            Edit::DeclareProperty {
                uri: "http://example.org/age",
                datatype: PropertyDatatype::String
            }
        );
    }

    #[test]
    fn test_class_declaration() {
        let triple = typed(ex("Cat"), Vocabulary::OwlClass);
        assert_eq!(
            map_addition(&triple, "en").unwrap(),
            Edit::DeclareItem { uri: "http://example.org/Cat" }
        );
    }

    #[test]
    fn test_instance_typing_is_a_claim() {
        let triple = Triple::new(ex("fluffy"), Vocabulary::RdfType.iri(), ex("Cat"));
        assert!(matches!(map_addition(&triple, "en").unwrap(), Edit::Claim { .. }));
    }

    #[test]
    fn test_labels_use_tag_or_default_language() {
        let tagged = Triple::new(ex("Cat"), Vocabulary::RdfsLabel.iri(), Term::lang_literal("Chat", "fr"));
        let untagged = Triple::new(ex("Cat"), Vocabulary::RdfsComment.iri(), Term::literal("A feline"));

        assert_eq!(
            map_addition(&tagged, "en").unwrap(),
            Edit::SetTerm {
                uri: "http://example.org/Cat",
                field: TermField::Label,
                language: "fr".to_string(),
                value: "Chat"
            }
        );
        assert_eq!(
            map_addition(&untagged, "de").unwrap(),
            Edit::SetTerm {
                uri: "http://example.org/Cat",
                field: TermField::Description,
                language: "de".to_string(),
                value: "A feline"
            }
        );
    }

    #[test]
    fn test_label_must_be_literal() {
        let triple = Triple::new(ex("Cat"), Vocabulary::RdfsLabel.iri(), ex("Other"));
        let err = map_addition(&triple, "en").unwrap_err();
        assert_eq!(err.operation_kind(), Some(OperationErrorKind::Malformed));
    }

    #[test]
    fn test_blank_nodes_not_implemented() {
        let subject = Triple::new(Term::blank("b0"), "http://example.org/p", Term::literal("x"));
        let object = Triple::new(ex("a"), "http://example.org/p", Term::blank("b1"));

        for triple in [&subject, &object] {
            let err = map_addition(triple, "en").unwrap_err();
            assert_eq!(err.operation_kind(), Some(OperationErrorKind::NotImplemented));
        }
    }

    #[test]
    fn test_removals() {
        let label = Triple::new(ex("Cat"), Vocabulary::RdfsLabel.iri(), Term::lang_literal("Cat", "en"));
        assert_eq!(
            map_removal(&label, "en").unwrap(),
            Edit::ClearTerm {
                uri: "http://example.org/Cat",
                field: TermField::Label,
                language: "en".to_string()
            }
        );

        let declaration = typed(ex("Cat"), Vocabulary::RdfsClass);
        let err = map_removal(&declaration, "en").unwrap_err();
        assert_eq!(err.operation_kind(), Some(OperationErrorKind::NotImplemented));

        let statement = Triple::new(ex("fluffy"), "http://example.org/age", Term::literal("4"));
        assert!(matches!(map_removal(&statement, "en").unwrap(), Edit::Claim { .. }));
    }
}
