//! Wikibase knowledge base adapter
//!
//! Triples are written through the MediaWiki Action API: declarations create
//! entities, `rdfs:label` and `rdfs:comment` set terms, and everything else
//! becomes a claim on the subject's item. Queries go to the SPARQL endpoint.

pub mod auth;
pub mod client;
pub mod errors;
pub mod mapping;
pub mod uri_factory;
pub mod values;

pub use client::MediaWikiClient;
pub use uri_factory::UriFactory;
pub use values::PropertyDatatype;

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::api::adapter::{AdapterError, Binding, KnowledgeBaseAdapter};
use crate::api::operations::SyncResult;
use crate::config::{Credentials, ProjectConfig, SyncConfig, TransportPolicy};
use crate::graph::{Term, Triple, Vocabulary, local_name};
use mapping::{Edit, TermField, map_addition, map_removal};

/// Vocabulary predicates that get a property created on first use
const BUILTIN_RELATIONS: [Vocabulary; 5] = [
    Vocabulary::RdfType,
    Vocabulary::RdfsSubClassOf,
    Vocabulary::RdfsSubPropertyOf,
    Vocabulary::RdfsDomain,
    Vocabulary::RdfsRange,
];

/// Everything needed to open a session
#[derive(Debug, Clone)]
pub struct WikibaseSettings {
    pub api_endpoint: String,
    pub sparql_endpoint: String,
    pub credentials: Credentials,
    pub sync: SyncConfig,
    pub transport: TransportPolicy,
    pub uri_factory: UriFactory,
    pub timeout: Duration,
}

impl WikibaseSettings {
    pub fn new(
        api_endpoint: impl Into<String>,
        sparql_endpoint: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            sparql_endpoint: sparql_endpoint.into(),
            credentials,
            sync: SyncConfig::default(),
            transport: TransportPolicy::default(),
            uri_factory: UriFactory::new(),
            timeout: client::DEFAULT_TIMEOUT,
        }
    }

    pub fn from_project(config: &ProjectConfig, credentials: Credentials, uri_factory: UriFactory) -> Self {
        Self {
            api_endpoint: config.api_endpoint(),
            sparql_endpoint: config.sparql_endpoint(),
            credentials,
            sync: config.sync_config(),
            transport: config.transport_policy(),
            uri_factory,
            timeout: config.timeout().unwrap_or(client::DEFAULT_TIMEOUT),
        }
    }
}

#[derive(Debug)]
pub struct WikibaseAdapter {
    client: MediaWikiClient,
    sync: SyncConfig,
    uris: Mutex<UriFactory>,
    datatypes: Mutex<HashMap<String, PropertyDatatype>>,
}

impl WikibaseAdapter {
    /// Log in and return a ready adapter
    pub async fn authenticate(settings: WikibaseSettings) -> Result<Self, AdapterError> {
        let client = MediaWikiClient::new(
            settings.api_endpoint,
            settings.sparql_endpoint,
            settings.transport,
            settings.timeout,
        )?;

        auth::login(
            &client,
            &settings.credentials.username,
            &settings.credentials.password,
        )
        .await?;

        Ok(Self {
            client,
            sync: settings.sync,
            uris: Mutex::new(settings.uri_factory),
            datatypes: Mutex::new(HashMap::new()),
        })
    }

    fn remember(&self, uris: &mut UriFactory, uri: &str, id: &str) {
        uris.insert(uri, id);
        if let Err(e) = uris.save() {
            log::warn!("Could not persist URI map: {:#}", e);
        }
    }

    async fn create_entity(
        &self,
        kind: &str,
        label: &str,
        datatype: Option<PropertyDatatype>,
    ) -> Result<String, AdapterError> {
        let language = &self.sync.default_language;
        let mut data = json!({
            "labels": { language.as_str(): { "language": language, "value": label } }
        });
        if let Some(datatype) = datatype {
            data["datatype"] = Value::String(datatype.as_str().to_string());
        }

        let response = self
            .client
            .post_with_token(vec![
                ("action", "wbeditentity".to_string()),
                ("new", kind.to_string()),
                ("data", data.to_string()),
            ])
            .await?;

        let id = response
            .pointer("/entity/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AdapterError::rejected(format!("no id returned for new {}", kind)))?;

        log::debug!("Created {} {} ({})", kind, id, label);
        Ok(id)
    }

    /// Entity id for `uri`, creating an item when unmapped
    async fn ensure_item(&self, uri: &str) -> Result<String, AdapterError> {
        let mut uris = self.uris.lock().await;
        if let Some(id) = uris.get(uri) {
            return Ok(id.to_string());
        }

        let id = self.create_entity("item", local_name(uri), None).await?;
        self.remember(&mut uris, uri, &id);
        Ok(id)
    }

    async fn mapped(&self, uri: &str) -> Result<String, AdapterError> {
        self.uris
            .lock()
            .await
            .get(uri)
            .map(str::to_string)
            .ok_or_else(|| AdapterError::not_found(format!("<{}> has no Wikibase entity", uri)))
    }

    async fn declare_property(&self, uri: &str, datatype: PropertyDatatype) -> Result<SyncResult, AdapterError> {
        let mut uris = self.uris.lock().await;
        if let Some(id) = uris.get(uri) {
            return Err(if id.starts_with('P') {
                AdapterError::already_exists(format!("<{}> is already property {}", uri, id))
            } else {
                AdapterError::rejected(format!("<{}> is already mapped to item {}", uri, id))
            });
        }

        let id = self.create_entity("property", local_name(uri), Some(datatype)).await?;
        self.remember(&mut uris, uri, &id);
        self.datatypes.lock().await.insert(id.clone(), datatype);
        Ok(SyncResult::success_with(format!("created property {} ({})", id, datatype)))
    }

    /// Property id for a predicate
    async fn property_for(&self, predicate: &str) -> Result<String, AdapterError> {
        let mut uris = self.uris.lock().await;
        if let Some(id) = uris.property(predicate) {
            return Ok(id.to_string());
        }

        let builtin = Vocabulary::from_iri(predicate).filter(|term| BUILTIN_RELATIONS.contains(term));
        let Some(term) = builtin else {
            return Err(AdapterError::not_found(format!(
                "property <{}> is not declared in the knowledge base",
                predicate
            )));
        };

        let id = self
            .create_entity("property", &term.curie(), Some(PropertyDatatype::WikibaseItem))
            .await?;
        self.remember(&mut uris, predicate, &id);
        self.datatypes
            .lock()
            .await
            .insert(id.clone(), PropertyDatatype::WikibaseItem);
        Ok(id)
    }

    async fn datatype_of(&self, property: &str) -> Result<PropertyDatatype, AdapterError> {
        if let Some(datatype) = self.datatypes.lock().await.get(property) {
            return Ok(*datatype);
        }

        let response = self
            .client
            .get(vec![
                ("action", "wbgetentities".to_string()),
                ("ids", property.to_string()),
                ("props", "datatype".to_string()),
            ])
            .await?;

        let name = response
            .pointer(&format!("/entities/{}/datatype", property))
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::not_found(format!("property {} does not exist", property)))?;
        let datatype = PropertyDatatype::from_api(name).ok_or_else(|| {
            AdapterError::not_implemented(format!("property {} has unsupported datatype {}", property, name))
        })?;

        self.datatypes.lock().await.insert(property.to_string(), datatype);
        Ok(datatype)
    }

    async fn claim_value(
        &self,
        object: &Term,
        datatype: PropertyDatatype,
        create_items: bool,
    ) -> Result<Value, AdapterError> {
        match (object, datatype) {
            (Term::Iri(iri), PropertyDatatype::WikibaseItem) => {
                let id = if create_items {
                    self.ensure_item(iri).await?
                } else {
                    self.mapped(iri).await?
                };
                values::item_value(&id)
            }
            (Term::Iri(iri), PropertyDatatype::String | PropertyDatatype::Url | PropertyDatatype::ExternalId) => {
                Ok(Value::String(iri.clone()))
            }
            (Term::Iri(iri), PropertyDatatype::MonolingualText) => Err(AdapterError::malformed(format!(
                "<{}> given for a monolingual text property",
                iri
            ))),
            (Term::Literal(literal), _) => {
                values::literal_value(literal, datatype, &self.sync.default_language)
            }
            (Term::BlankNode(id), _) => Err(AdapterError::not_implemented(format!(
                "blank node _:{} cannot be a claim value",
                id
            ))),
        }
    }

    async fn matching_claims(&self, entity: &str, property: &str, value: &Value) -> Result<Vec<String>, AdapterError> {
        let response = self
            .client
            .get(vec![
                ("action", "wbgetclaims".to_string()),
                ("entity", entity.to_string()),
                ("property", property.to_string()),
            ])
            .await?;
        Ok(values::matching_claim_ids(&response, property, value))
    }

    async fn add_claim(&self, subject: &str, predicate: &str, object: &Term) -> Result<SyncResult, AdapterError> {
        let property = self.property_for(predicate).await?;
        let datatype = self.datatype_of(&property).await?;
        let value = self.claim_value(object, datatype, true).await?;
        let entity = self.ensure_item(subject).await?;

        if !self.matching_claims(&entity, &property, &value).await?.is_empty() {
            return Err(AdapterError::already_exists(format!(
                "{} already has a {} claim with this value",
                entity, property
            )));
        }

        let response = self
            .client
            .post_with_token(vec![
                ("action", "wbcreateclaim".to_string()),
                ("entity", entity.clone()),
                ("property", property.clone()),
                ("snaktype", "value".to_string()),
                ("value", value.to_string()),
            ])
            .await?;

        let claim = response
            .pointer("/claim/id")
            .and_then(Value::as_str)
            .unwrap_or("?");
        Ok(SyncResult::success_with(format!("claim {} ({} on {})", claim, property, entity)))
    }

    async fn remove_claim(&self, subject: &str, predicate: &str, object: &Term) -> Result<SyncResult, AdapterError> {
        let entity = self.mapped(subject).await?;
        let property = self
            .uris
            .lock()
            .await
            .property(predicate)
            .map(str::to_string)
            .ok_or_else(|| AdapterError::not_found(format!("property <{}> is not mapped", predicate)))?;
        let datatype = self.datatype_of(&property).await?;
        let value = self.claim_value(object, datatype, false).await?;

        let claims = self.matching_claims(&entity, &property, &value).await?;
        if claims.is_empty() {
            return Err(AdapterError::not_found(format!(
                "{} has no {} claim with this value",
                entity, property
            )));
        }

        self.client
            .post_with_token(vec![
                ("action", "wbremoveclaims".to_string()),
                ("claim", claims.join("|")),
            ])
            .await?;
        Ok(SyncResult::success_with(format!("removed {} claim(s) from {}", claims.len(), entity)))
    }

    async fn write_term(&self, entity: &str, field: TermField, language: &str, value: &str) -> Result<SyncResult, AdapterError> {
        self.client
            .post_with_token(vec![
                ("action", field.action().to_string()),
                ("id", entity.to_string()),
                ("language", language.to_string()),
                ("value", value.to_string()),
            ])
            .await?;
        Ok(SyncResult::success_with(format!("{} {}@{}", field.action(), entity, language)))
    }
}

#[async_trait]
impl KnowledgeBaseAdapter for WikibaseAdapter {
    fn name(&self) -> &str {
        self.client.api_url()
    }

    async fn add_triple(&self, triple: &Triple) -> Result<SyncResult, AdapterError> {
        match map_addition(triple, &self.sync.default_language)? {
            Edit::DeclareProperty { uri, datatype } => self.declare_property(uri, datatype).await,
            Edit::DeclareItem { uri } => {
                let id = self.ensure_item(uri).await?;
                Ok(SyncResult::success_with(id))
            }
            Edit::SetTerm {
                uri,
                field,
                language,
                value,
            } => {
                let entity = self.ensure_item(uri).await?;
                self.write_term(&entity, field, &language, value).await
            }
            Edit::ClearTerm { uri, field, language } => {
                let entity = self.mapped(uri).await?;
                self.write_term(&entity, field, &language, "").await
            }
            Edit::Claim {
                subject,
                predicate,
                object,
            } => self.add_claim(subject, predicate, object).await,
        }
    }

    async fn remove_triple(&self, triple: &Triple) -> Result<SyncResult, AdapterError> {
        match map_removal(triple, &self.sync.default_language)? {
            Edit::ClearTerm { uri, field, language } => {
                let entity = self.mapped(uri).await?;
                self.write_term(&entity, field, &language, "").await
            }
            Edit::Claim {
                subject,
                predicate,
                object,
            } => self.remove_claim(subject, predicate, object).await,
            other => Err(AdapterError::not_implemented(format!(
                "unsupported removal: {:?}",
                other
            ))),
        }
    }

    async fn resolve_uri(&self, uri: &str) -> Result<String, AdapterError> {
        self.ensure_item(uri).await
    }

    async fn query(&self, sparql: &str) -> Result<Vec<Binding>, AdapterError> {
        self.client.sparql(sparql).await
    }
}
