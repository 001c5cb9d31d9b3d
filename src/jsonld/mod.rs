//! JSON-LD processing: expansion and conversion to RDF through the
//! `json-ld` crate.

use std::collections::BTreeMap;

use futures::executor::block_on;
use json_ld::{JsonLdProcessor, Options};
use json_syntax::Parse;
use serde_json::Value;

use crate::error::Error;
use crate::logging::Logger;
use crate::rdf::{
    BlankNodeLabel, DataSet, GraphLabel, IRIRef, Lang, Literal, Object, Predicate, Statement,
    StringLiteral, Subject,
};

pub mod loader;

use loader::{JsonLdLoader, RemoteDocument};
pub use loader::{DocumentLoader, StaticLoader};

/// IRI prefix given to unlabelled node objects when tracing JSON paths.
const PATH_ID_PREFIX: &str = "urn:vc-proofs:path:";

/// Prefix of the blank node labels substituted back for traced nodes.
const PATH_LABEL_PREFIX: &str = "_:p";

/// Result of converting a document to RDF with path tracing.
#[derive(Debug, Clone, Default)]
pub struct RdfOutput {
    pub dataset: DataSet,
    /// JSON path of each unlabelled node object (`""` for the root,
    /// `"/credentialSubject"`, `"/items/0"`, ...) mapped to its blank node
    /// label in `dataset`.
    pub blank_node_ids: BTreeMap<String, String>,
}

pub struct Processor<'a> {
    pub(crate) loader: &'a dyn DocumentLoader,
    pub(crate) logger: Logger,
}

impl<'a> Processor<'a> {
    pub fn new(loader: &'a dyn DocumentLoader, logger: Logger) -> Self {
        Self { loader, logger }
    }

    /// Expand a document and deserialize it to an RDF dataset.
    ///
    /// <https://www.w3.org/TR/json-ld11-api/#dom-jsonldprocessor-tordf>
    pub fn to_rdf(&self, document: &Value) -> Result<DataSet, Error> {
        let dataset = block_on(self.json_to_dataset(document))?;
        self.logger.debug(format_args!(
            "converted document to {} statements",
            dataset.statements().len()
        ));
        Ok(dataset)
    }

    /// Like [`Processor::to_rdf`], but every node object without an
    /// identifier is traced from its JSON path to its blank node label.
    pub fn to_rdf_with_paths(&self, document: &Value) -> Result<RdfOutput, Error> {
        let mut document = document.clone();
        let mut paths = Vec::new();
        label_node_objects(&mut document, String::new(), &mut paths);
        let dataset = self.to_rdf(&document)?;
        let blank_node_ids = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| (path, format!("{}{}", PATH_LABEL_PREFIX, i)))
            .collect();
        Ok(RdfOutput {
            dataset,
            blank_node_ids,
        })
    }

    async fn json_to_dataset(&self, document: &Value) -> Result<DataSet, Error> {
        let content = serde_json::to_string(document)?;
        let json = json_syntax::Value::parse_str(&content, |span| span)
            .map_err(|e| Error::Canonicalization(format!("{:?}", e)))?;
        let doc = RemoteDocument::new(None, None, json);
        let mut loader = JsonLdLoader::new(self.loader);
        let mut generator =
            rdf_types::generator::Blank::new_with_prefix("b".to_string()).with_default_metadata();
        let mut to_rdf = doc
            .to_rdf_using::<_, json_ld::syntax::context::Value<locspan::Span>, _, _>(&mut generator, &mut loader, Options::default())
            .await
            .map_err(|e| Error::Canonicalization(format!("{:?}", e)))?;
        let mut dataset = DataSet::default();
        for rdf_types::Quad(subject, predicate, object, graph) in to_rdf.cloned_quads() {
            // Generalized RDF is not produced, so predicates are IRIs.
            let predicate = match predicate.into_iri() {
                Some(iri) => Predicate::IRIRef(IRIRef(iri.as_str().to_string())),
                None => continue,
            };
            dataset.add_statement(Statement {
                subject: match subject {
                    rdf_types::Subject::Iri(iri) => match path_label(iri.as_str()) {
                        Some(label) => Subject::BlankNodeLabel(label),
                        None => Subject::IRIRef(IRIRef(iri.as_str().to_string())),
                    },
                    rdf_types::Subject::Blank(blank) => {
                        Subject::BlankNodeLabel(BlankNodeLabel(blank.as_str().to_string()))
                    }
                },
                predicate,
                object: match object {
                    rdf_types::Object::Iri(iri) => match path_label(iri.as_str()) {
                        Some(label) => Object::BlankNodeLabel(label),
                        None => Object::IRIRef(IRIRef(iri.as_str().to_string())),
                    },
                    rdf_types::Object::Blank(blank) => {
                        Object::BlankNodeLabel(BlankNodeLabel(blank.as_str().to_string()))
                    }
                    rdf_types::Object::Literal(literal) => Object::Literal(convert_literal(literal)),
                },
                graph_label: graph.map(|graph| match graph {
                    rdf_types::Subject::Iri(iri) => match path_label(iri.as_str()) {
                        Some(label) => GraphLabel::BlankNodeLabel(label),
                        None => GraphLabel::IRIRef(IRIRef(iri.as_str().to_string())),
                    },
                    rdf_types::Subject::Blank(blank) => {
                        GraphLabel::BlankNodeLabel(BlankNodeLabel(blank.as_str().to_string()))
                    }
                }),
            });
        }
        Ok(dataset)
    }
}

fn convert_literal(literal: rdf_types::Literal) -> Literal {
    match literal {
        rdf_types::Literal::String(string) => Literal::String {
            string: StringLiteral(string.as_str().to_string()),
        },
        rdf_types::Literal::TypedString(string, type_) => Literal::Typed {
            string: StringLiteral(string.as_str().to_string()),
            type_: IRIRef(type_.as_str().to_string()),
        },
        rdf_types::Literal::LangString(string, lang) => Literal::LangTagged {
            string: StringLiteral(string.as_str().to_string()),
            lang: Lang(lang.as_str().to_string()),
        },
    }
}

fn path_label(iri: &str) -> Option<BlankNodeLabel> {
    iri.strip_prefix(PATH_ID_PREFIX)
        .map(|index| BlankNodeLabel(format!("{}{}", PATH_LABEL_PREFIX, index)))
}

/// Give each node object lacking an identifier a temporary `@id` naming its
/// position in `paths`.
///
/// Value objects, `@context` entries and list objects are not node objects;
/// list members are still visited.
fn label_node_objects(value: &mut Value, path: String, paths: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                label_node_objects(item, format!("{}/{}", path, i), paths);
            }
        }
        Value::Object(map) => {
            if map.contains_key("@value") {
                return;
            }
            let container = ["@list", "@set"]
                .into_iter()
                .find(|keyword| map.contains_key(*keyword));
            if let Some(items) = container.and_then(|keyword| map.get_mut(keyword)) {
                label_node_objects(items, path, paths);
                return;
            }
            for (key, item) in map.iter_mut() {
                if key == "@context" {
                    continue;
                }
                label_node_objects(item, format!("{}/{}", path, key), paths);
            }
            if !map.contains_key("id") && !map.contains_key("@id") {
                map.insert(
                    "@id".to_string(),
                    Value::String(format!("{}{}", PATH_ID_PREFIX, paths.len())),
                );
                paths.push(path);
            }
        }
        _ => {}
    }
}
