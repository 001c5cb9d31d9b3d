use std::collections::HashMap;
use std::convert::TryFrom;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::jwk::JWK;
use crate::ldp::PublicKeyFetcher;
use crate::logging::Logger;
use crate::one_or_many::OneOrMany;
use crate::proof::ProofPurpose;

// ***********************************************
// * Data Structures for Decentralized Identifiers
// * https://w3c.github.io/did-core/
// ***********************************************

pub const DEFAULT_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

// v0.11 context used by universal resolver
pub const V0_11_CONTEXT: &str = "https://w3id.org/did/v0.11";

pub const W3ID_V1_CONTEXT: &str = "https://w3id.org/did/v1";

/// Type prefix of the keys preferred by [`default_verification_method`].
pub const ED25519_VERIFICATION_KEY: &str = "Ed25519VerificationKey";

type DID = String;
type DIDURL = String;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "@context")]
    pub context: Contexts,
    pub id: DID,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<OneOrMany<DID>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_invocation: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_delegation: Option<Vec<VerificationMethod>>,
    /// Legacy flat key list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<OneOrMany<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
#[serde(try_from = "OneOrMany<String>")]
pub enum Contexts {
    One(String),
    Many(Vec<String>),
}

/// A verification method, either embedded or referenced by id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum VerificationMethod {
    DIDURL(DIDURL),
    Map(VerificationMethodMap),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethodMap {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub controller: DID,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<JWK>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

impl TryFrom<OneOrMany<String>> for Contexts {
    type Error = Error;
    fn try_from(context: OneOrMany<String>) -> Result<Self, Self::Error> {
        let first_uri = match context.first() {
            None => return Err(Error::Missing("identity document context")),
            Some(uri) => uri,
        };
        if first_uri != DEFAULT_CONTEXT && first_uri != V0_11_CONTEXT && first_uri != W3ID_V1_CONTEXT
        {
            return Err(Error::InvalidInput(format!(
                "Invalid identity document context: {}",
                first_uri
            )));
        }
        Ok(match context {
            OneOrMany::One(context) => Contexts::One(context),
            OneOrMany::Many(contexts) => Contexts::Many(contexts),
        })
    }
}

impl From<Contexts> for OneOrMany<String> {
    fn from(contexts: Contexts) -> OneOrMany<String> {
        match contexts {
            Contexts::One(context) => OneOrMany::One(context),
            Contexts::Many(contexts) => OneOrMany::Many(contexts),
        }
    }
}

impl VerificationMethod {
    pub fn id(&self) -> &str {
        match self {
            Self::DIDURL(id) => id,
            Self::Map(map) => &map.id,
        }
    }

    pub fn type_(&self) -> &str {
        match self {
            Self::DIDURL(_) => "",
            Self::Map(map) => &map.type_,
        }
    }
}

impl VerificationMethodMap {
    /// Public key of this method, from `publicKeyJwk` or `publicKeyBase58`.
    pub fn get_jwk(&self) -> Result<JWK, Error> {
        if let Some(jwk) = &self.public_key_jwk {
            return Ok(jwk.to_public());
        }
        let pk_b58 = self
            .public_key_base58
            .as_ref()
            .ok_or(Error::Missing("verification method public key"))?;
        let pk_bytes = bs58::decode(pk_b58).into_vec()?;
        JWK::from_vm_type(&self.type_, &pk_bytes)
    }
}

impl Document {
    pub fn new(id: &str) -> Document {
        Document {
            context: Contexts::One(DEFAULT_CONTEXT.to_string()),
            id: String::from(id),
            controller: None,
            verification_method: None,
            authentication: None,
            assertion_method: None,
            key_agreement: None,
            capability_invocation: None,
            capability_delegation: None,
            public_key: None,
            property_set: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Document, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn relationship(&self, purpose: ProofPurpose) -> Option<&Vec<VerificationMethod>> {
        match purpose {
            ProofPurpose::Authentication => self.authentication.as_ref(),
            ProofPurpose::AssertionMethod => self.assertion_method.as_ref(),
            ProofPurpose::KeyAgreement => self.key_agreement.as_ref(),
            ProofPurpose::CapabilityInvocation => self.capability_invocation.as_ref(),
            ProofPurpose::CapabilityDelegation => self.capability_delegation.as_ref(),
        }
    }

    /// Find an embedded verification method by absolute or relative id.
    pub fn select_method(&self, id: &str) -> Option<&VerificationMethodMap> {
        let relative = id.strip_prefix(self.id.as_str());
        let relationships = [
            &self.authentication,
            &self.assertion_method,
            &self.key_agreement,
            &self.capability_invocation,
            &self.capability_delegation,
        ];
        self.verification_method
            .iter()
            .flatten()
            .chain(self.public_key.iter().flatten())
            .chain(relationships.into_iter().flatten().flatten())
            .filter_map(|vm| match vm {
                VerificationMethod::Map(map) => Some(map),
                VerificationMethod::DIDURL(_) => None,
            })
            .find(|map| map.id == id || Some(map.id.as_str()) == relative)
    }
}

/// Read-only view of an identity document, as needed to pick a key.
pub trait IdentityDocument {
    fn id(&self) -> &str;

    /// Ids of the methods listed for `purpose`, in document order.
    fn verification_method_ids(&self, purpose: ProofPurpose) -> Vec<String>;

    /// `(id, type)` of each entry of the legacy flat key list.
    fn public_keys(&self) -> Vec<(String, String)>;
}

impl IdentityDocument for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn verification_method_ids(&self, purpose: ProofPurpose) -> Vec<String> {
        self.relationship(purpose)
            .map(|vms| vms.iter().map(|vm| vm.id().to_string()).collect())
            .unwrap_or_default()
    }

    fn public_keys(&self) -> Vec<(String, String)> {
        self.public_key
            .iter()
            .flatten()
            .map(|vm| (vm.id().to_string(), vm.type_().to_string()))
            .collect()
    }
}

/// Pick the verification method for `purpose`.
///
/// Without a requested id the first listed method wins. A requested id must
/// be listed for `purpose`. A document listing nothing for `purpose` falls
/// back to [`default_verification_method`].
pub fn resolve_verification_method(
    doc: &dyn IdentityDocument,
    purpose: ProofPurpose,
    requested: Option<&str>,
    logger: Logger,
) -> Result<String, Error> {
    let listed = doc.verification_method_ids(purpose);
    if let Some(requested) = requested.filter(|id| !id.is_empty()) {
        return match listed.iter().find(|id| *id == requested) {
            Some(id) => Ok(id.clone()),
            None => Err(Error::NoMatchingVerificationMethod(requested.to_string())),
        };
    }
    match listed.into_iter().next() {
        Some(first) => Ok(first),
        None => {
            logger.warn(format_args!(
                "No {} verification method in {}, using default key",
                purpose,
                doc.id()
            ));
            default_verification_method(doc)
        }
    }
}

/// Default key of a document without relationship data.
///
/// Prefers the first Ed25519 key of the flat key list, else its first key,
/// else the first authentication method. Key ids that are not DIDs are
/// qualified by prefixing the document id.
// TODO: the qualification rule is provisional; revisit once relative DID URLs
// are resolved properly.
pub fn default_verification_method(doc: &dyn IdentityDocument) -> Result<String, Error> {
    let keys = doc.public_keys();
    let key = keys
        .iter()
        .find(|(_, type_)| type_.starts_with(ED25519_VERIFICATION_KEY))
        .or_else(|| keys.first());
    if let Some((id, _)) = key {
        if id.starts_with("did:") {
            return Ok(id.clone());
        }
        return Ok(format!("{}{}", doc.id(), id));
    }
    doc.verification_method_ids(ProofPurpose::Authentication)
        .into_iter()
        .next()
        .ok_or(Error::NoPublicKeyFound)
}

pub trait DIDResolver {
    fn resolve(&self, did: &str) -> Result<Document, Error>;
}

/// Resolver over a fixed set of documents.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    documents: HashMap<String, Document>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: Document) {
        self.documents.insert(document.id.clone(), document);
    }
}

impl DIDResolver for StaticResolver {
    fn resolve(&self, did: &str) -> Result<Document, Error> {
        self.documents
            .get(did)
            .cloned()
            .ok_or_else(|| Error::DocumentNotFound(did.to_string()))
    }
}

/// Fetches verification keys by resolving the controlling document.
pub struct ResolverKeyFetcher<'a> {
    resolver: &'a dyn DIDResolver,
}

impl<'a> ResolverKeyFetcher<'a> {
    pub fn new(resolver: &'a dyn DIDResolver) -> Self {
        Self { resolver }
    }
}

impl PublicKeyFetcher for ResolverKeyFetcher<'_> {
    fn fetch(&self, issuer: &str, verification_method: &str) -> Result<JWK, Error> {
        let did = match verification_method.split_once('#') {
            Some((did, _)) if !did.is_empty() => did,
            _ => issuer,
        };
        let doc = self.resolver.resolve(did)?;
        doc.select_method(verification_method)
            .ok_or_else(|| Error::NoMatchingVerificationMethod(verification_method.to_string()))?
            .get_jwk()
    }
}
