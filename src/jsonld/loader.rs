use futures::future::{BoxFuture, FutureExt};
use iref::IriBuf;
use json_ld::Loader;
use json_syntax::Parse;
use locspan::Span;
use rdf_types::IriVocabularyMut;
use serde_json::Value;

use crate::error::Error;

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const CREDENTIALS_EXAMPLES_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/examples/v1";
pub const ODRL_CONTEXT: &str = "https://www.w3.org/ns/odrl.jsonld";
pub const SCHEMA_ORG_CONTEXT: &str = "https://schema.org/";
pub const SECURITY_V1_CONTEXT: &str = "https://w3id.org/security/v1";
pub const SECURITY_V2_CONTEXT: &str = "https://w3id.org/security/v2";
pub const DID_V1_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
pub const DID_V1_CONTEXT_NO_WWW: &str = "https://w3.org/ns/did/v1";
pub const W3ID_DID_V1_CONTEXT: &str = "https://w3id.org/did/v1";
pub const LDS_JWS2020_V1_CONTEXT: &str =
    "https://w3c-ccg.github.io/lds-jws2020/contexts/lds-jws2020-v1.json";
pub const W3ID_JWS2020_V1_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";
pub const CITIZENSHIP_V1_CONTEXT: &str = "https://w3id.org/citizenship/v1";
pub const BBS_V1_CONTEXT: &str = "https://w3id.org/security/bbs/v1";

/// Source of remote JSON-LD context documents.
///
/// `load` returns the whole remote document; the context is read from its
/// `@context` entry.
pub trait DocumentLoader: Sync {
    fn load(&self, url: &str) -> Result<Value, Error>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&str) -> Result<Value, Error> + Sync,
{
    fn load(&self, url: &str) -> Result<Value, Error> {
        self(url)
    }
}

lazy_static::lazy_static! {
    static ref CREDENTIALS_V1_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::CREDENTIALS_V1).ok();
    static ref CREDENTIALS_EXAMPLES_V1_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::CREDENTIALS_EXAMPLES_V1).ok();
    static ref ODRL_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::ODRL).ok();
    static ref SCHEMA_ORG_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::SCHEMA_ORG).ok();
    static ref SECURITY_V1_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::SECURITY_V1).ok();
    static ref SECURITY_V2_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::SECURITY_V2).ok();
    static ref DID_V1_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::DID_V1).ok();
    static ref LDS_JWS2020_V1_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::LDS_JWS2020_V1).ok();
    static ref CITIZENSHIP_V1_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::CITIZENSHIP_V1).ok();
    static ref BBS_V1_CONTEXT_DOCUMENT: Option<Value> =
        serde_json::from_str(ssi_contexts::BBS_V1).ok();
}

macro_rules! iri_match {
    { match $input:ident { $($($id:ident)|* => $e:expr,)* _ as $default:ident => $de:expr } } => {
        match $input {
            $($input if $($input == $id)||* => $e,)*
            $default => $de
        }
    };
}

/// Loader serving the contexts bundled with `ssi-contexts`.
///
/// Unknown URLs fail; nothing is fetched over the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLoader;

impl DocumentLoader for StaticLoader {
    fn load(&self, url: &str) -> Result<Value, Error> {
        let document: &Option<Value> = iri_match! {
            match url {
                CREDENTIALS_V1_CONTEXT => &CREDENTIALS_V1_CONTEXT_DOCUMENT,
                CREDENTIALS_EXAMPLES_V1_CONTEXT => &CREDENTIALS_EXAMPLES_V1_CONTEXT_DOCUMENT,
                ODRL_CONTEXT => &ODRL_CONTEXT_DOCUMENT,
                SCHEMA_ORG_CONTEXT => &SCHEMA_ORG_CONTEXT_DOCUMENT,
                SECURITY_V1_CONTEXT => &SECURITY_V1_CONTEXT_DOCUMENT,
                SECURITY_V2_CONTEXT => &SECURITY_V2_CONTEXT_DOCUMENT,
                DID_V1_CONTEXT | DID_V1_CONTEXT_NO_WWW | W3ID_DID_V1_CONTEXT => &DID_V1_CONTEXT_DOCUMENT,
                LDS_JWS2020_V1_CONTEXT | W3ID_JWS2020_V1_CONTEXT => &LDS_JWS2020_V1_CONTEXT_DOCUMENT,
                CITIZENSHIP_V1_CONTEXT => &CITIZENSHIP_V1_CONTEXT_DOCUMENT,
                BBS_V1_CONTEXT => &BBS_V1_CONTEXT_DOCUMENT,
                _ as url => return Err(Error::LoadContext(url.to_string()))
            }
        };
        document
            .clone()
            .ok_or_else(|| Error::LoadContext(url.to_string()))
    }
}

/// Remote JSON-LD document, as handed to the `json-ld` processor.
pub type RemoteDocument = json_ld::RemoteDocument<IriBuf, Span>;

/// Adapts a [`DocumentLoader`] to the loader interface of the `json-ld`
/// processor.
pub(crate) struct JsonLdLoader<'a> {
    loader: &'a dyn DocumentLoader,
}

impl<'a> JsonLdLoader<'a> {
    pub(crate) fn new(loader: &'a dyn DocumentLoader) -> Self {
        Self { loader }
    }

    fn remote_document(&self, url: IriBuf) -> Result<RemoteDocument, Error> {
        let document = self.loader.load(url.as_str())?;
        let content = serde_json::to_string(&document)?;
        let value = json_syntax::Value::parse_str(&content, |span| span)
            .map_err(|e| Error::LoadContext(format!("{}: {:?}", url.as_str(), e)))?;
        Ok(RemoteDocument::new(Some(url), None, value))
    }
}

impl<'l> Loader<IriBuf, Span> for JsonLdLoader<'l> {
    type Output = json_syntax::Value<Span>;
    type Error = Error;

    fn load_with<'a>(
        &'a mut self,
        _vocabulary: &'a mut (impl Sync + Send + IriVocabularyMut<Iri = IriBuf>),
        url: IriBuf,
    ) -> BoxFuture<'a, json_ld::LoadingResult<IriBuf, Span, Self::Output, Self::Error>>
    where
        IriBuf: 'a,
    {
        let result = self.remote_document(url);
        async move { result }.boxed()
    }
}
