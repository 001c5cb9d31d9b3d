use std::convert::TryFrom;
use std::str::FromStr;

use chrono::prelude::*;
use chrono::SubsecRound;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::suites::ProofSuiteType;

/// Current time truncated to milliseconds, the precision proofs carry.
pub(crate) fn now_ms() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Intended use of a proof, named after the identity document relationship
/// that lists the keys allowed for it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub enum ProofPurpose {
    AssertionMethod,
    Authentication,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl Default for ProofPurpose {
    fn default() -> Self {
        Self::AssertionMethod
    }
}

impl ProofPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssertionMethod => "assertionMethod",
            Self::Authentication => "authentication",
            Self::KeyAgreement => "keyAgreement",
            Self::CapabilityInvocation => "capabilityInvocation",
            Self::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

impl FromStr for ProofPurpose {
    type Err = Error;
    fn from_str(purpose: &str) -> Result<Self, Self::Err> {
        match purpose {
            "assertionMethod" => Ok(Self::AssertionMethod),
            "authentication" => Ok(Self::Authentication),
            "keyAgreement" => Ok(Self::KeyAgreement),
            "capabilityInvocation" => Ok(Self::CapabilityInvocation),
            "capabilityDelegation" => Ok(Self::CapabilityDelegation),
            _ => Err(Error::InvalidInput(format!(
                "Unsupported proof purpose: {}",
                purpose
            ))),
        }
    }
}

impl TryFrom<String> for ProofPurpose {
    type Error = Error;
    fn try_from(purpose: String) -> Result<Self, Self::Error> {
        Self::from_str(&purpose)
    }
}

impl From<ProofPurpose> for String {
    fn from(purpose: ProofPurpose) -> String {
        purpose.as_str().to_string()
    }
}

impl std::fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An embedded proof. Members other than the ones named here are kept in
/// `property_set`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "@context")]
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<ProofPurpose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

impl Proof {
    pub fn new(type_: ProofSuiteType) -> Self {
        Self {
            type_: type_.to_string(),
            ..Self::default()
        }
    }

    /// Fill the proof options in. `created` defaults to now.
    pub fn with_options(self, options: &ProofOptions) -> Self {
        Self {
            proof_purpose: options.proof_purpose,
            verification_method: options.verification_method.clone(),
            domain: options.domain.clone(),
            challenge: options.challenge.clone(),
            created: Some(options.created.unwrap_or_else(now_ms)),
            ..self
        }
    }

    pub fn suite_type(&self) -> Result<ProofSuiteType, Error> {
        self.type_.parse()
    }

    /// The proof as it is canonicalized for signing: signature members
    /// removed and the document's `@context` applied, followed by any
    /// context the proof carries itself.
    pub fn to_signing_options(&self, document_context: &Value) -> Result<Value, Error> {
        let mut copy = self.clone();
        copy.jws = None;
        copy.proof_value = None;
        copy.nonce = None;
        copy.context = merge_contexts(document_context, &self.context);
        Ok(serde_json::to_value(&copy)?)
    }
}

fn merge_contexts(document_context: &Value, proof_context: &Value) -> Value {
    let extra = match proof_context {
        Value::Null => return document_context.clone(),
        Value::Array(contexts) => contexts.clone(),
        context => vec![context.clone()],
    };
    let mut merged = match document_context {
        Value::Array(contexts) => contexts.clone(),
        Value::Null => Vec::new(),
        context => vec![context.clone()],
    };
    for context in extra {
        if !merged.contains(&context) {
            merged.push(context);
        }
    }
    Value::Array(merged)
}

/// Caller choices for a new proof.
///
/// Unset members are filled in by the proof engine; set members are never
/// overridden.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProofOptions {
    /// Suite name. Defaults to the suite matching the signer's algorithm.
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<ProofPurpose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}
