use std::convert::TryFrom;
use std::str::FromStr;

use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::jsonld::loader::CREDENTIALS_V1_CONTEXT;
use crate::ldp::LinkedDataDocument;
use crate::one_or_many::OneOrMany;
use crate::proof::{Proof, ProofPurpose};

// ********************************************
// * Data Structures for Verifiable Credentials
// * W3C Editor's Draft 15 January 2020
// * https://w3c.github.io/vc-data-model/
// ********************************************

pub const DEFAULT_CONTEXT: &str = CREDENTIALS_V1_CONTEXT;

pub const CREDENTIAL_TYPE: &str = "VerifiableCredential";
pub const PRESENTATION_TYPE: &str = "VerifiablePresentation";

type URI = String;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context")]
    pub context: Contexts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<URI>,
    #[serde(rename = "type")]
    pub type_: OneOrMany<String>,
    pub credential_subject: OneOrMany<CredentialSubject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<VCDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<OneOrMany<Proof>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<VCDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<OneOrMany<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

/// RFC 3339 date-time as it appears in a credential.
///
/// Keeps track of whether UTC was written as `Z` or `+00:00` so that
/// re-serializing does not change the signed form.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct VCDateTime {
    date_time: DateTime<FixedOffset>,
    use_z: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Context {
    URI(URI),
    Object(Map<String, Value>),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
#[serde(try_from = "OneOrMany<Context>")]
pub enum Contexts {
    One(Context),
    Many(Vec<Context>),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<URI>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Issuer {
    URI(URI),
    Object(ObjectWithId),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ObjectWithId {
    pub id: URI,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Schema {
    pub id: URI,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(rename = "@context")]
    pub context: Contexts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<URI>,
    #[serde(rename = "type")]
    pub type_: OneOrMany<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifiable_credential: Option<OneOrMany<CredentialOrJWT>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<OneOrMany<Proof>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<URI>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
#[allow(clippy::large_enum_variant)]
pub enum CredentialOrJWT {
    Credential(Credential),
    JWT(String),
}

impl Default for Contexts {
    fn default() -> Self {
        Self::One(Context::URI(DEFAULT_CONTEXT.to_string()))
    }
}

impl TryFrom<OneOrMany<Context>> for Contexts {
    type Error = Error;
    fn try_from(context: OneOrMany<Context>) -> Result<Self, Self::Error> {
        let first_uri = match context.first() {
            None => return Err(Error::Missing("@context")),
            Some(Context::URI(uri)) => uri,
            Some(Context::Object(_)) => {
                return Err(Error::InvalidInput(
                    "First @context entry must be a URI".to_string(),
                ))
            }
        };
        if first_uri != DEFAULT_CONTEXT {
            return Err(Error::InvalidInput(format!(
                "Invalid credential context: {}",
                first_uri
            )));
        }
        Ok(match context {
            OneOrMany::One(context) => Contexts::One(context),
            OneOrMany::Many(contexts) => Contexts::Many(contexts),
        })
    }
}

impl From<Contexts> for OneOrMany<Context> {
    fn from(contexts: Contexts) -> OneOrMany<Context> {
        match contexts {
            Contexts::One(context) => OneOrMany::One(context),
            Contexts::Many(contexts) => OneOrMany::Many(contexts),
        }
    }
}

impl Contexts {
    pub fn contains_uri(&self, uri: &str) -> bool {
        let matches = |context: &Context| matches!(context, Context::URI(u) if u == uri);
        match self {
            Self::One(context) => matches(context),
            Self::Many(contexts) => contexts.iter().any(matches),
        }
    }
}

impl FromStr for VCDateTime {
    type Err = chrono::format::ParseError;
    fn from_str(date_time: &str) -> Result<Self, Self::Err> {
        let use_z = date_time.ends_with('Z');
        let date_time = DateTime::parse_from_rfc3339(date_time)?;
        Ok(VCDateTime { date_time, use_z })
    }
}

impl TryFrom<String> for VCDateTime {
    type Error = chrono::format::ParseError;
    fn try_from(date_time: String) -> Result<Self, Self::Error> {
        Self::from_str(&date_time)
    }
}

impl From<VCDateTime> for String {
    fn from(z_date_time: VCDateTime) -> String {
        let VCDateTime { date_time, use_z } = z_date_time;
        date_time.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, use_z)
    }
}

impl<Tz: chrono::TimeZone> From<DateTime<Tz>> for VCDateTime
where
    chrono::DateTime<chrono::FixedOffset>: From<chrono::DateTime<Tz>>,
{
    fn from(date_time: DateTime<Tz>) -> Self {
        Self {
            date_time: date_time.into(),
            use_z: true,
        }
    }
}

impl From<VCDateTime> for DateTime<Utc> {
    fn from(vc_date_time: VCDateTime) -> Self {
        vc_date_time.date_time.with_timezone(&Utc)
    }
}

impl Issuer {
    pub fn get_id(&self) -> &str {
        match self {
            Self::URI(uri) => uri,
            Self::Object(object_with_id) => &object_with_id.id,
        }
    }
}

impl CredentialSubject {
    /// A subject with neither an id nor any claim.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && match self.property_set.as_ref() {
                None => true,
                Some(m) => m.is_empty(),
            }
    }
}

impl Credential {
    /// Parse a credential and check its required members.
    pub fn from_json(s: &str) -> Result<Self, Error> {
        let vc: Self = serde_json::from_str(s)?;
        vc.validate_unsigned()?;
        Ok(vc)
    }

    pub fn from_value(value: Value) -> Result<Self, Error> {
        let vc: Self = serde_json::from_value(value)?;
        vc.validate_unsigned()?;
        Ok(vc)
    }

    pub fn validate_unsigned(&self) -> Result<(), Error> {
        if !self.type_.contains(&CREDENTIAL_TYPE.to_string()) {
            return Err(Error::InvalidInput(
                "Missing type VerifiableCredential".to_string(),
            ));
        }
        if self.issuer.is_none() {
            return Err(Error::Missing("issuer"));
        }
        if self.credential_subject.is_empty() {
            // A credential makes claims about one or more subjects.
            return Err(Error::Missing("credentialSubject"));
        }
        for subject in &self.credential_subject {
            if subject.is_empty() {
                return Err(Error::InvalidInput("Empty credentialSubject".to_string()));
            }
        }
        if self.issuance_date.is_none() {
            return Err(Error::Missing("issuanceDate"));
        }
        Ok(())
    }
}

impl Presentation {
    /// A presentation carrying `credentials` in order.
    pub fn from_credentials(credentials: Vec<Credential>) -> Self {
        let credentials: Vec<CredentialOrJWT> = credentials
            .into_iter()
            .map(CredentialOrJWT::Credential)
            .collect();
        Self {
            context: Contexts::default(),
            id: None,
            type_: OneOrMany::One(PRESENTATION_TYPE.to_string()),
            verifiable_credential: Some(OneOrMany::Many(credentials)),
            proof: None,
            holder: None,
            property_set: None,
        }
    }

    pub fn from_json(s: &str) -> Result<Self, Error> {
        let vp: Self = serde_json::from_str(s)?;
        vp.validate_unsigned()?;
        Ok(vp)
    }

    pub fn validate_unsigned(&self) -> Result<(), Error> {
        if !self.type_.contains(&PRESENTATION_TYPE.to_string()) {
            return Err(Error::InvalidInput(
                "Missing type VerifiablePresentation".to_string(),
            ));
        }
        for vc in self.verifiable_credential.iter().flatten() {
            if let CredentialOrJWT::Credential(vc) = vc {
                vc.validate_unsigned()?;
            }
        }
        Ok(())
    }

    /// Embedded credentials, skipping the ones carried as JWTs.
    pub fn credentials(&self) -> impl Iterator<Item = &Credential> {
        self.verifiable_credential
            .iter()
            .flatten()
            .filter_map(|vc| match vc {
                CredentialOrJWT::Credential(vc) => Some(vc),
                CredentialOrJWT::JWT(_) => None,
            })
    }
}

fn push_proof(proofs: &mut Option<OneOrMany<Proof>>, proof: Proof) {
    match proofs {
        Some(proofs) => proofs.push(proof),
        None => *proofs = Some(OneOrMany::One(proof)),
    }
}

impl LinkedDataDocument for Credential {
    fn to_unsigned_value(&self) -> Result<Value, Error> {
        let mut copy = self.clone();
        copy.proof = None;
        Ok(serde_json::to_value(copy)?)
    }

    fn proofs(&self) -> Vec<&Proof> {
        self.proof.iter().flatten().collect()
    }

    fn push_proof(&mut self, proof: Proof) {
        push_proof(&mut self.proof, proof)
    }

    fn signer_id(&self) -> Option<&str> {
        self.issuer.as_ref().map(Issuer::get_id)
    }
}

impl LinkedDataDocument for Presentation {
    fn to_unsigned_value(&self) -> Result<Value, Error> {
        let mut copy = self.clone();
        copy.proof = None;
        Ok(serde_json::to_value(copy)?)
    }

    fn proofs(&self) -> Vec<&Proof> {
        self.proof.iter().flatten().collect()
    }

    fn push_proof(&mut self, proof: Proof) {
        push_proof(&mut self.proof, proof)
    }

    fn signer_id(&self) -> Option<&str> {
        self.holder.as_deref()
    }

    fn default_proof_purpose(&self) -> ProofPurpose {
        ProofPurpose::Authentication
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn degree() -> Value {
        json!({
            "@context": [
                "https://www.w3.org/2018/credentials/v1",
                "https://www.w3.org/2018/credentials/examples/v1"
            ],
            "id": "http://example.edu/credentials/1872",
            "type": ["VerifiableCredential", "UniversityDegreeCredential"],
            "credentialSubject": {
                "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
                "degree": {"type": "BachelorDegree", "university": "MIT"},
                "name": "Jayden Doe",
                "spouse": "did:example:c276e12ec21ebfeb1f712ebc6f1"
            },
            "issuer": {
                "id": "did:example:76e12ec712ebc6f1c221ebfeb1f",
                "name": "Example University"
            },
            "issuanceDate": "2010-01-01T19:23:24Z",
            "expirationDate": "2020-01-01T19:23:24+00:00",
            "referenceNumber": 83294849,
            "credentialSchema": []
        })
    }

    #[test]
    fn credential_round_trip() {
        let vc = Credential::from_value(degree()).unwrap();
        assert_eq!(
            vc.issuer.as_ref().map(Issuer::get_id),
            Some("did:example:76e12ec712ebc6f1c221ebfeb1f")
        );
        assert!(vc
            .context
            .contains_uri("https://www.w3.org/2018/credentials/examples/v1"));
        assert!(!vc.context.contains_uri("https://w3id.org/security/bbs/v1"));
        assert_eq!(
            vc.property_set.as_ref().unwrap()["referenceNumber"],
            json!(83294849)
        );
        assert_eq!(serde_json::to_value(&vc).unwrap(), degree());
    }

    #[test]
    fn required_members() {
        let mut value = degree();
        value.as_object_mut().unwrap().remove("issuer");
        assert!(Credential::from_value(value).is_err());

        let mut value = degree();
        value["@context"] = json!("https://www.w3.org/2018/credentials/examples/v1");
        assert!(Credential::from_value(value).is_err());

        let mut value = degree();
        value["type"] = json!("UniversityDegreeCredential");
        assert!(Credential::from_value(value).is_err());
    }

    #[test]
    fn date_time_keeps_offset_style() {
        let z: VCDateTime = "2010-01-01T19:23:24Z".parse().unwrap();
        assert_eq!(String::from(z), "2010-01-01T19:23:24Z");
        let offset: VCDateTime = "2010-01-01T19:23:24+00:00".parse().unwrap();
        assert_eq!(String::from(offset), "2010-01-01T19:23:24+00:00");
        let utc: DateTime<Utc> = offset.into();
        assert_eq!(VCDateTime::from(utc), z);
        assert!("yesterday".parse::<VCDateTime>().is_err());
    }

    #[test]
    fn proofs_are_promoted_to_a_list() {
        let mut vc = Credential::from_value(degree()).unwrap();
        let first = Proof {
            jws: Some("a..b".to_string()),
            ..Proof::default()
        };
        let second = Proof {
            proof_value: Some("c".to_string()),
            ..Proof::default()
        };
        vc.push_proof(first.clone());
        assert!(matches!(vc.proof, Some(OneOrMany::One(_))));
        vc.push_proof(second.clone());
        assert_eq!(vc.proof, Some(OneOrMany::Many(vec![first, second])));
        assert_eq!(vc.proofs().len(), 2);
        assert!(vc.to_unsigned_value().unwrap().get("proof").is_none());
    }

    #[test]
    fn presentation_from_credentials() {
        let vc = Credential::from_value(degree()).unwrap();
        let mut vp = Presentation::from_credentials(vec![vc.clone()]);
        vp.holder = Some("did:example:holder".to_string());
        vp.validate_unsigned().unwrap();
        assert_eq!(vp.default_proof_purpose(), ProofPurpose::Authentication);
        assert_eq!(vp.signer_id(), Some("did:example:holder"));
        assert_eq!(vp.credentials().collect::<Vec<_>>(), vec![&vc]);
        let value = serde_json::to_value(&vp).unwrap();
        assert_eq!(value["type"], json!("VerifiablePresentation"));
        assert_eq!(value["verifiableCredential"][0]["id"], degree()["id"]);
    }
}
