//! Signature suites.
//!
//! Every suite is a variant of [`ProofSuiteType`]; the variant resolves to a
//! stateless [`ProofSuite`] handle that signs and verifies canonical data.

mod bbs;
mod ed25519;
mod jws2020;

use std::convert::TryFrom;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use self::bbs::{BbsBlsSignature2020, BbsBlsSignatureProof2020};
pub(crate) use self::bbs::statements;
pub use self::ed25519::Ed25519Signature2018;
pub use self::jws2020::JsonWebSignature2020;

use crate::canonicalize::CanonicalizationMode;
use crate::error::Error;
use crate::hash::sha256;
use crate::jsonld::loader::{BBS_V1_CONTEXT, LDS_JWS2020_V1_CONTEXT};
use crate::jwk::{Algorithm, JWK};
use crate::signer::Signer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub enum ProofSuiteType {
    Ed25519Signature2018,
    JsonWebSignature2020,
    BbsBlsSignature2020,
    BbsBlsSignatureProof2020,
    JwtProof2020,
}

/// Where a proof stores its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureType {
    /// Compact (detached) JWS under `jws`.
    JWS,
    /// Suite-native encoding under `proofValue`.
    ProofValue,
}

/// Input to a suite's `sign` and `verify`.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalData {
    PlainJson(Vec<u8>),
    /// Canonical N-Quads lines of the proof options and of the document.
    RdfDataset {
        proof: Vec<String>,
        document: Vec<String>,
    },
}

/// Signature members read back from a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofSignature<'a> {
    pub value: &'a str,
    pub nonce: Option<&'a str>,
}

pub trait ProofSuite: Sync {
    fn suite_type(&self) -> ProofSuiteType;

    /// Sign `data`, returning the encoded value stored in the proof.
    fn sign(&self, data: &CanonicalData, signer: &dyn Signer) -> Result<String, Error>;

    fn verify(
        &self,
        data: &CanonicalData,
        signature: ProofSignature,
        key: &JWK,
    ) -> Result<(), Error>;
}

/// Look a suite up by name.
pub fn suite(name: &str) -> Result<&'static dyn ProofSuite, Error> {
    Ok(name.parse::<ProofSuiteType>()?.suite())
}

impl ProofSuiteType {
    pub const ALL: [ProofSuiteType; 5] = [
        Self::Ed25519Signature2018,
        Self::JsonWebSignature2020,
        Self::BbsBlsSignature2020,
        Self::BbsBlsSignatureProof2020,
        Self::JwtProof2020,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519Signature2018 => "Ed25519Signature2018",
            Self::JsonWebSignature2020 => "JsonWebSignature2020",
            Self::BbsBlsSignature2020 => "BbsBlsSignature2020",
            Self::BbsBlsSignatureProof2020 => "BbsBlsSignatureProof2020",
            Self::JwtProof2020 => "JwtProof2020",
        }
    }

    pub fn suite(&self) -> &'static dyn ProofSuite {
        match self {
            Self::Ed25519Signature2018 => &Ed25519Signature2018,
            Self::JsonWebSignature2020 => &JsonWebSignature2020,
            Self::BbsBlsSignature2020 => &BbsBlsSignature2020,
            Self::BbsBlsSignatureProof2020 => &BbsBlsSignatureProof2020,
            Self::JwtProof2020 => &JwtProof2020,
        }
    }

    pub fn canonicalization_mode(&self) -> CanonicalizationMode {
        match self {
            Self::JwtProof2020 => CanonicalizationMode::PlainJson,
            _ => CanonicalizationMode::RdfDataset,
        }
    }

    pub fn signature_type(&self) -> SignatureType {
        match self {
            Self::Ed25519Signature2018 | Self::JsonWebSignature2020 | Self::JwtProof2020 => {
                SignatureType::JWS
            }
            Self::BbsBlsSignature2020 | Self::BbsBlsSignatureProof2020 => {
                SignatureType::ProofValue
            }
        }
    }

    /// Default suite for keys of `algorithm`.
    pub fn pick(algorithm: Algorithm) -> Result<Self, Error> {
        Ok(match algorithm {
            Algorithm::EdDSA => Self::Ed25519Signature2018,
            Algorithm::ES256 | Algorithm::ES256K => Self::JsonWebSignature2020,
            Algorithm::BLS12381G2 => Self::BbsBlsSignature2020,
            Algorithm::None => return Err(Error::UnsupportedAlgorithm(algorithm.to_string())),
        })
    }

    /// Context defining the suite's terms, added to proofs of documents
    /// that do not declare it.
    pub(crate) fn proof_context(&self) -> Option<&'static str> {
        match self {
            Self::JsonWebSignature2020 => Some(LDS_JWS2020_V1_CONTEXT),
            Self::BbsBlsSignature2020 | Self::BbsBlsSignatureProof2020 => Some(BBS_V1_CONTEXT),
            Self::Ed25519Signature2018 | Self::JwtProof2020 => None,
        }
    }

    /// Suite whose proof options were signed. Derived proofs are checked
    /// against the options of the signature they were derived from.
    pub(crate) fn signed_type(&self) -> Self {
        match self {
            Self::BbsBlsSignatureProof2020 => Self::BbsBlsSignature2020,
            other => *other,
        }
    }

    /// Whether only a subset of the signed statements is present, with
    /// blank nodes pinned to their canonical labels.
    pub(crate) fn is_derived(&self) -> bool {
        matches!(self, Self::BbsBlsSignatureProof2020)
    }
}

impl FromStr for ProofSuiteType {
    type Err = Error;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|type_| type_.as_str() == name)
            .copied()
            .ok_or_else(|| Error::UnsupportedSuite(name.to_string()))
    }
}

impl TryFrom<String> for ProofSuiteType {
    type Error = Error;
    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::from_str(&name)
    }
}

impl From<ProofSuiteType> for String {
    fn from(type_: ProofSuiteType) -> String {
        type_.as_str().to_string()
    }
}

impl std::fmt::Display for ProofSuiteType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detached JWS payload: hash of the proof options followed by the hash of
/// the document.
fn jws_payload(data: &CanonicalData) -> Result<Vec<u8>, Error> {
    match data {
        CanonicalData::RdfDataset { proof, document } => {
            let proof_digest = sha256(proof.concat().as_bytes());
            let document_digest = sha256(document.concat().as_bytes());
            Ok([proof_digest, document_digest].concat())
        }
        CanonicalData::PlainJson(_) => Err(Error::InvalidInput(
            "Linked data suite needs an RDF dataset".to_string(),
        )),
    }
}

/// Signature over a plain JSON signing input, as carried by compact JWTs.
pub struct JwtProof2020;

impl ProofSuite for JwtProof2020 {
    fn suite_type(&self) -> ProofSuiteType {
        ProofSuiteType::JwtProof2020
    }

    fn sign(&self, data: &CanonicalData, signer: &dyn Signer) -> Result<String, Error> {
        let signing_input = match data {
            CanonicalData::PlainJson(bytes) => bytes,
            CanonicalData::RdfDataset { .. } => {
                return Err(Error::InvalidInput(
                    "JwtProof2020 signs plain JSON".to_string(),
                ))
            }
        };
        let signature = signer.sign(signing_input)?;
        Ok(base64::encode_config(signature, base64::URL_SAFE_NO_PAD))
    }

    fn verify(
        &self,
        data: &CanonicalData,
        signature: ProofSignature,
        key: &JWK,
    ) -> Result<(), Error> {
        let signing_input = match data {
            CanonicalData::PlainJson(bytes) => bytes,
            CanonicalData::RdfDataset { .. } => {
                return Err(Error::InvalidInput(
                    "JwtProof2020 signs plain JSON".to_string(),
                ))
            }
        };
        let algorithm = key.get_algorithm().ok_or(Error::UnsupportedKeyType)?;
        let signature = base64::decode_config(signature.value, base64::URL_SAFE_NO_PAD)?;
        crate::jws::verify_bytes(algorithm, signing_input, key, &signature)
    }
}
