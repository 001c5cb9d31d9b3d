//! BBS+ selective disclosure.
//!
//! A credential signed with `BbsBlsSignature2020` is reduced to the members
//! picked by a reveal document, and its signature is replaced by a
//! `BbsBlsSignatureProof2020` proof of knowledge over the statements that
//! remain.
//!
//! Blank nodes of the derived document are pinned to the canonical labels
//! they had in the signed document (`"id": "urn:bnid:_:c14n0"`), so that the
//! disclosed statements can be matched one to one with signed statements.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::canonicalize;
use crate::error::Error;
use crate::jsonld::DocumentLoader;
use crate::jwk::BLS12381G2_CURVE;
use crate::ldp::{LinkedDataDocument, PublicKeyFetcher};
use crate::logging::Logger;
use crate::proof::Proof;
use crate::suites::{statements, CanonicalData, ProofSuiteType};
use crate::vc::Credential;

const PINNED_PREFIX: &str = "urn:bnid:";

/// Members kept at every level of a revealed document.
const ALWAYS_REVEALED: [&str; 5] = ["@context", "id", "type", "@id", "@type"];

/// Members kept at the top level, needed to check the derived proof.
const ALWAYS_REVEALED_TOP_LEVEL: [&str; 2] = ["issuer", "issuanceDate"];

pub struct SelectiveDisclosure<'a> {
    loader: &'a dyn DocumentLoader,
    logger: Logger,
}

impl<'a> SelectiveDisclosure<'a> {
    pub fn new(loader: &'a dyn DocumentLoader, logger: Logger) -> Self {
        Self { loader, logger }
    }

    /// Derive a credential disclosing only what `reveal` asks for.
    ///
    /// `nonce` must be fresh for every derivation; two proofs derived with
    /// the same nonce from the same signature can be linked. The issuer key
    /// is obtained from `fetcher` with the signature's verification method.
    /// `credential` itself is left unchanged.
    pub fn derive(
        &self,
        credential: &Credential,
        reveal: &Value,
        nonce: &[u8],
        fetcher: &dyn PublicKeyFetcher,
    ) -> Result<Credential, Error> {
        if nonce.is_empty() {
            return Err(Error::SelectiveDisclosure(
                "Nonce must not be empty".to_string(),
            ));
        }
        let signed_type = ProofSuiteType::BbsBlsSignature2020.to_string();
        let proof = credential
            .proofs()
            .into_iter()
            .find(|proof| proof.type_ == signed_type)
            .ok_or_else(|| {
                Error::SelectiveDisclosure(
                    "No BbsBlsSignature2020 proof to derive from".to_string(),
                )
            })?;
        let proof_value = proof
            .proof_value
            .as_deref()
            .ok_or(Error::Missing("proofValue"))?;
        let signature = base64::decode(proof_value)?;
        let verification_method = proof
            .verification_method
            .as_deref()
            .ok_or(Error::Missing("verificationMethod"))?;
        let issuer = credential.signer_id().unwrap_or_default();
        let key = fetcher.fetch(issuer, verification_method)?;
        let public_key = key.okp_public_key(BLS12381G2_CURVE)?;

        let unsigned = credential.to_unsigned_value()?;
        let context = unsigned.get("@context").cloned().unwrap_or(Value::Null);
        let options = proof.to_signing_options(&context)?;
        let proof_lines = canonicalize::rdf_dataset(&options, self.loader, self.logger)?;
        let (document_lines, paths) =
            canonicalize::rdf_dataset_with_paths(&unsigned, self.loader, self.logger)?;
        let proof_count = proof_lines.len();
        let messages = statements(&CanonicalData::RdfDataset {
            proof: proof_lines,
            document: document_lines,
        })?;
        crate::bbs::verify(&messages, &signature, public_key).map_err(|err| {
            Error::SelectiveDisclosure(format!("Signature does not verify: {}", err))
        })?;

        let mut revealed = reveal_members(&unsigned, reveal, true)?;
        for (path, label) in &paths {
            pin_blank_node(&mut revealed, path, label);
        }
        let revealed_lines = unpin_blank_nodes(canonicalize::rdf_dataset(
            &revealed,
            self.loader,
            self.logger,
        )?);

        let mut indices: BTreeSet<usize> = (0..proof_count).collect();
        let document_messages = &messages[proof_count..];
        for line in &revealed_lines {
            let statement = line.trim_end_matches('\n');
            let position = document_messages
                .iter()
                .position(|message| message == statement)
                .ok_or_else(|| {
                    Error::SelectiveDisclosure(format!(
                        "Disclosed statement is not signed: {}",
                        statement
                    ))
                })?;
            indices.insert(proof_count + position);
        }
        let derived =
            crate::bbs::derive_proof(&messages, &signature, public_key, &indices, nonce)?;
        self.logger.debug(format_args!(
            "Derived {} revealing {} of {} statements",
            ProofSuiteType::BbsBlsSignatureProof2020,
            indices.len(),
            messages.len()
        ));

        let mut derived_credential: Credential = serde_json::from_value(revealed)?;
        derived_credential.push_proof(Proof {
            type_: ProofSuiteType::BbsBlsSignatureProof2020.to_string(),
            proof_value: Some(base64::encode(derived)),
            nonce: Some(base64::encode(nonce)),
            ..proof.clone()
        });
        Ok(derived_credential)
    }
}

/// Keep the members of `document` selected by `frame`.
///
/// Under a node whose frame has `"@explicit": true` only the members named
/// in the frame survive; elsewhere every member is kept. Members named in
/// the frame but absent from the document are ignored.
fn reveal_members(document: &Value, frame_value: &Value, top_level: bool) -> Result<Value, Error> {
    let frame = match frame_value {
        Value::Object(frame) => frame,
        _ => {
            return Err(Error::SelectiveDisclosure(
                "Reveal document must be a JSON object".to_string(),
            ))
        }
    };
    let explicit = match frame.get("@explicit") {
        None => false,
        Some(Value::Bool(explicit)) => *explicit,
        Some(_) => {
            return Err(Error::SelectiveDisclosure(
                "@explicit must be a boolean".to_string(),
            ))
        }
    };
    let object = match document {
        Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| reveal_members(item, frame_value, top_level))
                .collect::<Result<Vec<Value>, Error>>()?;
            return Ok(Value::Array(items));
        }
        Value::Object(object) => object,
        other => return Ok(other.clone()),
    };
    let mut revealed = Map::new();
    for (key, value) in object {
        if ALWAYS_REVEALED.contains(&key.as_str())
            || (top_level && ALWAYS_REVEALED_TOP_LEVEL.contains(&key.as_str()))
        {
            revealed.insert(key.clone(), value.clone());
            continue;
        }
        match frame.get(key) {
            Some(sub_frame @ Value::Object(_)) => {
                revealed.insert(key.clone(), reveal_members(value, sub_frame, false)?);
            }
            Some(_) => {
                revealed.insert(key.clone(), value.clone());
            }
            None if !explicit => {
                revealed.insert(key.clone(), value.clone());
            }
            None => {}
        }
    }
    Ok(Value::Object(revealed))
}

/// Give the node at `path` the id `urn:bnid:<label>`, if it is still present
/// and has no id of its own.
fn pin_blank_node(document: &mut Value, path: &str, label: &str) {
    let mut node = document;
    for segment in path.split('/').skip(1) {
        let next = match node {
            Value::Object(object) => object.get_mut(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(move |i| items.get_mut(i)),
            _ => None,
        };
        node = match next {
            Some(next) => next,
            None => return,
        };
    }
    if let Value::Object(object) = node {
        if !object.contains_key("id") && !object.contains_key("@id") {
            object.insert(
                "id".to_string(),
                Value::String(format!("{}{}", PINNED_PREFIX, label)),
            );
        }
    }
}

/// Turn pinned `<urn:bnid:_:c14nN>` IRIs back into blank nodes and restore
/// the canonical line order.
pub(crate) fn unpin_blank_nodes(lines: Vec<String>) -> Vec<String> {
    let opening = format!("<{}", PINNED_PREFIX);
    let mut lines: Vec<String> = lines
        .into_iter()
        .map(|line| {
            let mut unpinned = String::with_capacity(line.len());
            let mut rest = line.as_str();
            while let Some(start) = rest.find(&opening) {
                let label_start = start + opening.len();
                let end = match rest[label_start..].find('>') {
                    Some(end) => label_start + end,
                    None => break,
                };
                unpinned.push_str(&rest[..start]);
                unpinned.push_str(&rest[label_start..end]);
                rest = &rest[end + 1..];
            }
            unpinned.push_str(rest);
            unpinned
        })
        .collect();
    lines.sort();
    lines
}
