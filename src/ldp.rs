//! Linked data proofs: attaching and checking `proof` entries.

use serde_json::Value;

use crate::canonicalize::{self, CanonicalizationMode};
use crate::did::{resolve_verification_method, IdentityDocument};
use crate::error::Error;
use crate::jsonld::DocumentLoader;
use crate::jwk::JWK;
use crate::logging::Logger;
use crate::proof::{now_ms, Proof, ProofOptions, ProofPurpose};
use crate::signer::{KeyManager, Signer};
use crate::suites::{CanonicalData, ProofSignature, ProofSuiteType, SignatureType};

/// A document that carries embedded proofs.
pub trait LinkedDataDocument {
    /// The document as JSON, without its `proof` member.
    fn to_unsigned_value(&self) -> Result<Value, Error>;

    fn proofs(&self) -> Vec<&Proof>;

    /// Append a proof. A single proof is promoted to a list.
    fn push_proof(&mut self, proof: Proof);

    /// Party whose keys are expected to have signed the document.
    fn signer_id(&self) -> Option<&str>;

    fn default_proof_purpose(&self) -> ProofPurpose {
        ProofPurpose::AssertionMethod
    }
}

/// Source of verification keys, used only while verifying.
pub trait PublicKeyFetcher {
    fn fetch(&self, issuer: &str, verification_method: &str) -> Result<JWK, Error>;
}

impl<F> PublicKeyFetcher for F
where
    F: Fn(&str, &str) -> Result<JWK, Error>,
{
    fn fetch(&self, issuer: &str, verification_method: &str) -> Result<JWK, Error> {
        self(issuer, verification_method)
    }
}

/// Adds and verifies linked data proofs.
///
/// Holds no per-document state; one engine can serve any number of
/// documents.
#[derive(Clone, Copy)]
pub struct LinkedDataProofs<'a> {
    loader: &'a dyn DocumentLoader,
    logger: Logger,
}

impl<'a> LinkedDataProofs<'a> {
    pub fn new(loader: &'a dyn DocumentLoader, logger: Logger) -> Self {
        Self { loader, logger }
    }

    /// Sign `document` with `signer` and append the proof.
    ///
    /// Unset members of `options` are filled in: the suite from the signer's
    /// algorithm, the purpose from the document kind, the verification
    /// method from the signer, `created` from the clock. `options` and
    /// `document` are left untouched when signing fails.
    pub fn add_proof(
        &self,
        document: &mut dyn LinkedDataDocument,
        options: &mut ProofOptions,
        signer: &dyn Signer,
    ) -> Result<(), Error> {
        let mut resolved = options.clone();
        let suite_type = match &resolved.type_ {
            Some(name) => name.parse::<ProofSuiteType>()?,
            None => ProofSuiteType::pick(signer.algorithm())?,
        };
        if suite_type.canonicalization_mode() != CanonicalizationMode::RdfDataset {
            return Err(Error::InvalidInput(format!(
                "{} cannot be embedded as a linked data proof",
                suite_type
            )));
        }
        if suite_type.is_derived() {
            return Err(Error::InvalidInput(format!(
                "{} proofs are only produced by selective disclosure",
                suite_type
            )));
        }
        resolved.type_ = Some(suite_type.to_string());
        resolved
            .proof_purpose
            .get_or_insert_with(|| document.default_proof_purpose());
        resolved
            .verification_method
            .get_or_insert_with(|| signer.verification_method());
        resolved.created.get_or_insert_with(now_ms);

        let unsigned = document.to_unsigned_value()?;
        let mut proof = Proof::new(suite_type).with_options(&resolved);
        if let Some(context) = suite_type.proof_context() {
            if !has_context(&unsigned, context) {
                proof.context = Value::String(context.to_string());
            }
        }
        let data = self.canonical_data(&unsigned, &proof, suite_type)?;
        let value = suite_type.suite().sign(&data, signer)?;
        match suite_type.signature_type() {
            SignatureType::JWS => proof.jws = Some(value),
            SignatureType::ProofValue => proof.proof_value = Some(value),
        }
        self.logger.debug(format_args!(
            "Added {} proof with verification method {}",
            suite_type,
            proof.verification_method.as_deref().unwrap_or_default()
        ));
        document.push_proof(proof);
        *options = resolved;
        Ok(())
    }

    /// Resolve the verification method against `identity`, obtain its
    /// signer from `keys` and add the proof.
    pub fn add_proof_with_keys(
        &self,
        document: &mut dyn LinkedDataDocument,
        options: &mut ProofOptions,
        identity: &dyn IdentityDocument,
        keys: &dyn KeyManager,
    ) -> Result<(), Error> {
        let purpose = options
            .proof_purpose
            .unwrap_or_else(|| document.default_proof_purpose());
        let verification_method = resolve_verification_method(
            identity,
            purpose,
            options.verification_method.as_deref(),
            self.logger,
        )?;
        let signer = keys.signer(&verification_method)?;
        let mut resolved = ProofOptions {
            verification_method: Some(verification_method),
            proof_purpose: Some(purpose),
            ..options.clone()
        };
        self.add_proof(document, &mut resolved, &signer)?;
        *options = resolved;
        Ok(())
    }

    /// Verify every proof of `document`.
    ///
    /// All proofs must verify; the first failure is reported with the
    /// verification method of the failing proof.
    pub fn verify_proofs(
        &self,
        document: &dyn LinkedDataDocument,
        fetcher: &dyn PublicKeyFetcher,
    ) -> Result<(), Error> {
        let proofs = document.proofs();
        if proofs.is_empty() {
            return Err(Error::Missing("proof"));
        }
        let unsigned = document.to_unsigned_value()?;
        for proof in proofs {
            if let Err(err) = self.verify_proof(document, &unsigned, proof, fetcher) {
                let verification_method = proof.verification_method.clone().unwrap_or_default();
                self.logger.warn(format_args!(
                    "{} proof with verification method {} failed: {}",
                    proof.type_, verification_method, err
                ));
                return Err(Error::ProofVerification {
                    verification_method,
                    source: Box::new(err),
                });
            }
        }
        Ok(())
    }

    fn verify_proof(
        &self,
        document: &dyn LinkedDataDocument,
        unsigned: &Value,
        proof: &Proof,
        fetcher: &dyn PublicKeyFetcher,
    ) -> Result<(), Error> {
        let suite_type = proof.suite_type()?;
        let verification_method = proof
            .verification_method
            .as_deref()
            .ok_or(Error::Missing("verificationMethod"))?;
        let value = match suite_type.signature_type() {
            SignatureType::JWS => proof.jws.as_deref().ok_or(Error::Missing("jws"))?,
            SignatureType::ProofValue => proof
                .proof_value
                .as_deref()
                .ok_or(Error::Missing("proofValue"))?,
        };
        let signature = ProofSignature {
            value,
            nonce: proof.nonce.as_deref(),
        };
        let issuer = document.signer_id().unwrap_or_default();
        let key = fetcher.fetch(issuer, verification_method)?;
        let data = self.canonical_data(unsigned, proof, suite_type)?;
        suite_type.suite().verify(&data, signature, &key)
    }

    /// Canonical form of `unsigned` and `proof` under the suite's mode.
    pub(crate) fn canonical_data(
        &self,
        unsigned: &Value,
        proof: &Proof,
        suite_type: ProofSuiteType,
    ) -> Result<CanonicalData, Error> {
        if suite_type.canonicalization_mode() == CanonicalizationMode::PlainJson {
            let json = canonicalize::plain_json(unsigned)?;
            return Ok(CanonicalData::PlainJson(json.into_bytes()));
        }
        let mut signed_proof = proof.clone();
        signed_proof.type_ = suite_type.signed_type().to_string();
        let context = unsigned.get("@context").cloned().unwrap_or(Value::Null);
        let options = signed_proof.to_signing_options(&context)?;
        let proof_lines = canonicalize::rdf_dataset(&options, self.loader, self.logger)?;
        let mut document_lines = canonicalize::rdf_dataset(unsigned, self.loader, self.logger)?;
        if suite_type.is_derived() {
            document_lines = crate::selective_disclosure::unpin_blank_nodes(document_lines);
        }
        Ok(CanonicalData::RdfDataset {
            proof: proof_lines,
            document: document_lines,
        })
    }
}

fn has_context(document: &Value, context: &str) -> bool {
    match document.get("@context") {
        Some(Value::String(uri)) => uri == context,
        Some(Value::Array(contexts)) => contexts.iter().any(|c| c.as_str() == Some(context)),
        _ => false,
    }
}
