//! Presentations signed on behalf of a credential holder.

use crate::did::{default_verification_method, resolve_verification_method, IdentityDocument};
use crate::error::Error;
use crate::jsonld::DocumentLoader;
use crate::jwt::{self, ProofCheck};
use crate::ldp::LinkedDataProofs;
use crate::logging::Logger;
use crate::proof::{ProofOptions, ProofPurpose};
use crate::signer::KeyManager;
use crate::vc::{Credential, Presentation};

/// What a presentation is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationInput {
    Credentials(Vec<Credential>),
    /// An existing, unsigned presentation.
    Presentation(Presentation),
}

pub struct Holder<'a> {
    keys: &'a dyn KeyManager,
    proofs: LinkedDataProofs<'a>,
    logger: Logger,
}

impl<'a> Holder<'a> {
    pub fn new(keys: &'a dyn KeyManager, loader: &'a dyn DocumentLoader, logger: Logger) -> Self {
        Self {
            keys,
            proofs: LinkedDataProofs::new(loader, logger),
            logger,
        }
    }

    /// Proof options for a presentation signed with a key of `identity`.
    ///
    /// The purpose is always `authentication`; the verification method is
    /// resolved against the authentication list of `identity`.
    pub fn prepare_options(
        &self,
        options: &ProofOptions,
        identity: &dyn IdentityDocument,
    ) -> Result<ProofOptions, Error> {
        let purpose = ProofPurpose::Authentication;
        let verification_method = resolve_verification_method(
            identity,
            purpose,
            options.verification_method.as_deref(),
            self.logger,
        )?;
        Ok(ProofOptions {
            verification_method: Some(verification_method),
            proof_purpose: Some(purpose),
            ..options.clone()
        })
    }

    /// Build a presentation held by `holder` and sign it.
    pub fn generate_presentation(
        &self,
        input: PresentationInput,
        holder: &str,
        options: &ProofOptions,
        identity: &dyn IdentityDocument,
    ) -> Result<Presentation, Error> {
        let mut presentation = match input {
            PresentationInput::Credentials(credentials) => {
                Presentation::from_credentials(credentials)
            }
            PresentationInput::Presentation(presentation) => presentation,
        };
        if !holder.is_empty() {
            presentation.holder = Some(holder.to_string());
        }
        presentation.validate_unsigned()?;
        let mut options = self.prepare_options(options, identity)?;
        let verification_method = options
            .verification_method
            .clone()
            .ok_or(Error::Missing("verificationMethod"))?;
        let signer = self.keys.signer(&verification_method)?;
        self.proofs
            .add_proof(&mut presentation, &mut options, &signer)?;
        self.logger.info(format_args!(
            "Presentation signed with {}",
            verification_method
        ));
        Ok(presentation)
    }

    /// Present one credential, signed with the default key of `identity`.
    pub fn generate_presentation_by_id(
        &self,
        credential: Credential,
        identity: &dyn IdentityDocument,
        suite: Option<&str>,
    ) -> Result<Presentation, Error> {
        let verification_method = default_verification_method(identity)?;
        let signer = self.keys.signer(&verification_method)?;
        let mut options = ProofOptions {
            type_: suite.map(str::to_string),
            verification_method: Some(verification_method),
            proof_purpose: Some(ProofPurpose::Authentication),
            ..Default::default()
        };
        let mut presentation = Presentation::from_credentials(vec![credential]);
        presentation.holder = Some(identity.id().to_string());
        self.proofs
            .add_proof(&mut presentation, &mut options, &signer)?;
        Ok(presentation)
    }

    /// Parse a credential given as JSON or JWT and check its proofs.
    pub fn validate_credential(
        &self,
        bytes: &[u8],
        check: ProofCheck,
    ) -> Result<Credential, Error> {
        let input = std::str::from_utf8(bytes)
            .map_err(|err| Error::InvalidInput(format!("Credential is not UTF-8: {}", err)))?;
        jwt::parse(input, check, &self.proofs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::did::Document;
    use crate::error::ErrorKind;
    use crate::jsonld::StaticLoader;
    use crate::jwk::JWK;
    use crate::signer::LocalKeyManager;
    use serde_json::json;

    fn identity() -> Document {
        Document::from_json(
            &json!({
                "@context": "https://www.w3.org/ns/did/v1",
                "id": "did:example:holder",
                "authentication": ["did:example:holder#key-1", "did:example:holder#key-2"]
            })
            .to_string(),
        )
        .unwrap()
    }

    fn credential() -> Credential {
        Credential::from_value(json!({
            "@context": "https://www.w3.org/2018/credentials/v1",
            "type": "VerifiableCredential",
            "issuer": "did:example:issuer",
            "issuanceDate": "2010-01-01T19:23:24Z",
            "credentialSubject": {"id": "did:example:holder"}
        }))
        .unwrap()
    }

    #[test]
    fn options_use_authentication() {
        let keys = LocalKeyManager::new();
        let holder = Holder::new(&keys, &StaticLoader, Logger::default());
        let options = ProofOptions {
            proof_purpose: Some(ProofPurpose::AssertionMethod),
            ..Default::default()
        };
        let prepared = holder.prepare_options(&options, &identity()).unwrap();
        assert_eq!(prepared.proof_purpose, Some(ProofPurpose::Authentication));
        assert_eq!(
            prepared.verification_method.as_deref(),
            Some("did:example:holder#key-1")
        );
        let options = ProofOptions {
            verification_method: Some("did:example:holder#key-3".to_string()),
            ..Default::default()
        };
        assert_eq!(
            holder.prepare_options(&options, &identity()).unwrap_err().kind(),
            ErrorKind::NoMatchingVerificationMethod
        );
    }

    #[test]
    fn presentation_signed_by_holder() {
        let key = JWK::ed25519_from_secret(&[3u8; 32]).unwrap();
        let mut keys = LocalKeyManager::new();
        keys.insert("key-2", key.clone());
        let holder = Holder::new(&keys, &StaticLoader, Logger::default());
        let options = ProofOptions {
            verification_method: Some("did:example:holder#key-2".to_string()),
            challenge: Some("c0ae1c8e".to_string()),
            ..Default::default()
        };
        let vp = holder
            .generate_presentation(
                PresentationInput::Credentials(vec![credential()]),
                "did:example:holder",
                &options,
                &identity(),
            )
            .unwrap();
        assert_eq!(vp.holder.as_deref(), Some("did:example:holder"));
        let proofs = vp.proof.as_ref().unwrap();
        let proof = proofs.first().unwrap();
        assert_eq!(proof.proof_purpose, Some(ProofPurpose::Authentication));
        assert_eq!(proof.challenge.as_deref(), Some("c0ae1c8e"));

        let public = key.to_public();
        let fetcher = move |_: &str, _: &str| -> Result<JWK, Error> { Ok(public.clone()) };
        LinkedDataProofs::new(&StaticLoader, Logger::default())
            .verify_proofs(&vp, &fetcher)
            .unwrap();
    }

    #[test]
    fn presentation_by_default_key() {
        let identity = Document::from_json(
            &json!({
                "@context": "https://www.w3.org/ns/did/v1",
                "id": "did:example:holder",
                "publicKey": [{
                    "id": "#primary",
                    "type": "Ed25519VerificationKey2018",
                    "publicKeyBase58": "11111111111111111111111111111111"
                }]
            })
            .to_string(),
        )
        .unwrap();
        let mut keys = LocalKeyManager::new();
        keys.insert("primary", JWK::generate_ed25519().unwrap());
        let holder = Holder::new(&keys, &StaticLoader, Logger::default());
        let vp = holder
            .generate_presentation_by_id(credential(), &identity, None)
            .unwrap();
        let proof = vp.proof.as_ref().and_then(|p| p.first()).unwrap();
        assert_eq!(
            proof.verification_method.as_deref(),
            Some("did:example:holder#primary")
        );
        assert_eq!(proof.type_, "Ed25519Signature2018");
        assert_eq!(vp.holder.as_deref(), Some("did:example:holder"));
    }

    #[test]
    fn validate_rejects_non_utf8() {
        let keys = LocalKeyManager::new();
        let holder = Holder::new(&keys, &StaticLoader, Logger::default());
        let err = holder
            .validate_credential(&[0xff, 0xfe], ProofCheck::Disabled)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let json = serde_json::to_vec(&credential()).unwrap();
        assert_eq!(
            holder.validate_credential(&json, ProofCheck::Disabled).unwrap(),
            credential()
        );
    }
}
