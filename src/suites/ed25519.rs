use super::{jws_payload, CanonicalData, ProofSignature, ProofSuite, ProofSuiteType};
use crate::error::Error;
use crate::jwk::{Algorithm, JWK};
use crate::signer::Signer;

/// <https://w3c-ccg.github.io/lds-ed25519-2018/>
pub struct Ed25519Signature2018;

impl ProofSuite for Ed25519Signature2018 {
    fn suite_type(&self) -> ProofSuiteType {
        ProofSuiteType::Ed25519Signature2018
    }

    fn sign(&self, data: &CanonicalData, signer: &dyn Signer) -> Result<String, Error> {
        if signer.algorithm() != Algorithm::EdDSA {
            return Err(Error::UnsupportedAlgorithm(signer.algorithm().to_string()));
        }
        let payload = jws_payload(data)?;
        crate::jws::detached_sign_unencoded_payload_with(signer, &payload)
    }

    fn verify(
        &self,
        data: &CanonicalData,
        signature: ProofSignature,
        key: &JWK,
    ) -> Result<(), Error> {
        let payload = jws_payload(data)?;
        let (header, signing_input, signature) =
            crate::jws::prepare_detached_verification(signature.value, &payload)?;
        if header.algorithm != Algorithm::EdDSA {
            return Err(Error::UnsupportedAlgorithm(header.algorithm.to_string()));
        }
        crate::jws::verify_bytes(header.algorithm, &signing_input, key, &signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::signer::LocalSigner;

    fn data() -> CanonicalData {
        CanonicalData::RdfDataset {
            proof: vec!["_:c14n0 <http://purl.org/dc/terms/created> \"2010-01-01T19:23:24Z\" .\n".to_string()],
            document: vec!["<did:example:1> <http://schema.org/name> \"Jayden Doe\" .\n".to_string()],
        }
    }

    #[test]
    fn deterministic_signature() {
        let key = JWK::ed25519_from_secret(&[9u8; 32]).unwrap();
        let signer = LocalSigner::new(key.clone(), "did:example:1#key").unwrap();
        let first = Ed25519Signature2018.sign(&data(), &signer).unwrap();
        assert_eq!(first, Ed25519Signature2018.sign(&data(), &signer).unwrap());
        let signature = ProofSignature {
            value: &first,
            nonce: None,
        };
        Ed25519Signature2018
            .verify(&data(), signature, &key.to_public())
            .unwrap();

        let other = JWK::ed25519_from_secret(&[10u8; 32]).unwrap();
        let err = Ed25519Signature2018
            .verify(&data(), signature, &other.to_public())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Verification);
    }

    #[test]
    fn rejects_other_algorithms() {
        let signer = LocalSigner::new(JWK::generate_p256().unwrap(), "did:example:1#key").unwrap();
        assert!(Ed25519Signature2018.sign(&data(), &signer).is_err());
    }
}
