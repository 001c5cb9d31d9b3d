use super::{jws_payload, CanonicalData, ProofSignature, ProofSuite, ProofSuiteType};
use crate::error::Error;
use crate::jwk::{Algorithm, Params as JWKParams, ED25519_CURVE, JWK, P256_CURVE, SECP256K1_CURVE};
use crate::signer::Signer;

/// <https://w3c-ccg.github.io/lds-jws2020/>
///
/// The JWS algorithm follows the key.
pub struct JsonWebSignature2020;

impl JsonWebSignature2020 {
    fn validate_algorithm(algorithm: Algorithm) -> Result<(), Error> {
        match algorithm {
            Algorithm::EdDSA | Algorithm::ES256 | Algorithm::ES256K => Ok(()),
            _ => Err(Error::UnsupportedAlgorithm(algorithm.to_string())),
        }
    }

    // https://w3c-ccg.github.io/lds-jws2020/#jose-conformance
    fn validate_key_and_algorithm(key: &JWK, algorithm: Algorithm) -> Result<(), Error> {
        if let Some(key_algorithm) = key.algorithm {
            if key_algorithm != algorithm {
                return Err(Error::UnsupportedAlgorithm(algorithm.to_string()));
            }
        }
        let curve = match &key.params {
            JWKParams::EC(ec) => ec.curve.as_deref().unwrap_or_default(),
            JWKParams::OKP(okp) => okp.curve.as_str(),
        };
        match (curve, algorithm) {
            (ED25519_CURVE, Algorithm::EdDSA)
            | (P256_CURVE, Algorithm::ES256)
            | (SECP256K1_CURVE, Algorithm::ES256K) => Ok(()),
            _ => Err(Error::UnsupportedAlgorithm(algorithm.to_string())),
        }
    }
}

impl ProofSuite for JsonWebSignature2020 {
    fn suite_type(&self) -> ProofSuiteType {
        ProofSuiteType::JsonWebSignature2020
    }

    fn sign(&self, data: &CanonicalData, signer: &dyn Signer) -> Result<String, Error> {
        Self::validate_algorithm(signer.algorithm())?;
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
        Self::validate_algorithm(header.algorithm)?;
        Self::validate_key_and_algorithm(key, header.algorithm)?;
        crate::jws::verify_bytes(header.algorithm, &signing_input, key, &signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::LocalSigner;

    #[test]
    fn sign_verify_each_curve() {
        let data = CanonicalData::RdfDataset {
            proof: vec!["_:c14n0 <http://example.org/p> \"proof\" .\n".to_string()],
            document: vec!["_:c14n0 <http://example.org/p> \"document\" .\n".to_string()],
        };
        let keys = [
            JWK::generate_ed25519().unwrap(),
            JWK::generate_p256().unwrap(),
            JWK::generate_secp256k1().unwrap(),
        ];
        for key in keys.iter() {
            let signer = LocalSigner::new(key.clone(), "did:example:1#key").unwrap();
            let jws = JsonWebSignature2020.sign(&data, &signer).unwrap();
            let signature = ProofSignature {
                value: &jws,
                nonce: None,
            };
            JsonWebSignature2020
                .verify(&data, signature, &key.to_public())
                .unwrap();
        }
        let signer = LocalSigner::new(keys[1].clone(), "did:example:1#key").unwrap();
        let jws = JsonWebSignature2020.sign(&data, &signer).unwrap();
        let signature = ProofSignature {
            value: &jws,
            nonce: None,
        };
        assert!(JsonWebSignature2020
            .verify(&data, signature, &keys[2].to_public())
            .is_err());
    }
}
