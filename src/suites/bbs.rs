use super::{CanonicalData, ProofSignature, ProofSuite, ProofSuiteType};
use crate::error::Error;
use crate::jwk::{BLS12381G2_CURVE, JWK};
use crate::signer::Signer;

/// One message per canonical statement: the proof options first, then the
/// document.
pub(crate) fn statements(data: &CanonicalData) -> Result<Vec<String>, Error> {
    match data {
        CanonicalData::RdfDataset { proof, document } => Ok(proof
            .iter()
            .chain(document.iter())
            .map(|line| line.trim_end_matches('\n').to_string())
            .collect()),
        CanonicalData::PlainJson(_) => Err(Error::InvalidInput(
            "BBS+ signs individual statements".to_string(),
        )),
    }
}

/// <https://w3c-ccg.github.io/ldp-bbs2020/>
pub struct BbsBlsSignature2020;

impl ProofSuite for BbsBlsSignature2020 {
    fn suite_type(&self) -> ProofSuiteType {
        ProofSuiteType::BbsBlsSignature2020
    }

    fn sign(&self, data: &CanonicalData, signer: &dyn Signer) -> Result<String, Error> {
        let messages = statements(data)?;
        let signature = signer.sign_multi(&messages)?;
        Ok(base64::encode(signature))
    }

    fn verify(
        &self,
        data: &CanonicalData,
        signature: ProofSignature,
        key: &JWK,
    ) -> Result<(), Error> {
        let messages = statements(data)?;
        let signature = base64::decode(signature.value)?;
        let public_key = key.okp_public_key(BLS12381G2_CURVE)?;
        crate::bbs::verify(&messages, &signature, public_key)
    }
}

/// Proof of knowledge of a [`BbsBlsSignature2020`] signature, disclosing a
/// subset of the signed statements.
///
/// Derived by selective disclosure, never signed directly.
pub struct BbsBlsSignatureProof2020;

impl ProofSuite for BbsBlsSignatureProof2020 {
    fn suite_type(&self) -> ProofSuiteType {
        ProofSuiteType::BbsBlsSignatureProof2020
    }

    fn sign(&self, _data: &CanonicalData, _signer: &dyn Signer) -> Result<String, Error> {
        Err(Error::InvalidInput(
            "BbsBlsSignatureProof2020 proofs are derived from a BbsBlsSignature2020 proof"
                .to_string(),
        ))
    }

    fn verify(
        &self,
        data: &CanonicalData,
        signature: ProofSignature,
        key: &JWK,
    ) -> Result<(), Error> {
        let revealed = statements(data)?;
        let proof = base64::decode(signature.value)?;
        let nonce = base64::decode(signature.nonce.ok_or(Error::Missing("nonce"))?)?;
        let public_key = key.okp_public_key(BLS12381G2_CURVE)?;
        crate::bbs::verify_proof(&proof, &revealed, public_key, &nonce)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::error::ErrorKind;
    use crate::signer::LocalSigner;

    const SEED: &[u8] = b"bbs suite test seed 000000000001";

    fn data() -> CanonicalData {
        CanonicalData::RdfDataset {
            proof: vec!["_:c14n0 <http://purl.org/dc/terms/created> \"2010\" .\n".to_string()],
            document: vec![
                "_:c14n0 <http://schema.org/familyName> \"SMITH\" .\n".to_string(),
                "_:c14n0 <http://schema.org/givenName> \"JOHN\" .\n".to_string(),
            ],
        }
    }

    #[test]
    fn statements_drop_line_ends() {
        let messages = statements(&data()).unwrap();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| !m.ends_with('\n')));
    }

    #[test]
    fn sign_verify_and_derive() {
        let key = JWK::generate_bls12381g2(Some(SEED)).unwrap();
        let signer = LocalSigner::new(key.clone(), "did:example:1#bls").unwrap();
        let value = BbsBlsSignature2020.sign(&data(), &signer).unwrap();
        let signature = ProofSignature {
            value: &value,
            nonce: None,
        };
        BbsBlsSignature2020
            .verify(&data(), signature, &key.to_public())
            .unwrap();

        let messages = statements(&data()).unwrap();
        let pk = key.okp_public_key(BLS12381G2_CURVE).unwrap();
        let revealed: BTreeSet<usize> = [0, 2].iter().copied().collect();
        let proof = crate::bbs::derive_proof(
            &messages,
            &base64::decode(&value).unwrap(),
            pk,
            &revealed,
            b"nonce",
        )
        .unwrap();
        let proof_value = base64::encode(proof);
        let nonce = base64::encode(b"nonce");
        let disclosed = CanonicalData::RdfDataset {
            proof: vec!["_:c14n0 <http://purl.org/dc/terms/created> \"2010\" .\n".to_string()],
            document: vec!["_:c14n0 <http://schema.org/givenName> \"JOHN\" .\n".to_string()],
        };
        let derived = ProofSignature {
            value: &proof_value,
            nonce: Some(&nonce),
        };
        BbsBlsSignatureProof2020
            .verify(&disclosed, derived, &key.to_public())
            .unwrap();
        let without_nonce = ProofSignature {
            value: &proof_value,
            nonce: None,
        };
        assert_eq!(
            BbsBlsSignatureProof2020
                .verify(&disclosed, without_nonce, &key.to_public())
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn derived_suite_cannot_sign() {
        let key = JWK::generate_bls12381g2(Some(SEED)).unwrap();
        let signer = LocalSigner::new(key, "did:example:1#bls").unwrap();
        assert!(BbsBlsSignatureProof2020.sign(&data(), &signer).is_err());
    }
}
