use std::collections::BTreeMap;
use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::jwk::{Algorithm, Params as JWKParams, BLS12381G2_CURVE, JWK};
use crate::signer::Signer;

// RFC 7515 - JSON Web Signature (JWS)
// RFC 7797 - JSON Web Signature (JWS) Unencoded Payload Option

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Header {
    #[serde(rename = "alg")]
    pub algorithm: Algorithm,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "b64")]
    pub base64urlencode_payload: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "crit")]
    pub critical: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "kid")]
    pub key_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "typ")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(flatten)]
    pub additional_parameters: BTreeMap<String, serde_json::Value>,
}

impl Header {
    /// Header of a detached JWS over an unencoded payload.
    pub fn new_unencoded(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            base64urlencode_payload: Some(false),
            critical: Some(vec!["b64".to_string()]),
            ..Default::default()
        }
    }

    pub fn decode(base_64: &str) -> Result<Self, Error> {
        let header_json = base64::decode_config(base_64, base64::URL_SAFE_NO_PAD)?;
        Ok(serde_json::from_slice(&header_json)?)
    }
}

fn base64_encode_json<T: Serialize>(object: &T) -> Result<String, Error> {
    let json = serde_json::to_string(&object)?;
    Ok(base64::encode_config(json, base64::URL_SAFE_NO_PAD))
}

pub fn sign_bytes(algorithm: Algorithm, data: &[u8], key: &JWK) -> Result<Vec<u8>, Error> {
    use signature::Signer;
    let signature = match &key.params {
        JWKParams::OKP(okp) if okp.curve == BLS12381G2_CURVE => {
            if algorithm != Algorithm::BLS12381G2 {
                return Err(Error::UnsupportedAlgorithm(algorithm.to_string()));
            }
            let pk = key.okp_public_key(BLS12381G2_CURVE)?;
            let sk = key.okp_private_key(BLS12381G2_CURVE)?;
            crate::bbs::sign(&[data], sk, pk)?
        }
        JWKParams::OKP(okp) => {
            if algorithm != Algorithm::EdDSA {
                return Err(Error::UnsupportedAlgorithm(algorithm.to_string()));
            }
            let signing_key = ed25519_dalek::SigningKey::try_from(okp)?;
            let signature: ed25519_dalek::Signature = signing_key
                .try_sign(data)
                .map_err(|e| Error::Signing(e.to_string()))?;
            signature.to_bytes().to_vec()
        }
        JWKParams::EC(ec) => match algorithm {
            Algorithm::ES256 => {
                let curve = ec.curve.as_ref().ok_or(Error::Missing("crv"))?;
                if curve != crate::jwk::P256_CURVE {
                    return Err(Error::CurveNotImplemented(curve.to_string()));
                }
                let secret_key = p256::SecretKey::try_from(ec)?;
                let signing_key = p256::ecdsa::SigningKey::from(secret_key);
                let sig: p256::ecdsa::Signature = signing_key
                    .try_sign(data)
                    .map_err(|e| Error::Signing(e.to_string()))?;
                sig.to_bytes().to_vec()
            }
            Algorithm::ES256K => {
                let curve = ec.curve.as_ref().ok_or(Error::Missing("crv"))?;
                if curve != crate::jwk::SECP256K1_CURVE {
                    return Err(Error::CurveNotImplemented(curve.to_string()));
                }
                let secret_key = k256::SecretKey::try_from(ec)?;
                let signing_key = k256::ecdsa::SigningKey::from(secret_key);
                let sig: k256::ecdsa::Signature = signing_key
                    .try_sign(data)
                    .map_err(|e| Error::Signing(e.to_string()))?;
                sig.to_bytes().to_vec()
            }
            _ => return Err(Error::UnsupportedAlgorithm(algorithm.to_string())),
        },
    };
    Ok(signature)
}

pub fn verify_bytes(
    algorithm: Algorithm,
    data: &[u8],
    key: &JWK,
    signature: &[u8],
) -> Result<(), Error> {
    use signature::Verifier;
    if let Some(key_algorithm) = key.algorithm {
        if key_algorithm != algorithm {
            return Err(Error::UnsupportedAlgorithm(algorithm.to_string()));
        }
    }
    match &key.params {
        JWKParams::OKP(okp) if okp.curve == BLS12381G2_CURVE => {
            if algorithm != Algorithm::BLS12381G2 {
                return Err(Error::UnsupportedAlgorithm(algorithm.to_string()));
            }
            crate::bbs::verify(&[data], signature, &okp.public_key.0)?;
        }
        JWKParams::OKP(okp) => {
            if algorithm != Algorithm::EdDSA {
                return Err(Error::UnsupportedAlgorithm(algorithm.to_string()));
            }
            let public_key = ed25519_dalek::VerifyingKey::try_from(okp)?;
            let signature = ed25519_dalek::Signature::from_slice(signature)
                .map_err(|_| Error::InvalidSignature)?;
            public_key
                .verify(data, &signature)
                .map_err(|_| Error::InvalidSignature)?;
        }
        JWKParams::EC(ec) => match algorithm {
            Algorithm::ES256 => {
                let public_key = p256::PublicKey::try_from(ec)?;
                let verifying_key = p256::ecdsa::VerifyingKey::from(public_key);
                let sig = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| Error::InvalidSignature)?;
                verifying_key
                    .verify(data, &sig)
                    .map_err(|_| Error::InvalidSignature)?;
            }
            Algorithm::ES256K => {
                let public_key = k256::PublicKey::try_from(ec)?;
                let verifying_key = k256::ecdsa::VerifyingKey::from(public_key);
                let sig = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| Error::InvalidSignature)?;
                verifying_key
                    .verify(data, &sig)
                    .map_err(|_| Error::InvalidSignature)?;
            }
            _ => return Err(Error::UnsupportedAlgorithm(algorithm.to_string())),
        },
    }
    Ok(())
}

/// Sign `payload` as a detached JWS with an unencoded payload
/// (`header..signature`).
pub fn detached_sign_unencoded_payload_with(
    signer: &dyn Signer,
    payload: &[u8],
) -> Result<String, Error> {
    let header = Header::new_unencoded(signer.algorithm());
    let header_b64 = base64_encode_json(&header)?;
    let signing_input = [header_b64.as_bytes(), b".", payload].concat();
    let signature = signer.sign(&signing_input)?;
    let sig_b64 = base64::encode_config(signature, base64::URL_SAFE_NO_PAD);
    Ok(header_b64 + ".." + &sig_b64)
}

/// Split a detached JWS and build the signing input for `payload`.
///
/// Returns the decoded header, the signing input and the signature bytes.
pub fn prepare_detached_verification(
    jws: &str,
    payload: &[u8],
) -> Result<(Header, Vec<u8>, Vec<u8>), Error> {
    let (header_b64, signature_b64) = split_detached_jws(jws)?;
    let header = Header::decode(header_b64)?;
    if header.base64urlencode_payload != Some(false)
        || header.critical.as_deref() != Some(&["b64".to_string()][..])
    {
        return Err(Error::InvalidInput(
            "Detached JWS must use an unencoded payload".to_string(),
        ));
    }
    let signature = base64::decode_config(signature_b64, base64::URL_SAFE_NO_PAD)?;
    let signing_input = [header_b64.as_bytes(), b".", payload].concat();
    Ok((header, signing_input, signature))
}

pub fn split_jws(jws: &str) -> Result<(&str, &str, &str), Error> {
    let mut parts = jws.splitn(3, '.');
    Ok(
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), Some(c), None) => (a, b, c),
            _ => return Err(Error::InvalidInput("Invalid JWS".to_string())),
        },
    )
}

pub fn split_detached_jws(jws: &str) -> Result<(&str, &str), Error> {
    let (header_b64, omitted_payload, signature_b64) = split_jws(jws)?;
    if !omitted_payload.is_empty() {
        return Err(Error::InvalidInput("Expected detached JWS".to_string()));
    }
    Ok((header_b64, signature_b64))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedJWS {
    pub header: Header,
    pub signing_input: Vec<u8>,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

pub fn decode_jws(jws: &str) -> Result<DecodedJWS, Error> {
    let (header_b64, payload_b64, signature_b64) = split_jws(jws)?;
    let header = Header::decode(header_b64)?;
    if header.critical.is_some() {
        return Err(Error::InvalidInput(
            "Unsupported critical header parameters".to_string(),
        ));
    }
    Ok(DecodedJWS {
        header,
        signing_input: [header_b64.as_bytes(), b".", payload_b64.as_bytes()].concat(),
        payload: base64::decode_config(payload_b64, base64::URL_SAFE_NO_PAD)?,
        signature: base64::decode_config(signature_b64, base64::URL_SAFE_NO_PAD)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::LocalSigner;

    fn roundtrip(key: JWK) {
        let public = key.to_public();
        let signer = LocalSigner::new(key, "did:example:1#key").unwrap();
        let payload = b"payload bytes";
        let jws = detached_sign_unencoded_payload_with(&signer, payload).unwrap();
        assert!(jws.contains(".."));
        let (header, signing_input, signature) =
            prepare_detached_verification(&jws, payload).unwrap();
        verify_bytes(header.algorithm, &signing_input, &public, &signature).unwrap();
        let (header, signing_input, signature) =
            prepare_detached_verification(&jws, b"other payload").unwrap();
        assert!(verify_bytes(header.algorithm, &signing_input, &public, &signature).is_err());
    }

    #[test]
    fn detached_all_algorithms() {
        roundtrip(JWK::generate_ed25519().unwrap());
        roundtrip(JWK::generate_p256().unwrap());
        roundtrip(JWK::generate_secp256k1().unwrap());
        roundtrip(JWK::generate_bls12381g2(Some(b"0123456789abcdef0123456789abcdef")).unwrap());
    }

    #[test]
    fn detached_header_layout() {
        let signer = LocalSigner::new(JWK::generate_ed25519().unwrap(), "did:example:1#key")
            .unwrap();
        let jws = detached_sign_unencoded_payload_with(&signer, b"x").unwrap();
        let (header_b64, _) = split_detached_jws(&jws).unwrap();
        let header = base64::decode_config(header_b64, base64::URL_SAFE_NO_PAD).unwrap();
        assert_eq!(
            String::from_utf8(header).unwrap(),
            r#"{"alg":"EdDSA","b64":false,"crit":["b64"]}"#
        );
    }

    #[test]
    fn compact_jws_rejects_critical_headers() {
        let signer = LocalSigner::new(JWK::generate_ed25519().unwrap(), "did:example:1#key")
            .unwrap();
        let detached = detached_sign_unencoded_payload_with(&signer, b"{}").unwrap();
        let (header_b64, signature_b64) = split_detached_jws(&detached).unwrap();
        let compact = format!("{}.e30.{}", header_b64, signature_b64);
        assert_eq!(
            decode_jws(&compact).unwrap_err().kind(),
            crate::error::ErrorKind::InvalidInput
        );
        assert!(matches!(
            split_jws("a.b"),
            Err(Error::InvalidInput(_))
        ));
        assert!(split_detached_jws("a.b.c").is_err());
    }
}
