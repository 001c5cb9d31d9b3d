//! Credentials as compact JWS (JWT) tokens.
//!
//! Registered claims carry the issuer, subject, id and validity period; the
//! rest of the credential is nested under the `vc` claim.

use std::convert::TryFrom;

use chrono::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::canonicalize;
use crate::error::Error;
use crate::jws::{self, Header};
use crate::ldp::{LinkedDataProofs, PublicKeyFetcher};
use crate::one_or_many::OneOrMany;
use crate::signer::Signer;
use crate::suites::{CanonicalData, ProofSignature, ProofSuiteType};
use crate::vc::{Credential, VCDateTime};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct JWTClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "exp")]
    pub expiration_time: Option<NumericDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "iat")]
    pub issuance_date: Option<NumericDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "iss")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "nbf")]
    pub not_before: Option<NumericDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "jti")]
    pub jwt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sub")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "aud")]
    pub audience: Option<OneOrMany<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "vc")]
    pub verifiable_credential: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub property_set: Option<Map<String, Value>>,
}

/// Seconds since the epoch, with microsecond precision.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, PartialOrd)]
pub struct NumericDate(#[serde(serialize_with = "interop_serialize")] f64);

/// Whole seconds are written as integers, since many JWT libraries only
/// accept those.
fn interop_serialize<S>(x: &f64, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if x.fract() != 0.0 {
        s.serialize_f64(*x)
    } else {
        s.serialize_i64(*x as i64)
    }
}

impl NumericDate {
    /// 2^53 / 1_000_000: beyond this microseconds are no longer exact.
    pub const MAX: NumericDate = NumericDate(9_007_199_254.740_992);

    pub fn as_seconds(self) -> f64 {
        self.0
    }

    pub fn try_from_seconds(seconds: f64) -> Result<Self, Error> {
        if !seconds.is_finite() || seconds.abs() > Self::MAX.0 {
            return Err(Error::InvalidInput(format!(
                "NumericDate out of range: {}",
                seconds
            )));
        }
        Ok(NumericDate(seconds))
    }

    pub fn to_date_time(self) -> Result<DateTime<Utc>, Error> {
        let whole_seconds = self.0.floor();
        let micros = ((self.0 - whole_seconds) * 1_000_000.0).round() as u32;
        Utc.timestamp_opt(whole_seconds as i64, micros.min(999_999) * 1_000)
            .single()
            .ok_or_else(|| Error::InvalidInput(format!("Invalid NumericDate: {}", self.0)))
    }
}

impl TryFrom<DateTime<Utc>> for NumericDate {
    type Error = Error;
    fn try_from(dtu: DateTime<Utc>) -> Result<Self, Self::Error> {
        let whole_seconds = dtu.timestamp() as f64;
        let fractional_seconds = dtu.timestamp_subsec_micros() as f64 / 1_000_000.0;
        Self::try_from_seconds(whole_seconds + fractional_seconds)
    }
}

/// What [`parse`] does with the signature of its input.
pub enum ProofCheck<'a> {
    /// Check the JWS signature, or every embedded proof of a JSON
    /// credential, with keys from the fetcher.
    Verify(&'a dyn PublicKeyFetcher),
    /// Skip all signature checks. Never the default.
    Disabled,
}

/// Map a credential onto JWT claims.
///
/// With `minimize_vc`, members carried by registered claims (`id`, dates,
/// issuer id) are removed from the nested `vc` claim.
pub fn to_claims(credential: &Credential, minimize_vc: bool) -> Result<JWTClaims, Error> {
    let mut vc = credential.clone();
    vc.proof = None;
    let mut vc = match serde_json::to_value(vc)? {
        Value::Object(map) => map,
        _ => return Err(Error::ExpectedJsonObject),
    };
    if matches!(vc.get("credentialSchema"), Some(Value::Array(schemas)) if schemas.is_empty()) {
        vc.remove("credentialSchema");
    }
    if minimize_vc {
        vc.remove("id");
        vc.remove("issuanceDate");
        vc.remove("expirationDate");
        let drop_issuer = match vc.get_mut("issuer") {
            Some(Value::Object(issuer)) => {
                issuer.remove("id");
                issuer.is_empty()
            }
            Some(_) => true,
            None => false,
        };
        if drop_issuer {
            vc.remove("issuer");
        }
    }

    let issuance_date = credential
        .issuance_date
        .map(|date| NumericDate::try_from(DateTime::<Utc>::from(date)))
        .transpose()?;
    let expiration_time = credential
        .expiration_date
        .map(|date| NumericDate::try_from(DateTime::<Utc>::from(date)))
        .transpose()?;
    let subject = credential
        .credential_subject
        .to_single()
        .and_then(|subject| subject.id.clone());
    Ok(JWTClaims {
        expiration_time,
        issuance_date,
        issuer: credential.issuer.as_ref().map(|i| i.get_id().to_string()),
        not_before: issuance_date,
        jwt_id: credential.id.clone(),
        subject,
        verifiable_credential: Some(Value::Object(vc)),
        ..Default::default()
    })
}

/// Sign `claims` as a compact JWS.
///
/// The payload is the claims in canonical JSON; the signature is produced by
/// the `JwtProof2020` suite over `header.payload`.
pub fn to_jws(claims: &JWTClaims, signer: &dyn Signer) -> Result<String, Error> {
    let header = Header {
        algorithm: signer.algorithm(),
        key_id: Some(signer.verification_method()),
        type_: Some("JWT".to_string()),
        ..Default::default()
    };
    let header_b64 = base64::encode_config(serde_json::to_vec(&header)?, base64::URL_SAFE_NO_PAD);
    let payload = canonicalize::plain_json(claims)?;
    let payload_b64 = base64::encode_config(payload, base64::URL_SAFE_NO_PAD);
    let signing_input = header_b64 + "." + &payload_b64;
    let data = CanonicalData::PlainJson(signing_input.clone().into_bytes());
    let signature = ProofSuiteType::JwtProof2020.suite().sign(&data, signer)?;
    Ok([signing_input, signature].join("."))
}

/// Encode and sign `credential` as a JWT.
pub fn encode(
    credential: &Credential,
    minimize_vc: bool,
    signer: &dyn Signer,
) -> Result<String, Error> {
    to_jws(&to_claims(credential, minimize_vc)?, signer)
}

/// Read a credential given either as JSON or as a compact JWS.
///
/// Registered claims take precedence over the members of the `vc` claim.
pub fn parse(
    input: &str,
    check: ProofCheck,
    proofs: &LinkedDataProofs,
) -> Result<Credential, Error> {
    let input = input.trim();
    if input.starts_with('{') {
        let credential = Credential::from_json(input)?;
        if let ProofCheck::Verify(fetcher) = check {
            proofs.verify_proofs(&credential, fetcher)?;
        }
        return Ok(credential);
    }

    let decoded = jws::decode_jws(input)?;
    let claims: JWTClaims = serde_json::from_slice(&decoded.payload)?;
    if let ProofCheck::Verify(fetcher) = check {
        let issuer = claims.issuer.as_deref().unwrap_or_default();
        let verification_method = match decoded.header.key_id.as_deref() {
            Some(kid) if !kid.is_empty() => kid,
            _ => issuer,
        };
        let key = fetcher.fetch(issuer, verification_method)?;
        if key.get_algorithm() != Some(decoded.header.algorithm) {
            return Err(Error::Verification(format!(
                "JWT algorithm {} does not match key",
                decoded.header.algorithm
            )));
        }
        let signature = base64::encode_config(&decoded.signature, base64::URL_SAFE_NO_PAD);
        let data = CanonicalData::PlainJson(decoded.signing_input);
        ProofSuiteType::JwtProof2020.suite().verify(
            &data,
            ProofSignature {
                value: &signature,
                nonce: None,
            },
            &key,
        )?;
    }
    from_claims(claims)
}

/// Rebuild a credential from its claims.
pub fn from_claims(claims: JWTClaims) -> Result<Credential, Error> {
    let mut vc = match claims.verifiable_credential {
        Some(Value::Object(vc)) => vc,
        Some(_) => return Err(Error::ExpectedJsonObject),
        None => return Err(Error::Missing("vc claim")),
    };
    if let Some(exp) = claims.expiration_time {
        vc.insert("expirationDate".to_string(), date_value(exp)?);
    }
    if let Some(nbf) = claims.not_before.or(claims.issuance_date) {
        vc.insert("issuanceDate".to_string(), date_value(nbf)?);
    }
    if let Some(jti) = claims.jwt_id {
        vc.insert("id".to_string(), Value::String(jti));
    }
    if let Some(iss) = claims.issuer {
        match vc.get_mut("issuer") {
            Some(Value::Object(issuer)) => {
                issuer.insert("id".to_string(), Value::String(iss));
            }
            _ => {
                vc.insert("issuer".to_string(), Value::String(iss));
            }
        }
    }
    if let Some(sub) = claims.subject {
        let subject = match vc.get_mut("credentialSubject") {
            Some(Value::Array(subjects)) if subjects.len() == 1 => subjects.first_mut(),
            Some(subject) => Some(subject),
            None => None,
        };
        match subject {
            Some(Value::Object(subject)) => {
                subject.insert("id".to_string(), Value::String(sub));
            }
            _ => {
                let mut subject = Map::new();
                subject.insert("id".to_string(), Value::String(sub));
                vc.insert("credentialSubject".to_string(), Value::Object(subject));
            }
        }
    }
    Credential::from_value(Value::Object(vc))
}

fn date_value(date: NumericDate) -> Result<Value, Error> {
    let date_time = VCDateTime::from(date.to_date_time()?);
    Ok(Value::String(date_time.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::jsonld::StaticLoader;
    use crate::jwk::JWK;
    use crate::logging::Logger;
    use crate::signer::LocalSigner;
    use serde_json::json;

    fn credential() -> Credential {
        Credential::from_value(json!({
            "@context": "https://www.w3.org/2018/credentials/v1",
            "id": "urn:uuid:7a1f6e0c-1b1d-4bd6-9a3b-3f0e0f6a62b1",
            "type": "VerifiableCredential",
            "issuer": "did:example:issuer",
            "issuanceDate": "2021-05-04T10:00:00.25Z",
            "credentialSubject": {"id": "did:example:subject", "claim": true}
        }))
        .unwrap()
    }

    #[test]
    fn numeric_dates() {
        assert_eq!(
            serde_json::to_string(&NumericDate::try_from_seconds(1262373804.0).unwrap()).unwrap(),
            "1262373804"
        );
        assert_eq!(
            serde_json::to_string(&NumericDate::try_from_seconds(1.5).unwrap()).unwrap(),
            "1.5"
        );
        assert!(NumericDate::try_from_seconds(f64::NAN).is_err());
        let date = Utc.with_ymd_and_hms(2010, 1, 1, 19, 23, 24).unwrap();
        let numeric = NumericDate::try_from(date).unwrap();
        assert_eq!(numeric.as_seconds(), 1262373804.0);
        assert_eq!(numeric.to_date_time().unwrap(), date);
    }

    #[test]
    fn claims_carry_registered_members() {
        let claims = to_claims(&credential(), true).unwrap();
        assert_eq!(claims.issuer.as_deref(), Some("did:example:issuer"));
        assert_eq!(claims.subject.as_deref(), Some("did:example:subject"));
        assert_eq!(claims.not_before, claims.issuance_date);
        assert_eq!(claims.not_before.map(NumericDate::as_seconds), Some(1620122400.25));
        let vc = claims.verifiable_credential.unwrap();
        assert!(vc.get("id").is_none());
        assert!(vc.get("issuer").is_none());
        assert!(vc.get("issuanceDate").is_none());

        let claims = to_claims(&credential(), false).unwrap();
        let vc = claims.verifiable_credential.unwrap();
        assert_eq!(vc["issuer"], json!("did:example:issuer"));
    }

    #[test]
    fn registered_claims_win() {
        let mut claims = to_claims(&credential(), false).unwrap();
        claims.jwt_id = Some("urn:example:other".to_string());
        let vc = from_claims(claims).unwrap();
        assert_eq!(vc.id.as_deref(), Some("urn:example:other"));
    }

    #[test]
    fn sign_and_parse() {
        let key = JWK::generate_secp256k1().unwrap();
        let signer = LocalSigner::new(key.clone(), "did:example:issuer#key").unwrap();
        let jwt = encode(&credential(), true, &signer).unwrap();
        let proofs = LinkedDataProofs::new(&StaticLoader, Logger::default());
        let public = key.to_public();
        let fetcher = move |_: &str, _: &str| -> Result<JWK, Error> { Ok(public.clone()) };
        let parsed = parse(&jwt, ProofCheck::Verify(&fetcher), &proofs).unwrap();
        assert_eq!(parsed, credential());

        let other = JWK::generate_secp256k1().unwrap().to_public();
        let wrong = move |_: &str, _: &str| -> Result<JWK, Error> { Ok(other.clone()) };
        let err = parse(&jwt, ProofCheck::Verify(&wrong), &proofs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Verification);
        parse(&jwt, ProofCheck::Disabled, &proofs).unwrap();
    }

    #[test]
    fn json_input_needs_proof_when_checked() {
        let json = serde_json::to_string(&credential()).unwrap();
        let proofs = LinkedDataProofs::new(&StaticLoader, Logger::default());
        let fetcher = |_: &str, _: &str| -> Result<JWK, Error> { Err(Error::NoPublicKeyFound) };
        assert!(parse(&json, ProofCheck::Verify(&fetcher), &proofs).is_err());
        assert_eq!(
            parse(&json, ProofCheck::Disabled, &proofs).unwrap(),
            credential()
        );
    }
}
