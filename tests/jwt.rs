use serde_json::json;
use vc_proofs::did::StaticResolver;
use vc_proofs::jwt::{self, ProofCheck};
use vc_proofs::{
    Credential, Document, Error, ErrorKind, LinkedDataProofs, LocalSigner, Logger,
    ResolverKeyFetcher, Signer, StaticLoader, JWK,
};

const ISSUER_SEED: [u8; 32] = [
    72, 67, 163, 188, 235, 199, 239, 146, 129, 52, 228, 34, 44, 106, 23, 144, 189, 57, 115, 171,
    4, 217, 54, 121, 41, 155, 251, 83, 1, 240, 238, 65,
];

const EXPECTED_JWS: &str = "eyJhbGciOiJFZERTQSIsImtpZCI6ImRpZDpleGFtcGxlOjc2ZTEyZWM3MTJlYmM2ZjFjMjIxZWJmZWIxZiNrZXkxIiwidHlwIjoiSldUIn0.eyJleHAiOjE1Nzc5MDY2MDQsImlhdCI6MTI2MjM3MzgwNCwiaXNzIjoiZGlkOmV4YW1wbGU6NzZlMTJlYzcxMmViYzZmMWMyMjFlYmZlYjFmIiwianRpIjoiaHR0cDovL2V4YW1wbGUuZWR1L2NyZWRlbnRpYWxzLzE4NzIiLCJuYmYiOjEyNjIzNzM4MDQsInN1YiI6ImRpZDpleGFtcGxlOmViZmViMWY3MTJlYmM2ZjFjMjc2ZTEyZWMyMSIsInZjIjp7IkBjb250ZXh0IjpbImh0dHBzOi8vd3d3LnczLm9yZy8yMDE4L2NyZWRlbnRpYWxzL3YxIiwiaHR0cHM6Ly93d3cudzMub3JnLzIwMTgvY3JlZGVudGlhbHMvZXhhbXBsZXMvdjEiXSwiY3JlZGVudGlhbFN1YmplY3QiOnsiZGVncmVlIjp7InR5cGUiOiJCYWNoZWxvckRlZ3JlZSIsInVuaXZlcnNpdHkiOiJNSVQifSwiaWQiOiJkaWQ6ZXhhbXBsZTplYmZlYjFmNzEyZWJjNmYxYzI3NmUxMmVjMjEiLCJuYW1lIjoiSmF5ZGVuIERvZSIsInNwb3VzZSI6ImRpZDpleGFtcGxlOmMyNzZlMTJlYzIxZWJmZWIxZjcxMmViYzZmMSJ9LCJpc3N1ZXIiOnsibmFtZSI6IkV4YW1wbGUgVW5pdmVyc2l0eSJ9LCJ0eXBlIjpbIlZlcmlmaWFibGVDcmVkZW50aWFsIiwiVW5pdmVyc2l0eURlZ3JlZUNyZWRlbnRpYWwiXX19.Yw_rvurgpu01cPzJ4Z9Qwrhw8QqQ6wno3gS-iGso7iNntaVyAa3C9QISE62-kF2POb5rwdfyH3bEU_r9MX3qAA";

/// The degree credential without its extension fields.
fn degree() -> Credential {
    let mut vc: Credential =
        serde_json::from_str(include_str!("fixtures/degree-credential.json")).unwrap();
    if let Some(extensions) = vc.property_set.as_mut() {
        extensions.remove("referenceNumber");
    }
    vc
}

fn signer() -> LocalSigner {
    let key = JWK::ed25519_from_secret(&ISSUER_SEED).unwrap();
    LocalSigner::new(key, "did:example:76e12ec712ebc6f1c221ebfeb1f#key1").unwrap()
}

fn proofs() -> LinkedDataProofs<'static> {
    LinkedDataProofs::new(&StaticLoader, Logger::default())
}

#[test]
fn minimized_credential_jws() {
    let jws = jwt::encode(&degree(), true, &signer()).unwrap();
    assert_eq!(jws, EXPECTED_JWS);
}

#[test]
fn claims_round_trip() {
    let public = signer().public_key();
    let fetcher = move |issuer: &str, _: &str| -> Result<JWK, Error> {
        assert_eq!(issuer, "did:example:76e12ec712ebc6f1c221ebfeb1f");
        Ok(public.clone())
    };
    for minimize in [true, false] {
        let jws = jwt::encode(&degree(), minimize, &signer()).unwrap();
        let parsed = jwt::parse(&jws, ProofCheck::Verify(&fetcher), &proofs()).unwrap();
        let mut expected = degree();
        // An empty schema list is not carried.
        expected.credential_schema = None;
        assert_eq!(parsed, expected);
    }
}

#[test]
fn verify_through_issuer_document() {
    let signer = signer();
    let vm = signer.verification_method();
    let document: Document = serde_json::from_value(json!({
        "@context": "https://www.w3.org/ns/did/v1",
        "id": "did:example:76e12ec712ebc6f1c221ebfeb1f",
        "verificationMethod": [{
            "id": vm,
            "type": "JsonWebKey2020",
            "controller": "did:example:76e12ec712ebc6f1c221ebfeb1f",
            "publicKeyJwk": signer.public_key()
        }],
        "assertionMethod": [vm]
    }))
    .unwrap();
    let mut resolver = StaticResolver::new();
    resolver.insert(document);
    let fetcher = ResolverKeyFetcher::new(&resolver);

    let parsed = jwt::parse(EXPECTED_JWS, ProofCheck::Verify(&fetcher), &proofs()).unwrap();
    assert_eq!(parsed.id.as_deref(), Some("http://example.edu/credentials/1872"));

    let other = LocalSigner::new(
        JWK::ed25519_from_secret(&[9u8; 32]).unwrap(),
        "did:example:76e12ec712ebc6f1c221ebfeb1f#key2",
    )
    .unwrap();
    let jws = jwt::encode(&degree(), true, &other).unwrap();
    let err = jwt::parse(&jws, ProofCheck::Verify(&fetcher), &proofs()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoMatchingVerificationMethod);
}

#[test]
fn extension_fields_stay_in_vc_claim() {
    let vc: Credential =
        serde_json::from_str(include_str!("fixtures/degree-credential.json")).unwrap();
    let claims = jwt::to_claims(&vc, true).unwrap();
    let nested = claims.verifiable_credential.as_ref().unwrap();
    assert_eq!(nested["referenceNumber"], json!(83294849));
    let parsed = jwt::from_claims(claims).unwrap();
    assert_eq!(parsed.property_set, vc.property_set);
}

#[test]
fn tampered_payload_is_rejected() {
    let public = signer().public_key();
    let fetcher = move |_: &str, _: &str| -> Result<JWK, Error> { Ok(public.clone()) };
    let mut parts: Vec<String> = EXPECTED_JWS.split('.').map(str::to_string).collect();
    let other = jwt::to_claims(
        &Credential {
            id: Some("http://example.edu/credentials/9999".to_string()),
            ..degree()
        },
        true,
    )
    .unwrap();
    parts[1] = base64::encode_config(
        serde_json::to_vec(&other).unwrap(),
        base64::URL_SAFE_NO_PAD,
    );
    let forged = parts.join(".");
    let err = jwt::parse(&forged, ProofCheck::Verify(&fetcher), &proofs()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Verification);

    // Only an explicit opt-out skips the check.
    let unchecked = jwt::parse(&forged, ProofCheck::Disabled, &proofs()).unwrap();
    assert_eq!(
        unchecked.id.as_deref(),
        Some("http://example.edu/credentials/9999")
    );
}
