use chrono::prelude::*;
use serde_json::{json, Value};
use vc_proofs::{
    Credential, Error, ErrorKind, LinkedDataDocument, LinkedDataProofs, LocalSigner, Logger,
    ProofOptions, ProofPurpose, SelectiveDisclosure, StaticLoader, JWK,
};

const BLS_SEED: &[u8] = b"permanent resident card issuer 1";

fn issuer_key() -> JWK {
    JWK::generate_bls12381g2(Some(BLS_SEED)).unwrap()
}

fn fetcher() -> impl Fn(&str, &str) -> Result<JWK, Error> {
    let public = issuer_key().to_public();
    move |_: &str, _: &str| Ok(public.clone())
}

fn reveal_document() -> Value {
    serde_json::from_str(include_str!("fixtures/reveal-document.json")).unwrap()
}

fn signed_card() -> Credential {
    let mut vc: Credential =
        serde_json::from_str(include_str!("fixtures/permanent-resident-card.json")).unwrap();
    let signer = LocalSigner::new(issuer_key(), "did:example:123456#key1").unwrap();
    let mut options = ProofOptions {
        type_: Some("BbsBlsSignature2020".to_string()),
        proof_purpose: Some(ProofPurpose::AssertionMethod),
        created: Some(Utc.with_ymd_and_hms(2010, 1, 1, 19, 23, 24).unwrap()),
        ..Default::default()
    };
    LinkedDataProofs::new(&StaticLoader, Logger::default())
        .add_proof(&mut vc, &mut options, &signer)
        .unwrap();
    vc
}

fn disclosure() -> SelectiveDisclosure<'static> {
    SelectiveDisclosure::new(&StaticLoader, Logger::default())
}

#[test]
fn derived_credential_reveals_only_requested_claims() {
    let signed = signed_card();
    let before = signed.clone();
    let derived = disclosure()
        .derive(&signed, &reveal_document(), b"nonce-1", &fetcher())
        .unwrap();
    assert_eq!(signed, before);

    let subject = derived.credential_subject.first().unwrap();
    assert!(subject
        .id
        .as_deref()
        .map_or(false, |id| id.starts_with("urn:bnid:_:c14n")));
    let mut claims: Vec<&str> = subject
        .property_set
        .iter()
        .flatten()
        .map(|(key, _)| key.as_str())
        .collect();
    claims.sort_unstable();
    assert_eq!(claims, ["familyName", "gender", "givenName", "type"]);

    let value = serde_json::to_value(&derived).unwrap();
    assert_eq!(value["identifier"], json!("83627465"));
    assert_eq!(value["issuer"], json!("did:example:b34ca6cd37bbf23"));
    assert_eq!(value["issuanceDate"], json!("2019-12-03T12:19:52Z"));
    assert!(value.get("expirationDate").is_none());
    assert!(value.get("name").is_none());
    assert!(value["credentialSubject"].get("birthDate").is_none());
    assert!(value["credentialSubject"].get("lprNumber").is_none());

    let proofs = derived.proofs();
    assert_eq!(proofs.len(), 1);
    let proof = proofs[0];
    assert_eq!(proof.type_, "BbsBlsSignatureProof2020");
    assert_eq!(proof.nonce.as_deref(), Some(base64::encode(b"nonce-1").as_str()));
    assert_eq!(
        proof.verification_method.as_deref(),
        Some("did:example:123456#key1")
    );
    assert_eq!(proof.proof_purpose, Some(ProofPurpose::AssertionMethod));
    assert_eq!(
        proof.created,
        Some(Utc.with_ymd_and_hms(2010, 1, 1, 19, 23, 24).unwrap())
    );

    LinkedDataProofs::new(&StaticLoader, Logger::default())
        .verify_proofs(&derived, &fetcher())
        .unwrap();
}

#[test]
fn derived_proofs_are_unlinkable() {
    let signed = signed_card();
    let first = disclosure()
        .derive(&signed, &reveal_document(), b"nonce-1", &fetcher())
        .unwrap();
    let second = disclosure()
        .derive(&signed, &reveal_document(), b"nonce-2", &fetcher())
        .unwrap();
    assert_ne!(
        first.proofs()[0].proof_value,
        second.proofs()[0].proof_value
    );
    let engine = LinkedDataProofs::new(&StaticLoader, Logger::default());
    engine.verify_proofs(&first, &fetcher()).unwrap();
    engine.verify_proofs(&second, &fetcher()).unwrap();
}

#[test]
fn derived_credential_cannot_be_altered() {
    let derived = disclosure()
        .derive(&signed_card(), &reveal_document(), b"nonce-1", &fetcher())
        .unwrap();
    let mut value = serde_json::to_value(&derived).unwrap();
    value["credentialSubject"]["givenName"] = json!("JANE");
    let altered: Credential = serde_json::from_value(value).unwrap();
    let err = LinkedDataProofs::new(&StaticLoader, Logger::default())
        .verify_proofs(&altered, &fetcher())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Verification);
}

#[test]
fn absent_fields_in_reveal_document_are_ignored() {
    let mut reveal = reveal_document();
    reveal["credentialSubject"]["nickname"] = json!({});
    let derived = disclosure()
        .derive(&signed_card(), &reveal, b"nonce-1", &fetcher())
        .unwrap();
    let value = serde_json::to_value(&derived).unwrap();
    assert!(value["credentialSubject"].get("nickname").is_none());
    assert_eq!(value["credentialSubject"]["givenName"], json!("JOHN"));
}

#[test]
fn derivation_errors() {
    let signed = signed_card();
    let err = disclosure()
        .derive(&signed, &json!(["givenName"]), b"nonce-1", &fetcher())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SelectiveDisclosure);

    let err = disclosure()
        .derive(&signed, &reveal_document(), b"", &fetcher())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SelectiveDisclosure);

    let unsigned: Credential =
        serde_json::from_str(include_str!("fixtures/permanent-resident-card.json")).unwrap();
    let err = disclosure()
        .derive(&unsigned, &reveal_document(), b"nonce-1", &fetcher())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SelectiveDisclosure);
}
