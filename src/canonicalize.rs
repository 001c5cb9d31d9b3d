//! The two canonicalization modes used by proofs.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::jsonld::{DocumentLoader, Processor};
use crate::logging::Logger;
use crate::urdna2015;

/// How a suite turns a document into signable bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalizationMode {
    PlainJson,
    RdfDataset,
}

/// Deterministic compact JSON (RFC 8785).
pub fn plain_json<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    Ok(serde_jcs::to_string(value)?)
}

/// Expand `document` and canonicalize the resulting dataset, returning its
/// sorted N-Quads lines (each terminated by `\n`).
pub fn rdf_dataset(
    document: &Value,
    loader: &dyn DocumentLoader,
    logger: Logger,
) -> Result<Vec<String>, Error> {
    let dataset = Processor::new(loader, logger).to_rdf(document)?;
    let normalized = urdna2015::normalize(&dataset)?;
    Ok(normalized.to_nquads_lines())
}

/// Like [`rdf_dataset`], but every unlabelled node object of `document` is
/// traced through to its canonical label.
///
/// The returned map goes from JSON path (`""` for the root,
/// `"/credentialSubject"`, `"/items/0"`, ...) to canonical blank node label.
pub fn rdf_dataset_with_paths(
    document: &Value,
    loader: &dyn DocumentLoader,
    logger: Logger,
) -> Result<(Vec<String>, BTreeMap<String, String>), Error> {
    let output = Processor::new(loader, logger).to_rdf_with_paths(document)?;
    let (normalized, canonical_ids) = urdna2015::normalize_with_issuer(&output.dataset)?;
    let paths = output
        .blank_node_ids
        .into_iter()
        .filter_map(|(path, label)| {
            canonical_ids
                .get(&label)
                .map(|canonical| (path, canonical.clone()))
        })
        .collect();
    Ok((normalized.to_nquads_lines(), paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::jsonld::StaticLoader;
    use serde_json::json;

    #[test]
    fn plain_json_sorts_keys() {
        let value = json!({"b": 1, "a": [true, null], "c": {"z": "x", "y": 1.5}});
        assert_eq!(
            plain_json(&value).unwrap(),
            r#"{"a":[true,null],"b":1,"c":{"y":1.5,"z":"x"}}"#
        );
    }

    #[test]
    fn rdf_dataset_is_key_order_independent() {
        let a = json!({
            "@context": {"ex": "http://example.org/"},
            "ex:b": {"ex:name": "one"},
            "ex:a": {"ex:name": "two"}
        });
        let b = json!({
            "@context": {"ex": "http://example.org/"},
            "ex:a": {"ex:name": "two"},
            "ex:b": {"ex:name": "one"}
        });
        let lines_a = rdf_dataset(&a, &StaticLoader, Logger::default()).unwrap();
        let lines_b = rdf_dataset(&b, &StaticLoader, Logger::default()).unwrap();
        assert_eq!(lines_a, lines_b);
        assert_eq!(lines_a.len(), 4);
        assert!(lines_a.iter().all(|l| !l.contains("_:b")));
    }

    #[test]
    fn paths_map_to_canonical_labels() {
        let doc = json!({
            "@context": {"ex": "http://example.org/"},
            "@id": "ex:root",
            "ex:child": {"ex:name": "c"}
        });
        let (lines, paths) =
            rdf_dataset_with_paths(&doc, &StaticLoader, Logger::default()).unwrap();
        assert_eq!(paths.get("/ex:child").map(String::as_str), Some("_:c14n0"));
        assert!(lines.contains(&"_:c14n0 <http://example.org/name> \"c\" .\n".to_string()));
    }

    #[test]
    fn credential_json_to_urdna2015() {
        let credential = json!({
            "@context": [
                "https://www.w3.org/2018/credentials/v1",
                "https://www.w3.org/2018/credentials/examples/v1"
            ],
            "id": "http://example.com/credentials/4643",
            "type": ["VerifiableCredential"],
            "issuer": "https://example.com/issuers/14",
            "issuanceDate": "2018-02-24T05:28:04Z",
            "credentialSubject": {
                "id": "did:example:abcdef1234567",
                "name": "Jane Doe"
            }
        });
        let urdna2015_expected = r#"<did:example:abcdef1234567> <http://schema.org/name> "Jane Doe"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#HTML> .
<http://example.com/credentials/4643> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/2018/credentials#VerifiableCredential> .
<http://example.com/credentials/4643> <https://www.w3.org/2018/credentials#credentialSubject> <did:example:abcdef1234567> .
<http://example.com/credentials/4643> <https://www.w3.org/2018/credentials#issuanceDate> "2018-02-24T05:28:04Z"^^<http://www.w3.org/2001/XMLSchema#dateTime> .
<http://example.com/credentials/4643> <https://www.w3.org/2018/credentials#issuer> <https://example.com/issuers/14> .
"#;
        let lines = rdf_dataset(&credential, &StaticLoader, Logger::default()).unwrap();
        assert_eq!(lines.concat(), urdna2015_expected);
    }

    #[test]
    fn proof_json_to_urdna2015() {
        let proof = json!({
            "@context": [
                "https://w3id.org/security/v1",
                "https://www.w3.org/2018/credentials/v1"
            ],
            "type": "RsaSignature2018",
            "created": "2020-09-03T15:15:39Z",
            "verificationMethod": "https://example.org/foo/1",
            "proofPurpose": "assertionMethod"
        });
        let urdna2015_expected = r#"_:c14n0 <http://purl.org/dc/terms/created> "2020-09-03T15:15:39Z"^^<http://www.w3.org/2001/XMLSchema#dateTime> .
_:c14n0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://w3id.org/security#RsaSignature2018> .
_:c14n0 <https://w3id.org/security#proofPurpose> <https://w3id.org/security#assertionMethod> .
_:c14n0 <https://w3id.org/security#verificationMethod> <https://example.org/foo/1> .
"#;
        let lines = rdf_dataset(&proof, &StaticLoader, Logger::default()).unwrap();
        assert_eq!(lines.concat(), urdna2015_expected);
    }

    #[test]
    fn unknown_context_fails() {
        let doc = json!({"@context": "https://example.org/nope", "name": "x"});
        let err = rdf_dataset(&doc, &StaticLoader, Logger::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Canonicalization);
    }
}
