/// Broad classification of [`Error`] values.
///
/// Callers translating failures into a transport representation should match
/// on the kind rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedSuite,
    NoMatchingVerificationMethod,
    NoPublicKeyFound,
    Canonicalization,
    Signing,
    Verification,
    SelectiveDisclosure,
}

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Expected a JSON object")]
    ExpectedJsonObject,
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Unsupported key type")]
    UnsupportedKeyType,
    #[error("Curve not implemented: {0}")]
    CurveNotImplemented(String),
    #[error("Signature type unsupported: {0}")]
    UnsupportedSuite(String),
    #[error("No verification method found for id {0}")]
    NoMatchingVerificationMethod(String),
    #[error("Public key not found in identity document")]
    NoPublicKeyFound,
    #[error("Identity document not found: {0}")]
    DocumentNotFound(String),
    #[error("Unable to load context {0}")]
    LoadContext(String),
    #[error("Canonicalization failed: {0}")]
    Canonicalization(String),
    #[error("Missing private key")]
    MissingPrivateKey,
    #[error("Key not found: {0}")]
    KeyNotFound(String),
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Proof with verification method {verification_method} failed: {source}")]
    ProofVerification {
        verification_method: String,
        #[source]
        source: Box<Error>,
    },
    #[error("Selective disclosure failed: {0}")]
    SelectiveDisclosure(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Base58(#[from] bs58::decode::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_)
            | Self::ExpectedJsonObject
            | Self::Missing(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::UnsupportedKeyType
            | Self::CurveNotImplemented(_)
            | Self::Json(_)
            | Self::Base64(_)
            | Self::Base58(_) => ErrorKind::InvalidInput,
            Self::UnsupportedSuite(_) => ErrorKind::UnsupportedSuite,
            Self::NoMatchingVerificationMethod(_) => ErrorKind::NoMatchingVerificationMethod,
            Self::NoPublicKeyFound => ErrorKind::NoPublicKeyFound,
            Self::LoadContext(_) | Self::Canonicalization(_) => ErrorKind::Canonicalization,
            Self::MissingPrivateKey | Self::KeyNotFound(_) | Self::Signing(_) => {
                ErrorKind::Signing
            }
            Self::InvalidSignature
            | Self::Verification(_)
            | Self::DocumentNotFound(_)
            | Self::ProofVerification { .. } => ErrorKind::Verification,
            Self::SelectiveDisclosure(_) => ErrorKind::SelectiveDisclosure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proof_failure_reports_method() {
        let err = Error::ProofVerification {
            verification_method: "did:example:123#key2".to_string(),
            source: Box::new(Error::InvalidSignature),
        };
        assert_eq!(err.kind(), ErrorKind::Verification);
        assert!(err.to_string().contains("did:example:123#key2"));
    }

    #[test]
    fn decode_errors_are_invalid_input() {
        let err: Error = base64::decode("%%%").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
