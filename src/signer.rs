//! Signing capabilities.
//!
//! The proof engine never reads private key material; it only asks a
//! [`Signer`] bound to one verification method to sign bytes.

use std::collections::HashMap;

use crate::error::Error;
use crate::jwk::{Algorithm, BLS12381G2_CURVE, JWK};

/// Signs on behalf of one resolved verification method.
pub trait Signer {
    /// Algorithm of the underlying key.
    fn algorithm(&self) -> Algorithm;

    /// The verification method a verifier should use to check signatures.
    fn verification_method(&self) -> String;

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error>;

    /// Sign a list of messages with one multi-message signature.
    ///
    /// Only BBS+ keys support this.
    fn sign_multi(&self, _messages: &[String]) -> Result<Vec<u8>, Error> {
        Err(Error::UnsupportedAlgorithm(self.algorithm().to_string()))
    }
}

impl<S: Signer + ?Sized> Signer for Box<S> {
    fn algorithm(&self) -> Algorithm {
        (**self).algorithm()
    }

    fn verification_method(&self) -> String {
        (**self).verification_method()
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        (**self).sign(data)
    }

    fn sign_multi(&self, messages: &[String]) -> Result<Vec<u8>, Error> {
        (**self).sign_multi(messages)
    }
}

/// A signer holding its key in memory.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    key: JWK,
    verification_method: String,
    algorithm: Algorithm,
}

impl LocalSigner {
    pub fn new(key: JWK, verification_method: impl Into<String>) -> Result<Self, Error> {
        let algorithm = key.get_algorithm().ok_or(Error::UnsupportedKeyType)?;
        Ok(Self {
            key,
            verification_method: verification_method.into(),
            algorithm,
        })
    }

    pub fn public_key(&self) -> JWK {
        self.key.to_public()
    }
}

impl Signer for LocalSigner {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn verification_method(&self) -> String {
        self.verification_method.clone()
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        crate::jws::sign_bytes(self.algorithm, data, &self.key)
    }

    fn sign_multi(&self, messages: &[String]) -> Result<Vec<u8>, Error> {
        if self.algorithm != Algorithm::BLS12381G2 {
            return Err(Error::UnsupportedAlgorithm(self.algorithm.to_string()));
        }
        let pk = self.key.okp_public_key(BLS12381G2_CURVE)?;
        let sk = self.key.okp_private_key(BLS12381G2_CURVE)?;
        crate::bbs::sign(messages, sk, pk)
    }
}

/// Hands out signers for verification methods of the form `did#key`.
pub trait KeyManager {
    fn signer(&self, verification_method: &str) -> Result<Box<dyn Signer>, Error>;
}

/// Split `did#key` into its two parts.
pub fn split_key_id(verification_method: &str) -> Result<(&str, &str), Error> {
    let parts: Vec<&str> = verification_method.split('#').collect();
    match parts.as_slice() {
        [did, key] if !did.is_empty() && !key.is_empty() => Ok((*did, *key)),
        _ => Err(Error::InvalidInput(format!(
            "Verification method must be of the form did#key: {}",
            verification_method
        ))),
    }
}

/// In-memory key store indexed by key name (the fragment of `did#key`).
#[derive(Debug, Clone, Default)]
pub struct LocalKeyManager {
    keys: HashMap<String, JWK>,
}

impl LocalKeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, key: JWK) {
        self.keys.insert(name.into(), key);
    }
}

impl KeyManager for LocalKeyManager {
    fn signer(&self, verification_method: &str) -> Result<Box<dyn Signer>, Error> {
        let (_, name) = split_key_id(verification_method)?;
        let key = self
            .keys
            .get(name)
            .ok_or_else(|| Error::KeyNotFound(name.to_string()))?;
        Ok(Box::new(LocalSigner::new(
            key.clone(),
            verification_method,
        )?))
    }
}
