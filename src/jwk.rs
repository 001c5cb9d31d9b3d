use std::convert::TryFrom;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};

use crate::error::Error;

// RFC 7517 - JSON Web Key (JWK)
// RFC 7518 - JSON Web Algorithms (JWA)
// RFC 8037 - CFRG ECDH and Signatures in JOSE

pub const ED25519_CURVE: &str = "Ed25519";
pub const BLS12381G2_CURVE: &str = "Bls12381G2";
pub const SECP256K1_CURVE: &str = "secp256k1";
pub const P256_CURVE: &str = "P-256";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JWK {
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_use: Option<String>,
    #[serde(rename = "alg")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    #[serde(rename = "kid")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(flatten)]
    pub params: Params,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kty")]
pub enum Params {
    EC(ECParams),
    OKP(OctetParams),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ECParams {
    // Parameters for Elliptic Curve Public Keys
    #[serde(rename = "crv")]
    pub curve: Option<String>,
    #[serde(rename = "x")]
    pub x_coordinate: Option<Base64urlUInt>,
    #[serde(rename = "y")]
    pub y_coordinate: Option<Base64urlUInt>,

    // Parameters for Elliptic Curve Private Keys
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecc_private_key: Option<Base64urlUInt>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OctetParams {
    // Parameters for Octet Key Pair Public Keys
    #[serde(rename = "crv")]
    pub curve: String,
    #[serde(rename = "x")]
    pub public_key: Base64urlUInt,

    // Parameters for Octet Key Pair Private Keys
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<Base64urlUInt>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "String")]
#[serde(into = "Base64urlUIntString")]
pub struct Base64urlUInt(pub Vec<u8>);
type Base64urlUIntString = String;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    EdDSA,
    ES256,
    ES256K,
    BLS12381G2,
    #[serde(rename = "none")]
    None,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Self::EdDSA => "EdDSA",
            Self::ES256 => "ES256",
            Self::ES256K => "ES256K",
            Self::BLS12381G2 => "BLS12381G2",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

impl From<Params> for JWK {
    fn from(params: Params) -> Self {
        Self {
            public_key_use: None,
            algorithm: None,
            key_id: None,
            params,
        }
    }
}

impl JWK {
    pub fn generate_ed25519() -> Result<JWK, Error> {
        let mut csprng = rand::rngs::OsRng {};
        let secret = ed25519_dalek::SigningKey::generate(&mut csprng);
        Self::ed25519_from_secret(secret.as_bytes())
    }

    /// Ed25519 key pair from a 32-byte secret (RFC 8032 seed).
    pub fn ed25519_from_secret(secret: &[u8]) -> Result<JWK, Error> {
        let secret = <[u8; 32]>::try_from(secret)
            .map_err(|_| Error::InvalidInput("Ed25519 secret key must be 32 bytes".to_string()))?;
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret);
        let public = signing_key.verifying_key();
        Ok(JWK::from(Params::OKP(OctetParams {
            curve: ED25519_CURVE.to_string(),
            public_key: Base64urlUInt(public.as_bytes().to_vec()),
            private_key: Some(Base64urlUInt(secret.to_vec())),
        })))
    }

    pub fn generate_secp256k1() -> Result<JWK, Error> {
        let mut rng = rand::rngs::OsRng {};
        let secret_key = k256::SecretKey::random(&mut rng);
        Self::secp256k1_from_secret(&secret_key.to_bytes())
    }

    pub fn secp256k1_from_secret(secret: &[u8]) -> Result<JWK, Error> {
        let secret_key = k256::SecretKey::from_slice(secret)
            .map_err(|e| Error::InvalidInput(format!("secp256k1 secret key: {}", e)))?;
        let point = secret_key.public_key().to_encoded_point(false);
        Ok(JWK::from(Params::EC(ECParams {
            curve: Some(SECP256K1_CURVE.to_string()),
            x_coordinate: point.x().map(|x| Base64urlUInt(x.to_vec())),
            y_coordinate: point.y().map(|y| Base64urlUInt(y.to_vec())),
            ecc_private_key: Some(Base64urlUInt(secret.to_vec())),
        })))
    }

    pub fn generate_p256() -> Result<JWK, Error> {
        let mut rng = rand::rngs::OsRng {};
        let secret_key = p256::SecretKey::random(&mut rng);
        Self::p256_from_secret(&secret_key.to_bytes())
    }

    pub fn p256_from_secret(secret: &[u8]) -> Result<JWK, Error> {
        let secret_key = p256::SecretKey::from_slice(secret)
            .map_err(|e| Error::InvalidInput(format!("P-256 secret key: {}", e)))?;
        let point = secret_key.public_key().to_encoded_point(false);
        Ok(JWK::from(Params::EC(ECParams {
            curve: Some(P256_CURVE.to_string()),
            x_coordinate: point.x().map(|x| Base64urlUInt(x.to_vec())),
            y_coordinate: point.y().map(|y| Base64urlUInt(y.to_vec())),
            ecc_private_key: Some(Base64urlUInt(secret.to_vec())),
        })))
    }

    /// BLS12-381 G2 key pair for BBS+; deterministic when `seed` is given.
    pub fn generate_bls12381g2(seed: Option<&[u8]>) -> Result<JWK, Error> {
        let (pk, sk) = crate::bbs::generate_keys(seed);
        Ok(JWK::from(Params::OKP(OctetParams {
            curve: BLS12381G2_CURVE.to_string(),
            public_key: Base64urlUInt(pk.to_vec()),
            private_key: Some(Base64urlUInt(sk.to_vec())),
        })))
    }

    pub fn get_algorithm(&self) -> Option<Algorithm> {
        if let Some(algorithm) = self.algorithm {
            return Some(algorithm);
        }
        match &self.params {
            Params::OKP(okp_params) if okp_params.curve == ED25519_CURVE => Some(Algorithm::EdDSA),
            Params::OKP(okp_params) if okp_params.curve == BLS12381G2_CURVE => {
                Some(Algorithm::BLS12381G2)
            }
            Params::EC(ec_params) => match ec_params.curve.as_deref() {
                Some(SECP256K1_CURVE) => Some(Algorithm::ES256K),
                Some(P256_CURVE) => Some(Algorithm::ES256),
                _ => None,
            },
            _ => None,
        }
    }

    /// Strip private key material
    pub fn to_public(&self) -> Self {
        let mut key = self.clone();
        match &mut key.params {
            Params::EC(ec) => ec.ecc_private_key = None,
            Params::OKP(okp) => okp.private_key = None,
        }
        key
    }

    /// Compare by public key properties only.
    pub fn equals_public(&self, other: &JWK) -> bool {
        match (&self.params, &other.params) {
            (Params::OKP(a), Params::OKP(b)) => a.curve == b.curve && a.public_key == b.public_key,
            (Params::EC(a), Params::EC(b)) => {
                a.curve == b.curve
                    && a.x_coordinate == b.x_coordinate
                    && a.y_coordinate == b.y_coordinate
            }
            _ => false,
        }
    }

    /// Build a public key from the raw key bytes of a verification method,
    /// e.g. a decoded `publicKeyBase58`.
    pub fn from_vm_type(type_: &str, pk_bytes: &[u8]) -> Result<Self, Error> {
        match type_ {
            "Ed25519VerificationKey2018" | "Ed25519VerificationKey2020" => ed25519_parse(pk_bytes),
            "EcdsaSecp256k1VerificationKey2019" => secp256k1_parse(pk_bytes),
            "EcdsaSecp256r1VerificationKey2019" => p256_parse(pk_bytes),
            "Bls12381G2Key2020" => {
                if pk_bytes.len() != crate::bbs::PUBLIC_KEY_SIZE {
                    return Err(Error::InvalidInput(
                        "BLS12-381 G2 public key must be 96 bytes".to_string(),
                    ));
                }
                Ok(Self::from(Params::OKP(OctetParams {
                    curve: BLS12381G2_CURVE.to_string(),
                    public_key: Base64urlUInt(pk_bytes.to_vec()),
                    private_key: None,
                })))
            }
            _ => Err(Error::UnsupportedKeyType),
        }
    }

    /// Raw public key bytes of an octet key pair.
    pub(crate) fn okp_public_key(&self, curve: &str) -> Result<&[u8], Error> {
        match &self.params {
            Params::OKP(okp) if okp.curve == curve => Ok(&okp.public_key.0),
            Params::OKP(okp) => Err(Error::CurveNotImplemented(okp.curve.clone())),
            _ => Err(Error::UnsupportedKeyType),
        }
    }

    pub(crate) fn okp_private_key(&self, curve: &str) -> Result<&[u8], Error> {
        match &self.params {
            Params::OKP(okp) if okp.curve == curve => okp
                .private_key
                .as_ref()
                .map(|d| d.0.as_slice())
                .ok_or(Error::MissingPrivateKey),
            Params::OKP(okp) => Err(Error::CurveNotImplemented(okp.curve.clone())),
            _ => Err(Error::UnsupportedKeyType),
        }
    }
}

pub fn ed25519_parse(data: &[u8]) -> Result<JWK, Error> {
    let public_key = ed25519_dalek::VerifyingKey::try_from(data)
        .map_err(|e| Error::InvalidInput(format!("Ed25519 public key: {}", e)))?;
    Ok(JWK::from(Params::OKP(OctetParams {
        curve: ED25519_CURVE.to_string(),
        public_key: Base64urlUInt(public_key.as_bytes().to_vec()),
        private_key: None,
    })))
}

pub fn secp256k1_parse(data: &[u8]) -> Result<JWK, Error> {
    let public_key = k256::PublicKey::from_sec1_bytes(data)
        .map_err(|e| Error::InvalidInput(format!("secp256k1 public key: {}", e)))?;
    let point = public_key.to_encoded_point(false);
    Ok(JWK::from(Params::EC(ECParams {
        curve: Some(SECP256K1_CURVE.to_string()),
        x_coordinate: point.x().map(|x| Base64urlUInt(x.to_vec())),
        y_coordinate: point.y().map(|y| Base64urlUInt(y.to_vec())),
        ecc_private_key: None,
    })))
}

pub fn p256_parse(data: &[u8]) -> Result<JWK, Error> {
    let public_key = p256::PublicKey::from_sec1_bytes(data)
        .map_err(|e| Error::InvalidInput(format!("P-256 public key: {}", e)))?;
    let point = public_key.to_encoded_point(false);
    Ok(JWK::from(Params::EC(ECParams {
        curve: Some(P256_CURVE.to_string()),
        x_coordinate: point.x().map(|x| Base64urlUInt(x.to_vec())),
        y_coordinate: point.y().map(|y| Base64urlUInt(y.to_vec())),
        ecc_private_key: None,
    })))
}

impl ECParams {
    /// Uncompressed SEC1 encoding of the public point.
    pub(crate) fn sec1_bytes(&self) -> Result<Vec<u8>, Error> {
        let x = self.x_coordinate.as_ref().ok_or(Error::Missing("x"))?;
        let y = self.y_coordinate.as_ref().ok_or(Error::Missing("y"))?;
        Ok([&[0x04][..], &x.0, &y.0].concat())
    }
}

impl TryFrom<&ECParams> for k256::SecretKey {
    type Error = Error;
    fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
        let private_key = params
            .ecc_private_key
            .as_ref()
            .ok_or(Error::MissingPrivateKey)?;
        k256::SecretKey::from_slice(&private_key.0)
            .map_err(|e| Error::InvalidInput(format!("secp256k1 secret key: {}", e)))
    }
}

impl TryFrom<&ECParams> for k256::PublicKey {
    type Error = Error;
    fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
        k256::PublicKey::from_sec1_bytes(&params.sec1_bytes()?)
            .map_err(|e| Error::InvalidInput(format!("secp256k1 public key: {}", e)))
    }
}

impl TryFrom<&ECParams> for p256::SecretKey {
    type Error = Error;
    fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
        let private_key = params
            .ecc_private_key
            .as_ref()
            .ok_or(Error::MissingPrivateKey)?;
        p256::SecretKey::from_slice(&private_key.0)
            .map_err(|e| Error::InvalidInput(format!("P-256 secret key: {}", e)))
    }
}

impl TryFrom<&ECParams> for p256::PublicKey {
    type Error = Error;
    fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
        p256::PublicKey::from_sec1_bytes(&params.sec1_bytes()?)
            .map_err(|e| Error::InvalidInput(format!("P-256 public key: {}", e)))
    }
}

impl TryFrom<&OctetParams> for ed25519_dalek::SigningKey {
    type Error = Error;
    fn try_from(params: &OctetParams) -> Result<Self, Self::Error> {
        if params.curve != ED25519_CURVE {
            return Err(Error::CurveNotImplemented(params.curve.clone()));
        }
        let private_key = params
            .private_key
            .as_ref()
            .ok_or(Error::MissingPrivateKey)?;
        let secret = <[u8; 32]>::try_from(private_key.0.as_slice())
            .map_err(|_| Error::InvalidInput("Ed25519 secret key must be 32 bytes".to_string()))?;
        Ok(ed25519_dalek::SigningKey::from_bytes(&secret))
    }
}

impl TryFrom<&OctetParams> for ed25519_dalek::VerifyingKey {
    type Error = Error;
    fn try_from(params: &OctetParams) -> Result<Self, Self::Error> {
        if params.curve != ED25519_CURVE {
            return Err(Error::CurveNotImplemented(params.curve.clone()));
        }
        ed25519_dalek::VerifyingKey::try_from(params.public_key.0.as_slice())
            .map_err(|e| Error::InvalidInput(format!("Ed25519 public key: {}", e)))
    }
}

impl TryFrom<String> for Base64urlUInt {
    type Error = Error;
    fn try_from(data: String) -> Result<Self, Self::Error> {
        Ok(Base64urlUInt(base64::decode_config(data, base64::URL_SAFE)?))
    }
}

impl From<&Base64urlUInt> for String {
    fn from(data: &Base64urlUInt) -> String {
        base64::encode_config(&data.0, base64::URL_SAFE_NO_PAD)
    }
}

impl From<Base64urlUInt> for Base64urlUIntString {
    fn from(data: Base64urlUInt) -> Base64urlUIntString {
        String::from(&data)
    }
}
