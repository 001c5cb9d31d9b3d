//! Proofs for [Verifiable Credentials][vc-data-model].
//!
//! This crate signs, verifies and selectively discloses credentials and
//! presentations:
//! - [linked data proofs][ld-proofs] embedded in the document, computed over
//!   its canonical RDF dataset, with the `Ed25519Signature2018`,
//!   `JsonWebSignature2020` and `BbsBlsSignature2020` suites;
//! - credentials encoded as [JSON Web Tokens][jwt];
//! - BBS+ selective disclosure, deriving a `BbsBlsSignatureProof2020` that
//!   reveals only part of a signed credential.
//!
//! Private keys stay behind the [`Signer`] and [`KeyManager`] capabilities;
//! verification keys come from a [`PublicKeyFetcher`]. JSON-LD contexts are
//! loaded through a [`DocumentLoader`], and every component logs through
//! the [`Logger`] it was built with.
//!
//! [vc-data-model]: <https://www.w3.org/TR/vc-data-model/>
//! [ld-proofs]: <https://w3c-ccg.github.io/ld-proofs/>
//! [jwt]: <https://www.rfc-editor.org/rfc/rfc7519>

pub mod bbs;
pub mod canonicalize;
pub mod did;
pub mod error;
pub mod hash;
pub mod holder;
pub mod jsonld;
pub mod jwk;
pub mod jws;
pub mod jwt;
pub mod ldp;
pub mod logging;
pub mod one_or_many;
pub mod proof;
pub mod rdf;
pub mod selective_disclosure;
pub mod signer;
pub mod suites;
pub mod urdna2015;
pub mod vc;

pub use did::{DIDResolver, Document, IdentityDocument, ResolverKeyFetcher};
pub use error::{Error, ErrorKind};
pub use holder::{Holder, PresentationInput};
pub use jsonld::{DocumentLoader, StaticLoader};
pub use jwk::JWK;
pub use jwt::ProofCheck;
pub use ldp::{LinkedDataDocument, LinkedDataProofs, PublicKeyFetcher};
pub use logging::Logger;
pub use one_or_many::OneOrMany;
pub use proof::{Proof, ProofOptions, ProofPurpose};
pub use selective_disclosure::SelectiveDisclosure;
pub use signer::{KeyManager, LocalKeyManager, LocalSigner, Signer};
pub use suites::ProofSuiteType;
pub use vc::{Credential, Presentation};
