//! BBS+ signatures over BLS12-381, wrapping the `bbs` crate.
//!
//! Keys are carried as raw bytes: a 96-byte compressed G2 public key and a
//! 32-byte secret scalar. The per-message generators are derived from the
//! public key for the message count at hand.

use std::collections::{BTreeMap, BTreeSet};
use std::convert::TryFrom;

use bbs::prelude::*;

use crate::error::Error;

pub const PUBLIC_KEY_SIZE: usize = 96;
pub const SECRET_KEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 112;

fn signing_error(err: BBSError) -> Error {
    Error::Signing(format!("{:?}", err))
}

fn verification_error(err: BBSError) -> Error {
    Error::Verification(format!("{:?}", err))
}

/// Generate a key pair, deterministically when a seed is given.
pub fn generate_keys(seed: Option<&[u8]>) -> ([u8; PUBLIC_KEY_SIZE], [u8; SECRET_KEY_SIZE]) {
    let option = seed.map(|seed| KeyGenOption::UseSeed(seed.to_vec()));
    let (dpk, sk) = Issuer::new_short_keys(option);
    (dpk.to_bytes_compressed_form(), sk.to_bytes_compressed_form())
}

fn public_key(bytes: &[u8], message_count: usize) -> Result<PublicKey, Error> {
    let bytes = <[u8; PUBLIC_KEY_SIZE]>::try_from(bytes).map_err(|_| {
        Error::InvalidInput(format!(
            "BLS12-381 G2 public key must be {} bytes",
            PUBLIC_KEY_SIZE
        ))
    })?;
    DeterministicPublicKey::from(bytes)
        .to_public_key(message_count)
        .map_err(verification_error)
}

fn secret_key(bytes: &[u8]) -> Result<SecretKey, Error> {
    let bytes = <[u8; SECRET_KEY_SIZE]>::try_from(bytes).map_err(|_| {
        Error::InvalidInput(format!(
            "BLS12-381 secret key must be {} bytes",
            SECRET_KEY_SIZE
        ))
    })?;
    Ok(SecretKey::from(bytes))
}

fn signature(bytes: &[u8]) -> Result<Signature, Error> {
    let bytes = <[u8; SIGNATURE_SIZE]>::try_from(bytes).map_err(|_| Error::InvalidSignature)?;
    Ok(Signature::from(bytes))
}

fn hash_messages<M: AsRef<[u8]>>(messages: &[M]) -> Vec<SignatureMessage> {
    messages
        .iter()
        .map(|m| SignatureMessage::hash(m.as_ref()))
        .collect()
}

/// Sign every message individually with one signature.
pub fn sign<M: AsRef<[u8]>>(
    messages: &[M],
    secret_key_bytes: &[u8],
    public_key_bytes: &[u8],
) -> Result<Vec<u8>, Error> {
    if messages.is_empty() {
        return Err(Error::InvalidInput("No messages to sign".to_string()));
    }
    let pk = public_key(public_key_bytes, messages.len())?;
    let sk = secret_key(secret_key_bytes)?;
    let signature =
        Signature::new(&hash_messages(messages), &sk, &pk).map_err(signing_error)?;
    Ok(signature.to_bytes_compressed_form().to_vec())
}

pub fn verify<M: AsRef<[u8]>>(
    messages: &[M],
    signature_bytes: &[u8],
    public_key_bytes: &[u8],
) -> Result<(), Error> {
    let pk = public_key(public_key_bytes, messages.len())?;
    let signature = signature(signature_bytes)?;
    match signature.verify(&hash_messages(messages), &pk) {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::InvalidSignature),
        Err(err) => Err(verification_error(err)),
    }
}

/// Derive a proof of knowledge of `signature_bytes` that discloses only the
/// messages at `revealed`.
///
/// Encoding: message count (u16, big endian), revealed bitmap (most
/// significant bit first, one bit per message), compressed proof.
pub fn derive_proof<M: AsRef<[u8]>>(
    messages: &[M],
    signature_bytes: &[u8],
    public_key_bytes: &[u8],
    revealed: &BTreeSet<usize>,
    nonce: &[u8],
) -> Result<Vec<u8>, Error> {
    let count = u16::try_from(messages.len())
        .map_err(|_| Error::SelectiveDisclosure("Too many statements".to_string()))?;
    if let Some(index) = revealed.iter().find(|i| **i >= messages.len()) {
        return Err(Error::SelectiveDisclosure(format!(
            "Revealed statement index out of range: {}",
            index
        )));
    }
    let pk = public_key(public_key_bytes, messages.len())?;
    let signature = signature(signature_bytes)?;
    let revealed_indices: Vec<usize> = revealed.iter().copied().collect();
    let request = Verifier::new_proof_request(&revealed_indices, &pk)
        .map_err(|err| Error::SelectiveDisclosure(format!("{:?}", err)))?;
    let proof_messages: Vec<ProofMessage> = hash_messages(messages)
        .into_iter()
        .enumerate()
        .map(|(i, message)| {
            if revealed.contains(&i) {
                ProofMessage::Revealed(message)
            } else {
                ProofMessage::Hidden(HiddenMessage::ProofSpecificBlinding(message))
            }
        })
        .collect();
    let pok = Prover::commit_signature_pok(&request, proof_messages.as_slice(), &signature)
        .map_err(|err| Error::SelectiveDisclosure(format!("{:?}", err)))?;
    let nonce = ProofNonce::hash(nonce);
    let mut challenge_bytes = pok.to_bytes();
    challenge_bytes.extend_from_slice(&nonce.to_bytes_uncompressed_form()[..]);
    let challenge = ProofChallenge::hash(&challenge_bytes);
    let proof = Prover::generate_signature_pok(pok, &challenge)
        .map_err(|err| Error::SelectiveDisclosure(format!("{:?}", err)))?;

    let mut encoded = count.to_be_bytes().to_vec();
    encoded.extend(encode_bitmap(messages.len(), revealed));
    encoded.extend(proof.proof.to_bytes_compressed_form());
    Ok(encoded)
}

/// Revealed message indices recorded in a derived proof.
pub fn revealed_indices(proof_bytes: &[u8]) -> Result<(usize, BTreeSet<usize>), Error> {
    let (count, revealed, _) = split_proof(proof_bytes)?;
    Ok((count, revealed))
}

/// Verify a derived proof given the disclosed messages, in index order.
pub fn verify_proof<M: AsRef<[u8]>>(
    proof_bytes: &[u8],
    revealed_messages: &[M],
    public_key_bytes: &[u8],
    nonce: &[u8],
) -> Result<(), Error> {
    let (count, revealed, pok_bytes) = split_proof(proof_bytes)?;
    if revealed.len() != revealed_messages.len() {
        return Err(Error::Verification(format!(
            "Expected {} disclosed statements, found {}",
            revealed.len(),
            revealed_messages.len()
        )));
    }
    let pk = public_key(public_key_bytes, count)?;
    let revealed_indices: Vec<usize> = revealed.iter().copied().collect();
    let request =
        Verifier::new_proof_request(&revealed_indices, &pk).map_err(verification_error)?;
    let proof =
        PoKOfSignatureProof::from_bytes_compressed_form(pok_bytes).map_err(verification_error)?;
    let revealed_messages: BTreeMap<usize, SignatureMessage> = revealed_indices
        .into_iter()
        .zip(hash_messages(revealed_messages))
        .collect();
    let signature_proof = SignatureProof {
        revealed_messages,
        proof,
    };
    Verifier::verify_signature_pok(&request, &signature_proof, &ProofNonce::hash(nonce))
        .map_err(verification_error)?;
    Ok(())
}

fn encode_bitmap(count: usize, revealed: &BTreeSet<usize>) -> Vec<u8> {
    let mut bitmap = vec![0u8; (count + 7) / 8];
    for index in revealed {
        bitmap[index / 8] |= 0x80 >> (index % 8);
    }
    bitmap
}

fn split_proof(proof_bytes: &[u8]) -> Result<(usize, BTreeSet<usize>, &[u8]), Error> {
    if proof_bytes.len() < 2 {
        return Err(Error::InvalidSignature);
    }
    let count = u16::from_be_bytes([proof_bytes[0], proof_bytes[1]]) as usize;
    let bitmap_len = (count + 7) / 8;
    let bitmap = proof_bytes
        .get(2..2 + bitmap_len)
        .ok_or(Error::InvalidSignature)?;
    let revealed = (0..count)
        .filter(|i| bitmap[i / 8] & (0x80 >> (i % 8)) != 0)
        .collect();
    Ok((count, revealed, &proof_bytes[2 + bitmap_len..]))
}
