//! Crypto toolkit: key generation and encoders.
//!
//! Asymmetric pairs come from [`generate_key_pair`], symmetric material
//! from [`generate_secret_key`]. Encoders live in the submodules: PKCS#8
//! PEM ([`pem`]), JWK ([`jwk`]), OpenSSH ([`ssh`]) and JOSE tokens
//! ([`jose`]). All randomness is drawn from the OS RNG.

pub mod fips;
pub mod jose;
pub mod jwk;
pub mod pem;
pub mod ssh;

use std::fmt;

use base64::engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD as BASE64_URL};
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::trace;

use crate::error::CryptoError;

/// A generated or decoded private key.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(rsa::RsaPrivateKey),
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
    Ed25519(ed25519_dalek::SigningKey),
    X25519(x25519_dalek::StaticSecret),
}

/// The public half of a key pair.
#[derive(Clone)]
pub enum PublicKey {
    Rsa(rsa::RsaPublicKey),
    P256(p256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
    Ed25519(ed25519_dalek::VerifyingKey),
    X25519(x25519_dalek::PublicKey),
}

/// Either half of a key pair, as handled by the template encoders.
#[derive(Clone)]
pub enum Key {
    Private(PrivateKey),
    Public(PublicKey),
}

#[derive(Clone, Debug)]
pub struct KeyPair {
    pub private: PrivateKey,
    pub public: PublicKey,
}

impl PrivateKey {
    /// Derive the matching public key.
    pub fn public(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(k) => PublicKey::Rsa(k.to_public_key()),
            PrivateKey::P256(k) => PublicKey::P256(k.public_key()),
            PrivateKey::P384(k) => PublicKey::P384(k.public_key()),
            PrivateKey::P521(k) => PublicKey::P521(k.public_key()),
            PrivateKey::Ed25519(k) => PublicKey::Ed25519(k.verifying_key()),
            PrivateKey::X25519(k) => PublicKey::X25519(x25519_dalek::PublicKey::from(k)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PrivateKey::Rsa(_) => "rsa",
            PrivateKey::P256(_) => "ec:p256",
            PrivateKey::P384(_) => "ec:p384",
            PrivateKey::P521(_) => "ec:p521",
            PrivateKey::Ed25519(_) => "ed25519",
            PrivateKey::X25519(_) => "x25519",
        }
    }
}

impl PublicKey {
    pub fn kind(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => "rsa",
            PublicKey::P256(_) => "ec:p256",
            PublicKey::P384(_) => "ec:p384",
            PublicKey::P521(_) => "ec:p521",
            PublicKey::Ed25519(_) => "ed25519",
            PublicKey::X25519(_) => "x25519",
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.kind())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.kind())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Private(k) => write!(f, "Key::Private({})", k.kind()),
            Key::Public(k) => write!(f, "Key::Public({})", k.kind()),
        }
    }
}

/// Generate an asymmetric key pair.
///
/// Kinds: `rsa`/`rsa:2048`/`rsa:normal`, `rsa:4096`/`rsa:strong`,
/// `ec`/`ec:p256`/`ec:normal`, `ec:p384`/`ec:high`, `ec:p521`/`ec:strong`,
/// `ed25519`/`ssh`, `x25519`/`naclbox`. Ed25519 and X25519 are refused in
/// FIPS mode.
pub fn generate_key_pair(kind: &str) -> Result<KeyPair, CryptoError> {
    let private = match kind {
        "rsa" | "rsa:2048" | "rsa:normal" => PrivateKey::Rsa(
            rsa::RsaPrivateKey::new(&mut OsRng, 2048)
                .map_err(|e| CryptoError::Generate(e.to_string()))?,
        ),
        "rsa:4096" | "rsa:strong" => PrivateKey::Rsa(
            rsa::RsaPrivateKey::new(&mut OsRng, 4096)
                .map_err(|e| CryptoError::Generate(e.to_string()))?,
        ),
        "ec" | "ec:p256" | "ec:normal" => PrivateKey::P256(p256::SecretKey::random(&mut OsRng)),
        "ec:p384" | "ec:high" => PrivateKey::P384(p384::SecretKey::random(&mut OsRng)),
        "ec:p521" | "ec:strong" => PrivateKey::P521(p521::SecretKey::random(&mut OsRng)),
        "ed25519" | "ssh" => {
            fips::guard("ed25519")?;
            PrivateKey::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng))
        }
        "x25519" | "naclbox" => {
            fips::guard("x25519")?;
            PrivateKey::X25519(x25519_dalek::StaticSecret::random_from_rng(OsRng))
        }
        other => return Err(CryptoError::UnsupportedKey(other.to_string())),
    };

    trace!(kind, "generated key pair");
    let public = private.public();
    Ok(KeyPair { private, public })
}

/// Generate symmetric key material.
///
/// `aes:128`/`aes:192`/`aes:256`, `aes:siv` (64 bytes), `secretbox` (32),
/// `chacha20` (32) are returned base64-std encoded; `fernet` uses the
/// fernet library's own encoding.
pub fn generate_secret_key(kind: &str) -> Result<String, CryptoError> {
    let length = match kind {
        "aes:128" => 16,
        "aes:192" => 24,
        "aes:256" => 32,
        "aes:siv" => 64,
        "secretbox" | "chacha20" => 32,
        "fernet" => return Ok(fernet::Fernet::generate_key()),
        other => return Err(CryptoError::UnsupportedKey(other.to_string())),
    };

    let mut buf = vec![0u8; length];
    OsRng.fill_bytes(&mut buf);
    Ok(BASE64.encode(&buf))
}

/// Raw key bytes, base64-std encoded.
///
/// RSA keys have no raw form and are returned as PKCS#8 DER.
pub fn key_to_bytes(key: &Key) -> Result<String, CryptoError> {
    let bytes: Vec<u8> = match key {
        Key::Private(PrivateKey::Rsa(k)) => {
            use pkcs8::EncodePrivateKey;
            k.to_pkcs8_der()
                .map_err(|e| CryptoError::Encode(e.to_string()))?
                .as_bytes()
                .to_vec()
        }
        Key::Private(PrivateKey::P256(k)) => k.to_bytes().to_vec(),
        Key::Private(PrivateKey::P384(k)) => k.to_bytes().to_vec(),
        Key::Private(PrivateKey::P521(k)) => k.to_bytes().to_vec(),
        Key::Private(PrivateKey::Ed25519(k)) => k.to_bytes().to_vec(),
        Key::Private(PrivateKey::X25519(k)) => k.to_bytes().to_vec(),
        Key::Public(PublicKey::Rsa(k)) => {
            use pkcs8::EncodePublicKey;
            k.to_public_key_der()
                .map_err(|e| CryptoError::Encode(e.to_string()))?
                .as_bytes()
                .to_vec()
        }
        Key::Public(PublicKey::P256(k)) => {
            use p256::elliptic_curve::sec1::ToEncodedPoint;
            k.to_encoded_point(false).as_bytes().to_vec()
        }
        Key::Public(PublicKey::P384(k)) => {
            use p384::elliptic_curve::sec1::ToEncodedPoint;
            k.to_encoded_point(false).as_bytes().to_vec()
        }
        Key::Public(PublicKey::P521(k)) => {
            use p521::elliptic_curve::sec1::ToEncodedPoint;
            k.to_encoded_point(false).as_bytes().to_vec()
        }
        Key::Public(PublicKey::Ed25519(k)) => k.to_bytes().to_vec(),
        Key::Public(PublicKey::X25519(k)) => k.to_bytes().to_vec(),
    };
    Ok(BASE64.encode(&bytes))
}

pub(crate) fn b64url(data: impl AsRef<[u8]>) -> String {
    BASE64_URL.encode(data)
}

pub(crate) fn b64url_decode(data: &str) -> Result<Vec<u8>, CryptoError> {
    BASE64_URL
        .decode(data)
        .map_err(|e| CryptoError::Decode(e.to_string()))
}
