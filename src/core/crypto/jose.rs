//! Compact JWS signing and passphrase-based JWE.
//!
//! JWS headers carry only `alg`, chosen from the key type. JWE uses
//! PBES2-HS256+A128KW key wrapping with A128GCM content encryption,
//! which keeps tokens portable across stacks without any shared key
//! material beyond the passphrase.

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes128Gcm, KeyInit, Nonce};
use rand::RngCore;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use signature::Signer;
use zeroize::Zeroizing;

use super::{b64url, b64url_decode, fips, PrivateKey};
use crate::error::CryptoError;

const JWE_ALG: &str = "PBES2-HS256+A128KW";
const JWE_ENC: &str = "A128GCM";
const PBES2_ROUNDS: u32 = 8192;
const PBES2_SALT_LEN: usize = 16;

/// Sign a payload as a compact JWS, picking the algorithm from the key.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedKey`] for keys with no JWS
/// algorithm, and [`CryptoError::FipsRefused`] for Ed25519 keys while
/// FIPS mode is active.
pub fn sign(payload: &[u8], key: &PrivateKey) -> Result<String, CryptoError> {
    let alg = match key {
        PrivateKey::Rsa(_) => "RS256",
        PrivateKey::P256(_) => "ES256",
        PrivateKey::P384(_) => "ES384",
        PrivateKey::P521(_) => "ES512",
        PrivateKey::Ed25519(_) => {
            fips::guard("ed25519")?;
            "EdDSA"
        }
        PrivateKey::X25519(_) => {
            return Err(CryptoError::UnsupportedKey("x25519".to_string()))
        }
    };

    let header = b64url(serde_json::to_vec(&json!({ "alg": alg })).map_err(sign_err)?);
    let signing_input = format!("{header}.{}", b64url(payload));

    let signature = match key {
        PrivateKey::Rsa(k) => {
            let digest = Sha256::digest(signing_input.as_bytes());
            k.sign(rsa::Pkcs1v15Sign::new::<Sha256>(), &digest)
                .map_err(sign_err)?
        }
        PrivateKey::P256(k) => {
            let signer = p256::ecdsa::SigningKey::from(k);
            let sig: p256::ecdsa::Signature = signer.sign(signing_input.as_bytes());
            sig.to_bytes().to_vec()
        }
        PrivateKey::P384(k) => {
            let signer = p384::ecdsa::SigningKey::from(k);
            let sig: p384::ecdsa::Signature = signer.sign(signing_input.as_bytes());
            sig.to_bytes().to_vec()
        }
        PrivateKey::P521(k) => {
            let signer = p521::ecdsa::SigningKey::from_bytes(&k.to_bytes()).map_err(sign_err)?;
            let sig: p521::ecdsa::Signature = signer.sign(signing_input.as_bytes());
            sig.to_bytes().to_vec()
        }
        PrivateKey::Ed25519(k) => k.sign(signing_input.as_bytes()).to_bytes().to_vec(),
        PrivateKey::X25519(_) => unreachable!(),
    };

    Ok(format!("{signing_input}.{}", b64url(signature)))
}

/// Encrypt a payload as a compact JWE under a passphrase.
pub fn encrypt(passphrase: &str, payload: &[u8]) -> Result<String, CryptoError> {
    let mut salt = [0u8; PBES2_SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let header = json!({
        "alg": JWE_ALG,
        "enc": JWE_ENC,
        "p2c": PBES2_ROUNDS,
        "p2s": b64url(salt),
    });
    let header = b64url(serde_json::to_vec(&header).map_err(encrypt_err)?);

    let kek = derive_kek(passphrase, &salt, PBES2_ROUNDS);

    let mut cek = Zeroizing::new([0u8; 16]);
    rand::rngs::OsRng.fill_bytes(cek.as_mut());
    let mut wrapped = [0u8; 24];
    aes_kw::KekAes128::from(*kek)
        .wrap(cek.as_ref(), &mut wrapped)
        .map_err(encrypt_err)?;

    let mut iv = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    // The protected header doubles as the AAD, per RFC 7516 §5.1.
    let mut ciphertext = payload.to_vec();
    let tag = Aes128Gcm::new((&*cek).into())
        .encrypt_in_place_detached(Nonce::from_slice(&iv), header.as_bytes(), &mut ciphertext)
        .map_err(encrypt_err)?;

    Ok(format!(
        "{header}.{}.{}.{}.{}",
        b64url(wrapped),
        b64url(iv),
        b64url(ciphertext),
        b64url(tag)
    ))
}

/// Decrypt a compact JWE produced by [`encrypt`].
pub fn decrypt(passphrase: &str, token: &str) -> Result<Vec<u8>, CryptoError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header_b64, wrapped, iv, ciphertext, tag] = parts.as_slice() else {
        return Err(decrypt_err("token is not a five-part compact jwe"));
    };

    let header: Value =
        serde_json::from_slice(&b64url_decode(header_b64)?).map_err(decrypt_err)?;
    if header["alg"] != JWE_ALG || header["enc"] != JWE_ENC {
        return Err(decrypt_err("unexpected jwe algorithm or encryption"));
    }
    let rounds = header["p2c"]
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| decrypt_err("missing p2c"))?;
    let salt = b64url_decode(
        header["p2s"]
            .as_str()
            .ok_or_else(|| decrypt_err("missing p2s"))?,
    )?;

    let kek = derive_kek(passphrase, &salt, rounds);

    let wrapped = b64url_decode(wrapped)?;
    if wrapped.len() != 24 {
        return Err(decrypt_err("wrapped key has the wrong length"));
    }
    let mut cek = Zeroizing::new([0u8; 16]);
    aes_kw::KekAes128::from(*kek)
        .unwrap(&wrapped, cek.as_mut())
        .map_err(decrypt_err)?;

    let iv = b64url_decode(iv)?;
    if iv.len() != 12 {
        return Err(decrypt_err("iv has the wrong length"));
    }
    let tag = b64url_decode(tag)?;
    if tag.len() != 16 {
        return Err(decrypt_err("tag has the wrong length"));
    }

    let mut plaintext = b64url_decode(ciphertext)?;
    Aes128Gcm::new((&*cek).into())
        .decrypt_in_place_detached(
            Nonce::from_slice(&iv),
            header_b64.as_bytes(),
            &mut plaintext,
            aes_gcm::Tag::from_slice(&tag),
        )
        .map_err(decrypt_err)?;
    Ok(plaintext)
}

/// PBES2 salt input is `alg || 0x00 || p2s` (RFC 7518 §8.8).
fn derive_kek(passphrase: &str, p2s: &[u8], rounds: u32) -> Zeroizing<[u8; 16]> {
    let mut salt = Vec::with_capacity(JWE_ALG.len() + 1 + p2s.len());
    salt.extend_from_slice(JWE_ALG.as_bytes());
    salt.push(0);
    salt.extend_from_slice(p2s);

    let mut kek = Zeroizing::new([0u8; 16]);
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), &salt, rounds, kek.as_mut());
    kek
}

fn sign_err(e: impl std::fmt::Display) -> CryptoError {
    CryptoError::Sign(e.to_string())
}

fn encrypt_err(e: impl std::fmt::Display) -> CryptoError {
    CryptoError::Encrypt(e.to_string())
}

fn decrypt_err(e: impl std::fmt::Display) -> CryptoError {
    CryptoError::Decrypt(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crypto::{generate_key_pair, PublicKey};

    fn header_alg(token: &str) -> String {
        let header = token.split('.').next().unwrap();
        let header: Value = serde_json::from_slice(&b64url_decode(header).unwrap()).unwrap();
        header["alg"].as_str().unwrap().to_string()
    }

    #[test]
    fn algorithm_follows_key_type() {
        for (kind, alg) in [
            ("ec", "ES256"),
            ("ec:p384", "ES384"),
            ("ec:p521", "ES512"),
            ("ed25519", "EdDSA"),
        ] {
            let pair = generate_key_pair(kind).unwrap();
            let token = sign(b"claims", &pair.private).unwrap();
            assert_eq!(header_alg(&token), alg, "kind {kind}");
            assert_eq!(token.split('.').count(), 3);
        }
    }

    #[test]
    fn rsa_signatures_verify() {
        let pair = generate_key_pair("rsa").unwrap();
        let token = sign(b"claims", &pair.private).unwrap();
        assert_eq!(header_alg(&token), "RS256");

        let parts: Vec<&str> = token.split('.').collect();
        let signing_input = format!("{}.{}", parts[0], parts[1]);
        let digest = Sha256::digest(signing_input.as_bytes());
        let signature = b64url_decode(parts[2]).unwrap();
        let PublicKey::Rsa(public) = pair.public else {
            panic!("expected an rsa public key");
        };
        public
            .verify(rsa::Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
            .unwrap();
    }

    #[test]
    fn x25519_cannot_sign() {
        let pair = generate_key_pair("x25519").unwrap();
        assert!(matches!(
            sign(b"claims", &pair.private),
            Err(CryptoError::UnsupportedKey(_))
        ));
    }

    #[test]
    fn jwe_round_trip() {
        let token = encrypt("correct horse battery staple", b"top secret").unwrap();
        assert_eq!(token.split('.').count(), 5);
        let plain = decrypt("correct horse battery staple", &token).unwrap();
        assert_eq!(plain, b"top secret");
    }

    #[test]
    fn jwe_rejects_wrong_passphrase() {
        let token = encrypt("one", b"payload").unwrap();
        assert!(decrypt("two", &token).is_err());
    }

    #[test]
    fn jwe_rejects_malformed_tokens() {
        assert!(decrypt("pw", "a.b.c").is_err());
    }
}
