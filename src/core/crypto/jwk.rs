//! JWK (RFC 7517) encoding and decoding.
//!
//! Every emitted JWK carries a deterministic `kid`: the base64url of the
//! RFC 7638 thumbprint hashed with SHA-512/256.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha512_256};

use super::{b64url, b64url_decode, fips, Key, PrivateKey, PublicKey};
use crate::error::CryptoError;

fn enc(e: impl std::fmt::Display) -> CryptoError {
    CryptoError::Encode(e.to_string())
}

fn dec(e: impl std::fmt::Display) -> CryptoError {
    CryptoError::Decode(e.to_string())
}

/// Encode a key as a JWK JSON document.
pub fn encode(key: &Key) -> Result<String, CryptoError> {
    let mut jwk = match key {
        Key::Private(private) => private_members(private)?,
        Key::Public(public) => public_members(public)?,
    };
    let kid = thumbprint(&jwk)?;
    jwk.insert("kid".to_string(), Value::String(kid));
    serde_json::to_string(&Value::Object(jwk)).map_err(enc)
}

/// Decode a JWK JSON document into a key.
pub fn decode(input: &str) -> Result<Key, CryptoError> {
    let jwk: Value = serde_json::from_str(input).map_err(dec)?;
    let kty = member(&jwk, "kty")?;
    let has_private = jwk.get("d").is_some();

    match kty {
        "RSA" => decode_rsa(&jwk, has_private),
        "EC" => decode_ec(&jwk, has_private),
        "OKP" => decode_okp(&jwk, has_private),
        other => Err(CryptoError::UnsupportedKey(other.to_string())),
    }
}

fn private_members(key: &PrivateKey) -> Result<Map<String, Value>, CryptoError> {
    use rsa::traits::{PrivateKeyParts, PublicKeyParts};

    let jwk = match key {
        PrivateKey::Rsa(k) => {
            let primes = k.primes();
            if primes.len() < 2 {
                return Err(enc("rsa key is missing prime factors"));
            }
            json!({
                "kty": "RSA",
                "n": b64url(k.n().to_bytes_be()),
                "e": b64url(k.e().to_bytes_be()),
                "d": b64url(k.d().to_bytes_be()),
                "p": b64url(primes[0].to_bytes_be()),
                "q": b64url(primes[1].to_bytes_be()),
            })
        }
        PrivateKey::P256(k) => ec_members("P-256", &point_bytes_p256(&k.public_key()), Some(k.to_bytes().to_vec()))?,
        PrivateKey::P384(k) => ec_members("P-384", &point_bytes_p384(&k.public_key()), Some(k.to_bytes().to_vec()))?,
        PrivateKey::P521(k) => ec_members("P-521", &point_bytes_p521(&k.public_key()), Some(k.to_bytes().to_vec()))?,
        PrivateKey::Ed25519(k) => {
            fips::guard("ed25519")?;
            json!({
                "kty": "OKP",
                "crv": "Ed25519",
                "x": b64url(k.verifying_key().to_bytes()),
                "d": b64url(k.to_bytes()),
            })
        }
        PrivateKey::X25519(k) => {
            fips::guard("x25519")?;
            json!({
                "kty": "OKP",
                "crv": "X25519",
                "x": b64url(x25519_dalek::PublicKey::from(k).to_bytes()),
                "d": b64url(k.to_bytes()),
            })
        }
    };

    as_map(jwk)
}

fn public_members(key: &PublicKey) -> Result<Map<String, Value>, CryptoError> {
    use rsa::traits::PublicKeyParts;

    let jwk = match key {
        PublicKey::Rsa(k) => json!({
            "kty": "RSA",
            "n": b64url(k.n().to_bytes_be()),
            "e": b64url(k.e().to_bytes_be()),
        }),
        PublicKey::P256(k) => ec_members("P-256", &point_bytes_p256(k), None)?,
        PublicKey::P384(k) => ec_members("P-384", &point_bytes_p384(k), None)?,
        PublicKey::P521(k) => ec_members("P-521", &point_bytes_p521(k), None)?,
        PublicKey::Ed25519(k) => {
            fips::guard("ed25519")?;
            json!({
                "kty": "OKP",
                "crv": "Ed25519",
                "x": b64url(k.to_bytes()),
            })
        }
        PublicKey::X25519(k) => {
            fips::guard("x25519")?;
            json!({
                "kty": "OKP",
                "crv": "X25519",
                "x": b64url(k.to_bytes()),
            })
        }
    };

    as_map(jwk)
}

/// Uncompressed SEC1 point, split into (x, y) halves of equal width.
fn ec_members(curve: &str, point: &[u8], d: Option<Vec<u8>>) -> Result<Value, CryptoError> {
    if point.len() < 3 || point[0] != 0x04 {
        return Err(enc("expected an uncompressed ec point"));
    }
    let coords = &point[1..];
    let width = coords.len() / 2;

    let mut jwk = json!({
        "kty": "EC",
        "crv": curve,
        "x": b64url(&coords[..width]),
        "y": b64url(&coords[width..]),
    });
    if let Some(scalar) = d {
        jwk["d"] = Value::String(b64url(scalar));
    }
    Ok(jwk)
}

fn point_bytes_p256(key: &p256::PublicKey) -> Vec<u8> {
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    key.to_encoded_point(false).as_bytes().to_vec()
}

fn point_bytes_p384(key: &p384::PublicKey) -> Vec<u8> {
    use p384::elliptic_curve::sec1::ToEncodedPoint;
    key.to_encoded_point(false).as_bytes().to_vec()
}

fn point_bytes_p521(key: &p521::PublicKey) -> Vec<u8> {
    use p521::elliptic_curve::sec1::ToEncodedPoint;
    key.to_encoded_point(false).as_bytes().to_vec()
}

/// RFC 7638 thumbprint over the required members, hashed with
/// SHA-512/256.
fn thumbprint(jwk: &Map<String, Value>) -> Result<String, CryptoError> {
    let kty = jwk
        .get("kty")
        .and_then(Value::as_str)
        .ok_or_else(|| enc("jwk is missing kty"))?;

    let required: &[&str] = match kty {
        "RSA" => &["e", "kty", "n"],
        "EC" => &["crv", "kty", "x", "y"],
        "OKP" => &["crv", "kty", "x"],
        other => return Err(CryptoError::UnsupportedKey(other.to_string())),
    };

    // serde_json maps iterate in key order, which matches the RFC's
    // lexicographic requirement.
    let mut members = Map::new();
    for name in required {
        let value = jwk
            .get(*name)
            .ok_or_else(|| enc(format!("jwk is missing {name}")))?;
        members.insert((*name).to_string(), value.clone());
    }
    let canonical = serde_json::to_vec(&Value::Object(members)).map_err(enc)?;
    Ok(b64url(Sha512_256::digest(&canonical)))
}

fn decode_rsa(jwk: &Value, private: bool) -> Result<Key, CryptoError> {
    let n = big_member(jwk, "n")?;
    let e = big_member(jwk, "e")?;
    if !private {
        let key = rsa::RsaPublicKey::new(n, e).map_err(dec)?;
        return Ok(Key::Public(PublicKey::Rsa(key)));
    }
    let d = big_member(jwk, "d")?;
    let p = big_member(jwk, "p")?;
    let q = big_member(jwk, "q")?;
    let key = rsa::RsaPrivateKey::from_components(n, e, d, vec![p, q]).map_err(dec)?;
    Ok(Key::Private(PrivateKey::Rsa(key)))
}

fn decode_ec(jwk: &Value, private: bool) -> Result<Key, CryptoError> {
    let curve = member(jwk, "crv")?;
    if private {
        let d = bytes_member(jwk, "d")?;
        let key = match curve {
            "P-256" => PrivateKey::P256(p256::SecretKey::from_slice(&d).map_err(dec)?),
            "P-384" => PrivateKey::P384(p384::SecretKey::from_slice(&d).map_err(dec)?),
            "P-521" => PrivateKey::P521(p521::SecretKey::from_slice(&d).map_err(dec)?),
            other => return Err(CryptoError::UnsupportedKey(other.to_string())),
        };
        return Ok(Key::Private(key));
    }

    let x = bytes_member(jwk, "x")?;
    let y = bytes_member(jwk, "y")?;
    let mut point = Vec::with_capacity(1 + x.len() + y.len());
    point.push(0x04);
    point.extend_from_slice(&x);
    point.extend_from_slice(&y);

    let key = match curve {
        "P-256" => PublicKey::P256(p256::PublicKey::from_sec1_bytes(&point).map_err(dec)?),
        "P-384" => PublicKey::P384(p384::PublicKey::from_sec1_bytes(&point).map_err(dec)?),
        "P-521" => PublicKey::P521(p521::PublicKey::from_sec1_bytes(&point).map_err(dec)?),
        other => return Err(CryptoError::UnsupportedKey(other.to_string())),
    };
    Ok(Key::Public(key))
}

fn decode_okp(jwk: &Value, private: bool) -> Result<Key, CryptoError> {
    let curve = member(jwk, "crv")?;
    match curve {
        "Ed25519" => {
            fips::guard("ed25519")?;
            if private {
                let d = fixed_bytes_member::<32>(jwk, "d")?;
                let key = ed25519_dalek::SigningKey::from_bytes(&d);
                Ok(Key::Private(PrivateKey::Ed25519(key)))
            } else {
                let x = fixed_bytes_member::<32>(jwk, "x")?;
                let key = ed25519_dalek::VerifyingKey::from_bytes(&x).map_err(dec)?;
                Ok(Key::Public(PublicKey::Ed25519(key)))
            }
        }
        "X25519" => {
            fips::guard("x25519")?;
            if private {
                let d = fixed_bytes_member::<32>(jwk, "d")?;
                Ok(Key::Private(PrivateKey::X25519(
                    x25519_dalek::StaticSecret::from(d),
                )))
            } else {
                let x = fixed_bytes_member::<32>(jwk, "x")?;
                Ok(Key::Public(PublicKey::X25519(x25519_dalek::PublicKey::from(
                    x,
                ))))
            }
        }
        other => Err(CryptoError::UnsupportedKey(other.to_string())),
    }
}

fn member<'a>(jwk: &'a Value, name: &str) -> Result<&'a str, CryptoError> {
    jwk.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| dec(format!("jwk is missing {name}")))
}

fn bytes_member(jwk: &Value, name: &str) -> Result<Vec<u8>, CryptoError> {
    b64url_decode(member(jwk, name)?)
}

fn fixed_bytes_member<const N: usize>(jwk: &Value, name: &str) -> Result<[u8; N], CryptoError> {
    let bytes = bytes_member(jwk, name)?;
    bytes
        .try_into()
        .map_err(|_| dec(format!("jwk member {name} has the wrong length")))
}

fn big_member(jwk: &Value, name: &str) -> Result<rsa::BigUint, CryptoError> {
    Ok(rsa::BigUint::from_bytes_be(&bytes_member(jwk, name)?))
}

fn as_map(value: Value) -> Result<Map<String, Value>, CryptoError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(enc("jwk members must be an object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crypto::generate_key_pair;

    #[test]
    fn kid_is_deterministic() {
        let pair = generate_key_pair("ec").unwrap();
        let a = encode(&Key::Public(pair.private.public())).unwrap();
        let b = encode(&Key::Public(pair.public)).unwrap();
        let a: Value = serde_json::from_str(&a).unwrap();
        let b: Value = serde_json::from_str(&b).unwrap();
        assert_eq!(a["kid"], b["kid"]);
        assert!(!a["kid"].as_str().unwrap().is_empty());
    }

    #[test]
    fn ec_private_round_trip() {
        let pair = generate_key_pair("ec:p384").unwrap();
        let jwk = encode(&Key::Private(pair.private)).unwrap();
        let decoded = decode(&jwk).unwrap();
        assert!(matches!(decoded, Key::Private(PrivateKey::P384(_))));
        // Re-encoding reproduces the document byte for byte.
        assert_eq!(encode(&decoded).unwrap(), jwk);
    }

    #[test]
    fn rsa_round_trip() {
        let pair = generate_key_pair("rsa").unwrap();
        let jwk = encode(&Key::Private(pair.private)).unwrap();
        let decoded = decode(&jwk).unwrap();
        assert!(matches!(decoded, Key::Private(PrivateKey::Rsa(_))));
    }

    #[test]
    fn ed25519_round_trip() {
        let pair = generate_key_pair("ed25519").unwrap();
        let jwk = encode(&Key::Public(pair.public)).unwrap();
        let parsed: Value = serde_json::from_str(&jwk).unwrap();
        assert_eq!(parsed["kty"], "OKP");
        assert_eq!(parsed["crv"], "Ed25519");
        let decoded = decode(&jwk).unwrap();
        assert!(matches!(decoded, Key::Public(PublicKey::Ed25519(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"kty":"oct"}"#).is_err());
    }
}
