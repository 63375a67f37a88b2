//! The frozen template function library.
//!
//! Key material moves through the pipeline as opaque [`KeyHandle`]
//! objects so that a generated pair can be split and encoded without
//! ever serializing raw key bytes into the template state.

use std::sync::Arc;

use minijinja::value::{from_args, Object, Value};
use minijinja::{Environment, Error, ErrorKind, State};

use super::{codec, diceware, password};
use crate::core::crypto::{self, jose, jwk, pem, ssh, Key};
use crate::core::files::FileBundle;
use crate::core::resolver::{resolve, SecretReader};
use crate::error::CryptoError;

/// An asymmetric key (or half of one) held by the template state.
#[derive(Debug)]
pub struct KeyHandle(pub Key);

impl Object for KeyHandle {}

/// A generated pair, exposing `Private` and `Public` attributes.
#[derive(Debug)]
struct KeyPairHandle {
    pair: crypto::KeyPair,
}

impl Object for KeyPairHandle {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "Private" => Some(Value::from_object(KeyHandle(Key::Private(
                self.pair.private.clone(),
            )))),
            "Public" => Some(Value::from_object(KeyHandle(Key::Public(
                self.pair.public.clone(),
            )))),
            _ => None,
        }
    }
}

/// `Files` root object, forwarding to the bundle's projections.
#[derive(Debug)]
pub(super) struct FilesObject(pub Arc<FileBundle>);

impl Object for FilesObject {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match name {
            "Get" => {
                let (path,): (String,) = from_args(args)?;
                Ok(Value::from(self.0.get(&path)))
            }
            "GetBytes" => {
                let (path,): (String,) = from_args(args)?;
                Ok(Value::from_bytes(self.0.get_bytes(&path)))
            }
            "Glob" => {
                let (pattern,): (String,) = from_args(args)?;
                let matched = self.0.glob(&pattern).map_err(op_err)?;
                Ok(Value::from_serialize(&matched))
            }
            "Lines" => {
                let (path,): (String,) = from_args(args)?;
                Ok(Value::from(self.0.lines(&path)))
            }
            "AsConfig" => {
                from_args::<()>(args)?;
                Ok(Value::from_serialize(&self.0.as_config()))
            }
            "AsSecrets" => {
                from_args::<()>(args)?;
                Ok(Value::from_serialize(&self.0.as_secrets()))
            }
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("file bundle has no method {name}"),
            )),
        }
    }
}

fn op_err(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::InvalidOperation, e.to_string())
}

fn key_arg(value: &Value) -> Result<Key, Error> {
    value
        .downcast_object_ref::<KeyHandle>()
        .map(|handle| handle.0.clone())
        .ok_or_else(|| op_err("expected a key produced by cryptoPair or fromJwk"))
}

fn payload_bytes(value: &Value) -> Result<Vec<u8>, Error> {
    if let Some(text) = value.as_str() {
        return Ok(text.as_bytes().to_vec());
    }
    serde_json::to_vec(value).map_err(op_err)
}

/// Install the function library into a fresh environment.
pub(super) fn register(env: &mut Environment<'_>, readers: Vec<Arc<dyn SecretReader>>) {
    // String and serialization filters.
    env.add_filter("indent", codec::indent);
    env.add_filter("nindent", codec::nindent);
    env.add_filter("quote", codec::quote);
    env.add_filter("unquote", codec::unquote);
    env.add_filter("jsonEscape", codec::json_escape);
    env.add_filter("jsonUnescape", codec::json_unescape);
    env.add_filter("b64enc", codec::b64enc);
    env.add_filter("b64dec", codec::b64dec);
    env.add_filter("toYaml", codec::to_yaml);
    env.add_filter("fromYaml", codec::from_yaml);
    env.add_filter("fromYamlArray", codec::from_yaml_array);
    env.add_filter("toJson", codec::to_json);
    env.add_filter("fromJson", codec::from_json);
    env.add_filter("fromJsonArray", codec::from_json_array);
    env.add_filter("toToml", codec::to_toml);
    env.add_filter("merge", codec::merge);
    env.add_function("bech32enc", codec::bech32enc);
    env.add_function("bech32dec", codec::bech32dec);

    // Password and passphrase generators.
    env.add_function(
        "customPassword",
        |length: i64, digits: i64, symbols: i64, no_upper: bool, allow_repeat: bool| {
            password::generate(length, digits, symbols, no_upper, allow_repeat).map_err(op_err)
        },
    );
    env.add_function("paranoidPassword", || password::paranoid().map_err(op_err));
    env.add_function("strongPassword", || password::strong().map_err(op_err));
    env.add_function("noSymbolPassword", || password::no_symbol().map_err(op_err));
    env.add_function("customDiceware", |words: i64| diceware::generate(words));
    env.add_function("basicDiceware", || diceware::generate(diceware::BASIC_WORDS));
    env.add_function("strongDiceware", || {
        diceware::generate(diceware::STRONG_WORDS)
    });
    env.add_function("paranoidDiceware", || {
        diceware::generate(diceware::PARANOID_WORDS)
    });
    env.add_function("masterDiceware", || {
        diceware::generate(diceware::MASTER_WORDS)
    });

    // Key generation and encoders.
    env.add_function("cryptoKey", |kind: String| {
        crypto::generate_secret_key(&kind).map_err(op_err)
    });
    env.add_function("cryptoPair", |kind: String| {
        let pair = crypto::generate_key_pair(&kind).map_err(op_err)?;
        Ok::<_, Error>(Value::from_object(KeyPairHandle { pair }))
    });
    env.add_filter("toJwk", |key: &Value| {
        jwk::encode(&key_arg(key)?).map_err(op_err)
    });
    env.add_function("fromJwk", |input: String| {
        let key = jwk::decode(&input).map_err(op_err)?;
        Ok::<_, Error>(Value::from_object(KeyHandle(key)))
    });
    env.add_filter("toPem", |key: &Value| match key_arg(key)? {
        Key::Private(private) => pem::encode_private(&private).map_err(op_err),
        Key::Public(public) => pem::encode_public(&public).map_err(op_err),
    });
    env.add_filter("encryptPem", |key: &Value, passphrase: String| {
        match key_arg(key)? {
            Key::Private(private) => pem::encrypt_private(&private, &passphrase).map_err(op_err),
            Key::Public(_) => Err(op_err("only private keys can be passphrase-encrypted")),
        }
    });
    env.add_filter("toSSH", |key: &Value| match key_arg(key)? {
        Key::Private(private) => ssh::encode_private(&private).map_err(op_err),
        Key::Public(public) => ssh::encode_public(&public).map_err(op_err),
    });
    env.add_filter("keyToBytes", |key: &Value| {
        crypto::key_to_bytes(&key_arg(key)?).map_err(op_err)
    });

    // Tokens.
    env.add_function("toJws", |payload: &Value, key: &Value| {
        let Key::Private(private) = key_arg(key)? else {
            return Err(op_err(CryptoError::UnsupportedKey(
                "jws signing needs a private key".to_string(),
            )));
        };
        jose::sign(&payload_bytes(payload)?, &private).map_err(op_err)
    });
    env.add_function("encryptJwe", |key: String, payload: String| {
        jose::encrypt(&key, payload.as_bytes()).map_err(op_err)
    });
    env.add_function("decryptJwe", |key: String, token: String| {
        let plain = jose::decrypt(&key, &token).map_err(op_err)?;
        String::from_utf8(plain).map_err(op_err)
    });

    // External secret lookup through the resolver chain.
    env.add_function("secret", move |path: String| {
        let data = resolve(&readers, &path).map_err(op_err)?;
        Ok::<_, Error>(Value::from_serialize(&data))
    });
}
