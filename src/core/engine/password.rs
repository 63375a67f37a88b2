//! Random password generation for the template function library.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::CryptoError;

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"~!@#$%^&*()_+`-={}|[]\\:\"<>?,./";

const MAX_LENGTH: i64 = 1024;

/// Generate a random password.
///
/// `length` is clamped to `[0, 1024]`. Digit and symbol counts that fall
/// outside `[0, length]` are replaced by the defaults, 20% and 10% of
/// the length. When `allow_repeat` is false every character is unique,
/// which fails once a requested count exhausts its character class.
pub fn generate(
    length: i64,
    num_digits: i64,
    num_symbols: i64,
    no_upper: bool,
    allow_repeat: bool,
) -> Result<String, CryptoError> {
    let length = length.clamp(0, MAX_LENGTH) as usize;
    let digits = sanitize(num_digits, length, 5);
    let symbols = sanitize(num_symbols, length, 10);
    if digits + symbols > length {
        return Err(CryptoError::Generate(
            "digits and symbols exceed the password length".to_string(),
        ));
    }
    let letters = length - digits - symbols;

    let mut alphabet = LOWER.to_vec();
    if !no_upper {
        alphabet.extend_from_slice(UPPER);
    }

    let mut out = Vec::with_capacity(length);
    pick(&alphabet, letters, allow_repeat, &mut out)?;
    pick(DIGITS, digits, allow_repeat, &mut out)?;
    pick(SYMBOLS, symbols, allow_repeat, &mut out)?;
    out.shuffle(&mut OsRng);

    // All character classes are ASCII.
    Ok(String::from_utf8(out).map_err(|e| CryptoError::Generate(e.to_string()))?)
}

pub fn paranoid() -> Result<String, CryptoError> {
    generate(64, 10, 10, false, true)
}

pub fn strong() -> Result<String, CryptoError> {
    generate(32, 10, 10, false, true)
}

pub fn no_symbol() -> Result<String, CryptoError> {
    generate(32, 10, 0, false, true)
}

fn sanitize(requested: i64, length: usize, divisor: usize) -> usize {
    match usize::try_from(requested) {
        Ok(n) if n <= length => n,
        _ => length / divisor,
    }
}

fn pick(
    class: &[u8],
    count: usize,
    allow_repeat: bool,
    out: &mut Vec<u8>,
) -> Result<(), CryptoError> {
    if allow_repeat {
        for _ in 0..count {
            out.push(class[OsRng.gen_range(0..class.len())]);
        }
        return Ok(());
    }
    if count > class.len() {
        return Err(CryptoError::Generate(format!(
            "cannot draw {count} unique characters from a class of {}",
            class.len()
        )));
    }
    out.extend(class.choose_multiple(&mut OsRng, count));
    Ok(())
}
