//! Cloud Secret Organization (CSO) path taxonomy.
//!
//! A secret path is a `/`-separated string whose first segment names a
//! [`Ring`]. Each ring imposes a positional shape and semantic rules on
//! the remaining segments. The module exposes normalization ([`clean`]),
//! validation ([`validate`]), typed decomposition ([`pack`]), per-ring
//! assembly ([`Ring::build`]) and natural-language narration
//! ([`interpret`]).

mod interpret;
mod record;
mod regions;
mod ring;

pub use interpret::interpret;
pub use record::{pack, to_path, PathRecord};
pub use regions::{is_known_provider, is_provider_region, provider_regions, GLOBAL};
pub use ring::{Quality, Ring};

use crate::error::{PathError, Result};

/// Normalize a path: trim whitespace, strip leading/trailing `/`, and
/// collapse repeated `/`.
///
/// Idempotent: `clean(clean(p)) == clean(p)`.
pub fn clean(path: &str) -> String {
    path.trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Validate a secret path against the taxonomy.
pub fn validate(path: &str) -> Result<()> {
    let cleaned = clean(path);
    validate_segments(path, &cleaned)?;
    Ok(())
}

/// Shared validation core: returns the cleaned segments on success.
///
/// `original` is only used for error locality.
pub(super) fn validate_segments<'a>(original: &str, cleaned: &'a str) -> Result<Vec<&'a str>> {
    if cleaned.is_empty() {
        return Err(PathError::invalid(original, "empty path").into());
    }
    if cleaned
        .chars()
        .any(|c| !c.is_ascii() || c.is_ascii_control())
    {
        return Err(PathError::invalid(original, "path must be printable ASCII").into());
    }

    let segments: Vec<&str> = cleaned.split('/').collect();
    if segments.len() < 2 {
        return Err(PathError::invalid(original, "expected a ring and at least one segment").into());
    }

    let ring: Ring = segments[0].parse()?;
    let tail = &segments[1..];
    if tail.len() < ring.min_segments() {
        return Err(PathError::invalid(
            original,
            format!(
                "{} ring expects at least {} segments, got {}",
                ring,
                ring.min_segments(),
                tail.len()
            ),
        )
        .into());
    }

    match ring {
        Ring::Meta => {}
        Ring::Infra => {
            let (provider, region) = (tail[0], tail[2]);
            if !regions::is_known_provider(provider) {
                return Err(
                    PathError::invalid(original, format!("unknown provider {provider:?}")).into(),
                );
            }
            if !record::region_ok(provider, region) {
                return Err(PathError::invalid(
                    original,
                    format!("unknown region {region:?} for provider {provider:?}"),
                )
                .into());
            }
        }
        Ring::Platform => {
            if tail[0].parse::<Quality>().is_err() {
                return Err(
                    PathError::invalid(original, format!("unknown quality {:?}", tail[0])).into(),
                );
            }
            if !regions::is_any_region(tail[2]) {
                return Err(
                    PathError::invalid(original, format!("unknown region {:?}", tail[2])).into(),
                );
            }
        }
        Ring::Product => {
            if !record::is_semver(tail[1]) {
                return Err(PathError::invalid(
                    original,
                    format!("version {:?} is not semver", tail[1]),
                )
                .into());
            }
        }
        Ring::App => {
            if tail[0].parse::<Quality>().is_err() {
                return Err(
                    PathError::invalid(original, format!("unknown quality {:?}", tail[0])).into(),
                );
            }
            if !record::is_semver(tail[3]) {
                return Err(PathError::invalid(
                    original,
                    format!("version {:?} is not semver", tail[3]),
                )
                .into());
            }
        }
        Ring::Artifact => {}
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_normalizes() {
        assert_eq!(clean("  /infra//aws/x/ "), "infra/aws/x");
        assert_eq!(clean("meta/cso/version"), "meta/cso/version");
    }

    #[test]
    fn clean_is_idempotent() {
        for raw in ["//a///b//", "  x/y  ", "", "/"] {
            assert_eq!(clean(&clean(raw)), clean(raw));
        }
    }

    #[test]
    fn validate_accepts_canonical_paths() {
        for path in [
            "meta/cso/version",
            "infra/aws/security/us-east-1/rds/admin/password",
            "infra/aws/security/global/iam/role/arn",
            "platform/production/customer-1/us-east-1/billing/stripe/key",
            "product/ece/v1.0.0/server/license/jwt",
            "app/qa/customer-1/ece/1.2.3/worker/queue/password",
            "artifact/docker/registry/image-id",
        ] {
            validate(path).unwrap_or_else(|e| panic!("{path}: {e}"));
        }
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        assert!(validate("").is_err());
        assert!(validate("infra").is_err());
        assert!(validate("infra/aws/acct/us-east-1/rds").is_err());
        assert!(validate("platform/prod/x/us-east-1/svc/key").is_err());
        assert!(validate("product/ece/one-dot-oh/server/key").is_err());
        assert!(validate("app/dev/plat/prod/not-semver/comp/key").is_err());
        assert!(validate("infra/ibm/acct/us-east-1/rds/admin/key").is_err());
        assert!(validate("meta/émoji/clé").is_err());
    }

    #[test]
    fn validation_closure_with_pack() {
        // Whatever validate accepts, pack must decompose.
        let path = "platform/staging/cust/global/api/token";
        validate(path).unwrap();
        pack(path).unwrap();
    }

    mod laws {
        use super::super::*;
        use proptest::prelude::*;

        fn segment() -> impl Strategy<Value = String> + Clone {
            "[a-z][a-z0-9_-]{0,11}"
        }

        fn quality() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("production".to_string()),
                Just("staging".to_string()),
                Just("qa".to_string()),
                Just("dev".to_string()),
            ]
        }

        fn version() -> impl Strategy<Value = String> {
            (0u8..20, 0u8..20, 0u8..20, proptest::bool::ANY)
                .prop_map(|(a, b, c, v)| format!("{}{a}.{b}.{c}", if v { "v" } else { "" }))
        }

        fn valid_path() -> impl Strategy<Value = String> {
            let key = proptest::collection::vec(segment(), 1..3).prop_map(|s| s.join("/"));
            prop_oneof![
                (segment(), key.clone()).prop_map(|(a, k)| format!("meta/{a}/{k}")),
                (segment(), key.clone()).prop_map(|(acct, k)| format!(
                    "infra/aws/{acct}/us-east-1/rds/{k}"
                )),
                (quality(), segment(), segment(), key.clone()).prop_map(|(q, n, s, k)| format!(
                    "platform/{q}/{n}/global/{s}/{k}"
                )),
                (segment(), version(), segment(), key.clone()).prop_map(|(n, v, c, k)| format!(
                    "product/{n}/{v}/{c}/{k}"
                )),
                (quality(), segment(), segment(), version(), segment(), key.clone()).prop_map(
                    |(q, pl, pr, v, c, k)| format!("app/{q}/{pl}/{pr}/{v}/{c}/{k}")
                ),
                (segment(), key).prop_map(|(t, k)| format!("artifact/{t}/{k}")),
            ]
        }

        proptest! {
            #[test]
            fn pack_then_rebuild_is_identity(path in valid_path()) {
                let record = pack(&path).unwrap();
                prop_assert_eq!(to_path(&record), clean(&path));
            }

            #[test]
            fn validate_accepts_what_pack_accepts(path in valid_path()) {
                validate(&path).unwrap();
                pack(&path).unwrap();
            }

            #[test]
            fn clean_is_idempotent_on_arbitrary_input(raw in "[ /a-z0-9._-]{0,40}") {
                let once = clean(&raw);
                prop_assert_eq!(clean(&once), once);
            }
        }
    }
}
