//! Typed decomposition of secret paths.
//!
//! [`pack`] and [`to_path`] are duals: `pack(to_path(r)) == r` for every
//! valid record, and `to_path(pack(p)) == clean(p)` for every valid path.

use serde::Serialize;

use super::regions;
use super::ring::{Quality, Ring};
use super::{clean, validate_segments};
use crate::error::{PathError, Result};

/// A secret path decomposed into its positional fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "ring", rename_all = "lowercase")]
pub enum PathRecord {
    Meta {
        key: String,
    },
    Infra {
        provider: String,
        account: String,
        region: String,
        service: String,
        key: String,
    },
    Platform {
        quality: Quality,
        name: String,
        region: String,
        service: String,
        key: String,
    },
    Product {
        name: String,
        version: String,
        component: String,
        key: String,
    },
    App {
        quality: Quality,
        platform: String,
        product: String,
        version: String,
        component: String,
        key: String,
    },
    Artifact {
        #[serde(rename = "type")]
        kind: String,
        id: String,
    },
}

impl std::fmt::Display for PathRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&to_path(self))
    }
}

impl std::str::FromStr for PathRecord {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        pack(s)
    }
}

impl PathRecord {
    pub fn ring(&self) -> Ring {
        match self {
            PathRecord::Meta { .. } => Ring::Meta,
            PathRecord::Infra { .. } => Ring::Infra,
            PathRecord::Platform { .. } => Ring::Platform,
            PathRecord::Product { .. } => Ring::Product,
            PathRecord::App { .. } => Ring::App,
            PathRecord::Artifact { .. } => Ring::Artifact,
        }
    }
}

/// Decompose a validated path into its typed record.
pub fn pack(path: &str) -> Result<PathRecord> {
    let cleaned = clean(path);
    let segments = validate_segments(path, &cleaned)?;
    let ring: Ring = segments[0].parse()?;
    let tail: Vec<&str> = segments[1..].to_vec();

    let record = match ring {
        Ring::Meta => PathRecord::Meta {
            key: tail.join("/"),
        },
        Ring::Infra => PathRecord::Infra {
            provider: tail[0].to_string(),
            account: tail[1].to_string(),
            region: tail[2].to_string(),
            service: tail[3].to_string(),
            key: tail[4..].join("/"),
        },
        Ring::Platform => PathRecord::Platform {
            quality: tail[0]
                .parse()
                .map_err(|reason: String| PathError::invalid(path, reason))?,
            name: tail[1].to_string(),
            region: tail[2].to_string(),
            service: tail[3].to_string(),
            key: tail[4..].join("/"),
        },
        Ring::Product => PathRecord::Product {
            name: tail[0].to_string(),
            version: tail[1].to_string(),
            component: tail[2].to_string(),
            key: tail[3..].join("/"),
        },
        Ring::App => PathRecord::App {
            quality: tail[0]
                .parse()
                .map_err(|reason: String| PathError::invalid(path, reason))?,
            platform: tail[1].to_string(),
            product: tail[2].to_string(),
            version: tail[3].to_string(),
            component: tail[4].to_string(),
            key: tail[5..].join("/"),
        },
        Ring::Artifact => PathRecord::Artifact {
            kind: tail[0].to_string(),
            id: tail[1..].join("/"),
        },
    };

    Ok(record)
}

/// Rebuild the canonical path from a typed record.
pub fn to_path(record: &PathRecord) -> String {
    let parts: Vec<&str> = match record {
        PathRecord::Meta { key } => vec!["meta", key],
        PathRecord::Infra {
            provider,
            account,
            region,
            service,
            key,
        } => vec!["infra", provider, account, region, service, key],
        PathRecord::Platform {
            quality,
            name,
            region,
            service,
            key,
        } => vec!["platform", quality.as_str(), name, region, service, key],
        PathRecord::Product {
            name,
            version,
            component,
            key,
        } => vec!["product", name, version, component, key],
        PathRecord::App {
            quality,
            platform,
            product,
            version,
            component,
            key,
        } => vec![
            "app",
            quality.as_str(),
            platform,
            product,
            version,
            component,
            key,
        ],
        PathRecord::Artifact { kind, id } => vec!["artifact", kind, id],
    };
    parts.join("/")
}

impl Ring {
    /// Assemble a path for this ring from raw segments.
    ///
    /// Segments beyond the positional prefix are joined with `/` into the
    /// key tail. The assembled path is validated before being returned;
    /// passing fewer than [`Ring::min_segments`] segments is an
    /// `InvalidPath` error.
    pub fn build(&self, segments: &[&str]) -> Result<String> {
        let candidate = format!("{}/{}", self.as_str(), segments.join("/"));
        let path = clean(&candidate);
        super::validate(&path)?;
        Ok(path)
    }
}

/// Semver check with a tolerated leading `v`.
pub(super) fn is_semver(version: &str) -> bool {
    let stripped = version.strip_prefix('v').unwrap_or(version);
    semver::Version::parse(stripped).is_ok()
}

pub(super) fn region_ok(provider: &str, region: &str) -> bool {
    regions::is_provider_region(provider, region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infra_build() {
        let path = Ring::Infra
            .build(&[
                "aws",
                "ecsec",
                "us-east-1",
                "rds",
                "adminconsole",
                "accounts",
                "root_admin",
            ])
            .unwrap();
        assert_eq!(
            path,
            "infra/aws/ecsec/us-east-1/rds/adminconsole/accounts/root_admin"
        );
    }

    #[test]
    fn infra_build_rejects_unknown_region() {
        let err = Ring::Infra
            .build(&[
                "aws",
                "ecsec",
                "us-east-15",
                "rds",
                "adminconsole",
                "accounts",
                "root_admin",
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Path(PathError::Invalid { .. })
        ));
    }

    #[test]
    fn build_rejects_short_paths() {
        assert!(Ring::App.build(&["production", "p", "e"]).is_err());
        assert!(Ring::Meta.build(&["only-one"]).is_err());
    }

    #[test]
    fn platform_pack() {
        let record = pack("platform/dev/customer-1/us-east-1/adminconsole/database/creds").unwrap();
        let PathRecord::Platform {
            quality,
            name,
            region,
            service,
            key,
        } = &record
        else {
            panic!("expected a platform record");
        };
        assert_eq!(*quality, Quality::Dev);
        assert_eq!(name, "customer-1");
        assert_eq!(region, "us-east-1");
        assert_eq!(service, "adminconsole");
        assert_eq!(key, "database/creds");
        assert_eq!(
            to_path(&record),
            "platform/dev/customer-1/us-east-1/adminconsole/database/creds"
        );
    }

    #[test]
    fn pack_build_round_trip() {
        let paths = [
            "meta/cso/version",
            "infra/local/lab/rack-9/etcd/peer/tls",
            "product/ece/v1.0.0/server/http/session",
            "app/production/customer-1/ece/v1.0.0/server/http/jwt",
            "artifact/docker/sha256:abcdef",
        ];
        for path in paths {
            let record = pack(path).unwrap();
            assert_eq!(to_path(&record), path);
        }
    }

    #[test]
    fn artifact_id_stays_permissive() {
        let record = pack("artifact/docker/weird@name+tag").unwrap();
        assert!(matches!(record, PathRecord::Artifact { .. }));
    }
}
