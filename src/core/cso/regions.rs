//! Provider region knowledge for the infra and platform rings.

/// Reserved region literal accepted for every provider.
pub const GLOBAL: &str = "global";

/// Provider that accepts any region name.
pub const LOCAL_PROVIDER: &str = "local";

const AWS_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "sa-east-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-south-1",
];

const GCP_REGIONS: &[&str] = &[
    "us-east1",
    "us-east4",
    "us-central1",
    "us-west1",
    "us-west2",
    "northamerica-northeast1",
    "southamerica-east1",
    "europe-west1",
    "europe-west2",
    "europe-west3",
    "europe-west4",
    "europe-north1",
    "asia-east1",
    "asia-east2",
    "asia-northeast1",
    "asia-southeast1",
    "asia-south1",
    "australia-southeast1",
];

const AZURE_REGIONS: &[&str] = &[
    "eastus",
    "eastus2",
    "centralus",
    "westus",
    "westus2",
    "canadacentral",
    "brazilsouth",
    "northeurope",
    "westeurope",
    "uksouth",
    "ukwest",
    "francecentral",
    "germanywestcentral",
    "eastasia",
    "southeastasia",
    "japaneast",
    "australiaeast",
    "centralindia",
];

/// Region list for a known provider, `None` for unknown providers.
pub fn provider_regions(provider: &str) -> Option<&'static [&'static str]> {
    match provider {
        "aws" => Some(AWS_REGIONS),
        "gcp" => Some(GCP_REGIONS),
        "azure" => Some(AZURE_REGIONS),
        _ => None,
    }
}

/// Whether the provider name is known to the taxonomy.
pub fn is_known_provider(provider: &str) -> bool {
    provider == LOCAL_PROVIDER || provider_regions(provider).is_some()
}

/// Whether `region` is valid for `provider`.
///
/// The `local` provider accepts any region and `global` is accepted for
/// every provider.
pub fn is_provider_region(provider: &str, region: &str) -> bool {
    if provider == LOCAL_PROVIDER || region == GLOBAL {
        return true;
    }
    provider_regions(provider).is_some_and(|regions| regions.contains(&region))
}

/// Whether `region` belongs to any known provider, or is `global`.
pub fn is_any_region(region: &str) -> bool {
    if region == GLOBAL {
        return true;
    }
    ["aws", "gcp", "azure"]
        .iter()
        .filter_map(|p| provider_regions(p))
        .any(|regions| regions.contains(&region))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aws_regions_are_known() {
        assert!(is_provider_region("aws", "us-east-1"));
        assert!(!is_provider_region("aws", "us-east-15"));
    }

    #[test]
    fn global_is_accepted_for_every_provider() {
        assert!(is_provider_region("aws", GLOBAL));
        assert!(is_provider_region("gcp", GLOBAL));
    }

    #[test]
    fn local_provider_accepts_anything() {
        assert!(is_provider_region("local", "rack-42"));
    }

    #[test]
    fn union_lookup() {
        assert!(is_any_region("eastus"));
        assert!(is_any_region("us-central1"));
        assert!(!is_any_region("moonbase-1"));
    }
}
