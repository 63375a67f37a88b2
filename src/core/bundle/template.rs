//! Bundle template document model.
//!
//! The wire form is YAML or JSON; the document follows the familiar
//! `{apiVersion, kind, meta, spec}` envelope with the secret tree under
//! `spec.namespaces`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TemplateError};

pub const KIND: &str = "BundleTemplate";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleTemplate {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TemplateMeta>,
    pub spec: TemplateSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
    #[serde(default)]
    pub namespaces: Namespaces,
}

/// Scoping context shared by the platform, product and application
/// namespace families. Every field is itself a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub application: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespaces {
    #[serde(default)]
    pub infrastructure: Vec<InfrastructureNs>,
    #[serde(default)]
    pub platform: Vec<PlatformRegionNs>,
    #[serde(default)]
    pub product: Vec<ProductComponentNs>,
    #[serde(default)]
    pub application: Vec<ApplicationComponentNs>,
}

impl Namespaces {
    pub fn is_empty(&self) -> bool {
        self.infrastructure.is_empty()
            && self.platform.is_empty()
            && self.product.is_empty()
            && self.application.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureNs {
    pub provider: String,
    pub account: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub regions: Vec<InfrastructureRegion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureRegion {
    pub name: String,
    #[serde(default)]
    pub services: Vec<InfrastructureService>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureService {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub secrets: Vec<SecretSuffix>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRegionNs {
    pub region: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub components: Vec<PlatformComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformComponent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub secrets: Vec<SecretSuffix>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductComponentNs {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub secrets: Vec<SecretSuffix>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationComponentNs {
    /// Optional: defaults to the selector's component at visit time.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub secrets: Vec<SecretSuffix>,
}

/// One declared secret: the path tail plus how to produce its content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSuffix {
    pub suffix: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub content: BTreeMap<String, String>,
    #[serde(default)]
    pub vendor: bool,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl SecretSuffix {
    /// A suffix must declare a template or at least one content file.
    pub fn has_content(&self) -> bool {
        self.template.as_deref().is_some_and(|t| !t.is_empty()) || !self.content.is_empty()
    }
}

impl BundleTemplate {
    pub fn from_yaml(input: &str) -> Result<Self> {
        let template: BundleTemplate = serde_yaml::from_str(input)
            .map_err(|e| TemplateError::Content(e.to_string()))?;
        template.validate()?;
        Ok(template)
    }

    pub fn from_json(input: &str) -> Result<Self> {
        let template: BundleTemplate = serde_json::from_str(input)
            .map_err(|e| TemplateError::Content(e.to_string()))?;
        template.validate()?;
        Ok(template)
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self> {
        let template: BundleTemplate = serde_yaml::from_reader(reader)
            .map_err(|e| TemplateError::Content(e.to_string()))?;
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> Result<()> {
        if self.kind != KIND {
            return Err(TemplateError::Content(format!(
                "unexpected document kind {:?}, expected {KIND:?}",
                self.kind
            ))
            .into());
        }
        if self.spec.namespaces.is_empty() {
            return Err(
                TemplateError::Content("spec.namespaces declares no secrets".to_string()).into(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
apiVersion: harp.elastic.co/v1
kind: BundleTemplate
meta:
  name: ece
spec:
  selector:
    quality: production
    platform: customer-1
  namespaces:
    application:
      - name: server
        secrets:
          - suffix: http/jwt
            description: JWT signing seed
            template: |-
              {"k": "{{ Data.Secret.suffix }}"}
"#;

    #[test]
    fn parses_a_minimal_document() {
        let template = BundleTemplate::from_yaml(MINIMAL).unwrap();
        assert_eq!(template.kind, KIND);
        let selector = template.spec.selector.unwrap();
        assert_eq!(selector.quality, "production");
        let app = &template.spec.namespaces.application[0];
        assert_eq!(app.name, "server");
        assert!(app.secrets[0].has_content());
    }

    #[test]
    fn rejects_foreign_kinds() {
        let err = BundleTemplate::from_yaml(&MINIMAL.replace("BundleTemplate", "Bundle"))
            .unwrap_err();
        assert!(err.to_string().contains("unexpected document kind"));
    }

    #[test]
    fn rejects_empty_namespace_trees() {
        let doc = r#"
apiVersion: harp.elastic.co/v1
kind: BundleTemplate
spec:
  namespaces: {}
"#;
        assert!(BundleTemplate::from_yaml(doc).is_err());
    }

    #[test]
    fn suffix_without_template_or_content_has_no_content() {
        let suffix = SecretSuffix {
            suffix: "x".to_string(),
            description: String::new(),
            template: None,
            content: BTreeMap::new(),
            vendor: false,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        };
        assert!(!suffix.has_content());
    }
}
