//! Bundle template traversal and assembly.
//!
//! A producer thread walks the four namespace families in a fixed order
//! and streams one [`Package`] per secret suffix over an unbuffered
//! channel. The caller drains the channel; the producer's error, if any,
//! is surfaced once the stream closes. Emission order is deterministic
//! for a given template and input set.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, SyncSender};
use std::thread;

use minijinja::value::Value;
use serde_json::json;
use tracing::{debug, trace};

use super::package::{pack, type_name, Bundle, Kv, Package, SecretChain};
use super::template::{BundleTemplate, SecretSuffix, Selector};
use crate::core::cso::Ring;
use crate::core::engine::{self, EngineContext};
use crate::error::{Error, Result, TemplateError};

/// Materialize a bundle template into a bundle.
///
/// # Errors
///
/// The first error raised inside a namespace family aborts the
/// traversal and is returned; packages emitted before the failure are
/// discarded.
pub fn visit(ctx: &EngineContext, template: &BundleTemplate) -> Result<Bundle> {
    let (tx, rx) = mpsc::sync_channel::<Package>(0);

    thread::scope(|scope| {
        let producer = scope.spawn(move || traverse(ctx, template, &tx));

        // Drain until the producer drops its sender.
        let packages: Vec<Package> = rx.into_iter().collect();

        match producer.join() {
            Ok(Ok(())) => Ok(Bundle { packages }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(TemplateError::Render("producer thread panicked".to_string()).into()),
        }
    })
}

fn traverse(
    ctx: &EngineContext,
    template: &BundleTemplate,
    tx: &SyncSender<Package>,
) -> Result<()> {
    let namespaces = &template.spec.namespaces;
    let selector = template.spec.selector.as_ref();

    for entry in &namespaces.infrastructure {
        let provider = render(ctx, &entry.provider)?;
        let account = render(ctx, &entry.account)?;
        for region in &entry.regions {
            let region_name = render(ctx, &region.name)?;
            for service in &region.services {
                let service_type = render(ctx, &service.kind)?;
                let service_name = render(ctx, &service.name)?;
                let positional = [
                    ("Provider", provider.as_str()),
                    ("Account", account.as_str()),
                    ("Region", region_name.as_str()),
                    ("Type", service_type.as_str()),
                    ("Name", service_name.as_str()),
                ];
                for suffix in &service.secrets {
                    emit(ctx, Ring::Infra, &positional, suffix, tx)?;
                }
            }
        }
    }

    if !namespaces.platform.is_empty() {
        let selector = require_selector(selector, "platform")?;
        let quality = selector_value(ctx, "quality", &selector.quality)?;
        let platform = selector_value(ctx, "platform", &selector.platform)?;
        for entry in &namespaces.platform {
            let region = render(ctx, &entry.region)?;
            for component in &entry.components {
                let name = render(ctx, &component.name)?;
                let positional = [
                    ("Quality", quality.as_str()),
                    ("Platform", platform.as_str()),
                    ("Region", region.as_str()),
                    ("Component", name.as_str()),
                ];
                for suffix in &component.secrets {
                    emit(ctx, Ring::Platform, &positional, suffix, tx)?;
                }
            }
        }
    }

    if !namespaces.product.is_empty() {
        let selector = require_selector(selector, "product")?;
        let product = selector_value(ctx, "product", &selector.product)?;
        let version = selector_value(ctx, "version", &selector.version)?;
        for entry in &namespaces.product {
            let name = render(ctx, &entry.name)?;
            let positional = [
                ("Product", product.as_str()),
                ("Version", version.as_str()),
                ("Component", name.as_str()),
            ];
            for suffix in &entry.secrets {
                emit(ctx, Ring::Product, &positional, suffix, tx)?;
            }
        }
    }

    if !namespaces.application.is_empty() {
        let selector = require_selector(selector, "application")?;
        let quality = selector_value(ctx, "quality", &selector.quality)?;
        let platform = selector_value(ctx, "platform", &selector.platform)?;
        let product = selector_value(ctx, "product", &selector.product)?;
        let version = selector_value(ctx, "version", &selector.version)?;
        for entry in &namespaces.application {
            // Entries without a name inherit the selector's component.
            let name = match render(ctx, &entry.name)? {
                name if name.trim().is_empty() => {
                    selector_value(ctx, "component", &selector.component)?
                }
                name => name,
            };
            let positional = [
                ("Quality", quality.as_str()),
                ("Platform", platform.as_str()),
                ("Product", product.as_str()),
                ("Version", version.as_str()),
                ("Component", name.as_str()),
            ];
            for suffix in &entry.secrets {
                emit(ctx, Ring::App, &positional, suffix, tx)?;
            }
        }
    }

    Ok(())
}

fn require_selector<'a>(
    selector: Option<&'a Selector>,
    family: &'static str,
) -> Result<&'a Selector> {
    selector.ok_or_else(|| TemplateError::MissingSelector(family).into())
}

fn selector_value(ctx: &EngineContext, field: &'static str, raw: &str) -> Result<String> {
    let rendered = render(ctx, raw)?;
    if rendered.trim().is_empty() {
        return Err(TemplateError::EmptySelector(field).into());
    }
    Ok(rendered)
}

fn render(ctx: &EngineContext, input: &str) -> Result<String> {
    engine::render(ctx, input)
}

/// Run the per-suffix pipeline and send the resulting package.
fn emit(
    ctx: &EngineContext,
    ring: Ring,
    positional: &[(&'static str, &str)],
    suffix: &SecretSuffix,
    tx: &SyncSender<Package>,
) -> Result<()> {
    if !suffix.has_content() {
        return Err(TemplateError::Content(format!(
            "secret suffix {:?} declares neither template nor content",
            suffix.suffix
        ))
        .into());
    }

    let rendered_suffix = render(ctx, &suffix.suffix)?;

    let mut segments: Vec<&str> = positional.iter().map(|(_, value)| *value).collect();
    segments.push(&rendered_suffix);
    let path = ring.build(&segments)?;
    trace!(path = %path, "building secret package");

    // Per-suffix template model: positional fields plus the raw suffix.
    let mut model = serde_json::Map::new();
    for (field, value) in positional {
        model.insert((*field).to_string(), json!(value));
    }
    model.insert(
        "Secret".to_string(),
        serde_json::to_value(suffix).map_err(|e| TemplateError::Content(e.to_string()))?,
    );
    let data = Value::from_serialize(&serde_json::Value::Object(model));

    let mut kv: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    if let Some(body) = suffix.template.as_deref().filter(|t| !t.is_empty()) {
        let out = engine::render_with_data(ctx, body, data.clone())?;
        let parsed: serde_json::Value = serde_json::from_str(&out)
            .map_err(|e| TemplateError::Content(format!("template output is not json: {e}")))?;
        let serde_json::Value::Object(map) = parsed else {
            return Err(
                TemplateError::Content("template output is not a json object".to_string()).into(),
            );
        };
        kv.extend(map);
    }
    // Content files are merged over template entries.
    for (filename, body) in &suffix.content {
        let name = engine::render_with_data(ctx, filename, data.clone())?;
        let rendered = engine::render_with_data(ctx, body, data.clone())?;
        kv.insert(name, json!(rendered));
    }

    let chain = build_chain(suffix, kv)?;
    let package = Package {
        name: path,
        secrets: chain,
        labels: render_map(ctx, &suffix.labels, &data)?,
        annotations: render_map(ctx, &suffix.annotations, &data)?,
    };

    debug!(name = %package.name, entries = package.secrets.data.len(), "package emitted");
    tx.send(package)
        .map_err(|_| TemplateError::Render("package stream closed".to_string()))?;
    Ok(())
}

fn build_chain(
    suffix: &SecretSuffix,
    kv: BTreeMap<String, serde_json::Value>,
) -> Result<SecretChain> {
    let mut chain = SecretChain::default();
    chain.labels.insert("generated".to_string(), "true".to_string());
    if suffix.vendor {
        chain.labels.insert("vendor".to_string(), "true".to_string());
    }
    chain.annotations.insert(
        "creationDate".to_string(),
        chrono::Utc::now().timestamp().to_string(),
    );
    chain
        .annotations
        .insert("description".to_string(), suffix.description.clone());
    chain.annotations.insert(
        "template".to_string(),
        suffix.template.clone().unwrap_or_default(),
    );

    for (key, value) in kv {
        if key.is_empty() {
            continue;
        }
        chain.data.push(Kv {
            key,
            kind: type_name(&value).to_string(),
            value: pack(&value)?,
        });
    }
    Ok(chain)
}

fn render_map(
    ctx: &EngineContext,
    raw: &BTreeMap<String, String>,
    data: &Value,
) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for (key, value) in raw {
        out.insert(key.clone(), engine::render_with_data(ctx, value, data.clone())?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_TEMPLATE: &str = r#"
apiVersion: harp.elastic.co/v1
kind: BundleTemplate
spec:
  selector:
    quality: production
    platform: customer-1
    product: ece
    version: v1.0.0
  namespaces:
    application:
      - name: server
        secrets:
          - suffix: http/jwt
            description: JWT signing seed
            template: |-
              {"k": "{{ Data.Secret.suffix }}"}
"#;

    fn ctx() -> EngineContext {
        EngineContext::new("test")
    }

    #[test]
    fn application_visit_emits_one_package() {
        let template = BundleTemplate::from_yaml(APP_TEMPLATE).unwrap();
        let bundle = visit(&ctx(), &template).unwrap();
        assert_eq!(bundle.packages.len(), 1);

        let package = &bundle.packages[0];
        assert_eq!(
            package.name,
            "app/production/customer-1/ece/v1.0.0/server/http/jwt"
        );
        assert_eq!(package.secrets.version, 0);
        assert_eq!(package.secrets.labels["generated"], "true");
        assert!(!package.secrets.labels.contains_key("vendor"));
        assert_eq!(package.secrets.annotations["description"], "JWT signing seed");

        let kv = &package.secrets.data[0];
        assert_eq!(kv.key, "k");
        assert_eq!(kv.kind, "string");
        assert_eq!(
            crate::core::bundle::package::unpack(&kv.value).unwrap(),
            serde_json::json!("http/jwt")
        );
    }

    #[test]
    fn missing_selector_fails_the_family() {
        let doc = APP_TEMPLATE.replace(
            "  selector:\n    quality: production\n    platform: customer-1\n    product: ece\n    version: v1.0.0\n",
            "",
        );
        let template = BundleTemplate::from_yaml(&doc).unwrap();
        let err = visit(&ctx(), &template).unwrap_err();
        assert_eq!(
            err.to_string(),
            "selector is mandatory for application secrets"
        );
    }

    #[test]
    fn blank_selector_value_is_an_error() {
        let doc = APP_TEMPLATE.replace("version: v1.0.0", "version: \"  \"");
        let template = BundleTemplate::from_yaml(&doc).unwrap();
        let err = visit(&ctx(), &template).unwrap_err();
        assert!(matches!(
            err,
            Error::Template(TemplateError::EmptySelector("version"))
        ));
    }

    #[test]
    fn content_files_override_template_entries() {
        let doc = r#"
apiVersion: harp.elastic.co/v1
kind: BundleTemplate
spec:
  namespaces:
    infrastructure:
      - provider: aws
        account: ecsec
        regions:
          - name: us-east-1
            services:
              - type: rds
                name: adminconsole
                secrets:
                  - suffix: accounts/root_admin
                    template: '{"cert.pem": "from-template", "user": "root"}'
                    content:
                      cert.pem: "{{ Data.Secret.suffix }}"
"#;
        let template = BundleTemplate::from_yaml(doc).unwrap();
        let bundle = visit(&ctx(), &template).unwrap();
        let package = &bundle.packages[0];
        assert_eq!(
            package.name,
            "infra/aws/ecsec/us-east-1/rds/adminconsole/accounts/root_admin"
        );

        let cert = package.secrets.data.iter().find(|kv| kv.key == "cert.pem").unwrap();
        assert_eq!(
            crate::core::bundle::package::unpack(&cert.value).unwrap(),
            serde_json::json!("accounts/root_admin")
        );
        assert!(package.secrets.data.iter().any(|kv| kv.key == "user"));
    }

    #[test]
    fn invalid_template_json_is_a_content_error() {
        let doc = APP_TEMPLATE.replace(
            "template: |-\n              {\"k\": \"{{ Data.Secret.suffix }}\"}",
            "template: '{foo}'",
        );
        let template = BundleTemplate::from_yaml(&doc).unwrap();
        let err = visit(&ctx(), &template).unwrap_err();
        assert!(matches!(err, Error::Template(TemplateError::Content(_))));
    }

    #[test]
    fn unnamed_application_entry_uses_the_selector_component() {
        let doc = APP_TEMPLATE
            .replace("version: v1.0.0", "version: v1.0.0\n    component: server")
            .replace("- name: server", "- name: \"\"");
        let template = BundleTemplate::from_yaml(&doc).unwrap();
        let bundle = visit(&ctx(), &template).unwrap();
        assert_eq!(
            bundle.packages[0].name,
            "app/production/customer-1/ece/v1.0.0/server/http/jwt"
        );
    }

    #[test]
    fn emission_order_is_deterministic() {
        let template = BundleTemplate::from_yaml(APP_TEMPLATE).unwrap();
        let first: Vec<String> = visit(&ctx(), &template)
            .unwrap()
            .packages
            .into_iter()
            .map(|p| p.name)
            .collect();
        let second: Vec<String> = visit(&ctx(), &template)
            .unwrap()
            .packages
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(first, second);
    }
}
