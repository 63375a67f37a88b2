//! Natural-language narration of typed path records.

use std::fmt::Write;

use minijinja::{Environment, UndefinedBehavior, Value};

use super::{PathRecord, Ring};
use crate::error::{Result, TemplateError};

fn phrasing(ring: Ring) -> &'static str {
    match ring {
        Ring::Meta => "meta secret {{ key }}",
        Ring::Infra => {
            "secret {{ key }} of the {{ service }} service, \
             account {{ provider }}/{{ account }}, region {{ region }}"
        }
        Ring::Platform => {
            "secret {{ key }} of the {{ service }} service on the \
             {{ quality }} platform {{ name }} in {{ region }}"
        }
        Ring::Product => {
            "secret {{ key }} of the {{ component }} component, \
             product {{ name }} version {{ version }}"
        }
        Ring::App => {
            "secret {{ key }} of the {{ component }} component, \
             application {{ product }} version {{ version }} on the \
             {{ quality }} platform {{ platform }}"
        }
        Ring::Artifact => "artifact {{ id }} of type {{ type }}",
    }
}

/// Write a human-readable description of `record` into `sink`.
pub fn interpret<W: Write>(record: &PathRecord, sink: &mut W) -> Result<()> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let text = env
        .render_str(phrasing(record.ring()), Value::from_serialize(record))
        .map_err(|e| TemplateError::Render(e.to_string()))?;

    sink.write_str(&text)
        .map_err(|e| TemplateError::Render(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cso;

    #[test]
    fn narrates_an_application_path() {
        let record = cso::pack("app/production/customer-1/ece/v1.0.0/server/http/jwt").unwrap();
        let mut out = String::new();
        interpret(&record, &mut out).unwrap();
        assert_eq!(
            out,
            "secret http/jwt of the server component, application ece \
             version v1.0.0 on the production platform customer-1"
        );
    }

    #[test]
    fn narrates_every_ring() {
        for path in [
            "meta/cso/version",
            "infra/aws/security/us-east-1/rds/admin/password",
            "platform/dev/cust/global/api/token",
            "product/ece/v1.0.0/server/license",
            "artifact/docker/image-id",
        ] {
            let record = cso::pack(path).unwrap();
            let mut out = String::new();
            interpret(&record, &mut out).unwrap();
            assert!(!out.is_empty());
        }
    }
}
