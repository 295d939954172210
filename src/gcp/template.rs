//! URL path templates
//!
//! Turns an endpoint's path template plus invocation input into a concrete
//! path. Placeholders come in two forms: `{name}` substitutes the
//! percent-encoded field value, `{+name}` substitutes an already-URL-safe
//! composite segment (e.g. `projects/p/locations/l/clusters/c`) verbatim.
//!
//! Placeholders named `project`, `projects`, or `projectId` fall back to the
//! ambient project when the field is not passed; `{location}` falls back to
//! the ambient default location. Every block applies these rules identically.

use crate::error::Error;
use serde_json::Value;
use std::collections::HashSet;

/// Outcome of template resolution: the concrete path plus the input fields
/// consumed by it, so the caller can route the remaining fields into the
/// query string or request body.
#[derive(Debug)]
pub struct ResolvedPath {
    pub path: String,
    pub consumed: HashSet<String>,
}

/// Names that normalize to the ambient project identifier
const PROJECT_ALIASES: &[&str] = &["project", "projects", "projectId"];

/// Render a path parameter value. Only scalars are usable in a path; null
/// behaves as absent, matching the omission rule for body fields.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolve a path template against invocation input and ambient identifiers.
///
/// Fails with `MissingPathParameter` when a placeholder has no value from
/// either source.
pub fn resolve_path(
    template: &str,
    input: &serde_json::Map<String, Value>,
    project_id: Option<&str>,
    location: Option<&str>,
) -> Result<ResolvedPath, Error> {
    let mut path = String::with_capacity(template.len());
    let mut consumed = HashSet::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find('}') else {
            // Unterminated placeholder; catalogs are validated at load, so
            // treat the remainder as literal text.
            path.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let raw_name = &after[..close];
        let (verbatim, name) = match raw_name.strip_prefix('+') {
            Some(stripped) => (true, stripped),
            None => (false, raw_name),
        };

        if let Some(value) = input.get(name).and_then(scalar) {
            consumed.insert(name.to_string());
            if verbatim {
                path.push_str(&value);
            } else {
                path.push_str(&urlencoding::encode(&value));
            }
        } else if PROJECT_ALIASES.contains(&name) {
            let project = project_id
                .filter(|p| !p.is_empty())
                .ok_or_else(|| Error::MissingPathParameter(name.to_string()))?;
            path.push_str(&urlencoding::encode(project));
        } else if name == "location" {
            let location = location
                .filter(|l| !l.is_empty())
                .ok_or_else(|| Error::MissingPathParameter(name.to_string()))?;
            path.push_str(&urlencoding::encode(location));
        } else {
            return Err(Error::MissingPathParameter(name.to_string()));
        }

        rest = &after[close + 1..];
    }

    path.push_str(rest);

    Ok(ResolvedPath { path, consumed })
}

/// Join a base URL and a resolved path. Plain concatenation, no slash
/// collapsing or other normalization.
pub fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Check a template for well-formed placeholders. Used by the registry at
/// load time so malformed embedded catalogs fail immediately.
pub fn validate_template(template: &str) -> Result<(), String> {
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(format!("unterminated placeholder in '{}'", template));
        };
        let name = after[..close].trim_start_matches('+');
        if name.is_empty() {
            return Err(format!("empty placeholder in '{}'", template));
        }
        rest = &after[close + 1..];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_simple_placeholder_resolves_from_input() {
        let resolved = resolve_path(
            "locations/global/firewallPolicies/{firewallPolicy}",
            &input(json!({"firewallPolicy": "fp1"})),
            None,
            None,
        )
        .unwrap();
        assert_eq!(resolved.path, "locations/global/firewallPolicies/fp1");
        assert!(resolved.consumed.contains("firewallPolicy"));
    }

    #[test]
    fn test_scenario_a_url() {
        let resolved = resolve_path(
            "locations/global/firewallPolicies/{firewallPolicy}",
            &input(json!({"firewallPolicy": "fp1"})),
            None,
            None,
        )
        .unwrap();
        let url = join_url("https://compute.googleapis.com/compute/v1", &resolved.path);
        assert_eq!(
            url,
            "https://compute.googleapis.com/compute/v1/locations/global/firewallPolicies/fp1"
        );
    }

    #[test]
    fn test_simple_placeholder_is_percent_encoded() {
        let resolved = resolve_path(
            "b/{bucket}/o/{object}",
            &input(json!({"bucket": "logs", "object": "a/b c"})),
            None,
            None,
        )
        .unwrap();
        assert_eq!(resolved.path, "b/logs/o/a%2Fb%20c");
    }

    #[test]
    fn test_plus_placeholder_is_verbatim() {
        let resolved = resolve_path(
            "{+name}",
            &input(json!({"name": "projects/p/locations/l/clusters/c"})),
            None,
            None,
        )
        .unwrap();
        assert_eq!(resolved.path, "projects/p/locations/l/clusters/c");
    }

    #[test]
    fn test_project_aliases_fall_back_to_ambient() {
        for template in [
            "projects/{project}/global/firewalls",
            "projects/{projects}/global/firewalls",
            "projects/{projectId}/locations/{location}/clusters",
        ] {
            let resolved = resolve_path(
                template,
                &input(json!({})),
                Some("my-project-123"),
                Some("us-central1"),
            )
            .unwrap();
            assert!(!resolved.path.contains('{'), "unresolved: {}", resolved.path);
            assert!(resolved.path.contains("my-project-123"));
        }
    }

    #[test]
    fn test_explicit_field_wins_over_ambient() {
        let resolved = resolve_path(
            "projects/{project}/global/firewalls",
            &input(json!({"project": "other-project"})),
            Some("my-project-123"),
            None,
        )
        .unwrap();
        assert_eq!(resolved.path, "projects/other-project/global/firewalls");
        assert!(resolved.consumed.contains("project"));
    }

    #[test]
    fn test_missing_placeholder_is_an_error() {
        let err = resolve_path(
            "projects/{project}/zones/{zone}/instances",
            &input(json!({})),
            Some("my-project-123"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingPathParameter(name) if name == "zone"));
    }

    #[test]
    fn test_missing_ambient_project_is_an_error() {
        let err = resolve_path(
            "projects/{project}/global/firewalls",
            &input(json!({})),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingPathParameter(name) if name == "project"));
    }

    #[test]
    fn test_null_field_behaves_as_absent() {
        let err = resolve_path(
            "firewalls/{firewall}",
            &input(json!({"firewall": null})),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingPathParameter(_)));
    }

    #[test]
    fn test_numeric_value_renders_in_path() {
        let resolved = resolve_path(
            "policies/{priority}",
            &input(json!({"priority": 1000})),
            None,
            None,
        )
        .unwrap();
        assert_eq!(resolved.path, "policies/1000");
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template("projects/{project}/global/firewalls").is_ok());
        assert!(validate_template("{+name}:setSize").is_ok());
        assert!(validate_template("projects/{project/global").is_err());
        assert!(validate_template("projects/{}/x").is_err());
    }
}
