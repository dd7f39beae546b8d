//! Annotation templates.
//!
//! Templates are plain text with `{{ ... }}` actions. Two actions exist:
//! `{{ $labels.<name> }}` substitutes a label of the alert instance and
//! `{{ $value }}` substitutes the sample value that triggered it.

use std::collections::BTreeMap;

use thiserror::Error;
use tripwire_common::labels::{is_valid_label_name, LabelSet};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("unclosed '{{{{' at byte {0}")]
    Unclosed(usize),
    #[error("unexpected '}}}}' at byte {0}")]
    UnexpectedClose(usize),
    #[error("unsupported action {0:?}")]
    Unsupported(String),
    #[error("unknown label {0:?}")]
    UnknownLabel(String),
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Label(&'a str),
    Value,
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < template.len() {
        let rest = &template[pos..];
        let open = rest.find("{{");
        let close = rest.find("}}");

        match (open, close) {
            (None, None) => {
                segments.push(Segment::Text(rest));
                break;
            }
            (None, Some(c)) => return Err(TemplateError::UnexpectedClose(pos + c)),
            (Some(o), Some(c)) if c < o => return Err(TemplateError::UnexpectedClose(pos + c)),
            (Some(o), _) => {
                if o > 0 {
                    segments.push(Segment::Text(&rest[..o]));
                }
                let body_start = o + 2;
                let end = rest[body_start..]
                    .find("}}")
                    .ok_or(TemplateError::Unclosed(pos + o))?;
                let action = rest[body_start..body_start + end].trim();
                segments.push(parse_action(action)?);
                pos += body_start + end + 2;
            }
        }
    }

    Ok(segments)
}

fn parse_action(action: &str) -> Result<Segment<'_>, TemplateError> {
    if action == "$value" {
        return Ok(Segment::Value);
    }
    if let Some(name) = action.strip_prefix("$labels.") {
        if is_valid_label_name(name) {
            return Ok(Segment::Label(name));
        }
    }
    Err(TemplateError::Unsupported(action.to_string()))
}

/// Checks that a template is well formed without rendering it.
pub fn validate(template: &str) -> Result<(), TemplateError> {
    parse(template).map(|_| ())
}

pub fn render(template: &str, labels: &LabelSet, value: f64) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    for segment in parse(template)? {
        match segment {
            Segment::Text(t) => out.push_str(t),
            Segment::Label(name) => {
                let v = labels
                    .get(name)
                    .ok_or_else(|| TemplateError::UnknownLabel(name.to_string()))?;
                out.push_str(v);
            }
            Segment::Value => out.push_str(&value.to_string()),
        }
    }
    Ok(out)
}

/// Renders every annotation. An annotation that fails to render keeps its
/// raw template text so the alert still carries it.
pub fn render_annotations(
    templates: &BTreeMap<String, String>,
    labels: &LabelSet,
    value: f64,
) -> BTreeMap<String, String> {
    templates
        .iter()
        .map(|(key, template)| {
            let rendered = render(template, labels, value).unwrap_or_else(|e| {
                tracing::warn!(annotation = %key, error = %e, "template failed, using raw text");
                template.clone()
            });
            (key.clone(), rendered)
        })
        .collect()
}
