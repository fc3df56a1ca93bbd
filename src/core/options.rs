//! Validation options and their merge rules
//!
//! Options are resolved in three layers, each one overriding the previous
//! field by field:
//!
//! 1. the global defaults ([`ValidationOptions::default`] or
//!    [`ValidatorConfig::defaults`](crate::config::ValidatorConfig))
//! 2. the configured default for the section being validated
//! 3. the per-section override declared on the route's descriptor
//!
//! The response section is always permissive: after the merge,
//! `allow_unknown` and `strip_unknown` are forced to `true`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The part of an exchange a schema applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Query,
    Params,
    Body,
    Response,
}

impl Section {
    /// The request-side field groups, in the order their failures are reported
    pub const REQUEST: [Section; 3] = [Section::Query, Section::Params, Section::Body];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Query => "query",
            Section::Params => "params",
            Section::Body => "body",
            Section::Response => "response",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective flags handed to the validation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationOptions {
    /// Stop at the first failing rule instead of collecting every failure
    pub abort_early: bool,

    /// Keep object keys that the schema does not declare
    pub allow_unknown: bool,

    /// Drop object keys that the schema does not declare
    pub strip_unknown: bool,

    /// Cast strings to the declared scalar type (numbers, booleans)
    pub convert: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            abort_early: false,
            allow_unknown: true,
            strip_unknown: true,
            convert: true,
        }
    }
}

impl ValidationOptions {
    /// Apply an override on top of these options
    pub fn merged(mut self, overrides: &OptionsOverride) -> Self {
        if let Some(abort_early) = overrides.abort_early {
            self.abort_early = abort_early;
        }
        if let Some(allow_unknown) = overrides.allow_unknown {
            self.allow_unknown = allow_unknown;
        }
        if let Some(strip_unknown) = overrides.strip_unknown {
            self.strip_unknown = strip_unknown;
        }
        if let Some(convert) = overrides.convert {
            self.convert = convert;
        }
        self
    }

    /// Options used on the response side, whatever the overrides say
    pub fn permissive(mut self) -> Self {
        self.allow_unknown = true;
        self.strip_unknown = true;
        self
    }
}

/// A partial set of options; unset fields fall through to the layer below
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_early: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_unknown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_unknown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert: Option<bool>,
}

impl OptionsOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort_early(mut self, value: bool) -> Self {
        self.abort_early = Some(value);
        self
    }

    pub fn allow_unknown(mut self, value: bool) -> Self {
        self.allow_unknown = Some(value);
        self
    }

    pub fn strip_unknown(mut self, value: bool) -> Self {
        self.strip_unknown = Some(value);
        self
    }

    pub fn convert(mut self, value: bool) -> Self {
        self.convert = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.abort_early.is_none()
            && self.allow_unknown.is_none()
            && self.strip_unknown.is_none()
            && self.convert.is_none()
    }
}

/// One optional override per section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<OptionsOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<OptionsOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<OptionsOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<OptionsOverride>,
}

impl SectionOptions {
    pub fn get(&self, section: Section) -> Option<&OptionsOverride> {
        match section {
            Section::Query => self.query.as_ref(),
            Section::Params => self.params.as_ref(),
            Section::Body => self.body.as_ref(),
            Section::Response => self.response.as_ref(),
        }
    }

    pub fn set(&mut self, section: Section, overrides: OptionsOverride) {
        let slot = match section {
            Section::Query => &mut self.query,
            Section::Params => &mut self.params,
            Section::Body => &mut self.body,
            Section::Response => &mut self.response,
        };
        *slot = Some(overrides);
    }

    pub fn is_empty(&self) -> bool {
        Section::REQUEST
            .iter()
            .chain(std::iter::once(&Section::Response))
            .all(|section| self.get(*section).is_none())
    }
}

/// Resolve the effective options for a section
///
/// Precedence: `route` > `section_default` > `global`.
pub fn resolve(
    global: ValidationOptions,
    section: Section,
    section_default: Option<&OptionsOverride>,
    route: Option<&OptionsOverride>,
) -> ValidationOptions {
    let mut options = global;
    if let Some(overrides) = section_default {
        options = options.merged(overrides);
    }
    if let Some(overrides) = route {
        options = options.merged(overrides);
    }
    match section {
        Section::Response => options.permissive(),
        _ => options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_permissive_and_collect_everything() {
        let options = ValidationOptions::default();
        assert!(!options.abort_early);
        assert!(options.allow_unknown);
        assert!(options.strip_unknown);
        assert!(options.convert);
    }

    #[test]
    fn test_route_override_only_touches_set_fields() {
        let route = OptionsOverride::new().allow_unknown(false);
        let options = resolve(
            ValidationOptions::default(),
            Section::Query,
            None,
            Some(&route),
        );

        assert_eq!(
            options,
            ValidationOptions {
                abort_early: false,
                allow_unknown: false,
                strip_unknown: true,
                convert: true,
            }
        );
    }

    #[test]
    fn test_route_beats_section_default() {
        let section_default = OptionsOverride::new().abort_early(true).convert(false);
        let route = OptionsOverride::new().abort_early(false);
        let options = resolve(
            ValidationOptions::default(),
            Section::Body,
            Some(&section_default),
            Some(&route),
        );

        assert!(!options.abort_early);
        assert!(!options.convert);
    }

    #[test]
    fn test_response_section_is_pinned_permissive() {
        let route = OptionsOverride::new()
            .allow_unknown(false)
            .strip_unknown(false)
            .abort_early(true);
        let options = resolve(
            ValidationOptions::default(),
            Section::Response,
            None,
            Some(&route),
        );

        assert!(options.allow_unknown);
        assert!(options.strip_unknown);
        assert!(options.abort_early);
    }

    #[test]
    fn test_override_deserializes_joi_names() {
        let overrides: OptionsOverride =
            serde_json::from_str(r#"{"allowUnknown": false, "abortEarly": true}"#).unwrap();
        assert_eq!(overrides.allow_unknown, Some(false));
        assert_eq!(overrides.abort_early, Some(true));
        assert_eq!(overrides.strip_unknown, None);
    }

    #[test]
    fn test_section_options_get_and_set() {
        let mut sections = SectionOptions::default();
        assert!(sections.is_empty());

        sections.set(Section::Params, OptionsOverride::new().convert(false));
        assert!(!sections.is_empty());
        assert_eq!(sections.get(Section::Params).and_then(|o| o.convert), Some(false));
        assert!(sections.get(Section::Query).is_none());
    }
}
