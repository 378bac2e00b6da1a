//! Normalized VCS specifications
//!
//! A specification arrives either as a short string (`git:https://host/repo`,
//! or a bare local directory) or as a mapping with `type`, `url` and any
//! importer-specific options (`branch`, `tag`, `commit`, ...). Both forms
//! normalize to a [`VcsDefinition`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use wsman_fs::NormalizedPath;

use crate::{Error, ImporterRegistry, PinInfo, Result};

/// Mapping keys that expand to a hosted git repository.
const SHORTHANDS: &[(&str, &str)] = &[
    ("github", "https://github.com"),
    ("gitlab", "https://gitlab.com"),
];

/// A VCS specification as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawVcs {
    /// `type:url`, or a local directory name
    Short(String),
    /// `{ type: ..., url: ..., <options> }`
    Full(BTreeMap<String, Value>),
}

impl RawVcs {
    /// Human-readable rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            RawVcs::Short(text) => text.clone(),
            RawVcs::Full(map) => {
                let fields: Vec<String> = map
                    .iter()
                    .map(|(key, value)| {
                        let value = value_to_string(value).unwrap_or_else(|_| "...".into());
                        format!("{key}: {value}")
                    })
                    .collect();
                format!("{{{}}}", fields.join(", "))
            }
        }
    }
}

impl From<&str> for RawVcs {
    fn from(text: &str) -> Self {
        RawVcs::Short(text.to_string())
    }
}

/// What a specification is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    /// Directory relative paths are resolved from (the declaring file's directory)
    pub base_dir: &'a NormalizedPath,
    /// `${NAME}` substitutions available to the specification
    pub variables: &'a BTreeMap<String, String>,
    /// Known importer types
    pub registry: &'a ImporterRegistry,
}

/// Normalized description of where a package or package set lives.
///
/// Immutable once built; overrides produce a new definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VcsDefinition {
    #[serde(rename = "type")]
    vcs_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    url: String,
    #[serde(flatten)]
    options: BTreeMap<String, String>,
}

impl VcsDefinition {
    /// Definition of an existing local directory.
    pub fn local(dir: &NormalizedPath) -> Self {
        Self {
            vcs_type: "local".to_string(),
            url: dir.clean().to_string(),
            options: BTreeMap::new(),
        }
    }

    /// Definition of something that has no VCS at all.
    pub fn none() -> Self {
        Self {
            vcs_type: "none".to_string(),
            url: String::new(),
            options: BTreeMap::new(),
        }
    }

    /// Normalize a raw specification.
    ///
    /// Fails if neither type nor url can be determined, if the type has no
    /// registered importer, or if a `${VAR}` reference is unknown.
    pub fn normalize(raw: &RawVcs, ctx: &NormalizeContext<'_>) -> Result<Self> {
        let spec = raw.describe();
        let fields = match raw {
            RawVcs::Short(text) => {
                let text = expand_variables(text, ctx.variables, &spec)?;
                short_form_fields(&text, ctx.base_dir, &spec)?
            }
            RawVcs::Full(map) => {
                let mut fields = BTreeMap::new();
                for (key, value) in map {
                    let value = value_to_string(value).map_err(|message| Error::invalid(&spec, message))?;
                    fields.insert(key.clone(), expand_variables(&value, ctx.variables, &spec)?);
                }
                fields
            }
        };
        Self::from_fields(fields, ctx, &spec)
    }

    fn from_fields(
        mut fields: BTreeMap<String, String>,
        ctx: &NormalizeContext<'_>,
        spec: &str,
    ) -> Result<Self> {
        expand_shorthands(&mut fields, spec)?;

        let url = fields.remove("url").filter(|url| !url.is_empty());
        let vcs_type = match (fields.remove("type").filter(|t| !t.is_empty()), &url) {
            (Some(vcs_type), _) => vcs_type,
            (None, Some(_)) => return Err(Error::invalid(spec, "no VCS type given")),
            (None, None) => return Err(Error::invalid(spec, "neither type nor url given")),
        };

        if !ctx.registry.is_registered(&vcs_type) {
            return Err(Error::UnknownImporter {
                vcs_type,
                spec: spec.to_string(),
            });
        }

        let url = match (vcs_type.as_str(), url) {
            ("none", _) => String::new(),
            (_, None) => return Err(Error::invalid(spec, "no url given")),
            (_, Some(url)) if vcs_type != "local" && is_remote_url(&url) => {
                url.trim_end_matches('/').to_string()
            }
            (_, Some(url)) => NormalizedPath::new(url).absolutize(ctx.base_dir).to_string(),
        };

        Ok(Self {
            vcs_type,
            url,
            options: fields,
        })
    }

    /// Identity of the repository for deduplication and overrides.
    ///
    /// Only the type and the url take part, so two definitions differing by
    /// branch still name the same repository.
    pub fn overrides_key(&self) -> String {
        let url = self.url.trim_end_matches('/');
        let url = url.strip_suffix(".git").unwrap_or(url);
        format!("{}:{}", self.vcs_type, url)
    }

    /// Return a new definition with `patch` merged over this one.
    ///
    /// A patch that changes the VCS type replaces the definition wholesale;
    /// otherwise the patch's fields win and the remaining fields are kept.
    pub fn apply_override(
        &self,
        patch: &BTreeMap<String, Value>,
        ctx: &NormalizeContext<'_>,
    ) -> Result<Self> {
        let spec = format!("override of {self}");
        let mut patch_fields = BTreeMap::new();
        for (key, value) in patch {
            let value = value_to_string(value).map_err(|message| Error::invalid(&spec, message))?;
            patch_fields.insert(key.clone(), expand_variables(&value, ctx.variables, &spec)?);
        }

        let uses_shorthand = SHORTHANDS
            .iter()
            .any(|(key, _)| patch_fields.contains_key(*key));
        let patch_type = patch_fields
            .get("type")
            .cloned()
            .or_else(|| uses_shorthand.then(|| "git".to_string()));

        let mut fields = if patch_type.is_some_and(|t| t != self.vcs_type) {
            BTreeMap::new()
        } else {
            self.to_fields()
        };
        if uses_shorthand {
            fields.remove("url");
        }
        fields.extend(patch_fields);

        Self::from_fields(fields, ctx, &spec)
    }

    /// This definition with pinning information merged into its options.
    pub fn pinned(&self, pin: &PinInfo) -> Self {
        let mut pinned = self.clone();
        pinned
            .options
            .extend(pin.iter().map(|(k, v)| (k.clone(), v.clone())));
        pinned
    }

    fn to_fields(&self) -> BTreeMap<String, String> {
        let mut fields = self.options.clone();
        fields.insert("type".to_string(), self.vcs_type.clone());
        if !self.url.is_empty() {
            fields.insert("url".to_string(), self.url.clone());
        }
        fields
    }

    pub fn vcs_type(&self) -> &str {
        &self.vcs_type
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn is_local(&self) -> bool {
        self.vcs_type == "local"
    }

    pub fn is_none(&self) -> bool {
        self.vcs_type == "none"
    }

    /// Whether the definition needs a checkout into the workspace.
    pub fn needs_checkout(&self) -> bool {
        !self.is_local() && !self.is_none()
    }
}

impl fmt::Display for VcsDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.url.is_empty() {
            write!(f, "{}", self.vcs_type)?;
        } else {
            write!(f, "{}:{}", self.vcs_type, self.url)?;
        }
        if !self.options.is_empty() {
            let options: Vec<String> = self
                .options
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, " ({})", options.join(", "))?;
        }
        Ok(())
    }
}

fn short_form_fields(
    text: &str,
    base_dir: &NormalizedPath,
    spec: &str,
) -> Result<BTreeMap<String, String>> {
    let mut fields = BTreeMap::new();
    match split_type_prefix(text) {
        Some((vcs_type, url)) => {
            fields.insert("type".to_string(), vcs_type.to_string());
            fields.insert("url".to_string(), url.to_string());
        }
        None => {
            let dir = NormalizedPath::new(text).absolutize(base_dir);
            if !dir.is_dir() {
                return Err(Error::invalid(
                    spec,
                    "neither a remote source specification nor an existing local directory",
                ));
            }
            fields.insert("type".to_string(), "local".to_string());
            fields.insert("url".to_string(), dir.to_string());
        }
    }
    Ok(fields)
}

/// Split `type:url`. Single letters are drive letters, not types.
fn split_type_prefix(text: &str) -> Option<(&str, &str)> {
    let (prefix, rest) = text.split_once(':')?;
    let mut chars = prefix.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid = prefix.len() > 1
        && starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some((prefix, rest))
}

fn expand_shorthands(fields: &mut BTreeMap<String, String>, spec: &str) -> Result<()> {
    for (key, host) in SHORTHANDS {
        if let Some(path) = fields.remove(*key) {
            if fields.contains_key("url") {
                return Err(Error::invalid(spec, format!("both '{key}' and 'url' given")));
            }
            let path = path.trim_matches('/');
            let path = path.strip_suffix(".git").unwrap_or(path);
            fields
                .entry("type".to_string())
                .or_insert_with(|| "git".to_string());
            fields.insert("url".to_string(), format!("{host}/{path}.git"));
        }
    }
    Ok(())
}

/// `scheme://...` or scp-like `user@host:path`.
fn is_remote_url(url: &str) -> bool {
    if let Some((scheme, _)) = url.split_once("://") {
        return !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
    }
    match url.split_once(':') {
        Some((user_host, _)) => user_host.contains('@') && !user_host.contains('/'),
        None => false,
    }
}

fn expand_variables(
    text: &str,
    variables: &BTreeMap<String, String>,
    spec: &str,
) -> Result<String> {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| Error::invalid(spec, "unterminated variable reference"))?;
        let name = &after[..end];
        let value = variables.get(name).ok_or_else(|| Error::UnknownVariable {
            name: name.to_string(),
            spec: spec.to_string(),
        })?;
        result.push_str(value);
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}

fn value_to_string(value: &Value) -> std::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err("option values must be scalars".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn normalize(raw: RawVcs) -> Result<VcsDefinition> {
        let base = NormalizedPath::new("/ws/.wsman");
        let variables = BTreeMap::from([("HOST".to_string(), "https://example.com".to_string())]);
        let registry = ImporterRegistry::with_builtins();
        let ctx = NormalizeContext {
            base_dir: &base,
            variables: &variables,
            registry: &registry,
        };
        VcsDefinition::normalize(&raw, &ctx)
    }

    fn map(entries: &[(&str, &str)]) -> RawVcs {
        RawVcs::Full(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        )
    }

    #[rstest]
    #[case("git:https://example.com/base.git", "git", "https://example.com/base.git")]
    #[case("git:git@example.com:org/base.git", "git", "git@example.com:org/base.git")]
    #[case("git:../repos/base", "git", "/ws/repos/base")]
    #[case("local:../sets/extra", "local", "/ws/sets/extra")]
    #[case("git:${HOST}/base.git", "git", "https://example.com/base.git")]
    fn short_forms(#[case] raw: &str, #[case] vcs_type: &str, #[case] url: &str) {
        let vcs = normalize(RawVcs::from(raw)).unwrap();
        assert_eq!(vcs.vcs_type(), vcs_type);
        assert_eq!(vcs.url(), url);
    }

    #[test]
    fn github_shorthand_expands_to_git() {
        let vcs = normalize(map(&[("github", "org/robotics"), ("branch", "next")])).unwrap();
        assert_eq!(vcs.vcs_type(), "git");
        assert_eq!(vcs.url(), "https://github.com/org/robotics.git");
        assert_eq!(vcs.option("branch"), Some("next"));
    }

    #[test]
    fn none_type_needs_no_url() {
        let vcs = normalize(map(&[("type", "none")])).unwrap();
        assert!(vcs.is_none());
        assert_eq!(vcs.to_string(), "none");
    }

    #[test]
    fn missing_type_and_url_is_rejected() {
        let err = normalize(map(&[("branch", "master")])).unwrap_err();
        assert!(err.to_string().contains("neither type nor url"));
    }

    #[test]
    fn unknown_importer_is_rejected() {
        let err = normalize(RawVcs::from("cvs:/repo")).unwrap_err();
        assert!(matches!(err, Error::UnknownImporter { ref vcs_type, .. } if vcs_type == "cvs"));
    }

    #[test]
    fn unknown_variable_is_rejected() {
        let err = normalize(RawVcs::from("git:${NOPE}/base.git")).unwrap_err();
        assert!(matches!(err, Error::UnknownVariable { ref name, .. } if name == "NOPE"));
    }

    #[test]
    fn missing_local_directory_is_rejected() {
        let err = normalize(RawVcs::from("does/not/exist")).unwrap_err();
        assert!(matches!(err, Error::InvalidSpec { .. }));
    }

    #[test]
    fn overrides_key_ignores_options_and_git_suffix() {
        let a = normalize(map(&[("type", "git"), ("url", "https://example.com/base.git")])).unwrap();
        let b = normalize(map(&[
            ("type", "git"),
            ("url", "https://example.com/base/"),
            ("branch", "next"),
        ]))
        .unwrap();
        assert_ne!(a, b);
        assert_eq!(a.overrides_key(), b.overrides_key());
        assert_eq!(a.overrides_key(), "git:https://example.com/base");
    }

    #[test]
    fn override_merges_options() {
        let base = NormalizedPath::new("/ws/.wsman");
        let variables = BTreeMap::new();
        let registry = ImporterRegistry::with_builtins();
        let ctx = NormalizeContext {
            base_dir: &base,
            variables: &variables,
            registry: &registry,
        };
        let vcs = normalize(map(&[
            ("type", "git"),
            ("url", "https://example.com/base.git"),
            ("branch", "master"),
            ("push_to", "git@example.com:base.git"),
        ]))
        .unwrap();

        let patch = BTreeMap::from([("branch".to_string(), Value::String("next".into()))]);
        let patched = vcs.apply_override(&patch, &ctx).unwrap();
        assert_eq!(patched.url(), vcs.url());
        assert_eq!(patched.option("branch"), Some("next"));
        assert_eq!(patched.option("push_to"), Some("git@example.com:base.git"));

        let patch = BTreeMap::from([
            ("type".to_string(), Value::String("local".into())),
            ("url".to_string(), Value::String("/src/base".into())),
        ]);
        let replaced = vcs.apply_override(&patch, &ctx).unwrap();
        assert!(replaced.is_local());
        assert!(replaced.options().is_empty());
    }
}
