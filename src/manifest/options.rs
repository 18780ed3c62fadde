//! Typed feature option values and their schema checks.
//!
//! The manifest stores options as plain JSON scalars. Before a value is
//! accepted into a [`FeatureConfig`](super::FeatureConfig) it is checked
//! against the [`OptionSpec`] the catalog declares for that feature and
//! normalized to the declared type.
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::OptionError;

/// Longest accepted string option.
pub const MAX_STRING_LEN: usize = 500;

/// A stored option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// JSON boolean.
    Bool(bool),
    /// JSON integer.
    Int(i64),
    /// JSON string (also used for enum and path options).
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Declared type of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    /// Free text, screened for shell metacharacters.
    String {
        /// Maximum length in characters.
        max_len: usize,
    },
    /// Integer within inclusive bounds.
    Int {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },
    /// Boolean.
    Bool,
    /// One of a fixed set of strings.
    Enum {
        /// Accepted values.
        choices: &'static [&'static str],
    },
    /// A filesystem path; `~` expands to the home directory.
    Path {
        /// Whether the path must already exist.
        must_exist: bool,
    },
}

/// Schema entry for one option of a catalog feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    /// Key under `options` in the manifest.
    pub name: &'static str,
    /// One-line description shown by `feature info`.
    pub description: &'static str,
    /// Declared type.
    pub kind: OptionKind,
    /// Whether a value (or default) must be present.
    pub required: bool,
    /// Value used when none is supplied.
    pub default: Option<OptionValue>,
}

/// Environment the path checks run against.
#[derive(Debug, Clone, Default)]
pub struct OptionContext {
    /// Home directory used for `~` expansion and the home restriction.
    pub home: Option<PathBuf>,
    /// Reject path options resolving outside `home`.
    pub restrict_paths_to_home: bool,
}

impl OptionSpec {
    /// Check `value` against this spec and return the normalized value to store.
    ///
    /// A missing value resolves to the default, if any.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionError`] describing the first failed check.
    pub fn validate(
        &self,
        value: Option<&OptionValue>,
        ctx: &OptionContext,
    ) -> Result<Option<OptionValue>, OptionError> {
        let Some(value) = value.or(self.default.as_ref()) else {
            if self.required {
                return Err(OptionError::Required(self.name.to_string()));
            }
            return Ok(None);
        };

        let checked = match (&self.kind, value) {
            (OptionKind::String { max_len }, OptionValue::Text(s)) => {
                check_text(self.name, s, *max_len)?;
                value.clone()
            }
            (OptionKind::Int { min, max }, _) => {
                let i = match value {
                    OptionValue::Int(i) => *i,
                    OptionValue::Text(s) => s
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| self.wrong_type("an integer", value))?,
                    OptionValue::Bool(_) => return Err(self.wrong_type("an integer", value)),
                };
                if i < *min || i > *max {
                    return Err(OptionError::OutOfRange {
                        name: self.name.to_string(),
                        value: i,
                        min: *min,
                        max: *max,
                    });
                }
                OptionValue::Int(i)
            }
            (OptionKind::Bool, OptionValue::Bool(_)) => value.clone(),
            (OptionKind::Bool, OptionValue::Text(s)) => OptionValue::Bool(
                parse_bool(s).ok_or_else(|| self.wrong_type("a boolean", value))?,
            ),
            (OptionKind::Enum { choices }, OptionValue::Text(s)) => {
                if !choices.contains(&s.as_str()) {
                    return Err(OptionError::NotAChoice {
                        name: self.name.to_string(),
                        choices: choices.join(", "),
                    });
                }
                value.clone()
            }
            (OptionKind::Path { must_exist }, OptionValue::Text(s)) => {
                self.check_path(s, *must_exist, ctx)?;
                value.clone()
            }
            (OptionKind::String { .. }, _) => return Err(self.wrong_type("a string", value)),
            (OptionKind::Bool, _) => return Err(self.wrong_type("a boolean", value)),
            (OptionKind::Enum { .. }, _) => return Err(self.wrong_type("a string", value)),
            (OptionKind::Path { .. }, _) => return Err(self.wrong_type("a path", value)),
        };
        Ok(Some(checked))
    }

    fn wrong_type(&self, expected: &'static str, value: &OptionValue) -> OptionError {
        OptionError::WrongType {
            name: self.name.to_string(),
            expected,
            value: value.to_string(),
        }
    }

    fn check_path(
        &self,
        raw: &str,
        must_exist: bool,
        ctx: &OptionContext,
    ) -> Result<(), OptionError> {
        if raw.contains('\0') {
            return Err(self.forbidden("null byte"));
        }
        let path = expand_home(raw, ctx.home.as_deref());
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(self.forbidden("path traversal"));
        }
        if must_exist && !path.exists() {
            return Err(OptionError::PathMissing {
                name: self.name.to_string(),
                path: path.display().to_string(),
            });
        }
        if ctx.restrict_paths_to_home {
            let inside = ctx.home.as_deref().is_some_and(|home| {
                match (dunce::canonicalize(&path), dunce::canonicalize(home)) {
                    (Ok(resolved), Ok(home)) => resolved.starts_with(home),
                    _ => path.starts_with(home),
                }
            });
            if !inside {
                return Err(OptionError::OutsideHome {
                    name: self.name.to_string(),
                    path: path.display().to_string(),
                });
            }
        }
        Ok(())
    }

    fn forbidden(&self, what: &'static str) -> OptionError {
        OptionError::Forbidden {
            name: self.name.to_string(),
            what,
        }
    }
}

/// Check every supplied option against `specs` and fill in defaults.
///
/// # Errors
///
/// Returns [`OptionError::Unknown`] for keys without a spec, or the first
/// failure from [`OptionSpec::validate`].
pub fn validate_options(
    feature: &str,
    specs: &[OptionSpec],
    values: &BTreeMap<String, OptionValue>,
    ctx: &OptionContext,
) -> Result<BTreeMap<String, OptionValue>, OptionError> {
    if let Some(unknown) = values.keys().find(|k| !specs.iter().any(|s| s.name == k.as_str())) {
        return Err(OptionError::Unknown {
            feature: feature.to_string(),
            name: unknown.clone(),
        });
    }
    let mut out = BTreeMap::new();
    for spec in specs {
        if let Some(v) = spec.validate(values.get(spec.name), ctx)? {
            out.insert(spec.name.to_string(), v);
        }
    }
    Ok(out)
}

fn check_text(name: &str, s: &str, max_len: usize) -> Result<(), OptionError> {
    let forbidden = |what| OptionError::Forbidden {
        name: name.to_string(),
        what,
    };
    if s.chars().count() > max_len {
        return Err(OptionError::TooLong {
            name: name.to_string(),
            max: max_len,
        });
    }
    if s.contains('\0') {
        return Err(forbidden("null byte"));
    }
    if s.contains("$(") || s.contains('`') {
        return Err(forbidden("command substitution"));
    }
    if s.contains([';', '&', '|']) {
        return Err(forbidden("command separator"));
    }
    if s.contains("../") {
        return Err(forbidden("path traversal"));
    }
    Ok(())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn expand_home(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches(['/', '\\'])),
        _ => PathBuf::from(raw),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn spec(kind: OptionKind) -> OptionSpec {
        OptionSpec {
            name: "opt",
            description: "test option",
            kind,
            required: false,
            default: None,
        }
    }

    fn text(s: &str) -> OptionValue {
        OptionValue::Text(s.to_string())
    }

    #[test]
    fn string_rejects_shell_injection() {
        let s = spec(OptionKind::String { max_len: MAX_STRING_LEN });
        let ctx = OptionContext::default();
        for bad in ["$(rm -rf ~)", "`id`", "a; b", "a && b", "a | b", "../etc"] {
            assert!(
                matches!(
                    s.validate(Some(&text(bad)), &ctx),
                    Err(OptionError::Forbidden { .. })
                ),
                "{bad} should be rejected"
            );
        }
        assert_eq!(
            s.validate(Some(&text("plain value")), &ctx).unwrap(),
            Some(text("plain value"))
        );
    }

    #[test]
    fn string_rejects_overlong_values() {
        let s = spec(OptionKind::String { max_len: 4 });
        assert!(matches!(
            s.validate(Some(&text("abcde")), &OptionContext::default()),
            Err(OptionError::TooLong { max: 4, .. })
        ));
    }

    #[test]
    fn int_accepts_digit_strings_and_checks_bounds() {
        let s = spec(OptionKind::Int { min: 1, max: 10 });
        let ctx = OptionContext::default();
        assert_eq!(s.validate(Some(&text(" 7 ")), &ctx).unwrap(), Some(OptionValue::Int(7)));
        assert!(matches!(
            s.validate(Some(&OptionValue::Int(11)), &ctx),
            Err(OptionError::OutOfRange { value: 11, .. })
        ));
        assert!(matches!(
            s.validate(Some(&text("seven")), &ctx),
            Err(OptionError::WrongType { .. })
        ));
    }

    #[test]
    fn bool_accepts_word_forms() {
        let s = spec(OptionKind::Bool);
        let ctx = OptionContext::default();
        assert_eq!(s.validate(Some(&text("Yes")), &ctx).unwrap(), Some(OptionValue::Bool(true)));
        assert_eq!(s.validate(Some(&text("n")), &ctx).unwrap(), Some(OptionValue::Bool(false)));
        assert!(s.validate(Some(&text("maybe")), &ctx).is_err());
        assert!(s.validate(Some(&OptionValue::Int(1)), &ctx).is_err());
    }

    #[test]
    fn enum_checks_choices() {
        let s = spec(OptionKind::Enum {
            choices: &["short", "full"],
        });
        let ctx = OptionContext::default();
        assert!(s.validate(Some(&text("full")), &ctx).is_ok());
        assert_eq!(
            s.validate(Some(&text("long")), &ctx).unwrap_err(),
            OptionError::NotAChoice {
                name: "opt".to_string(),
                choices: "short, full".to_string()
            }
        );
    }

    #[test]
    fn path_rejects_traversal_and_escaping_home() {
        let home = tempfile::tempdir().unwrap();
        let ctx = OptionContext {
            home: Some(home.path().to_path_buf()),
            restrict_paths_to_home: true,
        };
        let s = spec(OptionKind::Path { must_exist: false });
        assert!(s.validate(Some(&text("~/.venvs")), &ctx).is_ok());
        assert!(matches!(
            s.validate(Some(&text("~/../other")), &ctx),
            Err(OptionError::Forbidden { what: "path traversal", .. })
        ));
        assert!(matches!(
            s.validate(Some(&text("/etc/passwd")), &ctx),
            Err(OptionError::OutsideHome { .. })
        ));
    }

    #[test]
    fn path_must_exist() {
        let home = tempfile::tempdir().unwrap();
        let ctx = OptionContext {
            home: Some(home.path().to_path_buf()),
            restrict_paths_to_home: false,
        };
        let s = spec(OptionKind::Path { must_exist: true });
        assert!(matches!(
            s.validate(Some(&text("~/missing")), &ctx),
            Err(OptionError::PathMissing { .. })
        ));
        std::fs::create_dir(home.path().join("present")).unwrap();
        assert!(s.validate(Some(&text("~/present")), &ctx).is_ok());
    }

    #[test]
    fn missing_value_uses_default_or_requires() {
        let ctx = OptionContext::default();
        let mut s = spec(OptionKind::Bool);
        assert_eq!(s.validate(None, &ctx).unwrap(), None);
        s.default = Some(OptionValue::Bool(true));
        assert_eq!(s.validate(None, &ctx).unwrap(), Some(OptionValue::Bool(true)));
        s.default = None;
        s.required = true;
        assert_eq!(
            s.validate(None, &ctx).unwrap_err(),
            OptionError::Required("opt".to_string())
        );
    }

    #[test]
    fn validate_options_rejects_unknown_keys() {
        let specs = vec![spec(OptionKind::Bool)];
        let mut values = BTreeMap::new();
        values.insert("other".to_string(), OptionValue::Bool(true));
        assert!(matches!(
            validate_options("f", &specs, &values, &OptionContext::default()),
            Err(OptionError::Unknown { .. })
        ));
    }

    #[test]
    fn untagged_json_shape() {
        let v: BTreeMap<String, OptionValue> =
            serde_json::from_str(r#"{"a": true, "b": 3, "c": "x"}"#).unwrap();
        assert_eq!(v["a"], OptionValue::Bool(true));
        assert_eq!(v["b"], OptionValue::Int(3));
        assert_eq!(v["c"], text("x"));
    }
}
