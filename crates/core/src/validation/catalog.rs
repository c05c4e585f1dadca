//! Rule catalog: per-field validation rules parsed from YAML.
//!
//! ```yaml
//! fields:
//!   title:
//!     type: string
//!     required: true
//!     regex: "^.{3,}$"
//!     max_length: 100
//!   created_at:
//!     type: date
//!     required: true
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::record::{FieldValue, RejectionReason};
use crate::error::CoreError;

/// `YYYY-MM-DD`, nothing else.
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// `YYYY-MM-DD HH:MM:SS`.
static ISO_DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("valid regex")
});

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("valid regex"));

const TRUE_LITERALS: &[&str] = &["true", "1", "t", "yes", "y"];
const FALSE_LITERALS: &[&str] = &["false", "0", "f", "no", "n"];

// ---------------------------------------------------------------------------
// Field types
// ---------------------------------------------------------------------------

/// Expected type of a field. `int` and `bool` are accepted as aliases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Date,
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "bool")]
    Boolean,
    DateTime,
}

impl FieldType {
    /// Coerce trimmed, non-empty text into this type using fixed formats.
    ///
    /// Returns `None` when the text is not in the expected format; ambiguous
    /// inputs such as `12/01/2024` for a date are never guessed at.
    pub fn coerce(self, value: &str) -> Option<FieldValue> {
        match self {
            FieldType::String => Some(FieldValue::Text(value.to_string())),
            FieldType::Date => {
                if !ISO_DATE_RE.is_match(value) {
                    return None;
                }
                NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .ok()
                    .map(FieldValue::Date)
            }
            FieldType::DateTime => {
                if ISO_DATETIME_RE.is_match(value) {
                    return NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                        .ok()
                        .map(FieldValue::DateTime);
                }
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| FieldValue::DateTime(dt.naive_utc()))
            }
            FieldType::Integer => {
                if !INTEGER_RE.is_match(value) {
                    return None;
                }
                value.parse::<i64>().ok().map(FieldValue::Integer)
            }
            FieldType::Boolean => {
                let lower = value.to_lowercase();
                if TRUE_LITERALS.contains(&lower.as_str()) {
                    Some(FieldValue::Boolean(true))
                } else if FALSE_LITERALS.contains(&lower.as_str()) {
                    Some(FieldValue::Boolean(false))
                } else {
                    None
                }
            }
        }
    }
}

/// Whether a failing rule rejects the record or only clears the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    #[default]
    Error,
    Warning,
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// Outcome of checking one field value against its rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    /// Optional field with no value.
    Absent,
    Valid(FieldValue),
    Invalid(RejectionReason),
}

/// A compiled validation rule for one field.
#[derive(Debug, Clone)]
pub struct Rule {
    pub expected_type: FieldType,
    pub pattern: Option<Regex>,
    pub required: bool,
    /// Maximum length in characters of the canonical value.
    pub max_length: Option<usize>,
    pub severity: RuleSeverity,
}

impl Rule {
    pub fn new(expected_type: FieldType) -> Self {
        Self {
            expected_type,
            pattern: None,
            required: false,
            max_length: None,
            severity: RuleSeverity::Error,
        }
    }

    /// Check a raw value. Steps run in order and stop at the first failure:
    /// presence, type coercion, pattern, length.
    ///
    /// The pattern must match at the start of the value; it may stop short of
    /// the end unless it is anchored with `$`.
    pub fn check(&self, raw: Option<&str>) -> FieldCheck {
        let value = match raw.map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ if self.required => return FieldCheck::Invalid(RejectionReason::MissingRequired),
            _ => return FieldCheck::Absent,
        };

        let Some(typed) = self.expected_type.coerce(value) else {
            return FieldCheck::Invalid(RejectionReason::TypeMismatch);
        };

        let canonical = typed.canonical();
        if let Some(pattern) = &self.pattern {
            if !pattern.find(&canonical).is_some_and(|m| m.start() == 0) {
                return FieldCheck::Invalid(RejectionReason::PatternMismatch);
            }
        }
        if let Some(max) = self.max_length {
            if canonical.chars().count() > max {
                return FieldCheck::Invalid(RejectionReason::LengthExceeded);
            }
        }

        FieldCheck::Valid(typed)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CatalogFile {
    fields: Option<BTreeMap<String, RuleSpec>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSpec {
    #[serde(rename = "type", default)]
    expected_type: FieldType,
    #[serde(default, alias = "pattern")]
    regex: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    max_length: Option<usize>,
    #[serde(default)]
    severity: RuleSeverity,
}

impl RuleSpec {
    fn compile(self, field: &str) -> Result<Rule, CoreError> {
        let pattern = match self.regex.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(Regex::new(p).map_err(|e| {
                CoreError::Config(format!("field '{field}': invalid regex '{p}': {e}"))
            })?),
            _ => None,
        };
        Ok(Rule {
            expected_type: self.expected_type,
            pattern,
            required: self.required,
            max_length: self.max_length,
            severity: self.severity,
        })
    }
}

/// Immutable mapping of field name to [`Rule`], loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: BTreeMap<String, Rule>,
}

impl RuleCatalog {
    /// Read and compile a rule file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("cannot read rule file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse and compile rules from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, CoreError> {
        let file: CatalogFile = serde_yaml::from_str(text)
            .map_err(|e| CoreError::Config(format!("malformed rule file: {e}")))?;
        let specs = file
            .fields
            .ok_or_else(|| CoreError::Config("rule file has no 'fields' mapping".into()))?;

        let rules = specs
            .into_iter()
            .map(|(field, spec)| spec.compile(&field).map(|rule| (field, rule)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { rules })
    }

    /// Build a catalog from already-compiled rules.
    pub fn from_rules(rules: impl IntoIterator<Item = (String, Rule)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Rule> {
        self.rules.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.rules.contains_key(field)
    }

    /// Rules in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    const RULES: &str = r#"
fields:
  title:
    type: string
    required: true
    regex: "^.{3,}$"
    max_length: 100
  created_at:
    type: date
    required: true
  rtype_id:
    type: int
  is_active:
    type: bool
  external_link:
    type: string
    pattern: "^https?://"
    severity: warning
"#;

    #[test]
    fn parses_all_rule_keys_and_aliases() {
        let catalog = RuleCatalog::from_yaml_str(RULES).unwrap();
        assert_eq!(catalog.len(), 5);

        let title = catalog.get("title").unwrap();
        assert_eq!(title.expected_type, FieldType::String);
        assert!(title.required);
        assert_eq!(title.max_length, Some(100));
        assert!(title.pattern.is_some());

        assert_eq!(catalog.get("rtype_id").unwrap().expected_type, FieldType::Integer);
        assert_eq!(catalog.get("is_active").unwrap().expected_type, FieldType::Boolean);

        let link = catalog.get("external_link").unwrap();
        assert_eq!(link.severity, RuleSeverity::Warning);
        assert!(link.pattern.is_some());
        assert!(!link.required);
    }

    #[test]
    fn unknown_type_is_config_error() {
        let err = RuleCatalog::from_yaml_str("fields:\n  title:\n    type: uuid\n").unwrap_err();
        assert_matches!(err, CoreError::Config(_));
    }

    #[test]
    fn bad_regex_is_config_error() {
        let err =
            RuleCatalog::from_yaml_str("fields:\n  title:\n    regex: \"([a-z\"\n").unwrap_err();
        assert_matches!(err, CoreError::Config(msg) if msg.contains("title"));
    }

    #[test]
    fn unknown_rule_key_is_config_error() {
        let err =
            RuleCatalog::from_yaml_str("fields:\n  title:\n    mandatory: true\n").unwrap_err();
        assert_matches!(err, CoreError::Config(_));
    }

    #[test]
    fn missing_fields_mapping_is_config_error() {
        let err = RuleCatalog::from_yaml_str("rules: {}\n").unwrap_err();
        assert_matches!(err, CoreError::Config(msg) if msg.contains("fields"));
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let err = RuleCatalog::from_yaml_str("fields: [unclosed").unwrap_err();
        assert_matches!(err, CoreError::Config(_));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = RuleCatalog::load("/nonexistent/validation_rules.yaml").unwrap_err();
        assert_matches!(err, CoreError::Config(msg) if msg.contains("cannot read"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RULES.as_bytes()).unwrap();
        let catalog = RuleCatalog::load(file.path()).unwrap();
        assert!(catalog.contains("created_at"));
    }

    #[test]
    fn empty_regex_means_no_pattern() {
        let catalog = RuleCatalog::from_yaml_str("fields:\n  gtype:\n    regex: \"  \"\n").unwrap();
        assert!(catalog.get("gtype").unwrap().pattern.is_none());
    }

    #[test]
    fn date_coercion_is_strict_iso() {
        assert_matches!(
            FieldType::Date.coerce("2024-01-10"),
            Some(FieldValue::Date(d)) if d == NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
        assert_eq!(FieldType::Date.coerce("12/01/2024"), None);
        assert_eq!(FieldType::Date.coerce("2024-1-5"), None);
        assert_eq!(FieldType::Date.coerce("2024-02-30"), None);
        assert_eq!(FieldType::Date.coerce("2024-01-10 00:00:00"), None);
    }

    #[test]
    fn datetime_coercion_accepts_space_and_rfc3339() {
        assert_matches!(
            FieldType::DateTime.coerce("2024-01-10 08:30:00"),
            Some(FieldValue::DateTime(_))
        );
        assert_matches!(
            FieldType::DateTime.coerce("2024-01-10T08:30:00-05:00"),
            Some(FieldValue::DateTime(dt)) if dt.format("%H:%M").to_string() == "13:30"
        );
        assert_eq!(FieldType::DateTime.coerce("10/01/2024 08:30"), None);
    }

    #[test]
    fn integer_and_boolean_coercion() {
        assert_eq!(FieldType::Integer.coerce("42"), Some(FieldValue::Integer(42)));
        assert_eq!(FieldType::Integer.coerce("-7"), Some(FieldValue::Integer(-7)));
        assert_eq!(FieldType::Integer.coerce("4.2"), None);
        assert_eq!(FieldType::Integer.coerce("abc"), None);
        assert_eq!(FieldType::Boolean.coerce("Yes"), Some(FieldValue::Boolean(true)));
        assert_eq!(FieldType::Boolean.coerce("0"), Some(FieldValue::Boolean(false)));
        assert_eq!(FieldType::Boolean.coerce("maybe"), None);
    }

    #[test]
    fn check_runs_steps_in_order() {
        let mut rule = Rule::new(FieldType::Date);
        rule.required = true;
        rule.pattern = Some(Regex::new(r"^2024-").unwrap());

        assert_eq!(
            rule.check(None),
            FieldCheck::Invalid(RejectionReason::MissingRequired)
        );
        assert_eq!(
            rule.check(Some("   ")),
            FieldCheck::Invalid(RejectionReason::MissingRequired)
        );
        assert_eq!(
            rule.check(Some("12/01/2024")),
            FieldCheck::Invalid(RejectionReason::TypeMismatch)
        );
        assert_eq!(
            rule.check(Some("2023-05-01")),
            FieldCheck::Invalid(RejectionReason::PatternMismatch)
        );
        assert_matches!(rule.check(Some(" 2024-05-01 ")), FieldCheck::Valid(_));
    }

    #[test]
    fn pattern_must_match_at_start_of_value() {
        let mut rule = Rule::new(FieldType::String);
        rule.pattern = Some(Regex::new(r"https?://").unwrap());

        assert_matches!(rule.check(Some("http://x/1")), FieldCheck::Valid(_));
        assert_matches!(rule.check(Some("https://x/1 extra")), FieldCheck::Valid(_));
        assert_eq!(
            rule.check(Some("ver http://x/1")),
            FieldCheck::Invalid(RejectionReason::PatternMismatch)
        );
    }

    #[test]
    fn check_enforces_max_length_in_chars() {
        let mut rule = Rule::new(FieldType::String);
        rule.max_length = Some(4);
        assert_matches!(rule.check(Some("Ñandú")), FieldCheck::Invalid(RejectionReason::LengthExceeded));
        assert_matches!(rule.check(Some("Ñand")), FieldCheck::Valid(_));
    }

    #[test]
    fn optional_empty_value_is_absent() {
        let rule = Rule::new(FieldType::Integer);
        assert_eq!(rule.check(Some("")), FieldCheck::Absent);
        assert_eq!(rule.check(None), FieldCheck::Absent);
    }
}
