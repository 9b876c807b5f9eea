//! Repository configuration: dropdown choices, boilerplate texts and the
//! filename convention used to derive default metadata.
//!
//! The document is JSON and is read once at startup, then passed explicitly to
//! the session and the filename deriver.

mod defaults;
mod errors;
mod load;

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

pub use defaults::DEFAULT_CONFIG_JSON;
pub use errors::ConfigError;
pub use load::{CONFIG_FILE_NAME, config_path, load_from, load_or_default, parse};

/// Parsed configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pass `--accept-nopadding` to every bwfmetaedit call.
    #[serde(rename = "accept-nopadding", deserialize_with = "flag_from_bool_or_int", default)]
    pub accept_nopadding: bool,
    /// Pattern with three groups: identifier, file-use code, `YYYYMMDD` date.
    #[serde(rename = "filenameRegex")]
    pub filename_regex: String,
    pub originator: String,
    pub iarl: String,
    pub repocode: String,
    pub deck: LabeledChoices,
    pub adc: LabeledChoices,
    pub software: LabeledChoices,
    pub copyright: LabeledChoices,
    #[serde(default)]
    pub isft: Vec<String>,
    #[serde(default)]
    pub technician: Vec<String>,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub speed: Vec<String>,
    #[serde(default)]
    pub eq: Vec<String>,
    #[serde(rename = "type", default)]
    pub tape_type: Vec<String>,
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(default)]
    pub fileuse: BTreeMap<String, String>,
    #[serde(default)]
    pub owner: Vec<String>,
    #[serde(default)]
    pub form: Vec<String>,
    #[serde(default)]
    pub creator: Vec<String>,
}

/// A dropdown whose entries are short names mapped to longer texts.
///
/// Serialized as `{"list": [...], "<name>": "<text>", ...}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabeledChoices {
    pub list: Vec<String>,
    #[serde(flatten)]
    pub texts: BTreeMap<String, String>,
}

impl LabeledChoices {
    /// Text configured for `name`, if any.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// First short name in display order.
    pub fn first(&self) -> Option<&str> {
        self.list.first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.list.iter().any(|entry| entry == name)
    }
}

/// Compiled filename convention plus the lookups needed to expand it.
#[derive(Debug, Clone)]
pub struct NamingRules {
    pub(crate) pattern: Regex,
    pub(crate) file_uses: BTreeMap<String, String>,
    pub(crate) repository_code: String,
}

impl NamingRules {
    /// Compile a naming convention. The pattern only has to match at the start
    /// of the filename and must expose at least three capture groups.
    pub fn new(
        pattern: &str,
        file_uses: BTreeMap<String, String>,
        repository_code: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let anchored = format!("^(?:{pattern})");
        let compiled = Regex::new(&anchored).map_err(|source| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            source: Box::new(source),
        })?;
        let groups = compiled.captures_len().saturating_sub(1);
        if groups < 3 {
            return Err(ConfigError::MissingCaptureGroups {
                pattern: pattern.to_string(),
                found: groups,
            });
        }
        Ok(Self {
            pattern: compiled,
            file_uses,
            repository_code: repository_code.into(),
        })
    }

    pub fn repository_code(&self) -> &str {
        &self.repository_code
    }
}

impl AppConfig {
    /// Compile the filename convention described by this configuration.
    pub fn naming_rules(&self) -> Result<NamingRules, ConfigError> {
        NamingRules::new(&self.filename_regex, self.fileuse.clone(), &self.repocode)
    }

    /// Configured text of the first copyright statement.
    pub fn default_copyright(&self) -> &str {
        self.copyright
            .first()
            .and_then(|name| self.copyright.text(name))
            .unwrap_or_default()
    }
}

fn flag_from_bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_parses() {
        let config = parse(DEFAULT_CONFIG_JSON).unwrap();
        assert!(config.accept_nopadding);
        assert_eq!(config.repocode, "ApoSU");
        assert_eq!(config.deck.first(), Some("Studer"));
        assert_eq!(config.deck.text("Studer"), Some("Studer A810 SN:11223344"));
        assert!(!config.deck.texts.contains_key("list"));
        assert_eq!(config.fileuse.get("pres").map(String::as_str), Some("Preservation Master"));
        assert_eq!(config.tape_type, vec!["", "CrO2", "Metal"]);
        assert!(config.default_copyright().starts_with("Publication and other forms"));
    }

    #[test]
    fn default_regex_captures_identifier_use_and_date() {
        let config = parse(DEFAULT_CONFIG_JSON).unwrap();
        let rules = config.naming_rules().unwrap();
        let caps = rules
            .pattern
            .captures("ApoSU_2014-01-02_RL1_010101_pres_20200102.wav")
            .unwrap();
        assert_eq!(&caps[1], "2014-01-02_RL1");
        assert_eq!(&caps[2], "pres");
        assert_eq!(&caps[3], "20200102");
    }

    #[test]
    fn accept_nopadding_accepts_booleans() {
        let text = DEFAULT_CONFIG_JSON.replace("\"accept-nopadding\": 1", "\"accept-nopadding\": false");
        let config = parse(&text).unwrap();
        assert!(!config.accept_nopadding);
    }

    #[test]
    fn rejects_pattern_without_three_groups() {
        let err = NamingRules::new(r"(.*)_(\d+)\.wav", BTreeMap::new(), "X").unwrap_err();
        assert!(matches!(err, ConfigError::MissingCaptureGroups { found: 2, .. }));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let err = NamingRules::new(r"([a-z", BTreeMap::new(), "X").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { .. }));
    }

    #[test]
    fn pattern_is_anchored_at_start() {
        let rules = NamingRules::new(r"([a-z]+)_([a-z]+)_(\d+)", BTreeMap::new(), "X").unwrap();
        assert!(rules.pattern.is_match("abc_pres_20200102"));
        assert!(!rules.pattern.is_match("1_abc_pres_20200102"));
    }
}
