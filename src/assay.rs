//! Parsing of compact component codes such as `ScRNA-seqLevel1` into an
//! assay name and processing level.
//!
//! A code is split on [`LEVEL_TOKEN`]; the part before it is turned into a
//! display name by applying [`NAME_RULES`] in order.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const LEVEL_TOKEN: &str = "Level";
pub const OTHER_ASSAY: &str = "Other Assay";
pub const OTHER_LEVEL: &str = "Other";
pub const UNKNOWN_LEVEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRule {
    pub label: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
}

/// Ordered substitutions turning a camel-form code into a display name.
pub const NAME_RULES: [NameRule; 3] = [
    NameRule {
        label: "camel-boundary",
        pattern: r"([A-Z])([A-Z])([a-z])|([a-z])([A-Z])",
        replacement: "$1$4 $2$3$5",
    },
    // a leading sc/sn is always lower case and glued to the next word
    NameRule {
        label: "sc-prefix",
        pattern: r"^Sc ",
        replacement: "sc",
    },
    NameRule {
        label: "sn-prefix",
        pattern: r"^Sn ",
        replacement: "sn",
    },
];

pub struct CompiledNameRule {
    pub rule: NameRule,
    regex: Regex,
}

impl CompiledNameRule {
    pub fn apply(&self, input: &str) -> String {
        self.regex
            .replace_all(input, self.rule.replacement)
            .into_owned()
    }
}

static COMPILED_RULES: LazyLock<Vec<CompiledNameRule>> = LazyLock::new(|| {
    NAME_RULES
        .iter()
        .map(|rule| CompiledNameRule {
            rule: *rule,
            regex: Regex::new(rule.pattern).expect("assay name rule pattern"),
        })
        .collect()
});

pub fn name_rules() -> &'static [CompiledNameRule] {
    &COMPILED_RULES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssayType {
    pub name: String,
    pub level: Option<String>,
}

/// Parses a component code. An imaging assay type, when given, replaces the
/// parsed name but keeps the parsed level.
pub fn parse_assay_type(component: &str, imaging_assay_type: Option<&str>) -> AssayType {
    let mut segments = component.split(LEVEL_TOKEN);
    let extracted = segments.next().unwrap_or_default();
    let level = segments.next().map(|rest| format!("{LEVEL_TOKEN} {rest}"));

    if let Some(imaging) = imaging_assay_type.filter(|value| !value.is_empty()) {
        return AssayType {
            name: imaging.to_string(),
            level,
        };
    }

    if extracted.is_empty() {
        return AssayType {
            name: component.to_string(),
            level: None,
        };
    }

    let name = name_rules()
        .iter()
        .fold(extracted.to_string(), |name, rule| rule.apply(&name));
    AssayType { name, level }
}

/// Assay name and level as attached to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssayClassification {
    pub assay_name: Option<String>,
    pub level: Option<String>,
}

pub fn classify_assay(
    component: Option<&str>,
    imaging_assay_type: Option<&str>,
    assay_type: Option<&str>,
) -> AssayClassification {
    let Some(component) = component else {
        return AssayClassification {
            assay_name: None,
            level: Some(UNKNOWN_LEVEL.to_string()),
        };
    };

    let parsed = parse_assay_type(component, imaging_assay_type);
    if parsed.name == OTHER_ASSAY {
        return AssayClassification {
            assay_name: Some(assay_type.unwrap_or(OTHER_ASSAY).to_string()),
            level: Some(OTHER_LEVEL.to_string()),
        };
    }

    AssayClassification {
        assay_name: Some(parsed.name),
        level: parsed.level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_compile() {
        assert_eq!(name_rules().len(), NAME_RULES.len());
    }

    #[test]
    fn only_second_level_segment_is_used() {
        let parsed = parse_assay_type("FooLevel2Level3", None);
        assert_eq!(parsed.level.as_deref(), Some("Level 2"));
        assert_eq!(parsed.name, "Foo");
    }
}
