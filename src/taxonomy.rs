//! The taxonomy code grammar: parsing and rendering of module identifiers.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

/// Delimiter used when rendering a module code unless the caller picks one.
///
/// Label tokens handed to fastText use `_` because `.` carries meaning in
/// some of its tooling; CSV inputs usually arrive with `.`.
pub const DEFAULT_MODULE_DELIMITER: &str = "_";

/// Delimiters accepted between the section and module groups when parsing.
pub const MODULE_DELIMITERS: [&str; 2] = ["_", "."];

/// Prefix fastText puts on supervised labels.
pub const LABEL_PREFIX: &str = "__label__";

lazy_static! {
    static ref BARE_CODE: Regex =
        Regex::new(r"^[Ss](\d{1,2})(?:_|\.)[Mm](\d{1,2})$").expect("valid module code pattern");
}

/// Errors from parsing or constructing taxonomy codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxonomyError {
    #[error("invalid module code: {0:?}")]
    InvalidCode(String),
    #[error("section and module numbers must be positive")]
    NonPositive,
    #[error("module code delimiter set cannot be empty")]
    EmptyDelimiters,
}

/// A module as defined in the taxonomy: a section number plus a module
/// number within that section, rendered as e.g. `S1_M1` or `S10.M10`.
///
/// Both numbers are strictly positive; values are immutable once
/// constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Module {
    pub section: NonZeroU32,
    pub module: NonZeroU32,
}

impl Module {
    /// Constructs a module code, rejecting zero in either position.
    pub fn new(section: u32, module: u32) -> Result<Self, TaxonomyError> {
        match (NonZeroU32::new(section), NonZeroU32::new(module)) {
            (Some(section), Some(module)) => Ok(Self { section, module }),
            _ => Err(TaxonomyError::NonPositive),
        }
    }

    /// Parses a module code, optionally prefixed (e.g. `__label__S1_M1`),
    /// accepting any of the given delimiters between the two groups.
    ///
    /// The prefix match is exact and case-sensitive; only the `S` and `M`
    /// letters are case-insensitive. Prefer a [`ModuleMatcher`] when parsing
    /// many codes with the same settings.
    pub fn parse(s: &str, label_prefix: &str, delimiters: &[&str]) -> Result<Self, TaxonomyError> {
        ModuleMatcher::new(label_prefix, delimiters)?.parse(s)
    }

    /// Renders the code with an explicit delimiter, e.g. `S10.M2`.
    pub fn to_code(&self, delimiter: &str) -> String {
        format!("S{}{}M{}", self.section, delimiter, self.module)
    }

    /// Renders the label token consumed by fastText, e.g. `__label__S1_M1`.
    pub fn to_label(&self, label_prefix: &str, delimiter: &str) -> String {
        format!("{}{}", label_prefix, self.to_code(delimiter))
    }

    fn from_captures(caps: &regex::Captures<'_>, original: &str) -> Result<Self, TaxonomyError> {
        // The groups are 1-2 digits, so parsing cannot overflow; zero still
        // has to be rejected here.
        let section: u32 = caps[1]
            .parse()
            .map_err(|_| TaxonomyError::InvalidCode(original.to_string()))?;
        let module: u32 = caps[2]
            .parse()
            .map_err(|_| TaxonomyError::InvalidCode(original.to_string()))?;
        Self::new(section, module).map_err(|_| TaxonomyError::InvalidCode(original.to_string()))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "S{}{}M{}",
            self.section, DEFAULT_MODULE_DELIMITER, self.module
        )
    }
}

impl FromStr for Module {
    type Err = TaxonomyError;

    /// Parses an unprefixed code with the default delimiter set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = BARE_CODE
            .captures(s)
            .ok_or_else(|| TaxonomyError::InvalidCode(s.to_string()))?;
        Module::from_captures(&caps, s)
    }
}

/// A compiled module code matcher with a fixed prefix and delimiter set.
///
/// Matches the whole input or nothing; trailing or leading characters make
/// the code invalid.
#[derive(Debug, Clone)]
pub struct ModuleMatcher {
    pattern: Regex,
}

impl ModuleMatcher {
    pub fn new(label_prefix: &str, delimiters: &[&str]) -> Result<Self, TaxonomyError> {
        if delimiters.is_empty() {
            return Err(TaxonomyError::EmptyDelimiters);
        }
        let delimiters: Vec<String> = delimiters.iter().map(|d| regex::escape(d)).collect();
        let pattern = format!(
            r"^{}[Ss](\d{{1,2}})(?:{})[Mm](\d{{1,2}})$",
            regex::escape(label_prefix),
            delimiters.join("|"),
        );
        // The prefix and delimiters are escaped, so the pattern always
        // compiles.
        let pattern = Regex::new(&pattern).expect("escaped module code pattern");
        Ok(Self { pattern })
    }

    pub fn parse(&self, s: &str) -> Result<Module, TaxonomyError> {
        let caps = self
            .pattern
            .captures(s)
            .ok_or_else(|| TaxonomyError::InvalidCode(s.to_string()))?;
        Module::from_captures(&caps, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(section: u32, module: u32) -> Module {
        Module::new(section, module).unwrap()
    }

    #[test]
    fn test_parse() {
        let cases = [
            ("s1.m1", "", vec!["."], module(1, 1)),
            ("s10.m10", "", vec!["."], module(10, 10)),
            ("s1.m1", "", vec![".", "_"], module(1, 1)),
            ("s1_m1", "", vec![".", "_"], module(1, 1)),
            ("S1_M1", "", vec![".", "_"], module(1, 1)),
            ("__label__s1.m1", "__label__", vec![".", "_"], module(1, 1)),
        ];
        for (input, prefix, delimiters, expected) in cases {
            assert_eq!(
                Module::parse(input, prefix, &delimiters).unwrap(),
                expected,
                "parsing {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_invalid() {
        let cases = [
            ("", "", vec!["."]),
            ("s1.m1", "", vec!["_"]),
            ("s1.m1", "__label__", vec!["."]),
            ("__label__s1.m1", "", vec!["."]),
            ("s0.m1", "", vec!["."]),
            ("s1.m0", "", vec!["."]),
            ("s100.m1", "", vec!["."]),
            ("s1.m1 ", "", vec!["."]),
            ("xs1.m1", "", vec!["."]),
            ("s1.m1\n", "", vec!["."]),
        ];
        for (input, prefix, delimiters) in cases {
            assert!(
                matches!(
                    Module::parse(input, prefix, &delimiters),
                    Err(TaxonomyError::InvalidCode(_))
                ),
                "parsing {:?}",
                input
            );
        }
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert!(Module::parse("__LABEL__s1.m1", "__label__", &["."]).is_err());
    }

    #[test]
    fn test_empty_delimiters() {
        assert_eq!(
            Module::parse("s1.m1", "", &[]),
            Err(TaxonomyError::EmptyDelimiters)
        );
    }

    #[test]
    fn test_to_code() {
        assert_eq!(module(1, 1).to_code("_"), "S1_M1");
        assert_eq!(module(1, 1).to_code("."), "S1.M1");
        assert_eq!(module(10, 10).to_code("."), "S10.M10");
    }

    #[test]
    fn test_to_label() {
        assert_eq!(module(1, 1).to_label("__label__", "_"), "__label__S1_M1");
        assert_eq!(module(4, 17).to_label("", "."), "S4.M17");
    }

    #[test]
    fn test_display_uses_default_delimiter() {
        assert_eq!(module(3, 12).to_string(), "S3_M12");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("s2_m4".parse::<Module>().unwrap(), module(2, 4));
        assert_eq!("S2.M4".parse::<Module>().unwrap(), module(2, 4));
        assert!("__label__S2.M4".parse::<Module>().is_err());
    }

    #[test]
    fn test_new_rejects_zero() {
        assert_eq!(Module::new(0, 1), Err(TaxonomyError::NonPositive));
        assert_eq!(Module::new(1, 0), Err(TaxonomyError::NonPositive));
    }
}
