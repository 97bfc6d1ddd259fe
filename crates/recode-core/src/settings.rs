//! Decoder settings loaded from TOML.
//!
//! - `parse_settings_toml(toml_content)` parses and validates a full file
//! - `Settings::decoder()` extracts the values the beam search consumes
//! - Default values are embedded via `include_str!("default_settings.toml")`
//!
//! There is no process-wide instance: callers own their `Settings` and pass
//! a `DecoderSettings` into each decoder they build.

use serde::Deserialize;

use crate::code::MAX_CODE_LEN;
use crate::symbols::SymbolSet;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// One beam width per in-progress code length, 0 through `MAX_CODE_LEN`.
pub const NUM_LENGTHS: usize = MAX_CODE_LEN + 1;

/// Largest beam capacity; lattice slots are addressed with a `u16`.
pub const MAX_BEAM_WIDTH: usize = u16::MAX as usize;

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub beam: BeamSettings,
    pub scoring: ScoringSettings,
    pub text: TextSettings,
    #[serde(default)]
    pub symbols: SymbolSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeamSettings {
    pub widths: Vec<usize>,
    pub top_n: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    pub dict_ratio: f32,
    pub cert_offset: f32,
    pub worst_dict_cert: f32,
    pub min_certainty: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextSettings {
    pub simple_text: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolSettings {
    #[serde(default)]
    pub whitelist: String,
    #[serde(default)]
    pub blacklist: String,
}

impl SymbolSettings {
    /// Enable or disable symbols according to the white and black lists.
    pub fn apply(&self, symbols: &mut SymbolSet) {
        symbols.restrict_to(&self.whitelist);
        if !self.blacklist.is_empty() {
            symbols.disable_chars(&self.blacklist);
        }
    }
}

/// The values the beam search reads, in their final form.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderSettings {
    pub beam_widths: [usize; NUM_LENGTHS],
    pub top_n: usize,
    pub dict_ratio: f32,
    pub cert_offset: f32,
    pub worst_dict_cert: f32,
    pub min_certainty: f32,
    pub simple_text: bool,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            beam_widths: [5, 10, 16, 16, 16, 16, 16, 16, 16, 16],
            top_n: 5,
            dict_ratio: 2.25,
            cert_offset: -0.085,
            worst_dict_cert: -25.0 / 7.0,
            min_certainty: -20.0,
            simple_text: false,
        }
    }
}

impl DecoderSettings {
    /// Same capacity for every code length, capped at `MAX_BEAM_WIDTH`.
    pub fn with_uniform_width(mut self, width: usize) -> Self {
        self.beam_widths = [width.min(MAX_BEAM_WIDTH); NUM_LENGTHS];
        self
    }
}

impl Settings {
    pub fn decoder(&self) -> DecoderSettings {
        let mut beam_widths = [0usize; NUM_LENGTHS];
        // Length is checked in `validate`.
        for (dst, &src) in beam_widths.iter_mut().zip(&self.beam.widths) {
            *dst = src;
        }
        DecoderSettings {
            beam_widths,
            top_n: self.beam.top_n,
            dict_ratio: self.scoring.dict_ratio,
            cert_offset: self.scoring.cert_offset,
            worst_dict_cert: self.scoring.worst_dict_cert,
            min_certainty: self.scoring.min_certainty,
            simple_text: self.text.simple_text,
        }
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    fn invalid(field: &str, reason: &str) -> SettingsError {
        SettingsError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    if s.beam.widths.len() != NUM_LENGTHS {
        return Err(invalid(
            "beam.widths",
            &format!("must list exactly {NUM_LENGTHS} widths"),
        ));
    }
    if s.beam.widths.contains(&0) {
        return Err(invalid("beam.widths", "every width must be positive"));
    }
    if s.beam.widths.iter().any(|&w| w > MAX_BEAM_WIDTH) {
        return Err(invalid(
            "beam.widths",
            &format!("every width must be at most {MAX_BEAM_WIDTH}"),
        ));
    }
    if s.beam.top_n == 0 {
        return Err(invalid("beam.top_n", "must be positive"));
    }
    if !(s.scoring.dict_ratio > 0.0) {
        return Err(invalid("scoring.dict_ratio", "must be positive"));
    }
    if !(s.scoring.min_certainty < 0.0) {
        return Err(invalid("scoring.min_certainty", "must be negative"));
    }
    if !(s.scoring.worst_dict_cert <= 0.0) {
        return Err(invalid("scoring.worst_dict_cert", "must not be positive"));
    }
    if !s.scoring.cert_offset.is_finite() {
        return Err(invalid("scoring.cert_offset", "must be finite"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_line(key: &str, line: &str) -> String {
        DEFAULT_SETTINGS_TOML
            .lines()
            .map(|l| {
                if l.starts_with(key) {
                    line.to_string()
                } else {
                    l.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn parse_default_toml() {
        let s = parse_settings_toml(DEFAULT_SETTINGS_TOML).unwrap();
        assert_eq!(s.beam.widths, vec![5, 10, 16, 16, 16, 16, 16, 16, 16, 16]);
        assert_eq!(s.beam.top_n, 5);
        assert!((s.scoring.dict_ratio - 2.25).abs() < f32::EPSILON);
        assert!(!s.text.simple_text);
        assert!(s.symbols.whitelist.is_empty());
    }

    #[test]
    fn embedded_defaults_match_struct_default() {
        let parsed = parse_settings_toml(DEFAULT_SETTINGS_TOML).unwrap().decoder();
        let built = DecoderSettings::default();
        assert_eq!(parsed.beam_widths, built.beam_widths);
        assert_eq!(parsed.top_n, built.top_n);
        assert!((parsed.dict_ratio - built.dict_ratio).abs() < f32::EPSILON);
        assert!((parsed.worst_dict_cert - built.worst_dict_cert).abs() < 1e-5);
        assert!((parsed.cert_offset - built.cert_offset).abs() < 1e-6);
        assert!((parsed.min_certainty - built.min_certainty).abs() < f32::EPSILON);
        assert_eq!(parsed.simple_text, built.simple_text);
    }

    #[test]
    fn symbols_section_is_optional() {
        let toml = DEFAULT_SETTINGS_TOML
            .split("[symbols]")
            .next()
            .unwrap()
            .to_string();
        let s = parse_settings_toml(&toml).unwrap();
        assert!(s.symbols.blacklist.is_empty());
    }

    #[test]
    fn symbol_lists_apply() {
        let mut symbols = SymbolSet::from_texts([" ", "a", "b", "1"]);
        let settings = SymbolSettings {
            whitelist: "ab1".into(),
            blacklist: "1".into(),
        };
        settings.apply(&mut symbols);
        assert!(symbols.is_enabled(1));
        assert!(!symbols.is_enabled(3));
    }

    #[test]
    fn error_wrong_width_count() {
        let toml = with_line("widths", "widths = [5, 10, 16]");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
        assert!(err.to_string().contains("beam.widths"));
    }

    #[test]
    fn error_zero_width() {
        let toml = with_line("widths", "widths = [5, 0, 16, 16, 16, 16, 16, 16, 16, 16]");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("beam.widths"));
    }

    #[test]
    fn error_width_beyond_slot_range() {
        let toml = with_line(
            "widths",
            "widths = [5, 70000, 16, 16, 16, 16, 16, 16, 16, 16]",
        );
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("beam.widths"));
        assert!(err.to_string().contains("65535"));

        let toml = with_line(
            "widths",
            "widths = [5, 65535, 16, 16, 16, 16, 16, 16, 16, 16]",
        );
        assert!(parse_settings_toml(&toml).is_ok());
    }

    #[test]
    fn uniform_width_is_capped() {
        let s = DecoderSettings::default().with_uniform_width(1 << 20);
        assert!(s.beam_widths.iter().all(|&w| w == MAX_BEAM_WIDTH));
    }

    #[test]
    fn error_zero_top_n() {
        let toml = with_line("top_n", "top_n = 0");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("beam.top_n"));
    }

    #[test]
    fn error_non_positive_dict_ratio() {
        let toml = with_line("dict_ratio", "dict_ratio = 0.0");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("scoring.dict_ratio"));
    }

    #[test]
    fn error_non_negative_floor() {
        let toml = with_line("min_certainty", "min_certainty = 0.0");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("scoring.min_certainty"));
    }

    #[test]
    fn error_positive_worst_dict_cert() {
        let toml = with_line("worst_dict_cert", "worst_dict_cert = 1.0");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("scoring.worst_dict_cert"));
    }

    #[test]
    fn error_invalid_toml() {
        let err = parse_settings_toml("not valid toml {{{").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn error_missing_section() {
        let toml = "[beam]\nwidths = [5, 10, 16, 16, 16, 16, 16, 16, 16, 16]\ntop_n = 5\n";
        let err = parse_settings_toml(toml).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn uniform_width() {
        let s = DecoderSettings::default().with_uniform_width(3);
        assert_eq!(s.beam_widths, [3; NUM_LENGTHS]);
        assert_eq!(s.top_n, 5);
    }
}
