use chrono::{DateTime, Utc};

use crate::watermark::{OutputFormat, WatermarkConfig, WatermarkMode};

const MAX_PREFIX_CHARS: usize = 20;
const FALLBACK_PREFIX: &str = "watermark";

/// `{prefix}_{timestamp}.{ext}` for a downloaded image
pub fn export_filename(
    config: &WatermarkConfig,
    format: OutputFormat,
    timestamp: DateTime<Utc>,
) -> String {
    format!(
        "{}_{}.{}",
        filename_prefix(config),
        timestamp.timestamp_millis(),
        format.extension()
    )
}

/// Preset id in preset mode, otherwise a sanitized prefix of the custom text
pub fn filename_prefix(config: &WatermarkConfig) -> String {
    match config.mode {
        WatermarkMode::Preset => config.preset_id.as_str().to_string(),
        WatermarkMode::Custom => {
            let prefix = sanitize_prefix(config.text.trim());
            if prefix.is_empty() {
                FALLBACK_PREFIX.to_string()
            } else {
                prefix
            }
        }
    }
}

/// Keep word characters and CJK ideographs, replace everything else with `_`
pub fn sanitize_prefix(text: &str) -> String {
    text.chars()
        .take(MAX_PREFIX_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || is_cjk(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn is_cjk(c: char) -> bool {
    matches!(
        c,
        '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::{PresetId, apply_preset};
    use chrono::TimeZone;

    fn at_epoch_plus(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_preset_filename_uses_preset_id() {
        let mut config = WatermarkConfig::default();
        apply_preset(&mut config, PresetId::DocumentCopy);
        assert_eq!(
            export_filename(&config, OutputFormat::Png, at_epoch_plus(1_700_000_000_123)),
            "document-copy_1700000000123.png"
        );
    }

    #[test]
    fn test_custom_text_is_sanitized() {
        let config = WatermarkConfig::custom("For KYC only! 2024/06");
        assert_eq!(filename_prefix(&config), "For_KYC_only__2024_0");
    }

    #[test]
    fn test_cjk_characters_are_kept() {
        let config = WatermarkConfig::custom("僅供身分驗證使用 (copy)");
        assert_eq!(filename_prefix(&config), "僅供身分驗證使用__copy_");
    }

    #[test]
    fn test_prefix_truncated_to_twenty_chars() {
        let config = WatermarkConfig::custom("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(filename_prefix(&config), "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_empty_custom_text_uses_fallback() {
        let config = WatermarkConfig::custom("   ");
        assert_eq!(
            export_filename(
                &config,
                OutputFormat::Jpeg { quality: 95 },
                at_epoch_plus(42)
            ),
            "watermark_42.jpg"
        );
    }
}
