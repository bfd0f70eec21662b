//! Result-metadata helpers shared by the remote and local flows:
//! compression ratio, dimension-string parsing, output naming, and
//! display-friendly sizes.

use crate::types::Dimensions;

/// Percentage reduction in byte size, rounded to the nearest integer.
///
/// Defined as 0 when `original` is 0. Growth yields a negative value;
/// the result is deliberately not clamped.
#[must_use]
#[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn compression_ratio(original: u64, output: u64) -> i32 {
    if original == 0 {
        return 0;
    }
    let reduction = (original as f64 - output as f64) / original as f64 * 100.0;
    reduction.round() as i32
}

/// Parse a `"WIDTHxHEIGHT"` dimension string as reported by the API.
///
/// Malformed strings (missing separator, non-numeric components)
/// resolve to 0x0 rather than failing.
#[must_use]
pub fn parse_dimensions(value: &str) -> Dimensions {
    value
        .split_once('x')
        .and_then(|(w, h)| {
            Some(Dimensions::new(
                w.trim().parse().ok()?,
                h.trim().parse().ok()?,
            ))
        })
        .unwrap_or_default()
}

/// Replace a file name's extension with `.webp`.
///
/// The final dot-extension is stripped when present; names without one
/// get `.webp` appended as-is.
#[must_use]
pub fn webp_file_name(original: &str) -> String {
    let base = match original.rsplit_once('.') {
        Some((base, ext)) if !ext.is_empty() && !ext.contains('/') => base,
        _ => original,
    };
    format!("{base}.webp")
}

/// Human-readable file size, e.g. `"1.5 KB"` or `"2.35 MB"`.
///
/// Rounded to two decimals with trailing zeros dropped.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_owned();
    }
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let exponent = (((bytes as f64).ln() / 1024_f64.ln()).floor() as usize).min(UNITS.len() - 1);
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    let value = (bytes as f64 / 1024_f64.powi(exponent as i32) * 100.0).round() / 100.0;
    format!("{value} {}", UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_halved_is_fifty() {
        assert_eq!(compression_ratio(100, 50), 50);
    }

    #[test]
    fn ratio_zero_original_is_zero() {
        assert_eq!(compression_ratio(0, 50), 0);
        assert_eq!(compression_ratio(0, 0), 0);
    }

    #[test]
    fn ratio_growth_goes_negative() {
        assert_eq!(compression_ratio(100, 150), -50);
    }

    #[test]
    fn ratio_rounds_to_nearest() {
        // 2/3 reduction = 66.67%.
        assert_eq!(compression_ratio(3, 1), 67);
    }

    #[test]
    fn parse_well_formed_dimensions() {
        assert_eq!(parse_dimensions("3840x2160"), Dimensions::new(3840, 2160));
    }

    #[test]
    fn parse_tolerates_whitespace() {
        assert_eq!(
            parse_dimensions(" 1920 x 1080 "),
            Dimensions::new(1920, 1080),
        );
    }

    #[test]
    fn parse_malformed_resolves_to_zero() {
        assert_eq!(parse_dimensions("abcxdef"), Dimensions::default());
        assert_eq!(parse_dimensions("1920x"), Dimensions::default());
        assert_eq!(parse_dimensions("1080"), Dimensions::default());
        assert_eq!(parse_dimensions(""), Dimensions::default());
    }

    #[test]
    fn webp_name_replaces_extension_case_insensitively() {
        assert_eq!(webp_file_name("photo.JPEG"), "photo.webp");
        assert_eq!(webp_file_name("photo.png"), "photo.webp");
    }

    #[test]
    fn webp_name_appends_when_no_extension() {
        assert_eq!(webp_file_name("photo"), "photo.webp");
    }

    #[test]
    fn webp_name_strips_only_final_extension() {
        assert_eq!(webp_file_name("archive.tar.gz"), "archive.tar.webp");
    }

    #[test]
    fn webp_name_ignores_dots_in_directories() {
        assert_eq!(webp_file_name("a.b/photo"), "a.b/photo.webp");
    }

    #[test]
    fn file_size_zero() {
        assert_eq!(format_file_size(0), "0 B");
    }

    #[test]
    fn file_size_bytes_and_kilobytes() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
    }

    #[test]
    fn file_size_megabytes() {
        assert_eq!(format_file_size(3 * 1024 * 1024 + 512 * 1024), "3.5 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5 GB");
    }
}
