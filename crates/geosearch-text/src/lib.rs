//! Japanese text normalization for geosearch.
//!
//! Search input arrives from users typing in a Japanese IME, so fullwidth
//! ASCII and digits (`１２３ＡＢＣ`) are common where the layer attributes
//! store halfwidth text. [`normalize`] folds those to halfwidth before a
//! predicate is built. Owner-name search additionally folds small kana to
//! their large forms via [`fold_small_kana`].

#![warn(missing_docs)]

/// Converts fullwidth ASCII and digits to their halfwidth equivalents.
///
/// Characters in the fullwidth block U+FF01..=U+FF5E map to U+0021..=U+007E
/// (this covers digits, letters, and punctuation), and the ideographic space
/// U+3000 maps to an ASCII space. Katakana and every other character pass
/// through unchanged.
///
/// The function is pure, total, and idempotent: the halfwidth range is a
/// fixed point, so `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            '\u{ff01}'..='\u{ff5e}' => {
                // Fullwidth forms are a contiguous block offset from ASCII.
                char::from_u32(ch as u32 - 0xff01 + 0x21).unwrap_or(ch)
            }
            '\u{3000}' => ' ',
            other => other,
        })
        .collect()
}

/// Fullwidth small kana and the large forms they fold to.
const SMALL_KANA_ZENKAKU: &[(char, char)] = &[
    ('ャ', 'ヤ'),
    ('ュ', 'ユ'),
    ('ョ', 'ヨ'),
    ('ッ', 'ツ'),
    ('ァ', 'ア'),
    ('ィ', 'イ'),
    ('ゥ', 'ウ'),
    ('ェ', 'エ'),
    ('ォ', 'オ'),
];

/// Halfwidth small kana and the large forms they fold to.
const SMALL_KANA_HANKAKU: &[(char, char)] = &[
    ('ｬ', 'ﾔ'),
    ('ｭ', 'ﾕ'),
    ('ｮ', 'ﾖ'),
    ('ｯ', 'ﾂ'),
    ('ｧ', 'ｱ'),
    ('ｨ', 'ｲ'),
    ('ｩ', 'ｳ'),
    ('ｪ', 'ｴ'),
    ('ｫ', 'ｵ'),
];

/// Replaces small kana with their large forms.
///
/// Owner names are stored with inconsistent small/large kana (シヨウジ vs
/// ショウジ), so the search folds both sides to large forms. `hankaku`
/// selects which character set is folded: `true` applies the halfwidth
/// table (ｬｭｮｯｧｨｩｪｫ), `false` the fullwidth table (ャュョッァィゥェォ).
pub fn fold_small_kana(value: &str, hankaku: bool) -> String {
    let table = if hankaku {
        SMALL_KANA_HANKAKU
    } else {
        SMALL_KANA_ZENKAKU
    };
    value
        .chars()
        .map(|ch| {
            table
                .iter()
                .find(|(small, _)| *small == ch)
                .map_or(ch, |(_, large)| *large)
        })
        .collect()
}

/// Returns true when `value` reads as a signed decimal number.
///
/// This is the test that decides whether numeric fields join an all-fields
/// search: a leading `-` and a single `.` are allowed, everything else must
/// be an ASCII digit. Run [`normalize`] first so fullwidth digits count.
pub fn looks_numeric(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let digits = unsigned.replacen('.', "", 1);
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_fullwidth_digits() {
        assert_eq!(normalize("１２３"), "123");
    }

    #[test]
    fn test_normalize_fullwidth_ascii() {
        assert_eq!(normalize("ＡＢｃ－１"), "ABc-1");
        assert_eq!(normalize("（１２）"), "(12)");
    }

    #[test]
    fn test_normalize_ideographic_space() {
        assert_eq!(normalize("佐藤　太郎"), "佐藤 太郎");
    }

    #[test]
    fn test_normalize_leaves_katakana() {
        assert_eq!(normalize("サトウ"), "サトウ");
        assert_eq!(normalize("ｻﾄｳ"), "ｻﾄｳ");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = ["１２３ＡＢＣ", "12-3", "サトウ　ｻﾄｳ", "混在１ｱa"];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_fold_small_kana_zenkaku() {
        assert_eq!(fold_small_kana("シャッター", false), "シヤツター");
        // Halfwidth characters are untouched in zenkaku mode.
        assert_eq!(fold_small_kana("ｼｬ", false), "ｼｬ");
    }

    #[test]
    fn test_fold_small_kana_hankaku() {
        assert_eq!(fold_small_kana("ｼｬｯﾀｰ", true), "ｼﾔﾂﾀｰ");
        // Fullwidth characters are untouched in hankaku mode.
        assert_eq!(fold_small_kana("シャ", true), "シャ");
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("123"));
        assert!(looks_numeric("-12.5"));
        assert!(looks_numeric(".5"));
        assert!(!looks_numeric(""));
        assert!(!looks_numeric("-"));
        assert!(!looks_numeric("12-3"));
        assert!(!looks_numeric("1.2.3"));
        assert!(!looks_numeric("abc"));
    }
}
