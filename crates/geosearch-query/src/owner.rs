//! Owner-name predicate building.
//!
//! Owner fields store katakana names with inconsistent width and small/large
//! kana, so the comparison runs through a host-side `replace(…)` folding
//! table before the LIKE: whitespace is stripped, small kana become large,
//! and everything is brought to one width. Which width depends on how the
//! field is stored (`KanaHankaku`).

/// Halfwidth small kana to their large forms.
const SMALL_HANKAKU: &[(&str, &str)] = &[
    ("ｧ", "ｱ"),
    ("ｨ", "ｲ"),
    ("ｩ", "ｳ"),
    ("ｪ", "ｴ"),
    ("ｫ", "ｵ"),
    ("ｬ", "ﾔ"),
    ("ｭ", "ﾕ"),
    ("ｮ", "ﾖ"),
    ("ｯ", "ﾂ"),
];

/// Fullwidth small kana to their large forms.
const SMALL_ZENKAKU: &[(&str, &str)] = &[
    ("ァ", "ア"),
    ("ィ", "イ"),
    ("ゥ", "ウ"),
    ("ェ", "エ"),
    ("ォ", "オ"),
    ("ャ", "ヤ"),
    ("ュ", "ユ"),
    ("ョ", "ヨ"),
    ("ッ", "ツ"),
];

/// Fullwidth katakana to halfwidth. Voiced letters map to base + sound
/// mark digraphs; ヰ/ヱ fold to their modern halfwidth readings.
const ZENKAKU_TO_HANKAKU: &[(&str, &str)] = &[
    ("ガ", "ｶﾞ"),
    ("ギ", "ｷﾞ"),
    ("グ", "ｸﾞ"),
    ("ゲ", "ｹﾞ"),
    ("ゴ", "ｺﾞ"),
    ("ザ", "ｻﾞ"),
    ("ジ", "ｼﾞ"),
    ("ズ", "ｽﾞ"),
    ("ゼ", "ｾﾞ"),
    ("ゾ", "ｿﾞ"),
    ("ダ", "ﾀﾞ"),
    ("ヂ", "ﾁﾞ"),
    ("ヅ", "ﾂﾞ"),
    ("デ", "ﾃﾞ"),
    ("ド", "ﾄﾞ"),
    ("バ", "ﾊﾞ"),
    ("ビ", "ﾋﾞ"),
    ("ブ", "ﾌﾞ"),
    ("ベ", "ﾍﾞ"),
    ("ボ", "ﾎﾞ"),
    ("パ", "ﾊﾟ"),
    ("ピ", "ﾋﾟ"),
    ("プ", "ﾌﾟ"),
    ("ペ", "ﾍﾟ"),
    ("ポ", "ﾎﾟ"),
    ("ア", "ｱ"),
    ("イ", "ｲ"),
    ("ウ", "ｳ"),
    ("エ", "ｴ"),
    ("オ", "ｵ"),
    ("カ", "ｶ"),
    ("キ", "ｷ"),
    ("ク", "ｸ"),
    ("ケ", "ｹ"),
    ("コ", "ｺ"),
    ("サ", "ｻ"),
    ("シ", "ｼ"),
    ("ス", "ｽ"),
    ("セ", "ｾ"),
    ("ソ", "ｿ"),
    ("タ", "ﾀ"),
    ("チ", "ﾁ"),
    ("ツ", "ﾂ"),
    ("テ", "ﾃ"),
    ("ト", "ﾄ"),
    ("ナ", "ﾅ"),
    ("ニ", "ﾆ"),
    ("ヌ", "ﾇ"),
    ("ネ", "ﾈ"),
    ("ノ", "ﾉ"),
    ("ハ", "ﾊ"),
    ("ヒ", "ﾋ"),
    ("フ", "ﾌ"),
    ("ヘ", "ﾍ"),
    ("ホ", "ﾎ"),
    ("マ", "ﾏ"),
    ("ミ", "ﾐ"),
    ("ム", "ﾑ"),
    ("メ", "ﾒ"),
    ("モ", "ﾓ"),
    ("ヤ", "ﾔ"),
    ("ユ", "ﾕ"),
    ("ヨ", "ﾖ"),
    ("ラ", "ﾗ"),
    ("リ", "ﾘ"),
    ("ル", "ﾙ"),
    ("レ", "ﾚ"),
    ("ロ", "ﾛ"),
    ("ワ", "ﾜ"),
    ("ヰ", "ｲ"),
    ("ヱ", "ｴ"),
    ("ヲ", "ｦ"),
    ("ン", "ﾝ"),
];

/// The width-folding pairs for one direction. Digraph entries (the voiced
/// halfwidth forms) come first so `ｶﾞ` folds as one unit, not as `ｶ` plus a
/// stray sound mark.
fn width_pairs(hankaku: bool) -> Vec<(String, String)> {
    if hankaku {
        ZENKAKU_TO_HANKAKU
            .iter()
            .map(|&(from, to)| (from.to_string(), to.to_string()))
            .collect()
    } else {
        ZENKAKU_TO_HANKAKU
            .iter()
            .filter(|&&(from, _)| from != "ヰ" && from != "ヱ")
            .map(|&(from, to)| (to.to_string(), from.to_string()))
            .collect()
    }
}

/// The complete folding table applied to the field value: strip spaces,
/// fold small kana on both widths, then unify the width.
fn fold_table(hankaku: bool) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = vec![
        (" ".to_string(), String::new()),
        ("　".to_string(), String::new()),
    ];
    for &(from, to) in SMALL_HANKAKU.iter().chain(SMALL_ZENKAKU) {
        pairs.push((from.to_string(), to.to_string()));
    }
    pairs.extend(width_pairs(hankaku));
    pairs
}

/// Builds the owner-name predicate: the field folded through the
/// replace-table, compared with LIKE.
///
/// `value` should already be normalized and small-kana folded to match the
/// table's output. `substring` selects `%value%` over the prefix form
/// `value%`.
pub fn owner_predicate(field: &str, value: &str, hankaku: bool, substring: bool) -> String {
    let pairs = fold_table(hankaku);
    let from_list: Vec<String> = pairs.iter().map(|(from, _)| format!("'{from}'")).collect();
    let to_list: Vec<String> = pairs.iter().map(|(_, to)| format!("'{to}'")).collect();
    let pattern = if substring {
        format!("%{value}%")
    } else {
        format!("{value}%")
    };
    format!(
        "replace(\"{field}\", array({}), array({})) LIKE '{pattern}'",
        from_list.join(","),
        to_list.join(","),
    )
}
