//! Character-level Unicode classification and normalization for symbol text.

/// First precomposed Hangul syllable (가).
pub const FIRST_HANGUL: u32 = 0xAC00;
/// Number of precomposed Hangul syllables.
pub const NUM_HANGUL: u32 = 11172;
/// Leading consonant (choseong) count.
pub const HANGUL_L_COUNT: u32 = 19;
/// Vowel (jungseong) count.
pub const HANGUL_V_COUNT: u32 = 21;
/// Trailing consonant (jongseong) count, including "none".
pub const HANGUL_T_COUNT: u32 = 28;

/// Coarse script class, only as fine-grained as word splitting needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Han,
    Hangul,
    Hiragana,
    Katakana,
    Thai,
    Other,
}

/// Check the full Hiragana block (U+3040..U+309F).
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF), plus the halfwidth forms.
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c) || ('\u{FF66}'..='\u{FF9F}').contains(&c)
}

pub fn is_han(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{20000}'..='\u{2A6DF}').contains(&c)
        || ('\u{F900}'..='\u{FAFF}').contains(&c)
}

/// Precomposed syllables plus the conjoining and compatibility jamo blocks.
pub fn is_hangul(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
        || ('\u{1100}'..='\u{11FF}').contains(&c)
        || ('\u{3130}'..='\u{318F}').contains(&c)
}

pub fn is_thai(c: char) -> bool {
    ('\u{0E00}'..='\u{0E7F}').contains(&c)
}

pub fn script_of(c: char) -> Script {
    if is_han(c) {
        Script::Han
    } else if is_hangul(c) {
        Script::Hangul
    } else if is_hiragana(c) {
        Script::Hiragana
    } else if is_katakana(c) {
        Script::Katakana
    } else if is_thai(c) {
        Script::Thai
    } else {
        Script::Other
    }
}

/// Script of a symbol's text: the first character that isn't `Other` wins.
pub fn script_of_str(s: &str) -> Script {
    s.chars()
        .map(script_of)
        .find(|&sc| sc != Script::Other)
        .unwrap_or(Script::Other)
}

/// Whether text in this script is normally separated into words by spaces.
pub fn is_space_delimited_script(script: Script) -> bool {
    !matches!(
        script,
        Script::Han | Script::Hangul | Script::Hiragana | Script::Katakana | Script::Thai
    )
}

/// Split a precomposed Hangul syllable into (leading, vowel, trailing) indices.
///
/// Returns `None` for anything outside U+AC00..U+D7A3.
pub fn decompose_hangul(c: char) -> Option<(u32, u32, u32)> {
    let cp = c as u32;
    if cp < FIRST_HANGUL {
        return None;
    }
    let offset = cp - FIRST_HANGUL;
    if offset >= NUM_HANGUL {
        return None;
    }
    let n_count = HANGUL_V_COUNT * HANGUL_T_COUNT;
    Some((
        offset / n_count,
        (offset / HANGUL_T_COUNT) % HANGUL_V_COUNT,
        offset % HANGUL_T_COUNT,
    ))
}

/// Fold a single character onto its canonical form for symbol comparison.
///
/// Typographic quotes and dashes become their ASCII counterparts and
/// fullwidth ASCII variants (U+FF01..U+FF5E) shift down to ASCII.
fn fold_char(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
        '\u{00A0}' | '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        _ => c,
    }
}

/// Normalize symbol text: expand Latin ligatures and fold typographic variants.
///
/// Two symbols with the same normalized text are treated as visually
/// equivalent and may share a code.
pub fn normalize_symbol(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{FB06}' => out.push_str("st"),
            _ => out.push(fold_char(c)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_classification() {
        assert!(is_hiragana('あ'));
        assert!(!is_hiragana('ア'));
        assert!(is_katakana('ア'));
        assert!(is_katakana('ｱ'));
        assert!(is_han('漢'));
        assert!(!is_han('あ'));
        assert!(is_hangul('한'));
        assert!(is_thai('ก'));
        assert_eq!(script_of('a'), Script::Other);
    }

    #[test]
    fn test_script_of_str_skips_common() {
        assert_eq!(script_of_str("(漢"), Script::Han);
        assert_eq!(script_of_str("ab"), Script::Other);
        assert_eq!(script_of_str(""), Script::Other);
    }

    #[test]
    fn test_space_delimited() {
        assert!(is_space_delimited_script(Script::Other));
        assert!(!is_space_delimited_script(Script::Han));
        assert!(!is_space_delimited_script(Script::Thai));
    }

    #[test]
    fn test_decompose_hangul() {
        assert_eq!(decompose_hangul('가'), Some((0, 0, 0)));
        // 한 = U+D55C: L=18 (ㅎ), V=0 (ㅏ), T=4 (ㄴ)
        assert_eq!(decompose_hangul('한'), Some((18, 0, 4)));
        assert_eq!(decompose_hangul('\u{D7A3}'), Some((18, 20, 27)));
        assert_eq!(decompose_hangul('a'), None);
        assert_eq!(decompose_hangul('\u{D7A4}'), None);
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("\u{2019}"), "'");
        assert_eq!(normalize_symbol("\u{201C}"), "\"");
        assert_eq!(normalize_symbol("\u{2014}"), "-");
        assert_eq!(normalize_symbol("\u{FB01}"), "fi");
        assert_eq!(normalize_symbol("Ａ"), "A");
        assert_eq!(normalize_symbol("abc"), "abc");
        assert_eq!(normalize_symbol("漢"), "漢");
    }
}
