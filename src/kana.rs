//! Static kana-group table.
//!
//! The battle core only consults this to check that a room's configured
//! groups yield a non-empty prompt pool; answer checking happens client-side
//! and reaches the server as score submissions.

use std::collections::HashMap;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy)]
pub struct KanaDef {
    pub glyph: &'static str,
    pub reading: &'static str,
}

macro_rules! defs {
    ($(($glyph:literal, $reading:literal)),* $(,)?) => {
        vec![$(KanaDef { glyph: $glyph, reading: $reading }),*]
    };
}

static CHAR_GROUPS: Lazy<HashMap<&'static str, Vec<KanaDef>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("hsingle", defs![("あ", "a"), ("い", "i"), ("う", "u"), ("え", "e"), ("お", "o")]);
    m.insert("hk", defs![("か", "ka"), ("き", "ki"), ("く", "ku"), ("け", "ke"), ("こ", "ko")]);
    m.insert("hs", defs![("さ", "sa"), ("し", "shi"), ("す", "su"), ("せ", "se"), ("そ", "so")]);
    m.insert("ht", defs![("た", "ta"), ("ち", "chi"), ("つ", "tsu"), ("て", "te"), ("と", "to")]);
    m.insert("hn", defs![("な", "na"), ("に", "ni"), ("ぬ", "nu"), ("ね", "ne"), ("の", "no")]);
    m.insert("hh", defs![("は", "ha"), ("ひ", "hi"), ("ふ", "fu"), ("へ", "he"), ("ほ", "ho")]);
    m.insert("hm", defs![("ま", "ma"), ("み", "mi"), ("む", "mu"), ("め", "me"), ("も", "mo")]);
    m.insert("hy", defs![("や", "ya"), ("ゆ", "yu"), ("よ", "yo")]);
    m.insert("hr", defs![("ら", "ra"), ("り", "ri"), ("る", "ru"), ("れ", "re"), ("ろ", "ro")]);
    m.insert("hw", defs![("わ", "wa"), ("を", "o")]);
    m.insert("hn1", defs![("ん", "n")]);
    m.insert("hg", defs![("が", "ga"), ("ぎ", "gi"), ("ぐ", "gu"), ("げ", "ge"), ("ご", "go")]);
    m.insert("hz", defs![("ざ", "za"), ("じ", "ji"), ("ず", "zu"), ("ぜ", "ze"), ("ぞ", "zo")]);
    m.insert("hd", defs![("だ", "da"), ("ぢ", "ji"), ("づ", "zu"), ("で", "de"), ("ど", "do")]);
    m.insert("hb", defs![("ば", "ba"), ("び", "bi"), ("ぶ", "bu"), ("べ", "be"), ("ぼ", "bo")]);
    m.insert("hp", defs![("ぱ", "pa"), ("ぴ", "pi"), ("ぷ", "pu"), ("ぺ", "pe"), ("ぽ", "po")]);
    m
});

/// Look up a single group by id.
pub fn group(id: &str) -> Option<&'static [KanaDef]> {
    CHAR_GROUPS.get(id).map(|v| v.as_slice())
}

/// Total prompt-pool size for a set of group ids. Unknown ids contribute
/// nothing.
pub fn pool_size(groups: &[String]) -> usize {
    groups
        .iter()
        .filter_map(|id| group(id))
        .map(|g| g.len())
        .sum()
}
