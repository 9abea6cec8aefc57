//! 表記の標準化
//!
//! このモジュールは、語索引のキーと検索文字列の両方に適用する表記の
//! 標準化処理を提供します。幅の折り畳み（NFKC互換正規化）、旧字体から
//! 新字体への変換、および約物の除去を行います。索引構築時と検索時に
//! 同一の関数を通すことで、表記揺れのある地名同士が同じキーに写ります。

use unicode_normalization::UnicodeNormalization;

/// 旧字体から新字体への対応表
///
/// 地名表記で実際に現れる字に限定した最小限の表です。
const OLD_TO_NEW_KANJI: &[(char, char)] = &[
    ('亞', '亜'),
    ('惡', '悪'),
    ('壓', '圧'),
    ('圍', '囲'),
    ('醫', '医'),
    ('榮', '栄'),
    ('驛', '駅'),
    ('圓', '円'),
    ('鹽', '塩'),
    ('奧', '奥'),
    ('橫', '横'),
    ('溫', '温'),
    ('會', '会'),
    ('舘', '館'),
    ('龜', '亀'),
    ('舊', '旧'),
    ('廣', '広'),
    ('國', '国'),
    ('濟', '済'),
    ('櫻', '桜'),
    ('澤', '沢'),
    ('濱', '浜'),
    ('條', '条'),
    ('眞', '真'),
    ('瀨', '瀬'),
    ('淺', '浅'),
    ('莊', '荘'),
    ('藏', '蔵'),
    ('瀧', '滝'),
    ('燈', '灯'),
    ('縣', '県'),
    ('邊', '辺'),
    ('豐', '豊'),
    ('萬', '万'),
    ('彌', '弥'),
    ('龍', '竜'),
    ('灣', '湾'),
];

/// 除去対象の約物かどうかを判定します。
fn is_skipped_punctuation(c: char) -> bool {
    matches!(
        c,
        '、' | '。' | '・' | '「' | '」' | '『' | '』' | '，' | '．'
    ) || c.is_whitespace()
}

/// 旧字体を新字体に写します。対応表にない字はそのまま返します。
fn fold_kanji(c: char) -> char {
    OLD_TO_NEW_KANJI
        .iter()
        .find(|(old, _)| *old == c)
        .map_or(c, |(_, new)| *new)
}

/// 表記を標準化します。
///
/// NFKC互換正規化で全角英数字を半角に、半角カナを全角に折り畳み、
/// 旧字体を新字体に変換し、空白と約物を除去します。
///
/// # 引数
///
/// * `text` - 標準化対象の文字列
///
/// # 戻り値
///
/// 標準化された文字列
pub fn standardize(text: &str) -> String {
    text.nfkc()
        .filter(|c| !is_skipped_punctuation(*c))
        .map(fold_kanji)
        .collect()
}
