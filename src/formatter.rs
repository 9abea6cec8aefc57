//! 解析結果の出力整形
//!
//! このモジュールは、トークン列を人間可読のテキストに整形する
//! フォーマッタを提供します。MeCab既定形式とChaSen形式の2種類を
//! 実装しています。

use crate::token::Token;

/// トークン列の出力整形インタフェース
pub trait TokenFormatter {
    /// 1トークンを整形します。末尾の改行は含みません。
    fn format_token(&self, token: &Token) -> String;

    /// 文頭トークンに対応する文字列を返します。
    fn bos(&self) -> &'static str;

    /// 文末トークンに対応する文字列を返します。
    fn eos(&self) -> &'static str;

    /// トークン列全体を整形します。
    ///
    /// 文頭・文末トークンは先頭・末尾の区切り文字列に置き換えます。
    fn format_tokens(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for (i, token) in tokens.iter().enumerate() {
            if token.is_bos_eos() {
                out.push_str(if i == 0 { self.bos() } else { self.eos() });
            } else {
                out.push_str(&self.format_token(token));
                out.push('\n');
            }
        }
        out
    }
}

/// MeCab既定形式のフォーマッタ
///
/// `表層形\t素性9項目` を1行として出力します。
#[derive(Debug, Default)]
pub struct DefaultTokenFormatter;

impl TokenFormatter for DefaultTokenFormatter {
    fn format_token(&self, token: &Token) -> String {
        format!("{}\t{}", token.surface, token.feature_string())
    }

    fn bos(&self) -> &'static str {
        "\n"
    }

    fn eos(&self) -> &'static str {
        "EOS\n"
    }
}

/// ChaSen形式のフォーマッタ
///
/// `表層形\t読み\t原形\t品詞階層\t活用形\t活用型` を1行として
/// 出力します。`*` の項目は空欄にします。
#[derive(Debug, Default)]
pub struct ChasenTokenFormatter;

/// `*` を空欄に写します。
fn blank_star(value: &str) -> &str {
    if value == "*" {
        ""
    } else {
        value
    }
}

impl TokenFormatter for ChasenTokenFormatter {
    fn format_token(&self, token: &Token) -> String {
        let mut pos = token.pos.clone();
        for sub in [&token.subclass1, &token.subclass2, &token.subclass3] {
            if sub.as_str() != "*" {
                pos.push('-');
                pos.push_str(sub);
            }
        }
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            token.surface,
            blank_star(&token.yomi),
            blank_star(&token.lemma),
            pos,
            blank_star(&token.conjugated_form),
            blank_star(&token.conjugation_type),
        )
    }

    fn bos(&self) -> &'static str {
        ""
    }

    fn eos(&self) -> &'static str {
        "EOS"
    }
}

/// フォーマッタ名から実装を選択します。
///
/// 未知の名前の場合は既定のフォーマッタを返します。
pub fn formatter_for(name: &str) -> Box<dyn TokenFormatter> {
    match name {
        "ChasenGeowordFormatter" => Box::new(ChasenTokenFormatter),
        _ => Box::new(DefaultTokenFormatter),
    }
}
