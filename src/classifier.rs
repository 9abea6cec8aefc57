//! 形態素トークンの役割判定
//!
//! このモジュールは、形態素トークン列の各トークンが地名語のどの部分に
//! なり得るかを品詞集合に基づいて判定し、役割フラグ（先頭・部分・
//! 接尾辞・単独・併記・後続不可・先行不可）を付与します。品詞集合は
//! 固定の表として定義され、接尾辞表・空間語・非地名語のリストは
//! プロファイルから供給されます。

use crate::profile::{Profile, Suffix};
use crate::token::Token;

/// H: 地名語の先頭となり得る品詞集合
const HEADS: &[&str] = &[
    "名詞,固有名詞",
    "名詞,サ変接続",
    "名詞,一般",
    "名詞,副詞可能",
    "接続詞",
];

/// B: 地名語の部分となり得る品詞集合
const BODIES: &[&str] = &[
    "名詞,固有名詞",
    "名詞,サ変接続",
    "名詞,一般",
    "名詞,副詞可能",
    "名詞,接尾,地域",
    "名詞,数",
    "名詞,接尾,助数詞",
    "名詞,接尾,一般",
    "接頭詞,名詞接続",
    "接頭詞,数接続",
    "助詞,連体化",
];

/// Hのうち、単独では地名語になり得ない品詞集合
const EXTSINGLE: &[&str] = &[];

/// 一語の場合に地名とそれ以外の可能性を併記する品詞集合
const ALTERNATIVES: &[&str] = &[
    "名詞,固有名詞,人名",
    "名詞,固有名詞,組織",
    "名詞,固有名詞,一般",
    "名詞,形容動詞語幹",
    "名詞,副詞可能",
    "名詞,サ変接続",
    "名詞,一般",
    "接続詞",
    "動詞,自立",
    "形容詞,自立",
    "接頭詞,名詞接続",
];

/// X: 地名語に続かない品詞集合
const STOPPERS: &[&str] = &[
    "名詞,固有名詞,組織",
    "名詞,固有名詞,一般",
    "名詞,サ変接続",
    "名詞,一般",
    "名詞,形容動詞語幹",
    "名詞,接尾,地域",
    "名詞,接尾,一般",
];

/// Q: 地名語に先行しない品詞集合
const ANTILEADERS: &[&str] = &["名詞,サ変接続", "名詞,形容動詞語幹", "名詞,接尾,一般"];

/// トークンの役割フラグ
///
/// トークン本体とは分離した注釈として保持します。
#[derive(Debug, Clone, Default)]
pub struct Annotation {
    /// 地名語の先頭となり得るか
    pub head: bool,

    /// 地名語の部分となり得るか
    pub body: bool,

    /// 地名接頭辞となり得るか。現状の品詞表では常に `false`
    pub prefix: bool,

    /// 末尾に含む地名接尾辞。含まない場合は `None`
    pub suffix: Option<Suffix>,

    /// 単独で地名語になり得るか
    pub single: bool,

    /// 一語の場合に地名以外の可能性を併記するか
    pub alternative: bool,

    /// 地名語に続かない語か
    pub stop: bool,

    /// 地名語に先行しない語か
    pub antileader: bool,

    /// 直後のトークンが地名語の先頭となり得るか
    pub next_is_head: bool,
}

/// 素性が品詞集合のいずれかに前方一致するかどうかを判定します。
fn matches_any(feature: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| feature.starts_with(p))
}

/// 役割判定の規則表
///
/// 品詞集合の固定表と、プロファイル由来の語リストを束ねます。
#[derive(Debug, Clone)]
pub struct PosRules {
    suffixes: Vec<Suffix>,
    spatials: Vec<String>,
    non_geowords: Vec<String>,
}

impl PosRules {
    /// プロファイルから規則表を生成します。
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            suffixes: profile.suffixes().to_vec(),
            spatials: profile.spatials().to_vec(),
            non_geowords: profile.non_geowords().to_vec(),
        }
    }

    /// トークン列に役割フラグを付与します。
    ///
    /// 各トークンが後続トークンの情報を参照できるよう、列を右から左に
    /// 一度だけ走査します。判定に先立ち、一部の記号が `名詞,サ変接続`
    /// になる解析器の既知の問題を `記号,一般` に書き換えます。
    ///
    /// # 引数
    ///
    /// * `tokens` - 判定対象のトークン列。記号の書き換えのため可変参照
    ///
    /// # 戻り値
    ///
    /// トークン列と同じ長さの注釈列
    pub fn annotate(&self, tokens: &mut [Token]) -> Vec<Annotation> {
        let mut annotations = vec![Annotation::default(); tokens.len()];
        let mut next_is_head = false;
        for i in (0..tokens.len()).rev() {
            rewrite_symbol_feature(&mut tokens[i]);
            annotations[i] = self.evaluate(&tokens[i], next_is_head);
            next_is_head = annotations[i].head;
        }
        annotations
    }

    /// 1トークンの役割フラグを判定します。
    fn evaluate(&self, token: &Token, next_is_head: bool) -> Annotation {
        let feature = token.feature_string();
        let surface = &token.surface;

        let head = matches_any(&feature, HEADS);
        let body = matches_any(&feature, BODIES);

        // 素性全体が接尾辞に一致するような場合は除外する
        let suffix = if body {
            self.suffixes
                .iter()
                .find(|s| s.surface.len() < surface.len() && surface.ends_with(&s.surface))
                .cloned()
        } else {
            None
        };

        let single = head
            && !matches_any(&feature, EXTSINGLE)
            && !self.non_geowords.iter().any(|w| surface.starts_with(w.as_str()));

        let alternative = matches_any(&feature, ALTERNATIVES);

        let stop =
            matches_any(&feature, STOPPERS) && !self.spatials.iter().any(|w| w == surface);

        let antileader = matches_any(&feature, ANTILEADERS);

        Annotation {
            head,
            body,
            prefix: false,
            suffix,
            single,
            alternative,
            stop,
            antileader,
            next_is_head,
        }
    }

    /// 一語の地名語候補について、地名以外の可能性を示すタグを返します。
    ///
    /// 素性が併記対象の品詞集合に一致する場合、品詞階層を `-` で連結した
    /// タグ（例: `名詞-固有名詞-人名-姓`）を返します。`*` の階層は
    /// 末尾から省きます。
    pub fn alternative_value(&self, token: &Token) -> Option<String> {
        let feature = token.feature_string();
        if !matches_any(&feature, ALTERNATIVES) {
            return None;
        }
        let mut parts = vec![
            token.pos.as_str(),
            token.subclass1.as_str(),
            token.subclass2.as_str(),
            token.subclass3.as_str(),
        ];
        while parts.last().is_some_and(|p| p.starts_with('*') || p.is_empty()) {
            parts.pop();
        }
        Some(parts.join("-"))
    }
}

/// 解析器の既知の問題の回避
///
/// 一部の記号が `名詞,サ変接続` として解析されるため、記号に
/// 書き換えます。
fn rewrite_symbol_feature(token: &mut Token) {
    let is_affected = token.pos == "名詞"
        && token.subclass1 == "サ変接続"
        && (token.surface == "－"
            || token.surface == "～"
            || token.surface == "♪"
            || token.surface.len() == 1);
    if is_affected {
        let surface = std::mem::take(&mut token.surface);
        *token = Token::with_feature(surface, "記号,一般,*,*,*,*,*");
    }
}
