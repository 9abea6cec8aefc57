//! 形態素トークンの定義
//!
//! このモジュールは、形態素解析の結果および地名語変換の結果を表現する
//! トークン型を提供します。トークンは表層形とMeCab互換の9項目の素性
//! （品詞、品詞細分類1〜3、活用形、活用型、原形、読み、発音）を保持します。
//! 地名語トークンは素性の先頭3項目が `名詞,固有名詞,地名語` に固定され、
//! 品詞細分類3に地名語IDリストを保持します。

/// 地名語トークンの品詞細分類2に入る固定値
pub const PLACE_NAME_SUBCLASS: &str = "地名語";

/// 地名接尾辞トークンの素性プリフィックス
const SUFFIX_FEATURE: [&str; 3] = ["名詞", "接尾", "地名語"];

/// 文頭・文末トークンの品詞
const BOS_EOS_POS: &str = "BOS/EOS";

/// 形態素トークン
///
/// 形態素解析器が返す1形態素、または地名語変換後の1トークンを表現する
/// 所有型の構造体です。素性フィールドは解析器の素性CSVの各項目に対応します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    /// 表層形
    pub surface: String,

    /// 品詞
    pub pos: String,

    /// 品詞細分類1
    pub subclass1: String,

    /// 品詞細分類2
    pub subclass2: String,

    /// 品詞細分類3。地名語トークンでは地名語IDリストが入る
    pub subclass3: String,

    /// 活用形。一語の地名語では地名以外の可能性を示すタグが入る
    pub conjugated_form: String,

    /// 活用型
    pub conjugation_type: String,

    /// 原形
    pub lemma: String,

    /// 読み
    pub yomi: String,

    /// 発音
    pub pronunciation: String,
}

impl Token {
    /// 表層形と素性CSVから新しいトークンを生成します。
    ///
    /// # 引数
    ///
    /// * `surface` - 表層形
    /// * `feature` - `,` 区切りの素性文字列。項目数が9未満の場合、
    ///   残りは空文字列になります。
    pub fn with_feature<S, F>(surface: S, feature: F) -> Self
    where
        S: Into<String>,
        F: AsRef<str>,
    {
        let mut fields = feature.as_ref().split(',');
        let mut next = || fields.next().unwrap_or("").to_string();
        Self {
            surface: surface.into(),
            pos: next(),
            subclass1: next(),
            subclass2: next(),
            subclass3: next(),
            conjugated_form: next(),
            conjugation_type: next(),
            lemma: next(),
            yomi: next(),
            pronunciation: next(),
        }
    }

    /// 文頭トークンを生成します。
    pub fn bos() -> Self {
        Self::with_feature("", "BOS/EOS,*,*,*,*,*,*,*,*")
    }

    /// 文末トークンを生成します。
    pub fn eos() -> Self {
        Self::with_feature("", "BOS/EOS,*,*,*,*,*,*,*,*")
    }

    /// 改行を表す制御トークンを生成します。
    pub fn newline() -> Self {
        Self::with_feature("\n", "記号,制御コード,改行,*,*,*")
    }

    /// 文頭・文末トークンかどうかを返します。
    #[inline(always)]
    pub fn is_bos_eos(&self) -> bool {
        self.pos == BOS_EOS_POS
    }

    /// 地名語トークンかどうかを返します。
    #[inline(always)]
    pub fn is_place_name(&self) -> bool {
        self.subclass2 == PLACE_NAME_SUBCLASS
    }

    /// 地名語トークンを生成します。
    ///
    /// 素性は `名詞,固有名詞,地名語,-,{alternative},*` を先頭に持ち、
    /// 原形・読み・発音には語索引の代表値が入ります。品詞細分類3には
    /// 呼び出し側が地名語IDリストを設定します。
    ///
    /// # 引数
    ///
    /// * `surface` - 代表表記（表層形の初期値）
    /// * `yomi` - 読み
    /// * `alternative` - 地名以外の可能性を示すタグ。なければ `*`
    pub(crate) fn place_name(surface: &str, yomi: &str, alternative: &str) -> Self {
        Self {
            surface: surface.to_string(),
            pos: "名詞".to_string(),
            subclass1: "固有名詞".to_string(),
            subclass2: PLACE_NAME_SUBCLASS.to_string(),
            subclass3: "-".to_string(),
            conjugated_form: alternative.to_string(),
            conjugation_type: "*".to_string(),
            lemma: surface.to_string(),
            yomi: yomi.to_string(),
            pronunciation: yomi.to_string(),
        }
    }

    /// 地名接尾辞トークンを生成します。
    ///
    /// # 引数
    ///
    /// * `surface` - 接尾辞の表層形
    /// * `yomi` - 読み
    /// * `pronunciation` - 発音
    pub(crate) fn place_suffix(surface: &str, yomi: &str, pronunciation: &str) -> Self {
        Self {
            surface: surface.to_string(),
            pos: SUFFIX_FEATURE[0].to_string(),
            subclass1: SUFFIX_FEATURE[1].to_string(),
            subclass2: SUFFIX_FEATURE[2].to_string(),
            subclass3: "*".to_string(),
            conjugated_form: "*".to_string(),
            conjugation_type: "*".to_string(),
            lemma: surface.to_string(),
            yomi: yomi.to_string(),
            pronunciation: pronunciation.to_string(),
        }
    }

    /// 地名接尾辞トークンかどうかを返します。
    #[inline(always)]
    pub(crate) fn is_place_suffix(&self) -> bool {
        self.pos == SUFFIX_FEATURE[0]
            && self.subclass1 == SUFFIX_FEATURE[1]
            && self.subclass2 == SUFFIX_FEATURE[2]
    }

    /// 素性9項目を `,` で連結した文字列を返します。
    ///
    /// 品詞集合との前方一致判定および出力整形に使用します。
    pub fn feature_string(&self) -> String {
        [
            self.pos.as_str(),
            self.subclass1.as_str(),
            self.subclass2.as_str(),
            self.subclass3.as_str(),
            self.conjugated_form.as_str(),
            self.conjugation_type.as_str(),
            self.lemma.as_str(),
            self.yomi.as_str(),
            self.pronunciation.as_str(),
        ]
        .join(",")
    }
}
