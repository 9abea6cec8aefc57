//! プロファイル（エンジン設定）の定義
//!
//! このモジュールは、エンジン生成時に読み込まれる不変の設定バンドルを
//! 提供します。プロファイルはデータディレクトリ、地名接尾辞表、
//! 空間語・非地名語のリスト、利用する辞書とクラスの既定値を保持します。
//! 設定ファイルはフラットなJSONオブジェクトで、`|` 区切りの複合値は
//! 読み込み時に分解されます。

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::errors::{ChimeiError, Result};

/// 地名語辞書（SQLite）ファイル名
const GEODIC_FILENAME: &str = "geodic.sq3";

/// 単語リスト（SQLite）ファイル名
const WORDLIST_FILENAME: &str = "wordlist.sq3";

/// ダブル配列トライのファイル名
const TRIE_FILENAME: &str = "geo_name_fullname.drt";

/// 形態素解析器のユーザ辞書（CSV）ファイル名
const USER_LEXICON_FILENAME: &str = "user_lexicon.csv";

/// 既定の地名接尾辞表
const DEFAULT_SUFFIX: &str =
    "前,マエ,マエ|内,ナイ,ナイ|立,リツ,リツ|境,サカイ,サカイ|東,ヒガシ,ヒガシ|西,ニシ,ニシ|南,ミナミ,ミナミ|北,キタ,キタ";

/// 既定の空間語（地名語に後続し得る語）
const DEFAULT_SPATIAL: &str =
    "付近|周辺|周囲|経由|沿線|沿岸|沿い|沖|上流|下流|河口|出身|地区|－|間|地|発|着";

/// 既定の非地名語（単独では地名語にしない語）
const DEFAULT_NON_GEOWORD: &str = "本部|一部|月";

/// 既定の固有名クラス正規表現
const DEFAULT_NE_CLASS: &str = ".*";

/// 既定の住所要素クラス正規表現
const DEFAULT_ADDRESS_REGEX: &str = "^(都道府県|市区町村|行政地域|居住地名)(\\/.+|)";

/// 地名接尾辞
///
/// 「前」「内」のように、地名語幹の直後に付いて表記の一部となる語を
/// 表します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suffix {
    /// 表層形
    pub surface: String,

    /// 読み
    pub yomi: String,

    /// 発音
    pub pronunciation: String,
}

impl Suffix {
    /// 新しい地名接尾辞を生成します。
    pub fn new<S1, S2, S3>(surface: S1, yomi: S2, pronunciation: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            surface: surface.into(),
            yomi: yomi.into(),
            pronunciation: pronunciation.into(),
        }
    }
}

/// 設定ファイルの生の形
///
/// 複合値は `|` 区切りの文字列のまま保持し、[`Profile`] への変換時に
/// 分解します。
#[derive(Debug, Default, Deserialize)]
struct ProfileConfig {
    data_dir: Option<String>,
    system_dic_dir: Option<String>,
    log_dir: Option<String>,
    formatter: Option<String>,
    suffix: Option<String>,
    spatial: Option<String>,
    non_geoword: Option<String>,
    dictionary: Option<String>,
    ne_class: Option<String>,
    address_regex: Option<String>,
}

/// エンジン設定のバンドル
///
/// エンジン生成時に読み込まれ、以後変更されません。
#[derive(Debug, Clone)]
pub struct Profile {
    data_dir: PathBuf,
    system_dic_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    formatter: String,
    suffixes: Vec<Suffix>,
    spatials: Vec<String>,
    non_geowords: Vec<String>,
    dictionaries: Vec<String>,
    ne_classes: Vec<String>,
    address_regex: Regex,
}

impl Profile {
    /// 既定値のプロファイルを生成します。
    ///
    /// # 引数
    ///
    /// * `data_dir` - 永続ファイルを置くデータディレクトリ
    pub fn new<P>(data_dir: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            system_dic_dir: None,
            log_dir: None,
            formatter: "DefaultGeowordFormatter".to_string(),
            suffixes: parse_suffixes(DEFAULT_SUFFIX),
            spatials: split_list(DEFAULT_SPATIAL),
            non_geowords: split_list(DEFAULT_NON_GEOWORD),
            dictionaries: Vec::new(),
            ne_classes: split_list(DEFAULT_NE_CLASS),
            // 既定値は定数なのでコンパイルに失敗しない
            address_regex: Regex::new(DEFAULT_ADDRESS_REGEX).unwrap_or_else(|_| unreachable!()),
        }
    }

    /// JSON形式の設定ファイルからプロファイルを読み込みます。
    ///
    /// # 引数
    ///
    /// * `path` - 設定ファイルのパス
    ///
    /// # エラー
    ///
    /// ファイルが読めない場合、JSONとして解釈できない場合、
    /// `data_dir` が設定されていない場合にエラーを返します。
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// JSONテキストからプロファイルを読み込みます。
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ProfileConfig = serde_json::from_str(text)?;
        let data_dir = config
            .data_dir
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ChimeiError::format("data_dir property is not set in the profile."))?;

        let mut profile = Self::new(data_dir);
        profile.system_dic_dir = config.system_dic_dir.filter(|d| !d.is_empty()).map(PathBuf::from);
        profile.log_dir = config.log_dir.filter(|d| !d.is_empty()).map(PathBuf::from);
        if let Some(formatter) = config.formatter.filter(|f| !f.is_empty()) {
            profile.formatter = formatter;
        }
        if let Some(suffix) = config.suffix {
            profile.suffixes = parse_suffixes(&suffix);
        }
        if let Some(spatial) = config.spatial {
            profile.spatials = split_list(&spatial);
        }
        if let Some(non_geoword) = config.non_geoword {
            profile.non_geowords = split_list(&non_geoword);
        }
        if let Some(dictionary) = config.dictionary {
            profile.dictionaries = split_list(&dictionary);
        }
        if let Some(ne_class) = config.ne_class {
            profile.ne_classes = split_list(&ne_class);
        }
        if let Some(address_regex) = config.address_regex.filter(|r| !r.is_empty()) {
            profile.address_regex = Regex::new(&address_regex)?;
        }
        Ok(profile)
    }

    /// データディレクトリを返します。
    #[inline(always)]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 形態素解析器のシステム辞書ディレクトリを返します。
    #[inline(always)]
    pub fn system_dic_dir(&self) -> Option<&Path> {
        self.system_dic_dir.as_deref()
    }

    /// ログ出力先ディレクトリを返します。
    #[inline(always)]
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// 出力整形クラス名を返します。
    #[inline(always)]
    pub fn formatter(&self) -> &str {
        &self.formatter
    }

    /// 地名接尾辞表を返します。
    #[inline(always)]
    pub fn suffixes(&self) -> &[Suffix] {
        &self.suffixes
    }

    /// 空間語のリストを返します。
    #[inline(always)]
    pub fn spatials(&self) -> &[String] {
        &self.spatials
    }

    /// 非地名語のリストを返します。
    #[inline(always)]
    pub fn non_geowords(&self) -> &[String] {
        &self.non_geowords
    }

    /// 利用する辞書指定のリストを返します。
    ///
    /// 各要素は内部IDの10進表記で、`-` から始まる要素は除外指定です。
    #[inline(always)]
    pub fn dictionaries(&self) -> &[String] {
        &self.dictionaries
    }

    /// 利用する固有名クラス正規表現のリストを返します。
    #[inline(always)]
    pub fn ne_classes(&self) -> &[String] {
        &self.ne_classes
    }

    /// 住所要素クラスを判定する正規表現を返します。
    #[inline(always)]
    pub fn address_regex(&self) -> &Regex {
        &self.address_regex
    }

    /// 地名語辞書ファイルのパスを返します。
    pub fn geodic_path(&self) -> PathBuf {
        self.data_dir.join(GEODIC_FILENAME)
    }

    /// 単語リストファイルのパスを返します。
    pub fn wordlist_path(&self) -> PathBuf {
        self.data_dir.join(WORDLIST_FILENAME)
    }

    /// トライファイルのパスを返します。
    pub fn trie_path(&self) -> PathBuf {
        self.data_dir.join(TRIE_FILENAME)
    }

    /// ユーザ辞書（CSV）のパスを返します。
    pub fn user_lexicon_path(&self) -> PathBuf {
        self.data_dir.join(USER_LEXICON_FILENAME)
    }
}

/// `|` 区切りの文字列を分解します。空要素は除きます。
fn split_list(text: &str) -> Vec<String> {
    text.split('|')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `|` 区切りの `表層形,読み,発音` の列を接尾辞表に分解します。
///
/// 3項目に満たない要素は無視します。
fn parse_suffixes(text: &str) -> Vec<Suffix> {
    text.split('|')
        .filter_map(|item| {
            let mut it = item.split(',');
            match (it.next(), it.next(), it.next()) {
                (Some(s), Some(y), Some(p)) if !s.is_empty() => Some(Suffix::new(s, y, p)),
                _ => None,
            }
        })
        .collect()
}
