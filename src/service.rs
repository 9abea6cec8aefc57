//! 地名語抽出エンジン
//!
//! このモジュールは、プロファイル・地名語ストア・トライ・形態素解析器を
//! 束ねるエンジン本体 [`GeoTagger`] を提供します。エンジンは1インスタンス
//! 1スレッドで利用する前提で、保持するすべてのハンドルを排他的に
//! 所有します。利用する辞書とクラスの集合はインスタンスごとの可変状態
//! として保持され、明示的な設定呼び出しでのみ変化します。

use std::path::Path;

use hashbrown::HashMap;
use regex::Regex;

use crate::analyzer::MorphologicalAnalyzer;
use crate::classifier::PosRules;
use crate::dictionary::Dictionary;
use crate::errors::{ChimeiError, Result, Subsystem};
use crate::formatter::{formatter_for, TokenFormatter};
use crate::geoword::Geoword;
use crate::index::Trie;
use crate::normalizer::standardize;
use crate::profile::Profile;
use crate::resolver::Resolver;
use crate::store::GazetteerStore;
use crate::token::Token;
use crate::wordlist::WordlistEntry;

/// コンパイル済みのクラス指定
struct ClassPattern {
    /// `-` 接頭辞による除外指定かどうか
    negate: bool,
    regex: Regex,
}

/// 利用中の辞書・クラスの集合
///
/// 地名語がこの集合に属するかどうかの判定を提供します。
pub(crate) struct ActiveFilters {
    dictionaries: HashMap<i64, Dictionary>,
    classes: Vec<String>,
    patterns: Vec<ClassPattern>,
}

impl ActiveFilters {
    fn new(dictionaries: HashMap<i64, Dictionary>, classes: Vec<String>) -> Result<Self> {
        let patterns = Self::compile(&classes)?;
        Ok(Self {
            dictionaries,
            classes,
            patterns,
        })
    }

    /// クラス指定を正規表現にコンパイルします。
    ///
    /// パターンは固有名クラス全体に一致する必要があります。
    fn compile(classes: &[String]) -> Result<Vec<ClassPattern>> {
        classes
            .iter()
            .map(|class| {
                let (negate, pattern) = match class.strip_prefix('-') {
                    Some(p) => (true, p),
                    None => (false, class.as_str()),
                };
                let regex = Regex::new(&format!("^(?:{})$", pattern))
                    .map_err(|e| ChimeiError::request_format(e.to_string()))?;
                Ok(ClassPattern { negate, regex })
            })
            .collect()
    }

    /// クラス指定を置き換え、コンパイルし直します。
    fn set_classes(&mut self, classes: Vec<String>) -> Result<()> {
        self.patterns = Self::compile(&classes)?;
        self.classes = classes;
        Ok(())
    }

    /// 地名語が利用中の辞書とクラスの両方に属するかどうかを判定します。
    ///
    /// 辞書集合が空の場合は辞書の制約を課しません。クラスは除外指定に
    /// 1つでも一致すれば不合格、追加指定が存在する場合はいずれかに
    /// 一致する必要があります。
    pub(crate) fn accepts(&self, geoword: &Geoword) -> bool {
        if !self.dictionaries.is_empty()
            && !self.dictionaries.contains_key(&geoword.dictionary_id())
        {
            return false;
        }
        if self.patterns.is_empty() {
            return true;
        }
        let ne_class = geoword.ne_class();
        let mut has_positive = false;
        let mut positive_matched = false;
        for pattern in &self.patterns {
            if pattern.negate {
                if pattern.regex.is_match(&ne_class) {
                    return false;
                }
            } else {
                has_positive = true;
                if pattern.regex.is_match(&ne_class) {
                    positive_matched = true;
                }
            }
        }
        !has_positive || positive_matched
    }
}

/// 地名語抽出エンジン
///
/// 自然文の解析、地名語・辞書の検索、辞書の管理、利用する辞書・クラスの
/// 指定を提供します。
pub struct GeoTagger {
    profile: Profile,
    rules: PosRules,
    store: GazetteerStore,
    trie: Option<Trie>,
    analyzer: Box<dyn MorphologicalAnalyzer>,
    formatter: Box<dyn TokenFormatter>,
    default_dictionaries: HashMap<i64, Dictionary>,
    default_classes: Vec<String>,
    filters: ActiveFilters,
}

impl GeoTagger {
    /// プロファイルと形態素解析器からエンジンを生成します。
    ///
    /// ストアのオープン、トライの読み込み、利用する辞書・クラスの
    /// 既定値の確定をこの順で行います。トライファイルが存在しない場合、
    /// エンジンはトライなしで生成され、解析時に
    /// [`ChimeiError::IndexMissing`] を返します。
    ///
    /// # エラー
    ///
    /// いずれかの段階で失敗した場合、失敗したサブシステムを示す
    /// [`ChimeiError::ServiceCreateFailed`] を返します。
    pub fn new(profile: Profile, analyzer: Box<dyn MorphologicalAnalyzer>) -> Result<Self> {
        let rules = PosRules::from_profile(&profile);
        let formatter = formatter_for(profile.formatter());

        let store = GazetteerStore::open(
            profile.geodic_path(),
            profile.wordlist_path(),
            profile.trie_path(),
        )
        .map_err(|e| ChimeiError::service_create_failed(Subsystem::Storage, e.to_string()))?;

        let trie_path = profile.trie_path();
        let trie = if trie_path.exists() {
            let loaded = Trie::load(&trie_path).map_err(|e| {
                ChimeiError::service_create_failed(Subsystem::Trie, e.to_string())
            })?;
            Some(loaded)
        } else {
            None
        };

        let default_dictionaries = resolve_default_dictionaries(&store, profile.dictionaries())
            .map_err(|e| {
                ChimeiError::service_create_failed(Subsystem::Profile, e.to_string())
            })?;
        let default_classes = profile.ne_classes().to_vec();
        let filters = ActiveFilters::new(default_dictionaries.clone(), default_classes.clone())
            .map_err(|e| {
                ChimeiError::service_create_failed(Subsystem::Profile, e.to_string())
            })?;

        Ok(Self {
            profile,
            rules,
            store,
            trie,
            analyzer,
            formatter,
            default_dictionaries,
            default_classes,
            filters,
        })
    }

    /// プロファイルファイルのパスからエンジンを生成します。
    pub fn from_profile_path<P>(
        path: P,
        analyzer: Box<dyn MorphologicalAnalyzer>,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let profile = Profile::from_path(path).map_err(|e| {
            ChimeiError::service_create_failed(Subsystem::Profile, e.to_string())
        })?;
        Self::new(profile, analyzer)
    }

    /// プロファイルへの参照を返します。
    #[inline(always)]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// 解決器を組み立てます。
    fn resolver(&self) -> Resolver {
        Resolver::new(&self.rules, &self.store, self.trie.as_ref(), &self.filters)
    }

    /// 自然文を解析し、結果をテキストとして返します。
    ///
    /// 出力形式はプロファイルの `formatter` 指定に従います。
    pub fn parse(&mut self, sentence: &str) -> Result<String> {
        let tokens = self.parse_node(sentence)?;
        Ok(self.formatter.format_tokens(&tokens))
    }

    /// 自然文を解析し、地名語トークンを含むトークン列を返します。
    ///
    /// 改行は解析前にエスケープされ、解析後に改行制御トークンとして
    /// 復元されます。
    pub fn parse_node(&mut self, sentence: &str) -> Result<Vec<Token>> {
        let escaped = sentence.replace('\n', "\\n");
        let mut tokens = self.analyzer.parse(&escaped)?;
        unescape_newlines(&mut tokens);
        self.resolver().convert(tokens)
    }

    /// 地名語IDで地名語エントリを取得します。
    pub fn get_geoword_entry(&self, geonlp_id: &str) -> Result<Option<Geoword>> {
        self.store.find_geoword_by_id(geonlp_id)
    }

    /// 表記または読みに一致する地名語エントリを取得します。
    ///
    /// 利用中の辞書・クラスに属するものだけを返します。
    ///
    /// # 戻り値
    ///
    /// 地名語IDをキー、地名語を値とするマップ
    pub fn get_geoword_entries(&self, surface: &str) -> Result<HashMap<String, Geoword>> {
        let mut entries = HashMap::new();
        let Some(wordlist) = self.get_wordlist_by_surface(surface)? else {
            return Ok(entries);
        };
        for geoword in self.store.get_geowords_from_wordlist(&wordlist, 0)? {
            if self.filters.accepts(&geoword) {
                entries.insert(geoword.geonlp_id(), geoword);
            }
        }
        Ok(entries)
    }

    /// 地名語トークンが持つIDリストを地名語エントリに展開します。
    ///
    /// 地名語トークンではない場合は空のマップを返します。
    pub fn get_geoword_entries_from_token(
        &self,
        token: &Token,
    ) -> Result<HashMap<String, Geoword>> {
        let mut entries = HashMap::new();
        if !token.is_place_name() {
            return Ok(entries);
        }
        for item in token.subclass3.split('/').filter(|s| !s.is_empty()) {
            let Some((geonlp_id, _)) = item.split_once(':') else {
                continue;
            };
            if let Some(geoword) = self.store.find_geoword_by_id(geonlp_id)? {
                entries.insert(geoword.geonlp_id(), geoword);
            }
        }
        Ok(entries)
    }

    /// 表記または読みに一致する語索引エントリを取得します。
    ///
    /// トライによる前方一致の長さが文字列全体に達した場合にのみ
    /// 一致とみなします。
    pub fn get_wordlist_by_surface(&self, surface: &str) -> Result<Option<WordlistEntry>> {
        let standardized = standardize(surface);
        match self.resolver().longest_match(surface, false)? {
            Some(m) if m.match_bytes == standardized.len() => {
                self.store.find_wordlist_by_id(m.value)
            }
            _ => Ok(None),
        }
    }

    /// 読みで語索引エントリを取得します。
    pub fn get_wordlist_by_yomi(&self, yomi: &str) -> Result<Option<WordlistEntry>> {
        self.store.find_wordlist_by_yomi(yomi)
    }

    /// 辞書一覧を取得します。
    pub fn get_dictionary_list(&self) -> Result<HashMap<i64, Dictionary>> {
        self.store.get_dictionary_list()
    }

    /// 識別子で辞書メタデータを取得します。
    pub fn get_dictionary(&self, identifier: &str) -> Result<Option<Dictionary>> {
        self.store.get_dictionary(identifier)
    }

    /// 内部IDで辞書メタデータを取得します。
    pub fn get_dictionary_by_id(&self, id: i64) -> Result<Option<Dictionary>> {
        self.store.get_dictionary_by_id(id)
    }

    /// 内部IDに対応する辞書の識別子を取得します。
    pub fn get_dictionary_identifier_by_id(&self, id: i64) -> Result<Option<String>> {
        Ok(self.get_dictionary_by_id(id)?.and_then(|d| d.identifier()))
    }

    /// 辞書をファイルからデータベースに追加します。
    ///
    /// 登録後に語索引を更新するには [`update_index`](Self::update_index)
    /// を呼び出します。
    ///
    /// # 戻り値
    ///
    /// 登録した地名語の件数
    pub fn add_dictionary<P1, P2>(&mut self, json_path: P1, csv_path: P2) -> Result<usize>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        self.store.add_dictionary(json_path, csv_path)
    }

    /// 辞書と所属する地名語を削除します。
    pub fn remove_dictionary(&mut self, identifier: &str) -> Result<()> {
        self.store.remove_dictionary(identifier)
    }

    /// 地名語と辞書のテーブルをクリアします。
    pub fn clear_database(&mut self) -> Result<()> {
        self.store.clear_geowords()?;
        self.store.clear_dictionaries()?;
        Ok(())
    }

    /// 語索引（テーブルとトライ）を再構築し、読み込み直します。
    pub fn update_index(&mut self) -> Result<()> {
        self.store.update_wordlists()?;
        let trie_path = self.profile.trie_path();
        self.trie = if trie_path.exists() {
            Some(Trie::load(&trie_path)?)
        } else {
            None
        };
        Ok(())
    }

    /// 利用中の辞書の集合を返します。
    #[inline(always)]
    pub fn get_active_dictionaries(&self) -> &HashMap<i64, Dictionary> {
        &self.filters.dictionaries
    }

    /// 利用する辞書を指定します。
    ///
    /// # 引数
    ///
    /// * `ids` - 利用する辞書の内部IDのリスト。空の場合、登録されている
    ///   全辞書を利用します
    pub fn set_active_dictionaries(&mut self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            self.filters.dictionaries = self.store.get_dictionary_list()?;
        } else {
            self.filters.dictionaries.clear();
            self.add_active_dictionaries(ids)?;
        }
        Ok(())
    }

    /// 利用する辞書を追加します。登録されていないIDは無視します。
    pub fn add_active_dictionaries(&mut self, ids: &[i64]) -> Result<()> {
        for id in ids {
            if let Some(dictionary) = self.store.get_dictionary_by_id(*id)? {
                self.filters.dictionaries.insert(*id, dictionary);
            }
        }
        Ok(())
    }

    /// 利用する辞書から除外します。
    pub fn remove_active_dictionaries(&mut self, ids: &[i64]) {
        for id in ids {
            self.filters.dictionaries.remove(id);
        }
    }

    /// 利用する辞書をプロファイルの既定値に戻します。
    pub fn reset_active_dictionaries(&mut self) {
        self.filters.dictionaries = self.default_dictionaries.clone();
    }

    /// 利用中の固有名クラス正規表現のリストを返します。
    #[inline(always)]
    pub fn get_active_classes(&self) -> &[String] {
        &self.filters.classes
    }

    /// 利用する固有名クラス正規表現を指定します。
    ///
    /// 空のリストはクラスの制約を外します。
    ///
    /// # エラー
    ///
    /// 正規表現としてコンパイルできないパターンが含まれる場合に
    /// エラーを返します。
    pub fn set_active_classes(&mut self, classes: &[String]) -> Result<()> {
        self.filters.set_classes(classes.to_vec())
    }

    /// 利用する固有名クラス正規表現を追加します。既存の指定と重複する
    /// ものは無視します。
    pub fn add_active_classes(&mut self, classes: &[String]) -> Result<()> {
        let mut merged = self.filters.classes.clone();
        for class in classes {
            if !merged.contains(class) {
                merged.push(class.clone());
            }
        }
        self.filters.set_classes(merged)
    }

    /// 利用する固有名クラス正規表現を除外します。
    pub fn remove_active_classes(&mut self, classes: &[String]) -> Result<()> {
        let merged: Vec<String> = self
            .filters
            .classes
            .iter()
            .filter(|c| !classes.contains(c))
            .cloned()
            .collect();
        self.filters.set_classes(merged)
    }

    /// 利用するクラスをプロファイルの既定値に戻します。
    pub fn reset_active_classes(&mut self) -> Result<()> {
        self.filters.set_classes(self.default_classes.clone())
    }
}

/// プロファイルの辞書指定から既定の辞書集合を確定します。
///
/// `-` 接頭辞のない指定があればそれらだけを利用し、除外指定のみの場合は
/// 全辞書から除外します。
fn resolve_default_dictionaries(
    store: &GazetteerStore,
    entries: &[String],
) -> Result<HashMap<i64, Dictionary>> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    for entry in entries {
        match entry.strip_prefix('-') {
            Some(id) => exclude.push(parse_dictionary_id(id)?),
            None => include.push(parse_dictionary_id(entry)?),
        }
    }

    if include.is_empty() {
        let mut dictionaries = store.get_dictionary_list()?;
        for id in &exclude {
            dictionaries.remove(id);
        }
        Ok(dictionaries)
    } else {
        let mut dictionaries = HashMap::new();
        for id in include {
            if exclude.contains(&id) {
                continue;
            }
            if let Some(dictionary) = store.get_dictionary_by_id(id)? {
                dictionaries.insert(id, dictionary);
            }
        }
        Ok(dictionaries)
    }
}

/// 辞書IDの10進表記を解釈します。
fn parse_dictionary_id(text: &str) -> Result<i64> {
    text.parse().map_err(|_| {
        ChimeiError::request_format(format!("Invalid dictionary id: {}", text))
    })
}

/// 解析器の出力からエスケープされた改行を復元します。
///
/// `\` のトークンに `n` で始まるトークンが続く場合、両者をまとめて
/// 改行制御トークンに置き換えます。
fn unescape_newlines(tokens: &mut Vec<Token>) {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].surface == "\\" && i + 1 < tokens.len() {
            let next_surface = tokens[i + 1].surface.clone();
            if let Some(rest) = next_surface.strip_prefix('n') {
                if rest.is_empty() {
                    tokens.remove(i + 1);
                } else {
                    tokens[i + 1].surface = rest.to_string();
                }
                tokens[i] = Token::newline();
            }
        }
        i += 1;
    }
}
