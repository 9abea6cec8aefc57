//! テスト用の共通フィクスチャ

use hashbrown::HashMap;
use tempfile::TempDir;

use crate::analyzer::MorphologicalAnalyzer;
use crate::dictionary::Dictionary;
use crate::errors::{ChimeiError, Result};
use crate::geoword::Geoword;
use crate::profile::Profile;
use crate::service::GeoTagger;
use crate::store::GazetteerStore;
use crate::token::Token;

/// 文ごとに解析結果を丸暗記した形態素解析器
///
/// 実際の辞書を使わずに解決器の挙動を検査するために使います。
pub(crate) struct MockAnalyzer {
    sentences: HashMap<String, Vec<(String, String)>>,
}

impl MockAnalyzer {
    pub(crate) fn new(sentences: &[(&str, &[(&str, &str)])]) -> Self {
        let mut map = HashMap::new();
        for (sentence, tokens) in sentences {
            map.insert(
                sentence.to_string(),
                tokens
                    .iter()
                    .map(|(s, f)| (s.to_string(), f.to_string()))
                    .collect(),
            );
        }
        Self { sentences: map }
    }
}

impl MorphologicalAnalyzer for MockAnalyzer {
    fn parse(&mut self, sentence: &str) -> Result<Vec<Token>> {
        let morphemes = self
            .sentences
            .get(sentence)
            .ok_or_else(|| ChimeiError::analyzer(format!("Unknown sentence: {}", sentence)))?;
        let mut tokens = Vec::with_capacity(morphemes.len() + 2);
        tokens.push(Token::bos());
        for (surface, feature) in morphemes {
            tokens.push(Token::with_feature(surface.clone(), feature));
        }
        tokens.push(Token::eos());
        Ok(tokens)
    }
}

/// 一時ディレクトリ上にストアを開きます。
pub(crate) fn open_store() -> (TempDir, GazetteerStore) {
    let dir = tempfile::tempdir().unwrap();
    let profile = Profile::new(dir.path());
    let store = GazetteerStore::open(
        profile.geodic_path(),
        profile.wordlist_path(),
        profile.trie_path(),
    )
    .unwrap();
    (dir, store)
}

/// テスト用の地名語エントリを生成します。
#[allow(clippy::too_many_arguments)]
pub(crate) fn sample_geoword(
    geonlp_id: &str,
    dictionary_id: i64,
    entry_id: &str,
    body: &str,
    suffix: &str,
    body_kana: &str,
    suffix_kana: &str,
    ne_class: &str,
) -> Geoword {
    let mut geoword = Geoword::new();
    geoword.set_geonlp_id(geonlp_id);
    geoword.set_dictionary_id(dictionary_id);
    geoword.set_string("entry_id", entry_id);
    geoword.set_string("body", body);
    if !suffix.is_empty() {
        geoword.set_delimited_list("suffix", suffix);
    }
    if !body_kana.is_empty() {
        geoword.set_string("body_kana", body_kana);
    }
    if !suffix_kana.is_empty() {
        geoword.set_delimited_list("suffix_kana", suffix_kana);
    }
    geoword.set_string("ne_class", ne_class);
    geoword
}

/// テスト用の辞書メタデータを生成します。
pub(crate) fn sample_dictionary(identifier: &str, name: &str) -> Dictionary {
    Dictionary::from_json(&format!(
        r#"{{
            "identifier": ["{}"],
            "name": "{}",
            "distribution": [{{"contentUrl": "https://example.org/data.csv"}}]
        }}"#,
        identifier, name
    ))
    .unwrap()
}

/// 地名語と丸暗記文を与えてエンジンを組み立てます。
///
/// 地名語をストアに登録し、語索引を構築してからエンジンを生成します。
pub(crate) fn build_tagger(
    dictionaries: &[Dictionary],
    geowords: &[Geoword],
    sentences: &[(&str, &[(&str, &str)])],
) -> (TempDir, GeoTagger) {
    let (dir, store) = open_store();
    if !dictionaries.is_empty() {
        store.set_dictionaries(dictionaries).unwrap();
    }
    store.set_geowords(geowords).unwrap();
    store.update_wordlists().unwrap();
    drop(store);

    let profile = Profile::new(dir.path());
    let analyzer = MockAnalyzer::new(sentences);
    let tagger = GeoTagger::new(profile, Box::new(analyzer)).unwrap();
    (dir, tagger)
}
