//! エンジン全体の結合テスト
//!
//! 丸暗記の形態素解析器と一時ディレクトリ上のストアを使って、
//! 地名語解決の端から端までの挙動を検査します。

use std::fs;
use std::io::Write;

use crate::errors::ChimeiError;
use crate::geoword::Geoword;
use crate::profile::Profile;
use crate::service::GeoTagger;
use crate::test_utils::{build_tagger, sample_dictionary, sample_geoword, MockAnalyzer};
use crate::token::Token;

const TOKYO: (&str, &str) = ("東京", "名詞,固有名詞,地域,一般,*,*,東京,トウキョウ,トーキョー");
const NI: (&str, &str) = ("に", "助詞,格助詞,一般,*,*,*,に,ニ,ニ");
const IKU: (&str, &str) = ("行く", "動詞,自立,*,*,五段・カ行促音便,基本形,行く,イク,イク");
const FUKUSHIMA: (&str, &str) = ("福島", "名詞,固有名詞,地域,一般,*,*,福島,フクシマ,フクシマ");
const KENNAN: (&str, &str) = ("県南", "名詞,接尾,地域,*,*,*,県南,ケンナン,ケンナン");
const SOMA: (&str, &str) = ("相馬", "名詞,固有名詞,地域,一般,*,*,相馬,ソウマ,ソーマ");
const SHI: (&str, &str) = ("市", "名詞,接尾,地域,*,*,*,市,シ,シ");
const KOFUSHI: (&str, &str) = ("甲府市", "名詞,固有名詞,地域,一般,*,*,甲府市,コウフシ,コーフシ");
const YAKUSHO: (&str, &str) = ("役所", "名詞,一般,*,*,*,*,役所,ヤクショ,ヤクショ");
const ATAGO: (&str, &str) = ("愛宕", "名詞,固有名詞,人名,姓,*,*,愛宕,アタゴ,アタゴ");
const JINJA: (&str, &str) = ("神社", "名詞,一般,*,*,*,*,神社,ジンジャ,ジンジャ");
const SANPAI: (&str, &str) = ("参拝", "名詞,サ変接続,*,*,*,*,参拝,サンパイ,サンパイ");
const MUKAWACHO: (&str, &str) = (
    "むかわ町",
    "名詞,固有名詞,地域,一般,*,*,むかわ町,ムカワチョウ,ムカワチョー",
);
const HANAZONO: (&str, &str) = ("花園", "名詞,一般,*,*,*,*,花園,ハナゾノ,ハナゾノ");
const TO: (&str, &str) = ("都", "名詞,接尾,地域,*,*,*,都,ト,ト");

/// 非番兵トークンだけを取り出します。
fn content_tokens(tokens: &[Token]) -> Vec<&Token> {
    tokens.iter().filter(|t| !t.is_bos_eos()).collect()
}

/// 非番兵トークンの表層形の連結を返します。
fn joined_surface(tokens: &[Token]) -> String {
    content_tokens(tokens)
        .iter()
        .map(|t| t.surface.as_str())
        .collect()
}

fn standard_gazetteer() -> Vec<Geoword> {
    vec![
        sample_geoword("tokyo1", 1, "1", "東京", "", "トウキョウ", "", "市区町村"),
        sample_geoword("fksm01", 1, "2", "福島", "県", "フクシマ", "ケン", "都道府県"),
        sample_geoword("msoma1", 1, "3", "南相馬", "市", "ミナミソウマ", "シ", "市区町村"),
        sample_geoword("kofu01", 1, "4", "甲府", "市", "コウフ", "シ", "市区町村"),
        sample_geoword("atago1", 1, "5", "愛宕", "", "アタゴ", "", "山岳"),
        sample_geoword("mkwa01", 1, "6", "むかわ", "町", "ムカワ", "チョウ", "市区町村"),
        sample_geoword("hnzn01", 1, "7", "花園", "", "ハナゾノ", "", "居住地名"),
    ]
}

#[test]
fn test_single_place_name_in_sentence() {
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[("東京に行く", &[TOKYO, NI, IKU])],
    );
    let tokens = tagger.parse_node("東京に行く").unwrap();
    let content = content_tokens(&tokens);
    assert_eq!(content.len(), 3);

    assert!(content[0].is_place_name());
    assert_eq!(content[0].surface, "東京");
    assert!(content[0].subclass3.contains("tokyo1:東京"));
    assert_eq!(content[0].conjugated_form, "*");
    assert_eq!(content[0].yomi, "トウキョウ");

    assert_eq!(content[1].pos, "助詞");
    assert_eq!(content[2].pos, "動詞");
    assert_eq!(content[2].subclass1, "自立");
    assert_eq!(joined_surface(&tokens), "東京に行く");
}

#[test]
fn test_adjacent_place_names_with_suffix_reinsertion() {
    // 「福島県南相馬市」が「福島県」と「南（接尾）」に割れる解析結果でも、
    // 接尾辞を入力列に戻して「南相馬市」を解決する
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[("福島県南相馬市", &[FUKUSHIMA, KENNAN, SOMA, SHI])],
    );
    let tokens = tagger.parse_node("福島県南相馬市").unwrap();
    let content = content_tokens(&tokens);
    assert_eq!(content.len(), 2);

    assert!(content[0].is_place_name());
    assert_eq!(content[0].surface, "福島県");
    assert!(content[0].subclass3.contains("fksm01"));

    assert!(content[1].is_place_name());
    assert_eq!(content[1].surface, "南相馬市");
    assert!(content[1].subclass3.contains("msoma1"));

    // 「南」が単独の接尾辞トークンとして残らない
    assert!(!content.iter().any(|t| t.is_place_suffix()));
    assert_eq!(joined_surface(&tokens), "福島県南相馬市");
}

#[test]
fn test_stop_token_blocks_suffix_collapse() {
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[("甲府市役所", &[KOFUSHI, YAKUSHO])],
    );
    let tokens = tagger.parse_node("甲府市役所").unwrap();
    let content = content_tokens(&tokens);
    assert_eq!(content.len(), 2);

    assert!(content[0].is_place_name());
    assert_eq!(content[0].surface, "甲府市");
    assert!(content[0].subclass3.contains("kofu01"));

    // 後続が地名語に続かない語なので、地名修飾語として記録される
    assert_eq!(content[0].conjugated_form, "名詞-固有名詞-地名修飾語");

    assert!(!content[1].is_place_name());
    assert_eq!(content[1].surface, "役所");
    assert_eq!(joined_surface(&tokens), "甲府市役所");
}

#[test]
fn test_person_name_homograph_keeps_alternative() {
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[("愛宕神社に参拝", &[ATAGO, JINJA, NI, SANPAI])],
    );
    let tokens = tagger.parse_node("愛宕神社に参拝").unwrap();
    let content = content_tokens(&tokens);
    assert_eq!(content.len(), 4);

    assert!(content[0].is_place_name());
    assert_eq!(content[0].surface, "愛宕");
    // 人名の可能性が活用形の欄に保存される
    assert_eq!(content[0].conjugated_form, "名詞-固有名詞-人名-姓");

    assert!(!content[1].is_place_name());
    assert_eq!(content[1].surface, "神社");
    assert_eq!(content[3].surface, "参拝");
    assert_eq!(joined_surface(&tokens), "愛宕神社に参拝");
}

#[test]
fn test_place_modifier_tag_cleared_before_place_name() {
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[("むかわ町花園", &[MUKAWACHO, HANAZONO])],
    );
    let tokens = tagger.parse_node("むかわ町花園").unwrap();
    let content = content_tokens(&tokens);
    assert_eq!(content.len(), 2);

    assert!(content[0].is_place_name());
    assert_eq!(content[0].surface, "むかわ町");
    // 地名語が続くので地名修飾語のタグは消える
    assert_eq!(content[0].conjugated_form, "");

    assert!(content[1].is_place_name());
    assert_eq!(content[1].surface, "花園");
    assert_eq!(joined_surface(&tokens), "むかわ町花園");
}

#[test]
fn test_reading_lookup() {
    let (_dir, tagger) = build_tagger(&[], &standard_gazetteer(), &[]);
    let entries = tagger.get_geoword_entries("トウキョウ").unwrap();
    assert!(entries.contains_key("tokyo1"));
    assert_eq!(entries["tokyo1"].body(), "東京");

    // 読みを持たない表記では引けない
    assert!(tagger.get_geoword_entries("とうきょう").unwrap().is_empty());

    let entry = tagger.get_wordlist_by_yomi("フクシマケン").unwrap().unwrap();
    assert!(entry.idlist.contains("fksm01"));
}

#[test]
fn test_surface_lookup_requires_full_match() {
    let (_dir, tagger) = build_tagger(&[], &standard_gazetteer(), &[]);
    assert!(tagger.get_wordlist_by_surface("東京").unwrap().is_some());
    // 前方一致するだけの文字列では引けない
    assert!(tagger.get_wordlist_by_surface("東京タワー").unwrap().is_none());
    assert!(tagger.get_wordlist_by_surface("京").unwrap().is_none());
}

#[test]
fn test_longest_match_wins() {
    let mut geowords = standard_gazetteer();
    geowords.push(sample_geoword(
        "tokyot", 1, "8", "東京", "都", "トウキョウ", "ト", "都道府県",
    ));
    let (_dir, mut tagger) = build_tagger(
        &[],
        &geowords,
        &[("東京都に行く", &[TOKYO, TO, NI, IKU])],
    );
    let tokens = tagger.parse_node("東京都に行く").unwrap();
    let content = content_tokens(&tokens);
    assert!(content[0].is_place_name());
    assert_eq!(content[0].surface, "東京都");
    assert!(content[0].subclass3.contains("tokyot"));
    assert!(!content[0].subclass3.contains("tokyo1"));
}

#[test]
fn test_newline_partition() {
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[(
            "東京に\\n行く",
            &[
                TOKYO,
                NI,
                ("\\", "記号,一般,*,*,*,*,\\,,"),
                ("n", "名詞,一般,*,*,*,*,n,,"),
                IKU,
            ],
        )],
    );
    let tokens = tagger.parse_node("東京に\n行く").unwrap();
    let content = content_tokens(&tokens);
    assert_eq!(content.len(), 4);
    assert_eq!(content[2].surface, "\n");
    assert_eq!(content[2].subclass1, "制御コード");
    assert_eq!(joined_surface(&tokens), "東京に\n行く");
}

#[test]
fn test_antileader_blocks_candidate() {
    // サ変接続の語の直後では地名語を立てない
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[("参拝東京", &[SANPAI, TOKYO])],
    );
    let tokens = tagger.parse_node("参拝東京").unwrap();
    let content = content_tokens(&tokens);
    assert_eq!(content.len(), 2);
    assert!(!content[0].is_place_name());
    assert!(!content[1].is_place_name());
}

#[test]
fn test_dictionary_filter_monotonicity() {
    let dictionaries = vec![
        sample_dictionary("geonlp:japan_city", "日本の市区町村"),
        sample_dictionary("geonlp:stations", "駅名"),
    ];
    let geowords = vec![
        sample_geoword("tokyo1", 1, "1", "東京", "", "トウキョウ", "", "市区町村"),
        sample_geoword("tokyo2", 2, "1", "東京", "", "トウキョウ", "", "駅"),
    ];
    let (_dir, mut tagger) = build_tagger(
        &dictionaries,
        &geowords,
        &[("東京に行く", &[TOKYO, NI, IKU])],
    );

    let tokens = tagger.parse_node("東京に行く").unwrap();
    let unrestricted = content_tokens(&tokens)[0].subclass3.clone();
    assert!(unrestricted.contains("tokyo1"));
    assert!(unrestricted.contains("tokyo2"));

    tagger.set_active_dictionaries(&[1]).unwrap();
    let tokens = tagger.parse_node("東京に行く").unwrap();
    let restricted = content_tokens(&tokens)[0].subclass3.clone();
    assert!(restricted.contains("tokyo1"));
    assert!(!restricted.contains("tokyo2"));

    // 絞り込み後のIDリストは絞り込み前の部分集合になる
    for item in restricted.split('/') {
        assert!(unrestricted.split('/').any(|u| u == item));
    }

    // 空指定で全辞書に戻る
    tagger.set_active_dictionaries(&[]).unwrap();
    assert_eq!(tagger.get_active_dictionaries().len(), 2);
    let tokens = tagger.parse_node("東京に行く").unwrap();
    assert_eq!(content_tokens(&tokens)[0].subclass3, unrestricted);
}

#[test]
fn test_class_filter_suppresses_place_name() {
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[("東京に行く", &[TOKYO, NI, IKU])],
    );
    tagger
        .set_active_classes(&["-市区町村".to_string()])
        .unwrap();
    let tokens = tagger.parse_node("東京に行く").unwrap();
    let content = content_tokens(&tokens);
    // 候補がすべて除外されるので普通の名詞として出力される
    assert!(!content[0].is_place_name());
    assert_eq!(content[0].surface, "東京");

    tagger.reset_active_classes().unwrap();
    let tokens = tagger.parse_node("東京に行く").unwrap();
    assert!(content_tokens(&tokens)[0].is_place_name());
}

#[test]
fn test_active_class_crud() {
    let (_dir, mut tagger) = build_tagger(&[], &standard_gazetteer(), &[]);
    assert_eq!(tagger.get_active_classes(), &[".*".to_string()]);
    tagger
        .add_active_classes(&["-鉄道施設".to_string(), ".*".to_string()])
        .unwrap();
    assert_eq!(tagger.get_active_classes().len(), 2);
    tagger.remove_active_classes(&[".*".to_string()]).unwrap();
    assert_eq!(tagger.get_active_classes(), &["-鉄道施設".to_string()]);
    assert!(tagger.set_active_classes(&["(".to_string()]).is_err());
    tagger.reset_active_classes().unwrap();
    assert_eq!(tagger.get_active_classes(), &[".*".to_string()]);
}

#[test]
fn test_parse_formats_with_default_formatter() {
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[("東京に行く", &[TOKYO, NI, IKU])],
    );
    let text = tagger.parse("東京に行く").unwrap();
    assert!(text.starts_with('\n'));
    assert!(text.ends_with("EOS\n"));
    assert!(text.contains("東京\t名詞,固有名詞,地名語,tokyo1:東京,*,*,東京,トウキョウ,トウキョウ"));
}

#[test]
fn test_parse_without_index_fails() {
    let dir = tempfile::tempdir().unwrap();
    let profile = Profile::new(dir.path());
    let analyzer = MockAnalyzer::new(&[("東京に行く", &[TOKYO, NI, IKU])]);
    let mut tagger = GeoTagger::new(profile, Box::new(analyzer)).unwrap();
    let result = tagger.parse_node("東京に行く");
    assert!(matches!(result, Err(ChimeiError::IndexMissing)));
}

#[test]
fn test_get_geoword_entries_from_token() {
    let (_dir, mut tagger) = build_tagger(
        &[],
        &standard_gazetteer(),
        &[("東京に行く", &[TOKYO, NI, IKU])],
    );
    let tokens = tagger.parse_node("東京に行く").unwrap();
    let place = content_tokens(&tokens)[0].clone();
    let entries = tagger.get_geoword_entries_from_token(&place).unwrap();
    assert!(entries.contains_key("tokyo1"));

    let plain = Token::with_feature("役所", "名詞,一般,*,*,*,*,役所,ヤクショ,ヤクショ");
    assert!(tagger.get_geoword_entries_from_token(&plain).unwrap().is_empty());
}

#[test]
fn test_coordinates_through_public_surface() {
    let mut with_coords = sample_geoword("tokyo1", 1, "1", "東京", "", "", "", "市区町村");
    with_coords.set_string("latitude", "35.689");
    with_coords.set_string("longitude", "139.692");
    let mut out_of_range = sample_geoword("broken", 1, "2", "奈良", "", "", "", "市区町村");
    out_of_range.set_string("latitude", "135.0");
    out_of_range.set_string("longitude", "35.0");

    let (_dir, tagger) = build_tagger(&[], &[with_coords, out_of_range], &[]);
    let found = tagger.get_geoword_entry("tokyo1").unwrap().unwrap();
    assert_eq!(found.coordinates(), Some((35.689, 139.692)));
    let broken = tagger.get_geoword_entry("broken").unwrap().unwrap();
    assert_eq!(broken.coordinates(), None);
}

#[test]
fn test_remove_dictionary_through_engine() {
    let dictionaries = vec![
        sample_dictionary("geonlp:japan_city", "日本の市区町村"),
        sample_dictionary("geonlp:japan_pref", "都道府県"),
    ];
    let geowords = vec![
        sample_geoword("tokyo1", 1, "1", "東京", "", "トウキョウ", "", "市区町村"),
        sample_geoword("fksm01", 2, "1", "福島", "県", "フクシマ", "ケン", "都道府県"),
    ];
    let (_dir, mut tagger) = build_tagger(
        &dictionaries,
        &geowords,
        &[("東京に行く", &[TOKYO, NI, IKU])],
    );
    assert!(tagger.get_geoword_entry("tokyo1").unwrap().is_some());
    tagger.remove_dictionary("geonlp:japan_city").unwrap();
    assert!(tagger.get_geoword_entry("tokyo1").unwrap().is_none());
    assert!(tagger.get_dictionary("geonlp:japan_city").unwrap().is_none());
    assert!(tagger.get_geoword_entry("fksm01").unwrap().is_some());

    tagger.update_index().unwrap();
    let tokens = tagger.parse_node("東京に行く").unwrap();
    assert!(!content_tokens(&tokens)[0].is_place_name());
}

#[test]
fn test_add_dictionary_and_update_index_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("japan_city.json");
    let csv_path = dir.path().join("japan_city.csv");
    fs::File::create(&json_path)
        .unwrap()
        .write_all(
            r#"{
                "identifier": ["geonlp:japan_city"],
                "name": "日本の市区町村",
                "distribution": [{"contentUrl": "https://example.org/japan_city.csv"}]
            }"#
            .as_bytes(),
        )
        .unwrap();
    fs::File::create(&csv_path)
        .unwrap()
        .write_all(
            "geonlp_id,entry_id,body,suffix,body_kana,suffix_kana,ne_class\n\
             kofu01,19201,甲府,市,コウフ,シ,市区町村\n"
                .as_bytes(),
        )
        .unwrap();

    let profile = Profile::new(dir.path());
    let analyzer = MockAnalyzer::new(&[("甲府市役所", &[KOFUSHI, YAKUSHO])]);
    let mut tagger = GeoTagger::new(profile, Box::new(analyzer)).unwrap();

    let count = tagger.add_dictionary(&json_path, &csv_path).unwrap();
    assert_eq!(count, 1);
    tagger.update_index().unwrap();

    let dictionary = tagger.get_dictionary("geonlp:japan_city").unwrap().unwrap();
    assert_eq!(dictionary.name(), "日本の市区町村");
    assert_eq!(
        tagger.get_dictionary_identifier_by_id(1).unwrap(),
        Some("geonlp:japan_city".to_string())
    );

    let tokens = tagger.parse_node("甲府市役所").unwrap();
    assert!(content_tokens(&tokens)[0].is_place_name());
}

#[test]
fn test_add_dictionary_rolls_back_on_empty_csv() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("d.json");
    let csv_path = dir.path().join("d.csv");
    fs::File::create(&json_path)
        .unwrap()
        .write_all(
            br#"{
                "identifier": ["geonlp:broken"],
                "name": "broken",
                "distribution": [{"contentUrl": "https://example.org/d.csv"}]
            }"#,
        )
        .unwrap();
    fs::File::create(&csv_path)
        .unwrap()
        .write_all(b"geonlp_id,entry_id,body,ne_class\n")
        .unwrap();

    let profile = Profile::new(dir.path());
    let analyzer = MockAnalyzer::new(&[]);
    let mut tagger = GeoTagger::new(profile, Box::new(analyzer)).unwrap();

    assert!(tagger.add_dictionary(&json_path, &csv_path).is_err());
    // 辞書行ごと取り消されている
    assert!(tagger.get_dictionary("geonlp:broken").unwrap().is_none());
}

#[test]
fn test_clear_database() {
    let dictionaries = vec![sample_dictionary("geonlp:japan_city", "日本の市区町村")];
    let (_dir, mut tagger) = build_tagger(&dictionaries, &standard_gazetteer(), &[]);
    tagger.clear_database().unwrap();
    assert!(tagger.get_geoword_entry("tokyo1").unwrap().is_none());
    assert!(tagger.get_dictionary_list().unwrap().is_empty());
}
