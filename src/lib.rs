//! # chimei
//!
//! chimeiは、日本語テキストからの地名語抽出（地理的固有表現認識）の実装です。
//!
//! ## 概要
//!
//! このライブラリは、汎用の形態素解析器による解析結果と、登録済み
//! ガゼッティア（地名語辞書）の全表記を収めたダブル配列トライ、および
//! SQLiteに格納された地名語カタログを融合し、文中の地名語を専用の
//! トークンに置き換えて返します。地名語トークンは曖昧性を保持した
//! 候補IDリストを持ち、下流の解決器がそのまま利用できます。
//!
//! ## 主な機能
//!
//! - **地名語抽出**: 品詞規則と前方最長一致による地名語候補の確定
//! - **ガゼッティア検索**: ID・表記・読みによる地名語の検索
//! - **辞書管理**: CSV/JSONからの辞書の登録・削除、語索引の再構築
//! - **辞書・クラスの絞り込み**: 利用する辞書と固有名クラスの動的な指定
//!
//! ## 使用例
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chimei::{GeoTagger, Profile, VibratoAnalyzer};
//!
//! let profile = Profile::new("/var/lib/chimei");
//! let analyzer = VibratoAnalyzer::from_dictionary_path("/var/lib/chimei/system.dic")?;
//! let mut tagger = GeoTagger::new(profile, Box::new(analyzer))?;
//!
//! tagger.add_dictionary("japan_city.json", "japan_city.csv")?;
//! tagger.update_index()?;
//!
//! for token in tagger.parse_node("国立市は東京都にあります。")? {
//!     if token.is_place_name() {
//!         println!("{}\t{}", token.surface, token.subclass3);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// 形態素解析器アダプタ
pub mod analyzer;

/// 形態素トークンの役割判定
pub mod classifier;

/// 辞書メタデータ
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 出力整形
pub mod formatter;

/// 地名語エントリ
pub mod geoword;

/// 辞書ファイルの読み込み
mod importer;

/// 語索引トライ
pub mod index;

/// 表記の標準化
pub mod normalizer;

/// プロファイル
pub mod profile;

/// 地名語の解決
mod resolver;

/// エンジン本体
pub mod service;

/// 地名語ストア
pub mod store;

/// トークン型の定義
pub mod token;

/// 語索引エントリ
pub mod wordlist;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

// Re-exports
pub use analyzer::{MorphologicalAnalyzer, VibratoAnalyzer};
pub use dictionary::Dictionary;
pub use errors::{ChimeiError, Result, Subsystem};
pub use geoword::Geoword;
pub use profile::{Profile, Suffix};
pub use service::GeoTagger;
pub use token::Token;
pub use wordlist::WordlistEntry;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
