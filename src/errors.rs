//! エラー型の定義
//!
//! このモジュールは、地名語抽出ライブラリで使用されるすべてのエラー型を定義します。

use std::fmt;

/// chimei専用のResult型
///
/// エラー型としてデフォルトで[`ChimeiError`]を使用します。
pub type Result<T, E = ChimeiError> = std::result::Result<T, E>;

/// エンジン生成に失敗したサブシステムの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    /// プロファイルの読み込み
    Profile,
    /// 地名語ストアのオープン
    Storage,
    /// 形態素解析器の初期化
    Analyzer,
    /// 語索引（トライ）の読み込み
    Trie,
    /// 表記の標準化
    Geocoder,
    /// その他
    Other,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Profile => "profile",
            Self::Storage => "storage",
            Self::Analyzer => "analyzer",
            Self::Trie => "trie",
            Self::Geocoder => "geocoder",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// chimeiのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// 検索結果が空であることはエラーではなく、各APIは空のコレクションや
/// `None` を返します。
#[derive(Debug, thiserror::Error)]
pub enum ChimeiError {
    /// ストアが未初期化の状態で操作が要求された
    #[error("The gazetteer storage has not been opened.")]
    StorageUninitialized,

    /// ストレージエンジンがエラーを返した
    ///
    /// SQLiteのエラーコードとメッセージをそのまま保持します。
    #[error("StorageError({code}): {message}")]
    Storage {
        /// ストレージエンジンのエラーコード
        code: i32,
        /// ストレージエンジンのエラーメッセージ
        message: String,
    },

    /// 語索引（トライ）が存在しない
    ///
    /// `update_index` が一度も成功していない状態で解析が要求された場合に
    /// 発生します。
    #[error("The word index does not exist. Run update_index first.")]
    IndexMissing,

    /// 読み込んだオブジェクトや入力ファイルの形式が不正
    #[error("FormatError: {0}")]
    Format(String),

    /// トライの構築または保存に失敗した
    #[error("TrieBuildError: {0}")]
    TrieBuild(String),

    /// 形態素解析器がエラーを返した
    #[error("AnalyzerError: {0}")]
    Analyzer(String),

    /// 形態素解析器が未初期化
    #[error("The morphological analyzer has not been initialized.")]
    AnalyzerUninitialized,

    /// エンジンの生成に失敗した
    ///
    /// どのサブシステムで失敗したかを保持します。
    #[error("ServiceCreateFailed({subsystem}): {message}")]
    ServiceCreateFailed {
        /// 失敗したサブシステム
        subsystem: Subsystem,
        /// エラーメッセージ
        message: String,
    },

    /// 要求の引数が不正
    #[error("RequestFormatError: {0}")]
    RequestFormat(String),

    /// 標準I/Oエラー
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSONのシリアライズ・デシリアライズエラー
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// CSVの読み込みエラー
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// 正規表現のコンパイルエラー
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// 一時ファイルの永続化エラー
    #[error(transparent)]
    PathPersist(#[from] tempfile::PersistError),
}

impl ChimeiError {
    /// 形式エラーを生成します
    pub(crate) fn format<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Format(msg.into())
    }

    /// トライ構築エラーを生成します
    pub(crate) fn trie_build<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::TrieBuild(msg.into())
    }

    /// 解析器エラーを生成します
    pub(crate) fn analyzer<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Analyzer(msg.into())
    }

    /// 要求形式エラーを生成します
    pub(crate) fn request_format<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::RequestFormat(msg.into())
    }

    /// エンジン生成失敗エラーを生成します
    ///
    /// # 引数
    ///
    /// * `subsystem` - 失敗したサブシステム
    /// * `msg` - エラーメッセージ
    pub(crate) fn service_create_failed<S>(subsystem: Subsystem, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::ServiceCreateFailed {
            subsystem,
            message: msg.into(),
        }
    }
}

impl From<rusqlite::Error> for ChimeiError {
    fn from(error: rusqlite::Error) -> Self {
        let code = match &error {
            rusqlite::Error::SqliteFailure(e, _) => e.extended_code,
            _ => -1,
        };
        Self::Storage {
            code,
            message: error.to_string(),
        }
    }
}
