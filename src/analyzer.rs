//! 形態素解析器アダプタ
//!
//! このモジュールは、エンジンが形態素解析器から必要とする最小の
//! インタフェースと、vibratoトークナイザーによるその実装を提供します。
//! アダプタは1文を受け取り、文頭・文末トークンで挟んだ形態素トークン列を
//! 返します。

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::{ChimeiError, Result};
use crate::token::Token;

/// 形態素解析器のインタフェース
///
/// エンジンは解析器をこのトレイト越しにのみ利用します。実装は
/// 表層形と素性CSVを持つトークン列を、文頭・文末トークンを含めて
/// 返す必要があります。
pub trait MorphologicalAnalyzer {
    /// 自然文を形態素解析します。
    ///
    /// # 引数
    ///
    /// * `sentence` - 解析対象の自然文
    ///
    /// # 戻り値
    ///
    /// 文頭トークン、形態素トークン列、文末トークンの順の列
    fn parse(&mut self, sentence: &str) -> Result<Vec<Token>>;
}

/// vibratoトークナイザーによる形態素解析器
///
/// システム辞書ファイルから構築します。辞書はMeCab互換の素性を持つ
/// ことを想定しています（IPADICなど）。
pub struct VibratoAnalyzer {
    tokenizer: vibrato::Tokenizer,
}

impl VibratoAnalyzer {
    /// システム辞書ファイルから解析器を生成します。
    ///
    /// # 引数
    ///
    /// * `dictionary_path` - コンパイル済みシステム辞書のパス
    ///
    /// # エラー
    ///
    /// 辞書が読み込めない場合にエラーを返します。
    pub fn from_dictionary_path<P>(dictionary_path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let reader = BufReader::new(File::open(dictionary_path)?);
        let dict = vibrato::Dictionary::read(reader)
            .map_err(|e| ChimeiError::analyzer(e.to_string()))?;
        Ok(Self {
            tokenizer: vibrato::Tokenizer::new(dict),
        })
    }

    /// システム辞書とユーザ辞書（CSV）から解析器を生成します。
    ///
    /// # 引数
    ///
    /// * `dictionary_path` - コンパイル済みシステム辞書のパス
    /// * `user_lexicon_path` - MeCab形式のユーザ辞書CSVのパス
    pub fn with_user_lexicon<P1, P2>(dictionary_path: P1, user_lexicon_path: P2) -> Result<Self>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        let reader = BufReader::new(File::open(dictionary_path)?);
        let dict = vibrato::Dictionary::read(reader)
            .map_err(|e| ChimeiError::analyzer(e.to_string()))?;
        let user_reader = BufReader::new(File::open(user_lexicon_path)?);
        let dict = dict
            .reset_user_lexicon_from_reader(Some(user_reader))
            .map_err(|e| ChimeiError::analyzer(e.to_string()))?;
        Ok(Self {
            tokenizer: vibrato::Tokenizer::new(dict),
        })
    }
}

impl MorphologicalAnalyzer for VibratoAnalyzer {
    fn parse(&mut self, sentence: &str) -> Result<Vec<Token>> {
        let mut worker = self.tokenizer.new_worker();
        worker.reset_sentence(sentence);
        worker.tokenize();

        let mut tokens = Vec::with_capacity(worker.num_tokens() + 2);
        tokens.push(Token::bos());
        for token in worker.token_iter() {
            tokens.push(Token::with_feature(token.surface(), token.feature()));
        }
        tokens.push(Token::eos());
        Ok(tokens)
    }
}
