use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// APIキーの取得方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// 実行環境が提供するキー（環境変数）。無ければ処理しない
    #[default]
    Host,
    /// ユーザーが入力し設定ファイルに保存したキー
    Stored,
    /// 常に利用可能とみなし、認証エラーを検出したら「キー未設定」に切り替える
    Optimistic,
}

impl KeyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStrategy::Host => "host",
            KeyStrategy::Stored => "stored",
            KeyStrategy::Optimistic => "optimistic",
        }
    }
}

impl std::fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
