//! アプライアンスクライアントのエラー定義。

/// ApplianceClientError はアプライアンス API クライアントで発生するエラーを表す。
///
/// ライブラリ内部ではリトライも握りつぶしも行わない。
/// 呼び出し元へ返す際は `Operation` で操作名を付与する。
#[derive(thiserror::Error, Debug)]
pub enum ApplianceClientError {
    /// 必須設定項目が欠落している。
    #[error("設定エラー: {0} が指定されていません")]
    Config(&'static str),

    /// 設定ファイルの解析に失敗した。
    #[error("設定の解析に失敗しました: {0}")]
    ConfigParse(String),

    /// ネットワークレベルの失敗（タイムアウトを含む）。
    #[error("HTTP リクエスト失敗: {0}")]
    Transport(String),

    /// レスポンスボディの JSON 解析に失敗した。
    #[error("レスポンスの解析に失敗しました: {0}")]
    Decode(String),

    /// 200 以外のステータスコードが返された。
    #[error("予期しないステータスコード {status} ({path}): {body}")]
    UnexpectedStatus {
        status: u16,
        path: String,
        body: String,
    },

    /// アイデンティティプロバイダーがエラーコードを返した。
    #[error("認証失敗 (errorCode={code}): {message}")]
    Authentication { code: i64, message: String },

    /// アカウントに対応するアイデンティティプロバイダーが見つからない。
    #[error("アイデンティティプロバイダーが見つかりません")]
    NoProvider,

    /// 複数のアイデンティティプロバイダーが見つかった（未サポート）。
    #[error("複数のアイデンティティプロバイダーが見つかりました（1 件のみサポート）: {count} 件")]
    AmbiguousProvider { count: usize },

    /// 設定された国コードがサービス対象外。
    #[error("国コード {code:?} は利用可能な国に含まれていません: {available:?}")]
    UnsupportedCountry { code: String, available: Vec<String> },

    /// ユーザートークンがない状態でユーザー認可 API を呼び出した。
    #[error("ログインしてからこのエンドポイントを使用してください")]
    NotLoggedIn,

    /// リージョン URL が確定していない（ディスカバリー前）。
    #[error("リージョン URL が未確定です。先にログインしてください")]
    MissingRegion,

    /// リフレッシュトークンを持たないトークンを更新しようとした。
    #[error("リフレッシュトークンがありません")]
    MissingRefreshToken,

    /// サーバーがリフレッシュを拒否した。
    #[error("トークンのリフレッシュに失敗しました: {0}")]
    RefreshFailed(#[source] Box<ApplianceClientError>),

    /// ユーザートークンが期限切れで、リフレッシュもできなかった。
    #[error("セッションの有効期限が切れました: {0}")]
    SessionExpired(#[source] Box<ApplianceClientError>),

    /// 発生元の操作名を付与したエラー。
    #[error("{operation}: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: Box<ApplianceClientError>,
    },
}

impl ApplianceClientError {
    /// 操作名を付与してラップする。
    pub fn context(self, operation: &'static str) -> Self {
        Self::Operation {
            operation,
            source: Box::new(self),
        }
    }

    /// `Operation` を剥がした内側のエラーを返す。
    ///
    /// `RefreshFailed` と `SessionExpired` は分類そのものなので剥がさない。
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Self::Operation { source, .. } = current {
            current = source;
        }
        current
    }

    /// エラーを包んでいる操作名を外側から順に返す。
    pub fn operations(&self) -> Vec<&'static str> {
        let mut ops = Vec::new();
        let mut current = self;
        while let Self::Operation { operation, source } = current {
            ops.push(*operation);
            current = source;
        }
        ops
    }

    /// HTTP ステータスコードを持つエラーならその値を返す。
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::RefreshFailed(inner) | Self::SessionExpired(inner) => inner.status(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApplianceClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApplianceClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// クレート共通の Result 型。
pub type Result<T> = std::result::Result<T, ApplianceClientError>;
