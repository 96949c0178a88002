//! UseCase 層のエラー定義

use thiserror::Error;

/// 参加者接続のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// 同じ接続 ID が既に登録されている（Transport 層の不変条件違反）
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),
}

/// 表示名登録のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterNameError {
    /// 接続が登録されていない（切断との競合）
    #[error("connection '{0}' is not registered")]
    UnknownConnection(String),
}

/// 参加者切断のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisconnectError {
    /// 既に切断済み
    #[error("connection '{0}' is not registered")]
    NotConnected(String),
}
