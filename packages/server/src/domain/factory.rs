//! Domain factories for creating domain entities and value objects.

use super::{ConnectionId, error::ValueObjectError};

/// Factory for generating ConnectionId instances.
///
/// The transport layer calls this once per accepted session, so ids are never
/// reused while a record referencing them exists.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    ///
    /// # Errors
    ///
    /// This method should not fail in practice, but returns Result for consistency
    /// with the domain error handling pattern.
    pub fn generate() -> Result<ConnectionId, ValueObjectError> {
        let uuid = uuid::Uuid::new_v4();
        ConnectionId::new(uuid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_factory_generate() {
        // テスト項目: ConnectionIdFactory::generate() で UUID v4 形式の ConnectionId を生成できる
        // when (操作):
        let result = ConnectionIdFactory::generate();

        // then (期待する結果):
        assert!(result.is_ok());
        let connection_id = result.unwrap();
        assert_eq!(connection_id.as_str().len(), 36); // UUID v4 の標準長（ハイフン含む）
    }

    #[test]
    fn test_connection_id_factory_generate_uniqueness() {
        // テスト項目: ConnectionIdFactory::generate() は毎回異なる ID を生成する
        // when (操作):
        let id1 = ConnectionIdFactory::generate().unwrap();
        let id2 = ConnectionIdFactory::generate().unwrap();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }
}
