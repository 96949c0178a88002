//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod publish_presence;
pub mod register_name;
pub mod request_presence;
pub mod route_message;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, DisconnectError, RegisterNameError};
pub use publish_presence::PresenceBroadcaster;
pub use register_name::RegisterNameUseCase;
pub use request_presence::RequestPresenceUseCase;
pub use route_message::{RawChatMessage, RouteMessageUseCase, RouteOutcome};
