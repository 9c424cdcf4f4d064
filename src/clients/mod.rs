pub mod challenge;
pub mod http_client;

pub use challenge::{ChallengeApi, ChallengeError, ChromiumChallenge, FixedChallenge, MissingChallenge};
pub use http_client::{HttpReply, ReqwestTransport, Transport, TransportError};
