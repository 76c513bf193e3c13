pub(crate) use echo_session::EchoSession;
pub use generic_error::GenericError;
pub use ping_error::PingError;
pub use ping_result::PingResult;
pub(crate) use transport::Transport;

mod echo_session;
mod generic_error;
pub(crate) mod icmp;
mod ping_error;
mod ping_result;
mod transport;
