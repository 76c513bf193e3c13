pub(crate) use checksum::checksum;
pub(crate) use icmpv4::{EchoReceive, EchoReply};
pub(crate) use sequence_number::SequenceNumber;
pub(crate) use socket::raw_socket::RawSocket;
pub(crate) use socket::TSocket;
pub use ttl::Ttl;

mod checksum;
pub(crate) mod icmpv4;
mod sequence_number;
pub(crate) mod socket;
mod ttl;

#[cfg(test)]
pub(crate) use socket::tests;
