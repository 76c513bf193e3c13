use std::{io, net::IpAddr, time::Duration};

pub(crate) mod raw_socket;

pub(crate) trait TSocket: Send + Sync {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;

    /// Waits at most `timeout` for the next datagram. An expired wait is reported as an error of
    /// kind `WouldBlock` or `TimedOut`.
    fn recv_from(&self, buf: &mut [u8], timeout: Duration) -> io::Result<(usize, IpAddr)>;
}
