use super::TSocket;
use socket2::{Domain, Protocol, Type};
use std::{io, net::IpAddr, time::Duration};

// SO_RCVTIMEO has microsecond resolution and reads a zero timeout as "wait forever", so a
// budget is rounded up to whole microseconds and never below one.
fn read_timeout(budget: Duration) -> Duration {
    let whole_micros = Duration::new(budget.as_secs(), budget.subsec_micros() * 1000);
    let rounded = if whole_micros < budget {
        whole_micros.saturating_add(Duration::from_micros(1))
    } else {
        whole_micros
    };
    rounded.max(Duration::from_micros(1))
}

pub(crate) struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    // Raw sockets work only with root privileges (or CAP_NET_RAW).
    pub(crate) fn new() -> Result<Self, io::Error> {
        tracing::trace!("creating RawSocket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        Ok(RawSocket { socket })
    }
}

impl TSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8], timeout: Duration) -> io::Result<(usize, IpAddr)> {
        // SO_RCVTIMEO bounds the wait for the next datagram. An expired wait surfaces as
        // WouldBlock (or TimedOut on some platforms).
        self.socket.set_read_timeout(Some(read_timeout(timeout)))?;

        // Socket2 gives a safety guaranty which allows us to do an unsafe cast from `&mut [u8]`
        // to `&mut [std::mem::MaybeUninit<u8>]`: it never writes uninitialised bytes.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        //
        // On a RAW socket we get the whole IP datagram.
        let (n, socket_addr) = self.socket.recv_from(unsafe {
            &mut *(std::ptr::addr_of_mut!(*buf) as *mut [std::mem::MaybeUninit<u8>])
        })?;
        let ip = socket_addr
            .as_socket()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "received from a non-IP address"))?
            .ip();
        Ok((n, ip))
    }
}
