#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

//! Round-trip latency measurement with ICMP echo requests over raw IPv4 sockets.
//!
//! ```no_run
//! use echo_probe::SessionConfig;
//!
//! let address = echo_probe::resolve("example.com")?;
//! let config = SessionConfig::new("example.com", address);
//! let session = echo_probe::create(&config)?;
//! for result in session.run(&mut ()) {
//!     match result.delay_millis {
//!         Some(delay) => println!("seq={} time={delay:.0} ms", result.sequence_number),
//!         None => println!("seq={} timed out", result.sequence_number),
//!     }
//! }
//! # Ok::<(), echo_probe::GenericError>(())
//! ```

pub use details::icmp::v4::Ttl;
pub use details::{GenericError, PingError, PingResult};
pub use echo_probe::*;
pub use probe_result::ProbeResult;
pub use report::ProbeReport;
pub use session_config::*;

mod details;
mod echo_probe;
mod probe_result;
mod report;
mod session_config;
