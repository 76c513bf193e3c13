use echo_probe::{PingError, ProbeReport, ProbeResult, SequenceMatching, SessionConfig};
use std::time::Duration;

type GenericError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(argh::FromArgs)]
/// ping - send ICMP ECHO_REQUEST to a host and print the round-trip times
struct Args {
    #[argh(option, short = 'c', default = "echo_probe::DEFAULT_PACKET_COUNT")]
    /// stop after <count> probes
    count: u16,

    #[argh(option, short = 's', default = "echo_probe::DEFAULT_PACKET_SIZE")]
    /// size of the ICMP message in bytes, header included
    size: usize,

    #[argh(option, short = 'W', default = "3000")]
    /// time to wait for a reply, in milliseconds
    timeout: u64,

    #[argh(option, short = 'i', default = "1000")]
    /// time between the start of two probes, in milliseconds
    interval: u64,

    #[argh(switch)]
    /// only accept replies whose sequence number matches the outstanding probe
    strict_sequence: bool,

    #[argh(switch, short = 'v')]
    /// log protocol details
    verbose: bool,

    #[argh(positional)]
    /// host name or IPv4 address
    host: String,
}

struct ConsoleReport;

impl ProbeReport for ConsoleReport {
    fn session_started(&mut self, config: &SessionConfig) {
        println!("Ping {}", config.destination_host);
        println!("Destination IP: {}", config.destination_address);
        println!("Packet size: {}", config.packet_size);
    }

    fn probe_settled(&mut self, result: &ProbeResult) {
        match (result.delay_millis, result.ttl) {
            (Some(delay), Some(ttl)) => {
                println!("icmp_seq={} ttl={} time={:.0} ms", result.sequence_number, ttl, delay.round());
            }
            (Some(delay), None) => println!("icmp_seq={} time={:.0} ms", result.sequence_number, delay.round()),
            (None, _) => println!("icmp_seq={} timed out", result.sequence_number),
        }
    }
}

fn main() -> Result<(), GenericError> {
    let args: Args = argh::from_env();

    let level = if args.verbose { tracing::Level::TRACE } else { tracing::Level::WARN };
    let subscriber = tracing_subscriber::FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let address = match echo_probe::resolve(&args.host) {
        Ok(address) => address,
        Err(e) => {
            let reason = e.downcast_ref::<PingError>().map_or_else(|| e.to_string(), |e| e.message.clone());
            println!("\nError: {reason}");
            return Err(e);
        }
    };

    let config = SessionConfig {
        packet_count: args.count,
        packet_size: args.size,
        timeout: Duration::from_millis(args.timeout),
        probe_interval: Duration::from_millis(args.interval),
        sequence_matching: if args.strict_sequence {
            SequenceMatching::IdentifierAndSequence
        } else {
            SequenceMatching::IdentifierOnly
        },
        ..SessionConfig::new(args.host.clone(), address)
    };

    let session = match echo_probe::create(&config) {
        Ok(session) => session,
        Err(e) => {
            if let Some(io_error) = e.downcast_ref::<std::io::Error>() {
                if io_error.kind() == std::io::ErrorKind::PermissionDenied {
                    println!("failed. (socket error: {io_error}; raw sockets need root privileges)");
                }
            }
            return Err(e);
        }
    };

    session.run(&mut ConsoleReport);
    Ok(())
}
