/// RFC 1071 Internet checksum.
///
/// The buffer is summed as big-endian 16-bit words; an odd trailing byte is padded with a zero
/// low byte. The result is meant to be stored in network byte order, e.g. with
/// `set_checksum` of a `pnet_packet` ICMP packet or `u16::to_be_bytes`.
///
/// A buffer which already carries its own correct checksum sums to zero.
pub(crate) fn checksum(bytes: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = bytes.chunks_exact(2);
    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
        // Keep the accumulator from overflowing on large buffers.
        if sum > 0xFFFF_0000 {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
    }
    if let [last] = words.remainder() {
        sum += u32::from(*last) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    #[allow(clippy::cast_possible_truncation)]
    let folded = sum as u16;
    !folded
}
