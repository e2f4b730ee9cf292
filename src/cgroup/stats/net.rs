//! Parser for `/proc/<pid>/net/dev`.
//!
//! Counters of all non-virtual interfaces of the process' network namespace are summed
//! into one [`NetworkStat`]. Loopback and host-side bridge/veth interfaces are skipped.

use std::io::BufRead;

/// Counters per direction on an interface line.
const COLUMNS: usize = 8;

/// The two header lines preceding the interface lines.
const HEADER_LINES: usize = 2;

const LOOPBACK_INTERFACE: &str = "lo";

const IGNORED_INTERFACE_PREFIXES: [&str; 3] = ["veth", "docker", "nerdctl"];

/// Receive-side columns of `net/dev`, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiveCounters {
    pub bytes: u64,
    pub packets: u64,
    pub errors: u64,
    pub dropped: u64,
    pub fifo: u64,
    pub frame: u64,
    pub compressed: u64,
    pub multicast: u64,
}

/// Transmit-side columns of `net/dev`, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransmitCounters {
    pub bytes: u64,
    pub packets: u64,
    pub errors: u64,
    pub dropped: u64,
    pub fifo: u64,
    pub collisions: u64,
    pub carrier: u64,
    pub compressed: u64,
}

/// Network counters summed over the interfaces of a network namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkStat {
    pub rx: ReceiveCounters,
    pub tx: TransmitCounters,
}

impl ReceiveCounters {
    fn from_columns(columns: [u64; COLUMNS]) -> Self {
        let [bytes, packets, errors, dropped, fifo, frame, compressed, multicast] = columns;
        Self {
            bytes,
            packets,
            errors,
            dropped,
            fifo,
            frame,
            compressed,
            multicast,
        }
    }

    fn columns(&self) -> [u64; COLUMNS] {
        [
            self.bytes,
            self.packets,
            self.errors,
            self.dropped,
            self.fifo,
            self.frame,
            self.compressed,
            self.multicast,
        ]
    }
}

impl TransmitCounters {
    fn from_columns(columns: [u64; COLUMNS]) -> Self {
        let [bytes, packets, errors, dropped, fifo, collisions, carrier, compressed] = columns;
        Self {
            bytes,
            packets,
            errors,
            dropped,
            fifo,
            collisions,
            carrier,
            compressed,
        }
    }

    fn columns(&self) -> [u64; COLUMNS] {
        [
            self.bytes,
            self.packets,
            self.errors,
            self.dropped,
            self.fifo,
            self.collisions,
            self.carrier,
            self.compressed,
        ]
    }
}

/// Kernel counters wrap; so does their sum.
fn wrapping_sum(mut lhs: [u64; COLUMNS], rhs: [u64; COLUMNS]) -> [u64; COLUMNS] {
    for (l, r) in lhs.iter_mut().zip(rhs) {
        *l = l.wrapping_add(r);
    }
    lhs
}

impl std::ops::AddAssign for NetworkStat {
    fn add_assign(&mut self, rhs: Self) {
        self.rx = ReceiveCounters::from_columns(wrapping_sum(self.rx.columns(), rhs.rx.columns()));
        self.tx = TransmitCounters::from_columns(wrapping_sum(self.tx.columns(), rhs.tx.columns()));
    }
}

fn is_ignored_interface(iface: &str) -> bool {
    iface == LOOPBACK_INTERFACE
        || IGNORED_INTERFACE_PREFIXES
            .iter()
            .any(|prefix| iface.starts_with(prefix))
}

fn next_columns<'a>(values: &mut impl Iterator<Item = &'a str>) -> Option<[u64; COLUMNS]> {
    let mut columns = [0u64; COLUMNS];
    for column in &mut columns {
        *column = values.next()?.parse().unwrap_or(0);
    }
    Some(columns)
}

/// Parses one interface line. Lines missing counters are rejected; unparsable
/// counters count as zero.
fn parse_interface_line(line: &str) -> Option<(&str, NetworkStat)> {
    let (iface, data) = line.trim().split_once(':')?;
    let mut values = data.split_whitespace();
    let rx = ReceiveCounters::from_columns(next_columns(&mut values)?);
    let tx = TransmitCounters::from_columns(next_columns(&mut values)?);
    Some((iface.trim(), NetworkStat { rx, tx }))
}

impl NetworkStat {
    /// Sums the counters of every non-ignored interface in a `net/dev` file.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` only if reading from `buf` fails.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut total = NetworkStat::default();
        for line in buf.lines().skip(HEADER_LINES) {
            let line = line?;
            match parse_interface_line(&line) {
                Some((iface, stat)) if !is_ignored_interface(iface) => total += stat,
                Some((iface, _)) => log::trace!("skipping interface `{iface}`"),
                None => {}
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
";

    fn parse(body: &str) -> NetworkStat {
        let data = format!("{HEADER}{body}");
        NetworkStat::from_reader(&mut data.as_bytes()).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let stat = NetworkStat::from_reader(&mut "".as_bytes()).unwrap();
        assert_eq!(stat, NetworkStat::default());
        assert_eq!(parse(""), NetworkStat::default());
    }

    #[test]
    fn test_container_interface_is_counted() {
        let stat = parse(
            "    lo: 422198341   75815    0    0    0     0          0         0 422198341   75815    0    0    0     0       0          0
  eth0: 10240    100     1    2    0     0          0         0  20480   200     3    0    0     4       0          0
",
        );
        assert_eq!(stat.rx.bytes, 10240);
        assert_eq!(stat.rx.packets, 100);
        assert_eq!(stat.rx.errors, 1);
        assert_eq!(stat.rx.dropped, 2);
        assert_eq!(stat.tx.bytes, 20480);
        assert_eq!(stat.tx.packets, 200);
        assert_eq!(stat.tx.errors, 3);
        assert_eq!(stat.tx.collisions, 4);
    }

    #[test]
    fn test_virtual_interfaces_are_skipped() {
        let stat = parse(
            "    lo: 999 999 0 0 0 0 0 0 999 999 0 0 0 0 0 0
    docker0: 999 999 0 0 0 0 0 0 999 999 0 0 0 0 0 0
    veth12ab: 999 999 0 0 0 0 0 0 999 999 0 0 0 0 0 0
",
        );
        assert_eq!(stat, NetworkStat::default());
    }

    #[test]
    fn test_only_exact_loopback_is_skipped() {
        let stat = parse(
            "    lo: 999 999 0 0 0 0 0 0 999 999 0 0 0 0 0 0
  lowpan0: 7 1 0 0 0 0 0 0  9 2 0 0 0 0 0 0
",
        );
        assert_eq!(stat.rx.bytes, 7);
        assert_eq!(stat.tx.bytes, 9);
    }

    #[test]
    fn test_short_line_is_rejected() {
        assert_eq!(parse(" badif: 123 456\n"), NetworkStat::default());
    }

    #[test]
    fn test_interfaces_are_summed() {
        let stat = parse(
            "  eth0: 100 200 0 0 0 0 0 0  300 400 0 0 0 0 0 0
  eth1: 10 20 0 0 0 0 0 0  30 40 0 0 0 0 0 0
",
        );
        assert_eq!(stat.rx.bytes, 110);
        assert_eq!(stat.rx.packets, 220);
        assert_eq!(stat.tx.bytes, 330);
        assert_eq!(stat.tx.packets, 440);
    }

    #[test]
    fn test_sum_wraps_instead_of_overflowing() {
        let stat = parse(&format!(
            "  eth0: {} 0 0 0 0 0 0 0  0 0 0 0 0 0 0 0\n  eth1: 2 0 0 0 0 0 0 0  0 0 0 0 0 0 0 0\n",
            u64::MAX
        ));
        assert_eq!(stat.rx.bytes, 1);
    }

    #[test]
    fn test_unparsable_counter_is_zero() {
        let stat = parse("  eth0: xyz 5 0 0 0 0 0 0  20480 200 0 0 0 0 0 0\n");
        assert_eq!(stat.rx.bytes, 0);
        assert_eq!(stat.rx.packets, 5);
        assert_eq!(stat.tx.bytes, 20480);
    }
}
