//! Canonical ordering comparators.
//!
//! One strict ordering per context-rule family, applied before emission so
//! the artifact is reproducible regardless of declaration order. All sorting
//! call sites use stable sorts: entries that compare equal keep their
//! declaration order.

use cilgen_ast::db::{
    FileCon, FsUse, GenfsCon, IomemCon, IoportCon, NetifCon, NodeCon, PciDeviceCon, PirqCon,
    PortCon,
};
use std::cmp::Ordering;
use std::net::IpAddr;

/// Port contexts: ascending range width, ties by ascending low bound.
pub fn compare_portcon(a: &PortCon, b: &PortCon) -> Ordering {
    let a_width = i32::from(a.high) - i32::from(a.low);
    let b_width = i32::from(b.high) - i32::from(b.low);
    a_width.cmp(&b_width).then(a.low.cmp(&b.low))
}

/// Generic filesystem contexts: filesystem-type name, then path.
pub fn compare_genfscon(a: &GenfsCon, b: &GenfsCon) -> Ordering {
    a.fs_type.cmp(&b.fs_type).then_with(|| a.path.cmp(&b.path))
}

/// Network interface contexts: interface name.
pub fn compare_netifcon(a: &NetifCon, b: &NetifCon) -> Ordering {
    a.interface.cmp(&b.interface)
}

/// Node contexts: IPv4 before IPv6; within a family the most specific
/// netmask first (descending byte-wise mask), then ascending byte-wise
/// address.
pub fn compare_nodecon(a: &NodeCon, b: &NodeCon) -> Ordering {
    family_rank(a.addr)
        .cmp(&family_rank(b.addr))
        .then_with(|| ip_octets(b.mask).cmp(&ip_octets(a.mask)))
        .then_with(|| ip_octets(a.addr).cmp(&ip_octets(b.addr)))
}

fn family_rank(addr: IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 0,
        IpAddr::V6(_) => 1,
    }
}

fn ip_octets(addr: IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

/// Interrupt contexts: ascending interrupt number.
pub fn compare_pirqcon(a: &PirqCon, b: &PirqCon) -> Ordering {
    a.pirq.cmp(&b.pirq)
}

/// IO memory contexts: ascending range width, ties by ascending low bound.
pub fn compare_iomemcon(a: &IomemCon, b: &IomemCon) -> Ordering {
    let a_width = i128::from(a.high) - i128::from(a.low);
    let b_width = i128::from(b.high) - i128::from(b.low);
    a_width.cmp(&b_width).then(a.low.cmp(&b.low))
}

/// IO port contexts: ascending range width, ties by ascending low bound.
pub fn compare_ioportcon(a: &IoportCon, b: &IoportCon) -> Ordering {
    let a_width = i64::from(a.high) - i64::from(a.low);
    let b_width = i64::from(b.high) - i64::from(b.low);
    a_width.cmp(&b_width).then(a.low.cmp(&b.low))
}

/// PCI device contexts: ascending device identifier.
pub fn compare_pcidevicecon(a: &PciDeviceCon, b: &PciDeviceCon) -> Ordering {
    a.dev.cmp(&b.dev)
}

/// Filesystem-use declarations: subtype, then filesystem-type name.
pub fn compare_fsuse(a: &FsUse, b: &FsUse) -> Ordering {
    a.kind.cmp(&b.kind).then_with(|| a.fs_type.cmp(&b.fs_type))
}

/// File contexts: literal paths before regex paths, then shorter literal
/// stem, then shorter total path, then rule subtype.
pub fn compare_filecon(a: &FileCon, b: &FileCon) -> Ordering {
    let a_spec = PathSpec::of(&a.path);
    let b_spec = PathSpec::of(&b.path);

    a_spec
        .meta
        .cmp(&b_spec.meta)
        .then(a_spec.stem_len.cmp(&b_spec.stem_len))
        .then(a_spec.str_len.cmp(&b_spec.str_len))
        .then(a.kind.cmp(&b.kind))
}

/// Regex metacharacters that end the literal stem of a file-context path.
const PATH_META: [char; 10] = ['.', '^', '$', '?', '*', '+', '|', '[', '(', '{'];

/// Classification of a file-context path: whether it contains regex
/// metacharacters, the length of the literal stem before the first one, and
/// the total length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathSpec {
    meta: bool,
    stem_len: usize,
    str_len: usize,
}

impl PathSpec {
    fn of(path: &str) -> Self {
        let mut spec = Self {
            meta: false,
            stem_len: 0,
            str_len: 0,
        };
        let mut chars = path.chars();
        while let Some(c) = chars.next() {
            if PATH_META.contains(&c) {
                spec.meta = true;
            } else {
                if c == '\\' {
                    // Escape: the next character is literal and skipped
                    // from classification entirely.
                    chars.next();
                }
                if !spec.meta {
                    spec.stem_len += 1;
                }
            }
            spec.str_len += 1;
        }
        spec
    }
}
