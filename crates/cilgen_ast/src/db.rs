//! Entity collections owned for the whole compilation.
//!
//! Upstream resolution passes populate these collections; the emitter only
//! borrows them to sort and render. The record types are plain serde data so
//! tests can load them from JSON fixtures.

use crate::context::Context;
use crate::model::Statement;
use crate::symtab::{SymbolId, SymbolTable};
use cilgen_tree::Tree;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Transport protocol of a port context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// TCP port range.
    Tcp,
    /// UDP port range.
    Udp,
}

impl Protocol {
    /// The policy-source keyword for this protocol.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// Port range context (`portcon`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortCon {
    /// Transport protocol.
    pub proto: Protocol,
    /// Low end of the port range.
    pub low: u16,
    /// High end of the port range.
    pub high: u16,
    /// Assigned context.
    pub context: Context,
}

/// Network node context (`nodecon`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCon {
    /// Node address.
    pub addr: IpAddr,
    /// Netmask; same family as `addr`.
    pub mask: IpAddr,
    /// Assigned context.
    pub context: Context,
}

/// Generic filesystem context (`genfscon`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenfsCon {
    /// Filesystem type name.
    pub fs_type: String,
    /// Path within the filesystem.
    pub path: String,
    /// Assigned context.
    pub context: Context,
}

/// Network interface context (`netifcon`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetifCon {
    /// Interface name.
    pub interface: String,
    /// Context of the interface itself.
    pub if_context: Context,
    /// Context of packets on the interface.
    pub packet_context: Context,
}

/// Interrupt line context (`pirqcon`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PirqCon {
    /// Interrupt number.
    pub pirq: u32,
    /// Assigned context.
    pub context: Context,
}

/// IO memory range context (`iomemcon`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IomemCon {
    /// Low end of the memory range.
    pub low: u64,
    /// High end of the memory range.
    pub high: u64,
    /// Assigned context.
    pub context: Context,
}

/// IO port range context (`ioportcon`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoportCon {
    /// Low end of the port range.
    pub low: u32,
    /// High end of the port range.
    pub high: u32,
    /// Assigned context.
    pub context: Context,
}

/// PCI device context (`pcidevicecon`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciDeviceCon {
    /// Device identifier.
    pub dev: u32,
    /// Assigned context.
    pub context: Context,
}

/// Labeling behavior of a filesystem-use declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsUseKind {
    /// Labels stored in extended attributes.
    Xattr,
    /// Labels derived from the creating task.
    Task,
    /// Labels derived by transition.
    Trans,
}

impl FsUseKind {
    /// The policy-source keyword for this declaration.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Xattr => "fs_use_xattr",
            Self::Task => "fs_use_task",
            Self::Trans => "fs_use_trans",
        }
    }
}

/// Filesystem-use declaration (`fs_use_*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsUse {
    /// Labeling behavior.
    pub kind: FsUseKind,
    /// Filesystem type name.
    pub fs_type: String,
    /// Assigned context.
    pub context: Context,
}

/// File type restriction of a file context rule. The declaration order is
/// the numeric tiebreak used by the file-context comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileConKind {
    /// Regular files (`--`).
    File,
    /// Directories (`-d`).
    Dir,
    /// Character devices (`-c`).
    Char,
    /// Block devices (`-b`).
    Block,
    /// Sockets (`-s`).
    Socket,
    /// Named pipes (`-p`).
    Pipe,
    /// Symbolic links (`-l`).
    Symlink,
    /// Any file type (no flag).
    Any,
}

impl FileConKind {
    /// The file-type flag rendered between path and context; empty for
    /// [`FileConKind::Any`].
    pub const fn flag(self) -> &'static str {
        match self {
            Self::File => "--",
            Self::Dir => "-d",
            Self::Char => "-c",
            Self::Block => "-b",
            Self::Socket => "-s",
            Self::Pipe => "-p",
            Self::Symlink => "-l",
            Self::Any => "",
        }
    }
}

/// File path context rule (`filecon`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCon {
    /// Path, possibly containing regex metacharacters.
    pub path: String,
    /// File type restriction.
    pub kind: FileConKind,
    /// Assigned context.
    pub context: Context,
}

/// Everything the emitter needs for one compilation: the semantic tree, the
/// symbol table, the pre-computed orders, and one collection per
/// context-rule family.
#[derive(Debug, Clone)]
pub struct PolicyDb {
    /// The semantic tree, read-only once built.
    pub ast: Tree<Statement>,
    /// Symbol handles and spellings.
    pub symbols: SymbolTable,
    /// Sensitivity dominance order, most dominant last.
    pub dominance: Vec<SymbolId>,
    /// Category declaration order.
    pub cat_order: Vec<SymbolId>,
    /// Network interface contexts.
    pub netifcons: Vec<NetifCon>,
    /// Generic filesystem contexts.
    pub genfscons: Vec<GenfsCon>,
    /// Port range contexts.
    pub portcons: Vec<PortCon>,
    /// Network node contexts.
    pub nodecons: Vec<NodeCon>,
    /// Interrupt line contexts.
    pub pirqcons: Vec<PirqCon>,
    /// IO memory range contexts.
    pub iomemcons: Vec<IomemCon>,
    /// IO port range contexts.
    pub ioportcons: Vec<IoportCon>,
    /// PCI device contexts.
    pub pcidevicecons: Vec<PciDeviceCon>,
    /// Filesystem-use declarations.
    pub fs_uses: Vec<FsUse>,
    /// File path contexts.
    pub filecons: Vec<FileCon>,
}

impl PolicyDb {
    /// Creates a database around a semantic tree and symbol table, with all
    /// entity collections empty.
    pub fn new(ast: Tree<Statement>, symbols: SymbolTable) -> Self {
        Self {
            ast,
            symbols,
            dominance: Vec::new(),
            cat_order: Vec::new(),
            netifcons: Vec::new(),
            genfscons: Vec::new(),
            portcons: Vec::new(),
            nodecons: Vec::new(),
            pirqcons: Vec::new(),
            iomemcons: Vec::new(),
            ioportcons: Vec::new(),
            pcidevicecons: Vec::new(),
            fs_uses: Vec::new(),
            filecons: Vec::new(),
        }
    }
}
