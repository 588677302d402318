//! Statement model and AST construction for cilgen.
//!
//! This crate provides:
//! - Symbol handles and the interning table ([`symtab`])
//! - The closed statement model shared by all passes ([`model`])
//! - Security context and MLS level types ([`context`])
//! - Entity collections owned for the whole compilation ([`db`])
//! - The keyword-driven AST builder over the raw parse tree ([`builder`])

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod builder;
pub mod context;
pub mod db;
pub mod error;
pub mod model;
pub mod symtab;

pub use builder::{build_ast, ParseTree, ParseValue};
pub use context::{CatItem, CatSet, Context, Level, LevelRange};
pub use db::PolicyDb;
pub use error::{Error, Result};
pub use model::{AvRule, AvRuleKind, Constrain, ExprOp, ExprToken, Flavor, Statement, TypeRule, TypeRuleKind};
pub use symtab::{SymbolId, SymbolTable};
