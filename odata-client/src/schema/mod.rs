//! Type registry
//!
//! Holds per-namespace enums, structured types, callables and containers,
//! and resolves qualified type names to parsers.

pub mod builder;
pub mod registry;
pub mod types;

pub use builder::RegistryBuilder;
pub use registry::{Registry, Schema};
pub use types::{
    Callable, CallableId, EntitySet, EnumId, EnumType, FieldDef, ParserRef, ReferenceKind,
    ReturnDef, Singleton, StructId, StructuredType, UnresolvedReference,
};
