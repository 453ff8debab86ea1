// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Shared primitives for the tagstore metadata layer: the closed error
//! taxonomy exposed to callers, typed tag-attribute values, and the portable
//! timestamp text encoding used by every SQL dialect.

pub use error::{Error, ErrorKind};
pub use value::{AttrType, AttrValue, TagValue};

pub mod diagnostic;
mod error;
pub mod temporal;
mod value;

pub type Result<T> = std::result::Result<T, Error>;
