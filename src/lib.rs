//#![warn(missing_docs)]

pub mod bloom;

pub mod config;

pub mod enumeration;

pub mod error;

pub mod exclude;

pub mod hash;

pub mod interest;

pub mod name;

pub mod store;

pub mod timestamp;

pub mod trie;

pub use error::{Error, Result};
pub use interest::Interest;
pub use name::{Component, Name};
pub use trie::NameTrie;
