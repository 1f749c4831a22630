//! Data-driven combat content and loaders.
//!
//! This crate houses the declarative catalogs consumed by the combat rules and
//! provides loaders for RON/TOML data files:
//! - Ability catalog (data-driven via RON)
//! - Summon catalog and ability bundles (data-driven via RON)
//! - Maintained-effect ("song") definitions (data-driven via RON)
//! - Combat rules configuration (data-driven via TOML)
//!
//! Content is consumed through the core `CatalogOracle` and never appears in
//! combat state.

pub mod catalog;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalog::{Catalog, CatalogError};

#[cfg(feature = "loaders")]
pub use loaders::{CatalogLoader, ConfigLoader, ContentFactory};
