//! Persistent entities of the storefront core.
//!
//! Column names are what the storage collaborator expects; the semantic
//! fields (quantity / available / reserved / in-transit and the trailer
//! spec bag) are the contract.

pub mod accessory;
pub mod stock_movement;
pub mod stock_record;
pub mod trailer;
pub mod warehouse;
