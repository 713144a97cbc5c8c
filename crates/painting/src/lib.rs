//! Inkwell painting system - ink strokes and their colliders
//!
//! This crate provides the core data types for 3D ink:
//! - [`types::Pose`] / [`types::InkTag`] - placement and eraser tags
//! - [`trail`] - Trail sampling contract and an in-memory recorder
//! - [`ink::InkObject`] - A single stroke from spawn to destruction
//! - [`ribbon`] - Ribbon collider meshing of a finished centerline
//! - [`contact`] - Eraser sphere vs ribbon overlap
//! - [`pool`] - Bounded ink pool with lifecycle events

pub mod constants;
pub mod contact;
pub mod ink;
pub mod pool;
pub mod ribbon;
pub mod trail;
pub mod types;

pub use constants::*;
pub use contact::*;
pub use ink::*;
pub use pool::*;
pub use ribbon::*;
pub use trail::*;
pub use types::*;
