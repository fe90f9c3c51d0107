//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with the aircraft's remote
//! controller.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod aircraft;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use aircraft::*;
