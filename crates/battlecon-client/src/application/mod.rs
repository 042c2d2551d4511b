//! Application layer for battlecon-client.
//!
//! The pieces of the engine that decide *what happens*, without owning any
//! socket:
//!
//! - [`correlator`] – pairs replies with the commands that caused them.
//! - [`game_module`] – the login / event-translation seam.
//! - [`frostbite`] – the built-in module for Battlefield 3, 4 and Hardline.

pub mod correlator;
pub mod frostbite;
pub mod game_module;

pub use correlator::{Correlator, Dispatch, Outcome};
pub use frostbite::FrostbiteModule;
pub use game_module::{GameModule, ModuleOptions, RconSession, UnknownModule};
