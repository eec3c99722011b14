//! # Core
//!
//! Everything the console adapter leans on that has nothing to do with a
//! terminal. No I/O happens in here except reading the config file.
//!
//! ```text
//!     ┌──────────────────────────────────────────────┐
//!     │                    CORE                      │
//!     │                                              │
//!     │  • style   (tag vocabulary, stripping)       │
//!     │  • wrap    (tag-aware word wrapping)         │
//!     │  • player  (input buffer the console feeds)  │
//!     │  • signal  (arm/clear hand-off)              │
//!     │  • config  (defaults → file → env → CLI)     │
//!     └──────────────────────┬───────────────────────┘
//!                            │
//!                            ▼
//!                   ┌──────────────────┐
//!                   │     console      │
//!                   │ (terminal glue)  │
//!                   └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`style`]: The `StyleTag` enum, the single list of recognized tags
//! - [`wrap`]: `StyleTagsAwareWrapper`, where tags take zero columns
//! - [`player`]: The `Player` trait and `PlayerSession`
//! - [`signal`]: `Signal`, a Condvar-backed set/clear flag
//! - [`config`]: Loading and resolving `~/.tale/console.toml`

pub mod config;
pub mod player;
pub mod signal;
pub mod style;
pub mod wrap;

pub use player::{Player, PlayerSession};
pub use style::StyleTag;
