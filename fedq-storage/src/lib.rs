//! Spill-capable staging store for large aggregate output.
//!
//! Concatenation aggregates (`STRING_AGG`, `TEXTAGG`, `XMLAGG`,
//! `JSON_ARRAYAGG`) write into a [`SpillBuffer`] handed out by a
//! [`LobStore`]. The buffer stays in memory until it crosses the configured
//! threshold and then continues in a temp file, so unbounded results never
//! have to fit in memory. Finishing a buffer yields a [`LobHandle`] that
//! readers stream from regardless of where the bytes ended up.
//!
//! Temporary storage follows a scoped-resource contract: dropping an
//! unfinished buffer, or the last clone of a file-backed handle, removes the
//! backing file.

pub mod config;
pub mod lob;
pub mod spill;

pub use config::*;
pub use lob::*;
pub use spill::*;
