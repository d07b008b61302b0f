//! # STAR Format
//!
//! Whitespace-delimited relational tables as read by Relion and cryoDRGN.
//! Each table is a `data_<name>` block holding a `loop_` of `_label #n`
//! declarations followed by one line per row.
//!
//! ```text
//! # version 30001
//!
//! data_particles
//!
//! loop_
//! _rlnImageName #1
//! _rlnOpticsGroup #2
//! 000001@Runs/000123/extra/particles.mrcs 1
//! ```

mod error;
pub mod labels;
mod reader;
mod value;
mod writer;


pub use error::StarError;
pub use reader::{StarDocument, StarTable};
pub use value::StarValue;
pub use writer::StarWriter;

/// Table format marker written before each table
pub const STAR_FORMAT_VERSION: u32 = 30001;
