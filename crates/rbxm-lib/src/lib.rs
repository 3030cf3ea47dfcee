//! Reader for the binary scene-graph document container.
//!
//! The container is a sequence of tagged, optionally compressed chunks.
//! Object ids and types are declared by INST chunks, one property column per
//! PROP chunk, parent links by PRNT, plus file-level metadata (META) and a
//! shared string dictionary (SSTR). Columns are byte-interleaved with
//! zig-zag and sign-rotation transforms tuned for byte-stream compression.
//!
//! ```no_run
//! use rbxm_lib::Document;
//!
//! let doc = Document::load_file("scene.rbxm")?;
//! for instance in doc.instances() {
//!     println!("{}", doc.type_name(instance));
//! }
//! # Ok::<(), rbxm_lib::Error>(())
//! ```

mod binary;
pub mod document;
pub mod error;

pub use document::{
    BrickColor, CFrame, Color3, ColorKeypoint, ColorSequence, Document, FontInfo, Instance, Mat3,
    NumberKeypoint, NumberRange, NumberSequence, OptionalCFrame, PhysicalProperties, Property,
    PropertyFormat, PropertyValue, Rect2D, SharedString, Type, UDim2, UniqueId, Vec2, Vec3,
};
pub use error::{Error, Result};
