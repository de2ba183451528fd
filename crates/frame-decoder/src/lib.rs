//! frame-decoder: opcode-table driven decoding of peripheral command frames
//!
//! A [`DecoderRegistry`] holds an ordered list of [`DecodeRule`]s. The first rule whose matcher
//! accepts a device kind decodes that device's frames; frames from devices nobody registered a
//! rule for are still reported, as `"Unknown"` commands.

mod types;
pub use types::{DecodedCommand, FieldValue, OpcodeName, OpcodeTableSpec, OpcodeValue};

mod error;
pub use error::{DecodeError, Result};

mod decode;
pub use decode::{
    gan_cube_table, FrameDecoder, OpcodeTable, FALLBACK_OPCODE_OFFSET, GAN_CUBE_KIND,
    MALFORMED_COMMAND, UNKNOWN_COMMAND,
};

mod registry;
pub use registry::{DecodeRule, DecoderRegistry, DeviceMatcher};

mod loader;
pub use loader::{load_table_file, load_tables_dir};
