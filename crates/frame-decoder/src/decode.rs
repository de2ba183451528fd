use crate::{DecodeError, DecodedCommand, FieldValue, OpcodeTableSpec, Result};

/// Byte offset the opcode is read from when no rule matches a device kind.
pub const FALLBACK_OPCODE_OFFSET: usize = 3;

/// Name reported for opcodes no table knows about.
pub const UNKNOWN_COMMAND: &str = "Unknown";

/// Name reported for frames too short to carry an opcode.
pub const MALFORMED_COMMAND: &str = "Malformed Frame";

/// Device kind of GAN smart cubes.
pub const GAN_CUBE_KIND: &str = "gan-cube";

/// Turns the raw bytes of one frame into a command description.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, frame: &[u8]) -> Result<DecodedCommand>;

    /// Shortest frame `decode` accepts.
    fn min_len(&self) -> usize {
        0
    }

    /// Label used when logging this decoder's commands.
    fn label(&self) -> &str {
        "Device"
    }
}

impl<F> FrameDecoder for F
where
    F: Fn(&[u8]) -> Result<DecodedCommand> + Send + Sync,
{
    fn decode(&self, frame: &[u8]) -> Result<DecodedCommand> {
        self(frame)
    }
}

/// Closed opcode-to-name table with the opcode at a fixed offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeTable {
    label: String,
    opcode_offset: usize,
    min_len: usize,
    names: Vec<(u8, String)>,
}

impl OpcodeTable {
    pub fn new(label: impl Into<String>, opcode_offset: usize) -> Self {
        Self {
            label: label.into(),
            opcode_offset,
            min_len: opcode_offset.saturating_add(1),
            names: Vec::new(),
        }
    }

    /// Require at least `min_len` bytes; never less than what reaching the opcode needs.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len.max(self.opcode_offset.saturating_add(1));
        self
    }

    pub fn opcode(mut self, opcode: u8, name: impl Into<String>) -> Self {
        self.names.push((opcode, name.into()));
        self
    }

    /// First name registered for `opcode`.
    pub fn name_of(&self, opcode: u8) -> Option<&str> {
        self.names
            .iter()
            .find(|(op, _)| *op == opcode)
            .map(|(_, name)| name.as_str())
    }

    pub fn from_spec(spec: &OpcodeTableSpec) -> Result<Self> {
        if spec.opcode_offset.checked_add(1).is_none() {
            return Err(DecodeError::InvalidTable {
                table: spec.kind.clone(),
                reason: format!("opcode offset {} is out of range", spec.opcode_offset),
            });
        }
        let label = spec.label.clone().unwrap_or_else(|| spec.kind.clone());
        let mut table = Self::new(label, spec.opcode_offset);
        if let Some(min) = spec.min_len {
            if min <= spec.opcode_offset {
                return Err(DecodeError::InvalidTable {
                    table: spec.kind.clone(),
                    reason: format!(
                        "min_len {min} does not reach opcode offset {}",
                        spec.opcode_offset
                    ),
                });
            }
            table = table.with_min_len(min);
        }
        for entry in &spec.opcodes {
            let op = entry.opcode.to_u8().ok_or_else(|| DecodeError::InvalidTable {
                table: spec.kind.clone(),
                reason: format!("opcode for '{}' is not a byte", entry.name),
            })?;
            table = table.opcode(op, entry.name.clone());
        }
        Ok(table)
    }
}

impl FrameDecoder for OpcodeTable {
    fn decode(&self, frame: &[u8]) -> Result<DecodedCommand> {
        if frame.len() < self.min_len {
            return Err(DecodeError::MalformedFrame {
                kind: self.label.clone(),
                len: frame.len(),
                min: self.min_len,
            });
        }
        let opcode = frame[self.opcode_offset];
        let (name, known) = match self.name_of(opcode) {
            Some(n) => (n, true),
            None => (UNKNOWN_COMMAND, false),
        };
        Ok(DecodedCommand::new(opcode, name)
            .with_field("frame_len", FieldValue::I64(frame.len() as i64))
            .with_field(
                "payload_len",
                FieldValue::I64((frame.len() - self.opcode_offset - 1) as i64),
            )
            .with_field("known", FieldValue::Bool(known)))
    }

    fn min_len(&self) -> usize {
        self.min_len
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// GAN smart cube command table: opcode in byte 3.
pub fn gan_cube_table() -> OpcodeTable {
    OpcodeTable::new("GAN Cube", 3)
        .opcode(0x01, "Move Data")
        .opcode(0xED, "Cube State")
        .opcode(0xEF, "Battery Status")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OpcodeName, OpcodeValue};

    #[test]
    fn test_gan_known_opcodes() {
        let t = gan_cube_table();
        let cases = [
            (0x01u8, "Move Data"),
            (0xED, "Cube State"),
            (0xEF, "Battery Status"),
        ];
        for (op, name) in cases {
            let cmd = t.decode(&[0x00, 0x00, 0x00, op, 0x12, 0x34]).unwrap();
            assert_eq!(cmd.opcode, op);
            assert_eq!(cmd.name, name);
            assert_eq!(cmd.fields.get("known"), Some(&FieldValue::Bool(true)));
        }
    }

    #[test]
    fn test_gan_unknown_opcode_keeps_value() {
        let cmd = gan_cube_table().decode(&[0, 0, 0, 0x99]).unwrap();
        assert_eq!(cmd.name, UNKNOWN_COMMAND);
        assert_eq!(cmd.opcode, 0x99);
        assert_eq!(cmd.fields.get("payload_len"), Some(&FieldValue::I64(0)));
    }

    #[test]
    fn test_opcode_follows_offset_for_every_byte() {
        let t = gan_cube_table();
        for op in 0..=u8::MAX {
            let cmd = t.decode(&[0xAA, 0xBB, 0xCC, op]).unwrap();
            assert_eq!(cmd.opcode, op);
        }
    }

    #[test]
    fn test_short_frames_are_malformed() {
        let t = gan_cube_table();
        for len in 0..4 {
            let frame = vec![0x01; len];
            let err = t.decode(&frame).unwrap_err();
            assert_eq!(
                err,
                DecodeError::MalformedFrame {
                    kind: "GAN Cube".into(),
                    len,
                    min: 4
                }
            );
        }
    }

    #[test]
    fn test_duplicate_opcode_first_wins() {
        let t = OpcodeTable::new("dup", 0)
            .opcode(0x10, "First")
            .opcode(0x10, "Second");
        assert_eq!(t.decode(&[0x10]).unwrap().name, "First");
    }

    #[test]
    fn test_min_len_never_below_offset() {
        let t = OpcodeTable::new("x", 5).with_min_len(2);
        assert_eq!(t.min_len(), 6);
    }

    #[test]
    fn test_from_spec() {
        let spec = OpcodeTableSpec {
            kind: "moyu".into(),
            label: Some("MoYu Cube".into()),
            opcode_offset: 0,
            min_len: Some(2),
            opcodes: vec![OpcodeName {
                opcode: OpcodeValue::Text("0xA1".into()),
                name: "Gyro".into(),
            }],
        };
        let t = OpcodeTable::from_spec(&spec).unwrap();
        assert_eq!(t.label(), "MoYu Cube");
        assert_eq!(t.decode(&[0xA1, 0x00]).unwrap().name, "Gyro");
        assert!(t.decode(&[0xA1]).is_err());
    }

    #[test]
    fn test_from_spec_rejects_bad_entries() {
        let mut spec = OpcodeTableSpec {
            kind: "bad".into(),
            label: None,
            opcode_offset: 3,
            min_len: Some(3),
            opcodes: Vec::new(),
        };
        assert!(matches!(
            OpcodeTable::from_spec(&spec),
            Err(DecodeError::InvalidTable { .. })
        ));
        spec.min_len = None;
        spec.opcodes.push(OpcodeName {
            opcode: OpcodeValue::Int(256),
            name: "Too Big".into(),
        });
        assert!(OpcodeTable::from_spec(&spec).is_err());
    }

    #[test]
    fn test_huge_offset_is_rejected_not_panicking() {
        let spec: OpcodeTableSpec =
            serde_yaml::from_str("kind: rogue\nopcode_offset: 18446744073709551615\n").unwrap();
        let err = OpcodeTable::from_spec(&spec).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTable { ref table, .. } if table == "rogue"));
        let mut reg = crate::DecoderRegistry::new();
        assert!(reg.register_spec(&spec).is_err());
        assert!(reg.is_empty());

        let t = OpcodeTable::new("edge", usize::MAX).with_min_len(1);
        assert_eq!(t.min_len(), usize::MAX);
        assert!(matches!(
            t.decode(&[0, 1, 2, 3]),
            Err(DecodeError::MalformedFrame { len: 4, .. })
        ));
    }

    #[test]
    fn test_closure_decoder() {
        let dec = |frame: &[u8]| -> Result<DecodedCommand> {
            Ok(DecodedCommand::new(frame.first().copied().unwrap_or(0), "Raw"))
        };
        assert_eq!(dec.decode(&[7]).unwrap().opcode, 7);
        assert_eq!(FrameDecoder::min_len(&dec), 0);
    }
}
