use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    I64(i64),
    F64(f64),
    Bool(bool),
    Text(String),
}

/// One decoded command frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedCommand {
    pub opcode: u8,
    pub name: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl DecodedCommand {
    pub fn new(opcode: u8, name: impl Into<String>) -> Self {
        Self {
            opcode,
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: FieldValue) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn is_unknown(&self) -> bool {
        self.name == crate::UNKNOWN_COMMAND
    }

    /// Stand-in result for a frame that could not be decoded at all.
    pub fn malformed(frame_len: usize) -> Self {
        Self::new(0, crate::MALFORMED_COMMAND)
            .with_field("frame_len", FieldValue::I64(frame_len as i64))
            .with_field("malformed", FieldValue::Bool(true))
    }
}

/// Opcode written either as an integer or as a `0x`-prefixed / decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpcodeValue {
    Int(u64),
    Text(String),
}

impl OpcodeValue {
    pub fn to_u8(&self) -> Option<u8> {
        match self {
            OpcodeValue::Int(v) => u8::try_from(*v).ok(),
            OpcodeValue::Text(s) => {
                let t = s.trim();
                match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
                    Some(hex) => u8::from_str_radix(hex, 16).ok(),
                    None => t.parse::<u8>().ok(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpcodeName {
    pub opcode: OpcodeValue,
    pub name: String,
}

/// Declarative description of a vendor opcode table, as found in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpcodeTableSpec {
    /// Device kind the table applies to.
    pub kind: String,
    /// Human label used in log lines; defaults to `kind`.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_opcode_offset")]
    pub opcode_offset: usize,
    /// Shortest acceptable frame; defaults to `opcode_offset + 1`.
    #[serde(default)]
    pub min_len: Option<usize>,
    #[serde(default)]
    pub opcodes: Vec<OpcodeName>,
}

fn default_opcode_offset() -> usize {
    crate::FALLBACK_OPCODE_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_value_forms() {
        assert_eq!(OpcodeValue::Int(0xED).to_u8(), Some(0xED));
        assert_eq!(OpcodeValue::Int(300).to_u8(), None);
        assert_eq!(OpcodeValue::Text("0xEF".into()).to_u8(), Some(0xEF));
        assert_eq!(OpcodeValue::Text(" 1 ".into()).to_u8(), Some(1));
        assert_eq!(OpcodeValue::Text("0x1FF".into()).to_u8(), None);
    }

    #[test]
    fn test_spec_defaults() {
        let spec: OpcodeTableSpec = serde_yaml::from_str("kind: moyu\n").unwrap();
        assert_eq!(spec.opcode_offset, 3);
        assert!(spec.label.is_none());
        assert!(spec.opcodes.is_empty());
    }

    #[test]
    fn test_command_serializes_fields_flat() {
        let cmd = DecodedCommand::new(0xEF, "Battery Status")
            .with_field("frame_len", FieldValue::I64(8));
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(
            json,
            r#"{"opcode":239,"name":"Battery Status","fields":{"frame_len":8}}"#
        );
    }
}
