use crate::{
    gan_cube_table, DecodeError, DecodedCommand, FieldValue, FrameDecoder, OpcodeTable,
    OpcodeTableSpec, Result, FALLBACK_OPCODE_OFFSET, GAN_CUBE_KIND, UNKNOWN_COMMAND,
};
use core::fmt;
use std::sync::Arc;

/// Decides whether a rule applies to a device kind.
#[derive(Clone)]
pub enum DeviceMatcher {
    Any,
    /// Case-insensitive equality.
    Kind(String),
    /// Case-sensitive prefix.
    Prefix(String),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl DeviceMatcher {
    pub fn kind(kind: impl Into<String>) -> Self {
        DeviceMatcher::Kind(kind.into())
    }

    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        DeviceMatcher::Predicate(Arc::new(f))
    }

    pub fn matches(&self, kind: &str) -> bool {
        match self {
            DeviceMatcher::Any => true,
            DeviceMatcher::Kind(k) => k.eq_ignore_ascii_case(kind),
            DeviceMatcher::Prefix(p) => kind.starts_with(p.as_str()),
            DeviceMatcher::Predicate(f) => f(kind),
        }
    }
}

impl fmt::Debug for DeviceMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceMatcher::Any => f.write_str("Any"),
            DeviceMatcher::Kind(k) => f.debug_tuple("Kind").field(k).finish(),
            DeviceMatcher::Prefix(p) => f.debug_tuple("Prefix").field(p).finish(),
            DeviceMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A matcher paired with the decoder it selects.
#[derive(Clone)]
pub struct DecodeRule {
    pub matcher: DeviceMatcher,
    pub decoder: Arc<dyn FrameDecoder>,
}

impl DecodeRule {
    pub fn new(matcher: DeviceMatcher, decoder: impl FrameDecoder + 'static) -> Self {
        Self {
            matcher,
            decoder: Arc::new(decoder),
        }
    }

    pub fn table(kind: impl Into<String>, table: OpcodeTable) -> Self {
        Self::new(DeviceMatcher::Kind(kind.into()), table)
    }

    pub fn from_spec(spec: &OpcodeTableSpec) -> Result<Self> {
        Ok(Self::table(spec.kind.clone(), OpcodeTable::from_spec(spec)?))
    }
}

impl fmt::Debug for DecodeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeRule")
            .field("matcher", &self.matcher)
            .field("label", &self.decoder.label())
            .field("min_len", &self.decoder.min_len())
            .finish()
    }
}

/// Ordered decode rules; the first rule matching a device kind wins.
#[derive(Debug, Default, Clone)]
pub struct DecoderRegistry {
    rules: Vec<DecodeRule>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in GAN cube table.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register(DecodeRule::table(GAN_CUBE_KIND, gan_cube_table()));
        reg
    }

    /// Append a rule. Rules shadowed by an earlier match are kept but never reached.
    pub fn register(&mut self, rule: DecodeRule) {
        tracing::debug!(matcher = ?rule.matcher, label = rule.decoder.label(), "registered decode rule");
        self.rules.push(rule);
    }

    pub fn register_spec(&mut self, spec: &OpcodeTableSpec) -> Result<()> {
        self.register(DecodeRule::from_spec(spec)?);
        Ok(())
    }

    pub fn rules(&self) -> &[DecodeRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn lookup(&self, kind: &str) -> Option<&DecodeRule> {
        self.rules.iter().find(|r| r.matcher.matches(kind))
    }

    /// Label for log lines about `kind`: the matching decoder's, else the kind itself.
    pub fn label_for<'a>(&'a self, kind: &'a str) -> &'a str {
        match self.lookup(kind) {
            Some(rule) => rule.decoder.label(),
            None => kind,
        }
    }

    /// Decode one frame from a device of `kind`.
    ///
    /// Frames from unregistered kinds decode as [`UNKNOWN_COMMAND`] with the opcode taken from
    /// [`FALLBACK_OPCODE_OFFSET`]. Frames too short for the selected decoder (or for the fallback
    /// offset) are [`DecodeError::MalformedFrame`].
    pub fn decode(&self, kind: &str, frame: &[u8]) -> Result<DecodedCommand> {
        match self.lookup(kind) {
            Some(rule) => {
                let min = rule.decoder.min_len();
                if frame.len() < min {
                    return Err(DecodeError::MalformedFrame {
                        kind: rule.decoder.label().to_string(),
                        len: frame.len(),
                        min,
                    });
                }
                rule.decoder.decode(frame)
            }
            None => {
                let opcode =
                    frame
                        .get(FALLBACK_OPCODE_OFFSET)
                        .copied()
                        .ok_or_else(|| DecodeError::MalformedFrame {
                            kind: kind.to_string(),
                            len: frame.len(),
                            min: FALLBACK_OPCODE_OFFSET + 1,
                        })?;
                Ok(DecodedCommand::new(opcode, UNKNOWN_COMMAND)
                    .with_field("frame_len", FieldValue::I64(frame.len() as i64))
                    .with_field("known", FieldValue::Bool(false)))
            }
        }
    }
}
