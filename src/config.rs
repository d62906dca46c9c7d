/// Knobs that change how tolerant the decoders are.
///
/// Everything else about the wire format is fixed by the protocol version
/// passed to each call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CodecConfig {
    /// Reject input that is well-formed but outside what the version allows
    /// (unknown capability bits, oversized header stubs) instead of skipping it.
    pub strict_parsing: bool,
}

impl CodecConfig {
    pub fn strict() -> CodecConfig {
        CodecConfig { strict_parsing: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lenient() {
        assert!(!CodecConfig::default().strict_parsing);
        assert!(CodecConfig::strict().strict_parsing);
    }
}
