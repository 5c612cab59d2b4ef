//! Compiler configuration.

use aura_frontend::RecoveryMode;
use aura_ir::Defaults;

/// Options for a [`crate::Compiler`].
///
/// With the `serde` feature the config can be loaded from JSON; omitted
/// fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompilerConfig {
    /// Whether a failed parse may be retried once on repaired input.
    pub recovery: RecoveryMode,
    /// Values applied to fields a program leaves out.
    pub defaults: Defaults,
}

impl CompilerConfig {
    pub fn with_recovery(mut self, recovery: RecoveryMode) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn partial_json_config_keeps_defaults() {
        let config: CompilerConfig =
            serde_json::from_str(r#"{"recovery": "forgiving", "defaults": {"port": 9000}}"#)
                .unwrap();
        assert_eq!(config.recovery, RecoveryMode::Forgiving);
        assert_eq!(config.defaults.port, 9000);
        assert_eq!(config.defaults.epochs, 5);
    }

    #[test]
    fn zeroed_json_defaults_fail_the_compile() {
        let config: CompilerConfig = serde_json::from_str(
            r#"{"defaults": {"port": 0, "epochs": 0, "batch_size": 0, "input_units": 0}}"#,
        )
        .unwrap();
        let err = crate::Compiler::new(config)
            .compile("run web on port: 8080\n")
            .unwrap_err();
        assert_eq!(err.stage, crate::Stage::Transform);
        assert_eq!(err.kind, crate::ErrorKind::InvalidValue);
        assert!(err.message.contains("default"), "{}", err.message);
    }

    #[test]
    fn builders_override_fields() {
        let config = CompilerConfig::default().with_recovery(RecoveryMode::Forgiving);
        assert_eq!(config.recovery, RecoveryMode::Forgiving);
        assert_eq!(config.defaults, Defaults::default());
    }
}
