//! Configuration lookup
//!
//! The operand image is not baked into the controller; it is resolved
//! through an injected key-value lookup so the reconciler has no hidden
//! dependency on process-wide state. Production wiring uses environment
//! variables, tests substitute a map.

/// Key-value configuration source
pub trait ConfigResolver: Send + Sync {
    /// Resolve a configuration value, `None` when the key is unset
    fn get(&self, key: &str) -> Option<String>;
}

/// Resolves configuration from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl ConfigResolver for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}
