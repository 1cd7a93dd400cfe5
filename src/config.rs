//! Compiler configuration (spec.md §6, expansion §2.1).
//!
//! Much smaller than `crates/compiler/src/config.rs`'s `CompilerConfig`
//! (no external builtins, no FFI manifests, nothing this compiler has a use
//! for), but kept in the same builder shape: a struct threaded into the
//! pipeline rather than loose function parameters.

/// The only codegen target this compiler emits for; kept as a field (rather
/// than hardcoded in `codegen/`) so a second target has somewhere to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    MacosX86_64,
}

#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    pub target: Target,
    pub verbose: bool,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_macos_x86_64_and_is_quiet() {
        let config = CompilerConfig::new();
        assert_eq!(config.target, Target::MacosX86_64);
        assert!(!config.verbose);
    }

    #[test]
    fn builder_methods_chain() {
        let config = CompilerConfig::new().with_verbose(true);
        assert!(config.verbose);
    }
}
