//! Runtime utilities for creating container runtimes from CLI context

use crate::cli::CliContext;
use fixtured_core::docker::CliRuntime;
use fixtured_core::runtime::RuntimeFactory;

/// Create a runtime instance based on CLI context
pub fn create_runtime_from_context(context: &CliContext) -> CliRuntime {
    let runtime_kind = RuntimeFactory::detect_runtime(context.runtime);
    RuntimeFactory::create_runtime(runtime_kind, context.runtime_path.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliContext;
    use fixtured_core::runtime::{ContainerRuntime, RuntimeKind};

    fn context(runtime: Option<RuntimeKind>, runtime_path: Option<String>) -> CliContext {
        CliContext {
            runtime,
            runtime_path,
        }
    }

    #[test]
    fn test_create_runtime_from_context_podman() {
        let runtime = create_runtime_from_context(&context(Some(RuntimeKind::Podman), None));
        assert_eq!(runtime.runtime_name(), "podman");
        assert_eq!(runtime.runtime_path(), "podman");
    }

    #[test]
    fn test_create_runtime_from_context_path_override() {
        let runtime = create_runtime_from_context(&context(
            Some(RuntimeKind::Docker),
            Some("/usr/local/bin/docker".to_string()),
        ));
        assert_eq!(runtime.runtime_name(), "docker");
        assert_eq!(runtime.runtime_path(), "/usr/local/bin/docker");
    }
}
