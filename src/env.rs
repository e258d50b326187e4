//! Access to the running execution environment's version.
//!
//! The gate never reads ambient process globals directly: the version string
//! arrives through the [`RuntimeEnvironment`] trait so the source is an
//! explicit input and tests can substitute a fixed value. Three sources are
//! supported: a literal string, an environment variable, and the output of a
//! probe command.
//!
//! Every accessor re-reads on each call; nothing is cached.

use std::process::Command;

use crate::version::MajorVersion;

/// Accessor for the live environment's version string.
pub trait RuntimeEnvironment {
    /// The raw version string, or `None` when the environment does not
    /// report one. Absence is not an error; it parses as the zero version.
    fn current_version_string(&self) -> Option<String>;

    /// The comparable major version of the running environment.
    fn current_major_version(&self) -> MajorVersion {
        MajorVersion::parse_opt(self.current_version_string().as_deref())
    }
}

/// A fixed version string. Doubles as the test stand-in.
#[derive(Debug, Clone)]
pub struct StaticRuntime(pub Option<String>);

impl StaticRuntime {
    /// Environment reporting the given version string.
    pub fn version(raw: &str) -> Self {
        StaticRuntime(Some(raw.to_string()))
    }

    /// Environment reporting no version at all.
    pub fn absent() -> Self {
        StaticRuntime(None)
    }
}

impl RuntimeEnvironment for StaticRuntime {
    fn current_version_string(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the version string from a named environment variable.
#[derive(Debug, Clone)]
pub struct EnvVarRuntime {
    var: String,
}

impl EnvVarRuntime {
    pub fn new(var: &str) -> Self {
        Self {
            var: var.to_string(),
        }
    }
}

impl RuntimeEnvironment for EnvVarRuntime {
    fn current_version_string(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|v| !v.is_empty())
    }
}

/// Runs a probe command and extracts the version token from its output.
///
/// Tools print version banners in a handful of layouts; the extraction scans
/// stdout then stderr (version banners historically go to either) with an
/// ordered pattern list and takes the first capture.
#[derive(Debug, Clone)]
pub struct CommandRuntime {
    command: String,
    args: Vec<String>,
}

impl CommandRuntime {
    /// Create from a full command string, e.g. `"java -version"`.
    pub fn from_string(cmd: &str) -> Self {
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let (command, args) = if parts.is_empty() {
            (cmd.to_string(), Vec::new())
        } else {
            (
                parts[0].to_string(),
                parts[1..].iter().map(|s| s.to_string()).collect(),
            )
        };
        Self { command, args }
    }
}

impl RuntimeEnvironment for CommandRuntime {
    fn current_version_string(&self) -> Option<String> {
        let output = Command::new(&self.command).args(&self.args).output().ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        extract_version(&stdout).or_else(|| {
            let stderr = String::from_utf8_lossy(&output.stderr);
            extract_version(&stderr)
        })
    }
}

/// Extract a version token from command output.
pub fn extract_version(output: &str) -> Option<String> {
    let patterns = [
        r#"version\s+"([^"]+)""#,
        r"version\s+(\d[\w.\-+]*)",
        r"(\d+\.\d+[\w.\-+_]*)",
        r"(\d+[\w.\-+_]*)",
    ];

    for pattern in &patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            if let Some(caps) = re.captures(output) {
                if let Some(m) = caps.get(1) {
                    return Some(m.as_str().to_string());
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_runtime_reports_version() {
        let env = StaticRuntime::version("21.0.2");
        assert_eq!(env.current_version_string().as_deref(), Some("21.0.2"));
        assert_eq!(env.current_major_version().get(), 21);
    }

    #[test]
    fn absent_runtime_parses_to_zero() {
        let env = StaticRuntime::absent();
        assert_eq!(env.current_version_string(), None);
        assert_eq!(env.current_major_version(), MajorVersion::ZERO);
    }

    #[test]
    fn rereads_on_every_call() {
        // No caching: two calls on the same accessor both read the source.
        let env = StaticRuntime::version("1.8.0_392");
        assert_eq!(env.current_major_version().get(), 8);
        assert_eq!(env.current_major_version().get(), 8);
    }

    #[test]
    fn env_var_runtime_reads_variable() {
        std::env::set_var("STILE_TEST_VERSION_VAR", "17.0.9");
        let env = EnvVarRuntime::new("STILE_TEST_VERSION_VAR");
        assert_eq!(env.current_version_string().as_deref(), Some("17.0.9"));
        assert_eq!(env.current_major_version().get(), 17);
    }

    #[test]
    fn env_var_runtime_treats_empty_as_absent() {
        std::env::set_var("STILE_TEST_EMPTY_VAR", "");
        let env = EnvVarRuntime::new("STILE_TEST_EMPTY_VAR");
        assert_eq!(env.current_version_string(), None);
    }

    #[test]
    fn env_var_runtime_missing_variable() {
        let env = EnvVarRuntime::new("STILE_TEST_MISSING_VAR_12345");
        assert_eq!(env.current_version_string(), None);
        assert_eq!(env.current_major_version(), MajorVersion::ZERO);
    }

    #[test]
    fn command_runtime_splits_command_string() {
        let env = CommandRuntime::from_string("java -version");
        assert_eq!(env.command, "java");
        assert_eq!(env.args, vec!["-version"]);
    }

    #[test]
    fn command_runtime_missing_binary_is_absent() {
        let env = CommandRuntime::from_string("this-command-does-not-exist-12345");
        assert_eq!(env.current_version_string(), None);
    }

    #[test]
    fn extracts_quoted_version_banner() {
        let banner = r#"openjdk version "1.8.0_392" 2023-10-17"#;
        assert_eq!(extract_version(banner).as_deref(), Some("1.8.0_392"));
    }

    #[test]
    fn extracts_unquoted_version() {
        assert_eq!(
            extract_version("tool version 21.0.2+13").as_deref(),
            Some("21.0.2+13")
        );
    }

    #[test]
    fn extracts_bare_token() {
        assert_eq!(extract_version("22-ea").as_deref(), Some("22-ea"));
    }

    #[test]
    fn extraction_fails_without_digits() {
        assert_eq!(extract_version("no numbers here"), None);
    }
}
