//! Runs synthesized scene programs through the external renderer

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::config::RendererConfig;
use crate::synthesizer::SynthesizedProgram;
use crate::util::{run_cmd_with_timeout, CommandError};

/// File name the program is written to inside the scratch directory
const SCENE_FILE: &str = "test_scene.py";

/// Result of rendering one program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Passed,
    /// Renderer exited non-zero; captured stdout and stderr
    Failed(String),
    TimedOut(Duration),
    /// The renderer could not be started or the scratch files written
    InvocationError(String),
}

impl ExecutionResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, ExecutionResult::Passed)
    }

    pub fn diagnostic(&self) -> String {
        match self {
            ExecutionResult::Passed => String::new(),
            ExecutionResult::Failed(output) => output.clone(),
            ExecutionResult::TimedOut(timeout) => format!(
                "Scene rendering timed out after {} seconds",
                timeout.as_secs()
            ),
            ExecutionResult::InvocationError(msg) => format!("Error running scene: {}", msg),
        }
    }
}

/// Executes one program in isolation
pub trait SceneExecutor: Send + Sync {
    fn execute(&self, program: &SynthesizedProgram) -> ExecutionResult;
}

/// Renders programs with the configured external command, each in its own
/// temporary directory
pub struct RendererExecutor {
    config: RendererConfig,
}

impl RendererExecutor {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout)
    }

    fn build_command(&self, script: &Path, scene_name: &str, workdir: &Path) -> Command {
        let script = script.to_string_lossy();
        let mut cmd = Command::new(&self.config.program);
        for arg in &self.config.args {
            let arg = arg
                .replace("{file}", &script)
                .replace("{scene}", scene_name);
            cmd.arg(arg);
        }
        cmd.current_dir(workdir);
        cmd
    }

    fn render(&self, program: &SynthesizedProgram) -> Result<ExecutionResult> {
        // Removed when dropped, whichever way this function exits
        let workdir = TempDir::new().context("Failed to create temp directory")?;
        debug!("Created temp directory: {}", workdir.path().display());

        let script = workdir.path().join(SCENE_FILE);
        fs::write(&script, &program.source).context("Failed to write scene file")?;

        let cmd = self.build_command(&script, &program.scene_name, workdir.path());
        debug!("Executing: {:?}", cmd);

        let result = match run_cmd_with_timeout(cmd, self.timeout()) {
            Ok(output) if output.status.success() => {
                debug!("✓ {} rendered", program.scene_name);
                ExecutionResult::Passed
            }
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!("✗ {} exited with {}", program.scene_name, output.status);
                ExecutionResult::Failed(format!("STDOUT:\n{}\n\nSTDERR:\n{}", stdout, stderr))
            }
            Err(CommandError::TimedOut(timeout)) => {
                warn!(
                    "Rendering {} timed out after {} seconds",
                    program.scene_name,
                    timeout.as_secs()
                );
                ExecutionResult::TimedOut(timeout)
            }
            Err(e) => ExecutionResult::InvocationError(e.to_string()),
        };

        if let Err(e) = workdir.close() {
            warn!("Failed to remove temp directory: {}", e);
        }
        Ok(result)
    }
}

impl SceneExecutor for RendererExecutor {
    fn execute(&self, program: &SynthesizedProgram) -> ExecutionResult {
        self.render(program)
            .unwrap_or_else(|e| ExecutionResult::InvocationError(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> SynthesizedProgram {
        SynthesizedProgram {
            source: "from manim import *\n\nclass Demo(Scene):\n    pass\n".to_string(),
            scene_name: "Demo".to_string(),
        }
    }

    fn sh(script: &str, timeout: u64) -> RendererExecutor {
        RendererExecutor::new(RendererConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                script.to_string(),
                "{file}".to_string(),
                "{scene}".to_string(),
            ],
            timeout,
        })
    }

    #[test]
    fn test_diagnostic_messages() {
        assert_eq!(ExecutionResult::Passed.diagnostic(), "");
        assert_eq!(ExecutionResult::Failed("boom".into()).diagnostic(), "boom");
        assert_eq!(
            ExecutionResult::TimedOut(Duration::from_secs(30)).diagnostic(),
            "Scene rendering timed out after 30 seconds"
        );
        assert_eq!(
            ExecutionResult::InvocationError("no such file".into()).diagnostic(),
            "Error running scene: no such file"
        );
        assert!(ExecutionResult::Passed.is_pass());
        assert!(!ExecutionResult::TimedOut(Duration::from_secs(1)).is_pass());
    }

    #[test]
    fn test_build_command_substitutes_placeholders() {
        let config = RendererConfig::for_dialect(crate::dialect::Dialect::Interactive);
        let executor = RendererExecutor::new(config);
        let script = Path::new("/tmp/x/test_scene.py");
        let cmd = executor.build_command(script, "Demo", Path::new("/tmp/x"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(cmd.get_program(), "manimgl");
        assert_eq!(args, vec!["/tmp/x/test_scene.py", "Demo", "--write_file"]);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/tmp/x")));
    }

    #[cfg(unix)]
    #[test]
    fn test_passes_program_file_and_scene() {
        let executor = sh(r#"test -f "$0" && grep -q "class $1(Scene)" "$0""#, 10);
        assert_eq!(executor.execute(&program()), ExecutionResult::Passed);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_captures_output() {
        let executor = sh("echo boom; echo bad >&2; exit 1", 10);
        let result = executor.execute(&program());
        assert!(!result.is_pass());
        let diagnostic = result.diagnostic();
        assert!(diagnostic.starts_with("STDOUT:\nboom"));
        assert!(diagnostic.contains("STDERR:\nbad"));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_scratch_dir_that_is_removed() {
        let executor = sh("pwd; exit 1", 10);
        let diagnostic = executor.execute(&program()).diagnostic();
        let workdir = diagnostic
            .lines()
            .nth(1)
            .expect("pwd output")
            .trim()
            .to_string();
        assert!(!workdir.is_empty());
        assert!(!Path::new(&workdir).exists());
    }

    /// Running means present in /proc and not a zombie waiting for init
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        match fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_timeout_leaves_nothing_running() {
        let marker_dir = TempDir::new().unwrap();
        let pid_file = marker_dir.path().join("sleep.pid");
        let executor = RendererExecutor::new(RendererConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"sleep 30 & echo $! > "$2"; wait"#.to_string(),
                "{file}".to_string(),
                "{scene}".to_string(),
                pid_file.to_string_lossy().into_owned(),
            ],
            timeout: 1,
        });

        let started = std::time::Instant::now();
        let result = executor.execute(&program());
        assert_eq!(result, ExecutionResult::TimedOut(Duration::from_secs(1)));
        assert!(result.diagnostic().contains("timed out after 1 seconds"));
        assert!(started.elapsed() < Duration::from_secs(10));

        let contents = fs::read_to_string(&pid_file).unwrap();
        let pid = contents.trim();
        let mut alive = true;
        for _ in 0..50 {
            alive = is_running(pid);
            if !alive {
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        assert!(!alive, "renderer process {} survived the timeout", pid);
    }

    #[test]
    fn test_missing_renderer_is_invocation_error() {
        let executor = RendererExecutor::new(RendererConfig {
            program: "/nonexistent/scenecheck-renderer".to_string(),
            args: vec!["{file}".to_string()],
            timeout: 5,
        });
        let result = executor.execute(&program());
        assert!(matches!(result, ExecutionResult::InvocationError(_)));
        assert!(result.diagnostic().starts_with("Error running scene:"));
    }
}
