use crate::core::error::DoloresError;
use crate::system::SystemInfo;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Combined result of a finished shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// stdout and stderr interleaved in the order lines arrived
    pub output: String,
    /// `-1` when the process was terminated by a signal
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `!` commands through the user's shell
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    system_info: SystemInfo,
}

impl CommandExecutor {
    pub fn new(system_info: SystemInfo) -> Self {
        Self { system_info }
    }

    /// Runs `command` to completion and captures its combined output.
    ///
    /// A non-zero exit status is a normal result. Only a failure to launch the
    /// shell is an error. Dropping the returned future kills the child.
    pub async fn execute(&self, command: &str) -> Result<CommandOutput, DoloresError> {
        let shell = &self.system_info.shell_path;
        tracing::debug!(shell = %shell, command, "spawning shell command");

        let mut child = Command::new(shell)
            .arg(self.system_info.shell_type.command_flag())
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DoloresError::Execution(format!("Failed to launch {}: {}", shell, e)))?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(DoloresError::Execution(
                "Failed to capture command output".to_string(),
            ));
        };

        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let (mut out_line, mut err_line) = (Vec::new(), Vec::new());
        let (mut out_open, mut err_open) = (true, true);
        let mut output = String::new();

        // read_until keeps partial bytes in the buffer when the other branch wins
        while out_open || err_open {
            tokio::select! {
                read = stdout.read_until(b'\n', &mut out_line), if out_open => {
                    if read.map_err(read_error)? == 0 {
                        out_open = false;
                    }
                    output.push_str(&String::from_utf8_lossy(&out_line));
                    out_line.clear();
                }
                read = stderr.read_until(b'\n', &mut err_line), if err_open => {
                    if read.map_err(read_error)? == 0 {
                        err_open = false;
                    }
                    output.push_str(&String::from_utf8_lossy(&err_line));
                    err_line.clear();
                }
            }
        }

        let status = child.wait().await.map_err(read_error)?;
        let exit_code = status.code().unwrap_or(-1);
        tracing::debug!(exit_code, bytes = output.len(), "shell command finished");

        Ok(CommandOutput { output, exit_code })
    }
}

fn read_error(err: std::io::Error) -> DoloresError {
    DoloresError::Execution(format!("Failed to collect command output: {}", err))
}
