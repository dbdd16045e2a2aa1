use std::env;
use std::path::Path;

/// Represents different shell types with their specific command arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellType {
    Cmd,        // Windows Command Prompt
    PowerShell, // Windows PowerShell or PowerShell Core
    UnixLike,   // Bash, Zsh, Sh, etc.
    Fish,       // Fish shell
}

impl ShellType {
    /// The flag that makes this shell run a single command string.
    pub fn command_flag(&self) -> &'static str {
        match self {
            ShellType::Cmd => "/C",
            ShellType::PowerShell => "-Command",
            ShellType::UnixLike | ShellType::Fish => "-c",
        }
    }
}

/// The shell `!` commands are run through
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub shell_path: String,
    pub shell_type: ShellType,
}

impl SystemInfo {
    /// Detects the current shell environment.
    pub fn new() -> Self {
        let (shell_path, shell_type) = detect_shell();
        SystemInfo {
            shell_path,
            shell_type,
        }
    }
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_shell() -> (String, ShellType) {
    if cfg!(target_os = "windows") {
        // On Windows, check for PowerShell first, then cmd
        if env::var("PSModulePath").is_ok() {
            if let Ok(posh_path) = env::var("POSH_EXECUTABLE") {
                if Path::new(&posh_path).exists() {
                    return (posh_path, ShellType::PowerShell);
                }
            }
            return ("powershell.exe".to_string(), ShellType::PowerShell);
        }
        (
            env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            ShellType::Cmd,
        )
    } else {
        let shell_path = env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        classify_unix_shell(shell_path)
    }
}

fn classify_unix_shell(shell_path: String) -> (String, ShellType) {
    let shell_name = Path::new(&shell_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("sh")
        .to_lowercase();

    if shell_name == "fish" {
        (shell_path, ShellType::Fish)
    } else {
        (shell_path, ShellType::UnixLike)
    }
}
