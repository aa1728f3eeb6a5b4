//! Clipboard providers.

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use zeroize::Zeroize;

use lockbox_common::{Error, Result};

/// Something that can hold one piece of text for pasting.
pub trait ClipboardProvider: Send + Sync {
    /// Get the provider name (e.g., "command", "memory").
    fn name(&self) -> &str;

    /// Replace the clipboard contents.
    fn copy(&self, text: &str) -> Result<()>;

    /// Empty the clipboard.
    fn clear(&self) -> Result<()> {
        self.copy("")
    }
}

/// An external program that reads the new clipboard contents on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ClipboardCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn run(&self, text: &str) -> io::Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // Dropping stdin closes the pipe; the child is reaped even if the
        // write failed.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Ok(()),
        };
        let status = child.wait()?;
        written?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} exited with {}", self.program, status),
            ))
        }
    }
}

/// Clipboard driven through platform command-line tools.
///
/// Candidates are tried in order; one that is not installed is skipped, one
/// that runs and fails stops the attempt.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    commands: Vec<ClipboardCommand>,
}

impl CommandClipboard {
    pub fn new(commands: Vec<ClipboardCommand>) -> Self {
        Self { commands }
    }

    /// `pbcopy` on macOS, `clip` on Windows, `xclip` then `xsel` elsewhere.
    pub fn platform_default() -> Self {
        let commands = if cfg!(target_os = "macos") {
            vec![ClipboardCommand::new("pbcopy", &[])]
        } else if cfg!(windows) {
            vec![ClipboardCommand::new("clip", &[])]
        } else {
            vec![
                ClipboardCommand::new("xclip", &["-selection", "clipboard"]),
                ClipboardCommand::new("xsel", &["--clipboard", "--input"]),
            ]
        };
        Self::new(commands)
    }
}

impl ClipboardProvider for CommandClipboard {
    fn name(&self) -> &str {
        "command"
    }

    fn copy(&self, text: &str) -> Result<()> {
        for command in &self.commands {
            match command.run(text) {
                Ok(()) => {
                    debug!(program = %command.program, "clipboard updated");
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(program = %command.program, "clipboard tool not installed");
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "no clipboard tool available",
        )))
    }
}

/// In-process clipboard for tests and headless use.
///
/// Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    pub fn contents(&self) -> String {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn name(&self) -> &str {
        "memory"
    }

    fn copy(&self, text: &str) -> Result<()> {
        let mut contents = self.lock();
        contents.zeroize();
        contents.push_str(text);
        Ok(())
    }
}
