use std::fs;
use std::io::{self, BufRead};

use crate::error::{EngineResult, ErrorKind};

/// A line-oriented input collaborator for `READ`. Each call consumes
/// one line; `None` signals end-of-input.
pub trait InputSource {
    fn next_line(&mut self) -> Option<String>;
}

/// Reads interactively from the process's stdin, one line per call.
/// Used when `--input` is not given.
pub struct StdinInput {
    stdin: io::Stdin,
}

impl StdinInput {
    pub fn new() -> Self {
        StdinInput { stdin: io::stdin() }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for StdinInput {
    fn next_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.stdin.lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(line)
            }
            Err(_) => None,
        }
    }
}

/// Pre-splits a whole file's contents on `\n` up front, matching the
/// reference implementation's `f.read().split("\n")` exactly, including
/// that a trailing newline yields one extra empty final line.
pub struct FileInput {
    lines: Vec<String>,
    index: usize,
}

impl FileInput {
    pub fn open(path: &str) -> EngineResult<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| ErrorKind::InputFile(format!("{}: {}", path, e)))?;
        let lines = data.split('\n').map(|s| s.to_string()).collect();
        Ok(FileInput { lines, index: 0 })
    }
}

impl InputSource for FileInput {
    fn next_line(&mut self) -> Option<String> {
        let line = self.lines.get(self.index).cloned();
        self.index += 1;
        line
    }
}
