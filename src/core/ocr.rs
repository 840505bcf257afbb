//! Text extraction from captured photos, delegated to an external program.

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use std::path::Path;
use std::process::Command;

const IMAGE_PLACEHOLDER: &str = "{image}";

pub trait TextExtractor {
    fn extract(&self, image: &Path) -> AppResult<String>;
}

/// Runs a configured command line, e.g. `tesseract {image} stdout`, and
/// returns what it prints. Without a `{image}` placeholder the image path is
/// appended as the last argument. Arguments are split on whitespace; no shell
/// quoting is interpreted.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn parse(command_line: &str) -> AppResult<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| AppError::Config("ocr_command is empty".into()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        match cfg.ocr_command.as_deref() {
            Some(cmd) if !cmd.trim().is_empty() => Self::parse(cmd),
            _ => Err(AppError::Config(
                "no ocr_command configured; set it with `config --edit`".into(),
            )),
        }
    }

    fn build_args(&self, image: &Path) -> Vec<String> {
        let image = image.to_string_lossy();
        let mut substituted = false;

        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                if a.contains(IMAGE_PLACEHOLDER) {
                    substituted = true;
                    a.replace(IMAGE_PLACEHOLDER, &image)
                } else {
                    a.clone()
                }
            })
            .collect();

        if !substituted {
            args.push(image.to_string());
        }
        args
    }
}

impl TextExtractor for CommandExtractor {
    fn extract(&self, image: &Path) -> AppResult<String> {
        if !image.is_file() {
            return Err(AppError::Validation(format!(
                "Photo not found: {}",
                image.display()
            )));
        }

        let output = Command::new(&self.program)
            .args(self.build_args(image))
            .output()
            .map_err(|e| AppError::Other(format!("cannot run '{}': {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Other(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
