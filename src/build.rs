//! Exports the [`Orchestrator`] which runs the build pass of a run: deciding
//! which articles still need building, writing each article's base-path
//! configuration, invoking the external build command, and copying its
//! output tree into the publish root. Articles are processed strictly one at
//! a time and a failure in one article never aborts the rest.

use crate::article::Candidate;
use crate::config::Config;
use colored::Colorize;
use log::{error, info};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use walkdir::WalkDir;

const BUILD_CONFIG_FILE: &str = "slidev.config.js";
const DIST_DIR: &str = "dist";
const BASE_OPTION: &str = "--base";

/// Drives the per-article build/copy pass over a resolved [`Config`].
pub struct Orchestrator<'a> {
    config: &'a Config,
}

/// The result of one article's build pass.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The article was built and its output copied into the publish root.
    Built,

    /// The article's output directory already exists; nothing was done.
    Skipped,
}

/// Totals for one build pass.
#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    pub built: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a Config) -> Orchestrator<'a> {
        Orchestrator { config }
    }

    /// Whether an article's output already exists in the publish root. This
    /// existence check is the single gate for rebuild skipping; there is no
    /// staleness comparison anywhere, so a stale build persists until its
    /// output directory is removed by hand.
    pub fn is_published(&self, folder_name: &str) -> bool {
        self.config.articles_output_dir.join(folder_name).is_dir()
    }

    /// Runs the build pass over every candidate. Unparseable folder names
    /// are still built; only indexing requires a parseable date. Failures
    /// are logged with the article identifier and counted, never propagated.
    pub fn build_all(&self, candidates: &[Candidate]) -> Summary {
        let start = Instant::now();
        let mut summary = Summary::default();
        for candidate in candidates {
            match self.build_article(candidate) {
                Ok(Outcome::Built) => summary.built += 1,
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Err(err) => {
                    summary.failed += 1;
                    error!(target: "build", "Failed to build {}: {}", candidate.folder_name, err);
                }
            }
        }
        info!(
            target: "build",
            "{}",
            format!(
                "Build pass completed in {:.1?}: {} built, {} skipped, {} failed",
                start.elapsed(),
                summary.built,
                summary.skipped,
                summary.failed
            )
            .bold()
        );
        summary
    }

    /// Builds and publishes a single article, or skips it when its output
    /// directory already exists.
    pub fn build_article(&self, candidate: &Candidate) -> Result<Outcome> {
        if self.is_published(&candidate.folder_name) {
            info!(
                target: "build",
                "{} already exists in {}",
                candidate.folder_name,
                self.config.articles_output_dir.display()
            );
            return Ok(Outcome::Skipped);
        }

        let base_path = format!("{}/{}/", self.config.base_prefix, candidate.folder_name);
        self.write_build_config(&candidate.path, &base_path)?;
        self.run_build_command(candidate, &base_path)?;
        self.copy_dist(candidate)
    }

    // A build-time artifact consumed by the external tool, not meant to be
    // hand-edited.
    fn write_build_config(&self, article_dir: &Path, base_path: &str) -> Result<()> {
        let contents = format!("export default {{\n  base: '{}'\n}}", base_path);
        fs::write(article_dir.join(BUILD_CONFIG_FILE), contents).map_err(Error::WriteConfig)
    }

    /// Invokes the external build command with the article folder as its
    /// working directory and the public base path as its final option. The
    /// child inherits our standard streams so its output interleaves with
    /// the orchestrator's own.
    fn run_build_command(&self, candidate: &Candidate, base_path: &str) -> Result<()> {
        info!(target: "build", "Building {}...", candidate.folder_name);
        let status = Command::new(&self.config.build_program)
            .args(&self.config.build_args)
            .arg(BASE_OPTION)
            .arg(base_path)
            .current_dir(&candidate.path)
            .status()
            .map_err(Error::Spawn)?;
        if !status.success() {
            return Err(Error::CommandFailed(status));
        }
        Ok(())
    }

    fn copy_dist(&self, candidate: &Candidate) -> Result<Outcome> {
        let dist_dir = candidate.path.join(DIST_DIR);
        if !dist_dir.is_dir() {
            return Err(Error::MissingDist(dist_dir));
        }
        let output_dir = self
            .config
            .articles_output_dir
            .join(&candidate.folder_name);
        copy_tree(&dist_dir, &output_dir)?;
        info!(
            target: "build",
            "Copied {} to {}",
            candidate.folder_name,
            output_dir.display()
        );
        Ok(Outcome::Built)
    }
}

/// Recursively copies `src` into `dst`, creating directories as they are
/// encountered.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for result in WalkDir::new(src) {
        let entry = result?;
        // strip_prefix shouldn't fail since `src` is an ancestor of every
        // entry the walk yields
        let target = dst.join(entry.path().strip_prefix(src).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// The result of a fallible per-article build operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure building one article, tagged by stage so the log
/// line says where the article got stuck.
#[derive(Debug)]
pub enum Error {
    /// Writing the per-article build configuration failed.
    WriteConfig(std::io::Error),

    /// The external build command couldn't be started at all.
    Spawn(std::io::Error),

    /// The external build command exited non-zero.
    CommandFailed(std::process::ExitStatus),

    /// The build command succeeded but left no output directory behind.
    MissingDist(PathBuf),

    /// I/O failure while copying the output tree. The article may be left
    /// partially published.
    Copy(std::io::Error),

    /// Traversal failure while copying the output tree.
    Walk(walkdir::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WriteConfig(err) => {
                write!(f, "writing build configuration: {}", err)
            }
            Error::Spawn(err) => {
                write!(f, "starting build command: {}", err)
            }
            Error::CommandFailed(status) => {
                write!(f, "build command exited with {}", status)
            }
            Error::MissingDist(path) => {
                write!(f, "dist folder not found at '{}'", path.display())
            }
            Error::Copy(err) => {
                write!(f, "copying output tree: {}", err)
            }
            Error::Walk(err) => {
                write!(f, "walking output tree: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WriteConfig(err) => Some(err),
            Error::Spawn(err) => Some(err),
            Error::CommandFailed(_) => None,
            Error::MissingDist(_) => None,
            Error::Copy(err) => Some(err),
            Error::Walk(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator in the copy step.
    fn from(err: std::io::Error) -> Error {
        Error::Copy(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator in the copy step.
    fn from(err: walkdir::Error) -> Error {
        Error::Walk(err)
    }
}
