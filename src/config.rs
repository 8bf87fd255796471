use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

const PROJECT_FILE: &str = "lectern.yaml";
const INDEX_FILE: &str = "index.html";

#[derive(Deserialize)]
struct Port(u16);
impl Default for Port {
    fn default() -> Self {
        Port(3000)
    }
}

/// The project file as written by the user. Every field has a default so an
/// empty (`{}`) project file describes the conventional layout: `articles/`
/// sources published into `static/articles/`, indexed by `static/index.html`.
#[derive(Deserialize)]
struct Project {
    #[serde(default = "default_articles_dir")]
    pub articles_dir: PathBuf,

    #[serde(default = "default_publish_dir")]
    pub publish_dir: PathBuf,

    #[serde(default = "default_publish_subdir")]
    pub publish_subdir: String,

    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,

    #[serde(default = "default_thumbnail")]
    pub thumbnail: String,

    #[serde(default)]
    pub port: Port,
}

fn default_articles_dir() -> PathBuf {
    PathBuf::from("articles")
}

fn default_publish_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_publish_subdir() -> String {
    String::from("articles")
}

fn default_build_command() -> Vec<String> {
    vec![String::from("pnpm"), String::from("build")]
}

fn default_thumbnail() -> String {
    String::from("thumbnail.png")
}

/// The resolved configuration for a run. Paths are anchored at the project
/// root (the directory holding `lectern.yaml`) rather than the working
/// directory.
pub struct Config {
    /// The directory holding `lectern.yaml`.
    pub project_root: PathBuf,

    /// The root of the article source folders.
    pub articles_dir: PathBuf,

    /// The publish root served as static content.
    pub publish_dir: PathBuf,

    /// The subdirectory of the publish root receiving built articles, i.e.
    /// `{publish_dir}/{publish_subdir}`.
    pub articles_output_dir: PathBuf,

    /// The index document, rewritten in place on every build.
    pub index_file: PathBuf,

    /// The public base-path prefix, i.e. `/{publish_subdir}`. An article's
    /// base path is `{base_prefix}/{folder_name}/`.
    pub base_prefix: String,

    /// The external build program.
    pub build_program: String,

    /// Arguments passed to the build program ahead of the base-path option.
    pub build_args: Vec<String>,

    /// The well-known thumbnail file name looked up inside each published
    /// article.
    pub thumbnail: String,

    /// The default port for the static server.
    pub port: u16,
}

impl Config {
    /// Finds `lectern.yaml` in `dir` or the nearest ancestor directory and
    /// loads it. This lets the tool run from anywhere inside a project.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)
            .map_err(|e| anyhow!("Parsing project file `{}`: {}", path.display(), e))?;
        let mut build_command = project.build_command;
        if build_command.is_empty() {
            return Err(anyhow!(
                "`build_command` in `{}` must name a program",
                path.display()
            ));
        }
        let build_program = build_command.remove(0);
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => {
                let publish_dir = project_root.join(&project.publish_dir);
                Ok(Config {
                    articles_dir: project_root.join(&project.articles_dir),
                    articles_output_dir: publish_dir.join(&project.publish_subdir),
                    index_file: publish_dir.join(INDEX_FILE),
                    base_prefix: format!("/{}", project.publish_subdir),
                    publish_dir,
                    project_root: project_root.to_owned(),
                    build_program,
                    build_args: build_command,
                    thumbnail: project.thumbnail,
                    port: project.port.0,
                })
            }
        }
    }
}

fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!(
            "Opening {} file `{}`: {}",
            kind,
            path.display(),
            e
        )),
        Ok(file) => Ok(file),
    }
}
