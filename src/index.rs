//! Renders the article list and splices it into the index document. The
//! document lives in the publish root and is rewritten in place on every
//! run: the region between the two marker comments is replaced wholesale
//! with freshly rendered entries while everything around it is preserved,
//! so the same file is both template and output.

use crate::article::Article;
use crate::config::Config;
use gtmpl::{Context, Template, Value};
use log::info;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Opens the list region in the index document.
pub const LIST_START: &str = "<!-- articles:start -->";

/// Closes the list region in the index document.
pub const LIST_END: &str = "<!-- articles:end -->";

const DATE_FORMAT: &str = "%Y-%m-%d";

const ENTRY_TEMPLATE: &str = "<li>\
<a href=\"{{.url}}\">\
{{if .thumbnail}}<img class=\"thumbnail\" src=\"{{.thumbnail}}\" alt=\"\" />{{end}}\
<span class=\"date\">{{.date}}</span> \
<span class=\"title\">{{.title}}</span>\
</a>\
</li>";

/// Renders index entries for a sorted set of [`Article`]s and rewrites the
/// index document.
pub struct Generator<'a> {
    config: &'a Config,
    entry_template: Template,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a Config) -> Result<Generator<'a>> {
        let mut entry_template = Template::default();
        entry_template
            .parse(ENTRY_TEMPLATE)
            .map_err(Error::ParseTemplate)?;
        Ok(Generator {
            config,
            entry_template,
        })
    }

    /// Renders one entry per article, preserving the given order, and
    /// rewrites the index document in place. Articles must already be
    /// sorted; this function imposes no order of its own.
    pub fn write_index(&self, articles: &[Article]) -> Result<()> {
        let document =
            fs::read_to_string(&self.config.index_file).map_err(|err| Error::ReadIndex {
                path: self.config.index_file.clone(),
                err,
            })?;
        let entries = self.render_entries(articles)?;
        fs::write(&self.config.index_file, splice(&document, &entries)?)?;
        info!(
            target: "index",
            "Indexed {} articles in {}",
            articles.len(),
            self.config.index_file.display()
        );
        Ok(())
    }

    fn render_entries(&self, articles: &[Article]) -> Result<String> {
        let mut entries = Vec::with_capacity(articles.len());
        for article in articles {
            entries.push(self.render_entry(article)?);
        }
        Ok(entries.join("\n"))
    }

    fn render_entry(&self, article: &Article) -> Result<String> {
        let context =
            Context::from(self.entry_value(article)).map_err(|e| Error::Template(format!("{}", e)))?;
        let mut buf = Vec::new();
        self.entry_template.execute(&mut buf, &context)?;
        String::from_utf8(buf)
            .map_err(|_| Error::Template(String::from("rendered entry is not valid UTF-8")))
    }

    /// Converts an article into a template [`Value`]. The `thumbnail` field
    /// holds the published thumbnail URL, or Nil when the file doesn't
    /// exist. The existence check runs at render time, after the build
    /// pass, so freshly built thumbnails are visible.
    fn entry_value(&self, article: &Article) -> Value {
        let thumbnail_file = self
            .config
            .articles_output_dir
            .join(&article.folder_name)
            .join(&self.config.thumbnail);

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "title".to_owned(),
            Value::String(article.display_name.clone()),
        );
        m.insert(
            "date".to_owned(),
            Value::String(article.date.format(DATE_FORMAT).to_string()),
        );
        m.insert(
            "url".to_owned(),
            Value::String(format!(
                "{}/{}/",
                self.config.base_prefix, article.folder_name
            )),
        );
        m.insert(
            "thumbnail".to_owned(),
            match thumbnail_file.is_file() {
                true => Value::String(format!(
                    "{}/{}/{}",
                    self.config.base_prefix, article.folder_name, self.config.thumbnail
                )),
                false => Value::Nil,
            },
        );
        Value::Object(m)
    }
}

/// Replaces the region between [`LIST_START`] and [`LIST_END`] with
/// `entries`, keeping the markers so the document can be spliced again on
/// the next run. The document must contain each marker exactly once, start
/// before end; anything else is a hard error rather than a silent no-op.
fn splice(document: &str, entries: &str) -> Result<String> {
    let start = find_marker(document, LIST_START)?;
    let end = find_marker(document, LIST_END)?;
    if end < start {
        return Err(Error::MarkersInverted);
    }

    let mut out = String::with_capacity(document.len() + entries.len());
    out.push_str(&document[..start + LIST_START.len()]);
    out.push('\n');
    out.push_str(entries);
    out.push('\n');
    out.push_str(&document[end..]);
    Ok(out)
}

fn find_marker(document: &str, marker: &'static str) -> Result<usize> {
    let mut matches = document.match_indices(marker);
    match (matches.next(), matches.next()) {
        (None, _) => Err(Error::MarkerMissing(marker)),
        (Some(_), Some(_)) => Err(Error::MarkerDuplicated(marker)),
        (Some((offset, _)), None) => Ok(offset),
    }
}

/// The result of a fallible index-rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering the index document.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors parsing the entry template.
    ParseTemplate(String),

    /// Returned for errors during templating.
    Template(String),

    /// Returned when the index document can't be read. This aborts the
    /// whole run.
    ReadIndex { path: PathBuf, err: std::io::Error },

    /// Returned when the index document lacks one of the list markers.
    MarkerMissing(&'static str),

    /// Returned when the index document contains a list marker more than
    /// once, making the region ambiguous.
    MarkerDuplicated(&'static str),

    /// Returned when the closing marker precedes the opening marker.
    MarkersInverted,

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::ReadIndex { path, err } => {
                write!(f, "Reading index document '{}': {}", path.display(), err)
            }
            Error::MarkerMissing(marker) => {
                write!(f, "index document is missing the `{}` marker", marker)
            }
            Error::MarkerDuplicated(marker) => {
                write!(
                    f,
                    "index document contains more than one `{}` marker",
                    marker
                )
            }
            Error::MarkersInverted => {
                write!(f, "`{}` appears before `{}`", LIST_END, LIST_START)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ParseTemplate(_) => None,
            Error::Template(_) => None,
            Error::ReadIndex { path: _, err } => Some(err),
            Error::MarkerMissing(_) => None,
            Error::MarkerDuplicated(_) => None,
            Error::MarkersInverted => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`].
    /// This allows us to use the `?` operator for template execution.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator when rewriting the index document.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::article;
    use std::path::Path;

    const DOCUMENT: &str = "<html><body><ul>\n\
                            <!-- articles:start -->\n\
                            <!-- articles:end -->\n\
                            </ul></body></html>";

    fn test_config(root: &Path) -> Config {
        let publish_dir = root.join("static");
        fs::create_dir_all(publish_dir.join("articles")).unwrap();
        fs::write(publish_dir.join("index.html"), DOCUMENT).unwrap();
        Config {
            project_root: root.to_owned(),
            articles_dir: root.join("articles"),
            articles_output_dir: publish_dir.join("articles"),
            index_file: publish_dir.join("index.html"),
            base_prefix: String::from("/articles"),
            publish_dir,
            build_program: String::from("pnpm"),
            build_args: vec![String::from("build")],
            thumbnail: String::from("thumbnail.png"),
            port: 3000,
        }
    }

    fn sorted(names: &[&str]) -> Vec<Article> {
        let mut articles: Vec<Article> =
            names.iter().map(|n| Article::parse(n).unwrap()).collect();
        article::sort_for_index(&mut articles);
        articles
    }

    #[test]
    fn test_newer_article_renders_first() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let articles = sorted(&["20240101_Alpha", "20240201_Beta"]);

        Generator::new(&config)?.write_index(&articles)?;

        let document = fs::read_to_string(&config.index_file)?;
        let beta = document.find("Beta").unwrap();
        let alpha = document.find("Alpha").unwrap();
        assert!(beta < alpha);
        assert!(document.contains("<span class=\"date\">2024-02-01</span>"));
        assert!(document.contains("href=\"/articles/20240101_Alpha/\""));
        Ok(())
    }

    #[test]
    fn test_surrounding_document_preserved() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        Generator::new(&config)?.write_index(&sorted(&["20240101_Alpha"]))?;

        let document = fs::read_to_string(&config.index_file)?;
        assert!(document.starts_with("<html><body><ul>"));
        assert!(document.ends_with("</ul></body></html>"));
        assert!(document.contains(LIST_START));
        assert!(document.contains(LIST_END));
        Ok(())
    }

    #[test]
    fn test_rewrite_is_idempotent() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let articles = sorted(&["20240101_Alpha", "20240201_Beta"]);
        let generator = Generator::new(&config)?;

        generator.write_index(&articles)?;
        let first = fs::read_to_string(&config.index_file)?;
        generator.write_index(&articles)?;
        let second = fs::read_to_string(&config.index_file)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_empty_article_set() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        Generator::new(&config)?.write_index(&[])?;

        let document = fs::read_to_string(&config.index_file)?;
        assert!(!document.contains("<li>"));
        assert!(document.contains(LIST_START));
        Ok(())
    }

    #[test]
    fn test_thumbnail_included_only_when_published() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let output_dir = config.articles_output_dir.join("20240201_Beta");
        fs::create_dir_all(&output_dir).unwrap();
        fs::write(output_dir.join("thumbnail.png"), "png").unwrap();

        Generator::new(&config)?.write_index(&sorted(&["20240101_Alpha", "20240201_Beta"]))?;

        let document = fs::read_to_string(&config.index_file)?;
        assert!(document.contains("src=\"/articles/20240201_Beta/thumbnail.png\""));
        assert_eq!(document.matches("<img").count(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_marker_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        fs::write(&config.index_file, "<html><ul></ul></html>").unwrap();

        match Generator::new(&config).unwrap().write_index(&[]) {
            Err(Error::MarkerMissing(marker)) => assert_eq!(marker, LIST_START),
            other => panic!("expected MarkerMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicated_marker_is_an_error() {
        let document = format!("{}\n{}\n{}\n", LIST_START, LIST_START, LIST_END);
        match splice(&document, "") {
            Err(Error::MarkerDuplicated(marker)) => assert_eq!(marker, LIST_START),
            other => panic!("expected MarkerDuplicated, got {:?}", other),
        }
    }

    #[test]
    fn test_inverted_markers_are_an_error() {
        let document = format!("{}\n{}\n", LIST_END, LIST_START);
        match splice(&document, "") {
            Err(Error::MarkersInverted) => {}
            other => panic!("expected MarkersInverted, got {:?}", other),
        }
    }
}
