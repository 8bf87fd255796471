//! Defines the [`Article`] type and the logic for discovering articles on
//! disk. An article is one slide-deck project living in its own subfolder of
//! the articles root, named `<YYYYMMDD>_<name>`. The date token orders the
//! index and the remainder becomes the display title; the folder name itself
//! is preserved verbatim for path construction.

use chrono::NaiveDate;
use std::fmt;
use std::fs::read_dir;
use std::path::{Path, PathBuf};

const SEPARATOR: char = '_';
const DATE_TOKEN_LEN: usize = 8;
const DATE_TOKEN_FORMAT: &str = "%Y%m%d";

/// Represents one article whose folder name parsed successfully.
#[derive(Clone, Debug, PartialEq)]
pub struct Article {
    /// The folder name on disk, preserved verbatim. All path construction
    /// uses this field; `display_name` is presentation-only.
    pub folder_name: String,

    /// The date parsed from the folder name's leading `YYYYMMDD` token.
    pub date: NaiveDate,

    /// The raw 8-digit date token.
    pub raw_date: String,

    /// The remainder of the folder name with separators replaced by spaces
    /// and each word's first letter uppercased.
    pub display_name: String,
}

impl Article {
    /// Parses a folder name of the form `<YYYYMMDD><sep><name>`. Returns
    /// `None` when the name has no separator, the leading token isn't 8
    /// characters, or the token isn't a real calendar date. An unparseable
    /// name excludes the folder from the index, not from building.
    pub fn parse(folder_name: &str) -> Option<Article> {
        let (raw_date, rest) = folder_name.split_once(SEPARATOR)?;
        if raw_date.len() != DATE_TOKEN_LEN {
            return None;
        }
        let date = NaiveDate::parse_from_str(raw_date, DATE_TOKEN_FORMAT).ok()?;
        Some(Article {
            folder_name: folder_name.to_owned(),
            date,
            raw_date: raw_date.to_owned(),
            display_name: display_name(rest),
        })
    }
}

/// Converts the free-text portion of a folder name into a display title:
/// separators become spaces and each word is capitalized.
fn display_name(raw: &str) -> String {
    raw.split(SEPARATOR)
        .map(capitalize)
        .collect::<Vec<String>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Orders articles for the index: date descending, then display name
/// ascending case-insensitively, then folder name ascending so the result
/// never depends on discovery order.
pub fn sort_for_index(articles: &mut [Article]) {
    articles.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| {
                a.display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase())
            })
            .then_with(|| a.folder_name.cmp(&b.folder_name))
    });
}

/// One subfolder of the articles root. Every directory is a build
/// candidate; `article` is present only when the folder name parses.
#[derive(Debug)]
pub struct Candidate {
    /// The folder name on disk.
    pub folder_name: String,

    /// The absolute path to the article's source folder.
    pub path: PathBuf,

    /// The parsed record, when the folder name follows the dated naming
    /// scheme.
    pub article: Option<Article>,
}

/// Lists the immediate subdirectories of `articles_dir` and attaches a
/// parsed [`Article`] to each name the naming scheme accepts. Files are
/// ignored; symlinks to directories count as articles.
pub fn discover(articles_dir: &Path) -> Result<Vec<Candidate>> {
    let entries = read_dir(articles_dir).map_err(|err| Error::ReadRoot {
        path: articles_dir.to_owned(),
        err,
    })?;

    let mut candidates = Vec::new();
    for result in entries {
        let entry = result?;
        if !entry.path().is_dir() {
            continue;
        }
        let folder_name = entry.file_name().to_string_lossy().into_owned();
        candidates.push(Candidate {
            article: Article::parse(&folder_name),
            path: entry.path(),
            folder_name,
        });
    }
    Ok(candidates)
}

/// Represents the result of an article-discovery operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error listing the articles root.
#[derive(Debug)]
pub enum Error {
    /// Returned when the articles root itself can't be read. This aborts
    /// the whole run.
    ReadRoot { path: PathBuf, err: std::io::Error },

    /// Returned for I/O errors on individual directory entries.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadRoot { path, err } => {
                write!(f, "Reading articles root '{}': {}", path.display(), err)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadRoot { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_valid_name() {
        let article = Article::parse("20240115_My_Talk").unwrap();
        assert_eq!(article.folder_name, "20240115_My_Talk");
        assert_eq!(article.raw_date, "20240115");
        assert_eq!(article.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(article.display_name, "My Talk");
    }

    #[test]
    fn test_parse_lowercase_words_capitalized() {
        let article = Article::parse("20230601_intro_to_rust").unwrap();
        assert_eq!(article.display_name, "Intro To Rust");
    }

    #[test]
    fn test_parse_no_separator() {
        assert_eq!(Article::parse("20240115"), None);
        assert_eq!(Article::parse("notes"), None);
    }

    #[test]
    fn test_parse_short_date_token() {
        assert_eq!(Article::parse("2024_My_Talk"), None);
    }

    #[test]
    fn test_parse_long_date_token() {
        assert_eq!(Article::parse("202401150_My_Talk"), None);
    }

    #[test]
    fn test_parse_non_numeric_date_token() {
        assert_eq!(Article::parse("2024011x_My_Talk"), None);
    }

    #[test]
    fn test_parse_impossible_calendar_date() {
        assert_eq!(Article::parse("20240230_My_Talk"), None);
        assert_eq!(Article::parse("20241301_My_Talk"), None);
    }

    #[test]
    fn test_parse_empty_name_portion() {
        let article = Article::parse("20240115_").unwrap();
        assert_eq!(article.display_name, "");
    }

    #[test]
    fn test_sort_later_date_first() {
        let mut articles = vec![
            Article::parse("20240101_Alpha").unwrap(),
            Article::parse("20240201_Beta").unwrap(),
        ];
        sort_for_index(&mut articles);
        assert_eq!(articles[0].folder_name, "20240201_Beta");
        assert_eq!(articles[1].folder_name, "20240101_Alpha");
    }

    #[test]
    fn test_sort_equal_dates_by_name_case_insensitive() {
        let mut articles = vec![
            Article::parse("20240101_zebra").unwrap(),
            Article::parse("20240101_Apple").unwrap(),
            Article::parse("20240101_mango").unwrap(),
        ];
        sort_for_index(&mut articles);
        let names: Vec<&str> = articles.iter().map(|a| a.display_name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Mango", "Zebra"]);
    }

    #[test]
    fn test_sort_idempotent() {
        let mut first = vec![
            Article::parse("20240101_Alpha").unwrap(),
            Article::parse("20240201_Beta").unwrap(),
            Article::parse("20240201_Gamma").unwrap(),
        ];
        sort_for_index(&mut first);
        let mut second = first.clone();
        sort_for_index(&mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn test_discover_ignores_files_and_keeps_unparseable_dirs() -> Result<()> {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("20240115_My_Talk")).unwrap();
        std::fs::create_dir(root.path().join("drafts")).unwrap();
        std::fs::write(root.path().join("README.md"), "not an article").unwrap();

        let mut candidates = discover(root.path())?;
        candidates.sort_by(|a, b| a.folder_name.cmp(&b.folder_name));

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].folder_name, "20240115_My_Talk");
        assert!(candidates[0].article.is_some());
        assert_eq!(candidates[1].folder_name, "drafts");
        assert!(candidates[1].article.is_none());
        Ok(())
    }

    #[test]
    fn test_discover_missing_root() {
        let root = tempfile::tempdir().unwrap();
        match discover(&root.path().join("no-such-dir")) {
            Err(Error::ReadRoot { path: _, err: _ }) => {}
            other => panic!("expected ReadRoot error, got {:?}", other),
        }
    }
}
