//! Directory naming for mirrored repositories.

use std::path::{Path, PathBuf};

use crate::error::{MirrorError, MirrorResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    RepoName,
    RepoAuthor,
    FullName,
}

/// A parsed directory format such as `{repo_name} [{repo_author}]`.
///
/// `{{` and `}}` produce literal braces. The Go template forms
/// `{{.RepoName}}` and `{{.RepoAuthor}}` are read as `{repo_name}` and
/// `{repo_author}`, so existing `DIR_FORMAT` values keep working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl DirTemplate {
    /// Parses and validates a directory format.
    ///
    /// # Errors
    ///
    /// * [`MirrorError::UnknownPlaceholder`] for a placeholder other than
    ///   `repo_name`, `repo_author` or `full_name`
    /// * [`MirrorError::UnclosedPlaceholder`] for a `{` with no closing `}`
    /// * [`MirrorError::MissingPlaceholder`] when the format has no
    ///   placeholder at all
    ///
    /// # Examples
    ///
    /// ```
    /// use starsync_operations::layout::DirTemplate;
    ///
    /// let template = DirTemplate::parse("{repo_name} [{repo_author}]").unwrap();
    /// assert_eq!(template.render("rust-lang", "rust").unwrap(), "rust [rust-lang]");
    ///
    /// let legacy = DirTemplate::parse("{{.RepoName}} [{{.RepoAuthor}}]").unwrap();
    /// assert_eq!(legacy.render("rust-lang", "rust").unwrap(), "rust [rust-lang]");
    /// ```
    pub fn parse(format: &str) -> MirrorResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = format;

        while let Some(c) = rest.chars().next() {
            if let Some((segment, len)) = go_placeholder(rest) {
                push_segment(&mut segments, &mut literal, segment);
                rest = &rest[len..];
            } else if let Some(tail) = rest.strip_prefix("{{") {
                literal.push('{');
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix("}}") {
                literal.push('}');
                rest = tail;
            } else if c == '{' {
                let end = rest
                    .find('}')
                    .ok_or_else(|| MirrorError::UnclosedPlaceholder(format.to_string()))?;
                let name = &rest[1..end];

                let segment = match name.trim() {
                    "repo_name" => Segment::RepoName,
                    "repo_author" => Segment::RepoAuthor,
                    "full_name" => Segment::FullName,
                    _ => {
                        return Err(MirrorError::UnknownPlaceholder {
                            placeholder: name.to_string(),
                            template: format.to_string(),
                        })
                    }
                };

                push_segment(&mut segments, &mut literal, segment);
                rest = &rest[end + 1..];
            } else {
                literal.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
            return Err(MirrorError::MissingPlaceholder(format.to_string()));
        }

        Ok(Self {
            source: format.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Renders the directory name for `owner/name`.
    pub fn render(&self, owner: &str, name: &str) -> MirrorResult<String> {
        let rendered = self
            .segments
            .iter()
            .fold(String::new(), |mut out, segment| {
                match segment {
                    Segment::Literal(text) => out.push_str(text),
                    Segment::RepoName => out.push_str(name),
                    Segment::RepoAuthor => out.push_str(owner),
                    Segment::FullName => {
                        out.push_str(owner);
                        out.push('/');
                        out.push_str(name);
                    }
                }
                out
            });

        if rendered.trim().is_empty() {
            return Err(MirrorError::EmptyDirName(format!("{owner}/{name}")));
        }

        Ok(rendered)
    }

    /// Renders the directory name for a full `owner/name`.
    pub fn render_full_name(&self, full_name: &str) -> MirrorResult<String> {
        let (owner, name) = split_full_name(full_name)?;
        self.render(owner, name)
    }
}

fn push_segment(segments: &mut Vec<Segment>, literal: &mut String, segment: Segment) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
    segments.push(segment);
}

/// Matches a leading `{{.RepoName}}` or `{{.RepoAuthor}}`, returning the
/// segment and the matched length.
fn go_placeholder(rest: &str) -> Option<(Segment, usize)> {
    let inner = rest.strip_prefix("{{")?;
    let end = inner.find("}}")?;
    let segment = match inner[..end].trim() {
        ".RepoName" => Segment::RepoName,
        ".RepoAuthor" => Segment::RepoAuthor,
        _ => return None,
    };
    Some((segment, end + 4))
}

/// Splits `owner/name` at the first `/`.
///
/// # Examples
///
/// ```
/// use starsync_operations::layout::split_full_name;
///
/// assert_eq!(split_full_name("octocat/Hello-World").unwrap(), ("octocat", "Hello-World"));
/// assert!(split_full_name("octocat").is_err());
/// ```
pub fn split_full_name(full_name: &str) -> MirrorResult<(&str, &str)> {
    match full_name.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok((owner, name)),
        _ => Err(MirrorError::InvalidFullName(full_name.to_string())),
    }
}

pub fn target_dir(output_dir: &Path, rendered: &str) -> PathBuf {
    output_dir.join(rendered)
}
