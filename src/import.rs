//! Asynchronous `@import` inlining.
//!
//! Leading `@import` statements are resolved before the synchronous core
//! runs. The imports of one stylesheet load concurrently; their own imports
//! are resolved recursively. The result is an ordered list of
//! [`Source`]s, imported stylesheets first, so source maps keep pointing at
//! the file each rule came from.

use std::ops::Range;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cssmin::{Diagnostics, Options, Source};
use futures::future::{BoxFuture, FutureExt, join_all};
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_till, take_until};
use nom::character::complete::{char, multispace0};
use nom::combinator::recognize;
use nom::sequence::{delimited, tuple};
use nom::IResult;

use crate::error::LoadError;
use crate::rebase::rebase_urls;

/// Where an imported stylesheet lives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Path(PathBuf),
    Url(String),
}

impl Target {
    fn name(&self) -> String {
        match self {
            Target::Path(path) => path.display().to_string(),
            Target::Url(url) => url.clone(),
        }
    }
}

/// Fetches the text of an imported stylesheet.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, target: &Target) -> Result<String, LoadError>;
}

/// Reads local files with `tokio::fs`; refuses remote targets.
#[derive(Clone, Debug, Default)]
pub struct FsLoader;

#[async_trait]
impl Loader for FsLoader {
    async fn load(&self, target: &Target) -> Result<String, LoadError> {
        match target {
            Target::Path(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::from_io(path.clone(), source)),
            Target::Url(url) => Err(LoadError::Remote(url.clone())),
        }
    }
}

/// One leading `@import` statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    /// Byte range of the whole statement, `;` included.
    pub span: Range<usize>,
    pub target: String,
    pub media: String,
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
        delimited(char('\''), take_till(|c: char| c == '\''), char('\'')),
    ))(input)
}

fn url(input: &str) -> IResult<&str, &str> {
    delimited(
        tuple((tag_no_case("url("), multispace0)),
        alt((quoted, take_till(|c: char| c == ')' || c.is_whitespace()))),
        tuple((multispace0, char(')'))),
    )(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

fn charset(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        tag_no_case("@charset"),
        take_till(|c: char| c == ';'),
        char(';'),
    )))(input)
}

fn import(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = tag_no_case("@import")(input)?;
    let (input, _) = multispace0(input)?;
    let (input, target) = alt((url, quoted))(input)?;
    let (input, media) = take_till(|c: char| c == ';')(input)?;
    let (input, _) = char(';')(input)?;
    Ok((input, (target, media.trim())))
}

/// The `@import`s a stylesheet starts with. Whitespace, comments and a
/// `@charset` may precede them; the first other statement ends the list.
pub fn leading_imports(styles: &str) -> Vec<Import> {
    let mut imports = Vec::new();
    let mut rest = styles;

    loop {
        let trimmed = rest.trim_start();
        let start = styles.len() - trimmed.len();
        if let Ok((remaining, _)) = comment(trimmed) {
            rest = remaining;
        } else if let Ok((remaining, _)) = charset(trimmed) {
            rest = remaining;
        } else if let Ok((remaining, (target, media))) = import(trimmed) {
            imports.push(Import {
                span: start..styles.len() - remaining.len(),
                target: target.trim().to_string(),
                media: media.to_string(),
            });
            rest = remaining;
        } else {
            return imports;
        }
    }
}

fn is_remote(target: &str) -> bool {
    target.starts_with("http:") || target.starts_with("https:") || target.starts_with("//")
}

/// Replaces `span` with spaces, keeping line breaks so every other
/// position of the file stays where it was.
fn blank(styles: &mut String, span: Range<usize>) {
    let blanked: String = styles[span.clone()]
        .chars()
        .map(|c| if c == '\n' { '\n' } else { ' ' })
        .collect();
    styles.replace_range(span, &blanked);
}

/// A stylesheet waiting for its imports to be resolved.
struct Sheet {
    name: String,
    location: Target,
    styles: String,
}

struct Resolver<'a, L: ?Sized> {
    loader: &'a L,
    options: &'a Options,
    output_dir: PathBuf,
    sources: Vec<Source>,
    /// Remote imports the loader refused; they stay as statements.
    kept: Vec<String>,
    diagnostics: Diagnostics,
}

impl<'a, L: Loader + ?Sized> Resolver<'a, L> {
    /// Target of `import` relative to the stylesheet at `location`.
    fn target(&self, location: &Target, import: &str) -> Target {
        if is_remote(import) {
            return Target::Url(import.to_string());
        }
        match location {
            Target::Url(base) => {
                let directory = base.rfind('/').map_or(base.as_str(), |at| &base[..=at]);
                Target::Url(format!("{directory}{import}"))
            }
            Target::Path(path) => match import.strip_prefix('/') {
                Some(rooted) => {
                    let root = self.options.root.clone().unwrap_or_else(|| self.output_dir.clone());
                    Target::Path(root.join(rooted))
                }
                None => {
                    let directory = path.parent().unwrap_or_else(|| Path::new(""));
                    Target::Path(directory.join(import))
                }
            },
        }
    }

    fn resolve<'s>(&'s mut self, mut sheet: Sheet, stack: Vec<Target>) -> BoxFuture<'s, ()>
    where
        'a: 's,
    {
        async move {
            let imports = leading_imports(&sheet.styles);
            let targets: Vec<Target> = imports
                .iter()
                .map(|import| self.target(&sheet.location, &import.target))
                .collect();
            let loader = self.loader;
            let ancestors = &stack;
            let loaded = join_all(targets.iter().map(|target| async move {
                if ancestors.contains(target) {
                    None
                } else {
                    Some(loader.load(target).await)
                }
            }))
            .await;

            for ((import, target), result) in imports.iter().zip(targets).zip(loaded) {
                let Some(result) = result else {
                    self.diagnostics.warn(format!(
                        "Ignoring circular @import of \"{}\" in {}.",
                        import.target, sheet.name
                    ));
                    continue;
                };
                match result {
                    Ok(styles) => {
                        log::debug!("inlining {} into {}", target.name(), sheet.name);
                        let media = !import.media.is_empty();
                        if media {
                            let open = format!("@media {}{{", import.media);
                            self.sources.push(Source::new(sheet.name.as_str(), open));
                        }
                        let mut nested = stack.clone();
                        nested.push(target.clone());
                        let child = Sheet {
                            name: target.name(),
                            location: target,
                            styles,
                        };
                        self.resolve(child, nested).await;
                        if media {
                            self.sources.push(Source::new(sheet.name.as_str(), "}"));
                        }
                    }
                    Err(LoadError::Remote(url)) => {
                        self.diagnostics.warn(format!(
                            "Skipping remote @import of \"{url}\" as no loader fetches it."
                        ));
                        let statement = sheet.styles[import.span.clone()].trim().to_string();
                        self.kept.push(statement);
                    }
                    Err(error) => {
                        self.diagnostics.error(format!(
                            "Broken @import declaration of \"{}\" - {error}.",
                            import.target
                        ));
                    }
                }
            }

            for import in imports.iter().rev() {
                blank(&mut sheet.styles, import.span.clone());
            }
            if self.options.rebase {
                if let Target::Path(path) = &sheet.location {
                    let directory = path.parent().unwrap_or_else(|| Path::new(""));
                    sheet.styles = rebase_urls(&sheet.styles, directory, &self.output_dir);
                }
            }
            self.sources.push(Source::new(sheet.name, sheet.styles));
        }
        .boxed()
    }
}

/// Stylesheets ready for [`cssmin::minify`], plus what went wrong while
/// collecting them.
#[derive(Debug)]
pub struct Resolved {
    pub sources: Vec<Source>,
    pub diagnostics: Diagnostics,
}

/// Directory `url()`s of the output are relative to.
pub fn output_dir(entry: &Path, options: &Options) -> PathBuf {
    if let Some(target) = &options.target {
        return target.parent().map(Path::to_path_buf).unwrap_or_default();
    }
    if let Some(relative_to) = &options.relative_to {
        return relative_to.clone();
    }
    entry.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Inlines the imports of `styles`, which lives at `entry` (a path whose
/// parent directory anchors relative imports).
pub async fn resolve_imports<L: Loader + ?Sized>(
    styles: String,
    entry: &Path,
    name: &str,
    options: &Options,
    loader: &L,
) -> Resolved {
    let mut resolver = Resolver {
        loader,
        options,
        output_dir: output_dir(entry, options),
        sources: Vec::new(),
        kept: Vec::new(),
        diagnostics: Diagnostics::new(),
    };
    let location = Target::Path(entry.to_path_buf());
    let sheet = Sheet {
        name: name.to_string(),
        location: location.clone(),
        styles,
    };
    resolver.resolve(sheet, vec![location]).await;

    let mut sources = resolver.sources;
    if !resolver.kept.is_empty() {
        sources.insert(0, Source::new(name, resolver.kept.join("")));
    }
    Resolved {
        sources,
        diagnostics: resolver.diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_leading_imports() {
        let styles = "@charset \"utf-8\";\n/* c */ @import url(\"a.css\");\n@import 'b.css' screen, print;\na{color:red}@import \"late.css\";";
        let imports = leading_imports(styles);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].target, "a.css");
        assert_eq!(imports[0].media, "");
        assert_eq!(&styles[imports[0].span.clone()], "@import url(\"a.css\");");
        assert_eq!(imports[1].target, "b.css");
        assert_eq!(imports[1].media, "screen, print");
    }

    #[test]
    fn parses_unquoted_urls() {
        let imports = leading_imports("@import url( a.css );");
        assert_eq!(imports[0].target, "a.css");
    }

    #[test]
    fn blanking_keeps_positions() {
        let mut styles = "@import 'a.css';\na{}".to_string();
        blank(&mut styles, 0..16);
        assert_eq!(styles, "                \na{}");
    }

    #[test]
    fn recognizes_remote_targets() {
        assert!(is_remote("http://example.com/a.css"));
        assert!(is_remote("//cdn.example.com/a.css"));
        assert!(!is_remote("a.css"));
    }
}
