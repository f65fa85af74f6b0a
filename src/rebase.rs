//! Rewrites relative `url()`s of a stylesheet that is inlined into one living
//! in another directory.

use std::path::{Component, Path, PathBuf};

use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_till};
use nom::character::complete::{char, multispace0};
use nom::combinator::map;
use nom::sequence::delimited;
use nom::IResult;

fn is_absolute_url(url: &str) -> bool {
    url.is_empty()
        || url.starts_with('/')
        || url.starts_with('#')
        || url.starts_with("data:")
        || url.contains("://")
}

/// Resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if normalized.file_name().is_some() {
                    normalized.pop();
                } else {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// `url` as seen from `to`, given it was written relative to `from`.
/// `None` for urls that do not depend on the stylesheet's location.
pub fn rebase_url(url: &str, from: &Path, to: &Path) -> Option<String> {
    if is_absolute_url(url) {
        return None;
    }
    let split = url.find(['?', '#']).unwrap_or(url.len());
    let (path, suffix) = url.split_at(split);

    let target = normalize(&from.join(path));
    let relative = pathdiff::diff_paths(&target, normalize(to))?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(format!("{}{}", parts.join("/"), suffix))
}

/// `url(...)` with its optional quote and target.
fn url_call(input: &str) -> IResult<&str, (Option<char>, &str)> {
    let (input, _) = tag_no_case("url(")(input)?;
    let (input, _) = multispace0(input)?;
    let (input, target) = alt((
        map(
            delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
            |target| (Some('"'), target),
        ),
        map(
            delimited(char('\''), take_till(|c: char| c == '\''), char('\'')),
            |target| (Some('\''), target),
        ),
        map(take_till(|c: char| c == ')' || c.is_whitespace()), |target| {
            (None, target)
        }),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, target))
}

fn find_url(text: &str) -> Option<usize> {
    text.as_bytes()
        .windows(4)
        .position(|window| window.eq_ignore_ascii_case(b"url("))
}

/// Rewrites every relative `url()` of `styles` from directory `from` to
/// directory `to`.
pub fn rebase_urls(styles: &str, from: &Path, to: &Path) -> String {
    if normalize(from) == normalize(to) {
        return styles.to_string();
    }

    let mut rebased = String::with_capacity(styles.len());
    let mut rest = styles;
    while let Some(at) = find_url(rest) {
        rebased.push_str(&rest[..at]);
        let candidate = &rest[at..];
        match url_call(candidate) {
            Ok((remaining, (quote, target))) => {
                match rebase_url(target, from, to) {
                    Some(url) => {
                        let quote = quote.map(String::from).unwrap_or_default();
                        rebased.push_str(&format!("url({quote}{url}{quote})"));
                    }
                    None => rebased.push_str(&candidate[..candidate.len() - remaining.len()]),
                }
                rest = remaining;
            }
            Err(_) => {
                rebased.push_str(&candidate[..4]);
                rest = &candidate[4..];
            }
        }
    }
    rebased.push_str(rest);
    rebased
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebases_relative_paths() {
        assert_eq!(
            rebase_url("../img/a.png", Path::new("css/parts"), Path::new("css")).as_deref(),
            Some("img/a.png")
        );
        assert_eq!(
            rebase_url("img/a.png?v=1#top", Path::new("css"), Path::new(".")).as_deref(),
            Some("css/img/a.png?v=1#top")
        );
        assert_eq!(
            rebase_url("a.png", Path::new("vendor"), Path::new("css")).as_deref(),
            Some("../vendor/a.png")
        );
    }

    #[test]
    fn leaves_absolute_urls() {
        for url in ["/a.png", "http://example.com/a.png", "data:image/png;base64,AA", "#icon"] {
            assert_eq!(rebase_url(url, Path::new("css"), Path::new(".")), None);
        }
    }

    #[test]
    fn rewrites_every_url_keeping_quotes() {
        let styles = "a{background:url('img/x.png')}b{background:URL( img/y.png )}c{background:url(/z.png)}";
        assert_eq!(
            rebase_urls(styles, Path::new("css"), Path::new(".")),
            "a{background:url('css/img/x.png')}b{background:url(css/img/y.png)}c{background:url(/z.png)}"
        );
    }

    #[test]
    fn same_directory_is_untouched() {
        let styles = "a{background:url(x.png)}";
        assert_eq!(rebase_urls(styles, Path::new("css/."), Path::new("css")), styles);
    }
}
