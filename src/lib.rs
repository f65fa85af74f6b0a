//! # csspress - CSS minifier with `@import` inlining
//!
//! Wraps the synchronous [`cssmin`] core with the parts that touch the
//! outside world: leading `@import`s are fetched through a [`Loader`] and
//! inlined, and relative `url()`s of inlined stylesheets are rebased onto
//! the output's directory.
//!
//! ```rust,no_run
//! # async fn run() -> csspress::Result<()> {
//! use csspress::{minify_file, Options};
//!
//! let output = minify_file("styles/main.css", &Options::default()).await?;
//! println!("{}", output.styles);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod import;
pub mod rebase;

use std::path::{Path, PathBuf};

pub use cssmin::{
    Compatibility, Diagnostics, Input, Options, Output, Source, SourceMap, SourceMapOption,
    SpecialComments, Stats, minify,
};
pub use error::{Error, LoadError, Result};
pub use import::{FsLoader, Loader, Target};

/// Parses options from their JSON form.
pub fn load_options(json: &str) -> Result<Options> {
    Ok(Options::from_json(json)?)
}

fn entry_source(name: &str, styles: String, options: &Options) -> Source {
    let mut source = Source::new(name, styles);
    if let SourceMapOption::Input(map) = &options.source_map {
        source.source_map = Some(map.clone());
    }
    source
}

async fn run<L: Loader + ?Sized>(
    styles: String,
    entry: &Path,
    name: &str,
    options: &Options,
    loader: &L,
) -> Output {
    if !options.process_import {
        return minify(vec![entry_source(name, styles, options)], options);
    }

    let resolved = import::resolve_imports(styles, entry, name, options, loader).await;
    let mut sources = resolved.sources;
    if let (SourceMapOption::Input(map), Some(source)) = (
        &options.source_map,
        sources.iter_mut().rev().find(|source| source.name == name),
    ) {
        source.source_map = Some(map.clone());
    }

    let mut output = minify(sources, options);
    let mut diagnostics = resolved.diagnostics;
    diagnostics.errors.append(&mut output.errors);
    diagnostics.warnings.append(&mut output.warnings);
    output.errors = diagnostics.errors;
    output.warnings = diagnostics.warnings;
    output
}

/// Minifies `styles` given as text. Relative imports resolve against
/// `relative_to`, or the working directory when that is unset.
pub async fn minify_styles<L: Loader + ?Sized>(
    styles: impl Into<String>,
    options: &Options,
    loader: &L,
) -> Output {
    let directory = options.relative_to.clone().unwrap_or_else(|| PathBuf::from("."));
    let entry = directory.join(cssmin::stringify::STDIN);
    run(styles.into(), &entry, cssmin::stringify::STDIN, options, loader).await
}

/// Reads and minifies the stylesheet at `path`, inlining its local imports.
pub async fn minify_file(path: impl AsRef<Path>, options: &Options) -> Result<Output> {
    let path = path.as_ref();
    let styles = FsLoader.load(&Target::Path(path.to_path_buf())).await?;
    let name = path.display().to_string();
    Ok(run(styles, path, &name, options, &FsLoader).await)
}
