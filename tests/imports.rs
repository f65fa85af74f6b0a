use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csspress::{LoadError, Loader, Options, SourceMapOption, Target, minify_file, minify_styles};
use tempfile::TempDir;

/// Serves stylesheets from memory.
#[derive(Default)]
struct MemoryLoader {
    files: HashMap<Target, String>,
}

impl MemoryLoader {
    fn with(mut self, target: Target, styles: &str) -> Self {
        self.files.insert(target, styles.to_string());
        self
    }
}

#[async_trait]
impl Loader for MemoryLoader {
    async fn load(&self, target: &Target) -> Result<String, LoadError> {
        match self.files.get(target) {
            Some(styles) => Ok(styles.clone()),
            None => match target {
                Target::Path(path) => Err(LoadError::NotFound(path.clone())),
                Target::Url(url) => Err(LoadError::Remote(url.clone())),
            },
        }
    }
}

fn write(dir: &Path, name: &str, styles: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, styles).unwrap();
    path
}

fn virtual_options() -> Options {
    Options {
        relative_to: Some(PathBuf::from("/virtual")),
        ..Options::default()
    }
}

#[tokio::test]
async fn inlines_local_imports_in_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.css", "b{margin:0}");
    write(dir.path(), "c.css", "i{top:0}");
    let main = write(
        dir.path(),
        "main.css",
        "@import url(b.css);\n@import \"c.css\";\na{color:red}",
    );

    let output = minify_file(&main, &Options::default()).await.unwrap();
    assert_eq!(output.styles, "b{margin:0}i{top:0}a{color:red}");
    assert!(output.errors.is_empty());
    assert!(output.warnings.is_empty());
}

#[tokio::test]
async fn resolves_nested_imports_relative_to_importer() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "parts/inner.css", "p{top:0}");
    write(dir.path(), "parts/outer.css", "@import 'inner.css';\nb{margin:0}");
    let main = write(dir.path(), "main.css", "@import 'parts/outer.css';a{color:red}");

    let output = minify_file(&main, &Options::default()).await.unwrap();
    assert_eq!(output.styles, "p{top:0}b{margin:0}a{color:red}");
}

#[tokio::test]
async fn wraps_media_imports() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "print.css", "b{margin:0}");
    let main = write(dir.path(), "main.css", "@import 'print.css' print;a{color:red}");

    let output = minify_file(&main, &Options::default()).await.unwrap();
    assert_eq!(output.styles, "@media print{b{margin:0}}a{color:red}");
}

#[tokio::test]
async fn ignores_circular_imports() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.css", "@import 'main.css';b{margin:0}");
    let main = write(dir.path(), "main.css", "@import 'b.css';a{color:red}");

    let output = minify_file(&main, &Options::default()).await.unwrap();
    assert_eq!(output.styles, "b{margin:0}a{color:red}");
    assert_eq!(output.warnings.len(), 1);
    assert!(output.warnings[0].starts_with("Ignoring circular @import"));
}

#[tokio::test]
async fn reports_missing_imports() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "main.css", "@import 'missing.css';a{color:red}");

    let output = minify_file(&main, &Options::default()).await.unwrap();
    assert_eq!(output.styles, "a{color:red}");
    assert_eq!(output.errors.len(), 1);
    assert!(output.errors[0].starts_with("Broken @import declaration of \"missing.css\""));
}

#[tokio::test]
async fn missing_entry_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = minify_file(dir.path().join("nope.css"), &Options::default()).await;
    assert!(matches!(result, Err(csspress::Error::Load(LoadError::NotFound(_)))));
}

#[tokio::test]
async fn rebases_urls_of_imported_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "css/parts/b.css", "b{background:url(../img/x.png)}");
    let main = write(
        dir.path(),
        "css/main.css",
        "@import 'parts/b.css';a{background:url(img/y.png)}",
    );

    let output = minify_file(&main, &Options::default()).await.unwrap();
    assert_eq!(
        output.styles,
        "b{background:url(img/x.png)}a{background:url(img/y.png)}"
    );
}

#[tokio::test]
async fn keeps_urls_when_rebase_is_off() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "css/parts/b.css", "b{background:url(../img/x.png)}");
    let main = write(dir.path(), "css/main.css", "@import 'parts/b.css';");
    let options = Options {
        rebase: false,
        ..Options::default()
    };

    let output = minify_file(&main, &options).await.unwrap();
    assert_eq!(output.styles, "b{background:url(../img/x.png)}");
}

#[tokio::test]
async fn keeps_remote_imports_the_loader_refuses() {
    let output = minify_styles(
        "@import url(http://example.com/a.css);a{color:red}",
        &virtual_options(),
        &MemoryLoader::default(),
    )
    .await;
    assert_eq!(output.styles, "@import url(http://example.com/a.css);a{color:red}");
    assert_eq!(output.warnings.len(), 1);
    assert!(output.warnings[0].starts_with("Skipping remote @import"));
}

#[tokio::test]
async fn custom_loader_fetches_remote_imports() {
    let loader = MemoryLoader::default()
        .with(Target::Url("https://cdn.test/base.css".into()), "@import 'reset.css';p{margin:0}")
        .with(Target::Url("https://cdn.test/reset.css".into()), "i{top:0}");

    let output = minify_styles(
        "@import url(https://cdn.test/base.css);a{color:red}",
        &virtual_options(),
        &loader,
    )
    .await;
    assert_eq!(output.styles, "i{top:0}p{margin:0}a{color:red}");
    assert!(output.warnings.is_empty());
}

#[tokio::test]
async fn resolves_stdin_imports_against_relative_to() {
    let loader = MemoryLoader::default().with(Target::Path("/virtual/a.css".into()), "b{margin:0}");

    let output = minify_styles("@import 'a.css';a{color:red}", &virtual_options(), &loader).await;
    assert_eq!(output.styles, "b{margin:0}a{color:red}");
}

#[tokio::test]
async fn leaves_imports_alone_when_processing_is_off() {
    let options = Options {
        process_import: false,
        ..virtual_options()
    };

    let output = minify_styles("@import url(a.css);a{color:red}", &options, &MemoryLoader::default()).await;
    assert_eq!(output.styles, "@import url(a.css);a{color:red}");
    assert!(output.warnings.is_empty());
}

#[tokio::test]
async fn source_map_names_imported_files() {
    let dir = TempDir::new().unwrap();
    let imported = write(dir.path(), "b.css", "b{margin:0}");
    let main = write(dir.path(), "main.css", "@import 'b.css';\na{color:red}");
    let options = Options {
        source_map: SourceMapOption::Enabled,
        ..Options::default()
    };

    let output = minify_file(&main, &options).await.unwrap();
    let map = output.source_map.unwrap();
    assert!(map.sources.contains(&imported.display().to_string()));
    assert!(map.sources.contains(&main.display().to_string()));
}

#[test]
fn options_load_from_json() {
    let options = csspress::load_options(r#"{"advanced": false, "keepBreaks": true}"#).unwrap();
    assert!(!options.advanced);
    assert!(options.keep_breaks);
    assert!(csspress::load_options("{").is_err());
}
