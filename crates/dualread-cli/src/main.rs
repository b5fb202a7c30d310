use anyhow::{Context, Result};
use dualread_config::{BasePathSetting, Config, PreferenceStore};
use dualread_engine::locator::is_absolute;
use dualread_engine::{
    BasePath, CacheMode, DualRead, Fetch, FetchOptions, FileFetcher, HookStage, HttpFetcher,
    Route, Settings,
};
use std::{
    env,
    path::{Path, PathBuf},
    process,
};

/// Text colour of the default reading theme.
const DEFAULT_THEME_TEXT_COLOR: &str = "#34495e";

fn usage(program: &str) {
    eprintln!("Usage: {program} <document> [base-path]");
    eprintln!("       {program} --css [theme-text-color]");
}

/// Builds engine settings from the config file, with an optional base path override.
fn settings_from_config(config: &Config, base_override: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::default();

    settings.base_path = match (base_override, &config.base_path) {
        (Some(base), _) => BasePath::from(base),
        (None, Some(BasePathSetting::Single(base))) => BasePath::from(base.as_str()),
        (None, Some(BasePathSetting::Candidates(candidates))) => {
            BasePath::from(candidates.clone())
        }
        (None, None) => BasePath::default(),
    };

    if let Some(suffix) = &config.annotation_suffix {
        settings.suffix = suffix.clone();
    }
    if let Some(extension) = &config.extension {
        settings.extension = extension.trim_start_matches('.').to_string();
    }
    if let Some(hook) = &config.hook {
        settings.hook = hook.parse::<HookStage>()?;
    }
    if let Some(mode) = &config.cache_mode {
        settings.fetch = FetchOptions {
            cache: Some(mode.parse::<CacheMode>()?),
            ..FetchOptions::default()
        };
    }
    settings.request_headers = config.request_headers.clone();

    Ok(settings)
}

/// Directory the file fetcher reads from and the route of the document within it.
fn file_route(document: &Path, notes_root: Option<&Path>) -> (PathBuf, Route) {
    if let Some(root) = notes_root
        && let Ok(relative) = document.strip_prefix(root)
    {
        let file = relative.to_string_lossy().replace('\\', "/");
        return (root.to_path_buf(), Route::new(file));
    }

    let root = document
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let file = document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    (root, Route { file })
}

/// Where annotations are read from, and the route of the document there.
#[derive(Debug, PartialEq)]
enum Source {
    Http(Route),
    Files { root: PathBuf, route: Route },
}

/// Picks the fetcher for the configured base path. Both kinds use a route
/// relative to `notes_root`, or the bare file name outside of it.
fn plan_source(settings: &Settings, document: &Path, notes_root: Option<&Path>) -> Source {
    let (root, route) = file_route(document, notes_root);
    if is_absolute(settings.base_path.first()) {
        Source::Http(route)
    } else {
        Source::Files { root, route }
    }
}

async fn render<F: Fetch + 'static>(
    settings: &Settings,
    fetcher: F,
    content: &str,
    route: &Route,
) -> String {
    let dual = DualRead::with_fetcher(settings, fetcher);
    let merged = match dual.stage() {
        HookStage::BeforeParse => dual.before_parse(content, route).await,
        HookStage::AfterRender => dual.after_render(content, route).await,
    };

    let stats = dual.cache().stats();
    log::debug!(
        "Fetches: {}, hits: {}, failures: {}",
        stats.fetches(),
        stats.hits(),
        stats.failures()
    );
    merged
}

fn print_stylesheet(theme_text_color: &str) -> Result<()> {
    let store = PreferenceStore::new(PreferenceStore::default_path());
    log::info!("Display preferences: {}", store.path().display());

    let preferences = store.resolve(theme_text_color)?;
    preferences.validate()?;
    print!("{}", preferences.stylesheet());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.get(1).map(String::as_str) == Some("--css") {
        if args.len() > 3 {
            usage(&args[0]);
            process::exit(1);
        }
        let color = args.get(2).map_or(DEFAULT_THEME_TEXT_COLOR, String::as_str);
        return print_stylesheet(color);
    }

    if args.len() < 2 || args.len() > 3 {
        usage(&args[0]);
        process::exit(1);
    }

    let document = PathBuf::from(&args[1]);
    let base_override = args.get(2).map(String::as_str);

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Loaded config from {}", config_path.display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let settings = settings_from_config(&config, base_override)?;
    let content = std::fs::read_to_string(&document)
        .with_context(|| format!("Failed to read document {}", document.display()))?;

    let merged = match plan_source(&settings, &document, config.notes_root.as_deref()) {
        Source::Http(route) => {
            log::info!("Fetching annotations from {}", settings.base_path.first());
            render(&settings, HttpFetcher::new(), &content, &route).await
        }
        Source::Files { root, route } => {
            log::info!("Reading annotations from {}", root.display());
            render(&settings, FileFetcher::new(root), &content, &route).await
        }
    };

    print!("{merged}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_gives_default_settings() {
        let settings = settings_from_config(&Config::default(), None).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_config_maps_onto_settings() {
        let config = Config {
            base_path: Some(BasePathSetting::Candidates(vec![
                "https://example.com/docs/".to_string(),
            ])),
            annotation_suffix: Some("_ja".to_string()),
            extension: Some(".markdown".to_string()),
            hook: Some("after-render".to_string()),
            cache_mode: Some("no-store".to_string()),
            request_headers: BTreeMap::from([("x-token".to_string(), "abc".to_string())]),
            ..Config::default()
        };

        let settings = settings_from_config(&config, None).unwrap();

        assert_eq!(settings.base_path.first(), "https://example.com/docs/");
        assert_eq!(settings.suffix, "_ja");
        assert_eq!(settings.extension, "markdown");
        assert_eq!(settings.hook, HookStage::AfterRender);
        assert_eq!(settings.fetch_options().cache_mode(), CacheMode::NoStore);
        assert_eq!(settings.fetch_options().headers["x-token"], "abc");
    }

    #[test]
    fn test_base_path_argument_overrides_config() {
        let config = Config {
            base_path: Some(BasePathSetting::Single("from-config".to_string())),
            ..Config::default()
        };

        let settings = settings_from_config(&config, Some("from-args")).unwrap();

        assert_eq!(settings.base_path, BasePath::from("from-args"));
    }

    #[test]
    fn test_invalid_config_values_are_errors() {
        let bad_hook = Config {
            hook: Some("during".to_string()),
            ..Config::default()
        };
        assert!(settings_from_config(&bad_hook, None).is_err());

        let bad_cache = Config {
            cache_mode: Some("sometimes".to_string()),
            ..Config::default()
        };
        assert!(settings_from_config(&bad_cache, None).is_err());
    }

    #[test]
    fn test_file_route_under_notes_root() {
        let (root, route) = file_route(
            Path::new("/notes/poems/spring.md"),
            Some(Path::new("/notes")),
        );
        assert_eq!(root, PathBuf::from("/notes"));
        assert_eq!(route, Route::new("poems/spring.md"));
    }

    #[test]
    fn test_file_route_falls_back_to_document_dir() {
        let (root, route) = file_route(
            Path::new("/elsewhere/spring.md"),
            Some(Path::new("/notes")),
        );
        assert_eq!(root, PathBuf::from("/elsewhere"));
        assert_eq!(route, Route::new("spring.md"));

        let (root, route) = file_route(Path::new("spring.md"), None);
        assert_eq!(root, PathBuf::from("."));
        assert_eq!(route, Route::new("spring.md"));
    }

    fn url_settings() -> Settings {
        settings_from_config(&Config::default(), Some("https://cdn.example.com/docs/")).unwrap()
    }

    #[test]
    fn test_url_base_uses_route_relative_to_notes_root() {
        let settings = url_settings();

        let source = plan_source(
            &settings,
            Path::new("/home/me/notes/zh/guide.md"),
            Some(Path::new("/home/me/notes")),
        );

        assert_eq!(source, Source::Http(Route::new("zh/guide.md")));
        assert_eq!(
            settings.resolver().resolve("zh/guide.md").unwrap(),
            "https://cdn.example.com/docs/zh/guide_en.md"
        );
    }

    #[test]
    fn test_url_base_outside_notes_root_uses_file_name() {
        let source = plan_source(&url_settings(), Path::new("./guide.md"), None);
        assert_eq!(source, Source::Http(Route::new("guide.md")));

        let source = plan_source(
            &url_settings(),
            Path::new("/tmp/zh/guide.md"),
            Some(Path::new("/home/me/notes")),
        );
        assert_eq!(source, Source::Http(Route::new("guide.md")));
    }

    #[test]
    fn test_relative_base_reads_files() {
        let settings = settings_from_config(&Config::default(), Some("glosses")).unwrap();

        let source = plan_source(
            &settings,
            Path::new("/home/me/notes/zh/guide.md"),
            Some(Path::new("/home/me/notes")),
        );

        assert_eq!(
            source,
            Source::Files {
                root: PathBuf::from("/home/me/notes"),
                route: Route::new("zh/guide.md"),
            }
        );
    }

    #[tokio::test]
    async fn test_render_from_notes_dir() {
        let temp_dir = TempDir::new().unwrap();
        let document = temp_dir.path().join("spring.md");
        std::fs::write(&document, "# 春晓\n\n春眠不觉晓。\n").unwrap();
        std::fs::write(
            temp_dir.path().join("spring_en.md"),
            "Spring sleep, unaware of dawn.\n",
        )
        .unwrap();

        let (root, route) = file_route(&document, Some(temp_dir.path()));
        let content = std::fs::read_to_string(&document).unwrap();
        let merged = render(&Settings::default(), FileFetcher::new(root), &content, &route).await;

        assert_eq!(
            merged,
            "# 春晓\n\n<ruby>春眠不觉晓。<rt>Spring sleep, unaware of dawn.</rt></ruby>\n"
        );
    }
}
