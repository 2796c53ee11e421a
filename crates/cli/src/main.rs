use clap::{Parser, Subcommand};
use litrans_core::engine::Engine;
#[cfg(feature = "provider-google")]
use litrans_core::providers::GoogleWebProvider;
#[cfg(feature = "provider-libre")]
use litrans_core::providers::LibreProvider;
#[cfg(feature = "provider-lingva")]
use litrans_core::providers::LingvaProvider;
#[cfg(feature = "provider-mymemory")]
use litrans_core::providers::MyMemoryProvider;
use litrans_core::providers::{MockProvider, TranslatorProvider};
use litrans_core::types::{AppConfig, JsonEnvelope};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;

#[derive(Debug, Parser)]
#[command(
    name = "litrans",
    version,
    about = "Translate quoted string literals in source files"
)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a template .litrans.toml in the current directory.
    InitConfig {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Translate the string literals of a file into a new file.
    File {
        /// Input path; falls back to [files].input from config.
        input: Option<PathBuf>,
        /// Output path; defaults to [files].output, then {stem}_{target}.{ext}.
        output: Option<PathBuf>,
        #[arg(long = "from")]
        source_lang: Option<String>,
        #[arg(long = "to")]
        target_lang: Option<String>,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        max_in_flight: Option<usize>,
    },
    /// Translate a single string and print the result.
    Text {
        text: String,
        #[arg(long = "from")]
        source_lang: Option<String>,
        #[arg(long = "to")]
        target_lang: Option<String>,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { force } = cli.cmd {
        init_config_file(Path::new(".litrans.toml"), force)?;
        println!("initialized .litrans.toml");
        return Ok(());
    }

    let mut cfg = load_config()?;

    match cli.cmd {
        Commands::InitConfig { .. } => {}
        Commands::File {
            input,
            output,
            source_lang,
            target_lang,
            provider,
            endpoint,
            max_in_flight,
        } => {
            if let Some(lang) = source_lang {
                cfg.languages.source = lang;
            }
            if let Some(lang) = target_lang {
                cfg.languages.target = lang;
            }
            if let Some(name) = provider {
                cfg.provider.name = name;
            }
            if let Some(url) = endpoint {
                cfg.provider.endpoint = Some(url);
            }
            if let Some(limit) = max_in_flight {
                cfg.limits.max_in_flight = limit;
            }

            let input = input
                .or_else(|| non_empty(cfg.files.input.as_deref()).map(PathBuf::from))
                .ok_or_else(|| {
                    anyhow::anyhow!("no input file given; pass a path or set [files].input")
                })?;
            let output = output
                .or_else(|| non_empty(cfg.files.output.as_deref()).map(PathBuf::from))
                .unwrap_or_else(|| derive_output_path(&input, &cfg.languages.target));

            run_file(&cfg, &input, &output, cli.json).await?;
        }
        Commands::Text {
            text,
            source_lang,
            target_lang,
            provider,
            endpoint,
        } => {
            if let Some(lang) = source_lang {
                cfg.languages.source = lang;
            }
            if let Some(lang) = target_lang {
                cfg.languages.target = lang;
            }
            if let Some(name) = provider {
                cfg.provider.name = name;
            }
            if let Some(url) = endpoint {
                cfg.provider.endpoint = Some(url);
            }

            run_text(&cfg, &text, cli.json).await?;
        }
    }

    Ok(())
}

async fn run_file(
    cfg: &AppConfig,
    input: &Path,
    output: &Path,
    json_output: bool,
) -> anyhow::Result<()> {
    let provider = build_provider(cfg, |k| std::env::var(k).ok());
    let engine = Engine::new(provider, cfg.languages.clone(), cfg.limits.max_in_flight);

    // per-literal failures are already logged to stderr by the engine as
    // they occur; the report only carries them for the run summary
    let report = engine.translate_file(input, output).await?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonEnvelope {
                status: "ok".to_string(),
                phase: "translate-file".to_string(),
                message: format!("translated file saved: {}", output.display()),
                details: json!({
                    "input": input,
                    "output": output,
                    "lines": report.lines.len(),
                    "literals_seen": report.literals_seen,
                    "literals_translated": report.literals_translated,
                    "literals_failed": report.literals_failed,
                }),
            })?
        );
    } else {
        println!(
            "translated {} of {} literals across {} lines ({} failed)",
            report.literals_translated,
            report.literals_seen,
            report.lines.len(),
            report.literals_failed,
        );
        println!("translated file saved: {}", output.display());
    }

    Ok(())
}

async fn run_text(cfg: &AppConfig, text: &str, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(cfg, |k| std::env::var(k).ok());
    let engine = Engine::new(provider, cfg.languages.clone(), cfg.limits.max_in_flight);

    let translated = engine
        .translate_text(text)
        .await
        .map_err(|e| anyhow::anyhow!("translation failed: {e}"))?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonEnvelope {
                status: "ok".to_string(),
                phase: "translate-text".to_string(),
                message: "translation completed".to_string(),
                details: json!({
                    "source": text,
                    "translated": translated,
                    "from": cfg.languages.source,
                    "to": cfg.languages.target,
                }),
            })?
        );
    } else {
        println!("{translated}");
    }

    Ok(())
}

fn build_provider<F>(cfg: &AppConfig, env_get: F) -> Box<dyn TranslatorProvider>
where
    F: Fn(&str) -> Option<String> + Copy,
{
    let name = cfg.provider.name.to_ascii_lowercase();
    let endpoint = resolve_provider_endpoint(cfg, env_get);
    let api_key = env_get(&cfg.provider.api_key_env_var);

    match name.as_str() {
        "mock" => Box::new(MockProvider),
        #[cfg(feature = "provider-mymemory")]
        "mymemory" => Box::new(MyMemoryProvider::new(endpoint.unwrap_or_else(|| {
            "https://api.mymemory.translated.net/get".to_string()
        }))),
        #[cfg(feature = "provider-lingva")]
        "lingva" => Box::new(LingvaProvider::new(
            endpoint.unwrap_or_else(|| "https://lingva.ml/api/v1".to_string()),
        )),
        #[cfg(feature = "provider-google")]
        "google" => Box::new(GoogleWebProvider::new(endpoint.unwrap_or_else(|| {
            "https://translate.googleapis.com/translate_a/single".to_string()
        }))),
        #[cfg(feature = "provider-libre")]
        _ => Box::new(LibreProvider::new(
            endpoint.unwrap_or_else(|| "https://libretranslate.de/translate".to_string()),
            api_key,
        )),
        #[cfg(not(feature = "provider-libre"))]
        _ => {
            let _ = api_key;
            Box::new(MockProvider)
        }
    }
}

fn resolve_provider_endpoint<F>(cfg: &AppConfig, env_get: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    cfg.provider
        .endpoint
        .clone()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| env_get(&cfg.provider.endpoint_env_var))
        .filter(|v| !v.trim().is_empty())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// `music.py` translated to `en` lands next to the input as `music_en.py`.
fn derive_output_path(input: &Path, target_lang: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let name = match input.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}_{target_lang}.{ext}"),
        None => format!("{stem}_{target_lang}"),
    };
    input.with_file_name(name)
}

fn load_config() -> anyhow::Result<AppConfig> {
    let local_path = PathBuf::from(".litrans.toml");
    let home_path = std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".litrans.toml"));

    let home = match &home_path {
        Some(path) => read_config_value(path)?,
        None => None,
    };
    let local = read_config_value(&local_path)?;

    resolve_config(home, local, |k| std::env::var(k).ok())
}

fn resolve_config<F>(
    home: Option<Value>,
    local: Option<Value>,
    env_get: F,
) -> anyhow::Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = Value::try_from(AppConfig::default())?;
    if let Some(home_value) = home {
        merge_toml(&mut merged, home_value);
    }
    if let Some(local_value) = local {
        merge_toml(&mut merged, local_value);
    }

    let mut cfg: AppConfig = merged.try_into()?;
    apply_env_overrides(&mut cfg, env_get);
    Ok(cfg)
}

fn read_config_value(path: &Path) -> anyhow::Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let parsed = raw.parse::<Value>()?;
    Ok(Some(parsed))
}

fn merge_toml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_map), Value::Table(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    merge_toml(base_value, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn apply_env_overrides<F>(cfg: &mut AppConfig, env_get: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = env_get("LITRANS_PROVIDER") {
        cfg.provider.name = v;
    }
    if let Some(v) = env_get("LITRANS_ENDPOINT") {
        cfg.provider.endpoint = Some(v);
    }
    if let Some(v) = env_get("LITRANS_ENDPOINT_ENV_VAR") {
        cfg.provider.endpoint_env_var = v;
    }
    if let Some(v) = env_get("LITRANS_API_KEY_ENV_VAR") {
        cfg.provider.api_key_env_var = v;
    }

    if let Some(v) = env_get("LITRANS_SOURCE_LANG") {
        cfg.languages.source = v;
    }
    if let Some(v) = env_get("LITRANS_TARGET_LANG") {
        cfg.languages.target = v;
    }

    if let Some(v) = env_get("LITRANS_INPUT") {
        cfg.files.input = Some(v);
    }
    if let Some(v) = env_get("LITRANS_OUTPUT") {
        cfg.files.output = Some(v);
    }

    if let Some(v) = env_get("LITRANS_MAX_IN_FLIGHT").and_then(|v| v.parse::<usize>().ok()) {
        cfg.limits.max_in_flight = v;
    }
}

fn init_config_file(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; re-run with --force to overwrite",
            path.display()
        );
    }
    fs::write(path, config_template())?;
    Ok(())
}

fn config_template() -> &'static str {
    r#"# litrans configuration
# precedence: CLI > env > local .litrans.toml > home ~/.litrans.toml > defaults

[provider]
# provider options: libre, mymemory, lingva, google, mock
name = "libre"
# optional explicit endpoint override (for self-hosted instances)
endpoint = ""
endpoint_env_var = "LITRANS_ENDPOINT"
api_key_env_var = "LITRANS_API_KEY"

[languages]
source = "pt"
target = "en"

[files]
# default input path used when no positional argument is given
input = ""
# default output path; empty derives {stem}_{target}.{ext} from the input
output = ""

[limits]
# translation requests in flight per line; 1 keeps processing sequential
max_in_flight = 1
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn toml_value(raw: &str) -> Value {
        raw.parse::<Value>().expect("test toml must parse")
    }

    #[test]
    fn config_precedence_env_over_local_over_home_over_defaults() {
        let home = toml_value(
            r#"
[provider]
name = "google"

[languages]
target = "fr"
"#,
        );
        let local = toml_value(
            r#"
[provider]
name = "lingva"
"#,
        );
        let mut env = HashMap::new();
        env.insert("LITRANS_TARGET_LANG".to_string(), "es".to_string());

        let cfg = resolve_config(Some(home), Some(local), |k| env.get(k).cloned())
            .expect("config must resolve");

        assert_eq!(cfg.provider.name, "lingva");
        assert_eq!(cfg.languages.target, "es");
        // untouched sections keep their defaults
        assert_eq!(cfg.languages.source, "pt");
        assert_eq!(cfg.limits.max_in_flight, 1);
    }

    #[test]
    fn endpoint_env_var_beats_config_file() {
        let local = toml_value(
            r#"
[provider]
endpoint = "https://config.example/translate"
"#,
        );
        let mut env = HashMap::new();
        env.insert(
            "LITRANS_ENDPOINT".to_string(),
            "https://env.example/translate".to_string(),
        );

        let cfg = resolve_config(None, Some(local), |k| env.get(k).cloned())
            .expect("config must resolve");

        assert_eq!(
            cfg.provider.endpoint.as_deref(),
            Some("https://env.example/translate")
        );
        let resolved = resolve_provider_endpoint(&cfg, |k| env.get(k).cloned());
        assert_eq!(resolved.as_deref(), Some("https://env.example/translate"));
    }

    #[test]
    fn template_config_round_trips_through_defaults() {
        let cfg = resolve_config(None, Some(toml_value(config_template())), |_| None)
            .expect("template must resolve");
        assert_eq!(cfg.provider.name, "libre");
        assert_eq!(cfg.languages.source, "pt");
        assert_eq!(cfg.languages.target, "en");
    }

    #[test]
    fn provider_endpoint_prefers_config_then_env() {
        let mut cfg = AppConfig::default();
        cfg.provider.endpoint = Some("https://translate.internal/api".to_string());

        let from_cfg = resolve_provider_endpoint(&cfg, |_| {
            Some("https://env.example/translate".to_string())
        });
        assert_eq!(
            from_cfg.as_deref(),
            Some("https://translate.internal/api")
        );

        cfg.provider.endpoint = Some("  ".to_string());
        let from_env = resolve_provider_endpoint(&cfg, |k| {
            (k == "LITRANS_ENDPOINT").then(|| "https://env.example/translate".to_string())
        });
        assert_eq!(from_env.as_deref(), Some("https://env.example/translate"));
    }

    #[test]
    fn init_config_requires_force_to_overwrite() {
        let dir = std::env::temp_dir().join(format!("litrans-cli-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".litrans.toml");

        init_config_file(&path, false).expect("first write succeeds");
        assert!(init_config_file(&path, false).is_err());
        init_config_file(&path, true).expect("force overwrites");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn output_path_derives_from_stem_and_target() {
        assert_eq!(
            derive_output_path(Path::new("music.py"), "en"),
            PathBuf::from("music_en.py")
        );
        assert_eq!(
            derive_output_path(Path::new("src/app.js"), "de"),
            PathBuf::from("src/app_de.js")
        );
        assert_eq!(
            derive_output_path(Path::new("Makefile"), "en"),
            PathBuf::from("Makefile_en")
        );
    }

    #[test]
    fn file_command_parses_flags() {
        let cli = Cli::try_parse_from([
            "litrans",
            "file",
            "music.py",
            "--to",
            "en",
            "--provider",
            "mymemory",
            "--max-in-flight",
            "4",
            "--json",
        ])
        .expect("flags must parse");

        assert!(cli.json);
        match cli.cmd {
            Commands::File {
                input,
                target_lang,
                provider,
                max_in_flight,
                ..
            } => {
                assert_eq!(input, Some(PathBuf::from("music.py")));
                assert_eq!(target_lang.as_deref(), Some("en"));
                assert_eq!(provider.as_deref(), Some("mymemory"));
                assert_eq!(max_in_flight, Some(4));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
