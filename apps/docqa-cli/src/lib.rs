//! Shared plumbing for the docqa binaries: logging setup and the
//! command-line overrides that sit on top of the figment config.

use anyhow::{bail, Context};
use figment::providers::Serialized;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use docqa_core::config::{Config, Settings};

/// Logs go to stderr so answers on stdout stay pipeable.
/// `RUST_LOG` picks the filter, `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,docqa=info"));
    let json = std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub top_k: Option<usize>,
    pub chunk_size: Option<usize>,
    pub overlap: Option<usize>,
}

/// Pull `--top-k`, `--chunk-size` and `--overlap` (with a following value)
/// out of `args`, leaving positional arguments in order.
pub fn split_overrides(args: Vec<String>) -> anyhow::Result<(Overrides, Vec<String>)> {
    let mut overrides = Overrides::default();
    let mut positional = Vec::new();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let slot = match arg.as_str() {
            "--top-k" => &mut overrides.top_k,
            "--chunk-size" => &mut overrides.chunk_size,
            "--overlap" => &mut overrides.overlap,
            s if s.starts_with("--") => bail!("unknown option {s}"),
            _ => {
                positional.push(arg);
                continue;
            }
        };
        let value = it.next().with_context(|| format!("{arg} needs a value"))?;
        *slot = Some(value.parse().with_context(|| format!("{arg}: '{value}' is not a number"))?);
    }
    Ok((overrides, positional))
}

impl Overrides {
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(k) = self.top_k {
            config = config.merge(Serialized::default("retrieval.top_k", k));
        }
        if let Some(size) = self.chunk_size {
            config = config.merge(Serialized::default("chunking.chunk_size", size));
        }
        if let Some(overlap) = self.overlap {
            config = config.merge(Serialized::default("chunking.overlap", overlap));
        }
        config
    }
}

/// Layered config (defaults, files, `APP_*` env) plus command-line overrides.
pub fn load_settings(overrides: &Overrides) -> anyhow::Result<Settings> {
    let config = overrides.apply(Config::load()?);
    Ok(config.settings()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn overrides_are_split_from_positionals() {
        let (o, rest) = split_overrides(args(&["manual.txt", "--top-k", "2", "how?", "--overlap", "0"])).unwrap();
        assert_eq!(o, Overrides { top_k: Some(2), chunk_size: None, overlap: Some(0) });
        assert_eq!(rest, args(&["manual.txt", "how?"]));
    }

    #[test]
    fn bad_override_values_are_errors() {
        assert!(split_overrides(args(&["--top-k"])).is_err());
        assert!(split_overrides(args(&["--chunk-size", "big"])).is_err());
        assert!(split_overrides(args(&["--verbose"])).is_err());
    }

    #[test]
    fn overrides_win_over_defaults() {
        let o = Overrides { top_k: Some(7), chunk_size: Some(300), overlap: Some(30) };
        let settings = o.apply(Config::defaults()).settings().unwrap();
        assert_eq!(settings.retrieval.top_k, 7);
        assert_eq!(settings.chunking.chunk_size, 300);
        assert_eq!(settings.chunking.overlap, 30);
    }

    #[test]
    fn overlap_override_is_validated() {
        let o = Overrides { top_k: None, chunk_size: Some(100), overlap: Some(100) };
        assert!(o.apply(Config::defaults()).settings().is_err());
    }
}
