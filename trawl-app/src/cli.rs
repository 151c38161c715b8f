use std::path::{Path, PathBuf};

use clap::Parser;
use trawl_social::twitter::{FetchPlan, SearchProduct};

/// Settings file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "trawl.yaml";

/// Search recent tweets by keyword and print them as a single JSON line.
#[derive(Parser, Debug, Clone)]
#[command(name = "trawl", version)]
pub struct Cli {
    /// Comma-separated keywords; when empty the first trending topic is searched
    #[arg(long, default_value = "")]
    pub keywords: String,

    /// Maximum posts per keyword (values below 1 are raised to 1)
    #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
    pub count: i64,

    /// `latest` or `top`; anything else means `latest`
    #[arg(long, default_value = "latest")]
    pub mode: String,

    /// YAML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Trimmed, non-empty keywords in the order given.
    pub fn keywords(&self) -> Vec<String> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn count(&self) -> usize {
        usize::try_from(self.count.max(1)).unwrap_or(usize::MAX)
    }

    pub fn product(&self) -> SearchProduct {
        SearchProduct::from_mode(&self.mode.to_lowercase())
    }

    pub fn plan(&self) -> FetchPlan {
        FetchPlan::new(self.keywords(), self.count(), self.product())
    }

    /// Settings file to load and whether its absence is an error.
    pub fn config_source(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (Path::new(DEFAULT_CONFIG_FILE).to_path_buf(), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("trawl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert!(cli.keywords().is_empty());
        assert_eq!(cli.count(), 20);
        assert_eq!(cli.product(), SearchProduct::Latest);
        assert_eq!(
            cli.config_source(),
            (PathBuf::from(DEFAULT_CONFIG_FILE), false)
        );
    }

    #[test]
    fn keywords_are_trimmed_and_blanks_dropped() {
        let cli = parse(&["--keywords", " rust , ,tokio,, "]);
        assert_eq!(cli.keywords(), vec!["rust", "tokio"]);
    }

    #[test]
    fn count_is_raised_to_one() {
        assert_eq!(parse(&["--count", "0"]).count(), 1);
        assert_eq!(parse(&["--count", "-7"]).count(), 1);
        assert_eq!(parse(&["--count", "3"]).count(), 3);
    }

    #[test]
    fn mode_is_case_insensitive() {
        assert_eq!(parse(&["--mode", "TOP"]).product(), SearchProduct::Top);
        assert_eq!(parse(&["--mode", "top"]).product(), SearchProduct::Top);
        assert_eq!(parse(&["--mode", "popular"]).product(), SearchProduct::Latest);
    }

    #[test]
    fn plan_bounds_output_by_keyword_count() {
        let plan = parse(&["--keywords", "a,b", "--count", "5"]).plan();
        assert_eq!(plan.keywords, vec!["a", "b"]);
        assert_eq!(plan.count, 5);
        assert_eq!(plan.output_bound(), 10);
    }

    #[test]
    fn explicit_config_is_required() {
        let cli = parse(&["--config", "/etc/trawl.yaml"]);
        assert_eq!(cli.config_source(), (PathBuf::from("/etc/trawl.yaml"), true));
    }

    #[test]
    fn non_numeric_count_is_a_usage_error() {
        let err = Cli::try_parse_from(["trawl", "--count", "many"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
