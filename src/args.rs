use std::io::{BufRead, Write};
use std::time::Duration;

use clap::Parser;

use crate::config::{CrawlerConfig, DEFAULT_MAX_PARALLEL, DEFAULT_TASK_TIMEOUT, GITHUB_HOST};
use crate::error::{CrawlerError, Result};
use crate::proxy::ProxyPool;
use crate::types::{SearchQuery, SearchType};

/// GitHub search crawler that routes requests through rotating proxies and
/// enriches repository hits with owner and language statistics.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Crawl GitHub's HTML search through a pool of proxies. Repository hits are fetched concurrently and enriched with their owner and language statistics. Any missing input is asked for interactively."
)]
pub struct Args {
    /// Words to search for; joined with '+'.
    #[clap(short, long, num_args = 1..)]
    pub keywords: Vec<String>,

    /// Proxies (host:port) to route requests through; one is picked per request.
    #[clap(
        short,
        long,
        num_args = 1..,
        env = "GITHUB_CRAWLER_PROXIES",
        value_delimiter = ' '
    )]
    pub proxies: Vec<String>,

    /// Search type: Repositories, Issues or Wikis.
    #[clap(short = 't', long = "type", value_name = "TYPE")]
    pub search_type: Option<SearchType>,

    /// Maximum number of repository pages fetched at once.
    #[clap(short = 'c', long, default_value_t = DEFAULT_MAX_PARALLEL)]
    pub concurrency: usize,

    /// Per repository page timeout in seconds.
    #[clap(long, default_value = "30", value_name = "SECS")]
    pub timeout: u64,

    /// Site to crawl.
    #[clap(long, default_value = GITHUB_HOST)]
    pub base_url: String,

    /// Also write the JSON results to this file.
    #[clap(short, long)]
    pub output: Option<String>,

    /// Show a progress bar while enriching repositories.
    #[clap(long)]
    pub progress: bool,
}

/// Keywords, proxies and search type, however they were supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    pub keywords: Vec<String>,
    pub proxies: Vec<String>,
    pub search_type: SearchType,
}

impl Args {
    /// Arguments with nothing supplied and every option at its default.
    fn empty() -> Self {
        Args {
            keywords: Vec::new(),
            proxies: Vec::new(),
            search_type: None,
            concurrency: DEFAULT_MAX_PARALLEL,
            timeout: DEFAULT_TASK_TIMEOUT.as_secs(),
            base_url: GITHUB_HOST.to_string(),
            output: None,
            progress: false,
        }
    }

    /// True when every value the crawl needs came from the command line.
    pub fn is_complete(&self) -> bool {
        !self.keywords.is_empty() && !self.proxies.is_empty() && self.search_type.is_some()
    }

    /// Fill whatever is missing by prompting on `reader`/`writer`.
    pub fn resolve_input<R: BufRead, W: Write>(&self, reader: &mut R, writer: &mut W) -> Result<RawInput> {
        let keywords = if self.keywords.is_empty() {
            split_tokens(&prompt(reader, writer, "Enter keywords (separated by space): ")?)
        } else {
            self.keywords.clone()
        };
        let proxies = if self.proxies.is_empty() {
            split_tokens(&prompt(reader, writer, "Enter proxies (separated by space): ")?)
        } else {
            self.proxies.clone()
        };
        let search_type = match self.search_type {
            Some(search_type) => search_type,
            None => prompt(
                reader,
                writer,
                &format!("Enter search type (Options: {}): ", SearchType::options()),
            )?
            .trim()
            .parse()?,
        };

        if keywords.is_empty() {
            return Err(CrawlerError::Config("at least one keyword is required".into()));
        }

        Ok(RawInput {
            keywords,
            proxies,
            search_type,
        })
    }

    /// Crawler settings from these arguments and the resolved proxies.
    pub fn config(&self, input: &RawInput) -> Result<CrawlerConfig> {
        let config = CrawlerConfig::new(ProxyPool::new(input.proxies.iter().cloned())?)
            .with_base_url(self.base_url.clone())
            .with_max_parallel(self.concurrency)
            .with_task_timeout(Duration::from_secs(self.timeout))
            .with_progress(self.progress);
        config.validate()?;
        Ok(config)
    }
}

/// Read all three inputs interactively.
pub fn read_input<R: BufRead, W: Write>(reader: &mut R, writer: &mut W) -> Result<RawInput> {
    Args::empty().resolve_input(reader, writer)
}

impl RawInput {
    pub fn query(&self) -> SearchQuery {
        SearchQuery::new(self.keywords.clone(), self.search_type)
    }
}

fn prompt<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, message: &str) -> Result<String> {
    write!(writer, "{message}")?;
    writer.flush()?;
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line)
}

fn split_tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn interactive_input_valid() {
        let mut reader = Cursor::new("keyword1 keyword2\nproxy1 proxy2\nRepositories\n");
        let mut prompts = Vec::<u8>::new();

        let input = read_input(&mut reader, &mut prompts).unwrap();

        assert_eq!(
            input,
            RawInput {
                keywords: vec!["keyword1".into(), "keyword2".into()],
                proxies: vec!["proxy1".into(), "proxy2".into()],
                search_type: SearchType::Repositories,
            }
        );
        let prompts = String::from_utf8(prompts).unwrap();
        assert!(prompts.contains("Enter keywords (separated by space): "));
        assert!(prompts.contains("Options: Repositories, Issues, Wikis"));
    }

    #[test]
    fn interactive_input_invalid_type() {
        let mut reader = Cursor::new("keyword1 keyword2\nproxy1 proxy2\nInvalidType\n");
        let err = read_input(&mut reader, &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, CrawlerError::Config(_)));
        assert!(err.to_string().contains("Invalid search type: InvalidType"));
    }

    #[test]
    fn command_line_values_skip_prompts() {
        let args = Args::parse_from([
            "github-crawler",
            "-k",
            "openstack",
            "nova",
            "-p",
            "194.126.37.94:8080",
            "-t",
            "Issues",
        ]);
        assert!(args.is_complete());

        let mut reader = Cursor::new("");
        let mut prompts = Vec::<u8>::new();
        let input = args.resolve_input(&mut reader, &mut prompts).unwrap();

        assert!(prompts.is_empty());
        assert_eq!(input.query().query_string(), "openstack+nova");
        assert_eq!(input.search_type, SearchType::Issues);
    }

    #[test]
    fn partial_arguments_prompt_for_the_rest() {
        let args = Args::parse_from(["github-crawler", "-t", "Wikis", "-k", "css"]);
        let mut reader = Cursor::new("10.0.0.1:3128\n");
        let mut prompts = Vec::<u8>::new();

        let input = args.resolve_input(&mut reader, &mut prompts).unwrap();

        assert_eq!(input.proxies, vec!["10.0.0.1:3128".to_string()]);
        assert_eq!(
            String::from_utf8(prompts).unwrap(),
            "Enter proxies (separated by space): "
        );
    }

    #[test]
    fn invalid_type_flag_is_rejected_by_clap() {
        let parsed = Args::try_parse_from(["github-crawler", "-t", "Code"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn empty_proxies_are_a_config_error() {
        let args = Args::parse_from(["github-crawler", "-k", "rust", "-t", "Repositories"]);
        let input = args
            .resolve_input(&mut Cursor::new("\n"), &mut Vec::<u8>::new())
            .unwrap();
        assert!(matches!(args.config(&input), Err(CrawlerError::Config(_))));
    }

    #[test]
    fn config_carries_flags() {
        let args = Args::parse_from([
            "github-crawler",
            "-k",
            "rust",
            "-p",
            "127.0.0.1:8080",
            "-t",
            "Repositories",
            "-c",
            "2",
            "--timeout",
            "7",
        ]);
        let input = args.resolve_input(&mut Cursor::new(""), &mut Vec::<u8>::new()).unwrap();
        let config = args.config(&input).unwrap();
        assert_eq!(config.max_parallel, 2);
        assert_eq!(config.task_timeout, Duration::from_secs(7));
        assert_eq!(config.proxies.len(), 1);
    }

    #[test]
    fn base_url_comes_only_from_the_flag() {
        std::env::set_var("GITHUB_CRAWLER_BASE_URL", "http://elsewhere.invalid");
        let args = Args::parse_from(["github-crawler", "-k", "rust"]);
        assert_eq!(args.base_url, GITHUB_HOST);

        let args = Args::parse_from(["github-crawler", "--base-url", "http://localhost:9000/"]);
        let input = args
            .resolve_input(&mut Cursor::new("rust\n127.0.0.1:8080\nRepositories\n"), &mut Vec::<u8>::new())
            .unwrap();
        assert_eq!(args.config(&input).unwrap().base_url, "http://localhost:9000");
    }
}
