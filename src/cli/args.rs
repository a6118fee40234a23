use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "artselect",
    version,
    about = "paginated artwork catalog browser with cross-page selection",
    long_about = "artselect pages through the Art Institute of Chicago artwork catalog and keeps a row selection that survives page navigation.\n\nExamples:\n  artselect\n  artselect --page-size 25 --strategy fetch\n  artselect --config ~/.artselect/config.yml\n\nType `help` inside the shell for the list of commands."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.artselect/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a default config file if none exists, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'a',
        long = "api",
        visible_alias = "api-url",
        value_name = "URL",
        help_heading = "Catalog",
        help = "Artworks endpoint (defaults to https://api.artic.edu/api/v1/artworks)."
    )]
    pub api_url: Option<String>,

    #[arg(
        short = 'r',
        long = "ps",
        visible_alias = "page-size",
        value_name = "ROWS",
        help_heading = "Catalog",
        help = "Rows per page (1-100)."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 'p',
        long = "page",
        value_name = "N",
        help_heading = "Catalog",
        help = "Page to open on start."
    )]
    pub start_page: Option<u32>,

    #[arg(
        short = 's',
        long = "st",
        visible_alias = "strategy",
        value_name = "fetch|dense",
        help_heading = "Selection",
        help = "Bulk selection strategy: fetch real ids page by page, or assume dense ids."
    )]
    pub strategy: Option<String>,

    #[arg(
        short = 'x',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,
}
