use std::collections::HashSet;
use std::future::Future;
use std::io::Write;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::catalog::{ClientOptions, HttpPageFetcher, PageFetcher, Record, RecordId};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::controller::{ControllerError, NavigationOutcome, SelectStrategy, SelectionController};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Page(u32),
    Next,
    Prev,
    /// Full list of checked rows on the visible page.
    Toggle(HashSet<RecordId>),
    Check(RecordId),
    Uncheck(RecordId),
    Select(i64),
    Clear,
    Selected,
    Help,
    Quit,
    Empty,
}

fn parse_id_list(raw: &str) -> Result<HashSet<RecordId>, String> {
    let mut out = HashSet::new();
    for item in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let item = item.trim();
        if item.is_empty() || item.eq_ignore_ascii_case("none") {
            continue;
        }
        let id = item
            .parse::<RecordId>()
            .map_err(|_| format!("invalid id '{item}'"))?;
        out.insert(id);
    }
    Ok(out)
}

fn parse_one<T: std::str::FromStr>(arg: &str, what: &str) -> Result<T, String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(format!("missing {what}"));
    }
    arg.parse::<T>()
        .map_err(|_| format!("invalid {what} '{arg}'"))
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head.to_lowercase().as_str() {
        "" => Ok(Command::Empty),
        "page" | "p" | "goto" => Ok(Command::Page(parse_one(rest, "page number")?)),
        "next" | "n" => Ok(Command::Next),
        "prev" | "previous" => Ok(Command::Prev),
        "toggle" | "t" => Ok(Command::Toggle(parse_id_list(rest)?)),
        "check" => Ok(Command::Check(parse_one(rest, "id")?)),
        "uncheck" => Ok(Command::Uncheck(parse_one(rest, "id")?)),
        "select" | "s" => Ok(Command::Select(parse_one(rest, "row count")?)),
        "clear" => Ok(Command::Clear),
        "selected" | "ls" => Ok(Command::Selected),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}', type `help`")),
    }
}

const SHELL_HELP: &str = "Commands:
  page N          open page N
  next, prev      move one page forward or back
  toggle ID,...   set the checked rows of this page (omit ids to uncheck all)
  check ID        check one row on this page
  uncheck ID      uncheck one row on this page
  select N        select the first N rows of the catalog
  clear           clear the selection
  selected        list every selected id
  quit            leave";

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub client: ClientOptions,
    pub strategy: SelectStrategy,
    pub start_page: u32,
    pub no_color: bool,
    pub verbose: u8,
}

pub fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let defaults = ClientOptions::default();
    let page_size = args.page_size.or(cfg.page_size).unwrap_or(defaults.page_size);
    if page_size == 0 || page_size > crate::catalog::client::MAX_PAGE_SIZE {
        return Err(format!("invalid page_size {page_size} in config"));
    }
    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(defaults.timeout_seconds);
    if timeout_seconds == 0 {
        return Err("invalid timeout 0 in config".to_string());
    }
    let strategy_raw = args
        .strategy
        .or(cfg.strategy)
        .unwrap_or_else(|| SelectStrategy::default().label().to_string());
    let strategy = SelectStrategy::parse(&strategy_raw)
        .ok_or_else(|| format!("invalid strategy '{strategy_raw}', expected fetch or dense"))?;

    Ok(RunConfig {
        client: ClientOptions {
            api_url: args.api_url.or(cfg.api_url).unwrap_or(defaults.api_url),
            page_size,
            timeout_seconds,
            proxy: args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty()),
        },
        strategy,
        start_page: args.start_page.unwrap_or(1),
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        verbose: args.verbose,
    })
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn format_dates(record: &Record) -> String {
    match (record.date_start, record.date_end) {
        (Some(start), Some(end)) if start == end => start.to_string(),
        (Some(start), Some(end)) => format!("{start}-{end}"),
        (Some(start), None) => start.to_string(),
        (None, Some(end)) => end.to_string(),
        (None, None) => "-".to_string(),
    }
}

pub fn render_row(record: &Record, checked: bool) -> String {
    let mark = if checked { "[x]" } else { "[ ]" };
    format!(
        "{} {:>7}  {:<40}  {:<16}  {:<28}  {}",
        mark,
        record.id,
        truncate(&record.title, 40),
        truncate(record.origin_place.as_deref().unwrap_or("-"), 16),
        truncate(
            record
                .artist_display
                .as_deref()
                .unwrap_or("-")
                .lines()
                .next()
                .unwrap_or("-"),
            28
        ),
        format_dates(record)
    )
}

fn render_page<F: PageFetcher>(controller: &SelectionController<F>) {
    let view = controller.view_state();
    let page = controller.current_page();
    println!();
    println!(
        ":: {} {}/{}  ({} records)",
        "page".bold(),
        view.current_page,
        view.total_pages().max(1),
        view.total_records
    );
    if page.records.is_empty() {
        println!("   (no rows)");
    }
    for record in page.records.iter() {
        let line = render_row(record, controller.is_selected(record.id));
        if controller.is_selected(record.id) {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }
    println!(
        ":: Selected: {} rows",
        controller.selected_count().to_string().bold()
    );
}

async fn with_spinner<T>(message: &str, fut: impl Future<Output = T>) -> T {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    pb.finish_and_clear();
    out
}

fn report_error(err: &ControllerError) {
    println!("{} {}", "error:".red().bold(), err);
}

async fn navigate<F: PageFetcher>(controller: &SelectionController<F>, page: u32) {
    let label = format!("loading page {page}");
    match with_spinner(&label, controller.navigate_to(page)).await {
        Ok(NavigationOutcome::Applied) => render_page(controller),
        Ok(NavigationOutcome::Stale) => {}
        Err(err) => report_error(&err),
    }
}

/// Applies one shell command. Returns `false` when the shell should exit.
pub async fn execute<F: PageFetcher>(controller: &SelectionController<F>, command: Command) -> bool {
    match command {
        Command::Empty => {}
        Command::Help => println!("{SHELL_HELP}"),
        Command::Quit => return false,
        Command::Page(page) => navigate(controller, page).await,
        Command::Next => {
            let view = controller.view_state();
            if u64::from(view.current_page) >= view.total_pages() {
                println!("already on the last page");
            } else {
                navigate(controller, view.current_page + 1).await;
            }
        }
        Command::Prev => {
            let view = controller.view_state();
            if view.current_page <= 1 {
                println!("already on the first page");
            } else {
                navigate(controller, view.current_page - 1).await;
            }
        }
        Command::Toggle(checked) => {
            controller.toggle_rows_on_current_page(&checked, &HashSet::new());
            render_page(controller);
        }
        Command::Check(id) => {
            let mut checked: HashSet<RecordId> =
                controller.visible_selection().iter().map(|r| r.id).collect();
            checked.insert(id);
            controller.toggle_rows_on_current_page(&checked, &HashSet::new());
            render_page(controller);
        }
        Command::Uncheck(id) => {
            let mut checked: HashSet<RecordId> =
                controller.visible_selection().iter().map(|r| r.id).collect();
            checked.remove(&id);
            controller.toggle_rows_on_current_page(&checked, &HashSet::from([id]));
            render_page(controller);
        }
        Command::Select(n) => {
            let total = controller.view_state().total_records;
            let label = format!("selecting first {n} rows");
            match with_spinner(&label, controller.select_first_n(n, total)).await {
                Ok(0) => println!("nothing to select"),
                Ok(_) => render_page(controller),
                Err(err) => report_error(&err),
            }
        }
        Command::Clear => {
            controller.clear_selection();
            render_page(controller);
        }
        Command::Selected => {
            let ids = controller.selected_ids();
            if ids.is_empty() {
                println!("no rows selected");
            } else {
                let listed: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                println!("{} selected: {}", ids.len(), listed.join(","));
            }
        }
    }
    true
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let fetcher = HttpPageFetcher::new(&run.client).map_err(|e| e.to_string())?;
    tracing::debug!(
        api_url = %fetcher.api_url(),
        page_size = run.client.page_size,
        strategy = run.strategy.label(),
        "starting shell"
    );
    let controller = SelectionController::with_strategy(fetcher, run.strategy);

    println!("{}", "artselect - Art Institute catalog".bold());
    println!("type `help` for commands");
    navigate(&controller, run.start_page).await;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(format!("failed to read input: {e}")),
        };
        match parse_command(&line) {
            Ok(command) => {
                if !execute(&controller, command).await {
                    break;
                }
            }
            Err(message) => println!("{} {}", "error:".red().bold(), message),
        }
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let explicit_config = args.config.clone().map(|p| config::expand_tilde(&p));
    let config_path = explicit_config.clone().or_else(config::default_config_path);
    if args.init_config {
        let path = config_path.ok_or_else(|| "could not determine home directory".to_string())?;
        config::ensure_default_config_file(&path)?;
        println!("config: {}", path.display());
        return Ok(());
    }
    let cfg = match (explicit_config.as_ref(), config_path.as_ref()) {
        (Some(path), _) => config::load_config(path, false)?,
        (None, Some(path)) => config::load_config(path, true)?,
        (None, None) => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;
    if run.no_color {
        colored::control::set_override(false);
    }
    crate::logging::init_logging(run.verbose, run.no_color)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;
    rt.block_on(run_async(run))
}
