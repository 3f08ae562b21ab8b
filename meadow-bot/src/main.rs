mod browser;
mod console;
mod scheduler;
mod settings;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thirtyfour::WebDriver;
use tokio::io::{AsyncBufReadExt, BufReader};

use browser::{BrowserConfig, BrowserKind, DomSurface, LocalStorageStore, new_session};
use console::{Command, CommandError, ConsoleSink, print_help};
use meadow_core::{Bot, BotConfig, BotState, KeyValueStore, Surface};
use scheduler::IntervalScheduler;
use settings::Settings;
use util::parse_item_ids;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HeadlessMode {
    /// Run the browser without a window
    Headless,
    /// Run the browser with a visible window
    Windowed,
}

impl HeadlessMode {
    const fn is_headless(self) -> bool {
        matches!(self, Self::Headless)
    }
}

#[derive(Debug, Parser)]
#[command(name = "meadow-bot", version)]
#[command(about = "Plays The Last Meadow in a real browser: clicks, collects, and buys the best value")]
struct Args {
    /// URL of the page hosting the game
    #[arg(long, required_unless_present = "print_config")]
    url: Option<String>,

    /// Browser to drive
    #[arg(long, value_enum, default_value_t = BrowserKind::Chrome)]
    browser: BrowserKind,

    /// Run headless where supported
    #[arg(long, value_enum, default_value_t = HeadlessMode::Windowed)]
    headless: HeadlessMode,

    /// Connect to a Selenium Grid/Appium hub instead of local drivers
    #[arg(long)]
    hub: Option<String>,

    /// JSON config file (bot options and an optional `selectors` section)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Milliseconds between clicks
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    click_interval: Option<u64>,

    /// Priority item ids, most wanted first (comma-separated)
    #[arg(long)]
    priority: Option<String>,

    /// Save for and buy the final item
    #[arg(long)]
    finish: bool,

    /// Log every action at info level
    #[arg(long)]
    debug: bool,

    /// Seed for the upgrade patch dice
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Wait for `start` instead of starting immediately
    #[arg(long)]
    no_autostart: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = build_settings(&args)?;
    if args.print_config {
        let mut out = std::io::stdout();
        writeln!(out, "{}", serde_json::to_string_pretty(&settings)?)?;
        return Ok(());
    }

    announce_banner();

    let url = args.url.clone().context("--url is required")?;
    let driver = new_session(args.browser, &build_browser_config(&args))
        .await
        .with_context(|| format!("starting {} session", browser_label(args.browser)))?;

    let outcome = run(&args, &url, settings, &driver).await;
    if let Err(err) = driver.quit().await {
        warn!("closing browser session failed: {err}");
    }
    outcome
}

fn announce_banner() {
    println!("{}", "🌱 The Last Meadow Bot".bright_green().bold());
    println!("{}", "======================".green());
}

fn build_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Settings::default(),
    };
    apply_overrides(&mut settings.bot, args)?;
    settings.bot.validate().context("validating config")?;
    Ok(settings)
}

fn apply_overrides(config: &mut BotConfig, args: &Args) -> Result<()> {
    if let Some(interval) = args.click_interval {
        config.click_interval = interval;
    }
    if let Some(priority) = &args.priority {
        config.priority_items = parse_item_ids(priority)
            .map_err(anyhow::Error::msg)
            .context("parsing --priority")?;
    }
    if args.finish {
        config.finish_game = true;
    }
    if args.debug {
        config.debug_mode = true;
    }
    Ok(())
}

fn build_browser_config(args: &Args) -> BrowserConfig {
    BrowserConfig {
        headless: args.headless.is_headless(),
        remote_hub: args.hub.clone(),
        ..BrowserConfig::default()
    }
}

fn browser_label(kind: BrowserKind) -> String {
    format!("{kind:?}").to_lowercase()
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default()
    })
}

async fn run(args: &Args, url: &str, settings: Settings, driver: &WebDriver) -> Result<()> {
    driver.goto(url).await.with_context(|| format!("opening {url}"))?;
    let store = LocalStorageStore::new(driver);
    store
        .install_hook()
        .await
        .context("installing store write hook")?;
    let surface = DomSurface::new(driver, settings.selectors);

    let seed = resolve_seed(args.seed);
    info!("🎲 Upgrade dice seed: {seed}");
    let mut bot = Bot::new(surface, store, settings.bot, ConsoleSink::stdout(), seed);
    let mut scheduler = IntervalScheduler::new();

    if !args.no_autostart {
        bot.start(&mut scheduler).await;
    }
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            task = scheduler.next() => bot.on_tick(task).await,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if handle_line(&line, &mut bot, &mut scheduler).await == Flow::Quit {
                        break;
                    }
                }
                Ok(None) => stdin_open = false,
                Err(err) => {
                    warn!("reading console input failed: {err}");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => break,
        }
    }

    if bot.state() == BotState::Running {
        bot.stop(&mut scheduler);
    }
    Ok(())
}

async fn handle_line<S, K>(
    line: &str,
    bot: &mut Bot<S, K, ConsoleSink<std::io::Stdout>>,
    scheduler: &mut IntervalScheduler,
) -> Flow
where
    S: Surface,
    K: KeyValueStore,
{
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(CommandError::Empty) => return Flow::Continue,
        Err(err) => {
            eprintln!("⚠️  {}", err.to_string().yellow());
            return Flow::Continue;
        }
    };
    match command {
        Command::Start => bot.start(scheduler).await,
        Command::Stop => bot.stop(scheduler),
        Command::Status => bot.status().await,
        Command::Upgrade => {
            if !bot.upgrade_now().await {
                println!("Nothing to upgrade");
            }
        }
        Command::AutoUpgrade => {
            bot.toggle_upgrade_auto();
        }
        Command::Toggle(name) => {
            bot.toggle_option(&name);
        }
        Command::Interval(raw) => {
            bot.set_click_interval(&raw, scheduler);
        }
        Command::Help => print_help(),
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            url: Some("http://localhost:5173/".to_string()),
            browser: BrowserKind::Chrome,
            headless: HeadlessMode::Windowed,
            hub: None,
            config: None,
            click_interval: None,
            priority: None,
            finish: false,
            debug: false,
            seed: None,
            print_config: false,
            no_autostart: false,
        }
    }

    #[test]
    fn cli_overrides_config_defaults() {
        let mut args = base_args();
        args.click_interval = Some(25);
        args.priority = Some("3, 1".to_string());
        args.finish = true;
        args.debug = true;
        let settings = build_settings(&args).unwrap();
        assert_eq!(settings.bot.click_interval, 25);
        assert_eq!(settings.bot.priority_items, vec![3, 1]);
        assert!(settings.bot.finish_game);
        assert!(settings.bot.debug_mode);
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let settings = build_settings(&base_args()).unwrap();
        assert_eq!(settings.bot, BotConfig::default());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let mut args = base_args();
        args.config = Some(PathBuf::from("/nonexistent/meadow-bot.json"));
        let err = build_settings(&args).unwrap_err();
        assert!(format!("{err:#}").contains("loading config"));
    }

    #[test]
    fn browser_config_follows_flags() {
        let mut args = base_args();
        args.headless = HeadlessMode::Headless;
        args.hub = Some("http://grid:4444".to_string());
        let cfg = build_browser_config(&args);
        assert!(cfg.headless);
        assert_eq!(cfg.remote_hub.as_deref(), Some("http://grid:4444"));
        assert_eq!(cfg.implicit_wait_millis, 0);
    }

    #[test]
    fn explicit_seed_wins() {
        assert_eq!(resolve_seed(Some(7)), 7);
        assert_eq!(browser_label(BrowserKind::Firefox), "firefox");
    }

    #[test]
    fn bad_priority_list_is_an_error() {
        let mut args = base_args();
        args.priority = Some("26,abc".to_string());
        let err = build_settings(&args).unwrap_err();
        assert!(format!("{err:#}").contains("invalid item id `abc`"));
    }

    #[test]
    fn print_config_needs_no_url() {
        let args = Args::try_parse_from(["meadow-bot", "--print-config", "--priority", "26,18"])
            .unwrap();
        assert_eq!(args.priority.as_deref(), Some("26,18"));
        assert!(args.url.is_none());
    }

    #[test]
    fn url_is_required_to_play() {
        assert!(Args::try_parse_from(["meadow-bot"]).is_err());
    }
}
