//! Operator console: command parsing and the colored report sink.
use std::io::Write;
use std::str::FromStr;

use chrono::Local;
use colored::Colorize;
use thiserror::Error;

use meadow_core::{FinalStatus, FinalSummary, ReportSink, StatusReport, format_runtime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Status,
    /// Run the upgrade patch once.
    Upgrade,
    /// Flip `autoUpgrade`.
    AutoUpgrade,
    Toggle(String),
    Interval(String),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (type `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandError::Empty);
        };
        let argument = words.next().map(str::to_string);
        match head.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            "upgrade" => Ok(Self::Upgrade),
            "auto-upgrade" | "toggleupgradeauto" => Ok(Self::AutoUpgrade),
            "toggle" | "toggleconfigoption" => argument
                .map(Self::Toggle)
                .ok_or(CommandError::MissingArgument("toggle")),
            "interval" | "setclickinterval" => argument
                .map(Self::Interval)
                .ok_or(CommandError::MissingArgument("interval")),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(CommandError::Unknown(head.to_string())),
        }
    }
}

pub const HELP: &[(&str, &str)] = &[
    ("start", "start (or restart) the bot"),
    ("stop", "stop the bot and print a summary"),
    ("status", "print a status report now"),
    ("upgrade", "patch item upgrades once"),
    ("auto-upgrade", "toggle random upgrade patching"),
    ("toggle <option>", "flip a boolean option, e.g. finishGame"),
    ("interval <ms>", "set the click interval"),
    ("quit", "stop and exit"),
];

pub fn print_help() {
    println!("{}", "Commands:".bright_cyan().bold());
    for (command, description) in HELP {
        println!("  {command:18} {description}");
    }
}

fn stamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Plain-text lines of a status report.
#[must_use]
pub fn status_lines(report: &StatusReport) -> Vec<String> {
    let mut lines = vec![
        format!("Runtime: {}", report.runtime_label()),
        format!(
            "Points: {} ({:.1}/s)",
            report.points, report.points_per_second
        ),
        format!(
            "Clicks: {} ({:.1}/s)",
            report.total_clicks, report.clicks_per_second
        ),
        format!("Level: {}", report.current_level),
        format!(
            "Rewards: {} | Lootboxes: {} | Weeds: {} | Lawnmowers avoided: {}",
            report.level_rewards_claimed,
            report.lootboxes_collected,
            report.weeds_removed,
            report.lawnmowers_avoided
        ),
        format!(
            "Purchases: {} | Offers enabled: {}/{}",
            report.purchases, report.offers_enabled, report.offers_total
        ),
    ];
    match &report.next_purchase {
        Some(offer) => lines.push(format!("Next purchase: {} ({})", offer.label, offer.cost)),
        None => lines.push("Next purchase: none".to_string()),
    }
    match &report.final_status {
        FinalStatus::NotSeen => {}
        FinalStatus::Affordable { cost } => {
            lines.push(format!("Final item: affordable ({cost})"));
        }
        FinalStatus::Saving { cost, eta } => lines.push(match eta {
            Some(eta) => format!("Final item: {cost}, ETA {}", format_runtime(*eta)),
            None => format!("Final item: {cost}, ETA unknown"),
        }),
    }
    if !report.active_flags.is_empty() {
        lines.push(format!("Active: {}", report.active_flags.join(", ")));
    }
    lines
}

#[must_use]
pub fn summary_lines(summary: &FinalSummary) -> Vec<String> {
    vec![
        format!("Runtime: {}", format_runtime(summary.runtime)),
        format!("Clicks: {}", summary.total_clicks),
        format!("Purchases: {}", summary.purchases),
        format!("Level rewards claimed: {}", summary.level_rewards_claimed),
        format!("Lootboxes collected: {}", summary.lootboxes_collected),
        format!("Weeds removed: {}", summary.weeds_removed),
        format!("Lawnmowers avoided: {}", summary.lawnmowers_avoided),
        format!(
            "State patches: {} upgrade, {} unstick",
            summary.upgrade_patches, summary.unstick_patches
        ),
    ]
}

/// Writes reports to a terminal (or anything else that is [`Write`]).
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn emit(&mut self, heading: String, lines: &[String]) {
        let mut text = format!("{heading}\n");
        for line in lines {
            text.push_str("   ");
            text.push_str(line);
            text.push('\n');
        }
        // A closed terminal is not worth stopping the bot for.
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

#[cfg(test)]
impl<W> ConsoleSink<W> {
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn status(&mut self, report: &StatusReport) {
        let heading = format!("{} {}", stamp().dimmed(), "🌱 Status".bright_green().bold());
        self.emit(heading, &status_lines(report));
    }

    fn summary(&mut self, summary: &FinalSummary) {
        let heading = format!("{} {}", stamp().dimmed(), "📊 Session summary".bright_cyan().bold());
        self.emit(heading, &summary_lines(summary));
    }

    fn notice(&mut self, message: &str) {
        let heading = format!("{} {}", stamp().dimmed(), message.yellow());
        self.emit(heading, &[]);
    }
}
