#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;

use clap::Parser;
use esp8266_skill::{
    debug, error,
    logging::{LogConfig, SYSTEM_CONFIG},
    skills::esp8266::{ACTION_KEYWORD, COMMAND_KEYWORD, MODULE_KEYWORD},
    warning, Esp8266Skill, Message, SkillHost, TemplateDialog,
};

/// Send one spoken-style command to the ESP8266 board.
#[derive(Parser, Debug)]
#[command(name = "esp8266-skill", version)]
struct Cli {
    /// Module on the board, e.g. "led 0"
    #[arg(short, long)]
    module: String,

    /// Command keyword, e.g. "turn"
    #[arg(short, long)]
    command: String,

    /// Optional action keyword, e.g. "on"
    #[arg(short, long)]
    action: Option<String>,

    /// Config file providing `log_level`
    #[arg(long, default_value = SYSTEM_CONFIG)]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Logging startup
    {
        let config = LogConfig::load(&cli.config);
        if let Err(e) = config.install() {
            eprintln!("{e}");
        }
        debug!("Starting up with {config:?}.");
    }

    let skill = match Esp8266Skill::new() {
        Ok(skill) => skill,
        Err(e) => {
            error!("Could not start the skill: {e}");
            return;
        }
    };

    let mut host = SkillHost::new();
    host.load(Box::new(skill));

    let mut message = Message::utterance()
        .with_keyword(MODULE_KEYWORD, cli.module)
        .with_keyword(COMMAND_KEYWORD, cli.command);
    if let Some(action) = cli.action {
        message = message.with_keyword(ACTION_KEYWORD, action);
    }

    let mut dialog = TemplateDialog::stdout();
    if !host.dispatch(&message, &mut dialog) {
        warning!("Nothing handled {message:?}");
    }

    host.stop();
}
