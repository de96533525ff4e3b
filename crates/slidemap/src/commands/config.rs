use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = match Config::load_from(&path) {
        Ok(config) => {
            println!("{} {}", "Config file:".bold(), path.display());
            config
        }
        Err(_) => {
            println!(
                "{} {} {}",
                "Config file:".bold(),
                path.display(),
                "(not created yet)".dimmed()
            );
            Config::default()
        }
    };

    println!();
    println!("{}", "Effective settings".bold());
    let rows = [
        ("defaults.theme", config.theme().to_string()),
        (
            "defaults.source",
            config.source().unwrap_or("(none)").to_string(),
        ),
        ("defaults.slide_count", config.slide_count().to_string()),
        (
            "defaults.map_slide",
            config
                .map_slide()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(detect id=\"map\")".to_string()),
        ),
        ("defaults.backend", config.backend().to_string()),
        ("map.tile_url", display_tile_url(config.tile_url())),
        ("map.geocoder_url", config.geocoder_url().to_string()),
        (
            "map.reveal_delay_ms",
            config.reveal_delay().as_millis().to_string(),
        ),
        ("input.swipe_threshold", config.swipe_threshold().to_string()),
        (
            "autoplay.delay_secs",
            config.autoplay_delay().as_secs().to_string(),
        ),
    ];
    for (key, value) in rows {
        println!("  {:<24} {}", key.cyan(), value);
    }

    let yaml = serde_yaml::to_string(&config)?;
    if yaml.trim() != "{}" {
        println!();
        println!("{}", "File contents".bold());
        print!("{yaml}");
    }
    Ok(())
}

fn display_tile_url(url: &str) -> String {
    if url.is_empty() {
        "(tiles disabled)".to_string()
    } else {
        url.to_string()
    }
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {} = {} ({})",
        "Saved".green().bold(),
        key,
        value,
        path.display()
    );
    Ok(())
}
