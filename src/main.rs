use std::path::PathBuf;
use std::process::ExitCode;

use rabbit_shooter::app;
use rabbit_shooter::config::GameConfig;
use rabbit_shooter::error::Result;
use rabbit_shooter::level::JsonLevelProvider;
use rabbit_shooter::sprites::TerminalSprites;

// ── Entry point ───────────────────────────────────────────────────────────────

/// Usage: `rabbit_shooter [config.json]`.  Logs go to stderr; set
/// `RUST_LOG=info` and redirect with `2>game.log` to keep them off the
/// playfield.
fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match start() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("rabbit_shooter: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn start() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = GameConfig::load(config_path.as_deref())?;

    let levels = JsonLevelProvider::new(config.assets.base_path.clone());
    let sprites = TerminalSprites::new(
        config.display.cell_width as u32,
        config.display.cell_height as u32,
        config.display.tile_size as u32,
    );
    app::run(config, &levels, &sprites)
}
