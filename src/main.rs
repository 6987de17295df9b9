mod app;
mod mod_config;
mod noita;
mod presets;
mod registry;
mod settings;
mod shared_config;

use anyhow::Result;
use app::{App, LogLevel};
use noita::PathKind;

enum Command {
    Status,
    List,
    Toggle { uid: String, value: bool },
    Reorder { uids: Vec<String> },
    Presets,
    SavePreset { name: String },
    ApplyPreset { name: String },
    DeletePreset { name: String },
    SetPath { kind: PathKind, value: String },
    Paths,
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1).peekable();
    let mut command = Command::Status;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--list" | "-l" => command = Command::List,
            "--enable" | "-e" => {
                let Some(uid) = args.next() else {
                    eprintln!("--enable requires a mod uid");
                    return Ok(());
                };
                command = Command::Toggle { uid, value: true };
            }
            "--disable" | "-d" => {
                let Some(uid) = args.next() else {
                    eprintln!("--disable requires a mod uid");
                    return Ok(());
                };
                command = Command::Toggle { uid, value: false };
            }
            "--reorder" => {
                let Some(raw) = args.next() else {
                    eprintln!("--reorder requires a comma-separated uid list");
                    return Ok(());
                };
                let uids = raw
                    .split(',')
                    .map(|uid| uid.trim().to_string())
                    .filter(|uid| !uid.is_empty())
                    .collect();
                command = Command::Reorder { uids };
            }
            "--presets" => command = Command::Presets,
            "--save-preset" => {
                let Some(name) = args.next() else {
                    eprintln!("--save-preset requires a preset name");
                    return Ok(());
                };
                command = Command::SavePreset { name };
            }
            "--apply-preset" => {
                let Some(name) = args.next() else {
                    eprintln!("--apply-preset requires a preset name");
                    return Ok(());
                };
                command = Command::ApplyPreset { name };
            }
            "--delete-preset" => {
                let Some(name) = args.next() else {
                    eprintln!("--delete-preset requires a preset name");
                    return Ok(());
                };
                command = Command::DeletePreset { name };
            }
            "--set-path" => {
                let (Some(key), Some(value)) = (args.next(), args.next()) else {
                    eprintln!("--set-path requires a key (noita_root, noita_save, steam_root) and a value");
                    return Ok(());
                };
                let Some(kind) = PathKind::from_key(&key) else {
                    eprintln!("unknown path key: {key}");
                    return Ok(());
                };
                command = Command::SetPath { kind, value };
            }
            "--paths" => command = Command::Paths,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            _ => {
                eprintln!("unknown argument: {arg} (try --help)");
                return Ok(());
            }
        }
    }

    let mut app = App::initialize()?;
    let result = run(&mut app, command);
    if let Err(err) = &result {
        app.log_error(format!("{err:#}"));
    }
    flush_logs(&app);
    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_usage() {
    println!("WandSmith, a {} mod manager", noita::GAME_NAME);
    println!("  --list                    Show the current mod order");
    println!("  --enable <uid>            Enable one mod and save");
    println!("  --disable <uid>           Disable one mod and save");
    println!("  --reorder <uid,uid,...>   Replace the mod order and save");
    println!("  --presets                 List saved presets");
    println!("  --save-preset <name>      Snapshot enabled mods as a preset");
    println!("  --apply-preset <name>     Enable exactly a preset's mods and save");
    println!("  --delete-preset <name>    Remove a preset");
    println!("  --set-path <key> <value>  Set noita_root, noita_save or steam_root");
    println!("  --paths                   Show configured paths");
}

fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            println!("settings: {}", app.settings_path().display());
            println!(
                "paths: {}",
                if app.paths_complete() {
                    "complete"
                } else {
                    "incomplete (see --paths)"
                }
            );
            println!("presets: {}", app.settings.presets.len());
            if app.paths_complete() {
                app.load_all()?;
                println!("mods: {}", app.registry.len());
            }
        }
        Command::List => {
            app.load_all()?;
            for record in app.registry.sorted_view() {
                let mark = if record.enabled { "x" } else { " " };
                let workshop = match noita::workshop_url(record.workshop_item_id) {
                    Some(url) => format!("  ({url})"),
                    None => String::new(),
                };
                println!(
                    "{:03} [{mark}] {}  {}{workshop}",
                    record.order + 1,
                    record.uid(),
                    record.display_name,
                );
            }
        }
        Command::Toggle { uid, value } => {
            app.load_all()?;
            app.registry.toggle_enabled(&uid, value)?;
            app.save_all()?;
            println!("{} {}", if value { "enabled" } else { "disabled" }, uid);
        }
        Command::Reorder { uids } => {
            app.load_all()?;
            app.registry.reorder(&uids)?;
            app.save_all()?;
            println!("reordered {} mods", uids.len());
        }
        Command::Presets => {
            for name in app.presets().list() {
                println!("{name}");
            }
        }
        Command::SavePreset { name } => {
            app.load_all()?;
            app.save_preset(&name)?;
            println!("saved preset {name}");
        }
        Command::ApplyPreset { name } => {
            app.load_all()?;
            app.apply_preset(&name)?;
            app.save_all()?;
            println!("applied preset {name}");
        }
        Command::DeletePreset { name } => {
            if app.delete_preset(&name)? {
                println!("deleted preset {name}");
            } else {
                println!("no preset named {name}");
            }
        }
        Command::SetPath { kind, value } => {
            app.set_path(kind, &value)?;
            println!("{} = {value}", kind.key());
        }
        Command::Paths => {
            for kind in PathKind::ALL {
                let value = app.settings.paths.get(kind);
                let state = if noita::is_path_complete(kind, value) {
                    "ok"
                } else {
                    "incomplete"
                };
                println!("{:<11} {state:<10} {value}", kind.key());
            }
        }
    }
    Ok(())
}

fn flush_logs(app: &App) {
    for entry in &app.logs {
        if entry.level != LogLevel::Info {
            eprintln!("[{}] {}", app::log_level_label(entry.level), entry.message);
        }
    }
}
