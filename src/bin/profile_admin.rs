//! Inspect and repair stored conversation profiles.
//!
//! Usage: cargo run --bin profile_admin <profiles.db> <command> [user_id] [value]
//!
//! Prints the resulting profile as JSON, or the stored ids for `list`.

use std::path::Path;

use quotebot::chatbot::admin::{self, AdminError};
use quotebot::chatbot::{Database, UserProfile};

const DEFAULT_INSTRUCTIONS: &str = "Eres un asesor de seguros de salud. Responde con claridad y cortesía.";

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <profiles.db> <command> [user_id] [value]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list           Print every stored user id");
    eprintln!("  show           Print the stored profile");
    eprintln!("  reset          Back to the start as a regular user");
    eprintln!("  make-admin     Back to the start as an associate");
    eprintln!("  set-name       Set the name to <value>");
    eprintln!("  add-admin      Replace the profile with a fresh associate");
    eprintln!("  add-developer  Replace the profile with a fresh developer");
    eprintln!("  master         Turn on the role menu");
    eprintln!("  set-model      Set the assistant model to <value> (blank clears it)");
    eprintln!("  seed-operator  Create the instructions record <user_id> with <value>");
    std::process::exit(1);
}

fn run(db: &Database, command: &str, user_id: &str, value: Option<&str>) -> Result<UserProfile, AdminError> {
    match command {
        "show" => admin::show(db, user_id),
        "reset" => admin::reset(db, user_id),
        "make-admin" => admin::make_admin(db, user_id),
        "set-name" => admin::set_name(db, user_id, value.unwrap_or_default()),
        "add-admin" => admin::add_admin(db, user_id),
        "add-developer" => admin::add_developer(db, user_id),
        "master" => admin::enable_master(db, user_id),
        "set-model" => admin::set_model(db, user_id, value.unwrap_or_default()),
        "seed-operator" => admin::seed_operator(db, user_id, value.unwrap_or(DEFAULT_INSTRUCTIONS)),
        _ => unreachable!("command checked by caller"),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() == 3 && args[2] == "list" {
        list(Path::new(&args[1]));
        return;
    }
    if args.len() < 4 || args.len() > 5 {
        usage(&args[0]);
    }

    let command = args[2].as_str();
    let known = [
        "show", "reset", "make-admin", "set-name", "add-admin", "add-developer", "master", "set-model",
        "seed-operator",
    ];
    if !known.contains(&command) {
        eprintln!("Unknown command: {command}");
        usage(&args[0]);
    }
    if command == "set-name" && args.get(4).is_none_or(|v| v.trim().is_empty()) {
        eprintln!("set-name needs a name");
        std::process::exit(1);
    }

    let db = Database::load_or_new(Path::new(&args[1])).expect("Failed to open profile database");
    match run(&db, command, &args[3], args.get(4).map(String::as_str)) {
        Ok(profile) => {
            let json = serde_json::to_string_pretty(&profile).expect("Failed to serialize profile");
            println!("{json}");
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    }
}

fn list(path: &Path) {
    let db = Database::load_or_new(path).expect("Failed to open profile database");
    match db.user_ids() {
        Ok(ids) => {
            for id in &ids {
                println!("{id}");
            }
            eprintln!("{} profiles", ids.len());
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    }
}
