//! ARBOR - Hierarchical Key-Value Store
//! Interactive shell over a local store. Keys are written as
//! `/`-separated paths, e.g. `users/1/profile`.

use std::io::{self, BufRead, Write};

use arbor::config::Config;
use arbor::engine::{ttl, Arbor};
use arbor::types::{Cursor, ListOptions, SetOptions};

fn parse_path(raw: &str) -> Vec<&str> {
    raw.split('/').filter(|s| !s.is_empty()).collect()
}

fn main() {
    env_logger::init();

    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║            ARBOR Key-Value Store          ║");
    println!("  ║      Hierarchical keys · TTL · Vacuum     ║");
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
    println!("  Commands:");
    println!("    set <path> <value> [ttl=<ms>]  - Store a value");
    println!("    get <path>                     - Retrieve a value");
    println!("    has <path>                     - Check for a live key");
    println!("    del <path>                     - Delete a key");
    println!("    list <prefix> [limit] [cursor] - Page through a subtree");
    println!("    all <prefix>                   - List a whole subtree (keys only)");
    println!("    delall <prefix>                - Delete a subtree (one batch)");
    println!("    drain                          - Run queued delete continuations");
    println!("    vacuum                         - Reclaim expired entries");
    println!("    compact                        - Rewrite the write-ahead log");
    println!("    info                           - Show store statistics");
    println!("    exit                           - Shutdown store");
    println!();

    let config = match std::env::var("ARBOR_DATA_DIR") {
        Ok(dir) => Config::new(dir),
        Err(_) => Config::default(),
    };
    let mut store = match Arbor::open(config) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("[ERROR] Failed to open store: {}", err);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("arbor> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break, // EOF
            Ok(_) => {}
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_lowercase().as_str() {
            "set" | "put" => {
                if parts.len() < 3 {
                    println!("  Usage: set <path> <value> [ttl=<ms>]");
                    continue;
                }
                let mut options = SetOptions::new();
                let mut value_parts = &parts[2..];
                if let Some(ttl) = value_parts.last().and_then(|p| p.strip_prefix("ttl=")) {
                    match ttl.parse::<u64>() {
                        Ok(ms) => options = options.with_ttl(ms),
                        Err(_) => {
                            println!("  ERROR: invalid ttl '{}'", ttl);
                            continue;
                        }
                    }
                    value_parts = &value_parts[..value_parts.len() - 1];
                }
                let value = value_parts.join(" ").into_bytes();
                match store.set(&parse_path(parts[1]), value, options) {
                    Ok(()) => println!("  OK"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "get" => {
                if parts.len() < 2 {
                    println!("  Usage: get <path>");
                    continue;
                }
                match store.get(&parse_path(parts[1])) {
                    Ok(Some(entry)) => {
                        match String::from_utf8(entry.value) {
                            Ok(s) => println!("  \"{}\"", s),
                            Err(_) => println!("  <binary data>"),
                        }
                        if let Some(left) = ttl::remaining_ttl(entry.expires_at, ttl::now_ms()) {
                            println!("  (expires in {} ms)", left);
                        }
                    }
                    Ok(None) => println!("  (nil)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "has" => {
                if parts.len() < 2 {
                    println!("  Usage: has <path>");
                    continue;
                }
                match store.has(&parse_path(parts[1])) {
                    Ok(found) => println!("  {}", found),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "del" | "delete" => {
                if parts.len() < 2 {
                    println!("  Usage: del <path>");
                    continue;
                }
                match store.delete(&parse_path(parts[1])) {
                    Ok(()) => println!("  OK (deleted)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "list" | "scan" => {
                let prefix = parts.get(1).map(|p| parse_path(p)).unwrap_or_default();
                let mut options = ListOptions::default();
                if let Some(limit) = parts.get(2) {
                    match limit.parse::<usize>() {
                        Ok(n) => options = options.with_limit(n),
                        Err(_) => {
                            println!("  ERROR: invalid limit '{}'", limit);
                            continue;
                        }
                    }
                }
                if let Some(token) = parts.get(3) {
                    match token.parse::<Cursor>() {
                        Ok(cursor) => options = options.with_cursor(cursor),
                        Err(e) => {
                            println!("  ERROR: {}", e);
                            continue;
                        }
                    }
                }
                match store.list(&prefix, &options) {
                    Ok(page) => {
                        for entry in &page.entries {
                            let v = entry
                                .value
                                .as_deref()
                                .map(String::from_utf8_lossy)
                                .unwrap_or_default();
                            println!("  {} -> {}", entry.key.join("/"), v);
                        }
                        println!(
                            "  ({} entries, done: {}, cursor: {})",
                            page.entries.len(),
                            page.is_done,
                            page.continue_cursor
                        );
                    }
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "all" => {
                let prefix = parts.get(1).map(|p| parse_path(p)).unwrap_or_default();
                match store.get_all(&prefix, false) {
                    Ok(entries) if entries.is_empty() => println!("  (empty)"),
                    Ok(entries) => {
                        for entry in &entries {
                            println!("  {}", entry.key.join("/"));
                        }
                        println!("  ({} entries)", entries.len());
                    }
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "delall" => {
                let prefix = parts.get(1).map(|p| parse_path(p)).unwrap_or_default();
                match store.delete_all(&prefix) {
                    Ok(outcome) => println!(
                        "  OK ({} deleted, more pending: {})",
                        outcome.deleted_count, outcome.has_more
                    ),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "drain" => {
                let mut runs = 0;
                let mut deleted = 0;
                loop {
                    match store.run_pending() {
                        Ok(Some(outcome)) => {
                            runs += 1;
                            deleted += outcome.deleted_count;
                        }
                        Ok(None) => break,
                        Err(e) => {
                            println!("  ERROR: {}", e);
                            break;
                        }
                    }
                }
                println!("  OK ({} continuations, {} deleted)", runs, deleted);
            }
            "vacuum" => match store.vacuum() {
                Ok(outcome) => println!("  OK ({} expired entries removed)", outcome.count),
                Err(e) => println!("  ERROR: {}", e),
            },
            "compact" => match store.compact_log() {
                Ok(()) => println!("  OK"),
                Err(e) => println!("  ERROR: {}", e),
            },
            "info" | "stats" => {
                println!("  Entries:       {}", store.len());
                println!("  Table size:    {} bytes", store.size_bytes());
                println!("  Pending jobs:  {}", store.pending_continuations());
                println!("{}", store.metrics().report());
            }
            "exit" | "quit" | "q" => {
                println!("  Shutting down ARBOR...");
                break;
            }
            _ => {
                println!("  Unknown command: '{}'. Type 'exit' to quit.", parts[0]);
            }
        }
    }
}
