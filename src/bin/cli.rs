use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use moonrise::engine::{Engine, VERSION};

fn main() {
    moonrise::logger::init_logging("logs/moonrise.log", "moonrise=info");

    let mut engine = Engine::new();

    // Command-line options use the same words as the protocol: each
    // `-option args...` group becomes one command line.
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        if let Some(name) = args[i].strip_prefix('-') {
            let mut line = name.to_string();
            let mut j = i + 1;
            while j < args.len() && !args[j].starts_with('-') {
                line.push(' ');
                line.push_str(&args[j]);
                j += 1;
            }
            engine.handle_command(&line);
            i = j;
        } else {
            eprintln!("unusable argument: {}", args[i]);
            std::process::exit(1);
        }
    }

    println!("Moonrise {VERSION} - a Crazyhouse and Bughouse engine");

    // One reader thread feeds stdin into the channel; both the game loop
    // and the searcher's poll points drain it.
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if tx.send(l).is_err() {
                        break;
                    }
                }
                Err(_) => {
                    let _ = tx.send("quit".to_string());
                    break;
                }
            }
        }
        let _ = tx.send("quit".to_string());
    });
    engine.search.controls.attach(rx);

    engine.run();
}
