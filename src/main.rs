use clap::Parser;
use std::io::{BufRead, IsTerminal, Read, Write};

use lil::Interp;

#[derive(Parser)]
#[command(name = "lil")]
#[command(about = "An embeddable command-oriented scripting interpreter")]
#[command(version)]
struct Cli {
    /// Execute the script from the command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

/// Run one chunk of code, printing the result and reporting any error with
/// its byte offset. Returns false when an error was raised.
fn run(interp: &mut Interp, code: &str) -> bool {
    let r = interp.parse(code, true);
    if let Some(err) = interp.error() {
        eprintln!("error at {}: {}", err.position, err);
        return false;
    }
    if !r.is_empty() {
        println!("{}", r);
    }
    true
}

fn repl(interp: &mut Interp) {
    let stdin = std::io::stdin();
    loop {
        print!("lil> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if line.trim().is_empty() {
            continue;
        }
        run(interp, &line);
    }
}

fn main() {
    let cli = Cli::parse();
    let mut interp = Interp::new();

    let script = if let Some(s) = cli.script {
        Some(s)
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => Some(content),
            Err(e) => {
                eprintln!("error: cannot read script file {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else if std::io::stdin().is_terminal() {
        None
    } else {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        Some(buf)
    };

    match script {
        Some(code) => {
            if !run(&mut interp, &code) {
                std::process::exit(1);
            }
        }
        None => repl(&mut interp),
    }
}
