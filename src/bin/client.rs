//! Rolodex Client Binary
//!
//! Interactive prompt that turns terminal input into protocol requests.

use std::io::{self, BufRead, Write};

use clap::Parser;
use rolodex::network::Client;
use rolodex::{Result, RolodexError};
use tracing_subscriber::{fmt, EnvFilter};

/// Rolodex CLI
#[derive(Parser, Debug)]
#[command(name = "rolodex-client")]
#[command(about = "Interactive client for the Rolodex record store")]
#[command(version)]
struct Args {
    /// Server hostname or address
    hostname: String,

    /// Server port
    port: u16,
}

fn main() {
    // Warnings only, so logs do not interleave with the prompt
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    let mut client = match Client::connect(&args.hostname, args.port) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("usage: rolodex-client <hostname> <port>");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();

    if let Err(e) = run(&mut client, &mut input) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = client.quit() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Menu loop; returns when the user quits or stdin ends
fn run(client: &mut Client, input: &mut impl BufRead) -> Result<()> {
    loop {
        let Some(choice) = prompt(input, "Enter your choice (1 to put, 2 to get, 0 to quit): ")?
        else {
            return Ok(());
        };

        match choice.trim().parse::<i64>() {
            Ok(0) => return Ok(()),
            Ok(1) => put(client, input)?,
            Ok(2) => get(client, input)?,
            Ok(_) => println!("Invalid choice. Please enter 0, 1, or 2."),
            Err(_) => println!("Invalid input. Please enter a number."),
        }
    }
}

fn put(client: &mut Client, input: &mut impl BufRead) -> Result<()> {
    let Some(name) = prompt(input, "Enter the name: ")? else {
        return Ok(());
    };
    let Some(id) = prompt_id(input)? else {
        return Ok(());
    };

    match client.put(id, &name) {
        Ok(()) => println!("Put success."),
        Err(RolodexError::RequestFailed(_)) => println!("Put failed."),
        Err(e @ (RolodexError::NameTooLong { .. } | RolodexError::InvalidName(_))) => {
            println!("Put failed: {}", e)
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

fn get(client: &mut Client, input: &mut impl BufRead) -> Result<()> {
    let Some(id) = prompt_id(input)? else {
        return Ok(());
    };

    match client.get(id)? {
        Some(record) => println!("name: {}\nid: {}", record.name(), record.id()),
        None => println!("Record not found."),
    }
    Ok(())
}

/// Ask for an id; `None` if the input is not a valid u32 or stdin ended
fn prompt_id(input: &mut impl BufRead) -> Result<Option<u32>> {
    let Some(line) = prompt(input, "Enter the id: ")? else {
        return Ok(None);
    };

    match line.trim().parse::<u32>() {
        Ok(id) => Ok(Some(id)),
        Err(_) => {
            println!("Id not valid.");
            Ok(None)
        }
    }
}

/// Print a prompt and read one line without its line ending
fn prompt(input: &mut impl BufRead, text: &str) -> Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}
