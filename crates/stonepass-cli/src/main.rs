//! `stonepass` — offline deterministic password generator.
//!
//! One master passphrase, every site, nothing stored. The tool prompts
//! for the account inputs, derives the site password through the
//! crypto core, shows it once, and clears the screen. There is no
//! vault, no sync, no cache: rerunning with the same inputs is the
//! only way to see a password again, and it always works.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use zeroize::Zeroize;

use stonepass_crypto_core::memory::disable_core_dumps;
use stonepass_crypto_core::password::{generate_password, PasswordPolicy};

/// Interactive length bounds — narrower than the library's 6..=128 on
/// purpose: below 8 characters a generated password is a bad idea, and
/// above 64 many sites truncate silently.
const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 64;

/// Upper bound on the rotation counter prompt.
const MAX_VERSION: u32 = 999_999;

#[derive(Parser, Debug)]
#[command(
    name = "stonepass",
    version,
    about = "Offline deterministic password generator — no storage, no cloud, no telemetry",
    long_about = "Derives a strong, reproducible password for each site from a single \
                  memorized master passphrase. Nothing is ever written to disk: forget \
                  the master passphrase and every derived password is gone with it."
)]
struct Cli {
    /// Username or email of the account.
    #[arg(long, short = 'u')]
    username: Option<String>,

    /// Site or domain the password is for.
    #[arg(long, short = 's')]
    site: Option<String>,

    /// Rotation counter; bump it to get a fresh password for the same site.
    #[arg(long, short = 'n', value_name = "N")]
    version_counter: Option<u32>,

    /// Password length.
    #[arg(long, short = 'l')]
    length: Option<usize>,

    /// Leave the password on screen instead of clearing after Enter.
    #[arg(long)]
    no_clear: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // A crash while the passphrase is in memory must not write a core
    // file. Failure here is a warning, not a reason to refuse service.
    if disable_core_dumps().is_err() {
        eprintln!("[stonepass] WARNING: could not disable core dumps");
    }

    println!("=== StonePass - Offline Deterministic Password Generator ===");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let username = match cli.username {
        Some(u) if !u.trim().is_empty() => u.trim().to_string(),
        _ => prompt_line(&mut lines, "Username / Email               : ")?,
    };
    let mut master = prompt_master()?;
    let site = match cli.site {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => prompt_line(&mut lines, "Site / Domain                  : ")?,
    };
    let version = match cli.version_counter {
        Some(v) => {
            if !(1..=MAX_VERSION).contains(&v) {
                master.zeroize();
                bail!("--version-counter must be between 1 and {MAX_VERSION}, got {v}");
            }
            v
        }
        None => prompt_int(&mut lines, "Version (counter)              ", 1, u64::from(MAX_VERSION))? as u32,
    };
    let length = match cli.length {
        Some(l) => {
            if !(MIN_LENGTH..=MAX_LENGTH).contains(&l) {
                master.zeroize();
                bail!("--length must be between {MIN_LENGTH} and {MAX_LENGTH}, got {l}");
            }
            l
        }
        None => prompt_int(&mut lines, "Length                         ", MIN_LENGTH as u64, MAX_LENGTH as u64)? as usize,
    };

    println!();
    println!("Please wait -- generating password...");
    println!();

    let policy = PasswordPolicy {
        length,
        version,
        ..PasswordPolicy::default()
    };
    let result = generate_password(&username, &master, &site, &policy);
    master.zeroize();
    let password = result.context("password generation failed")?;

    println!("*** PASSWORD GENERATOR ***");
    println!("Input data");
    println!("\tUsername         = {username}");
    println!("\tMaster Password  = ********");
    println!("\tSite / Domain    = {site}");
    println!("\tPassword length  = {length}");
    println!("\tPassword version = {version}");
    println!("Generated Password");
    println!("\t{password}");
    println!();
    println!("Copy and use this password immediately. This program will not store it.");
    println!("If you need this password again, simply run this program again with the");
    println!("same inputs.");
    println!();

    if !cli.no_clear {
        prompt_any(&mut lines, "Press <Enter> to clear the screen : ")?;
        // ANSI clear + cursor home; effective in every terminal that
        // matters, harmless elsewhere.
        print!("\x1b[2J\x1b[1;1H");
        io::stdout().flush().context("failed to clear the screen")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Prompt helpers
// ---------------------------------------------------------------------------

/// Prompt until a non-empty, trimmed line arrives.
fn prompt_line<I>(lines: &mut I, prompt: &str) -> Result<String>
where
    I: Iterator<Item = io::Result<String>>,
{
    loop {
        print!("{prompt}");
        io::stdout().flush().context("failed to flush stdout")?;
        let line = lines
            .next()
            .context("input closed before a value was entered")?
            .context("failed to read input")?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
        println!("A value is required.");
    }
}

/// Hidden prompt for the master passphrase; repeats until non-empty.
fn prompt_master() -> Result<String> {
    loop {
        let master = rpassword::prompt_password("Master Password                : ")
            .context("failed to read master password")?;
        if !master.is_empty() {
            return Ok(master);
        }
        println!("A value is required.");
    }
}

/// Prompt for an integer within `[min, max]`, reprompting on junk.
fn prompt_int<I>(lines: &mut I, label: &str, min: u64, max: u64) -> Result<u64>
where
    I: Iterator<Item = io::Result<String>>,
{
    loop {
        print!("{label}[{min}-{max}]: ");
        io::stdout().flush().context("failed to flush stdout")?;
        let line = lines
            .next()
            .context("input closed before a value was entered")?
            .context("failed to read input")?;
        match line.trim().parse::<u64>() {
            Ok(v) if (min..=max).contains(&v) => return Ok(v),
            _ => println!("Please enter a number between {min} and {max}."),
        }
    }
}

/// Wait for the user to press Enter.
fn prompt_any<I>(lines: &mut I, prompt: &str) -> Result<()>
where
    I: Iterator<Item = io::Result<String>>,
{
    print!("{prompt}");
    io::stdout().flush().context("failed to flush stdout")?;
    // EOF counts as a keypress; nothing left to wait for.
    let _ = lines.next();
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
