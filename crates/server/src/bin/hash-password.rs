//! Credential hashing utility for hoard
//!
//! Prints the salted hash of a password, base64url encoded, for the
//! HOARD_PASSWORD_HASH environment variable. The salt comes from
//! HOARD_AUTH_SALT so the output matches what the server computes at login.
//!
//! Usage:
//!   HOARD_AUTH_SALT=... cargo run --bin hash-password
//!   HOARD_AUTH_SALT=... cargo run --bin hash-password "MySecurePassword123!"

use std::env;
use std::io::{self, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hoard_auth::salt_and_hash;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let salt = env::var("HOARD_AUTH_SALT")
        .map_err(|_| "HOARD_AUTH_SALT must be set to the same value the server uses")?;

    let password = if let Some(pwd) = env::args().nth(1) {
        pwd
    } else {
        // Reading from stdin keeps the password out of the process list.
        print!("Enter password to hash: ");
        io::stdout().flush()?;

        let mut password = String::new();
        io::stdin().read_line(&mut password)?;
        password.trim().to_string()
    };

    if password.is_empty() {
        eprintln!("Error: password cannot be empty");
        std::process::exit(1);
    }

    let hash = salt_and_hash(salt.as_bytes(), &password);
    println!("{}", URL_SAFE_NO_PAD.encode(hash));
    eprintln!("\nSet this as HOARD_PASSWORD_HASH in the server environment.");

    Ok(())
}
