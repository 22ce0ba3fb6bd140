//! Print an Argon2 PHC string for FOLIO_ADMIN_PASSWORD_HASH.

use std::env;

fn main() {
    let password = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-password <PASSWORD>");
        std::process::exit(1);
    });

    match folio_api::auth::hash_password(&password) {
        Ok(hashed) => {
            println!("\nHash : {}\n", hashed);
            println!("# Paste this into your .env:");
            println!("FOLIO_ADMIN_PASSWORD_HASH={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
