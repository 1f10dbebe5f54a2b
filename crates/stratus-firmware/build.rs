//! Bakes station secrets from `.env` into the firmware image and adds the
//! esp-hal linker script.

use std::path::Path;

const SECRETS: [&str; 3] = ["WIFI_SSID", "WIFI_PASSWORD", "OWM_API_KEY"];

fn main() {
    let env_file = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    println!("cargo:rerun-if-changed={}", env_file.display());
    for key in SECRETS {
        println!("cargo:rerun-if-env-changed={key}");
    }

    match dotenvy::from_path(&env_file) {
        Ok(()) => {}
        Err(e) if e.not_found() => {
            println!("cargo:warning=no .env found, secrets come from the build environment");
        }
        Err(e) => panic!("failed to read {}: {e}", env_file.display()),
    }

    for key in SECRETS {
        match std::env::var(key) {
            Ok(value) => println!("cargo:rustc-env={key}={value}"),
            Err(_) => println!("cargo:warning={key} is not set"),
        }
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
