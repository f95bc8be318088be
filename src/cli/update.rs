//! `hourgit update` - report the cached update-check state.
//!
//! Fetching release metadata is out of scope; the registry only carries the
//! cache (`last_update_check`, `latest_version`) so wrappers or package
//! managers can fill it in.

use chrono::Utc;

use crate::error::Result;
use crate::project::Registry;

use super::home_dir;

pub fn run() -> Result<()> {
    let home = home_dir()?;
    let mut registry = Registry::load(&home)?;

    let current = env!("CARGO_PKG_VERSION");

    match registry.latest_version.as_deref() {
        Some(latest) if latest != current => {
            println!("hourgit {current} (latest known: {latest})");
        }
        Some(_) => {
            println!("hourgit {current} (up to date)");
        }
        None => {
            println!("hourgit {current} (no update information available)");
        }
    }

    registry.last_update_check = Some(Utc::now());
    registry.save(&home)?;

    Ok(())
}
