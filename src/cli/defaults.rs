//! `hourgit defaults` - registry-level default schedule management.

use chrono::Local;

use crate::error::Result;
use crate::project::{self, Registry};
use crate::prompt::StdinPrompter;
use crate::schedule::{default_schedules, format_schedule_entry};

use super::config::{edit_schedules, schedule_report_lines};
use super::{home_dir, DefaultsCommands};

pub fn run(command: DefaultsCommands) -> Result<()> {
    let home = home_dir()?;
    let registry = Registry::load(&home)?;

    let effective = || {
        if registry.defaults.is_empty() {
            default_schedules()
        } else {
            registry.defaults.clone()
        }
    };

    match command {
        DefaultsCommands::Get => {
            println!(
                "Default schedule{}:",
                if registry.defaults.is_empty() { " (built-in)" } else { "" }
            );
            for entry in &effective() {
                println!("  {}", format_schedule_entry(entry));
            }
            Ok(())
        }
        DefaultsCommands::Set => {
            let today = Local::now().date_naive();
            let edited = edit_schedules(effective(), today, &mut StdinPrompter)?;
            project::set_defaults(&home, edited)?;
            println!("default schedule saved");
            Ok(())
        }
        DefaultsCommands::Reset => {
            project::set_defaults(&home, Vec::new())?;
            println!("default schedule reset");
            Ok(())
        }
        DefaultsCommands::Read => {
            println!("{}", serde_json::to_string_pretty(&effective())?);
            Ok(())
        }
        DefaultsCommands::Report => {
            let today = Local::now().date_naive();
            for line in schedule_report_lines(&effective(), today)? {
                println!("{line}");
            }
            Ok(())
        }
    }
}
