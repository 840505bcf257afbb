use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::entries::{EntryFilter, load_entries};
use crate::db::open_store;
use crate::errors::{AppError, AppResult};
use crate::models::{Category, Entry};
use crate::ui::messages::info;
use crate::utils::colors::{CYAN, GREY, RESET};
use crate::utils::table::{Column, Table};
use std::collections::BTreeMap;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List { category, summary } = cmd {
        let category = match category {
            Some(c) => Some(
                Category::parse(c)
                    .ok_or_else(|| AppError::Validation("Please select an activity type".into()))?,
            ),
            None => None,
        };

        let store = open_store(cfg.database_path())?;
        let filter = EntryFilter {
            category,
            period: None,
        };
        let entries = load_entries(&store.conn, &filter)?;
        store.close()?;

        if entries.is_empty() {
            info("No entries recorded yet.");
            return Ok(());
        }

        print_entries(&entries);

        if *summary {
            print_summary(&entries);
        }
    }
    Ok(())
}

fn print_entries(entries: &[Entry]) {
    let mut table = Table::new(vec![
        Column::new("ID", 6),
        Column::new("Start", 10),
        Column::new("End", 10),
        Column::new("Name", 30),
        Column::new("Type", 14),
        Column::new("Points", 6),
        Column::new("Description", 40),
        Column::new("Photo", 5),
    ]);

    for e in entries {
        table.add_row(vec![
            e.id.to_string(),
            e.period_start_str(),
            e.period_end_str(),
            e.name.clone(),
            e.category.to_string(),
            e.points.to_string(),
            e.description.replace('\n', " "),
            if e.has_photo() { "yes" } else { "-" }.to_string(),
        ]);
    }

    print!("{}", table.render());
}

fn print_summary(entries: &[Entry]) {
    let mut totals: BTreeMap<String, (usize, u64)> = BTreeMap::new();
    for e in entries {
        let slot = totals.entry(e.category.to_string()).or_default();
        slot.0 += 1;
        slot.1 += u64::from(e.points);
    }

    println!("\n{CYAN}Points by activity type{RESET}");
    for (cat, (count, points)) in &totals {
        println!("  {cat:<14} {points:>6} pts {GREY}({count} entries){RESET}");
    }

    let grand: u64 = totals.values().map(|(_, p)| p).sum();
    println!("  {:<14} {:>6} pts", "Total", grand);
}
