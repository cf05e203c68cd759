use super::build_hub;
use crate::output::Output;
use cinema_core::HubStats;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};

pub fn run_stats(output: &Output) -> Result<()> {
    let stats = build_hub()?.stats()?;

    if !output.is_human() {
        output.data(&stats);
        return Ok(());
    }

    if stats.total_months == 0 {
        output.info("The snapshot store is empty");
        return Ok(());
    }
    output.table(stats_table(&stats));
    output.info(format!(
        "{} movies in {} snapshots",
        stats.total_movies, stats.total_months
    ));
    Ok(())
}

fn stats_table(stats: &HubStats) -> Table {
    let mut table = Table::new();
    table.set_header(
        ["Source", "Month", "Movies", "Last updated"]
            .into_iter()
            .map(|h| Cell::new(h).fg(Color::Cyan).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );

    for source in &stats.sources {
        for month in &source.months {
            table.add_row(vec![
                Cell::new(&source.source),
                Cell::new(month.month),
                Cell::new(month.movie_count),
                Cell::new(month.last_updated.format("%Y-%m-%d %H:%M UTC")),
            ]);
        }
    }
    table
}
