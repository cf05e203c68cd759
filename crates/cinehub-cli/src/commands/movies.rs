use super::ui::FetchSpinner;
use super::{build_hub, parse_query, Query};
use crate::output::Output;
use cinema_core::AggregateResult;
use cinema_models::Movie;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};

pub async fn run_movies(month: Option<String>, date: Option<String>, refresh: bool, output: &Output) -> Result<()> {
    let query = parse_query(month.as_deref(), date.as_deref())?;
    let hub = build_hub()?;

    let result = match query {
        Query::Cached if !refresh => AggregateResult {
            movies: hub.get_all_movies()?,
            failures: Vec::new(),
        },
        Query::Cached => {
            let spinner = FetchSpinner::start(output, "Refreshing the current month...");
            let result = hub.refresh(cinema_core::RefreshScope::CurrentMonth).await;
            spinner.finish();
            result?
        }
        Query::Month(month) => {
            let spinner = FetchSpinner::start(output, format!("Loading {}...", month));
            let result = hub.get_movies_for_month(month, refresh).await;
            spinner.finish();
            result?
        }
        Query::Date(date) => {
            let spinner = FetchSpinner::start(output, format!("Loading {}...", date));
            let result = hub.get_movies_for_date(date, refresh).await;
            spinner.finish();
            result?
        }
    };

    print_result(&result, output);
    Ok(())
}

/// Table of movies plus one warning per failed source
pub fn print_result(result: &AggregateResult, output: &Output) {
    if !output.is_human() {
        output.data(result);
        return;
    }

    for failure in &result.failures {
        output.warn(format!("{}: {}", failure.source, failure.error));
    }

    if result.movies.is_empty() {
        output.info("No movies found");
        return;
    }

    output.table(movie_table(&result.movies));
    output.info(format!("{} movies", result.movies.len()));
}

fn movie_table(movies: &[Movie]) -> Table {
    let mut table = Table::new();
    table.set_header(
        ["Date", "Showtimes", "Title", "Theater", "Director", "Min"]
            .into_iter()
            .map(|h| Cell::new(h).fg(Color::Cyan).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );

    for movie in movies {
        let showtimes = movie.showtimes.iter().cloned().collect::<Vec<_>>().join(" ");
        let title = match &movie.alt_title {
            Some(alt) => format!("{}\n{}", movie.title, alt),
            None => movie.title.clone(),
        };
        table.add_row(vec![
            Cell::new(movie.date.format("%a %d %b")),
            Cell::new(showtimes),
            Cell::new(title),
            Cell::new(&movie.theater),
            Cell::new(movie.director.as_deref().unwrap_or("")),
            Cell::new(movie.duration.map(|d| d.to_string()).unwrap_or_default()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    #[test]
    fn test_movie_table_has_a_row_per_movie() {
        let movie = Movie {
            id: "verdi_2025-11-06_alien".to_string(),
            title: "Alien".to_string(),
            alt_title: None,
            director: Some("Ridley Scott".to_string()),
            duration: Some(117),
            genre: vec!["Film".to_string()],
            rating: None,
            poster: None,
            theater: "Verdi Barcelona".to_string(),
            showtimes: BTreeSet::from(["16:00".to_string(), "22:15".to_string()]),
            date: NaiveDate::from_ymd_opt(2025, 11, 6).unwrap(),
            film_url: None,
            source: "verdi".to_string(),
            plot: None,
            tmdb_id: None,
            original_title: None,
            release_year: None,
            cycle: None,
            guests: None,
        };

        let rendered = movie_table(&[movie.clone(), movie]).to_string();
        assert_eq!(rendered.matches("Ridley Scott").count(), 2);
        assert!(rendered.contains("16:00 22:15"));
    }
}
