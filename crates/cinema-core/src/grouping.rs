use cinema_models::{Movie, ScreeningRecord};
use cinema_sources::text::slugify;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Stable id of the movie at `source` on `date`
pub fn movie_id(source: &str, date: NaiveDate, title: &str) -> String {
    format!("{}_{}_{}", source, date.format("%Y-%m-%d"), slugify(title))
}

/// Merge screening records into one movie per (date, title).
///
/// Output keeps first-seen order. Showtimes of colliding records are
/// unioned; every other field comes from the first record of the pair.
pub fn group_screenings(records: Vec<ScreeningRecord>, theater: &str) -> Vec<Movie> {
    let mut index: HashMap<(NaiveDate, String), usize> = HashMap::new();
    let mut movies: Vec<Movie> = Vec::new();

    for record in records {
        let key = (record.date, record.title.clone());
        if let Some(&position) = index.get(&key) {
            movies[position].showtimes.insert(record.time);
            continue;
        }

        index.insert(key, movies.len());
        movies.push(into_movie(record, theater));
    }

    movies
}

fn into_movie(record: ScreeningRecord, theater: &str) -> Movie {
    Movie {
        id: movie_id(&record.source_id, record.date, &record.title),
        title: record.title,
        alt_title: record.alt_title,
        director: record.raw_director,
        duration: None,
        genre: record.genre,
        rating: None,
        poster: record.poster,
        theater: theater.to_string(),
        showtimes: BTreeSet::from([record.time]),
        date: record.date,
        film_url: record.source_url,
        source: record.source_id,
        plot: None,
        tmdb_id: None,
        original_title: None,
        release_year: None,
        cycle: record.cycle,
        guests: record.guests,
    }
}
