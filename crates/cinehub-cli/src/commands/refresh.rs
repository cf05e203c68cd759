use super::movies::print_result;
use super::ui::FetchSpinner;
use super::{build_hub, parse_query, Query};
use crate::output::Output;
use cinema_core::RefreshScope;
use color_eyre::Result;

pub async fn run_refresh(month: Option<String>, date: Option<String>, output: &Output) -> Result<()> {
    let scope = match parse_query(month.as_deref(), date.as_deref())? {
        Query::Cached => RefreshScope::CurrentMonth,
        Query::Month(month) => RefreshScope::Month(month),
        Query::Date(date) => RefreshScope::Date(date),
    };
    let hub = build_hub()?;

    let spinner = FetchSpinner::start(output, format!("Refreshing {} sources...", hub.source_slugs().len()));
    let result = hub.refresh(scope).await;
    spinner.finish();
    let result = result?;

    print_result(&result, output);
    if output.is_human() {
        let answered = hub.source_slugs().len() - result.failures.len();
        output.success(format!(
            "Refreshed {} of {} sources ({} movies)",
            answered,
            hub.source_slugs().len(),
            result.movies.len()
        ));
    }
    Ok(())
}
