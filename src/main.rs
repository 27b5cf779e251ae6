use mbsearch::search::error::SearchFailure;

#[tokio::main]
async fn main() {
    if let Err(err) = mbsearch::run().await {
        // Search failures keep their distinct exit codes for scripts.
        let code = err
            .downcast_ref::<SearchFailure>()
            .map_or(1, SearchFailure::exit_code);
        match err.downcast_ref::<SearchFailure>() {
            Some(SearchFailure::NoResults) => eprintln!("No results"),
            _ => eprintln!("error: {err:#}"),
        }
        std::process::exit(code);
    }
}
