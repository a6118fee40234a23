use artselect::catalog::{ClientOptions, HttpPageFetcher};
use artselect::controller::{SelectStrategy, SelectionController};
use std::collections::HashSet;
use std::error::Error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let fetcher = HttpPageFetcher::new(&ClientOptions {
        page_size: 12,
        timeout_seconds: 5,
        ..ClientOptions::default()
    })?;
    let controller = SelectionController::with_strategy(fetcher, SelectStrategy::Fetch);

    controller.navigate_to(1).await?;
    let first_two: HashSet<u64> = controller
        .current_page()
        .records
        .iter()
        .take(2)
        .map(|r| r.id)
        .collect();
    controller.toggle_rows_on_current_page(&first_two, &HashSet::new());

    controller.navigate_to(2).await?;
    println!("visible on page 2: {}", controller.visible_selection().len());

    let total = controller.view_state().total_records;
    controller.select_first_n(15, total).await?;
    println!("selected: {}", controller.selected_count());
    for id in controller.selected_ids() {
        println!("{id}");
    }

    Ok(())
}
