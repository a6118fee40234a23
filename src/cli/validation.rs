use crate::catalog::client::MAX_PAGE_SIZE;
use crate::cli::args::CliArgs;
use crate::controller::SelectStrategy;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(size) = args.page_size {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(format!(
                "invalid page-size {size}, expected 1..={MAX_PAGE_SIZE}"
            ));
        }
    }
    if let Some(page) = args.start_page {
        if page == 0 {
            return Err("invalid page, pages start at 1".to_string());
        }
    }
    if let Some(raw) = args.strategy.as_deref() {
        if SelectStrategy::parse(raw).is_none() {
            return Err(format!("invalid --strategy '{raw}', expected fetch or dense"));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.api_url.as_deref() {
        reqwest::Url::parse(raw).map_err(|e| format!("invalid --api-url '{raw}': {e}"))?;
    }
    Ok(())
}
