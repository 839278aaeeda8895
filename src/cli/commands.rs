use std::sync::Arc;

use crate::{
    app::{AppError, ListQuery, MemeBackend, SearchRequest},
    cli::{
        errors::{CliError, CliResult},
        render::{print_json, print_memes, PlainObserver, ProgressObserver, Tee},
        validation::*,
    },
    config::Config,
    curated::curated_memes,
    memes::Meme,
    search::{fallback_matches, LogObserver, SearchController, SearchOutcome, SessionObserver},
};

const FALLBACK_NOTICE: &str = "Search is unavailable right now, showing bundled memes instead.";

fn print_results(query: &str, results: &[Meme], json: bool) -> CliResult<()> {
    if results.is_empty() && !json {
        eprintln!("No memes matched {query:?}.");
        return Ok(());
    }
    print_memes(results, json)
}

#[derive(Debug, PartialEq)]
enum Interrupt {
    CancelledSearch,
    Exit,
}

/// Ctrl-C stops the running search. With nothing running it quits.
fn interrupt(controller: &SearchController) -> Interrupt {
    if !controller.is_searching() {
        return Interrupt::Exit;
    }
    if let Some(state) = controller.state() {
        log::info!("cancelling search at stage {}", state.stage);
    }
    controller.cancel();
    Interrupt::CancelledSearch
}

/// Streaming search with live progress
#[derive(Debug, Clone)]
pub struct SearchCommand {
    pub query: String,
    pub limit: usize,
    pub plain: bool,
    pub json: bool,
}

impl SearchCommand {
    pub fn new(words: &[String], limit: usize, plain: bool, json: bool) -> CliResult<Self> {
        Ok(Self {
            query: validate_query(words)?,
            limit: validate_limit(limit)?,
            plain,
            json,
        })
    }

    fn observer(&self) -> Arc<dyn SessionObserver> {
        let display: Arc<dyn SessionObserver> = if self.plain {
            Arc::new(PlainObserver::default())
        } else {
            Arc::new(ProgressObserver::new())
        };
        Arc::new(Tee(vec![Arc::new(LogObserver), display]))
    }

    pub async fn execute(self, backend: Arc<dyn MemeBackend>) -> CliResult<()> {
        let controller = SearchController::new(backend).with_observer(self.observer());

        // runs until the runtime shuts down
        let canceller = controller.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if interrupt(&canceller) == Interrupt::Exit {
                    std::process::exit(130);
                }
            }
        });

        let outcome = controller.start_search(&self.query, self.limit).await;

        match outcome {
            SearchOutcome::Completed(results) => print_results(&self.query, &results, self.json),
            SearchOutcome::Fallback { error, results } => {
                log::debug!("streaming search failed: {error}");
                eprintln!("{FALLBACK_NOTICE}");
                print_memes(&results, self.json)
            }
            SearchOutcome::Cancelled | SearchOutcome::Superseded => Ok(()),
        }
    }
}

/// One-shot search without progress events
#[derive(Debug, Clone)]
pub struct QuickCommand {
    pub request: SearchRequest,
    pub json: bool,
}

impl QuickCommand {
    pub fn new(
        words: &[String],
        limit: usize,
        category: Option<String>,
        json: bool,
    ) -> CliResult<Self> {
        Ok(Self {
            request: SearchRequest {
                query: validate_query(words)?,
                top_k: validate_limit(limit)?,
                category: normalize_category(category),
            },
            json,
        })
    }

    pub async fn execute(self, backend: Arc<dyn MemeBackend>) -> CliResult<()> {
        match backend.search(&self.request).await {
            Ok(page) => print_results(&self.request.query, &page.results, self.json),
            Err(err) => {
                log::warn!("search for {:?} failed: {err}", self.request.query);
                eprintln!("{FALLBACK_NOTICE}");
                print_memes(&fallback_matches(&self.request.query, curated_memes()), self.json)
            }
        }
    }
}

/// Page through all memes
#[derive(Debug, Clone)]
pub struct ListCommand {
    pub query: ListQuery,
    pub json: bool,
}

impl ListCommand {
    pub fn new(
        limit: Option<usize>,
        offset: usize,
        category: Option<String>,
        json: bool,
        config: &Config,
    ) -> CliResult<Self> {
        Ok(Self {
            query: ListQuery {
                limit: validate_limit(limit.unwrap_or(config.page_size))?,
                offset,
                category: normalize_category(category),
            },
            json,
        })
    }

    pub async fn execute(self, backend: Arc<dyn MemeBackend>) -> CliResult<()> {
        let page = backend.list(&self.query).await?;

        if self.json {
            return print_json(&page);
        }

        if page.results.is_empty() {
            eprintln!("No memes at offset {} ({} total).", self.query.offset, page.total);
            return Ok(());
        }

        print_memes(&page.results, false)?;
        eprintln!(
            "{}-{} of {}",
            self.query.offset + 1,
            self.query.offset + page.results.len(),
            page.total
        );
        Ok(())
    }
}

pub struct CategoriesCommand {
    pub json: bool,
}

impl CategoriesCommand {
    pub async fn execute(self, backend: Arc<dyn MemeBackend>) -> CliResult<()> {
        let categories = backend.categories().await?;
        if self.json {
            return print_json(&categories);
        }
        for category in categories {
            println!("{category}");
        }
        Ok(())
    }
}

/// Fetch a single meme by id
pub struct ShowCommand {
    pub id: String,
    pub json: bool,
}

impl ShowCommand {
    pub fn new(id: &str, json: bool) -> CliResult<Self> {
        Ok(Self {
            id: validate_meme_id(id)?.to_string(),
            json,
        })
    }

    pub async fn execute(self, backend: Arc<dyn MemeBackend>) -> CliResult<()> {
        let meme = match backend.meme(&self.id).await {
            Ok(meme) => meme,
            Err(AppError::NotFound) => return Err(CliError::not_found(format!("meme {}", self.id))),
            Err(err) => return Err(err.into()),
        };

        if self.json {
            print_json(&meme)
        } else {
            print_memes(std::slice::from_ref(&meme), false)
        }
    }
}

/// Print the bundled memes, optionally filtered like the offline fallback
pub struct CuratedCommand {
    pub query: Option<String>,
    pub json: bool,
}

impl CuratedCommand {
    pub fn execute(self) -> CliResult<()> {
        let memes = match self.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => fallback_matches(query, curated_memes()),
            _ => curated_memes().to_vec(),
        };
        print_memes(&memes, self.json)
    }
}

/// Print the effective configuration with the token redacted
pub struct ConfigCommand;

impl ConfigCommand {
    pub fn execute(self, config: &Config) -> CliResult<()> {
        let mut shown = config.clone();
        if shown.api_token.is_some() {
            shown.api_token = Some("********".to_string());
        }

        let yaml = serde_yml::to_string(&shown)
            .map_err(|e| CliError::invalid_input(format!("failed to render config: {e}")))?;
        println!("# {}", config.path().display());
        print!("{yaml}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memes::MemePage, search::ByteStream};
    use async_trait::async_trait;
    use futures_util::{stream, StreamExt};

    /// Opens streams that never produce anything.
    struct StalledBackend;

    #[async_trait]
    impl MemeBackend for StalledBackend {
        async fn search_stream(&self, _query: &str, _top_k: usize) -> Result<ByteStream, AppError> {
            Ok(stream::pending::<Result<Vec<u8>, AppError>>().boxed())
        }

        async fn search(&self, _request: &SearchRequest) -> Result<MemePage, AppError> {
            Err(AppError::NotFound)
        }

        async fn list(&self, _query: &ListQuery) -> Result<MemePage, AppError> {
            Err(AppError::NotFound)
        }

        async fn categories(&self) -> Result<Vec<String>, AppError> {
            Err(AppError::NotFound)
        }

        async fn meme(&self, _id: &str) -> Result<Meme, AppError> {
            Err(AppError::NotFound)
        }
    }

    #[tokio::test]
    async fn test_interrupt_cancels_search_then_exits() {
        let controller = SearchController::new(Arc::new(StalledBackend));
        assert_eq!(interrupt(&controller), Interrupt::Exit);

        let running = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start_search("猫", 5).await }
        });
        while !controller.is_searching() {
            tokio::task::yield_now().await;
        }

        assert_eq!(interrupt(&controller), Interrupt::CancelledSearch);
        assert_eq!(running.await.unwrap(), SearchOutcome::Cancelled);

        // a second Ctrl-C after the search ended quits
        assert_eq!(interrupt(&controller), Interrupt::Exit);
    }

    #[test]
    fn test_search_command_validates() {
        let words = vec!["猫".to_string()];
        assert!(SearchCommand::new(&words, 0, false, false).is_err());
        assert!(SearchCommand::new(&[], 5, false, false).is_err());

        let command = SearchCommand::new(&words, 5, true, false).unwrap();
        assert_eq!(command.query, "猫");
        assert!(command.plain);
    }
}
