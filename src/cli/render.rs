use std::sync::{Arc, Mutex, PoisonError};

use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    memes::Meme,
    search::{SearchOutcome, SearchState, SessionObserver, Stage, PROGRESS_STEPS},
};

use super::errors::CliResult;

static HASH_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8,}$").expect("Failed to compile hash token regex")
});

static SOURCE_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*(@[^@\s]*|[(（][^()（）]*[)）])\s*$")
        .expect("Failed to compile source suffix regex")
});

/// Make a tag presentable. Returns an empty string when nothing is left.
pub fn clean_tag(tag: &str) -> String {
    let tag = tag.trim().trim_start_matches('#');
    let tag = SOURCE_SUFFIX_REGEX.replace(tag, "");

    tag.split_whitespace()
        .filter(|token| !HASH_TOKEN_REGEX.is_match(token))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| clean_tag(t)) {
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{:.0}%", score * 100.0),
        None => "-".to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{head}…")
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_memes(memes: &[Meme], json: bool) -> CliResult<()> {
    if json {
        return print_json(memes);
    }

    for meme in memes {
        let tags = clean_tags(&meme.tags);
        println!(
            "{:<12} {:>5}  {:<8} {}",
            meme.id,
            format_score(meme.score),
            meme.category.as_deref().unwrap_or("-"),
            truncate(meme.description.as_deref().unwrap_or_default(), 60),
        );
        if !tags.is_empty() {
            println!("{:<12} tags: {}", "", tags.join(", "));
        }
        println!("{:<12} {}", "", meme.url);
    }
    Ok(())
}

/// Live progress bar on stderr, one step per [`PROGRESS_STEPS`] entry.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(PROGRESS_STEPS.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{bar:20}] {prefix:12} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }
}

fn step_label(stage: &Stage) -> &'static str {
    PROGRESS_STEPS
        .get(stage.progress_index())
        .copied()
        .unwrap_or("done")
}

fn progress_message(state: &SearchState) -> String {
    if state.stage.is_thinking() && !state.thinking_text.is_empty() {
        let tail: String = state
            .thinking_text
            .chars()
            .rev()
            .take(48)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return tail.replace('\n', " ");
    }

    match &state.expanded_query {
        Some(expanded) if state.message.is_empty() => format!("→ {expanded}"),
        Some(expanded) => format!("{} (→ {expanded})", state.message),
        None => state.message.clone(),
    }
}

impl SessionObserver for ProgressObserver {
    fn on_state(&self, state: Option<&SearchState>) {
        match state {
            Some(state) => {
                self.bar.set_position(state.stage.progress_index() as u64);
                self.bar.set_prefix(step_label(&state.stage));
                self.bar.set_message(progress_message(state));
            }
            None => self.bar.finish_and_clear(),
        }
    }
}

/// Prints a line to stderr whenever the stage or message changes.
#[derive(Default)]
pub struct PlainObserver {
    last: Mutex<Option<(Stage, String)>>,
}

impl SessionObserver for PlainObserver {
    fn on_state(&self, state: Option<&SearchState>) {
        let Some(state) = state else {
            return;
        };

        let current = (state.stage.clone(), state.message.clone());
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(&current) {
            return;
        }

        eprintln!(
            "[{}/{}] {}{}",
            (state.stage.progress_index() + 1).min(PROGRESS_STEPS.len()),
            PROGRESS_STEPS.len(),
            state.stage,
            if state.message.is_empty() {
                String::new()
            } else {
                format!(": {}", state.message)
            }
        );
        *last = Some(current);
    }
}

/// Forwards every callback to each inner observer in order.
pub struct Tee(pub Vec<Arc<dyn SessionObserver>>);

impl SessionObserver for Tee {
    fn on_state(&self, state: Option<&SearchState>) {
        for observer in &self.0 {
            observer.on_state(state);
        }
    }

    fn on_outcome(&self, outcome: &SearchOutcome) {
        for observer in &self.0 {
            observer.on_outcome(outcome);
        }
    }
}
