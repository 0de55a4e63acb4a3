use anyhow::Result;
use quizlink_core::{AppConfig, QueryParams, QuizType};
use quizlink_service::{DeepLinkDecision, ShortLinkResolver, deep_link};

use crate::build_lookup;

pub(crate) async fn run_resolve(config: &AppConfig, code: &str) -> Result<()> {
    let resolver = ShortLinkResolver::new(build_lookup(config)?);
    let outcome = resolver.resolve(code).await;
    match outcome.navigation() {
        Some(target) => println!("{}", target.path()),
        None => {
            anyhow::bail!("quiz not found for short link {code}: {}", serde_json::to_string(&outcome)?)
        },
    }
    Ok(())
}

pub(crate) fn run_normalize(quiz: &str, query: &str) -> Result<()> {
    let quiz_type: QuizType = quiz.parse()?;
    let params = QueryParams::parse(query);
    match deep_link::normalize(quiz_type, &params)? {
        DeepLinkDecision::Redirect { target } => println!("redirect {}", target.path()),
        DeepLinkDecision::Stay { start } => println!("start {}", start.path()),
    }
    Ok(())
}
