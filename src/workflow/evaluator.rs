//! Generate, critique, refine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use super::resolve_agents;
use crate::agent::{AgentDirectory, Delegate};
use crate::error::SwarmError;
use crate::util::json::parse_reply;

/// Quality grade given by the evaluator. Ordered from worst to best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum Rating {
    #[strum(serialize = "poor")]
    Poor,
    #[strum(serialize = "fair")]
    Fair,
    #[strum(serialize = "good")]
    Good,
    #[strum(to_string = "excellent", serialize = "excelent", serialize = "execelent")]
    Excellent,
}

impl TryFrom<String> for Rating {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse()
    }
}

impl From<Rating> for String {
    fn from(value: Rating) -> Self {
        value.to_string()
    }
}

/// The evaluator's verdict on one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub rating: Rating,
    #[serde(default)]
    pub feedback: String,
    pub needs_improvement: bool,
    #[serde(default)]
    pub focus_areas: Vec<String>,
}

/// Asks the generator for a candidate and the evaluator for a verdict,
/// feeding feedback back to the generator until the evaluator is satisfied.
///
/// The first draft is followed by at most `max_refinements` refined ones.
pub struct EvaluatorOptimizer {
    generator_name: String,
    evaluator_name: String,
    max_refinements: u32,
    min_rating: Option<Rating>,
    generator: Option<Arc<dyn Delegate>>,
    evaluator: Option<Arc<dyn Delegate>>,
}

impl EvaluatorOptimizer {
    pub fn new(
        generator_name: impl Into<String>,
        evaluator_name: impl Into<String>,
        max_refinements: u32,
        min_rating: Option<Rating>,
    ) -> Self {
        Self {
            generator_name: generator_name.into(),
            evaluator_name: evaluator_name.into(),
            max_refinements,
            min_rating,
            generator: None,
            evaluator: None,
        }
    }

    pub fn agent_names(&self) -> Vec<String> {
        vec![self.generator_name.clone(), self.evaluator_name.clone()]
    }

    pub(super) fn attach(&mut self, directory: &AgentDirectory) -> Result<(), SwarmError> {
        let mut resolved = resolve_agents(directory, &self.agent_names())?.into_iter();
        self.generator = resolved.next();
        self.evaluator = resolved.next();
        Ok(())
    }

    pub async fn run(&self, input: &str) -> Result<String, SwarmError> {
        let (Some(generator), Some(evaluator)) = (&self.generator, &self.evaluator) else {
            return Err(SwarmError::InvalidState(
                "evaluator-optimizer used before its agents were attached".into(),
            ));
        };

        let mut prompt = input.to_string();
        let mut best: Option<(Rating, String)> = None;

        for round in 0..=self.max_refinements {
            let candidate = generator.delegate(&prompt).await?;
            let verdict = evaluator.delegate(&evaluation_prompt(input, &candidate)).await?;
            let evaluation: Evaluation =
                parse_reply(&format!("evaluation from {}", evaluator.name()), &verdict)?;
            debug!(round, rating = %evaluation.rating, needs_improvement = evaluation.needs_improvement, "evaluated candidate");

            let good_enough = self.min_rating.is_some_and(|min| evaluation.rating >= min);
            if !evaluation.needs_improvement || good_enough {
                info!(round, rating = %evaluation.rating, "candidate accepted");
                return Ok(candidate);
            }

            if best.as_ref().map_or(true, |(rating, _)| evaluation.rating >= *rating) {
                best = Some((evaluation.rating, candidate));
            }
            prompt = refinement_prompt(input, &evaluation);
        }

        info!(max_refinements = self.max_refinements, "refinement budget exhausted, returning best candidate");
        Ok(best.map(|(_, candidate)| candidate).unwrap_or_default())
    }
}

fn evaluation_prompt(request: &str, candidate: &str) -> String {
    format!(
        "Evaluate the response below against the original request.\n\n\
         Request:\n{request}\n\nResponse:\n{candidate}\n\n\
         Reply with JSON only: {{\"rating\": \"poor|fair|good|excellent\", \"feedback\": string, \
         \"needs_improvement\": bool, \"focus_areas\": [string]}}"
    )
}

fn refinement_prompt(request: &str, evaluation: &Evaluation) -> String {
    let mut prompt = format!("{request}\n\nFeedback on the previous attempt:\n{}", evaluation.feedback);
    if !evaluation.focus_areas.is_empty() {
        prompt.push_str("\n\nFocus on:\n");
        prompt.push_str(
            &evaluation
                .focus_areas
                .iter()
                .map(|area| format!("- {area}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    prompt
}
