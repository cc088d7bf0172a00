use async_trait::async_trait;
use ayushlens::{AnalysisError, ContentRequest, GenerateResult, GenerativeModel};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted reply from the fake model.
#[allow(dead_code)]
pub enum Step {
    Text(String),
    Transport(String),
    /// Never answers
    Stall,
}

/// A model that replays a script and records every request it sees.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ContentRequest>>,
}

#[allow(dead_code)]
impl ScriptedModel {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(json: Value) -> Self {
        Self::new(vec![Step::Text(json.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ContentRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ContentRequest) -> Result<GenerateResult, AnalysisError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Text(text)) => Ok(GenerateResult::text(text)),
            Some(Step::Transport(msg)) => Err(AnalysisError::Transport(msg)),
            Some(Step::Stall) => std::future::pending().await,
            None => Err(AnalysisError::Transport("script exhausted".to_string())),
        }
    }
}

/// A well-formed analysis payload.
#[allow(dead_code)]
pub fn analysis_json(primary: &str, severity: &str) -> Value {
    json!({
        "primaryCondition": primary,
        "correlationReport": [
            { "name": primary, "likelihood": 0.8, "reason": "Cough and fever are typical" },
            { "name": "Influenza", "likelihood": 0.15, "reason": "Fever is mild" }
        ],
        "severity": severity,
        "recommendations": ["Rest", "Hydrate"],
        "disclaimer": "I am an AI, not a doctor. This is not a medical diagnosis.",
        "summary": "Symptoms are consistent with a mild viral infection."
    })
}
