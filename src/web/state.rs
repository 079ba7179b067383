use crate::{Config, grading::ScoringPolicy, model::ModelManager};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    config: &'static Config,
}

impl AppState {
    pub fn new(mm: ModelManager, config: &'static Config) -> Self {
        Self { mm, config }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn config(&self) -> &'static Config {
        self.config
    }

    pub fn scoring_policy(&self) -> ScoringPolicy {
        self.config.grading().policy()
    }
}
