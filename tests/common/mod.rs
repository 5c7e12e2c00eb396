#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use serde_json::json;

use webrev_audit::extract::Extractor;
use webrev_audit::llm::{CompletionProvider, CompletionRequest, DispatchError, Stage};
use webrev_audit::pipeline::{Generator, Pipeline};

pub const SAMPLE_PAGE: &str = r#"<!doctype html>
<html>
  <head>
    <title>Acme Widgets</title>
    <meta name="description" content="Widgets for everyone">
  </head>
  <body>
    <h1>Welcome to Acme</h1>
    <img src="/hero.png" alt="Hero">
    <img src="/logo.png">
    <p>We make widgets.</p>
    <p>They are great.</p>
    <p>Buy some today.</p>
  </body>
</html>"#;

/// Serve `app` on an ephemeral local port.
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Provider returning a canned outcome per stage and recording what it saw.
#[derive(Default)]
pub struct ScriptedProvider {
    outcomes: HashMap<Stage, Result<String, DispatchError>>,
    pub calls: Mutex<Vec<(Stage, String)>>,
}

impl ScriptedProvider {
    pub fn with(mut self, stage: Stage, outcome: Result<String, DispatchError>) -> Self {
        self.outcomes.insert(stage, outcome);
        self
    }

    /// Every stage answers with well-formed output.
    pub fn happy() -> Self {
        Self::default()
            .with(Stage::Analyze, Ok(analysis_output().to_string()))
            .with(Stage::Redesign, Ok(redesign_output().to_string()))
            .with(Stage::Roadmap, Ok(roadmap_output().to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn credentials_seen(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
        credential: &str,
    ) -> Result<String, DispatchError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.stage, credential.to_string()));
        self.outcomes
            .get(&request.stage)
            .cloned()
            .unwrap_or_else(|| Err(DispatchError::GenerationFailed("unscripted".into())))
    }
}

pub fn pipeline_with(provider: Arc<ScriptedProvider>) -> Pipeline {
    Pipeline::new(Extractor::new().unwrap(), Generator::new(provider))
}

pub fn analysis_output() -> serde_json::Value {
    json!({
        "ui_ux_audit": { "score": 70, "issues": ["Dense layout"], "positive_findings": ["Clear title"] },
        "seo_audit": { "score": "65", "issues": "No sitemap, Thin content", "missing_elements": [] },
        "performance_audit": { "score_estimation": 88.4, "notes": "Light page" },
        "mobile_responsiveness_audit": { "score": 50, "issues": ["Fixed widths"] },
        "accessibility_audit": { "score": 45, "issues": ["Missing alt"] },
        "innovation_suggestions": [
            { "name": "Configurator", "description": "Build your widget", "category": "Interactive" }
        ],
        "recommendation_engine": {
            "priority_actions": [
                { "action": "Add alt text", "impact": "high", "difficulty": "Low",
                  "why_it_matters": "Accessibility", "description": "Describe images" }
            ]
        }
    })
}

pub fn redesign_output() -> serde_json::Value {
    json!({
        "color_palette": { "primary": "#0F172A", "secondary": "#1E293B", "accent": "#22D3EE" },
        "typography_recommendation": { "headings": "Inter", "body": "Source Sans" },
        "layout_suggestions": { "hero_section": "Split", "navigation": "Sticky", "key_sections": "Features, Pricing" },
        "wireframe_description": "Hero, features grid, testimonials",
        "visual_preview": {
            "hero": { "headline": "Widgets, reimagined", "subheadline": "Built to last", "cta_text": "Shop" },
            "features": [{ "title": "Durable", "description": "Steel core", "icon": "shield" }],
            "testimonials": [{ "quote": "Love it", "author": "Pat" }]
        }
    })
}

pub fn roadmap_output() -> serde_json::Value {
    json!({
        "tech_stack_recommendation": { "frontend": ["Next.js", "Tailwind"], "backend": "Axum", "tools": "Jest, Vite, ESLint" },
        "migration_steps": [{ "step": "Set up CI" }, "Deploy"],
        "component_list": ["Navbar", "Hero"],
        "estimated_timeline": { "duration": "6 weeks" }
    })
}
