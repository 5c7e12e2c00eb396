use serde::{Deserialize, Serialize};

// ── Extraction ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Tag name, `h1` through `h6`.
    pub level: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// Bounded fact set pulled out of one fetched page.
///
/// `image_count` counts every usable `<img>` even though `images` is capped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractedPage {
    pub url: String,
    pub title: String,
    pub description: String,
    pub headings: Vec<Heading>,
    pub images: Vec<ImageRef>,
    pub image_count: usize,
    pub content: Vec<String>,
    #[serde(alias = "rawHtml")]
    pub raw_size_bytes: usize,
}

// ── Audit ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiUxAudit {
    pub score: u8,
    pub issues: Vec<String>,
    pub positive_findings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoAudit {
    pub score: u8,
    pub issues: Vec<String>,
    pub missing_elements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAudit {
    pub score_estimation: u8,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueAudit {
    pub score: u8,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InnovationCategory {
    Personalization,
    Gamification,
    #[serde(rename = "AI/Chatbot")]
    AiChatbot,
    Interactive,
    #[serde(rename = "Micro-interaction")]
    MicroInteraction,
    Other,
}

impl InnovationCategory {
    pub const NAMES: &'static [&'static str] = &[
        "Personalization",
        "Gamification",
        "AI/Chatbot",
        "Interactive",
        "Micro-interaction",
        "Other",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnovationSuggestion {
    pub name: String,
    pub description: String,
    pub category: InnovationCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub const NAMES: &'static [&'static str] = &["High", "Medium", "Low"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAction {
    pub action: String,
    pub impact: Level,
    pub difficulty: Level,
    pub why_it_matters: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEngine {
    pub priority_actions: Vec<PriorityAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ui_ux_audit: UiUxAudit,
    pub seo_audit: SeoAudit,
    pub performance_audit: PerformanceAudit,
    pub mobile_responsiveness_audit: IssueAudit,
    pub accessibility_audit: IssueAudit,
    pub innovation_suggestions: Vec<InnovationSuggestion>,
    pub recommendation_engine: RecommendationEngine,
}

// ── Redesign ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub headings: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSuggestions {
    pub hero_section: String,
    pub navigation: String,
    pub key_sections: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub headline: String,
    pub subheadline: String,
    pub cta_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub title: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub quote: String,
    pub author: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualPreview {
    pub hero: Hero,
    pub features: Vec<Feature>,
    pub testimonials: Vec<Testimonial>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedesignResult {
    pub color_palette: ColorPalette,
    pub typography_recommendation: Typography,
    pub layout_suggestions: LayoutSuggestions,
    pub wireframe_description: String,
    pub visual_preview: VisualPreview,
}

// ── Roadmap ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechStack {
    pub frontend: String,
    pub backend: String,
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadmapResult {
    pub tech_stack_recommendation: TechStack,
    pub migration_steps: Vec<String>,
    pub component_list: Vec<String>,
    pub estimated_timeline: String,
}

// ── Request bodies ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub data: Option<ExtractedPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedesignRequest {
    #[serde(default)]
    pub data: Option<ExtractedPage>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoadmapRequest {
    #[serde(default)]
    pub data: Option<ExtractedPage>,
    #[serde(default)]
    pub redesign: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}
