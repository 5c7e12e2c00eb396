//! Instruction text for each generation stage.
//!
//! Every prompt spells out the exact output shape so the model is steered onto
//! the canonical schema the normalizer later enforces.

use serde_json::json;

use crate::models::{ExtractedPage, InnovationCategory, Level};

/// Headings passed to the redesign stage.
pub const REDESIGN_HEADING_LIMIT: usize = 10;

const DEFAULT_REDESIGN_CONTEXT: &str = "Modernize UI and stack";

pub fn analyze_prompt(page: &ExtractedPage) -> String {
    let levels = enum_alternatives(Level::NAMES);
    let categories = enum_alternatives(InnovationCategory::NAMES);

    [
        "You are an expert Website Auditor and Product Designer.".to_string(),
        "Analyze the following website data and provide a comprehensive audit.".to_string(),
        String::new(),
        "Website Data:".to_string(),
        format!("URL: {}", page.url),
        format!("Title: {}", page.title),
        format!("Description: {}", page.description),
        format!("Headings: {}", json!(page.headings)),
        format!("Image Count: {}", page.image_count),
        format!("Content Snippets: {}", json!(page.content)),
        String::new(),
        "Return a strict JSON response with the following structure:".to_string(),
        "{".to_string(),
        "  \"ui_ux_audit\": {".to_string(),
        "    \"score\": number (0-100),".to_string(),
        "    \"issues\": [\"string\"],".to_string(),
        "    \"positive_findings\": [\"string\"]".to_string(),
        "  },".to_string(),
        "  \"seo_audit\": {".to_string(),
        "    \"score\": number (0-100),".to_string(),
        "    \"issues\": [\"string\"],".to_string(),
        "    \"missing_elements\": [\"string\"]".to_string(),
        "  },".to_string(),
        "  \"performance_audit\": {".to_string(),
        "    \"score_estimation\": number (0-100),".to_string(),
        "    \"notes\": \"string\"".to_string(),
        "  },".to_string(),
        "  \"mobile_responsiveness_audit\": { \"score\": number (0-100), \"issues\": [\"string\"] },"
            .to_string(),
        "  \"accessibility_audit\": { \"score\": number (0-100), \"issues\": [\"string\"] },"
            .to_string(),
        "  \"innovation_suggestions\": [".to_string(),
        format!(
            "    {{ \"name\": \"string\", \"description\": \"string\", \"category\": {} }}",
            categories
        ),
        "  ],".to_string(),
        "  \"recommendation_engine\": {".to_string(),
        "    \"priority_actions\": [".to_string(),
        format!(
            "      {{ \"action\": \"string\", \"impact\": {levels}, \"difficulty\": {levels}, \"why_it_matters\": \"string\", \"description\": \"string\" }}"
        ),
        "    ]".to_string(),
        "  }".to_string(),
        "}".to_string(),
        String::new(),
        "Do not include any markdown formatting or explanation outside the JSON.".to_string(),
    ]
    .join("\n")
}

pub fn redesign_prompt(page: &ExtractedPage, custom_prompt: Option<&str>) -> String {
    let instruction = custom_prompt.filter(|s| !s.trim().is_empty());
    let headings = &page.headings[..page.headings.len().min(REDESIGN_HEADING_LIMIT)];

    let site = json!({
        "title": page.title,
        "description": page.description,
        "headings": headings,
        "imageCount": page.image_count,
    });

    let mut lines = vec![
        "You are an expert UI / UX Designer and Product Architect.".to_string(),
        "Based on the following website data, generate a complete, high-fidelity redesign plan."
            .to_string(),
        String::new(),
        "Website Data:".to_string(),
        site.to_string(),
        String::new(),
    ];

    if let Some(instruction) = instruction {
        lines.push(format!("USER STRICT INSTRUCTION: {}", instruction));
        lines.push(
            "This instruction takes precedence over any default styling guidance below."
                .to_string(),
        );
        lines.push(String::new());
    }

    lines.extend(
        [
            "Requirements:",
            "1. High-fidelity mockups description.",
            "2. Multiple layout variations (Desktop + Mobile).",
            "3. Updated modern color palette and typography.",
            "4. Component-level UI breakdown.",
            "",
            "CRITICAL: Provide a \"visual_preview\" object with content for a Hero section, 3 key Features, and 2 Testimonials.",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    lines.push(match instruction {
        Some(_) => "Ensure the visual_preview and color_palette strictly reflect the USER STRICT INSTRUCTION above.".to_string(),
        None => "Focus on improving engagement and quality.".to_string(),
    });

    lines.extend(
        [
            "",
            "Return the response as a valid JSON object matching this schema:",
            "{",
            "  \"color_palette\": { \"primary\": \"#hex\", \"secondary\": \"#hex\", \"accent\": \"#hex\", \"background\": \"#hex\", \"text\": \"#hex\" },",
            "  \"typography_recommendation\": { \"headings\": \"string\", \"body\": \"string\" },",
            "  \"layout_suggestions\": { \"hero_section\": \"string\", \"navigation\": \"string\", \"key_sections\": [\"string\"] },",
            "  \"wireframe_description\": \"string\",",
            "  \"visual_preview\": {",
            "    \"hero\": { \"headline\": \"string\", \"subheadline\": \"string\", \"cta_text\": \"string\" },",
            "    \"features\": [{ \"title\": \"string\", \"description\": \"string\", \"icon\": \"lucide-react icon name\" }],",
            "    \"testimonials\": [{ \"quote\": \"string\", \"author\": \"string\" }]",
            "  }",
            "}",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    lines.join("\n")
}

pub fn roadmap_prompt(page: &ExtractedPage, redesign: Option<&serde_json::Value>) -> String {
    let proposed = match redesign {
        Some(value) if !value.is_null() => value.to_string(),
        _ => json!(DEFAULT_REDESIGN_CONTEXT).to_string(),
    };

    [
        "Create a Technical Implementation Roadmap for upgrading this website.".to_string(),
        "Context:".to_string(),
        format!("Title: {}", page.title),
        format!("Proposed Redesign: {}", proposed),
        String::new(),
        "Requirements:".to_string(),
        "1. Information Architecture updates.".to_string(),
        "2. Required React components list.".to_string(),
        "3. Suggested Tech Stack (Frontend, Backend, Tools).".to_string(),
        "4. Integration/Migration steps.".to_string(),
        "5. Developer-ready guidelines.".to_string(),
        String::new(),
        "Return a strict JSON object with exactly this structure:".to_string(),
        "{".to_string(),
        "  \"tech_stack_recommendation\": { \"frontend\": \"string\", \"backend\": \"string\", \"tools\": [\"string\"] },".to_string(),
        "  \"migration_steps\": [\"string\"],".to_string(),
        "  \"component_list\": [\"string\"],".to_string(),
        "  \"estimated_timeline\": \"string (in weeks)\"".to_string(),
        "}".to_string(),
        "migration_steps must be plain strings in order, including IA updates.".to_string(),
    ]
    .join("\n")
}

fn enum_alternatives(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("\"{}\"", n))
        .collect::<Vec<_>>()
        .join(" | ")
}
