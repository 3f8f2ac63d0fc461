use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─── SpecField ────────────────────────────────────────────────────────────

/// One regenerable field of a drafted project specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecField {
    Description,
    Architecture,
    FrontendLanguage,
    FrontendPlatform,
    FrontendLibrary,
    BackendLanguage,
    BackendPlatform,
    BackendLibrary,
}

impl SpecField {
    pub fn all() -> &'static [SpecField] {
        &[
            SpecField::Description,
            SpecField::Architecture,
            SpecField::FrontendLanguage,
            SpecField::FrontendPlatform,
            SpecField::FrontendLibrary,
            SpecField::BackendLanguage,
            SpecField::BackendPlatform,
            SpecField::BackendLibrary,
        ]
    }

    /// Dotted JSON path used in prompts and replies (`frontend.language`).
    pub fn path(self) -> &'static str {
        match self {
            SpecField::Description => "description",
            SpecField::Architecture => "architecture",
            SpecField::FrontendLanguage => "frontend.language",
            SpecField::FrontendPlatform => "frontend.platform",
            SpecField::FrontendLibrary => "frontend.library",
            SpecField::BackendLanguage => "backend.language",
            SpecField::BackendPlatform => "backend.platform",
            SpecField::BackendLibrary => "backend.library",
        }
    }

    /// Flat column name (`frontend_language`).
    pub fn key(self) -> &'static str {
        match self {
            SpecField::Description => "description",
            SpecField::Architecture => "architecture",
            SpecField::FrontendLanguage => "frontend_language",
            SpecField::FrontendPlatform => "frontend_platform",
            SpecField::FrontendLibrary => "frontend_library",
            SpecField::BackendLanguage => "backend_language",
            SpecField::BackendPlatform => "backend_platform",
            SpecField::BackendLibrary => "backend_library",
        }
    }

    /// Human-readable label shown next to the value.
    pub fn label(self) -> &'static str {
        match self {
            SpecField::Description => "Project description",
            SpecField::Architecture => "System architecture",
            SpecField::FrontendLanguage => "Frontend language",
            SpecField::FrontendPlatform => "Frontend platform",
            SpecField::FrontendLibrary => "Frontend library",
            SpecField::BackendLanguage => "Backend language",
            SpecField::BackendPlatform => "Backend platform",
            SpecField::BackendLibrary => "Backend library",
        }
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for SpecField {
    type Err = String;

    /// Accepts the dotted path, the flat key, or the label (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        SpecField::all()
            .iter()
            .copied()
            .find(|f| {
                f.path() == needle || f.key() == needle || f.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| format!("unknown field: {s}"))
    }
}

// ─── Prompts ──────────────────────────────────────────────────────────────

pub const DEFAULT_LANGUAGE: &str = "Traditional Chinese";

/// Appended to the prompt of the last-chance request after every retry failed.
pub const FALLBACK_SUFFIX: &str =
    "\nOutput the complete JSON; do not leave anything empty or malformed.";

/// Prompt for a first full draft of `project_name`.
pub fn generate_prompt(project_name: &str, language: &str) -> String {
    format!(
        r#"You are a senior system designer.
Based on the project name "{project_name}" entered by the user, produce a first-draft system design as standard JSON.
Write every value in {language}, and output only JSON with no extra text.

The JSON structure is:
{{
    "project_name": "{project_name}",
    "description": "what the system is for and what makes it distinctive",
    "architecture": "overall system architecture and its main modules",
    "frontend": {{
        "language": "frontend language (e.g. JavaScript, TypeScript)",
        "platform": "frontend platform (e.g. Web, App)",
        "library": "main frontend framework (e.g. React, Vue.js)"
    }},
    "backend": {{
        "language": "backend language (e.g. Python, Rust)",
        "platform": "backend platform (e.g. FastAPI, Axum)",
        "library": "main backend library (e.g. SQLAlchemy, Diesel)"
    }}
}}
The output must start with {{ and end with }}."#
    )
}

/// Prompt asking for fresh values of `fields` only.
pub fn regenerate_prompt(project_name: &str, fields: &[SpecField], language: &str) -> String {
    let field_list = fields
        .iter()
        .map(|f| f.path())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"Your role: systems analysis and architecture design expert.
For the project named "{project_name}", regenerate only these fields:
{field_list}

Write every value in {language} and output JSON directly, with no other text.
Fields under frontend or backend go into the matching nested object.
Example:
{{
  "description": "new description",
  "architecture": "new architecture",
  "frontend": {{
    "language": "TypeScript",
    "platform": "Web",
    "library": "React"
  }},
  "backend": {{
    "language": "Rust",
    "platform": "Axum",
    "library": "SQLx"
  }}
}}
The output must start with {{ and end with }}."#
    )
}
