//! Prompts for screenplay analysis.
//!
//! Every prompt lives here so the orchestrator stays a single loop over
//! [`Category::ALL`] and prompt wording can be inspected by unit tests without
//! a live model.
//!
//! Callers can override the system prompt via
//! [`crate::config::AnalysisConfig::system_prompt`]; the category instructions
//! are fixed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default system prompt framing the assistant's role.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI chatbot automating script improvements and providing \
data-driven insights (casting, budget, scheduling, marketing) to film producers.";

/// One of the nine fixed analysis topics, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Logline")]
    Logline,
    #[serde(rename = "Genre")]
    Genre,
    #[serde(rename = "Top Keywords")]
    TopKeywords,
    #[serde(rename = "Location Setting")]
    LocationSetting,
    #[serde(rename = "Synopsis")]
    Synopsis,
    #[serde(rename = "Script Score")]
    ScriptScore,
    #[serde(rename = "Plot Assessment")]
    PlotAssessment,
    #[serde(rename = "Character Profiling")]
    CharacterProfiling,
    #[serde(rename = "Box Office Collection")]
    BoxOfficeCollection,
}

impl Category {
    /// All categories in the fixed report order.
    pub const ALL: [Category; 9] = [
        Category::Logline,
        Category::Genre,
        Category::TopKeywords,
        Category::LocationSetting,
        Category::Synopsis,
        Category::ScriptScore,
        Category::PlotAssessment,
        Category::CharacterProfiling,
        Category::BoxOfficeCollection,
    ];

    /// Human-readable label used as the result key and report heading.
    pub fn label(self) -> &'static str {
        match self {
            Category::Logline => "Logline",
            Category::Genre => "Genre",
            Category::TopKeywords => "Top Keywords",
            Category::LocationSetting => "Location Setting",
            Category::Synopsis => "Synopsis",
            Category::ScriptScore => "Script Score",
            Category::PlotAssessment => "Plot Assessment",
            Category::CharacterProfiling => "Character Profiling",
            Category::BoxOfficeCollection => "Box Office Collection",
        }
    }

    /// Look a category up by its label.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Zero-based position in the report.
    pub fn position(self) -> usize {
        Category::ALL
            .iter()
            .position(|&c| c == self)
            .unwrap_or_default()
    }

    /// The category-specific instruction placed before the screenplay.
    pub fn instruction(self) -> &'static str {
        match self {
            Category::Logline => {
                "Write a Hollywood-style logline for my screenplay. It should only contain the \
logline, making it engaging and high-concept."
            }
            Category::Genre => {
                "Suggest the genre for the provided screenplay. By genre, we mean a particular \
type or style of literature, art, film, or music recognizable by its special characteristics."
            }
            Category::TopKeywords => {
                "Give the top 10 keywords of the attached movie screenplay without any explanation."
            }
            Category::LocationSetting => {
                "Give the location setting of the attached movie screenplay, considering only the \
primary location."
            }
            Category::Synopsis => "Give only the synopsis of the attached screenplay.",
            Category::ScriptScore => {
                "Analyze the attached screenplay and give it a script score out of 10, including:
- Character development score (out of 10) with 1-2 lines explanation
- Plot construction (out of 10) with 1-2 lines explanation
- Dialogue (out of 10) with 1-2 lines explanation
- Originality (out of 10) with 1-2 lines explanation
- Emotional engagement (out of 10) with 1-2 lines explanation
- Theme and message (out of 10) with 1-2 lines explanation
- Overall rating out of 10 with explanation"
            }
            Category::PlotAssessment => {
                "Analyze the attached screenplay and give the plot assessment and enhancement, including:
- 5 points of what is working well (positive aspects)
- 5 points where the screenplay lacks
- 5 points of improvements that may be made
- An overall review of the screenplay"
            }
            Category::CharacterProfiling => {
                "Analyze the attached screenplay and return character profiling for the main characters, including:
- Brief description of each main character
- What is working well for each character
- Areas for improvement
- The archetype for each"
            }
            Category::BoxOfficeCollection => {
                "Analyze the attached screenplay and give its box office prediction with the following fields:
- Opening day (global and local)
- Opening week (global and local)
- Opening month (global and local)"
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Build a user prompt: the instruction, then the full screenplay between
/// triple-quote markers.
pub fn build_prompt(instruction: &str, screenplay: &str) -> String {
    format!(
        "{}\n\nScreenplay:\n\"\"\"{}\"\"\"",
        instruction, screenplay
    )
}

/// Build the user prompt for one analysis category.
pub fn category_prompt(category: Category, screenplay: &str) -> String {
    build_prompt(category.instruction(), screenplay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_in_report_order() {
        let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Logline",
                "Genre",
                "Top Keywords",
                "Location Setting",
                "Synopsis",
                "Script Score",
                "Plot Assessment",
                "Character Profiling",
                "Box Office Collection",
            ]
        );
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.position(), i);
        }
    }

    #[test]
    fn label_lookup_round_trips() {
        for c in Category::ALL {
            assert_eq!(Category::from_label(c.label()), Some(c));
        }
        assert_eq!(Category::from_label("Budget"), None);
    }

    #[test]
    fn serde_uses_labels() {
        let json = serde_json::to_string(&Category::BoxOfficeCollection).unwrap();
        assert_eq!(json, "\"Box Office Collection\"");
    }

    #[test]
    fn prompt_wraps_screenplay_in_markers() {
        let p = category_prompt(Category::Synopsis, "INT. KITCHEN - DAY");
        assert!(p.starts_with("Give only the synopsis"));
        assert!(p.ends_with("Screenplay:\n\"\"\"INT. KITCHEN - DAY\"\"\""));
    }

    #[test]
    fn empty_screenplay_still_carries_instruction() {
        let p = category_prompt(Category::Genre, "");
        assert!(p.contains("Suggest the genre"));
        assert!(p.ends_with("\"\"\"\"\"\""));
    }
}
