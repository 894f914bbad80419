//! Analysis result types.

use crate::error::RaincheckError;
use crate::pipeline::markup::clean_markup;
use crate::prompts::Category;
use serde::{Deserialize, Serialize};

/// The response for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionResult {
    pub category: Category,
    /// Raw response text as returned by the model.
    pub content: String,
    #[serde(default)]
    pub input_tokens: usize,
    #[serde(default)]
    pub output_tokens: usize,
    #[serde(default)]
    pub duration_ms: u64,
}

impl SectionResult {
    pub fn new(category: Category, content: impl Into<String>) -> Self {
        Self {
            category,
            content: content.into(),
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
        }
    }

    /// Response with lightweight markup removed.
    pub fn cleaned(&self) -> String {
        clean_markup(&self.content)
    }
}

/// Responses for all nine categories, in fixed category order.
///
/// Construction and deserialisation both reject a section list that is
/// missing a category, repeats one, or is out of order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SectionResult>", into = "Vec<SectionResult>")]
pub struct AnalysisResult {
    sections: Vec<SectionResult>,
}

impl AnalysisResult {
    /// Validate and wrap a section list.
    pub fn try_from_sections(sections: Vec<SectionResult>) -> Result<Self, RaincheckError> {
        validate_sections(&sections)?;
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[SectionResult] {
        &self.sections
    }

    /// Raw response for a category.
    pub fn get(&self, category: Category) -> &str {
        &self.sections[category.position()].content
    }

    /// `(category, raw response)` pairs in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> {
        self.sections.iter().map(|s| (s.category, s.content.as_str()))
    }

    /// The display surface as Markdown: a bold header, then per category a
    /// bold label line, the cleaned body and a blank line.
    pub fn display_markdown(&self) -> String {
        let mut out = String::from("**Analysis Results**\n\n");
        for section in &self.sections {
            out.push_str(&format!("**{}:**\n", section.category.label()));
            out.push_str(&section.cleaned());
            out.push_str("\n\n");
        }
        out
    }
}

impl TryFrom<Vec<SectionResult>> for AnalysisResult {
    type Error = RaincheckError;

    fn try_from(sections: Vec<SectionResult>) -> Result<Self, Self::Error> {
        Self::try_from_sections(sections)
    }
}

impl From<AnalysisResult> for Vec<SectionResult> {
    fn from(result: AnalysisResult) -> Self {
        result.sections
    }
}

/// Check that `sections` holds exactly the nine categories in fixed order.
pub fn validate_sections(sections: &[SectionResult]) -> Result<(), RaincheckError> {
    let missing: Vec<&str> = Category::ALL
        .iter()
        .filter(|c| !sections.iter().any(|s| s.category == **c))
        .map(|c| c.label())
        .collect();
    if !missing.is_empty() {
        return Err(RaincheckError::IncompleteAnalysis {
            detail: format!("missing categories: {}", missing.join(", ")),
        });
    }

    if sections.len() != Category::ALL.len() {
        return Err(RaincheckError::IncompleteAnalysis {
            detail: format!(
                "expected {} sections, got {}",
                Category::ALL.len(),
                sections.len()
            ),
        });
    }

    for (i, (section, expected)) in sections.iter().zip(Category::ALL).enumerate() {
        if section.category != expected {
            return Err(RaincheckError::IncompleteAnalysis {
                detail: format!(
                    "expected '{}' at position {}, found '{}'",
                    expected,
                    i + 1,
                    section.category
                ),
            });
        }
    }

    Ok(())
}

/// Aggregate statistics for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Remote calls that returned a response.
    pub calls: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Wall-clock time for the whole batch.
    pub duration_ms: u64,
}

/// A completed analysis and its statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub result: AnalysisResult,
    pub stats: AnalysisStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_sections() -> Vec<SectionResult> {
        Category::ALL
            .iter()
            .map(|c| SectionResult::new(*c, format!("**{}** answer", c.label())))
            .collect()
    }

    #[test]
    fn complete_sections_are_accepted() {
        let result = AnalysisResult::try_from_sections(full_sections()).unwrap();
        assert_eq!(result.sections().len(), 9);
        assert_eq!(result.get(Category::Genre), "**Genre** answer");
        let order: Vec<Category> = result.iter().map(|(c, _)| c).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }

    #[test]
    fn missing_category_is_rejected() {
        let mut sections = full_sections();
        sections.remove(Category::Synopsis.position());
        let err = AnalysisResult::try_from_sections(sections).unwrap_err();
        assert!(err.to_string().contains("Synopsis"), "got: {err}");
    }

    #[test]
    fn reordered_sections_are_rejected() {
        let mut sections = full_sections();
        sections.swap(0, 1);
        let err = validate_sections(&sections).unwrap_err();
        assert!(err.to_string().contains("position 1"), "got: {err}");
    }

    #[test]
    fn duplicate_sections_are_rejected() {
        let mut sections = full_sections();
        sections.push(SectionResult::new(Category::Logline, "again"));
        assert!(validate_sections(&sections).is_err());
    }

    #[test]
    fn display_markdown_uses_cleaned_bodies() {
        let result = AnalysisResult::try_from_sections(full_sections()).unwrap();
        let md = result.display_markdown();
        assert!(md.starts_with("**Analysis Results**\n\n**Logline:**\nLogline answer\n\n"));
        assert!(md.contains("**Box Office Collection:**\nBox Office Collection answer\n\n"));
    }

    #[test]
    fn json_round_trip_validates() {
        let result = AnalysisResult::try_from_sections(full_sections()).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);

        let short = serde_json::to_string(&full_sections()[..8]).unwrap();
        assert!(serde_json::from_str::<AnalysisResult>(&short).is_err());
    }
}
