//! Synthesis prompt composition

use crate::types::ImageAnalysis;

/// Build the prompt that asks for one narrative over text and image findings.
///
/// Images are numbered by their position among the analyses, so "Image 1"
/// is always the first described slot.
pub fn synthesis_prompt(query: &str, text_results: &str, analyses: &[ImageAnalysis]) -> String {
    let images = if analyses.is_empty() {
        "No images were analyzed.".to_string()
    } else {
        analyses
            .iter()
            .enumerate()
            .map(|(n, analysis)| format!("Image {}\n{}", n + 1, analysis.outcome))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "Query: {query}\n\n\
         Text Analysis:\n{text_results}\n\n\
         Image Analyses:\n{images}\n\n\
         Separate images by their order in this way:\n\
         Image n\n\
         Content of the image n\n\n\
         Please provide a comprehensive analysis that:\n\
         1. Connects the visual and textual information\n\
         2. Highlights the most relevant findings\n\
         3. Ensures all information relates to the original query\n\
         4. Identifies any discrepancies or inconsistencies\n"
    )
}
