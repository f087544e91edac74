//! Prompt text for lesson and quiz generation.

/// Builds the lesson prompt for `topic`.
#[must_use]
pub fn lesson_prompt(topic: &str) -> String {
    format!(
        "You are an AWS certification tutor.\n\
         \n\
         Teach the section: {topic}\n\
         \n\
         Respond using:\n\
         - Concept\n\
         - Real World Example\n\
         - Exam Tips\n\
         - Common Mistakes\n"
    )
}

/// Builds the quiz prompt asking for `question_count` questions on `topic`.
///
/// The requested shape matches what `Quiz::decode` accepts.
#[must_use]
pub fn quiz_prompt(topic: &str, question_count: u32) -> String {
    format!(
        "Generate {question_count} AWS certification MCQs for section: {topic}\n\
         \n\
         Return ONLY valid JSON in this format:\n\
         \n\
         {{\n  \"questions\": [\n    {{\n      \"question\": \"...\",\n      \
         \"options\": [\"A\", \"B\", \"C\", \"D\"],\n      \
         \"answer\": \"Correct Option Text\"\n    }}\n  ]\n}}\n"
    )
}
