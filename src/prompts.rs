//! Prompts for the resume ⇄ job-description analysis call.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: the report schema the model is asked for
//!    and the schema [`crate::analysis::AnalysisReport`] parses must agree,
//!    and both are visible from one file.
//!
//! 2. **Testability**: unit tests can inspect prompts directly without
//!    calling a real model.

/// The five radar axes every report must contain, in display order.
pub const RADAR_SUBJECTS: [&str; 5] = [
    "Strategic Impact",
    "Technical Depth",
    "Leadership",
    "Role Alignment",
    "Cultural/Soft Skills",
];

/// System prompt for the analysis call.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an elite executive recruiter and NLP analyst. Return a highly structured professional analysis of how well a resume fits a job description.

Follow these rules precisely:

1. ANALYSIS
   - Prioritise semantic meaning over literal keyword counting
   - Judge contextual relevance: does past impact match the requirements?
   - Identify transferable competencies even when terminology differs
   - Pinpoint missing high-level responsibilities

2. SCORING
   - "atsScore" (0-100) reflects overall strategic fit
   - "breakdown" scores each dimension 0-100: skills (40% weight),
     keywords (25%), experience (20%), format (10%), grammar (5%)
   - "keywordAnalysis[].relevance" is 0-100

3. RADAR
   - "radarMetrics" contains exactly 5 entries with subjects
     "Strategic Impact", "Technical Depth", "Leadership", "Role Alignment",
     "Cultural/Soft Skills"
   - Each entry has "subject", "A" (the candidate's score) and "fullMark" (100)

4. OUTPUT FORMAT
   - Output ONLY one JSON object, no commentary, no ```json fences
   - Required keys: atsScore, breakdown {skills, keywords, experience,
     format, grammar}, matchingSkills, missingSkills, recommendations,
     keywordAnalysis [{keyword, relevance}], summary, suggestedJobRoles,
     radarMetrics [{subject, A, fullMark}]"#;

/// Build the user message carrying both documents.
pub fn analysis_user_prompt(resume_text: &str, job_description: &str) -> String {
    format!(
        "Conduct a deep semantic alignment check between the resume and the job description.\n\n\
Resume:\n\"\"\"\n{}\n\"\"\"\n\nJob Description:\n\"\"\"\n{}\n\"\"\"",
        resume_text, job_description
    )
}
