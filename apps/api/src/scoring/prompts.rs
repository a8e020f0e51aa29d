pub const SKILL_DETECTION_SYSTEM: &str = "You are a precise technical recruiter. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Placeholders: {skills}, {job_title}, {resume_text}.
pub const SKILL_DETECTION_PROMPT: &str = r#"A candidate applied for the role "{job_title}".

Decide which of these skills the résumé below demonstrates, including synonyms
and closely related phrasing (for example "Postgres" demonstrates "SQL"):
{skills}

Also report the candidate's total years of professional experience.

Return exactly this JSON shape:
{"detected_skills": ["<skill copied verbatim from the list>"], "experience_years": <integer>, "summary": "<one sentence>"}

Résumé:
---
{resume_text}
---"#;
