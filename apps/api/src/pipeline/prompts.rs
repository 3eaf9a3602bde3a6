// All LLM prompt constants for the pipeline stages.
// Cross-cutting fragments live in llm_client::prompts; every template here
// uses `{placeholder}` substitution via str::replace before sending.

/// System prompt for JD parsing — enforces JSON-only output.
pub const PARSE_JD_SYSTEM: &str = "You are a job description parser. \
    Extract key information from a raw job description. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// JD parsing prompt template. Replace `{jd_text}` before sending.
pub const PARSE_JD_PROMPT_TEMPLATE: &str = r#"Parse the following job description and extract structured information.

Return a JSON object with this EXACT schema (no extra fields):
{
  "job_title": "...",
  "company": "...",
  "skills_required": ["skill1", "skill2"],
  "responsibilities": ["resp1", "resp2"]
}

Rules:
- "company" may be null if the posting does not name one
- "skills_required" lists concrete technologies and competencies only
- "responsibilities" preserves the order they appear in the posting

JOB DESCRIPTION:
{jd_text}"#;

/// System prompt for the skill-gap analysis.
pub const SKILL_GAP_SYSTEM: &str = "You are a technical recruiter doing a skills gap analysis. \
    Compare the required skills against the candidate's resume. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Skill-gap prompt template.
/// Replace: `{skills}`, `{resume_context}`.
pub const SKILL_GAP_PROMPT_TEMPLATE: &str = r#"Compare the required skills against the candidate's resume and return ONLY valid JSON:
{
  "matched_skills": ["skill1", "skill2"],
  "missing_skills": ["skill3"],
  "match_score": 85,
  "summary": "Brief 1-2 sentence assessment"
}
match_score is an integer 0-100 based on overall fit.
Every required skill must appear in exactly one of matched_skills or missing_skills.

Required skills: {skills}

Candidate's resume (relevant sections):
{resume_context}"#;

/// System prompt for cover letter generation — plain text output.
pub const COVER_LETTER_SYSTEM: &str = "You are an expert career coach writing cover letters.

IMPORTANT: Extract the candidate's full name, address, phone, and email from the contact info provided and use them to format the letter properly.

Rules:
- Keep it under 350 words
- Focus on matched skills and specific achievements
- Do NOT use generic phrases like 'I am excited to apply'
- Be confident, specific, and show genuine value
- If contact info is missing, leave a placeholder like [Your Name]";

/// Cover letter prompt template.
/// Replace: `{job_title}`, `{company}`, `{matched_skills}`,
/// `{missing_skills}`, `{contact_context}`, `{resume_context}`.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Job: {job_title} at {company}
Matched Skills: {matched_skills}
Skills to address carefully: {missing_skills}

Candidate contact info (from resume):
{contact_context}

Relevant resume experience:
{resume_context}

Write the cover letter:"#;

/// System prompt for the application email — plain text output.
pub const EMAIL_SYSTEM: &str = "Write a concise, professional job application email. Under 150 words.

Format:
Subject: Application for [Job Title] — [Candidate Name]

Dear Hiring Team,

...body...

Best regards,
[Candidate Full Name]
[Phone] | [Email]

IMPORTANT: Extract and use the real candidate name, phone, and email from the contact info provided. If not found, use placeholders like [Your Name]. Keep the email consistent with the cover letter excerpt without repeating it verbatim.";

/// Email prompt template.
/// Replace: `{job_title}`, `{company}`, `{score}`, `{matched_skills}`,
/// `{contact_context}`, `{cover_letter_excerpt}`.
pub const EMAIL_PROMPT_TEMPLATE: &str = r#"Job: {job_title} at {company}
Match Score: {score}/100
Top matched skills: {matched_skills}

Candidate contact info:
{contact_context}

Cover letter excerpt (for tone consistency):
{cover_letter_excerpt}

Generate the email:"#;

/// System prompt for interview prep — requests JSON, but free text is
/// accepted downstream as a degraded result.
pub const INTERVIEW_PREP_SYSTEM: &str = "You are a senior technical interviewer. \
    Generate interview preparation for this role. Return ONLY valid JSON:
{
  \"technical_questions\": [\"q1\", \"q2\", \"q3\", \"q4\", \"q5\"],
  \"behavioral_questions\": [\"q1\", \"q2\", \"q3\"],
  \"prep_tips\": \"2-3 specific tips based on the role and skill gaps\"
}";

/// Interview prep prompt template.
/// Replace: `{job_title}`, `{company}`, `{responsibilities}`, `{missing_skills}`.
pub const INTERVIEW_PREP_PROMPT_TEMPLATE: &str = r#"Role: {job_title} at {company}
Key Responsibilities: {responsibilities}
Skill gaps to prepare for: {missing_skills}

Generate interview prep:"#;
