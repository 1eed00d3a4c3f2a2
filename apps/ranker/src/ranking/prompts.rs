// All LLM prompt constants for the ranking module.
// Every template is rendered by `CompletionTask::render` in completion.rs.

/// The example name shown in the name-extraction prompt. Models echo it back often
/// enough that `NamePolicy` always blocks it.
pub const PROMPT_EXAMPLE_NAME: &str = "Emily Chen";

/// System prompt for criteria extraction.
pub const EXTRACT_CRITERIA_SYSTEM: &str = "You are an expert technical recruiter who turns \
    job descriptions into precise, checkable ranking criteria. \
    You MUST respond with a valid JSON array of strings only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";

/// Criteria extraction prompt. Replace `{job_description}` before sending.
pub const EXTRACT_CRITERIA_PROMPT_TEMPLATE: &str = r#"Extract the ranking criteria from the job description below.

Return a JSON ARRAY of strings. Prefix every criterion with its importance:
- "[Required] " for explicit must-haves: "required", "must have", minimum years, mandatory certifications
- "[Preferred] " for nice-to-haves: "preferred", "bonus", "a plus", "nice to have"

Example output:
[
  "[Required] Must have certification XYZ",
  "[Required] 5+ years of experience in Python development",
  "[Preferred] Strong background in Machine Learning"
]

Rules:
1. One requirement per criterion; split compound requirements
2. Keep each criterion short and checkable against a resume
3. Do NOT repeat a criterion
4. Do NOT invent requirements the job description does not state

JOB DESCRIPTION:
{job_description}"#;

/// System prompt for name extraction.
pub const EXTRACT_NAME_SYSTEM: &str = "You are a meticulous document analyst. \
    You extract the candidate's real name from resume text and nothing else. \
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Name extraction prompt. Replace `{example_name}`, `{filename}` and `{resume_text}`.
pub const EXTRACT_NAME_PROMPT_TEMPLATE: &str = r#"Extract the full name of the candidate who wrote this resume.

Return a JSON object with this EXACT schema:
{
  "name": "{example_name}",
  "confidence": 95,
  "source": "header"
}

Field rules:
- "name": the candidate's full name exactly as written in the resume (first and last name)
- "confidence": integer 0-100, how certain you are that this is the candidate's own name
- "source": where you found it, e.g. "header", "contact_section", "signature", "email"

CRITICAL:
- "{example_name}" above is a format example. NEVER return it unless it literally appears in the resume.
- Never return placeholders such as "John Doe", "[Name]" or "Candidate Name".
- Ignore names of references, managers, companies and schools.
- If you cannot find the name, return {"name": "", "confidence": 0, "source": "not_found"}.

Original filename (context only, do NOT copy it as the name): {filename}

RESUME:
{resume_text}"#;

/// System prompt for resume scoring.
pub const SCORE_RESUME_SYSTEM: &str = "You are an impartial resume evaluation specialist. \
    You score resumes strictly against the criteria you are given, using only evidence in \
    the resume text. \
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Scoring prompt. Replace `{criteria_json}` and `{resume_text}`.
pub const SCORE_RESUME_PROMPT_TEMPLATE: &str = r#"Score the resume below against EACH of the criteria.

CRITERIA (JSON array; copy each string EXACTLY into the "criterion" field):
{criteria_json}

Return a JSON object with this EXACT schema:
{
  "scores": [
    {"criterion": "<exact criterion text>", "score": 4, "justification": "one sentence of evidence"}
  ]
}

Scoring scale (integers only):
0 = Not mentioned / no match
1 = Poor match
2 = Fair match
3 = Good match
4 = Very good match
5 = Excellent match

Rules:
1. Exactly one entry per criterion, in the order given
2. "score" must be an integer from 0 to 5
3. Keep each justification to one short sentence without double quotes
4. Base every score only on the resume text

RESUME:
{resume_text}"#;
