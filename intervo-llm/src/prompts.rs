//! Prompt templates for the interview operations. Each builder returns a
//! (system, user) pair; operations that need structured output instruct the
//! model to answer with bare JSON.

use intervo_core::domain::Difficulty;
use intervo_core::ports::{ExemplarQuestion, FollowUpPrompt, PlanningContext, SummaryContext};

pub fn generate_question(
  context: &PlanningContext,
  skill: &str,
  difficulty: Difficulty,
  exemplars: &[ExemplarQuestion],
) -> (String, String) {
  let system = "You are an expert technical interviewer. \
    Generate a clear, relevant interview question based on the context provided."
    .to_string();

  let mut user = format!(
    "Generate a {difficulty} difficulty interview question to test: {skill}\n\n\
     Context:\n\
     - Candidate's background: {}\n\
     - Candidate's skills: {}\n\
     - Years of experience: {}\n",
    context.cv_summary,
    context.skills.join(", "),
    context.experience_years,
  );

  if !exemplars.is_empty() {
    user.push_str("\nSimilar questions for inspiration (do NOT copy exactly):\n");
    for (i, exemplar) in exemplars.iter().take(3).enumerate() {
      user.push_str(&format!(
        "{}. \"{}\" ({})\n",
        i + 1,
        exemplar.text,
        exemplar.difficulty
      ));
    }
    user.push_str("\nGenerate a NEW question inspired by the style and structure above.\n");
  }

  user.push_str("\nReturn only the question text, no additional explanation.");
  (system, user)
}

pub fn generate_ideal_answer(question_text: &str, context: &PlanningContext) -> (String, String) {
  let system = "You are an expert in technical interviews. \
    Write the ideal reference answer an excellent candidate would give."
    .to_string();
  let user = format!(
    "Question: {question_text}\n\n\
     Candidate background: {}\n\n\
     Write a complete, well-structured ideal answer covering every key concept. \
     Return only the answer text.",
    context.cv_summary,
  );
  (system, user)
}

pub fn generate_rationale(question_text: &str, ideal_answer: &str) -> (String, String) {
  let system = "You are an expert technical interviewer.".to_string();
  let user = format!(
    "Question: {question_text}\n\n\
     Ideal answer: {ideal_answer}\n\n\
     Explain in a short paragraph why this answer is ideal: which concepts it covers \
     and what a weaker answer would miss. Return only the explanation.",
  );
  (system, user)
}

pub fn evaluate_answer(
  question_text: &str,
  question_type: &str,
  difficulty: &str,
  skills: &[String],
  ideal_answer: Option<&str>,
  answer_text: &str,
) -> (String, String) {
  let system = "You are an expert technical interviewer evaluating candidate answers. \
    Provide objective, constructive feedback with specific scores."
    .to_string();

  let ideal_section = ideal_answer
    .map(|ideal| format!("Ideal Answer: {ideal}\n\n"))
    .unwrap_or_default();

  let user = format!(
    "Question: {question_text}\n\
     Question Type: {question_type}\n\
     Difficulty: {difficulty}\n\
     Expected Skills: {}\n\n\
     Candidate's Answer: {answer_text}\n\n\
     {ideal_section}\
     Evaluate this answer and respond with JSON only, no markdown, using exactly these keys:\n\
     {{\n\
       \"score\": <0-100>,\n\
       \"completeness\": <0.0-1.0>,\n\
       \"relevance\": <0.0-1.0>,\n\
       \"sentiment\": \"confident|uncertain|nervous\",\n\
       \"reasoning\": \"<short explanation>\",\n\
       \"strengths\": [\"...\"],\n\
       \"weaknesses\": [\"...\"],\n\
       \"improvement_suggestions\": [\"...\"]\n\
     }}",
    skills.join(", "),
  );
  (system, user)
}

pub fn detect_concept_gaps(
  answer_text: &str,
  ideal_answer: &str,
  question_text: &str,
  candidate_keywords: &[String],
) -> (String, String) {
  let system = "You analyze interview answers for missing concepts. \
    Be precise: only confirm concepts that truly matter for the question."
    .to_string();
  let user = format!(
    "Question: {question_text}\n\n\
     Ideal answer: {ideal_answer}\n\n\
     Candidate's answer: {answer_text}\n\n\
     Keyword analysis flagged these terms as missing: {}\n\n\
     Identify the significant concepts (not just words) the candidate failed to cover. \
     Respond with JSON only, no markdown:\n\
     {{\"concepts\": [\"...\"], \"confirmed\": <true|false>, \"severity\": \"minor|moderate|major\"}}\n\
     If the missing keywords do not amount to real concept gaps, return \
     {{\"concepts\": [], \"confirmed\": false, \"severity\": \"minor\"}}.",
    candidate_keywords.join(", "),
  );
  (system, user)
}

pub fn generate_followup_question(prompt: &FollowUpPrompt) -> (String, String) {
  let system = "You are an expert technical interviewer conducting an adaptive interview. \
    Ask one focused follow-up question that probes the candidate's gaps without giving \
    the answer away."
    .to_string();

  let mut user = format!(
    "Original question: {}\n\n\
     Candidate's answer: {}\n\n\
     Missing concepts ({} severity): {}\n\
     This is follow-up #{} of at most 3.\n",
    prompt.parent_question,
    prompt.answer_text,
    severity_label(prompt),
    prompt.missing_concepts.join(", "),
    prompt.order,
  );
  if !prompt.cumulative_gaps.is_empty() {
    user.push_str(&format!(
      "Concepts still unaddressed across the whole cycle: {}\n",
      prompt.cumulative_gaps.join(", ")
    ));
  }
  if !prompt.previous_follow_ups.is_empty() {
    user.push_str("Follow-ups already asked (do not repeat them):\n");
    for text in &prompt.previous_follow_ups {
      user.push_str(&format!("- {text}\n"));
    }
  }
  user.push_str("\nReturn only the follow-up question text.");
  (system, user)
}

fn severity_label(prompt: &FollowUpPrompt) -> &'static str {
  use intervo_core::domain::GapSeverity;
  match prompt.severity {
    GapSeverity::Minor => "minor",
    GapSeverity::Moderate => "moderate",
    GapSeverity::Major => "major",
  }
}

pub fn generate_interview_recommendations(context: &SummaryContext) -> (String, String) {
  let system = "You are an interview coach producing a closing report. \
    Ground every point in the evaluations provided."
    .to_string();

  let evaluations = serde_json::to_string(&context.evaluations).unwrap_or_else(|_| "[]".into());
  let progression =
    serde_json::to_string(&context.gap_progression).unwrap_or_else(|_| "{}".into());

  let user = format!(
    "Interview {} finished with {} answers.\n\
     Gap progression: {progression}\n\
     Per-answer evaluations: {evaluations}\n\n\
     Respond with JSON only, no markdown:\n\
     {{\n\
       \"strengths\": [3-5 items],\n\
       \"weaknesses\": [3-5 items],\n\
       \"study_topics\": [3-7 items],\n\
       \"technique_tips\": [2-5 items]\n\
     }}",
    context.interview_id, context.total_answers,
  );
  (system, user)
}
