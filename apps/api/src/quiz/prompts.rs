// Quiz LLM prompt templates.
// Placeholders in `{braces}` are replaced by the builders below.

use crate::models::quiz::QuizSettings;
use crate::quiz::parser::OPTION_MARKER;
use crate::session::ProgressStats;

pub const QUIZ_ROLE: &str = "You write multiple-choice quizzes.";
pub const GRADING_ROLE: &str = "You check a student's multiple-choice answers.";
pub const REPORT_ROLE: &str = "You summarise a learner's quiz history.";

pub const QUIZ_PROMPT_TEMPLATE: &str = r#"Create JLPT {difficulty} practice questions.

GOAL: Create EXACTLY {num_questions} multiple-choice questions.

TOPIC HINT: {topic_hint}

STYLE REQUIREMENTS:
- Short, simple {difficulty}-level sentences
- Natural JLPT exam style
- Use polite form (です/ます) when appropriate
- One blank per sentence for grammar/vocabulary
- For kanji reading, show kanji and give kana options

EXAMPLE:
1. 来月
{marker} らいげつ
{marker} らいがつ
{marker} くがつ
{marker} くげつ

FORMAT (FOLLOW EXACTLY):
1. Number questions: 1., 2., 3., etc.
2. Exactly 4 options per question, each on its own line starting with "{marker} "
3. ONE blank line between questions
4. DO NOT show correct answers or an answer key
5. For a reading passage, put the passage on the question line

RANDOMIZATION:
- Place the correct answer at a random position in each question
- Never put every correct answer at the same position

Output ONLY the quiz. Start with "1." immediately."#;

pub const GRADING_PROMPT_TEMPLATE: &str = r#"Check this multiple-choice quiz.

QUIZ (questions only, no answer key):
---
{quiz_text}
---

STUDENT'S ANSWERS (JSON, "{unanswered}" means not answered):
{answers_json}

Options are lettered A, B, C, D in the order they appear.

YOUR TASK:
1. For EACH question, decide which option is correct and compare it to the student's answer
2. Calculate the total score X / N and the percentage

OUTPUT FORMAT (FOLLOW EXACTLY):

Score: X / N (Y%)

Q1: Correct/Incorrect
- Your answer: [letter or "{unanswered}" if blank]
- Correct answer: [letter]
- Reason: [1-2 short lines explaining why]

Q2: Correct/Incorrect
- Your answer: ...
- Correct answer: ...
- Reason: ...

RULES:
- Use the question numbers from the quiz after "Q"
- Keep Reason VERY SHORT (max 2 lines)
- Do NOT repeat the question text
- An unanswered question is Incorrect
- No extra sections before or after this format"#;

pub const REPORT_PROMPT_TEMPLATE: &str = r#"Write a short progress report for a Japanese learner.

HISTORY:
- Quizzes taken: {total_quizzes}
- Quizzes graded: {graded_quizzes}
- Average score: {average_score}
- Topics practised: {topics}

SECTIONS:
# Summary
# Strengths
# Areas to review
# Suggested next quizzes

Use markdown headers and bullet points. Keep it under 300 words."#;

pub fn build_quiz_prompt(settings: &QuizSettings) -> String {
    QUIZ_PROMPT_TEMPLATE
        .replace("{difficulty}", settings.difficulty.as_str())
        .replace("{num_questions}", &settings.num_questions.to_string())
        .replace("{topic_hint}", settings.topic.hint())
        .replace("{marker}", &OPTION_MARKER.to_string())
}

pub fn build_grading_prompt(quiz_text: &str, answers_json: &str) -> String {
    GRADING_PROMPT_TEMPLATE
        .replace("{unanswered}", crate::quiz::answers::UNANSWERED_PLACEHOLDER)
        .replace("{answers_json}", answers_json)
        // Last, so braces inside the quiz text are never treated as placeholders.
        .replace("{quiz_text}", quiz_text)
}

pub fn build_report_prompt(stats: &ProgressStats) -> String {
    let average = stats
        .average_percent
        .map(|p| format!("{p:.0}%"))
        .unwrap_or_else(|| "n/a".to_string());
    let topics = if stats.topics.is_empty() {
        "none yet".to_string()
    } else {
        stats.topics.join(", ")
    };
    REPORT_PROMPT_TEMPLATE
        .replace("{total_quizzes}", &stats.total_quizzes.to_string())
        .replace("{graded_quizzes}", &stats.graded_quizzes.to_string())
        .replace("{average_score}", &average)
        .replace("{topics}", &topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{Difficulty, Topic};

    #[test]
    fn test_quiz_prompt_fills_every_placeholder() {
        let prompt = build_quiz_prompt(&QuizSettings {
            topic: Topic::Grammar,
            difficulty: Difficulty::N4,
            num_questions: 6,
        });
        assert!(prompt.contains("JLPT N4"));
        assert!(prompt.contains("EXACTLY 6"));
        assert!(prompt.contains(Topic::Grammar.hint()));
        assert!(prompt.contains("○ らいげつ"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_grading_prompt_embeds_quiz_and_answers() {
        let prompt = build_grading_prompt("1. 本\n○ ほん\n○ もと", r#"{"1": "A"}"#);
        assert!(prompt.contains("1. 本\n○ ほん"));
        assert!(prompt.contains(r#"{"1": "A"}"#));
        assert!(prompt.contains("Score: X / N (Y%)"));
        assert!(!prompt.contains("{quiz_text}"));
    }

    #[test]
    fn test_grading_prompt_leaves_braces_in_quiz_text_alone() {
        let prompt = build_grading_prompt("1. {answers_json}\n○ a", "{}");
        assert!(prompt.contains("1. {answers_json}"));
    }

    #[test]
    fn test_report_prompt_without_history() {
        let prompt = build_report_prompt(&ProgressStats::default());
        assert!(prompt.contains("Quizzes taken: 0"));
        assert!(prompt.contains("Average score: n/a"));
        assert!(prompt.contains("none yet"));
    }
}
