// Quiz engine: parsing LLM quiz text, collecting answers, reconciling graded feedback.
// All LLM calls go through llm_client via the QuizAuthor trait.

pub mod answers;
pub mod feedback;
pub mod generator;
pub mod handlers;
pub mod parser;
pub mod prompts;
