//! Canned responder with simulated typing latency
//!
//! Stands in for a real backend in demos and tests: it waits a random
//! interval, then picks a fixed answer by keyword.

use super::{Responder, ResponderError};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

pub const PYTHON_ANSWER: &str = "Python is a great choice for many applications. Here's a simple example:\n\n```python\ndef analyze_data(data):\n    results = {}\n    # Process the data\n    for item in data:\n        # Your analysis logic here\n        pass\n    return results\n```\n\nYou can adapt this function to your specific needs. Would you like more specific guidance?";

pub const DATABASE_ANSWER: &str = "For a blog database schema, you'll typically need these core tables:\n\n1. Users - Store user information (id, username, email, password_hash, etc.)\n2. Posts - Store blog posts (id, title, content, user_id, created_at, etc.)\n3. Categories - Store post categories (id, name, description)\n4. Tags - Store post tags (id, name)\n5. Comments - Store comments on posts (id, content, user_id, post_id, created_at)\n\nYou'll also need junction tables for many-to-many relationships like post_tags.\n\nWould you like me to elaborate on any specific table design?";

pub const QUANTUM_ANSWER: &str = "Quantum computing in simple terms:\n\nClassical computers use bits (0s and 1s). Quantum computers use quantum bits or 'qubits'.\n\nThe key differences:\n\n1. Qubits can exist in multiple states at once (superposition)\n2. Qubits can be 'entangled' with each other, creating connected systems\n\nThis allows quantum computers to explore many solutions simultaneously, making them potentially much faster for certain problems like factoring large numbers or simulating quantum physics systems.\n\nHowever, quantum computers are still experimental and face challenges with error rates and stability.";

pub const EMAIL_ANSWER: &str = "Here's a professional email requesting a deadline extension:\n\nSubject: Request for Deadline Extension - [Project Name]\n\nDear [Recipient Name],\n\nI hope this email finds you well. I'm writing regarding the [Project Name] deadline currently set for [Current Deadline].\n\nDue to [brief explanation of circumstances], I would like to request an extension to [Proposed New Deadline]. This additional time would allow me to [explain benefit - e.g., \"incorporate important feedback\" or \"ensure the highest quality deliverable\"].\n\nI understand the importance of this project and its timeline. I've already completed [mention progress made] and have a clear plan to complete the remaining work by the proposed new date.\n\nPlease let me know if the extension is possible or if you'd like to discuss alternative arrangements.\n\nThank you for your consideration.\n\nBest regards,\n[Your Name]";

pub const FALLBACK_ANSWER: &str = "I'm your AI assistant, ready to help with information, tasks, or creative work. I can explain complex topics, write code, design systems, draft content, answer questions, or just have a conversation.\n\nSome things I can help with:\n- Coding and technical questions\n- Learning and explaining concepts\n- Writing and communication tasks\n- Planning and organization\n- Creative brainstorming\n\nWhat would you like assistance with today?";

/// Keyword table, checked in order; the first rule with a matching keyword wins
const RULES: &[(&[&str], &str)] = &[
    (&["python"], PYTHON_ANSWER),
    (&["database", "schema"], DATABASE_ANSWER),
    (&["quantum"], QUANTUM_ANSWER),
    (&["email", "deadline"], EMAIL_ANSWER),
];

/// Pick the canned answer for a question. Matching is case-insensitive
/// substring search.
pub fn canned_answer(question: &str) -> &'static str {
    let lowered = question.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map_or(FALLBACK_ANSWER, |&(_, answer)| answer)
}

/// Inclusive range the simulated typing delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        // A reversed range would panic in gen_range
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(3000))
    }
}

pub struct RuleBasedResponder {
    delay: DelayRange,
}

impl RuleBasedResponder {
    pub fn new(delay: DelayRange) -> Self {
        Self { delay }
    }

    /// Answers immediately; used where latency only slows things down
    #[allow(dead_code)] // Used in tests
    pub fn instant() -> Self {
        Self::new(DelayRange::none())
    }
}

impl Default for RuleBasedResponder {
    fn default() -> Self {
        Self::new(DelayRange::default())
    }
}

#[async_trait]
impl Responder for RuleBasedResponder {
    async fn respond(&self, question: &str) -> Result<String, ResponderError> {
        let delay = self.delay.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(canned_answer(question).to_string())
    }

    fn name(&self) -> &str {
        "rules"
    }
}
