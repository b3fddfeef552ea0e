use std::fmt::Write as _;

use super::{mean_rating, CandidateProfile, ExamOutcome};

/// Builds the narrative paragraph for a profile from its results.
///
/// Only the profile's own data is read, never `generated_summary`, so calling
/// this on its own output yields the same text.
pub fn synthesize_summary(profile: &CandidateProfile) -> String {
    let candidate = &profile.candidate;
    let mut text = format!(
        "{} is a {} who completed the {} as part of {}. ",
        candidate.full_name, candidate.role, profile.cohort.program_name, profile.cohort.name
    );

    if !profile.challenge_results.is_empty() {
        let total: i64 = profile.challenge_results.iter().map(|result| result.score).sum();
        let average = (total as f64 / profile.challenge_results.len() as f64).round() as i64;
        let _ = write!(
            text,
            "They demonstrated strong performance with an average challenge score of {average}%. "
        );
    }

    if !profile.exams.is_empty() {
        let passed = profile
            .exams
            .iter()
            .filter(|exam| exam.result == ExamOutcome::Passed)
            .count();
        let plural = if passed == 1 { "" } else { "s" };
        let _ = write!(text, "They have passed {passed} exam{plural}. ");
    }

    if let Some(rating) = mean_rating(&profile.surveys) {
        let rating = (rating * 10.0).round() / 10.0;
        let _ = write!(
            text,
            "Team leaders rated their overall performance at {rating:.1}/5.0. "
        );
    }

    let certifications = profile.certifications.len();
    if certifications > 0 {
        let plural = if certifications > 1 { "s" } else { "" };
        let _ = write!(
            text,
            "They hold {certifications} professional certification{plural}. "
        );
    }

    if candidate.linkedin_url.is_some() {
        text.push_str("Professional LinkedIn profile available. ");
    }
    if candidate.github_url.is_some() {
        text.push_str("Active GitHub portfolio showcasing technical projects. ");
    }
    if candidate.portfolio_url.is_some() {
        text.push_str("Personal portfolio website demonstrates their work and capabilities.");
    }

    text.truncate(text.trim_end().len());
    text
}
