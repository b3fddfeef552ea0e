use super::ImportKind;

const CANDIDATES: &str = "\
full_name,email,phone,linkedin_url,github_url,portfolio_url,resume_url,photo_url,role,skill_level,is_public,cohort_name
John Doe,john@example.com,+1234567890,https://linkedin.com/in/johndoe,https://github.com/johndoe,https://johndoe.dev,https://example.com/resume.pdf,https://example.com/photo.jpg,Full-Stack Developer,intermediate,true,
";

const EXAM_RESULTS: &str = "\
candidate_email,exam_title,score,max_score,result_status,result_date,feedback
john@example.com,Final Technical Exam,85,100,passed,2025-01-15,Excellent performance
";

const SURVEY_RESPONSES: &str = "\
candidate_email,survey_type,rating,feedback,reviewer_name,submitted_at
john@example.com,technical,4,Great technical skills,Jane Smith,2025-01-15T10:00:00Z
";

/// Static CSV with the full header for `kind` and one example row.
pub fn template(kind: ImportKind) -> &'static str {
    match kind {
        ImportKind::Candidates => CANDIDATES,
        ImportKind::ExamResults => EXAM_RESULTS,
        ImportKind::SurveyResponses => SURVEY_RESPONSES,
    }
}
