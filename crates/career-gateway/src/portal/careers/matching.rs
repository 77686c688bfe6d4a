//! Deterministic candidate scoring against a job's qualifications.

use std::collections::HashSet;

use serde::Serialize;

use super::domain::Qualifications;
use crate::portal::accounts::domain::StudentProfile;

const SKILL_WEIGHT: f64 = 70.0;
const EXPERIENCE_WEIGHT: f64 = 30.0;

/// Score in `0..=100` with the facts it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchScore {
    pub score: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub experience_met: bool,
}

fn normalize(skill: &str) -> String {
    skill.trim().to_lowercase()
}

pub fn score_candidate(student: &StudentProfile, qualifications: &Qualifications) -> MatchScore {
    let declared: HashSet<String> = student.skills.iter().map(|skill| normalize(skill)).collect();

    let mut matched_skills = Vec::new();
    let mut missing_skills = Vec::new();
    let mut seen = HashSet::new();
    for skill in &qualifications.required_skills {
        let key = normalize(skill);
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        if declared.contains(&key) {
            matched_skills.push(skill.trim().to_string());
        } else {
            missing_skills.push(skill.trim().to_string());
        }
    }

    let required = matched_skills.len() + missing_skills.len();
    let skill_fraction = if required == 0 {
        1.0
    } else {
        matched_skills.len() as f64 / required as f64
    };

    let required_years = qualifications.experience_years;
    let experience_fraction = if required_years == 0 {
        1.0
    } else {
        f64::from(student.experience_years.min(required_years)) / f64::from(required_years)
    };

    let score = (SKILL_WEIGHT * skill_fraction + EXPERIENCE_WEIGHT * experience_fraction).round();

    MatchScore {
        score: score.clamp(0.0, 100.0) as u8,
        matched_skills,
        missing_skills,
        experience_met: student.experience_years >= required_years,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(skills: &[&str], years: u8) -> StudentProfile {
        StudentProfile {
            name: "Lerato".to_string(),
            phone: String::new(),
            address: String::new(),
            skills: skills.iter().map(|skill| skill.to_string()).collect(),
            experience_years: years,
            transcript: None,
            certificates: Vec::new(),
        }
    }

    fn wants(skills: &[&str], years: u8) -> Qualifications {
        Qualifications {
            minimum_qualification: "Diploma".to_string(),
            required_skills: skills.iter().map(|skill| skill.to_string()).collect(),
            experience_years: years,
        }
    }

    #[test]
    fn perfect_candidate_scores_full_marks() {
        let result = score_candidate(&student(&["Rust", "SQL"], 4), &wants(&["rust", " sql "], 3));
        assert_eq!(result.score, 100);
        assert!(result.missing_skills.is_empty());
        assert!(result.experience_met);
    }

    #[test]
    fn partial_match_weighs_skills_and_experience() {
        let result = score_candidate(&student(&["rust"], 1), &wants(&["Rust", "Go"], 2));
        // 70 * 1/2 + 30 * 1/2
        assert_eq!(result.score, 50);
        assert_eq!(result.matched_skills, vec!["Rust".to_string()]);
        assert_eq!(result.missing_skills, vec!["Go".to_string()]);
        assert!(!result.experience_met);
    }

    #[test]
    fn empty_requirements_are_always_met() {
        let result = score_candidate(&student(&[], 0), &Qualifications::default());
        assert_eq!(result.score, 100);
    }

    #[test]
    fn scoring_is_deterministic() {
        let candidate = student(&["excel", "python"], 2);
        let job = wants(&["Python", "Tableau", "Excel"], 5);
        let first = score_candidate(&candidate, &job);
        assert_eq!(first, score_candidate(&candidate, &job));
        assert!(first.score <= 100);
        assert_eq!(first.score, 59);
    }
}
