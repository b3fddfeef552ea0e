use super::{ChallengeResult, Skill, DEFAULT_MAX_SCORE};

pub const GENERAL_TOPIC: &str = "General";

/// Shown while a candidate has no scored challenges.
pub const DEFAULT_SKILLS: [(&str, i64); 3] = [
    ("Problem Solving", 75),
    ("Team Collaboration", 80),
    ("Communication", 85),
];

struct TopicTally<'a> {
    topic: &'a str,
    total: i64,
    count: i64,
    max: i64,
}

/// One skill per challenge topic, in order of first appearance. The level is
/// the rounded mean score and the max level the largest per-result maximum.
pub fn derive_skills(results: &[ChallengeResult]) -> Vec<Skill> {
    let mut tallies: Vec<TopicTally<'_>> = Vec::new();

    for result in results {
        let index = match tallies.iter().position(|tally| tally.topic == result.topic) {
            Some(index) => index,
            None => {
                tallies.push(TopicTally {
                    topic: &result.topic,
                    total: 0,
                    count: 0,
                    max: 0,
                });
                tallies.len() - 1
            }
        };
        let tally = &mut tallies[index];
        tally.total += result.score;
        tally.count += 1;
        tally.max = tally.max.max(result.max_score);
    }

    if tallies.is_empty() {
        return DEFAULT_SKILLS
            .iter()
            .map(|(name, level)| Skill {
                name: (*name).to_string(),
                level: *level,
                max_level: DEFAULT_MAX_SCORE,
                estimated: true,
            })
            .collect();
    }

    tallies
        .into_iter()
        .map(|tally| Skill {
            name: tally.topic.to_string(),
            level: (tally.total as f64 / tally.count as f64).round() as i64,
            max_level: tally.max,
            estimated: false,
        })
        .collect()
}
