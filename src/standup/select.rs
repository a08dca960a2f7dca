//! Host selection.

use rand::seq::SliceRandom;

/// Pick one participant uniformly at random, or `None` for an empty roster.
///
/// Stateless: consecutive draws are independent, repeats are expected.
pub fn choose_host(participants: &[String]) -> Option<&String> {
    participants.choose(&mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_roster_yields_none() {
        assert_eq!(choose_host(&[]), None);
    }

    #[test]
    fn test_single_participant_always_chosen() {
        let roster = vec!["@alice".to_string()];
        for _ in 0..10 {
            assert_eq!(choose_host(&roster), Some(&roster[0]));
        }
    }

    #[test]
    fn test_draws_are_roughly_uniform() {
        let roster: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let draws = 40_000;

        let mut counts: HashMap<&str, u32> = HashMap::new();
        for _ in 0..draws {
            let host = choose_host(&roster).unwrap();
            *counts.entry(host.as_str()).or_insert(0) += 1;
        }

        // Expect ~10000 each; 4 sigma for a binomial(40000, 1/4) is ~350.
        let expected = draws / roster.len() as u32;
        for (host, count) in counts {
            assert!(
                (count as i64 - expected as i64).abs() < 400,
                "host {host} drawn {count} times, expected ~{expected}"
            );
        }
    }
}
