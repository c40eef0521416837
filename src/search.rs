use crate::job::JobRecord;
use crate::utils::normalize;

/// Keeps the jobs whose title or company contains every query word.
///
/// Matching is case-insensitive substring matching; words are ANDed and each
/// word may hit either field. No other field is looked at. Order is preserved,
/// and a blank query returns the input unchanged.
pub fn search(jobs: Vec<JobRecord>, query: &str) -> Vec<JobRecord> {
    let words: Vec<String> = query.split_whitespace().map(normalize).collect();
    if words.is_empty() {
        return jobs;
    }

    jobs.into_iter()
        .filter(|job| matches_all(job, &words))
        .collect()
}

fn matches_all(job: &JobRecord, words: &[String]) -> bool {
    let title = normalize(&job.title);
    let company = normalize(&job.company);
    words
        .iter()
        .all(|word| title.contains(word.as_str()) || company.contains(word.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::job;

    fn jobs() -> Vec<JobRecord> {
        vec![
            job("Senior Foo Engineer", "BarCorp", "https://x/1"),
            job("Foo Analyst", "Quux", "https://x/2"),
            job("Bar Tender", "Foo  Drinks", "https://x/3"),
            job("Office Manager", "Acme", "https://x/4"),
        ]
    }

    fn links(jobs: &[JobRecord]) -> Vec<&str> {
        jobs.iter().map(|j| j.link.as_str()).collect()
    }

    #[test]
    fn blank_query_is_identity() {
        assert_eq!(search(jobs(), ""), jobs());
        assert_eq!(search(jobs(), "  \t "), jobs());
    }

    #[test]
    fn every_word_must_hit_title_or_company() {
        let found = search(jobs(), "foo bar");
        assert_eq!(links(&found), vec!["https://x/1", "https://x/3"]);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert_eq!(links(&search(jobs(), "ENGIN")), vec!["https://x/1"]);
        assert_eq!(links(&search(jobs(), "acme")), vec!["https://x/4"]);
    }

    #[test]
    fn other_fields_are_never_searched() {
        let mut record = job("Courier", "Dodo", "https://x/praha");
        record.location = "Praha".into();
        record.employment_type = "Full-time".into();

        assert!(search(vec![record.clone()], "praha").is_empty());
        assert!(search(vec![record.clone()], "full-time").is_empty());
        assert_eq!(search(vec![record.clone()], "dodo"), vec![record]);
    }

    #[test]
    fn preserves_input_order() {
        let found = search(jobs(), "foo");
        assert_eq!(links(&found), vec!["https://x/1", "https://x/2", "https://x/3"]);
    }
}
