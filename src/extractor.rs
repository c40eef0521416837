use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::job::JobRecord;

const EMPLOYMENT_TYPES: [&str; 2] = ["Full-time", "Part-time"];

/// Badge labels that show up inside cards but never name a company or place.
const BADGES: [&str; 2] = ["Fresh", "Superjoby"];

/// Result of parsing one listing page.
///
/// `cards` counts every card found, including the ones that were dropped, so
/// an empty page can be told apart from a page of malformed cards.
#[derive(Debug, Default)]
pub struct ExtractedPage {
    pub cards: usize,
    pub jobs: Vec<JobRecord>,
}

/// Turns raw page markup into job records. Swappable when the site's markup changes.
pub trait ExtractionStrategy: Send + Sync {
    fn extract(&self, page: &str, base_url: &Url) -> ExtractedPage;
}

/// Reads the `a.job-thumbnail` cards of cocuma.cz listing pages.
pub struct CocumaCards {
    card: Selector,
    title: Selector,
    text: Selector,
}

impl CocumaCards {
    pub fn new() -> Self {
        // Static selectors, parsing cannot fail.
        Self {
            card: Selector::parse("a.job-thumbnail").expect("card selector"),
            title: Selector::parse("p.job-thumbnail-title").expect("title selector"),
            text: Selector::parse("p, span, div").expect("text selector"),
        }
    }

    fn parse_card(&self, card: ElementRef<'_>, base_url: &Url) -> Option<JobRecord> {
        let href = card.value().attr("href").map(str::trim).unwrap_or("");
        if href.is_empty() {
            return None;
        }
        let link = if href.starts_with("http") {
            href.to_string()
        } else {
            base_url.join(href).ok()?.to_string()
        };

        // Distinct text fragments in document order.
        let mut texts: Vec<String> = Vec::new();
        for element in card.select(&self.text) {
            let text = stripped_text(element);
            if !text.is_empty() && !texts.contains(&text) {
                texts.push(text);
            }
        }

        let mut title = card
            .select(&self.title)
            .next()
            .map(stripped_text)
            .unwrap_or_default();
        if title.is_empty() {
            title = longest_fragment(&texts).unwrap_or_default();
        }
        if title.is_empty() {
            return None;
        }

        let employment_type = texts
            .iter()
            .find(|t| is_employment_type(t))
            .cloned()
            .unwrap_or_default();

        let rest: Vec<&str> = texts
            .iter()
            .map(String::as_str)
            .filter(|t| !BADGES.contains(t) && !is_employment_type(t) && *t != title)
            .collect();

        let company = rest.first().copied().unwrap_or("").to_string();
        let location = match rest.as_slice() {
            [.., last] if rest.len() >= 2 && !is_employment_type(last) => last.to_string(),
            [.., before_last, _] if rest.len() > 2 => before_last.to_string(),
            _ => String::new(),
        };

        Some(JobRecord {
            title,
            company,
            link,
            location,
            employment_type,
        })
    }
}

impl Default for CocumaCards {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for CocumaCards {
    fn extract(&self, page: &str, base_url: &Url) -> ExtractedPage {
        let document = Html::parse_document(page);
        let mut extracted = ExtractedPage::default();

        for card in document.select(&self.card) {
            extracted.cards += 1;
            match self.parse_card(card, base_url) {
                Some(job) => extracted.jobs.push(job),
                None => debug!(card = extracted.cards, "Skipping card without title or link"),
            }
        }

        extracted
    }
}

fn is_employment_type(text: &str) -> bool {
    EMPLOYMENT_TYPES.contains(&text)
}

/// Every text node trimmed, empty ones dropped, the rest concatenated.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Longest fragment over three characters; the first one wins a tie.
fn longest_fragment(texts: &[String]) -> Option<String> {
    texts
        .iter()
        .filter(|t| t.chars().count() > 3)
        .fold(None::<&String>, |best, t| match best {
            Some(b) if b.chars().count() >= t.chars().count() => Some(b),
            _ => Some(t),
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.cocuma.cz").unwrap()
    }

    fn extract(page: &str) -> ExtractedPage {
        CocumaCards::new().extract(page, &base())
    }

    const CARD: &str = r#"
        <a class="job-thumbnail" href="/job/rust-developer/1234/">
          <div class="job-thumbnail-badges"><span>Fresh</span></div>
          <p class="job-thumbnail-title">Rust Developer</p>
          <p class="job-thumbnail-company">Ferrous Systems</p>
          <div class="job-thumbnail-meta">
            <span>Full-time</span>
            <span>Praha</span>
          </div>
        </a>"#;

    #[test]
    fn extracts_all_fields_from_a_card() {
        let page = extract(&format!("<html><body>{}</body></html>", CARD));

        assert_eq!(page.cards, 1);
        assert_eq!(
            page.jobs,
            vec![JobRecord {
                title: "Rust Developer".into(),
                company: "Ferrous Systems".into(),
                link: "https://www.cocuma.cz/job/rust-developer/1234/".into(),
                location: "Praha".into(),
                employment_type: "Full-time".into(),
            }]
        );
    }

    #[test]
    fn absolute_links_pass_through() {
        let page = extract(
            r#"<a class="job-thumbnail" href="https://jobs.example.com/42">
                 <p class="job-thumbnail-title">QA Engineer</p>
               </a>"#,
        );
        assert_eq!(page.jobs[0].link, "https://jobs.example.com/42");
    }

    #[test]
    fn falls_back_to_longest_fragment_for_title() {
        let page = extract(
            r#"<a class="job-thumbnail" href="/job/9/">
                 <span>Acme</span>
                 <span>Head of Platform Engineering</span>
                 <span>Brno</span>
               </a>"#,
        );

        let job = &page.jobs[0];
        assert_eq!(job.title, "Head of Platform Engineering");
        assert_eq!(job.company, "Acme");
        assert_eq!(job.location, "Brno");
    }

    #[test]
    fn single_remaining_fragment_is_company_without_location() {
        let page = extract(
            r#"<a class="job-thumbnail" href="/job/3/">
                 <p class="job-thumbnail-title">Data Analyst</p>
                 <p>Kiwi.com</p>
                 <span>Part-time</span>
               </a>"#,
        );

        let job = &page.jobs[0];
        assert_eq!(job.company, "Kiwi.com");
        assert_eq!(job.location, "");
        assert_eq!(job.employment_type, "Part-time");
    }

    #[test]
    fn malformed_cards_are_counted_but_skipped() {
        let page = extract(&format!(
            r#"<a class="job-thumbnail"><p class="job-thumbnail-title">No link</p></a>
               <a class="job-thumbnail" href="/job/empty/"><span>abc</span></a>
               {}"#,
            CARD
        ));

        assert_eq!(page.cards, 3);
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].title, "Rust Developer");
    }

    #[test]
    fn page_without_cards_is_empty() {
        let page = extract("<html><body><p>No jobs here</p></body></html>");
        assert_eq!(page.cards, 0);
        assert!(page.jobs.is_empty());
    }

    #[test]
    fn default_strategy_builds_its_selectors() {
        let page = CocumaCards::default().extract(CARD, &base());
        assert_eq!(page.cards, 1);
    }

    #[test]
    fn longest_fragment_prefers_first_on_tie() {
        let texts = vec!["abc".to_string(), "Alpha".to_string(), "Omega".to_string()];
        assert_eq!(longest_fragment(&texts).as_deref(), Some("Alpha"));
        assert_eq!(longest_fragment(&["abc".to_string()]), None);
    }
}
