use serde::{Deserialize, Deserializer, Serialize};

/// One listing recovered from a job-thumbnail card.
///
/// `link` is the identity of a record: a scrape never yields two records with
/// the same link, and records without a title or link are never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub link: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub employment_type: String,
}

impl JobRecord {
    pub fn has_required_fields(&self) -> bool {
        !self.title.is_empty() && !self.link.is_empty()
    }
}

/// Older or hand-edited files may carry `null` for a field; read it as empty.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub(crate) fn job(title: &str, company: &str, link: &str) -> JobRecord {
    JobRecord {
        title: title.to_string(),
        company: company.to_string(),
        link: link.to_string(),
        location: String::new(),
        employment_type: String::new(),
    }
}
