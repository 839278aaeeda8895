use serde::{Deserialize, Deserializer, Serialize};

/// A meme as the rest of the program sees it.
///
/// Only `id` and `url` are guaranteed. Everything else is copied from the
/// backend record as-is and never filled with a made-up default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meme {
    pub id: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A meme record as the backend sends it.
///
/// Older deployments name the description `vlm_description`, send numeric
/// ids, or send `null` where a list is expected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMeme {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlm_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Map a backend record onto a [`Meme`].
///
/// `description` wins over the legacy `vlm_description`. Zero dimensions are
/// treated as unknown.
pub fn normalize(raw: &RawMeme) -> Meme {
    let description = raw
        .description
        .as_ref()
        .or(raw.vlm_description.as_ref())
        .cloned();

    Meme {
        id: raw.id.clone(),
        url: raw.url.clone(),
        score: raw.score,
        description,
        category: raw.category.clone(),
        tags: raw.tags.clone(),
        is_animated: raw.is_animated,
        width: raw.width.filter(|w| *w > 0),
        height: raw.height.filter(|h| *h > 0),
    }
}

/// Normalize a JSON array of records, skipping entries that are not memes.
pub fn normalize_values(values: &[serde_json::Value]) -> Vec<Meme> {
    values
        .iter()
        .filter_map(|value| match RawMeme::deserialize(value) {
            Ok(raw) => Some(normalize(&raw)),
            Err(err) => {
                log::warn!("skipping malformed result record: {err}");
                None
            }
        })
        .collect()
}

/// Body of `POST /search` and `GET /memes`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MemesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<RawMeme>,
    #[serde(default)]
    pub total: u64,
}

impl MemesResponse {
    pub fn into_page(self) -> MemePage {
        MemePage {
            results: self.results.iter().map(normalize).collect(),
            total: self.total,
        }
    }
}

/// Normalized page of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemePage {
    pub results: Vec<Meme>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CategoriesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub total: u64,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}
