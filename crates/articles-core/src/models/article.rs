use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Backend-assigned article identifier
pub type ArticleId = i64;

/// Article topic. The backend accepts a fixed set of names; anything else
/// the server sends back is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Topic {
    JavaScript,
    React,
    Node,
    Other(String),
}

impl Topic {
    /// Topics the backend accepts, in display order
    pub const KNOWN: [Topic; 3] = [Topic::JavaScript, Topic::React, Topic::Node];

    pub fn as_str(&self) -> &str {
        match self {
            Topic::JavaScript => "JavaScript",
            Topic::React => "React",
            Topic::Node => "Node",
            Topic::Other(s) => s.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Topic::Other(_))
    }

    /// Get the next known topic (wrapping around). Unknown topics restart at the first.
    pub fn next(&self) -> Self {
        match self {
            Topic::JavaScript => Topic::React,
            Topic::React => Topic::Node,
            Topic::Node | Topic::Other(_) => Topic::JavaScript,
        }
    }
}

impl From<String> for Topic {
    fn from(s: String) -> Self {
        match s.as_str() {
            "JavaScript" => Topic::JavaScript,
            "React" => Topic::React,
            "Node" => Topic::Node,
            _ => Topic::Other(s),
        }
    }
}

impl From<&str> for Topic {
    fn from(s: &str) -> Self {
        Topic::from(s.to_string())
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        match topic {
            Topic::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Article {
    #[serde(rename = "article_id")]
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub id: ArticleId,
    pub title: String,
    pub text: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub topic: Topic,
}

impl Article {
    /// Editable fields of this article, for pre-filling the edit form
    pub fn to_draft(&self) -> ArticleDraft {
        ArticleDraft {
            title: self.title.clone(),
            text: self.text.clone(),
            topic: self.topic.clone(),
        }
    }
}

/// Create/update payload: an article without its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ArticleDraft {
    pub title: String,
    pub text: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub topic: Topic,
}

impl ArticleDraft {
    pub fn new(title: impl Into<String>, text: impl Into<String>, topic: impl Into<Topic>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            topic: topic.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError("Title is required".to_string()));
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError("Text is required".to_string()));
        }
        if !self.topic.is_known() {
            return Err(ValidationError(format!(
                "Topic must be one of: {}",
                Topic::KNOWN.iter().map(Topic::as_str).collect::<Vec<_>>().join(", ")
            )));
        }
        Ok(())
    }

    /// Copy with title and text trimmed, as submitted to the server
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            text: self.text.trim().to_string(),
            topic: self.topic.clone(),
        }
    }
}

impl Default for ArticleDraft {
    fn default() -> Self {
        Self::new("", "", Topic::JavaScript)
    }
}

// Response envelopes. Every endpoint returns the server's status text in `message`.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlesResponse {
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub article: Article,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_articles_response() {
        let json = r#"{
            "message": "Here are your articles, foo!",
            "articles": [
                {"article_id": 1, "title": "Closures", "text": "Functions that remember.", "topic": "JavaScript"},
                {"article_id": 2, "title": "Hooks", "text": "useState and friends.", "topic": "React"}
            ]
        }"#;

        let resp: ArticlesResponse = serde_json::from_str(json)
            .expect("Failed to parse articles test JSON");
        assert_eq!(resp.message, "Here are your articles, foo!");
        assert_eq!(resp.articles.len(), 2);
        assert_eq!(resp.articles[0].id, 1);
        assert_eq!(resp.articles[1].topic, Topic::React);
    }

    #[test]
    fn test_article_serializes_with_wire_field_names() {
        let article = Article {
            id: 7,
            title: "A".to_string(),
            text: "B".to_string(),
            topic: Topic::Node,
        };
        let value = serde_json::to_value(&article).expect("Failed to serialize article");
        assert_eq!(value["article_id"], 7);
        assert_eq!(value["topic"], "Node");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_unknown_topic_is_preserved() {
        let json = r#"{"article_id": 3, "title": "t", "text": "x", "topic": "Rust"}"#;
        let article: Article = serde_json::from_str(json).expect("Failed to parse article");
        assert_eq!(article.topic, Topic::Other("Rust".to_string()));
        let back = serde_json::to_value(&article).expect("Failed to serialize article");
        assert_eq!(back["topic"], "Rust");
    }

    #[test]
    fn test_topic_next_cycles_known_topics() {
        assert_eq!(Topic::JavaScript.next(), Topic::React);
        assert_eq!(Topic::React.next(), Topic::Node);
        assert_eq!(Topic::Node.next(), Topic::JavaScript);
        assert_eq!(Topic::Other("Rust".into()).next(), Topic::JavaScript);
    }

    #[test]
    fn test_draft_validation() {
        assert!(ArticleDraft::new("A", "B", "JavaScript").validate().is_ok());

        let err = ArticleDraft::new("   ", "B", "React").validate().unwrap_err();
        assert_eq!(err.to_string(), "Title is required");

        let err = ArticleDraft::new("A", "", "React").validate().unwrap_err();
        assert_eq!(err.to_string(), "Text is required");

        let err = ArticleDraft::new("A", "B", "Rust").validate().unwrap_err();
        assert_eq!(err.to_string(), "Topic must be one of: JavaScript, React, Node");
    }

    #[test]
    fn test_draft_trimmed() {
        let draft = ArticleDraft::new("  A ", "\tB\n", "Node").trimmed();
        assert_eq!(draft.title, "A");
        assert_eq!(draft.text, "B");
    }
}
