use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
impl Header {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// One node of a message's MIME tree. `data` holds the already decoded
/// body bytes; multipart containers normally carry none and rely on `parts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub mime_type: Option<String>,
    pub data: Option<Vec<u8>>,
    #[serde(default)]
    pub parts: Vec<MessagePayload>,
}

#[cfg(test)]
impl MessagePayload {
    pub fn leaf(mime_type: &str, data: &[u8]) -> Self {
        Self {
            mime_type: Some(mime_type.to_string()),
            data: Some(data.to_vec()),
            parts: Vec::new(),
        }
    }

    pub fn multipart(mime_type: &str, parts: Vec<MessagePayload>) -> Self {
        Self {
            mime_type: Some(mime_type.to_string()),
            data: None,
            parts,
        }
    }
}

impl MessagePayload {
    pub fn mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or_default()
    }

    /// Body bytes, or `None` when absent or empty.
    pub fn body_data(&self) -> Option<&[u8]> {
        self.data.as_deref().filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub headers: Vec<Header>,
    pub payload: MessagePayload,
}

impl Message {
    pub fn header(&self, name: &str) -> &str {
        header_value(&self.headers, name)
    }
}

/// Messages in provider order, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub snippet: Option<String>,
}

/// One page of search results plus the cursor for the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub threads: Vec<ThreadSummary>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: Option<u32>,
}

/// Returns the value of the first header whose name matches `name`
/// case-insensitively, or `""` if there is none.
pub fn header_value<'a>(headers: &'a [Header], name: &str) -> &'a str {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
        .unwrap_or_default()
}
