use crate::models::{Header, Message, MessagePayload, SearchPage, Thread, ThreadSummary};
use crate::search::MailSearch;
use anyhow::{Context, Result};
use async_trait::async_trait;
use google_gmail1::{Gmail, api};
use hyper::client::HttpConnector;
use hyper_rustls::HttpsConnector;

const USER_ID: &str = "me";

#[derive(Clone)]
pub struct GmailClient {
    hub: Gmail<HttpsConnector<HttpConnector>>,
}

impl GmailClient {
    pub fn new(hub: Gmail<HttpsConnector<HttpConnector>>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl MailSearch for GmailClient {
    async fn search_threads(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<String>,
    ) -> Result<SearchPage> {
        tracing::debug!(query, max_results, ?page_token, "Listing threads");

        let mut req = self
            .hub
            .users()
            .threads_list(USER_ID)
            .q(query)
            .max_results(max_results);

        if let Some(token) = &page_token {
            req = req.page_token(token);
        }

        let (_, thread_list) = req.doit().await.context("Failed to list threads")?;

        let threads = thread_list
            .threads
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| {
                Some(ThreadSummary {
                    id: t.id?,
                    snippet: t.snippet,
                })
            })
            .collect();

        Ok(SearchPage {
            threads,
            next_page_token: thread_list.next_page_token,
            result_size_estimate: thread_list.result_size_estimate,
        })
    }

    async fn get_thread(&self, id: &str) -> Result<Thread> {
        tracing::debug!(id, "Fetching thread");

        let (_, thread) = self
            .hub
            .users()
            .threads_get(USER_ID, id)
            .format("full")
            .doit()
            .await
            .context(format!("Failed to get thread {}", id))?;

        Ok(convert_thread(thread))
    }
}

fn convert_thread(thread: api::Thread) -> Thread {
    Thread {
        id: thread.id.unwrap_or_default(),
        messages: thread
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(convert_message)
            .collect(),
    }
}

fn convert_message(msg: api::Message) -> Message {
    let mut payload = msg.payload.unwrap_or_default();

    let headers = payload
        .headers
        .take()
        .unwrap_or_default()
        .into_iter()
        .map(|h| Header {
            name: h.name.unwrap_or_default(),
            value: h.value.unwrap_or_default(),
        })
        .collect();

    Message {
        id: msg.id.unwrap_or_default(),
        headers,
        payload: convert_part(payload),
    }
}

/// Body data arrives already decoded from base64url by the API client.
fn convert_part(part: api::MessagePart) -> MessagePayload {
    MessagePayload {
        mime_type: part.mime_type,
        data: part.body.and_then(|b| b.data),
        parts: part
            .parts
            .unwrap_or_default()
            .into_iter()
            .map(convert_part)
            .collect(),
    }
}
